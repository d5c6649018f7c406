//! Image URL extraction from artwork and image pages.
//!
//! This crate provides:
//! - [`strategies`]: the three image heuristics, tried in priority order
//! - [`ImageExtractor`]: fetches a page and runs the strategies over it

pub mod fetcher;
pub mod strategies;

pub use fetcher::{ExtractError, ImageExtractor};
pub use strategies::{
    BackgroundCoverStrategy, ImageMatch, ImageStrategy, ImgTagStrategy, Lookup, MatchSource,
    OgImageStrategy, StrategyRegistry, find_image_url, parse_page,
};
