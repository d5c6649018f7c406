//! Job orchestration for artfill.
//!
//! - [`fill`]: the sequential scrape-and-write-back loop
//! - [`seed`]: JSON import into the store
//! - [`stats`]: collection health summary

pub mod fill;
pub mod seed;
pub mod stats;

pub use fill::{FillOptions, FillProgress, FillReport, RecordOutcome, SilentProgress, fill};
pub use seed::{SeedReport, seed_from_path, seed_from_str};
pub use stats::{CollectionStats, collect_stats};
