//! Shared types, error model, and configuration for artfill.
//!
//! This crate is the foundation depended on by all other artfill crates.
//! It provides:
//! - [`ArtfillError`]: the unified error type
//! - Domain types ([`ArtworkRecord`], [`ArtworkId`], [`UrlField`], [`FillDirection`])
//! - Configuration ([`AppConfig`], [`StoreConfig`], [`HttpConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, HttpConfig, StoreConfig, UpdaterConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_store_auth_token, resolve_store_url,
};
pub use error::{ArtfillError, Result};
pub use types::{ArtworkId, ArtworkRecord, FillDirection, UrlField};
