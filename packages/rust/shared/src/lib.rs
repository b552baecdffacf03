//! Shared types, error model, and configuration for catalog-import.
//!
//! This crate is the foundation depended on by all other catalog-import crates.
//! It provides:
//! - [`CatalogImportError`], the unified error type
//! - Input records ([`CategoryRecord`]) and scalar coercion
//! - Domain types ([`Category`], [`CategoryAttributes`], [`ArticleCategoryLink`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod record;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DatabaseConfig, ImportConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{CatalogImportError, Result};
pub use record::{
    CategoryRecord, LEGACY_KEY_MAPPINGS, parse_json_values, value_to_bool, value_to_int,
    value_to_text,
};
pub use types::{
    ATTRIBUTE_SLOTS, ArticleCategoryLink, ArticleId, AttributeSlot, Category,
    CategoryAttributes, CategoryId, DenormalizedAssignment, extract_attributes,
};
