//! Category import logic for the shop catalog.
//!
//! This crate maps legacy category records onto the catalog schema
//! ([`importer`]) and keeps the denormalized article/category rows in sync
//! after linking ([`denormalize`]).

pub mod denormalize;
pub mod importer;

pub use denormalize::{CategoryDenormalizer, StorageDenormalizer};
pub use importer::{
    AssignOutcome, AttributeUpsert, CategoryImporter, CategoryMatch, ImportOutcome,
    ImportSummary,
};
