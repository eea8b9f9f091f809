// src/models/mod.rs

//! Domain models for the harvesting client.
//!
//! This module contains all data structures used throughout the
//! application, organized by their primary purpose.

mod config;
mod outcome;
mod query;
mod record;

// Re-export all public types
pub use config::{CacheConfig, HarvestConfig, HarvestSettings, HttpConfig, RetryConfig};
pub use outcome::{FetchOutcome, HarvestOutcome, NormalizedPage, PageFailure, TransientCause};
pub use query::{Credential, FilterValue, QuerySpec, SortMode};
pub use record::{FieldDefault, FieldSpec, NormalizedRecord, RecordKind};
