//! Service layer for the harvesting client.
//!
//! This module contains the pipeline stages:
//! - Request building (`request`)
//! - Transport execution (`transport`)
//! - Retry control (`backoff`)
//! - Response normalization (`normalize`)
//! - Pagination driving (`Harvester`)

pub mod backoff;
pub mod normalize;
pub mod request;
pub mod transport;

mod harvester;

pub use backoff::BackoffPolicy;
pub use harvester::Harvester;
pub use request::RequestDescriptor;
