//! DNS resolution
//!
//! This module contains:
//! - The wire-format codec for queries and responses
//! - A UDP resolver issuing one query per resolution
//! - A per-worker address cache honoring record TTLs

mod cache;
pub mod message;
mod resolver;

pub use cache::{now_ms, DnsCache, DnsCacheEntry};
pub use message::{DnsMessage, RecordData, ResourceRecord};
pub use resolver::{AddressRecord, DnsResolver};
