//! RIWEB crawler: a polite, multi-worker web crawler
//!
//! A master scheduler owns the crawl frontier and hands `(host, route)` work
//! items to a fixed pool of workers. Workers resolve hostnames with their own
//! DNS client, speak raw HTTP/1.1 over TCP, honor robots.txt and report the
//! links they discover back to the master.

pub mod config;
pub mod crawler;
pub mod dns;
pub mod http;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("DNS error: {0}")]
    Dns(#[from] DnsError),

    #[error("No addresses found for {host}")]
    NoAddresses { host: String },

    #[error("Redirect without location header from {url}")]
    MissingLocation { url: String },

    #[error("Unsupported redirect scheme: {location}")]
    UnsupportedScheme { location: String },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("Response from {url} exceeds {limit} bytes")]
    ResponseTooLarge { url: String, limit: usize },

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },

    #[error("Not successful status code {status} for {url}")]
    Status { url: String, status: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Coarse classification of a [`CrawlError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Transport,
    Timeout,
    Protocol,
    PolicyDenied,
    Status,
    Storage,
}

impl CrawlError {
    /// Returns the kind of failure this error represents
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Transport(_) | Self::Dns(DnsError::Io(_)) => ErrorKind::Transport,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Dns(_)
            | Self::NoAddresses { .. }
            | Self::MissingLocation { .. }
            | Self::UnsupportedScheme { .. }
            | Self::RedirectLimit { .. }
            | Self::ResponseTooLarge { .. } => ErrorKind::Protocol,
            Self::RobotsDenied { .. } => ErrorKind::PolicyDenied,
            Self::Status { .. } => ErrorKind::Status,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid address in config: {0}")]
    InvalidAddress(String),
}

/// DNS wire-format and transport errors
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("DNS socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Message truncated at offset {offset}")]
    Truncated { offset: usize },

    #[error("Invalid label type {byte:#04x} at offset {offset}")]
    InvalidLabel { offset: usize, byte: u8 },

    #[error("Too many compression pointers at offset {offset}")]
    PointerLoop { offset: usize },

    #[error("Label too long: {label}")]
    NameTooLong { label: String },

    #[error("Malformed address record (type {rtype}, {len} bytes)")]
    MalformedAddress { rtype: u16, len: usize },
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for DNS operations
pub type DnsResult<T> = std::result::Result<T, DnsError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::crawler::{WorkItem, WorkerReport};
pub use crate::state::{Frontier, FrontierEntry};
pub use crate::url::split_url;
