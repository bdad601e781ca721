//! Crawl state owned by the scheduler
//!
//! # Components
//!
//! - `FrontierEntry`: Pending routes and politeness timing for one domain
//! - `Frontier`: All entries plus the visited set and redirect aliases

mod frontier;
mod frontier_entry;

pub use frontier::{Frontier, Selection};
pub use frontier_entry::FrontierEntry;
