//! Robots exclusion handling
//!
//! This module provides the per-worker REP handler and the ruleset record
//! it caches for each host.

mod handler;
mod parser;

pub use handler::RepHandler;
pub use parser::RobotsRecord;
