//! Crawler module for page fetching and scheduling
//!
//! This module contains the core crawling logic, including:
//! - HTML link and text extraction
//! - The per-worker fetch pipeline with redirect chasing
//! - Worker tasks and their message protocol
//! - The master scheduler and its event loop

mod coordinator;
mod messages;
mod parser;
mod pipeline;
mod scheduler;
mod worker;

pub use coordinator::{run_crawl, Coordinator};
pub use messages::{WorkItem, WorkerEvent, WorkerReport};
pub use parser::{extract, Extracted};
pub use pipeline::{FetchPipeline, FetchedPage};
pub use scheduler::{CrawlStats, Scheduler};
pub use worker::{spawn_worker, WorkerHandle};
