//! Master scheduler
//!
//! This module handles:
//! - Load-balancing work items across the worker pool
//! - Keeping each worker under its concurrency cap
//! - Arming a single retry when no domain is politely eligible
//! - Applying worker reports to the frontier

use crate::config::CrawlerConfig;
use crate::crawler::worker::WorkerHandle;
use crate::crawler::{WorkerEvent, WorkerReport};
use crate::state::{Frontier, Selection};
use std::time::{Duration, Instant};

/// Counters for the crawl so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    pub dispatched: u64,
    pub completed: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Scheduler owns the frontier and the worker roster
///
/// All methods take the current time so that decisions are reproducible;
/// the coordinator passes `Instant::now()`.
pub struct Scheduler {
    frontier: Frontier,
    workers: Vec<WorkerHandle>,
    max_active_pages: usize,
    retry_at: Option<Instant>,
    stats: CrawlStats,
    started: Instant,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `frontier` - The initial frontier, usually holding the seed
    /// * `workers` - Handles of the running workers
    /// * `max_active_pages` - Per-worker cap on items in flight
    pub fn new(frontier: Frontier, workers: Vec<WorkerHandle>, max_active_pages: usize) -> Self {
        Self {
            frontier,
            workers,
            max_active_pages,
            retry_at: None,
            stats: CrawlStats {
                dispatched: 0,
                completed: 0,
                succeeded: 0,
                failed: 0,
            },
            started: Instant::now(),
        }
    }

    /// Creates a scheduler seeded from the crawler configuration
    pub fn from_config(config: &CrawlerConfig, workers: Vec<WorkerHandle>) -> Self {
        let frontier = Frontier::with_seed(
            config.politeness_window(),
            &config.seed_domain,
            config.seed_prefix.clone(),
        );
        Self::new(frontier, workers, config.max_active_pages as usize)
    }

    /// Fills workers up to their cap, least loaded first
    ///
    /// Stops when every worker is full, when nothing is pending, or when
    /// pending work must wait for politeness; in the last case one retry is
    /// armed at the soonest eligibility.
    ///
    /// # Returns
    ///
    /// The number of items dispatched
    pub fn dispatch(&mut self, now: Instant) -> usize {
        let mut dispatched = 0;

        loop {
            let Some(index) = self.least_loaded_worker() else {
                break;
            };

            match self.frontier.next_work_item(now) {
                Selection::Work(item) => {
                    let worker = &mut self.workers[index];
                    tracing::debug!(
                        "Dispatching {} to worker {} ({} active)",
                        item.url(),
                        worker.id,
                        worker.active_pages
                    );

                    match worker.send(item) {
                        Ok(()) => {
                            worker.active_pages += 1;
                            self.stats.dispatched += 1;
                            dispatched += 1;
                        }
                        Err(item) => {
                            tracing::error!(
                                "Worker {} is unreachable, dropping it and {}",
                                worker.id,
                                item.url()
                            );
                            self.frontier.record_completion(&item.host, &item.route);
                            self.workers.remove(index);
                        }
                    }
                }
                Selection::Wait(wait) => {
                    self.arm_retry(now + wait);
                    break;
                }
                Selection::Exhausted => break,
            }
        }

        dispatched
    }

    /// Applies a worker report and refills the workers
    pub fn handle_report(&mut self, event: WorkerEvent, now: Instant) {
        if let Some(worker) = self.workers.iter_mut().find(|w| w.id == event.worker_id) {
            worker.active_pages = worker.active_pages.saturating_sub(1);
        }

        self.apply_report(&event.report);
        self.dispatch(now);
    }

    /// Called when the armed retry fires
    pub fn on_retry(&mut self, now: Instant) {
        self.retry_at = None;
        self.dispatch(now);
    }

    /// When the armed retry is due, if one is armed
    pub fn retry_at(&self) -> Option<Instant> {
        self.retry_at
    }

    /// True when nothing is in flight, nothing is pending and no retry is armed
    pub fn is_idle(&self) -> bool {
        self.retry_at.is_none()
            && self.active_pages() == 0
            && self.frontier.pending_routes() == 0
    }

    /// Items in flight across all workers
    pub fn active_pages(&self) -> usize {
        self.workers.iter().map(|w| w.active_pages).sum()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn workers(&self) -> &[WorkerHandle] {
        &self.workers
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    fn least_loaded_worker(&self) -> Option<usize> {
        self.workers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.active_pages < self.max_active_pages)
            .min_by_key(|(_, w)| w.active_pages)
            .map(|(index, _)| index)
    }

    fn arm_retry(&mut self, at: Instant) {
        match self.retry_at {
            Some(current) if current <= at => {}
            _ => {
                tracing::trace!(
                    "No domain eligible, retrying in {:?}",
                    at.saturating_duration_since(Instant::now())
                );
                self.retry_at = Some(at);
            }
        }
    }

    fn apply_report(&mut self, report: &WorkerReport) {
        self.frontier.record_completion(&report.host, &report.route);

        if let Some(new_host) = &report.redirect {
            self.frontier.migrate(&report.host, new_host);
        }

        if report.success {
            if let Some(links) = &report.links {
                let added = links
                    .iter()
                    .filter(|link| self.frontier.add_link(link))
                    .count();
                tracing::trace!(
                    "{} new routes from http://{}{}",
                    added,
                    report.host,
                    report.route
                );
            }
        }

        self.stats.completed += 1;
        if report.success {
            self.stats.succeeded += 1;
        } else {
            self.stats.failed += 1;
        }

        if self.stats.completed % 10 == 0 {
            self.log_progress();
        }
    }

    fn log_progress(&self) {
        let elapsed = self.started.elapsed().max(Duration::from_millis(1));
        tracing::info!(
            "Progress: {} completed ({} ok, {} failed), {} domains, {} pending, {:.2} pages/sec",
            self.stats.completed,
            self.stats.succeeded,
            self.stats.failed,
            self.frontier.domain_count(),
            self.frontier.pending_routes(),
            self.stats.completed as f64 / elapsed.as_secs_f64()
        );
    }
}
