//! Crawler coordinator - the master event loop
//!
//! This module wires the crawl together:
//! - Builds one fetch pipeline per worker, each with its own caches
//! - Spawns the worker tasks and seeds the scheduler
//! - Waits on worker reports, the scheduler's retry timer and shutdown

use crate::config::Config;
use crate::crawler::pipeline::FetchPipeline;
use crate::crawler::scheduler::{CrawlStats, Scheduler};
use crate::crawler::worker::spawn_worker;
use crate::crawler::WorkerEvent;
use crate::dns::{DnsCache, DnsResolver};
use crate::http::HttpClient;
use crate::storage::PageStore;
use crate::CrawlError;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

/// Main crawler coordinator structure
pub struct Coordinator {
    scheduler: Scheduler,
    events: UnboundedReceiver<WorkerEvent>,
    tasks: Vec<JoinHandle<()>>,
    exit_when_idle: bool,
}

impl Coordinator {
    /// Creates a new coordinator and starts its workers
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `store` - Where extracted text is persisted, if anywhere
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Workers are running and the frontier is seeded
    /// * `Err(CrawlError)` - The DNS configuration is unusable
    pub fn new(config: &Config, store: Option<Arc<dyn PageStore>>) -> Result<Self, CrawlError> {
        let resolver = DnsResolver::from_config(&config.dns)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut handles = Vec::new();
        let mut tasks = Vec::new();
        for id in 0..config.crawler.workers as usize {
            let client = HttpClient::new(
                Arc::new(DnsCache::new()),
                resolver.clone(),
                &config.user_agent,
                config.http.clone(),
            );
            let pipeline = FetchPipeline::new(client, store.clone());

            let (handle, task) = spawn_worker(id, pipeline, events_tx.clone());
            handles.push(handle);
            tasks.push(task);
        }

        tracing::info!(
            "Started {} workers, {} pages each, nameserver {}",
            handles.len(),
            config.crawler.max_active_pages,
            resolver.nameserver()
        );

        Ok(Self {
            scheduler: Scheduler::from_config(&config.crawler, handles),
            events: events_rx,
            tasks,
            exit_when_idle: false,
        })
    }

    /// Stops the loop once nothing is pending or in flight
    ///
    /// Without this the coordinator idles until shutdown.
    pub fn exit_when_idle(mut self, exit: bool) -> Self {
        self.exit_when_idle = exit;
        self
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Runs the event loop until `shutdown` completes
    ///
    /// Worker tasks are aborted on return.
    pub async fn run<F>(mut self, shutdown: F) -> CrawlStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let started = Instant::now();
        self.scheduler.dispatch(Instant::now());
        let mut announced_idle = false;

        loop {
            if self.scheduler.is_idle() {
                if self.exit_when_idle {
                    tracing::info!("Frontier exhausted, stopping");
                    break;
                }
                if !announced_idle {
                    tracing::info!("Frontier exhausted, idling");
                    announced_idle = true;
                }
            } else {
                announced_idle = false;
            }

            let retry_at = self.scheduler.retry_at();
            let retry_deadline = tokio::time::Instant::from_std(retry_at.unwrap_or(started));

            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                event = self.events.recv() => match event {
                    Some(event) => self.scheduler.handle_report(event, Instant::now()),
                    None => {
                        tracing::error!("All workers have stopped");
                        break;
                    }
                },
                _ = tokio::time::sleep_until(retry_deadline), if retry_at.is_some() => {
                    self.scheduler.on_retry(Instant::now());
                }
            }
        }

        for task in &self.tasks {
            task.abort();
        }

        let stats = self.scheduler.stats();
        tracing::info!(
            "Crawl stopped after {:?}: {} dispatched, {} ok, {} failed",
            started.elapsed(),
            stats.dispatched,
            stats.succeeded,
            stats.failed
        );
        stats
    }
}

/// Runs a crawl until Ctrl-C
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `store` - Where extracted text is persisted, if anywhere
/// * `exit_when_idle` - Stop once the frontier is exhausted
///
/// # Example
///
/// ```no_run
/// use riweb_crawler::config::load_config;
/// use riweb_crawler::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// run_crawl(&config, None, false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    store: Option<Arc<dyn PageStore>>,
    exit_when_idle: bool,
) -> Result<CrawlStats, CrawlError> {
    let coordinator = Coordinator::new(config, store)?.exit_when_idle(exit_when_idle);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    Ok(coordinator.run(shutdown).await)
}
