//! Worker tasks
//!
//! A worker owns one fetch pipeline, and with it its own DNS cache and
//! robots.txt cache. It talks to the scheduler only through channels: work
//! items in, tagged reports out. Items run concurrently; the scheduler
//! bounds how many are in flight.

use crate::crawler::pipeline::FetchPipeline;
use crate::crawler::{WorkItem, WorkerEvent};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Scheduler-side handle to a running worker
#[derive(Debug)]
pub struct WorkerHandle {
    pub id: usize,
    sender: UnboundedSender<WorkItem>,
    /// Items sent and not yet reported
    pub active_pages: usize,
}

impl WorkerHandle {
    pub fn new(id: usize, sender: UnboundedSender<WorkItem>) -> Self {
        Self {
            id,
            sender,
            active_pages: 0,
        }
    }

    /// Hands an item to the worker
    ///
    /// Returns the item back if the worker is gone.
    pub fn send(&self, item: WorkItem) -> Result<(), WorkItem> {
        self.sender.send(item).map_err(|e| e.0)
    }
}

/// Spawns a worker task
///
/// # Arguments
///
/// * `id` - Identifier attached to every report
/// * `pipeline` - The worker's fetch pipeline
/// * `events` - Channel to the scheduler
///
/// # Returns
///
/// The scheduler's handle and the task's join handle
pub fn spawn_worker(
    id: usize,
    pipeline: FetchPipeline,
    events: UnboundedSender<WorkerEvent>,
) -> (WorkerHandle, JoinHandle<()>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_worker(id, Arc::new(pipeline), receiver, events));
    (WorkerHandle::new(id, sender), task)
}

async fn run_worker(
    id: usize,
    pipeline: Arc<FetchPipeline>,
    mut items: UnboundedReceiver<WorkItem>,
    events: UnboundedSender<WorkerEvent>,
) {
    tracing::debug!("Worker {} started", id);

    while let Some(item) = items.recv().await {
        let pipeline = pipeline.clone();
        let events = events.clone();

        tokio::spawn(async move {
            let report = pipeline.process(&item).await;
            if events
                .send(WorkerEvent {
                    worker_id: id,
                    report,
                })
                .is_err()
            {
                tracing::debug!("Worker {} dropped report for {}: scheduler gone", id, item.url());
            }
        });
    }

    tracing::debug!("Worker {} stopped", id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpConfig, UserAgentConfig};
    use crate::dns::{DnsCache, DnsResolver};
    use crate::http::HttpClient;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_pipeline() -> FetchPipeline {
        let resolver = DnsResolver::new("127.0.0.1:9".parse().unwrap(), true);
        let user_agent = UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: None,
        };
        let client = HttpClient::new(
            Arc::new(DnsCache::new()),
            resolver,
            &user_agent,
            HttpConfig::default(),
        );
        FetchPipeline::new(client, None)
    }

    #[tokio::test]
    async fn test_worker_reports_each_item() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<body>a</body>"))
            .mount(&server)
            .await;
        let host = server.address().to_string();

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let (handle, _task) = spawn_worker(7, create_test_pipeline(), events_tx);

        handle.send(WorkItem::new(&host, "/a.html")).unwrap();
        handle.send(WorkItem::new(&host, "/missing.html")).unwrap();

        let mut reports = Vec::new();
        for _ in 0..2 {
            let event = events_rx.recv().await.unwrap();
            assert_eq!(event.worker_id, 7);
            reports.push(event.report);
        }
        reports.sort_by(|a, b| a.route.cmp(&b.route));

        assert_eq!(reports[0].route, "/a.html");
        assert!(reports[0].success);
        assert_eq!(reports[1].route, "/missing.html");
        assert!(!reports[1].success);
    }

    #[tokio::test]
    async fn test_send_after_worker_stops() {
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);

        let handle = WorkerHandle::new(0, sender);
        let item = WorkItem::new("example.com", "/");
        assert_eq!(handle.send(item.clone()), Err(item));
    }
}
