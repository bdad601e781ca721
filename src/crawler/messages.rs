//! Messages exchanged between the scheduler and workers

/// A page to fetch, sent from the scheduler to one worker
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    pub host: String,
    pub route: String,
}

impl WorkItem {
    pub fn new(host: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            route: route.into(),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}{}", self.host, self.route)
    }
}

/// Outcome of one work item, sent back to the scheduler
///
/// `host` and `route` are always those of the dispatched item, even when
/// the page was served from elsewhere after redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub host: String,
    pub route: String,
    pub success: bool,
    /// Absolute links found on the page
    pub links: Option<Vec<String>>,
    /// New host for the whole domain after a permanent redirect
    pub redirect: Option<String>,
}

impl WorkerReport {
    /// A failed item; carries no links
    pub fn failure(item: &WorkItem) -> Self {
        Self {
            host: item.host.clone(),
            route: item.route.clone(),
            success: false,
            links: None,
            redirect: None,
        }
    }

    pub fn success(item: &WorkItem, links: Vec<String>, redirect: Option<String>) -> Self {
        Self {
            host: item.host.clone(),
            route: item.route.clone(),
            success: true,
            links: Some(links),
            redirect,
        }
    }
}

/// A report tagged with the worker that produced it
#[derive(Debug, Clone)]
pub struct WorkerEvent {
    pub worker_id: usize,
    pub report: WorkerReport,
}
