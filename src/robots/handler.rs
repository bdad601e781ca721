//! Per-worker REP handler
//!
//! Each host's robots.txt is fetched at most once for the lifetime of the
//! handler. Concurrent first queries for a host wait on the same fetch.

use crate::http::HttpClient;
use crate::robots::RobotsRecord;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

const ROBOTS_ROUTE: &str = "/robots.txt";

/// Answers whether a route may be crawled, caching one record per host
#[derive(Debug)]
pub struct RepHandler {
    client: HttpClient,
    hosts: DashMap<String, Arc<OnceCell<RobotsRecord>>>,
}

impl RepHandler {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            hosts: DashMap::new(),
        }
    }

    /// Checks `http://{host}{route}` against the host's robots.txt
    ///
    /// # Returns
    ///
    /// * `true` - If allowed, or if robots.txt could not be obtained
    /// * `false` - If the ruleset disallows the URL for our user agent
    pub async fn is_endpoint_allowed(&self, host: &str, route: &str) -> bool {
        let record = self.record_for(host).await;
        let url = format!("http://{}{}", host, route);
        let allowed = record.is_allowed(&url, self.client.product_token());

        tracing::trace!("REP {} for {}", if allowed { "allows" } else { "denies" }, url);
        allowed
    }

    /// Number of hosts with a known or pending record
    pub fn cached_hosts(&self) -> usize {
        self.hosts.len()
    }

    async fn record_for(&self, host: &str) -> RobotsRecord {
        // Clone the cell out so no map guard is held across the await
        let cell = self
            .hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        cell.get_or_init(|| self.fetch_record(host)).await.clone()
    }

    async fn fetch_record(&self, host: &str) -> RobotsRecord {
        match self.client.get(host, ROBOTS_ROUTE).await {
            Ok(response) if response.status() == Some(200) => {
                let record = RobotsRecord::from_content(&response.body);
                tracing::debug!(
                    "Loaded robots.txt for {} ({})",
                    host,
                    if record.is_permissive() { "empty" } else { "rules" }
                );
                record
            }
            Ok(response) => {
                tracing::debug!(
                    "robots.txt for {} returned {}, allowing all",
                    host,
                    response.status_code
                );
                RobotsRecord::Permissive
            }
            Err(e) => {
                tracing::warn!("Failed to fetch robots.txt for {}: {}, allowing all", host, e);
                RobotsRecord::Permissive
            }
        }
    }
}
