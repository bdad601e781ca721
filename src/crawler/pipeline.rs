//! Worker fetch pipeline
//!
//! Turns one work item into one report:
//! - Checks the host's robots.txt
//! - Fetches the page, following redirects up to the configured depth
//! - Rejects non-2xx final responses
//! - Extracts links and text, persisting the text when allowed
//!
//! Every failure becomes `{success: false}`; only its kind is logged.

use crate::crawler::parser::extract;
use crate::crawler::{WorkItem, WorkerReport};
use crate::http::{HttpClient, HttpResponse};
use crate::robots::RepHandler;
use crate::storage::PageStore;
use crate::url::resolve_location;
use crate::CrawlError;
use std::sync::Arc;

/// A final response and where it was served from
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Host that served the final response
    pub host: String,
    /// Route of the final response
    pub route: String,
    pub response: HttpResponse,
    /// Target host of a permanent redirect on the first request
    pub migrated_to: Option<String>,
    /// Number of redirects followed
    pub redirects: usize,
}

/// Fetch pipeline owned by one worker
pub struct FetchPipeline {
    client: HttpClient,
    rep: RepHandler,
    store: Option<Arc<dyn PageStore>>,
    max_redirects: usize,
}

impl FetchPipeline {
    /// Creates a pipeline
    ///
    /// # Arguments
    ///
    /// * `client` - The worker's HTTP client; robots.txt is fetched with it too
    /// * `store` - Where extracted text goes, if anywhere
    pub fn new(client: HttpClient, store: Option<Arc<dyn PageStore>>) -> Self {
        let max_redirects = client.config().max_redirects as usize;
        Self {
            rep: RepHandler::new(client.clone()),
            client,
            store,
            max_redirects,
        }
    }

    /// Processes a work item into a report
    pub async fn process(&self, item: &WorkItem) -> WorkerReport {
        match self.crawl(item).await {
            Ok(report) => report,
            Err(e) => {
                tracing::info!("Failed {} [{:?}]: {}", item.url(), e.kind(), e);
                WorkerReport::failure(item)
            }
        }
    }

    async fn crawl(&self, item: &WorkItem) -> Result<WorkerReport, CrawlError> {
        if !self.rep.is_endpoint_allowed(&item.host, &item.route).await {
            return Err(CrawlError::RobotsDenied { url: item.url() });
        }

        let page = self.fetch_following(&item.host, &item.route).await?;

        tracing::debug!(
            "{} -> {} after {} redirect(s)",
            item.url(),
            page.response.status_code,
            page.redirects
        );

        if !page.response.is_success() {
            return Err(CrawlError::Status {
                url: format!("http://{}{}", page.host, page.route),
                status: page.response.status_code.clone(),
            });
        }

        let extracted = extract(&page.response.body, &format!("http://{}", page.host));

        if let Some(text) = &extracted.text {
            self.persist(&page.host, &item.route, text).await;
        }

        Ok(WorkerReport::success(
            item,
            extracted.links,
            page.migrated_to,
        ))
    }

    /// Fetches a page, following 301/302 responses
    ///
    /// The first request is depth 0 and each redirect adds one; reaching
    /// the configured maximum fails the chain. Only a 301 answering the
    /// first request to a different host is reported as a migration.
    pub async fn fetch_following(&self, host: &str, route: &str) -> Result<FetchedPage, CrawlError> {
        let mut host = host.to_string();
        let mut route = route.to_string();
        let mut migrated_to = None;
        let mut depth = 0;

        loop {
            let response = self.client.get(&host, &route).await?;
            if !response.is_redirect() {
                return Ok(FetchedPage {
                    host,
                    route,
                    response,
                    migrated_to,
                    redirects: depth,
                });
            }

            let url = format!("http://{}{}", host, route);
            let location = response
                .location()
                .ok_or_else(|| CrawlError::MissingLocation { url: url.clone() })?;
            let target = resolve_location(&host, &route, location)?;

            if depth == 0 && response.status() == Some(301) && target.link_host != host {
                migrated_to = Some(target.link_host.clone());
            }

            depth += 1;
            if depth >= self.max_redirects {
                return Err(CrawlError::RedirectLimit { url });
            }

            tracing::trace!(
                "Redirect {} {} -> http://{}{}",
                response.status_code,
                url,
                target.link_host,
                target.route
            );

            host = target.link_host;
            route = target.route;
        }
    }

    /// Writes page text on the blocking pool; failures are only logged
    async fn persist(&self, host: &str, route: &str, text: &str) {
        let Some(store) = self.store.clone() else {
            return;
        };

        let key = format!("{}{}", host, route);
        let (host, route, text) = (host.to_string(), route.to_string(), text.to_string());
        let write_key = key.clone();
        let result =
            tokio::task::spawn_blocking(move || store.store(&write_key, &host, &route, &text))
                .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Failed to store text for {}: {}", key, e),
            Err(e) => tracing::warn!("Store task for {} did not finish: {}", key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpConfig, UserAgentConfig};
    use crate::dns::{DnsCache, DnsResolver};
    use crate::storage::SqlitePageStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_client() -> HttpClient {
        let resolver = DnsResolver::new("127.0.0.1:9".parse().unwrap(), true);
        let user_agent = UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: Some("1.0".to_string()),
        };
        HttpClient::new(
            Arc::new(DnsCache::new()),
            resolver,
            &user_agent,
            HttpConfig::default(),
        )
    }

    async fn mount_page(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(body, "text/html"),
            )
            .mount(server)
            .await;
    }

    async fn mount_redirect(server: &MockServer, route: &str, status: u16, location: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).insert_header("location", location))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_successful_page() {
        let server = MockServer::start().await;
        let host = server.address().to_string();
        mount_page(
            &server,
            "/index.html",
            r#"<html><body>Welcome <a href="/next.html">next</a></body></html>"#,
        )
        .await;

        let store = Arc::new(SqlitePageStore::open_in_memory().unwrap());
        let pipeline = FetchPipeline::new(create_test_client(), Some(store.clone()));
        let report = pipeline.process(&WorkItem::new(&host, "/index.html")).await;

        assert!(report.success);
        assert_eq!(
            report.links,
            Some(vec![format!("http://{}/next.html", host)])
        );
        assert_eq!(report.redirect, None);

        let stored = store.get(&format!("{}/index.html", host)).unwrap().unwrap();
        assert_eq!(stored.text, "Welcome next");
    }

    #[tokio::test]
    async fn test_robots_denied() {
        let server = MockServer::start().await;
        let host = server.address().to_string();
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/private/page.html"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let pipeline = FetchPipeline::new(create_test_client(), None);
        let report = pipeline
            .process(&WorkItem::new(&host, "/private/page.html"))
            .await;

        assert!(!report.success);
        assert_eq!(report.links, None);
    }

    #[tokio::test]
    async fn test_error_status_fails() {
        let server = MockServer::start().await;
        let host = server.address().to_string();
        Mock::given(method("GET"))
            .and(path("/missing.html"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let pipeline = FetchPipeline::new(create_test_client(), None);
        let report = pipeline.process(&WorkItem::new(&host, "/missing.html")).await;

        assert!(!report.success);
        assert_eq!(report.links, None);
    }

    #[tokio::test]
    async fn test_four_redirects_then_ok() {
        let server = MockServer::start().await;
        let host = server.address().to_string();
        for i in 0..4 {
            mount_redirect(&server, &format!("/r{}", i), 302, &format!("/r{}", i + 1)).await;
        }
        mount_page(&server, "/r4", "<html><body>done</body></html>").await;

        let pipeline = FetchPipeline::new(create_test_client(), None);
        let page = pipeline.fetch_following(&host, "/r0").await.unwrap();

        assert_eq!(page.route, "/r4");
        assert_eq!(page.redirects, 4);
        assert!(page.response.is_success());
    }

    #[tokio::test]
    async fn test_too_many_redirects() {
        let server = MockServer::start().await;
        let host = server.address().to_string();
        for i in 0..6 {
            mount_redirect(&server, &format!("/r{}", i), 302, &format!("/r{}", i + 1)).await;
        }
        mount_page(&server, "/r6", "<html><body>unreachable</body></html>").await;

        let pipeline = FetchPipeline::new(create_test_client(), None);
        let result = pipeline.fetch_following(&host, "/r0").await;

        assert!(matches!(result, Err(CrawlError::RedirectLimit { .. })));
    }

    #[tokio::test]
    async fn test_https_redirect_fails() {
        let server = MockServer::start().await;
        let host = server.address().to_string();
        mount_redirect(&server, "/", 301, "https://secure.example.com/").await;

        let pipeline = FetchPipeline::new(create_test_client(), None);
        let result = pipeline.fetch_following(&host, "/").await;

        assert!(matches!(result, Err(CrawlError::UnsupportedScheme { .. })));
    }

    #[tokio::test]
    async fn test_redirect_without_location_fails() {
        let server = MockServer::start().await;
        let host = server.address().to_string();
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(302))
            .mount(&server)
            .await;

        let pipeline = FetchPipeline::new(create_test_client(), None);
        let result = pipeline.fetch_following(&host, "/").await;

        assert!(matches!(result, Err(CrawlError::MissingLocation { .. })));
    }

    #[tokio::test]
    async fn test_bare_http_location_appends_slash() {
        let server = MockServer::start().await;
        let host = server.address().to_string();
        mount_redirect(&server, "/docs", 301, "http").await;
        mount_page(&server, "/docs/", "<html><body>docs</body></html>").await;

        let pipeline = FetchPipeline::new(create_test_client(), None);
        let page = pipeline.fetch_following(&host, "/docs").await.unwrap();

        assert_eq!(page.route, "/docs/");
        assert_eq!(page.migrated_to, None);
    }

    #[tokio::test]
    async fn test_permanent_redirect_to_other_host_migrates() {
        let old = MockServer::start().await;
        let new = MockServer::start().await;
        let old_host = old.address().to_string();
        let new_host = new.address().to_string();

        mount_redirect(&old, "/", 301, &format!("http://{}/", new_host)).await;
        mount_page(
            &new,
            "/",
            r#"<html><body><a href="/about.html">About</a></body></html>"#,
        )
        .await;

        let store = Arc::new(SqlitePageStore::open_in_memory().unwrap());
        let pipeline = FetchPipeline::new(create_test_client(), Some(store.clone()));
        let report = pipeline.process(&WorkItem::new(&old_host, "/")).await;

        assert!(report.success);
        assert_eq!(report.host, old_host);
        assert_eq!(report.redirect.as_deref(), Some(new_host.as_str()));
        assert_eq!(
            report.links,
            Some(vec![format!("http://{}/about.html", new_host)])
        );
        assert!(store.get(&format!("{}/", new_host)).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_temporary_redirect_does_not_migrate() {
        let old = MockServer::start().await;
        let new = MockServer::start().await;
        let new_host = new.address().to_string();

        mount_redirect(&old, "/", 302, &format!("http://{}/", new_host)).await;
        mount_page(&new, "/", "<html><body>moved</body></html>").await;

        let pipeline = FetchPipeline::new(create_test_client(), None);
        let page = pipeline
            .fetch_following(&old.address().to_string(), "/")
            .await
            .unwrap();

        assert_eq!(page.host, new_host);
        assert_eq!(page.migrated_to, None);
    }
}
