//! Raw HTTP/1.1 client
//!
//! Each fetch opens a fresh TCP connection, sends a fixed-shape `GET` with
//! `Connection: close` and reads until the server hangs up. A single timer
//! covers the whole operation, name resolution included; when it fires the
//! connection is dropped and the fetch fails.

use crate::config::{HttpConfig, UserAgentConfig};
use crate::dns::{DnsCache, DnsResolver};
use crate::http::response::{parse_response, HttpResponse};
use crate::url::parse_authority;
use crate::CrawlError;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const READ_CHUNK: usize = 8 * 1024;

/// HTTP client bound to one worker's DNS cache
#[derive(Debug, Clone)]
pub struct HttpClient {
    dns_cache: Arc<DnsCache>,
    resolver: DnsResolver,
    user_agent: String,
    product_token: String,
    config: HttpConfig,
}

impl HttpClient {
    /// Creates a client
    ///
    /// # Arguments
    ///
    /// * `dns_cache` - The worker's address cache, consulted before the resolver
    /// * `resolver` - Resolver used on cache misses
    /// * `user_agent` - The user agent configuration
    /// * `config` - Port, timeout and byte budget
    pub fn new(
        dns_cache: Arc<DnsCache>,
        resolver: DnsResolver,
        user_agent: &UserAgentConfig,
        config: HttpConfig,
    ) -> Self {
        Self {
            dns_cache,
            resolver,
            user_agent: user_agent.header_value(),
            product_token: user_agent.crawler_name.clone(),
            config,
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Name matched against robots.txt `User-agent` lines, without version
    pub fn product_token(&self) -> &str {
        &self.product_token
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Fetches `http://{host}{route}`
    ///
    /// # Returns
    ///
    /// * `Ok(HttpResponse)` - Any complete response, whatever its status
    /// * `Err(CrawlError::Timeout)` - The fetch did not finish in time
    /// * `Err(CrawlError)` - Resolution, connect or socket failure
    pub async fn get(&self, host: &str, route: &str) -> Result<HttpResponse, CrawlError> {
        let url = format!("http://{}{}", host, route);

        match tokio::time::timeout(self.config.timeout(), self.fetch(host, route, &url)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!("Fetch of {} timed out after {:?}", url, self.config.timeout());
                Err(CrawlError::Timeout { url })
            }
        }
    }

    async fn fetch(&self, host: &str, route: &str, url: &str) -> Result<HttpResponse, CrawlError> {
        let (hostname, port) = parse_authority(host, self.config.port);
        let ip = self.resolve(hostname).await?;

        let mut stream = TcpStream::connect(SocketAddr::new(ip, port)).await?;
        stream
            .write_all(build_request(host, route, &self.user_agent).as_bytes())
            .await?;

        let raw = read_until_close(&mut stream, self.config.max_response_bytes, url).await?;
        let response = parse_response(&raw);

        tracing::trace!(
            "GET {} -> {} ({} body bytes)",
            url,
            response.status_code,
            response.body.len()
        );

        Ok(response)
    }

    /// Resolves a hostname: IP literals directly, then cache, then resolver
    ///
    /// Only the first address record is used and stored.
    async fn resolve(&self, hostname: &str) -> Result<IpAddr, CrawlError> {
        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return Ok(ip);
        }

        if let Some(ip) = self
            .dns_cache
            .lookup(hostname)
            .and_then(|address| address.parse().ok())
        {
            return Ok(ip);
        }

        let records = self.resolver.resolve(hostname).await?;
        let record = records.first().ok_or_else(|| CrawlError::NoAddresses {
            host: hostname.to_string(),
        })?;

        let ip: IpAddr = record.value.parse().map_err(|_| CrawlError::NoAddresses {
            host: hostname.to_string(),
        })?;

        self.dns_cache.store(
            hostname,
            &record.value,
            record.timestamp,
            i64::from(record.ttl) * 1000,
        );

        Ok(ip)
    }
}

/// Formats the request sent for every fetch
pub fn build_request(host: &str, route: &str, user_agent: &str) -> String {
    format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\nUser-Agent: {}\r\n\r\n",
        route, host, user_agent
    )
}

/// Reads everything the peer sends until it closes the connection
async fn read_until_close(
    stream: &mut TcpStream,
    limit: usize,
    url: &str,
) -> Result<Vec<u8>, CrawlError> {
    let mut raw = Vec::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(raw);
        }

        if raw.len() + read > limit {
            return Err(CrawlError::ResponseTooLarge {
                url: url.to_string(),
                limit,
            });
        }

        raw.extend_from_slice(&chunk[..read]);
    }
}
