use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::ConfigError;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// The single domain the frontier starts from
    #[serde(rename = "seed-domain")]
    pub seed_domain: String,

    /// Path prefix applied to every route of the seed domain
    #[serde(rename = "seed-prefix", default)]
    pub seed_prefix: Option<String>,

    /// Number of worker tasks
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Maximum number of in-flight work items per worker
    #[serde(rename = "max-active-pages", default = "default_max_active_pages")]
    pub max_active_pages: u32,

    /// Minimum time between two dispatches to the same domain (milliseconds)
    #[serde(rename = "politeness-window", default = "default_politeness_window")]
    pub politeness_window: u64,
}

impl CrawlerConfig {
    pub fn politeness_window(&self) -> Duration {
        Duration::from_millis(self.politeness_window)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt product token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default)]
    pub crawler_version: Option<String>,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    ///
    /// Format: `CrawlerName/Version`, or just `CrawlerName` without a version.
    pub fn header_value(&self) -> String {
        match &self.crawler_version {
            Some(version) => format!("{}/{}", self.crawler_name, version),
            None => self.crawler_name.clone(),
        }
    }
}

/// Raw HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Port used when a host carries no explicit port
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Whole-fetch timeout (milliseconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Redirect depth at which a chain is abandoned
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: u32,

    /// Byte budget for a single response
    #[serde(rename = "max-response-bytes", default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            timeout: default_timeout(),
            max_redirects: default_max_redirects(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

/// DNS resolver configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DnsConfig {
    /// Nameserver IP address
    #[serde(default = "default_nameserver")]
    pub nameserver: String,

    /// Nameserver UDP port
    #[serde(default = "default_dns_port")]
    pub port: u16,

    /// Whether to set the recursion-desired bit on queries
    #[serde(rename = "recursion-desired", default = "default_recursion_desired")]
    pub recursion_desired: bool,
}

impl DnsConfig {
    /// Returns the nameserver as a socket address
    pub fn nameserver_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.nameserver.parse().map_err(|_| {
            ConfigError::InvalidAddress(format!("Invalid nameserver '{}'", self.nameserver))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            nameserver: default_nameserver(),
            port: default_dns_port(),
            recursion_desired: default_recursion_desired(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database receiving extracted page text
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}

fn default_workers() -> u32 {
    4
}

fn default_max_active_pages() -> u32 {
    20
}

fn default_politeness_window() -> u64 {
    1000
}

fn default_http_port() -> u16 {
    80
}

fn default_timeout() -> u64 {
    5000
}

fn default_max_redirects() -> u32 {
    5
}

fn default_max_response_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_nameserver() -> String {
    "8.8.8.8".to_string()
}

fn default_dns_port() -> u16 {
    53
}

fn default_recursion_desired() -> bool {
    true
}
