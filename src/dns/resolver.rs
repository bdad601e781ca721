//! UDP stub resolver
//!
//! Sends one query per resolution to the configured nameserver and waits for
//! the first datagram back. There is no retry and no fallback nameserver.

use crate::config::DnsConfig;
use crate::dns::cache::now_ms;
use crate::dns::message::{build_query, parse_response, DnsMessage};
use crate::{ConfigError, DnsResult};
use std::net::SocketAddr;
use tokio::net::UdpSocket;

const RECEIVE_BUFFER: usize = 4096;

/// An address obtained from a resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Dotted-decimal IPv4 or eight-group IPv6 address
    pub value: String,
    /// Record TTL in seconds
    pub ttl: u32,
    /// When the query was sent (Unix milliseconds)
    pub timestamp: i64,
}

/// Resolves hostnames against a single nameserver
#[derive(Debug, Clone)]
pub struct DnsResolver {
    nameserver: SocketAddr,
    recursion_desired: bool,
}

impl DnsResolver {
    pub fn new(nameserver: SocketAddr, recursion_desired: bool) -> Self {
        Self {
            nameserver,
            recursion_desired,
        }
    }

    pub fn from_config(config: &DnsConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.nameserver_addr()?, config.recursion_desired))
    }

    pub fn nameserver(&self) -> SocketAddr {
        self.nameserver
    }

    /// Resolves `hostname` into its A and AAAA records
    ///
    /// Records of other types are parsed but left out. An empty result is not
    /// an error here; callers decide what "no addresses" means.
    pub async fn resolve(&self, hostname: &str) -> DnsResult<Vec<AddressRecord>> {
        let timestamp = now_ms();
        let message = self.query(hostname).await?;

        let addresses: Vec<AddressRecord> = message
            .address_records()
            .map(|record| AddressRecord {
                value: record.data.render(),
                ttl: record.ttl,
                timestamp,
            })
            .collect();

        tracing::debug!(
            "Resolved {} via {}: {} address(es), {} record(s) total",
            hostname,
            self.nameserver,
            addresses.len(),
            message.records.len()
        );

        Ok(addresses)
    }

    /// Sends a single query and parses the first datagram received
    pub async fn query(&self, hostname: &str) -> DnsResult<DnsMessage> {
        let id: u16 = rand::random();
        let query = build_query(id, hostname, self.recursion_desired)?;

        let bind_addr: SocketAddr = if self.nameserver.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };

        let socket = UdpSocket::bind(bind_addr).await?;
        socket.send_to(&query, self.nameserver).await?;

        let mut buf = vec![0u8; RECEIVE_BUFFER];
        let len = socket.recv(&mut buf).await?;

        let message = parse_response(&buf[..len])?;
        if message.id != id {
            tracing::debug!(
                "DNS reply id {:#06x} does not match query id {:#06x} for {}",
                message.id,
                id,
                hostname
            );
        }

        Ok(message)
    }
}
