//! Transports, and the [`Resolver`] that drives them.

use crate::errors::Result;
use crate::{Request, Response};
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};

pub use self::cache::{CacheKey, ResponseCache};
pub use self::config::{ResolverConfig, ServerProvider, TransportType, DEFAULT_PORT};
pub use self::resolver::{arpa_from_enum, arpa_from_ip, Resolver};
pub use self::tcp::{TcpClient, MAX_TRANSFER_RECORDS};
pub use self::udp::UdpClient;

mod cache;
mod config;
mod net;
mod resolver;
mod tcp;
mod udp;

/// Transport takes a request and returns the server's response.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Makes exactly one attempt against `server`.
    async fn exchange(&self, server: SocketAddr, request: &Request) -> Result<Response>;
}

/// Something that happened while resolving, reported to an [`Observer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// One attempt failed, and the resolver moved on to the next server.
    ConnectionFailed { server: SocketAddr, reason: String },

    /// Every server failed on every attempt.
    RetriesExhausted { attempts: usize },

    /// The query was cancelled by the caller.
    Cancelled,
}

/// Receives [`Event`]s as they happen, on the task running the query.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &Event);
}

/// The addresses and aliases of a host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostEntry {
    /// Empty when nothing was found.
    pub host_name: String,
    pub addresses: Vec<IpAddr>,
    pub aliases: Vec<String>,
}
