use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use strum_macros::{Display, EnumString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The well known DNS port.
pub const DEFAULT_PORT: u16 = 53;

/// How queries are sent.
#[derive(Copy, Clone, Debug, Display, EnumString, PartialEq, Eq, Hash)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TransportType {
    Udp,
    Tcp,
}

impl Default for TransportType {
    fn default() -> Self {
        TransportType::Udp
    }
}

/// Supplies the servers a resolver starts with, for example the ones the
/// operating system is configured with.
pub trait ServerProvider {
    fn servers(&self) -> Vec<SocketAddr>;
}

impl<F> ServerProvider for F
where
    F: Fn() -> Vec<SocketAddr>,
{
    fn servers(&self) -> Vec<SocketAddr> {
        self()
    }
}

/// Settings for a [`crate::clients::Resolver`].
///
/// # Example
///
/// ```rust
/// use stubdns::clients::{ResolverConfig, TransportType};
/// use std::time::Duration;
///
/// let config = ResolverConfig::default()
///     .with_servers(vec!["8.8.8.8:53".parse().unwrap()])
///     .with_transport(TransportType::Tcp)
///     .with_timeout(Duration::from_millis(500));
///
/// assert_eq!(config.retries, 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverConfig {
    /// Tried in order, on every attempt.
    pub servers: Vec<SocketAddr>,

    pub transport: TransportType,

    /// Bounds every connect, send and receive.
    pub timeout: Duration,

    /// Additional rounds over the server list after the first.
    pub retries: u8,

    /// Sets Recursion Desired on outgoing queries.
    pub recursion: bool,

    /// Address to bind outgoing sockets to.
    pub local_address: Option<IpAddr>,

    /// Linux network namespace to open sockets in, as found under `/var/run/netns`.
    pub network_namespace: Option<String>,

    pub use_cache: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            servers: Vec::new(),
            transport: TransportType::Udp,
            timeout: Duration::from_millis(1000),
            retries: 2,
            recursion: true,
            local_address: None,
            network_namespace: None,
            use_cache: true,
        }
    }
}

impl ResolverConfig {
    /// Default settings, with the servers supplied by `provider`.
    pub fn from_provider<P: ServerProvider>(provider: &P) -> ResolverConfig {
        ResolverConfig {
            servers: provider.servers(),
            ..Default::default()
        }
    }

    pub fn with_servers(mut self, servers: Vec<SocketAddr>) -> Self {
        self.servers = servers;
        self
    }

    pub fn with_transport(mut self, transport: TransportType) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_recursion(mut self, recursion: bool) -> Self {
        self.recursion = recursion;
        self
    }

    pub fn with_local_address(mut self, local_address: IpAddr) -> Self {
        self.local_address = Some(local_address);
        self
    }

    pub fn with_network_namespace(mut self, name: &str) -> Self {
        self.network_namespace = Some(name.to_string());
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}
