use crate::clients::{
    CacheKey, Event, HostEntry, Observer, ResolverConfig, ResponseCache, TcpClient, Transport,
    TransportType, UdpClient, DEFAULT_PORT,
};
use crate::errors::Error;
use crate::resource::Resource;
use crate::types::{Class, Question, Type};
use crate::{Request, Response};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const CONNECTION_FAILED: &str = "Connection failed";
const OPERATION_CANCELLED: &str = "Operation cancelled";

/// A stub resolver. Sends queries to a list of recursive name servers, and
/// caches what comes back.
///
/// Queries never fail with an error. When no answer could be obtained the
/// returned [`Response`] has its `error` set.
///
/// # Example
///
/// ```rust,no_run
/// use stubdns::clients::Resolver;
/// use stubdns::types::Type;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let resolver = Resolver::new(vec!["8.8.8.8:53".parse().unwrap()]);
///     let response = resolver
///         .query("bramp.net", Type::A, &CancellationToken::new())
///         .await;
///
///     println!("{}", response);
/// }
/// ```
pub struct Resolver {
    config: ResolverConfig,

    // Rolling message ID, bumped on every attempt.
    unique: AtomicU16,

    cache: ResponseCache,
    observer: Option<Arc<dyn Observer>>,
}

impl Resolver {
    /// Creates a new Resolver, with default settings, using these servers.
    pub fn new(servers: Vec<SocketAddr>) -> Resolver {
        Self::with_config(ResolverConfig::default().with_servers(servers))
    }

    pub fn with_config(config: ResolverConfig) -> Resolver {
        Resolver {
            config,
            unique: AtomicU16::new(rand::random()),
            cache: ResponseCache::new(),
            observer: None,
        }
    }

    /// Reports progress to `observer`, in addition to the log.
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn servers(&self) -> &[SocketAddr] {
        &self.config.servers
    }

    pub fn set_servers(&mut self, servers: Vec<SocketAddr>) {
        self.config.servers = servers;
    }

    pub fn transport(&self) -> TransportType {
        self.config.transport
    }

    pub fn set_transport(&mut self, transport: TransportType) {
        self.config.transport = transport;
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    pub fn retries(&self) -> u8 {
        self.config.retries
    }

    pub fn set_retries(&mut self, retries: u8) {
        self.config.retries = retries;
    }

    pub fn recursion(&self) -> bool {
        self.config.recursion
    }

    pub fn set_recursion(&mut self, recursion: bool) {
        self.config.recursion = recursion;
    }

    pub fn local_address(&self) -> Option<IpAddr> {
        self.config.local_address
    }

    pub fn set_local_address(&mut self, local_address: Option<IpAddr>) {
        self.config.local_address = local_address;
    }

    pub fn network_namespace(&self) -> Option<&str> {
        self.config.network_namespace.as_deref()
    }

    pub fn set_network_namespace(&mut self, name: Option<String>) {
        self.config.network_namespace = name;
    }

    pub fn use_cache(&self) -> bool {
        self.config.use_cache
    }

    /// Turning the cache off also empties it.
    pub fn set_use_cache(&mut self, use_cache: bool) {
        self.config.use_cache = use_cache;
        if !use_cache {
            self.clear_cache();
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Replaces the servers with the single `server`, which is either an IP
    /// address or a name to look up. Returns false, leaving the servers
    /// unchanged, if the name has no address.
    pub async fn set_dns_server(&mut self, server: &str, cancel: &CancellationToken) -> bool {
        if let Ok(ip) = server.parse::<IpAddr>() {
            self.config.servers = vec![SocketAddr::new(ip, DEFAULT_PORT)];
            return true;
        }

        let response = self.query(server, Type::A, cancel).await;
        let ip = response.answers.iter().find_map(|r| match r.resource {
            Resource::A(ip) => Some(IpAddr::V4(ip)),
            _ => None,
        });

        match ip {
            Some(ip) => {
                self.config.servers = vec![SocketAddr::new(ip, DEFAULT_PORT)];
                true
            }
            None => false,
        }
    }

    /// Looks up `name` in class IN.
    pub async fn query(&self, name: &str, r#type: Type, cancel: &CancellationToken) -> Response {
        self.query_with_class(name, r#type, Class::IN, cancel).await
    }

    pub async fn query_with_class(
        &self,
        name: &str,
        r#type: Type,
        class: Class,
        cancel: &CancellationToken,
    ) -> Response {
        if name.is_empty() {
            return Response::failed("Empty query name");
        }

        let question = Question::new(name, r#type, class);
        if self.config.use_cache {
            let key = CacheKey::new(question.name(), r#type, class);
            if let Some(response) = self.cache.get(&key) {
                log::debug!("answering {} from the cache", key);
                return response;
            }
        }

        let mut request = Request::new();
        request.header.set_rd(self.config.recursion);
        request.add_question(question);

        // Fail early on names that can't be encoded, rather than on every attempt.
        if let Err(e) = request.to_vec() {
            return Response::failed(e.to_string());
        }

        if self.config.servers.is_empty() {
            return Response::failed("No name servers configured");
        }

        let transport: Box<dyn Transport> = match self.config.transport {
            TransportType::Udp => Box::new(UdpClient::new(&self.config)),
            TransportType::Tcp => Box::new(TcpClient::new(&self.config)),
        };

        self.exchange(transport.as_ref(), request, cancel).await
    }

    /// Tries each server in turn, `retries + 1` times over.
    async fn exchange(
        &self,
        transport: &dyn Transport,
        mut request: Request,
        cancel: &CancellationToken,
    ) -> Response {
        let mut attempts = 0;

        for attempt in 0..=self.config.retries {
            for &server in &self.config.servers {
                if cancel.is_cancelled() {
                    return self.cancelled();
                }

                request.header.id = self.unique.fetch_add(1, Ordering::Relaxed);
                attempts += 1;
                log::debug!(
                    "attempt {} to {} with id {}",
                    attempt + 1,
                    server,
                    request.header.id
                );

                let result = tokio::select! {
                    _ = cancel.cancelled() => Err(Error::Cancelled),
                    result = transport.exchange(server, &request) => result,
                };

                match result {
                    Ok(response) => {
                        if response.header.id != request.header.id {
                            log::debug!(
                                "reply from {} has id {}, expected {}",
                                server,
                                response.header.id,
                                request.header.id
                            );
                        }

                        if self.config.use_cache && !request.is_zone_transfer() {
                            self.cache.insert(&response);
                        }
                        return response;
                    }
                    Err(Error::Cancelled) => return self.cancelled(),
                    Err(e) => {
                        log::warn!(";; Connection to nameserver {} failed: {}", server, e);
                        self.emit(Event::ConnectionFailed {
                            server,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        log::warn!("no reply after {} attempts", attempts);
        self.emit(Event::RetriesExhausted { attempts });
        Response::failed(CONNECTION_FAILED)
    }

    fn cancelled(&self) -> Response {
        log::debug!("query cancelled");
        self.emit(Event::Cancelled);
        Response::failed(OPERATION_CANCELLED)
    }

    fn emit(&self, event: Event) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }

    /// Resolves a host name to its addresses. IP addresses are first
    /// reverse resolved to their name.
    pub async fn get_host_entry(&self, host_or_ip: &str, cancel: &CancellationToken) -> HostEntry {
        match host_or_ip.parse::<IpAddr>() {
            Ok(ip) => self.get_host_entry_by_ip(ip, cancel).await,
            Err(_) => self.make_entry(host_or_ip, cancel).await,
        }
    }

    /// Finds the name of `ip` with a PTR query, then resolves that name.
    pub async fn get_host_entry_by_ip(&self, ip: IpAddr, cancel: &CancellationToken) -> HostEntry {
        let response = self.query(&arpa_from_ip(ip), Type::PTR, cancel).await;
        let name = response.answers.iter().find_map(|r| match &r.resource {
            Resource::PTR(name) => Some(name.clone()),
            _ => None,
        });

        match name {
            Some(name) => self.make_entry(&name, cancel).await,
            None => HostEntry::default(),
        }
    }

    async fn make_entry(&self, host_name: &str, cancel: &CancellationToken) -> HostEntry {
        let mut entry = HostEntry {
            host_name: host_name.to_string(),
            ..Default::default()
        };

        let response = self.query(host_name, Type::A, cancel).await;
        for answer in &response.answers {
            match &answer.resource {
                Resource::A(ip) => {
                    let ip = IpAddr::V4(*ip);
                    if !entry.addresses.contains(&ip) {
                        entry.addresses.push(ip);
                    }
                    entry.host_name = answer.name.clone();
                }
                Resource::CNAME(_) => {
                    if !entry.aliases.contains(&answer.name) {
                        entry.aliases.push(answer.name.clone());
                    }
                }
                _ => (),
            }
        }

        entry
    }
}

/// The reverse lookup name of `ip`, for example `4.3.2.1.in-addr.arpa.`.
pub fn arpa_from_ip(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(ip) => {
            let octets: String = ip.octets().iter().rev().map(|b| format!("{}.", b)).collect();
            octets + "in-addr.arpa."
        }
        IpAddr::V6(ip) => {
            let nibbles: String = ip
                .octets()
                .iter()
                .rev()
                .map(|b| format!("{:x}.{:x}.", b & 0xf, b >> 4))
                .collect();
            nibbles + "ip6.arpa."
        }
    }
}

/// The ENUM domain of a telephone number (rfc6116), for example
/// `+1-555-1234` becomes `4.3.2.1.5.5.5.1.e164.arpa.`. Anything other
/// than a digit is ignored.
pub fn arpa_from_enum(number: &str) -> String {
    let mut arpa: String = number
        .chars()
        .rev()
        .filter(char::is_ascii_digit)
        .flat_map(|c| [c, '.'])
        .collect();
    arpa.push_str("e164.arpa.");
    arpa
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::Mutex;

    fn servers() -> Vec<SocketAddr> {
        vec![
            "192.0.2.1:53".parse().unwrap(),
            "192.0.2.2:53".parse().unwrap(),
        ]
    }

    /// Refuses every attempt, recording who was asked with what id.
    #[derive(Default)]
    struct Refusing {
        calls: Mutex<Vec<(SocketAddr, u16)>>,
    }

    #[async_trait]
    impl Transport for Refusing {
        async fn exchange(&self, server: SocketAddr, request: &Request) -> Result<Response> {
            self.calls.lock().unwrap().push((server, request.header.id));
            Err(io::Error::from(io::ErrorKind::ConnectionRefused).into())
        }
    }

    /// Never replies.
    struct Silent;

    #[async_trait]
    impl Transport for Silent {
        async fn exchange(&self, _server: SocketAddr, _request: &Request) -> Result<Response> {
            std::future::pending().await
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Event>>);

    impl Observer for Recorder {
        fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn request() -> Request {
        let mut request = Request::new();
        request.add_question(Question::new("example.com.", Type::A, Class::IN));
        request
    }

    #[tokio::test]
    async fn test_retry_order() {
        let recorder = Arc::new(Recorder::default());
        let resolver = Resolver::with_config(
            ResolverConfig::default()
                .with_servers(servers())
                .with_retries(1),
        )
        .with_observer(recorder.clone());

        let transport = Refusing::default();
        let response = resolver
            .exchange(&transport, request(), &CancellationToken::new())
            .await;

        assert_eq!(response.error, CONNECTION_FAILED);

        let calls = transport.calls.lock().unwrap();
        let asked: Vec<SocketAddr> = calls.iter().map(|(s, _)| *s).collect();
        assert_eq!(asked, [servers(), servers()].concat());

        // A fresh id for every attempt.
        for pair in calls.windows(2) {
            assert_eq!(pair[1].1, pair[0].1.wrapping_add(1));
        }

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], Event::ConnectionFailed { server, .. } if server == servers()[0]));
        assert_eq!(events[4], Event::RetriesExhausted { attempts: 4 });
    }

    #[tokio::test]
    async fn test_cancel_in_flight() {
        let recorder = Arc::new(Recorder::default());
        let resolver = Resolver::new(servers()).with_observer(recorder.clone());

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let response = resolver.exchange(&Silent, request(), &cancel).await;
        assert_eq!(response.error, OPERATION_CANCELLED);
        assert_eq!(*recorder.0.lock().unwrap(), vec![Event::Cancelled]);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let resolver = Resolver::new(servers());
        let transport = Refusing::default();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let response = resolver.exchange(&transport, request(), &cancel).await;
        assert_eq!(response.error, OPERATION_CANCELLED);
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_queries() {
        let cancel = CancellationToken::new();

        let resolver = Resolver::new(Vec::new());
        let response = resolver.query("example.com", Type::A, &cancel).await;
        assert!(!response.error.is_empty());

        let resolver = Resolver::new(servers());
        assert!(!resolver.query("", Type::A, &cancel).await.error.is_empty());

        let long = format!("{}.com", "a".repeat(64));
        assert!(!resolver.query(&long, Type::A, &cancel).await.error.is_empty());
    }

    #[tokio::test]
    async fn test_set_dns_server_ip() {
        let mut resolver = Resolver::new(servers());
        assert!(
            resolver
                .set_dns_server("2001:db8::53", &CancellationToken::new())
                .await
        );
        let expected: SocketAddr = "[2001:db8::53]:53".parse().unwrap();
        assert_eq!(resolver.servers(), &[expected]);
    }

    #[test]
    fn test_set_use_cache_clears() {
        let mut resolver = Resolver::new(servers());

        let mut response = Response::default();
        response.questions.push(Question::new("example.com.", Type::A, Class::IN));
        assert!(resolver.cache().insert(&response));

        resolver.set_use_cache(false);
        assert!(resolver.cache().is_empty());
        assert!(!resolver.use_cache());
    }

    #[test]
    fn test_arpa_from_ip() {
        assert_eq!(
            arpa_from_ip("192.0.2.1".parse().unwrap()),
            "1.2.0.192.in-addr.arpa."
        );
        assert_eq!(
            arpa_from_ip("2001:db8::567:89ab".parse().unwrap()),
            "b.a.9.8.7.6.5.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa."
        );
    }

    #[test]
    fn test_arpa_from_enum() {
        assert_eq!(arpa_from_enum("+1-555-1234"), "4.3.2.1.5.5.5.1.e164.arpa.");
        assert_eq!(arpa_from_enum("none"), "e164.arpa.");
    }
}
