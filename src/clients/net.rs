//! Socket construction shared by the transports.

use crate::errors::{Error, Result};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

/// Runs one I/O step, failing with [`Error::Timeout`] if it takes longer than `timeout`.
pub(crate) async fn bounded<T, F>(timeout: Duration, server: SocketAddr, f: F) -> Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(Error::Timeout(server)),
    }
}

/// Options for new sockets.
#[derive(Clone, Debug, Default)]
pub(crate) struct SocketOptions {
    pub local_address: Option<IpAddr>,
    pub network_namespace: Option<String>,
}

impl SocketOptions {
    /// Creates a non-blocking UDP socket able to reach `server`, bound to the
    /// local address if one is set.
    pub fn udp_socket(&self, server: SocketAddr) -> Result<std::net::UdpSocket> {
        let socket = self.socket(server, Type::DGRAM, Protocol::UDP)?;
        // UDP always binds, picking an ephemeral port.
        socket.bind(&SockAddr::from(self.bind_address(server)))?;
        Ok(socket.into())
    }

    /// Creates a non-blocking, unconnected TCP socket able to reach `server`.
    pub fn tcp_socket(&self, server: SocketAddr) -> Result<std::net::TcpStream> {
        let socket = self.socket(server, Type::STREAM, Protocol::TCP)?;
        if self.local_address.is_some() {
            socket.bind(&SockAddr::from(self.bind_address(server)))?;
        }
        Ok(socket.into())
    }

    fn bind_address(&self, server: SocketAddr) -> SocketAddr {
        let ip = match (self.local_address, server) {
            (Some(ip), _) => ip,
            (None, SocketAddr::V4(_)) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            (None, SocketAddr::V6(_)) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        SocketAddr::new(ip, 0)
    }

    fn socket(&self, server: SocketAddr, ty: Type, protocol: Protocol) -> Result<Socket> {
        let socket = in_namespace(self.network_namespace.as_deref(), || {
            Socket::new(Domain::for_address(server), ty, Some(protocol))
        })?;
        socket.set_nonblocking(true)?;
        Ok(socket)
    }
}

/// Calls `f` with the current thread switched into the named network
/// namespace, then switches back. Sockets keep the namespace they were
/// created in.
#[cfg(target_os = "linux")]
fn in_namespace<T>(name: Option<&str>, f: impl FnOnce() -> io::Result<T>) -> Result<T> {
    use std::fs::File;
    use std::path::Path;

    let name = match name {
        Some(name) => name,
        None => return Ok(f()?),
    };

    let current = File::open("/proc/thread-self/ns/net")?;
    let target = File::open(Path::new("/var/run/netns").join(name))?;

    setns(&target)?;
    let result = f();
    if let Err(e) = setns(&current) {
        log::warn!("failed to leave network namespace '{}': {}", name, e);
        return Err(e.into());
    }

    Ok(result?)
}

#[cfg(target_os = "linux")]
fn setns(ns: &std::fs::File) -> io::Result<()> {
    use nix::sched::CloneFlags;
    nix::sched::setns(ns, CloneFlags::CLONE_NEWNET)?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn in_namespace<T>(name: Option<&str>, f: impl FnOnce() -> io::Result<T>) -> Result<T> {
    if let Some(name) = name {
        log::warn!(
            "network namespaces are only supported on Linux, ignoring '{}'",
            name
        );
    }
    Ok(f()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let v4: SocketAddr = "192.0.2.1:53".parse().unwrap();
        let v6: SocketAddr = "[2001:db8::1]:53".parse().unwrap();

        let options = SocketOptions::default();
        assert_eq!(options.bind_address(v4), "0.0.0.0:0".parse::<SocketAddr>().unwrap());
        assert_eq!(options.bind_address(v6), "[::]:0".parse::<SocketAddr>().unwrap());

        let options = SocketOptions {
            local_address: Some("127.0.0.1".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(options.bind_address(v4), "127.0.0.1:0".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_udp_socket_binds_local_address() {
        let options = SocketOptions {
            local_address: Some("127.0.0.1".parse().unwrap()),
            ..Default::default()
        };
        let socket = options.udp_socket("127.0.0.1:53".parse().unwrap()).unwrap();
        assert_eq!(socket.local_addr().unwrap().ip(), options.local_address.unwrap());
    }

    #[test]
    fn test_missing_namespace() {
        let options = SocketOptions {
            network_namespace: Some("stubdns-does-not-exist".to_string()),
            ..Default::default()
        };
        let result = options.udp_socket("127.0.0.1:53".parse().unwrap());
        if cfg!(target_os = "linux") {
            assert!(result.is_err());
        } else {
            assert!(result.is_ok());
        }
    }
}
