use crate::clients::net::{bounded, SocketOptions};
use crate::clients::{ResolverConfig, Transport};
use crate::errors::Result;
use crate::{Request, Response};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

/// Largest datagram we can receive.
const MAX_DATAGRAM: usize = 65535;

/// A UDP DNS Client.
///
/// Each exchange uses a fresh socket, sends the query once and waits for a
/// single datagram. Retrying is left to the [`crate::clients::Resolver`].
///
/// See <https://datatracker.ietf.org/doc/html/rfc1035#section-4.2.1>
pub struct UdpClient {
    timeout: Duration,
    options: SocketOptions,
}

impl UdpClient {
    pub fn new(config: &ResolverConfig) -> UdpClient {
        UdpClient {
            timeout: config.timeout,
            options: SocketOptions {
                local_address: config.local_address,
                network_namespace: config.network_namespace.clone(),
            },
        }
    }
}

#[async_trait]
impl Transport for UdpClient {
    /// Sends the [`Request`] to the `server` via UDP and returns the result.
    async fn exchange(&self, server: SocketAddr, request: &Request) -> Result<Response> {
        let req = request.to_vec()?;

        let socket = UdpSocket::from_std(self.options.udp_socket(server)?)?;

        // Connect us to the server, meaning recv will only receive directly
        // from the server.
        bounded(self.timeout, server, socket.connect(server)).await?;
        bounded(self.timeout, server, socket.send(&req)).await?;

        let mut buf = vec![0; MAX_DATAGRAM];
        let len = bounded(self.timeout, server, socket.recv(&mut buf)).await?;

        log::debug!("received {} bytes from {} over udp", len, server);
        Ok(Response::from_slice(server, &buf[..len]))
    }
}
