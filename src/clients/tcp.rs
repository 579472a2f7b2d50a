use crate::bail;
use crate::clients::net::{bounded, SocketOptions};
use crate::clients::{ResolverConfig, Transport};
use crate::errors::{Error, Result};
use crate::types::{Rcode, Type};
use crate::{Request, Response};
use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};

/// Most records a zone transfer may accumulate before it is abandoned.
pub const MAX_TRANSFER_RECORDS: usize = 1 << 20;

/// A TCP DNS Client.
///
/// Zone transfers (a first question of type AXFR) read messages until the
/// second SOA record and return them merged into one [`Response`]. A
/// transfer that grows past its record limit fails, so the resolver moves on.
///
/// See <https://datatracker.ietf.org/doc/html/rfc1035#section-4.2.2>
pub struct TcpClient {
    timeout: Duration,
    options: SocketOptions,
    max_transfer_records: usize,
}

impl TcpClient {
    pub fn new(config: &ResolverConfig) -> TcpClient {
        TcpClient {
            timeout: config.timeout,
            options: SocketOptions {
                local_address: config.local_address,
                network_namespace: config.network_namespace.clone(),
            },
            max_transfer_records: MAX_TRANSFER_RECORDS,
        }
    }

    pub fn with_max_transfer_records(mut self, max: usize) -> Self {
        self.max_transfer_records = max;
        self
    }

    /// Reads one length prefixed message.
    async fn read_message(&self, stream: &mut TcpStream, server: SocketAddr) -> Result<Response> {
        let len = bounded(self.timeout, server, stream.read_u16()).await?;
        if len == 0 {
            return Err(Error::EmptyReply(server));
        }

        let mut buf = BytesMut::with_capacity(len.into());
        buf.resize(len.into(), 0);
        bounded(self.timeout, server, stream.read_exact(&mut buf)).await?;

        Ok(Response::from_slice(server, &buf))
    }
}

fn soa_count(response: &Response) -> usize {
    response.answers_of_type(Type::SOA).count()
}

#[async_trait]
impl Transport for TcpClient {
    /// Sends the [`Request`] to the `server` via TCP and returns the result.
    async fn exchange(&self, server: SocketAddr, request: &Request) -> Result<Response> {
        let message = request.to_vec()?;
        if message.len() > u16::MAX.into() {
            bail!(InvalidInput, "request of {} bytes is too large", message.len());
        }

        let socket = TcpSocket::from_std_stream(self.options.tcp_socket(server)?);
        let mut stream = bounded(self.timeout, server, socket.connect(server)).await?;
        stream.set_nodelay(true)?; // We send discrete packets, so we can send as soon as possible.

        // Two byte length prefix followed by the message, in one write.
        let mut frame = BytesMut::with_capacity(2 + message.len());
        frame.put_u16(message.len() as u16);
        frame.put_slice(&message);
        bounded(self.timeout, server, stream.write_all(&frame)).await?;

        let mut response = self.read_message(&mut stream, server).await?;
        if response.header.rcode() != Rcode::NoError || !request.is_zone_transfer() {
            return Ok(response);
        }

        // The zone starts and ends with its SOA record.
        let mut soas = soa_count(&response);
        let mut messages = 1;
        while soas < 2 {
            let next = self.read_message(&mut stream, server).await?;
            if next.header.rcode() != Rcode::NoError {
                return Ok(next);
            }

            soas += soa_count(&next);
            messages += 1;

            response.message_size += next.message_size;
            response.answers.extend(next.answers);
            response.authorities.extend(next.authorities);
            response.additionals.extend(next.additionals);

            let records = response.answers.len()
                + response.authorities.len()
                + response.additionals.len();
            if records > self.max_transfer_records {
                bail!(
                    InvalidData,
                    "zone transfer from {} passed {} records after {} messages",
                    server,
                    self.max_transfer_records,
                    messages
                );
            }
        }

        response.update_counts();
        log::debug!(
            "zone transfer from {} finished after {} messages with {} records",
            server,
            messages,
            response.answers.len()
        );

        Ok(response)
    }
}
