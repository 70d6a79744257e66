//! Request/reply exchange over a sock_diag socket.

use std::io::{self, Write};
use std::time::Duration;

use bytes::BytesMut;
use tracing::debug;

use super::decoder::{DecodeOutcome, DecodeState, Decoder};
use super::error::{Error, Result};
use super::message::NLMSG_HDRLEN;
use super::socket::NetlinkSocket;
use crate::sockdiag::record::SocketRecord;
use crate::sockdiag::request::DiagRequest;

/// Initial receive buffer size; grown on demand.
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Options for a [`Connection`].
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use inetdiag::netlink::ConnectionConfig;
///
/// let config = ConnectionConfig::new()
///     .recv_timeout(Duration::from_secs(2))
///     .max_bytes(64 << 20);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    recv_timeout: Option<Duration>,
    max_bytes: Option<usize>,
    buffer_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            recv_timeout: None,
            max_bytes: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ConnectionConfig {
    /// Create a configuration with no timeout and no byte ceiling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail a receive that waits longer than `timeout`.
    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }

    /// Abort a dump whose reply grows past `limit` bytes.
    pub fn max_bytes(mut self, limit: usize) -> Self {
        self.max_bytes = Some(limit);
        self
    }

    /// Set the initial receive buffer size.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Configured receive timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.recv_timeout
    }

    /// Configured byte ceiling.
    pub fn byte_limit(&self) -> Option<usize> {
        self.max_bytes
    }

    /// Configured initial buffer size.
    pub fn initial_buffer_size(&self) -> usize {
        self.buffer_size
    }
}

/// A sock_diag connection.
///
/// Each call to [`query`](Self::query) sends one request and collects its
/// whole reply. The socket is closed when the connection is dropped.
pub struct Connection {
    socket: NetlinkSocket,
    config: ConnectionConfig,
}

impl Connection {
    /// Open a socket with the given options.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new()?,
            config,
        })
    }

    /// Get the underlying socket.
    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }

    /// Get the connection options.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Send `request` and collect every record of the dump.
    ///
    /// Each raw reply datagram is written to `sink`, when given, before it
    /// is decoded. Any error aborts the whole query.
    pub async fn query(
        &self,
        request: &DiagRequest,
        sink: Option<&mut (dyn Write + Send)>,
    ) -> Result<Vec<SocketRecord>> {
        debug!(
            seq = request.seq(),
            version = ?request.version(),
            family = ?request.family(),
            len = request.as_bytes().len(),
            "sending sock_diag request"
        );
        self.socket.send(request.as_bytes()).await?;

        let mut collector = ReplyCollector::new(request, self.config.max_bytes, sink);
        let mut buf = BytesMut::with_capacity(self.config.buffer_size);

        loop {
            let n = self.recv(&mut buf).await?;
            debug!(bytes = n, "received reply datagram");
            if collector.absorb(&buf[..n])? {
                break;
            }
        }

        collector.finish()
    }

    async fn recv(&self, buf: &mut BytesMut) -> Result<usize> {
        let Some(limit) = self.config.recv_timeout else {
            return self.socket.recv_datagram(buf).await;
        };

        tokio::time::timeout(limit, self.socket.recv_datagram(buf))
            .await
            .map_err(|_| {
                Error::ReceiveFailed(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no reply within {:?}", limit),
                ))
            })?
    }
}

/// Per-query receive state: decoder, byte accounting and capture.
struct ReplyCollector<'a> {
    decoder: Decoder,
    records: Vec<SocketRecord>,
    received: usize,
    limit: Option<usize>,
    sink: Option<&'a mut (dyn Write + Send)>,
}

impl<'a> ReplyCollector<'a> {
    fn new(
        request: &DiagRequest,
        limit: Option<usize>,
        sink: Option<&'a mut (dyn Write + Send)>,
    ) -> Self {
        Self {
            decoder: Decoder::new(request.family(), Some(request.seq())),
            records: Vec::new(),
            received: 0,
            limit,
            sink,
        }
    }

    /// Take one datagram. Returns `true` once the dump is complete.
    fn absorb(&mut self, datagram: &[u8]) -> Result<bool> {
        self.received = self.received.saturating_add(datagram.len());

        if let Some(sink) = self.sink.as_mut() {
            sink.write_all(datagram).map_err(Error::Capture)?;
        }

        if datagram.len() < NLMSG_HDRLEN {
            return Err(Error::TruncatedMessage {
                expected: NLMSG_HDRLEN,
                actual: datagram.len(),
            });
        }

        let DecodeOutcome { records, state, .. } = self.decoder.decode(datagram)?;
        self.records.extend(records);
        if state == DecodeState::Done {
            return Ok(true);
        }

        if let Some(limit) = self.limit
            && self.received > limit
        {
            return Err(Error::ByteLimitExceeded {
                limit,
                received: self.received,
            });
        }

        Ok(false)
    }

    fn finish(mut self) -> Result<Vec<SocketRecord>> {
        if let Some(sink) = self.sink.as_mut() {
            sink.flush().map_err(Error::Capture)?;
        }
        debug!(
            records = self.records.len(),
            bytes = self.received,
            "sock_diag dump complete"
        );
        Ok(self.records)
    }
}
