//! Low-level async netlink socket bound to NETLINK_SOCK_DIAG.

use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::{Error, Result};

/// Async netlink socket for the socket diagnostics family.
///
/// The descriptor is closed when the socket is dropped.
pub struct NetlinkSocket {
    /// The underlying async file descriptor.
    fd: AsyncFd<Socket>,
    /// Local port ID (assigned by kernel).
    pid: u32,
}

impl NetlinkSocket {
    /// Create and bind a new NETLINK_SOCK_DIAG socket.
    pub fn new() -> Result<Self> {
        Self::create_socket().map_err(Error::SocketCreationFailed)
    }

    fn create_socket() -> io::Result<Self> {
        let mut socket = Socket::new(protocols::NETLINK_SOCK_DIAG)?;
        socket.set_non_blocking(true)?;

        // Bind to get a port ID
        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        let pid = addr.port_number();

        // SAFETY: the socket owns its descriptor, which stays open until
        // the AsyncFd and the socket inside it are dropped together.
        let fd = unsafe { AsyncFd::register(socket) }?;

        Ok(Self { fd, pid })
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Send a complete message as one datagram.
    pub async fn send(&self, msg: &[u8]) -> Result<()> {
        loop {
            let mut guard = self
                .fd
                .ready(Interest::WRITABLE)
                .await
                .map_err(Error::SendFailed)?;

            match guard.try_io(|inner| inner.get_ref().send(msg, 0)) {
                Ok(Ok(sent)) if sent == msg.len() => return Ok(()),
                Ok(Ok(sent)) => {
                    return Err(Error::SendFailed(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("short send: {} of {} bytes", sent, msg.len()),
                    )));
                }
                Ok(Err(e)) => return Err(Error::SendFailed(e)),
                Err(_would_block) => continue,
            }
        }
    }

    /// Receive one datagram into `buf`, growing it to fit.
    ///
    /// The pending datagram is first peeked with `MSG_TRUNC` so its real
    /// size is known before it is consumed; netlink silently drops the tail
    /// of a datagram read into a buffer that is too small.
    pub async fn recv_datagram(&self, buf: &mut BytesMut) -> Result<usize> {
        loop {
            let mut guard = self
                .fd
                .ready(Interest::READABLE)
                .await
                .map_err(Error::ReceiveFailed)?;

            let result = guard.try_io(|inner| {
                let socket = inner.get_ref();

                buf.clear();
                let pending = socket.recv(buf, libc::MSG_PEEK | libc::MSG_TRUNC)?;
                buf.clear();
                if pending > buf.capacity() {
                    buf.reserve(pending);
                }

                socket.recv(buf, 0)
            });

            match result {
                Ok(Ok(n)) => return Ok(n),
                Ok(Err(e)) => return Err(Error::ReceiveFailed(e)),
                Err(_would_block) => continue,
            }
        }
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}
