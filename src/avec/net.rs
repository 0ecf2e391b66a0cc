//! Connections, listeners, and the accept loop.
//!
//! _Requires Cargo feature `net`._

use std::{
    io,
    net::{AddrParseError, IpAddr, SocketAddr},
    string::String,
    task::{Context, Poll, Waker},
};

use thiserror::Error;
use tokio::net::{TcpSocket, TcpStream};
use tracing::{Instrument, info, info_span, warn};

use crate::sans::session::{Outcome, SessionConfig};

use super::session::{Respond, serve};

extern crate std;

/// Errors setting up or polling a listener.
#[derive(Debug, Error)]
pub enum Error {
    /// The listen address was not valid.
    #[error("Invalid listen address {address}: {source}")]
    Init {
        address: String,
        source: AddrParseError,
    },
    /// The socket could not be created or configured.
    #[error("Failed to create socket: {0}")]
    Socket(#[source] io::Error),
    /// The socket could not be bound.
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: SocketAddr,
        source: io::Error,
    },
    /// The socket could not listen.
    #[error("Failed to listen: {0}")]
    Listen(#[source] io::Error),
    /// A pending connection could not be accepted.
    #[error("Accept failed: {0}")]
    Accept(#[source] io::Error),
}

impl Error {
    /// Numeric code reported to the operator.
    pub fn code(&self) -> i32 {
        match self {
            Self::Init { .. } => -1,
            Self::Socket(_) => -2,
            Self::Bind { .. } => -3,
            Self::Listen(_) => -4,
            Self::Accept(_) => -5,
        }
    }
}

/// A non-blocking, bidirectional byte stream to one client.
///
/// Both methods return immediately. [`io::ErrorKind::WouldBlock`] means
/// nothing could be done yet, and reading zero bytes into a non-empty buffer
/// means the peer has disconnected.
pub trait Connection {
    /// Read whatever bytes have arrived.
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// Offer bytes, returning how many were taken.
    fn send(&mut self, buf: &[u8]) -> io::Result<usize>;
    /// Release the connection.
    fn close(self);
}

/// A source of client connections.
pub trait Listener {
    type Connection: Connection;

    /// Accept a pending connection, if there is one, without waiting.
    fn accept(&mut self) -> Result<Option<Self::Connection>, Error>;
}

/// A TCP listener accepting one pending connection at a time.
#[derive(Debug)]
pub struct TcpListener {
    inner: tokio::net::TcpListener,
}

impl TcpListener {
    /// Listen on a host and port.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(host: &str, port: u16) -> Result<Self, Error> {
        let ip: IpAddr = host.parse().map_err(|source| Error::Init {
            address: host.into(),
            source,
        })?;
        let address = SocketAddr::new(ip, port);

        let socket = match address {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(Error::Socket)?;

        socket.set_reuseaddr(true).map_err(Error::Socket)?;
        socket
            .bind(address)
            .map_err(|source| Error::Bind { address, source })?;

        let inner = socket.listen(1).map_err(Error::Listen)?;

        Ok(Self { inner })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

impl Listener for TcpListener {
    type Connection = TcpConnection;

    fn accept(&mut self) -> Result<Option<TcpConnection>, Error> {
        let mut cx = Context::from_waker(Waker::noop());

        match self.inner.poll_accept(&mut cx) {
            Poll::Ready(Ok((stream, peer))) => Ok(Some(TcpConnection { stream, peer })),
            Poll::Ready(Err(e)) => Err(Error::Accept(e)),
            Poll::Pending => Ok(None),
        }
    }
}

/// A TCP connection to one client.
#[derive(Debug)]
pub struct TcpConnection {
    stream: TcpStream,
    peer: SocketAddr,
}

impl TcpConnection {
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for TcpConnection {
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.try_read(buf)
    }

    fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.try_write(buf)
    }

    fn close(self) {
        drop(self.stream);
    }
}

/// Accept and serve connections until the returned future is dropped.
///
/// Sessions run one at a time, each to completion. A failed session or accept
/// is logged, and the listener carries on.
pub async fn serve_forever<L: Listener, R: Respond + ?Sized>(
    listener: &mut L,
    response: &R,
    config: &SessionConfig,
) {
    let mut id = 0u64;

    loop {
        let conn = match listener.accept() {
            Ok(Some(conn)) => conn,
            Ok(None) => {
                tokio::time::sleep(config.poll_interval).await;
                continue;
            }
            Err(e) => {
                warn!(error = %e, code = e.code(), "accept failed");
                tokio::time::sleep(config.poll_interval).await;
                continue;
            }
        };

        id += 1;
        let span = info_span!("session", id);

        let outcome = serve(conn, response, config).instrument(span.clone()).await;

        span.in_scope(|| match outcome {
            Outcome::Synced { acknowledged: true } => info!("sync completed"),
            Outcome::Synced { acknowledged: false } => info!("sync sent, not acknowledged"),
            Outcome::Unrecognized { .. } => info!("closed without response"),
            Outcome::Failed(failure) => warn!(%failure, code = failure.code(), "session failed"),
        });
    }
}
