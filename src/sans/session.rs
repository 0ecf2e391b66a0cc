//! States of a sync session.
//!
//! A session serves one connection from accept to close:
//!
//! ```text
//! AwaitingRequest ──▶ SyncRequested ──▶ Serving ──▶ AwaitingAck ──▶ Closed
//!        │                  │              │
//!        └──────────────────┴──────────────┴──────────────────────▶ Closed
//! ```
//!
//! Each state token is consumed by its `advance` method (or, for
//! [`SyncRequested`], by [`SyncRequested::serve`]), which returns the
//! successor. Only [`AwaitingRequest`] can be constructed directly.

use alloc::vec::Vec;
use core::time::Duration;

use either::Either::{self, Left, Right};
use thiserror::Error;

/// Substrings that must both appear in a sync request.
pub const SYNC_MARKERS: [&[u8]; 2] = [b"\"action\"", b"\"sync\""];

/// Substring that marks an acknowledgement.
pub const ACK_MARKER: &[u8] = b"\"ack\"";

/// Timing and sizing of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long to wait for a request before giving up.
    pub request_timeout: Duration,
    /// How long to wait for an acknowledgement after responding.
    pub ack_timeout: Duration,
    /// How long a response may go without any bytes being taken.
    pub send_timeout: Duration,
    /// Pause between polls of an idle connection.
    pub poll_interval: Duration,
    /// Largest request kept, in bytes.
    pub request_capacity: usize,
    /// Largest response produced, in bytes.
    pub response_capacity: usize,
    /// Largest single send, in bytes.
    pub chunk_size: usize,
    /// Pause after each successful send.
    pub chunk_pacing: Duration,
    /// Pause before retrying a send the connection could not take.
    pub retry_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(5000),
            ack_timeout: Duration::from_millis(2000),
            send_timeout: Duration::from_millis(5000),
            poll_interval: Duration::from_millis(10),
            request_capacity: 1023,
            response_capacity: 65536,
            chunk_size: 512,
            chunk_pacing: Duration::from_millis(1),
            retry_delay: Duration::from_millis(5),
        }
    }
}

/// Result of polling a connection for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received<'a> {
    /// Bytes arrived.
    Data(&'a [u8]),
    /// Nothing has arrived yet.
    Pending,
    /// The peer closed the connection.
    Disconnected,
    /// The connection failed.
    Failed,
}

/// Result of offering bytes to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sent {
    /// This many bytes were taken.
    Bytes(usize),
    /// The connection cannot take bytes right now.
    WouldBlock,
    /// The connection failed.
    Failed,
}

/// Why a session ended without serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Failure {
    /// No request arrived in time.
    #[error("Timed out waiting for a request.")]
    Timeout,
    /// The peer closed the connection before sending a request.
    #[error("Client disconnected.")]
    Disconnected,
    /// Receiving failed.
    #[error("Receive failed.")]
    Receive,
    /// Sending failed part way through the response.
    #[error("Send failed.")]
    Send,
    /// The connection took no bytes for too long.
    #[error("Send stalled.")]
    Stalled,
    /// The response encoder produced nothing to send.
    #[error("Response was empty.")]
    EmptyResponse,
}

impl Failure {
    /// Numeric code reported to the operator.
    pub fn code(self) -> i32 {
        match self {
            // One send-error code; the message tells these apart in logs.
            Self::Send | Self::Stalled | Self::EmptyResponse => -6,
            Self::Receive => -7,
            Self::Timeout => -8,
            Self::Disconnected => -9,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The response was sent in full.
    Synced {
        /// Whether the client acknowledged it.
        acknowledged: bool,
    },
    /// The request was not a sync request, and was not answered.
    Unrecognized {
        /// The request as received.
        request: Vec<u8>,
    },
    /// The session failed.
    Failed(Failure),
}

/// State token to wait for a request.
#[derive(Debug)]
pub struct AwaitingRequest {
    buffer: Vec<u8>,
    capacity: usize,
    waited: Duration,
    timeout: Duration,
}

impl AwaitingRequest {
    /// Begin a session on a freshly accepted connection.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            buffer: Vec::new(),
            capacity: config.request_capacity.max(1),
            waited: Duration::ZERO,
            timeout: config.request_timeout,
        }
    }

    /// Number of further request bytes that will be kept.
    pub fn room(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    /// Transition to another state with the result of a poll, made `elapsed`
    /// after the previous one.
    ///
    /// Returns a successor state token.
    pub fn advance(
        mut self,
        received: Received<'_>,
        elapsed: Duration,
    ) -> Either<Self, Either<SyncRequested, Closed>> {
        self.waited += elapsed;

        let bytes = match received {
            Received::Data(bytes) => bytes,
            Received::Pending if self.waited < self.timeout => return Left(self),
            Received::Pending => return Right(Right(self.expire())),
            Received::Disconnected => return Right(Right(Closed::failed(Failure::Disconnected))),
            Received::Failed => return Right(Right(Closed::failed(Failure::Receive))),
        };

        let take = bytes.len().min(self.room());
        self.buffer.extend_from_slice(&bytes[..take]);

        if is_sync_request(&self.buffer) {
            return Right(Left(SyncRequested {
                request: self.buffer,
            }));
        }

        if self.room() == 0 || looks_complete(&self.buffer) {
            return Right(Right(Closed {
                outcome: Outcome::Unrecognized {
                    request: self.buffer,
                },
            }));
        }

        if self.waited < self.timeout {
            Left(self)
        } else {
            Right(Right(self.expire()))
        }
    }

    /// Close once the timeout has passed. Whatever partial request arrived
    /// is judged as it stands.
    fn expire(self) -> Closed {
        if self.buffer.is_empty() {
            Closed::failed(Failure::Timeout)
        } else {
            Closed {
                outcome: Outcome::Unrecognized {
                    request: self.buffer,
                },
            }
        }
    }
}

/// State token holding a recognised sync request, awaiting its response.
#[derive(Debug)]
pub struct SyncRequested {
    request: Vec<u8>,
}

impl SyncRequested {
    /// The request as received.
    pub fn request(&self) -> &[u8] {
        &self.request
    }

    /// Transition to another state by supplying the encoded response.
    ///
    /// Returns a successor state token.
    pub fn serve(self, payload: Vec<u8>, config: &SessionConfig) -> Either<Serving, Closed> {
        if payload.is_empty() {
            return Right(Closed::failed(Failure::EmptyResponse));
        }

        Left(Serving {
            payload,
            sent: 0,
            chunk_size: config.chunk_size.max(1),
            stalled: Duration::ZERO,
            send_timeout: config.send_timeout,
            ack_timeout: config.ack_timeout,
        })
    }
}

/// State token to send the response.
#[derive(Debug)]
pub struct Serving {
    payload: Vec<u8>,
    sent: usize,
    chunk_size: usize,
    stalled: Duration,
    send_timeout: Duration,
    ack_timeout: Duration,
}

impl Serving {
    /// The next bytes to offer the connection.
    pub fn chunk(&self) -> &[u8] {
        let end = self.payload.len().min(self.sent + self.chunk_size);
        &self.payload[self.sent..end]
    }

    /// Number of response bytes already sent.
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Total length of the response.
    pub fn total(&self) -> usize {
        self.payload.len()
    }

    /// Transition to another state with the result of offering
    /// [`Serving::chunk`] to the connection, made `elapsed` after the
    /// previous offer.
    ///
    /// Time spent blocked counts toward the send timeout until the connection
    /// takes bytes again.
    ///
    /// Returns a successor state token.
    pub fn advance(
        mut self,
        sent: Sent,
        elapsed: Duration,
    ) -> Either<Self, Either<AwaitingAck, Closed>> {
        match sent {
            Sent::WouldBlock => {
                self.stalled += elapsed;
                if self.stalled < self.send_timeout {
                    Left(self)
                } else {
                    Right(Right(Closed::failed(Failure::Stalled)))
                }
            }
            Sent::Failed | Sent::Bytes(0) => Right(Right(Closed::failed(Failure::Send))),
            Sent::Bytes(n) => {
                self.sent = self.payload.len().min(self.sent + n);
                self.stalled = Duration::ZERO;

                if self.sent < self.payload.len() {
                    Left(self)
                } else {
                    Right(Left(AwaitingAck {
                        waited: Duration::ZERO,
                        timeout: self.ack_timeout,
                    }))
                }
            }
        }
    }
}

/// State token to wait for an acknowledgement.
///
/// Any reply ends the wait. Whether the reply carries [`ACK_MARKER`] is
/// recorded in the outcome; the session is complete either way.
#[derive(Debug)]
pub struct AwaitingAck {
    waited: Duration,
    timeout: Duration,
}

impl AwaitingAck {
    /// Transition to another state with the result of a poll, made `elapsed`
    /// after the previous one.
    ///
    /// Returns a successor state token.
    pub fn advance(mut self, received: Received<'_>, elapsed: Duration) -> Either<Self, Closed> {
        self.waited += elapsed;

        let acknowledged = match received {
            Received::Pending if self.waited < self.timeout => return Left(self),
            Received::Data(bytes) => contains(bytes, ACK_MARKER),
            _ => false,
        };

        Right(Closed {
            outcome: Outcome::Synced { acknowledged },
        })
    }
}

/// Terminal state token. The driver must release the connection.
#[derive(Debug)]
pub struct Closed {
    outcome: Outcome,
}

impl Closed {
    fn failed(failure: Failure) -> Self {
        Self {
            outcome: Outcome::Failed(failure),
        }
    }

    /// How the session ended.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn into_outcome(self) -> Outcome {
        self.outcome
    }
}

/// Whether a request asks for a sync.
///
/// Matching is by substring, so clients need not send strictly valid JSON.
pub fn is_sync_request(r: &[u8]) -> bool {
    SYNC_MARKERS.iter().all(|m| contains(r, m))
}

/// Whether a request appears to have been received in full.
fn looks_complete(r: &[u8]) -> bool {
    matches!(r.trim_ascii_end().last(), Some(b'}')) || r.ends_with(b"\n")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
