//! Connection-driven session implementation.
//!
//! _Requires Cargo feature `net`._

use std::{
    io,
    string::{String, ToString},
    vec,
};

use either::Either::{Left, Right};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::{
    SaveData,
    sans::{
        response::{encode_error, encode_response},
        session::{AwaitingRequest, Failure, Outcome, Received, SessionConfig, Sent},
    },
};

use super::{load, net::Connection};

extern crate std;

/// Something that can be rendered as a sync response.
pub trait Respond {
    /// Encode the response into a buffer, returning the number of bytes
    /// written.
    fn respond(&self, out: &mut [u8]) -> usize;
}

impl Respond for SaveData {
    fn respond(&self, out: &mut [u8]) -> usize {
        encode_response(self, out)
    }
}

/// A load failure is answered with an error response, so clients can tell
/// "no data, because..." apart from a transport failure.
impl Respond for Result<SaveData, load::Error> {
    fn respond(&self, out: &mut [u8]) -> usize {
        match self {
            Ok(save) => encode_response(save, out),
            Err(e) => encode_error(e.code(), &e.to_string(), out),
        }
    }
}

/// Serve one session on a connection, then release it.
///
/// The response is rendered only once a sync request has been recognised.
pub async fn serve<C: Connection, R: Respond + ?Sized>(
    mut conn: C,
    response: &R,
    config: &SessionConfig,
) -> Outcome {
    let outcome = drive(&mut conn, response, config).await;
    conn.close();
    outcome
}

async fn drive<C: Connection, R: Respond + ?Sized>(
    conn: &mut C,
    response: &R,
    config: &SessionConfig,
) -> Outcome {
    let mut buf = vec![0; config.request_capacity.max(1)];
    let mut last = Instant::now();

    info!("waiting for sync request");

    let mut state = AwaitingRequest::new(config);

    let requested = loop {
        let room = state.room().min(buf.len());
        let result = conn.receive(&mut buf[..room]);

        let received = received(result, &buf, "request");
        state = match state.advance(received, tick(&mut last)) {
            Left(state) => state,
            Right(Left(requested)) => break requested,
            Right(Right(closed)) => {
                if let Outcome::Unrecognized { request } = closed.outcome() {
                    info!(request = %preview(request), "unknown request");
                }
                return closed.into_outcome();
            }
        };

        sleep(config.poll_interval).await;
    };

    info!("sync request received");

    let mut payload = vec![0; config.response_capacity];
    let len = response.respond(&mut payload);
    payload.truncate(len);

    debug!(len, "encoded response");

    let mut serving = match requested.serve(payload, config) {
        Left(serving) => serving,
        Right(closed) => return closed.into_outcome(),
    };

    last = Instant::now();

    let mut state = loop {
        let sent = match conn.send(serving.chunk()) {
            Ok(n) => Sent::Bytes(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Sent::WouldBlock,
            Err(e) => {
                warn!(error = %e, sent = serving.sent(), "send failed");
                Sent::Failed
            }
        };

        let pause = match sent {
            Sent::WouldBlock => config.retry_delay,
            _ => config.chunk_pacing,
        };

        let progress = serving.sent();

        serving = match serving.advance(sent, tick(&mut last)) {
            Left(serving) => serving,
            Right(Left(awaiting)) => break awaiting,
            Right(Right(closed)) => {
                if let Outcome::Failed(Failure::Stalled) = closed.outcome() {
                    warn!(sent = progress, "client stopped reading");
                }
                return closed.into_outcome();
            }
        };

        sleep(pause).await;
    };

    info!(bytes = len, "response sent");
    last = Instant::now();

    loop {
        let result = conn.receive(&mut buf);

        let received = received(result, &buf, "acknowledgement");
        state = match state.advance(received, tick(&mut last)) {
            Left(state) => state,
            Right(closed) => return closed.into_outcome(),
        };

        sleep(config.poll_interval).await;
    }
}

/// Classify the result of a receive.
fn received<'a>(result: io::Result<usize>, buf: &'a [u8], waiting_for: &str) -> Received<'a> {
    match result {
        Ok(0) => {
            debug!(waiting_for, "client disconnected");
            Received::Disconnected
        }
        Ok(n) => Received::Data(&buf[..n]),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Received::Pending,
        Err(e) => {
            warn!(error = %e, waiting_for, "receive failed");
            Received::Failed
        }
    }
}

/// Time since the previous call.
fn tick(last: &mut Instant) -> std::time::Duration {
    let now = Instant::now();
    let elapsed = now - *last;
    *last = now;
    elapsed
}

/// The start of a request, for logging.
fn preview(request: &[u8]) -> String {
    let end = request.len().min(50);
    String::from_utf8_lossy(&request[..end]).into_owned()
}
