//! Result stream API (C6): exposes the poll engine as a lazy, pull-based
//! sequence (§4.6). Consumers drive it with [`futures::StreamExt`]; the
//! engine only does work in response to being polled — there is no
//! background task pushing into a channel.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use futures::Stream;

use crate::engine::PollEngine;
use crate::error::Result;
use crate::result::PollResult;

struct State {
    engine: PollEngine,
    finished: bool,
}

/// The lazy, finite, single-pass sequence of [`PollResult`]s returned by
/// [`crate::poll`]. A fatal error (`Error::Fatal` or `Error::Fault`) ends
/// the stream with `Some(Err(_))` as its last item (§7).
pub struct PollStream {
    inner: Pin<Box<dyn Stream<Item = Result<PollResult>> + Send>>,
    cancel: Arc<AtomicBool>,
}

impl PollStream {
    pub(crate) fn new(engine: PollEngine) -> Self {
        let cancel = engine.cancel_flag();
        let state = State {
            engine,
            finished: false,
        };
        let inner = futures::stream::unfold(state, Self::advance);
        PollStream {
            inner: Box::pin(inner),
            cancel,
        }
    }

    /// Drive the engine until it has a result to yield, or is done, or hits
    /// a fatal error. One call may run several loop iterations internally —
    /// a single iteration can legitimately produce zero results (e.g. a
    /// receive pass that only advanced timeouts).
    async fn advance(mut state: State) -> Option<(Result<PollResult>, State)> {
        if state.finished {
            return None;
        }
        loop {
            if let Some(result) = state.engine.pop_ready() {
                return Some((Ok(result), state));
            }
            if state.engine.is_done() {
                state.finished = true;
                return None;
            }
            if let Err(err) = state.engine.drive_one_iteration().await {
                state.finished = true;
                return Some((Err(err), state));
            }
        }
    }

    /// Best-effort cancellation (§4.6: "implementations MAY surface an
    /// explicit cancel handle"). Stops dispatching new jobs and issuing
    /// walk continuations; anything already in flight winds down through
    /// its existing reply or timeout path rather than being aborted
    /// mid-`sendto`.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

impl Stream for PollStream {
    type Item = Result<PollResult>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
