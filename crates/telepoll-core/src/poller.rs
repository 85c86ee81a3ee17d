//! The event loop: poll, acknowledge, dispatch, forever.

use std::sync::Arc;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    config::PollerConfig, cursor::Cursor, dispatcher::Dispatcher,
    messaging::{port::UpdateSource, types::Update},
    Result,
};

/// Result of one successful Polling step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// This many updates were fetched and dispatched.
    Dispatched(usize),
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Polling,
    Backoff,
}

/// Owns the cursor, the update source and the dispatcher.
///
/// One instance per bot; nothing here is global, so several pollers can run side by side.
/// Updates are dispatched strictly one after another in the order the source returned them.
pub struct Poller {
    source: Arc<dyn UpdateSource>,
    dispatcher: Dispatcher,
    cursor: Cursor,
    cfg: PollerConfig,
}

impl Poller {
    pub fn new(source: Arc<dyn UpdateSource>, dispatcher: Dispatcher, cfg: PollerConfig) -> Self {
        Self {
            source,
            dispatcher,
            cursor: Cursor::default(),
            cfg,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// One Polling step: fetch since the cursor, advance it, dispatch the batch in order.
    ///
    /// On error the cursor is left where it was and nothing is dispatched.
    pub async fn poll_once(&mut self) -> Result<PollOutcome> {
        let batch = self.source.fetch(self.cursor.offset()).await?;
        Ok(self.dispatch_batch(batch).await)
    }

    async fn dispatch_batch(&mut self, batch: Vec<Update>) -> PollOutcome {
        if batch.is_empty() {
            return PollOutcome::Empty;
        }

        self.cursor.advance(&batch);
        debug!(
            updates = batch.len(),
            offset = self.cursor.offset(),
            "fetched batch"
        );

        for update in &batch {
            self.dispatcher.dispatch(update).await;
        }
        PollOutcome::Dispatched(batch.len())
    }

    /// Every failure leads to Backoff; only the log level depends on the error kind.
    fn after_poll(&self, res: Result<PollOutcome>) -> LoopState {
        let Err(e) = res else {
            return LoopState::Polling;
        };
        let backoff_ms = self.cfg.backoff.as_millis() as u64;
        if e.is_transient() {
            warn!(error = %e, offset = self.cursor.offset(), backoff_ms, "polling failed");
        } else {
            error!(
                error = %e,
                offset = self.cursor.offset(),
                backoff_ms,
                "polling failed with a non-remote error"
            );
        }
        LoopState::Backoff
    }

    /// Advance the state machine by one transition.
    pub async fn step(&mut self, state: LoopState) -> LoopState {
        match state {
            LoopState::Polling => {
                let res = self.poll_once().await;
                self.after_poll(res)
            }
            LoopState::Backoff => {
                sleep(self.cfg.backoff).await;
                LoopState::Polling
            }
        }
    }

    /// Run until the process exits.
    pub async fn run(mut self) {
        info!(offset = self.cursor.offset(), "polling started");
        let mut state = LoopState::Polling;
        loop {
            state = self.step(state).await;
        }
    }

    /// Like [`run`](Self::run), but stops once `cancel` fires.
    ///
    /// Cancellation interrupts a pending fetch or a backoff sleep. A batch that is being
    /// dispatched always runs to completion; an interrupted fetch leaves the cursor as is.
    pub async fn run_until(mut self, cancel: CancellationToken) {
        info!(offset = self.cursor.offset(), "polling started");
        let mut state = LoopState::Polling;
        while !cancel.is_cancelled() {
            state = match state {
                LoopState::Polling => {
                    let fetched = tokio::select! {
                        _ = cancel.cancelled() => break,
                        res = self.source.fetch(self.cursor.offset()) => res,
                    };
                    let res = match fetched {
                        Ok(batch) => Ok(self.dispatch_batch(batch).await),
                        Err(e) => Err(e),
                    };
                    self.after_poll(res)
                }
                LoopState::Backoff => tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = self.step(LoopState::Backoff) => next,
                },
            };
        }
        info!(offset = self.cursor.offset(), "polling stopped");
    }
}
