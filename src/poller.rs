//! The polling loop: fetch, validate, format, deliver, sleep, repeat.
//!
//! All mutable state lives in [`PollState`], which the caller owns and passes
//! into every cycle. A cycle never fails: its errors are reported to the chat
//! (deduplicated by text) and summarized in a [`CycleOutcome`]. Only a
//! configuration-kind error stops [`Poller::run`].

use crate::api::StatusSource;
use crate::config::STARTUP_MESSAGE;
use crate::error::BotError;
use crate::homework::{check_response, parse_status};
use crate::notifier::Notifier;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// State carried from one cycle to the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    /// Start of the next query window, Unix seconds
    pub cursor: i64,
    /// Text of the last error that reached the chat
    pub last_error: Option<String>,
}

impl PollState {
    /// Fresh state starting at `cursor`
    #[must_use]
    pub const fn new(cursor: i64) -> Self {
        Self {
            cursor,
            last_error: None,
        }
    }
}

/// What a single cycle ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Status message delivered, cursor moved to the server date
    Delivered,
    /// The API returned no homeworks
    NoUpdates,
    /// Status message formatted but not delivered
    DeliveryFailed,
    /// A new error was delivered to the chat
    ErrorReported(BotError),
    /// Same text as the last delivered error, not sent again
    ErrorSuppressed(BotError),
    /// A new error could not be delivered; it will be tried again next time
    ErrorUnreported(BotError),
    /// Unrecoverable error, the loop must stop
    Fatal(BotError),
}

/// Drives cycles against a status source and a notifier
pub struct Poller {
    source: Arc<dyn StatusSource>,
    notifier: Arc<dyn Notifier>,
    period: Duration,
}

impl Poller {
    /// Create a poller sleeping `period` between cycles
    #[must_use]
    pub fn new(
        source: Arc<dyn StatusSource>,
        notifier: Arc<dyn Notifier>,
        period: Duration,
    ) -> Self {
        Self {
            source,
            notifier,
            period,
        }
    }

    /// Run cycles until cancelled or a fatal error occurs.
    ///
    /// The period is measured from the end of each cycle. Cancellation also
    /// interrupts a cycle that is still waiting on the network; the state keeps
    /// whatever the interrupted cycle had not yet changed.
    ///
    /// # Errors
    ///
    /// Returns the first configuration-kind error raised by a cycle.
    pub async fn run(
        &self,
        mut state: PollState,
        cancel: CancellationToken,
    ) -> Result<PollState, BotError> {
        info!(
            cursor = state.cursor,
            period_secs = self.period.as_secs(),
            "Polling started"
        );

        while !cancel.is_cancelled() {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                outcome = self.run_cycle(&mut state) => outcome,
            };
            if let CycleOutcome::Fatal(err) = outcome {
                error!("CRITICAL: polling stopped: {err}");
                return Err(err);
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.period) => {}
            }
        }

        info!(cursor = state.cursor, "Polling cancelled");
        Ok(state)
    }

    /// Tell the chat that monitoring has started. Best effort.
    pub async fn announce(&self) -> bool {
        let delivered = self.notifier.send(STARTUP_MESSAGE).await;
        if !delivered {
            warn!("Startup message was not delivered");
        }
        delivered
    }

    /// Run a single cycle, updating `state` in place.
    pub async fn run_cycle(&self, state: &mut PollState) -> CycleOutcome {
        match self.deliver_latest(state.cursor).await {
            Ok(Delivery::Sent { current_date }) => {
                if let Some(date) = current_date {
                    state.cursor = date;
                }
                CycleOutcome::Delivered
            }
            Ok(Delivery::NotSent) => CycleOutcome::DeliveryFailed,
            Ok(Delivery::Empty) => {
                debug!("No new statuses");
                CycleOutcome::NoUpdates
            }
            Err(err) if err.is_fatal() => CycleOutcome::Fatal(err),
            Err(err) => self.report_error(err, state).await,
        }
    }

    /// Steps 1-5: fetch, validate, format and send the newest status.
    async fn deliver_latest(&self, cursor: i64) -> Result<Delivery, BotError> {
        let response = self.source.fetch(cursor).await?;
        let homeworks = check_response(&response)?;
        let Some(homework) = homeworks.first() else {
            return Ok(Delivery::Empty);
        };

        let message = parse_status(homework)?;
        if !self.notifier.send(&message).await {
            warn!("Status message was not delivered, cursor stays at {cursor}");
            return Ok(Delivery::NotSent);
        }

        Ok(Delivery::Sent {
            current_date: response.get("current_date").and_then(serde_json::Value::as_i64),
        })
    }

    async fn report_error(&self, err: BotError, state: &mut PollState) -> CycleOutcome {
        let text = err.to_string();
        error!("Сбой в работе программы: {text}");

        if state.last_error.as_deref() == Some(text.as_str()) {
            debug!("Error already reported, not sending it again");
            return CycleOutcome::ErrorSuppressed(err);
        }

        if self.notifier.send(&text).await {
            state.last_error = Some(text);
            CycleOutcome::ErrorReported(err)
        } else {
            CycleOutcome::ErrorUnreported(err)
        }
    }
}

enum Delivery {
    Sent { current_date: Option<i64> },
    NotSent,
    Empty,
}
