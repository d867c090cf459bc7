//! Fire-and-forget hand-off of the final score to a leaderboard.
//!
//! The sink call runs on a detached worker thread. The session polls the
//! result without blocking once per frame; a failure turns into a visible
//! "not saved" status and is never retried. The frame loop never waits on
//! the sink, except when a host explicitly calls `settle` on shutdown.

use std::fmt;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Payload sent to the leaderboard. `score` is already rounded and clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub anon_id: String,
    pub score: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// The service is not configured or not reachable.
    Unavailable(String),
    /// The service refused the payload.
    Rejected(String),
    Io(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "leaderboard unavailable: {reason}"),
            Self::Rejected(reason) => write!(f, "score rejected: {reason}"),
            Self::Io(reason) => write!(f, "leaderboard i/o error: {reason}"),
        }
    }
}

impl std::error::Error for SubmitError {}

pub trait ScoreSink: Send + Sync {
    fn submit(&self, submission: &ScoreSubmission) -> Result<(), SubmitError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    NotSaved(String),
}

impl SubmitStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Saving)
    }
}

impl fmt::Display for SubmitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("ready"),
            Self::Saving => f.write_str("saving"),
            Self::Saved => f.write_str("saved"),
            Self::NotSaved(reason) => write!(f, "not saved ({reason})"),
        }
    }
}

pub struct ScoreSubmitter {
    sink: Arc<dyn ScoreSink>,
    status: SubmitStatus,
    pending: Option<Receiver<Result<(), SubmitError>>>,
}

impl ScoreSubmitter {
    pub fn new(sink: Arc<dyn ScoreSink>) -> Self {
        Self {
            sink,
            status: SubmitStatus::Idle,
            pending: None,
        }
    }

    pub fn status(&self) -> &SubmitStatus {
        &self.status
    }

    /// Start a submission on a worker thread. The caller guarantees this is
    /// invoked at most once per run.
    pub fn submit(&mut self, submission: ScoreSubmission) {
        let (tx, rx) = mpsc::channel();
        let sink = Arc::clone(&self.sink);
        let spawned = thread::Builder::new()
            .name("score-submit".to_string())
            .spawn(move || {
                let result = sink.submit(&submission);
                // The session may be gone already; nobody to tell.
                let _ = tx.send(result);
            });
        match spawned {
            Ok(_) => {
                self.status = SubmitStatus::Saving;
                self.pending = Some(rx);
            }
            Err(err) => {
                log::warn!("Failed to start score submission: {err}");
                self.status = SubmitStatus::NotSaved(err.to_string());
                self.pending = None;
            }
        }
    }

    /// Non-blocking check for a finished submission.
    pub fn poll(&mut self) -> &SubmitStatus {
        let outcome = match &self.pending {
            Some(rx) => match rx.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(Err(SubmitError::Io(
                    "submission worker exited without a result".to_string(),
                ))),
            },
            None => None,
        };
        if let Some(result) = outcome {
            self.finish(result);
        }
        &self.status
    }

    /// Wait up to `timeout` for a pending submission. For hosts shutting down.
    pub fn settle(&mut self, timeout: Duration) -> &SubmitStatus {
        let outcome = match &self.pending {
            Some(rx) => match rx.recv_timeout(timeout) {
                Ok(result) => Some(result),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(Err(SubmitError::Io(
                    "submission worker exited without a result".to_string(),
                ))),
            },
            None => None,
        };
        if let Some(result) = outcome {
            self.finish(result);
        }
        &self.status
    }

    /// Forget any in-flight submission. Its result, if it arrives, is dropped.
    pub fn reset(&mut self) {
        self.pending = None;
        self.status = SubmitStatus::Idle;
    }

    fn finish(&mut self, result: Result<(), SubmitError>) {
        self.pending = None;
        self.status = match result {
            Ok(()) => {
                log::info!("Score saved");
                SubmitStatus::Saved
            }
            Err(err) => {
                log::warn!("Score not saved: {err}");
                SubmitStatus::NotSaved(err.to_string())
            }
        };
    }
}
