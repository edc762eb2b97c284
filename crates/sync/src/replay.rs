//! Replay of queued actions on reconnect.
//!
//! Actions replay strictly in enqueue order, one at a time. The first
//! failure stops the pass so a later action never lands before an earlier
//! one it may depend on. Each action leaves the durable queue as soon as its
//! own replay succeeds; the failing action and everything after it stay
//! queued for the next reconnect, which starts again from the front.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use zahra_shared::types::ActionId;

use crate::cache::CacheInvalidator;
use crate::message::SyncMessage;
use crate::notify::{Notice, Notifier};
use crate::queue::{ActionType, OfflineQueue, QueueError, QueuedAction};
use crate::submission::SubmitError;

/// Errors that stop a replay pass.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Nothing knows how to replay this action type.
    #[error("No handler registered for {0}")]
    NoHandler(ActionType),

    /// Resubmission failed.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// The durable queue could not be updated.
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// A handler-specific failure.
    #[error("{0}")]
    Handler(String),
}

impl ReplayError {
    /// Returns the error code for diagnostics.
    #[must_use]
    pub fn error_code(&self) -> &str {
        match self {
            Self::NoHandler(_) => "NO_REPLAY_HANDLER",
            Self::Submit(e) => e.error_code(),
            Self::Queue(e) => e.error_code(),
            Self::Handler(_) => "REPLAY_FAILED",
        }
    }
}

/// Replays one kind of queued action.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Resubmits `action`. An error stops the replay pass.
    async fn replay(&self, action: &QueuedAction) -> Result<(), ReplayError>;
}

/// How a replay trigger was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// The message was not a replay request.
    Ignored,
    /// Another pass was already in progress; this trigger was dropped.
    AlreadyRunning,
    /// There was nothing to replay.
    NothingToReplay,
    /// Every action replayed.
    Completed {
        /// Number of actions replayed.
        replayed: usize,
    },
    /// The pass stopped at the first failure.
    Failed {
        /// Number of actions replayed before the failure.
        replayed: usize,
        /// The failing action.
        action_id: ActionId,
        /// Its type.
        action_type: ActionType,
        /// What went wrong.
        error: String,
    },
    /// The durable queue could not be read.
    QueueUnavailable {
        /// What went wrong.
        error: String,
    },
}

/// Resets the in-flight flag when a pass ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives replay passes over the offline queue.
///
/// The sole consumer of reconnect signals and the sole remover of queued
/// actions. At most one pass runs at a time.
pub struct ReplayCoordinator {
    queue: Arc<OfflineQueue>,
    handlers: HashMap<ActionType, Arc<dyn ActionHandler>>,
    notifier: Arc<dyn Notifier>,
    invalidator: Arc<dyn CacheInvalidator>,
    in_flight: AtomicBool,
}

impl ReplayCoordinator {
    /// Creates a coordinator with no handlers.
    #[must_use]
    pub fn new(
        queue: Arc<OfflineQueue>,
        notifier: Arc<dyn Notifier>,
        invalidator: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            queue,
            handlers: HashMap::new(),
            notifier,
            invalidator,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Registers the handler for `action_type`, replacing any previous one.
    #[must_use]
    pub fn with_handler(mut self, action_type: ActionType, handler: Arc<dyn ActionHandler>) -> Self {
        self.handlers.insert(action_type, handler);
        self
    }

    /// True while a replay pass is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Handles a message from the background sync mechanism.
    ///
    /// A replay request replays the durable queue, whose rows carry the keys
    /// each success is acknowledged by. Any other message is ignored.
    pub async fn handle_message(&self, message: &SyncMessage) -> ReplayOutcome {
        if !message.is_replay() {
            debug!(kind = %message.kind, "ignoring sync message");
            return ReplayOutcome::Ignored;
        }

        debug!(carried = message.carried_len(), "replay requested");
        self.replay_pending().await
    }

    /// Replays everything in the durable queue.
    pub async fn replay_pending(&self) -> ReplayOutcome {
        let Some(_guard) = self.try_begin() else {
            return Self::already_running();
        };

        match self.queue.load().await {
            Ok(actions) => self.run(&actions).await,
            Err(err) => {
                error!(error = %err, "offline queue unavailable");
                self.notifier
                    .notify(Notice::error("Offline data could not be read"));
                ReplayOutcome::QueueUnavailable {
                    error: err.to_string(),
                }
            }
        }
    }

    fn try_begin(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    fn already_running() -> ReplayOutcome {
        debug!("replay already in progress, trigger dropped");
        ReplayOutcome::AlreadyRunning
    }

    async fn run(&self, actions: &[QueuedAction]) -> ReplayOutcome {
        if actions.is_empty() {
            debug!("nothing to replay");
            return ReplayOutcome::NothingToReplay;
        }

        self.notifier
            .notify(Notice::info("Back online, syncing data..."));
        info!(count = actions.len(), "replaying queued actions");

        for (replayed, action) in actions.iter().enumerate() {
            if let Err(err) = self.replay_one(action).await {
                error!(
                    action_id = %action.id,
                    action_type = %action.action_type,
                    code = err.error_code(),
                    error = %err,
                    "replay failed, stopping pass"
                );
                self.notifier.notify(Notice::error(format!(
                    "Failed to sync operation: {}",
                    action.action_type
                )));
                return ReplayOutcome::Failed {
                    replayed,
                    action_id: action.id,
                    action_type: action.action_type,
                    error: err.to_string(),
                };
            }
        }

        self.invalidator.invalidate_all();
        self.notifier
            .notify(Notice::success("All data synced successfully"));
        info!(count = actions.len(), "replay complete");

        ReplayOutcome::Completed {
            replayed: actions.len(),
        }
    }

    async fn replay_one(&self, action: &QueuedAction) -> Result<(), ReplayError> {
        let handler = self
            .handlers
            .get(&action.action_type)
            .ok_or(ReplayError::NoHandler(action.action_type))?;

        handler.replay(action).await?;

        if !self.queue.remove(action.id).await? {
            warn!(action_id = %action.id, "replayed action was already gone from the durable queue");
        }
        Ok(())
    }
}
