//! User feedback notices.
//!
//! Replay runs with nobody awaiting its result, so the only way a user learns
//! what happened is through a [`Notifier`].

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tracing::{error, info};

/// Notice tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Progress information.
    Info,
    /// Completed successfully.
    Success,
    /// Failed.
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Tone.
    pub level: NoticeLevel,
    /// Message text.
    pub message: String,
}

impl Notice {
    /// An informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    /// A success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// An error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives user-facing notices.
pub trait Notifier: Send + Sync {
    /// Shows `notice` to the user.
    fn notify(&self, notice: Notice);
}

/// Collects notices for the presentation layer to drain.
#[derive(Debug, Default)]
pub struct FeedbackQueue {
    notices: Mutex<VecDeque<Notice>>,
}

impl FeedbackQueue {
    /// Creates an empty feedback queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all pending notices, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    /// Returns pending notices without removing them.
    #[must_use]
    pub fn pending(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl Notifier for FeedbackQueue {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(notice);
    }
}

/// Writes notices to the log. Used where no user is watching.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!(target: "zahra::feedback", "{}", notice.message),
            NoticeLevel::Info | NoticeLevel::Success => {
                info!(target: "zahra::feedback", level = ?notice.level, "{}", notice.message);
            }
        }
    }
}
