//! Offline resilience for Zahra transactions.
//!
//! Everything here does I/O. Business rules live in `zahra-core`.
//!
//! # Modules
//!
//! - `storage` - Durable key-value storage for the offline queue (OpenDAL)
//! - `queue` - Queued actions and the offline queue
//! - `message` - The reconnect signal
//! - `replay` - Sequential replay of queued actions on reconnect
//! - `gateway` - Remote transaction procedures
//! - `submission` - The single submission path for every transaction type
//! - `notify` - User feedback notices
//! - `cache` - Cached reads and their invalidation
//! - `connectivity` - Online/offline state

pub mod cache;
pub mod connectivity;
pub mod gateway;
pub mod message;
pub mod notify;
pub mod queue;
pub mod replay;
pub mod storage;
pub mod submission;

pub use cache::{CacheInvalidator, ReadCache};
pub use connectivity::Connectivity;
pub use gateway::{CreatedResource, HttpRemoteProcedures, RemoteCall, RemoteError, RemoteProcedures};
pub use message::SyncMessage;
pub use notify::{FeedbackQueue, Notice, NoticeLevel, Notifier, TracingNotifier};
pub use queue::{ActionType, OfflineQueue, QueueError, QueuedAction};
pub use replay::{ActionHandler, ReplayCoordinator, ReplayError, ReplayOutcome};
pub use storage::{OpendalQueueStore, QueueStore, StorageError};
pub use submission::{
    PreparedPayment, PreparedPurchase, PreparedSale, SubmitError, SubmitOutcome,
    TransactionReplayHandler, TransactionSubmitter,
};
