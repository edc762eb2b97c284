//! The durable offline action queue.
//!
//! Actions are appended when a mutating operation cannot reach the remote
//! procedures and removed one by one as each is acknowledged during replay.
//! Every mutation rewrites the whole array under [`QUEUE_KEY`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use zahra_shared::types::ActionId;

use crate::storage::{QueueStore, StorageError};

/// Storage key of the queued action array.
pub const QUEUE_KEY: &str = "offline/queued_actions.json";

/// Kind of mutating operation captured in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Sales invoice.
    CreateInvoice,
    /// Sales return.
    CreateSaleReturn,
    /// Purchase invoice.
    CreatePurchase,
    /// Purchase return.
    CreatePurchaseReturn,
    /// Payment or receipt.
    CreatePayment,
}

impl ActionType {
    /// Every action type, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::CreateInvoice,
        Self::CreateSaleReturn,
        Self::CreatePurchase,
        Self::CreatePurchaseReturn,
        Self::CreatePayment,
    ];

    /// Returns the wire tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateInvoice => "CREATE_INVOICE",
            Self::CreateSaleReturn => "CREATE_SALE_RETURN",
            Self::CreatePurchase => "CREATE_PURCHASE",
            Self::CreatePurchaseReturn => "CREATE_PURCHASE_RETURN",
            Self::CreatePayment => "CREATE_PAYMENT",
        }
    }

    /// Returns the remote procedure that commits this action.
    #[must_use]
    pub fn procedure(self) -> &'static str {
        match self {
            Self::CreateInvoice => "commit_sales_invoice",
            Self::CreateSaleReturn => "commit_sale_return",
            Self::CreatePurchase => "commit_purchase_invoice",
            Self::CreatePurchaseReturn => "commit_purchase_return",
            Self::CreatePayment => "commit_payment",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured mutating operation awaiting delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    /// Idempotency key, forwarded to the remote procedure.
    pub id: ActionId,
    /// Operation kind.
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Operation payload, shaped by `action_type`.
    pub payload: Value,
    /// When the action was captured.
    pub timestamp: DateTime<Utc>,
}

impl QueuedAction {
    /// Captures an action now, with a fresh idempotency key.
    #[must_use]
    pub fn new(action_type: ActionType, payload: Value) -> Self {
        Self {
            id: ActionId::new(),
            action_type,
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// Offline queue errors.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The underlying store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The stored array could not be encoded or decoded.
    #[error("offline queue is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl QueueError {
    /// Returns the error code for diagnostics.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Storage(e) => e.error_code(),
            Self::Corrupt(_) => "QUEUE_CORRUPT",
        }
    }
}

/// The durable, ordered queue of undelivered actions.
///
/// The only component that writes the queue. Mutations are serialized by an
/// internal lock so read-modify-write cycles never interleave.
pub struct OfflineQueue {
    store: Arc<dyn QueueStore>,
    lock: Mutex<()>,
}

impl OfflineQueue {
    /// Creates a queue over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn QueueStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Reads all queued actions in enqueue order.
    pub async fn load(&self) -> Result<Vec<QueuedAction>, QueueError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// Appends an action to the end of the queue.
    pub async fn enqueue(&self, action: QueuedAction) -> Result<(), QueueError> {
        let _guard = self.lock.lock().await;
        let mut actions = self.read().await?;

        info!(
            action_id = %action.id,
            action_type = %action.action_type,
            "action queued for replay"
        );
        actions.push(action);
        self.write(&actions).await
    }

    /// Removes the action with `id`. Returns false if it was not queued.
    pub async fn remove(&self, id: ActionId) -> Result<bool, QueueError> {
        let _guard = self.lock.lock().await;
        let mut actions = self.read().await?;

        let before = actions.len();
        actions.retain(|a| a.id != id);
        if actions.len() == before {
            return Ok(false);
        }

        debug!(action_id = %id, remaining = actions.len(), "action acknowledged");
        self.write(&actions).await?;
        Ok(true)
    }

    /// Empties the queue.
    pub async fn clear(&self) -> Result<(), QueueError> {
        let _guard = self.lock.lock().await;
        self.write(&[]).await
    }

    /// Number of queued actions.
    pub async fn len(&self) -> Result<usize, QueueError> {
        Ok(self.load().await?.len())
    }

    /// True if nothing is queued.
    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }

    /// Reads the stored array. Rows captured without an id get one here,
    /// written back before returning, so every later read sees the same key.
    async fn read(&self) -> Result<Vec<QueuedAction>, QueueError> {
        let Some(bytes) = self.store.get(QUEUE_KEY).await?.filter(|b| !b.is_empty()) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<Value> = serde_json::from_slice(&bytes)?;
        let mut assigned = 0_usize;
        for row in &mut rows {
            if let Some(fields) = row.as_object_mut()
                && fields.get("id").is_none_or(Value::is_null)
            {
                fields.insert("id".to_string(), Value::String(ActionId::new().to_string()));
                assigned += 1;
            }
        }

        let actions = rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<QueuedAction>, _>>()?;

        if assigned > 0 {
            info!(assigned, "assigned idempotency keys to queued actions");
            self.write(&actions).await?;
        }
        Ok(actions)
    }

    async fn write(&self, actions: &[QueuedAction]) -> Result<(), QueueError> {
        let bytes = serde_json::to_vec(actions)?;
        self.store.set(QUEUE_KEY, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::OpendalQueueStore;
    use serde_json::json;

    fn queue() -> OfflineQueue {
        OfflineQueue::new(Arc::new(OpendalQueueStore::memory().unwrap()))
    }

    #[test]
    fn test_action_type_wire_names() {
        assert_eq!(
            serde_json::to_value(ActionType::CreatePurchaseReturn).unwrap(),
            json!("CREATE_PURCHASE_RETURN")
        );
        assert_eq!(ActionType::CreateInvoice.to_string(), "CREATE_INVOICE");
        assert_eq!(ActionType::CreateInvoice.procedure(), "commit_sales_invoice");
        assert_eq!(ActionType::CreatePayment.procedure(), "commit_payment");
    }

    #[test]
    fn test_queued_action_shape() {
        let action = QueuedAction::new(ActionType::CreateInvoice, json!({"a": 1}));
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "CREATE_INVOICE");
        assert_eq!(value["payload"]["a"], 1);
        assert!(value["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_rows_without_id_get_a_stable_one() {
        let store = Arc::new(OpendalQueueStore::memory().unwrap());
        let rows = json!([
            {"type": "CREATE_INVOICE", "payload": {"n": 1}, "timestamp": "2026-01-01T10:00:00Z"},
            {"type": "CREATE_INVOICE", "payload": {"n": 2}, "timestamp": "2026-01-01T10:05:00Z"}
        ]);
        store
            .set(QUEUE_KEY, serde_json::to_vec(&rows).unwrap())
            .await
            .unwrap();

        let queue = OfflineQueue::new(store.clone());
        let first = queue.load().await.unwrap();
        let second = queue.load().await.unwrap();
        assert_eq!(first.len(), 2);
        assert_ne!(first[0].id, first[1].id);
        assert_eq!(first, second);

        // The keys were written back, so a fresh queue over the store agrees
        let reopened = OfflineQueue::new(store);
        assert_eq!(reopened.load().await.unwrap(), first);

        assert!(queue.remove(first[0].id).await.unwrap());
        assert_eq!(queue.load().await.unwrap(), vec![first[1].clone()]);
    }

    #[tokio::test]
    async fn test_enqueue_preserves_order() {
        let queue = queue();
        assert!(queue.is_empty().await.unwrap());

        let first = QueuedAction::new(ActionType::CreateInvoice, json!({"n": 1}));
        let second = QueuedAction::new(ActionType::CreatePurchase, json!({"n": 2}));
        queue.enqueue(first.clone()).await.unwrap();
        queue.enqueue(second.clone()).await.unwrap();

        assert_eq!(queue.load().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_remove_single_action() {
        let queue = queue();
        let first = QueuedAction::new(ActionType::CreateInvoice, json!({}));
        let second = QueuedAction::new(ActionType::CreateInvoice, json!({}));
        queue.enqueue(first.clone()).await.unwrap();
        queue.enqueue(second.clone()).await.unwrap();

        assert!(queue.remove(first.id).await.unwrap());
        assert!(!queue.remove(first.id).await.unwrap());
        assert_eq!(queue.load().await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn test_clear() {
        let queue = queue();
        queue
            .enqueue(QueuedAction::new(ActionType::CreatePayment, json!({})))
            .await
            .unwrap();
        queue.clear().await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_queue_is_an_error() {
        let store = Arc::new(OpendalQueueStore::memory().unwrap());
        store.set(QUEUE_KEY, b"{not json".to_vec()).await.unwrap();

        let queue = OfflineQueue::new(store);
        let err = queue.load().await.unwrap_err();
        assert_eq!(err.error_code(), "QUEUE_CORRUPT");
    }
}
