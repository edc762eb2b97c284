//! Zahra offline replay
//!
//! Drains the durable offline queue once, in order, and exits. A non-zero
//! exit means actions are still queued.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zahra_core::currency::RateBook;
use zahra_shared::AppConfig;
use zahra_sync::{
    Connectivity, HttpRemoteProcedures, OfflineQueue, OpendalQueueStore, ReadCache,
    ReplayCoordinator, ReplayOutcome, TracingNotifier, TransactionReplayHandler,
    TransactionSubmitter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zahra=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let store = Arc::new(OpendalQueueStore::fs(&config.queue.root)?);
    let queue = Arc::new(OfflineQueue::new(store));
    info!(root = %config.queue.root, pending = queue.len().await?, "Offline queue opened");

    let remote = Arc::new(HttpRemoteProcedures::new(&config.remote)?);
    info!(base_url = %config.remote.base_url, "Remote procedures configured");

    // Queued actions carry their frozen rates, so an empty book suffices
    let submitter = Arc::new(TransactionSubmitter::new(
        remote,
        queue.clone(),
        Arc::new(Connectivity::new(true)),
        Arc::new(RwLock::new(RateBook::new())),
        config.routing.policy,
    ));

    let coordinator = Arc::new(TransactionReplayHandler::new(submitter)).register(
        ReplayCoordinator::new(
            queue.clone(),
            Arc::new(TracingNotifier),
            Arc::new(ReadCache::new()),
        ),
    );

    match coordinator.replay_pending().await {
        ReplayOutcome::Completed { replayed } => {
            info!(replayed, "Offline queue drained");
            Ok(())
        }
        ReplayOutcome::NothingToReplay => {
            info!("Nothing to replay");
            Ok(())
        }
        ReplayOutcome::Failed {
            replayed,
            action_id,
            action_type,
            error,
        } => {
            let remaining = queue.len().await?;
            warn!(replayed, remaining, %action_id, %action_type, "Replay stopped");
            anyhow::bail!("replay of {action_type} {action_id} failed: {error}")
        }
        ReplayOutcome::QueueUnavailable { error } => {
            anyhow::bail!("offline queue unavailable: {error}")
        }
        outcome @ (ReplayOutcome::Ignored | ReplayOutcome::AlreadyRunning) => {
            warn!(?outcome, "Replay did not run");
            Ok(())
        }
    }
}
