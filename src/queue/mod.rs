//! Asynchronous sync job queue.
//!
//! Decouples source-entity mutation from index updates: callers enqueue
//! and move on, a bounded worker pool applies the sync. Delivery is
//! at-least-once — the executor's replace-by-key semantics make repeats
//! harmless.

pub mod worker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Result, SearchError};

pub use worker::{WorkerContext, WorkerPool};

/// Wire shape of a sync instruction.
///
/// Serialized as `{"type": "sync-product", "entityId": "..."}` so payloads
/// interoperate with the storefront's other queue consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobKind {
    #[serde(rename = "sync-product")]
    SyncProduct {
        #[serde(rename = "entityId")]
        entity_id: String,
    },
    #[serde(rename = "sync-category")]
    SyncCategory {
        #[serde(rename = "entityId")]
        entity_id: String,
    },
    #[serde(rename = "rebuild-index")]
    RebuildIndex,
}

impl JobKind {
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::SyncProduct { entity_id } => format!("sync-product {entity_id}"),
            Self::SyncCategory { entity_id } => format!("sync-category {entity_id}"),
            Self::RebuildIndex => "rebuild-index".to_string(),
        }
    }
}

/// A queued job instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
}

impl Job {
    #[must_use]
    pub fn new(kind: JobKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }
}

/// A job that exhausted its retry budget, kept for manual replay.
#[derive(Debug, Clone)]
pub struct FailedJob {
    pub job: Job,
    pub attempts: u32,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// Producer half of the job channel. Cheap to clone; enqueueing never
/// blocks and never waits for sync completion.
///
/// Holds only a weak sender — the worker pool owns the strong one, so
/// outstanding producer handles cannot keep the channel open past
/// shutdown.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::WeakUnboundedSender<Job>,
}

impl JobQueue {
    pub(crate) fn new(sender: &mpsc::UnboundedSender<Job>) -> Self {
        Self {
            sender: sender.downgrade(),
        }
    }

    /// Submit a job, returning its id. Fails only when the worker pool has
    /// shut down.
    pub fn enqueue(&self, kind: JobKind) -> Result<Uuid> {
        let job = Job::new(kind);
        let id = job.id;
        let sender = self.sender.upgrade().ok_or(SearchError::QueueClosed)?;
        sender.send(job).map_err(|_| SearchError::QueueClosed)?;
        Ok(id)
    }
}
