//! Bounded worker pool draining the job channel.
//!
//! N workers (default 5) share one receiver; a token bucket caps dispatch
//! at `rate_limit` jobs per second across the pool. Failed jobs are
//! retried in place with exponential backoff plus jitter, then parked in
//! the failed-job ledger once the attempt budget is spent.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::{QueueConfig, RetryConfig};
use crate::error::Result;
use crate::query::cache::SearchCache;
use crate::queue::{FailedJob, Job, JobKind, JobQueue};
use crate::rebuild;
use crate::source::{CategoryStore, ProductStore};
use crate::store::IndexStore;
use crate::sync;

/// Everything a worker needs to execute any job kind.
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<IndexStore>,
    pub products: Arc<dyn ProductStore>,
    pub categories: Arc<dyn CategoryStore>,
    /// Invalidated after every job that touched the store.
    pub cache: Arc<SearchCache>,
}

/// Token bucket: capacity and refill rate are both `rate` per second.
struct RateLimiter {
    rate: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    fn new(rate: u32) -> Self {
        let rate = f64::from(rate.max(1));
        Self {
            rate,
            state: Mutex::new(BucketState {
                tokens: rate,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take one token, sleeping until the bucket refills if necessary.
    async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock();
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate).min(self.rate);
                state.last_refill = now;
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    Some(Duration::from_secs_f64((1.0 - state.tokens) / self.rate))
                }
            };
            match wait {
                None => return,
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }
}

/// Handle to the spawned workers. Dropping the pool without calling
/// [`WorkerPool::shutdown`] aborts nothing — workers run until their
/// runtime stops — so owners should shut down explicitly.
pub struct WorkerPool {
    sender: mpsc::UnboundedSender<Job>,
    handles: Vec<JoinHandle<()>>,
    failed: Arc<Mutex<Vec<FailedJob>>>,
}

impl WorkerPool {
    /// Spawn `queue_config.concurrency` workers on the current runtime.
    #[must_use]
    pub fn spawn(ctx: WorkerContext, queue_config: &QueueConfig, retry: &RetryConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let limiter = Arc::new(RateLimiter::new(queue_config.rate_limit));
        let failed = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::with_capacity(queue_config.concurrency);
        for worker_id in 0..queue_config.concurrency.max(1) {
            let ctx = ctx.clone();
            let rx = Arc::clone(&rx);
            let limiter = Arc::clone(&limiter);
            let failed = Arc::clone(&failed);
            let retry = retry.clone();
            handles.push(tokio::spawn(async move {
                worker_loop(worker_id, ctx, rx, limiter, retry, failed).await;
            }));
        }

        info!(
            workers = queue_config.concurrency,
            rate_limit = queue_config.rate_limit,
            "sync worker pool started"
        );

        Self {
            sender: tx,
            handles,
            failed,
        }
    }

    /// Producer handle for change triggers and the service facade. Holds
    /// a weak sender; it stops accepting jobs once the pool shuts down.
    #[must_use]
    pub fn queue(&self) -> JobQueue {
        JobQueue::new(&self.sender)
    }

    /// Jobs that exhausted their retry budget, for ops inspection/replay.
    #[must_use]
    pub fn failed_jobs(&self) -> Vec<FailedJob> {
        self.failed.lock().clone()
    }

    /// Close the channel and wait for workers to drain remaining jobs.
    /// In-flight jobs finish (or fail) naturally; there is no per-job
    /// cancellation. Returns the final failed-job ledger.
    pub async fn shutdown(self) -> Vec<FailedJob> {
        let Self {
            sender,
            handles,
            failed,
        } = self;
        drop(sender);
        for handle in handles {
            let _ = handle.await;
        }
        info!("sync worker pool stopped");
        let ledger = failed.lock().clone();
        ledger
    }
}

async fn worker_loop(
    worker_id: usize,
    ctx: WorkerContext,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>,
    limiter: Arc<RateLimiter>,
    retry: RetryConfig,
    failed: Arc<Mutex<Vec<FailedJob>>>,
) {
    loop {
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else {
            debug!(worker_id, "job channel closed, worker exiting");
            return;
        };

        let max_attempts = retry.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            limiter.acquire().await;
            match execute_job(&ctx, &job) {
                Ok(()) => {
                    debug!(worker_id, job_id = %job.id, job = %job.kind.describe(), attempt, "job done");
                    break;
                }
                Err(err) if attempt < max_attempts => {
                    let delay = jittered(retry.delay_for_attempt(attempt));
                    warn!(
                        worker_id,
                        job_id = %job.id,
                        job = %job.kind.describe(),
                        attempt,
                        %err,
                        retry_in_ms = delay.as_millis() as u64,
                        "job failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(
                        worker_id,
                        job_id = %job.id,
                        payload = %serde_json::to_string(&job.kind).unwrap_or_default(),
                        attempts = attempt,
                        %err,
                        "job failed permanently"
                    );
                    failed.lock().push(FailedJob {
                        job: job.clone(),
                        attempts: attempt,
                        error: err.to_string(),
                        failed_at: chrono::Utc::now(),
                    });
                    break;
                }
            }
        }
    }
}

/// Retries re-run the whole synchronizer → executor path; there is no
/// partial state to resume.
fn execute_job(ctx: &WorkerContext, job: &Job) -> Result<()> {
    match &job.kind {
        JobKind::SyncProduct { entity_id } => {
            sync::sync_product(
                &ctx.store,
                ctx.products.as_ref(),
                ctx.categories.as_ref(),
                entity_id,
            )?;
        }
        JobKind::SyncCategory { entity_id } => {
            sync::sync_category(&ctx.store, ctx.categories.as_ref(), entity_id)?;
        }
        JobKind::RebuildIndex => {
            let report = rebuild::rebuild_index(
                &ctx.store,
                ctx.products.as_ref(),
                ctx.categories.as_ref(),
            )?;
            info!(
                products_synced = report.products.synced,
                products_failed = report.products.failed,
                categories_synced = report.categories.synced,
                categories_failed = report.categories.failed,
                "index rebuild finished"
            );
        }
    }
    ctx.cache.invalidate();
    Ok(())
}

fn jittered(base: Duration) -> Duration {
    let factor = rand::rng().random_range(0.8..1.2);
    base.mul_f64(factor)
}
