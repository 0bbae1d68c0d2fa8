/// Bounded worker pool for per-video acquisition.
///
/// A fixed number of workers drain a shared queue of descriptors. Each
/// worker handles one video completely before taking the next, and
/// publishes exactly one outcome per video on a single results channel.
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

use crate::channel_link::video_url;
use crate::config::RipConfig;
use crate::errors::ProviderError;
use crate::models::{AcquisitionOutcome, ResolvedBinaryPath, VideoDescriptor};
use crate::providers::{AcquisitionProvider, AcquisitionRequest};

/// Read-only state shared by every worker of one dispatch.
struct WorkerContext {
    provider: Arc<dyn AcquisitionProvider>,
    target_dir: PathBuf,
    ffmpeg: ResolvedBinaryPath,
    watch_url_base: String,
}

/// An in-progress dispatch.
pub struct Dispatch {
    /// Number of descriptors handed to the pool.
    pub dispatched: usize,
    /// Closes once every worker has finished.
    pub outcomes: mpsc::UnboundedReceiver<AcquisitionOutcome>,
}

pub struct AcquisitionDispatcher {
    provider: Arc<dyn AcquisitionProvider>,
    workers: usize,
    watch_url_base: String,
}

impl AcquisitionDispatcher {
    /// `workers` is clamped to at least 1.
    pub fn new(
        provider: Arc<dyn AcquisitionProvider>,
        workers: usize,
        watch_url_base: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            workers: workers.max(1),
            watch_url_base: watch_url_base.into(),
        }
    }

    pub fn from_config(provider: Arc<dyn AcquisitionProvider>, config: &RipConfig) -> Self {
        Self::new(provider, config.workers, config.watch_url_base.clone())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Start the pool and return the outcome stream.
    ///
    /// Outcomes arrive in completion order, not input order.
    pub fn spawn(
        &self,
        descriptors: Vec<VideoDescriptor>,
        target_dir: &Path,
        ffmpeg: &ResolvedBinaryPath,
    ) -> Dispatch {
        let dispatched = descriptors.len();
        let pool_size = self.workers.min(dispatched);
        let (tx, rx) = mpsc::unbounded_channel();

        info!(
            "Starting download of {} videos with {} concurrent workers",
            dispatched, pool_size
        );

        let queue = Arc::new(Mutex::new(VecDeque::from(descriptors)));
        let ctx = Arc::new(WorkerContext {
            provider: self.provider.clone(),
            target_dir: target_dir.to_path_buf(),
            ffmpeg: ffmpeg.clone(),
            watch_url_base: self.watch_url_base.clone(),
        });

        for worker_id in 0..pool_size {
            tokio::spawn(worker_loop(worker_id, queue.clone(), ctx.clone(), tx.clone()));
        }
        // Only worker-held senders remain, so the channel closes when the pool drains.
        drop(tx);

        Dispatch {
            dispatched,
            outcomes: rx,
        }
    }

    /// Run the pool to completion and collect every outcome.
    pub async fn run(
        &self,
        descriptors: Vec<VideoDescriptor>,
        target_dir: &Path,
        ffmpeg: &ResolvedBinaryPath,
    ) -> Vec<AcquisitionOutcome> {
        let mut dispatch = self.spawn(descriptors, target_dir, ffmpeg);
        let mut outcomes = Vec::with_capacity(dispatch.dispatched);
        while let Some(outcome) = dispatch.outcomes.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<VideoDescriptor>>>,
    ctx: Arc<WorkerContext>,
    tx: mpsc::UnboundedSender<AcquisitionOutcome>,
) {
    loop {
        let next = queue.lock().await.pop_front();
        let Some(video) = next else { break };

        let outcome = acquire_one(&ctx, &video).await;
        if tx.send(outcome).is_err() {
            warn!("Worker {} stopping: outcome receiver dropped", worker_id);
            break;
        }
    }
    debug!("Worker {} finished", worker_id);
}

/// Acquire one video. Every failure, including a provider panic, becomes
/// a failed outcome.
async fn acquire_one(ctx: &WorkerContext, video: &VideoDescriptor) -> AcquisitionOutcome {
    let url = video_url(&video.locator, &ctx.watch_url_base);
    let request = AcquisitionRequest::mp3(url.clone(), ctx.target_dir.clone(), ctx.ffmpeg.clone());

    info!("[DOWNLOADING] {}", video.title);

    let provider = ctx.provider.clone();
    let result = tokio::spawn(async move { provider.acquire(&request).await }).await;

    let error = match result {
        Ok(Ok(())) => {
            info!("[SUCCESS] {}", video.title);
            return AcquisitionOutcome::success(video, url);
        }
        Ok(Err(e)) => e,
        Err(join_err) => {
            error!("Acquisition of {:?} crashed: {}", video.title, join_err);
            ProviderError::WorkerCrashed(join_err.to_string())
        }
    };

    warn!("[FAILED] {}: {}", video.title, error);
    AcquisitionOutcome::failure(video, url, error.to_string())
}
