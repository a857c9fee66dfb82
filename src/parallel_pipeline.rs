// THEORY:
// `ParallelPipeline` spreads frame ingestion across a pool of tokio workers. The
// per-frame work after calibration is a pure function of (frame, baseline,
// noise band), so the only thing that needs care is the baseline itself.
//
// The baseline is immutable once captured and published as an `Arc<Baseline>`
// under a read-write lock. Each submitted frame snapshots the current baseline
// and noise band before it is dispatched; a recalibration or reset therefore
// affects frames submitted after it, never a frame already in flight. Lazy
// calibration takes the write lock and re-checks, so exactly one frame captures
// the baseline even when several arrive at once.

use crate::core_modules::calibrator::Baseline;
use crate::core_modules::frame::{self, IntensityFrame};
use crate::core_modules::noise::NoiseBounds;
use crate::error::{TouchError, TouchResult};
use crate::pipeline::{DepthFrame, FrameAnalysis, PipelineConfig, detect_touch};
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::{RwLock, mpsc, oneshot};
use tracing::{debug, info};

/// One frame's worth of work, with the shared state it was submitted against.
pub struct FrameJob {
    pub frame_id: u64,
    pub intensity: IntensityFrame,
    pub baseline: Arc<Baseline>,
    pub noise_bounds: NoiseBounds,
    pub calibrated: bool,
    pub submitted_at: Instant,
}

struct FrameTask {
    job: FrameJob,
    result_sender: oneshot::Sender<FrameAnalysis>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FrameTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `worker_count` workers plus a round-robin dispatcher.
    /// Must be called from within a tokio runtime.
    pub fn new(config: PipelineConfig, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FrameTask>();
        let mut workers = Vec::with_capacity(worker_count + 1);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<FrameTask>())
            .unzip();

        workers.push(tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                // A closed worker drops the task, which the caller sees as a
                // cancelled oneshot.
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_count;
            }
        }));

        for mut worker_receiver in worker_receivers {
            let worker_config = config.clone();
            workers.push(tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let analysis = Self::process_frame_worker(&task.job, &worker_config);
                    let _ = task.result_sender.send(analysis);
                }
            }));
        }

        Self { task_sender, workers }
    }

    fn process_frame_worker(job: &FrameJob, config: &PipelineConfig) -> FrameAnalysis {
        let (visualization, touch) = detect_touch(&job.intensity, &job.baseline, job.noise_bounds, config);
        debug!(
            frame_id = job.frame_id,
            touch = touch.is_some(),
            elapsed_us = job.submitted_at.elapsed().as_micros() as u64,
            "Worker finished frame"
        );
        FrameAnalysis {
            frame_index: job.frame_id,
            visualization,
            touch,
            calibrated: job.calibrated,
        }
    }

    /// Hands `job` to the next worker and waits for its analysis.
    pub async fn process_frame(&self, job: FrameJob) -> TouchResult<FrameAnalysis> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.task_sender
            .send(FrameTask { job, result_sender })
            .map_err(|_| TouchError::WorkerPool("failed to send task to worker pool".into()))?;

        result_receiver
            .await
            .map_err(|_| TouchError::WorkerPool("failed to receive result from worker".into()))
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len() - 1
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

/// Touch detection with frames processed concurrently on a worker pool.
pub struct ParallelPipeline {
    config: PipelineConfig,
    worker_pool: WorkerPool,
    baseline: RwLock<Option<Arc<Baseline>>>,
    noise_bounds: RwLock<NoiseBounds>,
    frame_counter: AtomicU64,
}

impl ParallelPipeline {
    /// Creates a pipeline with one worker per logical CPU.
    pub fn new(config: PipelineConfig) -> TouchResult<Self> {
        Self::with_workers(config, num_cpus::get())
    }

    pub fn with_workers(config: PipelineConfig, worker_count: usize) -> TouchResult<Self> {
        config.validate()?;
        let worker_pool = WorkerPool::new(config.clone(), worker_count);
        info!(workers = worker_pool.worker_count(), "Parallel touch pipeline started");
        Ok(Self {
            noise_bounds: RwLock::new(config.noise_bounds),
            config,
            worker_pool,
            baseline: RwLock::new(None),
            frame_counter: AtomicU64::new(0),
        })
    }

    /// Processes one depth frame on the worker pool.
    ///
    /// # Panics
    /// If `depth` does not have the configured resolution.
    pub async fn process_frame(&self, depth: &DepthFrame) -> TouchResult<FrameAnalysis> {
        assert_eq!(
            depth.dimensions(),
            (self.config.image_width, self.config.image_height),
            "depth frame dimensions must match the configured resolution"
        );

        let frame_id = self.frame_counter.fetch_add(1, Ordering::SeqCst);
        let intensity = frame::to_intensity(depth, self.config.depth_gain, self.config.intensity_scale);
        let (baseline, calibrated) = self.baseline_for(&intensity).await;
        let noise_bounds = *self.noise_bounds.read().await;

        self.worker_pool
            .process_frame(FrameJob {
                frame_id,
                intensity,
                baseline,
                noise_bounds,
                calibrated,
                submitted_at: Instant::now(),
            })
            .await
    }

    /// Processes all frames concurrently. Results keep the input order.
    pub async fn process_batch(&self, frames: &[DepthFrame]) -> Vec<TouchResult<FrameAnalysis>> {
        join_all(frames.iter().map(|depth| self.process_frame(depth))).await
    }

    async fn baseline_for(&self, intensity: &IntensityFrame) -> (Arc<Baseline>, bool) {
        if let Some(baseline) = self.baseline.read().await.as_ref() {
            return (Arc::clone(baseline), false);
        }

        let mut slot = self.baseline.write().await;
        if let Some(baseline) = slot.as_ref() {
            return (Arc::clone(baseline), false);
        }
        let (width, height) = intensity.dimensions();
        info!(width, height, "Captured floor baseline");
        let baseline = Arc::new(Baseline::capture(intensity.clone()));
        *slot = Some(Arc::clone(&baseline));
        (baseline, true)
    }

    /// Drops the published baseline; the next submitted frame recaptures it.
    pub async fn recalibrate(&self) {
        if self.baseline.write().await.take().is_some() {
            info!("Floor baseline cleared, recalibrating on next frame");
        }
    }

    pub async fn reset(&self, bounds: NoiseBounds) {
        info!(lower = bounds.lower, upper = bounds.upper, "Noise bounds reset");
        *self.noise_bounds.write().await = bounds;
    }

    pub async fn baseline(&self) -> Option<Arc<Baseline>> {
        self.baseline.read().await.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }
}
