//! # Chunk Generation Job
//!
//! This module defines `ChunkGenerationJob`, which drives the generation of one chunk
//! through the pipeline stages on the worker pool:
//!
//! 1. The data stage fills voxels and heightmaps with the terrain generator
//! 2. Once the data is in, the collider and mesh stages run concurrently over a shared,
//!    read-only copy of it
//! 3. When both are done, ownership of every buffer moves out of the job
//!
//! The control thread advances a job by polling it once per tick; neither polling method
//! ever blocks. Only [`ChunkGenerationJob::dispose`] waits, for whatever stages are still
//! running.

use std::sync::Arc;

use log::{debug, warn};
use web_time::Instant;

use crate::core::{CancellationToken, InFlightCounter};
use crate::engine_state::rendering::meshing::{
    generate_collider, generate_mesh, ColliderData, MeshData, MeshStrategy,
};
use crate::engine_state::task_management::{Task, TaskHandle, TaskManager, TaskStatus};
use crate::engine_state::voxels::chunk::{ChunkData, ChunkId, ChunkPosition};
use crate::engine_state::voxels::generation::{GenerationData, GenerationStages, TerrainGenerator};
use crate::error::{EngineError, GenerationStage};

/// Everything a job needs from the factory that starts it.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Parent of every job's token.
    pub token: CancellationToken,
    pub in_flight: InFlightCounter,
    pub task_manager: TaskManager,
    pub generator: Arc<TerrainGenerator>,
    pub mesh_strategy: MeshStrategy,
}

/// Where a job stands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JobState {
    Created,
    DataPending,
    DataComplete,
    MeshAndColliderPending,
    Complete,
    Failed,
    Disposed,
}

/// The buffers a successful job hands over.
#[derive(Debug)]
pub struct GeneratedChunk {
    pub position: ChunkPosition,
    pub chunk_id: ChunkId,
    /// The stages that were requested.
    pub stages: GenerationStages,
    /// The voxel data the geometry was built from.
    pub data: ChunkData,
    pub mesh: Option<MeshData>,
    pub collider: Option<ColliderData>,
    /// Revision of the chunk when the job was started.
    pub revision: u64,
}

/// Fills chunk data with the terrain generator.
struct TerrainDataTask {
    position: ChunkPosition,
    generator: Arc<TerrainGenerator>,
    token: CancellationToken,
}

impl Task for TerrainDataTask {
    type Output = Option<ChunkData>;

    fn process(self) -> Option<ChunkData> {
        if self.token.is_cancelled() {
            return None;
        }
        Some(self.generator.generate(self.position))
    }
}

/// Builds the collision mesh.
struct ColliderTask {
    data: Arc<ChunkData>,
    token: CancellationToken,
}

impl Task for ColliderTask {
    type Output = Option<ColliderData>;

    fn process(self) -> Option<ColliderData> {
        if self.token.is_cancelled() {
            return None;
        }
        Some(generate_collider(&self.data))
    }
}

/// Builds the render mesh.
struct MeshTask {
    data: Arc<ChunkData>,
    strategy: MeshStrategy,
    token: CancellationToken,
}

impl Task for MeshTask {
    type Output = Option<MeshData>;

    fn process(self) -> Option<MeshData> {
        if self.token.is_cancelled() {
            return None;
        }
        Some(generate_mesh(&self.data, self.strategy))
    }
}

/// Result of polling one stage handle.
enum StagePoll<T> {
    Pending,
    Done(T),
    Failed(EngineError),
}

/// Polls `handle` if it is still running, mapping its outcome for `stage`.
fn poll_stage<T>(
    handle: &mut Option<TaskHandle<Option<T>>>,
    position: ChunkPosition,
    stage: GenerationStage,
) -> StagePoll<Option<T>> {
    let Some(running) = handle.as_mut() else {
        return StagePoll::Done(None);
    };
    match running.poll() {
        TaskStatus::Pending => StagePoll::Pending,
        TaskStatus::Complete(Some(value)) => {
            *handle = None;
            StagePoll::Done(Some(value))
        }
        TaskStatus::Complete(None) => {
            *handle = None;
            StagePoll::Failed(EngineError::GenerationCancelled(position))
        }
        TaskStatus::Lost => {
            *handle = None;
            StagePoll::Failed(EngineError::GenerationFailed(position, stage))
        }
    }
}

/// One chunk's trip through the generation pipeline.
///
/// The job counts itself in the shared [`InFlightCounter`] from construction until it
/// completes, fails, or is disposed, whichever comes first.
#[derive(Debug)]
pub struct ChunkGenerationJob {
    request: GenerationData,
    chunk_id: ChunkId,
    revision: u64,
    state: JobState,
    token: CancellationToken,
    context: JobContext,
    /// Whether this job is still included in the in-flight count.
    counted: bool,
    data_task: Option<TaskHandle<Option<ChunkData>>>,
    collider_task: Option<TaskHandle<Option<ColliderData>>>,
    mesh_task: Option<TaskHandle<Option<MeshData>>>,
    data: Option<Arc<ChunkData>>,
    collider: Option<ColliderData>,
    mesh: Option<MeshData>,
    failure: Option<EngineError>,
    started_at: Instant,
}

impl ChunkGenerationJob {
    /// Creates a job and schedules its first stage.
    ///
    /// # Arguments
    /// * `request` - The target coordinate and requested stages
    /// * `chunk_id` - Id of the chunk instance the results are meant for
    /// * `data` - Voxel data to build geometry from when `DATA` is not requested
    /// * `revision` - The chunk's revision at start, echoed in the result
    /// * `context` - Worker pool, generator and shared counters
    pub fn new(
        request: GenerationData,
        chunk_id: ChunkId,
        data: Option<ChunkData>,
        revision: u64,
        context: &JobContext,
    ) -> Self {
        let token = context.token.child();
        context.in_flight.increment();

        let mut job = ChunkGenerationJob {
            request,
            chunk_id,
            revision,
            state: JobState::Created,
            token,
            context: context.clone(),
            counted: true,
            data_task: None,
            collider_task: None,
            mesh_task: None,
            data: None,
            collider: None,
            mesh: None,
            failure: None,
            started_at: Instant::now(),
        };

        if request.stages.contains(GenerationStages::DATA) {
            job.data_task = Some(context.task_manager.publish_task(TerrainDataTask {
                position: request.position,
                generator: Arc::clone(&context.generator),
                token: job.token.clone(),
            }));
            job.state = JobState::DataPending;
        } else if let Some(data) = data {
            job.data = Some(Arc::new(data));
            job.state = JobState::DataPending;
        } else {
            warn!(
                "Chunk {:?} requested {:?} without voxel data",
                request.position, request.stages
            );
            job.fail(EngineError::ChunkNotReady(request.position));
        }
        job
    }

    pub fn position(&self) -> ChunkPosition {
        self.request.position
    }

    pub fn chunk_id(&self) -> ChunkId {
        self.chunk_id
    }

    pub fn request(&self) -> GenerationData {
        self.request
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Cancels only this job. Stages that have not started yet will not run.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Advances the data stage without blocking.
    ///
    /// # Returns
    /// `true` exactly once, on the call that observes the data stage finishing. The
    /// collider and mesh stages are scheduled before it returns.
    pub fn complete_data_generation(&mut self) -> bool {
        if self.state != JobState::DataPending {
            return false;
        }

        match poll_stage(&mut self.data_task, self.request.position, GenerationStage::Data) {
            StagePoll::Pending => return false,
            StagePoll::Failed(e) => {
                self.fail(e);
                return false;
            }
            StagePoll::Done(Some(data)) => self.data = Some(Arc::new(data)),
            StagePoll::Done(None) => {}
        }

        let Some(data) = self.data.clone() else {
            self.fail(EngineError::GenerationFailed(
                self.request.position,
                GenerationStage::Data,
            ));
            return false;
        };

        self.state = JobState::DataComplete;
        debug!(
            "Chunk {:?} data ready after {:.2} ms",
            self.request.position,
            self.started_at.elapsed().as_secs_f64() * 1000.0
        );
        self.schedule_geometry(data);
        true
    }

    fn schedule_geometry(&mut self, data: Arc<ChunkData>) {
        let task_manager = &self.context.task_manager;
        if self.request.stages.contains(GenerationStages::COLLIDER) {
            self.collider_task = Some(task_manager.publish_task(ColliderTask {
                data: Arc::clone(&data),
                token: self.token.clone(),
            }));
        }
        if self.request.stages.contains(GenerationStages::MESH) {
            self.mesh_task = Some(task_manager.publish_task(MeshTask {
                data,
                strategy: self.context.mesh_strategy,
                token: self.token.clone(),
            }));
        }
        self.state = JobState::MeshAndColliderPending;
    }

    /// Advances the collider and mesh stages without blocking.
    ///
    /// # Returns
    /// - `None` while any stage is still running, and on every call after the first
    ///   result
    /// - `Some(Ok(chunk))` once both stages have finished; every buffer moves out
    /// - `Some(Err(e))` once when a stage failed or the job was cancelled
    pub fn complete_mesh_generation(&mut self) -> Option<Result<GeneratedChunk, EngineError>> {
        match self.state {
            JobState::Failed => {
                let failure = self.failure.take()?;
                self.finish();
                return Some(Err(failure));
            }
            JobState::MeshAndColliderPending => {}
            _ => return None,
        }

        let position = self.request.position;
        match poll_stage(&mut self.collider_task, position, GenerationStage::Collider) {
            StagePoll::Done(Some(collider)) => self.collider = Some(collider),
            StagePoll::Done(None) | StagePoll::Pending => {}
            StagePoll::Failed(e) => self.fail(e),
        }
        match poll_stage(&mut self.mesh_task, position, GenerationStage::Mesh) {
            StagePoll::Done(Some(mesh)) => self.mesh = Some(mesh),
            StagePoll::Done(None) | StagePoll::Pending => {}
            StagePoll::Failed(e) => self.fail(e),
        }

        if self.state == JobState::Failed {
            return self.complete_mesh_generation();
        }
        if self.collider_task.is_some() || self.mesh_task.is_some() {
            return None;
        }

        let data = self.data.take()?;
        self.state = JobState::Complete;
        self.finish();
        debug!(
            "Chunk {:?} {:?} generated in {:.2} ms",
            position,
            self.request.stages,
            self.started_at.elapsed().as_secs_f64() * 1000.0
        );

        Some(Ok(GeneratedChunk {
            position,
            chunk_id: self.chunk_id,
            stages: self.request.stages,
            data: Arc::unwrap_or_clone(data),
            mesh: self.mesh.take(),
            collider: self.collider.take(),
            revision: self.revision,
        }))
    }

    /// Records the first failure. Later failures of the same job are dropped.
    fn fail(&mut self, error: EngineError) {
        if self.state == JobState::Failed || self.state == JobState::Disposed {
            return;
        }
        self.state = JobState::Failed;
        self.failure = Some(error);
    }

    /// Leaves the in-flight count. Safe to call more than once.
    fn finish(&mut self) {
        if self.counted {
            self.counted = false;
            self.context.in_flight.decrement();
        }
    }

    /// Cancels the job, waits for every outstanding stage to return and releases all
    /// buffers. Disposing twice does nothing.
    pub fn dispose(&mut self) {
        if self.state == JobState::Disposed {
            return;
        }
        self.token.cancel();

        // Stage outputs are discarded; only their termination matters.
        if let Some(handle) = self.data_task.take() {
            handle.wait();
        }
        if let Some(handle) = self.collider_task.take() {
            handle.wait();
        }
        if let Some(handle) = self.mesh_task.take() {
            handle.wait();
        }

        self.data = None;
        self.collider = None;
        self.mesh = None;
        self.failure = None;
        self.finish();
        self.state = JobState::Disposed;
    }
}

impl Drop for ChunkGenerationJob {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::settings::GenerationParameters;
    use cgmath::Point3;
    use std::thread;
    use std::time::Duration;

    fn context(workers: usize) -> JobContext {
        JobContext {
            token: CancellationToken::new(),
            in_flight: InFlightCounter::new(),
            task_manager: TaskManager::new(workers),
            generator: Arc::new(TerrainGenerator::new(GenerationParameters::default())),
            mesh_strategy: MeshStrategy::Sequential,
        }
    }

    fn drive(job: &mut ChunkGenerationJob) -> (usize, Result<GeneratedChunk, EngineError>) {
        let mut data_transitions = 0;
        loop {
            if job.complete_data_generation() {
                data_transitions += 1;
            }
            if let Some(result) = job.complete_mesh_generation() {
                return (data_transitions, result);
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn a_full_job_produces_every_buffer() {
        let context = context(2);
        let mut job = ChunkGenerationJob::new(
            GenerationData::full(Point3::new(1, 0, 2)),
            11,
            None,
            0,
            &context,
        );
        assert_eq!(context.in_flight.get(), 1);

        let (data_transitions, result) = drive(&mut job);
        assert_eq!(data_transitions, 1);
        let chunk = result.unwrap();
        assert_eq!(chunk.chunk_id, 11);
        assert!(chunk.mesh.is_some_and(|mesh| !mesh.is_empty()));
        assert!(chunk.collider.is_some());
        assert_eq!(context.in_flight.get(), 0);
        assert_eq!(job.state(), JobState::Complete);

        assert!(!job.complete_data_generation());
        assert!(job.complete_mesh_generation().is_none());
    }

    #[test]
    fn a_partial_job_reuses_supplied_data() {
        let context = context(1);
        let data = context.generator.generate(Point3::new(0, 0, 0));
        let mut job = ChunkGenerationJob::new(
            GenerationData::new(Point3::new(0, 0, 0), GenerationStages::MESH),
            3,
            Some(data.clone()),
            4,
            &context,
        );

        let (_, result) = drive(&mut job);
        let chunk = result.unwrap();
        assert_eq!(chunk.data, data);
        assert_eq!(chunk.revision, 4);
        assert!(chunk.mesh.is_some());
        assert!(chunk.collider.is_none());
    }

    #[test]
    fn a_partial_job_without_data_fails_once() {
        let context = context(0);
        let mut job = ChunkGenerationJob::new(
            GenerationData::new(Point3::new(0, 0, 0), GenerationStages::COLLIDER),
            3,
            None,
            0,
            &context,
        );
        assert!(matches!(
            job.complete_mesh_generation(),
            Some(Err(EngineError::ChunkNotReady(_)))
        ));
        assert!(job.complete_mesh_generation().is_none());
        assert_eq!(context.in_flight.get(), 0);
    }

    #[test]
    fn a_cancelled_job_reports_cancellation() {
        // Inline execution: the data stage has already run when `new` returns.
        let context = context(0);
        let mut job = ChunkGenerationJob::new(
            GenerationData::full(Point3::new(0, 0, 0)),
            1,
            None,
            0,
            &context,
        );
        job.cancel();
        // Geometry stages observe the cancellation before running.
        assert!(job.complete_data_generation());
        assert!(matches!(
            job.complete_mesh_generation(),
            Some(Err(EngineError::GenerationCancelled(_)))
        ));
        assert_eq!(context.in_flight.get(), 0);
    }

    #[test]
    fn disposal_drains_the_counter_and_is_idempotent() {
        let context = context(2);
        let mut jobs: Vec<_> = (0..6)
            .map(|i| {
                ChunkGenerationJob::new(
                    GenerationData::full(Point3::new(i, 0, 0)),
                    i as ChunkId,
                    None,
                    0,
                    &context,
                )
            })
            .collect();
        assert_eq!(context.in_flight.get(), 6);

        for job in &mut jobs {
            job.dispose();
            job.dispose();
            assert_eq!(job.state(), JobState::Disposed);
        }
        assert_eq!(context.in_flight.get(), 0);
        drop(jobs);
        assert_eq!(context.in_flight.get(), 0);
    }

    #[test]
    fn dropping_a_running_job_leaves_the_count() {
        let context = context(1);
        let job = ChunkGenerationJob::new(
            GenerationData::full(Point3::new(0, 0, 0)),
            1,
            None,
            0,
            &context,
        );
        drop(job);
        assert_eq!(context.in_flight.get(), 0);
    }
}
