//! # Chunk Factory
//!
//! The factory decides when generation requests turn into running jobs, and advances the
//! jobs it started.
//!
//! ## Queues
//!
//! - Priority requests (edits and regeneration) are admitted on the next tick, all of
//!   them.
//! - Bulk requests (chunks entering the window) wait in FIFO order and go through the
//!   throttle. A new bulk batch replaces whatever part of the previous one has not
//!   started yet.
//!
//! ## Throttle
//!
//! Bulk admission happens in windows. A window opens once `time_to_load_next_chunks`
//! seconds have accumulated since the previous one, or immediately when no job is in
//! flight. Opening a window resets the timer and grants a budget of `chunks_processed`
//! jobs. No single tick starts more than `chunks_to_load_per_tick` bulk jobs, and bulk
//! starts never push the in-flight count above `chunks_processed`.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::core::{CancellationToken, InFlightCounter};
use crate::engine_state::settings::WorldSettings;
use crate::engine_state::task_management::TaskManager;
use crate::engine_state::voxels::chunk::{ChunkData, ChunkId, ChunkPosition};
use crate::engine_state::voxels::generation::{GenerationData, GenerationStages, TerrainGenerator};
use crate::error::EngineError;

use super::chunk_generation_job::{ChunkGenerationJob, GeneratedChunk, JobContext};

/// A finished job, successful or not.
#[derive(Debug)]
pub struct JobOutcome {
    pub position: ChunkPosition,
    pub chunk_id: ChunkId,
    pub result: Result<GeneratedChunk, EngineError>,
}

/// Bulk admission throttle state.
#[derive(Debug, Clone)]
struct Throttle {
    chunks_processed: usize,
    chunks_to_load_per_tick: usize,
    interval: f32,
    /// Seconds since the last window opened.
    elapsed: f32,
    /// Bulk starts left in the current window.
    budget: usize,
}

impl Throttle {
    fn new(settings: &WorldSettings) -> Self {
        Throttle {
            chunks_processed: settings.chunks_processed,
            chunks_to_load_per_tick: settings.chunks_to_load_per_tick,
            interval: settings.time_to_load_next_chunks,
            elapsed: 0.0,
            budget: 0,
        }
    }

    fn apply(&mut self, settings: &WorldSettings) {
        self.chunks_processed = settings.chunks_processed;
        self.chunks_to_load_per_tick = settings.chunks_to_load_per_tick;
        self.interval = settings.time_to_load_next_chunks;
        self.budget = self.budget.min(self.chunks_processed);
    }

    /// Advances the timer and returns how many bulk requests may start this tick.
    fn allowance(&mut self, delta: f32, in_flight: usize, pending: usize) -> usize {
        self.elapsed += delta;
        if pending > 0 && (self.elapsed >= self.interval || in_flight == 0) {
            self.elapsed = 0.0;
            self.budget = self.chunks_processed;
        }
        let capacity = self.chunks_processed.saturating_sub(in_flight);
        let allowed = self
            .budget
            .min(capacity)
            .min(self.chunks_to_load_per_tick)
            .min(pending);
        self.budget -= allowed;
        allowed
    }
}

/// Queues, throttles and runs chunk generation jobs.
#[derive(Debug)]
pub struct ChunkFactory {
    bulk: VecDeque<GenerationData>,
    priority: VecDeque<GenerationData>,
    jobs: Vec<ChunkGenerationJob>,
    throttle: Throttle,
    context: JobContext,
    disposed: bool,
}

impl ChunkFactory {
    /// Creates a factory running its stages on `task_manager`.
    pub fn new(
        settings: &WorldSettings,
        generator: Arc<TerrainGenerator>,
        task_manager: TaskManager,
        in_flight: InFlightCounter,
    ) -> Self {
        ChunkFactory {
            bulk: VecDeque::new(),
            priority: VecDeque::new(),
            jobs: Vec::new(),
            throttle: Throttle::new(settings),
            context: JobContext {
                token: CancellationToken::new(),
                in_flight,
                task_manager,
                generator,
                mesh_strategy: settings.mesh_strategy,
            },
            disposed: false,
        }
    }

    /// Applies changed throttle settings and mesh strategy. Running jobs keep the
    /// strategy they started with.
    pub fn apply_settings(&mut self, settings: &WorldSettings) {
        self.throttle.apply(settings);
        self.context.mesh_strategy = settings.mesh_strategy;
    }

    /// Queues a request that bypasses the throttle.
    pub fn enqueue_priority(&mut self, request: GenerationData) {
        self.priority.push_back(request);
    }

    /// Replaces the bulk requests that have not started yet with `requests`.
    ///
    /// # Returns
    /// The replaced requests, which will never start.
    pub fn submit_bulk(&mut self, requests: Vec<GenerationData>) -> Vec<GenerationData> {
        std::mem::replace(&mut self.bulk, requests.into()).into()
    }

    /// Returns the requests to start this tick: every priority request, then the bulk
    /// requests the throttle lets through.
    ///
    /// # Arguments
    /// * `delta` - Seconds since the previous tick
    pub fn admit(&mut self, delta: f32) -> Vec<GenerationData> {
        let mut admitted: Vec<GenerationData> = self.priority.drain(..).collect();
        let allowed =
            self.throttle
                .allowance(delta, self.context.in_flight.get(), self.bulk.len());
        admitted.extend(self.bulk.drain(..allowed));
        admitted
    }

    /// Starts a job for `request` targeting the chunk instance `chunk_id`.
    ///
    /// `data` is what partial requests build geometry from; full requests may pass it to
    /// skip the data stage.
    ///
    /// # Returns
    /// `false` if the factory is disposed and no job was started.
    pub fn start(
        &mut self,
        request: GenerationData,
        chunk_id: ChunkId,
        data: Option<ChunkData>,
        revision: u64,
    ) -> bool {
        if self.disposed {
            warn!("Ignoring {:?}, the chunk factory is disposed", request.position);
            return false;
        }
        let mut request = request;
        if data.is_some() && request.is_full() {
            request.stages = request.stages.without(GenerationStages::DATA);
        }
        debug!("Starting {:?} for chunk {:?}", request.stages, request.position);
        self.jobs.push(ChunkGenerationJob::new(
            request,
            chunk_id,
            data,
            revision,
            &self.context,
        ));
        true
    }

    /// Advances every job and returns the ones that finished.
    pub fn poll(&mut self) -> Vec<JobOutcome> {
        let mut outcomes = Vec::new();
        let mut index = 0;
        while index < self.jobs.len() {
            let job = &mut self.jobs[index];
            job.complete_data_generation();
            match job.complete_mesh_generation() {
                Some(result) => {
                    outcomes.push(JobOutcome {
                        position: job.position(),
                        chunk_id: job.chunk_id(),
                        result,
                    });
                    self.jobs.swap_remove(index);
                }
                None => index += 1,
            }
        }
        outcomes
    }

    /// Disposes every job targeting `position` and drops its queued requests.
    ///
    /// # Returns
    /// The number of running jobs disposed.
    pub fn cancel(&mut self, position: ChunkPosition) -> usize {
        self.bulk.retain(|request| request.position != position);
        self.priority.retain(|request| request.position != position);
        let before = self.jobs.len();
        // Dropping a job disposes it.
        self.jobs.retain(|job| job.position() != position);
        before - self.jobs.len()
    }

    /// Whether a job for `position` is running.
    pub fn is_running(&self, position: ChunkPosition) -> bool {
        self.jobs.iter().any(|job| job.position() == position)
    }

    pub fn running_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn pending_bulk(&self) -> usize {
        self.bulk.len()
    }

    pub fn pending_priority(&self) -> usize {
        self.priority.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Jobs started and not yet completed or disposed, across every factory sharing the
    /// counter.
    pub fn in_flight(&self) -> usize {
        self.context.in_flight.get()
    }

    /// Cancels every job, waits for their stages to return and clears both queues.
    /// Disposing twice does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.context.token.cancel();
        let running = self.jobs.len();
        self.jobs.clear();
        self.bulk.clear();
        self.priority.clear();
        info!("Chunk factory disposed, {} running jobs joined", running);
    }
}

impl Drop for ChunkFactory {
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

    fn factory(settings: &WorldSettings, workers: usize) -> ChunkFactory {
        ChunkFactory::new(
            settings,
            Arc::new(TerrainGenerator::new(GenerationParameters::default())),
            TaskManager::new(workers),
            InFlightCounter::new(),
        )
    }

    fn requests(count: i32) -> Vec<GenerationData> {
        (0..count)
            .map(|x| GenerationData::full(Point3::new(x, 0, 0)))
            .collect()
    }

    #[test]
    fn windows_reopen_on_the_interval_within_the_in_flight_cap() {
        let settings = WorldSettings {
            chunks_processed: 4,
            chunks_to_load_per_tick: 4,
            time_to_load_next_chunks: 1.0,
            ..WorldSettings::default()
        };
        let mut throttle = Throttle::new(&settings);

        // Nothing in flight: a window opens at once.
        assert_eq!(throttle.allowance(0.25, 0, 10), 4);
        // Budget spent, two jobs still running.
        for _ in 0..3 {
            assert_eq!(throttle.allowance(0.25, 2, 6), 0);
        }
        // The next window only fills the two free slots.
        assert_eq!(throttle.allowance(0.25, 2, 6), 2);
        assert_eq!(throttle.allowance(0.25, 4, 4), 0);
    }

    #[test]
    fn unfinished_jobs_hold_back_new_windows() {
        let settings = WorldSettings {
            chunks_processed: 1,
            chunks_to_load_per_tick: 1,
            time_to_load_next_chunks: 1.0,
            ..WorldSettings::default()
        };
        let mut factory = factory(&settings, 1);
        factory.submit_bulk(requests(5));

        let mut started = 0;
        for _ in 0..45 {
            for request in factory.admit(0.1) {
                assert!(factory.start(request, 0, None, 0));
                started += 1;
            }
            // Never polled, so the first job stays in flight.
            assert!(factory.in_flight() <= settings.chunks_processed);
        }
        assert_eq!(started, 1);
        assert_eq!(factory.pending_bulk(), 4);
        factory.dispose();
    }

    #[test]
    fn finished_jobs_free_slots_for_the_next_window() {
        let settings = WorldSettings {
            chunks_processed: 2,
            chunks_to_load_per_tick: 2,
            time_to_load_next_chunks: 0.3,
            ..WorldSettings::default()
        };
        let mut factory = factory(&settings, 1);
        factory.submit_bulk(requests(10));

        let mut started = 0;
        let mut finished = 0;
        for _ in 0..100_000 {
            for request in factory.admit(0.1) {
                factory.start(request, 0, None, 0);
                started += 1;
            }
            assert!(factory.in_flight() <= settings.chunks_processed);
            finished += factory.poll().len();
            if finished == 10 {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(started, 10);
        assert_eq!(finished, 10);
        assert_eq!(factory.in_flight(), 0);
    }

    #[test]
    fn priority_requests_bypass_the_throttle() {
        let settings = WorldSettings {
            chunks_processed: 1,
            chunks_to_load_per_tick: 1,
            time_to_load_next_chunks: 100.0,
            ..WorldSettings::default()
        };
        let mut factory = factory(&settings, 0);
        factory.submit_bulk(requests(3));
        factory.enqueue_priority(GenerationData::new(
            Point3::new(9, 0, 9),
            GenerationStages::MESH,
        ));
        factory.enqueue_priority(GenerationData::new(
            Point3::new(8, 0, 8),
            GenerationStages::MESH,
        ));

        let admitted = factory.admit(0.0);
        assert_eq!(admitted.len(), 3);
        assert_eq!(admitted[0].position, Point3::new(9, 0, 9));
        assert_eq!(admitted[2].position, Point3::new(0, 0, 0));
        assert_eq!(factory.pending_priority(), 0);
        assert_eq!(factory.pending_bulk(), 2);
    }

    #[test]
    fn a_new_bulk_batch_replaces_the_old_one() {
        let mut factory = factory(&WorldSettings::default(), 0);
        factory.submit_bulk(requests(4));
        let replaced = factory.submit_bulk(vec![GenerationData::full(Point3::new(-1, 0, -1))]);
        assert_eq!(replaced, requests(4));
        assert_eq!(factory.pending_bulk(), 1);
        let admitted = factory.admit(1.0);
        assert_eq!(admitted, vec![GenerationData::full(Point3::new(-1, 0, -1))]);
    }

    #[test]
    fn an_idle_pipeline_opens_a_window_immediately() {
        let settings = WorldSettings {
            chunks_processed: 2,
            chunks_to_load_per_tick: 2,
            time_to_load_next_chunks: 100.0,
            ..WorldSettings::default()
        };
        let mut factory = factory(&settings, 0);
        factory.submit_bulk(requests(6));
        for _ in 0..3 {
            assert_eq!(factory.admit(0.01).len(), 2);
        }
    }

    #[test]
    fn polled_jobs_finish_and_drain_the_counter() {
        let mut factory = factory(&WorldSettings::default(), 2);
        for request in requests(3) {
            factory.start(request, request.position.x as ChunkId, None, 0);
        }
        assert_eq!(factory.in_flight(), 3);

        let mut finished = Vec::new();
        while finished.len() < 3 {
            finished.extend(factory.poll());
            thread::sleep(Duration::from_millis(1));
        }
        assert!(finished.iter().all(|outcome| outcome.result.is_ok()));
        assert!(finished
            .iter()
            .all(|outcome| outcome.chunk_id == outcome.position.x as ChunkId));
        assert_eq!(factory.in_flight(), 0);
        assert_eq!(factory.running_jobs(), 0);
    }

    #[test]
    fn cancel_and_dispose_release_jobs() {
        let mut factory = factory(&WorldSettings::default(), 2);
        for request in requests(4) {
            factory.start(request, 0, None, 0);
        }
        assert_eq!(factory.cancel(Point3::new(1, 0, 0)), 1);
        assert!(!factory.is_running(Point3::new(1, 0, 0)));
        assert_eq!(factory.in_flight(), 3);

        factory.dispose();
        factory.dispose();
        assert_eq!(factory.in_flight(), 0);
        assert_eq!(factory.running_jobs(), 0);

        assert!(factory.is_disposed());
        assert!(!factory.start(GenerationData::full(Point3::new(0, 0, 0)), 0, None, 0));
        assert_eq!(factory.running_jobs(), 0);
    }
}
