//! Background height generation on a worker pool.
//!
//! Each task owns a freshly allocated heights buffer and hands it back over a
//! bounded channel. Results are drained and installed by the owning thread;
//! workers never touch chunk storage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;
use strata_coords::ChunkCoord;

use crate::generator::HeightmapGenerator;

/// A request to generate the heights of one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeightTask {
    pub coord: ChunkCoord,
    /// Lower values are more urgent (typically squared chunk distance).
    pub priority: u64,
}

/// Heights produced by a worker.
#[derive(Debug)]
pub struct GeneratedHeights {
    pub coord: ChunkCoord,
    /// `(CHUNK_SIZE + 1)²` samples, row-major.
    pub heights: Vec<f32>,
    /// Generation time in microseconds (for profiling).
    pub generation_time_us: u64,
}

struct QueuedTask {
    task: HeightTask,
    cancelled: Arc<AtomicBool>,
}

/// Generates chunk heights across a thread pool.
pub struct AsyncHeightGenerator {
    task_sender: Sender<QueuedTask>,
    result_receiver: Receiver<GeneratedHeights>,
    /// Cancellation flag per in-flight coord.
    active_tasks: Arc<DashMap<ChunkCoord, Arc<AtomicBool>>>,
    in_flight: Arc<AtomicU64>,
    thread_count: usize,
}

impl AsyncHeightGenerator {
    /// Spawns `thread_count` workers sharing `generator`.
    ///
    /// `max_concurrent` bounds queued tasks; excess submissions are rejected.
    pub fn new(
        generator: Arc<HeightmapGenerator>,
        thread_count: usize,
        max_concurrent: usize,
        result_capacity: usize,
    ) -> Self {
        let (task_sender, task_receiver) = bounded::<QueuedTask>(max_concurrent.max(1));
        let (result_sender, result_receiver) = bounded::<GeneratedHeights>(result_capacity.max(1));
        let in_flight = Arc::new(AtomicU64::new(0));
        let thread_count = thread_count.max(1);

        for index in 0..thread_count {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let in_flight = Arc::clone(&in_flight);
            let generator = Arc::clone(&generator);

            std::thread::Builder::new()
                .name(format!("strata-gen-{index}"))
                .spawn(move || {
                    while let Ok(queued) = receiver.recv() {
                        if queued.cancelled.load(Ordering::Relaxed) {
                            in_flight.fetch_sub(1, Ordering::Relaxed);
                            continue;
                        }

                        let start = Instant::now();
                        let heights = generator.generate_chunk(queued.task.coord);
                        let elapsed = start.elapsed().as_micros() as u64;

                        if !queued.cancelled.load(Ordering::Relaxed) {
                            let _ = sender.send(GeneratedHeights {
                                coord: queued.task.coord,
                                heights,
                                generation_time_us: elapsed,
                            });
                        }
                        in_flight.fetch_sub(1, Ordering::Relaxed);
                    }
                })
                .expect("failed to spawn height generation worker thread");
        }

        Self {
            task_sender,
            result_receiver,
            active_tasks: Arc::new(DashMap::new()),
            in_flight,
            thread_count,
        }
    }

    /// A pool sized from the CPU count, leaving headroom for the main thread.
    pub fn with_defaults(generator: Arc<HeightmapGenerator>) -> Self {
        let cpus = num_cpus::get().max(2);
        Self::new(generator, (cpus - 1).max(1), 64, 128)
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Queues a task. Returns the task back if the queue is full.
    pub fn submit(&self, task: HeightTask) -> Result<(), HeightTask> {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.active_tasks.insert(task.coord, Arc::clone(&cancelled));
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        self.task_sender
            .try_send(QueuedTask { task, cancelled })
            .map_err(|e| {
                self.in_flight.fetch_sub(1, Ordering::Relaxed);
                let task = e.into_inner().task;
                self.active_tasks.remove(&task.coord);
                task
            })
    }

    /// Cancels a pending or running task. No-op if it already finished.
    pub fn cancel(&self, coord: &ChunkCoord) {
        if let Some((_, cancelled)) = self.active_tasks.remove(coord) {
            cancelled.store(true, Ordering::Relaxed);
        }
    }

    /// Collects every completed result without blocking.
    pub fn drain_results(&self) -> Vec<GeneratedHeights> {
        let mut results = Vec::new();
        while let Ok(done) = self.result_receiver.try_recv() {
            // A coord cancelled after its worker checked the flag may still
            // arrive; only keep results whose task is still registered.
            if self.active_tasks.remove(&done.coord).is_some() {
                results.push(done);
            }
        }
        results
    }

    /// Tasks queued or executing.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn is_pending(&self, coord: &ChunkCoord) -> bool {
        self.active_tasks.contains_key(coord)
    }
}

impl std::fmt::Debug for AsyncHeightGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncHeightGenerator")
            .field("thread_count", &self.thread_count)
            .field("in_flight", &self.in_flight_count())
            .finish_non_exhaustive()
    }
}
