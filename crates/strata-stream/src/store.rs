//! The chunk store: camera-driven residency, budgeted generation and
//! meshing, LOD selection and eviction.
//!
//! Each [`ChunkStore::tick`] runs, in order:
//!
//! 1. locate the camera chunk,
//! 2. queue every missing coord inside the view circle,
//! 3. generate up to `max_gen_per_frame` chunks (or hand them to workers),
//! 4. mesh up to `max_mesh_per_frame` chunks,
//! 5. re-select LODs and rebuild changed meshes immediately,
//! 6. evict chunks beyond the unload distance,
//! 7. rebuild the visible list.
//!
//! Distances are measured between chunk centers, so residency only changes
//! when the camera crosses a chunk border.

use std::sync::Arc;

use glam::Vec3;
use rustc_hash::{FxHashMap, FxHashSet};
use strata_coords::{CHUNK_WORLD_SIZE, ChunkCoord, MAX_WORLD_EXTENT};
use strata_lod::{LodError, LodSelector};
use strata_mesh::{ColorDecorator, MeshSink, MeshSinkError, SlopePalette};
use strata_terrain::{
    AsyncHeightGenerator, HeightTask, HeightmapGenerator, HeightmapSettings, SettingsError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chunk::Chunk;
use crate::queue::{
    ChunkQueue, MAX_UPLOAD_FAILURES, RetrySchedule, backoff_frames, chunk_distance_sq,
};
use crate::stats::{ErrorLog, LastError, TerrainErrorKind, TerrainStats};

/// `unload_distance = view_distance · UNLOAD_FACTOR`.
pub const UNLOAD_FACTOR: f32 = 1.2;

/// Largest accepted view distance or force-load radius, in world units.
pub const MAX_VIEW_DISTANCE: f32 = 16_384.0;

/// Levels used when no explicit LOD distances are configured.
pub const DEFAULT_LOD_LEVELS: usize = 4;

const WORKER_QUEUE_CAPACITY: usize = 64;
const WORKER_RESULT_CAPACITY: usize = 128;

/// Errors raised when building or reconfiguring a store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("invalid store setting `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Lod(#[from] LodError),
}

/// Residency radii and per-frame budgets.
#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    /// Chunks whose center is closer than this to the camera chunk's center
    /// are kept resident.
    pub view_distance: f32,
    /// Chunks farther than this are evicted. At least `view_distance`.
    pub unload_distance: f32,
    pub max_gen_per_frame: usize,
    pub max_mesh_per_frame: usize,
    /// Explicit LOD thresholds. `None` spaces [`DEFAULT_LOD_LEVELS`] levels
    /// quadratically out to `view_distance`.
    pub lod_distances: Option<Vec<f32>>,
    /// Worker threads for height generation; `0` generates on the tick thread.
    pub generation_workers: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::with_view_distance(256.0)
    }
}

impl StoreConfig {
    pub fn with_view_distance(view_distance: f32) -> Self {
        Self {
            view_distance,
            unload_distance: view_distance * UNLOAD_FACTOR,
            max_gen_per_frame: 4,
            max_mesh_per_frame: 4,
            lod_distances: None,
            generation_workers: 0,
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        let invalid = |field, reason| Err(StoreError::InvalidConfig { field, reason });
        if !view_distance_in_range(self.view_distance) {
            return invalid("view_distance", "must be positive and at most MAX_VIEW_DISTANCE");
        }
        if !self.unload_distance.is_finite() || self.unload_distance < self.view_distance {
            return invalid("unload_distance", "must be finite and at least view_distance");
        }
        if self.max_gen_per_frame == 0 {
            return invalid("max_gen_per_frame", "must be at least 1");
        }
        if self.max_mesh_per_frame == 0 {
            return invalid("max_mesh_per_frame", "must be at least 1");
        }
        self.lod_selector()?;
        Ok(())
    }

    fn lod_selector(&self) -> Result<LodSelector, LodError> {
        match &self.lod_distances {
            Some(distances) => LodSelector::from_distances(distances),
            None => Ok(LodSelector::setup_default(
                self.view_distance,
                DEFAULT_LOD_LEVELS,
            )),
        }
    }
}

fn view_distance_in_range(distance: f32) -> bool {
    distance > 0.0 && distance <= MAX_VIEW_DISTANCE
}

/// Chunk rings to scan so every chunk center within `distance` is covered.
fn chunk_reach(distance: f32) -> i32 {
    ((distance / CHUNK_WORLD_SIZE).ceil() as i32).saturating_add(1)
}

/// Owns every resident [`Chunk`] and streams them around a camera.
///
/// Meshes go to the injected [`MeshSink`]; chunks never hold a reference
/// back to the store or the sink.
pub struct ChunkStore<S: MeshSink> {
    config: StoreConfig,
    generator: Arc<HeightmapGenerator>,
    workers: Option<AsyncHeightGenerator>,
    /// Coords handed to `workers` and not yet drained.
    in_flight: FxHashSet<ChunkCoord>,
    sink: S,
    decorator: Box<dyn ColorDecorator + Send + Sync>,
    chunks: FxHashMap<ChunkCoord, Chunk>,
    pending_generation: ChunkQueue,
    pending_mesh_build: ChunkQueue,
    retry: RetrySchedule,
    visible: Vec<ChunkCoord>,
    lod: LodSelector,
    last_camera_chunk: ChunkCoord,
    frame: u64,
    elapsed: f32,
    errors: ErrorLog,
    last_error: LastError,
}

impl<S: MeshSink> ChunkStore<S> {
    pub fn new(
        config: StoreConfig,
        settings: HeightmapSettings,
        sink: S,
    ) -> Result<Self, StoreError> {
        config.validate()?;
        let lod = config.lod_selector()?;
        let generator = Arc::new(HeightmapGenerator::new(settings)?);
        let workers = (config.generation_workers > 0).then(|| {
            AsyncHeightGenerator::new(
                Arc::clone(&generator),
                config.generation_workers,
                WORKER_QUEUE_CAPACITY,
                WORKER_RESULT_CAPACITY,
            )
        });

        Ok(Self {
            config,
            generator,
            workers,
            in_flight: FxHashSet::default(),
            sink,
            decorator: Box::new(SlopePalette::default()),
            chunks: FxHashMap::default(),
            pending_generation: ChunkQueue::new(),
            pending_mesh_build: ChunkQueue::new(),
            retry: RetrySchedule::new(),
            visible: Vec::new(),
            lod,
            last_camera_chunk: ChunkCoord::default(),
            frame: 0,
            elapsed: 0.0,
            errors: ErrorLog::default(),
            last_error: LastError::default(),
        })
    }

    /// Replaces the vertex color policy. Existing meshes keep their colors
    /// until rebuilt.
    pub fn with_decorator(mut self, decorator: impl ColorDecorator + Send + Sync + 'static) -> Self {
        self.decorator = Box::new(decorator);
        self
    }

    // -- Frame update --------------------------------------------------------

    /// Advances streaming by one frame. Never fails; problems are reported
    /// through [`ChunkStore::stats`] and [`ChunkStore::error_log`].
    ///
    /// A camera that is non-finite or beyond [`MAX_WORLD_EXTENT`] still
    /// advances the frame but leaves residency untouched.
    pub fn tick(&mut self, camera: Vec3, delta_time: f32) {
        self.frame += 1;
        if delta_time.is_finite() && delta_time > 0.0 {
            self.elapsed += delta_time;
        }

        let Some(center) = self.locate(camera, "tick") else {
            return;
        };
        self.last_camera_chunk = center;

        self.enqueue_needed(center);
        let generated = self.process_generation(center, Some(self.config.max_gen_per_frame));
        let meshed = self.process_mesh_builds(center, Some(self.config.max_mesh_per_frame));
        let relod = self.update_lods(center);
        let evicted = self.evict_distant(center);
        self.refresh_visible(center);

        if generated + meshed + relod + evicted > 0 {
            debug!(
                frame = self.frame,
                generated,
                meshed,
                relod,
                evicted,
                loaded = self.chunks.len(),
                "terrain tick"
            );
        }
    }

    /// Generates and meshes every coord within `radius` of `pos`
    /// synchronously, ignoring the per-frame budgets.
    pub fn force_load_around(&mut self, pos: Vec3, radius: f32) {
        if !(0.0..=MAX_VIEW_DISTANCE).contains(&radius) {
            warn!(radius, "ignoring force load with invalid radius");
            self.record_error(
                TerrainErrorKind::InvalidSettings,
                format!("force load radius {radius} rejected"),
            );
            return;
        }
        let Some(center) = self.locate(pos, "force load") else {
            return;
        };
        self.last_camera_chunk = center;

        let reach = chunk_reach(radius);
        let mut coords = Vec::new();
        for dz in -reach..=reach {
            for dx in -reach..=reach {
                let coord = center.offset(dx, dz);
                if center.world_distance(coord) <= radius {
                    coords.push(coord);
                }
            }
        }
        coords.sort_unstable_by_key(|&c| (chunk_distance_sq(center, c), c));

        let mut generated = 0;
        for &coord in &coords {
            if self.chunks.contains_key(&coord) {
                continue;
            }
            self.pending_generation.remove(&coord);
            if self.in_flight.remove(&coord) {
                if let Some(workers) = &self.workers {
                    workers.cancel(&coord);
                }
            }
            let chunk = Chunk::generate(coord, &self.generator);
            self.install(center, chunk);
            generated += 1;
        }

        let mut meshed = 0;
        for &coord in &coords {
            let Some(chunk) = self.chunks.get(&coord) else {
                continue;
            };
            if chunk.is_meshed() && !chunk.needs_rebuild() {
                continue;
            }
            self.pending_mesh_build.remove(&coord);
            self.retry.remove(&coord);
            if self.mesh_chunk(center, coord) {
                meshed += 1;
            }
        }

        self.update_lods(center);
        self.refresh_visible(center);
        info!(%center, radius, generated, meshed, "force loaded terrain");
    }

    /// Camera chunk for `pos`, or `None` (recorded as invalid settings) when
    /// the position cannot be streamed.
    fn locate(&mut self, pos: Vec3, context: &str) -> Option<ChunkCoord> {
        let coord = ChunkCoord::try_from_world(pos.x, pos.z);
        if coord.is_none() {
            warn!(x = pos.x, z = pos.z, context, "ignoring out-of-range position");
            self.record_error(
                TerrainErrorKind::InvalidSettings,
                format!(
                    "{context}: position ({}, {}) outside ±{MAX_WORLD_EXTENT}",
                    pos.x, pos.z
                ),
            );
        }
        coord
    }

    fn enqueue_needed(&mut self, center: ChunkCoord) {
        let view = self.config.view_distance;
        let reach = chunk_reach(view);
        for dz in -reach..=reach {
            for dx in -reach..=reach {
                let coord = center.offset(dx, dz);
                if center.world_distance(coord) >= view {
                    continue;
                }
                if self.chunks.contains_key(&coord) || self.in_flight.contains(&coord) {
                    continue;
                }
                self.pending_generation
                    .push(coord, chunk_distance_sq(center, coord));
            }
        }
    }

    fn beyond_unload(&self, center: ChunkCoord, coord: ChunkCoord) -> bool {
        center.world_distance(coord) > self.config.unload_distance
    }

    /// Installs finished worker results, then generates or dispatches queued
    /// coords. Returns the number of chunks installed.
    fn process_generation(&mut self, center: ChunkCoord, budget: Option<usize>) -> usize {
        let mut installed = 0;

        let results = self
            .workers
            .as_ref()
            .map(AsyncHeightGenerator::drain_results)
            .unwrap_or_default();
        for done in results {
            self.in_flight.remove(&done.coord);
            if self.chunks.contains_key(&done.coord) || self.beyond_unload(center, done.coord) {
                continue;
            }
            match Chunk::from_heights(done.coord, done.heights) {
                Ok(chunk) => {
                    self.install(center, chunk);
                    installed += 1;
                }
                Err(err) => self.record_error(
                    TerrainErrorKind::InvalidSettings,
                    format!("chunk {}: discarded worker heights: {err}", done.coord),
                ),
            }
        }

        let mut dispatched = 0;
        while budget.is_none_or(|b| dispatched < b) {
            let Some(coord) = self.pending_generation.pop() else {
                break;
            };
            if self.chunks.contains_key(&coord) || self.beyond_unload(center, coord) {
                continue;
            }

            if let Some(workers) = &self.workers {
                let task = HeightTask {
                    coord,
                    priority: chunk_distance_sq(center, coord),
                };
                if let Err(task) = workers.submit(task) {
                    self.pending_generation.push(task.coord, task.priority);
                    break;
                }
                self.in_flight.insert(coord);
            } else {
                let chunk = Chunk::generate(coord, &self.generator);
                self.install(center, chunk);
                installed += 1;
            }
            dispatched += 1;
        }

        installed
    }

    fn install(&mut self, center: ChunkCoord, mut chunk: Chunk) {
        let coord = chunk.coord();
        chunk.set_lod(self.lod.lod_for(center.world_distance(coord)));
        self.chunks.insert(coord, chunk);
        self.pending_mesh_build
            .push(coord, chunk_distance_sq(center, coord));
    }

    /// Returns the number of mesh builds attempted.
    fn process_mesh_builds(&mut self, center: ChunkCoord, budget: Option<usize>) -> usize {
        for coord in self.retry.take_ready(self.frame) {
            if self.chunks.contains_key(&coord) {
                self.pending_mesh_build
                    .push(coord, chunk_distance_sq(center, coord));
            }
        }

        let mut attempted = 0;
        while budget.is_none_or(|b| attempted < b) {
            let Some(coord) = self.pending_mesh_build.pop() else {
                break;
            };
            let Some(chunk) = self.chunks.get(&coord) else {
                continue;
            };
            if chunk.is_meshed() && !chunk.needs_rebuild() {
                continue;
            }
            self.mesh_chunk(center, coord);
            attempted += 1;
        }
        attempted
    }

    /// Builds and uploads one chunk's mesh at its current LOD.
    fn mesh_chunk(&mut self, center: ChunkCoord, coord: ChunkCoord) -> bool {
        let height_range = self.generator.height_range();
        let Some(chunk) = self.chunks.get_mut(&coord) else {
            return false;
        };
        let lod = chunk.lod();
        let result = chunk.build_mesh(&mut self.sink, lod, &*self.decorator, height_range);
        let failures = chunk.upload_failures();

        match result {
            Ok(()) => {
                self.retry.remove(&coord);
                true
            }
            Err(err) => {
                self.handle_upload_failure(center, coord, failures, &err);
                false
            }
        }
    }

    fn handle_upload_failure(
        &mut self,
        center: ChunkCoord,
        coord: ChunkCoord,
        failures: u32,
        err: &MeshSinkError,
    ) {
        self.record_error(
            TerrainErrorKind::MeshSinkFailure,
            format!("chunk {coord}: mesh upload failed ({failures} in a row): {err}"),
        );

        if failures >= MAX_UPLOAD_FAILURES {
            warn!(%coord, failures, error = %err, "evicting chunk after repeated upload failures");
            self.evict(coord);
            if center.world_distance(coord) < self.config.view_distance {
                self.pending_generation
                    .push(coord, chunk_distance_sq(center, coord));
            }
        } else {
            let delay = backoff_frames(failures);
            warn!(%coord, failures, delay, error = %err, "mesh upload failed, backing off");
            self.retry.schedule(coord, self.frame + delay);
        }
    }

    /// Re-selects every chunk's LOD; meshed chunks whose level changed are
    /// rebuilt in place. Returns the number of LOD changes.
    fn update_lods(&mut self, center: ChunkCoord) -> usize {
        let changes: Vec<(ChunkCoord, u8)> = self
            .chunks
            .values()
            .filter_map(|chunk| {
                let lod = self.lod.lod_for(center.world_distance(chunk.coord()));
                (lod != chunk.lod()).then_some((chunk.coord(), lod))
            })
            .collect();

        for &(coord, lod) in &changes {
            let Some(chunk) = self.chunks.get_mut(&coord) else {
                continue;
            };
            chunk.set_lod(lod);
            if chunk.is_meshed() {
                self.mesh_chunk(center, coord);
            }
        }
        changes.len()
    }

    /// Evicts chunks beyond the unload distance, drops queued coords and
    /// cancels worker tasks that fell out of range.
    fn evict_distant(&mut self, center: ChunkCoord) -> usize {
        let unload = self.config.unload_distance;
        let mut doomed: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .copied()
            .filter(|&coord| center.world_distance(coord) > unload)
            .collect();
        doomed.sort_unstable();
        for &coord in &doomed {
            self.evict(coord);
        }

        self.pending_generation
            .retain(|coord| center.world_distance(coord) <= unload);
        if let Some(workers) = &self.workers {
            self.in_flight.retain(|coord| {
                let keep = center.world_distance(*coord) <= unload;
                if !keep {
                    workers.cancel(coord);
                }
                keep
            });
        }

        doomed.len()
    }

    fn evict(&mut self, coord: ChunkCoord) {
        if let Some(mut chunk) = self.chunks.remove(&coord) {
            chunk.release_mesh(&mut self.sink);
        }
        self.pending_mesh_build.remove(&coord);
        self.retry.remove(&coord);
    }

    fn refresh_visible(&mut self, center: ChunkCoord) {
        self.visible.clear();
        self.visible.extend(
            self.chunks
                .values()
                .filter(|chunk| chunk.is_meshed())
                .map(Chunk::coord),
        );
        self.visible
            .sort_unstable_by_key(|&coord| (chunk_distance_sq(center, coord), coord));
    }

    fn record_error(&mut self, kind: TerrainErrorKind, message: String) {
        self.last_error.set(kind);
        self.errors.push(message);
    }

    // -- Queries -------------------------------------------------------------

    /// Terrain height at world `(x, z)`, or `None` if the owning chunk is
    /// not loaded.
    pub fn try_height_at(&self, x: f32, z: f32) -> Option<f32> {
        let coord = ChunkCoord::from_world(x, z);
        let chunk = self.chunks.get(&coord)?;
        let origin = coord.origin_world();
        Some(chunk.height_at_local(x - origin.x, z - origin.y))
    }

    /// Terrain height at world `(x, z)`; `0.0` if the owning chunk is not
    /// loaded, which is recorded as [`TerrainErrorKind::OutOfViewHeightQuery`].
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.try_height_at(x, z).unwrap_or_else(|| {
            self.last_error.set(TerrainErrorKind::OutOfViewHeightQuery);
            0.0
        })
    }

    pub fn stats(&self) -> TerrainStats {
        TerrainStats {
            loaded: self.chunks.len(),
            pending_gen: self.pending_generation.len() + self.in_flight.len(),
            pending_mesh: self.pending_mesh_build.len() + self.retry.len(),
            visible: self.visible.len(),
            total_triangles: self.chunks.values().map(Chunk::triangle_count).sum(),
            frame: self.frame,
            last_error_kind: self.last_error.get(),
        }
    }

    /// Coords of meshed chunks, sorted nearest to the camera chunk first with
    /// ties broken by coord rather than left in storage order.
    pub fn visible_chunks(&self) -> &[ChunkCoord] {
        &self.visible
    }

    pub fn visible_iter(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.visible
            .iter()
            .filter_map(|coord| self.chunks.get(coord))
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.values()
    }

    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Queued for generation or being generated by a worker.
    pub fn is_pending_generation(&self, coord: ChunkCoord) -> bool {
        self.pending_generation.contains(&coord) || self.in_flight.contains(&coord)
    }

    /// Queued for a mesh build or backing off after a failed upload.
    pub fn is_pending_mesh(&self, coord: ChunkCoord) -> bool {
        self.pending_mesh_build.contains(&coord) || self.retry.contains(&coord)
    }

    /// Frame at which a failed chunk becomes eligible for another upload.
    pub fn retry_frame(&self, coord: ChunkCoord) -> Option<u64> {
        self.retry.ready_frame(&coord)
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn generator(&self) -> &HeightmapGenerator {
        &self.generator
    }

    pub fn lod_selector(&self) -> &LodSelector {
        &self.lod
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Sum of valid `delta_time`s passed to [`ChunkStore::tick`].
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn last_camera_chunk(&self) -> ChunkCoord {
        self.last_camera_chunk
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // -- Reconfiguration -----------------------------------------------------

    /// Sets the view distance and derives `unload = 1.2 · view`. Default LOD
    /// spacing follows the new distance; explicit LOD distances are kept.
    pub fn set_view_distance(&mut self, view_distance: f32) -> Result<(), StoreError> {
        if !view_distance_in_range(view_distance) {
            warn!(view_distance, "rejected view distance");
            self.record_error(
                TerrainErrorKind::InvalidSettings,
                format!("view distance {view_distance} rejected"),
            );
            return Err(StoreError::InvalidConfig {
                field: "view_distance",
                reason: "must be positive and at most MAX_VIEW_DISTANCE",
            });
        }
        self.config.view_distance = view_distance;
        self.config.unload_distance = view_distance * UNLOAD_FACTOR;
        if self.config.lod_distances.is_none() {
            self.lod = LodSelector::setup_default(view_distance, DEFAULT_LOD_LEVELS);
        }
        Ok(())
    }

    /// Replaces the LOD thresholds. Every chunk is re-evaluated on the next
    /// tick.
    pub fn set_lod_distances(&mut self, distances: &[f32]) -> Result<(), LodError> {
        match LodSelector::from_distances(distances) {
            Ok(selector) => {
                self.lod = selector;
                self.config.lod_distances = Some(distances.to_vec());
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "rejected LOD distances");
                self.record_error(
                    TerrainErrorKind::InvalidSettings,
                    format!("LOD distances rejected: {err}"),
                );
                Err(err)
            }
        }
    }

    /// Releases every mesh and forgets all chunks and queued work.
    pub fn clear(&mut self) {
        for chunk in self.chunks.values_mut() {
            chunk.release_mesh(&mut self.sink);
        }
        self.chunks.clear();
        self.pending_generation.clear();
        self.pending_mesh_build.clear();
        self.retry.clear();
        self.visible.clear();
        if let Some(workers) = &self.workers {
            for coord in self.in_flight.drain() {
                workers.cancel(&coord);
            }
        }
        self.in_flight.clear();
    }
}

impl<S: MeshSink> std::fmt::Debug for ChunkStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStore")
            .field("config", &self.config)
            .field("loaded", &self.chunks.len())
            .field("frame", &self.frame)
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
