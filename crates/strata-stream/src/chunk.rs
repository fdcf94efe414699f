//! One terrain tile: its height samples and the mesh built from them.

use strata_coords::{
    CHUNK_SAMPLE_COUNT, CHUNK_SAMPLES, CHUNK_SCALE, ChunkCoord, MAX_LOD, sample_index,
};
use strata_mesh::{
    ColorDecorator, MeshHandle, MeshSink, MeshSinkError, build_heightfield_mesh,
};
use strata_terrain::{HeightmapGenerator, SettingsError, min_max};

/// Lifecycle of a [`Chunk`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ChunkState {
    /// No heights yet.
    Empty,
    /// Heights generated, no live mesh.
    HeightsReady,
    /// A mesh for the current heights is held by the sink.
    Meshed,
}

/// A single terrain tile.
///
/// `mesh_handle` is present iff `state == Meshed`. `needs_rebuild` is set
/// whenever heights or LOD change and cleared by a successful upload.
#[derive(Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    heights: Vec<f32>,
    min_height: f32,
    max_height: f32,
    lod: u8,
    mesh_handle: Option<MeshHandle>,
    needs_rebuild: bool,
    state: ChunkState,
    triangle_count: usize,
    upload_failures: u32,
}

impl Chunk {
    /// An empty chunk with no heights.
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            heights: Vec::new(),
            min_height: 0.0,
            max_height: 0.0,
            lod: 0,
            mesh_handle: None,
            needs_rebuild: false,
            state: ChunkState::Empty,
            triangle_count: 0,
            upload_failures: 0,
        }
    }

    /// Generates the heights of `coord` synchronously.
    pub fn generate(coord: ChunkCoord, generator: &HeightmapGenerator) -> Self {
        let mut chunk = Self::new(coord);
        chunk.install_heights(generator.generate_chunk(coord));
        chunk
    }

    /// Wraps heights produced elsewhere, e.g. by a worker pool.
    pub fn from_heights(coord: ChunkCoord, heights: Vec<f32>) -> Result<Self, SettingsError> {
        if heights.len() != CHUNK_SAMPLE_COUNT {
            return Err(SettingsError::DimensionMismatch {
                expected: CHUNK_SAMPLE_COUNT,
                actual: heights.len(),
            });
        }
        let mut chunk = Self::new(coord);
        chunk.install_heights(heights);
        Ok(chunk)
    }

    fn install_heights(&mut self, heights: Vec<f32>) {
        let (min, max) = min_max(&heights).unwrap_or((0.0, 0.0));
        self.heights = heights;
        self.min_height = min;
        self.max_height = max;
        self.needs_rebuild = true;
        if self.state == ChunkState::Empty {
            self.state = ChunkState::HeightsReady;
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Row-major `(CHUNK_SIZE + 1)²` samples, empty while [`ChunkState::Empty`].
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    pub fn lod(&self) -> u8 {
        self.lod
    }

    pub fn state(&self) -> ChunkState {
        self.state
    }

    pub fn mesh_handle(&self) -> Option<MeshHandle> {
        self.mesh_handle
    }

    pub fn is_meshed(&self) -> bool {
        self.mesh_handle.is_some()
    }

    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    /// Triangles in the live mesh, `0` without one.
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Consecutive failed uploads since the last success.
    pub fn upload_failures(&self) -> u32 {
        self.upload_failures
    }

    /// Changes the LOD, flagging a rebuild if it differs.
    pub fn set_lod(&mut self, lod: u8) {
        let lod = lod.min(MAX_LOD);
        if lod != self.lod {
            self.lod = lod;
            self.needs_rebuild = true;
        }
    }

    /// Meshes the heights at `lod` and uploads the result.
    ///
    /// Any previous mesh is released before the upload, so a chunk never
    /// owns more than one handle. On failure the chunk stays
    /// [`ChunkState::HeightsReady`] with `needs_rebuild` set.
    pub fn build_mesh(
        &mut self,
        sink: &mut dyn MeshSink,
        lod: u8,
        decorator: &dyn ColorDecorator,
        height_range: (f32, f32),
    ) -> Result<(), MeshSinkError> {
        if self.state == ChunkState::Empty {
            return Ok(());
        }
        self.set_lod(lod);

        let mesh = build_heightfield_mesh(
            &self.heights,
            self.coord.origin_world(),
            self.lod,
            height_range,
            decorator,
        );

        self.release_mesh(sink);
        match sink.upload(&mesh) {
            Ok(handle) => {
                self.mesh_handle = Some(handle);
                self.triangle_count = mesh.triangle_count();
                self.state = ChunkState::Meshed;
                self.needs_rebuild = false;
                self.upload_failures = 0;
                Ok(())
            }
            Err(err) => {
                self.upload_failures += 1;
                self.needs_rebuild = true;
                Err(err)
            }
        }
    }

    /// Returns the mesh handle to the sink. Safe to call without a mesh.
    pub fn release_mesh(&mut self, sink: &mut dyn MeshSink) {
        if let Some(handle) = self.mesh_handle.take() {
            sink.release(handle);
        }
        self.triangle_count = 0;
        if self.state == ChunkState::Meshed {
            self.state = ChunkState::HeightsReady;
            self.needs_rebuild = true;
        }
    }

    /// Bilinear height at chunk-local world offsets `(lx, lz)`, clamped to
    /// the chunk. Returns `0.0` for an empty chunk.
    pub fn height_at_local(&self, lx: f32, lz: f32) -> f32 {
        if self.heights.len() != CHUNK_SAMPLE_COUNT {
            return 0.0;
        }
        let last = (CHUNK_SAMPLES - 1) as f32;
        let x = (lx / CHUNK_SCALE).clamp(0.0, last);
        let z = (lz / CHUNK_SCALE).clamp(0.0, last);
        let x0 = x.floor() as usize;
        let z0 = z.floor() as usize;
        let x1 = (x0 + 1).min(CHUNK_SAMPLES - 1);
        let z1 = (z0 + 1).min(CHUNK_SAMPLES - 1);
        let u = x - x0 as f32;
        let v = z - z0 as f32;

        let h = |x: usize, z: usize| self.heights[sample_index(x, z)];
        let near = h(x0, z0) * (1.0 - u) + h(x1, z0) * u;
        let far = h(x0, z1) * (1.0 - u) + h(x1, z1) * u;
        near * (1.0 - v) + far * v
    }
}
