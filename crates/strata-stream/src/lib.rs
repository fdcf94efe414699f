//! Camera-driven terrain streaming.
//!
//! [`ChunkStore`] keeps the chunks around a camera resident: it generates
//! heights, meshes them through a [`strata_mesh::MeshSink`], picks a level of
//! detail per chunk and evicts what falls out of range, all within per-frame
//! budgets.

pub mod chunk;
pub mod queue;
pub mod stats;
pub mod store;

pub use chunk::{Chunk, ChunkState};
pub use queue::{
    ChunkQueue, MAX_BACKOFF_FRAMES, MAX_UPLOAD_FAILURES, RetrySchedule, backoff_frames,
    chunk_distance_sq,
};
pub use stats::{ERROR_LOG_CAPACITY, ErrorLog, TerrainErrorKind, TerrainStats};
pub use store::{
    ChunkStore, DEFAULT_LOD_LEVELS, MAX_VIEW_DISTANCE, StoreConfig, StoreError, UNLOAD_FACTOR,
};
