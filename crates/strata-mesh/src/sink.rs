//! The mesh sink contract and an in-memory implementation.
//!
//! The terrain core never names a graphics API. It hands finished
//! [`MeshData`] to a [`MeshSink`] and keeps only the returned [`MeshHandle`].

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::vertex::MeshData;

/// Opaque identifier of an uploaded mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u64);

/// Why a sink refused an upload.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshSinkError {
    #[error("mesh upload rejected: {0}")]
    Rejected(String),
    #[error("mesh sink is full ({capacity} live meshes)")]
    CapacityExceeded { capacity: usize },
}

/// Receives terrain meshes.
///
/// `upload` must return a handle synchronously even if the backend defers
/// the actual transfer. `release` is idempotent.
pub trait MeshSink {
    fn upload(&mut self, mesh: &MeshData) -> Result<MeshHandle, MeshSinkError>;
    fn release(&mut self, handle: MeshHandle);
}

impl<S: MeshSink + ?Sized> MeshSink for Box<S> {
    fn upload(&mut self, mesh: &MeshData) -> Result<MeshHandle, MeshSinkError> {
        (**self).upload(mesh)
    }

    fn release(&mut self, handle: MeshHandle) {
        (**self).release(handle)
    }
}

/// Sink that keeps uploaded meshes in memory.
///
/// Used by headless hosts and tests. Failures can be scripted with
/// [`MemoryMeshSink::fail_next`] or [`MemoryMeshSink::set_fail_always`].
#[derive(Debug, Default)]
pub struct MemoryMeshSink {
    next_handle: u64,
    live: FxHashMap<MeshHandle, MeshData>,
    capacity: Option<usize>,
    fail_next: u32,
    fail_always: bool,
    uploads: u64,
    releases: u64,
    failed_uploads: u64,
    live_triangles: usize,
}

impl MemoryMeshSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects uploads once `capacity` meshes are live.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Rejects the next `count` uploads.
    pub fn fail_next(&mut self, count: u32) {
        self.fail_next = count;
    }

    /// Rejects every upload while `fail` is set.
    pub fn set_fail_always(&mut self, fail: bool) {
        self.fail_always = fail;
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&MeshData> {
        self.live.get(&handle)
    }

    pub fn is_live(&self, handle: MeshHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Triangles across all live meshes.
    pub fn live_triangles(&self) -> usize {
        self.live_triangles
    }

    /// Successful uploads so far.
    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    /// Releases that freed a live mesh.
    pub fn release_count(&self) -> u64 {
        self.releases
    }

    pub fn failed_upload_count(&self) -> u64 {
        self.failed_uploads
    }
}

impl MeshSink for MemoryMeshSink {
    fn upload(&mut self, mesh: &MeshData) -> Result<MeshHandle, MeshSinkError> {
        if self.fail_always || self.fail_next > 0 {
            self.fail_next = self.fail_next.saturating_sub(1);
            self.failed_uploads += 1;
            return Err(MeshSinkError::Rejected("scripted failure".into()));
        }
        if let Some(capacity) = self.capacity.filter(|&c| self.live.len() >= c) {
            self.failed_uploads += 1;
            return Err(MeshSinkError::CapacityExceeded { capacity });
        }

        let handle = MeshHandle(self.next_handle);
        self.next_handle += 1;
        self.uploads += 1;
        self.live_triangles += mesh.triangle_count();
        self.live.insert(handle, mesh.clone());
        Ok(handle)
    }

    fn release(&mut self, handle: MeshHandle) {
        if let Some(mesh) = self.live.remove(&handle) {
            self.releases += 1;
            self.live_triangles -= mesh.triangle_count();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::MeshVertex;

    fn triangle() -> MeshData {
        MeshData {
            vertices: vec![MeshVertex::default(); 3],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_upload_and_release() {
        let mut sink = MemoryMeshSink::new();
        let a = sink.upload(&triangle()).unwrap();
        let b = sink.upload(&triangle()).unwrap();
        assert_ne!(a, b);
        assert_eq!(sink.live_count(), 2);
        assert_eq!(sink.live_triangles(), 2);

        sink.release(a);
        assert!(!sink.is_live(a));
        assert!(sink.is_live(b));
        assert_eq!(sink.live_triangles(), 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut sink = MemoryMeshSink::new();
        let handle = sink.upload(&triangle()).unwrap();
        sink.release(handle);
        sink.release(handle);
        sink.release(MeshHandle(999));
        assert_eq!(sink.release_count(), 1);
        assert_eq!(sink.live_count(), 0);
    }

    #[test]
    fn test_scripted_failures() {
        let mut sink = MemoryMeshSink::new();
        sink.fail_next(2);
        assert!(sink.upload(&triangle()).is_err());
        assert!(sink.upload(&triangle()).is_err());
        assert!(sink.upload(&triangle()).is_ok());
        assert_eq!(sink.failed_upload_count(), 2);

        sink.set_fail_always(true);
        assert!(matches!(
            sink.upload(&triangle()),
            Err(MeshSinkError::Rejected(_))
        ));
        sink.set_fail_always(false);
        assert!(sink.upload(&triangle()).is_ok());
    }

    #[test]
    fn test_capacity_limit() {
        let mut sink = MemoryMeshSink::with_capacity(1);
        let first = sink.upload(&triangle()).unwrap();
        assert_eq!(
            sink.upload(&triangle()),
            Err(MeshSinkError::CapacityExceeded { capacity: 1 })
        );
        sink.release(first);
        assert!(sink.upload(&triangle()).is_ok());
    }

    #[test]
    fn test_boxed_sink_forwards() {
        let mut boxed: Box<dyn MeshSink> = Box::new(MemoryMeshSink::new());
        let handle = boxed.upload(&triangle()).unwrap();
        boxed.release(handle);
    }
}
