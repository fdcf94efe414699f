//! Terrain vertex format and owned mesh buffers.
//!
//! ## Layout
//!
//! | Offset | Size | Field      |
//! |--------|------|------------|
//! | 0      | 12   | position   |
//! | 12     | 12   | normal     |
//! | 24     | 8    | uv         |
//! | 32     | 16   | color rgba |
//!
//! Vertices are tightly packed (48-byte stride). On the wire the vertex
//! block is followed by the `u32` index block; every scalar is
//! little-endian.

use std::mem;

/// A single terrain vertex, ready for GPU upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Unit surface normal.
    pub normal: [f32; 3],
    /// Chunk-relative texture coordinates in `[0, 1]`.
    pub uv: [f32; 2],
    /// Linear RGBA.
    pub color: [f32; 4],
}

static_assertions::assert_eq_size!(MeshVertex, [u8; 48]);

/// Byte stride of one [`MeshVertex`].
pub const VERTEX_STRIDE: usize = mem::size_of::<MeshVertex>();

/// Byte offsets of each attribute inside a vertex.
pub const VERTEX_ATTRIBUTE_OFFSETS: [usize; 4] = [
    mem::offset_of!(MeshVertex, position),
    mem::offset_of!(MeshVertex, normal),
    mem::offset_of!(MeshVertex, uv),
    mem::offset_of!(MeshVertex, color),
];

const _: () = assert!(VERTEX_ATTRIBUTE_OFFSETS[0] == 0);
const _: () = assert!(VERTEX_ATTRIBUTE_OFFSETS[1] == 12);
const _: () = assert!(VERTEX_ATTRIBUTE_OFFSETS[2] == 24);
const _: () = assert!(VERTEX_ATTRIBUTE_OFFSETS[3] == 32);

/// Owned vertex and triangle-list index buffers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    /// Triangle list, 3 indices per triangle.
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Native-endian view of the vertex buffer.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Native-endian view of the index buffer.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Size of [`Self::to_le_bytes`] output.
    pub fn wire_len(&self) -> usize {
        self.vertices.len() * VERTEX_STRIDE + self.indices.len() * mem::size_of::<u32>()
    }

    /// Serialises vertices then indices, little-endian and tightly packed.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_len());
        for v in &self.vertices {
            let scalars = v
                .position
                .iter()
                .chain(&v.normal)
                .chain(&v.uv)
                .chain(&v.color);
            for s in scalars {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
        for i in &self.indices {
            out.extend_from_slice(&i.to_le_bytes());
        }
        out
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mesh() -> MeshData {
        let vertex = MeshVertex {
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 1.0, 0.0],
            uv: [0.25, 0.75],
            color: [0.1, 0.2, 0.3, 1.0],
        };
        MeshData {
            vertices: vec![vertex, vertex, vertex],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_vertex_is_48_bytes() {
        assert_eq!(VERTEX_STRIDE, 48);
    }

    #[test]
    fn test_wire_layout() {
        let mesh = sample_mesh();
        let bytes = mesh.to_le_bytes();
        assert_eq!(bytes.len(), mesh.wire_len());
        assert_eq!(bytes.len(), 3 * 48 + 3 * 4);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &0.0f32.to_le_bytes());
        assert_eq!(&bytes[24..28], &0.25f32.to_le_bytes());
        assert_eq!(&bytes[44..48], &1.0f32.to_le_bytes());
        let index_block = &bytes[3 * 48..];
        assert_eq!(&index_block[4..8], &1u32.to_le_bytes());
        assert_eq!(&index_block[8..12], &2u32.to_le_bytes());
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_wire_matches_native_view_on_little_endian() {
        let mesh = sample_mesh();
        let mut native = mesh.vertex_bytes().to_vec();
        native.extend_from_slice(mesh.index_bytes());
        assert_eq!(native, mesh.to_le_bytes());
    }

    #[test]
    fn test_counts() {
        let mut mesh = sample_mesh();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        mesh.clear();
        assert!(mesh.is_empty());
        assert_eq!(mesh.triangle_count(), 0);
    }
}
