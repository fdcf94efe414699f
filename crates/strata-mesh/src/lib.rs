//! Terrain mesh output: the vertex format, the heightfield mesher and the
//! [`MeshSink`] contract that hands finished meshes to a renderer.

pub mod color;
pub mod float3;
pub mod heightfield;
pub mod sink;
pub mod vertex;

pub use color::{ColorDecorator, FlatColor, SlopePalette};
pub use float3::Float3;
pub use heightfield::{build_heightfield_mesh, grid_resolution, sample_normal};
pub use sink::{MemoryMeshSink, MeshHandle, MeshSink, MeshSinkError};
pub use vertex::{MeshData, MeshVertex, VERTEX_ATTRIBUTE_OFFSETS, VERTEX_STRIDE};
