//! Resource module
//!
//! Geometry records shared with the shaders, the mesh registry and the
//! per-frame instance batcher.

pub mod mesh;
pub mod mesh_manager;
pub mod batch_renderer;

pub use mesh::{Mesh2D, MeshInstance, MeshTypeId, Vertex2D, ViewUniform};
pub use mesh_manager::{MeshData, MeshManager};
pub use batch_renderer::{BatchRenderer, FrameStats, MeshInstanceBatch};
