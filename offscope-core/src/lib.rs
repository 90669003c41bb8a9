/// Offscope Core Library - mesh loading, normal estimation and camera model
///
/// This library holds the rendering-API independent parts of the viewer:
/// OFF parsing, smooth normals, vertex adjacency, and the Euler-angle camera
/// that produces view and projection matrices.

pub mod adjacency;
pub mod camera;
pub mod error;
pub mod geometry;
pub mod normals;
pub mod off;
pub mod transform;

// Re-export commonly used types
pub use adjacency::one_ring;
pub use camera::{Camera, CameraSettings, Movement, Orientation, Projection};
pub use error::{MeshError, Result};
pub use geometry::{BoundingBox, Mesh};
pub use normals::{compute_smooth_normals, WeightMode};
pub use off::{load_off, parse_off, OffData};
pub use transform::{ModelTransform, RotationState};
