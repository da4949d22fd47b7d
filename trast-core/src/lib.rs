/// TRAST Core Library - Fixed-capacity 3D transform and rasterization core
///
/// This library provides the stateless per-frame pipeline for software
/// rendering: transform arenas, bulk model-view application, primitive
/// rasterization into per-pixel fragments, and palette quantization for
/// limited-color output.

pub mod clip;
pub mod error;
pub mod math;
pub mod palette;
pub mod primitive;
pub mod raster;
pub mod transform;
pub mod vertex;

// Re-export commonly used types
pub use clip::{clip_triangle, TriangleClipBuffer};
pub use error::CoreError;
pub use math::{Point2D, Point3D};
pub use palette::{extract_palette, round_to_palette, Image};
pub use primitive::{Fragment, Primitive, PrimitiveTags, PrimitiveVertex};
pub use raster::Rasterizer;
pub use transform::TransformPack;
pub use vertex::VertexBuffer;
