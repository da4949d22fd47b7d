/// Primitive topology variants, identity tags and fragment records
use nalgebra::{Vector2, Vector4};

use crate::math::Point2D;

/// Opaque identity tags attached to a primitive by the caller.
///
/// Tags are invariant under rasterization: every fragment a primitive
/// produces carries these four values verbatim, which is what a
/// downstream compositor keys shading and picking on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrimitiveTags {
    pub primitive_id: usize,
    pub geometry_id: usize,
    pub node_id: usize,
    pub material_id: usize,
}

/// One primitive corner: a homogeneous position plus up to two
/// texture-coordinate sets (`uv_1` covers lightmap-style secondary UVs).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveVertex {
    pub pos: Vector4<f32>,
    pub uv: Vector2<f32>,
    pub uv_1: Vector2<f32>,
}

impl PrimitiveVertex {
    pub fn new(pos: Vector4<f32>, uv: Vector2<f32>, uv_1: Vector2<f32>) -> Self {
        Self { pos, uv, uv_1 }
    }

    /// A corner with zeroed texture coordinates.
    pub fn untextured(pos: Vector4<f32>) -> Self {
        Self {
            pos,
            uv: Vector2::zeros(),
            uv_1: Vector2::zeros(),
        }
    }
}

/// Primitive topology with a fixed vertex count per variant.
///
/// The rasterizer dispatches on the variant; positions are expected in
/// clip space (post `apply_mv`, before the perspective divide).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Point {
        tags: PrimitiveTags,
        vertex: PrimitiveVertex,
    },
    Line {
        tags: PrimitiveTags,
        a: PrimitiveVertex,
        b: PrimitiveVertex,
    },
    Triangle {
        tags: PrimitiveTags,
        a: PrimitiveVertex,
        b: PrimitiveVertex,
        c: PrimitiveVertex,
    },
}

impl Primitive {
    pub fn tags(&self) -> &PrimitiveTags {
        match self {
            Primitive::Point { tags, .. }
            | Primitive::Line { tags, .. }
            | Primitive::Triangle { tags, .. } => tags,
        }
    }
}

/// A per-pixel record produced by rasterizing one primitive.
///
/// `row` and `col` have sub-pixel precision; `depth` is the
/// post-perspective-divide z used for z-testing downstream. Fragments
/// are transient: created per rasterized primitive and consumed
/// immediately by the color stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub tags: PrimitiveTags,
    pub row: f32,
    pub col: f32,
    pub depth: f32,
    pub uv: Vector2<f32>,
    pub uv_1: Vector2<f32>,
}

impl Fragment {
    /// Screen position as a plain point (row is y, col is x).
    pub fn screen(&self) -> Point2D {
        Point2D::new(self.col, self.row)
    }
}
