/// Primitive rasterization into per-pixel fragment records
use nalgebra::Vector2;

use crate::primitive::{Fragment, Primitive, PrimitiveTags, PrimitiveVertex};

/// A projected vertex in screen space, after the perspective divide.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    row: f32,
    col: f32,
    depth: f32,
    uv: Vector2<f32>,
    uv_1: Vector2<f32>,
}

/// Rasterizes primitives into a fragment stream.
///
/// The rasterizer holds no state across primitives; it only knows the
/// viewport dimensions. Input positions are clip-space homogeneous
/// vectors; the perspective divide happens here, once per vertex.
/// Screen mapping: `col = (ndc_x + 1) / 2 * cols`,
/// `row = (1 - ndc_y) / 2 * rows` (row 0 is the top of the viewport).
///
/// Degenerate primitives (zero screen-space area, non-positive w) and
/// primitives fully outside the viewport emit no fragments.
pub struct Rasterizer {
    row_count: usize,
    col_count: usize,
}

impl Rasterizer {
    pub fn new(row_count: usize, col_count: usize) -> Self {
        Self {
            row_count,
            col_count,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn col_count(&self) -> usize {
        self.col_count
    }

    /// Rasterize one primitive, emitting fragments through `sink`.
    pub fn rasterize<F: FnMut(Fragment)>(&self, primitive: &Primitive, sink: &mut F) {
        match primitive {
            Primitive::Point { tags, vertex } => self.raster_point(tags, vertex, sink),
            Primitive::Line { tags, a, b } => self.raster_line(tags, a, b, sink),
            Primitive::Triangle { tags, a, b, c } => self.raster_triangle(tags, a, b, c, sink),
        }
    }

    /// Convenience wrapper collecting the fragment stream into a Vec.
    pub fn collect(&self, primitive: &Primitive) -> Vec<Fragment> {
        let mut fragments = Vec::new();
        self.rasterize(primitive, &mut |frag| fragments.push(frag));
        fragments
    }

    /// Perspective divide plus NDC-to-screen mapping.
    fn project(&self, vertex: &PrimitiveVertex) -> Option<ScreenVertex> {
        let w = vertex.pos.w;
        if w <= f32::EPSILON {
            return None;
        }
        let ndc_x = vertex.pos.x / w;
        let ndc_y = vertex.pos.y / w;
        let ndc_z = vertex.pos.z / w;

        Some(ScreenVertex {
            row: (1.0 - ndc_y) * 0.5 * self.row_count as f32,
            col: (ndc_x + 1.0) * 0.5 * self.col_count as f32,
            depth: ndc_z,
            uv: vertex.uv,
            uv_1: vertex.uv_1,
        })
    }

    fn in_viewport(&self, row: f32, col: f32) -> bool {
        row >= 0.0
            && col >= 0.0
            && (row.floor() as usize) < self.row_count
            && (col.floor() as usize) < self.col_count
    }

    fn raster_point<F: FnMut(Fragment)>(
        &self,
        tags: &PrimitiveTags,
        vertex: &PrimitiveVertex,
        sink: &mut F,
    ) {
        let Some(p) = self.project(vertex) else {
            return;
        };
        if self.in_viewport(p.row, p.col) {
            sink(Fragment {
                tags: *tags,
                row: p.row,
                col: p.col,
                depth: p.depth,
                uv: p.uv,
                uv_1: p.uv_1,
            });
        }
    }

    fn raster_line<F: FnMut(Fragment)>(
        &self,
        tags: &PrimitiveTags,
        a: &PrimitiveVertex,
        b: &PrimitiveVertex,
        sink: &mut F,
    ) {
        let (Some(pa), Some(pb)) = (self.project(a), self.project(b)) else {
            return;
        };

        // One sample per pixel step along the major axis.
        let d_row = pb.row - pa.row;
        let d_col = pb.col - pa.col;
        let steps = d_row.abs().max(d_col.abs()).ceil() as usize;

        if steps == 0 {
            // Coincident endpoints collapse to a single sample.
            if self.in_viewport(pa.row, pa.col) {
                sink(Fragment {
                    tags: *tags,
                    row: pa.row,
                    col: pa.col,
                    depth: pa.depth,
                    uv: pa.uv,
                    uv_1: pa.uv_1,
                });
            }
            return;
        }

        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let row = pa.row + d_row * t;
            let col = pa.col + d_col * t;
            if !self.in_viewport(row, col) {
                continue;
            }
            sink(Fragment {
                tags: *tags,
                row,
                col,
                depth: pa.depth + (pb.depth - pa.depth) * t,
                uv: pa.uv.lerp(&pb.uv, t),
                uv_1: pa.uv_1.lerp(&pb.uv_1, t),
            });
        }
    }

    fn raster_triangle<F: FnMut(Fragment)>(
        &self,
        tags: &PrimitiveTags,
        a: &PrimitiveVertex,
        b: &PrimitiveVertex,
        c: &PrimitiveVertex,
        sink: &mut F,
    ) {
        let (Some(pa), Some(pb), Some(pc)) =
            (self.project(a), self.project(b), self.project(c))
        else {
            return;
        };

        // Screen-space bounding box, clamped to the viewport. Clamping
        // is the implicit clip: fully offscreen boxes produce an empty
        // loop.
        let min_col = pa.col.min(pb.col).min(pc.col).floor().max(0.0) as usize;
        let max_col = (pa.col.max(pb.col).max(pc.col).ceil() as i64)
            .min(self.col_count as i64 - 1);
        let min_row = pa.row.min(pb.row).min(pc.row).floor().max(0.0) as usize;
        let max_row = (pa.row.max(pb.row).max(pc.row).ceil() as i64)
            .min(self.row_count as i64 - 1);
        if max_col < 0 || max_row < 0 {
            return;
        }
        let (max_col, max_row) = (max_col as usize, max_row as usize);

        for row in min_row..=max_row {
            for col in min_col..=max_col {
                // Sample at the pixel center.
                let px = col as f32 + 0.5;
                let py = row as f32 + 0.5;

                let Some((w0, w1, w2)) = barycentric(
                    (pa.col, pa.row),
                    (pb.col, pb.row),
                    (pc.col, pc.row),
                    (px, py),
                ) else {
                    // Zero-area triangle: defined no-op.
                    return;
                };

                if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                    sink(Fragment {
                        tags: *tags,
                        row: py,
                        col: px,
                        depth: w0 * pa.depth + w1 * pb.depth + w2 * pc.depth,
                        uv: pa.uv * w0 + pb.uv * w1 + pc.uv * w2,
                        uv_1: pa.uv_1 * w0 + pb.uv_1 * w1 + pc.uv_1 * w2,
                    });
                }
            }
        }
    }
}

/// Barycentric coordinates of point `p` in triangle `(v0, v1, v2)`.
/// Returns None for a degenerate (zero-area) triangle.
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
