/// Clip-space triangle clipping against the view frustum
use nalgebra::Vector4;

use crate::primitive::PrimitiveVertex;

/// Fixed-capacity buffer of clipped triangles, reused across calls.
///
/// Clipping against one plane at most doubles the piece count, so one
/// triangle against six planes yields at most 2^6 = 64 pieces; 64
/// slots is the hard worst case. Pushes beyond capacity are dropped.
#[derive(Debug, Clone, Copy)]
pub struct TriangleClipBuffer<const N: usize> {
    triangles: [[PrimitiveVertex; 3]; N],
    count: usize,
}

impl<const N: usize> TriangleClipBuffer<N> {
    pub fn new() -> Self {
        let zero = PrimitiveVertex::untextured(Vector4::zeros());
        Self {
            triangles: [[zero; 3]; N],
            count: 0,
        }
    }

    pub fn push(&mut self, a: PrimitiveVertex, b: PrimitiveVertex, c: PrimitiveVertex) {
        if self.count == N {
            log::warn!("clip buffer full ({} triangles), dropping piece", N);
            return;
        }
        self.triangles[self.count] = [a, b, c];
        self.count += 1;
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &[PrimitiveVertex; 3]> {
        self.triangles.iter().take(self.count)
    }
}

impl<const N: usize> Default for TriangleClipBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// The six frustum planes in clip space: a vertex is inside plane `p`
/// when `dot(p, pos) >= 0`. With 0 <= z <= w depth convention:
/// -w <= x <= w, -w <= y <= w, 0 <= z <= w.
const FRUSTUM_PLANES: [Vector4<f32>; 6] = [
    Vector4::new(1.0, 0.0, 0.0, 1.0),  // left
    Vector4::new(-1.0, 0.0, 0.0, 1.0), // right
    Vector4::new(0.0, 1.0, 0.0, 1.0),  // bottom
    Vector4::new(0.0, -1.0, 0.0, 1.0), // top
    Vector4::new(0.0, 0.0, 1.0, 0.0),  // near
    Vector4::new(0.0, 0.0, -1.0, 1.0), // far
];

fn signed_distance(plane: &Vector4<f32>, vertex: &PrimitiveVertex) -> f32 {
    plane.dot(&vertex.pos)
}

/// Interpolate position and both uv sets with the same parameter.
fn lerp_vertex(a: &PrimitiveVertex, b: &PrimitiveVertex, t: f32) -> PrimitiveVertex {
    PrimitiveVertex {
        pos: a.pos.lerp(&b.pos, t),
        uv: a.uv.lerp(&b.uv, t),
        uv_1: a.uv_1.lerp(&b.uv_1, t),
    }
}

/// Clip one triangle against a single plane (Sutherland-Hodgman step).
/// Pushes 0, 1 or 2 triangles into the output buffer.
fn clip_to_plane<const N: usize>(
    triangle: &[PrimitiveVertex; 3],
    plane: &Vector4<f32>,
    output: &mut TriangleClipBuffer<N>,
) {
    let mut inside: [&PrimitiveVertex; 3] = [&triangle[0]; 3];
    let mut outside: [&PrimitiveVertex; 3] = [&triangle[0]; 3];
    let mut n_inside = 0;
    let mut n_outside = 0;

    for vertex in triangle {
        if signed_distance(plane, vertex) >= 0.0 {
            inside[n_inside] = vertex;
            n_inside += 1;
        } else {
            outside[n_outside] = vertex;
            n_outside += 1;
        }
    }

    match n_inside {
        3 => output.push(*inside[0], *inside[1], *inside[2]),
        0 => {}
        1 => {
            // One corner survives; the edge crossings form a smaller
            // triangle.
            let d_in = signed_distance(plane, inside[0]);
            let t0 = d_in / (d_in - signed_distance(plane, outside[0]));
            let t1 = d_in / (d_in - signed_distance(plane, outside[1]));
            let p0 = lerp_vertex(inside[0], outside[0], t0);
            let p1 = lerp_vertex(inside[0], outside[1], t1);
            output.push(*inside[0], p0, p1);
        }
        _ => {
            // Two corners survive; the clipped quad splits into two
            // triangles.
            let d0 = signed_distance(plane, inside[0]);
            let d1 = signed_distance(plane, inside[1]);
            let t0 = d0 / (d0 - signed_distance(plane, outside[0]));
            let t1 = d1 / (d1 - signed_distance(plane, outside[0]));
            let p0 = lerp_vertex(inside[0], outside[0], t0);
            let p1 = lerp_vertex(inside[1], outside[0], t1);
            output.push(*inside[0], *inside[1], p0);
            output.push(*inside[1], p0, p1);
        }
    }
}

/// Clip a clip-space triangle against all six frustum planes.
///
/// The output buffer is cleared first. A triangle fully inside comes
/// back unchanged as a single entry; a triangle fully outside produces
/// none; partial overlaps are split, with uv coordinates interpolated
/// along the cut edges.
pub fn clip_triangle(
    a: &PrimitiveVertex,
    b: &PrimitiveVertex,
    c: &PrimitiveVertex,
    output: &mut TriangleClipBuffer<64>,
) {
    output.clear();

    let mut ping: TriangleClipBuffer<64> = TriangleClipBuffer::new();
    let mut pong: TriangleClipBuffer<64> = TriangleClipBuffer::new();
    ping.push(*a, *b, *c);

    let mut input = &mut ping;
    let mut scratch = &mut pong;

    for plane in &FRUSTUM_PLANES {
        scratch.clear();
        for triangle in input.iter() {
            clip_to_plane(triangle, plane, scratch);
        }
        std::mem::swap(&mut input, &mut scratch);
    }

    for triangle in input.iter() {
        output.push(triangle[0], triangle[1], triangle[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector2;

    const UV_TOLERANCE: f32 = 0.001;

    fn vertex(x: f32, y: f32, z: f32, u: f32, v: f32) -> PrimitiveVertex {
        PrimitiveVertex::new(
            Vector4::new(x, y, z, 1.0),
            Vector2::new(u, v),
            Vector2::zeros(),
        )
    }

    fn assert_inside_frustum(v: &PrimitiveVertex) {
        let eps = 1e-4;
        for plane in &FRUSTUM_PLANES {
            assert!(
                plane.dot(&v.pos) >= -eps,
                "vertex {:?} outside plane {:?}",
                v.pos,
                plane
            );
        }
    }

    #[test]
    fn test_fully_inside_triangle_is_unchanged() {
        let a = vertex(0.0, 0.0, 0.0, 0.0, 0.0);
        let b = vertex(1.0, 0.0, 0.0, 1.0, 0.0);
        let c = vertex(0.0, 1.0, 0.0, 0.0, 1.0);
        let mut output = TriangleClipBuffer::new();
        clip_triangle(&a, &b, &c, &mut output);

        assert_eq!(output.len(), 1);
        let tri = output.iter().next().unwrap();
        assert_eq!(tri[0].pos, a.pos);
        assert_eq!(tri[1].pos, b.pos);
        assert_eq!(tri[2].pos, c.pos);
        assert_abs_diff_eq!(tri[1].uv.x, 1.0, epsilon = UV_TOLERANCE);
        assert_abs_diff_eq!(tri[2].uv.y, 1.0, epsilon = UV_TOLERANCE);
    }

    #[test]
    fn test_fully_outside_triangle_is_dropped() {
        let a = vertex(-2.0, -2.0, -2.0, 0.0, 0.0);
        let b = vertex(-3.0, -3.0, -3.0, 1.0, 0.0);
        let c = vertex(-4.0, -4.0, -4.0, 0.0, 1.0);
        let mut output = TriangleClipBuffer::new();
        clip_triangle(&a, &b, &c, &mut output);
        assert_eq!(output.len(), 0);
    }

    #[test]
    fn test_boundary_triangle_survives() {
        // Vertices exactly on the clip-space boundary count as inside.
        let a = vertex(1.0, 1.0, 1.0, 0.0, 0.0);
        let b = vertex(-1.0, 1.0, 1.0, 1.0, 0.0);
        let c = vertex(1.0, -1.0, 1.0, 0.0, 1.0);
        let mut output = TriangleClipBuffer::new();
        clip_triangle(&a, &b, &c, &mut output);
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn test_one_inside_two_beyond_far() {
        // a inside; b and c past the far plane (z > w). The surviving
        // triangle is cut at z = 1 with uv lerped halfway.
        let a = vertex(0.0, 0.0, 0.0, 0.0, 0.0);
        let b = vertex(0.0, 0.0, 2.0, 1.0, 0.0);
        let c = vertex(0.1, 0.1, 2.0, 0.0, 1.0);

        let mut output = TriangleClipBuffer::new();
        clip_triangle(&a, &b, &c, &mut output);

        assert_eq!(output.len(), 1);
        let tri = output.iter().next().unwrap();
        assert_eq!(tri[0].pos, a.pos);
        assert_abs_diff_eq!(tri[1].pos.z, 1.0, epsilon = 0.001);
        assert_abs_diff_eq!(tri[2].pos.z, 1.0, epsilon = 0.001);
        // t = 0.5 along both cut edges
        assert_abs_diff_eq!(tri[1].uv.x, 0.5, epsilon = 0.01);
        assert_abs_diff_eq!(tri[2].uv.y, 0.5, epsilon = 0.01);
    }

    #[test]
    fn test_two_inside_one_beyond_far_splits_in_two() {
        let a = vertex(0.1, 0.0, 0.0, 0.0, 0.0);
        let b = vertex(-0.1, 0.0, 0.0, 1.0, 0.0);
        let c = vertex(0.0, 0.0, 2.0, 0.0, 1.0);

        let mut output = TriangleClipBuffer::new();
        clip_triangle(&a, &b, &c, &mut output);

        assert_eq!(output.len(), 2);
        for tri in output.iter() {
            for v in tri {
                assert_inside_frustum(v);
            }
        }
    }

    #[test]
    fn test_partial_overlap_stays_inside_frustum() {
        // Overlaps the right and top planes at once.
        let a = vertex(0.0, 0.0, 0.0, 0.0, 0.0);
        let b = vertex(1.5, 0.0, 0.0, 1.0, 0.0);
        let c = vertex(0.0, 1.5, 0.0, 0.0, 1.0);

        let mut output = TriangleClipBuffer::new();
        clip_triangle(&a, &b, &c, &mut output);

        assert!(output.len() >= 2);
        for tri in output.iter() {
            for v in tri {
                assert_inside_frustum(v);
            }
        }
    }

    #[test]
    fn test_clip_buffer_reuse() {
        let mut buffer: TriangleClipBuffer<64> = TriangleClipBuffer::new();
        let v = vertex(0.0, 0.0, 0.0, 0.0, 0.0);
        buffer.push(v, v, v);
        assert_eq!(buffer.len(), 1);
        assert!(!buffer.is_empty());
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clip_buffer_holds_worst_case_piece_count() {
        let mut buffer: TriangleClipBuffer<64> = TriangleClipBuffer::new();
        let v = vertex(0.0, 0.0, 0.0, 0.0, 0.0);
        for _ in 0..64 {
            buffer.push(v, v, v);
        }
        assert_eq!(buffer.len(), 64);
        // the saturating push drops the overflow instead of panicking
        buffer.push(v, v, v);
        assert_eq!(buffer.len(), 64);
    }

    #[test]
    fn test_huge_triangle_clips_to_full_frustum() {
        // Covers the entire frustum cross-section; every piece must be
        // retained and inside.
        let a = vertex(-50.0, -50.0, 0.5, 0.0, 0.0);
        let b = vertex(50.0, -50.0, 0.5, 1.0, 0.0);
        let c = vertex(0.0, 80.0, 0.5, 0.5, 1.0);

        let mut output = TriangleClipBuffer::new();
        clip_triangle(&a, &b, &c, &mut output);

        assert!(output.len() >= 2);
        for tri in output.iter() {
            for v in tri {
                assert_inside_frustum(v);
            }
        }
    }

    #[test]
    fn test_cut_edges_interpolate_secondary_uv() {
        // Same cut as the far-plane case, but with a distinct ramp on
        // the secondary channel: both channels lerp with the same t yet
        // stay independent.
        let mut a = vertex(0.0, 0.0, 0.0, 0.0, 0.0);
        let mut b = vertex(0.0, 0.0, 2.0, 1.0, 0.0);
        let mut c = vertex(0.1, 0.1, 2.0, 0.0, 1.0);
        a.uv_1 = Vector2::new(1.0, 0.0);
        b.uv_1 = Vector2::new(0.0, 1.0);
        c.uv_1 = Vector2::new(0.0, 0.0);

        let mut output = TriangleClipBuffer::new();
        clip_triangle(&a, &b, &c, &mut output);

        assert_eq!(output.len(), 1);
        let tri = output.iter().next().unwrap();
        // cut at t = 0.5 along a->b
        assert_abs_diff_eq!(tri[1].uv.x, 0.5, epsilon = 0.01);
        assert_abs_diff_eq!(tri[1].uv_1.x, 0.5, epsilon = 0.01);
        assert_abs_diff_eq!(tri[1].uv_1.y, 0.5, epsilon = 0.01);
        // cut at t = 0.5 along a->c
        assert_abs_diff_eq!(tri[2].uv.y, 0.5, epsilon = 0.01);
        assert_abs_diff_eq!(tri[2].uv_1.x, 0.5, epsilon = 0.01);
        assert_abs_diff_eq!(tri[2].uv_1.y, 0.0, epsilon = 0.01);
    }
}
