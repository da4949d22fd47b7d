/// Headless single-frame render: runs the full pipeline without
/// touching the terminal and prints fragment statistics.
///
/// Usage: cargo run --example headless
use nalgebra::{Vector2, Vector4};
use trast_core::{
    clip_triangle, CoreError, Primitive, PrimitiveTags, PrimitiveVertex, Rasterizer,
    TransformPack, TriangleClipBuffer, VertexBuffer,
};
use trast_terminal::{cube_triangles, view_projection, Spin};

fn main() -> Result<(), CoreError> {
    env_logger::init();

    let rows = 48;
    let cols = 96;

    let mesh = cube_triangles(2.0);
    let mut pack = TransformPack::new(4);
    pack.set_view_matrix(view_projection(rows, cols));
    let spin = Spin {
        x: 0.5,
        y: 0.7,
        z: 0.0,
    };
    let node_id = pack.add_node_transform(spin.matrix())?;

    let mut vertices = VertexBuffer::with_capacity(mesh.len() * 3);
    for triangle in &mesh {
        for corner in triangle {
            let [x, y, z] = corner.position;
            vertices.add_vertex(x, y, z)?;
        }
    }
    vertices.apply_mv(&pack, node_id, 0, vertices.len())?;

    let raster = Rasterizer::new(rows, cols);
    let mut clipped = TriangleClipBuffer::new();
    let mut fragment_count = 0usize;
    let mut clipped_triangles = 0usize;

    for (index, triangle) in mesh.iter().enumerate() {
        let tags = PrimitiveTags {
            primitive_id: index,
            geometry_id: 1,
            node_id,
            material_id: 0,
        };
        let corner = |k: usize| -> Result<PrimitiveVertex, CoreError> {
            let pos: Vector4<f32> = *vertices.vertex(index * 3 + k)?;
            let [u, v] = triangle[k].uv;
            Ok(PrimitiveVertex::new(
                pos,
                Vector2::new(u, v),
                Vector2::zeros(),
            ))
        };
        let (a, b, c) = (corner(0)?, corner(1)?, corner(2)?);

        clip_triangle(&a, &b, &c, &mut clipped);
        clipped_triangles += clipped.len();
        for piece in clipped.iter() {
            let primitive = Primitive::Triangle {
                tags,
                a: piece[0],
                b: piece[1],
                c: piece[2],
            };
            raster.rasterize(&primitive, &mut |_frag| fragment_count += 1);
        }
    }

    println!("viewport: {} rows x {} cols", rows, cols);
    println!("mesh triangles: {}", mesh.len());
    println!("triangles after clipping: {}", clipped_triangles);
    println!("fragments emitted: {}", fragment_count);
    Ok(())
}
