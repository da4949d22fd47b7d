/// Terminal front end for the trast rendering core
///
/// Drives the per-frame pipeline against a crossterm canvas: transform
/// pack and vertex buffer are cleared and refilled each frame, the
/// rasterizer's fragment stream is depth-tested into cells, and colors
/// resolve through a palette-quantized texture.
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use log::{debug, info};
use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use thiserror::Error;
use trast_core::{
    clip_triangle, CoreError, Image, Primitive, PrimitiveTags, PrimitiveVertex, Rasterizer,
    TransformPack, TriangleClipBuffer, VertexBuffer,
};

pub mod renderer;

pub use renderer::CellCanvas;

/// Errors surfaced by the terminal application.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("render core error: {0}")]
    Core(#[from] CoreError),
}

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, Default)]
pub struct Spin {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Spin {
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Rotation matrix applying X, then Y, then Z.
    pub fn matrix(&self) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(self.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, self.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, self.z));
        rz * ry * rx
    }
}

/// One textured triangle corner of the demo mesh.
#[derive(Debug, Clone, Copy)]
pub struct Corner {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// A textured cube of the given edge length, as 12 triangles.
pub fn cube_triangles(size: f32) -> Vec<[Corner; 3]> {
    let h = size / 2.0;
    let mut triangles = Vec::with_capacity(12);

    // Each face is a quad split along its diagonal, with uv spanning
    // the full texture.
    let faces: [[[f32; 3]; 4]; 6] = [
        // front, back
        [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
        [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]],
        // top, bottom
        [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]],
        [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]],
        // right, left
        [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]],
        [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]],
    ];
    let uvs: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    for face in &faces {
        let corner = |i: usize| Corner {
            position: face[i],
            uv: uvs[i],
        };
        triangles.push([corner(0), corner(1), corner(2)]);
        triangles.push([corner(0), corner(2), corner(3)]);
    }
    triangles
}

/// Combined view-projection matrix for a camera looking at the origin.
///
/// Terminal cells are roughly twice as tall as wide, so the aspect
/// ratio halves the row count.
pub fn view_projection(rows: usize, cols: usize) -> Matrix4<f32> {
    let aspect = cols as f32 / (rows as f32 * 2.0);
    let projection = Matrix4::new_perspective(aspect, std::f32::consts::FRAC_PI_4, 0.1, 100.0);
    let view = Matrix4::look_at_rh(
        &Point3::new(0.0, 0.0, 4.0),
        &Point3::origin(),
        &Vector3::y(),
    );
    // new_perspective puts clip z in [-w, w]; the clipper and depth
    // buffer expect 0 <= z <= w, so remap before handing the matrix
    // to the core.
    let depth_remap = Matrix4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 0.5, 0.5, //
        0.0, 0.0, 0.0, 1.0,
    );
    depth_remap * projection * view
}

/// Procedural checker pattern with a gradient running across each axis.
pub fn checker_texture(size: usize) -> Result<Image, CoreError> {
    let mut pixels = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let checker = (x / 4 + y / 4) % 2 == 0;
            let r = (x * 255 / size.max(1)) as u8;
            let g = (y * 255 / size.max(1)) as u8;
            let b = if checker { 220 } else { 40 };
            pixels.push([r, g, b]);
        }
    }
    Image::from_pixels(size, size, pixels)
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    mesh: Vec<[Corner; 3]>,
    texture: Image,
    spin: Spin,
    pack: TransformPack,
    vertices: VertexBuffer,
    raster: Rasterizer,
    canvas: CellCanvas,
    view_projection: Matrix4<f32>,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(mesh: Vec<[Corner; 3]>, texture: Image) -> Result<Self, AppError> {
        let (width, height) = terminal::size()?;
        let (width, height) = (width as usize, height as usize);
        debug!("terminal size {}x{}", width, height);

        Ok(Self {
            pack: TransformPack::new(16),
            vertices: VertexBuffer::with_capacity(mesh.len() * 3),
            raster: Rasterizer::new(height, width),
            canvas: CellCanvas::new(width, height),
            view_projection: view_projection(height, width),
            mesh,
            texture,
            spin: Spin {
                x: 0.3,
                y: 0.3,
                z: 0.0,
            },
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> Result<(), AppError> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> Result<(), AppError> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            if event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            // Continuous slow rotation for demo effect
            self.spin.rotate(0.01, 0.015, 0.0);

            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        info!("shutting down after user quit");
        Ok(())
    }

    fn handle_input(&mut self) -> Result<(), AppError> {
        if let Event::Key(KeyEvent { code, .. }) = event::read()? {
            match code {
                KeyCode::Char('q') | KeyCode::Esc => self.running = false,
                KeyCode::Char('w') | KeyCode::Up => self.spin.rotate(0.1, 0.0, 0.0),
                KeyCode::Char('s') | KeyCode::Down => self.spin.rotate(-0.1, 0.0, 0.0),
                KeyCode::Char('a') | KeyCode::Left => self.spin.rotate(0.0, -0.1, 0.0),
                KeyCode::Char('d') | KeyCode::Right => self.spin.rotate(0.0, 0.1, 0.0),
                KeyCode::Char('e') => self.spin.rotate(0.0, 0.0, 0.1),
                KeyCode::Char('r') => self.spin.rotate(0.0, 0.0, -0.1),
                _ => {}
            }
        }
        Ok(())
    }

    /// Run one full frame of the pipeline and print it.
    fn render(&mut self) -> Result<(), AppError> {
        // Arenas are reused frame to frame; clear, refill, transform.
        self.pack.clear();
        self.pack.set_view_matrix(self.view_projection);
        let node_id = self.pack.add_node_transform(self.spin.matrix())?;

        self.vertices.clear();
        for triangle in &self.mesh {
            for corner in triangle {
                let [x, y, z] = corner.position;
                self.vertices.add_vertex(x, y, z)?;
            }
        }
        self.vertices
            .apply_mv(&self.pack, node_id, 0, self.vertices.len())?;

        self.canvas.clear();
        let mut clipped = TriangleClipBuffer::new();
        for (index, triangle) in self.mesh.iter().enumerate() {
            let tags = PrimitiveTags {
                primitive_id: index,
                geometry_id: 1,
                node_id,
                material_id: 0,
            };
            let corner = |k: usize| -> Result<PrimitiveVertex, CoreError> {
                let pos: Vector4<f32> = *self.vertices.vertex(index * 3 + k)?;
                let [u, v] = triangle[k].uv;
                Ok(PrimitiveVertex::new(
                    pos,
                    Vector2::new(u, v),
                    Vector2::zeros(),
                ))
            };
            let (a, b, c) = (corner(0)?, corner(1)?, corner(2)?);

            clip_triangle(&a, &b, &c, &mut clipped);
            for piece in clipped.iter() {
                let primitive = Primitive::Triangle {
                    tags,
                    a: piece[0],
                    b: piece[1],
                    c: piece[2],
                };
                let texture = &self.texture;
                let canvas = &mut self.canvas;
                self.raster.rasterize(&primitive, &mut |frag| {
                    let color = texture.sample(frag.uv.x, frag.uv.y);
                    canvas.blit(&frag, color);
                });
            }
        }

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.canvas.draw(&mut stdout)?;

        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "trast | FPS: {:.1} | Controls: WASD/Arrows=Rotate E/R=Roll Q=Quit",
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_cube_has_twelve_triangles() {
        let mesh = cube_triangles(2.0);
        assert_eq!(mesh.len(), 12);
        for triangle in &mesh {
            for corner in triangle {
                for coordinate in corner.position {
                    assert_abs_diff_eq!(coordinate.abs(), 1.0, epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_spin_accumulates() {
        let mut spin = Spin::default();
        spin.rotate(0.1, 0.2, 0.3);
        spin.rotate(0.1, 0.0, 0.0);
        assert_abs_diff_eq!(spin.x, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(spin.y, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(spin.z, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_spin_is_identity() {
        let spin = Spin::default();
        assert!((spin.matrix() - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_view_projection_keeps_origin_visible() {
        let vp = view_projection(24, 80);
        let clip = vp * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        assert!(ndc_x.abs() < 1e-4);
        assert!(ndc_y.abs() < 1e-4);
    }

    #[test]
    fn test_view_projection_depth_is_zero_to_one() {
        let vp = view_projection(24, 80);
        // world z values spanning view depths from just past znear to
        // deep into the frustum (camera sits at z = 4)
        for &z_world in &[3.8, 2.0, 0.0, -50.0] {
            let clip = vp * Vector4::new(0.0, 0.0, z_world, 1.0);
            let ndc_z = clip.z / clip.w;
            assert!(
                (0.0..=1.0).contains(&ndc_z),
                "ndc z {} for world z {}",
                ndc_z,
                z_world
            );
        }
    }

    #[test]
    fn test_geometry_just_past_znear_survives_clipping() {
        // View depth 0.15 is past znear (0.1): the triangle must come
        // out of the clipper, not be cut by the near plane.
        let vp = view_projection(24, 80);
        let corner =
            |x: f32, y: f32| PrimitiveVertex::untextured(vp * Vector4::new(x, y, 3.85, 1.0));

        let mut out = TriangleClipBuffer::new();
        clip_triangle(
            &corner(-0.01, -0.01),
            &corner(0.01, -0.01),
            &corner(0.0, 0.01),
            &mut out,
        );
        assert!(!out.is_empty());
    }

    #[test]
    fn test_checker_texture_dimensions_and_bands() {
        let texture = checker_texture(16).unwrap();
        assert_eq!(texture.width(), 16);
        assert_eq!(texture.height(), 16);
        // adjacent 4x4 blocks alternate the blue band
        assert_eq!(texture.pixel(0, 0).unwrap()[2], 220);
        assert_eq!(texture.pixel(4, 0).unwrap()[2], 40);
        assert_eq!(texture.pixel(4, 4).unwrap()[2], 220);
    }
}
