/// Fixed-capacity vertex arena with bulk model-view application
use nalgebra::Vector4;

use crate::error::CoreError;
use crate::math::Point3D;
use crate::transform::TransformPack;

/// Default capacity when none is given.
const DEFAULT_CAPACITY: usize = 1024;

/// A pool of homogeneous vertices appended in insertion order.
///
/// Vertices enter as `(x, y, z, 1)` and are transformed in place by
/// `apply_mv`. The transformed vertex keeps its w component; consumers
/// that need normalized device coordinates perform the perspective
/// divide themselves (the rasterizer's PROJECT stage does exactly that).
pub struct VertexBuffer {
    vertices: Vec<Vector4<f32>>,
    capacity: usize,
}

impl VertexBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of vertices this buffer can hold.
    pub fn max_content(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Append a vertex and return its assigned index.
    pub fn add_vertex(&mut self, x: f32, y: f32, z: f32) -> Result<usize, CoreError> {
        if self.vertices.len() == self.capacity {
            return Err(CoreError::CapacityExceeded {
                arena: "vertex buffer",
                capacity: self.capacity,
            });
        }
        self.vertices.push(Vector4::new(x, y, z, 1.0));
        Ok(self.vertices.len() - 1)
    }

    /// The full homogeneous vertex at `index`.
    pub fn vertex(&self, index: usize) -> Result<&Vector4<f32>, CoreError> {
        self.vertices.get(index).ok_or(CoreError::OutOfRange {
            what: "vertex index",
            index,
            len: self.vertices.len(),
        })
    }

    /// The xyz part of the vertex at `index` as a plain point.
    pub fn position(&self, index: usize) -> Result<Point3D, CoreError> {
        let v = self.vertex(index)?;
        Ok(Point3D::new(v.x, v.y, v.z))
    }

    /// Drop all vertices, keeping the backing storage.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    /// Replace every vertex in `[start, end)` with
    /// `view * model[node_id] * vertex`, in place.
    ///
    /// The range is caller-supplied: the caller is responsible for
    /// partitioning a mesh's vertex ranges per node. An empty range is
    /// a no-op.
    pub fn apply_mv(
        &mut self,
        pack: &TransformPack,
        node_id: usize,
        start: usize,
        end: usize,
    ) -> Result<(), CoreError> {
        if start > end || end > self.vertices.len() {
            return Err(CoreError::OutOfRange {
                what: "vertex range end",
                index: end,
                len: self.vertices.len(),
            });
        }
        let model = pack.node_transform(node_id)?;
        let mv = pack.view_matrix() * model;
        log::trace!(
            "apply_mv: node {} over vertices {}..{}",
            node_id,
            start,
            end
        );
        for vertex in &mut self.vertices[start..end] {
            *vertex = mv * *vertex;
        }
        Ok(())
    }
}

impl Default for VertexBuffer {
    fn default() -> Self {
        Self::new()
    }
}
