/// Fixed-capacity arena of per-node model matrices plus one view matrix
use nalgebra::Matrix4;

use crate::error::CoreError;

/// A pool of 4x4 node transforms indexed by small integer node ids,
/// plus a single view matrix slot.
///
/// The pack is a per-frame arena: capacity is fixed at construction and
/// `clear` resets the node count without deallocating, so a render loop
/// can reuse it across frames without allocator pressure.
pub struct TransformPack {
    nodes: Vec<Matrix4<f32>>,
    capacity: usize,
    view: Matrix4<f32>,
}

impl TransformPack {
    pub fn new(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            capacity,
            view: Matrix4::identity(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied node slots.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Append a node transform and return its assigned id.
    ///
    /// Ids are issued monotonically from 0 until the next `clear`.
    pub fn add_node_transform(&mut self, matrix: Matrix4<f32>) -> Result<usize, CoreError> {
        if self.nodes.len() == self.capacity {
            return Err(CoreError::CapacityExceeded {
                arena: "transform pack",
                capacity: self.capacity,
            });
        }
        self.nodes.push(matrix);
        Ok(self.nodes.len() - 1)
    }

    /// Look up a node transform by id.
    pub fn node_transform(&self, node_id: usize) -> Result<&Matrix4<f32>, CoreError> {
        self.nodes.get(node_id).ok_or(CoreError::OutOfRange {
            what: "node id",
            index: node_id,
            len: self.nodes.len(),
        })
    }

    /// Overwrite the view matrix wholesale.
    pub fn set_view_matrix(&mut self, matrix: Matrix4<f32>) {
        self.view = matrix;
    }

    pub fn view_matrix(&self) -> &Matrix4<f32> {
        &self.view
    }

    /// Reset the node count to zero. Previously issued ids become
    /// invalid until re-added; the backing storage is kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
