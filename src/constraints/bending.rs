//! Batched bend constraints.
//!
//! Each constraint is a particle triple `(p1, p2, p3)` resisting the fold
//! of `p3` away from the segment between `p1` and `p2`. The rest bend is
//! the distance from `p3` to the triple's centroid at rest.
//!
//! Tearing never remaps bend constraints; any constraint touching a split
//! particle is deactivated and dropped from the active prefix.

use glam::Vec3;

/// Rest bend value for a triple: distance of the bent vertex from the
/// centroid of the three positions.
pub fn rest_bend(p1: Vec3, p2: Vec3, p3: Vec3) -> f32 {
    let center = (p1 + p2 + p3) / 3.0;
    (p3 - center).length()
}

/// One batch of bend constraints, stored SoA with an active prefix.
#[derive(Debug, Clone, Default)]
pub struct BendBatch {
    /// Three entries per constraint: the two ends and the bent vertex.
    particle_indices: Vec<usize>,
    rest_bends: Vec<f32>,
    active_count: usize,
}

impl BendBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rest_bends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rest_bends.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Particle triple of the constraint at `index`.
    pub fn triple(&self, index: usize) -> (usize, usize, usize) {
        (
            self.particle_indices[index * 3],
            self.particle_indices[index * 3 + 1],
            self.particle_indices[index * 3 + 2],
        )
    }

    pub fn rest_bend(&self, index: usize) -> f32 {
        self.rest_bends[index]
    }

    pub fn add(&mut self, p1: usize, p2: usize, p3: usize, rest_bend: f32) {
        self.particle_indices.extend_from_slice(&[p1, p2, p3]);
        self.rest_bends.push(rest_bend);
    }

    pub fn activate_all(&mut self) {
        self.active_count = self.len();
    }

    /// Deactivate every active constraint referencing `particle`, swapping
    /// it behind the active boundary. Returns the number deactivated.
    ///
    /// Iterates in reverse so that the swap filling a deactivated slot
    /// never skips an unchecked constraint.
    pub fn deactivate_containing(&mut self, particle: usize) -> usize {
        let mut removed = 0;
        for i in (0..self.active_count).rev() {
            let (p1, p2, p3) = self.triple(i);
            if p1 == particle || p2 == particle || p3 == particle {
                self.active_count -= 1;
                self.swap_positions(i, self.active_count);
                removed += 1;
            }
        }
        removed
    }

    fn swap_positions(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for k in 0..3 {
            self.particle_indices.swap(a * 3 + k, b * 3 + k);
        }
        self.rest_bends.swap(a, b);
    }
}
