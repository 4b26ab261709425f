//! Batched distance constraints for cloth edges.

use crate::solver::SolverState;

/// One batch of distance constraints, stored SoA: two particle indices,
/// a rest length and an accumulated Lagrange multiplier per constraint.
///
/// Constraints are addressed two ways: by *position* (used by the
/// per-substep overstress scan, valid only until the next swap) and by
/// *id* (creation order, stable across activation swaps; this is what the
/// half-edge → constraint map stores).
#[derive(Debug, Clone, Default)]
pub struct DistanceBatch {
    /// Two entries per constraint, ordered by current position.
    particle_indices: Vec<usize>,
    rest_lengths: Vec<f32>,
    /// Accumulated Lagrange multiplier per constraint, written by the
    /// solver's projection pass each substep. The tearing pass divides it
    /// by the squared substep time to estimate edge force.
    lambdas: Vec<f32>,
    /// XPBD compliance (inverse stiffness) shared by the batch.
    pub compliance: f32,
    active_count: usize,
    id_to_index: Vec<usize>,
    index_to_id: Vec<usize>,
}

impl DistanceBatch {
    pub fn new(compliance: f32) -> Self {
        Self {
            compliance,
            ..Self::default()
        }
    }

    /// Total constraint count, active and dormant.
    pub fn len(&self) -> usize {
        self.rest_lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rest_lengths.is_empty()
    }

    /// Number of constraints in the active prefix.
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Append a dormant constraint; returns its stable id.
    pub fn add(&mut self, a: usize, b: usize, rest_length: f32) -> usize {
        let id = self.len();
        self.particle_indices.push(a);
        self.particle_indices.push(b);
        self.rest_lengths.push(rest_length);
        self.lambdas.push(0.0);
        self.id_to_index.push(id);
        self.index_to_id.push(id);
        id
    }

    /// Mark every constraint active. Used once at blueprint build time for
    /// the initial constraint set.
    pub fn activate_all(&mut self) {
        self.active_count = self.len();
    }

    /// Current position of a constraint id.
    pub fn index_of(&self, id: usize) -> usize {
        self.id_to_index[id]
    }

    /// Particle endpoints of the constraint at `index`.
    pub fn particle_pair(&self, index: usize) -> (usize, usize) {
        (
            self.particle_indices[index * 2],
            self.particle_indices[index * 2 + 1],
        )
    }

    pub fn set_particle_pair(&mut self, index: usize, a: usize, b: usize) {
        self.particle_indices[index * 2] = a;
        self.particle_indices[index * 2 + 1] = b;
    }

    pub fn rest_length(&self, index: usize) -> f32 {
        self.rest_lengths[index]
    }

    pub fn lambda(&self, index: usize) -> f32 {
        self.lambdas[index]
    }

    pub fn set_lambda(&mut self, index: usize, lambda: f32) {
        self.lambdas[index] = lambda;
    }

    /// Activate the constraint with the given id, swapping it into the
    /// active prefix. Returns false if it was already active.
    pub fn activate(&mut self, id: usize) -> bool {
        let index = self.id_to_index[id];
        if index < self.active_count {
            return false;
        }
        let boundary = self.active_count;
        self.swap_positions(index, boundary);
        self.active_count += 1;
        true
    }

    /// Deactivate the constraint with the given id, swapping it out of the
    /// active prefix. Returns false if it was already dormant.
    pub fn deactivate(&mut self, id: usize) -> bool {
        let index = self.id_to_index[id];
        if index >= self.active_count {
            return false;
        }
        self.active_count -= 1;
        let boundary = self.active_count;
        self.swap_positions(index, boundary);
        true
    }

    fn swap_positions(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.particle_indices.swap(a * 2, b * 2);
        self.particle_indices.swap(a * 2 + 1, b * 2 + 1);
        self.rest_lengths.swap(a, b);
        self.lambdas.swap(a, b);

        let id_a = self.index_to_id[a];
        let id_b = self.index_to_id[b];
        self.index_to_id.swap(a, b);
        self.id_to_index[id_a] = b;
        self.id_to_index[id_b] = a;
    }

    /// Reset all Lagrange multipliers to zero. Call at the beginning of
    /// each substep, before the solver's projection pass.
    pub fn reset_lambdas(&mut self) {
        for lambda in &mut self.lambdas {
            *lambda = 0.0;
        }
    }

    /// One XPBD projection pass over the active constraints.
    ///
    /// For each constraint: C = |p_a - p_b| - rest_length, then
    /// `delta_lambda = -(C + alpha_tilde * lambda) / (w_a + w_b + alpha_tilde)`
    /// with `alpha_tilde = compliance / dt^2`, applied to the positions
    /// weighted by inverse mass. Within a batch no two constraints share a
    /// particle, so in-place Gauss-Seidel updates are conflict free.
    ///
    /// Reference: "XPBD: Position-Based Simulation of Compliant Constrained
    /// Dynamics", Macklin et al., 2016
    pub fn solve(&mut self, solver: &mut SolverState, dt: f32) {
        let dt_sq = dt * dt;
        let alpha_tilde = self.compliance / dt_sq;

        for i in 0..self.active_count {
            let a = self.particle_indices[i * 2];
            let b = self.particle_indices[i * 2 + 1];

            let w_a = solver.inv_masses[a];
            let w_b = solver.inv_masses[b];
            let w_sum = w_a + w_b;
            if w_sum < 1e-10 {
                continue;
            }

            let diff = solver.positions[a] - solver.positions[b];
            let dist = diff.length();
            if dist < 1e-10 {
                continue;
            }

            let c_val = dist - self.rest_lengths[i];
            let n = diff / dist;

            let delta_lambda = -(c_val + alpha_tilde * self.lambdas[i]) / (w_sum + alpha_tilde);
            self.lambdas[i] += delta_lambda;

            let correction = n * delta_lambda;
            solver.positions[a] += correction * w_a;
            solver.positions[b] -= correction * w_b;
        }
    }
}
