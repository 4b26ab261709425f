//! The external solver's shared arrays.
//!
//! The constraint solver itself is out of scope; this crate sees it only
//! as a set of particle arrays it reads during the tear scan and writes
//! when a split activates a pooled particle. [`SolverState`] materializes
//! that boundary so the core is testable without a host engine.
//!
//! All tearing runs single threaded on the simulation thread, after the
//! solver's projection pass for the substep has finished; the cloth actor
//! is the only writer during that phase.

use glam::Vec3;

use crate::blueprint::TearableClothBlueprint;

/// Live particle state owned by the external solver, sized to the full
/// particle capacity (active plus pooled).
#[derive(Debug, Clone, Default)]
pub struct SolverState {
    /// Deformed particle positions.
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
    /// Inverse masses; 0 marks an immovable particle.
    pub inv_masses: Vec<f32>,
    pub principal_radii: Vec<Vec3>,
    /// Deformable triangle index buffer as last pushed by the actor,
    /// three particle ids per triangle.
    pub triangles: Vec<usize>,
}

impl SolverState {
    /// Seed solver arrays from a blueprint's rest state.
    pub fn from_blueprint(blueprint: &TearableClothBlueprint) -> Self {
        Self {
            positions: blueprint.positions.clone(),
            velocities: blueprint.velocities.clone(),
            inv_masses: blueprint.inv_masses.clone(),
            principal_radii: blueprint.principal_radii.clone(),
            triangles: blueprint.deformable_triangles.clone(),
        }
    }

    pub fn particle_capacity(&self) -> usize {
        self.positions.len()
    }

    /// Raw bytes of the position array, ready for a GPU vertex buffer
    /// upload after tearing has activated new particles.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }
}
