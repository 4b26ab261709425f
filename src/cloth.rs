//! Runtime tearable cloth actor.
//!
//! Each substep, after the external solver has projected its constraints,
//! the actor scans active distance constraints for overstress, sorts the
//! candidates and tears a bounded number of edges, splitting vertices in
//! the topology and re-binding constraints to the new particles.

use glam::Vec3;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::blueprint::TearableClothBlueprint;
use crate::constraints::DistanceBatch;
use crate::halfedge::{HalfEdgeMesh, VertexSplit, INVALID};
use crate::math::Plane;
use crate::solver::SolverState;

/// A tear candidate: one overstressed distance constraint, addressed by
/// batch and current position, with its estimated force in newtons.
/// Created transiently each substep and discarded after tear application.
#[derive(Debug, Clone, Copy)]
pub struct StructuralConstraint {
    pub batch: usize,
    pub index: usize,
    /// `lambda / dt^2`; negative for stretched edges.
    pub force: f32,
}

/// Notification of one completed tear, consumed by the mesh renderer to
/// duplicate its render vertices along the cut.
#[derive(Debug, Clone)]
pub struct TearEvent {
    /// The constraint that tore.
    pub constraint: StructuralConstraint,
    /// Index of the newly activated particle.
    pub particle: usize,
    /// Faces whose vertex winding changed in the split.
    pub updated_faces: Vec<usize>,
}

/// A cloth instance that can tear at runtime.
///
/// The actor owns a private clone of its blueprint; topology, constraint
/// activation state and tear resistances mutate per instance while the
/// source blueprint stays pristine.
#[derive(Debug, Clone)]
pub struct TearableCloth {
    blueprint: TearableClothBlueprint,

    pub tearing_enabled: bool,
    /// Scales how much force a structural edge withstands before tearing.
    pub tear_resistance_multiplier: f32,
    /// Maximum number of successful tears per substep.
    pub tear_rate: usize,
    /// Fraction in `[0, 1]` by which a tear weakens the neighbours lying
    /// along the cut, biasing the next tear to propagate coherently.
    pub tear_debilitation: f32,
}

impl TearableCloth {
    /// Create an actor from a shared blueprint recipe.
    pub fn new(blueprint: &TearableClothBlueprint) -> Self {
        Self {
            blueprint: blueprint.clone(),
            tearing_enabled: true,
            tear_resistance_multiplier: 1000.0,
            tear_rate: 1,
            tear_debilitation: 0.5,
        }
    }

    pub fn topology(&self) -> &HalfEdgeMesh {
        &self.blueprint.topology
    }

    /// The actor's working copy of the blueprint.
    pub fn instance(&self) -> &TearableClothBlueprint {
        &self.blueprint
    }

    pub fn active_particle_count(&self) -> usize {
        self.blueprint.active_particle_count
    }

    pub fn particle_capacity(&self) -> usize {
        self.blueprint.particle_capacity()
    }

    pub fn tear_resistance(&self, particle: usize) -> f32 {
        self.blueprint.tear_resistance[particle]
    }

    pub fn distance_batches(&self) -> &[DistanceBatch] {
        &self.blueprint.distance_batches
    }

    pub fn distance_batches_mut(&mut self) -> &mut [DistanceBatch] {
        &mut self.blueprint.distance_batches
    }

    /// Zero all distance Lagrange multipliers. The solver boundary calls
    /// this at the start of each substep.
    pub fn reset_lambdas(&mut self) {
        for batch in &mut self.blueprint.distance_batches {
            batch.reset_lambdas();
        }
    }

    /// Run one XPBD projection pass over every distance batch, standing in
    /// for the external solver's relaxation and accumulating the Lagrange
    /// multipliers the tear scan reads.
    pub fn project_distance_constraints(&mut self, solver: &mut SolverState, dt: f32) {
        for batch in &mut self.blueprint.distance_batches {
            batch.solve(solver, dt);
        }
    }

    /// Scan for overstressed edges and tear up to `tear_rate` of them.
    ///
    /// The estimated force on a constraint is its accumulated multiplier
    /// divided by the squared substep time; an edge becomes a candidate
    /// when `-force` exceeds the averaged tear resistance of its endpoints
    /// times `tear_resistance_multiplier`. Candidates are processed in
    /// ascending raw force order. After any successful tear the full
    /// deformable triangle buffer is pushed to the solver.
    pub fn apply_tearing(&mut self, solver: &mut SolverState, substep_time: f32) -> Vec<TearEvent> {
        if !self.tearing_enabled {
            return Vec::new();
        }

        let mut candidates = self.collect_tear_candidates(substep_time);
        if candidates.is_empty() {
            return Vec::new();
        }
        candidates.sort_by(|a, b| a.force.total_cmp(&b.force));

        let mut events = Vec::new();
        for candidate in candidates {
            if let Some(event) = self.tear(solver, candidate) {
                events.push(event);
            }
            if events.len() >= self.tear_rate {
                break;
            }
        }

        if !events.is_empty() {
            debug!(torn = events.len(), "applied cloth tears");
            self.update_deformable_triangles(solver);
        }
        events
    }

    fn collect_tear_candidates(&self, substep_time: f32) -> Vec<StructuralConstraint> {
        let sqr_time = substep_time * substep_time;
        let multiplier = self.tear_resistance_multiplier;
        let resistance = &self.blueprint.tear_resistance;

        let scan_batch = |(j, batch): (usize, &DistanceBatch)| {
            let mut found = Vec::new();
            for i in 0..batch.active_count() {
                let (p1, p2) = batch.particle_pair(i);
                let threshold = (resistance[p1] + resistance[p2]) * 0.5 * multiplier;
                // Divide lambda by squared delta time to get force in newtons.
                let force = batch.lambda(i) / sqr_time;
                if -force > threshold {
                    found.push(StructuralConstraint {
                        batch: j,
                        index: i,
                        force,
                    });
                }
            }
            found
        };

        #[cfg(feature = "parallel")]
        {
            self.blueprint
                .distance_batches
                .par_iter()
                .enumerate()
                .flat_map_iter(scan_batch)
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.blueprint
                .distance_batches
                .iter()
                .enumerate()
                .flat_map(scan_batch)
                .collect()
        }
    }

    /// Tear one distance constraint, splitting a vertex of the topology
    /// and re-binding constraints around the cut.
    ///
    /// Returns `None` without mutating anything when the particle pool is
    /// exhausted or the topology cannot split at either endpoint; the
    /// constraint stays active and will be re-proposed while overstressed.
    pub fn tear(
        &mut self,
        solver: &mut SolverState,
        candidate: StructuralConstraint,
    ) -> Option<TearEvent> {
        if self.blueprint.active_particle_count >= self.blueprint.particle_capacity() {
            return None;
        }

        let (first, second) =
            self.blueprint.distance_batches[candidate.batch].particle_pair(candidate.index);

        let (split, plane, split_result) = self.topology_split_attempt(solver, first, second)?;

        self.weaken_cut_point(solver, split, solver.positions[split], plane.normal);
        let particle = self.split_particle(solver, split);
        debug_assert_eq!(particle, split_result.new_vertex);

        self.update_torn_distance_constraints(&split_result.updated_half_edges);
        for batch in &mut self.blueprint.bend_batches {
            batch.deactivate_containing(split);
        }

        Some(TearEvent {
            constraint: candidate,
            particle,
            updated_faces: split_result.updated_faces,
        })
    }

    /// Try to split one endpoint of the edge, preferring the one with the
    /// larger inverse mass (the lighter point tears more easily). The
    /// separating plane passes through the split point with its normal
    /// along the edge. Immovable endpoints are skipped; if neither
    /// endpoint's fan separates, the tear is rejected.
    fn topology_split_attempt(
        &mut self,
        solver: &SolverState,
        first: usize,
        second: usize,
    ) -> Option<(usize, Plane, VertexSplit)> {
        let (mut split, mut intact) = (first, second);
        if solver.inv_masses[intact] > solver.inv_masses[split] {
            std::mem::swap(&mut split, &mut intact);
        }

        for _ in 0..2 {
            if solver.inv_masses[split] > 0.0 {
                let point = solver.positions[split];
                let normal = (solver.positions[intact] - point).normalize_or_zero();
                let plane = Plane::from_point_normal(point, normal);
                if let Some(result) =
                    self.blueprint
                        .topology
                        .split_vertex_at_plane(split, &plane, &solver.positions)
                {
                    return Some((split, plane, result));
                }
            }
            std::mem::swap(&mut split, &mut intact);
        }
        None
    }

    /// Reduce tear resistance at the two neighbours of the split vertex
    /// whose direction is most perpendicular to the tear plane's normal,
    /// encouraging the cut to keep propagating along its own line.
    fn weaken_cut_point(&mut self, solver: &SolverState, split: usize, point: Vec3, normal: Vec3) {
        let mut weak_pt1 = None;
        let mut weak_pt2 = None;
        let mut weakest = f32::MAX;
        let mut second_weakest = f32::MAX;

        for v in self.blueprint.topology.neighbour_vertices(split) {
            let neighbour = solver.positions[v];
            let weakness = normal.dot((neighbour - point).normalize_or_zero()).abs();

            if weakness < weakest {
                second_weakest = weakest;
                weakest = weakness;
                weak_pt2 = weak_pt1;
                weak_pt1 = Some(v);
            } else if weakness < second_weakest {
                second_weakest = weakness;
                weak_pt2 = Some(v);
            }
        }

        let factor = 1.0 - self.tear_debilitation;
        if let Some(v) = weak_pt1 {
            self.blueprint.tear_resistance[v] *= factor;
        }
        if let Some(v) = weak_pt2 {
            self.blueprint.tear_resistance[v] *= factor;
        }
    }

    /// Split the particle in two: the original keeps half its mass and
    /// radius, and a copy of all its attributes activates the next pooled
    /// slot. Returns the new particle index.
    fn split_particle(&mut self, solver: &mut SolverState, split: usize) -> usize {
        let slot = self.blueprint.active_particle_count;

        solver.inv_masses[split] *= 2.0;
        solver.principal_radii[split] *= 0.5;

        solver.positions[slot] = solver.positions[split];
        solver.velocities[slot] = solver.velocities[split];
        solver.inv_masses[slot] = solver.inv_masses[split];
        solver.principal_radii[slot] = solver.principal_radii[split];

        let bp = &mut self.blueprint;
        bp.tear_resistance[slot] = bp.tear_resistance[split];
        bp.positions[slot] = bp.positions[split];
        bp.rest_positions[slot] = bp.rest_positions[split];
        bp.velocities[slot] = bp.velocities[split];
        bp.inv_masses[slot] = solver.inv_masses[split];
        bp.principal_radii[slot] = solver.principal_radii[split];
        bp.filters[slot] = bp.filters[split];
        bp.colors[slot] = bp.colors[split];
        bp.area_contribution[slot] = bp.area_contribution[split];

        bp.active_particle_count += 1;
        slot
    }

    /// Re-bind the distance constraints of every half-edge touched by the
    /// split to the current topology, activating pooled constraints that
    /// now guard a freshly separated edge, and patch the corresponding
    /// corners of the deformable triangle buffer.
    fn update_torn_distance_constraints(&mut self, updated_half_edges: &[usize]) {
        for &edge_index in updated_half_edges {
            let edge = self.blueprint.topology.half_edges[edge_index];

            // Border half-edges carry no constraint.
            if let Some(cref) = self.blueprint.distance_constraint_map[edge_index] {
                let start = self.blueprint.topology.start_vertex(&edge);
                let batch = &mut self.blueprint.distance_batches[cref.batch];
                let index = batch.index_of(cref.constraint);
                batch.set_particle_pair(index, start, edge.end_vertex);
                batch.activate(cref.constraint);
            }

            if edge.index_in_face != INVALID {
                self.blueprint.deformable_triangles[edge.face * 3 + edge.index_in_face] =
                    edge.end_vertex;
            }
        }
    }

    /// Push the full deformable triangle buffer to the solver. O(faces),
    /// acceptable because tears are rate limited.
    pub fn update_deformable_triangles(&self, solver: &mut SolverState) {
        solver.triangles.clear();
        solver
            .triangles
            .extend_from_slice(&self.blueprint.deformable_triangles);
    }
}
