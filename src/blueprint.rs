//! Blueprint construction.
//!
//! A blueprint turns an input triangle mesh into everything the runtime
//! actor and the external solver need: the half-edge topology, a particle
//! pool with preallocated capacity for tearing, colored distance / bend /
//! aerodynamic constraint batches, and the half-edge → constraint map that
//! lets a tear activate a pre-reserved constraint without allocating.
//!
//! Blueprints are immutable recipes with value semantics: actors clone
//! them, so tearing never mutates a shared asset.

use std::collections::HashMap;

use glam::{Vec3, Vec4};

use crate::coloring::colorize;
use crate::constraints::{bending, AerodynamicBatch, BendBatch, ConstraintRef, DistanceBatch};
use crate::error::Result;
use crate::halfedge::HalfEdgeMesh;
use crate::mesh::TriangleMesh;

/// Collision filter mask matching every category.
pub const COLLIDE_WITH_EVERYTHING: u32 = 0xffff;

/// Pack a collision filter from a category bitmask and a category id.
#[inline]
pub fn make_filter(mask: u32, category: u32) -> u32 {
    (category << 16) | mask
}

/// Build-time tuning for [`TearableClothBlueprint::build`].
#[derive(Debug, Clone, Copy)]
pub struct BlueprintParams {
    /// Uniform pre-scale applied to input vertex positions.
    pub scale: Vec3,
    /// Fraction in `[0, 1]` of the theoretical maximum pool size
    /// (`3 * faces - vertices`, a full shatter into individual triangles)
    /// to preallocate. 0 disables tearing entirely.
    pub tear_capacity: f32,
    /// XPBD compliance assigned to every distance batch.
    pub distance_compliance: f32,
}

impl Default for BlueprintParams {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            tear_capacity: 0.5,
            distance_compliance: 0.0,
        }
    }
}

/// Topology, particle pool and constraint batches for one tearable cloth.
///
/// Particle arrays are parallel and sized to the full capacity
/// `initial vertices + pooled particles`; the active range is
/// `[0, active_particle_count)` and only ever grows.
#[derive(Debug, Clone)]
pub struct TearableClothBlueprint {
    pub topology: HalfEdgeMesh,

    // Per-particle arrays, all at full capacity.
    pub positions: Vec<Vec3>,
    /// Rest pose; `w == 1` marks the rest position as active.
    pub rest_positions: Vec<Vec4>,
    pub velocities: Vec<Vec3>,
    pub inv_masses: Vec<f32>,
    pub principal_radii: Vec<Vec3>,
    /// Packed collision filters, see [`make_filter`].
    pub filters: Vec<u32>,
    /// Render tint per particle.
    pub colors: Vec<Vec4>,
    /// Voronoi-area weight of each particle (a third of every incident
    /// face's area).
    pub area_contribution: Vec<f32>,
    /// Per-particle tear threshold scalar, weakened as cuts propagate.
    pub tear_resistance: Vec<f32>,

    pub active_particle_count: usize,
    /// Preallocated inactive slots available to tearing.
    pub pooled_particles: usize,

    /// Flat triangle index buffer, three welded particle ids per face.
    pub deformable_triangles: Vec<usize>,

    pub distance_batches: Vec<DistanceBatch>,
    pub bend_batches: Vec<BendBatch>,
    pub aerodynamics: AerodynamicBatch,

    /// `distance_constraint_map[half_edge]` locates the constraint bound to
    /// that half-edge direction, `None` for border half-edges. Initial
    /// constraints live on one direction of each edge; the opposite
    /// direction maps to a dormant pooled constraint reserved for the tear
    /// that may split the edge.
    pub distance_constraint_map: Vec<Option<ConstraintRef>>,
}

impl TearableClothBlueprint {
    /// Total particle capacity, active plus pooled.
    pub fn particle_capacity(&self) -> usize {
        self.positions.len()
    }

    /// Build a blueprint from an input mesh.
    pub fn build(mesh: &TriangleMesh, params: &BlueprintParams) -> Result<Self> {
        let topology = HalfEdgeMesh::generate(mesh, params.scale)?;

        let vertex_count = topology.vertices.len();
        let face_count = topology.faces.len();
        let tear_capacity = params.tear_capacity.clamp(0.0, 1.0);
        let pooled_particles =
            ((face_count * 3).saturating_sub(vertex_count) as f32 * tear_capacity) as usize;
        let capacity = vertex_count + pooled_particles;

        let mut blueprint = Self {
            topology,
            positions: vec![Vec3::ZERO; capacity],
            rest_positions: vec![Vec4::ZERO; capacity],
            velocities: vec![Vec3::ZERO; capacity],
            inv_masses: vec![0.0; capacity],
            principal_radii: vec![Vec3::ZERO; capacity],
            filters: vec![0; capacity],
            colors: vec![Vec4::ZERO; capacity],
            area_contribution: vec![0.0; capacity],
            tear_resistance: vec![0.0; capacity],
            active_particle_count: vertex_count,
            pooled_particles,
            deformable_triangles: Vec::new(),
            distance_batches: Vec::new(),
            bend_batches: Vec::new(),
            aerodynamics: AerodynamicBatch::new(),
            distance_constraint_map: Vec::new(),
        };

        blueprint.create_particles();
        blueprint.generate_deformable_triangles();
        blueprint.create_distance_constraints(params.distance_compliance);
        blueprint.create_aerodynamic_constraints();
        blueprint.create_bend_constraints();

        Ok(blueprint)
    }

    /// One particle per welded vertex. Pooled slots stay zeroed; a tear
    /// copies the split particle's attributes into them on activation.
    fn create_particles(&mut self) {
        for i in 0..self.topology.vertices.len() {
            let vertex = self.topology.vertices[i];

            let mut area = 0.0;
            for face_index in self.topology.neighbour_faces(i) {
                area += self.topology.face_area(&self.topology.faces[face_index]) / 3.0;
            }

            // Particle radius is half the shortest incident edge. Vertices
            // without incident edges (unreferenced input) get radius zero.
            let mut min_edge_length = 0.0f32;
            for edge_index in self.topology.neighbour_edges(i) {
                let edge = self.topology.half_edges[edge_index];
                let v1 = self.topology.vertices[self.topology.start_vertex(&edge)].position;
                let v2 = self.topology.vertices[edge.end_vertex].position;
                let length = v1.distance(v2);
                if min_edge_length == 0.0 || length < min_edge_length {
                    min_edge_length = length;
                }
            }

            self.area_contribution[i] = area;
            self.tear_resistance[i] = 1.0;
            self.inv_masses[i] = 1.0;
            self.positions[i] = vertex.position;
            self.rest_positions[i] = vertex.position.extend(1.0);
            self.principal_radii[i] = Vec3::splat(min_edge_length * 0.5);
            self.filters[i] = make_filter(COLLIDE_WITH_EVERYTHING, 1);
            self.colors[i] = Vec4::ONE;
        }
    }

    fn generate_deformable_triangles(&mut self) {
        self.deformable_triangles = Vec::with_capacity(self.topology.faces.len() * 3);
        for face in &self.topology.faces {
            let e1 = &self.topology.half_edges[face.half_edge];
            let e2 = &self.topology.half_edges[e1.next];
            let e3 = &self.topology.half_edges[e2.next];
            self.deformable_triangles.push(e1.end_vertex);
            self.deformable_triangles.push(e2.end_vertex);
            self.deformable_triangles.push(e3.end_vertex);
        }
    }

    /// Two constraint sets per interior edge: the *initial* set on the
    /// half-edges returned by `edge_list`, active from the start, and the
    /// *pooled* set on their pair half-edges, dormant until a tear splits
    /// the edge. The two sets are colored independently and pooled colors
    /// are offset past all initial batches, so a freshly activated pooled
    /// constraint can never land in a batch where it shares a particle
    /// with an active sibling.
    fn create_distance_constraints(&mut self, compliance: f32) {
        self.distance_constraint_map = vec![None; self.topology.half_edges.len()];
        let edges = self.topology.edge_list();

        // Initial set. `edge_list` lists interior half-edges first, so
        // every entry here is interior.
        let mut particle_indices = Vec::with_capacity(edges.len() * 2);
        for &edge_index in &edges {
            let edge = self.topology.half_edges[edge_index];
            particle_indices.push(self.topology.start_vertex(&edge));
            particle_indices.push(edge.end_vertex);
        }

        let constraint_colors = colorize(&particle_indices, 2);
        for (i, &color) in constraint_colors.iter().enumerate() {
            while color >= self.distance_batches.len() {
                self.distance_batches.push(DistanceBatch::new(compliance));
            }
            let (a, b) = (particle_indices[i * 2], particle_indices[i * 2 + 1]);
            let rest_length = self.positions[a].distance(self.positions[b]);
            let id = self.distance_batches[color].add(a, b, rest_length);
            self.distance_constraint_map[edges[i]] = Some(ConstraintRef {
                batch: color,
                constraint: id,
            });
        }
        for batch in &mut self.distance_batches {
            batch.activate_all();
        }

        // Pooled set, one dormant constraint per interior pair half-edge.
        let initial_batch_count = self.distance_batches.len();
        let mut pooled_edges = Vec::new();
        let mut particle_indices = Vec::new();
        for &edge_index in &edges {
            let pair_index = self.topology.half_edges[edge_index].pair;
            let pair = self.topology.half_edges[pair_index];
            if pair.is_border() {
                continue;
            }
            pooled_edges.push(pair_index);
            particle_indices.push(self.topology.start_vertex(&pair));
            particle_indices.push(pair.end_vertex);
        }

        let constraint_colors = colorize(&particle_indices, 2);
        for (j, &color) in constraint_colors.iter().enumerate() {
            let batch_index = initial_batch_count + color;
            while batch_index >= self.distance_batches.len() {
                self.distance_batches.push(DistanceBatch::new(compliance));
            }
            let (a, b) = (particle_indices[j * 2], particle_indices[j * 2 + 1]);
            let rest_length = self.positions[a].distance(self.positions[b]);
            let id = self.distance_batches[batch_index].add(a, b, rest_length);
            self.distance_constraint_map[pooled_edges[j]] = Some(ConstraintRef {
                batch: batch_index,
                constraint: id,
            });
        }
    }

    fn create_aerodynamic_constraints(&mut self) {
        for i in 0..self.topology.vertices.len() {
            self.aerodynamics.add(i, self.area_contribution[i], 1.0, 1.0);
        }
    }

    /// For every vertex and neighbour `n1`, bend across the vertex to the
    /// neighbour most opposite `n1` (minimum direction cosine). Symmetric
    /// picks are deduplicated, then the triples are colored by shared
    /// particle into batches.
    fn create_bend_constraints(&mut self) {
        let mut particle_indices = Vec::new();
        let mut paired: HashMap<usize, usize> = HashMap::new();

        for i in 0..self.topology.vertices.len() {
            let center = self.topology.vertices[i].position;
            let neighbours: Vec<usize> = self.topology.neighbour_vertices(i).collect();

            for &n1 in &neighbours {
                let dir1 = (self.topology.vertices[n1].position - center).normalize_or_zero();

                let mut cos_best = 0.0;
                let mut best = n1;
                for &n2 in &neighbours {
                    let dir2 = (self.topology.vertices[n2].position - center).normalize_or_zero();
                    let cos = dir1.dot(dir2);
                    if cos < cos_best {
                        cos_best = cos;
                        best = n2;
                    }
                }

                if paired.get(&best) != Some(&n1) {
                    paired.insert(n1, best);
                    particle_indices.extend_from_slice(&[n1, best, i]);
                }
            }
        }

        let constraint_colors = colorize(&particle_indices, 3);
        for (i, &color) in constraint_colors.iter().enumerate() {
            while color >= self.bend_batches.len() {
                self.bend_batches.push(BendBatch::new());
            }
            let (p1, p2, p3) = (
                particle_indices[i * 3],
                particle_indices[i * 3 + 1],
                particle_indices[i * 3 + 2],
            );
            let rest = bending::rest_bend(
                self.positions[p1],
                self.positions[p2],
                self.positions[p3],
            );
            self.bend_batches[color].add(p1, p2, p3, rest);
        }
        for batch in &mut self.bend_batches {
            batch.activate_all();
        }
    }
}
