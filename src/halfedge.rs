//! Half-edge mesh topology.
//!
//! Each undirected edge of the triangle mesh is split into two directed
//! half-edges, giving O(1) adjacency traversal around vertices and faces.
//! Border edges get a synthesized pair with no face, so `pair` is always a
//! valid index and `pair(pair(e)) == e` holds everywhere.
//!
//! The mesh is immutable after generation except for one operation:
//! [`HalfEdgeMesh::split_vertex_at_plane`], which tears a vertex in two
//! along a plane. The split is purely topological; particle arrays are
//! owned by the blueprint/actor layer.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use tracing::warn;

use crate::error::{BuildError, Result};
use crate::math::{look_rotation, triangle_area, triangle_volume, Plane};
use crate::mesh::TriangleMesh;

/// Sentinel index marking "no face" / "no slot" on border half-edges.
pub const INVALID: usize = usize::MAX;

/// A welded topological vertex.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub index: usize,
    /// One incident half-edge. For border vertices this is guaranteed to be
    /// a border half-edge, so star traversal covers the full fan.
    pub half_edge: usize,
    /// Rest position (post-scale).
    pub position: Vec3,
}

/// A directed half-edge.
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge {
    pub index: usize,
    /// Corner slot 0..2 within the face, or [`INVALID`] for border edges.
    pub index_in_face: usize,
    /// Face this half-edge bounds, or [`INVALID`] for border edges.
    pub face: usize,
    /// Next half-edge counter-clockwise around the face (or around the
    /// border loop for border edges).
    pub next: usize,
    /// Opposite half-edge. Always valid.
    pub pair: usize,
    /// Vertex this half-edge points to.
    pub end_vertex: usize,
}

impl HalfEdge {
    #[inline]
    pub fn is_border(&self) -> bool {
        self.face == INVALID
    }
}

/// A triangular face.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    pub index: usize,
    /// One of the face's three half-edges.
    pub half_edge: usize,
}

/// Result of a successful vertex split.
#[derive(Debug, Clone)]
pub struct VertexSplit {
    /// Index of the newly created vertex.
    pub new_vertex: usize,
    /// Faces re-pointed to the new vertex (their winding changed).
    pub updated_faces: Vec<usize>,
    /// Half-edges whose endpoints changed, plus their pairs. The caller
    /// remaps distance constraints over exactly this set.
    pub updated_half_edges: Vec<usize>,
}

/// Half-edge representation of a triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    pub vertices: Vec<Vertex>,
    pub half_edges: Vec<HalfEdge>,
    /// Indices of the synthesized border half-edges.
    pub border_edges: Vec<usize>,
    pub faces: Vec<Face>,
    /// Area-weighted vertex normals at rest, one per vertex.
    pub rest_normals: Vec<Vec3>,
    /// Inverse tangent frames at rest, one per vertex.
    pub rest_orientations: Vec<Quat>,
    /// Maps raw input vertex indices to welded vertex indices.
    pub raw_to_welded: Vec<usize>,
    /// Input triangles dropped during generation because they were
    /// degenerate or duplicated an already-registered edge.
    pub dropped_triangles: usize,
    area: f32,
    volume: f32,
}

impl HalfEdgeMesh {
    /// Build the half-edge topology from an input mesh.
    ///
    /// Vertices sharing an exact post-scale position are welded into a
    /// single topological vertex. Triangles that duplicate an existing
    /// directed edge (non-manifold input) or repeat a welded vertex are
    /// dropped and counted in `dropped_triangles`.
    pub fn generate(mesh: &TriangleMesh, scale: Vec3) -> Result<Self> {
        mesh.validate()?;

        let mut topology = Self::default();

        // Weld input vertices that share an exact post-scale position.
        let mut vertex_buffer: HashMap<[u32; 3], usize> =
            HashMap::with_capacity(mesh.positions.len());
        for raw in &mesh.positions {
            let position = *raw * scale;
            // Adding 0.0 folds -0.0 into +0.0 so the two weld together.
            let key = position.to_array().map(|c| (c + 0.0).to_bits());
            let index = *vertex_buffer.entry(key).or_insert_with(|| {
                let index = topology.vertices.len();
                topology.vertices.push(Vertex {
                    index,
                    half_edge: INVALID,
                    position,
                });
                index
            });
            topology.raw_to_welded.push(index);
        }

        // Build half-edges and faces. `edge_buffer` maps a directed edge
        // (start, end) to its half-edge index and doubles as the duplicate
        // detector.
        let mut edge_buffer: HashMap<(usize, usize), usize> =
            HashMap::with_capacity(mesh.indices.len());
        let mut edge_keys: Vec<(usize, usize)> = Vec::with_capacity(mesh.indices.len());

        for tri in mesh.indices.chunks_exact(3) {
            let v1 = topology.raw_to_welded[tri[0] as usize];
            let v2 = topology.raw_to_welded[tri[1] as usize];
            let v3 = topology.raw_to_welded[tri[2] as usize];

            // Directed edge keys for the three half-edges: e1 runs v3->v1,
            // e2 runs v1->v2, e3 runs v2->v3.
            let k1 = (v3, v1);
            let k2 = (v1, v2);
            let k3 = (v2, v3);

            // Degenerate (repeated welded vertex) or duplicate-edge
            // triangles are dropped before any adjacency is touched.
            if v1 == v2
                || v2 == v3
                || v3 == v1
                || edge_buffer.contains_key(&k1)
                || edge_buffer.contains_key(&k2)
                || edge_buffer.contains_key(&k3)
            {
                topology.dropped_triangles += 1;
                continue;
            }

            let face_index = topology.faces.len();
            let base = topology.half_edges.len();

            for (slot, (&end, key)) in [v1, v2, v3].iter().zip([k1, k2, k3]).enumerate() {
                let index = base + slot;
                topology.half_edges.push(HalfEdge {
                    index,
                    index_in_face: slot,
                    face: face_index,
                    next: base + (slot + 1) % 3,
                    pair: INVALID,
                    end_vertex: end,
                });
                edge_buffer.insert(key, index);
                edge_keys.push(key);
            }

            // Each vertex points to the half-edge leaving it within this face.
            topology.vertices[v1].half_edge = base + 1;
            topology.vertices[v2].half_edge = base + 2;
            topology.vertices[v3].half_edge = base;

            topology.faces.push(Face {
                index: face_index,
                half_edge: base,
            });

            let p1 = topology.vertices[v1].position;
            let p2 = topology.vertices[v2].position;
            let p3 = topology.vertices[v3].position;
            topology.area += triangle_area(p1, p2, p3);
            topology.volume += triangle_volume(p1, p2, p3);
        }

        if topology.faces.is_empty() {
            return Err(BuildError::NoUsableTriangles(mesh.triangle_count()));
        }
        if topology.dropped_triangles > 0 {
            warn!(
                dropped = topology.dropped_triangles,
                total = mesh.triangle_count(),
                "dropped degenerate or duplicate triangles during half-edge generation"
            );
        }

        // Resolve pairs in half-edge index order so generation is
        // deterministic. Half-edges without an opposite get a synthesized
        // border pair appended at the end of the array.
        let interior_count = topology.half_edges.len();
        for i in 0..interior_count {
            if topology.half_edges[i].pair != INVALID {
                continue;
            }
            let (start, end) = edge_keys[i];
            if let Some(&j) = edge_buffer.get(&(end, start)) {
                topology.half_edges[i].pair = j;
                topology.half_edges[j].pair = i;
            } else {
                let border_index = topology.half_edges.len();
                topology.half_edges.push(HalfEdge {
                    index: border_index,
                    index_in_face: INVALID,
                    face: INVALID,
                    next: INVALID,
                    pair: i,
                    end_vertex: start,
                });
                topology.half_edges[i].pair = border_index;

                // Border vertices must point at a border half-edge so star
                // traversal finds the whole fan.
                topology.vertices[end].half_edge = border_index;
                topology.border_edges.push(border_index);
            }
        }

        // Link border half-edges into loops around holes.
        for b in 0..topology.border_edges.len() {
            let border_index = topology.border_edges[b];
            let end_vertex = topology.half_edges[border_index].end_vertex;
            topology.half_edges[border_index].next = topology.vertices[end_vertex].half_edge;
        }

        topology.calculate_rest_normals();
        topology.calculate_rest_orientations();

        Ok(topology)
    }

    /// True when the mesh has no border edges. The signed `volume` is only
    /// meaningful for closed meshes.
    pub fn closed(&self) -> bool {
        self.border_edges.is_empty()
    }

    /// Total surface area at rest.
    pub fn area(&self) -> f32 {
        self.area
    }

    /// Signed enclosed volume at rest (divergence theorem).
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Vertex a half-edge starts at.
    pub fn start_vertex(&self, edge: &HalfEdge) -> usize {
        if edge.is_border() {
            // Border edges have no face loop; use the pair's endpoint.
            return self.half_edges[edge.pair].end_vertex;
        }
        let e2 = &self.half_edges[edge.next];
        self.half_edges[e2.next].end_vertex
    }

    /// Rest area of a face.
    pub fn face_area(&self, face: &Face) -> f32 {
        let e1 = &self.half_edges[face.half_edge];
        let e2 = &self.half_edges[e1.next];
        let e3 = &self.half_edges[e2.next];
        triangle_area(
            self.vertices[e1.end_vertex].position,
            self.vertices[e2.end_vertex].position,
            self.vertices[e3.end_vertex].position,
        )
    }

    /// One half-edge per undirected edge, in index order.
    pub fn edge_list(&self) -> Vec<usize> {
        let mut edges = Vec::new();
        let mut listed = vec![false; self.half_edges.len()];
        for (i, edge) in self.half_edges.iter().enumerate() {
            if !listed[edge.pair] {
                edges.push(i);
                listed[edge.pair] = true;
                listed[i] = true;
            }
        }
        edges
    }

    /// True if a prior vertex split separated the two directions of this
    /// edge, so that each half-edge now runs between different vertices.
    pub fn is_split(&self, half_edge_index: usize) -> bool {
        let edge = &self.half_edges[half_edge_index];
        if edge.is_border() {
            return false;
        }
        let pair = &self.half_edges[edge.pair];
        if pair.is_border() {
            return false;
        }
        edge.end_vertex != self.half_edges[self.half_edges[pair.next].next].end_vertex
            || pair.end_vertex != self.half_edges[self.half_edges[edge.next].next].end_vertex
    }

    /// Indices of the vertices adjacent to `vertex`. Empty for vertices
    /// without an incident half-edge.
    pub fn neighbour_vertices(&self, vertex: usize) -> NeighbourVertices<'_> {
        let start = self.vertices[vertex].half_edge;
        NeighbourVertices {
            mesh: self,
            start,
            current: start,
            visited: 0,
            done: start == INVALID,
        }
    }

    /// Indices of the half-edges incident to `vertex`, both directions.
    /// Empty for vertices without an incident half-edge.
    pub fn neighbour_edges(&self, vertex: usize) -> NeighbourEdges<'_> {
        let start = self.vertices[vertex].half_edge;
        NeighbourEdges {
            mesh: self,
            start,
            current: start,
            pending: None,
            visited: 0,
            done: start == INVALID,
        }
    }

    /// Indices of the faces incident to `vertex`. Empty for vertices
    /// without an incident half-edge.
    pub fn neighbour_faces(&self, vertex: usize) -> NeighbourFaces<'_> {
        let start = self.vertices[vertex].half_edge;
        NeighbourFaces {
            mesh: self,
            start,
            current: start,
            visited: 0,
            done: start == INVALID,
        }
    }

    /// Split `vertex_index` into two vertices along `plane`.
    ///
    /// Incident faces are classified by the plane using their *deformed*
    /// centroids (`deformed` is indexed by vertex index and must cover all
    /// current vertices). Faces on the positive side are re-pointed to a
    /// new vertex appended at the same rest position; the rest normal and
    /// orientation are copied so downstream skinning stays consistent.
    ///
    /// Returns `None` without mutating anything when the incident faces do
    /// not strictly separate into two non-empty sides, i.e. the vertex is
    /// not actually torn across a boundary yet.
    pub fn split_vertex_at_plane(
        &mut self,
        vertex_index: usize,
        plane: &Plane,
        deformed: &[Vec3],
    ) -> Option<VertexSplit> {
        if vertex_index >= self.vertices.len() {
            return None;
        }

        // Classify adjacent faces by which side of the plane their deformed
        // center falls on.
        let mut side1 = Vec::new();
        let mut side2 = Vec::new();
        for face_index in self.neighbour_faces(vertex_index) {
            let face = self.faces[face_index];
            let e1 = self.half_edges[face.half_edge];
            let e2 = self.half_edges[e1.next];
            let e3 = self.half_edges[e2.next];

            // Skip faces that no longer contain the vertex. Pair links are
            // not updated by a split, so vertices split earlier still "see"
            // faces on the other side of the cut as adjacent.
            if e1.end_vertex != vertex_index
                && e2.end_vertex != vertex_index
                && e3.end_vertex != vertex_index
            {
                continue;
            }

            let center =
                (deformed[e1.end_vertex] + deformed[e2.end_vertex] + deformed[e3.end_vertex]) / 3.0;
            if plane.side(center) {
                side1.push(face_index);
            } else {
                side2.push(face_index);
            }
        }

        // A split must strictly separate the fan into two non-empty groups.
        if side1.is_empty() || side2.is_empty() {
            return None;
        }

        let old_vertex = self.vertices[vertex_index];
        let new_index = self.vertices.len();
        let mut new_half_edge = old_vertex.half_edge;
        let mut updated_half_edges: Vec<usize> = Vec::new();
        let mut record = |list: &mut Vec<usize>, index: usize| {
            if !list.contains(&index) {
                list.push(index);
            }
        };

        // Re-point the positive side: the half-edge arriving at the split
        // vertex within each face moves to the new vertex.
        for &face_index in &side1 {
            let face = self.faces[face_index];
            let e1 = self.half_edges[face.half_edge];
            let e2 = self.half_edges[e1.next];
            let e3 = self.half_edges[e2.next];

            let mut incoming = e1;
            let mut outgoing = e2;
            for e in [e1, e2, e3] {
                if e.end_vertex == vertex_index {
                    incoming = e;
                } else if self.start_vertex(&e) == vertex_index {
                    outgoing = e;
                }
            }

            self.half_edges[incoming.index].end_vertex = new_index;
            new_half_edge = outgoing.index;

            for index in [incoming.index, incoming.pair, outgoing.index, outgoing.pair] {
                record(&mut updated_half_edges, index);
            }
        }

        self.vertices.push(Vertex {
            index: new_index,
            half_edge: new_half_edge,
            position: old_vertex.position,
        });
        self.rest_normals.push(self.rest_normals[vertex_index]);
        self.rest_orientations.push(self.rest_orientations[vertex_index]);

        Some(VertexSplit {
            new_vertex: new_index,
            updated_faces: side1,
            updated_half_edges,
        })
    }

    fn calculate_rest_normals(&mut self) {
        self.rest_normals = vec![Vec3::ZERO; self.vertices.len()];
        for face in &self.faces {
            let e1 = &self.half_edges[face.half_edge];
            let e2 = &self.half_edges[e1.next];
            let e3 = &self.half_edges[e2.next];

            let p1 = self.vertices[e1.end_vertex].position;
            let p2 = self.vertices[e2.end_vertex].position;
            let p3 = self.vertices[e3.end_vertex].position;

            // Unnormalized cross product: larger faces weigh more.
            let n = (p2 - p1).cross(p3 - p1);
            self.rest_normals[e1.end_vertex] += n;
            self.rest_normals[e2.end_vertex] += n;
            self.rest_normals[e3.end_vertex] += n;
        }
        for n in &mut self.rest_normals {
            *n = n.normalize_or_zero();
        }
    }

    fn calculate_rest_orientations(&mut self) {
        self.rest_orientations = Vec::with_capacity(self.vertices.len());
        for vertex in &self.vertices {
            // Vertices no kept triangle references have no incident
            // half-edge and no tangent frame.
            if vertex.half_edge == INVALID {
                self.rest_orientations.push(Quat::IDENTITY);
                continue;
            }
            let neighbour = self.half_edges[vertex.half_edge].end_vertex;
            let surface = self.vertices[neighbour].position - vertex.position;
            self.rest_orientations
                .push(look_rotation(self.rest_normals[vertex.index], surface).inverse());
        }
    }
}

/// Cursor over the vertices adjacent to a vertex.
///
/// Bounded by the total half-edge count so corrupted adjacency terminates
/// instead of spinning.
pub struct NeighbourVertices<'a> {
    mesh: &'a HalfEdgeMesh,
    start: usize,
    current: usize,
    visited: usize,
    done: bool,
}

impl Iterator for NeighbourVertices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        self.visited += 1;
        if self.visited > self.mesh.half_edges.len() {
            self.done = true;
            return None;
        }
        let edge = self.mesh.half_edges[self.current];
        let item = edge.end_vertex;
        self.current = self.mesh.half_edges[edge.pair].next;
        if self.current == self.start {
            self.done = true;
        }
        Some(item)
    }
}

/// Cursor over the half-edges incident to a vertex (both directions of
/// each edge in the star). Same loop guard as [`NeighbourVertices`].
pub struct NeighbourEdges<'a> {
    mesh: &'a HalfEdgeMesh,
    start: usize,
    current: usize,
    pending: Option<usize>,
    visited: usize,
    done: bool,
}

impl Iterator for NeighbourEdges<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if let Some(pending) = self.pending.take() {
            return Some(pending);
        }
        if self.done {
            return None;
        }
        self.visited += 1;
        if self.visited > self.mesh.half_edges.len() {
            self.done = true;
            return None;
        }
        let pair = self.mesh.half_edges[self.current].pair;
        let next = self.mesh.half_edges[pair].next;
        self.current = next;
        if next == self.start {
            self.done = true;
        }
        self.pending = Some(next);
        Some(pair)
    }
}

/// Cursor over the faces incident to a vertex, skipping the border.
/// Same loop guard as [`NeighbourVertices`].
pub struct NeighbourFaces<'a> {
    mesh: &'a HalfEdgeMesh,
    start: usize,
    current: usize,
    visited: usize,
    done: bool,
}

impl Iterator for NeighbourFaces<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while !self.done {
            self.visited += 1;
            if self.visited > self.mesh.half_edges.len() {
                self.done = true;
                return None;
            }
            let pair_index = self.mesh.half_edges[self.current].pair;
            let pair = self.mesh.half_edges[pair_index];
            self.current = pair.next;
            if self.current == self.start {
                self.done = true;
            }
            if pair.face != INVALID {
                return Some(pair.face);
            }
        }
        None
    }
}
