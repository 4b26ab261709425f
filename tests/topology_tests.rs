use glam::Vec3;
use tearable_cloth::halfedge::{HalfEdgeMesh, INVALID};
use tearable_cloth::math::Plane;
use tearable_cloth::mesh::TriangleMesh;

/// Regular tetrahedron-ish closed mesh: 4 vertices, 4 outward-wound faces.
fn tetrahedron() -> TriangleMesh {
    TriangleMesh::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ],
        vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
    )
}

#[test]
fn test_pair_involution() {
    let topology = HalfEdgeMesh::generate(&TriangleMesh::grid(2, 2, 1.0), Vec3::ONE).unwrap();
    for edge in &topology.half_edges {
        let pair = &topology.half_edges[edge.pair];
        assert_eq!(
            pair.pair, edge.index,
            "pair(pair(e)) must return e for half-edge {}",
            edge.index
        );
    }
}

#[test]
fn test_face_corner_loop() {
    let topology = HalfEdgeMesh::generate(&TriangleMesh::grid(3, 2, 0.5), Vec3::ONE).unwrap();
    for edge in &topology.half_edges {
        if edge.is_border() {
            continue;
        }
        let e2 = &topology.half_edges[edge.next];
        let e3 = &topology.half_edges[e2.next];
        assert_eq!(
            e3.next, edge.index,
            "three next steps from interior half-edge {} must close the triangle",
            edge.index
        );
    }
}

#[test]
fn test_open_grid_has_borders() {
    let topology = HalfEdgeMesh::generate(&TriangleMesh::grid(2, 2, 1.0), Vec3::ONE).unwrap();
    assert!(!topology.closed());
    // 2x2 quad grid: 8 boundary segments.
    assert_eq!(topology.border_edges.len(), 8);
    assert_eq!(topology.vertices.len(), 9);
    assert_eq!(topology.faces.len(), 8);
    // 24 interior half-edges plus 8 synthesized border ones.
    assert_eq!(topology.half_edges.len(), 32);
    assert_eq!(topology.closed(), topology.border_edges.is_empty());
}

#[test]
fn test_closed_mesh_volume_and_area() {
    let topology = HalfEdgeMesh::generate(&tetrahedron(), Vec3::ONE).unwrap();
    assert!(topology.closed());
    assert!(topology.border_edges.is_empty());

    // Divergence-theorem volume of this tetrahedron is 1/6.
    assert!((topology.volume() - 1.0 / 6.0).abs() < 1e-5);
    // Three unit right triangles plus the sqrt(3)/2 diagonal face.
    let expected_area = 1.5 + 3.0_f32.sqrt() / 2.0;
    assert!((topology.area() - expected_area).abs() < 1e-5);
}

#[test]
fn test_weld_merges_duplicated_positions() {
    // Two triangles sharing an edge, with the shared vertices duplicated in
    // the input as exporters do along seams.
    let mesh = TriangleMesh::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0), // duplicate of 1
            Vec3::new(0.0, 1.0, 0.0), // duplicate of 2
            Vec3::new(1.0, 1.0, 0.0),
        ],
        vec![0, 1, 2, 3, 5, 4],
    );
    let topology = HalfEdgeMesh::generate(&mesh, Vec3::ONE).unwrap();
    assert_eq!(topology.vertices.len(), 4);
    assert_eq!(topology.faces.len(), 2);
    assert_eq!(topology.raw_to_welded.len(), 6);
    assert_eq!(topology.raw_to_welded[1], topology.raw_to_welded[3]);
    assert_eq!(topology.raw_to_welded[2], topology.raw_to_welded[4]);
}

#[test]
fn test_duplicate_triangles_are_dropped_and_counted() {
    // Same triangle twice: the second registers the same directed edges.
    let mesh = TriangleMesh::new(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        vec![0, 1, 2, 0, 1, 2],
    );
    let topology = HalfEdgeMesh::generate(&mesh, Vec3::ONE).unwrap();
    assert_eq!(topology.faces.len(), 1);
    assert_eq!(topology.dropped_triangles, 1);
}

#[test]
fn test_degenerate_triangle_is_dropped() {
    let mesh = TriangleMesh::new(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        vec![0, 1, 2, 0, 0, 1],
    );
    let topology = HalfEdgeMesh::generate(&mesh, Vec3::ONE).unwrap();
    assert_eq!(topology.faces.len(), 1);
    assert_eq!(topology.dropped_triangles, 1);
}

#[test]
fn test_generate_is_deterministic() {
    let mesh = TriangleMesh::grid(4, 3, 0.25);
    let a = HalfEdgeMesh::generate(&mesh, Vec3::ONE).unwrap();
    let b = HalfEdgeMesh::generate(&mesh, Vec3::ONE).unwrap();

    assert_eq!(a.vertices.len(), b.vertices.len());
    assert_eq!(a.half_edges.len(), b.half_edges.len());
    assert_eq!(a.border_edges, b.border_edges);
    for (ea, eb) in a.half_edges.iter().zip(&b.half_edges) {
        assert_eq!(ea.index, eb.index);
        assert_eq!(ea.face, eb.face);
        assert_eq!(ea.next, eb.next);
        assert_eq!(ea.pair, eb.pair);
        assert_eq!(ea.end_vertex, eb.end_vertex);
    }
    for (va, vb) in a.vertices.iter().zip(&b.vertices) {
        assert_eq!(va.half_edge, vb.half_edge);
        assert_eq!(va.position, vb.position);
    }
}

#[test]
fn test_neighbour_vertices_of_center() {
    let topology = HalfEdgeMesh::generate(&TriangleMesh::grid(2, 2, 1.0), Vec3::ONE).unwrap();
    // Vertex 4 sits at (1, 1): four axis neighbours plus four diagonals.
    let mut neighbours: Vec<usize> = topology.neighbour_vertices(4).collect();
    neighbours.sort_unstable();
    neighbours.dedup();
    assert_eq!(neighbours, vec![0, 1, 2, 3, 5, 6, 7, 8]);
}

#[test]
fn test_neighbour_faces_cover_vertex_star() {
    let topology = HalfEdgeMesh::generate(&TriangleMesh::grid(2, 2, 1.0), Vec3::ONE).unwrap();
    let faces: Vec<usize> = topology.neighbour_faces(4).collect();
    // Every face of the 2x2 grid touches the center vertex.
    assert_eq!(faces.len(), 8);
    // Corner vertex (0,0) touches the faces of one cell plus the diagonal.
    let corner_faces: Vec<usize> = topology.neighbour_faces(0).collect();
    assert!(corner_faces.len() >= 1 && corner_faces.len() <= 3);
}

#[test]
fn test_neighbour_iterator_guard_on_corrupted_adjacency() {
    let mut topology = HalfEdgeMesh::generate(&TriangleMesh::grid(2, 2, 1.0), Vec3::ONE).unwrap();
    // Corrupt the star of vertex 4 into a cycle that never revisits the
    // start half-edge; the cursor must still terminate.
    let start = topology.vertices[4].half_edge;
    let pair = topology.half_edges[start].pair;
    topology.half_edges[pair].next = pair;
    let visited = topology.neighbour_vertices(4).count();
    assert!(visited <= topology.half_edges.len());
}

#[test]
fn test_edge_list_covers_every_edge_once() {
    let topology = HalfEdgeMesh::generate(&TriangleMesh::grid(2, 2, 1.0), Vec3::ONE).unwrap();
    let edges = topology.edge_list();
    // 16 undirected edges in a 2x2 quad grid with diagonals.
    assert_eq!(edges.len(), 16);
    // Each listed half-edge must be interior (border edges are appended
    // after their interior pairs, so the first of each pair has a face).
    for &edge_index in &edges {
        assert_ne!(topology.half_edges[edge_index].face, INVALID);
    }
}

#[test]
fn test_split_vertex_separates_fan() {
    let mut topology = HalfEdgeMesh::generate(&TriangleMesh::grid(2, 2, 1.0), Vec3::ONE).unwrap();
    let deformed: Vec<Vec3> = topology.vertices.iter().map(|v| v.position).collect();
    let vertex_count = topology.vertices.len();

    // Horizontal cut through the center vertex.
    let plane = Plane::from_point_normal(Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
    let split = topology
        .split_vertex_at_plane(4, &plane, &deformed)
        .expect("center vertex fan must separate");

    assert_eq!(split.new_vertex, vertex_count);
    assert_eq!(topology.vertices.len(), vertex_count + 1);
    assert_eq!(topology.rest_normals.len(), vertex_count + 1);
    assert_eq!(topology.rest_orientations.len(), vertex_count + 1);
    assert!(!split.updated_faces.is_empty());
    assert!(!split.updated_half_edges.is_empty());

    // Updated faces now reference the new vertex instead of the old one.
    for &face_index in &split.updated_faces {
        let face = topology.faces[face_index];
        let e1 = topology.half_edges[face.half_edge];
        let e2 = topology.half_edges[e1.next];
        let e3 = topology.half_edges[e2.next];
        let corners = [e1.end_vertex, e2.end_vertex, e3.end_vertex];
        assert!(corners.contains(&split.new_vertex));
        assert!(!corners.contains(&4));
    }

    // Pairing is untouched by a split.
    for edge in &topology.half_edges {
        assert_eq!(topology.half_edges[edge.pair].pair, edge.index);
    }
}

#[test]
fn test_split_fails_cleanly_when_fan_does_not_separate() {
    let mut topology = HalfEdgeMesh::generate(&TriangleMesh::grid(2, 2, 1.0), Vec3::ONE).unwrap();
    let deformed: Vec<Vec3> = topology.vertices.iter().map(|v| v.position).collect();
    let vertex_count = topology.vertices.len();
    let half_edge_count = topology.half_edges.len();

    // Plane far below the mesh: every incident face lands on one side.
    let plane = Plane::from_point_normal(Vec3::new(0.0, -10.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
    assert!(topology.split_vertex_at_plane(4, &plane, &deformed).is_none());

    // No mutation on failure.
    assert_eq!(topology.vertices.len(), vertex_count);
    assert_eq!(topology.half_edges.len(), half_edge_count);
}

#[test]
fn test_split_marks_boundary_edges_as_split() {
    let mut topology = HalfEdgeMesh::generate(&TriangleMesh::grid(2, 2, 1.0), Vec3::ONE).unwrap();
    let deformed: Vec<Vec3> = topology.vertices.iter().map(|v| v.position).collect();

    for edge_index in 0..topology.half_edges.len() {
        assert!(!topology.is_split(edge_index));
    }

    let plane = Plane::from_point_normal(Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
    topology.split_vertex_at_plane(4, &plane, &deformed).unwrap();

    // The horizontal edges along the cut now have their two directions
    // running between different vertex pairs.
    let split_edges = (0..topology.half_edges.len())
        .filter(|&e| topology.is_split(e))
        .count();
    assert!(split_edges > 0);
}

#[test]
fn test_rest_normals_of_flat_grid() {
    let topology = HalfEdgeMesh::generate(&TriangleMesh::grid(2, 2, 1.0), Vec3::ONE).unwrap();
    for normal in &topology.rest_normals {
        assert!((*normal - Vec3::Z).length() < 1e-5, "flat grid normal should be +Z");
    }
}

#[test]
fn test_scale_is_applied_before_welding() {
    let mesh = TriangleMesh::grid(2, 2, 1.0);
    let topology = HalfEdgeMesh::generate(&mesh, Vec3::splat(2.0)).unwrap();
    assert_eq!(topology.vertices.len(), 9);
    assert!((topology.area() - 16.0).abs() < 1e-4);
    let max_x = topology
        .vertices
        .iter()
        .map(|v| v.position.x)
        .fold(f32::MIN, f32::max);
    assert_eq!(max_x, 4.0);
}

#[test]
fn test_unreferenced_vertex_is_inert() {
    // A stray input vertex no triangle uses must not derail generation.
    let mesh = TriangleMesh::new(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(5.0, 5.0, 5.0)],
        vec![0, 1, 2],
    );
    let topology = HalfEdgeMesh::generate(&mesh, Vec3::ONE).unwrap();

    assert_eq!(topology.vertices.len(), 4);
    assert_eq!(topology.faces.len(), 1);
    assert_eq!(topology.rest_normals.len(), 4);
    assert_eq!(topology.rest_orientations.len(), 4);
    assert_eq!(topology.rest_normals[3], Vec3::ZERO);

    // Star traversal of the stray vertex yields nothing.
    assert_eq!(topology.neighbour_vertices(3).count(), 0);
    assert_eq!(topology.neighbour_edges(3).count(), 0);
    assert_eq!(topology.neighbour_faces(3).count(), 0);
}

#[test]
fn test_vertex_orphaned_by_dropped_triangle_is_inert() {
    // Vertex 3 is referenced only by a triangle that reuses the directed
    // edge 0->1 and gets dropped, leaving the vertex with no half-edge.
    let mesh = TriangleMesh::new(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(2.0, 0.0, 0.0)],
        vec![0, 1, 2, 0, 1, 3],
    );
    let topology = HalfEdgeMesh::generate(&mesh, Vec3::ONE).unwrap();

    assert_eq!(topology.faces.len(), 1);
    assert_eq!(topology.dropped_triangles, 1);
    assert_eq!(topology.vertices.len(), 4);
    assert_eq!(topology.rest_orientations.len(), 4);
    assert_eq!(topology.neighbour_vertices(3).count(), 0);
}

#[test]
fn test_negative_zero_welds_with_positive_zero() {
    let mesh = TriangleMesh::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::X,
            Vec3::Y,
            Vec3::new(-0.0, 0.0, 0.0), // same point as vertex 0
        ],
        vec![0, 1, 2, 3, 2, 1],
    );
    let topology = HalfEdgeMesh::generate(&mesh, Vec3::ONE).unwrap();

    assert_eq!(topology.vertices.len(), 3);
    assert_eq!(topology.faces.len(), 2);
    assert_eq!(topology.raw_to_welded[3], topology.raw_to_welded[0]);
}
