use softkin::{
    AgentError, DiscShape, GridShape, JointPhysics, MeshTopology, PhysicsGraph, PhysicsWorld,
    TopologyFault, Vec2, VertexPhysics, VerletWorld,
};

fn grid_shape(rows: usize, cols: usize) -> GridShape<f32> {
    GridShape {
        rows,
        cols,
        size: Vec2::new(120.0, 80.0),
        origin: Vec2::new(-20.0, 5.0),
        joint: JointPhysics::default(),
    }
}

#[test]
fn grid_counts_hold_for_all_small_sizes() {
    for rows in 2..=8 {
        for cols in 2..=8 {
            let mesh = MeshTopology::grid(&grid_shape(rows, cols), Vec2::new(256.0, 128.0)).unwrap();
            assert_eq!(mesh.vertex_count(), rows * cols);
            assert_eq!(mesh.tex_coords().len(), rows * cols);
            assert_eq!(mesh.indices().len(), 6 * (rows - 1) * (cols - 1));
            assert!(
                mesh.indices().iter().all(|&i| (i as usize) < mesh.vertex_count()),
                "index out of range for {}x{}",
                rows,
                cols
            );
        }
    }
}

#[test]
fn last_row_and_column_never_start_a_cell() {
    let (rows, cols) = (3usize, 4usize);
    let mesh = MeshTopology::grid(&grid_shape(rows, cols), Vec2::new(1.0, 1.0)).unwrap();
    // The first index of every triangle pair is a cell's top-left vertex.
    for cell in mesh.indices().chunks(6) {
        let tl = cell[0] as usize;
        assert!(tl % cols != cols - 1, "cell starts in last column: {}", tl);
        assert!(tl / cols != rows - 1, "cell starts in last row: {}", tl);
    }
}

#[test]
fn texture_coordinates_span_unit_square() {
    let mesh = MeshTopology::grid(&grid_shape(5, 5), Vec2::new(300.0, 40.0)).unwrap();
    for t in mesh.tex_coords() {
        assert!((0.0..=1.0).contains(&t.x) && (0.0..=1.0).contains(&t.y), "{:?}", t);
    }
    assert_eq!(mesh.tex_coords()[0], Vec2::new(0.0, 0.0));
    assert_eq!(mesh.tex_coords()[24], Vec2::new(1.0, 1.0));
}

#[test]
fn degenerate_grid_is_rejected() {
    for (rows, cols) in [(1, 5), (5, 1), (0, 0)] {
        assert_eq!(
            MeshTopology::grid(&grid_shape(rows, cols), Vec2::new(1.0, 1.0)),
            Err(TopologyFault::GridTooSmall { rows, cols })
        );
    }
}

#[test]
fn physics_graph_matches_mesh() {
    for rows in 2..=6 {
        for cols in 2..=6 {
            let mut world: VerletWorld<f32> = VerletWorld::new();
            let shape = grid_shape(rows, cols);
            let mesh = MeshTopology::grid(&shape, Vec2::new(1.0, 1.0)).unwrap();
            let mut graph = PhysicsGraph::new();
            graph.build_grid(&mut world, &mesh, &shape, &VertexPhysics::default(), None).unwrap();

            assert_eq!(graph.vertex_count(), mesh.vertex_count());
            assert_eq!(graph.joint_count(), (rows - 1) * cols + rows * (cols - 1));
            assert_eq!(world.joint_count(), graph.joint_count());
            for (i, &body) in graph.bodies().iter().enumerate() {
                assert_eq!(world.body_position(body), Some(mesh.vertex_xy(i)));
            }
        }
    }
}

#[test]
fn rebuilding_releases_previous_graph() {
    let mut world: VerletWorld<f32> = VerletWorld::new();
    let shape = grid_shape(3, 3);
    let mesh = MeshTopology::grid(&shape, Vec2::new(1.0, 1.0)).unwrap();
    let mut graph = PhysicsGraph::new();
    graph.build_grid(&mut world, &mesh, &shape, &VertexPhysics::default(), None).unwrap();
    graph.build_grid(&mut world, &mesh, &shape, &VertexPhysics::default(), None).unwrap();

    assert_eq!(world.body_count(), 9);
    assert_eq!(world.joint_count(), 12);
}

#[test]
fn mismatched_mesh_is_a_graph_error() {
    let mut world: VerletWorld<f32> = VerletWorld::new();
    let mesh = MeshTopology::grid(&grid_shape(3, 3), Vec2::new(1.0, 1.0)).unwrap();
    let mut graph = PhysicsGraph::new();
    let err = graph
        .build_grid(&mut world, &mesh, &grid_shape(4, 4), &VertexPhysics::default(), None)
        .unwrap_err();
    assert_eq!(err, AgentError::PhysicsGraphMismatch { vertices: 9, bodies: 16 });
    assert_eq!(world.body_count(), 0);
}

#[test]
fn disc_graph_joins_centre_and_rim() {
    let mut world: VerletWorld<f32> = VerletWorld::new();
    let shape = DiscShape {
        center: Vec2::new(10.0, 10.0),
        radius: 30.0,
        segments: 8,
        center_joint: JointPhysics::new(3.0, 1.0),
        side_joint: JointPhysics::new(5.0, 1.0),
        side_joint_offset: 2,
    };
    let mesh = MeshTopology::disc(shape.center, shape.radius, shape.segments, Vec2::new(64.0, 64.0)).unwrap();
    let mut graph = PhysicsGraph::new();
    graph.build_disc(&mut world, &mesh, &shape, &VertexPhysics::default(), None).unwrap();

    assert_eq!(graph.vertex_count(), 9);
    assert_eq!(graph.joint_count(), 8 + 8);
    assert_eq!(mesh.vertex_xy(0), Vec2::new(10.0, 10.0));
    let rim = mesh.vertex_xy(1).distance(Vec2::new(10.0, 10.0));
    assert!((rim - 30.0).abs() < 1e-4);
}
