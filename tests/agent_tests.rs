use slotmap::SlotMap;
use softkin::{
    Agent, AgentId, AgentKind, AgentProperties, Colony, NoOpStepObserver, PhysicsWorld, SolverConfig,
    Stimulus, Target, Vec2, VerletWorld,
};

fn new_agent_id() -> AgentId {
    let mut ids: SlotMap<AgentId, ()> = SlotMap::with_key();
    ids.insert(())
}

#[test]
fn four_by_four_grid_scenario() {
    let mut world: VerletWorld<f32> = VerletWorld::new();
    let props = AgentProperties::grid(Vec2::new(0.0, 0.0))
        .with_grid_dims(4, 4)
        .with_size(Vec2::new(100.0, 100.0))
        .with_visibility_radius_factor(1.5);
    let agent = Agent::construct(&mut world, new_agent_id(), &props).unwrap();

    assert_eq!(agent.kind(), AgentKind::Mesh);
    assert_eq!(agent.mesh().vertex_count(), 16);
    assert_eq!(agent.graph().vertex_count(), 16);
    assert_eq!(agent.graph().joint_count(), 24);
    assert_eq!(agent.visibility_radius(), 50.0 * 1.5);
}

#[test]
fn sync_twice_without_step_is_idempotent() {
    let mut world: VerletWorld<f32> = VerletWorld::new();
    let props = AgentProperties::grid(Vec2::new(0.0, 0.0));
    let mut agent = Agent::construct(&mut world, new_agent_id(), &props).unwrap();
    let config = SolverConfig::new().with_gravity(Vec2::new(0.0, 98.0));
    for _ in 0..10 {
        world.step(1.0 / 60.0, &config, &mut NoOpStepObserver);
    }

    agent.sync(&world);
    let first = agent.mesh().clone();
    agent.sync(&world);
    assert_eq!(agent.mesh(), &first);
    assert_ne!(first.vertex_xy(0), Vec2::new(0.0, 0.0), "mesh followed the fall");
}

#[test]
fn sync_keeps_z() {
    let mut world: VerletWorld<f32> = VerletWorld::new();
    let props = AgentProperties::disc(Vec2::new(0.0, 0.0));
    let mut agent = Agent::construct(&mut world, new_agent_id(), &props).unwrap();
    world.step(1.0 / 60.0, &SolverConfig::new().with_gravity(Vec2::new(0.0, 50.0)), &mut NoOpStepObserver);
    agent.sync(&world);
    assert!(agent.mesh().vertices().iter().all(|v| v.z == 0.0));
}

#[test]
fn update_refreshes_visibility_and_weights() {
    let mut world: VerletWorld<f32> = VerletWorld::new();
    let props = AgentProperties::grid(Vec2::new(0.0, 0.0));
    let mut agent = Agent::construct(&mut world, new_agent_id(), &props).unwrap();

    let mut retuned = props.clone().with_visibility_radius_factor(3.0);
    retuned.weights.tickle = 9.0;
    let other = AgentProperties::disc(Vec2::zero());
    agent.update(&mut world, &retuned, &other).unwrap();

    assert_eq!(agent.visibility_radius(), 150.0);
    assert_eq!(agent.weights().tickle, 9.0);
}

#[test]
fn attraction_moves_agent_toward_target() {
    let mut colony: Colony<f32> = Colony::default();
    let mut props = AgentProperties::grid(Vec2::new(0.0, 0.0));
    props.weights.attraction = 400.0;
    let disc = AgentProperties::disc(Vec2::zero());
    let id = colony.construct(&props).unwrap();
    let start = colony.agent(id).unwrap().centroid();

    colony
        .set_targets(id, vec![Target::person(Vec2::new(110.0, 50.0), Stimulus::Attract)])
        .unwrap();
    for _ in 0..120 {
        colony.tick(1.0 / 60.0, &props, &disc).unwrap();
    }

    let end = colony.agent(id).unwrap().centroid();
    assert!(end.x > start.x + 1.0, "centroid moved from {:?} to {:?}", start, end);
}

#[test]
fn speed_never_exceeds_max_velocity() {
    let mut colony: Colony<f32> = Colony::default();
    let mut props = AgentProperties::disc(Vec2::new(0.0, 0.0));
    props.weights.stretch = 5000.0;
    props.weights.max_velocity = 30.0;
    let grid = AgentProperties::grid(Vec2::zero());
    let id = colony.construct(&props).unwrap();
    colony.set_targets_all(&[Target::person(Vec2::new(45.0, 0.0), Stimulus::Stretch)]);

    for _ in 0..30 {
        colony.tick(1.0 / 60.0, &grid, &props).unwrap();
        for &body in colony.agent(id).unwrap().graph().bodies() {
            let speed = colony.world().linear_velocity(body).unwrap().length();
            assert!(speed <= 30.0 + 1e-3, "speed {}", speed);
        }
    }
}
