use softkin::{AgentProperties, BondingConfig, Colony, ShapeProperties, SolverConfig, Vec2};

const MESH_AGENT: &str = r#"
visibility_radius_factor = 2.0
texture_size = { x = 512.0, y = 512.0 }

[shape]
kind = "grid"
rows = 5
cols = 6
size = { x = 150.0, y = 90.0 }
origin = { x = 10.0, y = 20.0 }
joint = { frequency = 6.0, damping_ratio = 0.8 }

[vertex]
restitution = 0.2
density = 1.5
friction = 0.4
radius = 5.0

[weights]
stretch = 25.0
repulsion = 12.0
attraction = 4.0
tickle = 1.0
max_velocity = 150.0
"#;

const DISC_AGENT: &str = r#"
visibility_radius_factor = 1.25
texture_size = { x = 64.0, y = 64.0 }
seed = 42

[shape]
kind = "disc"
center = { x = 300.0, y = 100.0 }
radius = 35.0
segments = 10
center_joint = { frequency = 3.0, damping_ratio = 1.0 }
side_joint = { frequency = 5.0, damping_ratio = 1.0 }
side_joint_offset = 1

[vertex]
restitution = 0.3
density = 1.0
friction = 0.5
radius = 4.0

[weights]
stretch = 20.0
repulsion = 10.0
attraction = 5.0
tickle = 2.0
max_velocity = 200.0
"#;

#[test]
fn agent_properties_from_toml() {
    let props: AgentProperties<f32> = toml::from_str(MESH_AGENT).unwrap();
    match props.shape {
        ShapeProperties::Grid(grid) => {
            assert_eq!((grid.rows, grid.cols), (5, 6));
            assert_eq!(grid.origin, Vec2::new(10.0, 20.0));
            assert_eq!(grid.joint.frequency, 6.0);
        }
        other => panic!("expected a grid, got {:?}", other),
    }
    assert_eq!(props.seed, 0);
    assert_eq!(props.visibility_radius(), 150.0);

    let disc: AgentProperties<f64> = toml::from_str(DISC_AGENT).unwrap();
    assert!(matches!(disc.shape, ShapeProperties::Disc(ref d) if d.segments == 10));
    assert_eq!(disc.seed, 42);
}

#[test]
fn toml_agents_construct() {
    let mesh: AgentProperties<f32> = toml::from_str(MESH_AGENT).unwrap();
    let disc: AgentProperties<f32> = toml::from_str(DISC_AGENT).unwrap();
    let mut colony = Colony::new(SolverConfig::new(), BondingConfig::default()).unwrap();
    let a = colony.construct(&mesh).unwrap();
    let b = colony.construct(&disc).unwrap();
    assert_eq!(colony.mesh(a).unwrap().vertex_count(), 30);
    assert_eq!(colony.mesh(b).unwrap().vertex_count(), 11);
    colony.tick(1.0 / 60.0, &mesh, &disc).unwrap();
}

#[test]
fn bonding_config_fills_missing_fields() {
    let config: BondingConfig<f32> = toml::from_str("max_length = 120.0\ncooldown_ticks = 30\n").unwrap();
    assert_eq!(config.max_length, 120.0);
    assert_eq!(config.cooldown_ticks, 30);
    assert_eq!(config.min_length, BondingConfig::<f32>::default().min_length);
    assert!(config.enabled);
}
