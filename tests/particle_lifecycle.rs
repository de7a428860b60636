// tests/particle_lifecycle.rs
use glam::Vec3;
use lsystem_particles::{
    BranchTree, DrawCommand, GrammarParameters, InterpreterConfig, LSystemError, ParticleConfig,
    ParticleSystem, TurtleInterpreter,
};

const EPS: f32 = 1e-4;

/// `F[+F]F` with step 10 and angle 90:
/// root(0) -> 1 (10,0,0) -> { 2 (branch) -> 3 (10,10,0), 4 (20,0,0) }
fn branch_tree() -> BranchTree {
    let parameters = GrammarParameters {
        step_angle: 90.0,
        step_size: 10.0,
        ..Default::default()
    };
    TurtleInterpreter::standard(parameters, InterpreterConfig::default())
        .build_tree("F[+F]F", 1.0, 1.0)
}

fn weightless() -> ParticleSystem {
    ParticleSystem::new(ParticleConfig {
        max_life: 1.0,
        gravity: 0.0,
        floor: 1.0e6,
        restitution: 0.9,
    })
}

#[test]
fn test_spawn_travels_edge_in_max_life() {
    let tree = branch_tree();
    let mut particles = weightless();
    let id = particles.spawn(&tree, 1).unwrap();

    let p = particles.get(id).unwrap();
    assert_eq!(p.position, Vec3::ZERO);
    assert!(p.velocity.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), EPS));
    assert_eq!(p.life, 0.0);

    let report = particles.advance(&tree, 0.5);
    assert!(report.spawned.is_empty() && report.died.is_empty());
    let p = particles.get(id).unwrap();
    assert!(p.position.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), EPS));

    // Reaching exactly max_life does not complete the edge yet.
    particles.advance(&tree, 0.5);
    let p = particles.get(id).unwrap();
    assert_eq!(p.node, 1);
    assert!(p.position.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), EPS));
}

#[test]
fn test_branch_point_forks_one_particle() {
    let tree = branch_tree();
    let mut particles = weightless();
    let id = particles.spawn(&tree, 1).unwrap();

    let report = particles.advance(&tree, 1.1);

    assert_eq!(particles.len(), 2, "Live set grows by exactly one");
    assert_eq!(report.spawned.len(), 1);
    assert!(report.died.is_empty());

    let original = particles.get(id).unwrap();
    assert_eq!(original.node, 2, "Continues onto the first child");
    assert_eq!(original.life, 0.0);
    assert_eq!(original.position, tree.get(2).unwrap().state.position0);

    let fork = particles.get(report.spawned[0]).unwrap();
    assert_eq!(fork.node, 4, "Forks onto the sibling");
    assert!(fork.position.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), EPS));
    assert!(fork.velocity.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), EPS));
}

#[test]
fn test_leaf_retires_particle() {
    let tree = branch_tree();
    let mut particles = weightless();
    let id = particles.spawn(&tree, 3).unwrap();

    let report = particles.advance(&tree, 1.1);

    assert_eq!(report.died, vec![id]);
    assert!(report.spawned.is_empty());
    assert!(particles.is_empty());
}

#[test]
fn test_single_child_continues_without_forking() {
    let tree = branch_tree();
    let mut particles = weightless();
    let id = particles.spawn_at_root(&tree);

    // The root's edge has zero length.
    assert_eq!(particles.get(id).unwrap().velocity, Vec3::ZERO);

    let report = particles.advance(&tree, 1.5);
    assert!(report.spawned.is_empty() && report.died.is_empty());
    assert_eq!(particles.get(id).unwrap().node, 1);
}

#[test]
fn test_stream_reaches_every_leaf_and_drains() {
    let tree = branch_tree();
    let mut particles = weightless();
    particles.spawn_at_root(&tree);

    let mut spawned = 0;
    let mut died = 0;
    for _ in 0..10 {
        let report = particles.advance(&tree, 1.01);
        spawned += report.spawned.len();
        died += report.died.len();
    }

    assert_eq!(spawned, 1, "One fork at the single branch point");
    assert_eq!(died, 2, "One death per leaf");
    assert!(particles.is_empty());
}

#[test]
fn test_large_step_completes_one_edge_only() {
    let tree = branch_tree();
    let mut particles = weightless();
    let id = particles.spawn_at_root(&tree);

    particles.advance(&tree, 50.0);
    assert_eq!(particles.get(id).unwrap().node, 1);
}

#[test]
fn test_gravity_bends_the_path() {
    let tree = branch_tree();
    let mut particles = ParticleSystem::new(ParticleConfig {
        gravity: 10.0,
        floor: 1.0e6,
        ..weightless().config().clone()
    });
    let id = particles.spawn(&tree, 1).unwrap();

    // Position moves before velocity is accelerated.
    particles.advance(&tree, 0.5);
    let p = particles.get(id).unwrap();
    assert!(p.position.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), EPS));
    assert!((p.velocity.y - 5.0).abs() < EPS);

    particles.advance(&tree, 0.25);
    let p = particles.get(id).unwrap();
    assert!(p.position.abs_diff_eq(Vec3::new(7.5, 1.25, 0.0), EPS));
}

#[test]
fn test_floor_bounce() {
    let tree = branch_tree();
    let mut particles = ParticleSystem::new(ParticleConfig {
        floor: 2.0,
        ..weightless().config().clone()
    });
    // Node 3's edge runs from (10,0,0) to (10,10,0), straight down in screen space.
    let id = particles.spawn(&tree, 3).unwrap();

    particles.advance(&tree, 0.5);
    let p = particles.get(id).unwrap();
    assert!((p.position.y - 2.0).abs() < EPS);
    assert!((p.velocity.y + 9.0).abs() < EPS);
}

#[test]
fn test_draw_colours_from_current_node() {
    let tree = branch_tree();
    let mut particles = weightless();
    particles.spawn(&tree, 3).unwrap();
    particles.spawn(&tree, 4).unwrap();

    let commands = particles.draw(&tree);
    assert_eq!(commands.len(), 2);
    match commands[0] {
        DrawCommand::Point { position, color } => {
            assert!(position.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), EPS));
            assert_eq!(color.hue, 90.0);
            assert_eq!(color.saturation, 0.5);
        }
        DrawCommand::Line { .. } => panic!("Particles only emit points"),
    }
}

#[test]
fn test_clear_retires_everything() {
    let tree = branch_tree();
    let mut particles = weightless();
    let a = particles.spawn_at_root(&tree);
    let b = particles.spawn(&tree, 4).unwrap();

    assert_eq!(particles.clear(), vec![a, b]);
    assert!(particles.is_empty());

    // Ids are never reused.
    let c = particles.spawn_at_root(&tree);
    assert!(c > b);
}

#[test]
fn test_spawn_on_unknown_node_is_rejected() {
    let tree = branch_tree();
    let mut particles = weightless();

    assert_eq!(particles.spawn(&tree, 99), None);
    assert!(particles.is_empty());
}

#[test]
fn test_invalid_config_falls_back_to_defaults() {
    let zero_life = ParticleConfig {
        max_life: 0.0,
        ..ParticleConfig::default()
    };
    assert_eq!(
        zero_life.validate(),
        Err(LSystemError::NonPositiveLifetime(0.0))
    );
    let nan_gravity = ParticleConfig {
        gravity: f32::NAN,
        ..ParticleConfig::default()
    };
    assert_eq!(
        nan_gravity.validate(),
        Err(LSystemError::NonFiniteParameter("gravity"))
    );

    let tree = branch_tree();
    let mut particles = ParticleSystem::new(zero_life);
    assert_eq!(particles.config(), &ParticleConfig::default());

    let id = particles.spawn(&tree, 1).unwrap();
    let p = particles.get(id).unwrap();
    assert!(p.velocity.is_finite());
    assert!(p.velocity.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), EPS));
}

#[test]
fn test_many_deaths_in_one_step_keep_survivors() {
    let tree = branch_tree();
    let mut particles = weightless();
    let dying: Vec<_> = (0..50).map(|_| particles.spawn(&tree, 3).unwrap()).collect();
    let survivor = particles.spawn(&tree, 1).unwrap();

    let report = particles.advance(&tree, 1.1);

    assert_eq!(report.died, dying);
    assert_eq!(report.spawned.len(), 1);
    assert_eq!(particles.len(), 2);
    assert_eq!(particles.particles()[0].id, survivor);
}
