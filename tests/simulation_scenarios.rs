//! End-to-end scenarios driven through the bevy plugin.
//!
//! Each test builds an `App`, fills the terrain, then runs `FixedUpdate` by
//! hand one tick at a time.

use bevy::prelude::*;
use gravity_core::{
    save_config, ActorId, ActorRoster, Avatar, BodyId, GravityBlocksConfig, GravityBlocksPlugin,
    SimulationRegistry, SpawnRequest, TerrainOccupancy, ToolAction, ToolOutcome, ToolQueue,
    VisualCommand, VisualQueue, Voxel, VoxelWorld,
};
use tempfile::NamedTempFile;

const PLAYER: ActorId = ActorId(1);

/// App with a 40x40 stone floor whose top face is at y = 1.
fn arena_app(config: GravityBlocksConfig) -> App {
    let mut app = App::new();
    app.add_plugins(GravityBlocksPlugin::with_config(config));

    let mut world = VoxelWorld::new();
    world.fill_box(IVec3::new(-20, 0, -20), IVec3::new(19, 0, 19), Voxel::solid(128, 128, 128));
    app.insert_resource(TerrainOccupancy::from_voxel_world(&world));
    app
}

fn spawn(app: &mut App, position: Vec3, size: f32) -> BodyId {
    let request = SpawnRequest::parse(position, "stone", size).unwrap();
    app.world_mut()
        .resource_scope(|world, mut registry: Mut<SimulationRegistry>| {
            registry.spawn(request, &mut *world.resource_mut::<VisualQueue>())
        })
}

fn run_ticks(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

fn registry(app: &App) -> &SimulationRegistry {
    app.world().resource::<SimulationRegistry>()
}

fn push_action(app: &mut App, action: ToolAction) {
    app.world_mut()
        .resource_mut::<ToolQueue>()
        .push(PLAYER, action);
}

fn add_player(app: &mut App, position: Vec3, look: Vec3) {
    let mut avatar = Avatar::new(PLAYER, position);
    avatar.set_look_direction(look);
    app.world_mut().resource_mut::<ActorRoster>().insert(avatar);
}

#[test]
fn test_dropped_block_settles_on_floor() {
    let mut app = arena_app(GravityBlocksConfig::default());
    let id = spawn(&mut app, Vec3::new(0.5, 10.0, 0.5), 1.0);

    let mut bounced = false;
    for _ in 0..200 {
        run_ticks(&mut app, 1);
        let body = registry(&app).body(id).unwrap();
        bounced |= body.velocity.y > 0.0;
        assert!(body.position.y >= 1.0, "block sank into the floor: {}", body.position.y);
    }

    let body = registry(&app).body(id).unwrap();
    assert!(bounced, "block should bounce at least once");
    assert!(body.on_ground());
    assert_eq!(body.velocity.y, 0.0);
    assert!(body.position.y < 1.1, "resting height {}", body.position.y);

    // A resting block no longer produces visual moves.
    app.world_mut().resource_mut::<VisualQueue>().drain();
    run_ticks(&mut app, 5);
    assert!(app.world().resource::<VisualQueue>().is_empty());
}

#[test]
fn test_grab_carry_and_throw() {
    let mut app = arena_app(GravityBlocksConfig::default());
    add_player(&mut app, Vec3::new(0.5, 1.0, 0.5), Vec3::Z);
    let id = spawn(&mut app, Vec3::new(0.0, 2.0, 5.0), 1.0);

    push_action(&mut app, ToolAction::Primary);
    run_ticks(&mut app, 20);

    let outcomes = app.world_mut().resource_mut::<ToolQueue>().drain_outcomes();
    assert_eq!(outcomes, vec![(PLAYER, ToolOutcome::Grabbed(id))]);

    // Spring pulls the block to 3.5 blocks in front of the eyes.
    let hold_point = Vec3::new(0.5, 2.62, 4.0);
    let body = registry(&app).body(id).unwrap();
    assert!(body.is_held_by(PLAYER));
    assert!(
        body.position.distance(hold_point) < 0.2,
        "held at {} instead of {}",
        body.position,
        hold_point
    );

    app.world_mut()
        .resource_mut::<ActorRoster>()
        .get_mut(PLAYER)
        .unwrap()
        .set_look_direction(Vec3::X);
    push_action(&mut app, ToolAction::Secondary);
    run_ticks(&mut app, 1);

    let body = registry(&app).body(id).unwrap();
    assert!(!body.is_held());
    let config = registry(&app).physics_config();
    let expected_x = 1.5 * config.drag;
    assert!(
        (body.velocity.x - expected_x).abs() < 1e-5,
        "thrown along +x at {}",
        body.velocity.x
    );
}

#[test]
fn test_second_player_cannot_steal_held_block() {
    let mut app = arena_app(GravityBlocksConfig::default());
    add_player(&mut app, Vec3::new(0.5, 1.0, 0.5), Vec3::Z);
    let mut thief = Avatar::new(ActorId(2), Vec3::new(0.5, 1.0, 9.0));
    thief.set_look_direction(Vec3::NEG_Z);
    app.world_mut().resource_mut::<ActorRoster>().insert(thief);
    let id = spawn(&mut app, Vec3::new(0.0, 2.0, 5.0), 1.0);

    push_action(&mut app, ToolAction::Primary);
    run_ticks(&mut app, 1);
    app.world_mut()
        .resource_mut::<ToolQueue>()
        .push(ActorId(2), ToolAction::Primary);
    run_ticks(&mut app, 1);

    let outcomes = app.world_mut().resource_mut::<ToolQueue>().drain_outcomes();
    assert_eq!(
        outcomes,
        vec![
            (PLAYER, ToolOutcome::Grabbed(id)),
            (ActorId(2), ToolOutcome::AlreadyHeld(id)),
        ]
    );
    assert!(registry(&app).body(id).unwrap().is_held_by(PLAYER));
}

#[test]
fn test_block_drops_when_holder_disconnects() {
    let mut app = arena_app(GravityBlocksConfig::default());
    add_player(&mut app, Vec3::new(0.5, 1.0, 0.5), Vec3::Z);
    let id = spawn(&mut app, Vec3::new(0.0, 2.0, 5.0), 1.0);

    push_action(&mut app, ToolAction::Primary);
    run_ticks(&mut app, 10);
    assert!(registry(&app).body(id).unwrap().is_held());

    app.world_mut()
        .resource_mut::<ActorRoster>()
        .set_online(PLAYER, false);
    run_ticks(&mut app, 1);
    assert!(!registry(&app).body(id).unwrap().is_held());
    assert_eq!(registry(&app).find_held_by(PLAYER), None);

    run_ticks(&mut app, 200);
    let body = registry(&app).body(id).unwrap();
    assert!(body.on_ground(), "released block falls back to the floor");
}

#[test]
fn test_delete_targeted_block() {
    let mut app = arena_app(GravityBlocksConfig::default());
    add_player(&mut app, Vec3::new(0.5, 1.0, 0.5), Vec3::Z);
    let near = spawn(&mut app, Vec3::new(0.0, 2.0, 4.0), 1.0);
    let far = spawn(&mut app, Vec3::new(0.0, 2.0, 8.0), 1.0);
    app.world_mut().resource_mut::<VisualQueue>().drain();

    push_action(&mut app, ToolAction::Secondary);
    run_ticks(&mut app, 1);

    assert!(!registry(&app).contains(near));
    assert!(registry(&app).contains(far));
    let commands = app.world_mut().resource_mut::<VisualQueue>().drain();
    assert_eq!(commands.first(), Some(&VisualCommand::Despawn { id: near }));
}

#[test]
fn test_blocks_in_flight_bounce_apart() {
    let mut app = arena_app(GravityBlocksConfig::default());
    let a = spawn(&mut app, Vec3::new(-2.0, 8.0, 0.0), 1.0);
    let b = spawn(&mut app, Vec3::new(2.0, 8.0, 0.0), 1.0);
    {
        let mut registry = app.world_mut().resource_mut::<SimulationRegistry>();
        registry.body_mut(a).unwrap().velocity = Vec3::new(0.5, 0.0, 0.0);
        registry.body_mut(b).unwrap().velocity = Vec3::new(-0.5, 0.0, 0.0);
    }

    let mut collided = false;
    for _ in 0..10 {
        run_ticks(&mut app, 1);
        let registry = registry(&app);
        if registry.body(a).unwrap().velocity.x < 0.0 {
            collided = true;
            assert!(registry.body(b).unwrap().velocity.x > 0.0);
            break;
        }
    }
    assert!(collided, "blocks should meet and reverse");
}

#[test]
fn test_loaded_config_changes_behaviour() {
    let mut config = GravityBlocksConfig::default();
    config.physics.gravity = 0.0;
    config.physics.drag = 1.0;
    let temp_file = NamedTempFile::with_suffix(".json").unwrap();
    save_config(&config, temp_file.path()).unwrap();

    let loaded = gravity_core::load_config(temp_file.path()).unwrap();
    let mut app = arena_app(loaded);
    let id = spawn(&mut app, Vec3::new(0.0, 10.0, 0.0), 1.0);

    run_ticks(&mut app, 20);

    let body = registry(&app).body(id).unwrap();
    assert_eq!(body.position, Vec3::new(0.0, 10.0, 0.0), "weightless block floats");
}
