//! Headless gravity blocks demo.
//!
//! Builds a small walled arena, spawns a handful of blocks in front of a
//! single avatar and drives the simulation at its fixed rate, grabbing,
//! throwing and deleting blocks through the stick.
//!
//! ```text
//! cargo run -- [config.json]
//! RUST_LOG=gravity_core=debug cargo run
//! ```

use bevy::log::LogPlugin;
use bevy::prelude::*;
use gravity_core::{
    load_config, ActorId, ActorRoster, Avatar, GravityBlocksConfig, GravityBlocksPlugin,
    SimulationRegistry, SpawnRequest, TerrainOccupancy, ToolAction, ToolConfig, ToolQueue,
    VisualCommand, VisualKind, VisualQueue, Voxel, VoxelWorld,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PLAYER: ActorId = ActorId(1);
const DEMO_TICKS: u32 = 240;
const ARENA_HALF_WIDTH: i32 = 16;

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => GravityBlocksConfig::default(),
    };

    let mut app = App::new();
    app.add_plugins(LogPlugin::default())
        .add_plugins(GravityBlocksPlugin::with_config(config))
        .add_systems(Startup, (setup_arena, spawn_blocks).chain());

    app.world_mut().run_schedule(Startup);

    for tick in 0..DEMO_TICKS {
        script_player(&mut app, tick);
        app.world_mut().run_schedule(FixedUpdate);
        report(&mut app, tick);
    }

    let count = app
        .world_mut()
        .resource_scope(|world, mut registry: Mut<SimulationRegistry>| {
            registry.clear(&mut *world.resource_mut::<VisualQueue>())
        });
    info!("Demo finished, cleaned up {} gravity block(s)", count);
}

/// Stone floor with a low wall around it and some grass the blocks fall
/// through.
fn setup_arena(mut commands: Commands, mut roster: ResMut<ActorRoster>) {
    let mut world = VoxelWorld::new();
    let stone = Voxel::solid(120, 120, 125);
    let h = ARENA_HALF_WIDTH;

    world.fill_box(IVec3::new(-h, 0, -h), IVec3::new(h - 1, 0, h - 1), stone);
    world.fill_box(IVec3::new(-h, 1, -h), IVec3::new(h - 1, 2, -h), stone);
    world.fill_box(IVec3::new(-h, 1, h - 1), IVec3::new(h - 1, 2, h - 1), stone);
    world.fill_box(IVec3::new(-h, 1, -h), IVec3::new(-h, 2, h - 1), stone);
    world.fill_box(IVec3::new(h - 1, 1, -h), IVec3::new(h - 1, 2, h - 1), stone);
    for x in (-6..6).step_by(3) {
        world.set_voxel(x, 1, 4, Voxel::passable(60, 170, 60));
    }

    info!(
        "Arena built: {} voxels in {} chunks",
        world.total_voxel_count(),
        world.chunk_count()
    );
    commands.insert_resource(TerrainOccupancy::from_voxel_world(&world));

    roster.insert(Avatar::new(PLAYER, Vec3::new(0.5, 1.0, 0.5)));
}

/// Blocks in a loose cluster in front of the player.
fn spawn_blocks(
    mut registry: ResMut<SimulationRegistry>,
    mut visuals: ResMut<VisualQueue>,
    roster: Res<ActorRoster>,
    tool: Res<ToolConfig>,
) {
    let Some(player) = roster.get(PLAYER) else {
        warn!("No player to spawn blocks for");
        return;
    };
    let mut rng = StdRng::seed_from_u64(7);

    for (i, name) in ["stone", "oak_planks", "gold_block", "glass", "tnt"]
        .iter()
        .enumerate()
    {
        let Ok(kind) = VisualKind::parse(name) else {
            continue;
        };
        let size = if i == 4 { 1.5 } else { tool.default_size };
        let distance = tool.spawn_distance + i as f32 * 1.5;
        let request = SpawnRequest::in_front_of(player, kind, size, distance).map(|r| {
            let jitter = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(2.0..5.0), 0.0);
            SpawnRequest::new(r.position() + jitter, r.kind().clone(), r.size())
        });
        match request {
            Ok(Ok(request)) => {
                registry.spawn(request, &mut *visuals);
            }
            Ok(Err(e)) | Err(e) => warn!("Rejected spawn of {}: {}", name, e),
        }
    }
}

/// Scripted input, as if a player were clicking the stick.
fn script_player(app: &mut App, tick: u32) {
    let world = app.world_mut();
    match tick {
        // Let everything land, then look down at the nearest block and grab it.
        60 => {
            aim_at_nearest(world);
            world.resource_mut::<ToolQueue>().push(PLAYER, ToolAction::Primary);
        }
        // Swing the held block around for a while.
        61..=100 => {
            if let Some(player) = world.resource_mut::<ActorRoster>().get_mut(PLAYER) {
                player.set_rotation((tick - 60) as f32 * 6.0, -10.0);
            }
        }
        101 => {
            world.resource_mut::<ToolQueue>().push(PLAYER, ToolAction::Secondary);
        }
        // Pick another block, carry it briefly and let go.
        160 => {
            aim_at_nearest(world);
            world.resource_mut::<ToolQueue>().push(PLAYER, ToolAction::Primary);
        }
        175 => {
            world.resource_mut::<ToolQueue>().push(PLAYER, ToolAction::Primary);
        }
        // Delete whatever is in front.
        200 => {
            aim_at_nearest(world);
            world.resource_mut::<ToolQueue>().push(PLAYER, ToolAction::Secondary);
        }
        _ => {}
    }
}

fn aim_at_nearest(world: &mut World) {
    let Some(eye) = world
        .resource::<ActorRoster>()
        .get(PLAYER)
        .map(|player| gravity_core::Actor::eye_position(player))
    else {
        return;
    };
    let nearest = world
        .resource::<SimulationRegistry>()
        .bodies()
        .map(|body| body.center())
        .min_by(|a, b| a.distance_squared(eye).total_cmp(&b.distance_squared(eye)));

    if let (Some(target), Some(player)) = (nearest, world.resource_mut::<ActorRoster>().get_mut(PLAYER)) {
        player.look_at(target);
    }
}

fn report(app: &mut App, tick: u32) {
    let world = app.world_mut();
    for (actor, outcome) in world.resource_mut::<ToolQueue>().drain_outcomes() {
        info!("tick {}: {} -> {:?}", tick, actor, outcome);
    }

    let commands = world.resource_mut::<VisualQueue>().drain();
    let moved = commands
        .iter()
        .filter(|c| matches!(c, VisualCommand::Move { .. }))
        .count();

    if tick % 40 == 0 {
        let registry = world.resource::<SimulationRegistry>();
        let resting = registry.bodies().filter(|body| body.on_ground()).count();
        info!(
            "tick {}: {} block(s), {} moved, {} resting",
            tick,
            registry.len(),
            moved,
            resting
        );
    }
}
