//! Bevy integration.
//!
//! `GravityBlocksPlugin` registers the simulation as ECS resources and runs
//! it in `FixedUpdate`:
//!
//! ```text
//! FixedUpdate
//!   apply_queued_tool_actions   ToolQueue ─▶ SimulationRegistry
//!   tick_simulation             TerrainOccupancy + ActorRoster ─▶ SimulationRegistry ─▶ VisualQueue
//! ```
//!
//! Input handlers never touch the registry mid-tick. They push into
//! `ToolQueue` and the queued actions run at the start of the next fixed step.

use bevy::prelude::*;

use crate::actor::{Actor, ActorId, ActorRoster};
use crate::config::GravityBlocksConfig;
use crate::registry::SimulationRegistry;
use crate::tool::{apply_tool_action, ToolAction, ToolConfig, ToolOutcome};
use crate::visual::VisualQueue;
use crate::voxel::VoxelWorld;
use crate::voxel_collision::WorldOccupancy;

/// Terrain solidity used for body collision.
///
/// Empty by default. The application fills it once the terrain is built.
#[derive(Resource, Default)]
pub struct TerrainOccupancy {
    /// The world occupancy data for terrain collision queries.
    pub occupancy: WorldOccupancy,
}

impl TerrainOccupancy {
    /// Create terrain occupancy from a VoxelWorld.
    pub fn from_voxel_world(world: &VoxelWorld) -> Self {
        Self {
            occupancy: WorldOccupancy::from_voxel_world(world),
        }
    }
}

/// Stick actions waiting for the next fixed step, and what they did.
#[derive(Resource, Debug, Default)]
pub struct ToolQueue {
    pending: Vec<(ActorId, ToolAction)>,
    outcomes: Vec<(ActorId, ToolOutcome)>,
}

impl ToolQueue {
    pub fn push(&mut self, actor: ActorId, action: ToolAction) {
        self.pending.push((actor, action));
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Take the outcomes of applied actions, oldest first.
    pub fn drain_outcomes(&mut self) -> Vec<(ActorId, ToolOutcome)> {
        std::mem::take(&mut self.outcomes)
    }
}

/// Gravity blocks simulation plugin.
#[derive(Default)]
pub struct GravityBlocksPlugin {
    pub config: GravityBlocksConfig,
}

impl GravityBlocksPlugin {
    pub fn with_config(config: GravityBlocksConfig) -> Self {
        Self { config }
    }
}

impl Plugin for GravityBlocksPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SimulationRegistry::new(
            self.config.physics.clone(),
            self.config.simulation.clone(),
        ))
        .insert_resource(self.config.tool.clone())
        .init_resource::<TerrainOccupancy>()
        .init_resource::<ActorRoster>()
        .init_resource::<VisualQueue>()
        .init_resource::<ToolQueue>()
        .add_systems(
            FixedUpdate,
            (apply_queued_tool_actions, tick_simulation).chain(),
        );
    }
}

/// Apply queued stick actions in the order they arrived.
///
/// Actions from unknown or offline actors are dropped.
pub fn apply_queued_tool_actions(
    mut queue: ResMut<ToolQueue>,
    mut registry: ResMut<SimulationRegistry>,
    mut visuals: ResMut<VisualQueue>,
    roster: Res<ActorRoster>,
    tool_config: Res<ToolConfig>,
) {
    let pending = std::mem::take(&mut queue.pending);
    for (actor_id, action) in pending {
        let Some(actor) = roster.get(actor_id).filter(|avatar| avatar.is_online()) else {
            bevy::log::warn!("Dropping {:?} from unavailable {}", action, actor_id);
            continue;
        };
        let outcome = apply_tool_action(&mut registry, actor, action, &tool_config, &mut *visuals);
        bevy::log::debug!("{} {:?} -> {:?}", actor_id, action, outcome);
        queue.outcomes.push((actor_id, outcome));
    }
}

/// Advance the simulation by one tick.
pub fn tick_simulation(
    mut registry: ResMut<SimulationRegistry>,
    mut visuals: ResMut<VisualQueue>,
    terrain: Res<TerrainOccupancy>,
    roster: Res<ActorRoster>,
) {
    registry.tick(&terrain.occupancy, &*roster, &mut *visuals);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Avatar;
    use crate::spawn::SpawnRequest;
    use crate::visual::{VisualCommand, VisualKind};
    use crate::voxel::Voxel;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(GravityBlocksPlugin::default());
        app
    }

    #[test]
    fn test_plugin_registers_resources() {
        let app = test_app();
        let world = app.world();

        assert!(world.contains_resource::<SimulationRegistry>());
        assert!(world.contains_resource::<TerrainOccupancy>());
        assert!(world.contains_resource::<ActorRoster>());
        assert!(world.contains_resource::<VisualQueue>());
        assert!(world.contains_resource::<ToolQueue>());
        assert_eq!(world.resource::<ToolConfig>(), &ToolConfig::default());
    }

    #[test]
    fn test_terrain_from_voxel_world() {
        let mut world = VoxelWorld::new();
        world.fill_box(IVec3::new(0, 0, 0), IVec3::new(5, 0, 5), Voxel::solid(100, 100, 100));
        world.set_voxel(0, 1, 0, Voxel::passable(0, 200, 0));

        let terrain = TerrainOccupancy::from_voxel_world(&world);

        assert!(terrain.occupancy.get_voxel(IVec3::new(0, 0, 0)));
        assert!(terrain.occupancy.get_voxel(IVec3::new(5, 0, 5)));
        assert!(!terrain.occupancy.get_voxel(IVec3::new(0, 1, 0)));
    }

    #[test]
    fn test_fixed_update_ticks_registry() {
        let mut app = test_app();
        let kind = VisualKind::parse("stone").unwrap();
        let id = {
            let world = app.world_mut();
            world.resource_scope(|world, mut registry: Mut<SimulationRegistry>| {
                let mut visuals = world.resource_mut::<VisualQueue>();
                registry.spawn(
                    SpawnRequest::new(Vec3::new(0.0, 10.0, 0.0), kind, 1.0).unwrap(),
                    &mut *visuals,
                )
            })
        };

        for _ in 0..3 {
            app.world_mut().run_schedule(FixedUpdate);
        }

        let registry = app.world().resource::<SimulationRegistry>();
        assert_eq!(registry.tick_count(), 3);
        assert!(registry.body(id).unwrap().position.y < 10.0);

        let visuals = app.world_mut().resource_mut::<VisualQueue>().drain();
        let moves = visuals
            .iter()
            .filter(|c| matches!(c, VisualCommand::Move { .. }))
            .count();
        assert_eq!(moves, 3, "one move per tick while falling");
    }

    #[test]
    fn test_queued_actions_run_before_tick() {
        let mut app = test_app();
        let avatar = Avatar::new(ActorId(1), Vec3::ZERO);
        app.world_mut().resource_mut::<ActorRoster>().insert(avatar);

        let id = {
            let world = app.world_mut();
            world.resource_scope(|world, mut registry: Mut<SimulationRegistry>| {
                let mut visuals = world.resource_mut::<VisualQueue>();
                let kind = VisualKind::parse("stone").unwrap();
                registry.spawn(
                    SpawnRequest::new(Vec3::new(-0.5, 1.0, 5.0), kind, 1.0).unwrap(),
                    &mut *visuals,
                )
            })
        };

        {
            let mut queue = app.world_mut().resource_mut::<ToolQueue>();
            queue.push(ActorId(1), ToolAction::Primary);
            queue.push(ActorId(2), ToolAction::Secondary);
        }
        app.world_mut().run_schedule(FixedUpdate);

        let outcomes = app.world_mut().resource_mut::<ToolQueue>().drain_outcomes();
        assert_eq!(outcomes, vec![(ActorId(1), ToolOutcome::Grabbed(id))]);

        let registry = app.world().resource::<SimulationRegistry>();
        let body = registry.body(id).unwrap();
        assert!(body.is_held_by(ActorId(1)));
        assert_eq!(body.ticks_since_grabbed(), 1, "grab happened before the tick");
        assert_eq!(app.world().resource::<ToolQueue>().pending_len(), 0);
    }
}
