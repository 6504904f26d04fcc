//! Gravity blocks: small cubes that fall, bounce off voxel terrain, knock
//! into each other and can be carried and thrown.
//!
//! # Module map
//!
//! - [`voxel`], [`voxel_collision`]: terrain storage and the solidity cache
//! - [`collision_geometry`]: boxes, rays and the terrain touch test
//! - [`physics_math`]: tunables and pure per-tick formulas
//! - [`hold`]: velocity history kept while a body is carried
//! - [`physics_body`]: one body and its tick
//! - [`registry`]: all bodies, the tick loop and spatial queries
//! - [`actor`], [`visual`], [`spawn`]: the seams to players, rendering and input
//! - [`tool`]: the grab/throw/delete stick
//! - [`config`]: JSON configuration
//! - [`plugin`]: bevy integration
//!
//! # Headless use
//!
//! ```ignore
//! use gravity_core::*;
//!
//! let mut registry = SimulationRegistry::with_default_config();
//! let mut visuals = VisualQueue::new();
//! let id = registry.spawn(SpawnRequest::parse(Vec3::new(0.0, 10.0, 0.0), "stone", 1.0)?, &mut visuals);
//! registry.tick(&terrain, &roster, &mut visuals);
//! ```

pub mod actor;
pub mod collision_geometry;
pub mod config;
pub mod hold;
pub mod physics_body;
pub mod physics_math;
pub mod plugin;
pub mod registry;
pub mod spawn;
pub mod tool;
pub mod visual;
pub mod voxel;
pub mod voxel_collision;

pub use actor::{Actor, ActorDirectory, ActorId, ActorRoster, Avatar};
pub use bevy::math::{IVec3, Vec3};
pub use collision_geometry::{box_touches_solid, Aabb};
pub use config::{load_config, save_config, ConfigError, ConfigResult, GravityBlocksConfig};
pub use hold::VelocityHistory;
pub use physics_body::{resolve_pair, BodyId, PhysicsBody};
pub use physics_math::{PhysicsConfig, HOLD_HISTORY_LEN};
pub use plugin::{
    apply_queued_tool_actions, tick_simulation, GravityBlocksPlugin, TerrainOccupancy, ToolQueue,
};
pub use registry::{GrabError, GrabResult, SimulationConfig, SimulationRegistry};
pub use spawn::{SpawnError, SpawnRequest, SpawnResult};
pub use tool::{apply_tool_action, ToolAction, ToolConfig, ToolOutcome};
pub use visual::{VisualCommand, VisualKind, VisualQueue, VisualSink};
pub use voxel::{SolidityQuery, Voxel, VoxelChunk, VoxelWorld, CHUNK_SIZE};
pub use voxel_collision::{ChunkOccupancy, WorldOccupancy};
