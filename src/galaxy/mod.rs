use bevy::prelude::*;

mod galaxy_config;
mod galaxy_state;
mod generator;
mod point_cloud;
pub mod random;
mod spawn_points;

pub use galaxy_config::{
    ConfigError, ConfigRange, GalaxyConfig, GalaxyConfigPlugin, MAX_POINT_COUNT,
};
pub use galaxy_state::{GalaxyState, PointCloudBackend};
pub use generator::{branch_angle, generate, generate_seeded};
pub use point_cloud::{BufferLayout, PointCloud};
pub use random::{RandomSource, SequenceRandom};
pub use spawn_points::{
    point_cloud_mesh, GalaxyPoints, GalaxyPointsMarker, SceneBackend, SpawnPointsPlugin,
};

/// Config tracking plus the point spawner; everything a scene needs to show a galaxy.
pub struct GalaxyPlugin;

impl Plugin for GalaxyPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((GalaxyConfigPlugin, SpawnPointsPlugin));
    }
}
