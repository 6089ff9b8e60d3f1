pub use crate::galaxy::{
    generate, generate_seeded, ConfigError, GalaxyConfig, GalaxyPlugin, GalaxyState, PointCloud,
    PointCloudBackend, RandomSource,
};
