use bevy::prelude::*;
use thiserror::Error;

/// Upper bound on the number of points a single galaxy may hold.
pub const MAX_POINT_COUNT: u32 = 20_000;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("point count must be in 1..={max}, got {0}", max = MAX_POINT_COUNT)]
    InvalidCount(u32),
    #[error("galaxy needs at least one branch, got {0}")]
    InvalidBranches(u32),
    #[error("{0} must be positive, got {1}")]
    NonPositive(&'static str, f32),
    #[error("{0} must not be negative, got {1}")]
    Negative(&'static str, f32),
    #[error("{0} must be finite")]
    NonFinite(&'static str),
    #[error("invalid hex color {0:?}")]
    InvalidColor(String),
}

/// Parameters of one galaxy generation pass.
///
/// `generation` is bumped by [`GalaxyConfigPlugin`] whenever the rest of the config is
/// committed with a different value; it is not read by the generator itself.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct GalaxyConfig {
    pub generation: i32,

    pub count: u32,
    pub point_size: f32,
    pub radius: f32,
    pub branches: u32,
    pub spin: f32,
    pub randomness: f32,
    pub randomness_power: f32,

    pub inside_color: LinearRgba,
    pub outside_color: LinearRgba,

    /// Fixed seed for reproducible galaxies, thread rng otherwise
    pub seed: Option<u64>,
}

impl Default for GalaxyConfig {
    fn default() -> Self {
        Self {
            generation: 0,
            count: 1000,
            point_size: 0.02,
            radius: 4.0,
            branches: 3,
            spin: 1.0,
            randomness: 0.2,
            randomness_power: 3.0,
            inside_color: LinearRgba::WHITE,
            // #1b3984
            outside_color: LinearRgba::from(Srgba::rgb_u8(0x1b, 0x39, 0x84)),
            seed: None,
        }
    }
}

/// Slider ranges for the numeric fields. Colors are free-form and carry no range.
pub struct ConfigRange {
    pub count: u32,
    pub point_size: f32,
    pub radius: f32,
    pub branches: u32,
    pub spin: f32,
    pub randomness: f32,
    pub randomness_power: f32,
}

impl GalaxyConfig {
    pub const MIN: ConfigRange = ConfigRange {
        count: 10,
        point_size: 0.01,
        radius: 0.02,
        branches: 2,
        spin: -5.0,
        randomness: 0.0,
        randomness_power: 1.0,
    };
    pub const MAX: ConfigRange = ConfigRange {
        count: 2000,
        point_size: 0.1,
        radius: 10.0,
        branches: 8,
        spin: 5.0,
        randomness: 2.0,
        randomness_power: 10.0,
    };
    pub const STEP: ConfigRange = ConfigRange {
        count: 100,
        point_size: 0.01,
        radius: 0.1,
        branches: 1,
        spin: 1.0,
        randomness: 0.01,
        randomness_power: 0.01,
    };

    /// Replaces both colors from `#rrggbb` style strings (sRGB, converted to linear).
    pub fn with_colors_hex(mut self, inside: &str, outside: &str) -> Result<Self, ConfigError> {
        self.inside_color = parse_hex_color(inside)?;
        self.outside_color = parse_hex_color(outside)?;
        Ok(self)
    }

    /// Checks the invariants the generator relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 || self.count > MAX_POINT_COUNT {
            return Err(ConfigError::InvalidCount(self.count));
        }
        if self.branches == 0 {
            return Err(ConfigError::InvalidBranches(self.branches));
        }

        let scalars = [
            ("point_size", self.point_size),
            ("radius", self.radius),
            ("spin", self.spin),
            ("randomness", self.randomness),
            ("randomness_power", self.randomness_power),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name));
            }
        }
        for (name, color) in [
            ("inside_color", self.inside_color),
            ("outside_color", self.outside_color),
        ] {
            let components = [color.red, color.green, color.blue, color.alpha];
            if !components.iter().all(|c| c.is_finite()) {
                return Err(ConfigError::NonFinite(name));
            }
        }

        if self.radius <= 0.0 {
            return Err(ConfigError::NonPositive("radius", self.radius));
        }
        if self.point_size <= 0.0 {
            return Err(ConfigError::NonPositive("point_size", self.point_size));
        }
        if self.randomness_power <= 0.0 {
            return Err(ConfigError::NonPositive(
                "randomness_power",
                self.randomness_power,
            ));
        }
        if self.randomness < 0.0 {
            return Err(ConfigError::Negative("randomness", self.randomness));
        }
        Ok(())
    }

    /// Everything except the change counter, which never affects the output.
    fn same_parameters(&self, other: &GalaxyConfig) -> bool {
        GalaxyConfig {
            generation: other.generation,
            ..self.clone()
        } == *other
    }
}

fn parse_hex_color(hex: &str) -> Result<LinearRgba, ConfigError> {
    Srgba::hex(hex)
        .map(LinearRgba::from)
        .map_err(|_| ConfigError::InvalidColor(hex.to_string()))
}

/// Last committed config, used to tell real edits apart from no-op writes.
#[derive(Resource)]
struct GalaxyConfigOld(GalaxyConfig);

impl Default for GalaxyConfigOld {
    fn default() -> Self {
        Self(GalaxyConfig {
            generation: -1,
            ..default()
        })
    }
}

pub struct GalaxyConfigPlugin;

impl Plugin for GalaxyConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GalaxyConfig>()
            .init_resource::<GalaxyConfigOld>()
            .add_systems(PreUpdate, commit_config_changes);
    }
}

fn commit_config_changes(
    mut galaxy_config_old: ResMut<GalaxyConfigOld>,
    mut galaxy_config: ResMut<GalaxyConfig>,
) {
    if !galaxy_config.is_changed() {
        return;
    }
    // the very first pass always commits so the startup galaxy gets built
    if galaxy_config_old.0.generation >= 0 && galaxy_config.same_parameters(&galaxy_config_old.0)
    {
        return;
    }
    galaxy_config.generation = galaxy_config_old.0.generation + 1;
    galaxy_config_old.0 = galaxy_config.clone();
}
