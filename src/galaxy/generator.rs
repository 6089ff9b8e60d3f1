use super::random::RandomSource;
use super::{ConfigError, GalaxyConfig, PointCloud};
use bevy::color::Mix;
use bevy::prelude::*;
use rand::prelude::*;
use rayon::prelude::*;
use std::f32::consts::TAU;

/// Random draws for one point, taken before any geometry is computed so the
/// draw order stays fixed regardless of how the math is scheduled.
#[derive(Clone, Copy)]
struct PointSample {
    radius: f32,
    offset: Vec3,
}

fn sample_offset_axis(config: &GalaxyConfig, rng: &mut impl RandomSource) -> f32 {
    // higher powers pull most offsets towards the arm center line
    let magnitude = rng.unit().powf(config.randomness_power) * config.randomness;
    magnitude * rng.sign()
}

fn sample_point(config: &GalaxyConfig, rng: &mut impl RandomSource) -> PointSample {
    // Plain uniform radius, so points crowd towards the core
    let radius = rng.unit() * config.radius;
    let x = sample_offset_axis(config, rng);
    let y = sample_offset_axis(config, rng);
    let z = sample_offset_axis(config, rng);
    PointSample {
        radius,
        offset: vec3(x, y, z),
    }
}

/// Angle of the arm point `index` belongs to. Arms are handed out round-robin.
pub fn branch_angle(index: usize, branches: u32) -> f32 {
    let branches = branches as usize;
    (index % branches) as f32 / branches as f32 * TAU
}

/// Builds the spiral point cloud described by `config`.
///
/// Draws seven values per point from `rng`, in point order: the radius, then a
/// magnitude and a sign for each of x, y and z.
pub fn generate(
    config: &GalaxyConfig,
    rng: &mut impl RandomSource,
) -> Result<PointCloud, ConfigError> {
    config.validate()?;

    let count = config.count as usize;
    let samples: Vec<PointSample> = (0..count).map(|_| sample_point(config, rng)).collect();

    let mut positions = vec![0.0; count * PointCloud::COMPONENTS];
    let mut colors = vec![0.0; count * PointCloud::COMPONENTS];

    positions
        .par_chunks_mut(PointCloud::COMPONENTS)
        .zip(colors.par_chunks_mut(PointCloud::COMPONENTS))
        .zip(samples.par_iter())
        .enumerate()
        .for_each(|(index, ((position, color), sample))| {
            let spin_angle = sample.radius * config.spin;
            let angle = branch_angle(index, config.branches) + spin_angle;

            position[0] = angle.cos() * sample.radius + sample.offset.x;
            position[1] = sample.offset.y;
            position[2] = angle.sin() * sample.radius + sample.offset.z;

            let t = sample.radius / config.radius;
            let mixed = config.inside_color.mix(&config.outside_color, t);
            color.copy_from_slice(&[mixed.red, mixed.green, mixed.blue]);
        });

    Ok(PointCloud::from_buffers(positions, colors))
}

/// [`generate`] with a seeded rng when `config.seed` is set, the thread rng otherwise.
pub fn generate_seeded(config: &GalaxyConfig) -> Result<PointCloud, ConfigError> {
    match config.seed {
        Some(seed) => generate(config, &mut StdRng::seed_from_u64(seed)),
        None => generate(config, &mut rand::rng()),
    }
}
