use super::galaxy_state::{GalaxyState, PointCloudBackend};
use super::{GalaxyConfig, PointCloud};
use bevy::{
    asset::RenderAssetUsages,
    prelude::*,
    render::mesh::{Indices, PrimitiveTopology},
};
use rand::prelude::*;

pub struct SpawnPointsPlugin;

impl Plugin for SpawnPointsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(PointSpawningControl { generation: -1 })
            .init_resource::<GalaxyState<GalaxyPoints>>()
            .add_systems(Update, manage_galaxy_points)
            .add_systems(Last, release_galaxy_on_exit);
    }
}

#[derive(Resource)]
pub struct PointSpawningControl {
    generation: i32,
}

/// Marks the entity drawing the current galaxy.
#[derive(Component)]
pub struct GalaxyPointsMarker {
    pub count: usize,
}

/// Renderer resources of one installed galaxy.
#[derive(Debug, Clone, PartialEq)]
pub struct GalaxyPoints {
    pub entity: Entity,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

/// Installs galaxies into the ECS world: one sprite mesh, one material, one entity.
pub struct SceneBackend<'a, 'w, 's> {
    pub commands: &'a mut Commands<'w, 's>,
    pub meshes: &'a mut Assets<Mesh>,
    pub materials: &'a mut Assets<StandardMaterial>,
}

/// Three crossed unit quads, so every point keeps its area from any view direction.
const SPRITE_CORNERS: [Vec3; 12] = [
    // xy
    Vec3::new(-1.0, -1.0, 0.0),
    Vec3::new(1.0, -1.0, 0.0),
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(-1.0, 1.0, 0.0),
    // yz
    Vec3::new(0.0, -1.0, -1.0),
    Vec3::new(0.0, 1.0, -1.0),
    Vec3::new(0.0, 1.0, 1.0),
    Vec3::new(0.0, -1.0, 1.0),
    // xz
    Vec3::new(-1.0, 0.0, -1.0),
    Vec3::new(1.0, 0.0, -1.0),
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(-1.0, 0.0, 1.0),
];

const SPRITE_INDICES: [u32; 18] = [
    0, 1, 2, 0, 2, 3, //
    4, 5, 6, 4, 6, 7, //
    8, 9, 10, 8, 10, 11,
];

/// Expands every point into a sprite `point_size` world units across, tinted with the
/// point color. Sizes are in world space, so sprites shrink with distance.
pub fn point_cloud_mesh(cloud: &PointCloud, point_size: f32) -> Mesh {
    let half_size = point_size * 0.5;
    let vertex_count = cloud.count() * SPRITE_CORNERS.len();

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
    // the color attribute wants rgba
    let mut colors: Vec<[f32; 4]> = Vec::with_capacity(vertex_count);
    let mut indices: Vec<u32> = Vec::with_capacity(cloud.count() * SPRITE_INDICES.len());

    for (index, (center, &[r, g, b])) in cloud
        .position_triples()
        .iter()
        .zip(cloud.color_triples())
        .enumerate()
    {
        let center = Vec3::from_array(*center);
        let base = (index * SPRITE_CORNERS.len()) as u32;

        positions.extend(
            SPRITE_CORNERS
                .iter()
                .map(|corner| (center + *corner * half_size).to_array()),
        );
        colors.extend(std::iter::repeat_n([r, g, b, 1.0], SPRITE_CORNERS.len()));
        indices.extend(SPRITE_INDICES.iter().map(|i| base + i));
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::RENDER_WORLD)
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
        .with_inserted_indices(Indices::U32(indices))
}

fn point_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::WHITE,
        unlit: true,
        alpha_mode: AlphaMode::Add,
        double_sided: true,
        cull_mode: None,
        ..default()
    }
}

impl PointCloudBackend for SceneBackend<'_, '_, '_> {
    type Handle = GalaxyPoints;

    fn allocate(&mut self, cloud: PointCloud, point_size: f32) -> GalaxyPoints {
        let mesh = self.meshes.add(point_cloud_mesh(&cloud, point_size));
        let material = self.materials.add(point_material());
        let entity = self
            .commands
            .spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::IDENTITY,
                GalaxyPointsMarker {
                    count: cloud.count(),
                },
            ))
            .id();
        GalaxyPoints {
            entity,
            mesh,
            material,
        }
    }

    fn release(&mut self, handle: GalaxyPoints) {
        debug!("Releasing galaxy points {:?}", handle.entity);
        if self.meshes.remove(&handle.mesh).is_none() {
            panic!("galaxy mesh {:?} was already released", handle.mesh);
        }
        if self.materials.remove(&handle.material).is_none() {
            panic!("galaxy material {:?} was already released", handle.material);
        }
        self.commands.entity(handle.entity).despawn();
    }
}

/// Rebuilds the galaxy whenever a new config generation has been committed.
fn manage_galaxy_points(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    galaxy_config: Res<GalaxyConfig>,
    mut control: ResMut<PointSpawningControl>,
    mut state: ResMut<GalaxyState<GalaxyPoints>>,
) {
    if control.generation == galaxy_config.generation {
        return;
    }
    // a rejected config is not retried until the next edit
    control.generation = galaxy_config.generation;

    let mut backend = SceneBackend {
        commands: &mut commands,
        meshes: &mut meshes,
        materials: &mut materials,
    };
    let result = match galaxy_config.seed {
        Some(seed) => state.regenerate(
            &galaxy_config,
            &mut backend,
            &mut StdRng::seed_from_u64(seed),
        ),
        None => state.regenerate(&galaxy_config, &mut backend, &mut rand::rng()),
    };

    match result {
        Ok(points) => info!(
            "Galaxy config updated, generated {} points ({:?})",
            galaxy_config.count, points.entity
        ),
        Err(err) => warn!("Keeping previous galaxy, config rejected: {err}"),
    }
}

fn release_galaxy_on_exit(
    mut exit_events: EventReader<AppExit>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut state: ResMut<GalaxyState<GalaxyPoints>>,
) {
    if exit_events.read().next().is_none() {
        return;
    }
    state.clear(&mut SceneBackend {
        commands: &mut commands,
        meshes: &mut meshes,
        materials: &mut materials,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::{generate, random::SequenceRandom, GalaxyPlugin};
    use bevy::ecs::world::CommandQueue;
    use bevy::render::mesh::VertexAttributeValues;

    fn small_cloud(count: u32) -> PointCloud {
        let config = GalaxyConfig {
            count,
            ..default()
        };
        generate(&config, &mut SequenceRandom::new([0.25, 0.75, 0.4])).unwrap()
    }

    fn mesh_positions(mesh: &Mesh) -> &[[f32; 3]] {
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("missing positions");
        };
        positions
    }

    #[test]
    fn sprites_surround_each_point_at_the_configured_size() {
        let cloud = small_cloud(4);
        let point_size = 0.08;
        let mesh = point_cloud_mesh(&cloud, point_size);

        assert_eq!(mesh.primitive_topology(), PrimitiveTopology::TriangleList);
        assert_eq!(mesh.count_vertices(), 4 * SPRITE_CORNERS.len());
        let Some(Indices::U32(indices)) = mesh.indices() else {
            panic!("missing indices");
        };
        assert_eq!(indices.len(), 4 * SPRITE_INDICES.len());
        assert!(indices.iter().all(|&i| (i as usize) < mesh.count_vertices()));

        let positions = mesh_positions(&mesh);
        for (index, corners) in positions.chunks(SPRITE_CORNERS.len()).enumerate() {
            let center = cloud.position(index);
            let mut reach: f32 = 0.0;
            let mut sum = Vec3::ZERO;
            for corner in corners {
                let offset = Vec3::from_array(*corner) - center;
                reach = reach.max(offset.abs().max_element());
                sum += Vec3::from_array(*corner);
            }
            assert!((reach - point_size * 0.5).abs() < 1e-5);
            assert!((sum / corners.len() as f32 - center).length() < 1e-5);
        }
    }

    #[test]
    fn point_size_changes_sprite_extent() {
        let cloud = small_cloud(1);
        let extent = |point_size: f32| {
            let mesh = point_cloud_mesh(&cloud, point_size);
            let xs = mesh_positions(&mesh).iter().map(|p| p[0]);
            let (min, max) = xs.fold((f32::MAX, f32::MIN), |(lo, hi), x| (lo.min(x), hi.max(x)));
            max - min
        };
        assert!((extent(0.02) - 0.02).abs() < 1e-5);
        assert!((extent(0.1) - 0.1).abs() < 1e-5);
    }

    #[test]
    fn sprite_vertices_carry_opaque_point_colors() {
        let cloud = small_cloud(3);
        let mesh = point_cloud_mesh(&cloud, 0.05);
        let Some(VertexAttributeValues::Float32x4(colors)) = mesh.attribute(Mesh::ATTRIBUTE_COLOR)
        else {
            panic!("missing colors");
        };
        for (rgbas, rgb) in colors
            .chunks(SPRITE_CORNERS.len())
            .zip(cloud.color_triples())
        {
            for rgba in rgbas {
                assert_eq!(&rgba[..3], rgb);
                assert_eq!(rgba[3], 1.0);
            }
        }
    }

    fn count_markers(world: &mut World) -> usize {
        world.query::<&GalaxyPointsMarker>().iter(world).count()
    }

    #[test]
    fn release_frees_assets_and_despawns() {
        let mut world = World::new();
        let mut queue = CommandQueue::default();
        let mut meshes = Assets::<Mesh>::default();
        let mut materials = Assets::<StandardMaterial>::default();

        let points = {
            let mut commands = Commands::new(&mut queue, &world);
            let mut backend = SceneBackend {
                commands: &mut commands,
                meshes: &mut meshes,
                materials: &mut materials,
            };
            backend.allocate(small_cloud(8), 0.05)
        };
        queue.apply(&mut world);
        assert_eq!(meshes.len(), 1);
        assert_eq!(materials.len(), 1);
        assert_eq!(count_markers(&mut world), 1);

        {
            let mut commands = Commands::new(&mut queue, &world);
            let mut backend = SceneBackend {
                commands: &mut commands,
                meshes: &mut meshes,
                materials: &mut materials,
            };
            backend.release(points);
        }
        queue.apply(&mut world);
        assert_eq!(meshes.len(), 0);
        assert_eq!(materials.len(), 0);
        assert_eq!(count_markers(&mut world), 0);
    }

    #[test]
    #[should_panic(expected = "already released")]
    fn releasing_twice_panics() {
        let world = World::new();
        let mut queue = CommandQueue::default();
        let mut meshes = Assets::<Mesh>::default();
        let mut materials = Assets::<StandardMaterial>::default();
        let mut commands = Commands::new(&mut queue, &world);
        let mut backend = SceneBackend {
            commands: &mut commands,
            meshes: &mut meshes,
            materials: &mut materials,
        };

        let points = backend.allocate(small_cloud(8), 0.05);
        backend.release(points.clone());
        backend.release(points);
    }

    fn galaxy_app() -> App {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .add_plugins(GalaxyPlugin);
        app
    }

    fn live_resources(app: &mut App) -> (usize, usize, usize) {
        let markers = count_markers(app.world_mut());
        let world = app.world();
        (
            world.resource::<Assets<Mesh>>().len(),
            world.resource::<Assets<StandardMaterial>>().len(),
            markers,
        )
    }

    #[test]
    fn committed_edits_keep_one_live_galaxy() {
        let mut app = galaxy_app();

        app.update();
        assert_eq!(live_resources(&mut app), (1, 1, 1));

        for edit in 0..5u32 {
            app.world_mut().resource_mut::<GalaxyConfig>().count = 100 + edit * 50;
            app.update();
            assert_eq!(live_resources(&mut app), (1, 1, 1));

            let world = app.world_mut();
            let count = world
                .query::<&GalaxyPointsMarker>()
                .single(world)
                .unwrap()
                .count;
            assert_eq!(count, (100 + edit * 50) as usize);
        }
        let state = app.world().resource::<GalaxyState<GalaxyPoints>>();
        assert_eq!(state.installs(), 6);

        // rejected edits leave the installed galaxy alone
        app.world_mut().resource_mut::<GalaxyConfig>().radius = -1.0;
        app.update();
        assert_eq!(live_resources(&mut app), (1, 1, 1));
        let state = app.world().resource::<GalaxyState<GalaxyPoints>>();
        assert_eq!(state.installs(), 6);
    }

    #[test]
    fn app_exit_releases_the_galaxy() {
        let mut app = galaxy_app();
        app.update();
        assert_eq!(live_resources(&mut app), (1, 1, 1));

        app.world_mut().send_event(AppExit::Success);
        app.update();
        assert_eq!(live_resources(&mut app), (0, 0, 0));
        assert!(!app
            .world()
            .resource::<GalaxyState<GalaxyPoints>>()
            .is_installed());
    }
}
