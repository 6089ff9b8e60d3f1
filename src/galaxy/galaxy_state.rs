use super::random::RandomSource;
use super::{generate, ConfigError, GalaxyConfig, PointCloud};
use bevy::prelude::*;

/// Renderer side of a galaxy: turns a [`PointCloud`] into live resources and frees them.
///
/// `release` consumes the handle, so a handle can only ever be released once. Backends
/// should panic if asked to free resources they no longer hold, since that can only
/// happen through a lifecycle bug.
pub trait PointCloudBackend {
    type Handle;

    /// Creates the buffers and material for `cloud` and adds the drawable to the scene.
    fn allocate(&mut self, cloud: PointCloud, point_size: f32) -> Self::Handle;

    /// Frees buffers and material and removes the drawable from the scene.
    fn release(&mut self, handle: Self::Handle);
}

/// Holds the one installed galaxy. Replacing it always frees the old resources first.
#[derive(Resource)]
pub struct GalaxyState<H: Send + Sync + 'static> {
    active: Option<H>,
    installs: u32,
}

impl<H: Send + Sync + 'static> Default for GalaxyState<H> {
    fn default() -> Self {
        Self {
            active: None,
            installs: 0,
        }
    }
}

impl<H: Send + Sync + 'static> GalaxyState<H> {
    pub fn active(&self) -> Option<&H> {
        self.active.as_ref()
    }

    pub fn is_installed(&self) -> bool {
        self.active.is_some()
    }

    /// Number of galaxies installed over the lifetime of this state.
    pub fn installs(&self) -> u32 {
        self.installs
    }

    /// Generates a galaxy for `config` and makes it the active one.
    ///
    /// On a config error nothing is released and the current galaxy stays installed.
    pub fn regenerate<B>(
        &mut self,
        config: &GalaxyConfig,
        backend: &mut B,
        rng: &mut impl RandomSource,
    ) -> Result<&H, ConfigError>
    where
        B: PointCloudBackend<Handle = H>,
    {
        let cloud = generate(config, rng)?;

        if let Some(old) = self.active.take() {
            backend.release(old);
        }
        let handle = backend.allocate(cloud, config.point_size);
        self.installs += 1;
        Ok(self.active.insert(handle))
    }

    /// Releases the installed galaxy, if any. Used at scene teardown.
    pub fn clear<B>(&mut self, backend: &mut B)
    where
        B: PointCloudBackend<Handle = H>,
    {
        if let Some(old) = self.active.take() {
            backend.release(old);
        }
    }
}
