use bevy::prelude::*;

/// How a [`PointCloud`] lays out its buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferLayout {
    /// `f32` components per point, shared by positions and colors
    pub components: usize,
    pub count: usize,
}

impl BufferLayout {
    /// `f32`s in each of the position and color buffers.
    pub fn floats_per_buffer(&self) -> usize {
        self.components * self.count
    }
}

/// Generated galaxy points, stored point-major: `positions[3i..3i+3]` is `(x, y, z)`
/// of point `i` and `colors[3i..3i+3]` its linear `(r, g, b)`.
#[derive(Clone, Debug, PartialEq)]
pub struct PointCloud {
    positions: Vec<f32>,
    colors: Vec<f32>,
    count: usize,
}

impl PointCloud {
    pub const COMPONENTS: usize = 3;

    pub(crate) fn from_buffers(positions: Vec<f32>, colors: Vec<f32>) -> Self {
        debug_assert_eq!(positions.len(), colors.len());
        debug_assert_eq!(positions.len() % Self::COMPONENTS, 0);
        let count = positions.len() / Self::COMPONENTS;
        Self {
            positions,
            colors,
            count,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn layout(&self) -> BufferLayout {
        BufferLayout {
            components: Self::COMPONENTS,
            count: self.count,
        }
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_array(self.position_triples()[index])
    }

    pub fn color(&self, index: usize) -> LinearRgba {
        let [r, g, b] = self.color_triples()[index];
        LinearRgba::rgb(r, g, b)
    }

    /// Positions viewed as one `[x, y, z]` per point, without copying.
    pub fn position_triples(&self) -> &[[f32; 3]] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn color_triples(&self) -> &[[f32; 3]] {
        bytemuck::cast_slice(&self.colors)
    }
}
