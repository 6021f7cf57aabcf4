use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Per-frame camera and lighting data.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameConstants {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
    pub ambient: [f32; 4],
    /// `[cols, rows, 0, 0]`
    pub grid: [u32; 4],
    /// `[cell spacing, total time, 0, 0]`
    pub params: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ObjectConstants {
    pub world: [[f32; 4]; 4],
}

impl ObjectConstants {
    pub fn from_world(world: Mat4) -> Self {
        Self {
            world: world.to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct MaterialConstants {
    pub albedo: [f32; 4],
    pub fresnel_r0: [f32; 4],
    /// `[shininess, 0, 0, 0]`
    pub params: [f32; 4],
}

impl MaterialConstants {
    pub fn water() -> Self {
        Self {
            albedo: [0.05, 0.25, 0.45, 1.0],
            fresnel_r0: [0.02, 0.02, 0.02, 0.0],
            params: [64.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Single directional light plus ambient.
pub struct Lighting {
    pub direction: Vec3,
    pub color: Vec3,
    pub ambient: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.4, -1.0, -0.3).normalize(),
            color: Vec3::new(1.0, 0.97, 0.9),
            ambient: Vec3::splat(0.25),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_wgsl_sizes() {
        assert_eq!(std::mem::size_of::<FrameConstants>(), 64 + 6 * 16);
        assert_eq!(std::mem::size_of::<ObjectConstants>(), 64);
        assert_eq!(std::mem::size_of::<MaterialConstants>(), 48);
    }

    #[test]
    fn world_matrix_is_column_major() {
        let c = ObjectConstants::from_world(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(c.world[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
