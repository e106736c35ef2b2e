use glam::{Mat4, Quat, Vec3};

/// Placement of imported geometry: rotation, then scale, then translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
    pub rot: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        scale: Vec3::ONE,
        rot: Quat::IDENTITY,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rot, self.translation)
    }

    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        self.scale * self.rot.mul_vec3(p) + self.translation
    }

    /// Normals ignore translation and use the inverse scale
    pub fn apply_normal(&self, n: Vec3) -> Vec3 {
        (self.rot.mul_vec3(n) / self.scale).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_and_matrix_agree() {
        let t = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            scale: Vec3::splat(2.0),
            rot: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        };
        let p = Vec3::new(1.0, 0.0, 0.0);
        let a = t.apply_point(p);
        let b = t.matrix().transform_point3(p);
        assert!((a - b).length() < 1e-5);
    }
}
