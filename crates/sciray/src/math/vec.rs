pub use glam::Vec3;

pub trait RefrReflVecExt: Sized {
    fn refract(self, normal: Vec3, eta: f32) -> Option<Self>;
    fn reflect(self, normal: Vec3) -> Self;
}

impl RefrReflVecExt for Vec3 {
    fn reflect(self, normal: Vec3) -> Vec3 {
        self - (2.0 * self.dot(normal) * normal)
    }

    /// `eta` is the ratio of the indices of refraction (incoming over outgoing).
    ///
    /// `normal` must face against `self`. Returns `None` on total internal reflection.
    fn refract(self, normal: Vec3, eta: f32) -> Option<Vec3> {
        let cosi = -self.dot(normal);
        if cosi < 0.0 {
            crate::warn_once!("refraction: normal and incoming direction point the same way");
        }

        let k = 1.0 - eta * eta * (1.0 - cosi * cosi);
        if k < 0.0 {
            None
        } else {
            Some(eta * self + (eta * cosi - k.sqrt()) * normal)
        }
    }
}

pub trait Vec3SameDirExt {
    fn same_direction(self, other: Self) -> Self;
}

impl Vec3SameDirExt for Vec3 {
    /// Returns self if self and other point in the same general direction, -self otherwise
    fn same_direction(self, other: Self) -> Self {
        if self.dot(other) > 0.0 {
            self
        } else {
            -self
        }
    }
}

/// Orthonormal frame around a normal, used to map hemisphere samples to world space
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub t: Vec3,
    pub b: Vec3,
    pub n: Vec3,
}

impl Frame {
    pub fn from_normal(n: Vec3) -> Self {
        let (t, b) = n.any_orthonormal_pair();
        Self { t, b, n }
    }

    /// Local `z` is the normal
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        local.x * self.t + local.y * self.b + local.z * self.n
    }
}
