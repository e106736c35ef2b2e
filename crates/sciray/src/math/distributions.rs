use std::ops::Deref;

use rand::{distributions::Uniform, prelude::Distribution, Rng};

use super::vec::Vec3;

/// Samples are expected to be in [0;1[^N
pub struct Samples<const N: usize>(pub [f32; N]);

impl<const N: usize> Deref for Samples<N> {
    type Target = [f32; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub trait Samplable<T, const N: usize> {
    fn sample_with(&self, samples: Samples<N>) -> T;
}

fn uniform_samples<const N: usize, R: Rng + ?Sized>(rng: &mut R) -> Samples<N> {
    let uniform = Uniform::new(0., 1.);
    Samples(std::array::from_fn(|_| uniform.sample(rng)))
}

/// Uniform point on the unit disk, used for lens sampling
pub struct UniformUnitBall2;

impl Samplable<[f32; 2], 2> for UniformUnitBall2 {
    fn sample_with(&self, samples: Samples<2>) -> [f32; 2] {
        let phi = std::f32::consts::TAU * samples[0];
        let r = samples[1].sqrt();
        let (s, c) = f32::sin_cos(phi);
        [r * c, r * s]
    }
}

impl Distribution<[f32; 2]> for UniformUnitBall2 {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> [f32; 2] {
        self.sample_with(uniform_samples(rng))
    }
}

/// Uniform direction on the unit sphere
pub struct UniformUnitSphere3;

impl Samplable<Vec3, 2> for UniformUnitSphere3 {
    fn sample_with(&self, samples: Samples<2>) -> Vec3 {
        let z = 1.0 - 2.0 * samples[0];
        let r = f32::sqrt(f32::max(0.0, 1.0 - z * z));
        let (s, c) = f32::sin_cos(std::f32::consts::TAU * samples[1]);
        Vec3::new(r * c, r * s, z)
    }
}

impl Distribution<Vec3> for UniformUnitSphere3 {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        self.sample_with(uniform_samples(rng))
    }
}

/// Cosine weighted direction around +Z
pub struct CosineHemisphere3;

impl Samplable<Vec3, 2> for CosineHemisphere3 {
    fn sample_with(&self, samples: Samples<2>) -> Vec3 {
        let [x, y] = UniformUnitBall2.sample_with(samples);
        let z = f32::sqrt(f32::max(0.0, 1.0 - x * x - y * y));
        Vec3::new(x, y, z)
    }
}

impl Distribution<Vec3> for CosineHemisphere3 {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        self.sample_with(uniform_samples(rng))
    }
}

/// Maps a direction to equirectangular texture coordinates
pub fn sphere_uv_from_direction(direction: Vec3) -> [f32; 2] {
    let d = direction.normalize_or_zero();
    let u = 0.5 + f32::atan2(d.x, -d.z) / std::f32::consts::TAU;
    let v = f32::acos(d.y.clamp(-1.0, 1.0)) / std::f32::consts::PI;
    [u, v]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hemisphere_samples_are_unit_and_up() {
        for (a, b) in [(0.0, 0.0), (0.3, 0.9), (0.99, 0.5)] {
            let v = CosineHemisphere3.sample_with(Samples([a, b]));
            assert!(v.z >= 0.0);
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_uv_poles() {
        let [_, v] = sphere_uv_from_direction(Vec3::Y);
        assert!(v.abs() < 1e-5);
        let [_, v] = sphere_uv_from_direction(-Vec3::Y);
        assert!((v - 1.0).abs() < 1e-5);
    }
}
