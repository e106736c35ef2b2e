use glam::Vec3;

use super::{first_root_in_range, solve_quadratic};
use crate::{
    math::bounds::Bounds,
    ray::Ray,
    shape::{
        local_info, IntersectionResult, MinIntersectionResult, RayIntersection, Shape,
        SurfaceIntersectionResult,
    },
};

/// Open truncated cone, radius goes linearly from `center_radius` at `center` to
/// `up_radius` at `up`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    pub center: Vec3,
    pub up: Vec3,
    pub center_radius: f32,
    pub up_radius: f32,
    pub timestamp: f32,
    pub value: f32,
}

impl Cone {
    pub fn new(center: Vec3, up: Vec3, center_radius: f32, up_radius: f32) -> Self {
        Self {
            center,
            up,
            center_radius,
            up_radius,
            timestamp: 0.0,
            value: 0.0,
        }
    }

    pub fn with_value(mut self, timestamp: f32, value: f32) -> Self {
        self.timestamp = timestamp;
        self.value = value;
        self
    }

    fn frustum(&self) -> Frustum {
        Frustum {
            base: self.center,
            apex: self.up,
            base_radius: self.center_radius,
            apex_radius: self.up_radius,
        }
    }
}

pub(super) struct Frustum {
    pub base: Vec3,
    pub apex: Vec3,
    pub base_radius: f32,
    pub apex_radius: f32,
}

impl Frustum {
    pub fn bounds(&self) -> Bounds {
        let r = Vec3::splat(self.base_radius.abs().max(self.apex_radius.abs()));
        let mut bounds = Bounds::from_points(self.base - r, self.base + r);
        bounds.merge(&Bounds::from_points(self.apex - r, self.apex + r));
        bounds
    }
}

/// Side surface of a truncated cone, a cylinder when both radii match
pub(super) fn intersect_frustum(frustum: &Frustum, ray: &Ray) -> SurfaceIntersectionResult {
    let axis = frustum.apex - frustum.base;
    let height = axis.length();
    if height <= f32::EPSILON {
        return IntersectionResult::NoIntersection;
    }
    let d = axis / height;
    let slope = (frustum.apex_radius - frustum.base_radius) / height;

    let oc = ray.origin - frustum.base;
    let s0 = oc.dot(d);
    let sv = ray.direction.dot(d);
    let oc_perp = oc - s0 * d;
    let v_perp = ray.direction - sv * d;

    // |oc_perp + t v_perp|² = (r0 + slope (s0 + t sv))²
    let ra = frustum.base_radius + slope * s0;
    let rb = slope * sv;
    let a = v_perp.length_squared() - rb * rb;
    let b_half = oc_perp.dot(v_perp) - ra * rb;
    let c = oc_perp.length_squared() - ra * ra;

    let Some(roots) = solve_quadratic(a, b_half, c) else {
        return IntersectionResult::NoIntersection;
    };
    let axial = |t: f32| s0 + t * sv;
    let Some(t) = first_root_in_range(ray, roots, |t| {
        let s = axial(t);
        (0.0..=height).contains(&s) && frustum.base_radius + slope * s >= 0.0
    }) else {
        return IntersectionResult::NoIntersection;
    };

    let pos = ray.at(t);
    let s = axial(t);
    let radial = (oc_perp + t * v_perp).normalize_or_zero();
    let normal = (radial - slope * d).normalize_or_zero();

    let (tangent, bitangent) = d.any_orthonormal_pair();
    let angle = f32::atan2(radial.dot(bitangent), radial.dot(tangent));
    let u = 0.5 + angle / std::f32::consts::TAU;

    IntersectionResult::Intersection(RayIntersection {
        t,
        local_info: local_info::Surface {
            pos,
            normal,
            uv: [u, s / height],
        },
    })
}

impl Shape for Cone {
    fn intersection_full(&self, ray: Ray) -> SurfaceIntersectionResult {
        intersect_frustum(&self.frustum(), &ray)
    }

    fn intersect_bare(&self, ray: Ray) -> MinIntersectionResult {
        intersect_frustum(&self.frustum(), &ray).map(|surface| local_info::Minimum { pos: surface.pos })
    }

    fn bounding_box(&self) -> Bounds {
        self.frustum().bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_depends_on_local_radius() {
        // Radius 2 at y = 0 down to 0 at y = 2
        let cone = Cone::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 2.0, -5.0), 2.0, 0.0);

        let low = Ray::new(Vec3::new(0.0, 0.5, 0.0), -Vec3::Z);
        let t = cone.intersect_bare(low).t().unwrap();
        assert!((t - 3.5).abs() < 1e-3, "{t}");

        let high = Ray::new(Vec3::new(0.0, 1.5, 0.0), -Vec3::Z);
        let t = cone.intersect_bare(high).t().unwrap();
        assert!((t - 4.5).abs() < 1e-3, "{t}");
    }

    #[test]
    fn normals_lean_towards_the_narrow_end() {
        let cone = Cone::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 2.0, -5.0), 2.0, 0.0);
        let IntersectionResult::Intersection(hit) =
            cone.intersection_full(Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Z))
        else {
            panic!("expected a hit");
        };
        assert!(hit.local_info.normal.y > 0.0);
        assert!(hit.local_info.normal.z > 0.0);
    }
}
