use glam::Vec3;

use super::{first_root_in_range, solve_quadratic};
use crate::{
    math::{bounds::Bounds, distributions::sphere_uv_from_direction},
    ray::Ray,
    shape::{
        local_info, IntersectionResult, MinIntersectionResult, RayIntersection, Shape,
        SurfaceIntersectionResult,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub timestamp: f32,
    pub value: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            timestamp: 0.0,
            value: 0.0,
        }
    }

    pub fn with_value(mut self, timestamp: f32, value: f32) -> Self {
        self.timestamp = timestamp;
        self.value = value;
        self
    }

    fn hit_t(&self, ray: &Ray) -> Option<f32> {
        let oc = ray.origin - self.center;
        let a = ray.direction.length_squared();
        let b_half = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;
        let roots = solve_quadratic(a, b_half, c)?;
        first_root_in_range(ray, roots, |_| true)
    }
}

impl Shape for Sphere {
    fn intersection_full(&self, ray: Ray) -> SurfaceIntersectionResult {
        let Some(t) = self.hit_t(&ray) else {
            return IntersectionResult::NoIntersection;
        };
        let pos = ray.at(t);
        let normal = (pos - self.center).normalize_or_zero();
        IntersectionResult::Intersection(RayIntersection {
            t,
            local_info: local_info::Surface {
                pos,
                normal,
                uv: sphere_uv_from_direction(normal),
            },
        })
    }

    fn intersect_bare(&self, ray: Ray) -> MinIntersectionResult {
        match self.hit_t(&ray) {
            Some(t) => IntersectionResult::Intersection(RayIntersection {
                t,
                local_info: local_info::Minimum { pos: ray.at(t) },
            }),
            None => IntersectionResult::NoIntersection,
        }
    }

    fn bounding_box(&self) -> Bounds {
        let r = Vec3::splat(self.radius.abs());
        Bounds::from_points(self.center - r, self.center + r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_from_outside_and_inside() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let IntersectionResult::Intersection(hit) = sphere.intersection_full(ray) else {
            panic!("expected a hit");
        };
        assert!((hit.t - 4.0).abs() < 1e-4);
        assert!((hit.local_info.normal - Vec3::Z).length() < 1e-4);

        let inside = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!((sphere.intersect_bare(inside).t().unwrap() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn miss() {
        let sphere = Sphere::new(Vec3::new(0.0, 3.0, -5.0), 1.0);
        assert!(!sphere
            .intersect_bare(Ray::new(Vec3::ZERO, -Vec3::Z))
            .is_intersection());
    }
}
