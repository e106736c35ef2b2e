use glam::Vec3;

use super::cone::{intersect_frustum, Frustum};
use crate::{
    math::bounds::Bounds,
    ray::Ray,
    shape::{
        local_info, IntersectionResult, MinIntersectionResult, RayIntersection, Shape,
        SurfaceIntersectionResult,
    },
};

/// Open cylinder going from `center` to `up`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    pub center: Vec3,
    pub up: Vec3,
    pub radius: f32,
    pub timestamp: f32,
    pub value: f32,
}

impl Cylinder {
    pub fn new(center: Vec3, up: Vec3, radius: f32) -> Self {
        Self {
            center,
            up,
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

    fn frustum(&self) -> Frustum {
        Frustum {
            base: self.center,
            apex: self.up,
            base_radius: self.radius,
            apex_radius: self.radius,
        }
    }
}

impl Shape for Cylinder {
    fn intersection_full(&self, ray: Ray) -> SurfaceIntersectionResult {
        intersect_frustum(&self.frustum(), &ray)
    }

    fn intersect_bare(&self, ray: Ray) -> MinIntersectionResult {
        match intersect_frustum(&self.frustum(), &ray) {
            IntersectionResult::Intersection(RayIntersection { t, local_info }) => {
                IntersectionResult::Intersection(RayIntersection {
                    t,
                    local_info: local_info::Minimum {
                        pos: local_info.pos,
                    },
                })
            }
            IntersectionResult::NoIntersection => IntersectionResult::NoIntersection,
        }
    }

    fn bounding_box(&self) -> Bounds {
        self.frustum().bounds()
    }
}
