use std::ops::Range;

use glam::Vec3;

use crate::ray::Ray;

/// Axis Aligned Bounding Box
///
/// An empty box has `min = +inf` and `max = -inf` so that merging any point
/// into it yields a degenerate box around that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds {
    pub const EMPTY: Self = Self {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_iter<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut bounds = Self::EMPTY;
        for p in points {
            bounds.merge_point(p);
        }
        bounds
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Componentwise min/max with `point`
    pub fn merge_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn merge(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Grow the box by `margin` in every direction
    pub fn padded(&self, margin: f32) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        0.5 * (self.min + self.max)
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        self.max - self.min
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test, returns the parametric range of `ray` inside the box
    pub fn ray_intersect(&self, ray: &Ray) -> Option<Range<f32>> {
        if self.is_empty() {
            return None;
        }
        let inv_dir = ray.direction.recip();
        let t0 = (self.min - ray.origin) * inv_dir;
        let t1 = (self.max - ray.origin) * inv_dir;

        // NaN appears for a zero direction component with the origin on a slab, min/max drop it
        let t_min = t0.min(t1).max_element().max(ray.bounds.0);
        let t_max = t0.max(t1).min_element().min(ray.bounds.1);

        if t_min > t_max {
            None
        } else {
            Some(t_min..t_max)
        }
    }
}
