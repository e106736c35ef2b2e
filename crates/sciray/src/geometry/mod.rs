//! Geometric primitives and their grouping by material.
//!
//! Primitives are pure data. Each one contributes to the scene bounds
//! ([Primitive::extend_bounds]) and can be intersected through [Shape].

mod cone;
mod cylinder;
mod mesh;
mod sphere;

pub use cone::Cone;
pub use cylinder::Cylinder;
pub use mesh::TrianglesMesh;
pub use sphere::Sphere;

use indexmap::IndexMap;

use crate::{
    material::MaterialId,
    math::bounds::Bounds,
    ray::Ray,
    shape::{MinIntersectionResult, Shape, SurfaceIntersectionResult},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Sphere(Sphere),
    Cylinder(Cylinder),
    Cone(Cone),
    TrianglesMesh(TrianglesMesh),
}

/// Material id to the primitives of that material, in insertion order.
///
/// Iterating across materials follows the order in which each material was first
/// inserted.
pub type PrimitivesMap = IndexMap<MaterialId, Vec<Primitive>>;

impl Primitive {
    /// Merges this primitive's contribution into `bounds`: the center of a sphere,
    /// both end points of a cylinder or a cone, every vertex of a mesh.
    pub fn extend_bounds(&self, bounds: &mut Bounds) {
        match self {
            Primitive::Sphere(s) => bounds.merge_point(s.center),
            Primitive::Cylinder(c) => {
                bounds.merge_point(c.center);
                bounds.merge_point(c.up);
            }
            Primitive::Cone(c) => {
                bounds.merge_point(c.center);
                bounds.merge_point(c.up);
            }
            Primitive::TrianglesMesh(m) => {
                for v in &m.vertices {
                    bounds.merge_point(*v);
                }
            }
        }
    }

    pub fn timestamp(&self) -> f32 {
        match self {
            Primitive::Sphere(s) => s.timestamp,
            Primitive::Cylinder(c) => c.timestamp,
            Primitive::Cone(c) => c.timestamp,
            Primitive::TrianglesMesh(_) => 0.0,
        }
    }

    /// Scalar attached to the primitive, fed to the transfer function
    pub fn value(&self) -> f32 {
        match self {
            Primitive::Sphere(s) => s.value,
            Primitive::Cylinder(c) => c.value,
            Primitive::Cone(c) => c.value,
            Primitive::TrianglesMesh(_) => 0.0,
        }
    }

    pub fn as_shape(&self) -> &dyn Shape {
        match self {
            Primitive::Sphere(s) => s,
            Primitive::Cylinder(c) => c,
            Primitive::Cone(c) => c,
            Primitive::TrianglesMesh(m) => m,
        }
    }
}

impl Shape for Primitive {
    fn intersection_full(&self, ray: Ray) -> SurfaceIntersectionResult {
        self.as_shape().intersection_full(ray)
    }

    fn intersect_bare(&self, ray: Ray) -> MinIntersectionResult {
        self.as_shape().intersect_bare(ray)
    }

    fn bounding_box(&self) -> Bounds {
        self.as_shape().bounding_box()
    }
}

impl From<Sphere> for Primitive {
    fn from(value: Sphere) -> Self {
        Primitive::Sphere(value)
    }
}

impl From<Cylinder> for Primitive {
    fn from(value: Cylinder) -> Self {
        Primitive::Cylinder(value)
    }
}

impl From<Cone> for Primitive {
    fn from(value: Cone) -> Self {
        Primitive::Cone(value)
    }
}

impl From<TrianglesMesh> for Primitive {
    fn from(value: TrianglesMesh) -> Self {
        Primitive::TrianglesMesh(value)
    }
}

/// Bounds of every primitive contribution in `map`
pub fn primitives_bounds(map: &PrimitivesMap) -> Bounds {
    let mut bounds = Bounds::EMPTY;
    for primitive in map.values().flatten() {
        primitive.extend_bounds(&mut bounds);
    }
    bounds
}

/// Roots of `a t² + 2 b_half t + c`, smallest first
fn solve_quadratic(a: f32, b_half: f32, c: f32) -> Option<(f32, f32)> {
    if a.abs() < f32::EPSILON {
        if b_half.abs() < f32::EPSILON {
            return None;
        }
        let t = -c / (2.0 * b_half);
        return Some((t, t));
    }
    let discriminant_quarter = b_half * b_half - a * c;
    if discriminant_quarter < 0.0 {
        return None;
    }
    let sq = discriminant_quarter.sqrt();
    let ta = (-b_half - sq) / a;
    let tb = (-b_half + sq) / a;
    Some(if ta < tb { (ta, tb) } else { (tb, ta) })
}

/// First root in the ray range for which `accept` holds
fn first_root_in_range(ray: &Ray, roots: (f32, f32), accept: impl Fn(f32) -> bool) -> Option<f32> {
    let range = ray.range();
    [roots.0, roots.1]
        .into_iter()
        .find(|t| range.contains(t) && accept(*t))
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn sphere_at(center: Vec3) -> Primitive {
        Sphere::new(center, 0.5).into()
    }

    #[test]
    fn bounds_of_sphere_centers() {
        let mut map = PrimitivesMap::new();
        map.entry(MaterialId::user(0, 10)).or_default().extend([
            sphere_at(Vec3::new(0.0, 0.0, 0.0)),
            sphere_at(Vec3::new(1.0, 2.0, 3.0)),
        ]);
        map.entry(MaterialId::user(1, 10))
            .or_default()
            .push(sphere_at(Vec3::new(-1.0, 0.0, 5.0)));

        let bounds = primitives_bounds(&map);
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn cylinders_and_cones_contribute_both_ends() {
        let mut bounds = Bounds::EMPTY;
        Primitive::from(Cylinder::new(Vec3::ZERO, Vec3::new(0.0, 4.0, 0.0), 1.0))
            .extend_bounds(&mut bounds);
        Primitive::from(Cone::new(Vec3::new(-2.0, 0.0, 0.0), Vec3::ZERO, 1.0, 0.0))
            .extend_bounds(&mut bounds);
        assert_eq!(bounds.min, Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn quadratic_roots_are_sorted() {
        let (a, b) = solve_quadratic(1.0, 0.0, -4.0).unwrap();
        assert_eq!((a, b), (-2.0, 2.0));
        assert!(solve_quadratic(1.0, 0.0, 4.0).is_none());
    }
}
