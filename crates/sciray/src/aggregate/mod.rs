//! Acceleration structures over the committed primitives.

use crate::{
    geometry::{Primitive, PrimitivesMap},
    material::{MaterialId, SystemMaterial},
    math::bounds::Bounds,
    ray::Ray,
    shape::{
        local_info, FullIntersectionResult, IntersectionResult, MinIntersectionResult,
        RayIntersection, Shape,
    },
};

pub trait Aggregate: Send + Sync {
    /// Closest hit along `ray`
    fn intersection_full(&self, ray: Ray) -> FullIntersectionResult;

    /// Closest hit along `ray`, without surface information
    fn intersect_bare(&self, ray: Ray) -> MinIntersectionResult;

    /// Every hit along `ray`, sorted front to back
    fn all_intersections(&self, ray: Ray) -> Vec<RayIntersection<local_info::Full>>;

    fn bounds(&self) -> Bounds;

    fn occluded(&self, ray: Ray) -> bool {
        self.intersect_bare(ray).is_intersection()
    }
}

struct Entry {
    /// Position in commit order, invisible primitives included
    index: usize,
    material: MaterialId,
    bounds: Bounds,
    primitive: Primitive,
}

/// Flat list of primitives with a per primitive bounding box test.
///
/// Primitives are numbered in commit order: materials in first insertion order,
/// then primitives in bucket order. Primitives using the invisible system material
/// are left out.
#[derive(Default)]
pub struct PrimitiveList {
    entries: Vec<Entry>,
    bounds: Bounds,
}

impl PrimitiveList {
    pub fn build(primitives: &PrimitivesMap) -> Self {
        let invisible = SystemMaterial::Invisible.id();
        let entries: Vec<Entry> = primitives
            .iter()
            .flat_map(|(material, bucket)| bucket.iter().map(move |p| (*material, p)))
            .enumerate()
            .filter(|(_, (material, _))| *material != invisible)
            .map(|(index, (material, primitive))| Entry {
                index,
                material,
                bounds: primitive.bounding_box(),
                primitive: primitive.clone(),
            })
            .collect();

        let mut bounds = Bounds::EMPTY;
        for entry in &entries {
            bounds.merge(&entry.bounds);
        }
        log::debug!("built primitive list of {} primitives", entries.len());
        Self { entries, bounds }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn candidates(&self, ray: Ray) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(move |entry| entry.bounds.ray_intersect(&ray).is_some())
    }
}

impl Aggregate for PrimitiveList {
    fn intersection_full(&self, mut ray: Ray) -> FullIntersectionResult {
        if self.bounds.ray_intersect(&ray).is_none() {
            return IntersectionResult::NoIntersection;
        }
        let mut res = IntersectionResult::NoIntersection;
        for entry in self.candidates(ray) {
            if ray.range().is_empty() {
                break;
            }
            if let IntersectionResult::Intersection(hit) = entry.primitive.intersection_full(ray) {
                ray.bounds.1 = hit.t;
                res = IntersectionResult::Intersection(RayIntersection {
                    t: hit.t,
                    local_info: local_info::Full::from_surface(
                        hit.local_info,
                        entry.material,
                        entry.index,
                    ),
                });
            }
        }
        res
    }

    fn intersect_bare(&self, mut ray: Ray) -> MinIntersectionResult {
        if self.bounds.ray_intersect(&ray).is_none() {
            return IntersectionResult::NoIntersection;
        }
        let mut res = IntersectionResult::NoIntersection;
        for entry in self.candidates(ray) {
            if let IntersectionResult::Intersection(hit) = entry.primitive.intersect_bare(ray) {
                ray.bounds.1 = hit.t;
                res = IntersectionResult::Intersection(hit);
            }
        }
        res
    }

    fn all_intersections(&self, ray: Ray) -> Vec<RayIntersection<local_info::Full>> {
        let mut hits: Vec<_> = self
            .candidates(ray)
            .filter_map(|entry| {
                entry
                    .primitive
                    .intersection_full(ray)
                    .map(|surface| {
                        local_info::Full::from_surface(surface, entry.material, entry.index)
                    })
                    .into_option()
            })
            .collect();
        hits.sort_by(|a, b| a.t.total_cmp(&b.t));
        hits
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::geometry::Sphere;

    fn scene() -> PrimitivesMap {
        let mut map = PrimitivesMap::new();
        map.entry(SystemMaterial::Invisible.id())
            .or_default()
            .push(Sphere::new(Vec3::new(0.0, 0.0, -2.0), 0.5).into());
        map.entry(MaterialId::user(1, 10))
            .or_default()
            .push(Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0).into());
        map.entry(MaterialId::user(2, 10))
            .or_default()
            .push(Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0).into());
        map
    }

    #[test]
    fn closest_hit_carries_material_and_index() {
        let list = PrimitiveList::build(&scene());
        assert_eq!(list.len(), 2);
        let hit = list
            .intersection_full(Ray::new(Vec3::ZERO, -Vec3::Z))
            .into_option()
            .unwrap();
        assert!((hit.t - 4.0).abs() < 1e-4);
        assert_eq!(hit.local_info.material, MaterialId::user(2, 10));
        assert_eq!(hit.local_info.primitive, 2);
    }

    #[test]
    fn all_hits_are_sorted() {
        let list = PrimitiveList::build(&scene());
        let hits = list.all_intersections(Ray::new(Vec3::ZERO, -Vec3::Z));
        let ts: Vec<f32> = hits.iter().map(|h| h.t).collect();
        assert_eq!(ts.len(), 2);
        assert!(ts[0] < ts[1]);
        assert!(!list.occluded(Ray::new(Vec3::ZERO, Vec3::Z)));
    }
}
