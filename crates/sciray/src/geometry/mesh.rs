use glam::{UVec3, Vec3};

use crate::{
    math::bounds::Bounds,
    ray::Ray,
    shape::{
        local_info, IntersectionResult, MinIntersectionResult, RayIntersection, Shape,
        SurfaceIntersectionResult,
    },
};

/// Indexed triangle mesh. `normals` is either empty (face normals are used) or
/// has one normal per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrianglesMesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<UVec3>,
}

struct MollerTrumbore {
    u: f32,
    v: f32,
    t: f32,
}

impl MollerTrumbore {
    fn intersect(vertices: [Vec3; 3], ray: &Ray) -> Option<Self> {
        let e1 = vertices[1] - vertices[0];
        let e2 = vertices[2] - vertices[0];
        let p = ray.direction.cross(e2);
        let det = e1.dot(p);
        if det.abs() < 1e-8 {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = ray.origin - vertices[0];
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = ray.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(q) * inv_det;
        ray.range().contains(&t).then_some(Self { u, v, t })
    }
}

impl TrianglesMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Triangles whose indices are out of bounds are skipped
    fn triangle(&self, face: UVec3) -> Option<[Vec3; 3]> {
        Some([
            *self.vertices.get(face.x as usize)?,
            *self.vertices.get(face.y as usize)?,
            *self.vertices.get(face.z as usize)?,
        ])
    }

    fn closest(&self, ray: Ray) -> Option<(UVec3, [Vec3; 3], MollerTrumbore)> {
        let mut ray = ray;
        let mut closest = None;
        for &face in &self.indices {
            let Some(vertices) = self.triangle(face) else {
                crate::warn_once!("mesh has out of bounds indices");
                continue;
            };
            if let Some(hit) = MollerTrumbore::intersect(vertices, &ray) {
                ray.bounds.1 = hit.t;
                closest = Some((face, vertices, hit));
            }
        }
        closest
    }

    fn normal_at(&self, face: UVec3, vertices: [Vec3; 3], u: f32, v: f32) -> Vec3 {
        if self.normals.len() == self.vertices.len() {
            let w = 1.0 - u - v;
            let n = w * self.normals[face.x as usize]
                + u * self.normals[face.y as usize]
                + v * self.normals[face.z as usize];
            if let Some(n) = n.try_normalize() {
                return n;
            }
        }
        (vertices[1] - vertices[0])
            .cross(vertices[2] - vertices[0])
            .normalize_or_zero()
    }
}

impl Shape for TrianglesMesh {
    fn intersection_full(&self, ray: Ray) -> SurfaceIntersectionResult {
        let Some((face, vertices, MollerTrumbore { u, v, t })) = self.closest(ray) else {
            return IntersectionResult::NoIntersection;
        };
        IntersectionResult::Intersection(RayIntersection {
            t,
            local_info: local_info::Surface {
                pos: ray.at(t),
                normal: self.normal_at(face, vertices, u, v),
                uv: [u, v],
            },
        })
    }

    fn intersect_bare(&self, ray: Ray) -> MinIntersectionResult {
        match self.closest(ray) {
            Some((_, _, hit)) => IntersectionResult::Intersection(RayIntersection {
                t: hit.t,
                local_info: local_info::Minimum { pos: ray.at(hit.t) },
            }),
            None => IntersectionResult::NoIntersection,
        }
    }

    fn bounding_box(&self) -> Bounds {
        Bounds::from_iter(self.vertices.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TrianglesMesh {
        TrianglesMesh {
            vertices: vec![
                Vec3::new(-1.0, -1.0, -2.0),
                Vec3::new(1.0, -1.0, -2.0),
                Vec3::new(1.0, 1.0, -2.0),
                Vec3::new(-1.0, 1.0, -2.0),
            ],
            normals: vec![],
            indices: vec![UVec3::new(0, 1, 2), UVec3::new(0, 2, 3)],
        }
    }

    #[test]
    fn ray_hits_quad() {
        let IntersectionResult::Intersection(hit) =
            quad().intersection_full(Ray::new(Vec3::new(-0.5, 0.5, 0.0), -Vec3::Z))
        else {
            panic!("expected a hit");
        };
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!((hit.local_info.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn broken_indices_are_skipped() {
        let mut mesh = quad();
        mesh.indices.insert(0, UVec3::new(0, 1, 99));
        assert!(mesh
            .intersect_bare(Ray::new(Vec3::new(0.5, -0.5, 0.0), -Vec3::Z))
            .is_intersection());
    }
}
