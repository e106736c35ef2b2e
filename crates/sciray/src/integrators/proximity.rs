use rand::prelude::Distribution;

use crate::{
    math::{
        distributions::CosineHemisphere3,
        vec::{Frame, Vec3SameDirExt},
    },
    parameters::ShadingType,
    ray::Ray,
    shape::IntersectionResult,
    Ctx,
};

use super::{Integrator, RayResult};

/// Colors a hit by whether another primitive lies within the detection distance
#[derive(Debug, Default, Clone, Copy)]
pub struct ProximityIntegrator;

impl Integrator for ProximityIntegrator {
    fn ray_cast(&self, ctx: &mut Ctx, ray: Ray, _depth: u32) -> RayResult {
        let world = ctx.world;
        let params = &world.parameters;
        let IntersectionResult::Intersection(record) = world.aggregate.intersection_full(ray)
        else {
            return self.sky_ray(ctx, ray);
        };
        let info = record.local_info;
        let normal = info.normal.same_direction(-ray.direction);

        let local: glam::Vec3 = CosineHemisphere3.sample(&mut ctx.rng);
        let probe = Ray::spawn(
            info.pos + params.epsilon * normal,
            Frame::from_normal(normal).to_world(local),
            params.detection_distance,
        );
        let detected = match world.aggregate.intersection_full(probe) {
            IntersectionResult::Intersection(near) => {
                !params.detection_on_different_material
                    || near.local_info.material != info.material
            }
            IntersectionResult::NoIntersection => false,
        };

        let color = if detected {
            params.detection_near_color
        } else {
            params.detection_far_color
        };
        let shading = match params.shading {
            ShadingType::None => 1.0,
            ShadingType::Diffuse => normal.dot(-ray.direction).max(0.0),
            ShadingType::Electron => 1.0 - normal.dot(-ray.direction).abs(),
        };

        RayResult {
            color: shading * color,
            alpha: 1.0,
            z: record.t,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::{
        color::linear, geometry::Sphere, integrators::test_world::*, material::Material,
        parameters::RenderingParameters, scene::Scene,
    };

    fn enclosed(outer_material: usize, different_only: bool) -> RayResult {
        let mut scene: Scene = one_sphere();
        scene
            .set_material(id(1), Material::diffuse(linear::WHITE))
            .unwrap();
        scene.add_primitive(id(outer_material), Sphere::new(Vec3::ZERO, 20.0));
        let mut params = RenderingParameters::default()
            .shading(ShadingType::None)
            .detection_distance(100.0);
        params.detection_on_different_material = different_only;
        let world = world(&scene, params);
        let ray = center_ray(&world);
        ProximityIntegrator.ray_cast(&mut ctx(&world), ray, 0)
    }

    #[test]
    fn neighbour_of_another_material_is_near() {
        let res = enclosed(1, true);
        assert_eq!(res.color, RenderingParameters::default().detection_near_color);
        assert!((res.z - 4.0).abs() < 1e-3);
    }

    #[test]
    fn same_material_is_ignored_when_asked() {
        let res = enclosed(0, true);
        assert_eq!(res.color, RenderingParameters::default().detection_far_color);
        let res = enclosed(0, false);
        assert_eq!(res.color, RenderingParameters::default().detection_near_color);
    }

    #[test]
    fn nothing_around_is_far() {
        let scene = one_sphere();
        let params = RenderingParameters::default().shading(ShadingType::None);
        let world = world(&scene, params);
        let ray = center_ray(&world);
        let res = ProximityIntegrator.ray_cast(&mut ctx(&world), ray, 0);
        assert_eq!(res.color, RenderingParameters::default().detection_far_color);
    }
}
