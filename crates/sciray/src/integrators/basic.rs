use rand::prelude::Distribution;

use crate::{
    color::Rgb,
    math::{
        distributions::{CosineHemisphere3, UniformUnitSphere3},
        vec::{Frame, RefrReflVecExt, Vec3, Vec3SameDirExt},
    },
    parameters::ShadingType,
    ray::Ray,
    shape::IntersectionResult,
    Ctx,
};

use super::{Integrator, RayResult};

/// Whitted style shading: direct lighting with shadows and ambient occlusion,
/// mirror reflection and refraction through transparent materials
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicIntegrator;

impl BasicIntegrator {
    fn shade(
        &self,
        ctx: &mut Ctx,
        ray: &Ray,
        pos: Vec3,
        normal: Vec3,
        base: Rgb,
        specular: (Rgb, f32),
    ) -> Rgb {
        let world = ctx.world;
        let params = &world.parameters;
        match params.shading {
            ShadingType::None => base,
            ShadingType::Electron => {
                let facing = normal.dot(-ray.direction).abs();
                (1.0 - facing) * base
            }
            ShadingType::Diffuse => {
                let origin = pos + params.epsilon * normal;
                let mut color = 0.1 * base;
                let mut lit = false;
                for light in &world.lights {
                    let Some(sample) = light.sample(origin) else {
                        continue;
                    };
                    let cos = normal.dot(sample.direction);
                    if cos <= 0.0 {
                        continue;
                    }
                    lit = true;
                    let visibility = if params.shadows > 0.0 {
                        let jitter: Vec3 = UniformUnitSphere3.sample(&mut ctx.rng);
                        let direction = sample.direction + params.soft_shadows * jitter;
                        let shadow_ray = Ray::spawn(origin, direction, sample.distance);
                        if world.aggregate.occluded(shadow_ray) {
                            1.0 - params.shadows
                        } else {
                            1.0
                        }
                    } else {
                        1.0
                    };
                    let (specular_color, exponent) = specular;
                    let highlight = (-sample.direction)
                        .reflect(normal)
                        .dot(-ray.direction)
                        .max(0.0)
                        .powf(exponent.max(1.0));
                    color += visibility
                        * (sample.radiance * (cos * base + highlight * specular_color));
                }
                if !lit && world.lights.is_empty() {
                    // Head light
                    color = normal.dot(-ray.direction).max(0.0) * base;
                }
                color
            }
        }
    }

    fn ambient_occlusion(&self, ctx: &mut Ctx, pos: Vec3, normal: Vec3) -> f32 {
        let params = &ctx.world.parameters;
        if params.ambient_occlusion <= 0.0 {
            return 1.0;
        }
        let local: Vec3 = CosineHemisphere3.sample(&mut ctx.rng);
        let direction = Frame::from_normal(normal).to_world(local);
        let probe = Ray::spawn(
            pos + params.epsilon * normal,
            direction,
            params.ambient_occlusion_distance,
        );
        if ctx.world.aggregate.occluded(probe) {
            1.0 - params.ambient_occlusion
        } else {
            1.0
        }
    }
}

impl Integrator for BasicIntegrator {
    fn ray_cast(&self, ctx: &mut Ctx, ray: Ray, depth: u32) -> RayResult {
        let world = ctx.world;
        if depth > world.parameters.max_ray_depth {
            return RayResult::default();
        }
        crate::counter!("basic rays");

        let IntersectionResult::Intersection(record) = world.aggregate.intersection_full(ray)
        else {
            return self.sky_ray(ctx, ray);
        };
        let info = record.local_info;
        let material = world.material(info.material);
        let base = world.surface_color(material, info.uv);
        let normal = info.normal.same_direction(-ray.direction);
        let entering = info.normal.dot(ray.direction) < 0.0;

        let mut color = self.shade(
            ctx,
            &ray,
            info.pos,
            normal,
            base,
            (material.specular, material.specular_exponent),
        );
        color = self.ambient_occlusion(ctx, info.pos, normal) * color;
        color += material.emission * base;

        let epsilon = world.parameters.epsilon;
        if material.reflection_index > 0.0 {
            let reflected = Ray::spawn(
                info.pos + epsilon * normal,
                ray.direction.reflect(normal),
                f32::INFINITY,
            );
            let bounce = self.ray_cast(ctx, reflected, depth + 1);
            color = color.lerp(bounce.color, material.reflection_index.min(1.0));
        }

        if material.opacity < 1.0 {
            let eta = if entering {
                1.0 / material.refraction_index.max(f32::EPSILON)
            } else {
                material.refraction_index
            };
            let through = ray
                .direction
                .refract(normal, eta)
                .unwrap_or(ray.direction.reflect(normal));
            // Offset to the side the ray leaves through
            let side = if through.dot(normal) < 0.0 { -1.0 } else { 1.0 };
            let transmitted =
                Ray::spawn(info.pos + side * epsilon * normal, through, f32::INFINITY);
            let behind = self.ray_cast(ctx, transmitted, depth + 1);
            color = behind.color.lerp(color, material.opacity.max(0.0));
        }

        RayResult {
            color,
            alpha: 1.0,
            z: record.t,
        }
    }
}
