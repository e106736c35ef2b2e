use crate::{color::Rgb, ray::Ray, Ctx};

use super::{Integrator, RayResult};

/// Accumulated opacity past which compositing stops
const OPAQUE: f32 = 0.99;

/// Front to back alpha compositing of every primitive along the ray
#[derive(Debug, Default, Clone, Copy)]
pub struct ParticleIntegrator;

impl Integrator for ParticleIntegrator {
    fn ray_cast(&self, ctx: &mut Ctx, ray: Ray, _depth: u32) -> RayResult {
        let world = ctx.world;
        let hits = world.aggregate.all_intersections(ray);
        crate::counter!("particle hits", hits.len());

        let mut color = Rgb::default();
        let mut alpha = 0.0f32;
        for hit in &hits {
            let info = hit.local_info;
            let material = world.material(info.material);
            let mut sample_color = world.surface_color(material, info.uv);
            let mut sample_alpha = material.opacity;
            if let Some(tf) = &world.transfer_function {
                let sample = tf.evaluate(world.primitive_value(info.primitive));
                sample_color = sample_color * sample.color;
                sample_alpha *= sample.alpha;
            }
            sample_color += material.emission * sample_color;

            let weight = (1.0 - alpha) * sample_alpha.clamp(0.0, 1.0);
            color += weight * sample_color;
            alpha += weight;
            if alpha >= OPAQUE {
                break;
            }
        }

        let z = hits.first().map_or(f32::INFINITY, |hit| hit.t);
        if alpha < OPAQUE {
            let sky = self.sky_ray(ctx, ray);
            color += (1.0 - alpha) * sky.color;
        }
        RayResult {
            color,
            alpha: 1.0,
            z,
        }
    }
}
