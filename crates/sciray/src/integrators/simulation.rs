use crate::{
    math::vec::Vec3SameDirExt, parameters::ShadingType, ray::Ray, shape::IntersectionResult, Ctx,
};

use super::{Integrator, RayResult};

/// Colors primitives through the transfer function applied to their simulation
/// value. Without a transfer function, the material color is used.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulationIntegrator;

impl Integrator for SimulationIntegrator {
    fn ray_cast(&self, ctx: &mut Ctx, ray: Ray, depth: u32) -> RayResult {
        let world = ctx.world;
        let params = &world.parameters;
        if depth > params.max_ray_depth {
            return RayResult::default();
        }
        let IntersectionResult::Intersection(record) = world.aggregate.intersection_full(ray)
        else {
            return self.sky_ray(ctx, ray);
        };
        let info = record.local_info;
        let material = world.material(info.material);
        let base = world.surface_color(material, info.uv);
        let normal = info.normal.same_direction(-ray.direction);

        let (mut color, alpha) = match &world.transfer_function {
            Some(tf) => {
                let sample = tf.evaluate(world.primitive_value(info.primitive));
                (base * sample.color + sample.emission * sample.color, sample.alpha)
            }
            None => (base, material.opacity),
        };

        color = match params.shading {
            ShadingType::None => color,
            ShadingType::Diffuse => normal.dot(-ray.direction).max(0.0) * color,
            ShadingType::Electron => (1.0 - normal.dot(-ray.direction).abs()) * color,
        };

        if alpha < 1.0 {
            let behind = self.ray_cast(
                ctx,
                Ray::spawn(info.pos - params.epsilon * normal, ray.direction, f32::INFINITY),
                depth + 1,
            );
            color = behind.color.lerp(color, alpha.max(0.0));
        }

        RayResult {
            color,
            alpha: 1.0,
            z: record.t,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::{
        color::linear,
        integrators::test_world::*,
        material::Material,
        parameters::RenderingParameters,
        scene::{
            simulation::{InMemorySimulation, TimestampMode},
            transfer_function::{TransferFunction, TransferFunctionAttribute},
        },
    };

    #[test]
    fn transfer_function_colors_by_value() {
        let mut scene = one_sphere();
        scene
            .set_material(id(0), Material::diffuse(linear::WHITE))
            .unwrap();
        scene.set_transfer_function(Some(TransferFunction::rainbow((0.0, 1.0))));
        scene.set_simulation_handler(Box::new(InMemorySimulation::new(
            vec![vec![0.0], vec![1.0]],
            TimestampMode::Bounded,
        )));
        let params = RenderingParameters::default().shading(ShadingType::None);

        let low = world(&scene, params.clone());
        let ray = center_ray(&low);
        let res = SimulationIntegrator.ray_cast(&mut ctx(&low), ray, 0);
        assert_eq!(res.color, linear::BLUE);

        scene.set_timestamp(1.0);
        let high = world(&scene, params);
        let res = SimulationIntegrator.ray_cast(&mut ctx(&high), ray, 0);
        assert_eq!(res.color, linear::RED);
    }

    #[test]
    fn transparent_values_show_the_background() {
        let mut scene = one_sphere();
        let mut tf = TransferFunction::new((0.0, 1.0));
        tf.set_control_points(TransferFunctionAttribute::Alpha, vec![Vec2::new(0.0, 0.0)]);
        scene.set_transfer_function(Some(tf));
        let params = RenderingParameters::default()
            .shading(ShadingType::None)
            .background_color(linear::GREEN);
        let world = world(&scene, params);
        let ray = center_ray(&world);
        let res = SimulationIntegrator.ray_cast(&mut ctx(&world), ray, 0);
        assert_eq!(res.color, linear::GREEN);
    }
}
