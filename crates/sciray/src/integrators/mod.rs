use crate::{color::Rgb, ray::Ray, Ctx};

mod basic;
mod particle;
mod proximity;
mod simulation;

pub use basic::BasicIntegrator;
pub use particle::ParticleIntegrator;
pub use proximity::ProximityIntegrator;
pub use simulation::SimulationIntegrator;

/// Outcome of tracing one ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayResult {
    pub color: Rgb,
    pub alpha: f32,
    /// Distance to the first hit, infinite on a miss
    pub z: f32,
}

impl Default for RayResult {
    fn default() -> Self {
        Self {
            color: Rgb::default(),
            alpha: 0.0,
            z: f32::INFINITY,
        }
    }
}

pub trait Integrator: Send + Sync {
    fn ray_cast(&self, ctx: &mut Ctx, ray: Ray, depth: u32) -> RayResult;

    fn sky_ray(&self, ctx: &mut Ctx, ray: Ray) -> RayResult {
        RayResult {
            color: ctx.world.background(&ray),
            alpha: 1.0,
            z: f32::INFINITY,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_world {
    //! Small worlds shared by the integrator tests

    use glam::{UVec2, Vec3};
    use rand::SeedableRng;

    use crate::{
        camera::{Camera, PixelCoord, ViewportCoord},
        color::Rgb,
        geometry::Sphere,
        material::{Material, MaterialId},
        parameters::RenderingParameters,
        renderer::World,
        scene::Scene,
        Ctx, Rng, Seed,
    };

    pub fn id(i: usize) -> MaterialId {
        MaterialId::try_user(i).unwrap()
    }

    /// Red sphere of radius 1 at `z = -5`, camera at the origin looking down `-z`
    pub fn one_sphere() -> Scene {
        let mut scene = Scene::new();
        scene
            .set_material(id(0), Material::diffuse(Rgb::from_array([1.0, 0.0, 0.0])))
            .unwrap();
        scene.add_primitive(id(0), Sphere::new(Vec3::new(0.0, 0.0, -5.0), 1.0));
        scene
    }

    pub fn camera() -> Camera {
        Camera::look_at(Vec3::ZERO, -Vec3::Z, Vec3::Y)
    }

    pub fn world(scene: &Scene, parameters: RenderingParameters) -> World {
        World::build(&scene.snapshot(), camera(), parameters)
    }

    pub fn ctx(world: &World) -> Ctx<'_> {
        Ctx {
            rng: Rng::seed_from_u64(0),
            world,
            seed: Seed {
                seed: 0,
                x: 0,
                y: 0,
                sample_idx: 0,
            },
        }
    }

    /// Ray through the middle of a 1x1 image
    pub fn center_ray(world: &World) -> crate::ray::Ray {
        world
            .camera
            .ray(
                &mut Rng::seed_from_u64(0),
                ViewportCoord::from_pixel_coord(UVec2::ONE, PixelCoord { x: 0.5, y: 0.5 }),
            )
            .unwrap()
    }

    pub fn corner_ray(world: &World) -> crate::ray::Ray {
        world
            .camera
            .ray(
                &mut Rng::seed_from_u64(0),
                ViewportCoord::from_pixel_coord(UVec2::ONE, PixelCoord { x: 0.0, y: 0.0 }),
            )
            .unwrap()
    }
}
