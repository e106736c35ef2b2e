use std::{collections::BTreeMap, sync::Arc};

use glam::{UVec2, Vec4};
use rayon::prelude::*;

use crate::{
    aggregate::{Aggregate, PrimitiveList},
    camera::{Camera, PixelCoord, ViewportCoord},
    color::Rgb,
    framebuffer::{FrameBuffer, FrameBufferError, PixelSample},
    integrators::{Integrator, RayResult},
    material::{texture::Texture, Material, MaterialId, SystemMaterial},
    math::{bounds::Bounds, distributions::sphere_uv_from_direction},
    parameters::RenderingParameters,
    ray::Ray,
    scene::{
        light::Light, transfer_function::TransferFunction, Scene, SceneGeneration, SceneSnapshot,
    },
    utils::timer::{format_elapsed, timed_scope, TimedResult},
    Ctx, Seed,
};

use super::{violation, RenderError, Renderer, RendererState, Result};

/// Everything an integrator reads, built at commit time
pub struct World {
    pub aggregate: Box<dyn Aggregate>,
    /// Indexed by material id
    pub materials: Vec<Material>,
    pub textures: BTreeMap<String, Arc<dyn Texture>>,
    pub lights: Vec<Light>,
    pub transfer_function: Option<TransferFunction>,
    pub simulation_values: Option<Arc<[f32]>>,
    /// Primitive values in commit order
    pub values: Vec<f32>,
    pub camera: Camera,
    pub parameters: RenderingParameters,
    pub bounds: Bounds,
    default_material: Material,
}

impl World {
    pub fn build(scene: &SceneSnapshot, camera: Camera, parameters: RenderingParameters) -> Self {
        Self {
            aggregate: Box::new(PrimitiveList::build(&scene.primitives)),
            materials: scene.materials.to_table(),
            textures: scene.textures.clone(),
            lights: scene.lights.clone(),
            transfer_function: scene.transfer_function.clone(),
            simulation_values: scene.simulation_values.clone(),
            values: scene.primitives.values().flatten().map(|p| p.value()).collect(),
            camera,
            parameters,
            bounds: scene.bounds,
            default_material: Material::default(),
        }
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        self.materials
            .get(id.index())
            .unwrap_or(&self.default_material)
    }

    pub fn texture(&self, name: &str) -> Option<&dyn Texture> {
        self.textures.get(name).map(|t| &**t)
    }

    /// Diffuse color, modulated by the material texture when it exists
    pub fn surface_color(&self, material: &Material, uv: [f32; 2]) -> Rgb {
        match material.texture.as_deref().and_then(|name| self.texture(name)) {
            Some(texture) => material.diffuse * texture.color(uv),
            None => material.diffuse,
        }
    }

    /// Skybox texture in the direction of `ray`, or the background color
    pub fn background(&self, ray: &Ray) -> Rgb {
        let skybox = self.material(SystemMaterial::Skybox.id());
        match skybox.texture.as_deref().and_then(|name| self.texture(name)) {
            Some(texture) => {
                skybox.diffuse * texture.color(sphere_uv_from_direction(ray.direction))
            }
            None => self.parameters.background_color,
        }
    }

    /// Simulation value of the primitive at `index` in commit order, falling back
    /// to the value stored in the primitive
    pub fn primitive_value(&self, index: usize) -> f32 {
        self.simulation_values
            .as_deref()
            .and_then(|values| values.get(index))
            .or_else(|| self.values.get(index))
            .copied()
            .unwrap_or(0.0)
    }
}

/// CPU renderer tracing rays through an [Integrator]
pub struct TracingRenderer<I: Integrator> {
    integrator: I,
    scene: Option<SceneSnapshot>,
    /// Generation of the bound scene, following its edits
    scene_generation: Option<SceneGeneration>,
    camera: Option<Camera>,
    parameters: RenderingParameters,
    world: Option<World>,
    /// Scene the world was built from
    committed_scene: Option<SceneSnapshot>,
    rendered: bool,
    commits: u64,
}

impl<I: Integrator> TracingRenderer<I> {
    pub fn new(integrator: I, parameters: &RenderingParameters) -> Self {
        Self {
            integrator,
            scene: None,
            scene_generation: None,
            camera: None,
            parameters: parameters.clone(),
            world: None,
            committed_scene: None,
            rendered: false,
            commits: 0,
        }
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    /// Whether the bound scene was edited after [Renderer::set_scene]
    fn is_scene_stale(&self) -> bool {
        match (&self.scene, &self.scene_generation) {
            (Some(scene), Some(live)) => live.is_ahead_of(scene),
            _ => false,
        }
    }

    /// Whether the world matches the current bindings
    fn is_current(&self) -> bool {
        if self.is_scene_stale() {
            return false;
        }
        let (Some(world), Some(scene), Some(committed), Some(camera)) = (
            &self.world,
            &self.scene,
            &self.committed_scene,
            &self.camera,
        ) else {
            return false;
        };
        Arc::ptr_eq(scene, committed)
            && world.camera == *camera
            && world.parameters == self.parameters
    }

    fn render_pixel(
        &self,
        world: &World,
        size: UVec2,
        x: u32,
        y: u32,
        frame: u32,
    ) -> PixelSample {
        let params = &world.parameters;
        let spp = params.samples_per_pixel.max(1);
        let mut color = Vec4::ZERO;
        let mut depth = f32::INFINITY;
        for sample in 0..spp {
            let seed = Seed {
                seed: params.seed,
                x,
                y,
                sample_idx: frame.wrapping_mul(spp).wrapping_add(sample),
            };
            let mut ctx = Ctx {
                rng: seed.into_rng(0),
                world,
                seed,
            };
            let coord = PixelCoord::sample_around(&mut ctx.rng, x, y);
            let result = match world
                .camera
                .ray(&mut ctx.rng, ViewportCoord::from_pixel_coord(size, coord))
            {
                Some(ray) => self.integrator.ray_cast(&mut ctx, ray, 0),
                None => RayResult {
                    color: params.background_color,
                    alpha: 1.0,
                    z: f32::INFINITY,
                },
            };
            let [r, g, b] = result.color.to_array();
            color += Vec4::new(r, g, b, result.alpha);
            depth = depth.min(result.z);
        }
        PixelSample {
            color: color / spp as f32,
            depth,
        }
    }
}

impl<I: Integrator> Renderer for TracingRenderer<I> {
    fn set_scene(&mut self, scene: &Scene) {
        self.scene = Some(scene.snapshot());
        self.scene_generation = Some(scene.live_generation());
    }

    fn set_camera(&mut self, camera: &Camera) {
        self.camera = Some(camera.clone());
    }

    fn set_parameters(&mut self, parameters: &RenderingParameters) {
        self.parameters = parameters.clone();
    }

    fn commit(&mut self) -> Result<()> {
        let Some(scene) = self.scene.clone() else {
            return Err(violation(RenderError::SceneNotBound));
        };
        let Some(camera) = self.camera.clone() else {
            return Err(violation(RenderError::CameraNotBound));
        };
        if self.is_scene_stale() {
            return Err(violation(RenderError::SceneChanged));
        }
        if self.is_current() {
            log::trace!("commit skipped, nothing changed");
            return Ok(());
        }

        let parameters = self.parameters.clone();
        let TimedResult {
            res: world,
            elapsed,
        } = timed_scope(|| World::build(&scene, camera, parameters));
        log::debug!(
            "committed scene generation {} in {}",
            scene.generation,
            format_elapsed(elapsed)
        );
        self.world = Some(world);
        self.committed_scene = Some(scene);
        self.rendered = false;
        self.commits += 1;
        Ok(())
    }

    fn render(&mut self, frame_buffer: &mut FrameBuffer) -> Result<bool> {
        if self.is_scene_stale() {
            return Err(violation(RenderError::SceneChanged));
        }
        if !self.is_current() {
            return Err(violation(RenderError::NotCommitted));
        }
        let Some(world) = self.world.as_ref() else {
            return Err(violation(RenderError::NotCommitted));
        };
        if !frame_buffer.is_allocated() {
            return Err(FrameBufferError::NotAllocated.into());
        }
        if !frame_buffer.needs_render() {
            return Ok(false);
        }

        let size = frame_buffer.size();
        let frame = frame_buffer.accumulation_frames();
        let mut samples = vec![PixelSample::default(); size.x as usize * size.y as usize];
        crate::time_counter!(
            "render time",
            samples
                .par_chunks_mut(size.x as usize)
                .enumerate()
                .for_each(|(y, row)| {
                    for (x, pixel) in row.iter_mut().enumerate() {
                        *pixel = self.render_pixel(world, size, x as u32, y as u32, frame);
                    }
                })
        );
        crate::counter!(
            "primary rays",
            samples.len() as u64 * world.parameters.samples_per_pixel.max(1) as u64
        );

        let changed = frame_buffer.accumulate(&samples)?;
        self.rendered = true;
        Ok(changed)
    }

    fn state(&self) -> RendererState {
        if self.is_current() {
            if self.rendered {
                RendererState::Rendered
            } else {
                RendererState::Committed
            }
        } else {
            match (&self.scene, &self.camera) {
                (Some(_), Some(_)) => RendererState::CameraBound,
                (Some(_), None) => RendererState::SceneBound,
                (None, _) => RendererState::Constructed,
            }
        }
    }

    fn commit_count(&self) -> u64 {
        self.commits
    }
}
