//! Glue between a scene, a camera, a frame buffer and one renderer.
//!
//! The engine tracks what changed since the last frame and only pushes that to
//! the renderer. Accumulated frames are dropped whenever the renderer had to
//! rebuild its world.

use glam::UVec2;

use crate::{
    camera::Camera,
    framebuffer::{FrameBuffer, FrameBufferError, MappedFrame},
    loader::{GeometryLoader, ImportContext, ImportError},
    parameters::{GeometryParameters, RenderingParameters},
    render_io::{RenderInput, RenderOutput},
    renderer::{AnyRenderer, RenderError, Renderer, RendererKind},
    scene::Scene,
    utils::timer::timed_scope_log,
};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    FrameBuffer(#[from] FrameBufferError),
    #[error("import failed")]
    Import(#[from] ImportError),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

pub struct Engine {
    renderer: AnyRenderer,
    scene: Scene,
    camera: Camera,
    frame_buffer: FrameBuffer,
    parameters: RenderingParameters,
    geometry: GeometryParameters,
    scene_dirty: bool,
    camera_dirty: bool,
    /// Renderer commit count the frame buffer content was rendered with
    seen_commits: u64,
    frame_number: u64,
}

impl Engine {
    pub fn new(
        parameters: RenderingParameters,
        geometry: GeometryParameters,
        size: UVec2,
    ) -> Result<Self> {
        let mut frame_buffer =
            FrameBuffer::new(size, parameters.frame_buffer_format, parameters.accumulation)?;
        frame_buffer.set_max_accumulation_frames(parameters.max_accumulation_frames);

        let mut scene = Scene::new();
        scene.build_materials(geometry.material_type, geometry.material_count, parameters.seed);

        let mut camera = Camera {
            camera_type: parameters.camera_type,
            stereo_mode: parameters.stereo_mode,
            ..Default::default()
        };
        camera.set_aspect_from_size(size);

        Ok(Self {
            renderer: AnyRenderer::new(&parameters),
            scene,
            camera,
            frame_buffer,
            parameters,
            geometry,
            scene_dirty: true,
            camera_dirty: true,
            seen_commits: 0,
            frame_number: 0,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The scene is rebound on the next render
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.scene_dirty = true;
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The camera is rebound on the next render
    pub fn camera_mut(&mut self) -> &mut Camera {
        self.camera_dirty = true;
        &mut self.camera
    }

    pub fn parameters(&self) -> &RenderingParameters {
        &self.parameters
    }

    pub fn geometry_parameters(&self) -> &GeometryParameters {
        &self.geometry
    }

    pub fn renderer_kind(&self) -> RendererKind {
        self.renderer.kind()
    }

    pub fn renderer(&self) -> &AnyRenderer {
        &self.renderer
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    pub fn map(&mut self) -> Result<MappedFrame<'_>> {
        Ok(self.frame_buffer.map()?)
    }

    /// Frames rendered since the engine was created
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Replaces the renderer when the kind changes, otherwise hands the parameters
    /// to the current one
    pub fn set_parameters(&mut self, parameters: RenderingParameters) -> Result<()> {
        if parameters == self.parameters {
            return Ok(());
        }
        // Frame buffer first, nothing else changes when it fails
        if parameters.frame_buffer_format != self.frame_buffer.format() {
            self.frame_buffer = FrameBuffer::new(
                self.frame_buffer.size(),
                parameters.frame_buffer_format,
                parameters.accumulation,
            )?;
        } else {
            self.frame_buffer.set_accumulation(parameters.accumulation)?;
        }

        if parameters.renderer != self.renderer.kind() {
            self.renderer = AnyRenderer::new(&parameters);
            self.seen_commits = 0;
            self.scene_dirty = true;
            self.camera_dirty = true;
        } else {
            self.renderer.set_parameters(&parameters);
        }

        self.frame_buffer
            .set_max_accumulation_frames(parameters.max_accumulation_frames);

        if parameters.camera_type != self.parameters.camera_type
            || parameters.stereo_mode != self.parameters.stereo_mode
        {
            let camera = self.camera_mut();
            camera.camera_type = parameters.camera_type;
            camera.stereo_mode = parameters.stereo_mode;
        }
        self.frame_buffer.clear();
        self.parameters = parameters;
        Ok(())
    }

    pub fn reshape(&mut self, size: UVec2) -> Result<()> {
        if size == self.frame_buffer.size() && self.frame_buffer.is_allocated() {
            return Ok(());
        }
        self.frame_buffer.resize(size)?;
        self.camera_mut().set_aspect_from_size(size);
        Ok(())
    }

    /// Pushes what changed to the renderer, commits and renders one frame.
    ///
    /// Returns `false` when the frame buffer reached its accumulation limit.
    pub fn render(&mut self) -> Result<bool> {
        if self.scene_dirty {
            self.renderer.set_scene(&self.scene);
            self.scene_dirty = false;
        }
        if self.camera_dirty {
            self.renderer.set_camera(&self.camera);
            self.camera_dirty = false;
        }
        self.renderer.commit()?;

        let commits = self.renderer.commit_count();
        if commits != self.seen_commits {
            log::trace!("world rebuilt, dropping accumulated frames");
            self.frame_buffer.clear();
            self.seen_commits = commits;
        }

        let rendered = self.renderer.render(&mut self.frame_buffer)?;
        if rendered {
            self.frame_number += 1;
        }
        Ok(rendered)
    }

    /// One frame for a presentation front end: follows the window size and the
    /// camera of `input`, then copies the buffers out
    pub fn render_frame(&mut self, input: &RenderInput) -> Result<RenderOutput> {
        self.reshape(input.window_size)?;
        if self.camera.position != input.position
            || self.camera.target != input.target
            || self.camera.up != input.up
        {
            self.camera_mut().apply_render_input(input);
        }
        self.render()?;

        let frame = self.frame_buffer.map()?;
        Ok(RenderOutput {
            color_buffer: frame.color().to_vec(),
            depth_buffer: frame.depth().to_vec(),
            color_buffer_format: frame.format(),
        })
    }

    /// Adds the geometry of `loader` to the scene, colors the materials it
    /// suggests and frames the result.
    ///
    /// Returns the number of primitives added.
    pub fn import(&mut self, loader: &dyn GeometryLoader) -> Result<usize> {
        let ctx = ImportContext::from(&self.geometry);
        let name = loader.name();
        let geometry = timed_scope_log("import", || loader.import(&ctx)).res?;
        let count = geometry.primitive_count();
        if count == 0 {
            log::warn!("{name}: nothing imported");
            return Ok(0);
        }

        let scene = self.scene_mut();
        scene.add_primitives(geometry.primitives);
        for (id, color) in geometry.material_colors {
            let Some(mut material) = scene.material(id).cloned() else {
                continue;
            };
            material.diffuse = color;
            if let Err(err) = scene.set_material(id, material) {
                log::warn!("{name}: {err}");
            }
        }
        let bounds = self.scene.bounds();
        self.camera_mut().set_initial_state(&bounds);
        log::info!("{name}: imported {count} primitives");
        Ok(count)
    }

    /// Adds the configured environment around the current content
    pub fn build_environment(&mut self) {
        let environment = self.geometry.scene_environment;
        self.scene_mut().build_environment(environment);
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::{
        color::linear,
        framebuffer::FrameBufferFormat,
        geometry::Sphere,
        loader::ImportedGeometry,
        material::MaterialId,
        renderer::RendererState,
    };

    fn size() -> UVec2 {
        UVec2::new(8, 6)
    }

    fn engine() -> Engine {
        let mut engine =
            Engine::new(RenderingParameters::default(), GeometryParameters::default(), size())
                .unwrap();
        engine
            .scene_mut()
            .add_primitive(MaterialId::user(0, 1), Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0));
        *engine.camera_mut() = Camera::look_at(Vec3::ZERO, -Vec3::Z, Vec3::Y);
        engine
    }

    fn input(window_size: UVec2, position: Vec3) -> RenderInput {
        RenderInput {
            window_size,
            modelview: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            position,
            target: position - Vec3::Z,
            up: Vec3::Y,
        }
    }

    struct StubLoader;

    impl GeometryLoader for StubLoader {
        fn name(&self) -> String {
            "stub".to_owned()
        }

        fn import(&self, ctx: &ImportContext) -> crate::loader::Result<ImportedGeometry> {
            let mut geometry = ImportedGeometry::default();
            let id = MaterialId::user(3, ctx.material_count);
            geometry.push(id, Sphere::new(Vec3::new(10.0, 0.0, 0.0), 1.0));
            geometry.push(id, Sphere::new(Vec3::new(12.0, 0.0, 0.0), 1.0));
            geometry.suggest_color(id, linear::GREEN);
            Ok(geometry)
        }
    }

    #[test]
    fn engine_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Engine>();
    }

    #[test]
    fn redundant_commits_are_skipped() {
        let mut engine = engine();
        assert!(engine.render().unwrap());
        assert!(engine.render().unwrap());
        assert_eq!(engine.renderer().commit_count(), 1);
        assert_eq!(engine.frame_buffer().accumulation_frames(), 2);
        assert_eq!(engine.frame_number(), 2);
        assert_eq!(engine.renderer().state(), RendererState::Rendered);
    }

    #[test]
    fn camera_move_drops_accumulation() {
        let mut engine = engine();
        engine.render().unwrap();
        engine.render().unwrap();
        engine.camera_mut().position = Vec3::new(0.0, 0.0, 0.5);
        engine.render().unwrap();
        assert_eq!(engine.renderer().commit_count(), 2);
        assert_eq!(engine.frame_buffer().accumulation_frames(), 1);
    }

    #[test]
    fn scene_edit_drops_accumulation() {
        let mut engine = engine();
        engine.render().unwrap();
        engine.render().unwrap();
        engine
            .scene_mut()
            .add_primitive(MaterialId::user(1, 2), Sphere::new(Vec3::new(1.0, 0.0, -3.0), 0.5));
        engine.render().unwrap();
        assert_eq!(engine.frame_buffer().accumulation_frames(), 1);
    }

    #[test]
    fn renderer_kind_switch() {
        let mut engine = engine();
        engine.render().unwrap();
        let params = RenderingParameters::default().renderer(RendererKind::Particle);
        engine.set_parameters(params).unwrap();
        assert_eq!(engine.renderer_kind(), RendererKind::Particle);
        assert!(engine.render().unwrap());
        assert_eq!(engine.renderer().commit_count(), 1);
        assert_eq!(engine.frame_buffer().accumulation_frames(), 1);
    }

    #[test]
    fn render_frame_follows_the_input() {
        let mut engine = engine();
        let output = engine
            .render_frame(&input(UVec2::new(4, 2), Vec3::ZERO))
            .unwrap();
        assert_eq!(engine.frame_buffer().size(), UVec2::new(4, 2));
        assert_eq!(output.color_buffer.len(), 4 * 2 * 4);
        assert_eq!(output.depth_buffer.len(), 4 * 2);
        assert_eq!(output.color_buffer_format, engine.parameters().frame_buffer_format);

        // Same input, nothing to rebuild
        engine
            .render_frame(&input(UVec2::new(4, 2), Vec3::ZERO))
            .unwrap();
        assert_eq!(engine.renderer().commit_count(), 1);
        assert_eq!(engine.frame_buffer().accumulation_frames(), 2);
        assert!(!engine.frame_buffer().is_mapped());
    }

    #[test]
    fn failed_parameter_change_keeps_the_previous_parameters() {
        let mut engine = engine();
        assert!(engine.reshape(UVec2::ZERO).is_err());

        let previous = engine.parameters().clone();
        let params = previous
            .clone()
            .renderer(RendererKind::Particle)
            .frame_buffer_format(FrameBufferFormat::RgbaF32);
        assert!(engine.set_parameters(params).is_err());
        assert_eq!(engine.parameters(), &previous);
        assert_eq!(engine.renderer_kind(), previous.renderer);
        assert_eq!(engine.frame_buffer().format(), previous.frame_buffer_format);

        engine.reshape(size()).unwrap();
        assert!(engine.render().unwrap());
    }

    #[test]
    fn import_adds_and_frames() {
        let mut engine = engine();
        let count = engine.import(&StubLoader).unwrap();
        assert_eq!(count, 2);
        assert_eq!(engine.scene().primitive_count(), 3);

        let id = MaterialId::user(3, engine.geometry_parameters().material_count);
        assert_eq!(engine.scene().material(id).unwrap().diffuse, linear::GREEN);
        assert_eq!(engine.camera().target, engine.scene().bounds().center());
        assert!(engine.render().unwrap());
    }
}
