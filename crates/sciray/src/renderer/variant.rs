use crate::{
    camera::Camera,
    framebuffer::FrameBuffer,
    integrators::{
        BasicIntegrator, ParticleIntegrator, ProximityIntegrator, SimulationIntegrator,
    },
    parameters::RenderingParameters,
    scene::Scene,
};

use super::{Renderer, RendererState, Result, TracingRenderer};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererKind {
    #[default]
    Basic,
    Proximity,
    Simulation,
    Particle,
}

/// The renderer variants, picked once from the configuration
pub enum AnyRenderer {
    Basic(TracingRenderer<BasicIntegrator>),
    Proximity(TracingRenderer<ProximityIntegrator>),
    Simulation(TracingRenderer<SimulationIntegrator>),
    Particle(TracingRenderer<ParticleIntegrator>),
}

macro_rules! dispatch {
    ($self:expr, $r:ident => $body:expr) => {
        match $self {
            AnyRenderer::Basic($r) => $body,
            AnyRenderer::Proximity($r) => $body,
            AnyRenderer::Simulation($r) => $body,
            AnyRenderer::Particle($r) => $body,
        }
    };
}

impl AnyRenderer {
    pub fn new(parameters: &RenderingParameters) -> Self {
        log::info!("using the {:?} renderer", parameters.renderer);
        match parameters.renderer {
            RendererKind::Basic => Self::Basic(TracingRenderer::new(BasicIntegrator, parameters)),
            RendererKind::Proximity => {
                Self::Proximity(TracingRenderer::new(ProximityIntegrator, parameters))
            }
            RendererKind::Simulation => {
                Self::Simulation(TracingRenderer::new(SimulationIntegrator, parameters))
            }
            RendererKind::Particle => {
                Self::Particle(TracingRenderer::new(ParticleIntegrator, parameters))
            }
        }
    }

    pub fn kind(&self) -> RendererKind {
        match self {
            AnyRenderer::Basic(_) => RendererKind::Basic,
            AnyRenderer::Proximity(_) => RendererKind::Proximity,
            AnyRenderer::Simulation(_) => RendererKind::Simulation,
            AnyRenderer::Particle(_) => RendererKind::Particle,
        }
    }
}

impl Renderer for AnyRenderer {
    fn set_scene(&mut self, scene: &Scene) {
        dispatch!(self, r => r.set_scene(scene))
    }

    fn set_camera(&mut self, camera: &Camera) {
        dispatch!(self, r => r.set_camera(camera))
    }

    fn set_parameters(&mut self, parameters: &RenderingParameters) {
        dispatch!(self, r => r.set_parameters(parameters))
    }

    fn commit(&mut self) -> Result<()> {
        dispatch!(self, r => r.commit())
    }

    fn render(&mut self, frame_buffer: &mut FrameBuffer) -> Result<bool> {
        dispatch!(self, r => r.render(frame_buffer))
    }

    fn state(&self) -> RendererState {
        dispatch!(self, r => r.state())
    }

    fn commit_count(&self) -> u64 {
        dispatch!(self, r => r.commit_count())
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use glam::{UVec2, Vec3};

    use super::*;
    use crate::{
        framebuffer::FrameBufferFormat, geometry::Sphere, material::MaterialId,
        renderer::RenderError,
    };

    /// Runs `f`, returning `None` if it tripped a debug assertion
    fn lenient<R>(f: impl FnOnce() -> R) -> Option<R> {
        let res = catch_unwind(AssertUnwindSafe(f)).ok();
        if res.is_none() {
            assert!(cfg!(debug_assertions));
        }
        res
    }

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_primitive(MaterialId::user(0, 1), Sphere::new(Vec3::new(0.0, 0.0, -3.0), 1.0));
        scene
    }

    fn camera() -> Camera {
        Camera::look_at(Vec3::ZERO, -Vec3::Z, Vec3::Y)
    }

    fn frame_buffer() -> FrameBuffer {
        FrameBuffer::new(UVec2::new(8, 6), FrameBufferFormat::RgbaI8, true).unwrap()
    }

    fn bound(kind: RendererKind) -> (AnyRenderer, Scene) {
        let scene = scene();
        let mut renderer = AnyRenderer::new(&RenderingParameters::default().renderer(kind));
        renderer.set_scene(&scene);
        renderer.set_camera(&camera());
        (renderer, scene)
    }

    #[test]
    fn state_machine_progresses() {
        let scene = scene();
        let mut renderer = AnyRenderer::new(&RenderingParameters::default());
        assert_eq!(renderer.state(), RendererState::Constructed);
        renderer.set_scene(&scene);
        assert_eq!(renderer.state(), RendererState::SceneBound);
        renderer.set_camera(&camera());
        assert_eq!(renderer.state(), RendererState::CameraBound);
        renderer.commit().unwrap();
        assert_eq!(renderer.state(), RendererState::Committed);
        let mut fb = frame_buffer();
        assert!(renderer.render(&mut fb).unwrap());
        assert_eq!(renderer.state(), RendererState::Rendered);
    }

    #[test]
    fn render_before_commit_leaves_the_frame_buffer_untouched() {
        let (mut renderer, _scene) = bound(RendererKind::Basic);
        let mut fb = frame_buffer();
        if let Some(res) = lenient(|| renderer.render(&mut fb)) {
            assert_eq!(res, Err(RenderError::NotCommitted));
        }
        assert_eq!(fb.accumulation_frames(), 0);
        assert!(fb.map().unwrap().color().iter().all(|b| *b == 0));
    }

    #[test]
    fn commit_needs_scene_and_camera() {
        let mut renderer = AnyRenderer::new(&RenderingParameters::default());
        if let Some(res) = lenient(|| renderer.commit()) {
            assert_eq!(res, Err(RenderError::SceneNotBound));
        }
        renderer.set_scene(&scene());
        if let Some(res) = lenient(|| renderer.commit()) {
            assert_eq!(res, Err(RenderError::CameraNotBound));
        }
        assert_eq!(renderer.commit_count(), 0);
    }

    #[test]
    fn commit_is_idempotent() {
        let (mut renderer, scene) = bound(RendererKind::Basic);
        renderer.commit().unwrap();
        renderer.commit().unwrap();
        assert_eq!(renderer.commit_count(), 1);

        // Rebinding the unchanged scene and camera is not a change
        renderer.set_scene(&scene);
        renderer.set_camera(&camera());
        renderer.commit().unwrap();
        assert_eq!(renderer.commit_count(), 1);
    }

    #[test]
    fn rebinding_a_changed_scene_requires_a_commit() {
        let (mut renderer, mut scene) = bound(RendererKind::Basic);
        renderer.commit().unwrap();
        scene.add_primitive(MaterialId::user(1, 2), Sphere::new(Vec3::ZERO, 0.1));
        renderer.set_scene(&scene);
        assert_eq!(renderer.state(), RendererState::CameraBound);

        let mut fb = frame_buffer();
        if let Some(res) = lenient(|| renderer.render(&mut fb)) {
            assert_eq!(res, Err(RenderError::NotCommitted));
        }
        renderer.commit().unwrap();
        assert_eq!(renderer.commit_count(), 2);
        assert!(renderer.render(&mut fb).unwrap());
    }

    #[test]
    fn scene_edited_after_binding_is_refused() {
        let (mut renderer, mut scene) = bound(RendererKind::Basic);
        renderer.commit().unwrap();
        let mut fb = frame_buffer();
        assert!(renderer.render(&mut fb).unwrap());

        scene.clear_primitives();
        assert_eq!(renderer.state(), RendererState::CameraBound);
        if let Some(res) = lenient(|| renderer.commit()) {
            assert_eq!(res, Err(RenderError::SceneChanged));
        }
        let mut stale = frame_buffer();
        if let Some(res) = lenient(|| renderer.render(&mut stale)) {
            assert_eq!(res, Err(RenderError::SceneChanged));
        }
        assert_eq!(stale.accumulation_frames(), 0);
        assert_eq!(renderer.commit_count(), 1);

        renderer.set_scene(&scene);
        renderer.commit().unwrap();
        assert_eq!(renderer.commit_count(), 2);
        let mut fb = frame_buffer();
        assert!(renderer.render(&mut fb).unwrap());
        assert!(fb.map().unwrap().depth().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn rendering_is_deterministic() {
        for kind in [
            RendererKind::Basic,
            RendererKind::Proximity,
            RendererKind::Simulation,
            RendererKind::Particle,
        ] {
            let (mut renderer, _scene) = bound(kind);
            assert_eq!(renderer.kind(), kind);
            renderer.commit().unwrap();
            let mut a = frame_buffer();
            let mut b = frame_buffer();
            renderer.render(&mut a).unwrap();
            renderer.render(&mut b).unwrap();
            let a = a.map().unwrap().color().to_vec();
            let b = b.map().unwrap().color().to_vec();
            assert_eq!(a, b, "{kind:?}");
        }
    }

    #[test]
    fn accumulation_stops_at_the_limit() {
        let params = RenderingParameters::default().max_accumulation_frames(Some(2));
        let mut renderer = AnyRenderer::new(&params);
        let scene = scene();
        renderer.set_scene(&scene);
        renderer.set_camera(&camera());
        renderer.commit().unwrap();

        let mut fb = frame_buffer();
        fb.set_max_accumulation_frames(params.max_accumulation_frames);
        assert!(renderer.render(&mut fb).unwrap());
        assert!(renderer.render(&mut fb).unwrap());
        assert!(!renderer.render(&mut fb).unwrap());
        assert_eq!(fb.accumulation_frames(), 2);
    }

    #[test]
    fn depth_is_written() {
        let (mut renderer, _scene) = bound(RendererKind::Basic);
        renderer.commit().unwrap();
        let mut fb = frame_buffer();
        renderer.render(&mut fb).unwrap();
        let frame = fb.map().unwrap();
        let depth = frame.depth();
        // Center pixels see the sphere, corners see nothing
        assert!(depth[3 * 8 + 4] < 3.0);
        assert!(depth[0].is_infinite());
    }
}
