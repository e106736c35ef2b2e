//! Rendering backends.
//!
//! A [Renderer] is bound to a scene and a camera, then committed, then asked to
//! render into a [FrameBuffer]:
//!
//! ```text
//! Constructed -> SceneBound -> CameraBound -> Committed -> Rendered
//! ```
//!
//! Binding only records what to render. [Renderer::commit] builds the backend's
//! world from the bound state and does nothing when that state did not change.
//! Rendering with bindings that were not committed is refused, and so is
//! committing or rendering a scene edited after it was bound.

mod tracing;
mod variant;

pub use tracing::{TracingRenderer, World};
pub use variant::{AnyRenderer, RendererKind};

use crate::{
    camera::Camera,
    framebuffer::{FrameBuffer, FrameBufferError},
    parameters::RenderingParameters,
    scene::Scene,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("no scene is bound to the renderer")]
    SceneNotBound,
    #[error("no camera is bound to the renderer")]
    CameraNotBound,
    #[error("the renderer must be committed after binding and before rendering")]
    NotCommitted,
    #[error("the bound scene was edited after binding, it must be bound again")]
    SceneChanged,
    #[error(transparent)]
    FrameBuffer(#[from] FrameBufferError),
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RendererState {
    Constructed,
    SceneBound,
    CameraBound,
    Committed,
    Rendered,
}

pub trait Renderer: Send {
    /// Records the scene to render. Nothing is built until [Renderer::commit].
    fn set_scene(&mut self, scene: &Scene);

    fn set_camera(&mut self, camera: &Camera);

    /// Used by the next commit
    fn set_parameters(&mut self, parameters: &RenderingParameters);

    /// Builds the world from the bound scene, camera and parameters. Does nothing
    /// if they did not change since the last commit.
    fn commit(&mut self) -> Result<()>;

    /// Renders one frame into `frame_buffer`, averaging it with the previous ones
    /// when accumulation is on.
    ///
    /// Returns `false` when the frame buffer reached its accumulation limit and was
    /// left untouched.
    fn render(&mut self, frame_buffer: &mut FrameBuffer) -> Result<bool>;

    fn state(&self) -> RendererState;

    /// Number of worlds built so far
    fn commit_count(&self) -> u64;
}

/// Ordering violations are errors, and loud in debug builds
fn violation(err: RenderError) -> RenderError {
    log::error!("renderer misuse: {err}");
    debug_assert!(false, "renderer misuse: {err}");
    err
}
