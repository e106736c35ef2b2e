mod file_output;

use anyhow::Result;
pub use file_output::FileOutput;
use glam::UVec2;
use sciray::render_io::RenderOutput;

pub trait FinalOutput {
    fn commit(&self, output: &RenderOutput, size: UVec2) -> Result<()>;
}
