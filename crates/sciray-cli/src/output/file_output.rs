use anyhow::{Context, Result};
use glam::UVec2;
use image::{ImageBuffer, Rgb, Rgba, RgbImage, RgbaImage};
use sciray::{framebuffer::FrameBufferFormat, render_io::RenderOutput};
use std::path::{Path, PathBuf};

use super::FinalOutput;

/// Writes the color buffer to `color_path`, 8-bit formats as LDR images and
/// `RgbaF32` as OpenEXR. The depth buffer optionally goes to an OpenEXR file.
pub struct FileOutput {
    pub color_path: PathBuf,
    pub depth_path: Option<PathBuf>,
}

impl FileOutput {
    pub fn new(color_path: impl Into<PathBuf>, depth_path: Option<PathBuf>) -> Self {
        Self {
            color_path: color_path.into(),
            depth_path,
        }
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    Ok(())
}

fn save_color(path: &Path, output: &RenderOutput, size: UVec2) -> Result<()> {
    let buffer = output.color_buffer.clone();
    let mismatch = || format!("color buffer does not match {}x{}", size.x, size.y);
    let saved = match output.color_buffer_format {
        FrameBufferFormat::None => {
            log::warn!("no color buffer to save");
            return Ok(());
        }
        FrameBufferFormat::RgbaI8 => RgbaImage::from_raw(size.x, size.y, buffer)
            .with_context(mismatch)?
            .save(path),
        FrameBufferFormat::BgraI8 => {
            let mut buffer = buffer;
            for pixel in buffer.chunks_exact_mut(4) {
                pixel.swap(0, 2);
            }
            RgbaImage::from_raw(size.x, size.y, buffer)
                .with_context(mismatch)?
                .save(path)
        }
        FrameBufferFormat::RgbI8 => RgbImage::from_raw(size.x, size.y, buffer)
            .with_context(mismatch)?
            .save(path),
        FrameBufferFormat::RgbaF32 => {
            let floats: Vec<f32> = bytemuck::pod_collect_to_vec(&buffer);
            ImageBuffer::<Rgba<f32>, _>::from_raw(size.x, size.y, floats)
                .with_context(mismatch)?
                .save(path.with_extension("exr"))
        }
    };
    saved.with_context(|| format!("saving {}", path.display()))
}

fn save_depth(path: &Path, depth: &[f32], size: UVec2) -> Result<()> {
    // Pixels that saw nothing are stored as 0
    let values = depth
        .iter()
        .flat_map(|d| [if d.is_finite() { *d } else { 0.0 }; 3])
        .collect::<Vec<f32>>();
    ImageBuffer::<Rgb<f32>, _>::from_raw(size.x, size.y, values)
        .with_context(|| format!("depth buffer does not match {}x{}", size.x, size.y))?
        .save(path.with_extension("exr"))
        .with_context(|| format!("saving {}", path.display()))
}

impl FinalOutput for FileOutput {
    fn commit(&self, output: &RenderOutput, size: UVec2) -> Result<()> {
        create_parent(&self.color_path)?;
        log::info!("saving {}", self.color_path.display());
        save_color(&self.color_path, output, size)?;

        if let Some(depth_path) = &self.depth_path {
            create_parent(depth_path)?;
            log::info!("saving {}", depth_path.display());
            save_depth(depth_path, &output.depth_buffer, size)?;
        }
        Ok(())
    }
}
