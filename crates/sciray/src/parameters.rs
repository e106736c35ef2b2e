//! Rendering and geometry configuration.
//!
//! Plain structs with defaults and chainable setters. The command line front end
//! maps its arguments onto them.

use std::path::PathBuf;

use crate::{
    camera::{CameraType, StereoMode},
    color::Rgb,
    framebuffer::FrameBufferFormat,
    material::{color_scheme::ColorScheme, palette::MaterialType},
    renderer::RendererKind,
    scene::SceneEnvironment,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ShadingType {
    None,
    #[default]
    Diffuse,
    /// View dependent, silhouettes are bright
    Electron,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GeometryQuality {
    Low,
    Medium,
    #[default]
    High,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderingParameters {
    pub renderer: RendererKind,
    pub shading: ShadingType,
    pub samples_per_pixel: u32,
    pub ambient_occlusion: f32,
    pub ambient_occlusion_distance: f32,
    pub shadows: f32,
    pub soft_shadows: f32,
    pub accumulation: bool,
    pub max_accumulation_frames: Option<u32>,
    pub max_ray_depth: u32,
    pub background_color: Rgb,
    pub detection_distance: f32,
    pub detection_on_different_material: bool,
    pub detection_near_color: Rgb,
    pub detection_far_color: Rgb,
    pub epsilon: f32,
    pub frame_buffer_format: FrameBufferFormat,
    pub camera_type: CameraType,
    pub stereo_mode: StereoMode,
    pub seed: u64,
}

impl Default for RenderingParameters {
    fn default() -> Self {
        Self {
            renderer: RendererKind::Basic,
            shading: ShadingType::Diffuse,
            samples_per_pixel: 1,
            ambient_occlusion: 0.0,
            ambient_occlusion_distance: 1.2,
            shadows: 0.0,
            soft_shadows: 0.0,
            accumulation: true,
            max_accumulation_frames: Some(100),
            max_ray_depth: 10,
            background_color: Rgb::from_array([0.0, 0.0, 0.0]),
            detection_distance: 1.0,
            detection_on_different_material: true,
            detection_near_color: Rgb::from_array([1.0, 0.0, 0.0]),
            detection_far_color: Rgb::from_array([0.0, 1.0, 0.0]),
            epsilon: 1e-3,
            frame_buffer_format: FrameBufferFormat::RgbaI8,
            camera_type: CameraType::Perspective,
            stereo_mode: StereoMode::None,
            seed: 0,
        }
    }
}

impl RenderingParameters {
    pub fn renderer(mut self, renderer: RendererKind) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn shading(mut self, shading: ShadingType) -> Self {
        self.shading = shading;
        self
    }

    pub fn samples_per_pixel(mut self, spp: u32) -> Self {
        self.samples_per_pixel = spp.max(1);
        self
    }

    pub fn ambient_occlusion(mut self, strength: f32) -> Self {
        self.ambient_occlusion = strength.clamp(0.0, 1.0);
        self
    }

    pub fn shadows(mut self, strength: f32) -> Self {
        self.shadows = strength.clamp(0.0, 1.0);
        self
    }

    pub fn soft_shadows(mut self, softness: f32) -> Self {
        self.soft_shadows = softness.max(0.0);
        self
    }

    pub fn accumulation(mut self, accumulation: bool) -> Self {
        self.accumulation = accumulation;
        self
    }

    pub fn max_accumulation_frames(mut self, max: Option<u32>) -> Self {
        self.max_accumulation_frames = max;
        self
    }

    pub fn background_color(mut self, color: Rgb) -> Self {
        self.background_color = color;
        self
    }

    pub fn detection_distance(mut self, distance: f32) -> Self {
        self.detection_distance = distance;
        self
    }

    pub fn frame_buffer_format(mut self, format: FrameBufferFormat) -> Self {
        self.frame_buffer_format = format;
        self
    }

    pub fn camera_type(mut self, camera_type: CameraType) -> Self {
        self.camera_type = camera_type;
        self
    }

    pub fn stereo_mode(mut self, stereo_mode: StereoMode) -> Self {
        self.stereo_mode = stereo_mode;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Whether switching from `self` to `other` invalidates accumulated frames
    pub fn invalidates(&self, other: &Self) -> bool {
        self != other
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometryParameters {
    pub pdb_file: Option<PathBuf>,
    pub pdb_folder: Option<PathBuf>,
    /// Index of the proteins in `pdb_folder`: `code id instances` per line
    pub pdb_cells: Option<PathBuf>,
    /// Placement of the proteins: `id x y z` per line
    pub pdb_positions: Option<PathBuf>,
    /// Only load one sphere per protein instance
    pub pdb_positions_only: bool,
    pub obj_file: Option<PathBuf>,
    pub color_scheme: ColorScheme,
    pub material_type: MaterialType,
    /// Number of user materials generated and targeted by importers
    pub material_count: usize,
    pub radius_multiplier: f32,
    pub geometry_quality: GeometryQuality,
    pub scene_environment: SceneEnvironment,
}

impl Default for GeometryParameters {
    fn default() -> Self {
        Self {
            pdb_file: None,
            pdb_folder: None,
            pdb_cells: None,
            pdb_positions: None,
            pdb_positions_only: false,
            obj_file: None,
            color_scheme: ColorScheme::None,
            material_type: MaterialType::Default,
            material_count: 118,
            radius_multiplier: 1.0,
            geometry_quality: GeometryQuality::High,
            scene_environment: SceneEnvironment::None,
        }
    }
}

impl GeometryParameters {
    pub fn pdb_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdb_file = Some(path.into());
        self
    }

    pub fn pdb_folder(
        mut self,
        folder: impl Into<PathBuf>,
        cells: impl Into<PathBuf>,
        positions: impl Into<PathBuf>,
    ) -> Self {
        self.pdb_folder = Some(folder.into());
        self.pdb_cells = Some(cells.into());
        self.pdb_positions = Some(positions.into());
        self
    }

    pub fn obj_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.obj_file = Some(path.into());
        self
    }

    pub fn color_scheme(mut self, color_scheme: ColorScheme) -> Self {
        self.color_scheme = color_scheme;
        self
    }

    pub fn material_type(mut self, material_type: MaterialType) -> Self {
        self.material_type = material_type;
        self
    }

    pub fn material_count(mut self, count: usize) -> Self {
        self.material_count = count;
        self
    }

    pub fn radius_multiplier(mut self, radius: f32) -> Self {
        self.radius_multiplier = radius;
        self
    }

    pub fn geometry_quality(mut self, quality: GeometryQuality) -> Self {
        self.geometry_quality = quality;
        self
    }

    pub fn scene_environment(mut self, environment: SceneEnvironment) -> Self {
        self.scene_environment = environment;
        self
    }
}

impl GeometryQuality {
    /// Triangles per mesh kept by importers, `None` keeps everything
    pub fn triangle_budget(self) -> Option<usize> {
        match self {
            GeometryQuality::Low => Some(10_000),
            GeometryQuality::Medium => Some(100_000),
            GeometryQuality::High => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp() {
        let params = RenderingParameters::default()
            .samples_per_pixel(0)
            .ambient_occlusion(3.0)
            .shadows(-1.0);
        assert_eq!(params.samples_per_pixel, 1);
        assert_eq!(params.ambient_occlusion, 1.0);
        assert_eq!(params.shadows, 0.0);
    }

    #[test]
    fn any_change_invalidates() {
        let a = RenderingParameters::default();
        assert!(!a.invalidates(&a.clone()));
        assert!(a.invalidates(&a.clone().renderer(RendererKind::Particle)));
    }
}
