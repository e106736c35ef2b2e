use core::fmt::Display;

use clap::ValueEnum;
use sciray::{
    camera::{CameraType, StereoMode},
    color::Rgb,
    framebuffer::FrameBufferFormat,
    material::{color_scheme::ColorScheme, palette::MaterialType},
    parameters::{GeometryQuality, ShadingType},
    renderer::RendererKind,
    scene::{demos::DemoScene, SceneEnvironment},
};

/// Declares a clap facing enum mirroring a library enum, with the conversion
macro_rules! value_enum {
    ($name:ident => $target:ty { $($variant:ident => $target_variant:ident),+ $(,)? } default $default:ident) => {
        #[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl From<$name> for $target {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => <$target>::$target_variant,)+
                }
            }
        }
    };
}

value_enum!(AvailableRenderer => RendererKind {
    Basic => Basic,
    Proximity => Proximity,
    Simulation => Simulation,
    Particle => Particle,
} default Basic);

value_enum!(AvailableShading => ShadingType {
    None => None,
    Diffuse => Diffuse,
    Electron => Electron,
} default Diffuse);

value_enum!(AvailableFormat => FrameBufferFormat {
    Rgba8 => RgbaI8,
    Bgra8 => BgraI8,
    Rgb8 => RgbI8,
    RgbaF32 => RgbaF32,
} default Rgba8);

value_enum!(AvailableCamera => CameraType {
    Perspective => Perspective,
    Stereo => Stereo,
    Orthographic => Orthographic,
    Panoramic => Panoramic,
    Clipped => Clipped,
} default Perspective);

value_enum!(AvailableStereo => StereoMode {
    None => None,
    Left => Left,
    Right => Right,
    SideBySide => SideBySide,
} default None);

value_enum!(AvailableColorScheme => ColorScheme {
    None => None,
    NeuronById => NeuronById,
    NeuronByType => NeuronByType,
    NeuronBySegmentType => NeuronBySegmentType,
    ProteinById => ProteinById,
    ProteinAtoms => ProteinAtoms,
    ProteinChains => ProteinChains,
    ProteinResidues => ProteinResidues,
} default ProteinAtoms);

value_enum!(AvailableMaterials => MaterialType {
    Default => Default,
    Random => Random,
    ShadesOfGrey => ShadesOfGrey,
    Gradient => Gradient,
    PastelColors => PastelColors,
} default Default);

value_enum!(AvailableQuality => GeometryQuality {
    Low => Low,
    Medium => Medium,
    High => High,
} default High);

value_enum!(AvailableEnvironment => SceneEnvironment {
    None => None,
    Ground => Ground,
    Wall => Wall,
    BoundingBox => BoundingBox,
} default None);

value_enum!(AvailableScene => DemoScene {
    Spheres => Spheres,
    Molecule => Molecule,
} default Spheres);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl std::str::FromStr for Dimensions {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut split_it = s.split('x');
        let (Some(a), Some(b), None) = (split_it.next(), split_it.next(), split_it.next()) else {
            return Err(anyhow::anyhow!("Incorrect format, see help"));
        };
        let width: u32 = a.parse()?;
        let height: u32 = b.parse()?;
        if width == 0 || height == 0 {
            return Err(anyhow::anyhow!("dimensions must not be zero"));
        }

        Ok(Dimensions { width, height })
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}x{}", self.width, self.height))
    }
}

impl From<Dimensions> for glam::UVec2 {
    fn from(value: Dimensions) -> Self {
        glam::UVec2::new(value.width, value.height)
    }
}

/// `RRGGBB`, with an optional leading `#`
pub fn parse_color(s: &str) -> anyhow::Result<Rgb> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 6 {
        return Err(anyhow::anyhow!("expected a RRGGBB color, got {s:?}"));
    }
    Ok(Rgb::from_hex(u32::from_str_radix(hex, 16)?))
}
