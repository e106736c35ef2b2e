//! Colorspaces the renderer works with.
//!
//! Shading happens in linear RGB. Frame buffers holding 8-bit channels store sRGB,
//! floating point frame buffers store linear values untouched.

pub trait Colorspace: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug {}

/// Linear sRGB. The way to go for math manipulations.
#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(non_camel_case_types)]
pub struct Linear_RGB;

impl Linear_RGB {
    pub fn from_srgb(srgb: f32) -> f32 {
        if srgb.is_nan() {
            return 0.0;
        }
        let srgb = srgb.clamp(0.0, 1.0);
        if srgb <= 0.04045 {
            srgb / 12.92
        } else {
            ((srgb + 0.055) / 1.055).powf(2.4)
        }
    }
}

impl Colorspace for Linear_RGB {}

/// Gamma encoded sRGB, a transfer format for 8-bit storage and displays.
///
/// Do not do math on it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[allow(non_camel_case_types)]
pub struct sRGB;

impl sRGB {
    pub fn from_linear_rgb(linear: f32) -> f32 {
        if linear.is_nan() {
            return 0.0;
        }
        let linear = linear.clamp(0.0, 1.0);
        if linear < 0.0031308 {
            12.92 * linear
        } else {
            1.055 * linear.powf(1.0 / 2.4) - 0.055
        }
    }
}

impl Colorspace for sRGB {}
