use std::marker::PhantomData;

pub mod colorspace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color<S>(pub [f32; 3], PhantomData<S>)
where
    S: colorspace::Colorspace;

impl<S: colorspace::Colorspace> Default for Color<S> {
    fn default() -> Self {
        Self::from_array([0.0; 3])
    }
}

impl<S: colorspace::Colorspace> std::ops::Add for Color<S> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_array([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
        ])
    }
}

impl<S: colorspace::Colorspace> std::ops::AddAssign for Color<S> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Componentwise product, used to filter light by an albedo
impl<S: colorspace::Colorspace> std::ops::Mul for Color<S> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::from_array([
            self.0[0] * rhs.0[0],
            self.0[1] * rhs.0[1],
            self.0[2] * rhs.0[2],
        ])
    }
}

impl<S: colorspace::Colorspace> std::ops::Mul<Color<S>> for f32 {
    type Output = Color<S>;

    fn mul(self, rhs: Color<S>) -> Self::Output {
        Color::from_array(rhs.0.map(|c| self * c))
    }
}

impl<S: colorspace::Colorspace> std::ops::Div<f32> for Color<S> {
    type Output = Color<S>;

    fn div(self, rhs: f32) -> Self::Output {
        Color::from_array(self.0.map(|c| c / rhs))
    }
}

#[allow(non_camel_case_types)]
pub type sRgb = Color<colorspace::sRGB>;
pub type Rgb = Color<colorspace::Linear_RGB>;

impl<S: colorspace::Colorspace> Color<S> {
    pub const fn from_array(arr: [f32; 3]) -> Self {
        Self(arr, PhantomData)
    }

    pub const fn to_array(self) -> [f32; 3] {
        self.0
    }

    pub fn to_byte_array(self) -> [u8; 3] {
        self.0.map(|c| (c.clamp(0.0, 1.0) * 255. + 0.5) as u8)
    }

    /// `0xRRGGBB`
    pub fn from_hex(hex: u32) -> Self {
        Self::from_bytes([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8])
    }

    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::from_array(bytes.map(|b| b as f32 / 255.0))
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        (1.0 - t) * self + t * other
    }

    pub fn max_component(self) -> f32 {
        self.0[0].max(self.0[1]).max(self.0[2])
    }
}

impl<S: colorspace::Colorspace> From<[f32; 3]> for Color<S> {
    fn from(val: [f32; 3]) -> Self {
        Color::<S>::from_array(val)
    }
}

pub trait ColorspaceConversion<C: colorspace::Colorspace> {
    fn convert(self) -> Color<C>;
}

impl<C: colorspace::Colorspace> ColorspaceConversion<C> for Color<C> {
    fn convert(self) -> Color<C> {
        self
    }
}

impl ColorspaceConversion<colorspace::Linear_RGB> for sRgb {
    fn convert(self) -> Rgb {
        Color::from_array(self.to_array().map(colorspace::Linear_RGB::from_srgb))
    }
}

impl ColorspaceConversion<colorspace::sRGB> for Rgb {
    fn convert(self) -> sRgb {
        Color::from_array(self.to_array().map(colorspace::sRGB::from_linear_rgb))
    }
}

impl Rgb {
    pub fn to_srgb(self) -> sRgb {
        self.convert()
    }
}

pub mod linear {
    use super::Rgb;

    pub const WHITE: Rgb = Rgb::from_array([1.0, 1.0, 1.0]);
    pub const BLACK: Rgb = Rgb::from_array([0.0, 0.0, 0.0]);
    pub const RED: Rgb = Rgb::from_array([1.0, 0.0, 0.0]);
    pub const GREEN: Rgb = Rgb::from_array([0.0, 1.0, 0.0]);
    pub const BLUE: Rgb = Rgb::from_array([0.0, 0.0, 1.0]);
}
