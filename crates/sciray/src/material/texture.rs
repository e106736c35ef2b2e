use crate::color::Rgb;

pub type Uv = [f32; 2];

pub trait Texture: Sync + Send + std::fmt::Debug {
    fn color(&self, uv: Uv) -> Rgb;
}

#[derive(Debug)]
pub struct Uniform(pub Rgb);

impl Texture for Uniform {
    fn color(&self, _: Uv) -> Rgb {
        self.0
    }
}

#[derive(Debug)]
pub struct Checker {
    pub odd: Rgb,
    pub even: Rgb,
    pub frequency: f32,
}

impl Texture for Checker {
    fn color(&self, uv: Uv) -> Rgb {
        let w = std::f32::consts::TAU * self.frequency;
        let even = f32::cos(w * uv[0]) * f32::cos(w * uv[1]) > 0.0;
        if even {
            self.even
        } else {
            self.odd
        }
    }
}

/// Texels in row major order, `v = 0` is the top row
#[derive(Debug)]
pub struct ImageTexture {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<Rgb>,
}

impl ImageTexture {
    pub fn new(width: u32, height: u32, texels: Vec<Rgb>) -> Option<Self> {
        (width > 0 && height > 0 && texels.len() == (width * height) as usize).then_some(Self {
            width,
            height,
            texels,
        })
    }

    /// Vertical gradient, used as the default skybox
    pub fn gradient(top: Rgb, bottom: Rgb, height: u32) -> Self {
        let height = height.max(2);
        let texels = (0..height)
            .map(|y| top.lerp(bottom, y as f32 / (height - 1) as f32))
            .collect();
        Self {
            width: 1,
            height,
            texels,
        }
    }
}

impl Texture for ImageTexture {
    fn color(&self, uv: Uv) -> Rgb {
        let x = (uv[0].rem_euclid(1.0) * self.width as f32) as u32;
        let y = (uv[1].clamp(0.0, 1.0) * self.height as f32) as u32;
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[(y * self.width + x) as usize]
    }
}
