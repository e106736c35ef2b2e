use rand::{distributions::Uniform, prelude::Distribution, SeedableRng};

use super::Material;
use crate::{color::Rgb, Rng};

/// How default user materials are generated
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MaterialType {
    /// Random colors
    #[default]
    Default,
    /// Random colors, with some transparent, reflective or emissive materials
    Random,
    ShadesOfGrey,
    /// From red to yellow
    Gradient,
    PastelColors,
}

/// Builds `count` user materials. The same `seed` yields the same palette.
pub fn build_palette(kind: MaterialType, count: usize, seed: u64) -> Vec<Material> {
    let mut rng = Rng::seed_from_u64(seed);
    let uniform = Uniform::new(0.0f32, 1.0);
    let random_color = |rng: &mut Rng| {
        Rgb::from_array([
            uniform.sample(rng),
            uniform.sample(rng),
            uniform.sample(rng),
        ])
    };

    let step = |i: usize| {
        if count > 1 {
            i as f32 / (count - 1) as f32
        } else {
            0.0
        }
    };

    (0..count)
        .map(|i| match kind {
            MaterialType::Default => Material::diffuse(random_color(&mut rng)),
            MaterialType::Random => {
                let mut material = Material::diffuse(random_color(&mut rng));
                match (uniform.sample(&mut rng) * 10.0) as u32 {
                    0 => material.opacity = 0.5,
                    1 => material.reflection_index = 0.5,
                    2 => material.emission = 2.0 * uniform.sample(&mut rng),
                    3 => {
                        material.opacity = 0.3;
                        material.refraction_index = 1.1;
                    }
                    _ => (),
                }
                material
            }
            MaterialType::ShadesOfGrey => {
                let g = step(i);
                Material::diffuse(Rgb::from_array([g, g, g]))
            }
            MaterialType::Gradient => Material::diffuse(Rgb::from_array([1.0, step(i), 0.0])),
            MaterialType::PastelColors => {
                let c = random_color(&mut rng);
                Material::diffuse(Rgb::from_array(c.to_array().map(|c| 0.5 + 0.5 * c)))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_are_reproducible() {
        let a = build_palette(MaterialType::Random, 16, 3);
        let b = build_palette(MaterialType::Random, 16, 3);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn gradient_goes_from_red_to_yellow() {
        let p = build_palette(MaterialType::Gradient, 3, 0);
        assert_eq!(p[0].diffuse.to_array(), [1.0, 0.0, 0.0]);
        assert_eq!(p[2].diffuse.to_array(), [1.0, 1.0, 0.0]);
    }

    #[test]
    fn pastel_colors_are_light() {
        for m in build_palette(MaterialType::PastelColors, 32, 9) {
            assert!(m.diffuse.to_array().iter().all(|c| *c >= 0.5));
        }
    }
}
