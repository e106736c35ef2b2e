use glam::Vec3;

use crate::color::Rgb;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Point {
        position: Vec3,
        color: Rgb,
        intensity: f32,
    },
    Directional {
        /// Direction the light travels in
        direction: Vec3,
        color: Rgb,
        intensity: f32,
    },
}

/// Light arriving at a point
#[derive(Debug, Clone, Copy)]
pub struct LightSample {
    /// Unit vector from the point towards the light
    pub direction: Vec3,
    pub distance: f32,
    pub radiance: Rgb,
}

impl Light {
    pub fn point(position: Vec3) -> Self {
        Light::Point {
            position,
            color: Rgb::from_array([1.0, 1.0, 1.0]),
            intensity: 1.0,
        }
    }

    pub fn directional(direction: Vec3) -> Self {
        Light::Directional {
            direction: direction.normalize_or_zero(),
            color: Rgb::from_array([1.0, 1.0, 1.0]),
            intensity: 1.0,
        }
    }

    pub fn sample(&self, point: Vec3) -> Option<LightSample> {
        match *self {
            Light::Point {
                position,
                color,
                intensity,
            } => {
                let to_light = position - point;
                let distance = to_light.length();
                (distance > f32::EPSILON).then(|| LightSample {
                    direction: to_light / distance,
                    distance,
                    radiance: intensity * color,
                })
            }
            Light::Directional {
                direction,
                color,
                intensity,
            } => {
                let direction = (-direction).try_normalize()?;
                Some(LightSample {
                    direction,
                    distance: f32::INFINITY,
                    radiance: intensity * color,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_light_direction_and_distance() {
        let s = Light::point(Vec3::new(0.0, 4.0, 0.0))
            .sample(Vec3::ZERO)
            .unwrap();
        assert_eq!(s.direction, Vec3::Y);
        assert_eq!(s.distance, 4.0);
    }

    #[test]
    fn directional_light_points_back() {
        let s = Light::directional(-Vec3::Y).sample(Vec3::ZERO).unwrap();
        assert_eq!(s.direction, Vec3::Y);
        assert!(s.distance.is_infinite());
    }
}
