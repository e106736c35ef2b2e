//! Maps a scalar simulation value to a color, an opacity and an emission.

use glam::Vec2;

use crate::color::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferFunctionAttribute {
    Red,
    Green,
    Blue,
    Alpha,
    Emission,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSample {
    pub color: Rgb,
    pub alpha: f32,
    pub emission: f32,
}

/// Control points are `(x, y)` pairs with `x` in `[0, 1]` spanning `range`.
/// Attributes without control points evaluate to 1, except emission which is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    pub range: (f32, f32),
    red: Vec<Vec2>,
    green: Vec<Vec2>,
    blue: Vec<Vec2>,
    alpha: Vec<Vec2>,
    emission: Vec<Vec2>,
}

impl Default for TransferFunction {
    fn default() -> Self {
        Self::new((0.0, 1.0))
    }
}

impl TransferFunction {
    pub fn new(range: (f32, f32)) -> Self {
        Self {
            range,
            red: Vec::new(),
            green: Vec::new(),
            blue: Vec::new(),
            alpha: Vec::new(),
            emission: Vec::new(),
        }
    }

    /// Blue to red through green, fully opaque
    pub fn rainbow(range: (f32, f32)) -> Self {
        let mut tf = Self::new(range);
        tf.set_control_points(
            TransferFunctionAttribute::Red,
            vec![Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.0), Vec2::new(1.0, 1.0)],
        );
        tf.set_control_points(
            TransferFunctionAttribute::Green,
            vec![Vec2::new(0.0, 0.0), Vec2::new(0.5, 1.0), Vec2::new(1.0, 0.0)],
        );
        tf.set_control_points(
            TransferFunctionAttribute::Blue,
            vec![Vec2::new(0.0, 1.0), Vec2::new(0.5, 0.0), Vec2::new(1.0, 0.0)],
        );
        tf
    }

    fn points_mut(&mut self, attribute: TransferFunctionAttribute) -> &mut Vec<Vec2> {
        match attribute {
            TransferFunctionAttribute::Red => &mut self.red,
            TransferFunctionAttribute::Green => &mut self.green,
            TransferFunctionAttribute::Blue => &mut self.blue,
            TransferFunctionAttribute::Alpha => &mut self.alpha,
            TransferFunctionAttribute::Emission => &mut self.emission,
        }
    }

    /// Points are sorted by `x`
    pub fn set_control_points(&mut self, attribute: TransferFunctionAttribute, mut points: Vec<Vec2>) {
        points.retain(|p| p.is_finite());
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        *self.points_mut(attribute) = points;
    }

    pub fn clear(&mut self) {
        for attribute in [
            TransferFunctionAttribute::Red,
            TransferFunctionAttribute::Green,
            TransferFunctionAttribute::Blue,
            TransferFunctionAttribute::Alpha,
            TransferFunctionAttribute::Emission,
        ] {
            self.points_mut(attribute).clear();
        }
    }

    pub fn evaluate(&self, value: f32) -> TransferSample {
        let (lo, hi) = self.range;
        let x = if hi > lo {
            ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        TransferSample {
            color: Rgb::from_array([
                interpolate(&self.red, x, 1.0),
                interpolate(&self.green, x, 1.0),
                interpolate(&self.blue, x, 1.0),
            ]),
            alpha: interpolate(&self.alpha, x, 1.0),
            emission: interpolate(&self.emission, x, 0.0),
        }
    }
}

/// Piecewise linear, constant outside the first and last points
fn interpolate(points: &[Vec2], x: f32, default: f32) -> f32 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return default;
    };
    if x <= first.x {
        return first.y;
    }
    if x >= last.x {
        return last.y;
    }
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if x <= b.x {
            let span = b.x - a.x;
            if span <= f32::EPSILON {
                return b.y;
            }
            return a.y + (b.y - a.y) * (x - a.x) / span;
        }
    }
    last.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_interpolation_between_points() {
        let mut tf = TransferFunction::new((0.0, 10.0));
        tf.set_control_points(
            TransferFunctionAttribute::Alpha,
            vec![Vec2::new(1.0, 1.0), Vec2::new(0.0, 0.0)],
        );
        assert_eq!(tf.evaluate(0.0).alpha, 0.0);
        assert_eq!(tf.evaluate(2.5).alpha, 0.25);
        assert_eq!(tf.evaluate(20.0).alpha, 1.0);
        assert_eq!(tf.evaluate(-3.0).alpha, 0.0);
    }

    #[test]
    fn defaults_without_points() {
        let tf = TransferFunction::default();
        let s = tf.evaluate(0.3);
        assert_eq!(s.color.to_array(), [1.0, 1.0, 1.0]);
        assert_eq!(s.alpha, 1.0);
        assert_eq!(s.emission, 0.0);
    }

    #[test]
    fn rainbow_ends() {
        let tf = TransferFunction::rainbow((0.0, 1.0));
        assert_eq!(tf.evaluate(0.0).color.to_array(), [0.0, 0.0, 1.0]);
        assert_eq!(tf.evaluate(0.5).color.to_array(), [0.0, 1.0, 0.0]);
        assert_eq!(tf.evaluate(1.0).color.to_array(), [1.0, 0.0, 0.0]);
    }
}
