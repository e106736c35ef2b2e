use glam::{Mat4, UVec2, Vec3, Vec4};
use rand::{distributions::Uniform, prelude::Distribution, Rng};

use crate::{
    math::{bounds::Bounds, distributions::UniformUnitBall2},
    ray::Ray,
    render_io::RenderInput,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CameraType {
    #[default]
    Perspective,
    Stereo,
    Orthographic,
    Panoramic,
    /// Perspective camera honoring [Camera::clip_planes]
    Clipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StereoMode {
    #[default]
    None,
    Left,
    Right,
    /// Left eye on the left half of the image, right eye on the right half
    SideBySide,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub camera_type: CameraType,
    pub stereo_mode: StereoMode,
    /// Vertical field of view, in degrees
    pub field_of_view: f32,
    /// Width over height
    pub aspect_ratio: f32,
    /// Diameter of the lens, 0 is a pinhole
    pub aperture: f32,
    /// Distance to the plane in focus
    pub focal_distance: f32,
    pub eye_separation: f32,
    /// `(nx, ny, nz, d)`: points with `n.p + d >= 0` are kept
    pub clip_planes: Vec<Vec4>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            camera_type: CameraType::default(),
            stereo_mode: StereoMode::default(),
            field_of_view: 45.0,
            aspect_ratio: 1.0,
            aperture: 0.0,
            focal_distance: 1.0,
            eye_separation: 0.0635,
            clip_planes: Vec::new(),
        }
    }
}

/// Orthonormal camera basis
struct Basis {
    forward: Vec3,
    right: Vec3,
    up: Vec3,
}

impl Camera {
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            position,
            target,
            up,
            focal_distance: position.distance(target).max(f32::EPSILON),
            ..Default::default()
        }
    }

    pub fn set_aspect_from_size(&mut self, size: UVec2) {
        if size.x > 0 && size.y > 0 {
            self.aspect_ratio = size.x as f32 / size.y as f32;
        }
    }

    /// Looks at the center of `bounds` from the +Z side, far enough for the whole
    /// box to fit in the field of view.
    pub fn set_initial_state(&mut self, bounds: &Bounds) {
        let center = bounds.center();
        let radius = (0.5 * bounds.size().length()).max(1e-3);
        let half_fov = 0.5 * self.field_of_view.to_radians();
        let distance = radius / half_fov.sin().max(1e-3);

        self.target = center;
        self.position = center + Vec3::new(0.0, 0.0, distance);
        self.up = Vec3::Y;
        self.focal_distance = distance;
        log::info!(
            "camera framing {:?}..{:?} from {:?}",
            bounds.min,
            bounds.max,
            self.position
        );
    }

    pub fn apply_render_input(&mut self, input: &RenderInput) {
        self.position = input.position;
        self.target = input.target;
        self.up = input.up;
        self.set_aspect_from_size(input.window_size);
    }

    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, near: f32, far: f32) -> Mat4 {
        match self.camera_type {
            CameraType::Orthographic => {
                let half_h = self.ortho_half_height();
                let half_w = half_h * self.aspect_ratio;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, near, far)
            }
            _ => Mat4::perspective_rh(
                self.field_of_view.to_radians(),
                self.aspect_ratio,
                near,
                far,
            ),
        }
    }

    fn ortho_half_height(&self) -> f32 {
        self.position.distance(self.target) * (0.5 * self.field_of_view.to_radians()).tan()
    }

    fn basis(&self) -> Basis {
        let forward = self.direction();
        let right = forward.cross(self.up).try_normalize().unwrap_or(Vec3::X);
        let up = right.cross(forward);
        Basis { forward, right, up }
    }

    /// Generates the ray through `coord`.
    ///
    /// Returns `None` when the ray is entirely clipped away.
    pub fn ray<R: Rng + ?Sized>(&self, rng: &mut R, coord: ViewportCoord) -> Option<Ray> {
        let basis = self.basis();
        let half_h = (0.5 * self.field_of_view.to_radians()).tan();
        let ViewportCoord { mut vx, vy } = coord;

        let ray = match self.camera_type {
            CameraType::Orthographic => {
                let half_h = self.ortho_half_height();
                let half_w = half_h * self.aspect_ratio;
                let origin =
                    self.position + vx * half_w * basis.right - vy * half_h * basis.up;
                Ray::new(origin, basis.forward)
            }
            CameraType::Panoramic => {
                let lon = vx * std::f32::consts::PI;
                let lat = -vy * std::f32::consts::FRAC_PI_2;
                let direction = lat.cos() * (lon.sin() * basis.right + lon.cos() * basis.forward)
                    + lat.sin() * basis.up;
                Ray::new(self.position, direction)
            }
            CameraType::Perspective | CameraType::Stereo | CameraType::Clipped => {
                let mut aspect = self.aspect_ratio;
                let mut eye = 0.0;
                if self.camera_type == CameraType::Stereo {
                    match self.stereo_mode {
                        StereoMode::None => (),
                        StereoMode::Left => eye = -0.5,
                        StereoMode::Right => eye = 0.5,
                        StereoMode::SideBySide => {
                            aspect *= 0.5;
                            if vx < 0.0 {
                                eye = -0.5;
                                vx = 2.0 * vx + 1.0;
                            } else {
                                eye = 0.5;
                                vx = 2.0 * vx - 1.0;
                            }
                        }
                    }
                }
                let half_w = half_h * aspect;
                let eye_pos = self.position + eye * self.eye_separation * basis.right;
                let direction = basis.forward + vx * half_w * basis.right - vy * half_h * basis.up;

                if self.aperture > 0.0 {
                    let focus = eye_pos + self.focal_distance * direction;
                    let [dx, dy] = UniformUnitBall2.sample(rng);
                    let origin =
                        eye_pos + 0.5 * self.aperture * (dx * basis.right + dy * basis.up);
                    Ray::new(origin, focus - origin)
                } else {
                    Ray::new(eye_pos, direction)
                }
            }
        };

        if self.camera_type == CameraType::Clipped {
            clip(ray, &self.clip_planes)
        } else {
            Some(ray)
        }
    }
}

/// Restricts the ray range to the kept side of every plane
fn clip(mut ray: Ray, planes: &[Vec4]) -> Option<Ray> {
    for plane in planes {
        let n = plane.truncate();
        let dist = n.dot(ray.origin) + plane.w;
        let slope = n.dot(ray.direction);
        if slope.abs() < f32::EPSILON {
            if dist < 0.0 {
                return None;
            }
            continue;
        }
        let t = -dist / slope;
        if slope > 0.0 {
            ray.bounds.0 = ray.bounds.0.max(t);
        } else {
            ray.bounds.1 = ray.bounds.1.min(t);
        }
    }
    (ray.bounds.0 <= ray.bounds.1).then_some(ray)
}

/// Represent a coordinate in the pixel space.
///
/// $\left\(0, 0\right)$ is the top left corner.
#[derive(Debug, Clone, Copy)]
pub struct PixelCoord {
    pub x: f32,
    pub y: f32,
}

impl PixelCoord {
    /// Sample a point around the pixel located at `coords`
    ///
    /// Given a pixel coordinate (x, y), the sample is taken uniformely in
    /// $\left[x, x+1\right[ \times \left[y, y+1\right[$
    pub fn sample_around<R: Rng + ?Sized>(rng: &mut R, x: u32, y: u32) -> PixelCoord {
        let uniform = Uniform::new(0., 1.);
        let dx = uniform.sample(rng);
        let dy = uniform.sample(rng);
        PixelCoord {
            x: x as f32 + dx,
            y: y as f32 + dy,
        }
    }
}

/// Represent a coordinate in the viewport space.
///
/// The viewport is mapped to the range $\left[-1, 1\right]$ for both `vx` and `vy`.
///
/// $\left(-1, -1\right)$ is the top left corner
#[derive(Debug, Clone, Copy)]
pub struct ViewportCoord {
    pub vx: f32,
    pub vy: f32,
}

impl ViewportCoord {
    pub fn from_pixel_coord(size: UVec2, coord: PixelCoord) -> Self {
        Self {
            vx: 2. * (coord.x / size.x.max(1) as f32) - 1.,
            vy: 2. * (coord.y / size.y.max(1) as f32) - 1.,
        }
    }
}
