//! Ray/shape intersection interface.
//!
//! Geometric primitives (see [crate::geometry]) implement [Shape] and only know about
//! their surface. The aggregate attaches the material and the primitive index of
//! the hit, which gives a [local_info::Full].

use crate::{math::bounds::Bounds, ray::Ray};

/// An abstracted shape to be rendered by raytracing.
///
/// To render a shape we only need to know whether a ray intersect it and if so,
///  some information about the shape at the intersection point
pub trait Shape: Sync + Send {
    /// Check whether `ray` intersect the shape defined by `self` if so, gives the surface information
    fn intersection_full(&self, ray: Ray) -> SurfaceIntersectionResult;

    /// Check whether `ray` intersect the shape defined by `self` if so, return the minimal amount of information
    /// It is often used to cast shadow rays
    fn intersect_bare(&self, ray: Ray) -> MinIntersectionResult;

    /// Returns the bounding box of the shape
    fn bounding_box(&self) -> Bounds;
}

pub mod local_info {
    use glam::Vec3;

    use crate::material::{texture::Uv, MaterialId};

    /// Surface information computed by a shape
    #[derive(Debug, Clone, Copy)]
    pub struct Surface {
        pub pos: Vec3,
        /// Outward facing, normalized
        pub normal: Vec3,
        pub uv: Uv,
    }

    /// Everything an integrator may need about a hit
    #[derive(Debug, Clone, Copy)]
    pub struct Full {
        pub pos: Vec3,
        pub normal: Vec3,
        pub uv: Uv,
        pub material: MaterialId,
        /// Index of the primitive in commit order
        pub primitive: usize,
    }

    impl Full {
        pub fn from_surface(surface: Surface, material: MaterialId, primitive: usize) -> Self {
            Self {
                pos: surface.pos,
                normal: surface.normal,
                uv: surface.uv,
                material,
                primitive,
            }
        }
    }

    /// Contains only the pure geometrical information needed to locate the point.
    #[derive(Debug, Clone, Copy)]
    pub struct Minimum {
        pub pos: Vec3,
    }
}

/// Holds local informations and the time of a colision between a ray and a shape.
#[derive(Debug, Clone, Copy)]
pub struct RayIntersection<LocalInfo> {
    pub t: f32,
    pub local_info: LocalInfo,
}

/// A `Result`-like type that takes care of intersections data.
#[derive(Debug, Clone, Copy)]
pub enum IntersectionResult<LocalInfo> {
    Intersection(RayIntersection<LocalInfo>),
    NoIntersection,
}

impl<T> IntersectionResult<T> {
    pub fn is_intersection(&self) -> bool {
        matches!(self, Self::Intersection(_))
    }

    pub fn t(&self) -> Option<f32> {
        match self {
            Self::Intersection(i) => Some(i.t),
            Self::NoIntersection => None,
        }
    }

    pub fn into_option(self) -> Option<RayIntersection<T>> {
        match self {
            Self::Intersection(i) => Some(i),
            Self::NoIntersection => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> IntersectionResult<U> {
        match self {
            Self::Intersection(RayIntersection { t, local_info }) => {
                IntersectionResult::Intersection(RayIntersection {
                    t,
                    local_info: f(local_info),
                })
            }
            Self::NoIntersection => IntersectionResult::NoIntersection,
        }
    }

    /// Closest of the two
    pub fn min(self, other: Self) -> Self {
        let Self::Intersection(RayIntersection { t: t1, .. }) = self else {
            return other;
        };
        let Self::Intersection(RayIntersection { t: t2, .. }) = other else {
            return self;
        };

        if t1 < t2 {
            self
        } else {
            other
        }
    }
}

pub type MinIntersectionResult = IntersectionResult<local_info::Minimum>;
pub type SurfaceIntersectionResult = IntersectionResult<local_info::Surface>;
pub type FullIntersectionResult = IntersectionResult<local_info::Full>;
