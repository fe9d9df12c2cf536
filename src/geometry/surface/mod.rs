mod cylinder;
mod plane;
mod sphere;

use std::fmt;

pub use cylinder::Cylinder;
pub use plane::Plane;
pub use sphere::Sphere;

use crate::math::Point3;

/// Trait for surfaces that split space into a positive and a negative half.
pub trait HalfSpace {
    /// Signed side value of `point`: positive on the positive sense,
    /// negative on the negative sense, near zero on the surface.
    fn side(&self, point: &Point3) -> f64;

    /// Returns `true` if `point` lies on the positive sense of the surface.
    fn is_positive(&self, point: &Point3) -> bool {
        self.side(point) > 0.0
    }
}

/// A surface descriptor held in the surface registry.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceKind {
    /// A general plane.
    Plane(Plane),
    /// An infinite cylinder about an arbitrary axis.
    Cylinder(Cylinder),
    /// A sphere.
    Sphere(Sphere),
}

impl HalfSpace for SurfaceKind {
    fn side(&self, point: &Point3) -> f64 {
        match self {
            Self::Plane(s) => s.side(point),
            Self::Cylinder(s) => s.side(point),
            Self::Sphere(s) => s.side(point),
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plane(s) => s.fmt(f),
            Self::Cylinder(s) => s.fmt(f),
            Self::Sphere(s) => s.fmt(f),
        }
    }
}

impl From<Plane> for SurfaceKind {
    fn from(s: Plane) -> Self {
        Self::Plane(s)
    }
}

impl From<Cylinder> for SurfaceKind {
    fn from(s: Cylinder) -> Self {
        Self::Cylinder(s)
    }
}

impl From<Sphere> for SurfaceKind {
    fn from(s: Sphere) -> Self {
        Self::Sphere(s)
    }
}
