use std::fmt;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, TOLERANCE};

use super::HalfSpace;

/// A sphere given by center and radius. The positive sense is outside.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    center: Point3,
    radius: f64,
}

impl Sphere {
    /// Creates a new sphere.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive.
    pub fn new(center: Point3, radius: f64) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("sphere radius must be positive".into()).into(),
            );
        }
        Ok(Self { center, radius })
    }

    /// Returns the center of the sphere.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl HalfSpace for Sphere {
    fn side(&self, point: &Point3) -> f64 {
        (point - self.center).norm() - self.radius
    }
}

impl fmt::Display for Sphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "s {} {} {} {}",
            self.center.x, self.center.y, self.center.z, self.radius
        )
    }
}
