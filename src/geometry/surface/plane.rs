use std::fmt;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::HalfSpace;

/// An infinite plane `n . x = d`.
///
/// The positive sense is the side the unit normal points into.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    normal: Vector3,
    distance: f64,
}

impl Plane {
    /// Creates a plane through `origin` with the given normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;
        Ok(Self {
            normal,
            distance: normal.dot(&origin.coords),
        })
    }

    /// Returns the unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the signed distance of the plane from the world origin.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }
}

impl HalfSpace for Plane {
    fn side(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.distance
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "p {} {} {} {}",
            self.normal.x, self.normal.y, self.normal.z, self.distance
        )
    }
}
