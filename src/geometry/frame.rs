use crate::error::{GeometryError, Result};
use crate::math::{perpendicular_dir, rotation_matrix, Point3, Vector3, TOLERANCE};

use super::link::LinkPoint;

/// An oriented right-handed coordinate system: origin plus orthonormal X, Y, Z.
///
/// Y is the primary (beam) direction of a component, Z is "up" and
/// `X = Y x Z`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    origin: Point3,
    x: Vector3,
    y: Vector3,
    z: Vector3,
}

impl Default for Frame {
    fn default() -> Self {
        Self::world()
    }
}

impl Frame {
    /// The world frame: origin at zero, axes along the world axes.
    #[must_use]
    pub fn world() -> Self {
        Self {
            origin: Point3::origin(),
            x: Vector3::x(),
            y: Vector3::y(),
            z: Vector3::z(),
        }
    }

    /// Builds a frame with the given primary axis and an "up" hint.
    ///
    /// If the hint is parallel to `y_axis` an arbitrary perpendicular is used.
    ///
    /// # Errors
    ///
    /// Returns an error if `y_axis` is zero-length.
    pub fn new(origin: Point3, y_axis: Vector3, z_hint: Vector3) -> Result<Self> {
        let len = y_axis.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let y = y_axis / len;
        let mut x = y.cross(&z_hint);
        if x.norm() < TOLERANCE {
            x = perpendicular_dir(&y);
        }
        let x = x.normalize();
        let z = x.cross(&y);
        Ok(Self { origin, x, y, z })
    }

    /// Builds the frame seen at a parent's link point: origin at the link
    /// point, Y along the link axis, Z kept as close to the parent's Z as
    /// the new Y allows.
    ///
    /// # Errors
    ///
    /// Returns an error if the link axis is zero-length.
    pub fn from_link(parent: &Frame, link: &LinkPoint) -> Result<Self> {
        let hint = if link.axis.cross(&parent.z).norm() < TOLERANCE {
            parent.x
        } else {
            parent.z
        };
        Self::new(link.point, link.axis, hint)
    }

    /// Moves the origin by a displacement expressed in this frame's axes.
    pub fn apply_shift(&mut self, dx: f64, dy: f64, dz: f64) {
        self.origin += self.x * dx + self.y * dy + self.z * dz;
    }

    /// Rotates the frame about its own Z by `xy_deg`, then about the
    /// resulting X by `z_deg`. Angles are in degrees.
    pub fn apply_angle(&mut self, xy_deg: f64, z_deg: f64) {
        if xy_deg.abs() > TOLERANCE {
            let r = rotation_matrix(&self.z, xy_deg.to_radians());
            self.x = r * self.x;
            self.y = r * self.y;
        }
        if z_deg.abs() > TOLERANCE {
            let r = rotation_matrix(&self.x, z_deg.to_radians());
            self.y = r * self.y;
            self.z = r * self.z;
        }
    }

    /// Converts a point in local coordinates to world coordinates.
    #[must_use]
    pub fn to_world(&self, local: &Vector3) -> Point3 {
        self.origin + self.direction(local)
    }

    /// Converts a local direction to a world direction.
    #[must_use]
    pub fn direction(&self, local: &Vector3) -> Vector3 {
        self.x * local.x + self.y * local.y + self.z * local.z
    }

    /// Returns the origin.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the X axis.
    #[must_use]
    pub fn x(&self) -> &Vector3 {
        &self.x
    }

    /// Returns the Y (primary) axis.
    #[must_use]
    pub fn y(&self) -> &Vector3 {
        &self.y
    }

    /// Returns the Z axis.
    #[must_use]
    pub fn z(&self) -> &Vector3 {
        &self.z
    }

    /// Checks unit length and mutual perpendicularity of the axes.
    #[must_use]
    pub fn is_orthonormal(&self, tol: f64) -> bool {
        let unit = |v: &Vector3| (v.norm() - 1.0).abs() < tol;
        unit(&self.x)
            && unit(&self.y)
            && unit(&self.z)
            && self.x.dot(&self.y).abs() < tol
            && self.y.dot(&self.z).abs() < tol
            && self.z.dot(&self.x).abs() < tol
    }
}
