use crate::error::{GeometryError, ReferenceError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::rule::Rule;

/// A published attachment point: a point on a component boundary, the
/// outward direction there, and the surface rule that bounds it.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPoint {
    /// Point on the boundary.
    pub point: Point3,
    /// Outward unit direction.
    pub axis: Vector3,
    /// Region on the far side of the link surface.
    pub surface: Rule,
}

impl LinkPoint {
    /// The same attachment seen from the other side.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            point: self.point,
            axis: -self.axis,
            surface: self.surface.complement(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct LinkSlot {
    name: Option<String>,
    link: Option<LinkPoint>,
}

/// The fixed, pre-declared set of links owned by one component.
///
/// Slots are declared up front; each becomes resolvable once the owning
/// component publishes it.
#[derive(Debug, Clone)]
pub struct LinkSet {
    owner: String,
    slots: Vec<LinkSlot>,
}

impl LinkSet {
    /// Declares `count` unpublished links for `owner`.
    #[must_use]
    pub fn new(owner: impl Into<String>, count: usize) -> Self {
        Self {
            owner: owner.into(),
            slots: vec![LinkSlot::default(); count],
        }
    }

    /// Number of declared links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no links are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn slot(&self, index: usize) -> Result<&LinkSlot> {
        self.slots.get(index).ok_or_else(|| {
            ReferenceError::LinkOutOfRange {
                component: self.owner.clone(),
                index,
                declared: self.slots.len(),
            }
            .into()
        })
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut LinkSlot> {
        let declared = self.slots.len();
        let owner = &self.owner;
        self.slots.get_mut(index).ok_or_else(|| {
            ReferenceError::LinkOutOfRange {
                component: owner.clone(),
                index,
                declared,
            }
            .into()
        })
    }

    /// Publishes the point and outward axis of link `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the axis is zero-length.
    pub fn set_connect(&mut self, index: usize, point: Point3, axis: Vector3) -> Result<()> {
        let len = axis.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let slot = self.slot_mut(index)?;
        let surface = slot.link.take().map(|l| l.surface).unwrap_or_default();
        slot.link = Some(LinkPoint {
            point,
            axis: axis / len,
            surface,
        });
        Ok(())
    }

    /// Attaches the bounding surface rule to an already published link.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or the link is unpublished.
    pub fn set_link_surf(&mut self, index: usize, surface: Rule) -> Result<()> {
        let owner = self.owner.clone();
        let slot = self.slot_mut(index)?;
        let link = slot
            .link
            .as_mut()
            .ok_or(ReferenceError::LinkUnset {
                component: owner,
                index,
            })?;
        link.surface = surface;
        Ok(())
    }

    /// Gives link `index` a name usable with [`LinkSet::link_by_name`].
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn name_link(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        self.slot_mut(index)?.name = Some(name.into());
        Ok(())
    }

    /// Resolves a published link.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or not yet published.
    pub fn link(&self, index: usize) -> Result<&LinkPoint> {
        self.slot(index)?.link.as_ref().ok_or_else(|| {
            ReferenceError::LinkUnset {
                component: self.owner.clone(),
                index,
            }
            .into()
        })
    }

    /// Index of the link called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if no link carries that name.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.slots
            .iter()
            .position(|s| s.name.as_deref() == Some(name))
            .ok_or_else(|| {
                ReferenceError::UnknownLink {
                    component: self.owner.clone(),
                    name: name.to_owned(),
                }
                .into()
            })
    }

    /// Resolves a published link by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown or the link is unpublished.
    pub fn link_by_name(&self, name: &str) -> Result<&LinkPoint> {
        self.link(self.index_of(name)?)
    }

    /// Returns `true` once every declared link has been published.
    #[must_use]
    pub fn all_published(&self) -> bool {
        self.slots.iter().all(|s| s.link.is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CellforgeError;

    #[test]
    fn unpublished_link_is_unresolvable() {
        let links = LinkSet::new("wall", 2);
        assert!(matches!(
            links.link(0),
            Err(CellforgeError::Reference(ReferenceError::LinkUnset { index: 0, .. }))
        ));
    }

    #[test]
    fn out_of_range_link() {
        let mut links = LinkSet::new("wall", 2);
        assert!(matches!(
            links.link(2),
            Err(CellforgeError::Reference(ReferenceError::LinkOutOfRange {
                index: 2,
                declared: 2,
                ..
            }))
        ));
        assert!(links
            .set_connect(5, Point3::origin(), Vector3::y())
            .is_err());
    }

    #[test]
    fn connect_then_surface() {
        let mut links = LinkSet::new("wall", 1);
        assert!(links.set_link_surf(0, Rule::Surf(-3)).is_err());
        links
            .set_connect(0, Point3::new(0.0, -1.0, 0.0), Vector3::new(0.0, -2.0, 0.0))
            .unwrap();
        links.set_link_surf(0, Rule::Surf(-3)).unwrap();
        let l = links.link(0).unwrap();
        assert!((l.axis - Vector3::new(0.0, -1.0, 0.0)).norm() < TOLERANCE);
        assert_eq!(l.surface, Rule::Surf(-3));
        assert!(links.all_published());
    }

    #[test]
    fn named_lookup() {
        let mut links = LinkSet::new("wall", 2);
        links.name_link(1, "back").unwrap();
        links.set_connect(1, Point3::origin(), Vector3::y()).unwrap();
        assert_eq!(links.index_of("back").unwrap(), 1);
        assert!(links.link_by_name("back").is_ok());
        assert!(links.link_by_name("front").is_err());
    }

    #[test]
    fn reversed_flips_axis_and_sense() {
        let l = LinkPoint {
            point: Point3::origin(),
            axis: Vector3::y(),
            surface: Rule::Surf(4),
        };
        let r = l.reversed();
        assert_eq!(r.axis, -Vector3::y());
        assert_eq!(r.surface, Rule::Surf(-4));
    }
}
