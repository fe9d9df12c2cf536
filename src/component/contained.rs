use crate::error::Result;
use crate::geometry::rule::SurfaceLookup;
use crate::geometry::Rule;
use crate::math::Point3;

/// Outer boundary of a component, for point-in-component queries and for
/// cutting the component out of whatever surrounds it.
#[derive(Debug, Clone, Default)]
pub struct ContainedComp {
    outer: Vec<Rule>,
    boundary: Option<Rule>,
}

impl ContainedComp {
    /// Creates an empty boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares one more region as part of the component's outside shape.
    pub fn add_outer_region(&mut self, rule: Rule) {
        self.outer.push(rule);
    }

    /// Restricts the component to `rule` in addition to any earlier cut.
    /// Must be applied before cells are created to take effect on them.
    pub fn add_boundary_cut(&mut self, rule: Rule) {
        self.boundary = Some(match self.boundary.take() {
            Some(existing) => existing.and(rule),
            None => rule,
        });
    }

    /// Current boundary cut, if any.
    #[must_use]
    pub fn boundary(&self) -> Option<&Rule> {
        self.boundary.as_ref()
    }

    /// Returns `true` before any outer region is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    /// Region occupied by the whole component.
    #[must_use]
    pub fn exterior(&self) -> Rule {
        let union = self
            .outer
            .iter()
            .cloned()
            .reduce(Rule::or)
            .unwrap_or(Rule::Union(Vec::new()));
        match &self.boundary {
            Some(cut) => union.and(cut.clone()),
            None => union,
        }
    }

    /// Tests whether `point` lies inside the component.
    ///
    /// # Errors
    ///
    /// Returns an error if the boundary references an unregistered surface.
    pub fn is_inside(&self, point: &Point3, lookup: &impl SurfaceLookup) -> Result<bool> {
        if self.outer.is_empty() {
            return Ok(false);
        }
        self.exterior().contains(point, lookup)
    }
}
