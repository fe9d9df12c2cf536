use crate::error::{ReferenceError, Result};
use crate::geometry::{Frame, LinkPoint, LinkSet, Rule};
use crate::math::{Point3, Vector3};
use crate::param::ParamSource;
use crate::registry::RangeOffset;

use super::lifecycle::{BuildState, Lifecycle, Stage};
use super::sealed::Token;
use super::FrameOwner;

/// Declared placement of a component relative to the link it hangs from.
///
/// Read from `<name>XStep`, `YStep`, `ZStep`, `XYAngle` and `ZAngle`,
/// each defaulting to zero. Angles are in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedOffset {
    pub x_step: f64,
    pub y_step: f64,
    pub z_step: f64,
    pub xy_angle: f64,
    pub z_angle: f64,
}

impl FixedOffset {
    /// Reads the offset parameters of component `name`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a present key is not numeric.
    pub fn populate(params: &dyn ParamSource, name: &str) -> Result<Self> {
        let get = |suffix: &str| params.get_f64_or(name, &format!("{name}{suffix}"), 0.0);
        Ok(Self {
            x_step: get("XStep")?,
            y_step: get("YStep")?,
            z_step: get("ZStep")?,
            xy_angle: get("XYAngle")?,
            z_angle: get("ZAngle")?,
        })
    }

    /// Rotates then shifts `frame`.
    pub fn apply(&self, frame: &mut Frame) {
        frame.apply_angle(self.xy_angle, self.z_angle);
        frame.apply_shift(self.x_step, self.y_step, self.z_step);
    }
}

/// Frame, links, numeric range and lifecycle tag shared by every component.
#[derive(Debug, Clone)]
pub struct FixedComp {
    name: String,
    frame: Frame,
    links: LinkSet,
    range: Option<RangeOffset>,
    next_cell: i32,
    lifecycle: Lifecycle,
}

impl FixedComp {
    /// Creates an unbuilt component core with `n_links` declared links.
    #[must_use]
    pub fn new(name: impl Into<String>, n_links: usize) -> Self {
        let name = name.into();
        Self {
            links: LinkSet::new(name.clone(), n_links),
            name,
            frame: Frame::world(),
            range: None,
            next_cell: 1,
            lifecycle: Lifecycle::default(),
        }
    }

    /// A built anchor at the world origin with one link facing +Y.
    ///
    /// Root components are placed relative to link 0 of this anchor.
    #[must_use]
    pub fn world() -> Self {
        let mut fc = Self::new("World", 1);
        let published = fc.links.set_connect(0, Point3::origin(), Vector3::y());
        debug_assert!(published.is_ok());
        fc.lifecycle.complete(Stage::CreateLinks);
        fc
    }

    /// Component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current frame.
    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Declared link set.
    #[must_use]
    pub fn links(&self) -> &LinkSet {
        &self.links
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> BuildState {
        self.lifecycle.state()
    }

    pub(crate) fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub(crate) fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    /// Computes this component's frame from `parent` as seen at `link_index`,
    /// then applies `offset`.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error outside the frame stage, or a reference
    /// error if `link_index` is outside the parent's declared links or the
    /// link is not yet published.
    pub fn create_unit_vector(
        &mut self,
        parent: &dyn FrameOwner,
        link_index: usize,
        offset: &FixedOffset,
    ) -> Result<()> {
        self.lifecycle.check(&self.name, Stage::CreateUnitVector)?;
        let link = parent.link(link_index)?;
        let mut frame = Frame::from_link(parent.frame(), link)?;
        offset.apply(&mut frame);
        self.frame = frame;
        Ok(())
    }

    pub(crate) fn assign_range(&mut self, range: RangeOffset) {
        self.next_cell = range.offset + 1;
        self.range = Some(range);
    }

    /// Numeric block granted to this component.
    ///
    /// # Errors
    ///
    /// Returns a reference error before the surface stage.
    pub fn range(&self) -> Result<&RangeOffset> {
        self.range.as_ref().ok_or_else(|| {
            ReferenceError::NoRange {
                component: self.name.clone(),
            }
            .into()
        })
    }

    /// Global number of local surface `local`.
    ///
    /// # Errors
    ///
    /// Returns a reference error before the surface stage.
    pub fn surf(&self, local: i32) -> Result<i32> {
        Ok(self.range()?.surf(local))
    }

    /// Parses a region written in local surface numbers.
    ///
    /// # Errors
    ///
    /// Returns an error before the surface stage or on a malformed expression.
    pub fn rule(&self, expr: &str) -> Result<Rule> {
        Rule::composite(self.range()?.surface_offset(), expr)
    }

    /// Hands out the next free cell number in this component's block.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error outside the cell stage.
    pub fn next_cell_number(&mut self) -> Result<i32> {
        self.lifecycle.check(&self.name, Stage::CreateObjects)?;
        self.range()?;
        let id = self.next_cell;
        self.next_cell += 1;
        Ok(id)
    }

    /// Publishes link `index`.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error outside the link stage, or an error if the
    /// index is out of range or the axis is zero-length.
    pub fn set_connect(&mut self, index: usize, point: Point3, axis: Vector3) -> Result<()> {
        self.lifecycle.check(&self.name, Stage::CreateLinks)?;
        self.links.set_connect(index, point, axis)
    }

    /// Attaches a bounding rule to published link `index`.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error outside the link stage, or an error if the
    /// index is out of range or unpublished.
    pub fn set_link_surf(&mut self, index: usize, surface: Rule) -> Result<()> {
        self.lifecycle.check(&self.name, Stage::CreateLinks)?;
        self.links.set_link_surf(index, surface)
    }

    /// Names link `index`.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error outside the link stage, or an error if the
    /// index is out of range.
    pub fn name_link(&mut self, index: usize, name: &str) -> Result<()> {
        self.lifecycle.check(&self.name, Stage::CreateLinks)?;
        self.links.name_link(index, name)
    }

    /// Resolves published link `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or unpublished.
    pub fn link(&self, index: usize) -> Result<&LinkPoint> {
        self.links.link(index)
    }
}

impl FrameOwner for FixedComp {
    fn fixed(&self) -> &FixedComp {
        self
    }

    fn fixed_mut(&mut self, _: Token) -> &mut FixedComp {
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::param::ParamTable;
    use crate::error::{CellforgeError, LifecycleError};
    use crate::registry::Simulation;

    fn advance(fc: &mut FixedComp, stages: usize) {
        for stage in &Stage::ORDER[..stages] {
            fc.lifecycle_mut().complete(*stage);
        }
    }

    #[test]
    fn world_anchor_is_built() {
        let w = FixedComp::world();
        assert_eq!(w.state(), BuildState::Built);
        assert_relative_eq!(w.link(0).unwrap().axis, Vector3::y());
    }

    #[test]
    fn offset_defaults_to_zero() {
        let off = FixedOffset::populate(&ParamTable::new(), "pipe").unwrap();
        assert_eq!(off, FixedOffset::default());
    }

    #[test]
    fn frame_from_parent_link_with_offset() {
        let params = ParamTable::new()
            .with("pipeYStep", 3.0)
            .with("pipeXYAngle", 90.0);
        let off = FixedOffset::populate(&params, "pipe").unwrap();
        let mut fc = FixedComp::new("pipe", 2);
        assert!(fc.create_unit_vector(&FixedComp::world(), 0, &off).is_err());
        advance(&mut fc, 1);
        fc.create_unit_vector(&FixedComp::world(), 0, &off).unwrap();
        assert_relative_eq!(*fc.frame().y(), -Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(*fc.frame().origin(), Point3::new(-3.0, 0.0, 0.0), epsilon = 1e-12);
        assert!(fc.frame().is_orthonormal(1e-9));
    }

    #[test]
    fn bad_parent_link_index() {
        let mut fc = FixedComp::new("pipe", 2);
        advance(&mut fc, 1);
        let err = fc
            .create_unit_vector(&FixedComp::world(), 1, &FixedOffset::default())
            .unwrap_err();
        assert!(matches!(
            err,
            CellforgeError::Reference(ReferenceError::LinkOutOfRange { .. })
        ));
    }

    #[test]
    fn numbering_follows_range() {
        let mut sim = Simulation::new();
        let mut fc = FixedComp::new("pipe", 0);
        assert!(fc.surf(1).is_err());
        assert!(fc.next_cell_number().is_err());
        fc.assign_range(sim.allocate_range("pipe").unwrap());
        assert_eq!(fc.surf(3).unwrap(), 10_003);
        assert!(fc.next_cell_number().is_err());
        advance(&mut fc, 3);
        assert_eq!(fc.next_cell_number().unwrap(), 10_001);
        assert_eq!(fc.next_cell_number().unwrap(), 10_002);
        assert_eq!(fc.rule("1 -2").unwrap().to_string(), "10001 -10002");
    }

    #[test]
    fn links_writable_only_while_linking() {
        let mut fc = FixedComp::new("pipe", 1);
        advance(&mut fc, 3);
        let early = fc.set_connect(0, Point3::origin(), Vector3::y()).unwrap_err();
        assert!(matches!(
            early,
            CellforgeError::Lifecycle(LifecycleError {
                expected: BuildState::Objected,
                actual: BuildState::Surfaced,
                ..
            })
        ));

        advance(&mut fc, 4);
        fc.set_connect(0, Point3::origin(), Vector3::y()).unwrap();
        fc.set_link_surf(0, Rule::Surf(-1)).unwrap();
        fc.name_link(0, "front").unwrap();
        fc.lifecycle_mut().complete(Stage::CreateLinks);

        let moved = Point3::new(99.0, 99.0, 99.0);
        assert!(fc.set_connect(0, moved, Vector3::x()).is_err());
        assert!(fc.set_link_surf(0, Rule::Surf(5)).is_err());
        assert!(fc.name_link(0, "elsewhere").is_err());
        let link = fc.link(0).unwrap();
        assert_eq!(link.point, Point3::origin());
        assert_eq!(link.surface, Rule::Surf(-1));
        let off = FixedOffset::default();
        assert!(fc.create_unit_vector(&FixedComp::world(), 0, &off).is_err());
    }
}
