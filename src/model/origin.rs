use crate::component::sealed::Token;
use crate::component::{Component, FixedComp, FixedOffset, FrameOwner};
use crate::error::Result;
use crate::param::ParamSource;
use crate::registry::Simulation;

/// Root of an assembly: no geometry, one link at its (offset) origin
/// facing along its Y axis.
#[derive(Debug, Clone)]
pub struct WorldOrigin {
    fixed: FixedComp,
    offset: FixedOffset,
}

impl WorldOrigin {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            fixed: FixedComp::new(name, 1),
            offset: FixedOffset::default(),
        }
    }
}

impl FrameOwner for WorldOrigin {
    fn fixed(&self) -> &FixedComp {
        &self.fixed
    }

    fn fixed_mut(&mut self, _: Token) -> &mut FixedComp {
        &mut self.fixed
    }
}

impl Component for WorldOrigin {
    fn populate(&mut self, params: &dyn ParamSource) -> Result<()> {
        self.offset = FixedOffset::populate(params, self.fixed.name())?;
        Ok(())
    }

    fn create_unit_vector(&mut self, parent: &dyn FrameOwner, link_index: usize) -> Result<()> {
        self.fixed.create_unit_vector(parent, link_index, &self.offset)
    }

    fn create_surfaces(&mut self, _sim: &mut Simulation) -> Result<()> {
        Ok(())
    }

    fn create_objects(&mut self, _sim: &mut Simulation) -> Result<()> {
        Ok(())
    }

    fn create_links(&mut self) -> Result<()> {
        let origin = *self.fixed.frame().origin();
        let y = *self.fixed.frame().y();
        self.fixed.set_connect(0, origin, y)?;
        self.fixed.name_link(0, "origin")
    }
}
