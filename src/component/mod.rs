//! The construction contract every geometric component follows.
//!
//! A component is built in five stages: [`Component::populate`],
//! [`Component::create_unit_vector`], [`Component::create_surfaces`],
//! [`Component::create_objects`] and [`Component::create_links`]. Drivers
//! only call [`Component::create_all`], which checks the lifecycle tag before
//! each stage, allocates the component's numeric range and marks the
//! component failed on the first error.
//!
//! Capabilities are separate traits a component mixes in as needed:
//! [`FrameOwner`] (required), [`CellMapHolder`], [`Contained`] and
//! [`ExternalCutter`]. Each delegates to a plain struct the component owns.
//! The mutable accessors take a [`sealed::Token`] that only this crate can
//! construct, so a built component stays read-only from outside.

mod cell_map;
mod contained;
mod external_cut;
mod fixed;
mod layer;
mod lifecycle;

pub use cell_map::CellMap;
pub use contained::ContainedComp;
pub use external_cut::ExternalCut;
pub use fixed::{FixedComp, FixedOffset};
pub use layer::{cumulative_extent, populate_layers, LayerInfo};
pub use lifecycle::{BuildState, Lifecycle, Stage};

pub(crate) mod sealed {
    /// Unlocks the mutable capability accessors.
    #[derive(Debug, Clone, Copy)]
    pub struct Token;
}

use crate::error::{CellforgeError, ReferenceError, Result};
use sealed::Token;
use crate::geometry::{Frame, LinkPoint, Rule};
use crate::math::Point3;
use crate::param::ParamSource;
use crate::registry::Simulation;

/// Owns a frame and a declared set of links.
pub trait FrameOwner {
    /// Shared component core.
    fn fixed(&self) -> &FixedComp;

    /// Mutable shared component core.
    fn fixed_mut(&mut self, _: Token) -> &mut FixedComp;

    /// Component name.
    fn name(&self) -> &str {
        self.fixed().name()
    }

    /// Current frame.
    fn frame(&self) -> &Frame {
        self.fixed().frame()
    }

    /// Number of declared links.
    fn link_count(&self) -> usize {
        self.fixed().links().len()
    }

    /// Resolves link `index`.
    ///
    /// # Errors
    ///
    /// Returns a reference error if the index is out of range or unpublished.
    fn link(&self, index: usize) -> Result<&LinkPoint> {
        self.fixed().link(index)
    }

    /// Current lifecycle state.
    fn state(&self) -> BuildState {
        self.fixed().state()
    }
}

/// Maps component-local tags to global cell numbers.
pub trait CellMapHolder: FrameOwner {
    fn cell_map(&self) -> &CellMap;

    fn cell_map_mut(&mut self, _: Token) -> &mut CellMap;

    /// The `index`-th cell tagged `tag`.
    ///
    /// # Errors
    ///
    /// Returns a reference error for an unknown tag or index.
    fn cell(&self, tag: &str, index: usize) -> Result<i32> {
        self.cell_map().cell(tag, index)
    }

    /// All cells tagged `tag`.
    ///
    /// # Errors
    ///
    /// Returns a reference error for an unknown tag.
    fn cells(&self, tag: &str) -> Result<&[i32]> {
        self.cell_map().cells(tag)
    }
}

/// Has an outer boundary that supports point-in-component queries and an
/// optional boundary cut applied before cells are created.
pub trait Contained: FrameOwner {
    fn contained(&self) -> &ContainedComp;

    fn contained_mut(&mut self, _: Token) -> &mut ContainedComp;

    /// Restricts the component to `rule`.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error once cells exist.
    fn add_boundary_cut(&mut self, rule: Rule) -> Result<()> {
        self.fixed()
            .lifecycle()
            .check_before_objects(self.name(), "add_boundary_cut")?;
        self.contained_mut(Token).add_boundary_cut(rule);
        Ok(())
    }

    /// Region occupied by the whole component.
    fn exterior(&self) -> Rule {
        self.contained().exterior()
    }

    /// Tests whether `point` lies inside the component.
    ///
    /// # Errors
    ///
    /// Returns an error if the boundary references an unregistered surface.
    fn is_inside(&self, point: &Point3, sim: &Simulation) -> Result<bool> {
        self.contained().is_inside(point, sim)
    }
}

/// Accepts named boundary rules from other components.
pub trait ExternalCutter: FrameOwner {
    fn external_cut(&self) -> &ExternalCut;

    fn external_cut_mut(&mut self, _: Token) -> &mut ExternalCut;

    /// Supplies the cut called `name`.
    ///
    /// # Errors
    ///
    /// Returns a lifecycle error once cells exist.
    fn set_cut_surf(&mut self, name: &str, rule: Rule) -> Result<()> {
        self.fixed()
            .lifecycle()
            .check_before_objects(self.name(), "set_cut_surf")?;
        self.external_cut_mut(Token).set_cut_surf(name, rule);
        Ok(())
    }
}

/// A buildable geometric component.
pub trait Component: FrameOwner {
    /// Reads parameters into private fields. No registry writes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a missing or invalid key.
    fn populate(&mut self, params: &dyn ParamSource) -> Result<()>;

    /// Computes this component's frame from `parent` at `link_index`.
    ///
    /// # Errors
    ///
    /// Returns a reference error if the parent link does not resolve.
    fn create_unit_vector(&mut self, parent: &dyn FrameOwner, link_index: usize) -> Result<()>;

    /// Emits surfaces into the registry inside the component's range.
    ///
    /// # Errors
    ///
    /// Returns an error if a surface is degenerate or its number is taken.
    fn create_surfaces(&mut self, sim: &mut Simulation) -> Result<()>;

    /// Registers cells, fills the cell map and declares the outer boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if a cell cannot be registered.
    fn create_objects(&mut self, sim: &mut Simulation) -> Result<()>;

    /// Publishes every declared link.
    ///
    /// # Errors
    ///
    /// Returns an error if a link cannot be published.
    fn create_links(&mut self) -> Result<()>;

    fn as_cell_map(&self) -> Option<&dyn CellMapHolder> {
        None
    }

    fn as_contained(&self) -> Option<&dyn Contained> {
        None
    }

    fn as_contained_mut(&mut self) -> Option<&mut dyn Contained> {
        None
    }

    fn as_external_cut_mut(&mut self) -> Option<&mut dyn ExternalCutter> {
        None
    }

    /// Runs all five stages in order. The only entry point a driver calls.
    ///
    /// # Errors
    ///
    /// Returns the first error met; the component is then left `Failed`.
    fn create_all(
        &mut self,
        sim: &mut Simulation,
        params: &dyn ParamSource,
        parent: &dyn FrameOwner,
        link_index: usize,
    ) -> Result<()> {
        let result = run_stages(self, sim, params, parent, link_index);
        if let Err(err) = &result {
            tracing::warn!(component = self.name(), error = %err, "build failed");
            if !matches!(err, CellforgeError::Lifecycle(_)) {
                self.fixed_mut(Token).lifecycle_mut().fail();
            }
        }
        result
    }
}

fn run_stages<C: Component + ?Sized>(
    comp: &mut C,
    sim: &mut Simulation,
    params: &dyn ParamSource,
    parent: &dyn FrameOwner,
    link_index: usize,
) -> Result<()> {
    for stage in Stage::ORDER {
        comp.fixed().lifecycle().begin(comp.name(), stage)?;
        match stage {
            Stage::Populate => comp.populate(params)?,
            Stage::CreateUnitVector => comp.create_unit_vector(parent, link_index)?,
            Stage::CreateSurfaces => {
                let range = sim.allocate_range(comp.name())?;
                comp.fixed_mut(Token).assign_range(range);
                let before = sim.surface_count();
                comp.create_surfaces(sim)?;
                tracing::debug!(
                    component = comp.name(),
                    surfaces = sim.surface_count() - before,
                    "surfaces registered"
                );
            }
            Stage::CreateObjects => {
                let before = sim.cell_count();
                comp.create_objects(sim)?;
                tracing::debug!(
                    component = comp.name(),
                    cells = sim.cell_count() - before,
                    "cells registered"
                );
            }
            Stage::CreateLinks => {
                comp.create_links()?;
                let links = comp.fixed().links();
                if let Some(index) = (0..links.len()).find(|&i| links.link(i).is_err()) {
                    return Err(ReferenceError::LinkUnset {
                        component: comp.name().to_owned(),
                        index,
                    }
                    .into());
                }
            }
        }
        comp.fixed_mut(Token).lifecycle_mut().complete(stage);
    }
    Ok(())
}
