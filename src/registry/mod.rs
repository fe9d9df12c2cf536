mod cell;

pub use cell::{Cell, VOID};

use std::collections::BTreeMap;

use crate::error::{ReferenceError, Result};
use crate::geometry::rule::SurfaceLookup;
use crate::geometry::{Rule, SurfaceKind};

/// Numbering layout of the surface and cell registry.
#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    /// Size of the numeric block granted to each component.
    pub block_size: i32,
    /// Offset of the first block.
    pub first_offset: i32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            block_size: 10_000,
            first_offset: 10_000,
        }
    }
}

/// An exclusive block of surface and cell numbers granted to one component.
///
/// Local number `k` maps to global number `offset + k` for `k` in
/// `1..size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOffset {
    /// Name of the component holding the block.
    pub name: String,
    /// Base of the block.
    pub offset: i32,
    /// Number of values in the block.
    pub size: i32,
}

impl RangeOffset {
    /// Base added to component-local surface numbers.
    #[must_use]
    pub fn surface_offset(&self) -> i32 {
        self.offset
    }

    /// Base added to component-local cell numbers.
    #[must_use]
    pub fn cell_offset(&self) -> i32 {
        self.offset
    }

    /// Global number of local surface `local`.
    #[must_use]
    pub fn surf(&self, local: i32) -> i32 {
        self.offset + local
    }

    /// Returns `true` if `id` lies inside the block.
    #[must_use]
    pub fn contains(&self, id: i32) -> bool {
        id > self.offset && id < self.offset + self.size
    }
}

/// The surface table and cell table of one build pass.
///
/// Passed explicitly to every component stage that writes geometry; nothing
/// here is global. Each component writes only inside the range it was
/// allocated, so the sequential build order is the only synchronisation.
#[derive(Debug, Default)]
pub struct Simulation {
    config: RegistryConfig,
    ranges: Vec<RangeOffset>,
    surfaces: BTreeMap<i32, SurfaceKind>,
    cells: BTreeMap<i32, Cell>,
}

impl Simulation {
    /// Creates an empty registry with the default numbering.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with a custom numbering layout.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Grants `name` the next free numeric block.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` already holds a block.
    pub fn allocate_range(&mut self, name: &str) -> Result<RangeOffset> {
        if self.range(name).is_some() {
            return Err(ReferenceError::DuplicateRange(name.to_owned()).into());
        }
        let offset = self
            .ranges
            .last()
            .map_or(self.config.first_offset, |r| r.offset + r.size);
        let range = RangeOffset {
            name: name.to_owned(),
            offset,
            size: self.config.block_size,
        };
        tracing::debug!(component = name, offset, "allocated numeric range");
        self.ranges.push(range.clone());
        Ok(range)
    }

    /// Block held by `name`, if any.
    #[must_use]
    pub fn range(&self, name: &str) -> Option<&RangeOffset> {
        self.ranges.iter().find(|r| r.name == name)
    }

    /// Name of the component whose block contains `id`.
    #[must_use]
    pub fn owner_of(&self, id: i32) -> Option<&str> {
        self.ranges
            .iter()
            .find(|r| r.contains(id.abs()))
            .map(|r| r.name.as_str())
    }

    fn check_allocated(&self, id: i32) -> Result<()> {
        if self.owner_of(id).is_none() {
            return Err(ReferenceError::Unallocated(id).into());
        }
        Ok(())
    }

    /// Registers surface `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is outside every allocated block or taken.
    pub fn add_surface(&mut self, id: i32, surface: impl Into<SurfaceKind>) -> Result<()> {
        self.check_allocated(id)?;
        if self.surfaces.contains_key(&id) {
            return Err(ReferenceError::DuplicateSurface(id).into());
        }
        self.surfaces.insert(id, surface.into());
        Ok(())
    }

    /// Registers cell `id` occupying `rule`, filled with `material`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is outside every allocated block or taken,
    /// or if the rule references an unregistered surface.
    pub fn add_cell(&mut self, id: i32, rule: Rule, material: i32) -> Result<()> {
        self.check_allocated(id)?;
        if self.cells.contains_key(&id) {
            return Err(ReferenceError::DuplicateCell(id).into());
        }
        if let Some(missing) = rule
            .surfaces()
            .into_iter()
            .find(|s| !self.surfaces.contains_key(s))
        {
            return Err(ReferenceError::UnknownSurface(missing).into());
        }
        self.cells.insert(id, Cell::new(id, rule, material));
        Ok(())
    }

    /// Looks up a registered surface.
    ///
    /// # Errors
    ///
    /// Returns an error if no such surface exists.
    pub fn surface_kind(&self, id: i32) -> Result<&SurfaceKind> {
        self.surfaces
            .get(&id)
            .ok_or_else(|| ReferenceError::UnknownSurface(id).into())
    }

    /// Looks up a registered cell.
    ///
    /// # Errors
    ///
    /// Returns an error if no such cell exists.
    pub fn cell(&self, id: i32) -> Result<&Cell> {
        self.cells
            .get(&id)
            .ok_or_else(|| ReferenceError::UnknownCell(id).into())
    }

    /// Mutable access to a registered cell.
    ///
    /// # Errors
    ///
    /// Returns an error if no such cell exists.
    pub fn cell_mut(&mut self, id: i32) -> Result<&mut Cell> {
        self.cells
            .get_mut(&id)
            .ok_or_else(|| ReferenceError::UnknownCell(id).into())
    }

    /// Number of registered surfaces.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Number of registered cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Registered surfaces in ascending number order.
    pub fn surfaces(&self) -> impl Iterator<Item = (i32, &SurfaceKind)> {
        self.surfaces.iter().map(|(id, s)| (*id, s))
    }

    /// Registered cells in ascending number order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }
}

impl SurfaceLookup for Simulation {
    fn surface(&self, id: i32) -> Option<&SurfaceKind> {
        self.surfaces.get(&id)
    }
}
