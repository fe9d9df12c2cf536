use std::fmt;

use crate::geometry::Rule;

/// Material number of the void.
pub const VOID: i32 = 0;

/// A numbered cell: a region expression filled with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Global cell number.
    pub id: i32,
    /// Region occupied by the cell.
    pub rule: Rule,
    /// Material number, [`VOID`] for empty space.
    pub material: i32,
    /// Temperature in kelvin, `None` for the transport code's default.
    pub temperature: Option<f64>,
}

impl Cell {
    /// Creates a cell at the ambient temperature.
    #[must_use]
    pub fn new(id: i32, rule: Rule, material: i32) -> Self {
        Self {
            id,
            rule,
            material,
            temperature: None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.material, self.rule)?;
        if let Some(t) = self.temperature {
            write!(f, " tmp={t}")?;
        }
        Ok(())
    }
}
