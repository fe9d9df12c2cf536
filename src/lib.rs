//! Component-based construction of Monte-Carlo transport geometry.
//!
//! Components are placed on each other's link points, emit numbered
//! surfaces and cells into a [`registry::Simulation`] through a fixed
//! five-stage lifecycle, and expose capabilities through small traits.
//! Per-cell physics values are written as range-compressed records by
//! [`physics::CellValueSet`].

pub mod assembly;
pub mod component;
pub mod error;
pub mod geometry;
pub mod math;
pub mod model;
pub mod param;
pub mod physics;
pub mod registry;

pub use error::{CellforgeError, Result};
