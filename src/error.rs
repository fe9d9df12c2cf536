use thiserror::Error;

use crate::component::BuildState;

/// Top-level error type for model construction and card output.
#[derive(Debug, Error)]
pub enum CellforgeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    EmptyKey(#[from] EmptyKeyError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("output failed")]
    Format(#[from] std::fmt::Error),
}

/// A parameter is missing or fails its type/range check.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("{component}: required parameter `{key}` is missing")]
    MissingKey { component: String, key: String },

    #[error("{component}: parameter `{key}` is not {expected}")]
    WrongType {
        component: String,
        key: String,
        expected: &'static str,
    },

    #[error("{component}: parameter `{key}` = {value} {reason}")]
    OutOfRange {
        component: String,
        key: String,
        value: f64,
        reason: &'static str,
    },

    #[error("{component}: parameter `{key}` names unknown material `{material}`")]
    UnknownMaterial {
        component: String,
        key: String,
        material: String,
    },
}

/// An index, name or number does not resolve to anything.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("{component}: link index {index} out of range (declared {declared})")]
    LinkOutOfRange {
        component: String,
        index: usize,
        declared: usize,
    },

    #[error("{component}: link {index} has not been published")]
    LinkUnset { component: String, index: usize },

    #[error("{component}: no link named `{name}`")]
    UnknownLink { component: String, name: String },

    #[error("{component}: no cell tagged `{tag}`")]
    UnknownCellTag { component: String, tag: String },

    #[error("{component}: cell tag `{tag}` has no index {index} (holds {len})")]
    CellIndexOutOfRange {
        component: String,
        tag: String,
        index: usize,
        len: usize,
    },

    #[error("{component}: no cut surface named `{name}`")]
    UnknownCut { component: String, name: String },

    #[error("surface {0} is not registered")]
    UnknownSurface(i32),

    #[error("cell {0} is not registered")]
    UnknownCell(i32),

    #[error("surface {0} is already registered")]
    DuplicateSurface(i32),

    #[error("cell {0} is already registered")]
    DuplicateCell(i32),

    #[error("number {0} lies outside every allocated range")]
    Unallocated(i32),

    #[error("a range is already allocated to `{0}`")]
    DuplicateRange(String),

    #[error("{component}: no numeric range allocated")]
    NoRange { component: String },

    #[error("cell number {0} is not positive")]
    NonPositiveCell(i32),

    #[error("slot {slot} out of range for a {arity}-value set")]
    SlotOutOfRange { slot: usize, arity: usize },

    #[error("unknown component")]
    UnknownComponent,

    #[error("component dependency cycle through `{0}`")]
    DependencyCycle(String),
}

/// Serialization attempted without the naming it requires.
#[derive(Debug, Error)]
pub enum EmptyKeyError {
    #[error("value set `{key}` has no output name")]
    MissingOutName { key: String },

    #[error("value set has an empty key name")]
    MissingKeyName,
}

/// A lifecycle stage was entered out of order or re-entered.
#[derive(Debug, Error)]
#[error("{component}: cannot {stage} while {actual:?} (requires {expected:?})")]
pub struct LifecycleError {
    pub component: String,
    pub stage: &'static str,
    pub expected: BuildState,
    pub actual: BuildState,
}

/// Errors related to geometric descriptors and region expressions.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("cannot parse region `{expr}`: {reason}")]
    BadRegion { expr: String, reason: String },
}

/// Convenience type alias for results using [`CellforgeError`].
pub type Result<T> = std::result::Result<T, CellforgeError>;
