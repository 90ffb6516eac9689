//! Error types for liveconfig-core.

use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

use crate::types::{InstanceName, ValueKind};

/// Errors escalated to the caller of registry operations.
///
/// Only name collisions are hard failures; lookup misses and rejected edits
/// are logged and reported through `None` / `false` returns instead.
#[derive(Debug, Error)]
pub enum LiveError {
    /// An instance is already registered under this name.
    #[error("instance with name '{name}' already exists")]
    DuplicateName { name: InstanceName },
}

/// Failure to turn raw external input into the kind an attribute holds.
///
/// Never escapes the attribute accessor: it is logged and the edit is dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("'{0}' is not a recognised boolean")]
    Bool(String),

    #[error("'{raw}' is not a valid integer: {source}")]
    Int {
        raw: String,
        #[source]
        source: ParseIntError,
    },

    #[error("'{raw}' is not a valid float: {source}")]
    Float {
        raw: String,
        #[source]
        source: ParseFloatError,
    },

    /// Parsed, but infinite or NaN; such floats cannot be saved as numbers.
    #[error("'{0}' is not a finite float")]
    NonFinite(String),

    /// Tuple input with the wrong number of elements.
    #[error("expected {expected} elements, got {found}")]
    Arity { expected: usize, found: usize },

    /// A single tuple/list element failed to coerce.
    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<CoercionError>,
    },

    #[error("values of kind {0} cannot be set from text")]
    Unsupported(ValueKind),
}
