//! Error types for the normalization layer.

use thiserror::Error;

/// Structural problems in a query shape.
///
/// These are programmer errors and fail fast at subscribe time, before any
/// fetch is issued. Runtime absence of data is never an error here - it
/// denormalizes to a missing value instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Query shape selects no fields")]
    EmptyShape,

    #[error("Selection '{0}' has an empty sub-shape")]
    EmptySelection(String),

    #[error("Duplicate selection of field '{0}'")]
    DuplicateField(String),

    #[error("Selection with an empty field name")]
    EmptyFieldName,
}

pub type Result<T> = std::result::Result<T, ShapeError>;
