//! Normalization and denormalization for the Opaline live cache.
//!
//! The writer walks a raw fetch result against a query shape, extracting
//! keyable sub-objects into the store and replacing them with references.
//! The reader walks the shape back against the store, resolving references
//! into nested objects and recording every key it visits - the dependency
//! set that drives live re-delivery.

pub mod error;
pub mod reader;
pub mod validate;
pub mod writer;

pub use error::ShapeError;
pub use reader::{read_query, read_shape, ReadResult, ResultValue};
pub use validate::validate_shape;
pub use writer::{write_query, WriteResult};
