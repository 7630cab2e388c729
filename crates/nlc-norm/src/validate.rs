//! Structural validation of query shapes.

use crate::error::{Result, ShapeError};
use nlc_core::shape::QueryShape;
use std::collections::HashSet;

/// Validate a query shape before it is allowed to drive a subscription.
///
/// Rejects empty shapes, empty field names, duplicate selections and
/// object selections whose sub-shape selects nothing.
pub fn validate_shape(shape: &QueryShape) -> Result<()> {
    if shape.is_empty() {
        return Err(ShapeError::EmptyShape);
    }
    validate_selections(shape)
}

fn validate_selections(shape: &QueryShape) -> Result<()> {
    let mut seen = HashSet::new();
    for selection in &shape.selections {
        if selection.name.is_empty() {
            return Err(ShapeError::EmptyFieldName);
        }
        if !seen.insert(selection.name.as_str()) {
            return Err(ShapeError::DuplicateField(selection.name.clone()));
        }
        if let Some(subshape) = &selection.subshape {
            if subshape.is_empty() {
                return Err(ShapeError::EmptySelection(selection.name.clone()));
            }
            validate_selections(subshape)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_shape_passes() {
        let shape = QueryShape::new().object(
            "chat",
            QueryShape::new()
                .field("id")
                .object("author", QueryShape::new().field("id").field("name")),
        );
        assert!(validate_shape(&shape).is_ok());
    }

    #[test]
    fn test_empty_shape_rejected() {
        assert_eq!(validate_shape(&QueryShape::new()), Err(ShapeError::EmptyShape));
    }

    #[test]
    fn test_empty_subshape_rejected() {
        let shape = QueryShape::new().object("chat", QueryShape::new());
        assert_eq!(
            validate_shape(&shape),
            Err(ShapeError::EmptySelection("chat".to_string()))
        );
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let shape = QueryShape::new().object(
            "chat",
            QueryShape::new().field("id").field("id"),
        );
        assert_eq!(
            validate_shape(&shape),
            Err(ShapeError::DuplicateField("id".to_string()))
        );
    }

    #[test]
    fn test_empty_field_name_rejected() {
        let shape = QueryShape::new().field("");
        assert_eq!(validate_shape(&shape), Err(ShapeError::EmptyFieldName));
    }
}
