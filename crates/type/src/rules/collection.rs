// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::diagnostic;
use crate::dimension::Dimension;
use crate::promote::comparable;
use crate::shape::DataShape;
use refract_core::{Result, SortKey};

/// Filtering keeps the element measure but the leading dimension becomes
/// variable: the surviving cardinality is never known statically.
pub fn filter(data: &DataShape, predicate: &DataShape) -> Result<DataShape> {
    if !predicate.measure().is_bool() {
        return Err(diagnostic::shape_mismatch("filter predicate", predicate, "bool"));
    }
    if predicate.dims() != data.dims() {
        return Err(diagnostic::shape_mismatch("filter", data, predicate));
    }
    with_var_leading(data, "filter")
}

/// Sorting is shape preserving. Keyed sorts need a record operand whose key
/// fields hold mutually comparable scalars; a key-less sort orders a plain
/// column by its own value.
pub fn sort(data: &DataShape, keys: &[SortKey]) -> Result<DataShape> {
    require_collection(data, "sort")?;
    if keys.is_empty() {
        if data.measure().scalar_type().is_none() {
            return Err(diagnostic::shape_mismatch("sort", data, "scalar collection"));
        }
        return Ok(data.clone());
    }
    let record = data.record()?;
    for key in keys {
        let field = record
            .field(&key.field)
            .ok_or_else(|| diagnostic::unknown_field(&key.field, record))?;
        let ty = field
            .measure
            .scalar_type()
            .ok_or_else(|| diagnostic::not_comparable(&field.measure, &field.measure))?;
        if !comparable(ty, ty) {
            return Err(diagnostic::not_comparable(ty, ty));
        }
    }
    Ok(data.clone())
}

/// Deduplication cannot guarantee cardinality, so the leading dimension
/// becomes variable.
pub fn distinct(data: &DataShape) -> Result<DataShape> {
    with_var_leading(data, "distinct")
}

/// Slicing clips a statically sized leading dimension; variable and streaming
/// leading dimensions stay variable.
pub fn slice(data: &DataShape, offset: usize, limit: Option<usize>) -> Result<DataShape> {
    require_collection(data, "slice")?;
    let leading = match data.dims()[0] {
        Dimension::Fixed(size) => {
            let remaining = size.saturating_sub(offset);
            Dimension::Fixed(limit.map_or(remaining, |l| l.min(remaining)))
        }
        Dimension::Var | Dimension::Stream => Dimension::Var,
    };
    let mut dims = data.dims().to_vec();
    dims[0] = leading;
    Ok(data.with_dims(dims))
}

fn require_collection(data: &DataShape, context: &str) -> Result<()> {
    if data.dims().is_empty() {
        return Err(diagnostic::shape_mismatch(context, data, "a collection"));
    }
    Ok(())
}

fn with_var_leading(data: &DataShape, context: &str) -> Result<DataShape> {
    require_collection(data, context)?;
    let mut dims = data.dims().to_vec();
    dims[0] = Dimension::Var;
    Ok(data.with_dims(dims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{Field, Record};
    use refract_core::Type;

    fn table() -> DataShape {
        DataShape::table(
            Record::new(vec![
                Field::scalar("id", Type::Int4),
                Field::scalar("amount", Type::Float8),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_filter_leading_dim_becomes_var() {
        let data = DataShape::new(
            vec![Dimension::Fixed(10)],
            table().measure().clone(),
        );
        let predicate = DataShape::new(
            vec![Dimension::Fixed(10)],
            DataShape::scalar(Type::Bool).measure().clone(),
        );
        let shape = filter(&data, &predicate).unwrap();
        assert_eq!(shape.dims(), &[Dimension::Var]);
    }

    #[test]
    fn test_filter_requires_bool_predicate() {
        let err = filter(&table(), &DataShape::column(Type::Int4)).unwrap_err();
        assert_eq!(err.code(), "TY_001");
    }

    #[test]
    fn test_filter_requires_matching_dims() {
        let predicate = DataShape::new(
            vec![Dimension::Fixed(3)],
            DataShape::scalar(Type::Bool).measure().clone(),
        );
        assert!(filter(&table(), &predicate).is_err());
    }

    #[test]
    fn test_sort_keyed() {
        assert!(sort(&table(), &[SortKey::asc("amount")]).is_ok());
        assert_eq!(
            sort(&table(), &[SortKey::asc("missing")]).unwrap_err().code(),
            "TY_002"
        );
    }

    #[test]
    fn test_sort_keyless_column() {
        assert!(sort(&DataShape::column(Type::Int4), &[]).is_ok());
        assert!(sort(&table(), &[]).is_err());
    }

    #[test]
    fn test_slice_fixed() {
        let data = DataShape::new(vec![Dimension::Fixed(10)], table().measure().clone());
        let shape = slice(&data, 2, Some(5)).unwrap();
        assert_eq!(shape.dims(), &[Dimension::Fixed(5)]);

        let clipped = slice(&data, 8, Some(5)).unwrap();
        assert_eq!(clipped.dims(), &[Dimension::Fixed(2)]);
    }

    #[test]
    fn test_slice_var_stays_var() {
        let shape = slice(&table(), 0, Some(3)).unwrap();
        assert_eq!(shape.dims(), &[Dimension::Var]);
    }

    #[test]
    fn test_slice_scalar_fails() {
        assert!(slice(&DataShape::scalar(Type::Int4), 0, None).is_err());
    }

    #[test]
    fn test_distinct() {
        assert_eq!(distinct(&table()).unwrap(), table());
    }
}
