//! Stacking per-year tables into one frame.

use std::collections::HashMap;

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;

/// Stack `parts` vertically, in order.
///
/// Columns are matched by name and keep the order they are first seen in. A
/// column absent from a part is missing in its rows; a column whose dtype
/// differs between parts is cast to a dtype holding both.
pub fn stack_tables(parts: Vec<DataFrame>) -> Result<DataFrame> {
    let mut order: Vec<PlSmallStr> = Vec::new();
    let mut dtypes: HashMap<PlSmallStr, DataType> = HashMap::new();
    for part in &parts {
        for column in part.get_columns() {
            match dtypes.get_mut(column.name()) {
                Some(dtype) => *dtype = common_dtype(dtype, column.dtype()),
                None => {
                    order.push(column.name().clone());
                    dtypes.insert(column.name().clone(), column.dtype().clone());
                }
            }
        }
    }
    let schema: Vec<(PlSmallStr, DataType)> = order
        .into_iter()
        .filter_map(|name| dtypes.remove(&name).map(|dtype| (name, dtype)))
        .collect();

    let count = parts.len();
    let mut stacked: Option<DataFrame> = None;
    for part in parts {
        let height = part.height();
        let mut columns = Vec::with_capacity(schema.len());
        for (name, dtype) in &schema {
            let column = match part.column(name) {
                Ok(column) if column.dtype() == dtype => column.clone(),
                Ok(column) => column.cast(dtype)?,
                Err(_) => Column::full_null(name.clone(), height, dtype),
            };
            columns.push(column);
        }
        let frame = DataFrame::new(columns)?;
        match stacked.as_mut() {
            Some(existing) => {
                existing.vstack_mut(&frame)?;
            }
            None => stacked = Some(frame),
        }
    }

    let df = stacked.unwrap_or_else(DataFrame::empty);
    debug!(parts = count, rows = df.height(), columns = df.width(), "Stacked tables");
    Ok(df)
}

/// Dtype able to hold values of both `a` and `b`.
fn common_dtype(a: &DataType, b: &DataType) -> DataType {
    let numeric = |dtype: &DataType| dtype.is_integer() || dtype.is_float();
    if a == b {
        a.clone()
    } else if matches!(a, DataType::Null) {
        b.clone()
    } else if matches!(b, DataType::Null) {
        a.clone()
    } else if a.is_integer() && b.is_integer() {
        DataType::Int64
    } else if numeric(a) && numeric(b) {
        DataType::Float64
    } else {
        DataType::String
    }
}
