//! Column cleaning pipeline.
//!
//! Every kept column goes through three fixed steps: value substitution,
//! text sanitation and type coercion. Each step keeps length and row order.

use hbs_common::{Number, any_to_i32_code, any_to_number, any_to_text, parse_number};
use hbs_metadata::{CategoryMap, ColumnSpec, DeclaredType, ReplacementMap, UnsignedWidth};
use polars::prelude::*;
use tracing::warn;

use crate::error::Result;
use crate::sanitize::sanitize_column;

/// Clean one raw column, naming the result `spec.new_name`.
pub fn clean_column(raw: &Column, spec: &ColumnSpec, sanitize: bool) -> Result<Column> {
    let mut column = raw.clone();
    if let Some(replace) = &spec.replace {
        column = apply_replacements(&column, replace)?;
    }
    if sanitize {
        column = sanitize_column(&column)?;
    }
    let series = coerce(&column, &spec.declared, &spec.new_name)?;
    Ok(series.into_column())
}

/// Substitute values by their textual form.
///
/// A numeric column stays numeric when every replacement is a number or
/// missing; otherwise the result is a string column.
pub fn apply_replacements(column: &Column, replace: &ReplacementMap) -> Result<Column> {
    let mut values: Vec<Option<String>> = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        let value = any_to_text(column.get(idx)?).and_then(|text| match replace.get(&text) {
            Some(replacement) => replacement.map(str::to_string),
            None => Some(text),
        });
        values.push(value);
    }
    let replaced = Series::new(column.name().clone(), values);
    match numeric_target(column.dtype(), replace) {
        Some(dtype) => Ok(replaced.cast(&dtype)?.into_column()),
        None => Ok(replaced.into_column()),
    }
}

/// Dtype that holds the raw values and every replacement, if numeric.
fn numeric_target(raw: &DataType, replace: &ReplacementMap) -> Option<DataType> {
    if !(raw.is_integer() || raw.is_float()) {
        return None;
    }
    let mut integral = true;
    for replacement in replace.replacements().flatten() {
        let number = parse_number(replacement)?;
        integral &= number.as_integral().is_some();
    }
    if raw.is_integer() && !integral {
        Some(DataType::Float64)
    } else {
        Some(raw.clone())
    }
}

/// Convert a column to its declared type.
pub fn coerce(column: &Column, declared: &DeclaredType, name: &str) -> Result<Series> {
    let name: PlSmallStr = name.into();
    let series = match declared {
        DeclaredType::String => {
            let mut series = column.as_materialized_series().clone();
            series.rename(name);
            series
        }
        DeclaredType::Boolean { true_value } => {
            let codes = codes(column)?;
            let values: Vec<Option<bool>> = codes
                .into_iter()
                .map(|code| code.map(|c| c == *true_value))
                .collect();
            Series::new(name, values)
        }
        DeclaredType::Unsigned => narrow_unsigned(name, &numbers(column)?),
        DeclaredType::Integer => narrow_integer(name, &numbers(column)?),
        DeclaredType::Float => narrow_float(name, &numbers(column)?),
        DeclaredType::FixedUnsigned(width) => fixed_unsigned(name, &numbers(column)?, *width),
        DeclaredType::Category(categories) => relabel(name, column, categories)?,
    };
    Ok(series)
}

fn numbers(column: &Column) -> Result<Vec<Option<Number>>> {
    let mut values = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        values.push(any_to_number(column.get(idx)?));
    }
    Ok(values)
}

fn codes(column: &Column) -> Result<Vec<Option<i32>>> {
    let mut values = Vec::with_capacity(column.len());
    for idx in 0..column.len() {
        values.push(any_to_i32_code(column.get(idx)?));
    }
    Ok(values)
}

/// Integral view of the values, `None` if any present value has a fraction.
fn integral(values: &[Option<Number>]) -> Option<Vec<Option<i64>>> {
    values
        .iter()
        .map(|value| match value {
            None => Some(None),
            Some(n) => n.as_integral().map(Some),
        })
        .collect()
}

fn float64(name: PlSmallStr, values: &[Option<Number>]) -> Series {
    let values: Vec<Option<f64>> = values.iter().map(|v| v.map(Number::as_f64)).collect();
    Series::new(name, values)
}

fn convert<T: TryFrom<i64>>(values: &[Option<i64>]) -> Vec<Option<T>> {
    values
        .iter()
        .map(|v| v.and_then(|v| T::try_from(v).ok()))
        .collect()
}

/// Smallest unsigned width that holds every value.
///
/// Fractions fall back to `Float64`, negatives to `Int64`.
fn narrow_unsigned(name: PlSmallStr, values: &[Option<Number>]) -> Series {
    let Some(ints) = integral(values) else {
        return float64(name, values);
    };
    if ints.iter().flatten().any(|v| *v < 0) {
        return Series::new(name, ints);
    }
    let max = ints.iter().flatten().copied().max().unwrap_or(0);
    if max <= i64::from(u8::MAX) {
        Series::new(name, convert::<u8>(&ints))
    } else if max <= i64::from(u16::MAX) {
        Series::new(name, convert::<u16>(&ints))
    } else if max <= i64::from(u32::MAX) {
        Series::new(name, convert::<u32>(&ints))
    } else {
        Series::new(name, convert::<u64>(&ints))
    }
}

/// Smallest signed width that holds every value; fractions fall back to `Float64`.
fn narrow_integer(name: PlSmallStr, values: &[Option<Number>]) -> Series {
    let Some(ints) = integral(values) else {
        return float64(name, values);
    };
    let min = ints.iter().flatten().copied().min().unwrap_or(0);
    let max = ints.iter().flatten().copied().max().unwrap_or(0);
    let fits = |lo: i64, hi: i64| min >= lo && max <= hi;
    if fits(i64::from(i8::MIN), i64::from(i8::MAX)) {
        Series::new(name, convert::<i8>(&ints))
    } else if fits(i64::from(i16::MIN), i64::from(i16::MAX)) {
        Series::new(name, convert::<i16>(&ints))
    } else if fits(i64::from(i32::MIN), i64::from(i32::MAX)) {
        Series::new(name, convert::<i32>(&ints))
    } else {
        Series::new(name, ints)
    }
}

/// Largest difference a value may show after narrowing to `Float32`.
const FLOAT32_TOLERANCE: f64 = 5e-4;

/// `Float32` when every value survives the round trip within
/// [`FLOAT32_TOLERANCE`], else `Float64`.
fn narrow_float(name: PlSmallStr, values: &[Option<Number>]) -> Series {
    let close = values.iter().flatten().all(|n| {
        let v = n.as_f64();
        (f64::from(v as f32) - v).abs() <= FLOAT32_TOLERANCE
    });
    if close {
        let values: Vec<Option<f32>> = values.iter().map(|v| v.map(|n| n.as_f64() as f32)).collect();
        Series::new(name, values)
    } else {
        float64(name, values)
    }
}

/// Cast to a fixed unsigned width; values that do not fit become missing.
fn fixed_unsigned(name: PlSmallStr, values: &[Option<Number>], width: UnsignedWidth) -> Series {
    let mut lost = 0usize;
    let fitted: Vec<Option<u64>> = values
        .iter()
        .map(|value| {
            let value = value.as_ref()?;
            let fitted = value
                .as_integral()
                .and_then(|v| u64::try_from(v).ok())
                .filter(|v| *v <= width.max());
            if fitted.is_none() {
                lost += 1;
            }
            fitted
        })
        .collect();
    if lost > 0 {
        warn!(
            column = %name,
            lost,
            max = width.max(),
            "Values outside the fixed unsigned range set to missing"
        );
    }
    match width {
        UnsignedWidth::U8 => Series::new(name, shrink::<u8>(&fitted)),
        UnsignedWidth::U16 => Series::new(name, shrink::<u16>(&fitted)),
        UnsignedWidth::U32 => Series::new(name, shrink::<u32>(&fitted)),
        UnsignedWidth::U64 => Series::new(name, fitted),
    }
}

fn shrink<T: TryFrom<u64>>(values: &[Option<u64>]) -> Vec<Option<T>> {
    values
        .iter()
        .map(|v| v.and_then(|v| T::try_from(v).ok()))
        .collect()
}

/// Relabel codes or keys; anything unmapped becomes missing.
fn relabel(name: PlSmallStr, column: &Column, categories: &CategoryMap) -> Result<Series> {
    let mut labels: Vec<Option<&str>> = Vec::with_capacity(column.len());
    match categories {
        CategoryMap::Codes(map) => {
            for code in codes(column)? {
                labels.push(code.and_then(|c| map.get(&c)).map(String::as_str));
            }
        }
        CategoryMap::Keys(map) => {
            for idx in 0..column.len() {
                let key = any_to_text(column.get(idx)?);
                labels.push(key.and_then(|k| map.get(&k)).map(String::as_str));
            }
        }
    }
    Ok(Series::new(name, labels))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn strings(values: &[Option<&str>]) -> Column {
        Series::new("RAW".into(), values).into_column()
    }

    fn spec(declared: DeclaredType) -> ColumnSpec {
        ColumnSpec::new("Clean", declared)
    }

    #[test]
    fn sanitized_float_column() {
        let raw = strings(&[Some("  "), Some("-"), Some("3.0."), Some("abc")]);
        let cleaned = clean_column(&raw, &spec(DeclaredType::Float), true).unwrap();

        assert_eq!(cleaned.name().as_str(), "Clean");
        assert_eq!(cleaned.dtype(), &DataType::Float32);
        assert_eq!(
            cleaned.f32().unwrap().into_iter().collect::<Vec<_>>(),
            vec![None, None, Some(3.0), None]
        );
    }

    #[test]
    fn integer_codes_relabel() {
        let raw = Series::new("RAW".into(), [Some(1i64), Some(2), Some(9), None]).into_column();
        let categories = CategoryMap::Codes(BTreeMap::from([
            (1, "Urban".to_string()),
            (2, "Rural".to_string()),
        ]));
        let cleaned = clean_column(&raw, &spec(DeclaredType::Category(categories)), true).unwrap();
        assert_eq!(
            cleaned.str().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some("Urban"), Some("Rural"), None, None]
        );
    }

    #[test]
    fn text_codes_relabel_through_integer_cast() {
        let raw = strings(&[Some("1"), Some("2.0"), Some("x")]);
        let categories = CategoryMap::Codes(BTreeMap::from([
            (1, "Urban".to_string()),
            (2, "Rural".to_string()),
        ]));
        let cleaned = clean_column(&raw, &spec(DeclaredType::Category(categories)), true).unwrap();
        assert_eq!(
            cleaned.str().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some("Urban"), Some("Rural"), None]
        );
    }

    #[test]
    fn keyed_categories_use_text() {
        let raw = strings(&[Some("M"), Some("F"), Some("U")]);
        let categories = CategoryMap::Keys(BTreeMap::from([
            ("M".to_string(), "Male".to_string()),
            ("F".to_string(), "Female".to_string()),
        ]));
        let cleaned = clean_column(&raw, &spec(DeclaredType::Category(categories)), true).unwrap();
        assert_eq!(
            cleaned.str().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some("Male"), Some("Female"), None]
        );
    }

    #[test]
    fn boolean_compares_with_true_value() {
        let raw = Series::new("RAW".into(), [Some(1i64), Some(2), None]).into_column();
        let cleaned = clean_column(&raw, &spec(DeclaredType::Boolean { true_value: 1 }), true).unwrap();
        assert_eq!(
            cleaned.bool().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some(true), Some(false), None]
        );
    }

    #[test]
    fn unsigned_narrows_to_smallest_width() {
        let small = Series::new("RAW".into(), [1i64, 200]).into_column();
        assert_eq!(coerce(&small, &DeclaredType::Unsigned, "x").unwrap().dtype(), &DataType::UInt8);

        let wider = Series::new("RAW".into(), [1i64, 70_000]).into_column();
        assert_eq!(coerce(&wider, &DeclaredType::Unsigned, "x").unwrap().dtype(), &DataType::UInt32);

        let negative = Series::new("RAW".into(), [-1i64, 3]).into_column();
        assert_eq!(coerce(&negative, &DeclaredType::Unsigned, "x").unwrap().dtype(), &DataType::Int64);

        let fractional = strings(&[Some("1.5"), Some("2")]);
        assert_eq!(coerce(&fractional, &DeclaredType::Unsigned, "x").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn integer_narrows_by_range() {
        let small = Series::new("RAW".into(), [-100i64, 100]).into_column();
        assert_eq!(coerce(&small, &DeclaredType::Integer, "x").unwrap().dtype(), &DataType::Int8);

        let wider = Series::new("RAW".into(), [-1i64, 40_000]).into_column();
        let series = coerce(&wider, &DeclaredType::Integer, "x").unwrap();
        assert_eq!(series.dtype(), &DataType::Int32);
        assert_eq!(
            series.i32().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some(-1), Some(40_000)]
        );
    }

    #[test]
    fn float_narrows_within_tolerance() {
        let decimals = strings(&[Some("0.1"), Some("12.35"), Some("2")]);
        let series = coerce(&decimals, &DeclaredType::Float, "x").unwrap();
        assert_eq!(series.dtype(), &DataType::Float32);
        assert_eq!(
            series.f32().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some(0.1), Some(12.35), Some(2.0)]
        );

        let large = strings(&[Some("123456789.5"), Some("1")]);
        let series = coerce(&large, &DeclaredType::Float, "x").unwrap();
        assert_eq!(series.dtype(), &DataType::Float64);
        assert_eq!(
            series.f64().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some(123_456_789.5), Some(1.0)]
        );
    }

    #[test]
    fn all_missing_numeric_column_narrows_vacuously() {
        let empty = strings(&[None, Some("abc")]);
        let series = coerce(&empty, &DeclaredType::Unsigned, "x").unwrap();
        assert_eq!(series.dtype(), &DataType::UInt8);
        assert_eq!(series.null_count(), 2);
    }

    #[test]
    fn fixed_unsigned_drops_unrepresentable_values() {
        let raw = Series::new("RAW".into(), [Some(12i64), Some(300), Some(-1), None]).into_column();
        let series = coerce(&raw, &DeclaredType::FixedUnsigned(UnsignedWidth::U8), "x").unwrap();
        assert_eq!(series.dtype(), &DataType::UInt8);
        assert_eq!(
            series.u8().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some(12), None, None, None]
        );
    }

    #[test]
    fn string_type_keeps_values() {
        let raw = Series::new("RAW".into(), [1i64, 2]).into_column();
        let series = coerce(&raw, &DeclaredType::String, "Code").unwrap();
        assert_eq!(series.name().as_str(), "Code");
        assert_eq!(series.dtype(), &DataType::Int64);
    }

    #[test]
    fn replacements_run_before_sanitation_and_typing() {
        let raw = Series::new("RAW".into(), [Some(0i64), Some(5), Some(7), None]).into_column();
        let replace = ReplacementMap::new(BTreeMap::from([
            ("0".to_string(), None),
            ("7".to_string(), Some("70".to_string())),
        ]));
        let spec = spec(DeclaredType::Unsigned).with_replace(replace);
        let cleaned = clean_column(&raw, &spec, true).unwrap();
        assert_eq!(cleaned.dtype(), &DataType::UInt8);
        assert_eq!(
            cleaned.u8().unwrap().into_iter().collect::<Vec<_>>(),
            vec![None, Some(5), Some(70), None]
        );
    }

    #[test]
    fn numeric_replacements_keep_the_raw_dtype() {
        let raw = Series::new("RAW".into(), [Some(0i64), Some(5), None]).into_column();
        let replace = ReplacementMap::new(BTreeMap::from([
            ("0".to_string(), None),
            ("5".to_string(), Some("50".to_string())),
        ]));
        let cleaned = clean_column(&raw, &spec(DeclaredType::String).with_replace(replace), true).unwrap();
        assert_eq!(cleaned.dtype(), &DataType::Int64);
        assert_eq!(
            cleaned.i64().unwrap().into_iter().collect::<Vec<_>>(),
            vec![None, Some(50), None]
        );
    }

    #[test]
    fn fractional_replacement_widens_integers_to_float() {
        let raw = Series::new("RAW".into(), [1i64, 2]).into_column();
        let replace = ReplacementMap::new(BTreeMap::from([("2".to_string(), Some("2.5".to_string()))]));
        let replaced = apply_replacements(&raw, &replace).unwrap();
        assert_eq!(replaced.dtype(), &DataType::Float64);
        assert_eq!(
            replaced.f64().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some(1.0), Some(2.5)]
        );
    }

    #[test]
    fn text_replacement_turns_numbers_into_text() {
        let raw = Series::new("RAW".into(), [1i64, 2]).into_column();
        let replace = ReplacementMap::new(BTreeMap::from([("2".to_string(), Some("two".to_string()))]));
        let replaced = apply_replacements(&raw, &replace).unwrap();
        assert_eq!(
            replaced.str().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some("1"), Some("two")]
        );
    }

    #[test]
    fn sanitation_can_be_turned_off() {
        let raw = strings(&[Some("3.0."), Some("-")]);
        let cleaned = clean_column(&raw, &spec(DeclaredType::String), false).unwrap();
        assert_eq!(
            cleaned.str().unwrap().into_iter().collect::<Vec<_>>(),
            vec![Some("3.0."), Some("-")]
        );
    }
}
