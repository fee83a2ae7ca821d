//! Shared utilities for the household budget survey crates.
//!
//! Survey extracts arrive with whatever dtype the CSV reader inferred, so the
//! cleaning pipeline needs one consistent way to look at a cell as text, as a
//! number, or as a nullable survey code. Those conversions live here.

pub mod polars;

pub use polars::{
    Number, any_is_null, any_to_i32_code, any_to_number, any_to_string, any_to_text,
    format_numeric, parse_number,
};
