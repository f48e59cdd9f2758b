//! Shared utilities for the preparation crates.

mod frame;

pub use frame::{
    any_to_f64, any_to_string, column_f64_values, column_names, column_text_values,
    format_numeric, parse_f64,
};
