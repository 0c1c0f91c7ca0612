//! Utility modules for table loading and matching
//!
//! - Normalization: matching keys and token-aligned search
//! - Ranges: nitrogen amount and range parsing
//! - Columns: header location and column validation over polars DataFrames

pub mod normalization;
pub mod ranges;
pub mod columns;

// Re-export commonly used types
pub use normalization::{normalize_key, display_name, find_token};
pub use ranges::{NitrogenRange, parse_amount, parse_range};
pub use columns::{ColumnSpec, read_table, resolve_column, find_column, string_column};
