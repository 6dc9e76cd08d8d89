//! Query building types.
//!
//! This module provides Q objects for structured filters.

mod filter;

pub use filter::{CompareOp, FilterExpr, Q};
