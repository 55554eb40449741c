//! Common type helpers.

pub mod numeric;

pub use numeric::{apply_pct, coerce_decimal};
