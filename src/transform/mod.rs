//! Output shapes built from a task's raw pricing lines: one tabular row per
//! showtime, or copy-ready text blocks.

pub mod display;
pub mod tabular;

pub use display::{format_pricing_by_date, DisplayBlock};
pub use tabular::build_rows;
