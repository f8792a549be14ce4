//! Lexical normalization of showtime headings, prices and section labels.

pub mod category;
pub mod price;
pub mod showtime;

pub use category::{categorize, SectionCategory};
pub use price::{extract_numeric_price, normalize_price_display};
pub use showtime::{parse_showtime, ShowtimeParse};
