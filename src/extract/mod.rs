pub mod grouping;
pub mod page;

pub use grouping::{group_nodes, GridNode, ShowtimeGroup};
pub use page::{ExtractorSettings, PageExtractor};
