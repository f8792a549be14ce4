use crate::types::{split_sections, RawPricingLine};
use serde::{Deserialize, Serialize};

/// One element of the pricing grid, in document order, as reported by the
/// in-page walker script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GridNode {
    /// A `product-date-time-*` heading.
    Header { text: String },
    /// Any other sibling, with the section and price texts found inside it.
    Row {
        #[serde(default)]
        sections: Vec<String>,
        #[serde(default)]
        prices: Vec<String>,
    },
}

/// All pricing lines under one showtime heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowtimeGroup {
    pub label: String,
    pub lines: Vec<RawPricingLine>,
}

/// Every header opens a group that collects the following rows until the
/// next header. Rows before the first header belong to no showtime and are
/// dropped. Within a row, the i-th section pairs with the i-th price and
/// the longer list is truncated. Slash-separated descriptions become one
/// line per section, all with the same price.
pub fn group_nodes(nodes: &[GridNode]) -> Vec<ShowtimeGroup> {
    let mut groups: Vec<ShowtimeGroup> = Vec::new();

    for node in nodes {
        match node {
            GridNode::Header { text } => groups.push(ShowtimeGroup {
                label: text.trim().to_string(),
                lines: Vec::new(),
            }),
            GridNode::Row { sections, prices } => {
                let Some(group) = groups.last_mut() else {
                    continue;
                };
                for (description, price) in sections.iter().zip(prices.iter()) {
                    let price = price.trim();
                    for section in split_sections(description) {
                        group
                            .lines
                            .push(RawPricingLine::new(&group.label, section, price));
                    }
                }
            }
        }
    }

    groups
}

pub fn flatten_groups(groups: Vec<ShowtimeGroup>) -> Vec<RawPricingLine> {
    groups.into_iter().flat_map(|g| g.lines).collect()
}
