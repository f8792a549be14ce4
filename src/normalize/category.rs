use serde::Serialize;

/// Seating bucket used as the primary sort key for display lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SectionCategory {
    Premium,
    Orchestra,
    Mezzanine,
    Balcony,
    Other,
}

impl SectionCategory {
    pub fn name(&self) -> &'static str {
        match self {
            SectionCategory::Premium => "premium",
            SectionCategory::Orchestra => "orchestra",
            SectionCategory::Mezzanine => "mezzanine",
            SectionCategory::Balcony => "balcony",
            SectionCategory::Other => "other",
        }
    }

    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

// Checked in order; first match wins.
const RULES: &[(&[&str], SectionCategory)] = &[
    (&["premium", "mid-premium", "mid premium"], SectionCategory::Premium),
    (&["orchestra", "orch"], SectionCategory::Orchestra),
    (&["mezzanine", "mezz"], SectionCategory::Mezzanine),
    (&["balcony", "balc"], SectionCategory::Balcony),
];

/// Maps a free-text section label onto a bucket and its rank.
pub fn categorize(text: &str) -> (SectionCategory, u8) {
    let lowered = text.to_lowercase();
    let category = RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lowered.contains(n)))
        .map(|(_, category)| *category)
        .unwrap_or(SectionCategory::Other);
    (category, category.rank())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_buckets() {
        assert_eq!(categorize("Premium Orchestra"), (SectionCategory::Premium, 0));
        assert_eq!(categorize("Mid Premium"), (SectionCategory::Premium, 0));
        assert_eq!(categorize("Orch Center"), (SectionCategory::Orchestra, 1));
        assert_eq!(categorize("FRONT MEZZ"), (SectionCategory::Mezzanine, 2));
        assert_eq!(categorize("Rear Balc"), (SectionCategory::Balcony, 3));
        assert_eq!(categorize("Box Seats"), (SectionCategory::Other, 4));
        assert_eq!(categorize(""), (SectionCategory::Other, 4));
        assert_eq!(categorize("Rear Mezz").0.name(), "mezzanine");
    }

    #[test]
    fn test_rank_ordering_is_total() {
        let labels = ["Balcony", "Box", "Mezzanine", "Premium", "Orchestra"];
        let mut ranked: Vec<_> = labels.iter().map(|l| (categorize(l).1, *l)).collect();
        ranked.sort();
        let order: Vec<_> = ranked.into_iter().map(|(_, l)| l).collect();
        assert_eq!(order, vec!["Premium", "Orchestra", "Mezzanine", "Balcony", "Box"]);
    }
}
