use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number pattern is valid"));

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Drops every ".00" that directly follows a digit and is not followed by
/// another digit. Everything else is kept as-is.
///
/// "$169.00" -> "$169", "$99.00 - $299.00" -> "$99 - $299", "$169.50" unchanged.
pub fn normalize_price_display(text: &str) -> String {
    let text = text.trim();
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut copied_from = 0;

    while i + 3 <= bytes.len() {
        let is_cents = &bytes[i..i + 3] == b".00"
            && i > 0
            && bytes[i - 1].is_ascii_digit()
            && !bytes.get(i + 3).is_some_and(|b| b.is_ascii_digit());
        if is_cents {
            out.push_str(&text[copied_from..i]);
            i += 3;
            copied_from = i;
        } else {
            i += 1;
        }
    }
    out.push_str(&text[copied_from..]);
    out
}

/// First decimal number in a price string, ignoring currency symbols and
/// thousands separators. 0.0 when there is none; only meant as a sort key.
pub fn extract_numeric_price(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect();
    NUMBER_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_price_display() {
        assert_eq!(normalize_price_display("$169.00"), "$169");
        assert_eq!(normalize_price_display("$169.50"), "$169.50");
        assert_eq!(normalize_price_display("$99.00 - $299.00"), "$99 - $299");
    }

    #[test]
    fn test_normalize_keeps_non_trailing_zero_cents() {
        assert_eq!(normalize_price_display("$1.005"), "$1.005");
        assert_eq!(normalize_price_display("$.00"), "$.00");
        assert_eq!(normalize_price_display("$1,250.00*"), "$1,250*");
        assert_eq!(normalize_price_display("  $49.00 "), "$49");
        assert_eq!(normalize_price_display("Sold Out"), "Sold Out");
    }

    #[test]
    fn test_extract_numeric_price() {
        assert_eq!(extract_numeric_price("$1,234.50"), 1234.50);
        assert_eq!(extract_numeric_price("ask box office"), 0.0);
        assert_eq!(extract_numeric_price("$99 - $299"), 99.0);
        assert_eq!(extract_numeric_price("£75"), 75.0);
    }
}
