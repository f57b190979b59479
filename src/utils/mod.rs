//! Utility functions and helpers.

pub mod http;

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  Acme \n\t Placement   Circular "),
            "Acme Placement Circular"
        );
        assert_eq!(normalize_whitespace(" \n "), "");
    }
}
