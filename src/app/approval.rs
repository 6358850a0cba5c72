//! Reading y/n answers for pending file writes.

/// Parse a y/n answer. An empty line counts as "no".
pub(crate) fn parse_approval_decision(input: &str) -> Option<bool> {
    let normalized = input.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "y" | "yes" => Some(true),
        "" | "n" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_short_and_long_forms() {
        assert_eq!(parse_approval_decision("y"), Some(true));
        assert_eq!(parse_approval_decision(" YES "), Some(true));
        assert_eq!(parse_approval_decision("n"), Some(false));
        assert_eq!(parse_approval_decision("No"), Some(false));
    }

    #[test]
    fn empty_line_denies_and_noise_is_rejected() {
        assert_eq!(parse_approval_decision(""), Some(false));
        assert_eq!(parse_approval_decision("maybe"), None);
    }
}
