//! Display-safe masking of email addresses.
//!
//! Renders an address as `<first-3-chars>...<last-3-chars>` so the UI can
//! remind a user which address a confirmation link was sent to without
//! echoing the whole thing. This is a presentation helper only; it makes
//! no attempt to validate the input.

/// Mask an email address for display.
///
/// Keeps the first three and last three characters and elides the rest.
/// Inputs shorter than three characters are kept whole on both sides.
/// An empty input produces an empty output.
pub fn mask_email(email: &str) -> String {
    if email.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = email.chars().collect();
    let head: String = chars.iter().take(3).collect();
    let tail: String = chars[chars.len().saturating_sub(3)..].iter().collect();

    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::mask_email;

    #[test]
    fn masks_typical_address() {
        assert_eq!(mask_email("ab@cd.com"), "ab@...com");
    }

    #[test]
    fn masks_long_address() {
        assert_eq!(mask_email("someone@example.org"), "som...org");
    }

    #[test]
    fn empty_input_produces_empty_output() {
        assert_eq!(mask_email(""), "");
    }

    #[test]
    fn short_input_repeats_on_both_sides() {
        assert_eq!(mask_email("a"), "a...a");
        assert_eq!(mask_email("ab"), "ab...ab");
    }

    #[test]
    fn masks_on_char_boundaries() {
        assert_eq!(mask_email("héllo@ex.ämple"), "hél...ple");
    }
}
