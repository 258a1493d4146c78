//! Phone number normalization to E.164.
//!
//! The congregation is Philippines-based, so unprefixed numbers are assumed
//! to be local: `0917 123 4567`, `9171234567`, and `+63 917 123 4567` all
//! normalize to `+639171234567`. Numbers that cannot be made sense of return
//! `None`; the delivery worker treats those as a permanent failure rather
//! than retrying.

/// Normalize a raw phone number to E.164, or `None` if it is not usable.
pub fn normalize(raw: &str) -> Option<String> {
    // Keep digits; remember a '+' only when it precedes every digit.
    let mut digits = String::new();
    let mut has_plus = false;
    for c in raw.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if c == '+' && digits.is_empty() {
            has_plus = true;
        }
    }
    if digits.is_empty() {
        return None;
    }

    if digits.starts_with("63") {
        // Already carries the country code (mobile 12, some landlines 13).
        if digits.len() == 12 || digits.len() == 13 {
            return Some(format!("+{digits}"));
        }
        return None;
    }
    if let Some(rest) = digits.strip_prefix('0') {
        // Domestic trunk prefix: 0917... -> +63917...
        if rest.len() == 10 || rest.len() == 11 {
            return Some(format!("+63{rest}"));
        }
        return None;
    }
    if digits.len() == 10 || digits.len() == 11 {
        // Bare subscriber number.
        return Some(format!("+63{digits}"));
    }
    if !has_plus && digits.len() > 10 {
        // Overlong unprefixed input: assume the subscriber number is the
        // last ten digits.
        let tail = &digits[digits.len() - 10..];
        return Some(format!("+63{tail}"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn already_e164_passes_through() {
        assert_eq!(normalize("+639171234567").as_deref(), Some("+639171234567"));
    }

    #[test]
    fn country_code_without_plus() {
        assert_eq!(normalize("639171234567").as_deref(), Some("+639171234567"));
    }

    #[test]
    fn domestic_trunk_prefix() {
        assert_eq!(normalize("09171234567").as_deref(), Some("+639171234567"));
    }

    #[test]
    fn separators_are_ignored() {
        assert_eq!(normalize("0917 123 4567").as_deref(), Some("+639171234567"));
        assert_eq!(normalize("(0917) 123-4567").as_deref(), Some("+639171234567"));
        assert_eq!(normalize("+63 917 123 4567").as_deref(), Some("+639171234567"));
    }

    #[test]
    fn bare_subscriber_number() {
        assert_eq!(normalize("9171234567").as_deref(), Some("+639171234567"));
    }

    #[test]
    fn overlong_unprefixed_keeps_last_ten_digits() {
        assert_eq!(normalize("1234567890123").as_deref(), Some("+634567890123"));
    }

    #[test]
    fn wrong_length_with_country_code_is_rejected() {
        assert_eq!(normalize("63917123456"), None);
        assert_eq!(normalize("+6391712345678901"), None);
    }

    #[test]
    fn short_or_empty_inputs_are_rejected() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("no digits here"), None);
        assert_eq!(normalize("0288881"), None);
    }

    #[test]
    fn foreign_plus_numbers_are_rejected() {
        // A '+' number that is neither +63 nor local-length is unusable.
        assert_eq!(normalize("+4915123456789"), None);
    }
}
