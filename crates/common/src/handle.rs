//! Handle validation.
//!
//! Domain and group handles are short lowercase identifiers (`[a-z0-9]+`),
//! used verbatim as persistence keys and in callback payloads.

/// Returns true if `handle` is a valid domain or group handle.
pub fn is_valid_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("pluto42")]
    #[case("a")]
    #[case("0")]
    #[case("abc123xyz")]
    fn accepts_lowercase_alphanumeric(#[case] handle: &str) {
        assert!(is_valid_handle(handle));
    }

    #[rstest]
    #[case("")]
    #[case("Pluto42")]
    #[case("pluto 42")]
    #[case("pluto-42")]
    #[case("pluto_42")]
    #[case("plütö")]
    #[case("/create")]
    fn rejects_empty_uppercase_and_punctuation(#[case] handle: &str) {
        assert!(!is_valid_handle(handle));
    }
}
