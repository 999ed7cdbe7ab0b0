//! SASLprep password normalization (RFC 4013).
//!
//! Passwords fed into the SCRAM key derivation must be normalized with the
//! SASLprep stringprep profile so that visually identical passwords typed
//! on different systems derive the same keys.
//!
//! Normalization is best-effort by design: a password that is not valid
//! UTF-8, or that contains prohibited code points, is used as-is. The
//! server applies the same rule, so both sides still agree on the bytes.

use std::borrow::Cow;

/// Outcome of SASLprep normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Saslprep {
    /// The input normalized cleanly.
    Normalized(String),
    /// The input contains code points prohibited by the profile; the
    /// caller may proceed with the original bytes.
    Prohibited,
    /// The input is not valid UTF-8; the caller may proceed with the
    /// original bytes.
    NotUtf8,
}

/// Normalize a password with the SASLprep stringprep profile.
///
/// # Examples
///
/// ```
/// use pgsasl_proto::saslprep::{saslprep, Saslprep};
///
/// assert_eq!(
///     saslprep(b"correct horse"),
///     Saslprep::Normalized("correct horse".to_string())
/// );
/// assert_eq!(saslprep(&[0xff, 0xfe]), Saslprep::NotUtf8);
/// ```
pub fn saslprep(input: &[u8]) -> Saslprep {
    let Ok(s) = std::str::from_utf8(input) else {
        return Saslprep::NotUtf8;
    };
    match stringprep::saslprep(s) {
        Ok(normalized) => Saslprep::Normalized(normalized.into_owned()),
        Err(_) => Saslprep::Prohibited,
    }
}

/// Normalize a password, falling back to the original bytes on any
/// normalization failure.
///
/// This is the form the SCRAM session and the secret builder use: SASLprep
/// when possible, the verbatim password otherwise.
pub fn normalize_or_original(input: &[u8]) -> Cow<'_, [u8]> {
    match saslprep(input) {
        Saslprep::Normalized(s) => Cow::Owned(s.into_bytes()),
        Saslprep::Prohibited | Saslprep::NotUtf8 => Cow::Borrowed(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        assert_eq!(
            saslprep(b"pencil"),
            Saslprep::Normalized("pencil".to_string())
        );
    }

    #[test]
    fn test_idempotent_on_normalized_ascii() {
        let once = match saslprep(b"user password") {
            Saslprep::Normalized(s) => s,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(saslprep(once.as_bytes()), Saslprep::Normalized(once));
    }

    #[test]
    fn test_non_ascii_space_maps_to_space() {
        // RFC 4013 §2.1: non-ASCII space characters map to U+0020.
        let input = "a\u{00a0}b";
        assert_eq!(
            saslprep(input.as_bytes()),
            Saslprep::Normalized("a b".to_string())
        );
    }

    #[test]
    fn test_control_characters_prohibited() {
        assert_eq!(saslprep(b"pass\x07word"), Saslprep::Prohibited);
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(saslprep(&[0xc3, 0x28]), Saslprep::NotUtf8);
    }

    #[test]
    fn test_fallback_keeps_original_bytes() {
        let raw = [0xff, 0x00, 0x41];
        assert_eq!(normalize_or_original(&raw), Cow::Borrowed(&raw[..]));
    }

    #[test]
    fn test_fallback_normalizes_when_possible() {
        let normalized = normalize_or_original("a\u{00a0}b".as_bytes());
        assert_eq!(normalized.as_ref(), b"a b");
    }
}
