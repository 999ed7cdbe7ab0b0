//! Error types for the SCRAM authentication library.
//!
//! This module defines error types for protocol-level failures and
//! message-grammar failures encountered during a SCRAM exchange.

use thiserror::Error;

/// Convenience type alias for Results using [`ScramError`].
pub type Result<T, E = ScramError> = std::result::Result<T, E>;

/// Top-level SCRAM authentication errors.
///
/// Every error is terminal: once an exchange has returned an error, the
/// session is latched failed and further calls report
/// [`ScramError::InvalidState`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScramError {
    /// The message did not match the SCRAM grammar.
    #[error("malformed SCRAM message ({0})")]
    Malformed(#[from] MalformedMessage),

    /// The server nonce does not carry the client nonce as a prefix.
    #[error("invalid SCRAM response (nonce mismatch)")]
    NonceMismatch,

    /// The salt attribute did not decode to a non-empty byte string.
    #[error("malformed SCRAM message (invalid salt)")]
    InvalidSalt,

    /// The iteration count was not a decimal integer >= 1.
    #[error("malformed SCRAM message (invalid iteration count)")]
    InvalidIterations,

    /// The server signature did not decode to the hash output length.
    #[error("malformed SCRAM message (invalid server signature)")]
    InvalidServerSignatureLength,

    /// The server signature did not match the expected value.
    ///
    /// The server failed to prove knowledge of the stored verifier; the
    /// exchange reaches its final state but reports failure.
    #[error("incorrect server signature")]
    ServerSignatureMismatch,

    /// The server ended the exchange with an `e=` error attribute.
    #[error("error received from server in SCRAM exchange: {0}")]
    ServerError(String),

    /// Channel binding was required or selected but cannot be used,
    /// typically because TLS is not in use or no certificate hash is
    /// available.
    #[error("channel binding is required, but cannot be used")]
    ChannelBindingUnavailable,

    /// The server offered no SASL mechanism this client implements.
    #[error("none of the server's SASL authentication mechanisms are supported")]
    NoSupportedMechanism,

    /// The exchange was driven outside its state contract, or the
    /// supplied credential cannot complete the requested step.
    #[error("invalid SCRAM exchange state")]
    InvalidState,

    /// A stored SCRAM secret did not match the expected layout.
    #[error("malformed SCRAM secret")]
    MalformedSecret,

    /// The cryptographic backend reported a failure.
    #[error("crypto backend failure: {0}")]
    Crypto(String),
}

/// Grammar-level failures in a SCRAM wire message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MalformedMessage {
    /// The message was empty.
    #[error("empty message")]
    EmptyMessage,

    /// The message contained an embedded NUL byte, so its declared length
    /// disagrees with its string length.
    #[error("length mismatch")]
    EmbeddedNul,

    /// The message was not valid UTF-8.
    #[error("message is not valid UTF-8")]
    NotUtf8,

    /// The expected attribute letter was not found at the cursor.
    #[error("attribute \"{0}\" expected")]
    AttributeExpected(char),

    /// The attribute letter was not followed by `=`.
    #[error("expected character \"=\" for attribute \"{0}\"")]
    EqualsExpected(char),

    /// Bytes remained after the last expected attribute.
    #[error("garbage at end of {0}")]
    TrailingGarbage(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScramError::NonceMismatch;
        assert_eq!(format!("{}", err), "invalid SCRAM response (nonce mismatch)");

        let err = ScramError::ServerError("other-error".to_string());
        assert_eq!(
            format!("{}", err),
            "error received from server in SCRAM exchange: other-error"
        );
    }

    #[test]
    fn test_malformed_display() {
        let err = MalformedMessage::AttributeExpected('r');
        assert_eq!(format!("{}", err), "attribute \"r\" expected");

        let err = MalformedMessage::EqualsExpected('i');
        assert_eq!(
            format!("{}", err),
            "expected character \"=\" for attribute \"i\""
        );

        let err = MalformedMessage::TrailingGarbage("server-first-message");
        assert_eq!(format!("{}", err), "garbage at end of server-first-message");
    }

    #[test]
    fn test_error_source_chaining() {
        let cause = MalformedMessage::EmptyMessage;
        let err = ScramError::Malformed(cause.clone());

        let source = std::error::Error::source(&err);
        assert!(source.is_some());
        assert_eq!(source.unwrap().to_string(), cause.to_string());
    }

    #[test]
    fn test_error_conversion() {
        let err: ScramError = MalformedMessage::EmbeddedNul.into();
        match err {
            ScramError::Malformed(MalformedMessage::EmbeddedNul) => {}
            _ => panic!("Expected Malformed variant"),
        }
    }
}
