//! SASL authentication plumbing for the PostgreSQL wire protocol.
//!
//! This module provides the mechanism names, the channel-binding policy,
//! mechanism selection against a server's advertised list, and the
//! client-side exchange contract that the connection layer drives.
//!
//! # Supported Mechanisms
//!
//! - **SCRAM-SHA-256**: salted challenge-response authentication (RFC 7677)
//! - **SCRAM-SHA-256-PLUS**: the same with TLS channel binding (RFC 5929)
//!
//! # Reference
//! - RFC 5802 (SCRAM): <https://tools.ietf.org/html/rfc5802>
//! - RFC 7677 (SCRAM-SHA-256): <https://tools.ietf.org/html/rfc7677>
//!
//! # Example
//!
//! ```
//! use pgsasl_proto::sasl::{select_mechanism, ChannelBinding, SaslMechanism};
//!
//! let offered = vec![
//!     SaslMechanism::ScramSha256,
//!     SaslMechanism::ScramSha256Plus,
//! ];
//!
//! // Over TLS the -PLUS variant wins unless binding is disabled.
//! let chosen = select_mechanism(&offered, ChannelBinding::Prefer, true).unwrap();
//! assert_eq!(chosen, SaslMechanism::ScramSha256Plus);
//! ```

use crate::error::{Result, ScramError};

mod attr;
mod gs2;
pub mod scram;

pub use self::scram::{Credential, ScramClient, ScramConfig};

/// SASL mechanism names used by the PostgreSQL authentication exchange.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SaslMechanism {
    /// SCRAM-SHA-256 (RFC 7677), no channel binding.
    ScramSha256,
    /// SCRAM-SHA-256-PLUS, bound to the TLS channel via the server
    /// certificate hash.
    ScramSha256Plus,
    /// Unknown or unsupported mechanism.
    Unknown(String),
}

impl SaslMechanism {
    /// Parse a mechanism name string.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "SCRAM-SHA-256" => Self::ScramSha256,
            "SCRAM-SHA-256-PLUS" => Self::ScramSha256Plus,
            _ => Self::Unknown(name.to_owned()),
        }
    }

    /// Returns the canonical name of this mechanism.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ScramSha256 => "SCRAM-SHA-256",
            Self::ScramSha256Plus => "SCRAM-SHA-256-PLUS",
            Self::Unknown(s) => s,
        }
    }

    /// Check if this mechanism is supported by [`ScramClient`].
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::ScramSha256 | Self::ScramSha256Plus)
    }

    /// Whether this mechanism carries channel binding.
    #[inline]
    pub fn is_channel_bound(&self) -> bool {
        matches!(self, Self::ScramSha256Plus)
    }
}

impl std::fmt::Display for SaslMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse the mechanism list from an `AuthenticationSASL` message body.
///
/// The server advertises mechanisms as a sequence of NUL-terminated names
/// closed by an empty string.
///
/// # Example
///
/// ```
/// use pgsasl_proto::sasl::{parse_mechanisms, SaslMechanism};
///
/// let body = b"SCRAM-SHA-256\0SCRAM-SHA-256-PLUS\0\0";
/// let mechs = parse_mechanisms(body);
/// assert!(mechs.contains(&SaslMechanism::ScramSha256));
/// assert!(mechs.contains(&SaslMechanism::ScramSha256Plus));
/// ```
pub fn parse_mechanisms(body: &[u8]) -> Vec<SaslMechanism> {
    body.split(|b| *b == 0)
        .filter(|name| !name.is_empty())
        .map(|name| SaslMechanism::parse(&String::from_utf8_lossy(name)))
        .collect()
}

/// Channel-binding policy read from the connection configuration.
///
/// Matches the connection option of the same name; only the first byte of
/// the configured value is significant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelBinding {
    /// Never use channel binding.
    Disable,
    /// Use channel binding if the server offers it (the default).
    #[default]
    Prefer,
    /// Fail unless the exchange is channel-bound.
    Require,
}

impl ChannelBinding {
    /// Parse a policy string by its first byte.
    pub fn parse(value: &str) -> Self {
        match value.as_bytes().first() {
            Some(b'd') => Self::Disable,
            Some(b'r') => Self::Require,
            _ => Self::Prefer,
        }
    }

    /// Whether the client is willing to advertise channel-binding support.
    #[inline]
    pub fn allows_binding(self) -> bool {
        self != Self::Disable
    }
}

/// Choose the mechanism to answer an `AuthenticationSASL` request with.
///
/// Preference order: SCRAM-SHA-256-PLUS over SCRAM-SHA-256, but only when
/// TLS is in use and the policy allows binding. A `Require` policy that
/// cannot be satisfied fails rather than silently downgrading.
///
/// # Errors
///
/// - [`ScramError::ChannelBindingUnavailable`] when the policy is
///   [`ChannelBinding::Require`] but no bindable mechanism can be used.
/// - [`ScramError::NoSupportedMechanism`] when the server offers no SCRAM
///   mechanism at all.
pub fn select_mechanism(
    offered: &[SaslMechanism],
    policy: ChannelBinding,
    ssl_in_use: bool,
) -> Result<SaslMechanism> {
    let has_plus = offered.contains(&SaslMechanism::ScramSha256Plus);
    let has_plain = offered.contains(&SaslMechanism::ScramSha256);

    if ssl_in_use && policy.allows_binding() && has_plus {
        return Ok(SaslMechanism::ScramSha256Plus);
    }
    if policy == ChannelBinding::Require {
        return Err(ScramError::ChannelBindingUnavailable);
    }
    if has_plain {
        return Ok(SaslMechanism::ScramSha256);
    }
    Err(ScramError::NoSupportedMechanism)
}

/// Result of a successful [`SaslClient::exchange`] step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaslStep {
    /// More messages are expected; send these bytes to the server.
    Continue(Vec<u8>),
    /// The exchange completed and the server proved itself.
    Complete,
}

/// The client side of a SASL mechanism, as driven by the connection's
/// authentication loop.
///
/// Construction is mechanism-specific; releasing a client (dropping it)
/// wipes any key material it holds. A failed step poisons the client:
/// every later call returns [`ScramError::InvalidState`].
pub trait SaslClient {
    /// Feed the next server message in (or `None` to open the exchange)
    /// and get the next client message out.
    fn exchange(&mut self, input: Option<&[u8]>) -> Result<SaslStep>;

    /// True once the exchange completed over a channel-bound mechanism
    /// with the server signature verified.
    fn channel_bound(&self) -> bool;
}
