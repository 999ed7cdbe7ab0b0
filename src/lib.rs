//! # pgsasl-proto
//!
//! A Rust library for the client side of PostgreSQL SASL authentication,
//! implementing SCRAM-SHA-256 and SCRAM-SHA-256-PLUS (RFC 5802, RFC 7677)
//! with TLS channel binding (RFC 5929), plus the ordered-key comparison
//! primitives used by btree index tooling in the same ecosystem.
//!
//! ## Features
//!
//! - Four-state SCRAM client exchange with strict message-grammar checks
//! - GS2 channel binding (`tls-server-end-point`) with a consistent flag
//!   across both client messages
//! - SASLprep password normalization with the reference fall-through
//!   behavior for non-UTF-8 and prohibited inputs
//! - Pre-computed client/server key credentials that skip PBKDF2
//! - Stored-secret generation (`SCRAM-SHA-256$<iter>:<salt>$<keys>`)
//! - Constant-time server-signature verification; key material wiped
//!   on drop
//! - Total-order comparators and skip support for btree key kinds

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ```rust
//! use pgsasl_proto::{Credential, SaslMechanism, SaslStep, ScramClient, ScramConfig};
//!
//! let mut client = ScramClient::new(
//!     Credential::Password(b"pencil".to_vec()),
//!     SaslMechanism::ScramSha256,
//!     ScramConfig::default(),
//! )?;
//!
//! // The first step emits the client-first message for the
//! // SASLInitialResponse packet.
//! let SaslStep::Continue(client_first) = client.exchange(None)? else {
//!     unreachable!("first step always continues");
//! };
//! assert!(client_first.starts_with(b"n,,n=,r="));
//!
//! // Each server reply is then fed back in order:
//! //   server-first -> Continue(client-final)
//! //   server-final -> Complete (server signature verified)
//! # Ok::<(), pgsasl_proto::ScramError>(())
//! ```
//!
//! ## Building a stored secret
//!
//! ```rust
//! use pgsasl_proto::secret::{build_secret, DEFAULT_ITERATIONS};
//!
//! let record = build_secret(b"correct horse", DEFAULT_ITERATIONS)?;
//! assert!(record.starts_with("SCRAM-SHA-256$"));
//! # Ok::<(), pgsasl_proto::ScramError>(())
//! ```

pub mod btcompare;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod sasl;
pub mod saslprep;
pub mod secret;

pub use self::btcompare::{IndexKey, KeyCompareError, SkipSupport};
pub use self::error::{MalformedMessage, ScramError};
pub use self::sasl::{
    parse_mechanisms, select_mechanism, ChannelBinding, Credential, SaslClient, SaslMechanism,
    SaslStep, ScramClient, ScramConfig,
};
pub use self::secret::build_secret;
