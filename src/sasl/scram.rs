//! SCRAM-SHA-256 client state machine (RFC 5802, RFC 7677).
//!
//! The exchange walks four states with no back-edges:
//!
//! ```text
//! Init ──exchange(None)──────────► NonceSent     emits client-first
//! NonceSent ──exchange(server-first)► ProofSent  emits client-final
//! ProofSent ──exchange(server-final)► Finished   verifies server signature
//! ```
//!
//! Any error latches the session failed; later calls return
//! [`ScramError::InvalidState`]. All key material (password, salted
//! password, derived keys) is wiped when the session drops.
//!
//! # Example
//!
//! ```
//! use pgsasl_proto::sasl::{Credential, SaslMechanism, SaslStep, ScramClient, ScramConfig};
//!
//! let mut client = ScramClient::new(
//!     Credential::Password(b"pencil".to_vec()),
//!     SaslMechanism::ScramSha256,
//!     ScramConfig::default(),
//! )?;
//!
//! // The first exchange opens the conversation with client-first.
//! let step = client.exchange(None)?;
//! assert!(matches!(step, SaslStep::Continue(_)));
//! # Ok::<(), pgsasl_proto::ScramError>(())
//! ```

use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{self, SCRAM_KEY_LEN};
use crate::error::{MalformedMessage, Result, ScramError};
use crate::keys::{self, ClientKey, SaltedPassword, ServerKey};
use crate::saslprep;

use super::attr::AttrReader;
use super::gs2;
use super::{ChannelBinding, SaslClient, SaslMechanism, SaslStep};

/// Client credential supplied at session construction.
///
/// The usual form is a cleartext password; connections that cache derived
/// keys can supply them directly and skip the PBKDF2 work.
#[derive(Zeroize, ZeroizeOnDrop)]
pub enum Credential {
    /// A cleartext password, normalized with SASLprep at construction.
    Password(Vec<u8>),
    /// A pre-computed client key. The client proof can be produced, but
    /// without a server key the server cannot be verified.
    ClientKey([u8; SCRAM_KEY_LEN]),
    /// A pre-computed server key alone. Rejected by [`ScramClient::new`]:
    /// it can never produce a client proof.
    ServerKey([u8; SCRAM_KEY_LEN]),
    /// Both pre-computed keys; no password needed at all.
    Both {
        /// The client key.
        client_key: [u8; SCRAM_KEY_LEN],
        /// The server key.
        server_key: [u8; SCRAM_KEY_LEN],
    },
}

/// Connection-level configuration the SCRAM exchange reads.
#[derive(Debug, Clone, Default)]
pub struct ScramConfig {
    /// The `channel_binding` connection option.
    pub channel_binding: ChannelBinding,
    /// Whether the connection runs over TLS.
    pub ssl_in_use: bool,
    /// The server certificate's endpoint hash (RFC 5929
    /// `tls-server-end-point`), required for `SCRAM-SHA-256-PLUS`.
    pub tls_server_end_point: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScramState {
    Init,
    NonceSent,
    ProofSent,
    Finished,
}

/// The client side of one SCRAM authentication exchange.
///
/// Owned by the connection between construction and drop; not meant to be
/// shared across threads. Each session is single-use: a completed or
/// failed exchange cannot be restarted.
pub struct ScramClient {
    state: ScramState,
    failed: bool,
    mechanism: SaslMechanism,
    config: ScramConfig,
    credential: Credential,

    client_nonce: String,
    client_first_bare: String,
    client_final_without_proof: String,

    // Populated from server-first.
    server_first: String,
    server_nonce: String,
    salt: Vec<u8>,
    iterations: u32,

    salted_password: Option<SaltedPassword>,
    server_signature: Option<[u8; SCRAM_KEY_LEN]>,
    server_proven: bool,
}

impl ScramClient {
    /// Create a session for one authentication exchange.
    ///
    /// A `Credential::Password` is SASLprep-normalized here, once, so both
    /// the proof and the later server verification see the same bytes.
    ///
    /// # Errors
    ///
    /// - [`ScramError::NoSupportedMechanism`] for a mechanism this client
    ///   does not implement.
    /// - [`ScramError::ChannelBindingUnavailable`] for
    ///   `SCRAM-SHA-256-PLUS` without TLS.
    /// - [`ScramError::InvalidState`] for a bare server key, which could
    ///   never produce a client proof.
    /// - [`ScramError::Crypto`] if the random source fails.
    pub fn new(
        credential: Credential,
        mechanism: SaslMechanism,
        config: ScramConfig,
    ) -> Result<Self> {
        if !mechanism.is_supported() {
            return Err(ScramError::NoSupportedMechanism);
        }
        if mechanism.is_channel_bound() && !config.ssl_in_use {
            return Err(ScramError::ChannelBindingUnavailable);
        }
        if matches!(credential, Credential::ServerKey(_)) {
            return Err(ScramError::InvalidState);
        }

        let mut credential = credential;
        if let Credential::Password(password) = &mut credential {
            let normalized = saslprep::normalize_or_original(password).into_owned();
            password.zeroize();
            *password = normalized;
        }

        Ok(Self {
            state: ScramState::Init,
            failed: false,
            mechanism,
            config,
            credential,
            client_nonce: crypto::generate_nonce()?,
            client_first_bare: String::new(),
            client_final_without_proof: String::new(),
            server_first: String::new(),
            server_nonce: String::new(),
            salt: Vec::new(),
            iterations: 0,
            salted_password: None,
            server_signature: None,
            server_proven: false,
        })
    }

    /// Replace the generated client nonce.
    ///
    /// Only meaningful before the first [`exchange`](Self::exchange) call;
    /// exists for test vectors and interoperability harnesses that need a
    /// deterministic exchange.
    pub fn with_client_nonce(mut self, nonce: impl Into<String>) -> Self {
        if self.state == ScramState::Init {
            self.client_nonce = nonce.into();
        }
        self
    }

    /// The base64 client nonce for this session.
    pub fn client_nonce(&self) -> &str {
        &self.client_nonce
    }

    /// The mechanism this session was created with.
    pub fn mechanism(&self) -> &SaslMechanism {
        &self.mechanism
    }

    /// The server signature received in server-final, once parsed.
    pub fn server_signature(&self) -> Option<&[u8; SCRAM_KEY_LEN]> {
        self.server_signature.as_ref()
    }

    /// Drive the exchange one step.
    ///
    /// Pass `None` to open the exchange (produces client-first), then each
    /// server reply in order. Errors are terminal.
    pub fn exchange(&mut self, input: Option<&[u8]>) -> Result<SaslStep> {
        if self.failed {
            return Err(ScramError::InvalidState);
        }
        match self.step(input) {
            Ok(step) => Ok(step),
            Err(err) => {
                self.failed = true;
                Err(err)
            }
        }
    }

    /// True once the exchange finished over `SCRAM-SHA-256-PLUS` with the
    /// server signature verified: the server proved possession of both the
    /// verifier and the TLS certificate.
    pub fn channel_bound(&self) -> bool {
        self.state == ScramState::Finished
            && self.server_proven
            && self.mechanism.is_channel_bound()
    }

    fn step(&mut self, input: Option<&[u8]>) -> Result<SaslStep> {
        match self.state {
            ScramState::Init => {
                let client_first = self.build_client_first();
                self.state = ScramState::NonceSent;
                debug!(nonce = %self.client_nonce, mechanism = %self.mechanism, "sent client-first message");
                Ok(SaslStep::Continue(client_first.into_bytes()))
            }
            ScramState::NonceSent => {
                let input = validate_input(input)?;
                self.read_server_first(input)?;
                let client_final = self.build_client_final()?;
                self.state = ScramState::ProofSent;
                debug!("sent client-final message");
                Ok(SaslStep::Continue(client_final.into_bytes()))
            }
            ScramState::ProofSent => {
                let input = validate_input(input)?;
                let received = self.read_server_final(input)?;
                let matched = self.verify_server_signature(&received)?;
                self.state = ScramState::Finished;
                self.server_signature = Some(received);
                if matched {
                    self.server_proven = true;
                    debug!("server signature verified");
                    Ok(SaslStep::Complete)
                } else {
                    Err(ScramError::ServerSignatureMismatch)
                }
            }
            ScramState::Finished => Err(ScramError::InvalidState),
        }
    }

    /// Build `gs2-header || n=,r=<nonce>`.
    ///
    /// The username is left empty: the backend takes it from the startup
    /// packet, and a name here would additionally need SASLprep plus
    /// `=` / `,` escaping.
    fn build_client_first(&mut self) -> String {
        let gs2 = gs2::gs2_header(
            &self.mechanism,
            self.config.channel_binding,
            self.config.ssl_in_use,
        );
        self.client_first_bare = format!("n=,r={}", self.client_nonce);
        format!("{gs2}{}", self.client_first_bare)
    }

    /// Parse `r=<nonce>,s=<salt>,i=<iterations>` and check the nonce.
    fn read_server_first(&mut self, input: &str) -> Result<()> {
        self.server_first = input.to_owned();

        let mut reader = AttrReader::new(input);

        let nonce = reader.read('r')?;
        // The server must have used our part of the nonce. Equality (no
        // server extension) is accepted; only a prefix mismatch fails.
        if nonce.len() < self.client_nonce.len() || !nonce.starts_with(self.client_nonce.as_str())
        {
            return Err(ScramError::NonceMismatch);
        }
        self.server_nonce = nonce.to_owned();

        let encoded_salt = reader.read('s')?;
        let salt = crypto::b64_decode(encoded_salt).map_err(|_| ScramError::InvalidSalt)?;
        if salt.is_empty() {
            return Err(ScramError::InvalidSalt);
        }

        let iterations_str = reader.read('i')?;
        let iterations: u32 = iterations_str
            .parse()
            .map_err(|_| ScramError::InvalidIterations)?;
        if iterations < 1 {
            return Err(ScramError::InvalidIterations);
        }

        reader.expect_end("server-first-message")?;

        self.salt = salt;
        self.iterations = iterations;
        debug!(
            iterations,
            salt_len = self.salt.len(),
            "parsed server-first message"
        );
        Ok(())
    }

    /// Build `c=<cbind>,r=<server-nonce>,p=<proof>`.
    fn build_client_final(&mut self) -> Result<String> {
        let cbind = gs2::cbind_attribute(
            &self.mechanism,
            self.config.channel_binding,
            self.config.ssl_in_use,
            self.config.tls_server_end_point.as_deref(),
        )?;
        self.client_final_without_proof = format!("{cbind},r={}", self.server_nonce);

        let auth_message = keys::auth_message(
            &self.client_first_bare,
            &self.server_first,
            &self.client_final_without_proof,
        );

        let client_key = match &self.credential {
            Credential::Password(password) => {
                // Keep the salted password around: server verification
                // derives the server key from it.
                let salted = SaltedPassword::derive(password, &self.salt, self.iterations)?;
                let client_key = salted.client_key()?;
                self.salted_password = Some(salted);
                client_key
            }
            Credential::ClientKey(bytes)
            | Credential::Both {
                client_key: bytes, ..
            } => ClientKey::from_bytes(*bytes),
            Credential::ServerKey(_) => return Err(ScramError::InvalidState),
        };

        let proof = keys::client_proof(&client_key, &auth_message)?;
        Ok(format!(
            "{},p={}",
            self.client_final_without_proof,
            crypto::b64_encode(&proof)
        ))
    }

    /// Parse `v=<signature>` or the `e=<reason>` error form.
    fn read_server_final(&mut self, input: &str) -> Result<[u8; SCRAM_KEY_LEN]> {
        let mut reader = AttrReader::new(input);

        if reader.peek() == Some('e') {
            let reason = reader.read('e')?;
            return Err(ScramError::ServerError(reason.to_owned()));
        }

        let encoded = reader.read('v')?;
        if !reader.at_end() {
            // The reference client tolerates trailing bytes here; keep
            // that, loudly.
            warn!("garbage at end of server-final-message");
        }

        let signature = crypto::b64_decode(encoded)
            .map_err(|_| ScramError::InvalidServerSignatureLength)?;
        signature
            .try_into()
            .map_err(|_| ScramError::InvalidServerSignatureLength)
    }

    /// Compare the received server signature against
    /// `HMAC(ServerKey, AuthMessage)` in constant time.
    fn verify_server_signature(&self, received: &[u8; SCRAM_KEY_LEN]) -> Result<bool> {
        let server_key = match &self.credential {
            Credential::ServerKey(bytes)
            | Credential::Both {
                server_key: bytes, ..
            } => ServerKey::from_bytes(*bytes),
            Credential::Password(_) => self
                .salted_password
                .as_ref()
                .ok_or(ScramError::InvalidState)?
                .server_key()?,
            // A bare client key cannot authenticate the server.
            Credential::ClientKey(_) => return Err(ScramError::InvalidState),
        };

        let auth_message = keys::auth_message(
            &self.client_first_bare,
            &self.server_first,
            &self.client_final_without_proof,
        );
        let expected = keys::server_signature(&server_key, &auth_message)?;
        Ok(crypto::ct_eq(&expected, received))
    }
}

impl SaslClient for ScramClient {
    fn exchange(&mut self, input: Option<&[u8]>) -> Result<SaslStep> {
        ScramClient::exchange(self, input)
    }

    fn channel_bound(&self) -> bool {
        ScramClient::channel_bound(self)
    }
}

/// Post-Init inputs must be non-empty, NUL-free UTF-8.
///
/// An embedded NUL would make the declared wire length disagree with the
/// string length the parsers see.
fn validate_input(input: Option<&[u8]>) -> Result<&str> {
    let bytes = input.unwrap_or_default();
    if bytes.is_empty() {
        return Err(MalformedMessage::EmptyMessage.into());
    }
    if bytes.contains(&0) {
        return Err(MalformedMessage::EmbeddedNul.into());
    }
    std::str::from_utf8(bytes).map_err(|_| MalformedMessage::NotUtf8.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::b64_encode;

    const NONCE: &str = "rOprNGfwEbeRWgbNEkqO";
    // base64 of b"salt".
    const SALT_B64: &str = "c2FsdA==";

    fn password_client(mechanism: SaslMechanism, config: ScramConfig) -> ScramClient {
        ScramClient::new(
            Credential::Password(b"pencil".to_vec()),
            mechanism,
            config,
        )
        .unwrap()
        .with_client_nonce(NONCE)
    }

    fn continue_bytes(step: SaslStep) -> String {
        match step {
            SaslStep::Continue(bytes) => String::from_utf8(bytes).unwrap(),
            SaslStep::Complete => panic!("expected Continue"),
        }
    }

    #[test]
    fn test_client_first_no_tls() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        let first = continue_bytes(client.exchange(None).unwrap());
        assert_eq!(first, format!("n,,n=,r={NONCE}"));
    }

    #[test]
    fn test_client_first_tls_advertises_support() {
        let config = ScramConfig {
            ssl_in_use: true,
            ..ScramConfig::default()
        };
        let mut client = password_client(SaslMechanism::ScramSha256, config);
        let first = continue_bytes(client.exchange(None).unwrap());
        assert_eq!(first, format!("y,,n=,r={NONCE}"));
    }

    #[test]
    fn test_client_first_binding_disabled() {
        let config = ScramConfig {
            channel_binding: ChannelBinding::Disable,
            ssl_in_use: true,
            ..ScramConfig::default()
        };
        let mut client = password_client(SaslMechanism::ScramSha256, config);
        let first = continue_bytes(client.exchange(None).unwrap());
        assert_eq!(first, format!("n,,n=,r={NONCE}"));
    }

    #[test]
    fn test_plus_requires_tls_at_construction() {
        let result = ScramClient::new(
            Credential::Password(b"pencil".to_vec()),
            SaslMechanism::ScramSha256Plus,
            ScramConfig::default(),
        );
        assert!(matches!(result, Err(ScramError::ChannelBindingUnavailable)));
    }

    #[test]
    fn test_unknown_mechanism_rejected() {
        let result = ScramClient::new(
            Credential::Password(b"pencil".to_vec()),
            SaslMechanism::Unknown("PLAIN".to_owned()),
            ScramConfig::default(),
        );
        assert!(matches!(result, Err(ScramError::NoSupportedMechanism)));
    }

    #[test]
    fn test_bare_server_key_rejected() {
        let result = ScramClient::new(
            Credential::ServerKey([0u8; 32]),
            SaslMechanism::ScramSha256,
            ScramConfig::default(),
        );
        assert!(matches!(result, Err(ScramError::InvalidState)));
    }

    #[test]
    fn test_empty_input_rejected() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let err = client.exchange(Some(b"")).unwrap_err();
        assert!(matches!(
            err,
            ScramError::Malformed(MalformedMessage::EmptyMessage)
        ));
    }

    #[test]
    fn test_embedded_nul_rejected() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let err = client
            .exchange(Some(b"r=abc\0,s=c2FsdA==,i=4096"))
            .unwrap_err();
        assert!(matches!(
            err,
            ScramError::Malformed(MalformedMessage::EmbeddedNul)
        ));
    }

    #[test]
    fn test_nonce_mismatch_fails_before_proof() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r=XXXX{NONCE},s={SALT_B64},i=4096");
        let err = client.exchange(Some(server_first.as_bytes())).unwrap_err();
        assert!(matches!(err, ScramError::NonceMismatch));
    }

    #[test]
    fn test_truncated_server_nonce_fails() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={},s={SALT_B64},i=4096", &NONCE[..8]);
        let err = client.exchange(Some(server_first.as_bytes())).unwrap_err();
        assert!(matches!(err, ScramError::NonceMismatch));
    }

    #[test]
    fn test_server_nonce_equal_to_client_nonce_accepted() {
        // The server appended nothing. Permitted: the check is a prefix
        // match, not a strict extension.
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={NONCE},s={SALT_B64},i=4096");
        let final_msg = continue_bytes(client.exchange(Some(server_first.as_bytes())).unwrap());
        assert!(final_msg.starts_with(&format!("c=biws,r={NONCE},p=")));
    }

    #[test]
    fn test_iterations_zero_rejected() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={NONCE}srv,s={SALT_B64},i=0");
        let err = client.exchange(Some(server_first.as_bytes())).unwrap_err();
        assert!(matches!(err, ScramError::InvalidIterations));
    }

    #[test]
    fn test_negative_iterations_rejected() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={NONCE}srv,s={SALT_B64},i=-5");
        let err = client.exchange(Some(server_first.as_bytes())).unwrap_err();
        assert!(matches!(err, ScramError::InvalidIterations));
    }

    #[test]
    fn test_iterations_with_trailing_garbage_rejected() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={NONCE}srv,s={SALT_B64},i=4096abc");
        let err = client.exchange(Some(server_first.as_bytes())).unwrap_err();
        assert!(matches!(err, ScramError::InvalidIterations));
    }

    #[test]
    fn test_one_iteration_accepted() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={NONCE}srv,s={SALT_B64},i=1");
        assert!(client.exchange(Some(server_first.as_bytes())).is_ok());
    }

    #[test]
    fn test_empty_salt_rejected() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={NONCE}srv,s=,i=4096");
        let err = client.exchange(Some(server_first.as_bytes())).unwrap_err();
        assert!(matches!(err, ScramError::InvalidSalt));
    }

    #[test]
    fn test_undecodable_salt_rejected() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={NONCE}srv,s=!!!,i=4096");
        let err = client.exchange(Some(server_first.as_bytes())).unwrap_err();
        assert!(matches!(err, ScramError::InvalidSalt));
    }

    #[test]
    fn test_server_first_trailing_garbage_rejected() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={NONCE}srv,s={SALT_B64},i=4096,x=extra");
        let err = client.exchange(Some(server_first.as_bytes())).unwrap_err();
        assert!(matches!(
            err,
            ScramError::Malformed(MalformedMessage::TrailingGarbage("server-first-message"))
        ));
    }

    #[test]
    fn test_attributes_out_of_order_rejected() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("s={SALT_B64},r={NONCE}srv,i=4096");
        let err = client.exchange(Some(server_first.as_bytes())).unwrap_err();
        assert!(matches!(
            err,
            ScramError::Malformed(MalformedMessage::AttributeExpected('r'))
        ));
    }

    #[test]
    fn test_failed_session_stays_failed() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let _ = client.exchange(Some(b"r=wrong,s=c2FsdA==,i=4096"));
        let err = client.exchange(Some(b"anything")).unwrap_err();
        assert!(matches!(err, ScramError::InvalidState));
        assert!(!client.channel_bound());
    }

    #[test]
    fn test_server_error_attribute_propagated() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={NONCE}srv,s={SALT_B64},i=1");
        client.exchange(Some(server_first.as_bytes())).unwrap();

        let err = client.exchange(Some(b"e=other-error")).unwrap_err();
        match err {
            ScramError::ServerError(reason) => assert_eq!(reason, "other-error"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_server_signature_rejected() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={NONCE}srv,s={SALT_B64},i=1");
        client.exchange(Some(server_first.as_bytes())).unwrap();

        let short = format!("v={}", b64_encode(&[1u8; 16]));
        let err = client.exchange(Some(short.as_bytes())).unwrap_err();
        assert!(matches!(err, ScramError::InvalidServerSignatureLength));
    }

    #[test]
    fn test_full_exchange_with_derived_server() {
        // Emulate the server with the crate's own key schedule: the
        // mock derives the same keys from the same password.
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        let first = continue_bytes(client.exchange(None).unwrap());
        let bare = first.strip_prefix("n,,").unwrap().to_owned();

        let server_first = format!("r={NONCE}srvpart,s={SALT_B64},i=64");
        let final_msg = continue_bytes(client.exchange(Some(server_first.as_bytes())).unwrap());
        let without_proof = final_msg.split(",p=").next().unwrap().to_owned();

        let auth_message = keys::auth_message(&bare, &server_first, &without_proof);
        let salted = SaltedPassword::derive(b"pencil", b"salt", 64).unwrap();
        let signature =
            keys::server_signature(&salted.server_key().unwrap(), &auth_message).unwrap();

        let server_final = format!("v={}", b64_encode(&signature));
        let step = client.exchange(Some(server_final.as_bytes())).unwrap();
        assert_eq!(step, SaslStep::Complete);
        assert_eq!(client.server_signature(), Some(&signature));
        // Plain mechanism: complete but not channel-bound.
        assert!(!client.channel_bound());
    }

    #[test]
    fn test_wrong_server_signature_fails_after_finish() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        client.exchange(None).unwrap();
        let server_first = format!("r={NONCE}srv,s={SALT_B64},i=1");
        client.exchange(Some(server_first.as_bytes())).unwrap();

        let bogus = format!("v={}", b64_encode(&[0u8; 32]));
        let err = client.exchange(Some(bogus.as_bytes())).unwrap_err();
        assert!(matches!(err, ScramError::ServerSignatureMismatch));
        assert!(!client.channel_bound());
    }

    #[test]
    fn test_exchange_after_complete_is_invalid() {
        let mut client = password_client(SaslMechanism::ScramSha256, ScramConfig::default());
        let first = continue_bytes(client.exchange(None).unwrap());
        let bare = first.strip_prefix("n,,").unwrap().to_owned();

        let server_first = format!("r={NONCE}x,s={SALT_B64},i=1");
        let final_msg = continue_bytes(client.exchange(Some(server_first.as_bytes())).unwrap());
        let without_proof = final_msg.split(",p=").next().unwrap().to_owned();

        let auth_message = keys::auth_message(&bare, &server_first, &without_proof);
        let salted = SaltedPassword::derive(b"pencil", b"salt", 1).unwrap();
        let signature =
            keys::server_signature(&salted.server_key().unwrap(), &auth_message).unwrap();
        let server_final = format!("v={}", b64_encode(&signature));
        client.exchange(Some(server_final.as_bytes())).unwrap();

        let err = client.exchange(Some(b"v=again")).unwrap_err();
        assert!(matches!(err, ScramError::InvalidState));
    }
}
