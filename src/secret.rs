//! SCRAM secret generation for server-side storage.
//!
//! A SCRAM verifier never stores the password: the server keeps the salt,
//! the iteration count, and the derived `StoredKey`/`ServerKey` pair,
//! serialized as
//!
//! ```text
//! SCRAM-SHA-256$<iterations>:<b64 salt>$<b64 StoredKey>:<b64 ServerKey>
//! ```
//!
//! [`build_secret`] produces that record from a cleartext password;
//! [`parse_secret`] reads one back into its components.

use crate::crypto::{self, SCRAM_KEY_LEN};
use crate::error::{Result, ScramError};
use crate::keys::SaltedPassword;
use crate::saslprep;

/// Default PBKDF2 iteration count for newly built secrets.
pub const DEFAULT_ITERATIONS: u32 = 4096;

/// Salt length for newly built secrets, in raw bytes.
pub const DEFAULT_SALT_LEN: usize = 16;

/// Build a stored SCRAM secret from a cleartext password.
///
/// The password is SASLprep-normalized when possible and used verbatim
/// otherwise; the salt is [`DEFAULT_SALT_LEN`] CSPRNG bytes.
///
/// # Errors
///
/// [`ScramError::InvalidIterations`] for an iteration count of zero, or
/// [`ScramError::Crypto`] if the backend fails.
///
/// # Examples
///
/// ```
/// use pgsasl_proto::secret::{build_secret, DEFAULT_ITERATIONS};
///
/// let record = build_secret(b"pencil", DEFAULT_ITERATIONS).unwrap();
/// assert!(record.starts_with("SCRAM-SHA-256$4096:"));
/// ```
pub fn build_secret(password: &[u8], iterations: u32) -> Result<String> {
    let salt: [u8; DEFAULT_SALT_LEN] = crypto::strong_random()?;
    build_secret_with_salt(password, &salt, iterations)
}

/// [`build_secret`] with a caller-chosen salt, for deterministic output.
pub fn build_secret_with_salt(password: &[u8], salt: &[u8], iterations: u32) -> Result<String> {
    if iterations < 1 {
        return Err(ScramError::InvalidIterations);
    }

    let password = saslprep::normalize_or_original(password);
    let salted = SaltedPassword::derive(&password, salt, iterations)?;
    let stored_key = salted.client_key()?.stored_key();
    let server_key = salted.server_key()?;

    Ok(format!(
        "SCRAM-SHA-256${}:{}${}:{}",
        iterations,
        crypto::b64_encode(salt),
        crypto::b64_encode(stored_key.as_bytes()),
        crypto::b64_encode(server_key.as_bytes()),
    ))
}

/// Components of a stored SCRAM secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScramSecret {
    /// PBKDF2 iteration count.
    pub iterations: u32,
    /// Raw salt bytes.
    pub salt: Vec<u8>,
    /// `H(ClientKey)`.
    pub stored_key: [u8; SCRAM_KEY_LEN],
    /// `HMAC(SaltedPassword, "Server Key")`.
    pub server_key: [u8; SCRAM_KEY_LEN],
}

/// Parse a stored secret record back into its components.
pub fn parse_secret(record: &str) -> Result<ScramSecret> {
    let rest = record
        .strip_prefix("SCRAM-SHA-256$")
        .ok_or(ScramError::MalformedSecret)?;

    let (params, keys) = rest.split_once('$').ok_or(ScramError::MalformedSecret)?;
    let (iterations, salt) = params.split_once(':').ok_or(ScramError::MalformedSecret)?;
    let (stored_key, server_key) = keys.split_once(':').ok_or(ScramError::MalformedSecret)?;

    let iterations: u32 = iterations.parse().map_err(|_| ScramError::MalformedSecret)?;
    if iterations < 1 {
        return Err(ScramError::MalformedSecret);
    }

    let salt = crypto::b64_decode(salt).map_err(|_| ScramError::MalformedSecret)?;
    if salt.is_empty() {
        return Err(ScramError::MalformedSecret);
    }

    let stored_key: [u8; SCRAM_KEY_LEN] = crypto::b64_decode(stored_key)
        .map_err(|_| ScramError::MalformedSecret)?
        .try_into()
        .map_err(|_| ScramError::MalformedSecret)?;
    let server_key: [u8; SCRAM_KEY_LEN] = crypto::b64_decode(server_key)
        .map_err(|_| ScramError::MalformedSecret)?
        .try_into()
        .map_err(|_| ScramError::MalformedSecret)?;

    Ok(ScramSecret {
        iterations,
        salt,
        stored_key,
        server_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::b64_encode;
    use crate::keys;

    #[test]
    fn test_build_layout() {
        let record = build_secret(b"secret", 4096).unwrap();
        let parsed = parse_secret(&record).unwrap();
        assert_eq!(parsed.iterations, 4096);
        assert_eq!(parsed.salt.len(), DEFAULT_SALT_LEN);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(matches!(
            build_secret(b"secret", 0),
            Err(ScramError::InvalidIterations)
        ));
    }

    #[test]
    fn test_deterministic_with_fixed_salt() {
        let a = build_secret_with_salt(b"secret", b"0123456789abcdef", 4096).unwrap();
        let b = build_secret_with_salt(b"secret", b"0123456789abcdef", 4096).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fresh_salts_differ() {
        let a = build_secret(b"secret", 1).unwrap();
        let b = build_secret(b"secret", 1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_round_trip_matches_key_schedule() {
        let salt = b"0123456789abcdef";
        let record = build_secret_with_salt(b"pencil", salt, 1024).unwrap();
        let parsed = parse_secret(&record).unwrap();

        let salted = SaltedPassword::derive(b"pencil", salt, 1024).unwrap();
        let stored_key = salted.client_key().unwrap().stored_key();
        let server_key = salted.server_key().unwrap();

        assert_eq!(&parsed.stored_key, stored_key.as_bytes());
        assert_eq!(&parsed.server_key, server_key.as_bytes());
        assert_eq!(parsed.salt, salt);
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        assert!(matches!(
            parse_secret("SCRAM-SHA-1$4096:c2FsdA==$YQ==:Yg=="),
            Err(ScramError::MalformedSecret)
        ));
    }

    #[test]
    fn test_parse_rejects_short_keys() {
        let record = format!(
            "SCRAM-SHA-256$4096:{}${}:{}",
            b64_encode(b"0123456789abcdef"),
            b64_encode(b"short"),
            b64_encode(&[0u8; 32]),
        );
        assert!(matches!(
            parse_secret(&record),
            Err(ScramError::MalformedSecret)
        ));
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert!(matches!(
            parse_secret("SCRAM-SHA-256$4096:c2FsdA=="),
            Err(ScramError::MalformedSecret)
        ));
    }

    #[test]
    fn test_server_signature_derivable_from_record() {
        // The parsed server key must sign messages identically to one
        // derived directly from the password.
        let salt = b"fedcba9876543210";
        let record = build_secret_with_salt(b"pencil", salt, 256).unwrap();
        let parsed = parse_secret(&record).unwrap();

        let salted = SaltedPassword::derive(b"pencil", salt, 256).unwrap();
        let direct = keys::server_signature(&salted.server_key().unwrap(), "auth").unwrap();
        let via_record = keys::server_signature(
            &crate::keys::ServerKey::from_bytes(parsed.server_key),
            "auth",
        )
        .unwrap();
        assert_eq!(direct, via_record);
    }
}
