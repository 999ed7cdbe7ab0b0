//! Thin facade over the cryptographic primitives used by SCRAM.
//!
//! SCRAM-SHA-256 needs exactly five things from a crypto backend: SHA-256,
//! HMAC-SHA-256, PBKDF2 keyed with HMAC-SHA-256, a cryptographically strong
//! random source, and a constant-time byte comparison. This module wraps
//! them behind small free functions so the rest of the crate never touches
//! backend types directly.
//!
//! Base64 helpers live here too because every SCRAM value that crosses the
//! wire in binary form (nonce, salt, proof, signature, channel-binding
//! input) travels base64-encoded.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::ScramError;

type HmacSha256 = Hmac<Sha256>;

/// Output length of SHA-256, and therefore of every SCRAM-SHA-256 key.
pub const SCRAM_KEY_LEN: usize = 32;

/// Number of raw random bytes in a client nonce.
///
/// Base64-encoding 18 bytes yields a 24-character printable nonce with no
/// padding.
pub const RAW_NONCE_LEN: usize = 18;

/// Compute the SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; SCRAM_KEY_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute HMAC-SHA-256 of `data` under `key`.
///
/// # Errors
///
/// Returns [`ScramError::Crypto`] if the backend rejects the key.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; SCRAM_KEY_LEN], ScramError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| ScramError::Crypto(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

/// PBKDF2 with HMAC-SHA-256 as the PRF and a 32-byte derived key (RFC 2898).
///
/// This is the `Hi()` function of RFC 5802 with dkLen equal to the hash
/// output length.
pub fn pbkdf2_hmac_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<[u8; SCRAM_KEY_LEN], ScramError> {
    let mut output = [0u8; SCRAM_KEY_LEN];
    pbkdf2::pbkdf2::<HmacSha256>(password, salt, iterations, &mut output)
        .map_err(|e| ScramError::Crypto(e.to_string()))?;
    Ok(output)
}

/// Fill an `N`-byte array from the operating system's CSPRNG.
///
/// # Errors
///
/// Returns [`ScramError::Crypto`] if the random source is unavailable.
pub fn strong_random<const N: usize>() -> Result<[u8; N], ScramError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(|e| ScramError::Crypto(e.to_string()))?;
    Ok(buf)
}

/// Generate a fresh client nonce: [`RAW_NONCE_LEN`] CSPRNG bytes,
/// base64-encoded to printable ASCII.
///
/// # Examples
///
/// ```
/// use pgsasl_proto::crypto::generate_nonce;
///
/// let nonce = generate_nonce().unwrap();
/// assert_eq!(nonce.len(), 24);
/// assert!(!nonce.contains(','));
/// ```
pub fn generate_nonce() -> Result<String, ScramError> {
    let raw: [u8; RAW_NONCE_LEN] = strong_random()?;
    Ok(b64_encode(&raw))
}

/// Encode bytes with the standard base64 alphabet, no line breaks.
pub fn b64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decode standard-alphabet base64, rejecting any non-alphabet byte.
pub fn b64_decode(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(encoded)
}

/// Constant-time byte equality.
///
/// Slices of unequal length compare unequal; the length itself is not
/// secret.
#[inline]
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_digest() {
        // FIPS 180-2 test vector for "abc".
        let digest = sha256(b"abc");
        assert_eq!(
            b64_encode(&digest),
            "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0="
        );
    }

    #[test]
    fn test_hmac_accepts_any_key_length() {
        assert!(hmac_sha256(b"", b"data").is_ok());
        assert!(hmac_sha256(&[0u8; 100], b"data").is_ok());
    }

    #[test]
    fn test_hmac_deterministic() {
        let a = hmac_sha256(b"key", b"data").unwrap();
        let b = hmac_sha256(b"key", b"data").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pbkdf2_iteration_count_matters() {
        let one = pbkdf2_hmac_sha256(b"password", b"salt", 1).unwrap();
        let two = pbkdf2_hmac_sha256(b"password", b"salt", 2).unwrap();
        assert_ne!(one, two);
    }

    #[test]
    fn test_nonce_length_and_uniqueness() {
        let a = generate_nonce().unwrap();
        let b = generate_nonce().unwrap();
        assert_eq!(a.len(), 24);
        assert_ne!(a, b);
    }

    #[test]
    fn test_b64_round_trip() {
        let data = b"binary\x00\xffdata";
        assert_eq!(b64_decode(&b64_encode(data)).unwrap(), data);
    }

    #[test]
    fn test_b64_rejects_non_alphabet() {
        assert!(b64_decode("not base64!").is_err());
        assert!(b64_decode("AAA\nAAA=").is_err());
    }

    #[test]
    fn test_ct_eq() {
        assert!(ct_eq(b"same", b"same"));
        assert!(!ct_eq(b"same", b"diff"));
        assert!(!ct_eq(b"short", b"longer"));
        assert!(ct_eq(b"", b""));
    }
}
