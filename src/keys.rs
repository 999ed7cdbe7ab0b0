//! The SCRAM-SHA-256 key schedule (RFC 5802 §3).
//!
//! ```text
//! SaltedPassword := Hi(Normalize(password), salt, i)
//! ClientKey      := HMAC(SaltedPassword, "Client Key")
//! StoredKey      := H(ClientKey)
//! ServerKey      := HMAC(SaltedPassword, "Server Key")
//! AuthMessage    := client-first-bare , server-first , client-final-without-proof
//! ClientProof    := ClientKey XOR HMAC(StoredKey, AuthMessage)
//! ServerSignature:= HMAC(ServerKey, AuthMessage)
//! ```
//!
//! Each derived key is a 32-byte newtype that wipes itself on drop. The
//! types intentionally implement neither `Debug` nor `Display`; key
//! material must never end up in logs or error strings.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{self, SCRAM_KEY_LEN};
use crate::error::ScramError;

const CLIENT_KEY_LABEL: &[u8] = b"Client Key";
const SERVER_KEY_LABEL: &[u8] = b"Server Key";

/// `Hi(Normalize(password), salt, i)`: the PBKDF2 output both proof and
/// verification keys derive from.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SaltedPassword([u8; SCRAM_KEY_LEN]);

impl SaltedPassword {
    /// Derive from an already-normalized password.
    pub fn derive(password: &[u8], salt: &[u8], iterations: u32) -> Result<Self, ScramError> {
        Ok(Self(crypto::pbkdf2_hmac_sha256(password, salt, iterations)?))
    }

    /// `ClientKey := HMAC(SaltedPassword, "Client Key")`
    pub fn client_key(&self) -> Result<ClientKey, ScramError> {
        Ok(ClientKey(crypto::hmac_sha256(&self.0, CLIENT_KEY_LABEL)?))
    }

    /// `ServerKey := HMAC(SaltedPassword, "Server Key")`
    pub fn server_key(&self) -> Result<ServerKey, ScramError> {
        Ok(ServerKey(crypto::hmac_sha256(&self.0, SERVER_KEY_LABEL)?))
    }
}

/// The client-side proof key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClientKey([u8; SCRAM_KEY_LEN]);

impl ClientKey {
    /// Wrap a pre-computed client key (e.g. from connection configuration).
    pub fn from_bytes(bytes: [u8; SCRAM_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// `StoredKey := H(ClientKey)`, the form the server keeps on disk.
    pub fn stored_key(&self) -> StoredKey {
        StoredKey(crypto::sha256(&self.0))
    }

    pub fn as_bytes(&self) -> &[u8; SCRAM_KEY_LEN] {
        &self.0
    }
}

/// The hashed client key stored by the server.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct StoredKey([u8; SCRAM_KEY_LEN]);

impl StoredKey {
    pub fn from_bytes(bytes: [u8; SCRAM_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SCRAM_KEY_LEN] {
        &self.0
    }
}

/// The key the server signs its final message with.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ServerKey([u8; SCRAM_KEY_LEN]);

impl ServerKey {
    /// Wrap a pre-computed server key (e.g. from connection configuration).
    pub fn from_bytes(bytes: [u8; SCRAM_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SCRAM_KEY_LEN] {
        &self.0
    }
}

/// Concatenate the three retained message parts into the AuthMessage that
/// both proof and server signature are computed over.
pub fn auth_message(
    client_first_bare: &str,
    server_first: &str,
    client_final_without_proof: &str,
) -> String {
    format!("{client_first_bare},{server_first},{client_final_without_proof}")
}

/// `ClientProof := ClientKey XOR HMAC(H(ClientKey), AuthMessage)`
///
/// The proof itself goes on the wire, but the intermediate client
/// signature would reveal the client key when combined with it, so it is
/// wiped before returning.
pub fn client_proof(
    client_key: &ClientKey,
    auth_message: &str,
) -> Result<[u8; SCRAM_KEY_LEN], ScramError> {
    let stored_key = client_key.stored_key();
    let mut signature = crypto::hmac_sha256(stored_key.as_bytes(), auth_message.as_bytes())?;

    let mut proof = [0u8; SCRAM_KEY_LEN];
    for (i, byte) in proof.iter_mut().enumerate() {
        *byte = client_key.0[i] ^ signature[i];
    }

    signature.zeroize();
    Ok(proof)
}

/// `ServerSignature := HMAC(ServerKey, AuthMessage)`
pub fn server_signature(
    server_key: &ServerKey,
    auth_message: &str,
) -> Result<[u8; SCRAM_KEY_LEN], ScramError> {
    crypto::hmac_sha256(server_key.as_bytes(), auth_message.as_bytes())
}
