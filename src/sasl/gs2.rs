//! GS2 channel-binding header construction (RFC 5801, RFC 5929).
//!
//! The gs2 flag sent in client-first and the `c=` attribute sent in
//! client-final must agree exactly; the server rejects a mismatch. Both are
//! derived here from the same three frozen inputs (mechanism, policy, TLS
//! state), so agreement is structural rather than remembered.

use crate::crypto;
use crate::error::{Result, ScramError};

use super::{ChannelBinding, SaslMechanism};

/// The gs2 flag announcing active channel binding with the
/// `tls-server-end-point` type.
pub(crate) const GS2_PLUS_FLAG: &str = "p=tls-server-end-point";

/// base64 of the `n,,` header: no binding, empty authzid.
pub(crate) const CBIND_NO_BINDING: &str = "biws";

/// base64 of the `y,,` header: client supports binding, server did not
/// offer it.
pub(crate) const CBIND_TLS_SUPPORTED: &str = "eSws";

/// Build the gs2 header prefixed to the client-first message.
///
/// | condition                                  | header                     |
/// |--------------------------------------------|----------------------------|
/// | mechanism is `-PLUS`                       | `p=tls-server-end-point,,` |
/// | binding allowed and TLS in use             | `y,,`                      |
/// | binding disabled or no TLS                 | `n,,`                      |
pub(crate) fn gs2_header(
    mechanism: &SaslMechanism,
    policy: ChannelBinding,
    ssl_in_use: bool,
) -> String {
    if mechanism.is_channel_bound() {
        format!("{GS2_PLUS_FLAG},,")
    } else if policy.allows_binding() && ssl_in_use {
        "y,,".to_owned()
    } else {
        "n,,".to_owned()
    }
}

/// Build the `c=` attribute of the client-final message.
///
/// For `-PLUS` the attribute carries the gs2 header concatenated with the
/// server certificate's endpoint hash, base64-encoded; otherwise one of the
/// two constant encodings. The flag matches [`gs2_header`] by construction.
pub(crate) fn cbind_attribute(
    mechanism: &SaslMechanism,
    policy: ChannelBinding,
    ssl_in_use: bool,
    cert_hash: Option<&[u8]>,
) -> Result<String> {
    if mechanism.is_channel_bound() {
        let hash = cert_hash.ok_or(ScramError::ChannelBindingUnavailable)?;
        let mut cbind_input = Vec::with_capacity(GS2_PLUS_FLAG.len() + 2 + hash.len());
        cbind_input.extend_from_slice(GS2_PLUS_FLAG.as_bytes());
        cbind_input.extend_from_slice(b",,");
        cbind_input.extend_from_slice(hash);
        Ok(format!("c={}", crypto::b64_encode(&cbind_input)))
    } else if policy.allows_binding() && ssl_in_use {
        Ok(format!("c={CBIND_TLS_SUPPORTED}"))
    } else {
        Ok(format!("c={CBIND_NO_BINDING}"))
    }
}
