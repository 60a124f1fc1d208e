use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::Error;
use crate::types::ProfileClaims;

/// Decodes an identity-provider credential into its profile claims.
///
/// The credential is a JWT (`header.payload.signature`). Only the payload is
/// read: the signature is NOT verified here. Trust is delegated to the
/// identity provider and the backend.
///
/// # Errors
///
/// Returns [`Error::CredentialDecode`] if the credential is empty, is not
/// three dot-separated segments, the payload is not base64url JSON, or a
/// required claim (`name`, `email`, `picture`) is missing.
pub fn decode_credential(credential: &str) -> Result<ProfileClaims, Error> {
    let payload = extract_payload(credential)?;
    serde_json::from_slice(&payload).map_err(|e| Error::CredentialDecode(e.to_string()))
}

/// Extracts the raw payload bytes from a JWT-shaped credential.
fn extract_payload(credential: &str) -> Result<Vec<u8>, Error> {
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(Error::CredentialDecode("empty credential".into()));
    }

    let parts: Vec<&str> = credential.split('.').collect();
    if parts.len() != 3 {
        return Err(Error::CredentialDecode("invalid credential format".into()));
    }

    // Some issuers pad base64url segments
    let payload_b64 = parts[1].trim_end_matches('=');
    if payload_b64.is_empty() {
        return Err(Error::CredentialDecode("empty payload".into()));
    }

    URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| Error::CredentialDecode("invalid payload encoding".into()))
}
