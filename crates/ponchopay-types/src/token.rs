//! Request signing for the PonchoPay API.
//!
//! Two schemes are derived from the integration key:
//!
//! - [`create_token`] proves that an initiation request (payment or
//!   subscription) was authored by the key holder. It is deterministic: the
//!   server correlates requests by metadata, not by token freshness.
//! - [`create_jwt`] produces a short-lived HS256 assertion for the
//!   manipulation endpoints. Its `sig` claim binds the assertion to the exact
//!   serialised request body and it expires [`ASSERTION_TTL_SECS`] after issue.
//!
//! The HMAC secret of the assertion is `SHA-256(key)`, never the raw key.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::timestamp::UnixTimestamp;
use crate::util::Base64Bytes;

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of a manipulation assertion, in seconds.
pub const ASSERTION_TTL_SECS: u64 = 5;

/// Base64url form of the protected header `{"alg":"HS256"}`.
const JWS_HEADER: &str = "eyJhbGciOiJIUzI1NiJ9";

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Failed to serialise assertion claims: {0}")]
    Claims(#[from] serde_json::Error),
    #[error("Signing secret could not be derived from the integration key")]
    InvalidKey,
    #[error("Malformed assertion: {0}")]
    Malformed(&'static str),
    #[error("Assertion signature does not match")]
    BadSignature,
}

/// Claims carried by a manipulation assertion, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub urn: String,
    pub email: String,
    /// `base64(SHA-256(body))` of the signed request body.
    pub sig: String,
    pub iat: UnixTimestamp,
    pub exp: UnixTimestamp,
}

fn sha256<T: AsRef<[u8]>>(data: T) -> Vec<u8> {
    Sha256::digest(data.as_ref()).to_vec()
}

fn signing_mac(key: &str) -> Result<HmacSha256, SigningError> {
    HmacSha256::new_from_slice(&sha256(key)).map_err(|_| SigningError::InvalidKey)
}

/// Creates a token for initiation endpoints.
///
/// ```
/// use ponchopay_types::token::create_token;
///
/// assert_eq!(
///     create_token("key", "metadata"),
///     "QUYCI7s3sDpIYvVcKojrKpQWZt+u3pp7O7E4Rdu+G1w="
/// );
/// ```
pub fn create_token(key: &str, metadata: &str) -> String {
    Base64Bytes::encode(sha256(format!("{metadata}.{key}"))).to_string()
}

/// Creates an assertion for manipulation endpoints, issued now.
///
/// `data` is the canonical serialised request body, as sent on the wire.
pub fn create_jwt(urn: &str, key: &str, email: &str, data: &str) -> Result<String, SigningError> {
    create_jwt_at(urn, key, email, data, UnixTimestamp::now())
}

/// Creates an assertion for manipulation endpoints with an explicit issue time.
pub fn create_jwt_at(
    urn: &str,
    key: &str,
    email: &str,
    data: &str,
    issued_at: UnixTimestamp,
) -> Result<String, SigningError> {
    let claims = AssertionClaims {
        urn: urn.to_string(),
        email: email.to_string(),
        sig: Base64Bytes::encode(sha256(data)).to_string(),
        iat: issued_at,
        exp: issued_at + ASSERTION_TTL_SECS,
    };
    let payload = Base64Bytes::encode_url(serde_json::to_vec(&claims)?);
    let signing_input = format!("{JWS_HEADER}.{payload}");

    let mut mac = signing_mac(key)?;
    mac.update(signing_input.as_bytes());
    let signature = Base64Bytes::encode_url(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

/// Checks the signature of an assertion and returns its claims.
///
/// Expiry is not checked; that is the receiver's call.
pub fn verify_jwt(token: &str, key: &str) -> Result<AssertionClaims, SigningError> {
    let mut segments = token.split('.');
    let (header, payload, signature) = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(header), Some(payload), Some(signature), None) => (header, payload, signature),
        _ => return Err(SigningError::Malformed("expected three segments")),
    };
    if header != JWS_HEADER {
        return Err(SigningError::Malformed("unsupported protected header"));
    }
    let signature = Base64Bytes::from(signature)
        .decode_url()
        .map_err(|_| SigningError::Malformed("signature is not base64url"))?;

    let mut mac = signing_mac(key)?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| SigningError::BadSignature)?;

    let payload = Base64Bytes::from(payload)
        .decode_url()
        .map_err(|_| SigningError::Malformed("payload is not base64url"))?;
    Ok(serde_json::from_slice(&payload)?)
}
