//! Base64 encoding utilities.
//!
//! Initiation tokens and the `sig` claim use the standard padded alphabet,
//! while the segments of a compact JWS use the URL-safe alphabet without
//! padding. [`Base64Bytes`] keeps the encoded form together with the
//! alphabet it was produced with.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD as b64, URL_SAFE_NO_PAD as b64url};
use std::borrow::Cow;
use std::fmt::Display;

/// A wrapper for base64-encoded byte data.
///
/// # Example
///
/// ```rust
/// use ponchopay_types::util::Base64Bytes;
///
/// let encoded = Base64Bytes::encode(b"hello world");
/// assert_eq!(encoded.to_string(), "aGVsbG8gd29ybGQ=");
///
/// let url_safe = Base64Bytes::encode_url(br#"{"alg":"HS256"}"#);
/// assert_eq!(url_safe.to_string(), "eyJhbGciOiJIUzI1NiJ9");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes<'a>(pub Cow<'a, [u8]>);

impl Base64Bytes<'_> {
    /// Decodes standard-alphabet base64 bytes to raw binary data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64.decode(&self.0)
    }

    /// Decodes URL-safe, unpadded base64 bytes to raw binary data.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid base64url.
    pub fn decode_url(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64url.decode(&self.0)
    }

    /// Encodes raw binary data with the standard, padded alphabet.
    pub fn encode<T: AsRef<[u8]>>(input: T) -> Base64Bytes<'static> {
        let encoded = b64.encode(input.as_ref());
        Base64Bytes(Cow::Owned(encoded.into_bytes()))
    }

    /// Encodes raw binary data with the URL-safe alphabet and no padding.
    pub fn encode_url<T: AsRef<[u8]>>(input: T) -> Base64Bytes<'static> {
        let encoded = b64url.encode(input.as_ref());
        Base64Bytes(Cow::Owned(encoded.into_bytes()))
    }
}

impl AsRef<[u8]> for Base64Bytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<'a> From<&'a [u8]> for Base64Bytes<'a> {
    fn from(slice: &'a [u8]) -> Self {
        Base64Bytes(Cow::Borrowed(slice))
    }
}

impl<'a> From<&'a str> for Base64Bytes<'a> {
    fn from(value: &'a str) -> Self {
        Base64Bytes(Cow::Borrowed(value.as_bytes()))
    }
}

impl Display for Base64Bytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.0.as_ref()))
    }
}
