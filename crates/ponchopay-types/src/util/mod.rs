//! Utility types for PonchoPay.
//!
//! - [`b64`] - Base64 encoding in the two alphabets the API uses

pub mod b64;

pub use b64::*;
