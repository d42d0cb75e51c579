//! Errors surfaced by the PonchoPay client.

use http::StatusCode;
use http::header::InvalidHeaderValue;
use ponchopay_types::config::ConfigError;
use ponchopay_types::token::SigningError;

/// Errors that can occur while talking to the PonchoPay API.
///
/// Every error is fatal to the call that produced it; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server redirected but did not say where to.
    #[error("The location header was expected in the response but it could not be found")]
    MissingLocation,
    #[error(
        "Unexpected response. Expected {} as status code but {} was received",
        .expected.as_u16(),
        .actual.as_u16()
    )]
    UnexpectedStatus {
        expected: StatusCode,
        actual: StatusCode,
    },
    #[error("Failed to sign request: {0}")]
    Signing(#[from] SigningError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to serialise request: {context}: {source}")]
    Serialisation {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid header value: {context}: {source}")]
    InvalidHeader {
        context: &'static str,
        #[source]
        source: InvalidHeaderValue,
    },
    #[error("HTTP error: {context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    /// Status code the server answered with, when the failure is a status mismatch.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::UnexpectedStatus { actual, .. } => Some(*actual),
            Error::Http { source, .. } => source.status(),
            _ => None,
        }
    }
}
