//! Minimal HTTP transport for the PonchoPay API.
//!
//! [`Api`] issues single `POST` and `PUT` requests against a base URL and
//! hands the raw [`Response`] back. It never follows redirects: the
//! initiation endpoints answer with `302 Found`, and the `Location` header of
//! that response is the result the caller is after.
//!
//! Every request carries `content-type: application/json` and an anonymous
//! [`Telemetry`] descriptor. Both override caller-supplied headers of the
//! same name.

use http::Method;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use ponchopay_types::config::DEFAULT_BASE_URL;
use ponchopay_types::{join_paths, serialise};
use reqwest::{Client, Response, redirect};
use url::Url;

use crate::error::Error;
use crate::telemetry::{TELEMETRY_HEADER, Telemetry};

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

/// A transport bound to one PonchoPay host.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct Api {
    /// Base URL, as given at construction
    base: String,
    /// Reqwest client with redirects disabled
    client: Client,
    /// Serialised [`Telemetry`], computed once
    telemetry: HeaderValue,
}

impl Api {
    /// Creates a transport for `base`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be initialised, or
    /// [`Error::InvalidHeader`] if the telemetry header cannot be encoded.
    pub fn new(base: impl Into<String>) -> Result<Self, Error> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| Error::Http {
                context: "Failed to build HTTP client",
                source: e,
            })?;
        let telemetry = serialise(&Telemetry::current()).map_err(|e| Error::Serialisation {
            context: "Failed to serialise telemetry",
            source: e,
        })?;
        let telemetry = HeaderValue::from_str(&telemetry).map_err(|e| Error::InvalidHeader {
            context: "Failed to encode telemetry header",
            source: e,
        })?;
        Ok(Self {
            base: base.into(),
            client,
            telemetry,
        })
    }

    /// Creates a transport for the production host.
    pub fn production() -> Result<Self, Error> {
        Self::new(DEFAULT_BASE_URL)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Resolves `path` against the base URL with exactly one separating slash.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        Url::parse(&join_paths(&self.base, path)).map_err(|e| Error::UrlParse {
            context: "Failed to construct request URL",
            source: e,
        })
    }

    /// Sends a `POST` request.
    pub async fn post(
        &self,
        path: &str,
        headers: HeaderMap,
        body: String,
    ) -> Result<Response, Error> {
        self.send(Method::POST, path, headers, body, "POST request")
            .await
    }

    /// Sends a `PUT` request.
    pub async fn put(
        &self,
        path: &str,
        headers: HeaderMap,
        body: String,
    ) -> Result<Response, Error> {
        self.send(Method::PUT, path, headers, body, "PUT request")
            .await
    }

    fn headers(&self, mut headers: HeaderMap) -> HeaderMap {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(TELEMETRY_HEADER, self.telemetry.clone());
        headers
    }

    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "ponchopay.api.send", skip(self, headers, body), err)
    )]
    async fn send(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: String,
        context: &'static str,
    ) -> Result<Response, Error> {
        let url = self.url(path)?;
        let response = self
            .client
            .request(method, url)
            .headers(self.headers(headers))
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Http { context, source: e })?;

        #[cfg(feature = "telemetry")]
        debug!(status = %response.status(), "Received response");

        Ok(response)
    }
}
