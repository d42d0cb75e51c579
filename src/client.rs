//! The PonchoPay API client.
//!
//! [`Client`] signs, sends and interprets the five operations of the
//! integration API. Each operation follows one of two response protocols:
//!
//! - **Redirect** ([`Client::initiate_payment`], [`Client::initiate_subscription`]):
//!   a `302 Found` with a `Location` header resolves to that URL.
//! - **Mutation** ([`Client::update_payment_method`], [`Client::refund_payment_method`],
//!   [`Client::cancel_payment`]): a `204 No Content` resolves to `()`.
//!
//! Any other status is an [`Error::UnexpectedStatus`]. Nothing is retried.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ponchopay::Client;
//! use ponchopay::request::{CancelPayment, InitiatePayment};
//!
//! # async fn run() -> Result<(), ponchopay::Error> {
//! let client = Client::with_base("🤫", "https://demo.ponchopay.com/")?;
//! let url = client
//!     .initiate_payment(&InitiatePayment::new("order-1", "🏠", 2034, "tommy@server.com"))
//!     .await?;
//! let payment_id = url.rsplit('/').next().unwrap_or_default();
//! client
//!     .cancel_payment(payment_id, &CancelPayment::new("🏠", "cancel@author.com"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use http::StatusCode;
use http::header::{AUTHORIZATION, HeaderMap, HeaderValue, LOCATION};
use ponchopay_types::config::{ClientConfig, DEFAULT_BASE_URL};
use ponchopay_types::request::{
    CancelPayment, InitiatePayment, InitiateSubscription, Initiation, Manipulation,
    RefundPaymentMethod, Tokenised, UpdatePaymentMethod,
};
use ponchopay_types::token::{create_jwt, create_token};
use ponchopay_types::{replace_params, serialise};
use reqwest::Response;
use std::collections::HashMap;
use std::fmt::Display;

use crate::api::Api;
use crate::error::Error;

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

const INITIATE_PAYMENT_ENDPOINT: &str = "/api/integration/generic/initiate";
const INITIATE_SUBSCRIPTION_ENDPOINT: &str = "/api/integration/generic/subscription";
const UPDATE_PAYMENT_METHOD_ENDPOINT: &str = "/api/payment-method/[id]";
const REFUND_PAYMENT_METHOD_ENDPOINT: &str = "/api/payment-method/[id]/refund";
const CANCEL_PAYMENT_ENDPOINT: &str = "/api/payment/[id]/cancel";

/// A client for the PonchoPay integration API.
///
/// Immutable after construction; clones can be used from many tasks at once.
#[derive(Clone)]
pub struct Client {
    /// Integration key
    key: String,
    /// Transport bound to the configured host
    api: Api,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("key", &"<redacted>")
            .field("api", &self.api)
            .finish()
    }
}

impl Client {
    /// Creates a client for the production host.
    pub fn new(key: impl Into<String>) -> Result<Self, Error> {
        Self::with_base(key, DEFAULT_BASE_URL)
    }

    /// Creates a client for `base`. Trailing slashes of `base` are ignored.
    pub fn with_base(key: impl Into<String>, base: &str) -> Result<Self, Error> {
        Ok(Self {
            key: key.into(),
            api: Api::new(base.trim_end_matches('/'))?,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        Self::with_base(config.key(), config.base_url())
    }

    /// Creates a client from `PONCHOPAY_KEY` and, if set, `PONCHOPAY_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the key variable is not set.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_config(&ClientConfig::from_env()?)
    }

    /// Returns the base URL requests are sent to, without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.api.base()
    }

    /// Initiates a payment and returns the URL the payer must visit.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "ponchopay.client.initiate_payment", skip_all, err)
    )]
    pub async fn initiate_payment(&self, init: &InitiatePayment) -> Result<String, Error> {
        self.initiate(INITIATE_PAYMENT_ENDPOINT, init).await
    }

    /// Initiates a subscription and returns the URL the payer must visit.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "ponchopay.client.initiate_subscription", skip_all, err)
    )]
    pub async fn initiate_subscription(
        &self,
        init: &InitiateSubscription,
    ) -> Result<String, Error> {
        self.initiate(INITIATE_SUBSCRIPTION_ENDPOINT, init).await
    }

    /// Changes the type or amount of a payment method.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "ponchopay.client.update_payment_method", skip(self, update), err)
    )]
    pub async fn update_payment_method(
        &self,
        payment_method_id: &str,
        update: &UpdatePaymentMethod,
    ) -> Result<(), Error> {
        self.manipulate(UPDATE_PAYMENT_METHOD_ENDPOINT, payment_method_id, update)
            .await
    }

    /// Refunds part or all of a payment method.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "ponchopay.client.refund_payment_method", skip(self, refund), err)
    )]
    pub async fn refund_payment_method(
        &self,
        payment_method_id: &str,
        refund: &RefundPaymentMethod,
    ) -> Result<(), Error> {
        self.manipulate(REFUND_PAYMENT_METHOD_ENDPOINT, payment_method_id, refund)
            .await
    }

    /// Cancels a payment.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "ponchopay.client.cancel_payment", skip(self, cancel), err)
    )]
    pub async fn cancel_payment(
        &self,
        payment_id: &str,
        cancel: &CancelPayment,
    ) -> Result<(), Error> {
        self.manipulate(CANCEL_PAYMENT_ENDPOINT, payment_id, cancel)
            .await
    }

    async fn initiate<T: Initiation>(&self, endpoint: &str, request: &T) -> Result<String, Error> {
        let tokenised = Tokenised {
            request,
            token: create_token(&self.key, request.metadata()),
        };
        let body = serialise(&tokenised).map_err(|e| Error::Serialisation {
            context: "Failed to serialise initiation request",
            source: e,
        })?;

        let response = self.api.post(endpoint, HeaderMap::new(), body).await?;
        let result = expect_redirect(&response);
        record_result_on_span(&result);
        result
    }

    async fn manipulate<T: Manipulation>(
        &self,
        template: &str,
        id: &str,
        request: &T,
    ) -> Result<(), Error> {
        let body = serialise(request).map_err(|e| Error::Serialisation {
            context: "Failed to serialise manipulation request",
            source: e,
        })?;
        let jwt = create_jwt(request.urn(), &self.key, request.email(), &body)?;
        let authorization =
            HeaderValue::from_str(&format!("Bearer {jwt}")).map_err(|e| Error::InvalidHeader {
                context: "Failed to encode authorization header",
                source: e,
            })?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let path = replace_params(template, &HashMap::from([("id", id)]));
        let response = self.api.put(&path, headers, body).await?;
        let result = expect_status(&response, StatusCode::NO_CONTENT);
        record_result_on_span(&result);
        result
    }
}

/// Interprets a response of the redirect protocol.
fn expect_redirect(response: &Response) -> Result<String, Error> {
    expect_status(response, StatusCode::FOUND)?;
    response
        .headers()
        .get(LOCATION)
        .and_then(|location| location.to_str().ok())
        .map(str::to_string)
        .ok_or(Error::MissingLocation)
}

fn expect_status(response: &Response, expected: StatusCode) -> Result<(), Error> {
    let actual = response.status();
    if actual == expected {
        Ok(())
    } else {
        Err(Error::UnexpectedStatus { expected, actual })
    }
}

/// Records the outcome of an operation on the current tracing span.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Request to PonchoPay failed");
        }
    }
}

/// Records the outcome of an operation on the current tracing span.
/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use ponchopay_types::config::{BASE_URL_ENV, ConfigError, KEY_ENV};
    use ponchopay_types::request::{
        Ending, OneTimePayment, PaymentConstraints, PaymentMethodType, Repetition, Weekday,
    };
    use ponchopay_types::token::verify_jwt;
    use ponchopay_types::util::Base64Bytes;
    use wiremock::matchers::{body_string, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URN: &str = "IUpGPArQ";
    const EMAIL: &str = "help@ponchopay.com";
    const KEY: &str = "6N28tFbrufnfCT58ZvmzIwaL8S1aVFryIasJazFqdc516T/1ZrLw7CDqOSlF5NeF";
    const LOCATION_URL: &str = "https://returned/location";
    const PAYMENT_TOKEN: &str = "ytfBNCiHCbU/WdEZ1yEB60DsMpgD7VgR0SSqgJhj0mY=";
    const SUBSCRIPTION_TOKEN: &str = "Axii0jwfzrkfh57WttOCi3qi+icnUC2dFKtre3b4pM4=";

    fn payment() -> InitiatePayment {
        InitiatePayment::new("order-1234", URN, 1234, EMAIL)
    }

    fn subscription() -> InitiateSubscription {
        InitiateSubscription::new(
            URN,
            1234,
            "subscription-1234",
            EMAIL,
            Repetition::weekly(2, [Weekday::Tuesday, Weekday::Friday]),
        )
    }

    fn with_token<T: Initiation>(request: &T, token: &str) -> String {
        serialise(&Tokenised {
            request,
            token: token.to_string(),
        })
        .unwrap()
    }

    async fn mock_post(server: &MockServer, endpoint: &str, body: String, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(header("content-type", "application/json"))
            .and(header_exists("x-telemetry"))
            .and(body_string(body))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mock_put(server: &MockServer, endpoint: &str, body: &str, status: u16) {
        Mock::given(method("PUT"))
            .and(path(endpoint))
            .and(header("content-type", "application/json"))
            .and(header_exists("authorization"))
            .and(body_string(body))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(server)
            .await;
    }

    fn redirect() -> ResponseTemplate {
        ResponseTemplate::new(302).insert_header("Location", LOCATION_URL)
    }

    /// Checks the bearer assertion of the single request received by `server`.
    async fn assert_signed(server: &MockServer, body: &str) {
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let authorization = requests[0]
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap();
        let jwt = authorization.strip_prefix("Bearer ").unwrap();
        assert!(jwt.starts_with("eyJhbGciOiJIUzI1NiJ9."));

        let claims = verify_jwt(jwt, KEY).unwrap();
        assert_eq!(claims.urn, URN);
        assert_eq!(claims.email, EMAIL);
        assert_eq!(claims.exp.as_secs() - claims.iat.as_secs(), 5);
        let digest = <sha2::Sha256 as sha2::Digest>::digest(body.as_bytes());
        assert_eq!(claims.sig, Base64Bytes::encode(digest).to_string());
    }

    #[test]
    fn production_host_is_the_default() {
        let client = Client::new(KEY).unwrap();
        assert_eq!(client.base_url(), "https://pay.ponchopay.com");
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        let client = Client::with_base(KEY, "https://some.base/url///").unwrap();
        assert_eq!(client.base_url(), "https://some.base/url");
    }

    #[test]
    fn debug_redacts_the_key() {
        let client = Client::new(KEY).unwrap();
        assert!(!format!("{client:?}").contains(KEY));
    }

    #[test]
    fn from_config_uses_the_configured_host() {
        let config = ClientConfig::new(KEY).with_base_url("https://demo.ponchopay.com/");
        let client = Client::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://demo.ponchopay.com");
    }

    #[tokio::test]
    async fn initiates_a_payment() {
        let server = MockServer::start().await;
        let init = payment();
        mock_post(&server, INITIATE_PAYMENT_ENDPOINT, with_token(&init, PAYMENT_TOKEN), redirect())
            .await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        assert_eq!(client.initiate_payment(&init).await.unwrap(), LOCATION_URL);
    }

    #[tokio::test]
    async fn initiates_a_payment_with_every_option() {
        let server = MockServer::start().await;
        let init = payment()
            .with_note("Here's your dough, now go have some fun-dough")
            .with_expiry("2025-04-03T12:57:16.000Z")
            .with_constraints(PaymentConstraints {
                minimum_card_amount: Some(123),
            });
        mock_post(&server, INITIATE_PAYMENT_ENDPOINT, with_token(&init, PAYMENT_TOKEN), redirect())
            .await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        assert_eq!(client.initiate_payment(&init).await.unwrap(), LOCATION_URL);
    }

    #[tokio::test]
    async fn payment_fails_without_a_redirect() {
        let server = MockServer::start().await;
        let init = payment();
        mock_post(
            &server,
            INITIATE_PAYMENT_ENDPOINT,
            with_token(&init, PAYMENT_TOKEN),
            ResponseTemplate::new(200).set_body_string("all good?"),
        )
        .await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let err = client.initiate_payment(&init).await.unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedStatus { expected, actual }
                if expected == StatusCode::FOUND && actual == StatusCode::OK
        ));
    }

    #[tokio::test]
    async fn payment_fails_without_a_location() {
        let server = MockServer::start().await;
        let init = payment();
        mock_post(
            &server,
            INITIATE_PAYMENT_ENDPOINT,
            with_token(&init, PAYMENT_TOKEN),
            ResponseTemplate::new(302),
        )
        .await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let err = client.initiate_payment(&init).await.unwrap_err();
        assert!(matches!(err, Error::MissingLocation));
    }

    #[tokio::test]
    async fn subscription_fails_without_a_location() {
        let server = MockServer::start().await;
        let init = subscription();
        mock_post(
            &server,
            INITIATE_SUBSCRIPTION_ENDPOINT,
            with_token(&init, SUBSCRIPTION_TOKEN),
            ResponseTemplate::new(302),
        )
        .await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let err = client.initiate_subscription(&init).await.unwrap_err();
        assert!(matches!(err, Error::MissingLocation));
    }

    #[tokio::test]
    async fn surplus_slashes_in_the_base_are_harmless() {
        let server = MockServer::start().await;
        let init = payment();
        mock_post(&server, INITIATE_PAYMENT_ENDPOINT, with_token(&init, PAYMENT_TOKEN), redirect())
            .await;

        let client = Client::with_base(KEY, &format!("{}///", server.uri())).unwrap();
        assert_eq!(client.initiate_payment(&init).await.unwrap(), LOCATION_URL);
    }

    #[tokio::test]
    async fn initiates_a_subscription() {
        let server = MockServer::start().await;
        let init = subscription();
        mock_post(
            &server,
            INITIATE_SUBSCRIPTION_ENDPOINT,
            with_token(&init, SUBSCRIPTION_TOKEN),
            redirect(),
        )
        .await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        assert_eq!(client.initiate_subscription(&init).await.unwrap(), LOCATION_URL);
    }

    #[tokio::test]
    async fn initiates_a_subscription_with_ending_and_top_up() {
        let server = MockServer::start().await;
        let init = subscription()
            .with_note("Here's your dough, now go have some fun-dough")
            .with_ending(Ending::Date {
                date: "2024-01-16T11:13:20.000Z".into(),
            })
            .with_additional_one_time_payment(OneTimePayment {
                amount: 678,
                metadata: "order-5678".to_string(),
                note: None,
            });
        let body = with_token(&init, SUBSCRIPTION_TOKEN);
        assert!(body.contains(r#""weekdays":["tuesday","friday"]"#));
        mock_post(&server, INITIATE_SUBSCRIPTION_ENDPOINT, body, redirect()).await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        assert_eq!(client.initiate_subscription(&init).await.unwrap(), LOCATION_URL);
    }

    #[tokio::test]
    async fn subscription_fails_without_a_redirect() {
        let server = MockServer::start().await;
        let init = subscription();
        mock_post(
            &server,
            INITIATE_SUBSCRIPTION_ENDPOINT,
            with_token(&init, SUBSCRIPTION_TOKEN),
            ResponseTemplate::new(200),
        )
        .await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let err = client.initiate_subscription(&init).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn updates_a_payment_method() {
        let server = MockServer::start().await;
        let body = r#"{"type":"card","amount":234}"#;
        mock_put(&server, "/api/payment-method/cb35f971", body, 204).await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let update = UpdatePaymentMethod::new(URN, EMAIL, PaymentMethodType::Card, 234);
        client.update_payment_method("cb35f971", &update).await.unwrap();

        assert_signed(&server, body).await;
    }

    #[tokio::test]
    async fn updates_a_payment_method_with_a_voucher_provider() {
        let server = MockServer::start().await;
        let body = r#"{"type":"childcare_vouchers","amount":234,"voucher_provider":"fun_for_kids"}"#;
        mock_put(&server, "/api/payment-method/cb35f971", body, 204).await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let update = UpdatePaymentMethod::new(URN, EMAIL, PaymentMethodType::ChildcareVouchers, 234)
            .with_voucher_provider("fun_for_kids");
        client.update_payment_method("cb35f971", &update).await.unwrap();

        assert_signed(&server, body).await;
    }

    #[tokio::test]
    async fn update_fails_on_an_unexpected_status() {
        let server = MockServer::start().await;
        mock_put(&server, "/api/payment-method/cb35f971", r#"{"type":"card","amount":234}"#, 200)
            .await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let update = UpdatePaymentMethod::new(URN, EMAIL, PaymentMethodType::Card, 234);
        let err = client
            .update_payment_method("cb35f971", &update)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedStatus { expected, actual }
                if expected == StatusCode::NO_CONTENT && actual == StatusCode::OK
        ));
    }

    #[tokio::test]
    async fn refunds_a_payment_method() {
        let server = MockServer::start().await;
        let body = r#"{"amount":234}"#;
        mock_put(&server, "/api/payment-method/cb35f971/refund", body, 204).await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let refund = RefundPaymentMethod::new(URN, EMAIL, 234);
        client.refund_payment_method("cb35f971", &refund).await.unwrap();

        assert_signed(&server, body).await;
    }

    #[tokio::test]
    async fn refund_fails_on_an_unexpected_status() {
        let server = MockServer::start().await;
        mock_put(&server, "/api/payment-method/cb35f971/refund", r#"{"amount":234}"#, 200).await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let refund = RefundPaymentMethod::new(URN, EMAIL, 234);
        let err = client
            .refund_payment_method("cb35f971", &refund)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn cancels_a_payment_with_an_empty_body() {
        let server = MockServer::start().await;
        mock_put(&server, "/api/payment/d34e567a/cancel", "", 204).await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let cancel = CancelPayment::new(URN, EMAIL);
        client.cancel_payment("d34e567a", &cancel).await.unwrap();

        assert_signed(&server, "").await;
    }

    #[tokio::test]
    async fn cancel_fails_on_an_unexpected_status() {
        let server = MockServer::start().await;
        mock_put(&server, "/api/payment/d34e567a/cancel", "", 200).await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let cancel = CancelPayment::new(URN, EMAIL);
        let err = client.cancel_payment("d34e567a", &cancel).await.unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedStatus { expected, actual }
                if expected == StatusCode::NO_CONTENT && actual == StatusCode::OK
        ));
    }

    #[tokio::test]
    async fn concurrent_calls_share_one_client() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(204))
            .expect(3)
            .mount(&server)
            .await;

        let client = Client::with_base(KEY, &server.uri()).unwrap();
        let cancel = CancelPayment::new(URN, EMAIL);
        let (a, b, c) = tokio::join!(
            client.cancel_payment("a", &cancel),
            client.cancel_payment("b", &cancel),
            client.cancel_payment("c", &cancel),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
    }

    #[tokio::test]
    async fn transport_failures_propagate() {
        let client = Client::with_base(KEY, "http://127.0.0.1:1").unwrap();
        let err = client
            .cancel_payment("d34e567a", &CancelPayment::new(URN, EMAIL))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http { .. }));
    }

    #[tokio::test]
    async fn client_from_env() {
        let server = MockServer::start().await;
        let init = payment();
        mock_post(&server, INITIATE_PAYMENT_ENDPOINT, with_token(&init, PAYMENT_TOKEN), redirect())
            .await;

        // SAFETY: no other test in this crate reads or writes these variables.
        unsafe {
            std::env::set_var(KEY_ENV, KEY);
            std::env::set_var(BASE_URL_ENV, format!("{}/", server.uri()));
        }
        let client = Client::from_env().unwrap();
        assert_eq!(client.base_url(), server.uri());
        assert_eq!(client.initiate_payment(&init).await.unwrap(), LOCATION_URL);

        unsafe {
            std::env::remove_var(KEY_ENV);
            std::env::remove_var(BASE_URL_ENV);
        }
        let err = Client::from_env().unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingEnv(KEY_ENV))));
    }
}
