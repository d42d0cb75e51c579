//! Wire models for PonchoPay requests.
//!
//! Field declaration order is the key order on the wire. Optional fields are
//! omitted when unset.
//!
//! # Initiation requests
//!
//! [`InitiatePayment`] and [`InitiateSubscription`] are sent whole, with an
//! extra `token` field appended (see [`Tokenised`]).
//!
//! # Manipulation requests
//!
//! [`UpdatePaymentMethod`], [`RefundPaymentMethod`] and [`CancelPayment`]
//! carry the `urn` and `email` of the author. Those two fields are never part
//! of the body; they only go into the bearer assertion, exposed through the
//! [`Manipulation`] trait.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::timestamp::Timestamp;

/// Payment initiation request.
///
/// ```
/// use ponchopay_types::request::InitiatePayment;
/// use ponchopay_types::serialise;
///
/// let payment = InitiatePayment::new("order-1234", "IUpGPArQ", 1234, "help@ponchopay.com")
///     .with_note("Thanks!");
/// assert_eq!(
///     serialise(&payment).unwrap(),
///     r#"{"metadata":"order-1234","urn":"IUpGPArQ","amount":1234,"email":"help@ponchopay.com","note":"Thanks!"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitiatePayment {
    /// Caller-defined reference correlating the payment with the caller's records.
    pub metadata: String,
    /// Location reference.
    pub urn: String,
    /// Amount in minor currency units (pence).
    pub amount: u64,
    /// Payer contact.
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<PaymentConstraints>,
}

impl InitiatePayment {
    pub fn new(
        metadata: impl Into<String>,
        urn: impl Into<String>,
        amount: u64,
        email: impl Into<String>,
    ) -> Self {
        Self {
            metadata: metadata.into(),
            urn: urn.into(),
            amount,
            email: email.into(),
            note: None,
            expiry: None,
            constraints: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_expiry(mut self, expiry: impl Into<Timestamp>) -> Self {
        self.expiry = Some(expiry.into());
        self
    }

    pub fn with_constraints(mut self, constraints: PaymentConstraints) -> Self {
        self.constraints = Some(constraints);
        self
    }
}

/// Restrictions on how a payment may be settled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaymentConstraints {
    /// Smallest amount, in minor units, that may be paid by card.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_card_amount: Option<u64>,
}

/// Subscription initiation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitiateSubscription {
    pub urn: String,
    pub amount: u64,
    pub metadata: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub repetition: Repetition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ending: Option<Ending>,
    /// A one-off payment taken together with the first instalment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_one_time_payment: Option<OneTimePayment>,
}

impl InitiateSubscription {
    pub fn new(
        urn: impl Into<String>,
        amount: u64,
        metadata: impl Into<String>,
        email: impl Into<String>,
        repetition: Repetition,
    ) -> Self {
        Self {
            urn: urn.into(),
            amount,
            metadata: metadata.into(),
            email: email.into(),
            note: None,
            repetition,
            ending: None,
            additional_one_time_payment: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_ending(mut self, ending: Ending) -> Self {
        self.ending = Some(ending);
        self
    }

    pub fn with_additional_one_time_payment(mut self, payment: OneTimePayment) -> Self {
        self.additional_one_time_payment = Some(payment);
        self
    }
}

/// How often a subscription charges.
///
/// ```
/// use ponchopay_types::request::{Repetition, Weekday};
///
/// let repetition = Repetition::weekly(2, [Weekday::Friday, Weekday::Tuesday]);
/// assert_eq!(
///     serde_json::to_string(&repetition).unwrap(),
///     r#"{"granularity":"weekly","period":2,"weekdays":["tuesday","friday"]}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "granularity", rename_all = "lowercase")]
pub enum Repetition {
    Daily {
        period: u32,
    },
    Weekly {
        period: u32,
        weekdays: BTreeSet<Weekday>,
    },
    Monthly {
        period: u32,
        /// Day of the month, 1 to 31.
        day: u8,
    },
    Yearly {
        period: u32,
    },
}

impl Repetition {
    pub fn weekly(period: u32, weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        Repetition::Weekly {
            period,
            weekdays: weekdays.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// When a subscription stops charging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "condition", rename_all = "lowercase")]
pub enum Ending {
    Never,
    Occurrences { occurrences: u32 },
    Date { date: Timestamp },
}

/// A one-off payment attached to a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OneTimePayment {
    pub amount: u64,
    pub metadata: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Requests sent to initiation endpoints.
pub trait Initiation: Serialize {
    /// Metadata the initiation token is derived from.
    fn metadata(&self) -> &str;
}

impl Initiation for InitiatePayment {
    fn metadata(&self) -> &str {
        &self.metadata
    }
}

impl Initiation for InitiateSubscription {
    fn metadata(&self) -> &str {
        &self.metadata
    }
}

/// An initiation request with its token appended as the last field.
#[derive(Debug, Serialize)]
pub struct Tokenised<'a, T: Serialize> {
    #[serde(flatten)]
    pub request: &'a T,
    pub token: String,
}

/// Requests sent to manipulation endpoints.
///
/// Implementors must not serialise `urn` or `email`.
pub trait Manipulation: Serialize {
    fn urn(&self) -> &str;
    fn email(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    Card,
    ChildcareVouchers,
    TaxFreeChildcare,
}

/// Payment-method update request.
///
/// `voucher_provider` is only meaningful for [`PaymentMethodType::ChildcareVouchers`];
/// the API is trusted to reject inconsistent combinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePaymentMethod {
    #[serde(skip_serializing)]
    pub urn: String,
    #[serde(skip_serializing)]
    pub email: String,
    #[serde(rename = "type")]
    pub kind: PaymentMethodType,
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voucher_provider: Option<String>,
}

impl UpdatePaymentMethod {
    pub fn new(
        urn: impl Into<String>,
        email: impl Into<String>,
        kind: PaymentMethodType,
        amount: u64,
    ) -> Self {
        Self {
            urn: urn.into(),
            email: email.into(),
            kind,
            amount,
            voucher_provider: None,
        }
    }

    pub fn with_voucher_provider(mut self, provider: impl Into<String>) -> Self {
        self.voucher_provider = Some(provider.into());
        self
    }
}

/// Payment-method refund request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundPaymentMethod {
    #[serde(skip_serializing)]
    pub urn: String,
    #[serde(skip_serializing)]
    pub email: String,
    pub amount: u64,
}

impl RefundPaymentMethod {
    pub fn new(urn: impl Into<String>, email: impl Into<String>, amount: u64) -> Self {
        Self {
            urn: urn.into(),
            email: email.into(),
            amount,
        }
    }
}

/// Payment cancellation request. Its body is always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelPayment {
    #[serde(skip_serializing)]
    pub urn: String,
    #[serde(skip_serializing)]
    pub email: String,
}

impl CancelPayment {
    pub fn new(urn: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            urn: urn.into(),
            email: email.into(),
        }
    }
}

macro_rules! impl_manipulation {
    ($($ty:ty),*) => {
        $(
            impl Manipulation for $ty {
                fn urn(&self) -> &str {
                    &self.urn
                }

                fn email(&self) -> &str {
                    &self.email
                }
            }
        )*
    };
}

impl_manipulation!(UpdatePaymentMethod, RefundPaymentMethod, CancelPayment);
