#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the PonchoPay integration API.
//!
//! This crate provides the transport-agnostic half of the PonchoPay client:
//! request models, the canonical JSON serialisation the server verifies
//! signatures against, and the two signing schemes used by the API.
//!
//! # Overview
//!
//! PonchoPay exposes two families of endpoints:
//!
//! - **Initiation** endpoints (payments and subscriptions) answer with a
//!   `302 Found` pointing at the hosted payment page. Their bodies carry a
//!   `token` derived from the request metadata and the integration key.
//! - **Manipulation** endpoints (payment-method update and refund, payment
//!   cancellation) answer with `204 No Content`. They are authorised by a
//!   short-lived HS256 bearer assertion whose `sig` claim covers the body.
//!
//! # Modules
//!
//! - [`config`] - Client configuration with environment variable resolution
//! - [`request`] - Wire models for every request the API accepts
//! - [`serialise`] - Canonical JSON encoding and path helpers
//! - [`timestamp`] - Date values and Unix timestamps used on the wire
//! - [`token`] - Initiation tokens and manipulation assertions
//! - [`util`] - Helper types (base64)

pub mod config;
pub mod request;
pub mod serialise;
pub mod timestamp;
pub mod token;
pub mod util;

pub use serialise::{join_paths, replace_params, serialise};
