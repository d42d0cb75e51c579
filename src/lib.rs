#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Rust client for the [PonchoPay](https://ponchopay.com) integration API.
//!
//! # Overview
//!
//! The [`Client`] initiates payments and subscriptions, updates and refunds
//! payment methods, and cancels payments. Requests are signed with the
//! integration key assigned to your account:
//!
//! - initiation requests carry a `token` derived from their metadata;
//! - manipulation requests carry a five-second HS256 bearer assertion bound
//!   to the exact request body.
//!
//! # Modules
//!
//! - [`api`] - HTTP transport with redirects disabled
//! - [`client`] - The [`Client`] and its response protocols
//! - [`error`] - The [`Error`] type
//! - [`telemetry`] - Anonymous client descriptor sent with every request
//!
//! Request models, serialisation and signing live in [`ponchopay_types`] and
//! are re-exported as [`request`], [`config`] and [`token`].
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation of every operation

pub mod api;
pub mod client;
pub mod error;
pub mod telemetry;

pub use client::Client;
pub use error::Error;
pub use ponchopay_types::{config, request, serialise, timestamp, token};
