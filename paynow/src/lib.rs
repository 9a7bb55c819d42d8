#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the Paynow payment gateway.
//!
//! This crate contains everything needed to talk to Paynow except the network:
//! request assembly and signing, response verification and decoding, and the
//! types shared by the transport layer in `paynow-http`.
//!
//! # Overview
//!
//! A merchant integration is identified by an integration id and secured by an
//! integration key. Every request sent to Paynow carries a SHA-512 hash of its
//! field values followed by the key, and every reply carries a hash computed the
//! same way over the reply's values. The key itself never leaves the client.
//!
//! # Modules
//!
//! - [`cart`] - The payment (cart) model and its line items
//! - [`error`] - Payment-level error types
//! - [`escape`] - Query-component escaping compatible with the gateway
//! - [`hash`] - The keyed SHA-512 digest used for signing and verification
//! - [`integration`] - Merchant credentials and callback URLs
//! - [`links`] - QR code and wallet deep-link URLs for authorization codes
//! - [`request`] - Signed form fields for web and mobile initiation
//! - [`response`] - Initiation reply validation and parsing
//! - [`status`] - Transaction statuses and poll snapshots
//!
//! # Feature Flags
//!
//! - `telemetry` - Emits tracing events when replies fail verification

pub mod cart;
pub mod error;
pub mod escape;
pub mod hash;
pub mod integration;
pub mod links;
pub mod request;
pub mod response;
pub mod status;

pub use cart::{LineItem, Payment};
pub use error::PaymentError;
pub use integration::Integration;
pub use request::{InitiateRequest, MobileMethod};
pub use response::{Authorization, InitiatedTransaction};
pub use status::{StatusSnapshot, TransactionStatus};
