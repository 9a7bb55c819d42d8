#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport for the Paynow payment gateway.
//!
//! Provides [`PaynowClient`], which posts signed initiation requests to Paynow
//! and fetches transaction status, and [`Poller`], which polls a transaction
//! until it reaches a terminal status.
//!
//! # Example
//!
//! ```rust,no_run
//! use paynow::Integration;
//! use paynow_http::{PaynowClient, PollConfig};
//! use rust_decimal::Decimal;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), paynow_http::ClientError> {
//! let client = PaynowClient::new(Integration::new(
//!     "1201",
//!     "3e9fed89-60e1-4ce5-ab6e-6b1eb2d4f977",
//!     "https://merchant.example/paynow/result",
//!     "https://merchant.example/checkout/done",
//! ))?;
//!
//! let mut payment = client.create_payment("INV-1001", "buyer@example.com");
//! payment.add("Bananas", Decimal::new(250, 2));
//!
//! let transaction = client.send(&payment).await?;
//! if let Some(poll_url) = transaction.poll_url {
//!     let outcome = client
//!         .poll(&poll_url, PollConfig::default(), &CancellationToken::new())
//!         .await;
//!     let (completed, message) = outcome.into_parts();
//!     assert!(completed, "{message}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`client`]: Initiation and status requests
//! - [`constants`]: Gateway endpoints and defaults
//! - [`error`]: Transport error types
//! - [`poll`]: Status poller
//!
//! # Feature Flags
//!
//! - `telemetry`: Enables tracing instrumentation

pub mod client;
pub mod constants;
pub mod error;
pub mod poll;

pub use client::{Endpoints, PaynowClient};
pub use error::ClientError;
pub use poll::{PollConfig, PollOutcome, Poller, StatusSource};
