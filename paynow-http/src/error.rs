//! Error types for the HTTP transport layer.

use paynow::PaymentError;

/// Errors that can occur while talking to Paynow.
///
/// Transport variants carry a human-readable `context` naming the step that
/// failed. No variant is retried by the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The payment was rejected locally or by the gateway.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The request could not be constructed.
    #[error("Failed to build request: {context}: {source}")]
    RequestBuild {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// Failed to read response body.
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Returns the payment-level error, if this is one.
    #[must_use]
    pub const fn as_payment(&self) -> Option<&PaymentError> {
        match self {
            Self::Payment(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` for failures of the network exchange itself.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::RequestBuild { .. } | Self::Http { .. } | Self::ResponseBodyRead { .. }
        )
    }
}
