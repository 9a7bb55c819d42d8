//! Error types for Paynow payments.

use rust_decimal::Decimal;

/// Errors raised while preparing a payment or interpreting Paynow's reply.
///
/// Transport failures live in `paynow-http`; everything here can be
/// produced without a network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    /// Mobile payments need the payer's email address.
    #[error("auth email is required for mobile transactions")]
    MissingAuthEmail,

    /// Mobile payments need a positive total after truncation to cents.
    #[error("transaction total must be greater than zero, got {total}")]
    NonPositiveTotal {
        /// The truncated total that was rejected.
        total: Decimal,
    },

    /// The reply's hash did not match its contents.
    #[error("the response is invalid or has been tampered with")]
    Tampered,

    /// Paynow declared an error in its reply.
    #[error("gateway error ({status}): {message}")]
    Gateway {
        /// The reply's `status` field.
        status: String,
        /// The reply's `error` field, verbatim.
        message: String,
    },

    /// Paynow could not debit the payer's wallet.
    #[error("insufficient funds")]
    InsufficientFunds,
}

impl PaymentError {
    /// Returns `true` if the error was detected before contacting Paynow.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingAuthEmail | Self::NonPositiveTotal { .. })
    }
}
