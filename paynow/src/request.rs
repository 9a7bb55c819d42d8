//! Signed form fields for transaction initiation.
//!
//! Paynow accepts two initiation channels. A web payment returns a browser URL
//! the payer is redirected to; a mobile (express) payment pushes a prompt to the
//! payer's wallet directly. Both are plain `multipart/form-data` posts whose last
//! field is a hash over the preceding values and the integration key, but the
//! two channels differ in field set, escaping and validation:
//!
//! | Field            | Web             | Mobile          |
//! |------------------|-----------------|-----------------|
//! | `additionalinfo` | escaped         | escaped         |
//! | `authemail`      | escaped         | **not** escaped |
//! | `method`/`phone` | absent          | present         |
//! | preflight checks | none            | email, total    |
//!
//! The raw total is signed while the truncated total is sent as `amount`.
//! These asymmetries are what the gateway verifies against and must not be
//! normalised.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::cart::Payment;
use crate::error::PaymentError;
use crate::escape::query_escape;
use crate::hash::generate_hash;
use crate::integration::Integration;

/// Literal `status` value carried by every initiation request.
pub const STATUS_MESSAGE: &str = "Message";

/// Form field names, in the order they are sent.
pub mod fields {
    /// Result (server-to-server callback) URL.
    pub const RESULT_URL: &str = "resulturl";
    /// Return (browser) URL.
    pub const RETURN_URL: &str = "returnurl";
    /// Merchant reference.
    pub const REFERENCE: &str = "reference";
    /// Truncated transaction amount.
    pub const AMOUNT: &str = "amount";
    /// Integration id.
    pub const ID: &str = "id";
    /// Escaped item description.
    pub const ADDITIONAL_INFO: &str = "additionalinfo";
    /// Payer email.
    pub const AUTH_EMAIL: &str = "authemail";
    /// Mobile wallet method.
    pub const METHOD: &str = "method";
    /// Mobile wallet phone number.
    pub const PHONE: &str = "phone";
    /// Request status token.
    pub const STATUS: &str = "status";
    /// Request hash.
    pub const HASH: &str = "hash";
}

/// Mobile money wallet used for an express payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MobileMethod {
    /// Econet `EcoCash`.
    EcoCash,
    /// `NetOne` `OneMoney`.
    OneMoney,
    /// `InnBucks`, which answers with an authorization code instead of a prompt.
    InnBucks,
    /// Any other method identifier accepted by the gateway.
    Other(String),
}

impl MobileMethod {
    /// The identifier sent in the `method` field.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::EcoCash => "ecocash",
            Self::OneMoney => "onemoney",
            Self::InnBucks => "innbucks",
            Self::Other(method) => method,
        }
    }
}

impl fmt::Display for MobileMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MobileMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "ecocash" => Self::EcoCash,
            "onemoney" => Self::OneMoney,
            "innbucks" => Self::InnBucks,
            _ => Self::Other(s.to_owned()),
        })
    }
}

/// Renders an amount the way the gateway expects: fixed point, six decimals.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.6}", amount.round_dp(6))
}

/// Truncates an amount toward zero at the cent.
#[must_use]
pub fn truncate_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// An initiation request: ordered form fields ending in the request hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiateRequest {
    fields: Vec<(&'static str, String)>,
}

impl InitiateRequest {
    /// Builds a signed web initiation request.
    ///
    /// # Example
    ///
    /// ```rust
    /// use paynow::{InitiateRequest, Integration, Payment};
    /// use rust_decimal::Decimal;
    ///
    /// let integration = Integration::new("1201", "key", "http://result", "http://return");
    /// let mut payment = Payment::new("INV-1", "buyer@example.com");
    /// payment.add("Tea", Decimal::new(1099, 3));
    ///
    /// let request = InitiateRequest::web(&integration, &payment);
    /// assert_eq!(request.get("amount"), Some("1.090000"));
    /// assert_eq!(request.get("authemail"), Some("buyer%40example.com"));
    /// ```
    #[must_use]
    pub fn web(integration: &Integration, payment: &Payment) -> Self {
        let total = payment.total();
        let info = query_escape(&payment.describe_items());
        let email = query_escape(payment.auth_email());
        let hash = generate_hash(
            [
                integration.result_url(),
                integration.return_url(),
                payment.reference(),
                format_amount(total).as_str(),
                integration.id(),
                info.as_str(),
                email.as_str(),
                STATUS_MESSAGE,
            ],
            integration.key(),
        );

        let fields = vec![
            (fields::RESULT_URL, integration.result_url().to_owned()),
            (fields::RETURN_URL, integration.return_url().to_owned()),
            (fields::REFERENCE, payment.reference().to_owned()),
            (fields::AMOUNT, format_amount(truncate_to_cents(total))),
            (fields::ID, integration.id().to_owned()),
            (fields::ADDITIONAL_INFO, info),
            (fields::AUTH_EMAIL, email),
            (fields::STATUS, STATUS_MESSAGE.to_owned()),
            (fields::HASH, hash),
        ];
        Self { fields }
    }

    /// Builds a signed mobile (express) initiation request.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::MissingAuthEmail`] if the payment has no payer
    /// email, and [`PaymentError::NonPositiveTotal`] if its total truncated to
    /// cents is zero or negative.
    pub fn mobile(
        integration: &Integration,
        payment: &Payment,
        phone: &str,
        method: &MobileMethod,
    ) -> Result<Self, PaymentError> {
        if payment.auth_email().is_empty() {
            return Err(PaymentError::MissingAuthEmail);
        }
        let total = payment.total();
        let amount = truncate_to_cents(total);
        if amount <= Decimal::ZERO {
            return Err(PaymentError::NonPositiveTotal { total: amount });
        }

        let info = query_escape(&payment.describe_items());
        let hash = generate_hash(
            [
                integration.result_url(),
                integration.return_url(),
                payment.reference(),
                format_amount(total).as_str(),
                integration.id(),
                info.as_str(),
                payment.auth_email(),
                method.as_str(),
                phone,
                STATUS_MESSAGE,
            ],
            integration.key(),
        );

        let fields = vec![
            (fields::RESULT_URL, integration.result_url().to_owned()),
            (fields::RETURN_URL, integration.return_url().to_owned()),
            (fields::REFERENCE, payment.reference().to_owned()),
            (fields::AMOUNT, format_amount(amount)),
            (fields::ID, integration.id().to_owned()),
            (fields::ADDITIONAL_INFO, info),
            (fields::AUTH_EMAIL, payment.auth_email().to_owned()),
            (fields::METHOD, method.as_str().to_owned()),
            (fields::PHONE, phone.to_owned()),
            (fields::STATUS, STATUS_MESSAGE.to_owned()),
            (fields::HASH, hash),
        ];
        Ok(Self { fields })
    }

    /// The form fields in send order.
    #[must_use]
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    /// Returns the value of the named field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The request hash.
    #[must_use]
    pub fn hash(&self) -> &str {
        self.get(fields::HASH).unwrap_or_default()
    }

    /// Consumes the request, returning its fields.
    #[must_use]
    pub fn into_fields(self) -> Vec<(&'static str, String)> {
        self.fields
    }
}
