//! The payment (cart) sent to Paynow.
//!
//! A [`Payment`] is an ordered list of labelled amounts with a merchant
//! reference and the payer's email address. The cart only accumulates items;
//! amount checks happen when a request is built from it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single labelled amount in a [`Payment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Human-readable item title.
    pub label: String,
    /// Item amount in the merchant's currency.
    pub amount: Decimal,
}

/// A transaction to be initiated with Paynow.
///
/// # Example
///
/// ```rust
/// use paynow::Payment;
/// use rust_decimal::Decimal;
///
/// let mut payment = Payment::new("INV-1001", "buyer@example.com");
/// payment
///     .add("Bananas", Decimal::new(250, 2))
///     .add("Apples", Decimal::new(310, 2));
///
/// assert_eq!(payment.total(), Decimal::new(560, 2));
/// assert_eq!(payment.describe_items(), "Bananas, Apples");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    reference: String,
    items: Vec<LineItem>,
    auth_email: String,
}

impl Payment {
    /// Creates an empty payment with a merchant `reference` and the payer's
    /// `auth_email` (may be empty for web payments).
    #[must_use]
    pub fn new(reference: impl Into<String>, auth_email: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            items: Vec::new(),
            auth_email: auth_email.into(),
        }
    }

    /// Appends an item to the cart.
    pub fn add(&mut self, label: impl Into<String>, amount: Decimal) -> &mut Self {
        self.items.push(LineItem {
            label: label.into(),
            amount,
        });
        self
    }

    /// Returns the sum of all item amounts, without rounding.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(|item| item.amount).sum()
    }

    /// Returns the item labels joined by `", "` in insertion order.
    #[must_use]
    pub fn describe_items(&self) -> String {
        self.items
            .iter()
            .map(|item| item.label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The merchant's transaction reference.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// The payer's email address.
    #[must_use]
    pub fn auth_email(&self) -> &str {
        &self.auth_email
    }

    /// The items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns `true` if no items have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
