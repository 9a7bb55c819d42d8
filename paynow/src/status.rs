//! Transaction statuses and poll snapshots.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::response::{FormReply, validate};

/// A transaction status as reported by Paynow.
///
/// Paynow reports statuses as free text. Known values map to dedicated
/// variants; anything else is preserved in [`TransactionStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransactionStatus {
    /// Initiation request accepted.
    Ok,
    /// Initiation request rejected.
    Error,
    /// Transaction created, payer has not yet acted.
    Created,
    /// Payment request sent to the payer's wallet.
    Sent,
    /// Payment completed.
    Paid,
    /// Paid, goods not yet delivered.
    AwaitingDelivery,
    /// Paid and delivered.
    Delivered,
    /// Cancelled by the payer or gateway.
    Cancelled,
    /// Payer opened a dispute.
    Disputed,
    /// Payment refunded.
    Refunded,
    /// Payment failed.
    Failed,
    /// Any status not listed above.
    Other(String),
}

impl TransactionStatus {
    /// The status text as sent by Paynow.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "Ok",
            Self::Error => "Error",
            Self::Created => "Created",
            Self::Sent => "Sent",
            Self::Paid => "Paid",
            Self::AwaitingDelivery => "Awaiting Delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Disputed => "Disputed",
            Self::Refunded => "Refunded",
            Self::Failed => "Failed",
            Self::Other(status) => status,
        }
    }

    /// Returns `true` for `Paid` and `Cancelled`, after which Paynow reports
    /// no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }
}

impl FromStr for TransactionStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Ok" => Self::Ok,
            "Error" => Self::Error,
            "Created" => Self::Created,
            "Sent" => Self::Sent,
            "Paid" => Self::Paid,
            "Awaiting Delivery" => Self::AwaitingDelivery,
            "Delivered" => Self::Delivered,
            "Cancelled" => Self::Cancelled,
            "Disputed" => Self::Disputed,
            "Refunded" => Self::Refunded,
            "Failed" => Self::Failed,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl From<&str> for TransactionStatus {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TransactionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// One reading of a transaction's status from its poll URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Merchant reference.
    pub reference: String,
    /// Reference assigned by Paynow.
    pub paynow_reference: String,
    /// Poll URL for further checks.
    pub poll_url: String,
    /// Current status.
    pub status: TransactionStatus,
    /// Transaction amount, when reported and numeric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    /// Hash carried by the status body.
    pub hash: String,
}

impl StatusSnapshot {
    /// Decodes a status body. Missing fields decode as empty.
    ///
    /// # Example
    ///
    /// ```rust
    /// use paynow::{StatusSnapshot, TransactionStatus};
    ///
    /// let snapshot = StatusSnapshot::parse("reference=INV-1&paynowreference=981&status=Paid&hash=AB");
    /// assert_eq!(snapshot.status, TransactionStatus::Paid);
    /// assert!(snapshot.status.is_terminal());
    /// ```
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let reply = FormReply::new(body);
        let field = |name: &str| reply.get(name).unwrap_or_default();
        Self {
            reference: field("reference"),
            paynow_reference: field("paynowreference"),
            poll_url: field("pollurl"),
            status: TransactionStatus::from(field("status").as_str()),
            amount: reply.get("amount").and_then(|amount| amount.parse().ok()),
            hash: field("hash"),
        }
    }

    /// Checks a raw status body's hash against the integration key.
    #[must_use]
    pub fn is_valid(body: &str, key: &str) -> bool {
        validate(body, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::generate_hash;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_round_trips_known_and_unknown_text() {
        for text in ["Paid", "Awaiting Delivery", "Cancelled", "Sent", "Pending"] {
            assert_eq!(TransactionStatus::from(text).as_str(), text);
        }
        assert_eq!(
            TransactionStatus::from("Pending"),
            TransactionStatus::Other("Pending".to_owned())
        );
    }

    #[test]
    fn test_only_paid_and_cancelled_are_terminal() {
        assert!(TransactionStatus::Paid.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
        assert!(!TransactionStatus::Sent.is_terminal());
        assert!(!TransactionStatus::Delivered.is_terminal());
        assert!(!TransactionStatus::from("paid").is_terminal());
    }

    #[test]
    fn test_parse_snapshot() {
        let snapshot = StatusSnapshot::parse(
            "reference=INV-1&paynowreference=78910&amount=6.00&status=Awaiting+Delivery&pollurl=https%3a%2f%2fwww.paynow.co.zw%2fInterface%2fCheckPayment%2f%3fguid%3dabc&hash=AB12",
        );
        assert_eq!(snapshot.reference, "INV-1");
        assert_eq!(snapshot.paynow_reference, "78910");
        assert_eq!(snapshot.amount, Some(dec!(6.00)));
        assert_eq!(snapshot.status, TransactionStatus::AwaitingDelivery);
        assert_eq!(
            snapshot.poll_url,
            "https://www.paynow.co.zw/Interface/CheckPayment/?guid=abc"
        );
        assert_eq!(snapshot.hash, "AB12");
    }

    #[test]
    fn test_parse_tolerates_missing_and_garbage_fields() {
        let snapshot = StatusSnapshot::parse("status=Sent&amount=lots&%zz");
        assert_eq!(snapshot.status, TransactionStatus::Sent);
        assert_eq!(snapshot.amount, None);
        assert_eq!(snapshot.reference, "");
    }

    #[test]
    fn test_is_valid_checks_status_hash() {
        let key = "key";
        let hash = generate_hash(["INV-1", "Paid"], key);
        let body = format!("reference=INV-1&status=Paid&hash={hash}");
        assert!(StatusSnapshot::is_valid(&body, key));
        assert!(!StatusSnapshot::is_valid(&body.replace("Paid", "Sent"), key));
    }

    #[test]
    fn test_status_serializes_as_gateway_text() {
        let json = serde_json::to_string(&TransactionStatus::AwaitingDelivery).unwrap();
        assert_eq!(json, "\"Awaiting Delivery\"");
    }
}
