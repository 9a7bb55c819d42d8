//! Validation and parsing of initiation replies.
//!
//! Paynow answers an initiation request with an `application/x-www-form-urlencoded`
//! body such as:
//!
//! ```text
//! status=Ok&browserurl=https%3a%2f%2fwww.paynow.co.zw%2f...&pollurl=https%3a%2f%2f...&hash=7F0C...
//! ```
//!
//! The `hash` pair is the SHA-512 of every other value (unescaped, in order)
//! followed by the integration key. [`validate`] checks it on the raw body before
//! anything is decoded; [`parse`] then decodes the fields tolerantly.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::PaymentError;
use crate::escape::query_unescape_bytes;
use crate::hash::generate_hash;

/// Reply body the mobile endpoint sends when the wallet could not be debited.
pub const INSUFFICIENT_FUNDS_BODY: &str =
    "status=Error&error=Failed+to+initiate+transaction%2c+please+try+later";

/// Authorization code returned for wallets that complete payment in their
/// own app (for example `InnBucks`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Code the payer enters or scans in the wallet app.
    pub code: String,
    /// Expiry as reported by the gateway.
    pub expires: String,
}

/// A successfully initiated transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiatedTransaction {
    /// Reply status (normally `Ok`).
    pub status: String,
    /// Where to send the payer's browser (web payments).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_url: Option<String>,
    /// Where to poll for the transaction's status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_url: Option<String>,
    /// Hash carried by the reply.
    pub hash: String,
    /// Wallet authorization, when the method uses one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<Authorization>,
}

/// Checks that `body`'s `hash` pair matches its other values signed with `key`.
///
/// Every `&`-separated part must contain exactly one `=`, and every non-hash
/// value must be a well-formed query component; anything else fails the check.
/// Values are hashed as decoded bytes, which need not be UTF-8.
/// The comparison is case-sensitive.
///
/// # Example
///
/// ```rust
/// use paynow::hash::generate_hash;
/// use paynow::response::validate;
///
/// let hash = generate_hash(["Ok", "http://x"], "key");
/// let body = format!("status=Ok&pollurl=http%3A%2F%2Fx&hash={hash}");
/// assert!(validate(&body, "key"));
/// assert!(!validate(&body, "other-key"));
/// ```
#[must_use]
pub fn validate(body: &str, key: &str) -> bool {
    let mut values = Vec::new();
    let mut expected = None;

    for part in body.split('&') {
        let mut pieces = part.split('=');
        let (Some(name), Some(value), None) = (pieces.next(), pieces.next(), pieces.next()) else {
            #[cfg(feature = "telemetry")]
            tracing::warn!(pair = part, "Invalid key-value pair in Paynow response");
            return false;
        };

        if name == "hash" {
            expected = Some(value);
            continue;
        }

        match query_unescape_bytes(value) {
            Ok(decoded) => values.push(decoded),
            #[cfg_attr(not(feature = "telemetry"), allow(unused_variables))]
            Err(err) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(field = name, error = %err, "Undecodable value in Paynow response");
                return false;
            }
        }
    }

    expected.is_some_and(|hash| generate_hash(&values, key) == hash)
}

/// Decodes an initiation reply.
///
/// # Errors
///
/// Returns [`PaymentError::Gateway`] if the reply carries a non-empty `error`
/// field. The reply's other fields are ignored in that case.
pub fn parse(body: &str) -> Result<InitiatedTransaction, PaymentError> {
    let reply = FormReply::new(body);
    let status = reply.get("status").unwrap_or_default();

    if let Some(message) = reply.non_empty("error") {
        return Err(PaymentError::Gateway {
            status,
            message,
        });
    }

    let authorization = reply.non_empty("authorizationcode").map(|code| Authorization {
        code,
        expires: reply.get("authorizationexpires").unwrap_or_default(),
    });

    Ok(InitiatedTransaction {
        status,
        browser_url: reply.non_empty("browserurl"),
        poll_url: reply.non_empty("pollurl"),
        hash: reply.get("hash").unwrap_or_default(),
        authorization,
    })
}

/// Validates and then parses an initiation reply.
///
/// A reply that fails validation is reported as [`PaymentError::Tampered`]
/// without exposing any of its fields, with one exception: Paynow does not sign
/// its error replies, so a reply that declares an `error` and carries no `hash`
/// at all is surfaced as [`PaymentError::Gateway`].
///
/// # Errors
///
/// Returns [`PaymentError::Tampered`] for unverifiable replies and
/// [`PaymentError::Gateway`] for gateway-declared errors.
pub fn decode(body: &str, key: &str) -> Result<InitiatedTransaction, PaymentError> {
    if validate(body, key) {
        return parse(body);
    }

    let reply = FormReply::new(body);
    if reply.get("hash").is_none() && reply.non_empty("error").is_some() {
        return parse(body);
    }

    #[cfg(feature = "telemetry")]
    tracing::warn!("Paynow response failed hash verification");
    Err(PaymentError::Tampered)
}

/// Tolerantly decoded form body. The first occurrence of a key wins.
#[derive(Debug)]
pub(crate) struct FormReply {
    pairs: Vec<(String, String)>,
}

impl FormReply {
    pub(crate) fn new(body: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(body.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<String> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    pub(crate) fn non_empty(&self, name: &str) -> Option<String> {
        self.get(name).filter(|value| !value.is_empty())
    }
}
