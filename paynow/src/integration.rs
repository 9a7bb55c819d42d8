//! Merchant credentials and callback URLs.

use std::fmt;

use crate::cart::Payment;

/// A Paynow merchant integration.
///
/// Holds the integration id and key issued by Paynow together with the two
/// callback URLs sent with every transaction: the result URL Paynow posts
/// status updates to, and the return URL the payer's browser is sent back to.
///
/// The key is only ever used as hash input. It is not part of any request and
/// is redacted from the [`Debug`] output.
///
/// # Example
///
/// ```rust
/// use paynow::Integration;
///
/// let integration = Integration::new(
///     "1201",
///     "3e9fed89-60e1-4ce5-ab6e-6b1eb2d4f977",
///     "https://merchant.example/paynow/result",
///     "https://merchant.example/checkout/done",
/// );
/// assert!(!format!("{integration:?}").contains("3e9fed89"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Integration {
    id: String,
    key: String,
    result_url: String,
    return_url: String,
}

impl Integration {
    /// Creates an integration from the credentials issued by Paynow.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        result_url: impl Into<String>,
        return_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            result_url: result_url.into(),
            return_url: return_url.into(),
        }
    }

    /// Starts a new empty payment for this integration.
    #[must_use]
    pub fn create_payment(
        &self,
        reference: impl Into<String>,
        auth_email: impl Into<String>,
    ) -> Payment {
        Payment::new(reference, auth_email)
    }

    /// The integration id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The integration key used to sign requests and verify replies.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// URL Paynow posts transaction results to.
    #[must_use]
    pub fn result_url(&self) -> &str {
        &self.result_url
    }

    /// URL the payer is returned to after a web payment.
    #[must_use]
    pub fn return_url(&self) -> &str {
        &self.return_url
    }
}

impl fmt::Debug for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Integration")
            .field("id", &self.id)
            .field("key", &"<redacted>")
            .field("result_url", &self.result_url)
            .field("return_url", &self.return_url)
            .finish()
    }
}
