//! Client-side URLs derived from a wallet authorization code.
//!
//! Some wallets (`InnBucks`) do not push a prompt to the payer. Paynow instead
//! returns an authorization code that the payer completes in the wallet app,
//! either by scanning a QR code or by following a deep link. Both URLs are pure
//! formatting; the code's shape is not checked.

use crate::escape::query_escape;

/// Base of the QR code image URL.
pub const QR_CODE_BASE_URL: &str = "https://chart.googleapis.com/chart?chs=150x150&cht=qr&chl=";

/// Base of the `InnBucks` app deep link.
pub const INNBUCKS_DEEP_LINK_BASE: &str = "schinn.wbpycode://innbucks.co.zw?pymInnCode=";

/// Returns the URL of a QR code image encoding `authorization_code`.
#[must_use]
pub fn qr_code_url(authorization_code: &str) -> String {
    format!("{QR_CODE_BASE_URL}{}", query_escape(authorization_code))
}

/// Returns the `InnBucks` app deep link for `authorization_code`.
#[must_use]
pub fn deep_link(authorization_code: &str) -> String {
    format!("{INNBUCKS_DEEP_LINK_BASE}{}", query_escape(authorization_code))
}
