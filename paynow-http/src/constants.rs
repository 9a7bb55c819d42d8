//! Paynow endpoints and client defaults.

use std::time::Duration;

/// Web (browser redirect) initiation endpoint.
pub const WEB_INITIATE_URL: &str = "https://www.paynow.co.zw/interface/initiatetransaction";

/// Mobile (express checkout) initiation endpoint.
pub const MOBILE_INITIATE_URL: &str = "https://www.paynow.co.zw/interface/remotetransaction";

/// Default spacing between poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Default number of poll attempts.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 20;

/// Slack added to `attempts × interval` to form the overall poll deadline.
pub const DEFAULT_POLL_GRACE: Duration = Duration::from_secs(10);
