//! Command-line configuration.
//!
//! Every gateway setting can come from a flag or from the environment, and a
//! `.env` file in the working directory is loaded before parsing.
//!
//! # Environment Variables
//!
//! - `PAYNOW_INTEGRATION_ID`: Integration id issued by Paynow
//! - `PAYNOW_INTEGRATION_KEY`: Integration key issued by Paynow
//! - `PAYNOW_RESULT_URL`: Result (status callback) URL
//! - `PAYNOW_RETURN_URL`: Return (browser) URL
//! - `PAYNOW_WEB_URL`: Override the web initiation endpoint
//! - `PAYNOW_MOBILE_URL`: Override the mobile initiation endpoint
//! - `RUST_LOG`: Log level filter (default: `info`)

use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use paynow::{Integration, MobileMethod, Payment};
use paynow_http::constants::{MOBILE_INITIATE_URL, WEB_INITIATE_URL};
use paynow_http::{ClientError, Endpoints, PaynowClient, PollConfig};
use rust_decimal::Decimal;

/// Initiate and poll Paynow payments.
#[derive(Debug, Parser)]
#[command(name = "paynow", version, about)]
pub struct Cli {
    /// Gateway credentials and endpoints.
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Gateway credentials and endpoints.
#[derive(Debug, Args)]
pub struct GatewayArgs {
    /// Integration id issued by Paynow.
    #[arg(long, env = "PAYNOW_INTEGRATION_ID")]
    pub integration_id: String,

    /// Integration key issued by Paynow.
    #[arg(long, env = "PAYNOW_INTEGRATION_KEY", hide_env_values = true)]
    pub integration_key: String,

    /// URL Paynow posts status updates to.
    #[arg(long, env = "PAYNOW_RESULT_URL")]
    pub result_url: String,

    /// URL the payer returns to after a web payment.
    #[arg(long, env = "PAYNOW_RETURN_URL")]
    pub return_url: String,

    /// Web initiation endpoint.
    #[arg(long, env = "PAYNOW_WEB_URL", default_value = WEB_INITIATE_URL)]
    pub web_url: String,

    /// Mobile initiation endpoint.
    #[arg(long, env = "PAYNOW_MOBILE_URL", default_value = MOBILE_INITIATE_URL)]
    pub mobile_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

impl GatewayArgs {
    /// Builds a client from the configured credentials and endpoints.
    pub fn client(&self) -> Result<PaynowClient, ClientError> {
        let integration = Integration::new(
            &self.integration_id,
            &self.integration_key,
            &self.result_url,
            &self.return_url,
        );
        Ok(PaynowClient::new(integration)?
            .with_endpoints(Endpoints::parse(&self.web_url, &self.mobile_url)?)
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initiate a web payment and print the browser URL.
    Web {
        /// The cart.
        #[command(flatten)]
        cart: CartArgs,
        /// Poll until the payment settles.
        #[command(flatten)]
        poll: PollArgs,
    },
    /// Initiate a mobile (express) payment to a wallet.
    Mobile {
        /// The cart.
        #[command(flatten)]
        cart: CartArgs,
        /// Wallet phone number.
        #[arg(long)]
        phone: String,
        /// Wallet method (`ecocash`, `onemoney`, `innbucks`, ...).
        #[arg(long, default_value = "ecocash")]
        method: MobileMethod,
        /// Poll until the payment settles.
        #[command(flatten)]
        poll: PollArgs,
    },
    /// Poll an existing transaction.
    Poll {
        /// The transaction's poll URL.
        poll_url: String,
        /// Polling schedule.
        #[command(flatten)]
        schedule: ScheduleArgs,
    },
}

/// Cart contents.
#[derive(Debug, Args)]
pub struct CartArgs {
    /// Merchant reference.
    #[arg(long)]
    pub reference: String,

    /// Payer email (required for mobile payments).
    #[arg(long, default_value = "")]
    pub email: String,

    /// Line item as `LABEL=AMOUNT`; repeat for more items.
    #[arg(long = "item", required = true)]
    pub items: Vec<ItemArg>,
}

impl CartArgs {
    /// Builds the payment from the given items.
    pub fn payment(&self, client: &PaynowClient) -> Payment {
        let mut payment = client.create_payment(&self.reference, &self.email);
        for item in &self.items {
            payment.add(&item.label, item.amount);
        }
        payment
    }
}

/// A `LABEL=AMOUNT` line item.
#[derive(Debug, Clone)]
pub struct ItemArg {
    /// Item label.
    pub label: String,
    /// Item amount.
    pub amount: Decimal,
}

impl FromStr for ItemArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (label, amount) = s
            .rsplit_once('=')
            .ok_or_else(|| format!("expected LABEL=AMOUNT, got {s:?}"))?;
        let amount = amount
            .trim()
            .parse()
            .map_err(|e| format!("invalid amount {amount:?}: {e}"))?;
        Ok(Self {
            label: label.trim().to_owned(),
            amount,
        })
    }
}

/// Optional polling after initiation.
#[derive(Debug, Args)]
pub struct PollArgs {
    /// Poll the transaction after initiating it.
    #[arg(long)]
    pub wait: bool,

    /// Polling schedule.
    #[command(flatten)]
    pub schedule: ScheduleArgs,
}

/// Polling schedule.
#[derive(Debug, Args)]
pub struct ScheduleArgs {
    /// Maximum number of status checks.
    #[arg(long, default_value_t = 20)]
    pub attempts: u32,

    /// Seconds between status checks.
    #[arg(long, default_value_t = 15)]
    pub interval_secs: u64,
}

impl ScheduleArgs {
    /// The poller configuration.
    pub const fn config(&self) -> PollConfig {
        PollConfig::new(self.attempts, Duration::from_secs(self.interval_secs))
    }
}
