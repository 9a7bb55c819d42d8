//! Command-line demo for the Paynow SDK.
//!
//! # Usage
//!
//! ```bash
//! # Web payment, printing the browser URL
//! paynow web --reference INV-1 --email buyer@example.com --item "Bananas=2.50"
//!
//! # EcoCash express payment, then wait for it to settle
//! paynow mobile --reference INV-2 --email buyer@example.com \
//!     --item "Tea=1.50" --phone 0771111111 --method ecocash --wait
//!
//! # Poll an existing transaction
//! paynow poll "https://www.paynow.co.zw/Interface/CheckPayment/?guid=..."
//! ```
//!
//! Credentials come from flags, the environment, or a `.env` file; see
//! [`config`] for the variable names. Results are printed as JSON.

mod config;

use clap::Parser;
use paynow::InitiatedTransaction;
use paynow::links::{deep_link, qr_code_url};
use paynow_http::{PaynowClient, PollConfig, PollOutcome};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Command, PollArgs};

#[tokio::main]
async fn main() {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("paynow failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let client = cli.gateway.client()?;
    let cancel = shutdown_token();

    match cli.command {
        Command::Web { cart, poll } => {
            let payment = cart.payment(&client);
            tracing::info!(
                reference = payment.reference(),
                total = %payment.total(),
                "Initiating web payment"
            );
            let transaction = client.send(&payment).await?;
            follow(&client, transaction, &poll, &cancel).await
        }
        Command::Mobile {
            cart,
            phone,
            method,
            poll,
        } => {
            let payment = cart.payment(&client);
            tracing::info!(
                reference = payment.reference(),
                total = %payment.total(),
                %method,
                "Initiating mobile payment"
            );
            let transaction = client.send_mobile(&payment, &phone, &method).await?;
            follow(&client, transaction, &poll, &cancel).await
        }
        Command::Poll { poll_url, schedule } => {
            let outcome = client.poll(&poll_url, schedule.config(), &cancel).await;
            print_json(&PollReport::from(&outcome))?;
            finish(&outcome)
        }
    }
}

/// Prints the initiated transaction and optionally polls it.
async fn follow(
    client: &PaynowClient,
    transaction: InitiatedTransaction,
    poll: &PollArgs,
    cancel: &CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let links = transaction
        .authorization
        .as_ref()
        .map(|authorization| WalletLinks {
            qr_code_url: qr_code_url(&authorization.code),
            deep_link: deep_link(&authorization.code),
        });
    print_json(&InitiateReport {
        transaction: &transaction,
        links,
    })?;

    if !poll.wait {
        return Ok(());
    }
    let Some(poll_url) = transaction.poll_url.as_deref() else {
        tracing::warn!("Paynow returned no poll URL; nothing to wait for");
        return Ok(());
    };
    let config: PollConfig = poll.schedule.config();
    tracing::info!(
        attempts = config.max_attempts,
        interval_secs = config.interval.as_secs(),
        "Polling payment status"
    );
    let outcome = client.poll(poll_url, config, cancel).await;
    print_json(&PollReport::from(&outcome))?;
    finish(&outcome)
}

fn finish(outcome: &PollOutcome) -> Result<(), Box<dyn std::error::Error>> {
    if outcome.is_completed() {
        Ok(())
    } else {
        Err(outcome.message().into())
    }
}

/// Cancels the returned token on Ctrl+C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping");
            trigger.cancel();
        }
    });
    token
}

#[derive(Serialize)]
struct WalletLinks {
    qr_code_url: String,
    deep_link: String,
}

#[derive(Serialize)]
struct InitiateReport<'a> {
    #[serde(flatten)]
    transaction: &'a InitiatedTransaction,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<WalletLinks>,
}

#[derive(Serialize)]
struct PollReport<'a> {
    completed: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<&'a paynow::StatusSnapshot>,
}

impl<'a> From<&'a PollOutcome> for PollReport<'a> {
    fn from(outcome: &'a PollOutcome) -> Self {
        Self {
            completed: outcome.is_completed(),
            message: outcome.message(),
            snapshot: outcome.snapshot(),
        }
    }
}

#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
