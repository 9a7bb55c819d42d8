//! A client for Paynow's initiation and status endpoints.
//!
//! [`PaynowClient`] signs payments with [`paynow::InitiateRequest`], posts them
//! as `multipart/form-data`, and verifies the reply with
//! [`paynow::response::decode`]. It also fetches status snapshots from poll
//! URLs and implements [`StatusSource`] so it can drive a [`Poller`].
//!
//! ## Error Handling
//!
//! Every step maps to its own [`ClientError`] variant:
//! - request construction
//! - HTTP transport failures
//! - response body reads
//! - payment-level errors (preconditions, tampering, gateway errors)
//!
//! Nothing is retried. The HTTP status code is not inspected; Paynow reports
//! failures in the body.

use std::sync::Arc;
use std::time::Duration;

use paynow::response::{self, INSUFFICIENT_FUNDS_BODY};
use paynow::{
    InitiateRequest, InitiatedTransaction, Integration, MobileMethod, Payment, PaymentError,
    StatusSnapshot,
};
use reqwest::Client;
use reqwest::multipart::Form;
use tokio_util::sync::CancellationToken;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::constants::{MOBILE_INITIATE_URL, WEB_INITIATE_URL};
use crate::error::ClientError;
use crate::poll::{BoxFuture, PollConfig, PollOutcome, Poller, StatusSource};

/// Initiation endpoints used by a [`PaynowClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Endpoint for web (browser redirect) payments.
    pub web: Url,
    /// Endpoint for mobile (express) payments.
    pub mobile: Url,
}

impl Endpoints {
    /// Returns Paynow's production endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UrlParse`] if a built-in URL fails to parse.
    pub fn production() -> Result<Self, ClientError> {
        Self::parse(WEB_INITIATE_URL, MOBILE_INITIATE_URL)
    }

    /// Parses a pair of endpoint URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UrlParse`] if either URL is invalid.
    pub fn parse(web: &str, mobile: &str) -> Result<Self, ClientError> {
        let web = Url::parse(web).map_err(|e| ClientError::UrlParse {
            context: "Failed to parse web initiation URL",
            source: e,
        })?;
        let mobile = Url::parse(mobile).map_err(|e| ClientError::UrlParse {
            context: "Failed to parse mobile initiation URL",
            source: e,
        })?;
        Ok(Self { web, mobile })
    }
}

/// A client for a single Paynow integration.
///
/// Cloning is cheap; clones share the integration and the underlying
/// connection pool. The client holds no mutable state and can serve any number
/// of concurrent payment flows.
#[derive(Clone, Debug)]
pub struct PaynowClient {
    /// Merchant credentials
    integration: Arc<Integration>,
    /// Initiation endpoints
    endpoints: Endpoints,
    /// Shared Reqwest HTTP client
    client: Client,
    /// Optional request timeout
    timeout: Option<Duration>,
}

impl PaynowClient {
    /// Creates a client for `integration` against Paynow's production endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UrlParse`] if endpoint construction fails.
    pub fn new(integration: Integration) -> Result<Self, ClientError> {
        Ok(Self {
            integration: Arc::new(integration),
            endpoints: Endpoints::production()?,
            client: Client::new(),
            timeout: None,
        })
    }

    /// Replaces the initiation endpoints, e.g. with a mock server.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Uses a preconfigured reqwest client.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Sets a timeout for all future requests.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the integration this client signs for.
    #[must_use]
    pub fn integration(&self) -> &Integration {
        &self.integration
    }

    /// Returns the configured initiation endpoints.
    #[must_use]
    pub const fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Returns the configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Starts a new empty payment.
    #[must_use]
    pub fn create_payment(
        &self,
        reference: impl Into<String>,
        auth_email: impl Into<String>,
    ) -> Payment {
        self.integration.create_payment(reference, auth_email)
    }

    /// Initiates a web payment.
    ///
    /// On success the returned transaction carries the browser URL to send the
    /// payer to and the poll URL for status checks.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the exchange fails, the reply fails
    /// verification, or Paynow declares an error.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paynow.client.send", skip_all, fields(reference = payment.reference()), err)
    )]
    pub async fn send(&self, payment: &Payment) -> Result<InitiatedTransaction, ClientError> {
        let request = InitiateRequest::web(&self.integration, payment);
        let body = self
            .post_form(&self.endpoints.web, "POST initiatetransaction", request)
            .await?;
        Ok(response::decode(&body, self.integration.key())?)
    }

    /// Initiates a mobile (express) payment to the wallet behind `phone`.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::MissingAuthEmail`] or
    /// [`PaymentError::NonPositiveTotal`] without contacting Paynow,
    /// [`PaymentError::InsufficientFunds`] if the wallet cannot be debited, and
    /// otherwise the same errors as [`PaynowClient::send`].
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "paynow.client.send_mobile",
            skip_all,
            fields(reference = payment.reference(), method = %method),
            err
        )
    )]
    pub async fn send_mobile(
        &self,
        payment: &Payment,
        phone: &str,
        method: &MobileMethod,
    ) -> Result<InitiatedTransaction, ClientError> {
        let request = InitiateRequest::mobile(&self.integration, payment, phone, method)?;
        let body = self
            .post_form(&self.endpoints.mobile, "POST remotetransaction", request)
            .await?;
        if body == INSUFFICIENT_FUNDS_BODY {
            return Err(PaymentError::InsufficientFunds.into());
        }
        Ok(response::decode(&body, self.integration.key())?)
    }

    /// Fetches the current status of a transaction from its poll URL.
    ///
    /// The request is not signed and the reply's hash is not checked; use
    /// [`StatusSnapshot::is_valid`] on the raw body if that is required.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the URL is invalid or the exchange fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "paynow.client.fetch_status", skip(self), err)
    )]
    pub async fn fetch_status(&self, poll_url: &str) -> Result<StatusSnapshot, ClientError> {
        let url = Url::parse(poll_url).map_err(|e| ClientError::UrlParse {
            context: "Failed to parse poll URL",
            source: e,
        })?;
        let context = "GET pollurl";
        let mut req = self.client.get(url);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let request = req
            .build()
            .map_err(|e| ClientError::RequestBuild { context, source: e })?;
        let body = self.execute(request, context).await?;
        Ok(StatusSnapshot::parse(&body))
    }

    /// Polls `poll_url` until the transaction is paid or cancelled, attempts
    /// run out, the deadline passes, or `cancel` fires.
    pub async fn poll(
        &self,
        poll_url: &str,
        config: PollConfig,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        Poller::new(self, config).poll(poll_url, cancel).await
    }

    /// Posts a signed request as `multipart/form-data` and returns the reply body.
    async fn post_form(
        &self,
        url: &Url,
        context: &'static str,
        request: InitiateRequest,
    ) -> Result<String, ClientError> {
        let form = request
            .into_fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));
        let mut req = self.client.post(url.clone()).multipart(form);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let request = req
            .build()
            .map_err(|e| ClientError::RequestBuild { context, source: e })?;
        self.execute(request, context).await
    }

    async fn execute(
        &self,
        request: reqwest::Request,
        context: &'static str,
    ) -> Result<String, ClientError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| ClientError::Http { context, source: e })?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(status = %response.status(), context, "Received Paynow response");

        response
            .text()
            .await
            .map_err(|e| ClientError::ResponseBodyRead { context, source: e })
    }
}

impl StatusSource for PaynowClient {
    fn fetch_status<'a>(
        &'a self,
        poll_url: &'a str,
    ) -> BoxFuture<'a, Result<StatusSnapshot, ClientError>> {
        Box::pin(Self::fetch_status(self, poll_url))
    }
}
