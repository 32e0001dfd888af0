//! Transactional mail seam
//!
//! [`HttpMailer`] posts JSON to a transactional-email API. [`LogMailer`] only
//! logs, for dry runs and local setups without an API key. Failures are
//! reported to the caller and never retried here.

use crate::error::MailError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sender settings shared by every outgoing email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSettings {
    /// `From` address
    pub from: String,
    /// Optional `Reply-To` address
    pub reply_to: Option<String>,
    /// Client portal link included in emails
    pub portal_url: Option<String>,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            from: "Studio <updates@studio.example>".to_string(),
            reply_to: None,
            portal_url: None,
        }
    }
}

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Reply-to address, omitted from the request when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
    /// Plain-text body
    pub text: String,
}

/// Delivery acknowledgement
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeliveryReceipt {
    /// Provider message id, when the provider returns one
    #[serde(default)]
    pub id: Option<String>,
}

/// Delivers rendered emails
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one email
    async fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, MailError>;
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

/// Mailer for a JSON transactional-email API with bearer authentication
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpMailer {
    /// Create mailer for `endpoint`
    ///
    /// # Errors
    /// `MailError::Config` when the endpoint or the key is empty.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self, MailError> {
        let endpoint = endpoint.into();
        let api_key = api_key.into();
        if endpoint.trim().is_empty() {
            return Err(MailError::Config("mail api endpoint is empty".to_string()));
        }
        if api_key.trim().is_empty() {
            return Err(MailError::Config("mail api key is empty".to_string()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        })
    }

    /// With a preconfigured HTTP client
    #[inline]
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, MailError> {
        let body = ApiMessage {
            from: &email.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
            reply_to: email.reply_to.as_deref(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), to = %email.to, "mail api rejected message");
            return Err(MailError::rejected(status.as_u16(), text));
        }

        let receipt: DeliveryReceipt = serde_json::from_str(&text).unwrap_or_default();
        tracing::info!(to = %email.to, id = ?receipt.id, "email delivered");
        Ok(receipt)
    }
}

/// Mailer that logs instead of sending
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, MailError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            bytes = email.html.len(),
            "dry run: email not sent"
        );
        tracing::debug!(text = %email.text, "dry run body");
        Ok(DeliveryReceipt::default())
    }
}
