//! Outbound mail for the contact form

use chrono::Utc;
use log::warn;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;

use crate::config::MailSettings;
use crate::contact::ContactSubmission;
use crate::error::Error;

/// Client for the external mail service
///
/// The mail service is a plain HTTP collaborator: one POST with a JSON
/// body per quote request, bearer-authenticated. An optional spreadsheet
/// webhook receives a copy of each submission on a best-effort basis.
pub struct MailerClient {
    endpoint: String,
    api_key: String,
    recipient: String,
    sheet_webhook_url: Option<String>,
    http_client: Client,
}

/// Wire format of an outbound quote-request mail
#[derive(Debug, Serialize)]
struct QuoteRequestMail<'a> {
    to: &'a str,
    reply_to: &'a str,
    subject: String,
    text: String,
}

impl MailerClient {
    /// Create a new MailerClient
    pub(crate) fn new(settings: &MailSettings, http_client: Client) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            api_key: settings.api_key.clone(),
            recipient: settings.recipient.clone(),
            sheet_webhook_url: settings.sheet_webhook_url.clone(),
            http_client,
        }
    }

    /// Deliver a quote request to the studio inbox
    pub async fn send_quote_request(&self, submission: &ContactSubmission) -> Result<(), Error> {
        let name = submission.name.trim();
        let email = submission.email.trim();
        let mail = QuoteRequestMail {
            to: &self.recipient,
            reply_to: email,
            subject: format!("New quote request from {}", name),
            text: format!(
                "Name: {}\nEmail: {}\n\n{}",
                name,
                email,
                submission.message.trim()
            ),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&mail)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(Error::Mail(format!(
                "mail service returned {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }

    /// Forward a copy of the submission to the spreadsheet webhook
    ///
    /// Best-effort: failures are logged and never surface to the caller,
    /// the same asymmetry the snapshot publisher has.
    pub async fn forward_to_sheet(&self, submission: &ContactSubmission) {
        let Some(webhook_url) = &self.sheet_webhook_url else {
            return;
        };

        let payload = json!({
            "name": submission.name.trim(),
            "email": submission.email.trim(),
            "message": submission.message.trim(),
            "submittedAt": Utc::now().to_rfc3339(),
        });

        match self.http_client.post(webhook_url).json(&payload).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!("sheet webhook returned {}", response.status());
            }
            Ok(_) => {}
            Err(err) => warn!("sheet webhook failed: {}", err),
        }
    }
}
