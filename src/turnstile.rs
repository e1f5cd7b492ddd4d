//! Bot-challenge verification for public form submissions

use log::warn;
use reqwest::Client;
use serde::Deserialize;

use crate::error::Error;

/// Cloudflare Turnstile verification endpoint
pub const DEFAULT_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Client for the challenge-verification endpoint
pub struct TurnstileClient {
    verify_url: String,
    secret_key: String,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

impl TurnstileClient {
    /// Create a new TurnstileClient
    pub(crate) fn new(secret_key: &str, http_client: Client) -> Self {
        Self {
            verify_url: DEFAULT_VERIFY_URL.to_string(),
            secret_key: secret_key.to_string(),
            http_client,
        }
    }

    /// Override the verification endpoint
    pub(crate) fn with_verify_url(mut self, verify_url: &str) -> Self {
        self.verify_url = verify_url.to_string();
        self
    }

    /// Verify a challenge token produced by the public site
    ///
    /// A failed or unanswerable challenge maps to [`Error::Verification`];
    /// the specific rejection codes only reach the log.
    pub async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<(), Error> {
        let mut form = vec![
            ("secret", self.secret_key.as_str()),
            ("response", token),
        ];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = self
            .http_client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("challenge verification endpoint returned {}", status);
            return Err(Error::Verification);
        }

        let outcome: VerifyResponse = response.json().await?;
        if !outcome.success {
            warn!(
                "challenge verification failed: {}",
                outcome.error_codes.join(", ")
            );
            return Err(Error::Verification);
        }

        Ok(())
    }
}
