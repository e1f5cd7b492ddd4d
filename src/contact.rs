//! Contact intake for the public quote form
//!
//! The flow is validate, verify the bot challenge, deliver the mail,
//! then copy the submission to the spreadsheet webhook. Validation and
//! challenge failures carry user-facing messages; only the mail step is
//! reported as retryable.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::mailer::MailerClient;
use crate::turnstile::TurnstileClient;

/// One submission from the public quote form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
    pub turnstile_token: String,
}

impl ContactSubmission {
    /// Server-side validation; the first failure is the user-facing message
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().chars().count() < 2 {
            return Err(Error::validation("Please tell us your name"));
        }
        if !marquee_content::schema::is_plausible_email(self.email.trim()) {
            return Err(Error::validation("Please enter a valid email address"));
        }
        if self.message.trim().chars().count() < 10 {
            return Err(Error::validation(
                "Please tell us a little more about your event",
            ));
        }
        if self.turnstile_token.trim().is_empty() {
            return Err(Error::validation("Verification token missing"));
        }
        Ok(())
    }
}

/// Contact form entry point, wired by [`crate::SiteClient`]
pub struct ContactIntake {
    turnstile: Option<TurnstileClient>,
    mailer: Option<MailerClient>,
}

impl ContactIntake {
    /// Create a new ContactIntake
    pub(crate) fn new(turnstile: Option<TurnstileClient>, mailer: Option<MailerClient>) -> Self {
        Self { turnstile, mailer }
    }

    /// Handle one submission end to end
    pub async fn submit(
        &self,
        submission: &ContactSubmission,
        remote_ip: Option<&str>,
    ) -> Result<(), Error> {
        submission.validate()?;

        let Some(mailer) = &self.mailer else {
            return Err(Error::unavailable("contact form is not configured"));
        };

        match &self.turnstile {
            Some(turnstile) => {
                turnstile
                    .verify(&submission.turnstile_token, remote_ip)
                    .await?
            }
            None => debug!("bot verification disabled; accepting submission unchecked"),
        }

        mailer.send_quote_request(submission).await?;
        mailer.forward_to_sheet(submission).await;

        info!("contact submission delivered for {}", submission.email.trim());
        Ok(())
    }
}
