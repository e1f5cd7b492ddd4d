//! Environment-driven configuration for the Marquee CMS
//!
//! Every integration is described by its own optional section. A section
//! whose variables are absent switches the corresponding feature off
//! without affecting the rest of the platform: with no document store the
//! site serves the baked-in fallback bundle, with no bucket the admin
//! panel reports media storage as unavailable, and so on.

use log::warn;
use std::env;

/// Document store connection settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Firebase project id (also the token audience for admin auth)
    pub project_id: String,
    /// Web API key, sent as the `key` query parameter
    pub api_key: String,
    /// Endpoint override for tests and emulators; `None` means production
    pub endpoint: Option<String>,
}

/// S3-compatible bucket settings (Cloudflare R2 in production)
#[derive(Debug, Clone)]
pub struct BucketSettings {
    /// R2 account id; used to derive the endpoint when no override is set
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Custom CDN domain for public media URLs
    pub public_domain: Option<String>,
    /// Endpoint override for tests and S3-compatible alternatives
    pub endpoint: Option<String>,
}

/// Bot-challenge verification settings
#[derive(Debug, Clone)]
pub struct TurnstileSettings {
    pub secret_key: String,
    /// Verification endpoint override; `None` means the Cloudflare default
    pub verify_url: Option<String>,
}

/// Outbound mail settings for the contact form
#[derive(Debug, Clone)]
pub struct MailSettings {
    /// Mail service endpoint (HTTP POST, JSON body)
    pub endpoint: String,
    pub api_key: String,
    /// Studio inbox that receives quote requests
    pub recipient: String,
    /// Optional spreadsheet webhook that gets a copy of each submission
    pub sheet_webhook_url: Option<String>,
}

/// Top-level configuration for [`crate::SiteClient`]
#[derive(Debug, Clone, Default)]
pub struct SiteConfig {
    pub store: Option<StoreConfig>,
    pub bucket: Option<BucketSettings>,
    pub turnstile: Option<TurnstileSettings>,
    pub mail: Option<MailSettings>,
    /// Staff email domain admin tokens must belong to
    pub admin_email_domain: Option<String>,
    /// Object key for the published snapshot; `None` means the default
    pub snapshot_object_key: Option<String>,
}

impl SiteConfig {
    /// Read configuration from the process environment
    ///
    /// Sections with all variables present are enabled; fully absent
    /// sections are silently off; partially configured sections are
    /// treated as off and reported with a warning.
    pub fn from_env() -> Self {
        let store = match (var("FIRESTORE_PROJECT_ID"), var("FIRESTORE_API_KEY")) {
            (Some(project_id), Some(api_key)) => Some(StoreConfig {
                project_id,
                api_key,
                endpoint: None,
            }),
            (None, None) => None,
            _ => {
                warn!("incomplete document store configuration; remote content disabled");
                None
            }
        };

        let bucket = match (
            var("R2_ACCOUNT_ID"),
            var("R2_ACCESS_KEY_ID"),
            var("R2_SECRET_ACCESS_KEY"),
            var("R2_BUCKET"),
        ) {
            (Some(account_id), Some(access_key_id), Some(secret_access_key), Some(bucket)) => {
                Some(BucketSettings {
                    account_id,
                    access_key_id,
                    secret_access_key,
                    bucket,
                    public_domain: var("R2_PUBLIC_DOMAIN").map(|d| normalize_public_domain(&d)),
                    endpoint: None,
                })
            }
            (None, None, None, None) => None,
            _ => {
                warn!("incomplete bucket configuration; media storage disabled");
                None
            }
        };

        let turnstile = var("TURNSTILE_SECRET_KEY").map(|secret_key| TurnstileSettings {
            secret_key,
            verify_url: None,
        });

        let mail = match (
            var("MAIL_ENDPOINT"),
            var("MAIL_API_KEY"),
            var("CONTACT_RECIPIENT"),
        ) {
            (Some(endpoint), Some(api_key), Some(recipient)) => Some(MailSettings {
                endpoint,
                api_key,
                recipient,
                sheet_webhook_url: var("SHEET_WEBHOOK_URL"),
            }),
            (None, None, None) => None,
            _ => {
                warn!("incomplete mail configuration; contact form disabled");
                None
            }
        };

        Self {
            store,
            bucket,
            turnstile,
            mail,
            admin_email_domain: var("ADMIN_EMAIL_DOMAIN"),
            snapshot_object_key: var("SNAPSHOT_OBJECT_KEY"),
        }
    }

    /// Set the document store section
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the bucket section
    pub fn with_bucket(mut self, bucket: BucketSettings) -> Self {
        self.bucket = Some(bucket);
        self
    }

    /// Set the bot-challenge section
    pub fn with_turnstile(mut self, turnstile: TurnstileSettings) -> Self {
        self.turnstile = Some(turnstile);
        self
    }

    /// Set the outbound mail section
    pub fn with_mail(mut self, mail: MailSettings) -> Self {
        self.mail = Some(mail);
        self
    }

    /// Set the staff email domain for admin tokens
    pub fn with_admin_email_domain(mut self, domain: &str) -> Self {
        self.admin_email_domain = Some(domain.to_string());
        self
    }

    /// Set the snapshot object key
    pub fn with_snapshot_object_key(mut self, key: &str) -> Self {
        self.snapshot_object_key = Some(key.to_string());
        self
    }
}

/// Read a variable, treating blank values as absent
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Accept either a bare domain or a full URL for the public media base
fn normalize_public_domain(value: &str) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 14] = [
        "FIRESTORE_PROJECT_ID",
        "FIRESTORE_API_KEY",
        "R2_ACCOUNT_ID",
        "R2_ACCESS_KEY_ID",
        "R2_SECRET_ACCESS_KEY",
        "R2_BUCKET",
        "R2_PUBLIC_DOMAIN",
        "TURNSTILE_SECRET_KEY",
        "MAIL_ENDPOINT",
        "MAIL_API_KEY",
        "CONTACT_RECIPIENT",
        "ADMIN_EMAIL_DOMAIN",
        "SHEET_WEBHOOK_URL",
        "SNAPSHOT_OBJECT_KEY",
    ];

    fn clear_env() {
        for name in ALL_VARS {
            env::remove_var(name);
        }
    }

    // 環境変数はプロセス全体で共有されるため、1 つのテストで順に検証する
    #[test]
    fn test_from_env_sections() {
        clear_env();

        // 何も設定されていなければ全セクションが無効
        let config = SiteConfig::from_env();
        assert!(config.store.is_none());
        assert!(config.bucket.is_none());
        assert!(config.turnstile.is_none());
        assert!(config.mail.is_none());
        assert!(config.admin_email_domain.is_none());

        // フル設定
        env::set_var("FIRESTORE_PROJECT_ID", "marquee-prod");
        env::set_var("FIRESTORE_API_KEY", "web-api-key");
        env::set_var("R2_ACCOUNT_ID", "acc123");
        env::set_var("R2_ACCESS_KEY_ID", "akid");
        env::set_var("R2_SECRET_ACCESS_KEY", "secret");
        env::set_var("R2_BUCKET", "marquee-assets");
        env::set_var("R2_PUBLIC_DOMAIN", "cdn.marquee.live");
        env::set_var("TURNSTILE_SECRET_KEY", "ts-secret");
        env::set_var("MAIL_ENDPOINT", "https://mail.example.com/send");
        env::set_var("MAIL_API_KEY", "mail-key");
        env::set_var("CONTACT_RECIPIENT", "bookings@marquee.live");
        env::set_var("ADMIN_EMAIL_DOMAIN", "marquee.live");

        let config = SiteConfig::from_env();
        let store = config.store.unwrap();
        assert_eq!(store.project_id, "marquee-prod");
        assert!(store.endpoint.is_none());
        let bucket = config.bucket.unwrap();
        assert_eq!(bucket.bucket, "marquee-assets");
        // 素のドメインは https URL に正規化される
        assert_eq!(bucket.public_domain.as_deref(), Some("https://cdn.marquee.live"));
        assert!(config.turnstile.is_some());
        let mail = config.mail.unwrap();
        assert_eq!(mail.recipient, "bookings@marquee.live");
        assert!(mail.sheet_webhook_url.is_none());
        assert_eq!(config.admin_email_domain.as_deref(), Some("marquee.live"));

        // 部分的な設定はセクションごと無効になる
        env::remove_var("FIRESTORE_API_KEY");
        env::set_var("MAIL_API_KEY", "");
        let config = SiteConfig::from_env();
        assert!(config.store.is_none());
        assert!(config.mail.is_none());
        assert!(config.bucket.is_some());

        clear_env();
    }

    #[test]
    fn test_normalize_public_domain() {
        assert_eq!(
            normalize_public_domain("cdn.marquee.live"),
            "https://cdn.marquee.live"
        );
        assert_eq!(
            normalize_public_domain("https://cdn.marquee.live/"),
            "https://cdn.marquee.live"
        );
    }
}
