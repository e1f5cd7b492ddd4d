//! Marquee CMS backend
//!
//! The content platform behind the Marquee live-event production site.
//! Content lives in a remote document store and degrades to a baked-in
//! fallback bundle; published pages are additionally snapshotted to
//! object storage so the public site never depends on the store being up.
//!
//! The platform is wired explicitly from configuration: every external
//! collaborator (document store, bucket, challenge verification, mail)
//! is optional, and a missing one switches its feature off instead of
//! failing the whole site.

pub mod admin;
pub mod config;
pub mod contact;
pub mod error;
pub mod mailer;
pub mod turnstile;
pub mod uploads;

use reqwest::Client;
use std::sync::Arc;

use marquee_auth::AdminVerifier;
use marquee_content::{ContentResolver, FallbackBundle, SnapshotPublisher};
use marquee_firestore::FirestoreClient;
use marquee_storage::{BucketClient, BucketConfig};

use crate::admin::AdminPanel;
use crate::config::SiteConfig;
use crate::contact::ContactIntake;
use crate::error::Error;
use crate::mailer::MailerClient;
use crate::turnstile::TurnstileClient;
use crate::uploads::MediaUploader;

/// The main entry point for the Marquee CMS backend
pub struct SiteClient {
    resolver: Arc<ContentResolver>,
    admin: AdminPanel,
    uploads: MediaUploader,
    contact: ContactIntake,
}

impl SiteClient {
    /// Wire the full platform from configuration
    ///
    /// One shared HTTP client backs every collaborator. Sections absent
    /// from the configuration leave the matching feature reporting
    /// itself as unavailable; content resolution always works because
    /// the fallback bundle ships inside the binary.
    pub fn new(config: SiteConfig) -> Result<Self, Error> {
        let http_client = Client::new();

        let make_store = || {
            config.store.as_ref().map(|store| {
                let endpoint = store
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| marquee_firestore::DEFAULT_ENDPOINT.to_string());
                FirestoreClient::new(
                    &endpoint,
                    &store.project_id,
                    &store.api_key,
                    http_client.clone(),
                )
            })
        };

        let make_bucket = || {
            config.bucket.as_ref().map(|settings| {
                let mut bucket_config = match &settings.endpoint {
                    Some(endpoint) => BucketConfig::new(
                        endpoint,
                        &settings.bucket,
                        &settings.access_key_id,
                        &settings.secret_access_key,
                    ),
                    None => BucketConfig::for_account(
                        &settings.account_id,
                        &settings.bucket,
                        &settings.access_key_id,
                        &settings.secret_access_key,
                    ),
                };
                if let Some(domain) = &settings.public_domain {
                    bucket_config = bucket_config.with_public_base_url(domain);
                }
                BucketClient::new(bucket_config, http_client.clone())
            })
        };

        let make_verifier = || match (&config.store, &config.admin_email_domain) {
            (Some(store), Some(domain)) => Some(AdminVerifier::new(&store.project_id, domain)),
            _ => None,
        };

        let fallback = FallbackBundle::load()?;
        let resolver = Arc::new(ContentResolver::new(make_store(), fallback));

        let publisher = make_bucket().map(|bucket| {
            let publisher = SnapshotPublisher::new(bucket);
            match &config.snapshot_object_key {
                Some(key) => publisher.with_object_key(key),
                None => publisher,
            }
        });

        let uploads = MediaUploader::new(make_bucket(), make_verifier());
        let admin = AdminPanel::new(
            make_store(),
            make_verifier(),
            Arc::clone(&resolver),
            publisher,
        );

        let turnstile = config.turnstile.as_ref().map(|settings| {
            let client = TurnstileClient::new(&settings.secret_key, http_client.clone());
            match &settings.verify_url {
                Some(url) => client.with_verify_url(url),
                None => client,
            }
        });
        let mailer = config
            .mail
            .as_ref()
            .map(|settings| MailerClient::new(settings, http_client.clone()));
        let contact = ContactIntake::new(turnstile, mailer);

        Ok(Self {
            resolver,
            admin,
            uploads,
            contact,
        })
    }

    /// Build a client from process environment variables
    pub fn from_env() -> Result<Self, Error> {
        Self::new(SiteConfig::from_env())
    }

    /// Read-side content resolution
    pub fn content(&self) -> &ContentResolver {
        &self.resolver
    }

    /// Token-gated admin writes
    pub fn admin(&self) -> &AdminPanel {
        &self.admin
    }

    /// Media upload pipeline
    pub fn uploads(&self) -> &MediaUploader {
        &self.uploads
    }

    /// Public contact form intake
    pub fn contact(&self) -> &ContactIntake {
        &self.contact
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::SiteConfig;
    pub use crate::contact::ContactSubmission;
    pub use crate::error::Error;
    pub use crate::SiteClient;
    pub use marquee_content::SiteContent;
}
