//! Content model for the Marquee site.
//!
//! This crate owns everything between the raw document store and a rendered
//! page: the typed schema, the embedded fallback bundle, remote-over-fallback
//! resolution, the view cache, and the published snapshot.
//!
//! # Features
//!
//! - Typed document schema with pure validators (`schema`)
//! - Media URL focal points and placeholder detection (`media`)
//! - Static fallback bundle embedded at build time (`fallback`)
//! - Remote-over-fallback resolution with per-item validation (`resolver`)
//! - TTL + tag cache and composed page views (`cache`, `views`)
//! - Published snapshot writer on object storage (`publish`)

use thiserror::Error;

pub mod cache;
pub mod fallback;
pub mod media;
pub mod publish;
pub mod resolver;
pub mod schema;
pub mod views;

/// エラー型
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Validation error: {0}")]
    Validation(#[from] schema::ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] marquee_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ContentError>;

pub use cache::{CacheStats, SliceCache, REVALIDATE_SECS, SITE_CONTENT_TAG};
pub use fallback::FallbackBundle;
pub use media::{is_published_media_url, parse_media_url, with_focal_point, FocalPoint};
pub use publish::{PublishedSnapshot, SnapshotPublisher};
pub use resolver::{ContentResolver, PROJECTS_COLLECTION, RENTALS_COLLECTION};
pub use schema::{
    site_keys, validate_site_document, BrandDoc, ContentItem, Project, RentalItem, SiteContent,
    Validate, ValidationError,
};
pub use views::{
    AboutPageData, ContactPageData, HomePageData, RentalsPageData, ShellData, WorkPageData,
};
