//! Published snapshot writer.
//!
//! After a successful admin save the full content graph is serialized and
//! pushed to object storage as one JSON document. Edge render paths can read
//! that snapshot instead of touching the document store at all.

use crate::schema::SiteContent;
use crate::Result;
use chrono::{SecondsFormat, Utc};
use log::info;
use marquee_storage::{BucketClient, PutOptions};
use serde::{Deserialize, Serialize};

/// 既定のスナップショットキー
pub const DEFAULT_OBJECT_KEY: &str = "site-data.json";

/// 既定の Cache-Control。ビューキャッシュと同じ 30 分窓
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=1800";

/// 公開スナップショットの形
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedSnapshot {
    /// 生成時刻 (RFC 3339, UTC)
    pub generated_at: String,
    pub site_data: SiteContent,
}

/// スナップショットライター
pub struct SnapshotPublisher {
    store: BucketClient,
    object_key: String,
    cache_control: String,
}

impl SnapshotPublisher {
    pub fn new(store: BucketClient) -> Self {
        Self {
            store,
            object_key: DEFAULT_OBJECT_KEY.to_string(),
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
        }
    }

    /// スナップショットの格納キーを変更
    pub fn with_object_key(mut self, object_key: &str) -> Self {
        self.object_key = object_key.to_string();
        self
    }

    /// Cache-Control を変更
    pub fn with_cache_control(mut self, cache_control: &str) -> Self {
        self.cache_control = cache_control.to_string();
        self
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    /// グラフを生成時刻付きで書き出す
    pub async fn publish(&self, content: &SiteContent) -> Result<()> {
        let snapshot = PublishedSnapshot {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            site_data: content.clone(),
        };
        let body = serde_json::to_vec(&snapshot)?;

        let options = PutOptions::new()
            .with_content_type("application/json")
            .with_cache_control(&self.cache_control);
        self.store
            .put_object(&self.object_key, body.into(), Some(options))
            .await?;

        info!("published content snapshot to {}", self.object_key);
        Ok(())
    }

    /// 公開済みスナップショットを読み戻す
    pub async fn fetch_published(&self) -> Result<PublishedSnapshot> {
        let bytes = self.store.get_object(&self.object_key).await?;
        let snapshot = serde_json::from_slice(&bytes)?;
        Ok(snapshot)
    }
}
