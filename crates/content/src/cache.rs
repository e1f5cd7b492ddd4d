//! TTL + tag-invalidation cache for resolved content slices.
//!
//! Entries hold already-serialized JSON values so heterogeneous view types
//! can share one map. The key set is small and fixed (one key per composed
//! view), so there is no size-based eviction; expiry and tag purges are the
//! only ways out. Expired entries linger until the next purge and simply
//! count as misses.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// 全コンテンツビューが共有する無効化タグ
pub const SITE_CONTENT_TAG: &str = "site-content";

/// 再検証ウィンドウ (30 分)
pub const REVALIDATE_SECS: u64 = 30 * 60;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    inserted_at: Instant,
    tags: Vec<String>,
}

/// コンテンツスライスのキャッシュ
pub struct SliceCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SliceCache {
    /// 指定 TTL でキャッシュを作成
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// 期限内のエントリを取得する。期限切れはミス扱い
    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        if let Some(entry) = entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            // 期限切れ。次の purge まで残るがヒットにはならない
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// エントリを登録する。既存キーは上書き
    pub async fn insert(&self, key: &str, value: Value, tags: &[&str]) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// タグの付いたエントリをすべて破棄し、削除数を返す
    pub async fn purge_by_tag(&self, tag: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|t| t == tag));
        before - entries.len()
    }

    /// 期限切れエントリを掃除し、削除数を返す
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        before - entries.len()
    }

    /// 全エントリを破棄
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// 現在のエントリ数 (期限切れ未掃除分を含む)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// ヒット率などの統計
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.read().await.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

impl Default for SliceCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(REVALIDATE_SECS))
    }
}

/// キャッシュ統計
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub ttl_secs: u64,
}

impl CacheStats {
    /// ヒット率 (百分率)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}
