//! Content resolution: remote documents layered over the static fallback.
//!
//! Reads never fail. Every resolution path ends in usable content — remote
//! when it is present and valid, the embedded fallback otherwise. Collection
//! reads merge the two sources by id so a half-populated remote store still
//! renders a full site.

use crate::cache::SliceCache;
use crate::fallback::FallbackBundle;
use crate::schema::{
    site_keys, AboutDoc, BrandDoc, ContactDoc, ContentItem, FooterDoc, HomeDoc, NavigationDoc,
    Project, RentalItem, RentalsSettingsDoc, SeoDoc, SiteContent, Validate, WorkSettingsDoc,
};
use log::warn;
use marquee_firestore::FirestoreClient;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// 制作実績コレクション名
pub const PROJECTS_COLLECTION: &str = "projects";

/// レンタル機材コレクション名
pub const RENTALS_COLLECTION: &str = "rentals";

/// フォールバック項目にリモート項目を id で重ね、表示順に並べる
///
/// リモート側が勝つ。順序は `order` 昇順、同順位は id で安定。
fn merge_by_id<T: ContentItem + Clone>(fallback_items: &[T], remote_items: Vec<T>) -> Vec<T> {
    let mut by_id: HashMap<String, T> = fallback_items
        .iter()
        .map(|item| (item.id().to_string(), item.clone()))
        .collect();

    for item in remote_items {
        by_id.insert(item.id().to_string(), item);
    }

    let mut merged: Vec<T> = by_id.into_values().collect();
    merged.sort_by(|a, b| {
        a.sort_order()
            .cmp(&b.sort_order())
            .then_with(|| a.id().cmp(b.id()))
    });
    merged
}

/// コンテンツリゾルバ
///
/// リモートストア (未設定なら `None`)、フォールバックバンドル、
/// ビューキャッシュを束ねる。
pub struct ContentResolver {
    store: Option<FirestoreClient>,
    fallback: FallbackBundle,
    pub(crate) cache: SliceCache,
}

impl ContentResolver {
    /// リゾルバを作成。`store` が `None` ならフォールバック専用で動く
    pub fn new(store: Option<FirestoreClient>, fallback: FallbackBundle) -> Self {
        Self {
            store,
            fallback,
            cache: SliceCache::default(),
        }
    }

    /// 既定以外のキャッシュを差し込む (テスト用に短い TTL など)
    pub fn with_cache(mut self, cache: SliceCache) -> Self {
        self.cache = cache;
        self
    }

    /// 静的フォールバックのグラフ
    pub fn fallback(&self) -> &SiteContent {
        self.fallback.content()
    }

    /// リモートストアが構成されているか
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// シングルトン解決: 有効なリモート文書が勝ち、それ以外はフォールバック
    async fn resolve_singleton<T>(&self, doc_id: &str, fallback: &T) -> T
    where
        T: DeserializeOwned + Validate + Clone,
    {
        let Some(store) = &self.store else {
            return fallback.clone();
        };
        let Some(fields) = store.fetch_site_doc(doc_id).await else {
            return fallback.clone();
        };

        match serde_json::from_value::<T>(Value::Object(fields)) {
            Ok(doc) => match doc.validate() {
                Ok(()) => doc,
                Err(error) => {
                    warn!("site document {} failed validation: {}", doc_id, error);
                    fallback.clone()
                }
            },
            Err(error) => {
                warn!("site document {} failed to decode: {}", doc_id, error);
                fallback.clone()
            }
        }
    }

    /// コレクション解決: リモートをフォールバックへマージし、無効項目を落とす
    ///
    /// リモート到達不能ならフォールバックそのまま。マージ後に有効な項目が
    /// 1 件も残らなければ、やはりフォールバックそのままを返す。
    async fn resolve_collection<T>(&self, collection: &str, fallback_items: &[T]) -> Vec<T>
    where
        T: DeserializeOwned + Validate + ContentItem + Clone,
    {
        let Some(store) = &self.store else {
            return fallback_items.to_vec();
        };
        let Some(records) = store.fetch_collection(collection).await else {
            return fallback_items.to_vec();
        };

        let mut remote_items = Vec::with_capacity(records.len());
        for record in records {
            match serde_json::from_value::<T>(Value::Object(record.fields)) {
                Ok(item) => remote_items.push(item),
                Err(error) => {
                    warn!("{} document {} failed to decode: {}", collection, record.id, error);
                }
            }
        }

        let merged = merge_by_id(fallback_items, remote_items);

        let valid: Vec<T> = merged
            .into_iter()
            .filter(|item| match item.validate() {
                Ok(()) => true,
                Err(error) => {
                    warn!("{} item {} failed validation: {}", collection, item.id(), error);
                    false
                }
            })
            .collect();

        if valid.is_empty() {
            fallback_items.to_vec()
        } else {
            valid
        }
    }

    pub async fn brand(&self) -> BrandDoc {
        self.resolve_singleton(site_keys::BRAND, &self.fallback.content().brand)
            .await
    }

    pub async fn navigation(&self) -> NavigationDoc {
        self.resolve_singleton(site_keys::NAVIGATION, &self.fallback.content().navigation)
            .await
    }

    pub async fn seo(&self) -> SeoDoc {
        self.resolve_singleton(site_keys::SEO, &self.fallback.content().seo)
            .await
    }

    pub async fn home(&self) -> HomeDoc {
        self.resolve_singleton(site_keys::HOME, &self.fallback.content().home)
            .await
    }

    pub async fn about(&self) -> AboutDoc {
        self.resolve_singleton(site_keys::ABOUT, &self.fallback.content().about)
            .await
    }

    pub async fn contact(&self) -> ContactDoc {
        self.resolve_singleton(site_keys::CONTACT, &self.fallback.content().contact)
            .await
    }

    pub async fn footer(&self) -> FooterDoc {
        self.resolve_singleton(site_keys::FOOTER, &self.fallback.content().footer)
            .await
    }

    pub async fn work_settings(&self) -> WorkSettingsDoc {
        self.resolve_singleton(site_keys::WORK, &self.fallback.content().work)
            .await
    }

    pub async fn rentals_settings(&self) -> RentalsSettingsDoc {
        self.resolve_singleton(site_keys::RENTALS, &self.fallback.content().rentals)
            .await
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.resolve_collection(PROJECTS_COLLECTION, &self.fallback.content().projects)
            .await
    }

    pub async fn rental_items(&self) -> Vec<RentalItem> {
        self.resolve_collection(RENTALS_COLLECTION, &self.fallback.content().rental_items)
            .await
    }

    /// 全コンテンツグラフを組み立てる
    ///
    /// キャッシュを経由しない。公開パイプラインが保存直後の状態を
    /// 取りたいときに使う。
    pub async fn resolve_site_content(&self) -> SiteContent {
        let (brand, navigation, seo, home, about, contact, footer, work, rentals) = tokio::join!(
            self.brand(),
            self.navigation(),
            self.seo(),
            self.home(),
            self.about(),
            self.contact(),
            self.footer(),
            self.work_settings(),
            self.rentals_settings(),
        );
        let (projects, rental_items) = tokio::join!(self.projects(), self.rental_items());

        SiteContent {
            brand,
            navigation,
            seo,
            home,
            about,
            contact,
            footer,
            work,
            rentals,
            projects,
            rental_items,
        }
    }

    /// 共有タグでビューキャッシュを破棄する
    pub async fn invalidate(&self) {
        let removed = self
            .cache
            .purge_by_tag(crate::cache::SITE_CONTENT_TAG)
            .await;
        log::debug!("invalidated {} cached content views", removed);
    }
}
