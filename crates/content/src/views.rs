//! Composed page-data views.
//!
//! Each view bundles everything one page needs into a single struct, cached
//! under its own slice key. All view keys share one invalidation tag, so an
//! admin write clears every page at once.

use crate::cache::SITE_CONTENT_TAG;
use crate::resolver::ContentResolver;
use crate::schema::{
    AboutDoc, BrandDoc, ContactDoc, FooterDoc, HomeDoc, NavigationDoc, Project, RentalItem,
    RentalsSettingsDoc, WorkSettingsDoc,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// トップページに載せる注目実績の上限
pub const FEATURED_LIMIT: usize = 6;

mod keys {
    pub const SHELL: &str = "view:shell";
    pub const HOME: &str = "view:home";
    pub const WORK: &str = "view:work";
    pub const RENTALS: &str = "view:rentals";
    pub const ABOUT: &str = "view:about";
    pub const CONTACT: &str = "view:contact";
}

/// 全ページ共通のクローム (ヘッダ・フッタ)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellData {
    pub brand: BrandDoc,
    pub navigation: NavigationDoc,
    pub footer: FooterDoc,
}

/// トップページ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePageData {
    pub brand: BrandDoc,
    pub home: HomeDoc,
    pub work: WorkSettingsDoc,
    pub featured_projects: Vec<Project>,
}

/// 実績一覧ページ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPageData {
    pub settings: WorkSettingsDoc,
    pub projects: Vec<Project>,
}

impl WorkPageData {
    /// 実績詳細は一覧ビューから引く。個別のキャッシュキーは持たない
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }
}

/// レンタル一覧ページ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalsPageData {
    pub settings: RentalsSettingsDoc,
    pub items: Vec<RentalItem>,
}

impl RentalsPageData {
    pub fn item(&self, id: &str) -> Option<&RentalItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// 関連機材を実在する項目へ解決する。存在しない ID は黙って落とす
    pub fn related_items(&self, item: &RentalItem) -> Vec<&RentalItem> {
        item.related_ids
            .iter()
            .filter_map(|id| self.items.iter().find(|candidate| &candidate.id == id))
            .collect()
    }
}

/// 会社紹介ページ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutPageData {
    pub about: AboutDoc,
    pub brand: BrandDoc,
}

/// 問い合わせページ
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPageData {
    pub contact: ContactDoc,
    pub brand: BrandDoc,
}

impl ContentResolver {
    async fn view_hit<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cached = self.cache.get(key).await?;
        // 形の変わった古いエントリは捨てて再計算する
        serde_json::from_value(cached).ok()
    }

    async fn store_view<T: Serialize>(&self, key: &str, view: &T) {
        if let Ok(value) = serde_json::to_value(view) {
            self.cache.insert(key, value, &[SITE_CONTENT_TAG]).await;
        }
    }

    /// 共通クロームのビュー
    pub async fn shell(&self) -> ShellData {
        if let Some(view) = self.view_hit(keys::SHELL).await {
            return view;
        }

        let (brand, navigation, footer) =
            tokio::join!(self.brand(), self.navigation(), self.footer());
        let view = ShellData {
            brand,
            navigation,
            footer,
        };

        self.store_view(keys::SHELL, &view).await;
        view
    }

    /// トップページのビュー。注目実績は order 昇順で上限まで
    pub async fn home_page(&self) -> HomePageData {
        if let Some(view) = self.view_hit(keys::HOME).await {
            return view;
        }

        let (brand, home, work, projects) = tokio::join!(
            self.brand(),
            self.home(),
            self.work_settings(),
            self.projects()
        );
        let featured_projects = projects
            .into_iter()
            .filter(|project| project.featured)
            .take(FEATURED_LIMIT)
            .collect();
        let view = HomePageData {
            brand,
            home,
            work,
            featured_projects,
        };

        self.store_view(keys::HOME, &view).await;
        view
    }

    /// 実績一覧ページのビュー
    pub async fn work_page(&self) -> WorkPageData {
        if let Some(view) = self.view_hit(keys::WORK).await {
            return view;
        }

        let (settings, projects) = tokio::join!(self.work_settings(), self.projects());
        let view = WorkPageData { settings, projects };

        self.store_view(keys::WORK, &view).await;
        view
    }

    /// レンタル一覧ページのビュー
    pub async fn rentals_page(&self) -> RentalsPageData {
        if let Some(view) = self.view_hit(keys::RENTALS).await {
            return view;
        }

        let (settings, items) = tokio::join!(self.rentals_settings(), self.rental_items());
        let view = RentalsPageData { settings, items };

        self.store_view(keys::RENTALS, &view).await;
        view
    }

    /// 会社紹介ページのビュー
    pub async fn about_page(&self) -> AboutPageData {
        if let Some(view) = self.view_hit(keys::ABOUT).await {
            return view;
        }

        let (about, brand) = tokio::join!(self.about(), self.brand());
        let view = AboutPageData { about, brand };

        self.store_view(keys::ABOUT, &view).await;
        view
    }

    /// 問い合わせページのビュー
    pub async fn contact_page(&self) -> ContactPageData {
        if let Some(view) = self.view_hit(keys::CONTACT).await {
            return view;
        }

        let (contact, brand) = tokio::join!(self.contact(), self.brand());
        let view = ContactPageData { contact, brand };

        self.store_view(keys::CONTACT, &view).await;
        view
    }
}
