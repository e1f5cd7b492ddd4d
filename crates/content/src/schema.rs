//! Typed document schema and pure validators.
//!
//! Every document the site works with — the nine singletons under the `site`
//! namespace plus the `projects` and `rentals` collections — has its shape
//! defined here. Wire field names are camelCase. Validators are pure and
//! return the first failure; read paths drop invalid documents, write paths
//! surface the message to the admin UI.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// `site` コレクション内のシングルトン文書キー
pub mod site_keys {
    pub const BRAND: &str = "brand";
    pub const NAVIGATION: &str = "navigation";
    pub const SEO: &str = "seo";
    pub const HOME: &str = "home";
    pub const ABOUT: &str = "about";
    pub const CONTACT: &str = "contact";
    pub const FOOTER: &str = "footer";
    pub const WORK: &str = "work";
    pub const RENTALS: &str = "rentals";

    /// 全シングルトンキー
    pub const ALL: [&str; 9] = [
        BRAND, NAVIGATION, SEO, HOME, ABOUT, CONTACT, FOOTER, WORK, RENTALS,
    ];
}

/// バリデーション失敗。フィールドパスとメッセージを運ぶ
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{path}: {message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// 子バリデータのエラーに親フィールドのパスを前置する
    fn nested(mut self, parent: &str) -> Self {
        self.path = format!("{}.{}", parent, self.path);
        self
    }
}

/// ドキュメント型ごとの純粋なバリデータ
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// コレクション項目に共通するマージ・並べ替えキー
pub trait ContentItem {
    fn id(&self) -> &str;
    fn sort_order(&self) -> u32;
}

fn require_text(path: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(path, "must not be empty"));
    }
    Ok(())
}

fn require_email(path: &str, value: &str) -> Result<(), ValidationError> {
    require_text(path, value)?;
    if !is_plausible_email(value.trim()) {
        return Err(ValidationError::new(path, "must be a valid email address"));
    }
    Ok(())
}

fn require_slug(path: &str, value: &str) -> Result<(), ValidationError> {
    let well_formed = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !well_formed {
        return Err(ValidationError::new(
            path,
            "must be a lowercase slug (a-z, 0-9, -)",
        ));
    }
    Ok(())
}

/// ローカル部@ドット入りドメインの素朴な形チェック
pub fn is_plausible_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        }
        None => false,
    }
}

/// サービス分類 (閉集合)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Lighting,
    Audio,
    Video,
    Staging,
    Rigging,
    Power,
}

impl ServiceCategory {
    /// 表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            ServiceCategory::Lighting => "Lighting",
            ServiceCategory::Audio => "Audio",
            ServiceCategory::Video => "Video",
            ServiceCategory::Staging => "Staging",
            ServiceCategory::Rigging => "Rigging",
            ServiceCategory::Power => "Power",
        }
    }
}

/// レンタル機材の分類 (閉集合)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalCategory {
    Lighting,
    Audio,
    Video,
    Staging,
    Effects,
    Control,
}

impl RentalCategory {
    /// 表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            RentalCategory::Lighting => "Lighting",
            RentalCategory::Audio => "Audio",
            RentalCategory::Video => "Video",
            RentalCategory::Staging => "Staging",
            RentalCategory::Effects => "Effects",
            RentalCategory::Control => "Control",
        }
    }
}

/// UI アイコン識別子 (閉集合)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconId {
    Phone,
    Mail,
    MapPin,
    Clock,
    Instagram,
    Facebook,
    Linkedin,
    Youtube,
    Spark,
    Truck,
    Shield,
    Users,
}

/// ナビゲーション等のリンク
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

impl Validate for NavLink {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("label", &self.label)?;
        require_text("href", &self.href)?;
        Ok(())
    }
}

/// SNS リンク
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    pub icon: IconId,
    pub label: String,
    pub href: String,
}

/// 会社ブランド情報 (site/brand)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandDoc {
    pub company_name: String,
    pub tagline: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub address_lines: Vec<String>,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
}

impl Validate for BrandDoc {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("companyName", &self.company_name)?;
        require_text("tagline", &self.tagline)?;
        require_text("phone", &self.phone)?;
        require_email("email", &self.email)?;
        for (index, link) in self.social_links.iter().enumerate() {
            require_text(&format!("socialLinks[{}].label", index), &link.label)?;
            require_text(&format!("socialLinks[{}].href", index), &link.href)?;
        }
        Ok(())
    }
}

/// サイトナビゲーション (site/navigation)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationDoc {
    pub links: Vec<NavLink>,
    pub cta_label: String,
    pub cta_href: String,
}

impl Validate for NavigationDoc {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.links.is_empty() {
            return Err(ValidationError::new("links", "must not be empty"));
        }
        for (index, link) in self.links.iter().enumerate() {
            link.validate()
                .map_err(|e| e.nested(&format!("links[{}]", index)))?;
        }
        require_text("ctaLabel", &self.cta_label)?;
        require_text("ctaHref", &self.cta_href)?;
        Ok(())
    }
}

/// 既定の SEO メタデータ (site/seo)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoDoc {
    pub default_title: String,
    pub title_template: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub og_image: String,
}

impl Validate for SeoDoc {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("defaultTitle", &self.default_title)?;
        require_text("titleTemplate", &self.title_template)?;
        require_text("description", &self.description)?;
        Ok(())
    }
}

/// トップページのヒーロー領域
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroBlock {
    pub heading: String,
    pub subheading: String,
    pub media: String,
    pub cta_label: String,
    pub cta_href: String,
}

impl Validate for HeroBlock {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("heading", &self.heading)?;
        require_text("subheading", &self.subheading)?;
        require_text("media", &self.media)?;
        require_text("ctaLabel", &self.cta_label)?;
        require_text("ctaHref", &self.cta_href)?;
        Ok(())
    }
}

/// 実績数値の 1 行 ("350+" / "events delivered" など)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatRow {
    pub value: String,
    pub label: String,
}

/// サービス紹介ブロック
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBlurb {
    pub icon: IconId,
    pub title: String,
    pub text: String,
}

/// トップページ (site/home)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeDoc {
    pub hero: HeroBlock,
    #[serde(default)]
    pub stats: Vec<StatRow>,
    pub services: Vec<ServiceBlurb>,
    pub featured_heading: String,
}

impl Validate for HomeDoc {
    fn validate(&self) -> Result<(), ValidationError> {
        self.hero.validate().map_err(|e| e.nested("hero"))?;
        for (index, blurb) in self.services.iter().enumerate() {
            require_text(&format!("services[{}].title", index), &blurb.title)?;
            require_text(&format!("services[{}].text", index), &blurb.text)?;
        }
        require_text("featuredHeading", &self.featured_heading)?;
        Ok(())
    }
}

/// チームメンバー
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub photo: String,
}

/// 会社の価値観 1 項目
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueItem {
    pub icon: IconId,
    pub title: String,
    pub text: String,
}

/// 会社紹介ページ (site/about)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutDoc {
    pub heading: String,
    pub story: Vec<String>,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    #[serde(default)]
    pub values: Vec<ValueItem>,
}

impl Validate for AboutDoc {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("heading", &self.heading)?;
        if self.story.is_empty() {
            return Err(ValidationError::new("story", "must not be empty"));
        }
        for (index, member) in self.team.iter().enumerate() {
            require_text(&format!("team[{}].name", index), &member.name)?;
            require_text(&format!("team[{}].role", index), &member.role)?;
        }
        for (index, value) in self.values.iter().enumerate() {
            require_text(&format!("values[{}].title", index), &value.title)?;
        }
        Ok(())
    }
}

/// 問い合わせページ (site/contact)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDoc {
    pub heading: String,
    pub intro: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default)]
    pub map_embed_url: String,
}

impl Validate for ContactDoc {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("heading", &self.heading)?;
        require_email("email", &self.email)?;
        require_text("phone", &self.phone)?;
        require_text("address", &self.address)?;
        Ok(())
    }
}

/// フッター (site/footer)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterDoc {
    pub blurb: String,
    #[serde(default)]
    pub quick_links: Vec<NavLink>,
    pub legal: String,
}

impl Validate for FooterDoc {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("blurb", &self.blurb)?;
        for (index, link) in self.quick_links.iter().enumerate() {
            link.validate()
                .map_err(|e| e.nested(&format!("quickLinks[{}]", index)))?;
        }
        require_text("legal", &self.legal)?;
        Ok(())
    }
}

/// サービス絞り込みラベル
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceFilter {
    pub category: ServiceCategory,
    pub label: String,
}

/// 実績ページ設定 (site/work)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSettingsDoc {
    pub heading: String,
    pub intro: String,
    #[serde(default)]
    pub filters: Vec<ServiceFilter>,
}

impl Validate for WorkSettingsDoc {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("heading", &self.heading)?;
        require_text("intro", &self.intro)?;
        for (index, filter) in self.filters.iter().enumerate() {
            require_text(&format!("filters[{}].label", index), &filter.label)?;
        }
        Ok(())
    }
}

/// カテゴリ表示ラベル
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLabel {
    pub category: RentalCategory,
    pub label: String,
}

/// レンタルページ設定 (site/rentals)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalsSettingsDoc {
    pub heading: String,
    pub intro: String,
    #[serde(default)]
    pub category_labels: Vec<CategoryLabel>,
    pub quote_cta: String,
}

impl Validate for RentalsSettingsDoc {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("heading", &self.heading)?;
        require_text("intro", &self.intro)?;
        require_text("quoteCta", &self.quote_cta)?;
        for (index, entry) in self.category_labels.iter().enumerate() {
            require_text(&format!("categoryLabels[{}].label", index), &entry.label)?;
        }
        Ok(())
    }
}

/// 制作実績 1 件 (projects コレクション)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub client: String,
    pub location: String,
    pub event_date: String,
    pub services: Vec<ServiceCategory>,
    pub summary: String,
    #[serde(default)]
    pub description: String,
    pub hero_image: String,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub order: u32,
}

impl Validate for Project {
    fn validate(&self) -> Result<(), ValidationError> {
        require_slug("id", &self.id)?;
        require_text("title", &self.title)?;
        require_text("client", &self.client)?;
        if self.services.is_empty() {
            return Err(ValidationError::new("services", "must not be empty"));
        }
        require_text("summary", &self.summary)?;
        require_text("heroImage", &self.hero_image)?;
        Ok(())
    }
}

impl ContentItem for Project {
    fn id(&self) -> &str {
        &self.id
    }

    fn sort_order(&self) -> u32 {
        self.order
    }
}

fn default_true() -> bool {
    true
}

/// レンタル機材 1 件 (rentals コレクション)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalItem {
    pub id: String,
    pub name: String,
    pub category: RentalCategory,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub daily_rate: Option<f64>,
    pub description: String,
    #[serde(default)]
    pub specs: Vec<String>,
    #[serde(default)]
    pub related_ids: Vec<String>,
    pub image: String,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub order: u32,
}

impl RentalItem {
    /// 料金表示ラベル。価格未設定時は問い合わせ誘導になる
    pub fn price_label(&self) -> String {
        match self.daily_rate {
            Some(rate) if rate.fract() == 0.0 => format!("${:.0}/day", rate),
            Some(rate) => format!("${:.2}/day", rate),
            None => "Contact for pricing".to_string(),
        }
    }
}

impl Validate for RentalItem {
    fn validate(&self) -> Result<(), ValidationError> {
        require_slug("id", &self.id)?;
        require_text("name", &self.name)?;
        require_text("description", &self.description)?;
        require_text("image", &self.image)?;
        if let Some(rate) = self.daily_rate {
            if !rate.is_finite() || rate < 0.0 {
                return Err(ValidationError::new("dailyRate", "must be non-negative"));
            }
        }
        for (index, related) in self.related_ids.iter().enumerate() {
            require_slug(&format!("relatedIds[{}]", index), related)?;
        }
        Ok(())
    }
}

impl ContentItem for RentalItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn sort_order(&self) -> u32 {
        self.order
    }
}

/// 解決済みコンテンツグラフ全体
///
/// フォールバックバンドルと公開スナップショットの `siteData` はこの形。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    pub brand: BrandDoc,
    pub navigation: NavigationDoc,
    pub seo: SeoDoc,
    pub home: HomeDoc,
    pub about: AboutDoc,
    pub contact: ContactDoc,
    pub footer: FooterDoc,
    pub work: WorkSettingsDoc,
    pub rentals: RentalsSettingsDoc,
    pub projects: Vec<Project>,
    pub rental_items: Vec<RentalItem>,
}

impl Validate for SiteContent {
    fn validate(&self) -> Result<(), ValidationError> {
        self.brand.validate().map_err(|e| e.nested("brand"))?;
        self.navigation
            .validate()
            .map_err(|e| e.nested("navigation"))?;
        self.seo.validate().map_err(|e| e.nested("seo"))?;
        self.home.validate().map_err(|e| e.nested("home"))?;
        self.about.validate().map_err(|e| e.nested("about"))?;
        self.contact.validate().map_err(|e| e.nested("contact"))?;
        self.footer.validate().map_err(|e| e.nested("footer"))?;
        self.work.validate().map_err(|e| e.nested("work"))?;
        self.rentals.validate().map_err(|e| e.nested("rentals"))?;
        for project in &self.projects {
            project
                .validate()
                .map_err(|e| e.nested(&format!("projects[{}]", project.id)))?;
        }
        for item in &self.rental_items {
            item.validate()
                .map_err(|e| e.nested(&format!("rentalItems[{}]", item.id)))?;
        }
        Ok(())
    }
}

fn check_as<T>(doc_id: &str, data: &Value) -> Result<(), ValidationError>
where
    T: DeserializeOwned + Validate,
{
    let doc: T = serde_json::from_value(data.clone())
        .map_err(|e| ValidationError::new(doc_id, e.to_string()))?;
    doc.validate().map_err(|e| e.nested(doc_id))
}

/// シングルトン文書をキーに対応するスキーマで検証する
///
/// 管理画面の書き込みパスが使う。未知のキーはエラー。
pub fn validate_site_document(doc_id: &str, data: &Value) -> Result<(), ValidationError> {
    match doc_id {
        site_keys::BRAND => check_as::<BrandDoc>(doc_id, data),
        site_keys::NAVIGATION => check_as::<NavigationDoc>(doc_id, data),
        site_keys::SEO => check_as::<SeoDoc>(doc_id, data),
        site_keys::HOME => check_as::<HomeDoc>(doc_id, data),
        site_keys::ABOUT => check_as::<AboutDoc>(doc_id, data),
        site_keys::CONTACT => check_as::<ContactDoc>(doc_id, data),
        site_keys::FOOTER => check_as::<FooterDoc>(doc_id, data),
        site_keys::WORK => check_as::<WorkSettingsDoc>(doc_id, data),
        site_keys::RENTALS => check_as::<RentalsSettingsDoc>(doc_id, data),
        other => Err(ValidationError::new(other, "unknown site document")),
    }
}
