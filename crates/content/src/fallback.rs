//! Static fallback bundle.
//!
//! The JSON under `data/` is a version-controlled snapshot of the whole
//! content graph. It ships inside the binary, so the site renders complete
//! pages even when the remote store is unreachable or unconfigured.

use crate::schema::SiteContent;
use crate::Result;

const FALLBACK_JSON: &str = include_str!("../data/fallback.json");

/// ビルド時に埋め込まれる静的フォールバックバンドル
pub struct FallbackBundle {
    content: SiteContent,
}

impl FallbackBundle {
    /// 埋め込み JSON からバンドルを読み込む
    pub fn load() -> Result<Self> {
        let content: SiteContent = serde_json::from_str(FALLBACK_JSON)?;
        Ok(Self { content })
    }

    /// 任意のグラフをバンドルとして包む (テスト・ツール用)
    pub fn from_content(content: SiteContent) -> Self {
        Self { content }
    }

    pub fn content(&self) -> &SiteContent {
        &self.content
    }
}
