//! Media URL decorations.
//!
//! Stored media URLs can carry a focal point as a `#fp=x,y` fragment so the
//! front end knows how to crop, and freshly provisioned buckets hand out a
//! placeholder public domain that must never reach a rendered page.

use serde::{Deserialize, Serialize};

/// 未設定の公開ドメインに含まれるプレースホルダ
pub const PLACEHOLDER_DOMAIN_MARKER: &str = "pub-XXXX";

/// 画像の注視点。百分率 (0–100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalPoint {
    pub x: f64,
    pub y: f64,
}

impl FocalPoint {
    /// 中央 (既定値)
    pub const CENTER: FocalPoint = FocalPoint { x: 50.0, y: 50.0 };

    /// CSS の `object-position` 値 ("30% 70%" 形式)
    pub fn object_position(&self) -> String {
        format!("{}% {}%", self.x, self.y)
    }
}

impl Default for FocalPoint {
    fn default() -> Self {
        FocalPoint::CENTER
    }
}

/// URL に注視点フラグメントを付与する
///
/// 既存のフラグメントは置き換える。中央指定はフラグメントなしに正規化される
/// ので、既定値の付与は何度やっても URL を変えない。
pub fn with_focal_point(url: &str, focal_point: FocalPoint) -> String {
    let base = url.split('#').next().unwrap_or(url);
    if focal_point == FocalPoint::CENTER {
        return base.to_string();
    }
    format!("{}#fp={},{}", base, focal_point.x, focal_point.y)
}

/// URL を基底部分と注視点に分解する
///
/// フラグメントが無い、または `fp=x,y` として読めない場合は `None`。
pub fn parse_media_url(url: &str) -> (String, Option<FocalPoint>) {
    match url.split_once('#') {
        Some((base, fragment)) => (base.to_string(), parse_fragment(fragment)),
        None => (url.to_string(), None),
    }
}

fn parse_fragment(fragment: &str) -> Option<FocalPoint> {
    let coords = fragment.strip_prefix("fp=")?;
    let (x_raw, y_raw) = coords.split_once(',')?;
    let x: f64 = x_raw.parse().ok()?;
    let y: f64 = y_raw.parse().ok()?;
    Some(FocalPoint { x, y })
}

/// 公開済みメディア URL かどうか
///
/// 空文字列と、プレースホルダドメインを含む URL は未公開扱い。
pub fn is_published_media_url(url: &str) -> bool {
    !url.is_empty() && !url.contains(PLACEHOLDER_DOMAIN_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focal_point_round_trips_through_fragment() {
        let url = "https://cdn.marquee.live/projects/gala/hero.jpg";
        let decorated = with_focal_point(url, FocalPoint { x: 30.0, y: 70.0 });

        assert_eq!(decorated, format!("{}#fp=30,70", url));

        let (base, focal_point) = parse_media_url(&decorated);
        assert_eq!(base, url);
        assert_eq!(focal_point, Some(FocalPoint { x: 30.0, y: 70.0 }));
    }

    #[test]
    fn centered_focal_point_adds_no_fragment() {
        let url = "https://cdn.marquee.live/hero.jpg";

        assert_eq!(with_focal_point(url, FocalPoint::CENTER), url);

        // 既にフラグメントが付いていても中央指定で剥がれる
        let reset = with_focal_point("https://cdn.marquee.live/hero.jpg#fp=10,20", FocalPoint::CENTER);
        assert_eq!(reset, url);
    }

    #[test]
    fn reapplying_replaces_existing_fragment() {
        let once = with_focal_point("https://cdn.marquee.live/a.jpg", FocalPoint { x: 10.0, y: 20.0 });
        let twice = with_focal_point(&once, FocalPoint { x: 80.0, y: 40.0 });

        assert_eq!(twice, "https://cdn.marquee.live/a.jpg#fp=80,40");
    }

    #[test]
    fn fractional_coordinates_survive() {
        let decorated = with_focal_point("https://cdn.marquee.live/a.jpg", FocalPoint { x: 33.5, y: 66.5 });
        let (_, focal_point) = parse_media_url(&decorated);

        assert_eq!(focal_point, Some(FocalPoint { x: 33.5, y: 66.5 }));
    }

    #[test]
    fn malformed_fragments_parse_as_none() {
        for url in [
            "https://cdn.marquee.live/a.jpg",
            "https://cdn.marquee.live/a.jpg#section-2",
            "https://cdn.marquee.live/a.jpg#fp=",
            "https://cdn.marquee.live/a.jpg#fp=30",
            "https://cdn.marquee.live/a.jpg#fp=x,y",
        ] {
            let (_, focal_point) = parse_media_url(url);
            assert_eq!(focal_point, None, "expected no focal point for {}", url);
        }
    }

    #[test]
    fn object_position_formats_percentages() {
        assert_eq!(FocalPoint { x: 30.0, y: 70.0 }.object_position(), "30% 70%");
        assert_eq!(FocalPoint::CENTER.object_position(), "50% 50%");
    }

    #[test]
    fn placeholder_urls_are_not_published() {
        assert!(!is_published_media_url(""));
        assert!(!is_published_media_url(
            "https://pub-XXXXXXXXXXXX.r2.dev/uploads/hero.jpg"
        ));
        assert!(is_published_media_url(
            "https://cdn.marquee.live/uploads/hero.jpg"
        ));
    }
}
