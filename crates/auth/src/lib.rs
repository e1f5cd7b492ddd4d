//! Admin token verification for the Marquee CMS
//!
//! Every write path in the CMS is gated on a Firebase-issued ID token.
//! This crate checks the token structurally: issuer, audience, expiry,
//! and that the account email belongs to the staff domain. Signature
//! verification stays with the identity platform that minted the token;
//! the backend never holds the signing keys.
//!
//! # Features
//!
//! - Issuer / audience / expiry validation via `jsonwebtoken`
//! - Staff email-domain allow-listing (case-insensitive)
//! - A single opaque rejection: callers only ever see `Unauthorized`

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::debug;
use serde::Deserialize;
use thiserror::Error;

/// 結果型
pub type Result<T> = std::result::Result<T, AuthError>;

/// エラー型
///
/// 拒否理由は意図的に一種類へ畳む。詳細は debug ログにのみ残す。
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("unauthorized")]
    Unauthorized,
}

/// 検証済みトークンのクレーム
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdminClaims {
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// 管理者トークンの検証器
pub struct AdminVerifier {
    allowed_email_domain: String,
    validation: Validation,
}

impl AdminVerifier {
    /// 新しい検証器を作成
    ///
    /// # 引数
    ///
    /// * `project_id` - Firebase プロジェクト ID (audience と issuer の両方を決める)
    /// * `allowed_email_domain` - 許可する社用メールドメイン (先頭の `@` は付けても付けなくてもよい)
    pub fn new(project_id: &str, allowed_email_domain: &str) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            project_id
        )]);
        validation.set_audience(&[project_id]);

        Self {
            allowed_email_domain: allowed_email_domain
                .trim_start_matches('@')
                .to_ascii_lowercase(),
            validation,
        }
    }

    /// トークンを検証してクレームを返す
    ///
    /// `Authorization` ヘッダ値そのもの (`Bearer ...`) と生トークンの
    /// どちらも受け付ける。失敗はすべて `AuthError::Unauthorized`。
    pub fn verify(&self, bearer_token: &str) -> Result<AdminClaims> {
        let token = bearer_token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);

        let decoded = decode::<AdminClaims>(token, &DecodingKey::from_secret(&[]), &self.validation)
            .map_err(|err| {
                debug!("admin token rejected: {}", err);
                AuthError::Unauthorized
            })?;

        let claims = decoded.claims;
        let suffix = format!("@{}", self.allowed_email_domain);
        if !claims.email.to_ascii_lowercase().ends_with(&suffix) {
            debug!("admin token rejected: email outside staff domain");
            return Err(AuthError::Unauthorized);
        }

        Ok(claims)
    }
}
