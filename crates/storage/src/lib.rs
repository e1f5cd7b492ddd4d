//! S3-compatible object storage client for the Marquee media pipeline
//!
//! This crate talks to an S3-compatible bucket (Cloudflare R2 in production)
//! over plain HTTP with Signature V4 request signing, using path-style
//! addressing. No vendor SDK.
//!
//! # Features
//!
//! - Header-signed object PUT / GET / DELETE
//! - Query-presigned PUT URLs for browser-direct uploads
//! - Public URL mapping onto a custom CDN domain

use bytes::Bytes;
use chrono::Utc;
use log::debug;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub mod sign;

/// 結果型
pub type Result<T> = std::result::Result<T, StorageError>;

/// エラー型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("API error: {message} (Status: {status})")]
    ApiError {
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Signing error: {0}")]
    SignError(String),
}

/// presign の既定有効期間 (秒)
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 300;

/// バケット接続設定
#[derive(Debug, Clone)]
pub struct BucketConfig {
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub public_base_url: Option<String>,
}

impl BucketConfig {
    /// エンドポイント直指定で設定を作成。リージョンの既定は R2 の "auto"
    pub fn new(endpoint: &str, bucket: &str, access_key_id: &str, secret_access_key: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            region: "auto".to_string(),
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            public_base_url: None,
        }
    }

    /// R2 アカウント ID からエンドポイントを組み立てる
    pub fn for_account(
        account_id: &str,
        bucket: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Self {
        Self::new(
            &format!("https://{}.r2.cloudflarestorage.com", account_id),
            bucket,
            access_key_id,
            secret_access_key,
        )
    }

    /// リージョンを設定
    pub fn with_region(mut self, region: &str) -> Self {
        self.region = region.to_string();
        self
    }

    /// 公開 URL のベース (カスタムドメイン) を設定
    pub fn with_public_base_url(mut self, public_base_url: &str) -> Self {
        self.public_base_url = Some(public_base_url.trim_end_matches('/').to_string());
        self
    }
}

/// アップロードオプション
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub cache_control: Option<String>,
    pub content_type: Option<String>,
}

impl PutOptions {
    /// 新しいアップロードオプションを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// キャッシュコントロールを設定
    pub fn with_cache_control(mut self, cache_control: &str) -> Self {
        self.cache_control = Some(cache_control.to_string());
        self
    }

    /// コンテンツタイプを設定
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }
}

/// バケットクライアント
pub struct BucketClient {
    config: BucketConfig,
    http_client: Client,
}

impl BucketClient {
    /// 新しいバケットクライアントを作成
    ///
    /// # 引数
    ///
    /// * `config` - バケット接続設定
    /// * `http_client` - 再利用する reqwest クライアント
    pub fn new(config: BucketConfig, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// パス形式のオブジェクトパス (`/{bucket}/{key}`)
    fn object_path(&self, key: &str) -> String {
        format!("/{}/{}", self.config.bucket, key)
    }

    fn object_url(&self, key: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}{}",
            self.config.endpoint,
            self.object_path(key)
        ))?)
    }

    /// 署名に使う Host 値 (非標準ポートはポート付き)
    fn host(&self) -> Result<String> {
        let url = Url::parse(&self.config.endpoint)?;
        let host = url
            .host_str()
            .ok_or_else(|| StorageError::SignError("endpoint has no host".to_string()))?;
        Ok(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    fn credentials(&self) -> sign::Credentials<'_> {
        sign::Credentials {
            access_key_id: &self.config.access_key_id,
            secret_access_key: &self.config.secret_access_key,
            region: &self.config.region,
        }
    }

    /// オブジェクトをアップロード
    pub async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        options: Option<PutOptions>,
    ) -> Result<()> {
        let options = options.unwrap_or_default();
        let now = Utc::now();
        let amz_date = sign::amz_date(&now);
        let payload_hash = sign::sha256_hex(&data);
        let path = self.object_path(key);
        let size = data.len();

        let mut headers: Vec<(String, String)> = vec![
            ("host".to_string(), self.host()?),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(cache_control) = &options.cache_control {
            headers.push(("cache-control".to_string(), cache_control.clone()));
        }
        if let Some(content_type) = &options.content_type {
            headers.push(("content-type".to_string(), content_type.clone()));
        }

        let authorization =
            sign::sign_headers(&self.credentials(), "PUT", &path, &headers, &payload_hash, &now)?;

        let mut request = self
            .http_client
            .put(self.object_url(key)?)
            .header("authorization", authorization)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date);
        if let Some(cache_control) = &options.cache_control {
            request = request.header("cache-control", cache_control);
        }
        if let Some(content_type) = &options.content_type {
            request = request.header("content-type", content_type);
        }

        let response = request.body(data).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(StorageError::ApiError {
                message: error_text,
                status,
            });
        }

        debug!("put object {} ({} bytes)", key, size);
        Ok(())
    }

    /// オブジェクトを取得
    pub async fn get_object(&self, key: &str) -> Result<Bytes> {
        let now = Utc::now();
        let amz_date = sign::amz_date(&now);
        let payload_hash = sign::sha256_hex(b"");
        let path = self.object_path(key);

        let headers = vec![
            ("host".to_string(), self.host()?),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        let authorization =
            sign::sign_headers(&self.credentials(), "GET", &path, &headers, &payload_hash, &now)?;

        let response = self
            .http_client
            .get(self.object_url(key)?)
            .header("authorization", authorization)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(StorageError::ApiError {
                message: error_text,
                status,
            });
        }

        Ok(response.bytes().await?)
    }

    /// オブジェクトを削除
    pub async fn delete_object(&self, key: &str) -> Result<()> {
        let now = Utc::now();
        let amz_date = sign::amz_date(&now);
        let payload_hash = sign::sha256_hex(b"");
        let path = self.object_path(key);

        let headers = vec![
            ("host".to_string(), self.host()?),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        let authorization = sign::sign_headers(
            &self.credentials(),
            "DELETE",
            &path,
            &headers,
            &payload_hash,
            &now,
        )?;

        let response = self
            .http_client
            .delete(self.object_url(key)?)
            .header("authorization", authorization)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(StorageError::ApiError {
                message: error_text,
                status,
            });
        }

        Ok(())
    }

    /// ブラウザ直アップロード用の presigned PUT URL を発行する
    ///
    /// ペイロードは UNSIGNED。`content_type` を渡すと署名対象になり、
    /// アップロード側は同じ `Content-Type` ヘッダを送る義務を負う。
    pub fn presign_put(
        &self,
        key: &str,
        content_type: Option<&str>,
        expires_in: Duration,
    ) -> Result<Url> {
        let now = Utc::now();
        let path = self.object_path(key);
        let extra_headers: Vec<(String, String)> = content_type
            .map(|ct| vec![("content-type".to_string(), ct.to_string())])
            .unwrap_or_default();

        let query = sign::presign_query(
            &self.credentials(),
            "PUT",
            &path,
            &self.host()?,
            &extra_headers,
            expires_in.as_secs(),
            &now,
        )?;

        Ok(Url::parse(&format!(
            "{}{}?{}",
            self.config.endpoint, path, query
        ))?)
    }

    /// 公開 URL。カスタムドメイン未設定時はエンドポイント直 URL
    pub fn public_url(&self, key: &str) -> String {
        match &self.config.public_base_url {
            Some(base) => format!("{}/{}", base, key),
            None => format!("{}{}", self.config.endpoint, self.object_path(key)),
        }
    }
}
