//! Firestore REST adapter for the Marquee content platform
//!
//! This crate provides read and write access to the document store backing
//! the site content, speaking the REST wire format directly.
//!
//! # Features
//!
//! - Single-document reads (`get_document`)
//! - Paginated collection listing (`list_collection`)
//! - Document upsert and delete
//! - Atomic multi-document commits
//! - Tagged-value wire codec (`value` module)
//! - Resilient read wrappers that degrade to `None` instead of failing

use log::warn;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

pub mod value;

pub use value::{
    decode_fields, decode_value, encode_fields, encode_value, DecodeError, WireValue,
};

/// 既定の REST エンドポイント
pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

/// サイト設定のシングルトン文書が入るコレクション
pub const SITE_COLLECTION: &str = "site";

/// エラー型
#[derive(Error, Debug)]
pub enum FirestoreError {
    #[error("API error: {message} (Status: {status})")]
    ApiError {
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Value decode error: {0}")]
    DecodeError(#[from] value::DecodeError),
}

pub type Result<T> = std::result::Result<T, FirestoreError>;

/// 取得済みドキュメント (ID と展開済みフィールド)
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub id: String,
    pub fields: Map<String, Value>,
}

/// コミット一括書き込みの 1 要素
#[derive(Debug, Clone)]
pub enum DocumentWrite {
    /// ドキュメント全体を upsert する
    Set {
        collection: String,
        doc_id: String,
        data: Map<String, Value>,
    },
    /// ドキュメントを削除する
    Delete { collection: String, doc_id: String },
}

/// ワイヤ上のドキュメント表現
#[derive(Deserialize, Debug)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: HashMap<String, WireValue>,
}

/// コレクション一覧レスポンス。空ページでは documents キーが省略される
#[derive(Deserialize, Debug)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

fn record_from_wire(document: WireDocument) -> Result<DocumentRecord> {
    let id = document
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    let fields = value::decode_fields(&document.fields)?;
    Ok(DocumentRecord { id, fields })
}

/// Firestore クライアント
pub struct FirestoreClient {
    base_url: String,
    project_id: String,
    api_key: String,
    http_client: Client,
}

impl FirestoreClient {
    /// 新しい Firestore クライアントを作成
    ///
    /// # 引数
    ///
    /// * `base_url` - REST エンドポイント (通常は [`DEFAULT_ENDPOINT`])
    /// * `project_id` - Firebase プロジェクト ID
    /// * `api_key` - Web API キー (クエリパラメータ `key` として送られる)
    /// * `http_client` - 再利用する reqwest クライアント
    pub fn new(base_url: &str, project_id: &str, api_key: &str, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            api_key: api_key.to_string(),
            http_client,
        }
    }

    /// `projects/{p}/databases/(default)/documents` までのリソースパス
    fn documents_root(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    /// ドキュメントの完全なリソース名 (コミット書き込みでも使う)
    fn document_name(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/{}", self.documents_root(), collection, doc_id)
    }

    /// API キーを付与した絶対 URL を組み立てる
    fn resource_url(&self, resource_path: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, resource_path))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// 単一ドキュメントを取得する。存在しなければ `Ok(None)`
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<Option<DocumentRecord>> {
        let url = self.resource_url(&self.document_name(collection, doc_id))?;
        let response = self.http_client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(FirestoreError::ApiError {
                message: error_text,
                status,
            });
        }

        let document: WireDocument = response.json().await?;
        Ok(Some(record_from_wire(document)?))
    }

    /// コレクションの全ドキュメントを取得する
    ///
    /// 100 件ずつページングし、`nextPageToken` が尽きるまで辿る。
    pub async fn list_collection(&self, collection: &str) -> Result<Vec<DocumentRecord>> {
        let resource_path = format!("{}/{}", self.documents_root(), collection);
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.resource_url(&resource_path)?;
            url.query_pairs_mut().append_pair("pageSize", "100");
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let response = self.http_client.get(url).send().await?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response.text().await?;
                return Err(FirestoreError::ApiError {
                    message: error_text,
                    status,
                });
            }

            let page: ListResponse = response.json().await?;
            for document in page.documents {
                records.push(record_from_wire(document)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(records)
    }

    /// ドキュメントを upsert する (PATCH、ドキュメント全体を置き換え)
    pub async fn set_document(
        &self,
        collection: &str,
        doc_id: &str,
        data: &Map<String, Value>,
    ) -> Result<()> {
        let url = self.resource_url(&self.document_name(collection, doc_id))?;
        let body = json!({ "fields": value::encode_fields(data) });

        let response = self.http_client.patch(url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(FirestoreError::ApiError {
                message: error_text,
                status,
            });
        }

        Ok(())
    }

    /// ドキュメントを削除する。既に存在しない場合も成功扱い
    pub async fn delete_document(&self, collection: &str, doc_id: &str) -> Result<()> {
        let url = self.resource_url(&self.document_name(collection, doc_id))?;
        let response = self.http_client.delete(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(FirestoreError::ApiError {
                message: error_text,
                status,
            });
        }

        Ok(())
    }

    /// 複数ドキュメントを 1 リクエストでアトミックに書き込む
    ///
    /// すべての書き込みが成功するか、すべて失敗するかのどちらかになる。
    pub async fn commit(&self, writes: &[DocumentWrite]) -> Result<()> {
        let mut wire_writes = Vec::with_capacity(writes.len());
        for write in writes {
            let entry = match write {
                DocumentWrite::Set {
                    collection,
                    doc_id,
                    data,
                } => json!({
                    "update": {
                        "name": self.document_name(collection, doc_id),
                        "fields": value::encode_fields(data),
                    }
                }),
                DocumentWrite::Delete { collection, doc_id } => json!({
                    "delete": self.document_name(collection, doc_id),
                }),
            };
            wire_writes.push(entry);
        }

        let url = self.resource_url(&format!("{}:commit", self.documents_root()))?;
        let body = json!({ "writes": wire_writes });

        let response = self.http_client.post(url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(FirestoreError::ApiError {
                message: error_text,
                status,
            });
        }

        Ok(())
    }

    /// サイト設定のシングルトン文書を取得する
    ///
    /// 読み取り側の境界。未設定・障害・不在をすべて `None` に畳み、
    /// 呼び出し側のフォールバック解決に委ねる。
    pub async fn fetch_site_doc(&self, doc_id: &str) -> Option<Map<String, Value>> {
        match self.get_document(SITE_COLLECTION, doc_id).await {
            Ok(Some(record)) => Some(record.fields),
            Ok(None) => None,
            Err(error) => {
                warn!("failed to fetch site document {}: {}", doc_id, error);
                None
            }
        }
    }

    /// コレクション全件を取得する。障害時は `None`
    pub async fn fetch_collection(&self, collection: &str) -> Option<Vec<DocumentRecord>> {
        match self.list_collection(collection).await {
            Ok(records) => Some(records),
            Err(error) => {
                warn!("failed to list collection {}: {}", collection, error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(mock_server: &MockServer) -> FirestoreClient {
        FirestoreClient::new(
            &format!("{}/v1", mock_server.uri()),
            "test-project",
            "test-key",
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn test_get_document() {
        let mock_server = MockServer::start().await;

        // 単一ドキュメント取得のモック
        Mock::given(method("GET"))
            .and(path(
                "/v1/projects/test-project/databases/(default)/documents/site/brand",
            ))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/test-project/databases/(default)/documents/site/brand",
                "fields": {
                    "companyName": { "stringValue": "Marquee Productions" },
                    "established": { "integerValue": "2009" }
                }
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let record = client.get_document("site", "brand").await.unwrap().unwrap();

        assert_eq!(record.id, "brand");
        assert_eq!(record.fields["companyName"], json!("Marquee Productions"));
        assert_eq!(record.fields["established"], json!(2009));
    }

    #[tokio::test]
    async fn test_get_document_not_found_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "status": "NOT_FOUND" }
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let record = client.get_document("site", "missing").await.unwrap();

        // 404 はエラーではなく不在
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_server_error_surfaces_on_raw_read_but_not_on_fetch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);

        // 低レベル API はエラーを返す
        let result = client.get_document("site", "brand").await;
        assert!(matches!(
            result,
            Err(FirestoreError::ApiError { ref message, .. }) if message == "backend exploded"
        ));

        // 境界 API は None に畳む
        assert!(client.fetch_site_doc("brand").await.is_none());
        assert!(client.fetch_collection("projects").await.is_none());
    }

    #[tokio::test]
    async fn test_list_collection_follows_page_tokens() {
        let mock_server = MockServer::start().await;
        let collection_path = "/v1/projects/test-project/databases/(default)/documents/projects";

        // より特異なモック (pageToken 付き) を先にマウントする
        Mock::given(method("GET"))
            .and(path(collection_path))
            .and(query_param("pageToken", "cursor-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [{
                    "name": "projects/test-project/databases/(default)/documents/projects/gala-night",
                    "fields": { "title": { "stringValue": "Gala Night" } }
                }]
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path(collection_path))
            .and(query_param("pageSize", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [{
                    "name": "projects/test-project/databases/(default)/documents/projects/summer-fest",
                    "fields": { "title": { "stringValue": "Summer Fest" } }
                }],
                "nextPageToken": "cursor-1"
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let records = client.list_collection("projects").await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "summer-fest");
        assert_eq!(records[1].id, "gala-night");
    }

    #[tokio::test]
    async fn test_list_collection_empty_page() {
        let mock_server = MockServer::start().await;

        // 空コレクションでは documents キーごと省略される
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let records = client.list_collection("rentals").await.unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_set_document_sends_tagged_fields() {
        let mock_server = MockServer::start().await;

        let expected_body = json!({
            "fields": {
                "companyName": { "stringValue": "Marquee Productions" },
                "order": { "integerValue": "1" }
            }
        });

        Mock::given(method("PATCH"))
            .and(path(
                "/v1/projects/test-project/databases/(default)/documents/site/brand",
            ))
            .and(body_json(&expected_body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/test-project/databases/(default)/documents/site/brand"
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let data = json!({ "companyName": "Marquee Productions", "order": 1 });
        let result = client
            .set_document("site", "brand", data.as_object().unwrap())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_document_tolerates_missing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "status": "NOT_FOUND" }
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let result = client.delete_document("projects", "already-gone").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_commit_batches_updates_and_deletes() {
        let mock_server = MockServer::start().await;

        let expected_body = json!({
            "writes": [
                {
                    "update": {
                        "name": "projects/test-project/databases/(default)/documents/site/brand",
                        "fields": { "companyName": { "stringValue": "Marquee" } }
                    }
                },
                {
                    "delete": "projects/test-project/databases/(default)/documents/projects/old-show"
                }
            ]
        });

        Mock::given(method("POST"))
            .and(path(
                "/v1/projects/test-project/databases/(default)/documents:commit",
            ))
            .and(query_param("key", "test-key"))
            .and(body_json(&expected_body))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "commitTime": "2024-06-01T00:00:00Z"
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let brand = json!({ "companyName": "Marquee" });
        let writes = vec![
            DocumentWrite::Set {
                collection: "site".to_string(),
                doc_id: "brand".to_string(),
                data: brand.as_object().unwrap().clone(),
            },
            DocumentWrite::Delete {
                collection: "projects".to_string(),
                doc_id: "old-show".to_string(),
            },
        ];

        let result = client.commit(&writes).await;
        assert!(result.is_ok());
    }
}
