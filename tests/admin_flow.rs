use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use marquee_cms::config::{BucketSettings, SiteConfig, StoreConfig};
use marquee_cms::error::Error;
use marquee_cms::SiteClient;
use marquee_content::schema::{RentalCategory, ServiceCategory};
use marquee_content::{Project, RentalItem};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCS_ROOT: &str = "/v1/projects/test-project/databases/(default)/documents";
const SNAPSHOT_PATH: &str = "/marquee-assets/site-data.json";

/// 署名なしの管理者トークン。検証器は構造チェックのみなので通る
fn admin_token(email: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&json!({
            "iss": "https://securetoken.google.com/test-project",
            "aud": "test-project",
            "exp": chrono::Utc::now().timestamp() + 3600,
            "email": email,
        }))
        .unwrap(),
    );
    format!("{}.{}.signature", header, claims)
}

fn site_client(store_server: &MockServer, bucket_server: Option<&MockServer>) -> SiteClient {
    let mut config = SiteConfig::default()
        .with_store(StoreConfig {
            project_id: "test-project".to_string(),
            api_key: "test-key".to_string(),
            endpoint: Some(format!("{}/v1", store_server.uri())),
        })
        .with_admin_email_domain("marquee.live");

    if let Some(bucket_server) = bucket_server {
        config = config.with_bucket(BucketSettings {
            account_id: "test-account".to_string(),
            access_key_id: "test-access-key".to_string(),
            secret_access_key: "test-secret".to_string(),
            bucket: "marquee-assets".to_string(),
            public_domain: Some("https://cdn.marquee.live".to_string()),
            endpoint: Some(bucket_server.uri()),
        });
    }

    SiteClient::new(config).unwrap()
}

fn wire_doc(collection: &str, doc_id: &str, plain: Value) -> Value {
    let fields = marquee_firestore::encode_fields(plain.as_object().unwrap());
    json!({
        "name": format!(
            "projects/test-project/databases/(default)/documents/{}/{}",
            collection, doc_id
        ),
        "fields": fields,
    })
}

fn brand_json(email: &str) -> Value {
    json!({
        "companyName": "Marquee Productions",
        "tagline": "Full-service event production",
        "phone": "+1 (503) 555-0175",
        "email": email
    })
}

async fn mount_not_found(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "status": "NOT_FOUND" }
        })))
        .mount(mock_server)
        .await;
}

/// 保存 → 無効化 → 再解決 → スナップショット公開までの一連の流れ
#[tokio::test]
async fn test_admin_save_refreshes_views_and_publishes_snapshot() {
    let store_server = MockServer::start().await;
    let bucket_server = MockServer::start().await;

    // 保存前の brand は 1 回で尽き、以後は保存後の brand が返る
    Mock::given(method("GET"))
        .and(path(format!("{}/site/brand", DOCS_ROOT)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(wire_doc("site", "brand", brand_json("old@marquee.live"))),
        )
        .up_to_n_times(1)
        .mount(&store_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/site/brand", DOCS_ROOT)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(wire_doc("site", "brand", brand_json("updated@marquee.live"))),
        )
        .mount(&store_server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS_ROOT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&store_server)
        .await;
    mount_not_found(&store_server).await;

    Mock::given(method("PUT"))
        .and(path(SNAPSHOT_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&bucket_server)
        .await;

    let client = site_client(&store_server, Some(&bucket_server));

    let before = client.content().shell().await;
    assert_eq!(before.brand.email, "old@marquee.live");

    let outcome = client
        .admin()
        .save_site_documents(
            &admin_token("ops@marquee.live"),
            vec![("brand".to_string(), brand_json("updated@marquee.live"))],
        )
        .await
        .unwrap();
    assert!(outcome.snapshot_published);

    // 保存でビューキャッシュが落ち、新しい brand が見える
    let after = client.content().shell().await;
    assert_eq!(after.brand.email, "updated@marquee.live");

    // スナップショット本文は {generatedAt, siteData} 包み
    let requests = bucket_server.received_requests().await.unwrap();
    let snapshot: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(snapshot["generatedAt"].is_string());
    assert_eq!(snapshot["siteData"]["brand"]["email"], "updated@marquee.live");
}

/// スナップショット書き込みの失敗は保存自体を失敗させない
#[tokio::test]
async fn test_snapshot_failure_does_not_block_saves() {
    let store_server = MockServer::start().await;
    let bucket_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{}:commit", DOCS_ROOT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&store_server)
        .await;
    mount_not_found(&store_server).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage down"))
        .mount(&bucket_server)
        .await;

    let client = site_client(&store_server, Some(&bucket_server));

    let outcome = client
        .admin()
        .save_site_documents(
            &admin_token("ops@marquee.live"),
            vec![("brand".to_string(), brand_json("fresh@marquee.live"))],
        )
        .await
        .unwrap();

    assert!(!outcome.snapshot_published);
}

/// 実績の upsert は PATCH、削除は DELETE。本文には id も入る
#[tokio::test]
async fn test_save_and_delete_project() {
    let store_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/projects/expo-2031", DOCS_ROOT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&store_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/projects/expo-2031", DOCS_ROOT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&store_server)
        .await;
    mount_not_found(&store_server).await;

    // バケット未設定なのでスナップショット公開はされない
    let client = site_client(&store_server, None);
    let token = admin_token("ops@marquee.live");

    let project = Project {
        id: "expo-2031".to_string(),
        title: "Expo 2031".to_string(),
        client: "Pacific Expo Group".to_string(),
        location: "Portland Expo Center".to_string(),
        event_date: "June 2031".to_string(),
        services: vec![ServiceCategory::Lighting, ServiceCategory::Video],
        summary: "Three-day trade expo with keynote stage.".to_string(),
        description: String::new(),
        hero_image: "https://cdn.marquee.live/uploads/projects/expo.jpg".to_string(),
        gallery: vec![],
        featured: false,
        order: 4,
    };
    let outcome = client.admin().save_project(&token, project).await.unwrap();
    assert!(!outcome.snapshot_published);

    // 最初のリクエストが PATCH。本文は型付きワイヤ値
    let requests = store_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["fields"]["id"]["stringValue"], "expo-2031");
    assert_eq!(body["fields"]["title"]["stringValue"], "Expo 2031");
    assert_eq!(body["fields"]["order"]["integerValue"], "4");

    client
        .admin()
        .delete_project(&token, "expo-2031")
        .await
        .unwrap();
}

/// 無効な機材はストアに届く前に弾かれる
#[tokio::test]
async fn test_invalid_rental_never_reaches_the_store() {
    let store_server = MockServer::start().await;
    let client = site_client(&store_server, None);

    let rental = RentalItem {
        id: "fog-1200".to_string(),
        name: "FogStorm 1200".to_string(),
        category: RentalCategory::Effects,
        brand: String::new(),
        daily_rate: None,
        description: "High-output fog machine.".to_string(),
        specs: vec![],
        related_ids: vec![],
        image: "   ".to_string(),
        available: true,
        order: 9,
    };

    let err = client
        .admin()
        .save_rental(&admin_token("ops@marquee.live"), rental)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert!(store_server.received_requests().await.unwrap().is_empty());
}
