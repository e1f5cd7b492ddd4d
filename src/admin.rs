//! Token-gated write operations for the admin panel
//!
//! Every write validates before it touches the store, and every
//! successful write runs the same post-save pipeline: drop the cached
//! content slices, resolve the graph fresh, publish the snapshot. The
//! snapshot step is best-effort; its failure is reported in the outcome
//! instead of failing the save.

use log::error;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use marquee_auth::AdminVerifier;
use marquee_content::{
    validate_site_document, ContentResolver, Project, RentalItem, SnapshotPublisher, Validate,
    PROJECTS_COLLECTION, RENTALS_COLLECTION,
};
use marquee_firestore::{DocumentWrite, FirestoreClient, SITE_COLLECTION};

use crate::error::Error;

/// Result of a successful save
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    /// Whether the post-save snapshot publish went through
    pub snapshot_published: bool,
}

/// Admin write surface, wired by [`crate::SiteClient`]
pub struct AdminPanel {
    store: Option<FirestoreClient>,
    verifier: Option<AdminVerifier>,
    resolver: Arc<ContentResolver>,
    publisher: Option<SnapshotPublisher>,
}

impl AdminPanel {
    /// Create a new AdminPanel
    pub(crate) fn new(
        store: Option<FirestoreClient>,
        verifier: Option<AdminVerifier>,
        resolver: Arc<ContentResolver>,
        publisher: Option<SnapshotPublisher>,
    ) -> Self {
        Self {
            store,
            verifier,
            resolver,
            publisher,
        }
    }

    fn verify(&self, token: &str) -> Result<(), Error> {
        let verifier = self
            .verifier
            .as_ref()
            .ok_or_else(|| Error::unavailable("admin authentication is not configured"))?;
        verifier.verify(token)?;
        Ok(())
    }

    fn store(&self) -> Result<&FirestoreClient, Error> {
        self.store
            .as_ref()
            .ok_or_else(|| Error::unavailable("document store is not configured"))
    }

    /// Validate and write a batch of site documents in one atomic commit
    pub async fn save_site_documents(
        &self,
        token: &str,
        documents: Vec<(String, Value)>,
    ) -> Result<SaveOutcome, Error> {
        self.verify(token)?;
        let store = self.store()?;

        let mut writes = Vec::with_capacity(documents.len());
        for (doc_id, data) in documents {
            validate_site_document(&doc_id, &data)?;
            let data = into_fields(data)?;
            writes.push(DocumentWrite::Set {
                collection: SITE_COLLECTION.to_string(),
                doc_id,
                data,
            });
        }
        store.commit(&writes).await?;

        Ok(self.after_write().await)
    }

    /// Create or update a single project
    pub async fn save_project(&self, token: &str, project: Project) -> Result<SaveOutcome, Error> {
        self.verify(token)?;
        let store = self.store()?;
        project.validate()?;

        let data = into_fields(serde_json::to_value(&project)?)?;
        store
            .set_document(PROJECTS_COLLECTION, &project.id, &data)
            .await?;

        Ok(self.after_write().await)
    }

    /// Delete a project
    pub async fn delete_project(&self, token: &str, project_id: &str) -> Result<SaveOutcome, Error> {
        self.verify(token)?;
        let store = self.store()?;
        store.delete_document(PROJECTS_COLLECTION, project_id).await?;

        Ok(self.after_write().await)
    }

    /// Create or update a single rental item
    pub async fn save_rental(&self, token: &str, rental: RentalItem) -> Result<SaveOutcome, Error> {
        self.verify(token)?;
        let store = self.store()?;
        rental.validate()?;

        let data = into_fields(serde_json::to_value(&rental)?)?;
        store
            .set_document(RENTALS_COLLECTION, &rental.id, &data)
            .await?;

        Ok(self.after_write().await)
    }

    /// Delete a rental item
    pub async fn delete_rental(&self, token: &str, rental_id: &str) -> Result<SaveOutcome, Error> {
        self.verify(token)?;
        let store = self.store()?;
        store.delete_document(RENTALS_COLLECTION, rental_id).await?;

        Ok(self.after_write().await)
    }

    /// Post-save pipeline: invalidate, resolve fresh, publish
    async fn after_write(&self) -> SaveOutcome {
        self.resolver.invalidate().await;

        let content = self.resolver.resolve_site_content().await;

        let snapshot_published = match &self.publisher {
            Some(publisher) => match publisher.publish(&content).await {
                Ok(()) => true,
                Err(err) => {
                    error!("snapshot publish failed: {}", err);
                    false
                }
            },
            None => false,
        };

        SaveOutcome { snapshot_published }
    }
}

/// Documents are stored as objects; anything else is a caller bug
fn into_fields(data: Value) -> Result<Map<String, Value>, Error> {
    match data {
        Value::Object(map) => Ok(map),
        _ => Err(Error::validation("document body must be a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use chrono::Utc;
    use marquee_content::FallbackBundle;
    use serde_json::json;
    use wiremock::MockServer;

    fn admin_token(email: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(json!({"alg": "RS256", "typ": "JWT"}).to_string());
        let payload = URL_SAFE_NO_PAD.encode(
            json!({
                "iss": "https://securetoken.google.com/marquee-prod",
                "aud": "marquee-prod",
                "exp": Utc::now().timestamp() + 3600,
                "email": email,
            })
            .to_string(),
        );
        format!("{}.{}.sig", header, payload)
    }

    fn resolver() -> Arc<ContentResolver> {
        Arc::new(ContentResolver::new(None, FallbackBundle::load().unwrap()))
    }

    fn verifier() -> AdminVerifier {
        AdminVerifier::new("marquee-prod", "marquee.live")
    }

    #[tokio::test]
    async fn test_unconfigured_store_is_unavailable() {
        let panel = AdminPanel::new(None, Some(verifier()), resolver(), None);

        let result = panel
            .save_site_documents(
                &admin_token("ana@marquee.live"),
                vec![("brand".to_string(), json!({}))],
            )
            .await;

        assert!(matches!(result, Err(Error::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_rejects_foreign_token_before_touching_store() {
        let mock_server = MockServer::start().await;
        let store = FirestoreClient::new(
            &format!("{}/v1", mock_server.uri()),
            "marquee-prod",
            "key",
            reqwest::Client::new(),
        );
        let panel = AdminPanel::new(Some(store), Some(verifier()), resolver(), None);

        let result = panel
            .save_site_documents(
                &admin_token("intruder@elsewhere.com"),
                vec![("brand".to_string(), json!({}))],
            )
            .await;

        assert!(matches!(result, Err(Error::Unauthorized)));
        // ストアへのリクエストは一切発生しない
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_document_stops_before_commit() {
        let mock_server = MockServer::start().await;
        let store = FirestoreClient::new(
            &format!("{}/v1", mock_server.uri()),
            "marquee-prod",
            "key",
            reqwest::Client::new(),
        );
        let panel = AdminPanel::new(Some(store), Some(verifier()), resolver(), None);

        let bad_brand = json!({
            "companyName": "Marquee Productions",
            "tagline": "Full-service event production",
            "phone": "+1 (503) 555-0175",
            "email": "not-an-email",
            "addressLines": ["2400 NW Vaughn St", "Portland, OR 97210"]
        });
        let result = panel
            .save_site_documents(
                &admin_token("ana@marquee.live"),
                vec![("brand".to_string(), bad_brand)],
            )
            .await;

        match result {
            Err(Error::Validation(msg)) => assert!(msg.contains("email")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }
}
