//! HTTP-backed [`DocumentStore`] talking to the content-management API.
//!
//! Document trees live under `/documents/{id}`; the keep operation is a
//! bare POST against `/documents/{id}/keep`. Every request carries a bearer
//! token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use manualmirror_shared::{DocumentId, MirrorError, Result};

use crate::store::{DocumentPayload, DocumentStore, StoredDocument};

/// User-Agent string for store requests.
const USER_AGENT: &str = concat!("manualmirror/", env!("CARGO_PKG_VERSION"));

/// Reqwest-backed document store client.
#[derive(Debug)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpStore {
    /// Build a store client for the given API base URL and bearer token.
    pub fn new(api_url: &str, token: impl Into<String>) -> Result<Self> {
        // Parse once to fail fast on malformed config.
        Url::parse(api_url)
            .map_err(|e| MirrorError::validation(format!("invalid api_url '{api_url}': {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MirrorError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: api_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn document_url(&self, id: &DocumentId) -> String {
        format!("{}/documents/{id}", self.base_url)
    }

    async fn expect_success(
        response: reqwest::Response,
        action: &str,
    ) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(MirrorError::Sync(format!("{action}: HTTP {status}")))
        }
    }
}

/// Create-request body: the payload plus an optional parent.
#[derive(Serialize)]
struct CreateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<&'a DocumentId>,
    #[serde(flatten)]
    document: &'a DocumentPayload,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: DocumentId,
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn fetch_document(&self, id: &DocumentId) -> Result<Option<StoredDocument>> {
        let url = format!("{}?include=tree", self.document_url(id));
        debug!(%id, "fetching persisted document tree");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| MirrorError::Network(format!("fetch {id}: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::expect_success(response, &format!("fetch {id}")).await?;
        let doc = response
            .json::<StoredDocument>()
            .await
            .map_err(|e| MirrorError::Sync(format!("fetch {id}: malformed response: {e}")))?;
        Ok(Some(doc))
    }

    async fn keep_document(&self, id: &DocumentId) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/keep", self.document_url(id)))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| MirrorError::Network(format!("keep {id}: {e}")))?;

        Self::expect_success(response, &format!("keep {id}")).await?;
        Ok(())
    }

    async fn update_document(&self, id: &DocumentId, doc: &DocumentPayload) -> Result<()> {
        let response = self
            .client
            .put(self.document_url(id))
            .bearer_auth(&self.token)
            .json(doc)
            .send()
            .await
            .map_err(|e| MirrorError::Network(format!("update {id}: {e}")))?;

        Self::expect_success(response, &format!("update {id}")).await?;
        Ok(())
    }

    async fn create_document(
        &self,
        parent: Option<&DocumentId>,
        doc: &DocumentPayload,
    ) -> Result<DocumentId> {
        let body = CreateRequest {
            parent_id: parent,
            document: doc,
        };

        let response = self
            .client
            .post(format!("{}/documents", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| MirrorError::Network(format!("create '{}': {e}", doc.sync_key)))?;

        let response =
            Self::expect_success(response, &format!("create '{}'", doc.sync_key)).await?;
        let created = response.json::<CreateResponse>().await.map_err(|e| {
            MirrorError::Sync(format!("create '{}': malformed response: {e}", doc.sync_key))
        })?;
        Ok(created.id)
    }

    async fn remove_document(&self, id: &DocumentId) -> Result<()> {
        let response = self
            .client
            .delete(self.document_url(id))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| MirrorError::Network(format!("remove {id}: {e}")))?;

        Self::expect_success(response, &format!("remove {id}")).await?;
        Ok(())
    }
}
