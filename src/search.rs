use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    error::AppResult,
    models::{SearchDocument, SearchHit},
};

const UPLOAD_BATCH_SIZE: usize = 100;

/// Thin client for the Marqo HTTP API. The index is structured: `text`
/// is the tensor field, `genres` and `actors` are filterable.
pub struct SearchClient {
    client: reqwest::Client,
    base_url: String,
    index: String,
}

impl SearchClient {
    pub fn new(client: reqwest::Client, base_url: String, index: String) -> Self {
        Self { client, base_url, index }
    }

    fn index_url(&self) -> String {
        format!("{}/indexes/{}", self.base_url.trim_end_matches('/'), self.index)
    }

    /// Drops and re-creates the index. A missing index on delete is fine.
    pub async fn recreate_index(&self) -> AppResult<()> {
        let resp = self.client.delete(self.index_url()).send().await?;
        if resp.status() != StatusCode::NOT_FOUND {
            resp.error_for_status()?;
            info!(index = %self.index, "deleted existing index");
        }

        let settings = json!({
            "type": "structured",
            "allFields": [
                { "name": "text", "type": "text", "features": ["lexical_search"] },
                { "name": "title", "type": "text", "features": ["lexical_search"] },
                { "name": "genres", "type": "array<text>", "features": ["filter", "lexical_search"] },
                { "name": "actors", "type": "array<text>", "features": ["filter", "lexical_search"] },
                { "name": "director", "type": "text", "features": ["lexical_search"] },
                { "name": "year", "type": "text", "features": ["filter"] },
                { "name": "popularity", "type": "double", "features": ["filter"] },
            ],
            "tensorFields": ["text"],
        });

        self.client
            .post(self.index_url())
            .json(&settings)
            .send()
            .await?
            .error_for_status()?;

        info!(index = %self.index, "created index");
        Ok(())
    }

    /// Bulk-uploads documents in batches, logging and skipping failed
    /// batches rather than aborting the whole upload. The service
    /// reports per-document failures inside a 200 response, so each
    /// batch response is inspected for rejected items as well.
    pub async fn add_documents(&self, documents: &[SearchDocument]) -> AppResult<()> {
        info!(index = %self.index, total = documents.len(), "uploading documents");

        let url = format!("{}/documents", self.index_url());
        for (batch_no, batch) in documents.chunks(UPLOAD_BATCH_SIZE).enumerate() {
            let body = json!({ "documents": batch });
            let result = async {
                let resp: AddDocumentsResponse = self
                    .client
                    .post(&url)
                    .json(&body)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                Ok::<_, reqwest::Error>(resp)
            }
            .await;

            match result {
                Ok(resp) => {
                    if resp.errors {
                        for item in resp.items.iter().filter(|item| !item.succeeded()) {
                            warn!(
                                batch = batch_no,
                                id = %item.id,
                                status = item.status,
                                error = item.error.as_deref().unwrap_or("unknown"),
                                "index rejected document"
                            );
                        }
                    }
                    debug!(batch = batch_no, size = batch.len(), "uploaded batch");
                },
                Err(err) => warn!(batch = batch_no, error = %err, "failed to upload batch"),
            }
        }

        info!(index = %self.index, "document upload complete");
        Ok(())
    }

    /// Runs a search, restricting by the filter expression when one is
    /// given. Returns the ranked hits as the service ordered them.
    pub async fn search(&self, query: &str, filter: &str) -> AppResult<Vec<SearchHit>> {
        debug!(q = %query, filter = %filter, "searching index");

        let mut body = json!({ "q": query });
        if !filter.is_empty() {
            body["filter"] = json!(filter);
        }

        let url = format!("{}/search", self.index_url());
        let resp: SearchResponse = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(hits = resp.hits.len(), "search returned");
        Ok(resp.hits)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct AddDocumentsResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<AddDocumentItem>,
}

#[derive(Debug, Deserialize)]
struct AddDocumentItem {
    #[serde(rename = "_id", default)]
    id: String,
    #[serde(default)]
    status: i32,
    #[serde(default)]
    error: Option<String>,
}

impl AddDocumentItem {
    fn succeeded(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parses_ranked_hits() {
        let json = r#"{
            "hits": [
                { "_id": "862", "title": "Toy Story", "genres": ["animation", "children"],
                  "popularity": 21.9, "_score": 0.87 },
                { "_id": "8844", "title": "Jumanji", "popularity": 17.0, "_score": 0.71 }
            ]
        }"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.hits.len(), 2);
        assert_eq!(resp.hits[0].id, "862");
        assert_eq!(resp.hits[0].genres, vec!["animation", "children"]);
        assert_eq!(resp.hits[1].score, 0.71);
    }

    #[test]
    fn response_without_hits_is_empty() {
        let resp: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.hits.is_empty());
    }

    #[test]
    fn upload_response_surfaces_rejected_documents() {
        let json = r#"{
            "errors": true,
            "processingTimeMs": 3.4,
            "items": [
                { "_id": "862", "status": 200 },
                { "_id": "8844", "status": 400, "error": "Field year must be of type text" }
            ]
        }"#;
        let resp: AddDocumentsResponse = serde_json::from_str(json).unwrap();
        assert!(resp.errors);
        let rejected: Vec<&AddDocumentItem> =
            resp.items.iter().filter(|item| !item.succeeded()).collect();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].id, "8844");
        assert!(rejected[0].error.as_deref().unwrap().contains("year"));
    }

    #[test]
    fn clean_upload_response_has_no_rejections() {
        let json = r#"{ "errors": false, "items": [ { "_id": "862", "status": 201 } ] }"#;
        let resp: AddDocumentsResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.errors);
        assert!(resp.items.iter().all(AddDocumentItem::succeeded));
    }
}
