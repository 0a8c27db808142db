use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::error::DeliveryError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the chatbot's ingestion endpoint.
pub struct IngestClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl IngestClient {
    pub fn new(url: &str, api_key: &str) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// POST the whole batch as one JSON array.
    ///
    /// The batch is only borrowed; after a failure the caller still holds it
    /// and may resend. A resend after a partial server-side write can
    /// duplicate records.
    pub async fn deliver<T: Serialize>(&self, batch: &[T]) -> Result<serde_json::Value, DeliveryError> {
        if batch.is_empty() {
            return Err(DeliveryError::EmptyBatch);
        }

        let resp = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .json(batch)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        info!("Successfully sent {} documents to {}", batch.len(), self.url);
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Serialize)]
    struct Doc {
        content: &'static str,
    }

    fn client(server: &MockServer) -> IngestClient {
        IngestClient::new(&format!("{}/api/ingest", server.uri()), "key-1").unwrap()
    }

    #[tokio::test]
    async fn posts_array_with_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ingest"))
            .and(header("x-api-key", "key-1"))
            .and(body_json(serde_json::json!([{ "content": "a" }, { "content": "b" }])))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "inserted": 2 })))
            .expect(1)
            .mount(&server)
            .await;

        let batch = [Doc { content: "a" }, Doc { content: "b" }];
        let resp = client(&server).deliver(&batch).await.unwrap();
        assert_eq!(resp["inserted"], 2);
    }

    #[tokio::test]
    async fn server_error_keeps_batch_for_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/ingest"))
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .expect(1)
            .mount(&server)
            .await;

        let batch = vec![Doc { content: "a" }];
        let err = client(&server).deliver(&batch).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected { status: 500, ref message } if message == "db down"));
        // still ours
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].content, "a");
    }

    #[tokio::test]
    async fn empty_batch_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let batch: Vec<Doc> = Vec::new();
        let err = client(&server).deliver(&batch).await.unwrap_err();
        assert!(matches!(err, DeliveryError::EmptyBatch));
    }

    #[tokio::test]
    async fn empty_response_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let resp = client(&server).deliver(&[Doc { content: "a" }]).await.unwrap();
        assert!(resp.is_null());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let ingest = IngestClient::new("http://127.0.0.1:9/api/ingest", "k").unwrap();
        let err = ingest.deliver(&[Doc { content: "a" }]).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Network(_)));
    }
}
