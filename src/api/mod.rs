//! Backend gateway for the Data Mosaic API.
//!
//! Every call issues exactly one HTTP request: no retries, no request
//! timeout, no idempotency key. A second click is a second request.

pub mod error;
pub mod types;

pub use error::ApiError;
pub use types::*;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ApiConfig;

/// The HTTP endpoints the screens depend on
#[async_trait]
pub trait Gateway: Send + Sync {
    /// `POST /segments/create-and-run`: generate SQL and count rows without saving
    async fn preview_segment(&self, request: &PreviewSegment) -> Result<SegmentPreview, ApiError>;

    /// `POST /segments`
    async fn save_segment(&self, request: &SaveSegment) -> Result<Segment, ApiError>;

    /// `GET /segments`
    async fn list_segments(&self) -> Result<Vec<Segment>, ApiError>;

    /// `POST /sources`
    async fn create_source(&self, request: &NewSource) -> Result<SourceCreated, ApiError>;

    /// `GET /sources`
    async fn list_sources(&self) -> Result<Vec<Source>, ApiError>;

    /// `DELETE /sources/{id}`
    async fn delete_source(&self, id: &RecordId) -> Result<(), ApiError>;

    /// `POST /sql/query`
    async fn ask(&self, question: &str) -> Result<QueryAnswer, ApiError>;

    /// `POST /run`: split a question into segments and run each
    async fn run_query(&self, query: &str) -> Result<RunResponse, ApiError>;
}

/// reqwest-backed gateway
pub struct HttpGateway {
    base_url: String,
    client: Client,
}

impl HttpGateway {
    /// Create a gateway for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create from the `[api]` config section
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ApiError::network(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map a response to a typed payload or an `ApiError` carrying the body
    async fn read<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "backend rejected request");
            return Err(ApiError::server(status.as_u16(), body));
        }

        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        Self::read(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!(path, "POST");
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::read(response).await
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn preview_segment(&self, request: &PreviewSegment) -> Result<SegmentPreview, ApiError> {
        self.post("/segments/create-and-run", request).await
    }

    async fn save_segment(&self, request: &SaveSegment) -> Result<Segment, ApiError> {
        self.post("/segments", request).await
    }

    async fn list_segments(&self) -> Result<Vec<Segment>, ApiError> {
        self.get("/segments").await
    }

    async fn create_source(&self, request: &NewSource) -> Result<SourceCreated, ApiError> {
        self.post("/sources", request).await
    }

    async fn list_sources(&self) -> Result<Vec<Source>, ApiError> {
        self.get("/sources").await
    }

    async fn delete_source(&self, id: &RecordId) -> Result<(), ApiError> {
        let path = format!("/sources/{id}");
        debug!(path = %path, "DELETE");
        let response = self.client.delete(self.url(&path)).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::server(status.as_u16(), body))
        }
    }

    async fn ask(&self, question: &str) -> Result<QueryAnswer, ApiError> {
        let request = AskQuestion {
            question: question.to_string(),
        };
        self.post("/sql/query", &request).await
    }

    async fn run_query(&self, query: &str) -> Result<RunResponse, ApiError> {
        let request = RunRequest {
            query: query.to_string(),
        };
        self.post("/run", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let gateway = HttpGateway::new("http://127.0.0.1:8000/");
        assert_eq!(gateway.base_url(), "http://127.0.0.1:8000");
        assert_eq!(gateway.url("/sources"), "http://127.0.0.1:8000/sources");
    }

    #[test]
    fn test_from_config_uses_configured_base_url() {
        let config = ApiConfig {
            base_url: "http://backend:9000".to_string(),
            connect_timeout_secs: 2,
        };
        let gateway = HttpGateway::from_config(&config).unwrap();
        assert_eq!(gateway.base_url(), "http://backend:9000");
    }
}
