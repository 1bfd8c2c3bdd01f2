//! OpenAI vector store REST client.
//!
//! Blocking `reqwest` client for the `/vector_stores` and `/files` endpoints.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{multipart, Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AppError, Result, UploadedFile, VectorStore, VectorStoreApi, VectorStoreConfig,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Purpose tag for files meant for retrieval.
const FILE_PURPOSE: &str = "assistants";

/// HTTP client for the vector store API.
pub struct OpenAiVectorStoreClient {
    http: Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct CreateStoreRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
struct AttachFileRequest<'a> {
    file_id: &'a str,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

impl OpenAiVectorStoreClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns `Config` if no API key is configured, `Api` if the HTTP client
    /// cannot be built.
    pub fn new(config: &VectorStoreConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(AppError::api)?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    fn send<T: for<'de> Deserialize<'de>>(request: RequestBuilder) -> Result<T> {
        request
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::json::<T>)
            .map_err(AppError::api)
    }
}

impl VectorStoreApi for OpenAiVectorStoreClient {
    fn create_store(&self, name: &str, description: Option<&str>) -> Result<VectorStore> {
        tracing::debug!(name, "Creating vector store");
        Self::send(
            self.authorized(self.http.post(self.url("vector_stores")))
                .json(&CreateStoreRequest { name, description }),
        )
    }

    fn retrieve_store(&self, store_id: &str) -> Result<VectorStore> {
        Self::send(self.authorized(self.http.get(self.url(&format!("vector_stores/{store_id}")))))
    }

    fn list_stores(&self) -> Result<Vec<VectorStore>> {
        let response: ListResponse<VectorStore> =
            Self::send(self.authorized(self.http.get(self.url("vector_stores"))))?;
        Ok(response.data)
    }

    fn upload_file(&self, path: &Path) -> Result<UploadedFile> {
        let form = multipart::Form::new()
            .text("purpose", FILE_PURPOSE)
            .file("file", path)
            .map_err(|e| AppError::io(format!("Failed to read {}", path.display()), e))?;

        tracing::debug!(path = %path.display(), "Uploading file");
        Self::send(
            self.authorized(self.http.post(self.url("files")))
                .multipart(form),
        )
    }

    fn attach_file(&self, store_id: &str, file_id: &str) -> Result<()> {
        tracing::debug!(store_id, file_id, "Attaching file to vector store");
        let _: serde_json::Value = Self::send(
            self.authorized(
                self.http
                    .post(self.url(&format!("vector_stores/{store_id}/files"))),
            )
            .json(&AttachFileRequest { file_id }),
        )?;
        Ok(())
    }
}
