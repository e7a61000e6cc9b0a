// src/api/client.rs
//! Pure HTTP client wrapper for the Notion API.
//!
//! This module provides a thin wrapper around reqwest for making
//! HTTP requests to the Notion API. It handles authentication, the
//! Notion-Version header, and error-body decoding — no retry logic and
//! no business rules.

use crate::error::{AppError, NotionErrorCode};
use crate::types::ApiKey;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

const NOTION_VERSION: &str = "2022-06-28";
const API_BASE_URL: &str = "https://api.notion.com/v1";

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()?;
        Ok(Self { client })
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Makes a GET request to the specified endpoint.
    async fn get(&self, endpoint: &str) -> Result<Response, AppError> {
        let url = format!("{}/{}", API_BASE_URL, endpoint);
        log::debug!("GET {}", url);
        Ok(self.client.get(url).send().await?)
    }

    /// Makes a POST request with JSON body to the specified endpoint.
    async fn post<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Response, AppError> {
        let url = format!("{}/{}", API_BASE_URL, endpoint);
        log::debug!("POST {}", url);
        Ok(self.client.post(url).json(body).send().await?)
    }

    /// Makes a PATCH request with JSON body to the specified endpoint.
    async fn patch<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Response, AppError> {
        let url = format!("{}/{}", API_BASE_URL, endpoint);
        log::debug!("PATCH {}", url);
        Ok(self.client.patch(url).json(body).send().await?)
    }

    /// Decodes a response body, converting Notion error envelopes into
    /// the typed error vocabulary.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(decode_error_body(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            AppError::MalformedResponse(format!("{} (body: {})", e, preview(&text)))
        })
    }
}

/// Parses a Notion error envelope (`{"code": ..., "message": ...}`),
/// falling back to the HTTP status when the body is unparseable.
fn decode_error_body(status: u16, body: &str) -> AppError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|v| v.get("code"))
        .and_then(Value::as_str)
        .map(NotionErrorCode::from_api_response)
        .unwrap_or_else(|| NotionErrorCode::from_http_status(status));
    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| preview(body));

    AppError::NotionService {
        code,
        message,
        status,
    }
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

#[async_trait::async_trait]
impl super::NotionGateway for NotionHttpClient {
    async fn create_page(
        &self,
        request: &super::types::CreatePageRequest,
    ) -> Result<super::types::CreatedObject, AppError> {
        let response = self.post("pages", request).await?;
        Self::decode(response).await
    }

    async fn create_database(
        &self,
        request: &super::types::CreateDatabaseRequest,
    ) -> Result<super::types::CreatedObject, AppError> {
        let response = self.post("databases", request).await?;
        Self::decode(response).await
    }

    async fn update_database(
        &self,
        database_id: &str,
        properties: &Value,
    ) -> Result<(), AppError> {
        let endpoint = format!("databases/{}", database_id);
        let body = json!({ "properties": properties });
        let response = self.patch(&endpoint, &body).await?;
        let _: Value = Self::decode(response).await?;
        Ok(())
    }

    async fn search_most_recent_page(&self) -> Result<String, AppError> {
        let body = json!({
            "filter": { "value": "page", "property": "object" },
            "sort": { "direction": "descending", "timestamp": "last_edited_time" },
            "page_size": 1,
        });
        let response = self.post("search", &body).await?;
        let result: Value = Self::decode(response).await?;

        result
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .and_then(|page| page.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::ParentPageDiscovery(
                    "no accessible pages found — share at least one page with the integration"
                        .to_string(),
                )
            })
    }

    async fn current_user(&self) -> Result<super::types::NotionUser, AppError> {
        let response = self.get("users/me").await?;
        let value: Value = Self::decode(response).await?;
        Ok(super::types::NotionUser::from_response(&value))
    }
}
