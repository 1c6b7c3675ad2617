//! JSON-over-HTTP client for the logistics backend.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use quartermaster_core::config::api::ApiConfig;
use quartermaster_core::{AppError, AppResult, ErrorKind};

use crate::context::SessionContext;

/// Header carrying a per-call correlation id.
const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Longest slice of an error body quoted back in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Thin wrapper around a shared `reqwest::Client` rooted at the API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Build a client from configuration.
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            AppError::configuration(format!("Invalid api.base_url '{}': {e}", config.base_url))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    /// The base URL every path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL and append `query`.
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> AppResult<Url> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AppError::internal(format!("Invalid API path '{path}': {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// `GET` a JSON resource.
    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &SessionContext,
        path: &str,
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = self.url(path, query)?;
        self.send::<(), T>(ctx, Method::GET, url, None).await
    }

    /// `POST` a JSON body.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &SessionContext,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = self.url(path, &[])?;
        self.send(ctx, Method::POST, url, Some(body)).await
    }

    /// `PATCH` a JSON body.
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &SessionContext,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = self.url(path, &[])?;
        self.send(ctx, Method::PATCH, url, Some(body)).await
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        ctx: &SessionContext,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> AppResult<T> {
        ctx.ensure_authenticated()?;

        let request_id = Uuid::new_v4().to_string();
        debug!(%method, %url, request_id = %request_id, "API call");

        let mut builder = self
            .http
            .request(method.clone(), url.clone())
            .header(AUTHORIZATION, format!("Bearer {}", ctx.token))
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, &request_id);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let err = status_error(status, &text);
            warn!(
                %method,
                %url,
                request_id = %request_id,
                status = status.as_u16(),
                kind = %err.kind,
                "API call failed"
            );
            return Err(err);
        }

        // Some actions answer 204 or an empty body
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            AppError::with_source(
                ErrorKind::MalformedPayload,
                format!("Unexpected response from {url}"),
                e,
            )
        })
    }
}

/// Map a reqwest failure that happened before a status was received.
fn transport_error(e: reqwest::Error) -> AppError {
    let message = if e.is_timeout() {
        "Request to the backend timed out"
    } else if e.is_connect() {
        "Could not connect to the backend"
    } else if e.is_decode() {
        return AppError::with_source(
            ErrorKind::MalformedPayload,
            "Could not read the backend response",
            e,
        );
    } else {
        "Request to the backend failed"
    };
    AppError::with_source(ErrorKind::Network, message, e)
}

/// Map a non-success status and its body to an error kind.
pub(crate) fn status_error(status: StatusCode, body: &str) -> AppError {
    let detail = error_detail(body);
    match status {
        StatusCode::UNAUTHORIZED => AppError::auth_required(detail),
        StatusCode::FORBIDDEN => AppError::authorization(detail),
        StatusCode::NOT_FOUND => AppError::not_found(detail),
        StatusCode::CONFLICT => AppError::conflict(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            let lower = detail.to_lowercase();
            if lower.contains("insufficient") || lower.contains("not enough") {
                AppError::stock_insufficient(detail)
            } else {
                AppError::validation(detail)
            }
        }
        _ => AppError::external_service(format!("Backend returned {status}: {detail}")),
    }
}

/// Pull a readable message out of a DRF-style error body.
fn error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "error", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
        if value.is_object() || value.is_array() {
            return truncate(&value.to_string());
        }
    }
    let body = body.trim();
    if body.is_empty() {
        "no details".to_string()
    } else {
        truncate(body)
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
