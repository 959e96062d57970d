// Authenticated transport for the Taiga REST API
//
// A session owns one lazily built HTTP client. Every request carries the
// bearer token from the shared `AuthManager`; failures are classified into
// `TaigaError` in a fixed order (404, 401, 403, other status, network).

use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::auth::AuthManager;
use crate::config::Config;
use crate::error::{Result, TaigaError};

/// Query parameters for a request
pub type Query<'a> = &'a [(&'a str, String)];

/// Authenticated HTTP session against the Taiga API.
///
/// One instance is opened per tool invocation. The connection pool is built
/// lazily on the first request and released by [`TaigaClient::close`] (or on
/// drop).
pub struct TaigaClient {
    /// Lazily created HTTP client with connection pooling
    http: Mutex<Option<Client>>,

    /// Authentication manager
    auth_manager: Arc<AuthManager>,

    /// API base URL without trailing slash
    api_url: String,

    /// Per-request timeout
    request_timeout: Duration,
}

impl TaigaClient {
    /// Create a new session; no connection is made until the first request
    pub fn new(auth_manager: Arc<AuthManager>, config: &Config) -> Self {
        Self {
            http: Mutex::new(None),
            auth_manager,
            api_url: config.api_url.clone(),
            request_timeout: Duration::from_secs(config.http_request_timeout),
        }
    }

    /// Shared authentication manager
    pub fn auth_manager(&self) -> &Arc<AuthManager> {
        &self.auth_manager
    }

    /// Whether the underlying HTTP client has been created and not yet closed
    pub fn is_open(&self) -> bool {
        self.http.lock().map(|h| h.is_some()).unwrap_or(false)
    }

    /// Release the underlying HTTP client. Safe to call repeatedly.
    pub fn close(&self) {
        if let Ok(mut http) = self.http.lock() {
            if http.take().is_some() {
                tracing::debug!("Taiga HTTP session closed");
            }
        }
    }

    /// GET `path` and decode the JSON body
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> Result<T> {
        let response = self.send(Method::GET, path, query, None).await?;
        decode(response).await
    }

    /// POST a JSON body to `path` and decode the JSON response
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(body)?;
        let response = self.send(Method::POST, path, &[], Some(body)).await?;
        decode(response).await
    }

    /// PATCH a JSON body to `path` and decode the JSON response
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(body)?;
        let response = self.send(Method::PATCH, path, &[], Some(body)).await?;
        decode(response).await
    }

    /// DELETE `path`; the response body is ignored
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    fn ensure_client(&self) -> Result<Client> {
        let mut http = self
            .http
            .lock()
            .map_err(|_| TaigaError::Internal(anyhow::anyhow!("HTTP client lock poisoned")))?;

        if let Some(client) = http.as_ref() {
            return Ok(client.clone());
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(self.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        tracing::debug!(api_url = %self.api_url, "Taiga HTTP session opened");
        *http = Some(client.clone());
        Ok(client)
    }

    /// Send one authenticated request and classify any failure
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<Value>,
    ) -> Result<Response> {
        let token = self.auth_manager.get_token().await?;
        let client = self.ensure_client()?;

        let url = format!("{}{}", self.api_url, path);
        tracing::debug!(method = %method, path = %path, "Sending HTTP request");

        let mut request = client.request(method.clone(), &url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            let error_kind = if e.is_timeout() {
                "timeout"
            } else if e.is_connect() {
                "connection_failed"
            } else if e.is_request() {
                "request_error"
            } else {
                "unknown"
            };
            tracing::warn!(
                error_kind = error_kind,
                error = %e,
                method = %method,
                path = %path,
                "HTTP request error"
            );
            TaigaError::api(format!("Request failed: {}", e), None)
        })?;

        let status = response.status();
        tracing::debug!(status = %status, path = %path, "Received HTTP response");

        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(path = %path, "Received 401, clearing cached token");
            self.auth_manager.clear_token().await;
        }

        let error = classify_error(status, path, &error_text);
        tracing::error!(
            status = status.as_u16(),
            path = %path,
            kind = error.kind(),
            response_body = %error_text,
            "HTTP request failed with error response"
        );
        Err(error)
    }
}

impl Drop for TaigaClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Map a non-2xx response to the error taxonomy.
///
/// Order matters: 404, then 401, then 403, then everything else.
pub fn classify_error(status: StatusCode, path: &str, body: &str) -> TaigaError {
    match status {
        StatusCode::NOT_FOUND => TaigaError::not_found(resource_type_from_path(path), path),
        StatusCode::UNAUTHORIZED => TaigaError::api(
            "Authentication failed. Token may be invalid.",
            Some(status.as_u16()),
        ),
        StatusCode::FORBIDDEN => TaigaError::api(
            "Permission denied. You don't have access to this resource.",
            Some(status.as_u16()),
        ),
        _ => {
            let message = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| {
                    v.get("_error_message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| {
                    if body.trim().is_empty() {
                        status.to_string()
                    } else {
                        body.to_string()
                    }
                });
            TaigaError::api(
                format!("API request failed: {}", message),
                Some(status.as_u16()),
            )
        }
    }
}

/// First segment of an API path (`/epics/999` -> `epics`)
pub fn resource_type_from_path(path: &str) -> String {
    if !path.contains('/') {
        return "Resource".to_string();
    }
    path.split('/').nth(1).unwrap_or_default().to_string()
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Value> {
    serde_json::to_value(body)
        .context("Failed to serialize request body")
        .map_err(TaigaError::from)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    response.json::<T>().await.map_err(|e| {
        TaigaError::api(
            format!("Failed to parse response from Taiga API: {}", e),
            Some(status.as_u16()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn config(api_url: &str) -> Config {
        Config {
            api_url: api_url.to_string(),
            ..Config::default()
        }
    }

    fn client_for(server: &mockito::ServerGuard) -> TaigaClient {
        let config = config(&server.url());
        let auth = Arc::new(AuthManager::new_for_testing("test-token".to_string(), &config).unwrap());
        TaigaClient::new(auth, &config)
    }

    #[test]
    fn test_resource_type_from_path() {
        assert_eq!(resource_type_from_path("/epics/999"), "epics");
        assert_eq!(resource_type_from_path("/userstories"), "userstories");
        assert_eq!(resource_type_from_path("projects"), "Resource");
    }

    #[test]
    fn test_classify_not_found() {
        match classify_error(StatusCode::NOT_FOUND, "/epics/999", "") {
            TaigaError::NotFound {
                resource_type,
                identifier,
            } => {
                assert_eq!(resource_type, "epics");
                assert_eq!(identifier, "/epics/999");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_auth_and_permission() {
        let err = classify_error(StatusCode::UNAUTHORIZED, "/projects", "");
        assert_eq!(err.status_code(), Some(401));
        assert!(err.to_string().contains("Token may be invalid"));

        let err = classify_error(StatusCode::FORBIDDEN, "/projects/1", "");
        assert_eq!(err.status_code(), Some(403));
        assert!(err.to_string().starts_with("Permission denied"));
    }

    #[test]
    fn test_classify_generic_uses_service_message() {
        let err = classify_error(
            StatusCode::BAD_REQUEST,
            "/userstories",
            r#"{"_error_message": "Subject is required"}"#,
        );
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(err.to_string(), "API request failed: Subject is required");
    }

    #[test]
    fn test_classify_generic_falls_back_to_raw_text() {
        let err = classify_error(StatusCode::BAD_GATEWAY, "/projects", "upstream down");
        assert_eq!(err.to_string(), "API request failed: upstream down");

        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, "/projects", "");
        assert_eq!(err.status_code(), Some(500));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_get_sends_bearer_and_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/epic-statuses")
            .match_header("authorization", "Bearer test-token")
            .match_header("accept", "application/json")
            .match_query(Matcher::UrlEncoded("project".into(), "42".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!([{"id": 1, "name": "New"}]).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(!client.is_open());

        let body: Value = client
            .get("/epic-statuses", &[("project", "42".to_string())])
            .await
            .unwrap();
        assert_eq!(body[0]["name"], "New");
        assert!(client.is_open());
        mock.assert_async().await;

        client.close();
        assert!(!client.is_open());
    }

    #[tokio::test]
    async fn test_post_and_patch_send_json() {
        let mut server = mockito::Server::new_async().await;
        let post = server
            .mock("POST", "/epics")
            .match_body(Matcher::Json(json!({"project": 1, "subject": "Epic"})))
            .with_status(201)
            .with_body(json!({"id": 5, "subject": "Epic"}).to_string())
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/epics/5")
            .match_body(Matcher::Json(json!({"version": 1, "subject": "Renamed"})))
            .with_status(200)
            .with_body(json!({"id": 5, "subject": "Renamed"}).to_string())
            .create_async()
            .await;

        let client = client_for(&server);
        let created: Value = client
            .post("/epics", &json!({"project": 1, "subject": "Epic"}))
            .await
            .unwrap();
        assert_eq!(created["id"], 5);

        let updated: Value = client
            .patch("/epics/5", &json!({"version": 1, "subject": "Renamed"}))
            .await
            .unwrap();
        assert_eq!(updated["subject"], "Renamed");

        post.assert_async().await;
        patch.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_returns_unit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/tasks/3")
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        client.delete("/tasks/3").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_404_yields_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/epics/999")
            .with_status(404)
            .with_body(r#"{"_error_message": "No Epic matches the given query."}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.get::<Value>("/epics/999", &[]).await.unwrap_err();
        match err {
            TaigaError::NotFound {
                resource_type,
                identifier,
            } => {
                assert_eq!(resource_type, "epics");
                assert_eq!(identifier, "/epics/999");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_401_clears_token_and_does_not_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/me")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(client.auth_manager().is_authenticated().await);

        let err = client.get::<Value>("/users/me", &[]).await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert!(matches!(err, TaigaError::Api { .. }));
        assert!(!client.auth_manager().is_authenticated().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_network_failure_has_no_status() {
        let config = config("http://127.0.0.1:9");
        let auth = Arc::new(AuthManager::new_for_testing("t".to_string(), &config).unwrap());
        let client = TaigaClient::new(auth, &config);

        let err = client.get::<Value>("/projects", &[]).await.unwrap_err();
        assert!(matches!(err, TaigaError::Api { status: None, .. }));
        assert!(err.to_string().starts_with("Request failed"));
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/projects")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.get::<Value>("/projects", &[]).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse response"));
    }
}
