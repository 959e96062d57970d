// Credential-for-token exchange against `POST /auth`

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::{Result, TaigaError};

use super::types::{AuthRequest, Credentials};

/// Exchange a username/password pair for a bearer token
pub async fn exchange_credentials(
    client: &Client,
    api_url: &str,
    creds: &Credentials,
) -> Result<String> {
    tracing::info!(username = %creds.username, "Authenticating user");

    let url = format!("{}/auth", api_url);

    let response = client
        .post(&url)
        .json(&AuthRequest::normal(creds))
        .send()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, url = %url, "Auth endpoint unreachable");
            TaigaError::Authentication(format!("Failed to connect to Taiga API: {}", e))
        })?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(
            status = status.as_u16(),
            body = %error_text,
            "HTTP error during authentication"
        );

        if status == StatusCode::BAD_REQUEST {
            return Err(TaigaError::Authentication(
                "Invalid credentials. Please check your username and password.".to_string(),
            ));
        }

        return Err(TaigaError::Authentication(format!(
            "Authentication failed: HTTP {}",
            status
        )));
    }

    let data: Value = response.json().await.map_err(|e| {
        TaigaError::Authentication(format!(
            "Unexpected response format from Taiga API: {}",
            e
        ))
    })?;

    let token = data
        .get("auth_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            TaigaError::Authentication(
                "Unexpected response format from Taiga API: missing 'auth_token'".to_string(),
            )
        })?;

    tracing::info!("Authentication successful");
    Ok(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn creds() -> Credentials {
        Credentials {
            username: "alice".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_exchange_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth")
            .match_body(Matcher::Json(json!({
                "type": "normal",
                "username": "alice",
                "password": "secret"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"auth_token": "tok-123", "id": 7}).to_string())
            .create_async()
            .await;

        let token = exchange_credentials(&Client::new(), &server.url(), &creds())
            .await
            .unwrap();
        assert_eq!(token, "tok-123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_bad_request_is_invalid_credentials() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth")
            .with_status(400)
            .with_body(r#"{"_error_message": "Username or password does not matches user."}"#)
            .create_async()
            .await;

        let err = exchange_credentials(&Client::new(), &server.url(), &creds())
            .await
            .unwrap_err();
        assert!(matches!(err, TaigaError::Authentication(_)));
        assert!(err.to_string().contains("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_exchange_other_status_wraps_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth")
            .with_status(503)
            .create_async()
            .await;

        let err = exchange_credentials(&Client::new(), &server.url(), &creds())
            .await
            .unwrap_err();
        assert!(matches!(err, TaigaError::Authentication(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_exchange_missing_token_field() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/auth")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 7, "username": "alice"}"#)
            .create_async()
            .await;

        let err = exchange_credentials(&Client::new(), &server.url(), &creds())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing 'auth_token'"));
    }

    #[tokio::test]
    async fn test_exchange_connection_refused() {
        // Port 9 (discard) on localhost is not expected to accept connections
        let err = exchange_credentials(&Client::new(), "http://127.0.0.1:9", &creds())
            .await
            .unwrap_err();
        assert!(matches!(err, TaigaError::Authentication(_)));
        assert!(err.to_string().contains("Failed to connect to Taiga API"));
    }
}
