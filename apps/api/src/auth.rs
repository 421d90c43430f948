/// Bearer-credential resolution against the external auth service.
///
/// Every product endpoint is gated on a bearer token issued by the auth
/// provider; this module is the single place that talks to it. A credential
/// that cannot be verified (missing, malformed, rejected upstream, or the
/// auth service is unreachable) is always surfaced as `AppError::Unauthorized`
/// and never retried.
use axum::http::{header::AUTHORIZATION, HeaderMap};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;

const AUTH_TIMEOUT_SECS: u64 = 10;

/// The authenticated subject as reported by the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Thin client over the auth provider's user-introspection endpoint.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AuthClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(AUTH_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Resolves a bearer token to its subject. Any failure mode collapses to
    /// `None`: an unverifiable credential is not accepted.
    pub async fn verify(&self, token: &str) -> Option<AuthUser> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                debug!("Auth service unreachable: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("Auth service rejected credential: {}", response.status());
            return None;
        }

        response.json::<AuthUser>().await.ok()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolves the caller or fails with 401. Runs before any other work in
/// authenticated handlers.
pub async fn require_user(auth: &AuthClient, headers: &HeaderMap) -> Result<AuthUser, AppError> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    auth.verify(token).await.ok_or(AppError::Unauthorized)
}

/// Best-effort caller resolution for endpoints that accept anonymous traffic.
pub async fn optional_user(auth: &AuthClient, headers: &HeaderMap) -> Option<AuthUser> {
    let token = bearer_token(headers)?;
    auth.verify(token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        let headers = headers_with("Bearer abc123");
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let headers = headers_with("Basic abc123");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bearer_token_empty_token() {
        let headers = headers_with("Bearer ");
        assert_eq!(bearer_token(&headers), None);
    }
}
