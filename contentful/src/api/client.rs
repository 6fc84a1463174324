use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::common::{
    ErrorResponse, CONTENT_TYPE as CMA_CONTENT_TYPE, ORGANIZATION_HEADER,
    RATE_LIMIT_RESET_HEADER, VERSION_HEADER,
};
use super::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://api.contentful.com";

/// Contentful Content Management API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: String,
    organization_id: Option<String>,
    retry_config: RetryConfig,
}

/// Backoff applied to rate-limited requests; nothing else is retried
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(base_url: &str, cma_token: &str) -> Result<Self, ApiError> {
        Self::with_config(base_url, cma_token, None, RetryConfig::default())
    }

    pub fn with_config(
        base_url: &str,
        cma_token: &str,
        organization_id: Option<String>,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{}: unsupported scheme {}",
                base_url,
                parsed.scheme()
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(retry_config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: base_url.trim_end_matches('/').to_string(),
                auth_header: format!("Bearer {}", cma_token),
                organization_id,
                retry_config,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// API key operations
    pub fn api_keys(&self) -> crate::api::api_keys::ApiKeysApi<'_> {
        crate::api::api_keys::ApiKeysApi::new(self)
    }

    /// Asset operations
    pub fn assets(&self) -> crate::api::assets::AssetsApi<'_> {
        crate::api::assets::AssetsApi::new(self)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.execute_with_retry(Method::GET, path, None, None).await?;
        parse_body(&body)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let payload = encode_body(body)?;
        let body = self
            .execute_with_retry(Method::POST, path, Some(payload), None)
            .await?;
        parse_body(&body)
    }

    /// PUT with an optional body; `version` becomes the X-Contentful-Version header
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: Option<&B>,
        version: Option<i64>,
    ) -> Result<T, ApiError> {
        let payload = body.map(encode_body).transpose()?;
        let body = self
            .execute_with_retry(Method::PUT, path, payload, version)
            .await?;
        parse_body(&body)
    }

    /// DELETE that answers with the updated entity (unpublish, unarchive)
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        version: Option<i64>,
    ) -> Result<T, ApiError> {
        let body = self
            .execute_with_retry(Method::DELETE, path, None, version)
            .await?;
        parse_body(&body)
    }

    /// Request whose response body is ignored (204 No Content endpoints)
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        version: Option<i64>,
    ) -> Result<(), ApiError> {
        self.execute_with_retry(method, path, None, version)
            .await
            .map(|_| ())
    }

    /// Execute request with retry on rate limiting, returning the raw body
    async fn execute_with_retry(
        &self,
        method: Method,
        path: &str,
        payload: Option<Vec<u8>>,
        version: Option<i64>,
    ) -> Result<String, ApiError> {
        let url = format!("{}{}", self.inner.base_url, path);
        let retry = &self.inner.retry_config;
        let mut attempt = 0;

        loop {
            tracing::debug!("{} request to: {}", method, url);

            let mut request = self
                .inner
                .http_client
                .request(method.clone(), &url)
                .header(AUTHORIZATION, &self.inner.auth_header)
                .header(CONTENT_TYPE, CMA_CONTENT_TYPE);
            if let Some(version) = version {
                request = request.header(VERSION_HEADER, version.to_string());
            }
            if let Some(org) = &self.inner.organization_id {
                request = request.header(ORGANIZATION_HEADER, org);
            }
            if let Some(payload) = &payload {
                request = request.body(payload.clone());
            }

            let response = request.send().await?;
            let status = response.status();
            tracing::debug!("Response status: {}", status);

            if status.is_success() {
                return Ok(response.text().await?);
            }

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < retry.max_retries {
                let backoff = rate_limit_backoff(&response, retry, attempt);
                tracing::warn!(
                    "Rate limited on {}, retrying after {}ms (attempt {})",
                    path,
                    backoff.as_millis(),
                    attempt + 1
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            return Err(self.handle_error_response(response).await);
        }
    }

    async fn handle_error_response(&self, response: reqwest::Response) -> ApiError {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status == StatusCode::UNAUTHORIZED {
            return ApiError::AuthError;
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return ApiError::RateLimited;
        }

        let parsed = serde_json::from_str::<ErrorResponse>(&text).ok();
        let (id, message, request_id) = match parsed {
            Some(err) => (
                err.sys.id,
                err.message.unwrap_or_else(|| text.clone()),
                err.request_id,
            ),
            None => (
                status.canonical_reason().unwrap_or("Unknown").to_string(),
                text,
                None,
            ),
        };

        if status == StatusCode::NOT_FOUND || id == "NotFound" {
            return ApiError::NotFound {
                message,
                request_id,
            };
        }
        if id == "VersionMismatch" {
            return ApiError::VersionMismatch { message };
        }

        tracing::error!("API error response ({}): {}", status, message);
        ApiError::ApiError {
            status: status.as_u16(),
            id,
            message,
            request_id,
        }
    }
}

/// Prefer the server's reset hint, otherwise exponential backoff
fn rate_limit_backoff(response: &reqwest::Response, retry: &RetryConfig, attempt: u32) -> Duration {
    let reset_secs = response
        .headers()
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    Duration::from_millis(backoff_ms(reset_secs, retry, attempt))
}

/// Delay in milliseconds, capped at `max_backoff_ms`; saturates instead of overflowing
fn backoff_ms(reset_secs: Option<u64>, retry: &RetryConfig, attempt: u32) -> u64 {
    let delay = match reset_secs {
        Some(secs) => secs.saturating_mul(1000),
        None => retry
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt)),
    };
    delay.min(retry.max_backoff_ms)
}

fn encode_body<B: Serialize>(body: &B) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(body).map_err(|e| ApiError::ParseError(format!("Failed to encode body: {}", e)))
}

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| {
        tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
        ApiError::ParseError(format!("Failed to parse response: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        name: String,
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            timeout_seconds: 5,
        }
    }

    #[test]
    fn client_rejects_invalid_base_url() {
        assert!(matches!(
            Client::new("not a url", "token"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            Client::new("ftp://api.contentful.com", "token"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn client_sends_auth_and_content_type() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/spaces/s1/probe")
            .match_header("authorization", "Bearer cma-token")
            .match_header("content-type", CMA_CONTENT_TYPE)
            .with_body(r#"{"name":"ok"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "cma-token").unwrap();
        let probe: Probe = client.get("/spaces/s1/probe").await.unwrap();

        assert_eq!(probe.name, "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_strips_trailing_slash_from_base_url() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/probe")
            .with_body(r#"{"name":"ok"}"#)
            .create_async()
            .await;

        let client = Client::new(&format!("{}/", server.url()), "token").unwrap();
        let _: Probe = client.get("/probe").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_sends_version_and_organization_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/probe")
            .match_header("x-contentful-version", "7")
            .match_header("x-contentful-organization", "org1")
            .match_body(Matcher::Json(serde_json::json!({"name": "new"})))
            .with_body(r#"{"name":"new"}"#)
            .create_async()
            .await;

        let client =
            Client::with_config(&server.url(), "token", Some("org1".to_string()), fast_retry())
                .unwrap();
        let body = serde_json::json!({"name": "new"});
        let probe: Probe = client.put("/probe", Some(&body), Some(7)).await.unwrap();

        assert_eq!(probe.name, "new");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_maps_not_found_errors() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/probe")
            .with_status(404)
            .with_body(
                r#"{"sys":{"type":"Error","id":"NotFound"},"message":"The resource could not be found.","requestId":"req-1"}"#,
            )
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token").unwrap();
        let err = client.get::<Probe>("/probe").await.unwrap_err();

        assert!(err.is_not_found());
        match err {
            ApiError::NotFound { request_id, .. } => assert_eq!(request_id.as_deref(), Some("req-1")),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn client_maps_version_mismatch() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PUT", "/probe")
            .with_status(409)
            .with_body(r#"{"sys":{"type":"Error","id":"VersionMismatch"},"message":"Version mismatch"}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token").unwrap();
        let err = client
            .put::<Probe, serde_json::Value>("/probe", None, Some(1))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::VersionMismatch { .. }));
    }

    #[tokio::test]
    async fn client_maps_authentication_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/probe")
            .with_status(401)
            .with_body(r#"{"sys":{"type":"Error","id":"AccessTokenInvalid"}}"#)
            .create_async()
            .await;

        let client = Client::new(&server.url(), "bad").unwrap();
        assert!(matches!(
            client.get::<Probe>("/probe").await,
            Err(ApiError::AuthError)
        ));
    }

    #[tokio::test]
    async fn client_keeps_unparseable_error_bodies() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/probe")
            .with_status(422)
            .with_body("validation exploded")
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token").unwrap();
        let err = client
            .post::<Probe, _>("/probe", &serde_json::json!({}))
            .await
            .unwrap_err();

        match err {
            ApiError::ApiError {
                status, message, ..
            } => {
                assert_eq!(status, 422);
                assert_eq!(message, "validation exploded");
            }
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn client_retries_rate_limited_requests_then_gives_up() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/probe")
            .with_status(429)
            .with_body(r#"{"sys":{"type":"Error","id":"RateLimitExceeded"}}"#)
            .expect(3)
            .create_async()
            .await;

        let client = Client::with_config(&server.url(), "token", None, fast_retry()).unwrap();
        let result = client.get::<Probe>("/probe").await;

        assert!(matches!(result, Err(ApiError::RateLimited)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_clamps_oversized_rate_limit_reset() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/probe")
            .with_status(429)
            .with_header("X-Contentful-RateLimit-Reset", &u64::MAX.to_string())
            .with_body(r#"{"sys":{"type":"Error","id":"RateLimitExceeded"}}"#)
            .expect(2)
            .create_async()
            .await;

        let retry = RetryConfig {
            max_retries: 1,
            ..fast_retry()
        };
        let client = Client::with_config(&server.url(), "token", None, retry).unwrap();
        let result = client.get::<Probe>("/probe").await;

        assert!(matches!(result, Err(ApiError::RateLimited)));
        mock.assert_async().await;
    }

    #[test]
    fn backoff_saturates_instead_of_overflowing() {
        let retry = RetryConfig::default();

        assert_eq!(backoff_ms(Some(u64::MAX), &retry, 0), retry.max_backoff_ms);
        assert_eq!(backoff_ms(None, &retry, 200), retry.max_backoff_ms);
        assert_eq!(backoff_ms(Some(2), &retry, 0), 2000);
        assert_eq!(backoff_ms(None, &retry, 1), 1000);
    }

    #[tokio::test]
    async fn client_does_not_retry_server_errors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/probe")
            .with_status(500)
            .with_body(r#"{"sys":{"type":"Error","id":"ServerError"},"message":"boom"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = Client::with_config(&server.url(), "token", None, fast_retry()).unwrap();
        let result = client.send(Method::DELETE, "/probe", Some(1)).await;

        assert!(matches!(result, Err(ApiError::ApiError { status: 500, .. })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn client_reports_malformed_success_bodies() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/probe")
            .with_body("not json")
            .create_async()
            .await;

        let client = Client::new(&server.url(), "token").unwrap();
        assert!(matches!(
            client.get::<Probe>("/probe").await,
            Err(ApiError::ParseError(_))
        ));
    }

    #[test]
    fn backoff_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.timeout_seconds, 30);
    }
}
