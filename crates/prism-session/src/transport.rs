//! HTTP transport seam.
//!
//! [`SessionClient`](crate::SessionClient) decides *what* to send; an
//! [`HttpTransport`] only moves bytes. The production implementation wraps a
//! shared `reqwest::Client`.

use crate::{ApiRequest, ApiResponse, AuthError, AuthResult, RequestBody};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Executes one HTTP exchange. Non-2xx statuses are responses, not errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, url: Url, request: &ApiRequest) -> AuthResult<ApiResponse>;
}

/// Resolve a request target against the API base URL.
///
/// Absolute `http(s)` targets are used as-is. Relative targets are appended
/// to the base path, so a base of `https://host/api` and a target of
/// `/auth/login` give `https://host/api/auth/login`.
pub fn resolve_url(base: &Url, target: &str) -> AuthResult<Url> {
    if target.starts_with("http://") || target.starts_with("https://") {
        return Ok(Url::parse(target)?);
    }

    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(target.trim_start_matches('/'))?)
}

/// reqwest-backed transport.
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport. `timeout` bounds each exchange; `None` means no limit.
    pub fn new(timeout: Option<Duration>) -> AuthResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            "prism-session/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http_client: builder.build()?,
        })
    }

    /// Wrap an existing client.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, url: Url, request: &ApiRequest) -> AuthResult<ApiResponse> {
        debug!(method = %request.method(), url = %url, "Sending request");

        let mut builder = self
            .http_client
            .request(request.method().clone(), url)
            .headers(request.headers().clone());

        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        let response = builder.send().await.map_err(AuthError::Http)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        debug!(status = %status, len = body.len(), "Received response");

        Ok(ApiResponse::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_against_root() {
        let base = Url::parse("http://localhost:8000").unwrap();
        let url = resolve_url(&base, "/auth/login").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/auth/login");
    }

    #[test]
    fn test_resolve_keeps_base_path_prefix() {
        let base = Url::parse("https://prism.example.com/api").unwrap();
        let url = resolve_url(&base, "/worklets/").unwrap();
        assert_eq!(url.as_str(), "https://prism.example.com/api/worklets/");

        let base = Url::parse("https://prism.example.com/api/").unwrap();
        let url = resolve_url(&base, "auth/me").unwrap();
        assert_eq!(url.as_str(), "https://prism.example.com/api/auth/me");
    }

    #[test]
    fn test_resolve_absolute_target() {
        let base = Url::parse("http://localhost:8000").unwrap();
        let url = resolve_url(&base, "https://other.example.com/auth/refresh").unwrap();
        assert_eq!(url.host_str(), Some("other.example.com"));
        assert_eq!(url.path(), "/auth/refresh");
    }

    #[test]
    fn test_resolve_preserves_query() {
        let base = Url::parse("http://localhost:8000").unwrap();
        let url = resolve_url(&base, "/worklets/?status=ongoing").unwrap();
        assert_eq!(url.path(), "/worklets/");
        assert_eq!(url.query(), Some("status=ongoing"));
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(Some(Duration::from_secs(5))).is_ok());
        assert!(ReqwestTransport::new(None).is_ok());
    }
}
