//! Request and response descriptors passed through the session layer.

use crate::{AuthError, AuthResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Length + digest of a response body, safe to put in logs and errors.
pub(crate) fn summarize_body(body: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// A validated `Authorization: Bearer <token>` header value.
#[derive(Clone)]
pub struct BearerToken {
    header: HeaderValue,
}

impl BearerToken {
    /// Returns `None` if the token cannot be carried in a header.
    pub fn new(access_token: &str) -> Option<Self> {
        if access_token.is_empty() {
            return None;
        }
        let mut header = HeaderValue::from_str(&format!("Bearer {}", access_token)).ok()?;
        header.set_sensitive(true);
        Some(Self { header })
    }

    pub fn header_value(&self) -> &HeaderValue {
        &self.header
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([redacted])")
    }
}

/// Request body encodings the PRISM API accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// An outbound API call.
///
/// `target` is either a path relative to the API base URL or an absolute URL.
/// The retried marker is only ever set through [`ApiRequest::into_retry`],
/// which produces a new descriptor.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    target: String,
    headers: HeaderMap,
    body: RequestBody,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            retried: false,
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>) -> Self {
        Self::new(Method::POST, target)
    }

    pub fn put(target: impl Into<String>) -> Self {
        Self::new(Method::PUT, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> AuthResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a form-encoded body.
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set (or replace) the Authorization header.
    pub fn bearer(self, token: &BearerToken) -> Self {
        self.header(AUTHORIZATION, token.header_value().clone())
    }

    /// Copy of this request marked as already retried.
    pub fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub fn has_authorization(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }
}

/// A received HTTP response, buffered.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Response with a JSON body and no extra headers.
    pub fn json_body(status: StatusCode, body: &serde_json::Value) -> Self {
        Self::new(status, HeaderMap::new(), body.to_string().into_bytes())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn body_summary(&self) -> String {
        summarize_body(&self.body)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> AuthResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Fail with [`AuthError::Api`] unless the status is 2xx.
    pub fn error_for_status(self) -> AuthResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AuthError::Api {
                status: self.status.as_u16(),
                body_summary: self.body_summary(),
            })
        }
    }
}
