//! Immutable request/response values passed through the pipeline.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PagedashError;

/// Description of one HTTP call.
///
/// Once built, a request is never changed in place: attaching credentials
/// produces a new value via [`ApiRequest::authorized`].
///
/// # Example
/// ```
/// use pagedash::http::ApiRequest;
///
/// let original = ApiRequest::get("/api/Facebook/pages");
/// let signed = original.authorized("abc").unwrap();
/// assert_eq!(signed.bearer_token(), Some("abc"));
/// assert_eq!(original.bearer_token(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, PagedashError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append `key=value` to the query string, percent-encoding both.
    pub fn with_query(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        let separator = if self.path.contains('?') { '&' } else { '?' };
        let value = value.to_string();
        self.path = format!(
            "{}{separator}{}={}",
            self.path,
            urlencoding::encode(key),
            urlencoding::encode(&value)
        );
        self
    }

    /// [`with_query`](Self::with_query) when `value` is present.
    pub fn with_optional_query<V: std::fmt::Display>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }

    /// Clone with `name` set to `value`, replacing any previous value.
    pub fn with_header(&self, name: HeaderName, value: &str) -> Result<Self, PagedashError> {
        let value = HeaderValue::from_str(value).map_err(|_| {
            PagedashError::InvalidArgument(format!("invalid value for header {name}"))
        })?;
        let mut next = self.clone();
        next.headers.insert(name, value);
        Ok(next)
    }

    /// Clone with `Authorization: Bearer <token>` and a JSON content type.
    pub fn authorized(&self, token: &str) -> Result<Self, PagedashError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| PagedashError::InvalidArgument("token is not a valid header value".into()))?;
        value.set_sensitive(true);
        let mut next = self.clone();
        next.headers.insert(AUTHORIZATION, value);
        next.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(next)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// Token carried in the `Authorization` header, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }

    /// Same call, ignoring headers: used to check a replay kept the original's identity.
    pub fn same_call(&self, other: &ApiRequest) -> bool {
        self.method == other.method && self.path == other.path && self.body == other.body
    }
}

/// Buffered response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    headers: HeaderMap,
    body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// JSON response with the given status.
    pub fn json_body(status: u16, body: &serde_json::Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            status,
            headers,
            body: body.to_string(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, PagedashError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// `Ok(self)` for 2xx, otherwise the matching [`PagedashError`].
    pub fn into_result(self) -> Result<Self, PagedashError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(PagedashError::from_status(self.status, &self.body))
        }
    }
}
