//! Network-call abstraction wrapped by the fetch interceptor.

use crate::location::PageLocation;
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;

/// Fully described request, the structured form of a fetch target.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl StructuredRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// Resource passed to a fetch: a bare URL or a structured request.
#[derive(Debug, Clone)]
pub enum RequestTarget {
    Url(String),
    Request(StructuredRequest),
}

impl RequestTarget {
    /// URL as given by the caller, possibly relative.
    pub fn raw_url(&self) -> &str {
        match self {
            RequestTarget::Url(url) => url,
            RequestTarget::Request(request) => &request.url,
        }
    }
}

impl From<&str> for RequestTarget {
    fn from(url: &str) -> Self {
        RequestTarget::Url(url.to_string())
    }
}

impl From<String> for RequestTarget {
    fn from(url: String) -> Self {
        RequestTarget::Url(url)
    }
}

impl From<StructuredRequest> for RequestTarget {
    fn from(request: StructuredRequest) -> Self {
        RequestTarget::Request(request)
    }
}

/// Per-call options. Anything set here overrides the structured request.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method: Option<Method>,
    /// Replaces (not merges with) the structured request's headers.
    pub headers: Option<HeaderMap>,
    pub body: Option<String>,
}

/// Request handed to the transport.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl OutgoingRequest {
    /// Merge target and init, resolving the URL against the page.
    ///
    /// A URL that cannot be resolved is passed through as given; the transport
    /// reports the failure.
    pub fn resolve(target: RequestTarget, init: RequestInit, location: &PageLocation) -> Self {
        let (raw_url, method, headers, body) = match target {
            RequestTarget::Url(url) => (url, Method::GET, HeaderMap::new(), None),
            RequestTarget::Request(request) => {
                (request.url, request.method, request.headers, request.body)
            }
        };

        let url = location
            .join(&raw_url)
            .map(|url| url.to_string())
            .unwrap_or(raw_url);

        Self {
            url,
            method: init.method.unwrap_or(method),
            headers: init.headers.unwrap_or(headers),
            body: init.body.or(body),
        }
    }

    /// Set `Authorization: Bearer <token>`, leaving other headers untouched.
    pub fn set_bearer(&mut self, token: &str) -> AuthResult<()> {
        let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            AuthError::Unauthenticated("access token is not a valid header value".to_string())
        })?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
    }
}

/// Response returned by the transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> AuthResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// The page's underlying network primitive.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> AuthResult<HttpResponse>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest) -> AuthResult<HttpResponse> {
        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
