//! HTTP request/response types and client trait.

use std::future::Future;

use super::HttpError;

/// An HTTP GET request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Target URL
    pub url: url::Url,
    /// HTTP headers to send
    pub headers: http::HeaderMap,
}

impl HttpRequest {
    /// Creates a GET request with no headers.
    #[must_use]
    pub fn get(url: url::Url) -> Self {
        Self {
            url,
            headers: http::HeaderMap::new(),
        }
    }

    /// Sets a header, replacing any previous value.
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// An HTTP response with its body fully buffered.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response headers
    pub headers: http::HeaderMap,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    #[must_use]
    pub const fn new(status: http::StatusCode, headers: http::HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).trim().to_string()
    }
}

/// Trait for issuing HTTP requests to one host.
///
/// Implementations keep whatever per-host state the protocol needs, such
/// as cookies, across calls.
pub trait HttpClient: Send + Sync + 'static {
    /// Sends a GET request and buffers the response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Connection`] when no response is received.
    fn get(&self, req: HttpRequest) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;
}
