//! Parsed HTTP requests.

use bytes::Bytes;

/// An immutable, fully parsed request handed to services.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: String,
    path: String,
    query: String,
    /// Minor version of HTTP/1.x.
    version_minor: u8,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl HttpRequest {
    pub(crate) fn new(
        method: String,
        target: &str,
        version_minor: u8,
        headers: Vec<(String, String)>,
        body: Bytes,
    ) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_owned(), query.to_owned()),
            None => (target.to_owned(), String::new()),
        };
        Self {
            method,
            path,
            query,
            version_minor,
            headers,
            body,
        }
    }

    /// Request method (`GET`, `POST`, ...).
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Decoded path component of the request target.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, empty when absent.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Minor version of HTTP/1.x (0 or 1).
    #[must_use]
    pub fn version_minor(&self) -> u8 {
        self.version_minor
    }

    /// First value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All headers in arrival order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Request body; empty for bodyless requests.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether the connection should be kept open after the response.
    ///
    /// HTTP/1.1 defaults to keep-alive unless `Connection: close`;
    /// HTTP/1.0 closes unless `Connection: keep-alive`.
    #[must_use]
    pub fn keep_alive(&self) -> bool {
        match self.header("connection") {
            Some(value) if value.eq_ignore_ascii_case("close") => false,
            Some(value) if value.eq_ignore_ascii_case("keep-alive") => true,
            _ => self.version_minor >= 1,
        }
    }
}
