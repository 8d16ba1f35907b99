//! Incoming HTTP request type.
//!
//! The body is collected in full before a handler runs, so handlers see a
//! plain byte slice and never touch hyper's streaming body.

use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;

/// An incoming, fully buffered HTTP request.
pub struct Request {
    pub(crate) method: http::Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(parts: http::request::Parts, body: Bytes, params: HashMap<String, String>) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
            params,
        }
    }

    pub fn method(&self) -> &http::Method { &self.method }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Path plus query string, as the client sent it.
    pub fn uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    /// Case-insensitive header lookup. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/static/{*path}`, `req.param("path")` on `/static/a/b.css`
    /// returns `Some("a/b.css")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// First value of a query-string parameter, form-urlencoded decoded.
    ///
    /// `?id=7&id=8` yields `Some("7")`; `?name=a+b%21` yields `Some("a b!")`.
    pub fn query(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// All query-string pairs in order of appearance.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query.as_deref().map(parse_form).unwrap_or_default()
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Parses an `application/x-www-form-urlencoded` string into key/value pairs.
///
/// Empty segments are skipped; a key without `=` maps to an empty value.
pub(crate) fn parse_form(input: &str) -> Vec<(String, String)> {
    input
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request {
        let (parts, ()) = http::Request::builder().uri(uri).body(()).unwrap().into_parts();
        Request::new(parts, Bytes::new(), HashMap::new())
    }

    #[test]
    fn query_returns_first_value() {
        let req = request("/resources/update?id=7&id=8");
        assert_eq!(req.query("id").as_deref(), Some("7"));
        assert_eq!(req.query("missing"), None);
    }

    #[test]
    fn query_decodes_plus_and_percent_escapes() {
        let req = request("/req-info?name=a+b%21&flag");
        assert_eq!(req.query("name").as_deref(), Some("a b!"));
        assert_eq!(req.query("flag").as_deref(), Some(""));
    }

    #[test]
    fn uri_keeps_the_query_string() {
        assert_eq!(request("/x?y=1").uri(), "/x?y=1");
        assert_eq!(request("/x").uri(), "/x");
    }

    #[test]
    fn parse_form_skips_empty_segments() {
        assert_eq!(
            parse_form("a=1&&b=2&"),
            vec![("a".to_owned(), "1".to_owned()), ("b".to_owned(), "2".to_owned())]
        );
    }
}
