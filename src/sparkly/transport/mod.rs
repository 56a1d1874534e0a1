//! # Transport Layer
//!
//! The object model never talks HTTP directly. Every remote read or write
//! goes through the [`Transport`] trait, a single synchronous request call.
//! This module defines the trait and its request/response types.
//!
//! ## Implementations
//!
//! - [`http::HttpTransport`]: production transport on `ureq`. Adds the bearer
//!   token, resolves relative paths against the API base, and backs off on
//!   429 responses.
//! - [`memory::MemTransport`]: an in-memory fake of the REST API for tests.
//!   Logs every request so tests can count remote calls.
//!
//! ## URL Convention
//!
//! `Request::url` is either an absolute URL, used verbatim (next-page links
//! are always absolute), or a path relative to the API base, such as
//! `rooms/{id}` or `team/memberships`.
//!
//! ## Wire Contract
//!
//! | Call | Request | Success |
//! |------|---------|---------|
//! | fetch | `GET {type}/{id}` | 200 + record |
//! | update | `PUT {type}/{id}` + partial body | 200 + record |
//! | delete | `DELETE {type}/{id}` | 204, empty body |
//! | list | `GET {type}?{filters}` | 200 + `{"items": [...]}` + `Link: <...>; rel="next"` |

use crate::error::Result;
use serde_json::Value;
use std::fmt;

pub mod http;
pub mod memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, url).with_body(body)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn with_query<K, V, I>(mut self, params: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    /// Target of the `rel="next"` link relation, if the response is paged.
    pub next_link: Option<String>,
    /// Raw body text; parsed on demand so a malformed body is observable.
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            next_link: None,
            body: body.into(),
        }
    }

    pub fn json_body(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn with_next_link(mut self, link: Option<String>) -> Self {
        self.next_link = link;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Abstract interface for remote calls.
///
/// Implementations own authentication and rate-limit back-off; callers only
/// ever see the final response of a request.
pub trait Transport {
    fn request(&self, request: &Request) -> Result<Response>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(&self, request: &Request) -> Result<Response> {
        (**self).request(request)
    }
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header value.
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let target = target.strip_prefix('<')?.strip_suffix('>')?;
        let is_next = parts.any(|param| {
            let param = param.trim();
            match param.split_once('=') {
                Some((key, value)) => {
                    key.trim().eq_ignore_ascii_case("rel")
                        && value
                            .trim()
                            .trim_matches('"')
                            .split_whitespace()
                            .any(|rel| rel.eq_ignore_ascii_case("next"))
                }
                None => false,
            }
        });
        is_next.then(|| target.to_string())
    })
}
