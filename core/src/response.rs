//! Buffered response snapshot returned by `Client::dispatch`.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use ureq::http::HeaderMap;

use crate::body;
use crate::error::Result;
use crate::request::Request;

/// Status code bands. Every code falls in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Redirect,
    ClientError,
    ServerError,
    /// 1xx informational and anything outside 100..=599.
    Other,
}

impl StatusClass {
    pub fn from_code(code: u16) -> Self {
        match code {
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirect,
            400..=499 => StatusClass::ClientError,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Other,
        }
    }
}

/// An HTTP response with its body fully read.
///
/// Decoders borrow the buffered bytes and never modify the response.
#[derive(Debug)]
pub struct Response {
    request: Request,
    status: u16,
    proto: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub(crate) fn new(
        request: Request,
        status: u16,
        proto: String,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Self {
        Self {
            request,
            status,
            proto,
            headers,
            body,
        }
    }

    /// The request that produced this response. Its body has been consumed.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Protocol version, e.g. `HTTP/1.1`.
    pub fn proto(&self) -> &str {
        &self.proto
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of `name`, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::from_code(self.status)
    }

    pub fn is_success(&self) -> bool {
        self.status_class() == StatusClass::Success
    }

    pub fn is_redirect(&self) -> bool {
        self.status_class() == StatusClass::Redirect
    }

    pub fn is_client_error(&self) -> bool {
        self.status_class() == StatusClass::ClientError
    }

    pub fn is_server_error(&self) -> bool {
        self.status_class() == StatusClass::ServerError
    }

    pub fn is_error(&self) -> bool {
        self.is_client_error() || self.is_server_error()
    }

    /// The body as text. Invalid UTF-8 sequences are replaced.
    pub fn text_body(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T> {
        body::decode_json(&self.body)
    }

    pub fn xml_body<T: DeserializeOwned>(&self) -> Result<T> {
        body::decode_xml(&self.body)
    }

    pub fn yaml_body<T: DeserializeOwned>(&self) -> Result<T> {
        body::decode_yaml(&self.body)
    }
}
