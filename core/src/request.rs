//! Fluent, owned request builder.
//!
//! # Design
//! Every setter takes `self` and returns it, so a request is assembled in a
//! single expression and handed to `Client::dispatch` exactly once. Nothing
//! here touches the network or the client configuration.
//!
//! Typed body setters never break the chain. If serialization fails the
//! first error is stored on the request and `dispatch` returns it before
//! making a call.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Cursor, Read};

use serde::Serialize;

use crate::body::{self, EncodedBody};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::method::Method;

pub const CONTENT_TYPE: &str = "Content-Type";

/// Multi-valued, insertion-ordered header or query storage.
pub type MultiMap = BTreeMap<String, Vec<String>>;

type BodyReader = Box<dyn Read + Send>;

#[must_use]
#[derive(Default)]
pub struct Request {
    method: Method,
    endpoint: String,
    headers: MultiMap,
    body: Option<BodyReader>,
    query: MultiMap,
    context: Context,
    error: Option<Error>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the endpoint, prefixing `/` unless it already has one or is empty.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = normalize_endpoint(endpoint.into());
        self
    }

    /// Append a header value. Repeated keys accumulate, they never overwrite.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Use `reader` as the body. It is drained when the request is dispatched.
    pub fn body(mut self, reader: impl Read + Send + 'static) -> Self {
        self.body = Some(Box::new(reader));
        self
    }

    /// `application/x-www-form-urlencoded` body from any flat serializable value,
    /// such as `&[("k", "v")]` or a struct of scalars.
    pub fn form_body<T: Serialize + ?Sized>(self, form: &T) -> Self {
        self.encoded_body(body::form(form))
    }

    /// `multipart/form-data` body with one text part per field.
    pub fn multipart_form_body<K, V>(self, fields: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.encoded_body(body::multipart(fields))
    }

    pub fn text_body(self, text: impl Into<String>) -> Self {
        self.encoded_body(Ok(body::text(text)))
    }

    pub fn json_body<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.encoded_body(body::json(value))
    }

    pub fn xml_body<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.encoded_body(body::xml(value))
    }

    pub fn yaml_body<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.encoded_body(body::yaml(value))
    }

    /// Append a query parameter value. Repeated keys accumulate.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Replace the cancellation context used for the network call.
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn get(self, endpoint: impl Into<String>) -> Self {
        self.method(Method::Get).endpoint(endpoint)
    }

    pub fn post(self, endpoint: impl Into<String>) -> Self {
        self.method(Method::Post).endpoint(endpoint)
    }

    pub fn put(self, endpoint: impl Into<String>) -> Self {
        self.method(Method::Put).endpoint(endpoint)
    }

    pub fn delete(self, endpoint: impl Into<String>) -> Self {
        self.method(Method::Delete).endpoint(endpoint)
    }

    pub fn patch(self, endpoint: impl Into<String>) -> Self {
        self.method(Method::Patch).endpoint(endpoint)
    }

    pub fn headers(&self) -> &MultiMap {
        &self.headers
    }

    pub fn query_params(&self) -> &MultiMap {
        &self.query
    }

    pub fn http_method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.endpoint
    }

    pub fn ctx(&self) -> &Context {
        &self.context
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// The first body encoding error recorded by a typed setter, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn encoded_body(mut self, encoded: Result<EncodedBody>) -> Self {
        match encoded {
            Ok(EncodedBody {
                content_type,
                bytes,
            }) => {
                self.set_content_type(content_type);
                self.body = Some(Box::new(Cursor::new(bytes)));
            }
            Err(err) => {
                tracing::debug!(error = %err, "request body encoding failed");
                self.body = None;
                self.error.get_or_insert(err);
            }
        }
        self
    }

    fn set_content_type(&mut self, value: String) {
        self.headers
            .retain(|key, _| !key.eq_ignore_ascii_case(CONTENT_TYPE));
        self.headers.insert(CONTENT_TYPE.to_string(), vec![value]);
    }

    /// Drain the body stream. Called once by the client at dispatch time.
    pub(crate) fn take_body(&mut self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut reader) = self.body.take() {
            reader
                .read_to_end(&mut buf)
                .map_err(|e| Error::BodyRead(e.to_string()))?;
        }
        Ok(buf)
    }

    pub(crate) fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("endpoint", &self.endpoint)
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("has_body", &self.body.is_some())
            .field("context", &self.context)
            .field("error", &self.error)
            .finish()
    }
}

fn normalize_endpoint(endpoint: String) -> String {
    if endpoint.is_empty() || endpoint.starts_with('/') {
        endpoint
    } else {
        format!("/{endpoint}")
    }
}
