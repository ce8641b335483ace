//! Body encodings used by the typed `Request` setters and `Response` decoders.
//!
//! Each encoder returns the `Content-Type` to send together with the bytes.
//! Serialization failures come back as `Error::Encode` so the builder can
//! record them instead of sending an empty body.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";
pub const APPLICATION_XML: &str = "application/xml";
pub const APPLICATION_YAML: &str = "application/yaml";

/// Serialization formats understood by the typed body helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Form,
    Multipart,
    Json,
    Xml,
    Yaml,
}

impl fmt::Display for BodyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BodyFormat::Form => "form",
            BodyFormat::Multipart => "multipart",
            BodyFormat::Json => "JSON",
            BodyFormat::Xml => "XML",
            BodyFormat::Yaml => "YAML",
        };
        f.write_str(name)
    }
}

/// A serialized body ready to attach to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl EncodedBody {
    fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }
}

fn encode_err(format: BodyFormat) -> impl FnOnce(String) -> Error {
    move |message| Error::Encode { format, message }
}

fn decode_err(format: BodyFormat) -> impl FnOnce(String) -> Error {
    move |message| Error::Decode { format, message }
}

pub fn form<T: Serialize + ?Sized>(value: &T) -> Result<EncodedBody> {
    let encoded = serde_urlencoded::to_string(value)
        .map_err(|e| e.to_string())
        .map_err(encode_err(BodyFormat::Form))?;
    Ok(EncodedBody::new(FORM_URLENCODED, encoded.into_bytes()))
}

/// Encode text fields as `multipart/form-data` with a fresh random boundary.
pub fn multipart<K, V>(fields: &[(K, V)]) -> Result<EncodedBody>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    multipart_with_boundary(fields, &format!("courier-{}", Uuid::new_v4().simple()))
}

pub(crate) fn multipart_with_boundary<K, V>(fields: &[(K, V)], boundary: &str) -> Result<EncodedBody>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::new();
    for (name, value) in fields {
        let name = name.as_ref();
        if name.contains(['\r', '\n']) {
            return Err(Error::Encode {
                format: BodyFormat::Multipart,
                message: format!("field name {name:?} contains a line break"),
            });
        }
        out.push_str("--");
        out.push_str(boundary);
        out.push_str("\r\n");
        out.push_str("Content-Disposition: form-data; name=\"");
        out.push_str(&name.replace('"', "%22"));
        out.push_str("\"\r\n\r\n");
        out.push_str(value.as_ref());
        out.push_str("\r\n");
    }
    out.push_str("--");
    out.push_str(boundary);
    out.push_str("--\r\n");
    Ok(EncodedBody::new(
        format!("multipart/form-data; boundary={boundary}"),
        out.into_bytes(),
    ))
}

pub fn text(text: impl Into<String>) -> EncodedBody {
    EncodedBody::new(TEXT_PLAIN, text.into().into_bytes())
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<EncodedBody> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| e.to_string())
        .map_err(encode_err(BodyFormat::Json))?;
    Ok(EncodedBody::new(APPLICATION_JSON, bytes))
}

pub fn xml<T: Serialize + ?Sized>(value: &T) -> Result<EncodedBody> {
    let encoded = quick_xml::se::to_string(value)
        .map_err(|e| e.to_string())
        .map_err(encode_err(BodyFormat::Xml))?;
    Ok(EncodedBody::new(APPLICATION_XML, encoded.into_bytes()))
}

pub fn yaml<T: Serialize + ?Sized>(value: &T) -> Result<EncodedBody> {
    let encoded = serde_yaml::to_string(value)
        .map_err(|e| e.to_string())
        .map_err(encode_err(BodyFormat::Yaml))?;
    Ok(EncodedBody::new(APPLICATION_YAML, encoded.into_bytes()))
}

pub(crate) fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| e.to_string())
        .map_err(decode_err(BodyFormat::Json))
}

pub(crate) fn decode_xml<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    quick_xml::de::from_reader(bytes)
        .map_err(|e| e.to_string())
        .map_err(decode_err(BodyFormat::Xml))
}

pub(crate) fn decode_yaml<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_yaml::from_slice(bytes)
        .map_err(|e| e.to_string())
        .map_err(decode_err(BodyFormat::Yaml))
}
