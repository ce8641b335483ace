//! The network seam between `Client::dispatch` and the wire.
//!
//! # Design
//! A transport receives a fully assembled request and returns a fully
//! buffered response, so the connection is back in the pool before the
//! caller ever sees a `Response`. The default implementation drives a
//! blocking `ureq::Agent`; tests swap in a recording transport.

use std::fmt;
use std::time::Duration;

use ureq::http::{self, Response};
use ureq::{Agent, AsSendBody, Body, Proxy};

use crate::error::{Error, Result};

/// The request representation seen by middleware and transports.
pub type OutgoingRequest = http::Request<Vec<u8>>;

/// A response whose body has been read to the end.
pub type BufferedResponse = Response<Vec<u8>>;

pub trait Transport: Send + Sync {
    /// Perform the round-trip. `timeout`, when set, replaces the transport's
    /// configured timeout for this call only.
    fn execute(&self, request: OutgoingRequest, timeout: Option<Duration>) -> Result<BufferedResponse>;
}

/// Blocking transport over a pooled `ureq::Agent`.
///
/// Cloning is cheap and clones share the connection pool.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(timeout: Duration, proxy: Option<&str>) -> Result<Self> {
        let proxy = proxy
            .map(|p| {
                Proxy::new(p).map_err(|e| Error::InvalidProxy {
                    proxy: p.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;

        // Status codes are data here; the caller classifies them on `Response`.
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .proxy(proxy)
            .build()
            .new_agent();
        Ok(Self { agent })
    }

    fn run<B: AsSendBody>(
        &self,
        request: http::Request<B>,
        timeout: Option<Duration>,
    ) -> Result<Response<Body>> {
        let request = match timeout {
            Some(t) => self
                .agent
                .configure_request(request)
                .timeout_global(Some(t))
                .build(),
            None => request,
        };
        Ok(self.agent.run(request)?)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: OutgoingRequest, timeout: Option<Duration>) -> Result<BufferedResponse> {
        let (parts, body) = request.into_parts();
        let response = if body.is_empty() {
            self.run(http::Request::from_parts(parts, ()), timeout)?
        } else {
            self.run(http::Request::from_parts(parts, body), timeout)?
        };

        let (parts, mut body) = response.into_parts();
        // `body` is dropped on every path out of here, returning the connection.
        // No size cap: the whole body is buffered whatever its length.
        let bytes = body.with_config().limit(u64::MAX).read_to_vec().map_err(|e| match e {
            ureq::Error::Timeout(_) => Error::Timeout,
            other => Error::BodyRead(other.to_string()),
        })?;
        Ok(Response::from_parts(parts, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_proxy() {
        let err = UreqTransport::new(Duration::from_secs(1), Some("::not a proxy::")).unwrap_err();
        assert!(matches!(err, Error::InvalidProxy { .. }));
    }

    #[test]
    fn accepts_http_proxy() {
        assert!(UreqTransport::new(Duration::from_secs(1), Some("http://127.0.0.1:8080")).is_ok());
    }
}
