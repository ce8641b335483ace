//! Shared client that turns a `Request` into a `Response`.
//!
//! # Design
//! `Client` holds only configuration: base URL, base headers, a transport
//! and the middleware list. Nothing is retained between calls, so one
//! client (or cheap clones of it) can serve many threads at once. The
//! transport's connection pool is the only shared resource.
//!
//! `dispatch` assembles an `http::Request<Vec<u8>>`, runs the middleware
//! over it in registration order, performs the blocking round-trip, and
//! wraps the buffered result in a `Response`.
//!
//! The round-trip runs on a short-lived worker thread so the calling thread
//! can return as soon as the request `Context` is cancelled. An abandoned
//! worker is still bounded by the transport timeout.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use ureq::http;
use url::Url;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::middleware::Middleware;
use crate::request::{MultiMap, Request};
use crate::response::Response;
use crate::transport::{BufferedResponse, OutgoingRequest, Transport, UreqTransport};

/// How often a waiting dispatch looks at its context.
const CANCEL_POLL: Duration = Duration::from_millis(10);

#[derive(Clone)]
pub struct Client {
    base_url: String,
    base_headers: MultiMap,
    timeout: Duration,
    transport: Arc<dyn Transport>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("base_headers", &self.base_headers)
            .field("timeout", &self.timeout)
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Build a client over the default `ureq` transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = UreqTransport::new(config.timeout, config.proxy.as_deref())?;
        Ok(Self::with_transport(config, transport))
    }

    /// Build a client over a caller-supplied transport. The config's proxy is
    /// the transport's concern; its timeout still bounds per-call deadlines.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self::from_parts(config, Arc::new(transport), Vec::new())
    }

    fn from_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            base_headers: config.headers,
            timeout: config.timeout,
            transport,
            middleware,
        }
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Register a middleware. Middleware run in registration order.
    pub fn use_middleware(&mut self, middleware: impl Middleware + 'static) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn base_headers(&self) -> &MultiMap {
        &self.base_headers
    }

    /// Send `request` and return the buffered response.
    ///
    /// Fails without touching the network if the request carries a body
    /// encoding error, its context is already done, the URL or headers are
    /// invalid, or a middleware rejects it.
    pub fn dispatch(&self, mut request: Request) -> Result<Response> {
        if let Some(err) = request.take_error() {
            return Err(err);
        }
        let ctx = request.ctx().clone();
        ctx.check()?;

        let mut outgoing = self.assemble(&mut request)?;

        for middleware in &self.middleware {
            if let Err(err) = middleware.handle(&mut outgoing) {
                tracing::warn!(url = %outgoing.uri(), error = %err, "middleware aborted request");
                return Err(err);
            }
        }

        ctx.check()?;
        // Never let a long context deadline stretch the client timeout.
        let timeout = ctx.remaining().map(|left| left.min(self.timeout));
        let response = match self.execute(&ctx, outgoing, timeout) {
            Err(Error::Timeout) if ctx.remaining() == Some(Duration::ZERO) => {
                return Err(Error::DeadlineExceeded)
            }
            other => other?,
        };
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let (parts, body) = response.into_parts();
        tracing::debug!(status = parts.status.as_u16(), body_len = body.len(), "response received");
        Ok(Response::new(
            request,
            parts.status.as_u16(),
            format!("{:?}", parts.version),
            parts.headers,
            body,
        ))
    }

    /// Run the transport on a worker thread and wait for it, giving up as
    /// soon as `ctx` is cancelled or its deadline passes.
    fn execute(
        &self,
        ctx: &Context,
        outgoing: OutgoingRequest,
        timeout: Option<Duration>,
    ) -> Result<BufferedResponse> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let transport = Arc::clone(&self.transport);
        thread::Builder::new()
            .name("courier-call".to_string())
            .spawn(move || {
                // The receiver is gone if the caller already gave up.
                let _ = tx.send(transport.execute(outgoing, timeout));
            })
            .map_err(Error::transport)?;

        loop {
            match rx.recv_timeout(CANCEL_POLL) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => {
                    if let Err(err) = ctx.check() {
                        tracing::debug!(error = %err, "abandoning in-flight request");
                        return Err(err);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::transport("transport worker exited without a response"))
                }
            }
        }
    }

    fn assemble(&self, request: &mut Request) -> Result<OutgoingRequest> {
        let full = format!("{}{}", self.base_url, request.path());
        let mut url = Url::parse(&full).map_err(|source| Error::InvalidUrl { url: full, source })?;

        if !request.query_params().is_empty() {
            url.query_pairs_mut().clear().extend_pairs(
                request
                    .query_params()
                    .iter()
                    .flat_map(|(k, vs)| vs.iter().map(move |v| (k, v))),
            );
        }

        let body = request.take_body()?;
        let mut builder = http::Request::builder()
            .method(http::Method::from(request.http_method()))
            .uri(url.as_str());

        for (key, values) in self.base_headers.iter().chain(request.headers()) {
            for value in values {
                builder = builder.header(key.as_str(), value.as_str());
            }
        }

        let outgoing = builder.body(body)?;
        tracing::debug!(
            method = %outgoing.method(),
            url = %outgoing.uri(),
            headers = ?outgoing.headers(),
            body_len = outgoing.body().len(),
            "dispatching request"
        );
        Ok(outgoing)
    }
}

/// Step-by-step construction of a `Client`.
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl ClientBuilder {
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy.into());
        self
    }

    /// Add a base header value. Repeated keys accumulate.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.add_header(key.into(), value.into());
        self
    }

    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn build(self) -> Result<Client> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(UreqTransport::new(
                self.config.timeout,
                self.config.proxy.as_deref(),
            )?),
        };
        Ok(Client::from_parts(self.config, transport, self.middleware))
    }
}
