//! Hooks run against the assembled outgoing request just before it is sent.

use ureq::http::HeaderValue;

use crate::error::{Error, Result};
use crate::transport::OutgoingRequest;

/// A request hook registered on a `Client`.
///
/// Middleware run in registration order. Each may mutate the request or
/// return an error, which aborts the dispatch with no network call.
/// Any `Fn(&mut OutgoingRequest) -> Result<()>` closure is a middleware.
pub trait Middleware: Send + Sync {
    fn handle(&self, request: &mut OutgoingRequest) -> Result<()>;
}

impl<F> Middleware for F
where
    F: Fn(&mut OutgoingRequest) -> Result<()> + Send + Sync,
{
    fn handle(&self, request: &mut OutgoingRequest) -> Result<()> {
        self(request)
    }
}

/// Middleware that sets a bearer `Authorization` header on every request.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Middleware for BearerAuth {
    fn handle(&self, request: &mut OutgoingRequest) -> Result<()> {
        let value: HeaderValue = format!("Bearer {}", self.token)
            .parse()
            .map_err(Error::middleware)?;
        request
            .headers_mut()
            .insert(ureq::http::header::AUTHORIZATION, value);
        Ok(())
    }
}
