//! Fluent builder for outbound HTTP requests over a shared blocking client.
//!
//! # Overview
//! Build a `Request` with chained calls, hand it to `Client::dispatch`, and
//! inspect the buffered `Response`.
//!
//! ```no_run
//! use courier::{Client, Request};
//!
//! let client = Client::builder()
//!     .base_url("http://api.test")
//!     .header("X-Env", "test")
//!     .build()?;
//! let resp = client.dispatch(Request::new().get("/users").query_param("id", "1"))?;
//! if resp.is_success() {
//!     println!("{}", resp.text_body());
//! }
//! # Ok::<(), courier::Error>(())
//! ```
//!
//! # Design
//! - `Request` is an owned builder; typed body setters record encoding
//!   errors instead of dropping them, and `dispatch` reports them.
//! - `Client` is immutable configuration plus a `Transport`. Middleware see
//!   the assembled `http::Request` and may edit it or abort the call.
//! - `Response` owns the fully read body; the connection is released before
//!   it is returned.
//! - Everything is synchronous. The only blocking point is the transport
//!   round-trip, bounded by the client timeout and the request `Context`.

pub mod body;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod method;
pub mod middleware;
pub mod request;
pub mod response;
pub mod transport;

pub use ureq::http;

pub use body::BodyFormat;
pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use context::Context;
pub use error::{BoxError, Error, Result};
pub use method::Method;
pub use middleware::{BearerAuth, Middleware};
pub use request::{MultiMap, Request};
pub use response::{Response, StatusClass};
pub use transport::{BufferedResponse, OutgoingRequest, Transport, UreqTransport};
