//! Client configuration.
//!
//! A `ClientConfig` is a plain value: build it in code, through
//! `ClientBuilder`, or from `COURIER_*` environment variables.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::request::MultiMap;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_BASE_URL: &str = "COURIER_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "COURIER_TIMEOUT_SECS";
pub const ENV_PROXY: &str = "COURIER_PROXY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix for every request endpoint. Trailing slashes are ignored.
    pub base_url: String,
    pub timeout: Duration,
    pub proxy: Option<String>,
    /// Headers added to every request ahead of the request's own.
    pub headers: MultiMap,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            headers: MultiMap::new(),
        }
    }
}

impl ClientConfig {
    /// Read `COURIER_BASE_URL`, `COURIER_TIMEOUT_SECS` and `COURIER_PROXY`.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(base_url) = env::var(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Ok(raw) = env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_TIMEOUT_SECS} must be whole seconds, got {raw:?}")))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(proxy) = env::var(ENV_PROXY) {
            if !proxy.trim().is_empty() {
                config.proxy = Some(proxy);
            }
        }
        Ok(config)
    }

    pub(crate) fn add_header(&mut self, key: String, value: String) {
        self.headers.entry(key).or_default().push(value);
    }
}
