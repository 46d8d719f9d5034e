//! HTTP client module with retry logic and error handling.

mod client;
mod config;
mod retry;
mod transport;

use std::collections::BTreeMap;

pub use client::HttpClient;
pub use config::{ClientConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT};
pub use retry::with_retry;
pub use transport::{
    Method, RawResponse, ReqwestTransport, Request, Transport, TransportError, TransportErrorKind,
};

/// Request headers, name to value.
pub type Headers = BTreeMap<String, String>;

/// Query parameters, name to value.
pub type Params = BTreeMap<String, String>;
