//! Raw request execution.
//!
//! A [`Transport`] performs exactly one HTTP exchange and reports either the
//! response or a classified [`TransportError`]. Retries, status handling and
//! JSON decoding live in the client on top of it.

use log::debug;
use reqwest::blocking::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Request method supported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub json: Option<Value>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Creates a request with no body, query or headers.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            json: None,
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Sets the JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Appends query parameters.
    pub fn query<'a, I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Appends headers.
    pub fn headers<'a, I>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

/// Status and body of a received response, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    /// Creates a response from its status and body text.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Closed set of failure kinds a transport can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Could not establish a connection.
    Connect,
    /// Connect, read or overall timeout.
    Timeout,
    /// Anything else: malformed request, protocol or body errors.
    Request,
}

/// A failed exchange, before any HTTP status was seen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    /// Creates an error of the given kind.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a [`TransportErrorKind::Connect`] error.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    /// Shorthand for a [`TransportErrorKind::Timeout`] error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    /// Shorthand for a [`TransportErrorKind::Request`] error.
    pub fn request(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Request, message)
    }

    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Connect | TransportErrorKind::Timeout
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        // A connect timeout reports both; it is a timeout.
        let kind = if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Request
        };
        Self::new(kind, error_chain(&error))
    }
}

/// Joins an error's message with those of its sources.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}

/// Performs one raw HTTP exchange.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send {
    /// Sends one request without retrying.
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError>;

    /// Releases any held connection resource. Must tolerate repeated calls.
    fn close(&mut self);
}

/// [`Transport`] backed by a blocking reqwest client.
pub struct ReqwestTransport {
    timeout: Duration,
    use_session: bool,
    session: Option<Client>,
}

impl ReqwestTransport {
    /// In session mode the connection pool is built here and reused until
    /// [`Transport::close`]; otherwise each `send` builds and drops its own.
    pub fn new(use_session: bool, timeout: Duration) -> Result<Self, TransportError> {
        let session = if use_session {
            Some(build_client(timeout)?)
        } else {
            None
        };
        Ok(Self {
            timeout,
            use_session,
            session,
        })
    }

    /// Returns whether this transport holds a session client.
    pub fn uses_session(&self) -> bool {
        self.use_session
    }
}

impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        let one_shot: Client;
        let client = match &self.session {
            Some(client) => client,
            None if self.use_session => {
                return Err(TransportError::request("HTTP session has been closed"));
            }
            None => {
                one_shot = build_client(self.timeout)?;
                &one_shot
            }
        };

        let mut builder = match request.method {
            Method::Get => client.get(&request.url),
            Method::Post => client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.json {
            builder = builder.json(body);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        debug!("{} {} -> {}", request.method, request.url, status);

        Ok(RawResponse { status, body })
    }

    fn close(&mut self) {
        if self.session.take().is_some() {
            debug!("HTTP session closed");
        }
    }
}

fn build_client(timeout: Duration) -> Result<Client, TransportError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TransportError::request(format!("Failed to build HTTP client: {}", e)))
}
