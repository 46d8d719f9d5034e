//! HTTP client with built-in retry logic and error translation.

use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use super::config::ClientConfig;
use super::retry::with_retry;
use super::transport::{
    Method, RawResponse, ReqwestTransport, Request, Transport, TransportError, TransportErrorKind,
};
use super::{Headers, Params};
use crate::environment::Environment;
use crate::error::{ConfigurationError, MpesaApiError, MpesaError, UNKNOWN_ERROR_MESSAGE};

/// Blocking client for the gateway REST API.
///
/// Every request either returns the decoded JSON body of a 2xx response or a
/// single [`MpesaApiError`]. Transient network failures are retried up to
/// [`ClientConfig::max_attempts`] times first.
///
/// The connection pool held in session mode is released by [`close`] or when
/// the client is dropped.
///
/// [`close`]: HttpClient::close
pub struct HttpClient<T: Transport = ReqwestTransport> {
    environment: Environment,
    config: ClientConfig,
    transport: T,
    closed: bool,
}

impl HttpClient<ReqwestTransport> {
    /// Creates a client for `env` (`"sandbox"` or `"production"`) with default
    /// settings.
    pub fn new(env: &str, use_session: bool) -> Result<Self, ConfigurationError> {
        let environment = env.parse::<Environment>()?;
        Self::with_config(environment, ClientConfig::default().with_session(use_session))
    }

    /// Creates a client with explicit settings.
    pub fn with_config(
        environment: Environment,
        config: ClientConfig,
    ) -> Result<Self, ConfigurationError> {
        let transport = ReqwestTransport::new(config.use_session, config.timeout)
            .map_err(|e| ConfigurationError::Transport(e.message))?;
        Ok(Self::with_transport(environment, transport, config))
    }
}

impl<T: Transport> HttpClient<T> {
    /// Creates a client on top of an arbitrary transport.
    pub fn with_transport(environment: Environment, transport: T, config: ClientConfig) -> Self {
        debug!(
            "Creating {} client for {} (session: {})",
            environment,
            environment.base_url(),
            config.use_session
        );
        Self {
            environment,
            config,
            transport,
            closed: false,
        }
    }

    /// Returns the base URL of the configured environment.
    pub fn base_url(&self) -> &'static str {
        self.environment.base_url()
    }

    /// Returns the configured environment.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Returns a reference to the client settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether [`close`](HttpClient::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Sends `json` as the body of a POST to `base_url + path`.
    #[tracing::instrument(skip(self, json, headers))]
    pub fn post<B>(&self, path: &str, json: &B, headers: &Headers) -> Result<Value, MpesaApiError>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(json).map_err(|e| {
            MpesaError::request_failed(format!("Failed to serialize request body: {}", e))
        })?;
        let request = Request::new(Method::Post, self.url(path))
            .json(body)
            .headers(headers);
        self.execute(request)
    }

    /// Sends a GET to `base_url + path` with optional query parameters.
    #[tracing::instrument(skip(self, params, headers))]
    pub fn get(
        &self,
        path: &str,
        params: Option<&Params>,
        headers: Option<&Headers>,
    ) -> Result<Value, MpesaApiError> {
        let mut request = Request::new(Method::Get, self.url(path));
        if let Some(params) = params {
            request = request.query(params);
        }
        if let Some(headers) = headers {
            request = request.headers(headers);
        }
        self.execute(request)
    }

    /// Releases the held connection resource. Later calls are no-ops.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.transport.close();
        self.closed = true;
        debug!("{} client closed", self.environment);
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    fn execute(&self, request: Request) -> Result<Value, MpesaApiError> {
        if self.closed {
            return Err(MpesaError::request_failed("Client has been closed").into());
        }

        let operation = format!("{} {}", request.method, request.url);
        let response = with_retry(
            &operation,
            self.config.attempts(),
            self.config.retry_delay,
            || self.transport.send(&request),
        )
        .map_err(transport_failure)?;

        handle_response(response)
    }
}

/// Maps a final transport failure to the structured error.
fn transport_failure(error: TransportError) -> MpesaApiError {
    let mpesa_error = match error.kind {
        TransportErrorKind::Connect => MpesaError::connection_error(error.message),
        TransportErrorKind::Timeout => MpesaError::request_timeout(error.message),
        TransportErrorKind::Request => MpesaError::request_failed(error.message),
    };
    mpesa_error.into()
}

/// Decodes a response, turning non-2xx statuses and undecodable bodies into errors.
fn handle_response(response: RawResponse) -> Result<Value, MpesaApiError> {
    let status = response.status;
    let value = match serde_json::from_str::<Value>(&response.body) {
        Ok(value) => value,
        Err(e) => {
            warn!("HTTP {}: response body is not valid JSON ({})", status, e);
            return Err(MpesaError::http(status, response.body).into());
        }
    };

    if response.is_success() {
        return Ok(value);
    }

    let message = match value.get("errorMessage") {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => UNKNOWN_ERROR_MESSAGE.to_string(),
    };
    let mut error = MpesaError::http(status, message);
    if let Some(request_id) = value.get("requestId").and_then(Value::as_str) {
        error = error.with_request_id(request_id);
    }
    debug!("HTTP {}: {}", status, error.error_message);

    Err(error.with_raw_response(value).into())
}
