//! HTTP transport core for the M-Pesa Daraja API.
//!
//! [`HttpClient`] resolves the base URL from the target [`Environment`],
//! performs blocking POST/GET requests with bounded retry of transient
//! network failures, and reports every failure as one [`MpesaApiError`].
//!
//! ```no_run
//! use mpesakit::{Headers, HttpClient};
//! use serde_json::json;
//!
//! let mut client = HttpClient::new("sandbox", true)?;
//! let mut headers = Headers::new();
//! headers.insert("Authorization".to_string(), "Bearer <token>".to_string());
//!
//! let response = client.post("/mpesa/stkpush/v1/processrequest", &json!({}), &headers)?;
//! println!("{}", response);
//! client.close();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod environment;
pub mod error;
pub mod http;

pub use environment::Environment;
pub use error::{ConfigurationError, MpesaApiError, MpesaError};
pub use http::{ClientConfig, Headers, HttpClient, Params};
