use mockito::{Matcher, Server};
use mpesakit::environment::SANDBOX_BASE_URL;
use mpesakit::http::{RawResponse, ReqwestTransport, Request, Transport, TransportError};
use mpesakit::{ClientConfig, Environment, Headers, HttpClient, Params};
use serde_json::json;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Rewrites the sandbox host to a local address and counts attempts.
struct ForwardingTransport {
    target: String,
    inner: ReqwestTransport,
    attempts: Arc<AtomicUsize>,
}

impl Transport for ForwardingTransport {
    fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let mut forwarded = request.clone();
        forwarded.url = request.url.replacen(SANDBOX_BASE_URL, &self.target, 1);
        self.inner.send(&forwarded)
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

fn client_for(
    target: String,
    use_session: bool,
) -> (HttpClient<ForwardingTransport>, Arc<AtomicUsize>) {
    client_with_timeout(target, use_session, Duration::from_secs(5))
}

fn client_with_timeout(
    target: String,
    use_session: bool,
    timeout: Duration,
) -> (HttpClient<ForwardingTransport>, Arc<AtomicUsize>) {
    let config = ClientConfig::default()
        .with_session(use_session)
        .with_timeout(timeout);
    let attempts = Arc::new(AtomicUsize::new(0));
    let transport = ForwardingTransport {
        target,
        inner: ReqwestTransport::new(config.use_session, config.timeout).unwrap(),
        attempts: attempts.clone(),
    };
    (
        HttpClient::with_transport(Environment::Sandbox, transport, config),
        attempts,
    )
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// Accepts connections and never answers them.
fn stalled_server_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => held.push(stream),
                Err(_) => break,
            }
        }
    });
    format!("http://127.0.0.1:{}", port)
}

#[test_log::test]
fn test_post_round_trip() {
    for use_session in [true, false] {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/mpesa/stkpush/v1/processrequest")
            .match_header("authorization", "Bearer token")
            .match_body(Matcher::Json(json!({"Amount": 1})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"foo": "bar"}"#)
            .create();

        let (mut client, attempts) = client_for(server.url(), use_session);
        let headers = Headers::from([("Authorization".to_string(), "Bearer token".to_string())]);
        let result = client
            .post(
                "/mpesa/stkpush/v1/processrequest",
                &json!({"Amount": 1}),
                &headers,
            )
            .unwrap();

        mock.assert();
        assert_eq!(result, json!({"foo": "bar"}));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        client.close();
    }
}

#[test_log::test]
fn test_get_round_trip_with_params() {
    for use_session in [true, false] {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/oauth/v1/generate")
            .match_query(Matcher::UrlEncoded(
                "grant_type".into(),
                "client_credentials".into(),
            ))
            .with_status(200)
            .with_body(r#"{"access_token": "abc", "expires_in": "3599"}"#)
            .create();

        let (client, _) = client_for(server.url(), use_session);
        let params = Params::from([("grant_type".to_string(), "client_credentials".to_string())]);
        let result = client
            .get("/oauth/v1/generate", Some(&params), None)
            .unwrap();

        mock.assert();
        assert_eq!(result["access_token"], "abc");
    }
}

#[test]
fn test_provider_error_payload() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/fail")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"requestId": "req-1", "errorCode": "400.002.02", "errorMessage": "Bad Request - Invalid Amount"}"#)
        .create();

    let (client, attempts) = client_for(server.url(), true);
    let err = client
        .post("/fail", &json!({}), &Headers::new())
        .unwrap_err();

    assert_eq!(err.error_code(), "HTTP_400");
    assert!(err.error_message().contains("Bad Request"));
    assert_eq!(err.error.request_id.as_deref(), Some("req-1"));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_non_json_server_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("GET", "/fail")
        .with_status(500)
        .with_body("Internal Server Error")
        .create();

    let (client, attempts) = client_for(server.url(), false);
    let err = client.get("/fail", None, None).unwrap_err();

    assert_eq!(err.error_code(), "HTTP_500");
    assert!(err.error_message().contains("Internal Server Error"));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test_log::test]
fn test_persistent_connect_failure_is_retried() {
    for use_session in [true, false] {
        let (client, attempts) = client_for(closed_port_url(), use_session);
        let err = client
            .post("/test", &json!({"a": 1}), &Headers::new())
            .unwrap_err();

        assert_eq!(err.error_code(), "CONNECTION_ERROR");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}

#[test_log::test]
fn test_persistent_timeout_is_retried() {
    let url = stalled_server_url();
    for use_session in [true, false] {
        let (client, attempts) =
            client_with_timeout(url.clone(), use_session, Duration::from_millis(300));
        let err = client.get("/test", None, None).unwrap_err();

        assert_eq!(err.error_code(), "REQUEST_TIMEOUT");
        assert!(err.error_message().contains("timed out"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}

#[test]
fn test_invalid_header_is_not_retried() {
    let server = Server::new();
    let (client, attempts) = client_for(server.url(), true);
    let headers = Headers::from([("bad header".to_string(), "v".to_string())]);

    let err = client.get("/test", None, Some(&headers)).unwrap_err();

    assert_eq!(err.error_code(), "REQUEST_FAILED");
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_close_twice_then_request_fails() {
    let server = Server::new();
    let (mut client, attempts) = client_for(server.url(), true);

    client.close();
    client.close();
    let err = client.get("/test", None, None).unwrap_err();

    assert_eq!(err.error_code(), "REQUEST_FAILED");
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
}
