//! End-to-end tests of the `reqwest` transport against a loopback HTTP stub.

use std::sync::Arc;
use std::time::Duration;

use getpaid_http::{
    ClientConfig, ErrorKind, GetPaidClient, Method, Outcome, PreparedRequest, ReqwestTransport,
    RequestSpec, Transport,
};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

// ============================================================================
// Loopback Stub
// ============================================================================

/// A canned reply served by the stub.
#[derive(Clone)]
struct Reply {
    status: u16,
    headers: Vec<(&'static str, &'static str)>,
    body: String,
    delay: Duration,
}

impl Reply {
    fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Serves one reply per connection, in order, and records raw requests.
struct Stub {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl Stub {
    async fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        tokio::spawn(async move {
            for reply in replies {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let raw = read_request(&mut socket).await;
                recorded.lock().await.push(raw);
                tokio::time::sleep(reply.delay).await;
                write_reply(&mut socket, &reply).await;
            }
        });

        Self { base_url, requests }
    }

    async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

async fn write_reply(socket: &mut TcpStream, reply: &Reply) {
    let mut head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        reply.body.len()
    );
    for (name, value) in &reply.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");

    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(reply.body.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn transport(base_url: &str, timeout: Duration) -> ReqwestTransport {
    let config = ClientConfig::new(base_url)
        .with_timeout(timeout)
        .with_user_agent("getpaid-tests/1.0");
    ReqwestTransport::new(&config).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_request_reaches_wire_with_headers_and_query() {
    let stub = Stub::start(vec![Reply::json(200, &json!({"id": "cus_1"}))]).await;
    let client = GetPaidClient::builder()
        .api_key("sk_live_wire")
        .base_url(&stub.base_url)
        .user_agent("getpaid-tests/1.0")
        .build()
        .unwrap();

    let spec = RequestSpec::get("/api/customers")
        .query("email", "a b@c.co")
        .query_values("status", ["active"]);
    let customer: Value = client.request(&spec).await.unwrap();
    assert_eq!(customer["id"], "cus_1");

    let requests = stub.requests().await;
    assert_eq!(requests.len(), 1);
    let raw = requests[0].to_ascii_lowercase();
    assert!(raw.starts_with("get /api/customers?email=a+b%40c.co&status%5b%5d=active http/1.1"));
    assert!(raw.contains("x-api-key: sk_live_wire"));
    assert!(raw.contains("user-agent: getpaid-tests/1.0"));
    assert!(raw.contains("content-type: application/json"));
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let stub = Stub::start(vec![Reply::json(201, &json!({"id": "ord_1"}))]).await;
    let transport = transport(&stub.base_url, Duration::from_secs(5));

    let mut request = PreparedRequest::from_spec(
        &RequestSpec::new(Method::Post, "/api/orders").body(json!({"currency": "USD"})),
    );
    request.set_header("X-API-Key", "sk_test");

    let outcome = transport.send(&request).await;
    assert_eq!(outcome.status(), Some(201));

    let raw = stub.requests().await.remove(0);
    assert!(raw.starts_with("POST /api/orders HTTP/1.1"));
    assert!(raw.ends_with(r#"{"currency":"USD"}"#));
}

#[tokio::test]
async fn test_response_headers_preserved() {
    let stub = Stub::start(vec![
        Reply::json(429, &json!({"error": "Too many requests"}))
            .header("Retry-After", "30")
            .header("X-Request-Id", "req_wire"),
    ])
    .await;
    let transport = transport(&stub.base_url, Duration::from_secs(5));

    let outcome = transport
        .send(&PreparedRequest::from_spec(&RequestSpec::get("/api/plans")))
        .await;

    let Outcome::Response(response) = outcome else {
        panic!("expected a response");
    };
    assert_eq!(response.status, 429);
    assert_eq!(response.retry_after_secs(), Some(30));
    assert_eq!(response.request_id(), Some("req_wire"));
}

#[tokio::test]
async fn test_rate_limit_end_to_end() {
    let stub = Stub::start(vec![
        Reply::json(429, &json!({"message": "Slow down"})).header("Retry-After", "12"),
    ])
    .await;
    let client = GetPaidClient::builder()
        .api_key("sk_test")
        .base_url(&stub.base_url)
        .retry_delay(Duration::from_millis(1))
        .build()
        .unwrap();

    let err = client.get::<Value>("/api/usage").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimit { retry_after: Some(12) });
    assert_eq!(err.message(), "Slow down");
    assert_eq!(stub.requests().await.len(), 1);
}

#[tokio::test]
async fn test_server_error_retried_over_the_wire() {
    let stub = Stub::start(vec![
        Reply::json(503, &json!({"error": "maintenance"})),
        Reply::json(200, &json!({"status": "ok"})),
    ])
    .await;
    let client = GetPaidClient::builder()
        .api_key("sk_test")
        .base_url(&stub.base_url)
        .retry_delay(Duration::from_millis(10))
        .build()
        .unwrap();

    let health = client.health_check().await.unwrap();
    assert!(health.is_ok());
    assert_eq!(stub.requests().await.len(), 2);
}

#[tokio::test]
async fn test_connection_refused_is_network_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = GetPaidClient::builder()
        .api_key("sk_test")
        .base_url(base_url)
        .retries(1)
        .retry_delay(Duration::from_millis(1))
        .build()
        .unwrap();

    let outcome = client
        .pipeline()
        .execute_with_attempts(&RequestSpec::get("/api/health"))
        .await;

    assert_eq!(outcome.attempts_count(), 2);
    let err = outcome.result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.status(), None);
    assert!(err.message().starts_with("Connection failed: "));
    assert!(
        err.message().to_ascii_lowercase().contains("refused"),
        "cause missing from {:?}",
        err.message()
    );
}

#[tokio::test]
async fn test_unbuildable_request_fails_once() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = GetPaidClient::builder()
        .api_key("sk_test")
        .base_url(base_url)
        .retries(3)
        .retry_delay(Duration::from_millis(200))
        .build()
        .unwrap();

    let start = std::time::Instant::now();
    let outcome = client
        .pipeline()
        .execute_with_attempts(&RequestSpec::get("/api/health").header("Bad Name", "x"))
        .await;

    assert_eq!(outcome.attempts_count(), 1);
    assert!(start.elapsed() < Duration::from_millis(200));
    let err = outcome.result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.message().starts_with("Invalid request: "));
    assert!(err.message().to_ascii_lowercase().contains("header"));
}

#[tokio::test]
async fn test_control_characters_in_api_key_fail_once() {
    let client = GetPaidClient::builder()
        .api_key("sk_test\n")
        .base_url("http://127.0.0.1:9")
        .retry_delay(Duration::from_millis(200))
        .build()
        .unwrap();

    let outcome = client
        .pipeline()
        .execute_with_attempts(&RequestSpec::get("/api/health"))
        .await;

    assert_eq!(outcome.attempts_count(), 1);
    assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::Network);
}

#[tokio::test]
async fn test_timeout_is_network_failure() {
    let stub = Stub::start(vec![
        Reply::json(200, &json!({"status": "ok"})).delayed(Duration::from_secs(2)),
    ])
    .await;
    let client = GetPaidClient::builder()
        .api_key("sk_test")
        .base_url(&stub.base_url)
        .timeout(Duration::from_millis(100))
        .retries(0)
        .build()
        .unwrap();

    let err = client.health_check().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.message(), "timeout of 100ms exceeded");
}
