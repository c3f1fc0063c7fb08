use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use url::Url;

pub const CASH_IN_PATH: &str = "/api/pix/cashIn";
pub const QR_CODE: &str = "00020101021226830014br.gov.bcb.pix2561qrcodes.pushinpay.test/pix/v2/cobv/9e1b6304ABCD";
pub const QR_CODE_BASE64: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// What the mock answers to a cash-in call.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// a created charge echoing the requested value
    Charge,
    /// a created charge sent only after `delay`
    SlowCharge { delay: Duration },
    Fixed { status: StatusCode, body: String },
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub host: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    response: MockResponse,
    calls: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<RecordedRequest>>>,
}

/// A local stand-in for the PushinPay cash-in API.
pub struct UpstreamMock {
    addr: SocketAddr,
    state: MockState,
}

impl UpstreamMock {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base url using `localhost`, so the gateway has to resolve the host name.
    pub fn url(&self) -> anyhow::Result<Url> {
        Ok(Url::parse(&format!("http://localhost:{}", self.addr.port()))?)
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Calls that ran until the response was produced.
    pub fn completed(&self) -> usize {
        self.state.completed.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state
            .last_request
            .lock()
            .ok()
            .and_then(|request| request.clone())
    }
}

async fn post_cash_in(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let value = body["value"].clone();

    if let Ok(mut last) = state.last_request.lock() {
        *last = Some(RecordedRequest {
            authorization: header_value(header::AUTHORIZATION),
            host: header_value(header::HOST),
            body,
        });
    }

    let response = match state.response {
        MockResponse::Charge => charge_response(value),
        MockResponse::SlowCharge { delay } => {
            tokio::time::sleep(delay).await;
            charge_response(value)
        }
        MockResponse::Fixed { status, ref body } => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body.clone(),
        ),
    };
    state.completed.fetch_add(1, Ordering::SeqCst);
    response
}

fn charge_response(value: Value) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        json!({
            "id": "9e1b2c3d-0000-4000-8000-000000000001",
            "status": "created",
            "value": value,
            "qr_code": QR_CODE,
            "qr_code_base64": QR_CODE_BASE64,
            "webhook_url": null,
            "split_rules": []
        })
        .to_string(),
    )
}

pub async fn run_server(response: MockResponse) -> anyhow::Result<UpstreamMock> {
    let state = MockState {
        response,
        calls: Arc::new(AtomicUsize::new(0)),
        completed: Arc::new(AtomicUsize::new(0)),
        last_request: Arc::new(Mutex::new(None)),
    };

    let app = Router::new()
        .route(CASH_IN_PATH, post(post_cash_in))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(UpstreamMock { addr, state })
}
