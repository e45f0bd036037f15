//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{extract::State, routing::post, Form, Json, Router};
use header_reflector::config::ServiceConfig;
use header_reflector::{HttpServer, Shutdown};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A reflector running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<ServiceConfig>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the reflector with the given configuration.
pub async fn start_server(mut config: ServiceConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    TestServer {
        addr,
        shutdown,
        config_updates,
    }
}

/// Form fields received by the mock siteverify endpoint.
pub type Submissions = Arc<Mutex<Vec<Vec<(String, String)>>>>;

/// Start a mock Turnstile siteverify endpoint answering with `reply`.
#[allow(dead_code)]
pub async fn start_siteverify(reply: Value) -> (String, Submissions) {
    let submissions: Submissions = Arc::default();

    async fn verify(
        State((reply, submissions)): State<(Value, Submissions)>,
        Form(fields): Form<Vec<(String, String)>>,
    ) -> Json<Value> {
        submissions.lock().unwrap().push(fields);
        Json(reply)
    }

    let app = Router::new()
        .route("/turnstile/v0/siteverify", post(verify))
        .with_state((reply, submissions.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (
        format!("http://{addr}/turnstile/v0/siteverify"),
        submissions,
    )
}

#[allow(dead_code)]
pub fn always_pass() -> Value {
    json!({ "success": true, "error-codes": [] })
}
