//! Test utilities for the agent
//!
//! Provides an in-process mock collector for forwarder tests.

use crate::forwarder::EchoForm;
use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Form, Router};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const COLLECTOR_PATH: &str = "/sensor/radar/";

/// Mock collector state
#[derive(Debug, Clone, Default)]
pub struct MockCollectorState {
    /// Forms received, in arrival order
    pub received: Arc<Mutex<Vec<EchoForm>>>,
    /// Answer posts with 500 when set
    pub failing: Arc<AtomicBool>,
}

/// Mock collector implementation
#[derive(Debug, Default)]
pub struct MockCollector {
    state: MockCollectorState,
    port: u16,
}

impl MockCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the mock collector and return its endpoint URL
    pub async fn start(mut self) -> Result<(Self, String)> {
        let app = Router::new()
            .route(COLLECTOR_PATH, get(status_handler).post(echo_handler))
            .with_state(self.state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        self.port = listener.local_addr()?.port();

        let url = format!("http://127.0.0.1:{}{}", self.port, COLLECTOR_PATH);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock collector error: {}", e);
            }
        });

        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                break;
            }
        }

        Ok((self, url))
    }

    pub fn received(&self) -> Vec<EchoForm> {
        self.state.received.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }
}

async fn status_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn echo_handler(
    State(state): State<MockCollectorState>,
    Form(form): Form<EchoForm>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    if state.failing.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let response = serde_json::json!({ "x": form.x, "y": form.y, "echo_cm": form.echo_cm });
    state.received.lock().unwrap().push(form);
    Ok((StatusCode::CREATED, Json(response)))
}
