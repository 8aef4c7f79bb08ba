#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, Response};
use axum::Router;
use serde_json::Value;

use mailcannon_backend::api;
use mailcannon_backend::config::{Config, StoreBackend};
use mailcannon_backend::error::{AppError, Result};
use mailcannon_backend::mail::{
    DeliveryFailure, MailTransport, OutboundMessage, SenderCredentials, TransportFactory,
};
use mailcannon_backend::models::{AccessVisit, TrackedAccess};
use mailcannon_backend::store::{AccessStore, MemoryAccessStore, RecordOutcome};
use mailcannon_backend::AppState;

pub const BOUNDARY: &str = "----mailcannon-test-boundary";

pub fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 7000,
        frontend_url: "http://localhost:3000".to_string(),
        store_backend: StoreBackend::Memory,
        redis_url: "redis://localhost".to_string(),
        tracked_access_prefix: "tracked_accesses".to_string(),
        smtp_host: Some("smtp.test".to_string()),
        smtp_port: 587,
        smtp_timeout_seconds: 15,
        sender_display_name: None,
        tracked_file_path: concat!(env!("CARGO_MANIFEST_DIR"), "/public/trackable/document.txt")
            .to_string(),
        max_attachment_bytes: 1024,
        trust_proxy: false,
    }
}

/// Transport whose per-recipient answers are scripted up front
#[derive(Clone, Default)]
pub struct ScriptedTransports {
    failures: Arc<HashMap<String, DeliveryFailure>>,
    pub delivered: Arc<Mutex<Vec<OutboundMessage>>>,
    pub attempts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTransports {
    pub fn failing(failures: Vec<(&str, DeliveryFailure)>) -> Self {
        Self {
            failures: Arc::new(
                failures
                    .into_iter()
                    .map(|(r, f)| (r.to_string(), f))
                    .collect(),
            ),
            ..Self::default()
        }
    }
}

struct ScriptedSession(ScriptedTransports);

#[async_trait]
impl MailTransport for ScriptedSession {
    async fn deliver(
        &self,
        message: &OutboundMessage,
    ) -> std::result::Result<(), DeliveryFailure> {
        self.0.attempts.lock().unwrap().push(message.to.clone());
        match self.0.failures.get(&message.to) {
            Some(failure) => Err(failure.clone()),
            None => {
                self.0.delivered.lock().unwrap().push(message.clone());
                Ok(())
            }
        }
    }

    fn host(&self) -> &str {
        "smtp.test"
    }
}

impl TransportFactory for ScriptedTransports {
    fn connect(&self, _credentials: &SenderCredentials) -> Result<Box<dyn MailTransport>> {
        Ok(Box::new(ScriptedSession(self.clone())))
    }
}

/// Store whose writes always fail, as when the database is unreachable
pub struct FailingStore;

#[async_trait]
impl AccessStore for FailingStore {
    async fn record_access(&self, _visit: &AccessVisit) -> Result<RecordOutcome> {
        Err(AppError::Store("connection reset by peer".to_string()))
    }

    async fn find(
        &self,
        _tracking_id: &str,
        _recipient_email: &str,
    ) -> Result<Option<TrackedAccess>> {
        Err(AppError::Store("connection reset by peer".to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        Err(AppError::Store("connection reset by peer".to_string()))
    }
}

pub fn app(config: Config, store: Arc<MemoryAccessStore>, transports: ScriptedTransports) -> Router {
    app_with_store(config, store, transports)
}

pub fn app_with_store(
    config: Config,
    store: Arc<dyn AccessStore>,
    transports: ScriptedTransports,
) -> Router {
    let state = AppState::new(config, store, Arc::new(transports));
    let peer: SocketAddr = "198.51.100.23:40000".parse().unwrap();
    api::create_router(state).layer(MockConnectInfo(peer))
}

/// Multipart body from text fields plus an optional (filename, type, bytes) file
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"attachment\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn send_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/email/send")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
