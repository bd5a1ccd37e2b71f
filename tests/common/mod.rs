//! Shared test helpers: a scripted in-process API server.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use pagedash::auth::{CredentialStore, Identity};
use pagedash::config::routes::{LOGIN_PATH, REFRESH_PATH, REGISTER_PATH};
use pagedash::config::ClientConfig;
use pagedash::error::PagedashError;
use pagedash::http::{ApiRequest, ApiResponse, Transport};
use pagedash::navigation::RouterState;
use pagedash::pipeline::ApiClient;

/// Always answers 500.
pub const FAILING_PATH: &str = "/api/boom";

/// What the refresh endpoint answers.
#[derive(Debug, Clone)]
pub enum RefreshReply {
    Token(String),
    Status(u16),
    /// The connection drops before any response.
    NetworkError,
    /// The call never completes.
    Hang,
}

/// Mock transport behaving like the dashboard API.
///
/// Protected paths answer 200 only for the currently valid token, 401
/// otherwise. A successful refresh makes its token the valid one. Every
/// request is recorded in arrival order.
pub struct MockApi {
    valid_token: Mutex<Option<String>>,
    refresh_reply: Mutex<RefreshReply>,
    latency: Duration,
    reject_all: AtomicBool,
    reject_login: AtomicBool,
    network_down: AtomicBool,
    refresh_calls: AtomicUsize,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockApi {
    pub fn new(latency: Duration) -> Self {
        Self {
            valid_token: Mutex::new(None),
            refresh_reply: Mutex::new(RefreshReply::Token("new123".to_string())),
            latency,
            reject_all: AtomicBool::new(false),
            reject_login: AtomicBool::new(false),
            network_down: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn accept_token(&self, token: &str) {
        *self.valid_token.lock().unwrap() = Some(token.to_string());
    }

    pub fn refresh_reply(&self, reply: RefreshReply) {
        *self.refresh_reply.lock().unwrap() = reply;
    }

    /// Protected paths answer 401 whatever token they carry.
    pub fn reject_all(&self) {
        self.reject_all.store(true, Ordering::SeqCst);
    }

    /// The login endpoint answers 401.
    pub fn reject_login(&self) {
        self.reject_login.store(true, Ordering::SeqCst);
    }

    /// Every call except the refresh fails at the transport level.
    pub fn network_down(&self) {
        self.network_down.store(true, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests to `path`, in arrival order.
    pub fn requests_to(&self, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path() == path)
            .collect()
    }

    fn answer(&self, request: &ApiRequest) -> Result<ApiResponse, PagedashError> {
        let response = match request.path() {
            REFRESH_PATH => match self.refresh_reply.lock().unwrap().clone() {
                RefreshReply::Token(token) => {
                    self.accept_token(&token);
                    ApiResponse::json_body(200, &session_body(&token))
                }
                RefreshReply::Status(status) => ApiResponse::json_body(
                    status,
                    &json!({ "message": "Refresh token expired" }),
                ),
                RefreshReply::NetworkError => {
                    return Err(PagedashError::Transport("connection reset".to_string()))
                }
                RefreshReply::Hang => unreachable!("hanging refresh is handled in send"),
            },
            _ if self.network_down.load(Ordering::SeqCst) => {
                return Err(PagedashError::Transport("connection refused".to_string()))
            }
            LOGIN_PATH if self.reject_login.load(Ordering::SeqCst) => ApiResponse::json_body(
                401,
                &json!({ "detail": "Invalid email or password" }),
            ),
            LOGIN_PATH | REGISTER_PATH => ApiResponse::json_body(200, &json!({ "data": {} })),
            FAILING_PATH => ApiResponse::json_body(500, &json!({ "message": "Server exploded" })),
            path => {
                let valid = self.valid_token.lock().unwrap().clone();
                let authorized = !self.reject_all.load(Ordering::SeqCst)
                    && valid.is_some()
                    && request.bearer_token() == valid.as_deref();
                if authorized {
                    ApiResponse::json_body(200, &json!({ "data": { "path": path } }))
                } else {
                    ApiResponse::json_body(401, &json!({ "title": "Unauthorized" }))
                }
            }
        };
        Ok(response)
    }
}

#[async_trait]
impl Transport for MockApi {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, PagedashError> {
        self.requests.lock().unwrap().push(request.clone());
        if request.path() == REFRESH_PATH {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            let hang = matches!(*self.refresh_reply.lock().unwrap(), RefreshReply::Hang);
            if hang {
                return std::future::pending().await;
            }
        }
        tokio::time::sleep(self.latency).await;
        self.answer(request)
    }
}

pub fn session_body(token: &str) -> serde_json::Value {
    json!({
        "data": {
            "token": token,
            "idUsuario": 7,
            "email": "ana@example.com",
            "rol": "Admin",
            "fullName": "Ana Ruiz"
        }
    })
}

pub fn ana() -> Identity {
    Identity::new(7, "ana@example.com", "Admin", "Ana Ruiz")
}

/// Everything a pipeline test needs to poke at.
pub struct Harness {
    pub api: Arc<MockApi>,
    pub store: Arc<CredentialStore>,
    pub router: Arc<RouterState>,
    pub client: Arc<ApiClient>,
}

impl Harness {
    /// Signed in with `token`, currently on `/dashboard/analiticas`.
    pub fn signed_in(token: &str, latency: Duration) -> Self {
        let harness = Self::signed_out(latency);
        harness.store.set_credential(token, &ana());
        harness
    }

    pub fn signed_out(latency: Duration) -> Self {
        let api = Arc::new(MockApi::new(latency));
        let store = Arc::new(CredentialStore::in_memory());
        let router = Arc::new(RouterState::new("/dashboard/analiticas"));
        let client = Arc::new(ApiClient::new(
            ClientConfig::new("http://dashboard.test"),
            api.clone(),
            store.clone(),
            router.clone(),
        ));
        Self {
            api,
            store,
            router,
            client,
        }
    }
}
