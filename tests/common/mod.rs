#![allow(dead_code)]

use ab_redirector::api::handlers::{health_handler, redirect_handler};
use ab_redirector::domain::entities::ShortUrl;
use ab_redirector::domain::visit_event::VisitEvent;
use ab_redirector::infrastructure::memory::{
    MemoryFormRepository, MemoryShortUrlRepository, MemoryVariantRepository,
    MemoryVisitRepository,
};
use ab_redirector::infrastructure::session::MemoryRevocationStore;
use ab_redirector::routes::{admin_router, service_router};
use ab_redirector::state::{AppState, Repositories, SessionSettings};
use axum::{Router, extract::ConnectInfo, routing::get};
use axum_test::TestServer;
use chrono::Utc;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::Layer;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const SESSION_SECRET: &str = "test-session-secret-0123456789abcdef";
pub const COOKIE_NAME: &str = "admin_session";
pub const PEER_ADDR: &str = "127.0.0.1:12345";

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = PEER_ADDR.parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

pub fn short_url(id: i64, code: &str, original_url: &str) -> ShortUrl {
    ShortUrl {
        id,
        short_code: code.to_string(),
        original_url: original_url.to_string(),
        title: None,
        domain_id: None,
        forward_query: true,
        date_created: Utc::now(),
    }
}

/// In-memory backends plus the state built on them.
pub struct TestApp {
    pub state: AppState,
    pub short_urls: Arc<MemoryShortUrlRepository>,
    pub forms: Arc<MemoryFormRepository>,
    pub variants: Arc<MemoryVariantRepository>,
    pub visits: mpsc::Receiver<VisitEvent>,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with_queue(100)
}

pub fn create_test_app_with_queue(capacity: usize) -> TestApp {
    let short_urls = Arc::new(MemoryShortUrlRepository::new());
    let forms = Arc::new(MemoryFormRepository::new());
    let variants = Arc::new(MemoryVariantRepository::new());

    short_urls.insert(short_url(1, "promo", "https://landing.example.com/"));

    let (tx, rx) = mpsc::channel(capacity);

    let state = AppState::new(
        Repositories {
            variants: variants.clone(),
            short_urls: short_urls.clone(),
            forms: forms.clone(),
            visits: Arc::new(MemoryVisitRepository::new()),
        },
        Arc::new(MemoryRevocationStore::new()),
        SessionSettings {
            admin_token: ADMIN_TOKEN.to_string(),
            secret: SESSION_SECRET.to_string(),
            max_age: 3600,
            cookie_name: COOKIE_NAME.to_string(),
        },
        tx,
        60,
        false,
    );

    TestApp {
        state,
        short_urls,
        forms,
        variants,
        visits: rx,
    }
}

pub fn redirect_server(state: AppState) -> TestServer {
    let app = Router::new()
        .route("/{code}", get(redirect_handler))
        .layer(MockConnectInfoLayer)
        .with_state(state);

    TestServer::new(app).unwrap()
}

pub fn admin_server(state: AppState) -> TestServer {
    let app = Router::new()
        .nest("/admin", admin_router(state.clone()))
        .with_state(state);

    TestServer::new(app).unwrap()
}

pub fn health_server(state: AppState) -> TestServer {
    let app = Router::new()
        .route("/health", get(health_handler))
        .with_state(state);

    TestServer::new(app).unwrap()
}

/// The complete route table, as served in production minus path normalization.
pub fn app_server(state: AppState) -> TestServer {
    let app = service_router(state, false).layer(MockConnectInfoLayer);

    TestServer::new(app).unwrap()
}

pub async fn login(server: &TestServer) -> String {
    let response = server
        .post("/admin/login")
        .json(&json!({ "token": ADMIN_TOKEN }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    body["token"].as_str().unwrap().to_string()
}
