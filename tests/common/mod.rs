#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use stockroom_api::{
    api_v1_routes,
    config::AppConfig,
    events::{process_events, EventSender},
    handlers::AppServices,
    store::{InMemoryStockStore, SharedStore},
    AppState,
};

/// Application state and router backed by the in-memory store, for
/// exercising the full HTTP surface and the services beneath it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let cfg = AppConfig::new("127.0.0.1", 0, "test");
        let store: SharedStore = Arc::new(InMemoryStockStore::new());

        let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
        tokio::spawn(process_events(event_rx));
        let event_sender = EventSender::new(event_tx);

        let services = AppServices::new(store.clone(), event_sender.clone(), &cfg);
        let state = AppState {
            store,
            config: cfg,
            event_sender,
            services,
        };
        let router = Router::new()
            .nest("/api/v1", api_v1_routes())
            .with_state(state.clone());

        Self { router, state }
    }

    pub async fn seed_stock(&self, product_id: Uuid, location_id: Uuid, quantity: i64) {
        self.state
            .store
            .adjust_stock(product_id, location_id, quantity)
            .await
            .expect("seed stock");
    }

    pub async fn quantity(&self, product_id: Uuid, location_id: Uuid) -> i64 {
        self.state
            .store
            .get_stock_level(product_id, location_id)
            .await
            .expect("read stock level")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }
}

/// Services plus their backing store, for tests that bypass HTTP.
pub fn test_services() -> (AppServices, SharedStore) {
    let cfg = AppConfig::new("127.0.0.1", 0, "test");
    let store: SharedStore = Arc::new(InMemoryStockStore::new());

    let (event_tx, event_rx) = mpsc::channel(cfg.event_channel_capacity);
    tokio::spawn(process_events(event_rx));
    let event_sender = EventSender::new(event_tx);

    let services = AppServices::new(store.clone(), event_sender, &cfg);
    (services, store)
}
