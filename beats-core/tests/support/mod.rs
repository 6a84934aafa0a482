//! In-process mock of the storefront API for integration tests.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use beats_core::auth::{NoSession, StaticToken};
use beats_core::{StoreClient, StoreConfig};

#[allow(dead_code)]
pub const TEST_TOKEN: &str = "test-token";

/// Initialize tracing for tests with proper test output handling
#[allow(dead_code)]
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_target(false)
        .try_init();
}

#[derive(Debug, Clone)]
pub struct WishRecord {
    pub id: i64,
    pub item_type: String,
    pub item_id: String,
}

pub struct ServerState {
    pub beats: Vec<Value>,
    pub soundpacks: Vec<Value>,
    pub wishlist: Vec<WishRecord>,
    pub next_wishlist_id: i64,
    /// Answer GET /wishlist as {"data": [...]} instead of a bare array.
    pub wrap_wishlist_in_data: bool,
    /// Entry ids whose DELETE fails with 500.
    pub fail_delete: HashSet<i64>,
    /// Fail every POST /wishlist with 500.
    pub reject_add: bool,
    /// Hold POST /wishlist for this long before answering.
    pub add_delay: Duration,
    /// Hold DELETE /wishlist/{id} for this long before answering.
    pub delete_delay: Duration,
}

impl Default for ServerState {
    fn default() -> Self {
        Self {
            beats: vec![
                json!({
                    "id": 1,
                    "title": "Night Drive",
                    "genre": "Trap",
                    "bpm": 140,
                    "key": "Am",
                    "price": 29.99,
                    "preview_url": "https://cdn.example/previews/1.mp3",
                    "cover_url": "https://cdn.example/covers/1.jpg",
                    "producer": { "name": "Baraju" },
                    "popularity": 12,
                    "created_at": "2024-05-01T12:30:00"
                }),
                json!({
                    "id": 2,
                    "title": "Sunrise",
                    "genre": "Afrobeats",
                    "bpm": 102,
                    "key": "C",
                    "price": 19.99,
                    "producer": { "name": "Baraju" },
                    "popularity": 30,
                    "created_at": "2024-06-10T08:00:00"
                }),
            ],
            soundpacks: vec![json!({
                "id": 3,
                "name": "Drum Essentials",
                "genre": "Drums",
                "price": 49.0,
                "sounds_count": 120,
                "producer": { "name": "Baraju" },
                "created_at": "2024-04-02T10:00:00"
            })],
            wishlist: Vec::new(),
            next_wishlist_id: 1,
            wrap_wishlist_in_data: false,
            fail_delete: HashSet::new(),
            reject_add: false,
            add_delay: Duration::ZERO,
            delete_delay: Duration::ZERO,
        }
    }
}

pub struct MockStore {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<ServerState>>,
}

type Shared = Arc<Mutex<ServerState>>;

impl MockStore {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(ServerState::default()));
        let app = Router::new()
            .route("/beats", get(list_beats))
            .route("/soundpacks", get(list_soundpacks))
            .route("/wishlist", get(list_wishlist).post(add_wishlist))
            .route("/wishlist/:id", delete(remove_wishlist))
            .route("/purchase", post(initiate_purchase))
            .route("/purchases/history", get(purchase_history))
            .route("/discounts/active", get(active_discounts))
            .route("/discounts/validate", post(validate_discount))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock store");
        let addr = listener.local_addr().expect("mock store addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock store");
        });
        Self { addr, state }
    }

    pub fn config(&self) -> StoreConfig {
        StoreConfig::new(format!("http://{}", self.addr))
    }

    /// Client with a valid session.
    pub fn client(&self) -> Arc<StoreClient> {
        let client = StoreClient::new(self.config(), Arc::new(StaticToken(TEST_TOKEN.into())))
            .expect("build client");
        Arc::new(client)
    }

    /// Client with no session: authenticated endpoints must fail locally.
    #[allow(dead_code)]
    pub fn anon_client(&self) -> Arc<StoreClient> {
        let client = StoreClient::new(self.config(), Arc::new(NoSession)).expect("build client");
        Arc::new(client)
    }

    #[allow(dead_code)]
    pub fn locked(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    #[allow(dead_code)]
    pub fn wishlist_len(&self) -> usize {
        self.locked().wishlist.len()
    }

    /// Pre-seed a server-side wishlist record, as if added from another
    /// device. Returns the entry id.
    #[allow(dead_code)]
    pub fn seed_wishlist(&self, item_type: &str, item_id: &str) -> i64 {
        let mut state = self.locked();
        let id = state.next_wishlist_id;
        state.next_wishlist_id += 1;
        state.wishlist.push(WishRecord {
            id,
            item_type: item_type.into(),
            item_id: item_id.into(),
        });
        id
    }
}

fn authed(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TEST_TOKEN))
        .unwrap_or(false)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
}

fn record_json(record: &WishRecord) -> Value {
    json!({
        "id": record.id,
        "item_type": record.item_type,
        "item_id": record.item_id,
    })
}

fn id_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn list_beats(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let beats = state.lock().unwrap().beats.clone();
    let filtered: Vec<Value> = match params.get("genre") {
        Some(genre) => beats
            .into_iter()
            .filter(|b| b.get("genre").and_then(|g| g.as_str()) == Some(genre))
            .collect(),
        None => beats,
    };
    Json(Value::Array(filtered))
}

async fn list_soundpacks(State(state): State<Shared>) -> Json<Value> {
    Json(Value::Array(state.lock().unwrap().soundpacks.clone()))
}

async fn list_wishlist(State(state): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    if !authed(&headers) {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    let records: Vec<Value> = state.wishlist.iter().map(record_json).collect();
    let body = if state.wrap_wishlist_in_data {
        json!({ "data": records })
    } else {
        Value::Array(records)
    };
    (StatusCode::OK, Json(body))
}

async fn add_wishlist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authed(&headers) {
        return unauthorized();
    }
    let delay = state.lock().unwrap().add_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let mut state = state.lock().unwrap();
    if state.reject_add {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "database error" })),
        );
    }
    let item_type = body
        .get("item_type")
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .to_string();
    let item_id = body.get("item_id").map(id_as_string).unwrap_or_default();

    if let Some(existing) = state
        .wishlist
        .iter()
        .find(|r| r.item_type == item_type && r.item_id == item_id)
    {
        return (
            StatusCode::OK,
            Json(json!({
                "message": "Item already in wishlist",
                "data": record_json(existing),
            })),
        );
    }

    let id = state.next_wishlist_id;
    state.next_wishlist_id += 1;
    let record = WishRecord {
        id,
        item_type,
        item_id,
    };
    let body = json!({
        "message": "Item added to wishlist",
        "data": record_json(&record),
    });
    state.wishlist.push(record);
    (StatusCode::CREATED, Json(body))
}

async fn remove_wishlist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    if !authed(&headers) {
        return unauthorized();
    }
    let delay = state.lock().unwrap().delete_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let mut state = state.lock().unwrap();
    if state.fail_delete.contains(&id) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "delete failed" })),
        );
    }
    let before = state.wishlist.len();
    state.wishlist.retain(|r| r.id != id);
    if state.wishlist.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Wishlist item not found" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "message": "Item removed from wishlist" })),
    )
}

async fn initiate_purchase(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authed(&headers) {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    let item_type = body.get("item_type").and_then(|t| t.as_str()).unwrap_or("");
    let item_id = body.get("item_id").map(id_as_string).unwrap_or_default();
    let catalog = match item_type {
        "beat" => &state.beats,
        "soundpack" => &state.soundpacks,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid item type" })),
            )
        }
    };
    let item = catalog
        .iter()
        .find(|i| i.get("id").map(id_as_string).as_deref() == Some(&item_id));
    let Some(item) = item else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Item not found" })),
        );
    };
    let price = item.get("price").and_then(|p| p.as_f64()).unwrap_or(0.0);
    (
        StatusCode::OK,
        Json(json!({
            "payment_url": "https://checkout.example/session-abc",
            "access_code": "session-abc",
            "reference": format!("ref-{}-{}", item_type, item_id),
            "payment_id": 17,
            "amount_usd": price,
            "amount_kes": price * 130.0,
            "currency": "KES"
        })),
    )
}

async fn purchase_history(headers: HeaderMap) -> impl IntoResponse {
    if !authed(&headers) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!([{
            "id": 5,
            "item_type": "beat",
            "item_id": 1,
            "item_title": "Night Drive",
            "item_cover": "https://cdn.example/covers/1.jpg",
            "producer_name": "Baraju",
            "file_type": "wav",
            "amount": 29.99,
            "currency": "USD",
            "purchased_at": "2024-06-15T09:00:00",
            "download_url": "https://cdn.example/dl/5"
        }])),
    )
}

async fn active_discounts() -> Json<Value> {
    Json(json!([
        {
            "code": "SUMMER",
            "name": "Summer Sale",
            "percentage": 20,
            "applicable_to": "global",
            "valid_until": "2030-01-01T00:00:00"
        },
        {
            "code": "NIGHT5",
            "name": "Night Drive Special",
            "percentage": 5,
            "applicable_to": "beat",
            "item_id": 1
        }
    ]))
}

async fn validate_discount(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    if !authed(&headers) {
        return unauthorized();
    }
    let code = body.get("code").and_then(|c| c.as_str()).unwrap_or("");
    if code == "SUMMER" {
        return (
            StatusCode::OK,
            Json(json!({
                "valid": true,
                "discount": {
                    "code": "SUMMER",
                    "name": "Summer Sale",
                    "percentage": 20,
                    "original_price": 29.99,
                    "final_price": 23.99,
                    "savings": 6.0
                }
            })),
        );
    }
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "valid": false, "error": "Invalid discount code" })),
    )
}
