#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

pub const MOCK_KEY: &str = "test-anon-key";

/// Rows held by the mock table, shared with the test for inspection.
#[derive(Clone, Default)]
pub struct MockTable {
    rows: Arc<Mutex<Vec<Value>>>,
    next_id: Arc<AtomicU64>,
}

impl MockTable {
    pub async fn rows(&self) -> Vec<Value> {
        self.rows.lock().await.clone()
    }

    pub async fn push(&self, mut row: Value) -> Value {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        row["id"] = json!(id);
        self.rows.lock().await.push(row.clone());
        row
    }
}

pub struct MockStore {
    pub base_url: String,
    pub table: MockTable,
}

type Params = Vec<(String, String)>;

fn authorized(headers: &HeaderMap) -> bool {
    let key = headers.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    key == Some(MOCK_KEY) && bearer == Some(MOCK_KEY)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Invalid API key" })),
    )
        .into_response()
}

fn id_text(row: &Value) -> String {
    match &row["id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(row: &Value, params: &Params) -> bool {
    params.iter().all(|(key, value)| match key.as_str() {
        "id" => value.strip_prefix("eq.").is_some_and(|id| id_text(row) == id),
        "pickup_date" => {
            let date = row["pickup_date"].as_str().unwrap_or_default();
            if let Some(bound) = value.strip_prefix("gte.") {
                date >= bound
            } else if let Some(bound) = value.strip_prefix("lte.") {
                date <= bound
            } else {
                false
            }
        }
        _ => true,
    })
}

async fn select(
    State(table): State<MockTable>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut rows: Vec<Value> = table
        .rows()
        .await
        .into_iter()
        .filter(|row| matches(row, &params))
        .collect();
    if let Some((_, order)) = params.iter().find(|(key, _)| key == "order") {
        rows.sort_by(|a, b| {
            a["pickup_date"]
                .as_str()
                .unwrap_or_default()
                .cmp(b["pickup_date"].as_str().unwrap_or_default())
        });
        if order.ends_with(".desc") {
            rows.reverse();
        }
    }
    Json(rows).into_response()
}

async fn insert(State(table): State<MockTable>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let row = table.push(body).await;
    (StatusCode::CREATED, Json(vec![row])).into_response()
}

async fn update(
    State(table): State<MockTable>,
    headers: HeaderMap,
    Query(params): Query<Params>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut rows = table.rows.lock().await;
    let mut updated = Vec::new();
    for row in rows.iter_mut().filter(|row| matches(row, &params)) {
        if let (Some(target), Some(changes)) = (row.as_object_mut(), body.as_object()) {
            for (key, value) in changes {
                target.insert(key.clone(), value.clone());
            }
        }
        updated.push(row.clone());
    }
    Json(updated).into_response()
}

async fn remove(State(table): State<MockTable>, headers: HeaderMap, Query(params): Query<Params>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut rows = table.rows.lock().await;
    let (removed, kept): (Vec<Value>, Vec<Value>) = rows.drain(..).partition(|row| matches(row, &params));
    *rows = kept;
    Json(removed).into_response()
}

async fn missing_table() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "code": "PGRST205",
            "message": "Could not find the table in the schema cache"
        })),
    )
        .into_response()
}

/// Serves a PostgREST-shaped `loads` table on a random local port.
pub async fn spawn_mock_store() -> MockStore {
    let table = MockTable::default();
    let app = Router::new()
        .route(
            "/rest/v1/loads",
            get(select).post(insert).patch(update).delete(remove),
        )
        .fallback(missing_table)
        .with_state(table.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock store");
    let addr = listener.local_addr().expect("mock store address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock store stopped");
    });

    MockStore {
        base_url: format!("http://{addr}"),
        table,
    }
}

pub fn stored_row(pickup_date: &str, pickup: &str, delivery: &str) -> Value {
    json!({
        "current_location": "",
        "pickup_location": pickup,
        "delivery_location": delivery,
        "empty_miles": 0,
        "loaded_miles": 120,
        "total_miles": 120,
        "pickup_date": pickup_date,
        "delivery_date": null,
        "timestamp": "2025-06-01T12:00:00Z",
        "reference": "REF-1",
        "rate": 900.0,
        "fuel_cost": 150.0,
        "type": "Dry van",
        "broker_name": "Acme Logistics",
        "status": "Pending"
    })
}
