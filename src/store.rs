use crate::calendar::{format_iso, DateRange};
use crate::models::{Load, LoadChanges, LoadStatus, NewLoad};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("The loads table was not found in the database. Create it and try again.")]
    TableMissing,
    #[error("Could not reach the database. Check your network connection.")]
    Unreachable(#[source] reqwest::Error),
    #[error("Load {0} was not found.")]
    NotFound(String),
    #[error("The database returned an invalid load record: {0}")]
    InvalidRecord(String),
    #[error("The database request failed ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_postgrest(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// A table of load records keyed by store-assigned id.
#[async_trait]
pub trait LoadStore: Send + Sync {
    async fn select_all(&self, order: SortOrder) -> Result<Vec<Load>, StoreError>;

    /// Loads whose pickup date falls inside `range`, by pickup date.
    async fn select_range(&self, range: DateRange, order: SortOrder) -> Result<Vec<Load>, StoreError>;

    async fn select_one(&self, id: &str) -> Result<Load, StoreError>;

    async fn insert(&self, load: NewLoad) -> Result<Load, StoreError>;

    async fn update(&self, id: &str, changes: LoadChanges) -> Result<Load, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Row shape as returned by the store, checked before it becomes a [`Load`].
#[derive(Debug, Deserialize)]
pub struct LoadRow {
    id: Value,
    current_location: Option<String>,
    pickup_location: Option<String>,
    delivery_location: Option<String>,
    empty_miles: Option<f64>,
    loaded_miles: Option<f64>,
    total_miles: Option<f64>,
    pickup_date: Option<String>,
    delivery_date: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    reference: Option<String>,
    rate: Option<f64>,
    fuel_cost: Option<f64>,
    #[serde(rename = "type")]
    load_type: Option<String>,
    broker_name: Option<String>,
    status: Option<String>,
}

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidRecord(message.into())
}

fn miles_column(name: &str, value: Option<f64>) -> Result<Option<u32>, StoreError> {
    match value {
        None => Ok(None),
        Some(miles) if miles.is_finite() && miles >= 0.0 && miles <= u32::MAX as f64 => {
            Ok(Some(miles.round() as u32))
        }
        Some(miles) => Err(invalid(format!("{name} is {miles}"))),
    }
}

fn money_column(name: &str, value: Option<f64>) -> Result<Option<f64>, StoreError> {
    match value {
        Some(amount) if !amount.is_finite() || amount < 0.0 => {
            Err(invalid(format!("{name} is {amount}")))
        }
        other => Ok(other),
    }
}

fn date_column(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>, StoreError> {
    // Accept timestamp-typed columns too; only the calendar part matters.
    value
        .map(|text| {
            let day = text.get(..10).unwrap_or(text);
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|_| invalid(format!("{name} '{text}' is not a date")))
        })
        .transpose()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

impl TryFrom<LoadRow> for Load {
    type Error = StoreError;

    fn try_from(row: LoadRow) -> Result<Self, Self::Error> {
        let id = match row.id {
            Value::Number(n) => n.to_string(),
            Value::String(s) if !s.is_empty() => s,
            other => return Err(invalid(format!("id {other} is not a number or string"))),
        };

        let pickup_location = non_empty(row.pickup_location)
            .ok_or_else(|| invalid(format!("load {id} has no pickup location")))?;
        let delivery_location = non_empty(row.delivery_location)
            .ok_or_else(|| invalid(format!("load {id} has no delivery location")))?;
        let pickup_date = date_column("pickup_date", row.pickup_date.as_deref())?
            .ok_or_else(|| invalid(format!("load {id} has no pickup date")))?;
        let delivery_date = date_column("delivery_date", row.delivery_date.as_deref())?;
        let timestamp = row
            .timestamp
            .ok_or_else(|| invalid(format!("load {id} has no timestamp")))?;

        let empty_miles = miles_column("empty_miles", row.empty_miles)?;
        let loaded_miles = miles_column("loaded_miles", row.loaded_miles)?;
        let total_miles = empty_miles
            .unwrap_or(0)
            .checked_add(loaded_miles.unwrap_or(0))
            .ok_or_else(|| invalid(format!("load {id} has more miles than can be counted")))?;
        if let Some(stored) = miles_column("total_miles", row.total_miles)? {
            if stored != total_miles {
                warn!(%id, stored, derived = total_miles, "stored total miles disagree, using derived value");
            }
        }

        let status = match row.status.as_deref().map(str::trim) {
            None | Some("") => LoadStatus::default(),
            Some(text) => text.parse().map_err(invalid)?,
        };

        Ok(Load {
            current_location: row.current_location.unwrap_or_default(),
            pickup_location,
            delivery_location,
            empty_miles,
            loaded_miles,
            total_miles,
            pickup_date,
            delivery_date,
            timestamp,
            reference: non_empty(row.reference),
            rate: money_column("rate", row.rate)?,
            fuel_cost: money_column("fuel_cost", row.fuel_cost)?,
            load_type: non_empty(row.load_type),
            broker_name: non_empty(row.broker_name),
            status,
            id,
        })
    }
}

pub fn rows_to_loads(rows: Vec<LoadRow>) -> Result<Vec<Load>, StoreError> {
    rows.into_iter().map(Load::try_from).collect()
}

/// Client for a PostgREST table (the REST dialect Supabase exposes).
pub struct RemoteLoadStore {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

impl RemoteLoadStore {
    pub fn new(base_url: &str, api_key: &str, table: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::Rejected {
                status: 0,
                message: format!("could not build HTTP client: {err}"),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: reqwest::Method) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::ACCEPT, "application/json")
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let response = builder.send().await.map_err(StoreError::Unreachable)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%status, "could not read store error body: {err}");
                String::new()
            }
        };
        Err(classify_failure(status, &body))
    }

    async fn rows(&self, builder: RequestBuilder) -> Result<Vec<Load>, StoreError> {
        let response = self.send(builder).await?;
        let rows: Vec<LoadRow> = response
            .json()
            .await
            .map_err(|err| invalid(format!("unexpected response shape: {err}")))?;
        rows_to_loads(rows)
    }

    async fn single_row(&self, builder: RequestBuilder, id: &str) -> Result<Load, StoreError> {
        self.rows(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

/// Maps a failed store response onto the error kinds the UI distinguishes.
pub fn classify_failure(status: StatusCode, body: &str) -> StoreError {
    let parsed: Option<PostgrestError> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|e| e.code.as_deref());

    if status == StatusCode::NOT_FOUND || matches!(code, Some("PGRST205") | Some("42P01")) {
        return StoreError::TableMissing;
    }

    let message = parsed
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.trim().to_string());
    StoreError::Rejected {
        status: status.as_u16(),
        message,
    }
}

fn eq_filter(id: &str) -> (&'static str, String) {
    ("id", format!("eq.{id}"))
}

#[async_trait]
impl LoadStore for RemoteLoadStore {
    async fn select_all(&self, order: SortOrder) -> Result<Vec<Load>, StoreError> {
        debug!(endpoint = %self.endpoint, "selecting all loads");
        let order = format!("pickup_date.{}", order.as_postgrest());
        self.rows(
            self.request(reqwest::Method::GET)
                .query(&[("select", "*"), ("order", order.as_str())]),
        )
        .await
    }

    async fn select_range(&self, range: DateRange, order: SortOrder) -> Result<Vec<Load>, StoreError> {
        debug!(endpoint = %self.endpoint, %range, "selecting loads in range");
        let order = format!("pickup_date.{}", order.as_postgrest());
        let gte = format!("gte.{}", format_iso(range.start));
        let lte = format!("lte.{}", format_iso(range.end));
        self.rows(self.request(reqwest::Method::GET).query(&[
            ("select", "*"),
            ("pickup_date", gte.as_str()),
            ("pickup_date", lte.as_str()),
            ("order", order.as_str()),
        ]))
        .await
    }

    async fn select_one(&self, id: &str) -> Result<Load, StoreError> {
        let builder = self
            .request(reqwest::Method::GET)
            .query(&[("select", "*".to_string()), eq_filter(id)]);
        self.single_row(builder, id).await
    }

    async fn insert(&self, load: NewLoad) -> Result<Load, StoreError> {
        #[derive(serde::Serialize)]
        struct Insert {
            #[serde(flatten)]
            load: NewLoad,
            timestamp: DateTime<Utc>,
        }

        let body = Insert {
            load,
            timestamp: Utc::now(),
        };
        let builder = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=representation")
            .json(&body);
        self.single_row(builder, "new").await
    }

    async fn update(&self, id: &str, changes: LoadChanges) -> Result<Load, StoreError> {
        let builder = self
            .request(reqwest::Method::PATCH)
            .query(&[eq_filter(id)])
            .header("Prefer", "return=representation")
            .json(&changes);
        self.single_row(builder, id).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .send(
                self.request(reqwest::Method::DELETE)
                    .query(&[eq_filter(id)])
                    .header("Prefer", "return=representation"),
            )
            .await?;
        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|err| invalid(format!("unexpected delete response: {err}")))?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

/// In-process table with ascending integer ids. Backs demo mode and tests.
#[derive(Default)]
pub struct MemoryLoadStore {
    next_id: AtomicU64,
    loads: Mutex<Vec<Load>>,
}

impl MemoryLoadStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut loads: Vec<Load>, order: SortOrder) -> Vec<Load> {
        loads.sort_by_key(|load| load.pickup_date);
        if order == SortOrder::Descending {
            loads.reverse();
        }
        loads
    }
}

#[async_trait]
impl LoadStore for MemoryLoadStore {
    async fn select_all(&self, order: SortOrder) -> Result<Vec<Load>, StoreError> {
        let loads = self.loads.lock().await;
        Ok(Self::sorted(loads.clone(), order))
    }

    async fn select_range(&self, range: DateRange, order: SortOrder) -> Result<Vec<Load>, StoreError> {
        let loads = self.loads.lock().await;
        let matching = loads
            .iter()
            .filter(|load| range.contains(load.pickup_date))
            .cloned()
            .collect();
        Ok(Self::sorted(matching, order))
    }

    async fn select_one(&self, id: &str) -> Result<Load, StoreError> {
        let loads = self.loads.lock().await;
        loads
            .iter()
            .find(|load| load.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn insert(&self, load: NewLoad) -> Result<Load, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = Load {
            id: id.to_string(),
            current_location: load.current_location,
            pickup_location: load.pickup_location,
            delivery_location: load.delivery_location,
            empty_miles: load.empty_miles,
            loaded_miles: load.loaded_miles,
            total_miles: load.total_miles,
            pickup_date: load.pickup_date,
            delivery_date: load.delivery_date,
            timestamp: Utc::now(),
            reference: load.reference,
            rate: load.rate,
            fuel_cost: load.fuel_cost,
            load_type: load.load_type,
            broker_name: load.broker_name,
            status: load.status,
        };
        self.loads.lock().await.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: &str, changes: LoadChanges) -> Result<Load, StoreError> {
        let mut loads = self.loads.lock().await;
        let load = loads
            .iter_mut()
            .find(|load| load.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(value) = changes.current_location {
            load.current_location = value;
        }
        if let Some(value) = changes.pickup_location {
            load.pickup_location = value;
        }
        if let Some(value) = changes.delivery_location {
            load.delivery_location = value;
        }
        if let Some(mileage) = changes.mileage {
            load.empty_miles = mileage.empty_miles;
            load.loaded_miles = mileage.loaded_miles;
            load.total_miles = mileage.total_miles;
        }
        if let Some(value) = changes.pickup_date {
            load.pickup_date = value;
        }
        if let Some(value) = changes.delivery_date {
            load.delivery_date = value;
        }
        if let Some(value) = changes.reference {
            load.reference = value;
        }
        if let Some(value) = changes.rate {
            load.rate = value;
        }
        if let Some(value) = changes.fuel_cost {
            load.fuel_cost = value;
        }
        if let Some(value) = changes.load_type {
            load.load_type = value;
        }
        if let Some(value) = changes.broker_name {
            load.broker_name = value;
        }
        if let Some(value) = changes.status {
            load.status = value;
        }
        Ok(load.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut loads = self.loads.lock().await;
        let before = loads.len();
        loads.retain(|load| load.id != id);
        if loads.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Result<Load, StoreError> {
        let row: LoadRow = serde_json::from_value(value).unwrap();
        Load::try_from(row)
    }

    fn base_row() -> Value {
        json!({
            "id": 42,
            "current_location": "Los Angeles, CA",
            "pickup_location": "Las Vegas, NV",
            "delivery_location": "Phoenix, AZ",
            "empty_miles": 228,
            "loaded_miles": 256.0,
            "total_miles": 484,
            "pickup_date": "2025-06-12",
            "delivery_date": "2025-06-13",
            "timestamp": "2025-06-11T08:30:00+00:00",
            "rate": 1200.5,
            "fuel_cost": 310,
            "status": "In Transit",
            "created_by": "someone"
        })
    }

    #[test]
    fn row_maps_to_load() {
        let load = row(base_row()).unwrap();
        assert_eq!(load.id, "42");
        assert_eq!(load.loaded_miles, Some(256));
        assert_eq!(load.total_miles, 484);
        assert_eq!(load.status, LoadStatus::InTransit);
        assert_eq!(load.fuel_cost, Some(310.0));
        assert_eq!(load.pickup_date, NaiveDate::from_ymd_opt(2025, 6, 12).unwrap());
    }

    #[test]
    fn row_total_is_rederived() {
        let mut value = base_row();
        value["total_miles"] = json!(9999);
        value["empty_miles"] = Value::Null;
        let load = row(value).unwrap();
        assert_eq!(load.empty_miles, None);
        assert_eq!(load.total_miles, 256);
    }

    #[test]
    fn row_rejects_mileage_that_overflows_total() {
        let mut value = base_row();
        value["empty_miles"] = json!(4e9);
        value["loaded_miles"] = json!(4e9);
        assert!(matches!(row(value), Err(StoreError::InvalidRecord(_))));
    }

    #[test]
    fn row_with_string_id_and_timestamp_dates() {
        let mut value = base_row();
        value["id"] = json!("a1b2");
        value["pickup_date"] = json!("2025-06-12T00:00:00");
        value["status"] = Value::Null;
        let load = row(value).unwrap();
        assert_eq!(load.id, "a1b2");
        assert_eq!(load.status, LoadStatus::Pending);
    }

    #[test]
    fn row_rejects_bad_data() {
        let mut negative = base_row();
        negative["empty_miles"] = json!(-5);
        assert!(matches!(row(negative), Err(StoreError::InvalidRecord(_))));

        let mut unknown_status = base_row();
        unknown_status["status"] = json!("Lost");
        assert!(matches!(row(unknown_status), Err(StoreError::InvalidRecord(_))));

        let mut no_pickup = base_row();
        no_pickup["pickup_location"] = json!("  ");
        assert!(matches!(row(no_pickup), Err(StoreError::InvalidRecord(_))));

        let mut bad_date = base_row();
        bad_date["pickup_date"] = json!("June 12");
        assert!(matches!(row(bad_date), Err(StoreError::InvalidRecord(_))));
    }

    #[test]
    fn failures_are_classified() {
        assert!(matches!(
            classify_failure(StatusCode::NOT_FOUND, ""),
            StoreError::TableMissing
        ));
        assert!(matches!(
            classify_failure(
                StatusCode::BAD_REQUEST,
                r#"{"code":"42P01","message":"relation \"public.loads\" does not exist"}"#
            ),
            StoreError::TableMissing
        ));
        match classify_failure(StatusCode::UNAUTHORIZED, r#"{"message":"Invalid API key"}"#) {
            StoreError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_texts_are_distinct() {
        let missing = StoreError::TableMissing.to_string();
        let not_found = StoreError::NotFound("3".into()).to_string();
        assert!(missing.contains("table was not found"));
        assert_ne!(missing, not_found);
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryLoadStore::new();
        let new_load = |day: u32| NewLoad {
            current_location: String::new(),
            pickup_location: "Boston, MA".into(),
            delivery_location: "Springfield, MA".into(),
            empty_miles: Some(0),
            loaded_miles: Some(80),
            total_miles: 80,
            pickup_date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            delivery_date: None,
            reference: None,
            rate: None,
            fuel_cost: None,
            load_type: None,
            broker_name: None,
            status: LoadStatus::Pending,
        };

        let first = store.insert(new_load(9)).await.unwrap();
        let second = store.insert(new_load(20)).await.unwrap();
        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");

        let week = DateRange {
            start: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
        };
        let in_week = store.select_range(week, SortOrder::Ascending).await.unwrap();
        assert_eq!(in_week.len(), 1);

        let updated = store
            .update(
                "2",
                LoadChanges {
                    status: Some(LoadStatus::Paid),
                    ..LoadChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, LoadStatus::Paid);
        assert_eq!(updated.timestamp, second.timestamp);

        let all = store.select_all(SortOrder::Descending).await.unwrap();
        assert_eq!(all[0].id, "2");

        store.delete("1").await.unwrap();
        assert!(matches!(store.delete("1").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.select_one("1").await, Err(StoreError::NotFound(_))));
    }
}
