use crate::calendar::parse_iso;
use crate::cities::CityTable;
use crate::config::{clear_credentials, persist_credentials, CredentialSource, StoreCredentials};
use crate::errors::AppError;
use crate::mileage::Mileage;
use crate::models::{CitySuggestions, Load, LoadInput, LoadList, LoadPatch, MonthlyChart, WeeklyReport};
use crate::state::{AppState, ConnectionStatus};
use crate::ui::{render_index, render_setup};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let status = state.status().await;
    if status.configured {
        Html(render_index(&today(), &status))
    } else {
        Html(render_setup(None))
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn get_config(State(state): State<AppState>) -> Json<ConnectionStatus> {
    Json(state.status().await)
}

pub async fn save_config(
    State(state): State<AppState>,
    Json(payload): Json<StoreCredentials>,
) -> Result<Json<ConnectionStatus>, AppError> {
    let credentials = payload.validate()?;
    let connection = state.open(&credentials, CredentialSource::File)?;
    persist_credentials(&state.settings.config_path, &credentials).await?;
    state.install(connection).await;
    info!(url = %credentials.url, "store credentials saved");
    Ok(Json(state.status().await))
}

pub async fn clear_config(State(state): State<AppState>) -> Result<Json<ConnectionStatus>, AppError> {
    clear_credentials(&state.settings.config_path).await?;
    state.disconnect().await;
    Ok(Json(state.status().await))
}

#[derive(Debug, Deserialize)]
pub struct WeekQuery {
    pub week: Option<String>,
}

pub async fn get_week(
    State(state): State<AppState>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeeklyReport>, AppError> {
    let date = date_or_today(query.week.as_deref())?;
    let service = state.service().await?;
    Ok(Json(service.week(date).await?))
}

pub async fn get_all(State(state): State<AppState>) -> Result<Json<LoadList>, AppError> {
    let service = state.service().await?;
    Ok(Json(LoadList {
        loads: service.all().await?,
    }))
}

pub async fn create_load(
    State(state): State<AppState>,
    Json(payload): Json<LoadInput>,
) -> Result<(StatusCode, Json<Load>), AppError> {
    let service = state.service().await?;
    let load = service.add(payload).await?;
    Ok((StatusCode::CREATED, Json(load)))
}

pub async fn update_load(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<LoadPatch>,
) -> Result<Json<Load>, AppError> {
    let service = state.service().await?;
    Ok(Json(service.update(&id, payload).await?))
}

pub async fn delete_load(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let service = state.service().await?;
    service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

pub async fn get_monthly_chart(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlyChart>, AppError> {
    let date = date_or_today(query.month.as_deref())?;
    let service = state.service().await?;
    Ok(Json(service.month(date).await?))
}

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn get_cities(Query(query): Query<CityQuery>) -> Json<CitySuggestions> {
    let suggestions = CityTable::us()
        .suggest(&query.q)
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(CitySuggestions { suggestions })
}

#[derive(Debug, Deserialize)]
pub struct MileageQuery {
    #[serde(default)]
    pub current: String,
    #[serde(default)]
    pub pickup: String,
    #[serde(default)]
    pub delivery: String,
}

pub async fn get_mileage(
    State(state): State<AppState>,
    Query(query): Query<MileageQuery>,
) -> Result<Json<Mileage>, AppError> {
    let service = state.service().await?;
    Ok(Json(service.preview_mileage(&query.current, &query.pickup, &query.delivery)))
}

fn date_or_today(text: Option<&str>) -> Result<NaiveDate, AppError> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => Ok(parse_iso(text)?),
        None => Ok(Local::now().date_naive()),
    }
}

fn today() -> String {
    Local::now().date_naive().to_string()
}
