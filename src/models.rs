use crate::calendar::DateRange;
use crate::mileage::Mileage;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadStatus {
    #[default]
    Pending,
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
    Invoiced,
    Paid,
}

impl LoadStatus {
    pub const ALL: [LoadStatus; 5] = [
        LoadStatus::Pending,
        LoadStatus::InTransit,
        LoadStatus::Delivered,
        LoadStatus::Invoiced,
        LoadStatus::Paid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Pending => "Pending",
            LoadStatus::InTransit => "In Transit",
            LoadStatus::Delivered => "Delivered",
            LoadStatus::Invoiced => "Invoiced",
            LoadStatus::Paid => "Paid",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoadStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown load status '{s}'"))
    }
}

/// A stored load. Mileage is always derived, never typed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub id: String,
    pub current_location: String,
    pub pickup_location: String,
    pub delivery_location: String,
    pub empty_miles: Option<u32>,
    pub loaded_miles: Option<u32>,
    pub total_miles: u32,
    pub pickup_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    pub timestamp: DateTime<Utc>,
    pub reference: Option<String>,
    pub rate: Option<f64>,
    pub fuel_cost: Option<f64>,
    #[serde(rename = "type")]
    pub load_type: Option<String>,
    pub broker_name: Option<String>,
    #[serde(default)]
    pub status: LoadStatus,
}

impl Load {
    pub fn mileage(&self) -> Mileage {
        Mileage::new(self.empty_miles, self.loaded_miles)
    }

    pub fn net(&self) -> f64 {
        self.rate.unwrap_or(0.0) - self.fuel_cost.unwrap_or(0.0)
    }
}

/// Add-load form submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadInput {
    #[serde(default)]
    pub current_location: String,
    #[serde(default)]
    pub pickup_location: String,
    #[serde(default)]
    pub delivery_location: String,
    pub pickup_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub rate: Option<f64>,
    pub fuel_cost: Option<f64>,
    #[serde(rename = "type")]
    pub load_type: Option<String>,
    pub broker_name: Option<String>,
    pub status: Option<LoadStatus>,
}

/// Edit-load submission. Absent fields are left untouched; an explicit
/// `null` clears an optional field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadPatch {
    pub current_location: Option<String>,
    pub pickup_location: Option<String>,
    pub delivery_location: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "present")]
    pub delivery_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present")]
    pub reference: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub rate: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub fuel_cost: Option<Option<f64>>,
    #[serde(rename = "type", default, deserialize_with = "present")]
    pub load_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub broker_name: Option<Option<String>>,
    pub status: Option<LoadStatus>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl LoadPatch {
    pub fn touches_locations(&self) -> bool {
        self.current_location.is_some()
            || self.pickup_location.is_some()
            || self.delivery_location.is_some()
    }
}

/// A validated record ready for insertion; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLoad {
    pub current_location: String,
    pub pickup_location: String,
    pub delivery_location: String,
    pub empty_miles: Option<u32>,
    pub loaded_miles: Option<u32>,
    pub total_miles: u32,
    pub pickup_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub rate: Option<f64>,
    pub fuel_cost: Option<f64>,
    #[serde(rename = "type")]
    pub load_type: Option<String>,
    pub broker_name: Option<String>,
    pub status: LoadStatus,
}

/// Partial update sent to the store. Only `Some` fields are serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_location: Option<String>,
    #[serde(flatten)]
    pub mileage: Option<MileageColumns>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_cost: Option<Option<f64>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub load_type: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<LoadStatus>,
}

/// The three mileage columns, always written together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MileageColumns {
    pub empty_miles: Option<u32>,
    pub loaded_miles: Option<u32>,
    pub total_miles: u32,
}

impl From<Mileage> for MileageColumns {
    fn from(m: Mileage) -> Self {
        Self {
            empty_miles: m.empty_miles,
            loaded_miles: m.loaded_miles,
            total_miles: m.total_miles,
        }
    }
}

impl LoadChanges {
    pub fn is_empty(&self) -> bool {
        *self == LoadChanges::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub total_loads: usize,
    pub total_miles: u64,
    pub total_revenue: f64,
    pub total_fuel: f64,
    pub net_profit: f64,
    pub avg_per_mile: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub range: DateRange,
    pub label: String,
    pub prev_week: NaiveDate,
    pub next_week: NaiveDate,
    pub loads: Vec<Load>,
    pub summary: WeeklySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub date: NaiveDate,
    pub empty_miles: u32,
    pub loaded_miles: u32,
    pub total_miles: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonthlyChart {
    pub range: DateRange,
    pub label: String,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadList {
    pub loads: Vec<Load>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CitySuggestions {
    pub suggestions: Vec<String>,
}
