use crate::calendar::{month_range, week_range};
use crate::cities::CityTable;
use crate::mileage::{derive_mileage, Mileage, UnresolvedPolicy};
use crate::models::{
    Load, LoadChanges, LoadInput, LoadPatch, MileageColumns, MonthlyChart, NewLoad, WeeklyReport,
};
use crate::report::{build_monthly_chart, build_weekly_report};
use crate::store::{LoadStore, SortOrder, StoreError};
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Please fill in the {0}.")]
    MissingField(&'static str),
    #[error("Delivery date cannot be before the pickup date.")]
    DeliveryBeforePickup,
    #[error("{0} must be a non-negative amount.")]
    NegativeAmount(&'static str),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read and mutate operations over the load table.
pub struct LoadService {
    store: Arc<dyn LoadStore>,
    cities: &'static CityTable,
    policy: UnresolvedPolicy,
}

fn trimmed(text: &str) -> String {
    text.trim().to_string()
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn required(text: &str, field: &'static str) -> Result<String, ValidationError> {
    let text = trimmed(text);
    if text.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(text)
}

fn amount(value: Option<f64>, field: &'static str) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ValidationError::NegativeAmount(field)),
        other => Ok(other),
    }
}

fn check_dates(pickup: NaiveDate, delivery: Option<NaiveDate>) -> Result<(), ValidationError> {
    match delivery {
        Some(delivery) if delivery < pickup => Err(ValidationError::DeliveryBeforePickup),
        _ => Ok(()),
    }
}

impl LoadService {
    pub fn new(store: Arc<dyn LoadStore>, policy: UnresolvedPolicy) -> Self {
        Self {
            store,
            cities: CityTable::us(),
            policy,
        }
    }

    pub fn preview_mileage(&self, current: &str, pickup: &str, delivery: &str) -> Mileage {
        derive_mileage(current, pickup.trim(), delivery.trim(), self.cities, self.policy)
    }

    pub async fn week(&self, date: NaiveDate) -> Result<WeeklyReport, StoreError> {
        let range = week_range(date);
        let loads = self.store.select_range(range, SortOrder::Ascending).await?;
        Ok(build_weekly_report(date, loads))
    }

    pub async fn month(&self, date: NaiveDate) -> Result<MonthlyChart, StoreError> {
        let range = month_range(date);
        let loads = self.store.select_range(range, SortOrder::Ascending).await?;
        Ok(build_monthly_chart(date, loads))
    }

    pub async fn all(&self) -> Result<Vec<Load>, StoreError> {
        self.store.select_all(SortOrder::Descending).await
    }

    pub fn validate(&self, input: LoadInput) -> Result<NewLoad, ValidationError> {
        let pickup_location = required(&input.pickup_location, "pickup location")?;
        let delivery_location = required(&input.delivery_location, "delivery location")?;
        let pickup_date = input
            .pickup_date
            .ok_or(ValidationError::MissingField("pickup date"))?;
        check_dates(pickup_date, input.delivery_date)?;
        let rate = amount(input.rate, "Rate")?;
        let fuel_cost = amount(input.fuel_cost, "Fuel cost")?;

        let current_location = trimmed(&input.current_location);
        let mileage = derive_mileage(
            &current_location,
            &pickup_location,
            &delivery_location,
            self.cities,
            self.policy,
        );

        Ok(NewLoad {
            current_location,
            pickup_location,
            delivery_location,
            empty_miles: mileage.empty_miles,
            loaded_miles: mileage.loaded_miles,
            total_miles: mileage.total_miles,
            pickup_date,
            delivery_date: input.delivery_date,
            reference: optional_text(input.reference),
            rate,
            fuel_cost,
            load_type: optional_text(input.load_type),
            broker_name: optional_text(input.broker_name),
            status: input.status.unwrap_or_default(),
        })
    }

    pub async fn add(&self, input: LoadInput) -> Result<Load, ServiceError> {
        let new_load = self.validate(input)?;
        let stored = self.store.insert(new_load).await?;
        info!(id = %stored.id, total_miles = stored.total_miles, "load added");
        Ok(stored)
    }

    /// Merges `patch` into the stored load and sends only what changed. The
    /// mileage columns are rewritten whenever a location is part of the patch.
    pub async fn update(&self, id: &str, patch: LoadPatch) -> Result<Load, ServiceError> {
        let current = self.store.select_one(id).await?;
        let changes = self.changes_for(&current, patch)?;
        if changes.is_empty() {
            return Ok(current);
        }
        let stored = self.store.update(id, changes).await?;
        info!(id = %stored.id, "load updated");
        Ok(stored)
    }

    pub fn changes_for(&self, current: &Load, patch: LoadPatch) -> Result<LoadChanges, ValidationError> {
        let touches_locations = patch.touches_locations();

        let current_location = patch.current_location.as_deref().map(trimmed);
        let pickup_location = patch
            .pickup_location
            .as_deref()
            .map(|text| required(text, "pickup location"))
            .transpose()?;
        let delivery_location = patch
            .delivery_location
            .as_deref()
            .map(|text| required(text, "delivery location"))
            .transpose()?;

        let pickup_date = patch.pickup_date.unwrap_or(current.pickup_date);
        let delivery_date = patch.delivery_date.unwrap_or(current.delivery_date);
        check_dates(pickup_date, delivery_date)?;

        let rate = patch.rate.map(|v| amount(v, "Rate")).transpose()?;
        let fuel_cost = patch.fuel_cost.map(|v| amount(v, "Fuel cost")).transpose()?;

        let mileage = touches_locations.then(|| {
            MileageColumns::from(derive_mileage(
                current_location.as_deref().unwrap_or(&current.current_location),
                pickup_location.as_deref().unwrap_or(&current.pickup_location),
                delivery_location.as_deref().unwrap_or(&current.delivery_location),
                self.cities,
                self.policy,
            ))
        });

        Ok(LoadChanges {
            current_location,
            pickup_location,
            delivery_location,
            mileage,
            pickup_date: patch.pickup_date,
            delivery_date: patch.delivery_date,
            reference: patch.reference.map(optional_text),
            rate,
            fuel_cost,
            load_type: patch.load_type.map(optional_text),
            broker_name: patch.broker_name.map(optional_text),
            status: patch.status,
        })
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.store.delete(id).await?;
        info!(%id, "load deleted");
        Ok(())
    }
}
