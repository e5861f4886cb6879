use crate::models::{LoadInput, LoadStatus};
use crate::service::LoadService;
use chrono::{Duration, Local};
use tracing::warn;

/// Sample loads around today, so a fresh demo instance has a populated week.
pub fn sample_loads() -> Vec<LoadInput> {
    let today = Local::now().date_naive();
    let sample = |current: &str, pickup: &str, delivery: &str, days_ago: i64, rate: f64, fuel: f64| {
        LoadInput {
            current_location: current.to_string(),
            pickup_location: pickup.to_string(),
            delivery_location: delivery.to_string(),
            pickup_date: Some(today - Duration::days(days_ago)),
            delivery_date: Some(today - Duration::days(days_ago) + Duration::days(1)),
            rate: Some(rate),
            fuel_cost: Some(fuel),
            ..LoadInput::default()
        }
    };

    vec![
        LoadInput {
            status: Some(LoadStatus::Paid),
            broker_name: Some("Coastal Freight".to_string()),
            ..sample("New York, NY", "Philadelphia, PA", "Washington, DC", 2, 500.0, 100.0)
        },
        LoadInput {
            status: Some(LoadStatus::InTransit),
            ..sample("Los Angeles, CA", "Las Vegas, NV", "Phoenix, AZ", 1, 900.0, 200.0)
        },
        sample("Boston, MA", "Springfield, MA", "Phoenix, AZ", 0, 4200.0, 1150.0),
    ]
}

pub async fn seed(service: &LoadService) {
    for input in sample_loads() {
        if let Err(err) = service.add(input).await {
            warn!("failed to seed demo load: {err}");
        }
    }
}
