use crate::cities::CityTable;
use crate::geo::Coordinate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

static LAT_LON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Lat:\s*(-?\d+(?:\.\d+)?),\s*Lon:\s*(-?\d+(?:\.\d+)?)$")
        .expect("lat/lon pattern is valid")
});

/// What an unresolvable leg is recorded as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    #[default]
    Blank,
    Zero,
}

impl UnresolvedPolicy {
    fn unresolved(self) -> Option<u32> {
        match self {
            Self::Blank => None,
            Self::Zero => Some(0),
        }
    }
}

impl FromStr for UnresolvedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blank" => Ok(Self::Blank),
            "zero" => Ok(Self::Zero),
            other => Err(format!("unknown mileage policy '{other}' (expected 'blank' or 'zero')")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mileage {
    pub empty_miles: Option<u32>,
    pub loaded_miles: Option<u32>,
    pub total_miles: u32,
}

impl Mileage {
    pub fn new(empty_miles: Option<u32>, loaded_miles: Option<u32>) -> Self {
        Self {
            empty_miles,
            loaded_miles,
            total_miles: empty_miles.unwrap_or(0).saturating_add(loaded_miles.unwrap_or(0)),
        }
    }
}

/// Parses the `Lat: <d>, Lon: <d>` string the browser writes after a
/// geolocation lookup.
pub fn parse_lat_lon(text: &str) -> Option<Coordinate> {
    let caps = LAT_LON.captures(text.trim())?;
    let lat = caps[1].parse().ok()?;
    let lon = caps[2].parse().ok()?;
    Some(Coordinate::new(lat, lon))
}

pub fn format_lat_lon(coordinate: Coordinate) -> String {
    format!("Lat: {:.4}, Lon: {:.4}", coordinate.lat, coordinate.lon)
}

/// Starting point of the empty leg. `Ok(None)` means no current location was
/// given; `Err(())` means one was given but could not be resolved.
fn resolve_start(current: &str, table: &CityTable) -> Result<Option<Coordinate>, ()> {
    let current = current.trim();
    if current.is_empty() {
        return Ok(None);
    }
    if let Some(coordinate) = parse_lat_lon(current) {
        return Ok(Some(coordinate));
    }
    table.lookup(current).map(Some).ok_or(())
}

fn round_miles(miles: f64) -> u32 {
    miles.round() as u32
}

pub fn derive_mileage(
    current_location: &str,
    pickup: &str,
    delivery: &str,
    table: &CityTable,
    policy: UnresolvedPolicy,
) -> Mileage {
    let pickup_coord = table.lookup(pickup);
    let delivery_coord = table.lookup(delivery);

    let empty_miles = match (resolve_start(current_location, table), pickup_coord) {
        (Ok(None), _) => Some(0),
        (Ok(Some(start)), Some(pickup_coord)) => {
            Some(round_miles(start.distance_miles(&pickup_coord)))
        }
        _ => {
            warn!(current_location, pickup, "empty miles unresolved");
            policy.unresolved()
        }
    };

    let loaded_miles = match (pickup_coord, delivery_coord) {
        (Some(from), Some(to)) => Some(round_miles(from.distance_miles(&to))),
        _ => {
            warn!(pickup, delivery, "loaded miles unresolved");
            policy.unresolved()
        }
    };

    Mileage::new(empty_miles, loaded_miles)
}
