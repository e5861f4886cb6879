use crate::geo::Coordinate;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const MAX_SUGGESTIONS: usize = 7;

#[derive(Debug, Clone, Copy)]
pub struct City {
    pub name: &'static str,
    pub coordinate: Coordinate,
}

const fn city(name: &'static str, lat: f64, lon: f64) -> City {
    City {
        name,
        coordinate: Coordinate::new(lat, lon),
    }
}

/// Lookup table keyed by exact display name ("Phoenix, AZ").
pub struct CityTable {
    cities: &'static [City],
    index: HashMap<&'static str, Coordinate>,
}

impl CityTable {
    pub fn new(cities: &'static [City]) -> Self {
        let index = cities.iter().map(|c| (c.name, c.coordinate)).collect();
        Self { cities, index }
    }

    /// The built-in US city table.
    pub fn us() -> &'static CityTable {
        &US_TABLE
    }

    pub fn lookup(&self, name: &str) -> Option<Coordinate> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.cities.iter().map(|c| c.name)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Case-insensitive substring match in table order, capped at
    /// [`MAX_SUGGESTIONS`].
    pub fn suggest(&self, query: &str) -> Vec<&'static str> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.names()
            .filter(|name| name.to_lowercase().contains(&needle))
            .take(MAX_SUGGESTIONS)
            .collect()
    }
}

static US_TABLE: Lazy<CityTable> = Lazy::new(|| CityTable::new(US_CITIES));

pub static US_CITIES: &[City] = &[
    city("Albuquerque, NM", 35.0844, -106.6504),
    city("Atlanta, GA", 33.7490, -84.3880),
    city("Austin, TX", 30.2672, -97.7431),
    city("Baltimore, MD", 39.2904, -76.6122),
    city("Billings, MT", 45.7833, -108.5007),
    city("Birmingham, AL", 33.5186, -86.8104),
    city("Boise, ID", 43.6150, -116.2023),
    city("Boston, MA", 42.3601, -71.0589),
    city("Buffalo, NY", 42.8864, -78.8784),
    city("Charlotte, NC", 35.2271, -80.8431),
    city("Chicago, IL", 41.8781, -87.6298),
    city("Cincinnati, OH", 39.1031, -84.5120),
    city("Cleveland, OH", 41.4993, -81.6944),
    city("Columbus, OH", 39.9612, -82.9988),
    city("Dallas, TX", 32.7767, -96.7970),
    city("Denver, CO", 39.7392, -104.9903),
    city("Des Moines, IA", 41.5868, -93.6250),
    city("Detroit, MI", 42.3314, -83.0458),
    city("El Paso, TX", 31.7619, -106.4850),
    city("Fresno, CA", 36.7378, -119.7871),
    city("Houston, TX", 29.7604, -95.3698),
    city("Indianapolis, IN", 39.7684, -86.1581),
    city("Jacksonville, FL", 30.3322, -81.6557),
    city("Kansas City, MO", 39.0997, -94.5786),
    city("Las Vegas, NV", 36.1699, -115.1398),
    city("Laredo, TX", 27.5306, -99.4803),
    city("Little Rock, AR", 34.7465, -92.2896),
    city("Los Angeles, CA", 34.0522, -118.2437),
    city("Louisville, KY", 38.2527, -85.7585),
    city("Memphis, TN", 35.1495, -90.0490),
    city("Miami, FL", 25.7617, -80.1918),
    city("Milwaukee, WI", 43.0389, -87.9065),
    city("Minneapolis, MN", 44.9778, -93.2650),
    city("Nashville, TN", 36.1627, -86.7816),
    city("New Orleans, LA", 29.9511, -90.0715),
    city("New York, NY", 40.7128, -74.0060),
    city("Newark, NJ", 40.7357, -74.1724),
    city("Oklahoma City, OK", 35.4676, -97.5164),
    city("Omaha, NE", 41.2565, -95.9345),
    city("Orlando, FL", 28.5383, -81.3792),
    city("Philadelphia, PA", 39.9526, -75.1652),
    city("Phoenix, AZ", 33.4484, -112.0740),
    city("Pittsburgh, PA", 40.4406, -79.9959),
    city("Portland, OR", 45.5152, -122.6784),
    city("Reno, NV", 39.5296, -119.8138),
    city("Sacramento, CA", 38.5816, -121.4944),
    city("Salt Lake City, UT", 40.7608, -111.8910),
    city("San Antonio, TX", 29.4241, -98.4936),
    city("San Diego, CA", 32.7157, -117.1611),
    city("San Francisco, CA", 37.7749, -122.4194),
    city("Savannah, GA", 32.0809, -81.0912),
    city("Seattle, WA", 47.6062, -122.3321),
    city("Springfield, MA", 42.1015, -72.5898),
    city("Springfield, MO", 37.2090, -93.2923),
    city("St. Louis, MO", 38.6270, -90.1994),
    city("Tampa, FL", 27.9506, -82.4572),
    city("Tucson, AZ", 32.2226, -110.9747),
    city("Tulsa, OK", 36.1540, -95.9928),
    city("Washington, DC", 38.9072, -77.0369),
];
