pub mod app;
pub mod calendar;
pub mod cities;
pub mod config;
pub mod demo;
pub mod errors;
pub mod geo;
pub mod handlers;
pub mod mileage;
pub mod models;
pub mod report;
pub mod service;
pub mod state;
pub mod store;
pub mod ui;

pub use app::router;
pub use config::Settings;
pub use state::AppState;
