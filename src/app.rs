use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, patch},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        .route(
            "/api/config",
            get(handlers::get_config)
                .post(handlers::save_config)
                .delete(handlers::clear_config),
        )
        .route("/api/loads", get(handlers::get_week).post(handlers::create_load))
        .route("/api/loads/all", get(handlers::get_all))
        .route(
            "/api/loads/:id",
            patch(handlers::update_load).delete(handlers::delete_load),
        )
        .route("/api/chart/monthly", get(handlers::get_monthly_chart))
        .route("/api/cities", get(handlers::get_cities))
        .route("/api/mileage", get(handlers::get_mileage))
        .with_state(state)
}
