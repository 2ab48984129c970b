use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::handlers;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(handlers::health_check))
        .route("/languages", get(handlers::list_languages))
        .route("/run", post(handlers::run_once))
        .route("/sessions/target", post(handlers::set_target))
        .route("/sessions/run-all", post(handlers::run_all))
        .route("/sessions/last", get(handlers::last_run))
}
