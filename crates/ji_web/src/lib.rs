use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    create_router(Arc::new(state))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/refresh", post(handlers::refresh_all))
        .route("/refresh/:kind", post(handlers::refresh_kind))
        .route("/news", get(handlers::list_news))
        .route("/courses", get(handlers::list_courses))
        .route("/trainers", get(handlers::list_trainers))
        .route("/counts", get(handlers::counts))
        .layer(cors)
        .with_state(state)
}

pub mod prelude {
    pub use crate::{create_app, AppState};
    pub use ji_core::{Error, Result};
}
