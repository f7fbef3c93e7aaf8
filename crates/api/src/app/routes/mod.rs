use axum::Router;

pub mod region;
pub mod system;

/// Router for the region endpoints.
pub fn router() -> Router {
    Router::new().nest("/region", region::router())
}
