//! # api-adapters
//!
//! The HTTP surface of the badge desk.
//!
//! [`dto`] and [`metrics`] are framework-free; the router, handlers, error
//! mapping and middleware are compiled with the `web-axum` feature.

pub mod dto;
pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;

#[cfg(feature = "web-axum")]
pub use error::ApiError;
pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
mod router {
    use std::sync::Arc;

    use axum::routing::{get, post};
    use axum::Router;
    use domains::AssetStore;
    use services::{BadgeService, PassDirectoryCache, PickupLedger, ResolutionService};

    use crate::handlers;
    use crate::metrics::Metrics;
    use crate::middleware;

    /// State shared by every handler. Cheap to clone.
    #[derive(Clone)]
    pub struct AppState {
        pub directory: Arc<PassDirectoryCache>,
        pub resolution: Arc<ResolutionService>,
        pub ledger: Arc<PickupLedger>,
        pub badges: Arc<BadgeService>,
        pub assets: Arc<dyn AssetStore>,
        pub metrics: Arc<Metrics>,
    }

    /// Builds the full application router, middleware included.
    pub fn router(state: AppState) -> Router {
        let routes = Router::new()
            .route("/health", get(handlers::health))
            .route("/metrics", get(handlers::metrics))
            .route("/api/passes", get(handlers::list_passes))
            .route("/api/passes/refresh", post(handlers::refresh_passes))
            .route("/api/verify-qr", post(handlers::verify_qr))
            .route(
                "/api/pickups",
                get(handlers::list_pickups).post(handlers::create_pickup),
            )
            .route("/api/pickups/{id}", get(handlers::pickup_status))
            .route("/api/templates", get(handlers::list_templates))
            .route(
                "/api/templates/{code}/preview",
                get(handlers::template_preview),
            )
            .route("/api/badges", post(handlers::compose_badge))
            .with_state(state);

        middleware::apply(routes)
    }
}

#[cfg(feature = "web-axum")]
pub use router::{router, AppState};
