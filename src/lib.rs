pub mod auth;
pub mod cancellation;
pub mod capacity;
pub mod eligibility;
pub mod error;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod schedule;
pub mod settings;
pub mod store;
pub mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use handlers::{get_schedule, healthz_live, healthz_ready, post_booking, post_cancel, root};
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::openapi::ApiDoc;
use crate::settings::Settings;
use crate::store::StoreClient;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<StoreClient>,
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let env_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .init();

    let store = StoreClient::new(
        settings.store_base_url.clone(),
        settings.store_api_key.clone(),
        settings.tenant_id.clone(),
    );
    let state = AppState {
        settings: settings.clone(),
        store: Arc::new(store),
    };

    let app = build_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.settings.port));
    info!("Starting Classbook API on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    let mut router = Router::new()
        .route("/", get(root))
        .route("/healthz/live", get(healthz_live))
        .route("/healthz/ready", get(healthz_ready))
        .route("/schedule", get(get_schedule))
        .route("/bookings", post(post_booking))
        .route("/bookings/{id}/cancel", post(post_cancel))
        .with_state(state.clone());

    if state.settings.enable_swagger {
        let openapi = ApiDoc::openapi();
        let swagger = SwaggerUi::new("/docs").url("/openapi.json", openapi);
        router = router.merge(swagger);
    }

    router.layer(trace_layer)
}
