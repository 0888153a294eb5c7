//! HTTP layer exposing sentiment prediction over loaded models.

pub mod routes;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{config::Settings, nlp::ModelContext};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub models: Arc<ModelContext>,
}

/// Bind and serve. Models load once here, before the listener opens, so the
/// first request never pays the warm-up cost.
pub async fn serve(settings: Settings, host: String, port: u16) -> Result<()> {
    let models = Arc::new(ModelContext::initialise(&settings)?);
    let state = AppState {
        settings: settings.clone(),
        models,
    };
    let router = Router::new()
        .route("/health", get(routes::health))
        .route("/predict", post(routes::predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    info!(%addr, "serving review-insight API");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
