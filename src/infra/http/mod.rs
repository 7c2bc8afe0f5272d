mod compile;
pub mod error;
mod files;
mod middleware;

pub use middleware::RequestContext;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use texforge_api_types::paths;
use url::Url;

use crate::application::compile::CompileService;
use crate::infra::artifacts::ArtifactStore;

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct AppState {
    pub compiler: Arc<CompileService>,
    pub artifacts: Arc<ArtifactStore>,
    pub public_base_url: Option<Url>,
}

pub fn build_router(state: AppState, max_request_bytes: usize) -> Router {
    Router::new()
        .route(paths::HEALTH, get(compile::health))
        .route(paths::COMPILE, post(compile::compile_pdf))
        .route(paths::COMPILE_BASE64, post(compile::compile_base64))
        .route(paths::COMPILE_URL, post(compile::compile_url))
        .route("/files/{*path}", get(files::serve_artifact))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
