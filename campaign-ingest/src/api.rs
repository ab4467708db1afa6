use std::sync::Arc;

use anyhow::{Error, Result};
use axum::{
    Extension, Router,
    extract::{Request, State},
    http::{StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    clients::{
        health::HealthChecker,
        publisher::Publisher,
        tracer::{SpanContext, TaskLocalTracer, Tracer},
    },
    config::Config,
    correlation::RequestContext,
    error::{ApiError, ErrorResponder, IngestError},
    ingest::IngestPipeline,
    models::{health::HealthStatus, request::IngestRequest, validation::FieldValidator},
};

pub const TRACEPARENT_HEADER: &str = "traceparent";

pub struct AppState {
    pipeline: IngestPipeline,
    responder: ErrorResponder,
    health_checker: HealthChecker,
}

impl AppState {
    pub fn new(publisher: Arc<dyn Publisher>, tracer: Arc<dyn Tracer>) -> Self {
        Self {
            pipeline: IngestPipeline::new(
                FieldValidator::new(),
                tracer.clone(),
                publisher.clone(),
            ),
            responder: ErrorResponder::new(tracer),
            health_checker: HealthChecker::new(publisher),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/processMessage", post(process_message))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(propagate_trace))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server(config: Config, publisher: Arc<dyn Publisher>) -> Result<(), Error> {
    let state = Arc::new(AppState::new(publisher, Arc::new(TaskLocalTracer)));
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "Campaign ingest server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Campaign ingest server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

/// Makes the request's trace the active span for its task: an incoming
/// `traceparent` when valid, otherwise a root trace keyed by the id the
/// attached [`RequestContext`] hands out.
pub async fn propagate_trace(mut request: Request, next: Next) -> Response {
    let context = RequestContext::new();

    let active = request
        .headers()
        .get(TRACEPARENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(SpanContext::from_traceparent)
        .unwrap_or_else(|| SpanContext::for_trace(context.generated_trace_id()));

    request.extensions_mut().insert(context);

    TaskLocalTracer::scope(active, next.run(request)).await
}

async fn process_message(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    uri: Uri,
    Json(request): Json<IngestRequest>,
) -> Result<StatusCode, ApiError> {
    match state.pipeline.process(&request).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(IngestError::Validation(failure)) => Err(ApiError::Validation(
            state.responder.respond(failure, uri.path(), &context),
        )),
        Err(fault) => {
            error!(error = %fault, "Opt-in message ingestion failed");
            Err(ApiError::Internal)
        }
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_checker.check_all().await;

    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}
