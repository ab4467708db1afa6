use std::sync::Arc;

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use crate::{
    clients::tracer::Tracer,
    correlation::{RequestContext, TraceCorrelator},
    models::problem::{ProblemResponse, VALIDATION_DETAIL, VALIDATION_TITLE, VALIDATION_TYPE},
};

/// Violations collected from one request, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request failed validation: {}", .violations.join(", "))]
pub struct ValidationFailure {
    pub violations: Vec<String>,
}

impl ValidationFailure {
    pub fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("failed to serialize publish message: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("failed to publish message: {0}")]
    Publish(anyhow::Error),
}

impl IngestError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Translates validation failures into problem documents. Other faults are
/// not its concern.
pub struct ErrorResponder {
    correlator: TraceCorrelator,
}

impl ErrorResponder {
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        Self {
            correlator: TraceCorrelator::new(tracer),
        }
    }

    pub fn respond(
        &self,
        failure: ValidationFailure,
        path: &str,
        context: &RequestContext,
    ) -> ProblemResponse {
        let trace_id = self.correlator.correlation_id(context);
        on_validation_failure(failure, path, trace_id)
    }
}

pub fn on_validation_failure(
    failure: ValidationFailure,
    path: &str,
    correlation_id: String,
) -> ProblemResponse {
    ProblemResponse {
        status: StatusCode::BAD_REQUEST.as_u16(),
        title: VALIDATION_TITLE.to_string(),
        detail: VALIDATION_DETAIL.to_string(),
        problem_type: VALIDATION_TYPE.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        path: path.to_string(),
        trace_id: correlation_id,
        errors: failure.violations,
    }
}

#[derive(Debug)]
pub enum ApiError {
    Validation(ProblemResponse),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(problem) => (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "application/problem+json")],
                Json(problem),
            )
                .into_response(),
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
