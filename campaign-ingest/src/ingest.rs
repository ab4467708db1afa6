use std::sync::Arc;

use tracing::{Instrument, debug, info_span, warn};

use crate::{
    clients::{
        publisher::Publisher,
        tracer::{ScopedSpan, Tracer},
    },
    error::{IngestError, ValidationFailure},
    models::{message::transform, request::IngestRequest, validation::FieldValidator},
};

pub const SPAN_NAME: &str = "processMessage";
pub const CAMPAIGN_EXCHANGE: &str = "campaign";
pub const CAMPAIGN_ROUTING_KEY: &str = "campaign";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    ValidationFailed,
    Transforming,
    Serializing,
    Publishing,
    Published,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::ValidationFailed => "validation_failed",
            Stage::Transforming => "transforming",
            Stage::Serializing => "serializing",
            Stage::Publishing => "publishing",
            Stage::Published => "published",
            Stage::Failed => "failed",
        }
    }
}

/// Validate, transform, serialize and publish one opt-in event.
///
/// Each call opens a `processMessage` span that is closed on every exit path,
/// and publishes at most once. Nothing is retried here.
pub struct IngestPipeline {
    validator: FieldValidator,
    tracer: Arc<dyn Tracer>,
    publisher: Arc<dyn Publisher>,
}

impl IngestPipeline {
    pub fn new(
        validator: FieldValidator,
        tracer: Arc<dyn Tracer>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            validator,
            tracer,
            publisher,
        }
    }

    pub async fn process(&self, request: &IngestRequest) -> Result<(), IngestError> {
        let span = ScopedSpan::start(self.tracer.as_ref(), SPAN_NAME);
        let log_span = info_span!("process_message", trace_id = %span.context().trace_id);

        self.run(request).instrument(log_span).await
    }

    async fn run(&self, request: &IngestRequest) -> Result<(), IngestError> {
        debug!(stage = Stage::Validating.as_str(), "Starting opt-in message processing");

        let violations = self.validator.validate(request);
        if !violations.is_empty() {
            warn!(
                stage = Stage::ValidationFailed.as_str(),
                violations = ?violations,
                "Opt-in message failed validation"
            );
            return Err(ValidationFailure::new(violations).into());
        }

        debug!(stage = Stage::Transforming.as_str());
        let message = transform(request);

        debug!(stage = Stage::Serializing.as_str());
        let payload = serde_json::to_vec(&message)
            .map_err(IngestError::Serialization)
            .inspect_err(log_failure)?;

        debug!(stage = Stage::Publishing.as_str(), bytes = payload.len());
        self.publisher
            .publish(CAMPAIGN_EXCHANGE, CAMPAIGN_ROUTING_KEY, &payload)
            .await
            .map_err(IngestError::Publish)
            .inspect_err(log_failure)?;

        debug!(stage = Stage::Published.as_str(), "Processing completed successfully");

        Ok(())
    }
}

fn log_failure(error: &IngestError) {
    warn!(stage = Stage::Failed.as_str(), error = %error, "Opt-in message processing failed");
}
