use std::sync::{Arc, OnceLock};

use uuid::Uuid;

use crate::clients::tracer::Tracer;

/// Request-scoped slot for a generated correlation id. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    generated_trace_id: Arc<OnceLock<String>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generated on first read; every later read returns the same id.
    pub fn generated_trace_id(&self) -> String {
        self.generated_trace_id
            .get_or_init(|| Uuid::new_v4().simple().to_string())
            .clone()
    }
}

pub struct TraceCorrelator {
    tracer: Arc<dyn Tracer>,
}

impl TraceCorrelator {
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        Self { tracer }
    }

    /// Trace id of the active span, else an id generated once per request.
    pub fn correlation_id(&self, context: &RequestContext) -> String {
        if let Some(span) = self.tracer.current_span() {
            return span.trace_id;
        }

        context.generated_trace_id()
    }
}
