use std::{future::Future, time::Instant};

use tracing::debug;
use uuid::Uuid;

tokio::task_local! {
    static ACTIVE_SPAN: SpanContext;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: String,
    pub span_id: String,
}

impl SpanContext {
    pub fn root() -> Self {
        Self::for_trace(Uuid::new_v4().simple().to_string())
    }

    /// New span id within an existing trace.
    pub fn for_trace(trace_id: String) -> Self {
        Self {
            trace_id,
            span_id: new_span_id(),
        }
    }

    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: new_span_id(),
        }
    }

    /// Parses a W3C `traceparent` value (`00-<trace-id>-<parent-id>-<flags>`).
    pub fn from_traceparent(value: &str) -> Option<Self> {
        let mut parts = value.trim().split('-');
        let version = parts.next()?;
        let trace_id = parts.next()?;
        let span_id = parts.next()?;
        let flags = parts.next()?;

        if version == "00" && parts.next().is_some() {
            return None;
        }

        let valid = is_hex(version, 2)
            && version != "ff"
            && is_hex(trace_id, 32)
            && is_hex(span_id, 16)
            && is_hex(flags, 2)
            && !is_all_zeros(trace_id)
            && !is_all_zeros(span_id);

        valid.then(|| Self {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
        })
    }

    pub fn to_traceparent(&self) -> String {
        format!("00-{}-{}-01", self.trace_id, self.span_id)
    }
}

fn new_span_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

fn is_hex(value: &str, len: usize) -> bool {
    value.len() == len
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn is_all_zeros(value: &str) -> bool {
    value.bytes().all(|b| b == b'0')
}

pub trait Span: Send {
    fn context(&self) -> &SpanContext;

    fn end(&mut self);
}

pub trait Tracer: Send + Sync {
    fn next_span(&self, name: &'static str) -> Box<dyn Span>;

    /// The span active for the calling task, if any.
    fn current_span(&self) -> Option<SpanContext>;
}

/// Ends the wrapped span when dropped, whatever path the scope exits through.
pub struct ScopedSpan {
    inner: Box<dyn Span>,
}

impl ScopedSpan {
    pub fn start(tracer: &dyn Tracer, name: &'static str) -> Self {
        Self {
            inner: tracer.next_span(name),
        }
    }

    pub fn context(&self) -> &SpanContext {
        self.inner.context()
    }
}

impl Drop for ScopedSpan {
    fn drop(&mut self) {
        self.inner.end();
    }
}

/// Tracer whose active span lives in a tokio task-local, one per request task.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskLocalTracer;

impl TaskLocalTracer {
    /// Runs `future` with `context` as the active span.
    pub async fn scope<F>(context: SpanContext, future: F) -> F::Output
    where
        F: Future,
    {
        ACTIVE_SPAN.scope(context, future).await
    }
}

impl Tracer for TaskLocalTracer {
    fn next_span(&self, name: &'static str) -> Box<dyn Span> {
        let context = self
            .current_span()
            .map(|parent| parent.child())
            .unwrap_or_else(SpanContext::root);

        debug!(
            span = name,
            trace_id = %context.trace_id,
            span_id = %context.span_id,
            "Span started"
        );

        Box::new(LoggedSpan {
            name,
            context,
            started_at: Instant::now(),
            ended: false,
        })
    }

    fn current_span(&self) -> Option<SpanContext> {
        ACTIVE_SPAN.try_with(SpanContext::clone).ok()
    }
}

struct LoggedSpan {
    name: &'static str,
    context: SpanContext,
    started_at: Instant,
    ended: bool,
}

impl Span for LoggedSpan {
    fn context(&self) -> &SpanContext {
        &self.context
    }

    fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        debug!(
            span = self.name,
            trace_id = %self.context.trace_id,
            span_id = %self.context.span_id,
            elapsed_ms = self.started_at.elapsed().as_millis() as u64,
            "Span ended"
        );
    }
}
