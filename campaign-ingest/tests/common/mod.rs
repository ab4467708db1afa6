#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use campaign_ingest::{
    clients::{
        publisher::Publisher,
        tracer::{Span, SpanContext, TaskLocalTracer, Tracer},
    },
    models::request::IngestRequest,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
}

/// Records every publish attempt; optionally fails them all.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<PublishedMessage>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> Result<(), Error> {
        self.published.lock().unwrap().push(PublishedMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            payload: payload.to_vec(),
        });

        if self.fail {
            return Err(anyhow!("Broker unavailable at amqp://10.0.0.7:5672"));
        }

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        if self.fail {
            return Err(anyhow!("Broker unavailable"));
        }
        Ok(())
    }
}

/// Tracer with a fixed (or absent) active span that counts span lifecycles.
#[derive(Default)]
pub struct FakeTracer {
    active: Option<SpanContext>,
    started: AtomicUsize,
    ended: Arc<AtomicUsize>,
}

impl FakeTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_active_trace(trace_id: &str) -> Self {
        Self {
            active: Some(SpanContext {
                trace_id: trace_id.to_string(),
                span_id: "00f067aa0ba902b7".to_string(),
            }),
            ..Self::default()
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn ended(&self) -> usize {
        self.ended.load(Ordering::SeqCst)
    }
}

impl Tracer for FakeTracer {
    fn next_span(&self, _name: &'static str) -> Box<dyn Span> {
        self.started.fetch_add(1, Ordering::SeqCst);

        Box::new(CountingSpan {
            context: SpanContext::root(),
            ended: self.ended.clone(),
        })
    }

    fn current_span(&self) -> Option<SpanContext> {
        self.active.clone()
    }
}

/// Task-local tracer that remembers the trace id of every span it starts.
#[derive(Default)]
pub struct RecordingTracer {
    inner: TaskLocalTracer,
    trace_ids: Mutex<Vec<String>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trace_ids(&self) -> Vec<String> {
        self.trace_ids.lock().unwrap().clone()
    }
}

impl Tracer for RecordingTracer {
    fn next_span(&self, name: &'static str) -> Box<dyn Span> {
        let span = self.inner.next_span(name);
        self.trace_ids
            .lock()
            .unwrap()
            .push(span.context().trace_id.clone());
        span
    }

    fn current_span(&self) -> Option<SpanContext> {
        self.inner.current_span()
    }
}

struct CountingSpan {
    context: SpanContext,
    ended: Arc<AtomicUsize>,
}

impl Span for CountingSpan {
    fn context(&self) -> &SpanContext {
        &self.context
    }

    fn end(&mut self) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn simulation_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 2)
        .unwrap()
        .and_hms_opt(20, 45, 23)
        .unwrap()
}

pub fn valid_request() -> IngestRequest {
    IngestRequest::new(
        "cliente@dominio.com",
        "Cliente Teste",
        simulation_date(),
        Decimal::TEN,
    )
}

pub fn request_without_name_and_email() -> IngestRequest {
    IngestRequest::new("", "", Utc::now().naive_utc(), Decimal::TEN)
}
