use std::sync::Arc;

use anyhow::Result;
use campaign_ingest::{
    error::IngestError,
    ingest::{CAMPAIGN_EXCHANGE, CAMPAIGN_ROUTING_KEY, IngestPipeline, Stage},
    models::{
        message::{PublishMessage, transform},
        validation::FieldValidator,
    },
};
use serde_json::Value;

use crate::common::{
    FakeTracer, RecordingPublisher, request_without_name_and_email, valid_request,
};

fn pipeline(tracer: &Arc<FakeTracer>, publisher: &Arc<RecordingPublisher>) -> IngestPipeline {
    IngestPipeline::new(FieldValidator::new(), tracer.clone(), publisher.clone())
}

/// Test: A valid request is published once to the campaign exchange
#[tokio::test]
async fn test_valid_request_is_published_once() -> Result<()> {
    let tracer = Arc::new(FakeTracer::new());
    let publisher = Arc::new(RecordingPublisher::new());
    let request = valid_request();

    pipeline(&tracer, &publisher).process(&request).await?;

    let published = publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].exchange, CAMPAIGN_EXCHANGE);
    assert_eq!(published[0].routing_key, CAMPAIGN_ROUTING_KEY);
    assert_eq!(published[0].routing_key, "campaign");

    let body: Value = serde_json::from_slice(&published[0].payload)?;
    assert_eq!(body["email"], "cliente@dominio.com");
    assert_eq!(body["name"], "Cliente Teste");
    assert_eq!(body["dateSimulation"], "2025-09-02T20:45:23");
    assert!(body["amount"].is_number());
    assert_eq!(body["amount"], 10);

    let decoded: PublishMessage = serde_json::from_slice(&published[0].payload)?;
    assert_eq!(decoded, transform(&request));

    assert_eq!(tracer.started(), 1);
    assert_eq!(tracer.ended(), 1);

    Ok(())
}

/// Test: An invalid request fails validation and is never published
#[tokio::test]
async fn test_invalid_request_is_not_published() {
    let tracer = Arc::new(FakeTracer::new());
    let publisher = Arc::new(RecordingPublisher::new());

    let result = pipeline(&tracer, &publisher)
        .process(&request_without_name_and_email())
        .await;

    match result {
        Err(IngestError::Validation(failure)) => {
            assert_eq!(
                failure.violations,
                vec!["email must not be blank", "name must not be blank"]
            );
        }
        other => panic!("Expected validation failure, got: {:?}", other),
    }

    assert!(publisher.published().is_empty());
    assert_eq!(tracer.ended(), 1, "Span must be closed after validation failure");
}

/// Test: A broker fault surfaces as a non-validation error and still closes the span
#[tokio::test]
async fn test_publish_failure_is_a_fault() {
    let tracer = Arc::new(FakeTracer::new());
    let publisher = Arc::new(RecordingPublisher::failing());

    let result = pipeline(&tracer, &publisher).process(&valid_request()).await;

    let error = result.expect_err("Publish failure should propagate");
    assert!(!error.is_validation());
    assert!(matches!(error, IngestError::Publish(_)));

    assert_eq!(publisher.published().len(), 1, "Publish is attempted exactly once");
    assert_eq!(tracer.started(), 1);
    assert_eq!(tracer.ended(), 1, "Span must be closed exactly once after a fault");
}

/// Test: Concurrent runs publish independent payloads through one shared publisher
#[tokio::test]
async fn test_concurrent_runs_share_publisher() -> Result<()> {
    let tracer = Arc::new(FakeTracer::new());
    let publisher = Arc::new(RecordingPublisher::new());
    let pipeline = Arc::new(pipeline(&tracer, &publisher));

    let mut handles = Vec::new();
    for i in 0..16 {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            let mut request = valid_request();
            request.name = format!("Cliente {}", i);
            pipeline.process(&request).await
        }));
    }

    for handle in handles {
        handle.await??;
    }

    let mut names: Vec<String> = publisher
        .published()
        .iter()
        .map(|message| serde_json::from_slice::<PublishMessage>(&message.payload).map(|m| m.name))
        .collect::<Result<_, _>>()?;
    names.sort();
    names.dedup();

    assert_eq!(names.len(), 16);
    assert_eq!(tracer.ended(), 16);

    Ok(())
}

/// Test: Terminal stages have their own names
#[test]
fn test_terminal_stage_names() {
    assert_eq!(Stage::ValidationFailed.as_str(), "validation_failed");
    assert_eq!(Stage::Failed.as_str(), "failed");
    assert_eq!(Stage::Published.as_str(), "published");
}
