use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::request::IngestRequest;

/// Message handed to the `campaign` exchange for the retry email flow.
///
/// Kept apart from [`IngestRequest`] so the wire shape can evolve without
/// touching the HTTP contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishMessage {
    pub email: String,
    pub name: String,

    #[serde(rename = "dateSimulation")]
    pub simulation_date: Option<NaiveDateTime>,

    pub amount: Option<Decimal>,
}

impl From<&IngestRequest> for PublishMessage {
    fn from(request: &IngestRequest) -> Self {
        Self {
            email: request.email.clone(),
            name: request.name.clone(),
            simulation_date: request.simulation_date,
            amount: request.amount,
        }
    }
}

/// Field-for-field mapping from the request to the broker message.
/// Any per-field rule (redaction, renames) belongs here.
pub fn transform(request: &IngestRequest) -> PublishMessage {
    PublishMessage::from(request)
}
