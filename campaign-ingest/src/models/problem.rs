use serde::{Deserialize, Serialize};

pub const VALIDATION_TITLE: &str = "Validation failed";
pub const VALIDATION_DETAIL: &str = "Erro de validação no corpo da requisição.";
pub const VALIDATION_TYPE: &str = "https://httpstatuses.io/400";

/// Problem document returned for client-caused failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResponse {
    pub status: u16,
    pub title: String,
    pub detail: String,

    #[serde(rename = "type")]
    pub problem_type: String,

    pub timestamp: String,
    pub path: String,
    pub trace_id: String,
    pub errors: Vec<String>,
}
