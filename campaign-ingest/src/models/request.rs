use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use serde_json::Number;

/// Opt-in event posted by a customer who left a contracting simulation unfinished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    #[serde(default, rename = "dateSimulation")]
    pub simulation_date: Option<NaiveDateTime>,

    #[serde(default, deserialize_with = "decimal_number")]
    pub amount: Option<Decimal>,
}

impl IngestRequest {
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        simulation_date: NaiveDateTime,
        amount: Decimal,
    ) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            simulation_date: Some(simulation_date),
            amount: Some(amount),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Accepts only JSON numbers, kept exact; strings such as `"10"` are rejected.
fn decimal_number<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let literal = number.to_string();
    Decimal::from_str_exact(&literal)
        .or_else(|_| Decimal::from_scientific(&literal))
        .map(Some)
        .map_err(|e| D::Error::custom(format!("invalid amount {}: {}", literal, e)))
}
