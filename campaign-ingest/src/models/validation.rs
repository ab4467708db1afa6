use std::sync::LazyLock;

use regex::Regex;

use crate::models::request::IngestRequest;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("email pattern is a valid regex")
});

/// Returns `true` when the request breaks the rule.
type Rule = (fn(&IngestRequest) -> bool, &'static str);

fn rule(violated: fn(&IngestRequest) -> bool, message: &'static str) -> Rule {
    (violated, message)
}

/// Ordered field rules for opt-in requests.
///
/// Every rule is evaluated, so a request with several broken fields reports all
/// of them in declaration order.
#[derive(Debug, Clone)]
pub struct FieldValidator {
    rules: Vec<Rule>,
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self {
            rules: vec![
                rule(blank_email, "email must not be blank"),
                rule(malformed_email, "email has invalid format"),
                rule(blank_name, "name must not be blank"),
                rule(missing_simulation_date, "simulationDate must not be null"),
                rule(missing_amount, "amount must not be null"),
            ],
        }
    }
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty result means the request is valid.
    pub fn validate(&self, request: &IngestRequest) -> Vec<String> {
        self.rules
            .iter()
            .filter(|(violated, _)| violated(request))
            .map(|(_, message)| message.to_string())
            .collect()
    }
}

fn blank_email(request: &IngestRequest) -> bool {
    is_blank(&request.email)
}

fn malformed_email(request: &IngestRequest) -> bool {
    !is_blank(&request.email) && !is_plausible_email(&request.email)
}

fn blank_name(request: &IngestRequest) -> bool {
    is_blank(&request.name)
}

fn missing_simulation_date(request: &IngestRequest) -> bool {
    request.simulation_date.is_none()
}

fn missing_amount(request: &IngestRequest) -> bool {
    request.amount.is_none()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// `local@domain.tld`: one `@`, no whitespace, at least one dot in the domain.
pub fn is_plausible_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}
