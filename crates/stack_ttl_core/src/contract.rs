use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

pub const STACK_NAMES_ENV: &str = "STACK_NAMES";
pub const STACK_NAMES_DELIMITER: char = ',';

pub const STATUS_OK: u16 = 200;
pub const STATUS_FAILED: u16 = 500;

/// Errors raised while reading the configured stack-name list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("STACK_NAMES must be configured")]
    Missing,
    #[error("STACK_NAMES cannot be empty")]
    Empty,
    #[error("STACK_NAMES contains a blank stack name at position {position}")]
    BlankStackName { position: usize },
}

/// Outcome of a single delete request against the provisioning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted,
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeletionResult {
    pub stack_name: String,
    pub succeeded: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DeletionResult {
    pub fn from_outcome(stack_name: &str, outcome: DeletionOutcome) -> Self {
        match outcome {
            DeletionOutcome::Deleted => Self {
                stack_name: stack_name.to_string(),
                succeeded: true,
                message: deleted_message(stack_name),
                reason: None,
            },
            DeletionOutcome::Failed { reason } => Self {
                stack_name: stack_name.to_string(),
                succeeded: false,
                message: failed_message(stack_name),
                reason: Some(reason),
            },
        }
    }
}

/// Aggregated handler response.
///
/// `body` keeps the per-stack messages in input order; `results` carries the
/// same outcomes with the failing stack names addressable without parsing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerminationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: Vec<String>,
    pub results: Vec<DeletionResult>,
}

impl TerminationResponse {
    pub fn from_results(results: Vec<DeletionResult>) -> Self {
        let status_code = if results.iter().all(|result| result.succeeded) {
            STATUS_OK
        } else {
            STATUS_FAILED
        };

        Self {
            status_code,
            headers: json!({"Content-Type": "application/json"}),
            body: results.iter().map(|result| result.message.clone()).collect(),
            results,
        }
    }

    pub fn failed_stacks(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|result| !result.succeeded)
            .map(|result| result.stack_name.as_str())
            .collect()
    }
}

/// Optional metadata carried by a scheduled trigger. Only ever logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "detail-type")]
    pub detail_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
}

impl ScheduledEvent {
    /// Reads whatever metadata is present; anything unrecognised yields the default.
    pub fn from_payload(payload: &Value) -> Self {
        serde_json::from_value(payload.clone()).unwrap_or_default()
    }
}

pub fn deleted_message(stack_name: &str) -> String {
    format!("stack '{stack_name}' was deleted successfully")
}

pub fn failed_message(stack_name: &str) -> String {
    format!("a try to delete stack '{stack_name}' was failed")
}

pub fn parse_stack_names(raw: Option<&str>) -> Result<Vec<String>, ConfigurationError> {
    let Some(raw) = raw else {
        return Err(ConfigurationError::Missing);
    };

    if raw.trim().is_empty() {
        return Err(ConfigurationError::Empty);
    }

    raw.split(STACK_NAMES_DELIMITER)
        .enumerate()
        .map(|(position, name)| {
            let name = name.trim();
            if name.is_empty() {
                Err(ConfigurationError::BlankStackName { position })
            } else {
                Ok(name.to_string())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stack_names_keeps_input_order() {
        let names =
            parse_stack_names(Some("stackA, stackB ,stackC")).expect("names should parse");
        assert_eq!(names, vec!["stackA", "stackB", "stackC"]);
    }

    #[test]
    fn parse_stack_names_keeps_duplicates() {
        let names = parse_stack_names(Some("stackA,stackA")).expect("names should parse");
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn parse_stack_names_rejects_missing_and_blank_values() {
        assert_eq!(parse_stack_names(None), Err(ConfigurationError::Missing));
        assert_eq!(parse_stack_names(Some("")), Err(ConfigurationError::Empty));
        assert_eq!(parse_stack_names(Some("  ")), Err(ConfigurationError::Empty));
        assert_eq!(
            parse_stack_names(Some("stackA,,stackB")),
            Err(ConfigurationError::BlankStackName { position: 1 })
        );
        assert_eq!(
            parse_stack_names(Some("stackA,")),
            Err(ConfigurationError::BlankStackName { position: 1 })
        );
    }

    #[test]
    fn configuration_error_names_the_variable() {
        assert_eq!(
            ConfigurationError::Missing.to_string(),
            "STACK_NAMES must be configured"
        );
    }

    #[test]
    fn response_is_ok_only_when_every_deletion_succeeded() {
        let all_ok = TerminationResponse::from_results(vec![
            DeletionResult::from_outcome("stackA", DeletionOutcome::Deleted),
            DeletionResult::from_outcome("stackB", DeletionOutcome::Deleted),
        ]);
        assert_eq!(all_ok.status_code, STATUS_OK);
        assert!(all_ok.failed_stacks().is_empty());

        let partial = TerminationResponse::from_results(vec![
            DeletionResult::from_outcome("stackA", DeletionOutcome::Deleted),
            DeletionResult::from_outcome(
                "stackB",
                DeletionOutcome::Failed {
                    reason: "access denied".to_string(),
                },
            ),
        ]);
        assert_eq!(partial.status_code, STATUS_FAILED);
        assert_eq!(partial.failed_stacks(), vec!["stackB"]);
        assert_eq!(
            partial.body,
            vec![
                "stack 'stackA' was deleted successfully",
                "a try to delete stack 'stackB' was failed",
            ]
        );
    }

    #[test]
    fn response_serializes_with_status_code_and_camel_case_results() {
        let response = TerminationResponse::from_results(vec![DeletionResult::from_outcome(
            "stackA",
            DeletionOutcome::Deleted,
        )]);
        let value = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"][0], "stack 'stackA' was deleted successfully");
        assert_eq!(value["results"][0]["stackName"], "stackA");
        assert_eq!(value["results"][0]["succeeded"], true);
        assert!(value["results"][0].get("reason").is_none());
    }

    #[test]
    fn scheduled_event_reads_eventbridge_metadata() {
        let event = ScheduledEvent::from_payload(&json!({
            "id": "cdc73f9d-aea9-11e3-9d5a-835b769c0d9c",
            "detail-type": "Scheduled Event",
            "source": "aws.events",
            "time": "2026-10-16T12:00:00Z",
            "resources": ["arn:aws:events:eu-west-1:123456789012:rule/ttl"],
            "detail": {}
        }));

        assert_eq!(event.detail_type.as_deref(), Some("Scheduled Event"));
        assert_eq!(event.source.as_deref(), Some("aws.events"));
        assert_eq!(event.resources.len(), 1);

        assert_eq!(ScheduledEvent::from_payload(&json!("tick")), ScheduledEvent::default());
    }
}
