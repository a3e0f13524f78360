use serde_json::{json, Value};
use stack_ttl_core::contract::{
    parse_stack_names, ConfigurationError, DeletionOutcome, DeletionResult, ScheduledEvent,
    TerminationResponse,
};

use crate::adapters::event_log::EventLog;
use crate::adapters::provisioning::StackDeleter;

pub const COMPONENT: &str = "termination_handler";

/// Deletes every configured stack, in order, one at a time.
///
/// Configuration is validated before any deletion is issued. A failed
/// deletion is recorded and the remaining stacks are still processed; the
/// response is 500 when at least one deletion failed.
pub fn handle_termination_event(
    event: &Value,
    configured_stack_names: Option<&str>,
    deleter: &dyn StackDeleter,
    log: &dyn EventLog,
) -> Result<TerminationResponse, ConfigurationError> {
    let metadata = ScheduledEvent::from_payload(event);
    log.info(
        "invocation_received",
        json!({
            "event_id": metadata.id,
            "detail_type": metadata.detail_type,
            "source": metadata.source,
            "time": metadata.time,
            "resources": metadata.resources,
        }),
    );

    let stack_names = match parse_stack_names(configured_stack_names) {
        Ok(value) => value,
        Err(error) => {
            log.error(
                "configuration_invalid",
                json!({ "error": error.to_string() }),
            );
            return Err(error);
        }
    };

    let results: Vec<DeletionResult> = stack_names
        .iter()
        .map(|stack_name| delete_stack(stack_name, deleter, log))
        .collect();
    let response = TerminationResponse::from_results(results);

    log.info(
        "termination_completed",
        json!({
            "status_code": response.status_code,
            "stacks_requested": response.results.len(),
            "failed_stacks": response.failed_stacks(),
        }),
    );
    Ok(response)
}

pub fn delete_stack(
    stack_name: &str,
    deleter: &dyn StackDeleter,
    log: &dyn EventLog,
) -> DeletionResult {
    log.info(
        "stack_deletion_requested",
        json!({ "stack_name": stack_name }),
    );

    let outcome = match deleter.delete_stack(stack_name) {
        Ok(()) => DeletionOutcome::Deleted,
        Err(reason) => DeletionOutcome::Failed { reason },
    };

    if let DeletionOutcome::Failed { reason } = &outcome {
        log.error(
            "stack_deletion_failed",
            json!({
                "stack_name": stack_name,
                "error": reason,
            }),
        );
    }

    DeletionResult::from_outcome(stack_name, outcome)
}
