use aws_sdk_cloudformation::error::DisplayErrorContext;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use stack_ttl_lambda::adapters::event_log::JsonLineLog;
use stack_ttl_lambda::adapters::provisioning::StackDeleter;
use stack_ttl_lambda::handlers::terminate::{handle_termination_event, COMPONENT};
use stack_ttl_lambda::runtime::contract::{TerminationResponse, STACK_NAMES_ENV};

struct CloudFormationStackDeleter {
    cloudformation_client: aws_sdk_cloudformation::Client,
}

impl StackDeleter for CloudFormationStackDeleter {
    fn delete_stack(&self, stack_name: &str) -> Result<(), String> {
        let client = self.cloudformation_client.clone();
        let stack_name = stack_name.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .delete_stack()
                    .stack_name(stack_name)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        format!(
                            "failed to delete cloudformation stack: {}",
                            DisplayErrorContext(&error)
                        )
                    })
            })
        })
    }
}

async fn handle_request(
    cloudformation_client: aws_sdk_cloudformation::Client,
    event: LambdaEvent<Value>,
) -> Result<TerminationResponse, Error> {
    let configured_stack_names = std::env::var(STACK_NAMES_ENV).ok();
    let deleter = CloudFormationStackDeleter {
        cloudformation_client,
    };
    let log = JsonLineLog::new(COMPONENT);

    let response = handle_termination_event(
        &event.payload,
        configured_stack_names.as_deref(),
        &deleter,
        &log,
    )?;
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let cloudformation_client = aws_sdk_cloudformation::Client::new(&aws_config);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        handle_request(cloudformation_client.clone(), event)
    }))
    .await
}
