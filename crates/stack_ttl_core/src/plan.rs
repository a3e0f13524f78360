use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::{STACK_NAMES_DELIMITER, STACK_NAMES_ENV};
use crate::schedule::{Schedule, ScheduleError};

pub const TTL_FUNCTION_NAME: &str = "ttl_lambda";
pub const STACK_ACTIONS: [&str; 2] = [
    "cloudformation:DescribeStacks",
    "cloudformation:DeleteStack",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("account must be set to scope stack permissions")]
    MissingAccount,
    #[error("region must be set to scope stack permissions")]
    MissingRegion,
    #[error("stack name cannot be blank")]
    BlankStackName,
    #[error("stack name '{0}' contains the ',' delimiter")]
    DelimiterInStackName(String),
    #[error("invalid ttl schedule: {0}")]
    Schedule(#[from] ScheduleError),
}

/// Inputs for a TTL deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TtlProps {
    pub prefix_name: String,
    pub stack_names: Vec<String>,
    pub ttl_minutes: u32,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackCandidate {
    pub stack_name: String,
    #[serde(default)]
    pub termination_protection: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyStatement {
    pub effect: String,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

/// Everything a deployment needs to wire the termination handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TerminationPlan {
    pub function_name: String,
    pub stack_names: Vec<String>,
    pub environment: BTreeMap<String, String>,
    pub schedule_expression: String,
    pub policy_statements: Vec<PolicyStatement>,
    pub outputs: BTreeMap<String, String>,
}

/// Adds every candidate that is not termination-protected to `props`.
/// Returns the names that were skipped.
pub fn select_stacks(props: &mut TtlProps, candidates: &[StackCandidate]) -> Vec<String> {
    let mut protected = Vec::new();
    for candidate in candidates {
        if candidate.termination_protection {
            protected.push(candidate.stack_name.clone());
            continue;
        }
        props.stack_names.push(candidate.stack_name.clone());
    }
    protected
}

pub fn stack_arns(region: &str, account: &str, stack_name: &str) -> [String; 2] {
    let base = format!("arn:aws:cloudformation:{region}:{account}:stack/{stack_name}");
    let nested = format!("{base}/*");
    [base, nested]
}

/// Builds the plan for `props`; the TTL stack itself is scheduled last so it
/// is torn down together with the stacks it guards.
pub fn build_plan(
    props: &TtlProps,
    self_stack_name: &str,
) -> Result<TerminationPlan, PlanError> {
    let account = required(props.account.as_deref()).ok_or(PlanError::MissingAccount)?;
    let region = required(props.region.as_deref()).ok_or(PlanError::MissingRegion)?;
    let schedule_expression = Schedule::every_minutes(props.ttl_minutes).expression()?;

    let mut stack_names: Vec<String> = Vec::with_capacity(props.stack_names.len() + 1);
    for name in props
        .stack_names
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(self_stack_name))
    {
        let name = validate_stack_name(name)?;
        if !stack_names.iter().any(|existing| existing == name) {
            stack_names.push(name.to_string());
        }
    }

    let delimiter = STACK_NAMES_DELIMITER.to_string();
    let joined = stack_names.join(delimiter.as_str());
    let policy_statements = stack_names
        .iter()
        .map(|name| PolicyStatement {
            effect: "Allow".to_string(),
            actions: STACK_ACTIONS.iter().map(|action| action.to_string()).collect(),
            resources: stack_arns(region, account, name).to_vec(),
        })
        .collect();

    let prefix = props.prefix_name.trim();
    let outputs = BTreeMap::from([
        (
            format!("{prefix}-ttl-timer-value"),
            props.ttl_minutes.to_string(),
        ),
        (format!("{prefix}-ttl-stack-names"), joined.clone()),
    ]);

    Ok(TerminationPlan {
        function_name: TTL_FUNCTION_NAME.to_string(),
        environment: BTreeMap::from([(STACK_NAMES_ENV.to_string(), joined)]),
        stack_names,
        schedule_expression,
        policy_statements,
        outputs,
    })
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn validate_stack_name(name: &str) -> Result<&str, PlanError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlanError::BlankStackName);
    }
    if name.contains(STACK_NAMES_DELIMITER) {
        return Err(PlanError::DelimiterInStackName(name.to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::parse_stack_names;

    fn sample_props() -> TtlProps {
        TtlProps {
            prefix_name: "workshop".to_string(),
            stack_names: Vec::new(),
            ttl_minutes: 240,
            account: Some("123456789012".to_string()),
            region: Some("eu-west-1".to_string()),
        }
    }

    fn candidate(name: &str, termination_protection: bool) -> StackCandidate {
        StackCandidate {
            stack_name: name.to_string(),
            termination_protection,
        }
    }

    #[test]
    fn select_stacks_skips_termination_protected_candidates() {
        let mut props = sample_props();
        let protected = select_stacks(
            &mut props,
            &[
                candidate("network", true),
                candidate("web-asg", false),
                candidate("ecs", false),
            ],
        );

        assert_eq!(props.stack_names, vec!["web-asg", "ecs"]);
        assert_eq!(protected, vec!["network"]);
    }

    #[test]
    fn plan_schedules_self_stack_last_and_removes_duplicates() {
        let mut props = sample_props();
        props.stack_names = vec![
            "web-asg".to_string(),
            "ecs".to_string(),
            "web-asg".to_string(),
        ];

        let plan = build_plan(&props, "workshop-ttl").expect("plan should build");

        assert_eq!(plan.stack_names, vec!["web-asg", "ecs", "workshop-ttl"]);
        assert_eq!(
            plan.environment.get(STACK_NAMES_ENV).map(String::as_str),
            Some("web-asg,ecs,workshop-ttl")
        );
        assert_eq!(plan.schedule_expression, "rate(240 minutes)");
        assert_eq!(plan.function_name, TTL_FUNCTION_NAME);
        assert_eq!(
            plan.outputs.get("workshop-ttl-timer-value").map(String::as_str),
            Some("240")
        );
    }

    #[test]
    fn plan_environment_round_trips_through_handler_configuration() {
        let mut props = sample_props();
        props.stack_names = vec!["web-asg".to_string(), "ecs".to_string()];
        let plan = build_plan(&props, "workshop-ttl").expect("plan should build");

        let configured = plan.environment.get(STACK_NAMES_ENV).map(String::as_str);
        let parsed = parse_stack_names(configured).expect("plan environment should parse");
        assert_eq!(parsed, plan.stack_names);
    }

    #[test]
    fn plan_grants_describe_and_delete_on_each_stack_arn() {
        let mut props = sample_props();
        props.stack_names = vec!["ecs".to_string()];
        let plan = build_plan(&props, "workshop-ttl").expect("plan should build");

        assert_eq!(plan.policy_statements.len(), 2);
        let statement = &plan.policy_statements[0];
        assert_eq!(statement.effect, "Allow");
        assert_eq!(
            statement.actions,
            vec!["cloudformation:DescribeStacks", "cloudformation:DeleteStack"]
        );
        assert_eq!(
            statement.resources,
            vec![
                "arn:aws:cloudformation:eu-west-1:123456789012:stack/ecs",
                "arn:aws:cloudformation:eu-west-1:123456789012:stack/ecs/*",
            ]
        );
    }

    #[test]
    fn plan_requires_account_region_and_positive_ttl() {
        let mut props = sample_props();
        props.account = Some(" ".to_string());
        assert_eq!(build_plan(&props, "ttl"), Err(PlanError::MissingAccount));

        let mut props = sample_props();
        props.region = None;
        assert_eq!(build_plan(&props, "ttl"), Err(PlanError::MissingRegion));

        let mut props = sample_props();
        props.ttl_minutes = 0;
        assert_eq!(
            build_plan(&props, "ttl"),
            Err(PlanError::Schedule(ScheduleError::ZeroRate))
        );
    }

    #[test]
    fn plan_rejects_names_that_would_break_the_environment_list() {
        let mut props = sample_props();
        props.stack_names = vec!["a,b".to_string()];
        assert_eq!(
            build_plan(&props, "ttl"),
            Err(PlanError::DelimiterInStackName("a,b".to_string()))
        );

        assert_eq!(build_plan(&sample_props(), "  "), Err(PlanError::BlankStackName));
    }
}
