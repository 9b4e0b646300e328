//! BDD step definitions for the advanced operation suite.

use kestrel::test_support::{FakeAction, FakeCall};
use kestrel::{Scenario, ScenarioOutcome, ScenarioReport, ServerStatus};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::OpsContext;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
    #[error("invalid step argument: {0}")]
    Argument(String),
    #[error("failed to start runtime: {0}")]
    Runtime(String),
}

fn parse_scenario(name: &str) -> Result<Scenario, StepError> {
    name.parse()
        .map_err(|err: kestrel::UnknownScenario| StepError::Argument(err.to_string()))
}

fn report_for(ops_context: &OpsContext, name: &str) -> Result<ScenarioReport, StepError> {
    let scenario = parse_scenario(name)?;
    ops_context
        .report
        .as_ref()
        .and_then(|report| report.report(scenario))
        .cloned()
        .ok_or_else(|| StepError::Assertion(format!("no report recorded for {scenario}")))
}

fn run_scenarios(
    mut ops_context: OpsContext,
    scenarios: &[Scenario],
) -> Result<OpsContext, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Runtime(err.to_string()))?;
    let suite = ops_context.suite();
    ops_context.report = Some(runtime.block_on(suite.run_selected(scenarios)));
    Ok(ops_context)
}

#[given("a compute service with resize and suspend enabled")]
fn compute_service(ops_context: OpsContext) -> OpsContext {
    ops_context
}

#[given("resize is disabled")]
fn resize_disabled(mut ops_context: OpsContext) -> OpsContext {
    ops_context.config.resize_enabled = false;
    ops_context
}

#[given("both flavors are \"{flavor}\"")]
fn identical_flavors(mut ops_context: OpsContext, flavor: String) -> OpsContext {
    ops_context.config.flavor_ref.clone_from(&flavor);
    ops_context.config.flavor_ref_alt = flavor;
    ops_context
}

#[given("the \"{action}\" action faults the server")]
fn action_faults(ops_context: OpsContext, action: String) -> Result<OpsContext, StepError> {
    let parsed: FakeAction = action
        .parse()
        .map_err(|err: kestrel::test_support::FakeComputeError| {
            StepError::Argument(err.to_string())
        })?;
    ops_context.fake.fault_on(parsed);
    Ok(ops_context)
}

#[when("I run the \"{name}\" scenario")]
fn run_one(ops_context: OpsContext, name: String) -> Result<OpsContext, StepError> {
    let scenario = parse_scenario(&name)?;
    run_scenarios(ops_context, &[scenario])
}

#[when("I run every scenario")]
fn run_every(ops_context: OpsContext) -> Result<OpsContext, StepError> {
    run_scenarios(ops_context, &Scenario::ALL)
}

#[then("the \"{name}\" scenario passes")]
fn scenario_passes(ops_context: &OpsContext, name: String) -> Result<(), StepError> {
    let report = report_for(ops_context, &name)?;
    if report.outcome != ScenarioOutcome::Passed {
        return Err(StepError::Assertion(format!("expected a pass, got {report}")));
    }
    Ok(())
}

#[then("the \"{name}\" scenario is skipped with \"{reason}\"")]
fn scenario_skipped(
    ops_context: &OpsContext,
    name: String,
    reason: String,
) -> Result<(), StepError> {
    let report = report_for(ops_context, &name)?;
    if report.outcome != ScenarioOutcome::Skipped(reason.clone()) {
        return Err(StepError::Assertion(format!(
            "expected a skip with '{reason}', got {report}"
        )));
    }
    Ok(())
}

#[then("the \"{name}\" scenario fails mentioning \"{snippet}\"")]
fn scenario_fails(
    ops_context: &OpsContext,
    name: String,
    snippet: String,
) -> Result<(), StepError> {
    let report = report_for(ops_context, &name)?;
    match report.outcome {
        ScenarioOutcome::Failed(ref message) if message.contains(&snippet) => Ok(()),
        _ => Err(StepError::Assertion(format!(
            "expected a failure mentioning '{snippet}', got {report}"
        ))),
    }
}

#[then("every scenario is skipped with \"{reason}\"")]
fn every_scenario_skipped(ops_context: &OpsContext, reason: String) -> Result<(), StepError> {
    let Some(report) = ops_context.report.as_ref() else {
        return Err(StepError::Assertion(String::from("missing suite report")));
    };
    let expected = ScenarioOutcome::Skipped(reason);
    if report.reports.len() != Scenario::ALL.len()
        || report.reports.iter().any(|entry| entry.outcome != expected)
    {
        return Err(StepError::Assertion(format!(
            "expected every scenario to be {expected}, got {:?}",
            report.reports
        )));
    }
    Ok(())
}

#[then("the server moved through \"{statuses}\"")]
fn server_transitions(ops_context: &OpsContext, statuses: String) -> Result<(), StepError> {
    let expected: Vec<ServerStatus> = statuses.split(',').map(ServerStatus::from).collect();
    let actual = ops_context
        .report
        .as_ref()
        .and_then(|report| report.reports.first())
        .map(|report| report.transitions.clone())
        .ok_or_else(|| StepError::Assertion(String::from("missing scenario report")))?;
    if actual != expected {
        return Err(StepError::Assertion(format!(
            "expected transitions {expected:?}, got {actual:?}"
        )));
    }
    Ok(())
}

#[then("the resize was confirmed only after VERIFY_RESIZE was observed")]
fn confirm_follows_verify_resize(ops_context: &OpsContext) -> Result<(), StepError> {
    let calls = ops_context.fake.calls();
    let confirm_at = calls
        .iter()
        .position(|call| matches!(call, FakeCall::ConfirmResize { .. }))
        .ok_or_else(|| StepError::Assertion(String::from("confirm was never issued")))?;
    let previous = confirm_at
        .checked_sub(1)
        .and_then(|index| calls.get(index));
    if !matches!(
        previous,
        Some(FakeCall::Fetch {
            status: Some(ServerStatus::VerifyResize),
            ..
        })
    ) {
        return Err(StepError::Assertion(format!(
            "confirm was preceded by {previous:?}"
        )));
    }
    Ok(())
}

#[then("no compute calls were issued")]
fn no_calls(ops_context: &OpsContext) -> Result<(), StepError> {
    let calls = ops_context.fake.calls();
    if !calls.is_empty() {
        return Err(StepError::Assertion(format!("unexpected calls: {calls:?}")));
    }
    Ok(())
}

#[then("no servers remain")]
fn no_servers_remain(ops_context: &OpsContext) -> Result<(), StepError> {
    let remaining = ops_context.fake.server_count();
    if remaining != 0 {
        return Err(StepError::Assertion(format!(
            "{remaining} server(s) were not deleted"
        )));
    }
    Ok(())
}
