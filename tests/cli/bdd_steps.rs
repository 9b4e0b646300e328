//! BDD step definitions for `kestrel run`.

use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{CliContext, CliOutput};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
    #[error("failed to execute kestrel command: {0}")]
    Execution(String),
}

fn run(mut cli_context: CliContext, args: &[&str]) -> Result<CliContext, StepError> {
    let mut cmd = cli_context.base_command();
    cmd.args(args);
    let output = cmd
        .output()
        .map_err(|err| StepError::Execution(err.to_string()))?;
    cli_context.output = Some(CliOutput::from_process_output(output));
    Ok(cli_context)
}

fn output(cli_context: &CliContext) -> Result<&CliOutput, StepError> {
    cli_context
        .output
        .as_ref()
        .ok_or_else(|| StepError::Assertion(String::from("missing command output")))
}

#[given("the fake compute service is enabled")]
fn fake_enabled(mut cli_context: CliContext) -> CliContext {
    cli_context.fake_enabled = true;
    cli_context
}

#[given("the alternate flavor is \"{flavor}\"")]
fn alternate_flavor(mut cli_context: CliContext, flavor: String) -> CliContext {
    cli_context.flavor_ref_alt = flavor;
    cli_context
}

#[given("the fake service faults on \"{action}\"")]
fn fake_fault(mut cli_context: CliContext, action: String) -> CliContext {
    cli_context.fault = Some(action);
    cli_context
}

#[when("I run kestrel with no scenario selection")]
fn run_all(cli_context: CliContext) -> Result<CliContext, StepError> {
    run(cli_context, &["run"])
}

#[when("I run kestrel for scenario \"{name}\"")]
fn run_one(cli_context: CliContext, name: String) -> Result<CliContext, StepError> {
    run(cli_context, &["run", "--scenario", &name])
}

#[then("the command succeeds")]
fn command_succeeds(cli_context: &CliContext) -> Result<(), StepError> {
    let result = output(cli_context)?;
    if result.status_code != 0 {
        return Err(StepError::Assertion(format!(
            "expected exit 0, got {}: {}",
            result.status_code, result.stderr
        )));
    }
    Ok(())
}

#[then("the command fails")]
fn command_fails(cli_context: &CliContext) -> Result<(), StepError> {
    let result = output(cli_context)?;
    if result.status_code != 1 {
        return Err(StepError::Assertion(format!(
            "expected exit 1, got {}",
            result.status_code
        )));
    }
    Ok(())
}

#[then("stdout contains \"{snippet}\"")]
fn stdout_contains(cli_context: &CliContext, snippet: String) -> Result<(), StepError> {
    let result = output(cli_context)?;
    if !result.stdout.contains(&snippet) {
        return Err(StepError::Assertion(format!(
            "expected stdout to contain '{snippet}', got: {}",
            result.stdout
        )));
    }
    Ok(())
}
