//! BDD scenarios for `kestrel run`.

use rstest_bdd_macros::scenario;

use super::test_helpers::{CliContext, cli_context};

#[scenario(path = "tests/features/cli_run.feature", name = "Run every scenario")]
fn scenario_run_every(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(
    path = "tests/features/cli_run.feature",
    name = "Identical flavors skip the suite"
)]
fn scenario_identical_flavors(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(
    path = "tests/features/cli_run.feature",
    name = "A faulted server fails the run"
)]
fn scenario_faulted_server(cli_context: CliContext) {
    let _ = cli_context;
}
