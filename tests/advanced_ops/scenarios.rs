//! BDD scenarios for the advanced operation suite.

use rstest_bdd_macros::scenario;

use super::test_helpers::{OpsContext, ops_context};

#[scenario(
    path = "tests/features/advanced_ops.feature",
    name = "Resize a server and confirm the resize"
)]
fn scenario_resize_confirm(ops_context: OpsContext) {
    let _ = ops_context;
}

#[scenario(
    path = "tests/features/advanced_ops.feature",
    name = "Suspend and resume a server twice"
)]
fn scenario_suspend_resume(ops_context: OpsContext) {
    let _ = ops_context;
}

#[scenario(
    path = "tests/features/advanced_ops.feature",
    name = "Skip the suite when both flavors are identical"
)]
fn scenario_identical_flavors(ops_context: OpsContext) {
    let _ = ops_context;
}

#[scenario(
    path = "tests/features/advanced_ops.feature",
    name = "Skip resize when the deployment does not support it"
)]
fn scenario_resize_unsupported(ops_context: OpsContext) {
    let _ = ops_context;
}

#[scenario(
    path = "tests/features/advanced_ops.feature",
    name = "Report a server that faults while suspending"
)]
fn scenario_suspend_fault(ops_context: OpsContext) {
    let _ = ops_context;
}
