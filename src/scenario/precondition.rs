//! Skip decisions taken before any client call is issued.

use super::{Scenario, ScenarioConfig};

/// Whether a suite or scenario should run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// Preconditions hold.
    Proceed,
    /// The deployment cannot exercise this; the payload explains why.
    Skip(String),
}

/// Checks the suite-wide precondition: the two flavors must differ or a
/// resize has nothing to change.
#[must_use]
pub fn check_suite(config: &ScenarioConfig) -> Verdict {
    if config.flavor_ref.trim() == config.flavor_ref_alt.trim() {
        return Verdict::Skip(String::from(
            "flavor_ref and flavor_ref_alt are identical",
        ));
    }
    Verdict::Proceed
}

/// Checks the capability flag gating `scenario`.
#[must_use]
pub fn check_scenario(config: &ScenarioConfig, scenario: Scenario) -> Verdict {
    match scenario {
        Scenario::ResizeConfirm if !config.resize_enabled => {
            Verdict::Skip(String::from("Resize is not available."))
        }
        Scenario::SuspendResume if !config.suspend_enabled => {
            Verdict::Skip(String::from("Suspend is not available."))
        }
        Scenario::ResizeConfirm | Scenario::SuspendResume => Verdict::Proceed,
    }
}
