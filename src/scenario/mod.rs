//! Scenario driver for advanced server lifecycle operations.
//!
//! Two self-contained scenarios stress a compute deployment:
//!
//! * `resize-confirm`: resize to the alternate flavor, wait for
//!   `VERIFY_RESIZE`, confirm, wait for `ACTIVE`;
//! * `suspend-resume`: suspend and resume the same server twice, confirming
//!   every transition before issuing the next call.
//!
//! Each scenario creates and deletes its own server. Skips are decided up
//! front from [`ScenarioConfig`] and never issue a client call.

mod error;
mod precondition;
mod suite;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::compute::ServerStatus;

pub use error::ScenarioError;
pub use precondition::{Verdict, check_scenario, check_suite};
pub use suite::AdvancedOpsSuite;

/// Flavor pair and capability flags consumed by the scenario driver.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScenarioConfig {
    /// Flavor scenario servers are created with.
    pub flavor_ref: String,
    /// Flavor used as the resize target.
    pub flavor_ref_alt: String,
    /// Whether the deployment supports resize.
    pub resize_enabled: bool,
    /// Whether the deployment supports suspend.
    pub suspend_enabled: bool,
}

/// The scenarios this crate knows how to run.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Scenario {
    /// Resize to the alternate flavor and confirm.
    ResizeConfirm,
    /// Suspend and resume twice in a row.
    SuspendResume,
}

impl Scenario {
    /// Every scenario, in execution order.
    pub const ALL: [Self; 2] = [Self::ResizeConfirm, Self::SuspendResume];

    /// Stable kebab-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ResizeConfirm => "resize-confirm",
            Self::SuspendResume => "suspend-resume",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raised when a scenario name is not recognised.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown scenario '{0}' (expected one of: resize-confirm, suspend-resume)")]
pub struct UnknownScenario(pub String);

impl FromStr for Scenario {
    type Err = UnknownScenario;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name() == value.trim())
            .ok_or_else(|| UnknownScenario(value.to_owned()))
    }
}

/// Result of running one scenario.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScenarioOutcome {
    /// Every expected transition was observed.
    Passed,
    /// The scenario does not apply to this deployment.
    Skipped(String),
    /// A call failed, a wait timed out, or the server faulted.
    Failed(String),
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Failed(message) => write!(f, "failed ({message})"),
        }
    }
}

/// Outcome of a scenario plus the statuses it confirmed, in order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScenarioReport {
    /// Scenario that ran.
    pub scenario: Scenario,
    /// How it ended.
    pub outcome: ScenarioOutcome,
    /// Statuses confirmed by a successful wait, starting with the `ACTIVE`
    /// reached after provisioning.
    pub transitions: Vec<ServerStatus>,
}

impl ScenarioReport {
    fn skipped(scenario: Scenario, reason: impl Into<String>) -> Self {
        Self {
            scenario,
            outcome: ScenarioOutcome::Skipped(reason.into()),
            transitions: Vec::new(),
        }
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.scenario, self.outcome)
    }
}

/// Reports for every scenario in a suite run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SuiteReport {
    /// One report per scenario, in execution order.
    pub reports: Vec<ScenarioReport>,
}

impl SuiteReport {
    fn count(&self, predicate: impl Fn(&ScenarioOutcome) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }

    /// Number of scenarios that passed.
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ScenarioOutcome::Passed))
    }

    /// Number of scenarios that were skipped.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, ScenarioOutcome::Skipped(_)))
    }

    /// Number of scenarios that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ScenarioOutcome::Failed(_)))
    }

    /// True when no scenario failed. Skips do not count as failures.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Returns the report for `scenario`, if it ran.
    #[must_use]
    pub fn report(&self, scenario: Scenario) -> Option<&ScenarioReport> {
        self.reports
            .iter()
            .find(|report| report.scenario == scenario)
    }
}
