//! Straight-line scenario scripts over a [`ComputeClient`].

use tracing::{debug, info, warn};

use crate::compute::{ComputeClient, Server, ServerRequest, ServerStatus};

use super::precondition::{Verdict, check_scenario, check_suite};
use super::{Scenario, ScenarioConfig, ScenarioError, ScenarioOutcome, ScenarioReport, SuiteReport};

const SUSPEND_RESUME_CYCLES: usize = 2;

/// Runs the advanced server operation scenarios against one client.
#[derive(Debug)]
pub struct AdvancedOpsSuite<C> {
    client: C,
    config: ScenarioConfig,
    request: ServerRequest,
}

impl<C> AdvancedOpsSuite<C>
where
    C: ComputeClient,
{
    /// Creates a suite. `request` is the template for scenario servers; each
    /// scenario appends its own name to `request.name` and boots with
    /// `config.flavor_ref`, whatever flavor the template carries.
    #[must_use]
    pub const fn new(client: C, config: ScenarioConfig, request: ServerRequest) -> Self {
        Self {
            client,
            config,
            request,
        }
    }

    /// Runs every scenario in declaration order.
    pub async fn run_all(&self) -> SuiteReport {
        self.run_selected(&Scenario::ALL).await
    }

    /// Runs `scenarios` in the given order. When the suite precondition
    /// fails every scenario is reported as skipped and no call is issued.
    pub async fn run_selected(&self, scenarios: &[Scenario]) -> SuiteReport {
        if let Verdict::Skip(reason) = check_suite(&self.config) {
            info!(%reason, "skipping suite");
            return SuiteReport {
                reports: scenarios
                    .iter()
                    .map(|scenario| ScenarioReport::skipped(*scenario, reason.clone()))
                    .collect(),
            };
        }

        let mut reports = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            reports.push(self.run_checked(*scenario).await);
        }
        SuiteReport { reports }
    }

    /// Runs a single scenario, honouring both the suite and the scenario
    /// preconditions.
    pub async fn run(&self, scenario: Scenario) -> ScenarioReport {
        if let Verdict::Skip(reason) = check_suite(&self.config) {
            info!(%scenario, %reason, "skipping scenario");
            return ScenarioReport::skipped(scenario, reason);
        }
        self.run_checked(scenario).await
    }

    async fn run_checked(&self, scenario: Scenario) -> ScenarioReport {
        if let Verdict::Skip(reason) = check_scenario(&self.config, scenario) {
            info!(%scenario, %reason, "skipping scenario");
            return ScenarioReport::skipped(scenario, reason);
        }

        let mut transitions = Vec::new();
        let outcome = match self.execute(scenario, &mut transitions).await {
            Ok(()) => ScenarioOutcome::Passed,
            Err(message) => ScenarioOutcome::Failed(message),
        };
        info!(%scenario, %outcome, "scenario finished");
        ScenarioReport {
            scenario,
            outcome,
            transitions,
        }
    }

    /// Creates the scenario server, drives it, and always deletes it.
    async fn execute(
        &self,
        scenario: Scenario,
        transitions: &mut Vec<ServerStatus>,
    ) -> Result<(), String> {
        let request = self.request_for(scenario);
        let created = self
            .client
            .create_server(&request)
            .await
            .map_err(|err| ScenarioError::Provision(err).to_string())?;

        let body = self.drive(scenario, &created, transitions).await;
        let teardown = self.teardown(&created.id).await;

        match (body, teardown) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(teardown_err)) => Err(teardown_err.to_string()),
            (Err(err), teardown_result) => Err(append_teardown_note(
                &err.to_string(),
                teardown_result.err().as_ref(),
            )),
        }
    }

    async fn drive(
        &self,
        scenario: Scenario,
        created: &Server,
        transitions: &mut Vec<ServerStatus>,
    ) -> Result<(), ScenarioError<C::Error>> {
        let server = self
            .client
            .wait_for_server_status(&created.id, &ServerStatus::Active)
            .await
            .map_err(ScenarioError::Provision)?;
        transitions.push(ServerStatus::Active);

        match scenario {
            Scenario::ResizeConfirm => self.resize_server_confirm(&server, transitions).await,
            Scenario::SuspendResume => {
                self.server_sequence_suspend_resume(&server, transitions)
                    .await
            }
        }
    }

    async fn resize_server_confirm(
        &self,
        server: &Server,
        transitions: &mut Vec<ServerStatus>,
    ) -> Result<(), ScenarioError<C::Error>> {
        let id = server.id.as_str();
        let resize_flavor = self.config.flavor_ref_alt.trim();
        debug!(
            server_id = id,
            from = %server.flavor.id,
            to = resize_flavor,
            "resizing instance"
        );
        self.client
            .resize_server(id, resize_flavor)
            .await
            .map_err(|source| action_error("resize", id, source))?;
        self.wait_step(id, ServerStatus::VerifyResize, transitions)
            .await?;

        debug!(server_id = id, "confirming resize");
        self.client
            .confirm_resize(id)
            .await
            .map_err(|source| action_error("confirm resize", id, source))?;
        self.wait_step(id, ServerStatus::Active, transitions).await
    }

    async fn server_sequence_suspend_resume(
        &self,
        server: &Server,
        transitions: &mut Vec<ServerStatus>,
    ) -> Result<(), ScenarioError<C::Error>> {
        let id = server.id.as_str();
        let mut current = server.status.clone();

        for _ in 0..SUSPEND_RESUME_CYCLES {
            debug!(server_id = id, status = %current, "suspending instance");
            self.client
                .suspend_server(id)
                .await
                .map_err(|source| action_error("suspend", id, source))?;
            self.wait_step(id, ServerStatus::Suspended, transitions)
                .await?;
            current = self.refresh(id).await?;

            debug!(server_id = id, status = %current, "resuming instance");
            self.client
                .resume_server(id)
                .await
                .map_err(|source| action_error("resume", id, source))?;
            self.wait_step(id, ServerStatus::Active, transitions)
                .await?;
            current = self.refresh(id).await?;
        }
        Ok(())
    }

    async fn wait_step(
        &self,
        id: &str,
        target: ServerStatus,
        transitions: &mut Vec<ServerStatus>,
    ) -> Result<(), ScenarioError<C::Error>> {
        self.client
            .wait_for_server_status(id, &target)
            .await
            .map_err(|source| action_error(&format!("wait for {target}"), id, source))?;
        transitions.push(target);
        Ok(())
    }

    async fn refresh(&self, id: &str) -> Result<ServerStatus, ScenarioError<C::Error>> {
        self.client
            .get_server(id)
            .await
            .map(|server| server.status)
            .map_err(|source| action_error("get server", id, source))
    }

    async fn teardown(&self, id: &str) -> Result<(), ScenarioError<C::Error>> {
        let result = match self.client.delete_server(id).await {
            Ok(()) => self.client.wait_for_server_deletion(id).await,
            Err(err) => Err(err),
        };
        result.map_err(|source| {
            warn!(server_id = id, error = %source, "server teardown failed");
            ScenarioError::Teardown {
                server_id: id.to_owned(),
                source,
            }
        })
    }

    fn request_for(&self, scenario: Scenario) -> ServerRequest {
        ServerRequest {
            name: format!("{}-{}", self.request.name, scenario.name()),
            image_ref: self.request.image_ref.clone(),
            flavor_ref: self.config.flavor_ref.trim().to_owned(),
        }
    }
}

fn action_error<E>(action: &str, server_id: &str, source: E) -> ScenarioError<E>
where
    E: std::error::Error + 'static,
{
    ScenarioError::Action {
        action: action.to_owned(),
        server_id: server_id.to_owned(),
        source,
    }
}

fn append_teardown_note<E: std::fmt::Display>(message: &str, teardown_error: Option<&E>) -> String {
    teardown_error.map_or_else(
        || message.to_owned(),
        |teardown| format!("{message} (teardown also failed: {teardown})"),
    )
}
