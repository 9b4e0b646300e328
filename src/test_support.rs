//! Test support utilities shared across unit and integration tests.
//!
//! [`FakeCompute`] is an in-memory compute service with a simulated
//! lifecycle. Actions put a server into a transient state that settles after
//! a configurable number of fetches, so polling code observes the same
//! intermediate statuses a real deployment reports. Every call is recorded
//! for ordering assertions.
//!
//! [`EnvGuard`] serialises environment mutation for configuration tests.

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

use crate::compute::{
    ComputeClient, ComputeFuture, FlavorRef, LifecycleError, Server, ServerRequest, ServerStatus,
    WaitPolicy,
};

const FAKE_POLL_INTERVAL: Duration = Duration::from_millis(1);
const FAKE_WAIT_TIMEOUT: Duration = Duration::from_millis(250);
const DEFAULT_SETTLE_POLLS: u32 = 2;

/// Lifecycle actions understood by [`FakeCompute`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FakeAction {
    /// Server creation.
    Create,
    /// Resize request.
    Resize,
    /// Resize confirmation.
    ConfirmResize,
    /// Suspend request.
    Suspend,
    /// Resume request.
    Resume,
    /// Deletion request.
    Delete,
}

impl FakeAction {
    /// Returns the kebab-case action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Resize => "resize",
            Self::ConfirmResize => "confirm-resize",
            Self::Suspend => "suspend",
            Self::Resume => "resume",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for FakeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FakeAction {
    type Err = FakeComputeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "create" => Ok(Self::Create),
            "resize" => Ok(Self::Resize),
            "confirm-resize" => Ok(Self::ConfirmResize),
            "suspend" => Ok(Self::Suspend),
            "resume" => Ok(Self::Resume),
            "delete" => Ok(Self::Delete),
            other => Err(FakeComputeError::BadRequest(format!(
                "unknown action '{other}'"
            ))),
        }
    }
}

/// A single call observed by [`FakeCompute`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FakeCall {
    /// `create_server` with the requested name and flavor.
    Create {
        /// Requested name.
        name: String,
        /// Requested flavor.
        flavor_ref: String,
    },
    /// `fetch_server` and the status it returned (`None` when absent).
    Fetch {
        /// Server identifier.
        id: String,
        /// Status returned to the caller.
        status: Option<ServerStatus>,
    },
    /// `resize_server`.
    Resize {
        /// Server identifier.
        id: String,
        /// Target flavor.
        flavor_ref: String,
    },
    /// `confirm_resize`.
    ConfirmResize {
        /// Server identifier.
        id: String,
    },
    /// `suspend_server`.
    Suspend {
        /// Server identifier.
        id: String,
    },
    /// `resume_server`.
    Resume {
        /// Server identifier.
        id: String,
    },
    /// `delete_server`.
    Delete {
        /// Server identifier.
        id: String,
    },
}

impl FakeCall {
    /// Returns true for calls that change server state.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        !matches!(self, Self::Fetch { .. })
    }
}

/// Errors returned by [`FakeCompute`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FakeComputeError {
    /// The server identifier is unknown.
    #[error("server {0} not found")]
    NotFound(String),
    /// The action is not valid for the current server status.
    #[error("cannot {action} server {server_id} while it is {status}")]
    Conflict {
        /// Rejected action.
        action: FakeAction,
        /// Server identifier.
        server_id: String,
        /// Status at the time of the call.
        status: ServerStatus,
    },
    /// The request itself is malformed.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// A failure scheduled through [`FakeCompute::fail_on`].
    #[error("injected failure during {0}")]
    Injected(FakeAction),
    /// Raised by the polling helpers.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

#[derive(Debug)]
struct Pending {
    settle_to: Option<ServerStatus>,
    flavor: Option<String>,
    remaining: u32,
    stalled: bool,
}

#[derive(Debug)]
struct FakeServer {
    server: Server,
    pending: Option<Pending>,
}

#[derive(Debug, Default)]
struct State {
    servers: BTreeMap<String, FakeServer>,
    calls: Vec<FakeCall>,
    next_id: u64,
    settle_polls: u32,
    fail_on: BTreeSet<FakeAction>,
    fault_on: BTreeSet<FakeAction>,
    stall_on: BTreeSet<FakeAction>,
}

/// In-memory [`ComputeClient`] with a simulated server lifecycle.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the scenario driver owns another.
#[derive(Clone, Debug)]
pub struct FakeCompute {
    state: Arc<Mutex<State>>,
    policy: WaitPolicy,
}

impl Default for FakeCompute {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCompute {
    /// Creates an empty service with millisecond polling.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                settle_polls: DEFAULT_SETTLE_POLLS,
                ..State::default()
            })),
            policy: WaitPolicy::new(FAKE_POLL_INTERVAL, FAKE_WAIT_TIMEOUT),
        }
    }

    /// Overrides the polling policy reported to the wait helpers.
    #[must_use]
    pub const fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets how many fetches a transient state survives. Zero settles on the
    /// first fetch.
    #[must_use]
    pub fn with_settle_polls(self, polls: u32) -> Self {
        self.state().settle_polls = polls;
        self
    }

    /// Makes every future `action` call fail outright.
    pub fn fail_on(&self, action: FakeAction) {
        self.state().fail_on.insert(action);
    }

    /// Makes every future `action` drive the server into `ERROR`.
    pub fn fault_on(&self, action: FakeAction) {
        self.state().fault_on.insert(action);
    }

    /// Makes every future `action` leave the server in its transient state.
    pub fn stall_on(&self, action: FakeAction) {
        self.state().stall_on.insert(action);
    }

    /// Returns every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<FakeCall> {
        self.state().calls.clone()
    }

    /// Returns only the state-changing calls recorded so far.
    #[must_use]
    pub fn mutating_calls(&self) -> Vec<FakeCall> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.is_mutating())
            .cloned()
            .collect()
    }

    /// Returns the number of servers still present.
    #[must_use]
    pub fn server_count(&self) -> usize {
        self.state().servers.len()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn create(&self, request: &ServerRequest) -> Result<Server, FakeComputeError> {
        let mut state = self.state();
        state.calls.push(call_for(
            FakeAction::Create,
            &request.name,
            Some(&request.flavor_ref),
        ));
        if state.fail_on.contains(&FakeAction::Create) {
            return Err(FakeComputeError::Injected(FakeAction::Create));
        }
        request
            .validate()
            .map_err(|err| FakeComputeError::BadRequest(err.to_string()))?;

        let transition = transition_for(FakeAction::Create);
        state.next_id += 1;
        let id = format!("fake-{:04}", state.next_id);
        let server = Server {
            id: id.clone(),
            name: request.name.clone(),
            status: transition.transient.unwrap_or(ServerStatus::Build),
            flavor: FlavorRef {
                id: request.flavor_ref.clone(),
            },
            task_state: Some(transition.task.to_owned()),
        };
        let pending = state.pending_for(FakeAction::Create, transition.settle_to, None);
        state.servers.insert(
            id,
            FakeServer {
                server: server.clone(),
                pending: Some(pending),
            },
        );
        Ok(server)
    }

    fn fetch(&self, id: &str) -> Option<Server> {
        let mut state = self.state();
        let snapshot = state.servers.get_mut(id).and_then(FakeServer::advance);
        if snapshot.is_none() {
            state.servers.remove(id);
        }
        state.calls.push(FakeCall::Fetch {
            id: id.to_owned(),
            status: snapshot.as_ref().map(|server| server.status.clone()),
        });
        snapshot
    }

    fn act(
        &self,
        action: FakeAction,
        id: &str,
        flavor_ref: Option<&str>,
    ) -> Result<(), FakeComputeError> {
        let mut state = self.state();
        state.calls.push(call_for(action, id, flavor_ref));
        if state.fail_on.contains(&action) {
            return Err(FakeComputeError::Injected(action));
        }

        let transition = transition_for(action);
        let (status, busy, flavor) = state
            .servers
            .get(id)
            .map(|entry| {
                (
                    entry.server.status.clone(),
                    entry.server.task_state.is_some(),
                    entry.server.flavor.id.clone(),
                )
            })
            .ok_or_else(|| FakeComputeError::NotFound(id.to_owned()))?;

        if let Some(expected) = transition.required
            && (status != expected || busy)
        {
            return Err(FakeComputeError::Conflict {
                action,
                server_id: id.to_owned(),
                status,
            });
        }
        if let Some(target_flavor) = flavor_ref
            && target_flavor == flavor
        {
            return Err(FakeComputeError::BadRequest(format!(
                "server {id} already uses flavor {flavor}"
            )));
        }

        let pending = state.pending_for(
            action,
            transition.settle_to,
            flavor_ref.map(str::to_owned),
        );
        if let Some(entry) = state.servers.get_mut(id) {
            entry.server.status = transition.transient.unwrap_or(status);
            entry.server.task_state = Some(transition.task.to_owned());
            entry.pending = Some(pending);
        }
        Ok(())
    }
}

impl State {
    fn pending_for(
        &self,
        action: FakeAction,
        settle_to: Option<ServerStatus>,
        flavor: Option<String>,
    ) -> Pending {
        let faulted = self.fault_on.contains(&action);
        Pending {
            settle_to: if faulted {
                Some(ServerStatus::Error)
            } else {
                settle_to
            },
            flavor: if faulted { None } else { flavor },
            remaining: self.settle_polls,
            stalled: self.stall_on.contains(&action),
        }
    }
}

impl FakeServer {
    /// Advances any pending transition by one fetch and returns the snapshot,
    /// or `None` once a deletion has settled.
    fn advance(&mut self) -> Option<Server> {
        let Some(pending) = self.pending.as_mut() else {
            return Some(self.server.clone());
        };
        if pending.stalled {
            return Some(self.server.clone());
        }
        if pending.remaining > 0 {
            pending.remaining -= 1;
            return Some(self.server.clone());
        }

        let settled = self.pending.take()?;
        let status = settled.settle_to?;
        self.server.status = status;
        self.server.task_state = None;
        if let Some(flavor) = settled.flavor {
            self.server.flavor = FlavorRef { id: flavor };
        }
        Some(self.server.clone())
    }
}

/// `subject` is the server id, or the requested name for a create.
fn call_for(action: FakeAction, subject: &str, flavor_ref: Option<&str>) -> FakeCall {
    let id = subject.to_owned();
    match action {
        FakeAction::Create => FakeCall::Create {
            name: id,
            flavor_ref: flavor_ref.unwrap_or_default().to_owned(),
        },
        FakeAction::Resize => FakeCall::Resize {
            id,
            flavor_ref: flavor_ref.unwrap_or_default().to_owned(),
        },
        FakeAction::ConfirmResize => FakeCall::ConfirmResize { id },
        FakeAction::Suspend => FakeCall::Suspend { id },
        FakeAction::Resume => FakeCall::Resume { id },
        FakeAction::Delete => FakeCall::Delete { id },
    }
}

/// How an action moves a server: the settled status it must start from, the
/// status shown while the task runs, the task name, and where it settles.
/// A `None` settled status removes the server.
struct Transition {
    required: Option<ServerStatus>,
    transient: Option<ServerStatus>,
    task: &'static str,
    settle_to: Option<ServerStatus>,
}

const fn transition_for(action: FakeAction) -> Transition {
    match action {
        FakeAction::Create => Transition {
            required: None,
            transient: Some(ServerStatus::Build),
            task: "spawning",
            settle_to: Some(ServerStatus::Active),
        },
        FakeAction::Resize => Transition {
            required: Some(ServerStatus::Active),
            transient: Some(ServerStatus::Resize),
            task: "resize_prep",
            settle_to: Some(ServerStatus::VerifyResize),
        },
        FakeAction::ConfirmResize => Transition {
            required: Some(ServerStatus::VerifyResize),
            transient: Some(ServerStatus::Active),
            task: "resize_confirming",
            settle_to: Some(ServerStatus::Active),
        },
        FakeAction::Suspend => Transition {
            required: Some(ServerStatus::Active),
            transient: None,
            task: "suspending",
            settle_to: Some(ServerStatus::Suspended),
        },
        FakeAction::Resume => Transition {
            required: Some(ServerStatus::Suspended),
            transient: None,
            task: "resuming",
            settle_to: Some(ServerStatus::Active),
        },
        FakeAction::Delete => Transition {
            required: None,
            transient: None,
            task: "deleting",
            settle_to: None,
        },
    }
}

impl ComputeClient for FakeCompute {
    type Error = FakeComputeError;

    fn create_server<'a>(
        &'a self,
        request: &'a ServerRequest,
    ) -> ComputeFuture<'a, Server, Self::Error> {
        Box::pin(async move { self.create(request) })
    }

    fn fetch_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, Option<Server>, Self::Error> {
        Box::pin(async move { Ok(self.fetch(id)) })
    }

    fn resize_server<'a>(
        &'a self,
        id: &'a str,
        flavor_ref: &'a str,
    ) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move { self.act(FakeAction::Resize, id, Some(flavor_ref)) })
    }

    fn confirm_resize<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move { self.act(FakeAction::ConfirmResize, id, None) })
    }

    fn suspend_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move { self.act(FakeAction::Suspend, id, None) })
    }

    fn resume_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move { self.act(FakeAction::Resume, id, None) })
    }

    fn delete_server<'a>(&'a self, id: &'a str) -> ComputeFuture<'a, (), Self::Error> {
        Box::pin(async move { self.act(FakeAction::Delete, id, None) })
    }

    fn wait_policy(&self) -> WaitPolicy {
        self.policy
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds [`ENV_LOCK`] and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: AsyncMutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets (`Some`) or removes (`None`) environment variables while holding
    /// the global mutex.
    pub async fn set_vars(pairs: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            previous.push(((*key).to_owned(), env::var_os(key)));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
            unsafe {
                match value {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
