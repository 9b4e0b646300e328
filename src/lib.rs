//! Core library for the Kestrel compute lifecycle scenarios.
//!
//! The crate drives short-lived servers through resize-confirm and
//! suspend/resume cycles against an OpenStack Compute deployment, confirming
//! every status transition before issuing the next call. Lifecycle calls go
//! through the [`ComputeClient`] abstraction; [`NovaClient`] speaks the REST
//! API and [`test_support::FakeCompute`] simulates it in memory.

pub mod compute;
pub mod config;
pub mod nova;
pub mod scenario;
pub mod test_support;
pub mod wait;

pub use compute::{
    ComputeClient, ComputeFuture, FlavorRef, LifecycleError, RequestError, Server, ServerRequest,
    ServerRequestBuilder, ServerStatus, WaitPolicy,
};
pub use config::{ComputeConfig, ConfigError};
pub use nova::{NovaClient, NovaClientError};
pub use scenario::{
    AdvancedOpsSuite, Scenario, ScenarioConfig, ScenarioError, ScenarioOutcome, ScenarioReport,
    SuiteReport, UnknownScenario, Verdict,
};
