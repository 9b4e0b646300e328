//! Shared fixtures for advanced operation BDD scenarios.

use kestrel::test_support::FakeCompute;
use kestrel::{AdvancedOpsSuite, ScenarioConfig, ServerRequest, SuiteReport};
use rstest::fixture;

#[derive(Clone, Debug)]
pub struct OpsContext {
    pub fake: FakeCompute,
    pub config: ScenarioConfig,
    pub report: Option<SuiteReport>,
}

impl OpsContext {
    pub fn suite(&self) -> AdvancedOpsSuite<FakeCompute> {
        AdvancedOpsSuite::new(self.fake.clone(), self.config.clone(), request())
    }
}

pub fn request() -> ServerRequest {
    ServerRequest::builder()
        .name("kestrel-bdd")
        .image_ref("cirros-0.6")
        .flavor_ref("1")
        .build()
        .unwrap_or_else(|err| panic!("request fixture should build: {err}"))
}

#[fixture]
pub fn ops_context() -> OpsContext {
    OpsContext {
        fake: FakeCompute::new(),
        config: ScenarioConfig {
            flavor_ref: String::from("1"),
            flavor_ref_alt: String::from("2"),
            resize_enabled: true,
            suspend_enabled: true,
        },
        report: None,
    }
}
