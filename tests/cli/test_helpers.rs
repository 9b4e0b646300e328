//! Shared fixtures for CLI behavioural tests.

use std::process::Output;
use std::sync::LazyLock;

use escargot::CargoBuild;
use rstest::fixture;

#[derive(Clone, Debug)]
pub struct CliOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    pub fn from_process_output(output: Output) -> Self {
        let Output {
            status,
            stdout: raw_stdout,
            stderr: raw_stderr,
        } = output;
        Self {
            status_code: status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&raw_stdout).into_owned(),
            stderr: String::from_utf8_lossy(&raw_stderr).into_owned(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CliContext {
    pub fake_enabled: bool,
    pub flavor_ref_alt: String,
    pub fault: Option<String>,
    pub output: Option<CliOutput>,
}

#[expect(
    clippy::expect_used,
    reason = "test setup requires panic on build failure"
)]
static KESTREL_BIN: LazyLock<escargot::CargoRun> = LazyLock::new(|| {
    CargoBuild::new()
        .bin("kestrel")
        .features("test-backdoors")
        .run()
        .expect("failed to build kestrel with test-backdoors feature")
});

pub fn kestrel_cmd() -> assert_cmd::Command {
    KESTREL_BIN.command().into()
}

impl CliContext {
    pub fn base_command(&self) -> assert_cmd::Command {
        let mut cmd = kestrel_cmd();
        cmd.env_remove("KESTREL_CONFIG_PATH");
        if self.fake_enabled {
            cmd.env("KESTREL_FAKE_COMPUTE", "1");
        }
        if let Some(action) = &self.fault {
            cmd.env("KESTREL_FAKE_COMPUTE_FAULT", action);
        }
        cmd.env("KESTREL_ENDPOINT", "http://127.0.0.1:9/v2.1");
        cmd.env("KESTREL_AUTH_TOKEN", "dummy-token");
        cmd.env("KESTREL_IMAGE_REF", "cirros-0.6");
        cmd.env("KESTREL_FLAVOR_REF", "1");
        cmd.env("KESTREL_FLAVOR_REF_ALT", &self.flavor_ref_alt);
        cmd.env("KESTREL_RESIZE_ENABLED", "true");
        cmd.env("KESTREL_SUSPEND_ENABLED", "true");
        cmd.env("RUST_LOG", "warn");
        cmd
    }
}

#[fixture]
pub fn cli_context() -> CliContext {
    CliContext {
        fake_enabled: false,
        flavor_ref_alt: String::from("2"),
        fault: None,
        output: None,
    }
}
