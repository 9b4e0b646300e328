//! Binary entry point for the Kestrel CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use kestrel::{
    AdvancedOpsSuite, ComputeConfig, ConfigError, NovaClient, NovaClientError, Scenario,
    SuiteReport, UnknownScenario,
};

#[cfg(feature = "test-backdoors")]
use kestrel::test_support::{FakeCompute, FakeComputeError};

mod cli;

use cli::{Cli, RunCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("compute client error: {0}")]
    Client(#[from] NovaClientError),
    #[error(transparent)]
    Scenario(#[from] UnknownScenario),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    #[cfg(feature = "test-backdoors")]
    #[error("fake compute error: {0}")]
    FakeCompute(#[from] FakeComputeError),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::List => {
            write_scenarios(io::stdout())?;
            Ok(0)
        }
        Cli::Run(command) => run_command(command).await,
    }
}

async fn run_command(args: RunCommand) -> Result<i32, CliError> {
    let scenarios = parse_scenarios(&args.scenarios)?;
    let config = ComputeConfig::load_without_cli_args()?;
    config.validate()?;
    let request = config.server_request()?;

    #[cfg(feature = "test-backdoors")]
    if let Some(fake) = fake_compute_from_env()? {
        let report = AdvancedOpsSuite::new(fake, config.scenario_config(), request)
            .run_selected(&scenarios)
            .await;
        return finish(&report);
    }

    let client = NovaClient::new(&config)?;
    let report = AdvancedOpsSuite::new(client, config.scenario_config(), request)
        .run_selected(&scenarios)
        .await;
    finish(&report)
}

fn parse_scenarios(names: &[String]) -> Result<Vec<Scenario>, UnknownScenario> {
    if names.is_empty() {
        return Ok(Scenario::ALL.to_vec());
    }
    names.iter().map(|name| name.parse()).collect()
}

fn finish(report: &SuiteReport) -> Result<i32, CliError> {
    write_report(io::stdout(), report)?;
    Ok(if report.is_success() { 0 } else { 1 })
}

fn write_report(mut target: impl Write, report: &SuiteReport) -> io::Result<()> {
    for scenario in &report.reports {
        writeln!(target, "{scenario}")?;
    }
    writeln!(
        target,
        "passed={} skipped={} failed={}",
        report.passed(),
        report.skipped(),
        report.failed()
    )
}

fn write_scenarios(mut target: impl Write) -> io::Result<()> {
    for scenario in Scenario::ALL {
        writeln!(target, "{scenario}")?;
    }
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

/// Swaps the REST client for the in-memory double when
/// `KESTREL_FAKE_COMPUTE=1`. `KESTREL_FAKE_COMPUTE_FAULT` names an action
/// that drives the fake server into `ERROR`.
#[cfg(feature = "test-backdoors")]
fn fake_compute_from_env() -> Result<Option<FakeCompute>, CliError> {
    if std::env::var("KESTREL_FAKE_COMPUTE").ok().as_deref() != Some("1") {
        return Ok(None);
    }
    let fake = FakeCompute::new();
    if let Ok(action) = std::env::var("KESTREL_FAKE_COMPUTE_FAULT") {
        fake.fault_on(action.parse()?);
    }
    Ok(Some(fake))
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
