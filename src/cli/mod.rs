//! Command-line interface definitions for the `kestrel` binary.
//!
//! The parser lives here so both the binary and the build script can reuse
//! it when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `kestrel` binary.
#[derive(Debug, Parser)]
#[command(
    name = "kestrel",
    about = "Exercise resize and suspend/resume lifecycles on an OpenStack compute service",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Run the lifecycle scenarios and report their outcomes.
    #[command(name = "run", about = "Run the lifecycle scenarios")]
    Run(RunCommand),
    /// List the scenario names accepted by `run --scenario`.
    #[command(name = "list", about = "List available scenarios")]
    List,
}

/// Arguments for the `kestrel run` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct RunCommand {
    /// Run only this scenario. Repeat to select several; defaults to all.
    ///
    /// Accepted names are `resize-confirm` and `suspend-resume`.
    #[arg(long = "scenario", value_name = "NAME")]
    pub(crate) scenarios: Vec<String>,
}
