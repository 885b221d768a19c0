//! Argument parsing (ambient: spec.md leaves the CLI surface to the
//! out-of-scope GUI shell; this is the synchronous entry point it would
//! eventually call, and the one a headless/CI caller uses directly).

pub mod latest_version;
pub mod validate;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

/// Validate urban-planning submission archives against a remote rule set.
#[derive(Debug, Parser)]
#[command(name = "planval", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug-level logging (overridden by `RUST_LOG` if set).
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full rule set for one category against one submission archive.
    Validate(validate::ValidateArgs),
    /// Print the reference service's latest rule-set version for a category.
    LatestVersion(latest_version::LatestVersionArgs),
}

/// Flags shared by every subcommand that talks to the reference service.
#[derive(Debug, Clone, clap::Args)]
pub struct ReferenceServiceArgs {
    /// Base URL of the reference service (rule tables, dictionaries, UAT polygons).
    #[arg(long, env = "PLANVAL_REFERENCE_URL")]
    pub reference_url: String,

    /// Timeout, in seconds, for each reference-service request.
    #[arg(long, default_value_t = 15)]
    pub reference_timeout_secs: u64,
}

impl ReferenceServiceArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.reference_timeout_secs)
    }
}

/// Submission category, spec.md §1/§3 ("C1..C4"); only C1 and C3 have an
/// actively maintained rule set, but all four are valid identifiers.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CategoryArg {
    C1,
    C2,
    C3,
    C4,
}

impl CategoryArg {
    pub fn as_u32(self) -> u32 {
        match self {
            CategoryArg::C1 => 1,
            CategoryArg::C2 => 2,
            CategoryArg::C3 => 3,
            CategoryArg::C4 => 4,
        }
    }
}

pub fn default_report_path() -> PathBuf {
    planval_core::RunConfig::default_report_path()
}
