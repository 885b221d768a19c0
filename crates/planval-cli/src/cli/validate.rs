//! `planval validate` — the synchronous entry point the spec's §2 data flow
//! describes: submission path + category → orchestrator → report + verdict.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;

use planval_core::{HttpReferenceLoader, RunConfig};

use super::{default_report_path, ReferenceServiceArgs};

#[derive(Debug, clap::Args)]
pub struct ValidateArgs {
    /// Path to the submission archive (a .zip containing a GeoPackage and PDFs).
    #[arg(long)]
    pub archive: PathBuf,

    /// Submission category to validate against.
    #[arg(long, value_enum)]
    pub category: super::CategoryArg,

    /// Rule-set version to request. Defaults to the reference service's latest.
    #[arg(long)]
    pub rule_version: Option<String>,

    /// Where to write the CSV report. Defaults to a temp-dir `report.csv`.
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub reference: ReferenceServiceArgs,
}

pub fn run(args: &ValidateArgs) -> anyhow::Result<ExitCode> {
    let loader = HttpReferenceLoader::new(&args.reference.reference_url, args.reference.timeout())
        .context("constructing reference service client")?;

    let mut config = RunConfig::new(args.archive.clone(), args.category.as_u32(), args.reference.reference_url.clone());
    config.rule_set_version = args.rule_version.clone();
    config.report_path = args.report.clone().unwrap_or_else(default_report_path);
    config.reference_timeout = args.reference.timeout();

    let summary = planval_core::run(&config, &loader).context("running validation pipeline")?;

    println!(
        "{} rows written to {}",
        summary.rows_written,
        summary.report_path.display()
    );
    println!("verdict: {}", if summary.verdict { "PASS" } else { "FAIL" });

    Ok(if summary.verdict {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
