//! `planval latest-version` — a thin read-only wrapper over
//! `ReferenceLoader::latest_version` (spec.md §4.2), useful for scripting
//! and for sanity-checking the reference service independent of a run.

use std::process::ExitCode;

use anyhow::Context;

use planval_core::{HttpReferenceLoader, ReferenceLoader};

use super::ReferenceServiceArgs;

#[derive(Debug, clap::Args)]
pub struct LatestVersionArgs {
    #[command(flatten)]
    pub reference: ReferenceServiceArgs,
}

pub fn run(args: &LatestVersionArgs) -> anyhow::Result<ExitCode> {
    let loader = HttpReferenceLoader::new(&args.reference.reference_url, args.reference.timeout())
        .context("constructing reference service client")?;
    let version = loader.latest_version().context("fetching latest rule-set version")?;
    println!("{version}");
    Ok(ExitCode::SUCCESS)
}
