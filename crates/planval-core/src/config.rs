//! Run configuration (ambient: spec.md leaves this implicit).
//!
//! Unlike the teacher's TOML-backed `LintConfig`, `RunConfig` is a plain
//! struct assembled from CLI flags in `planval-cli`. The spec never
//! describes a config-file format, so introducing one here would be scope
//! creep (see SPEC_FULL.md §2).

use std::path::PathBuf;
use std::time::Duration;

/// Inputs the orchestrator needs for a single run (spec.md §2 data flow).
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Path to the submission archive on disk.
    pub submission_path: PathBuf,
    /// Submission category, 1..4 (spec.md §3).
    pub category: u32,
    /// Rule-set version to request; defaults to `ReferenceLoader::latest_version()`.
    pub rule_set_version: Option<String>,
    /// Where to write the CSV report. Defaults to a temp-dir `report.csv`,
    /// matching the original's `tempfile.gettempdir()/report.csv`
    /// (`original_source/.../writer.py`).
    pub report_path: PathBuf,
    /// Base URL of the reference service.
    pub reference_base_url: String,
    /// Timeout for reference-service requests.
    pub reference_timeout: Duration,
}

impl RunConfig {
    pub fn default_report_path() -> PathBuf {
        std::env::temp_dir().join("report.csv")
    }

    pub fn new(submission_path: PathBuf, category: u32, reference_base_url: String) -> Self {
        Self {
            submission_path,
            category,
            rule_set_version: None,
            report_path: Self::default_report_path(),
            reference_base_url,
            reference_timeout: Duration::from_secs(15),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_report_path_lives_under_the_temp_dir() {
        let path = RunConfig::default_report_path();
        assert_eq!(path.file_name().unwrap(), "report.csv");
        assert!(path.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn new_fills_in_sensible_defaults() {
        let cfg = RunConfig::new("/tmp/submission.zip".into(), 1, "https://example.test".into());
        assert_eq!(cfg.category, 1);
        assert!(cfg.rule_set_version.is_none());
        assert_eq!(cfg.reference_timeout, Duration::from_secs(15));
    }
}
