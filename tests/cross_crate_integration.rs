//! Cross-crate integration tests verifying the contract between
//! `planval-rules` (the closed rule-kind catalog) and `planval-core` (the
//! engine that consumes it), exercised the way `planval-cli` does: build a
//! `RunConfig`, hand it a `ReferenceLoader`, and read back the `RunSummary`
//! and the CSV report it wrote.

use std::collections::HashMap;
use std::sync::Mutex;

use planval_core::reference::{DictKind, Dictionary};
use planval_core::{CoreError, ReferenceLoader, Rule, RunConfig};
use planval_rules::{AlertType, RuleCategory, RuleKind};

/// A `ReferenceLoader` built entirely from in-memory fixtures, written
/// against the crate's public trait rather than any internal test double —
/// this is exactly the shape `planval-cli` wires up with `HttpReferenceLoader`
/// swapped in for the real thing.
#[derive(Debug, Default)]
struct FixtureLoader {
    rules: Vec<Rule>,
    uat: Mutex<HashMap<String, geo_types::Geometry<f64>>>,
}

impl FixtureLoader {
    fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

impl ReferenceLoader for FixtureLoader {
    fn load_rules(&self, _version: &str, category: u32) -> anyhow::Result<Vec<Rule>> {
        Ok(self
            .rules
            .iter()
            .filter(|r| r.categorie_regula_id == category)
            .cloned()
            .collect())
    }

    fn load_dict(&self, _kind: DictKind) -> anyhow::Result<Dictionary> {
        Ok(Dictionary::default())
    }

    fn load_uat(&self, siruta: &str) -> anyhow::Result<Option<geo_types::Geometry<f64>>> {
        Ok(self.uat.lock().unwrap().get(siruta).cloned())
    }

    fn latest_version(&self) -> anyhow::Result<String> {
        Ok("2.0.0".to_string())
    }
}

fn rule(numar: i64, kind: RuleKind, stage: u32, alert: AlertType) -> Rule {
    let alert_id = match alert {
        AlertType::Blocker => 1,
        AlertType::Warning => 2,
        AlertType::Other(id) => id,
    };
    Rule {
        numar_regula: numar,
        tip_regula_id: kind.as_u32(),
        categorie_regula_id: RuleCategory::Pug.as_u32(),
        tip_validare_id: stage,
        tip_alerta_id: alert_id,
        formula_regula: String::new(),
        valoare_regula: String::new(),
        descriere: format!("rule {numar}"),
        pass_alerta: "OK".into(),
        fail_alerta: "Not OK".into(),
        error_alerta: "Could not evaluate".into(),
        mesaj_modificare: "-".into(),
        eroare_modificare: "-".into(),
    }
}

/// End-to-end scenario 1 analogue (spec.md §8): a submission path that
/// exists and opens as a valid (if empty) zip satisfies both Stage 1 rules,
/// and the verdict comes back true.
#[test]
fn minimal_passing_run_produces_a_true_verdict_and_a_csv_report() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("submission.zip");
    // An actual, if empty, zip container — enough for R1/R2 to Pass.
    {
        let file = std::fs::File::create(&archive_path).unwrap();
        zip::ZipWriter::new(file).finish().unwrap();
    }

    let loader = FixtureLoader::default()
        .with_rule(rule(1, RuleKind::SubmissionPathExists, 1, AlertType::Blocker))
        .with_rule(rule(2, RuleKind::ArchiveIsValid, 1, AlertType::Blocker));

    let mut config = RunConfig::new(archive_path, RuleCategory::Pug.as_u32(), "https://example.test".into());
    config.report_path = dir.path().join("report.csv");

    let summary = planval_core::run(&config, &loader).unwrap();
    assert!(summary.verdict);
    assert_eq!(summary.rows_written, 2);

    let report = std::fs::read_to_string(&config.report_path).unwrap();
    let mut lines = report.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Nr. Regula,Status,Tip Alerta,Regula,Mesaj,Modificare,Verifica"
    );
    assert_eq!(lines.count(), 2);
}

/// End-to-end scenario 2 analogue: a missing GeoPackage doesn't abort the
/// run — it surfaces as a Stage-4 `Error` row, and a Blocker error still
/// flips the verdict to false.
#[test]
fn stage_4_rule_errors_when_the_archive_has_no_geopackage() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("submission.zip");
    {
        let file = std::fs::File::create(&archive_path).unwrap();
        zip::ZipWriter::new(file).finish().unwrap();
    }

    let mut r = rule(1, RuleKind::LayerNonEmpty, 4, AlertType::Blocker);
    r.formula_regula = "PlanSpatial".to_string();
    let loader = FixtureLoader::default().with_rule(r);

    let mut config = RunConfig::new(archive_path, RuleCategory::Pug.as_u32(), "https://example.test".into());
    config.report_path = dir.path().join("report.csv");

    let summary = planval_core::run(&config, &loader).unwrap();
    assert!(!summary.verdict);

    let report = std::fs::read_to_string(&config.report_path).unwrap();
    let data_row = report.lines().nth(1).unwrap();
    assert!(data_row.contains("Error"));
}

/// A submission path that never existed on disk aborts at R1 with a Fail,
/// not a panic — and rule ordering still holds with just the one row.
#[test]
fn nonexistent_submission_path_fails_r1_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.zip");

    let loader = FixtureLoader::default().with_rule(rule(
        1,
        RuleKind::SubmissionPathExists,
        1,
        AlertType::Blocker,
    ));

    let mut config = RunConfig::new(missing, RuleCategory::Pug.as_u32(), "https://example.test".into());
    config.report_path = dir.path().join("report.csv");

    let summary = planval_core::run(&config, &loader).unwrap();
    assert!(!summary.verdict);
}

/// `planval-rules`' closed catalog and `planval-core`'s `Rule::kind()` agree
/// on every one of the 46 ids — the dispatcher's `HashMap` lookup and the
/// wire contract can never silently drift apart.
#[test]
fn every_rule_kind_decodes_through_the_rule_descriptor() {
    for kind in RuleKind::ALL {
        let r = rule(1, kind, 1, AlertType::Warning);
        assert_eq!(r.kind().unwrap(), kind);
    }
}

/// Configuration-loading failures (spec.md §7) propagate as `CoreError`
/// rather than panicking, and do so before the report file is ever created.
#[test]
fn an_unrecognized_category_is_reported_not_panicked() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("submission.zip");
    std::fs::write(&archive_path, b"irrelevant").unwrap();

    let loader = FixtureLoader::default();
    let mut config = RunConfig::new(archive_path, 9, "https://example.test".into());
    config.report_path = dir.path().join("report.csv");

    let err = planval_core::run(&config, &loader).unwrap_err();
    assert!(matches!(err, CoreError::Other(_)));
    assert!(!config.report_path.exists());
}
