//! ReportSink (spec.md §4.3, §6).
//!
//! Append-only CSV writer with the fixed 7-column schema. Grounded
//! field-for-field on `original_source/.../writer.py::ReportWriter`: each
//! `emit_*` call opens, appends, and closes the file so the report stays
//! observable on disk if the process terminates mid-run (spec.md §5).

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use planval_rules::AlertType;

use crate::diagnostics::CoreError;
use crate::rule::Rule;

const HEADERS: [&str; 7] = [
    "Nr. Regula",
    "Status",
    "Tip Alerta",
    "Regula",
    "Mesaj",
    "Modificare",
    "Verifica",
];

pub struct ReportSink {
    path: PathBuf,
}

impl ReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Truncate the report and write the header row. Called once at the
    /// start of every run (spec.md §3 "Lifecycles").
    pub fn reset(&self) -> Result<(), CoreError> {
        let mut writer = self.writer(false)?;
        writer.write_record(HEADERS).map_err(csv_err(&self.path))?;
        writer.flush().map_err(|e| CoreError::ReportUnwritable {
            path: self.path.clone(),
            source: e,
        })
    }

    pub fn emit_pass(&self, rule: &Rule) -> Result<(), CoreError> {
        self.emit_row(
            rule,
            "Pass",
            &rule.pass_alerta,
            "-",
            "-",
        )
    }

    pub fn emit_fail(&self, rule: &Rule, verify: &str) -> Result<(), CoreError> {
        self.emit_row(
            rule,
            "Fail",
            &rule.fail_alerta,
            &rule.mesaj_modificare,
            verify,
        )
    }

    pub fn emit_error(&self, rule: &Rule, verify: &str) -> Result<(), CoreError> {
        self.emit_row(
            rule,
            "Error",
            &rule.error_alerta,
            &rule.eroare_modificare,
            verify,
        )
    }

    fn emit_row(
        &self,
        rule: &Rule,
        status: &str,
        message: &str,
        modificare: &str,
        verify: &str,
    ) -> Result<(), CoreError> {
        let mut writer = self.writer(true)?;
        writer
            .write_record([
                rule.numar_regula.to_string(),
                status.to_string(),
                AlertType::from(rule.tip_alerta_id).to_string(),
                rule.descriere.clone(),
                message.to_string(),
                modificare.to_string(),
                verify.to_string(),
            ])
            .map_err(csv_err(&self.path))?;
        writer.flush().map_err(|e| CoreError::ReportUnwritable {
            path: self.path.clone(),
            source: e,
        })
    }

    fn writer(&self, append: bool) -> Result<csv::Writer<std::fs::File>, CoreError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append)
            .open(&self.path)
            .map_err(|e| CoreError::ReportUnwritable {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(csv::WriterBuilder::new().has_headers(false).from_writer(file))
    }
}

fn csv_err(path: &Path) -> impl Fn(csv::Error) -> CoreError + '_ {
    move |e| CoreError::ReportUnwritable {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::Other, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn sample_rule(numar: i64, alert: u32) -> Rule {
        Rule {
            numar_regula: numar,
            tip_regula_id: 1,
            categorie_regula_id: 1,
            tip_validare_id: 1,
            tip_alerta_id: alert,
            formula_regula: String::new(),
            valoare_regula: String::new(),
            descriere: "Path must exist".into(),
            pass_alerta: "OK".into(),
            fail_alerta: "Missing".into(),
            error_alerta: "Boom".into(),
            mesaj_modificare: "Fix the path".into(),
            eroare_modificare: "Investigate".into(),
        }
    }

    #[test]
    fn reset_then_emit_round_trips_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let sink = ReportSink::new(&path);

        sink.reset().unwrap();
        sink.emit_pass(&sample_rule(1, 1)).unwrap();
        sink.emit_fail(&sample_rule(2, 2), "3, 5").unwrap();
        sink.emit_error(&sample_rule(3, 1), "boom").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Nr. Regula,Status,Tip Alerta,Regula,Mesaj,Modificare,Verifica"
        );
        assert_eq!(lines.next().unwrap(), "1,Pass,Blocker,Path must exist,OK,-,-");
        assert_eq!(
            lines.next().unwrap(),
            "2,Fail,Warning,Path must exist,Missing,Fix the path,\"3, 5\""
        );
        assert_eq!(
            lines.next().unwrap(),
            "3,Error,Blocker,Path must exist,Boom,Investigate,boom"
        );
    }

    #[test]
    fn reset_truncates_a_prior_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let sink = ReportSink::new(&path);

        sink.reset().unwrap();
        sink.emit_pass(&sample_rule(1, 1)).unwrap();
        sink.reset().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
