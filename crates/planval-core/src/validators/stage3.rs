//! Stage 3 — content sniffing (spec.md §4.5 R14, R15).
//!
//! Grounded on `CategoryThree.rule_14`/`rule_15` in
//! `original_source/.../rules.py`. The original sniffs each PDF's magic
//! number with Python's `filetype` library; `infer` is its Rust analogue
//! (spec.md §6 ambient stack: "content sniffing uses a magic-number crate,
//! never the file extension alone").

use super::{guard, require_readable, Validator};
use crate::archive::ArchiveIntrospector;
use crate::context::RunContext;
use crate::diagnostics::Outcome;
use crate::rule::Rule;

fn try_pdf_magic_number(_rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let entries = ArchiveIntrospector::read_pdf_entries(ctx.submission_path)?;
    let mut bad = Vec::new();
    for (name, bytes) in &entries {
        let recognized = infer::get(bytes)
            .map(|kind| kind.mime_type() == "application/pdf")
            .unwrap_or(false);
        if !recognized {
            bad.push(name.clone());
        }
    }
    Ok(if bad.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail(bad.join(", "))
    })
}

pub struct PdfMagicNumber;
impl Validator for PdfMagicNumber {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_pdf_magic_number(rule, ctx))
    }
}
pub fn pdf_magic_number() -> Box<dyn Validator> {
    Box::new(PdfMagicNumber)
}

fn try_geopackage_driver(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let driver = ctx
        .archive
        .gpkg_driver
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("no GeoPackage driver recorded for this archive"))?;
    Ok(if driver == rule.valoare_regula {
        Outcome::Pass
    } else {
        Outcome::fail(driver.to_string())
    })
}

pub struct GeoPackageDriver;
impl Validator for GeoPackageDriver {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_geopackage_driver(rule, ctx))
    }
}
pub fn geopackage_driver() -> Box<dyn Validator> {
    Box::new(GeoPackageDriver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveView;
    use crate::reference::stub::StubReferenceLoader;
    use planval_rules::RuleCategory;
    use std::path::Path;

    fn rule_with_value(value: &str) -> Rule {
        Rule {
            numar_regula: 15,
            tip_regula_id: 15,
            categorie_regula_id: 1,
            tip_validare_id: 3,
            tip_alerta_id: 1,
            formula_regula: String::new(),
            valoare_regula: value.to_string(),
            descriere: "d".into(),
            pass_alerta: "p".into(),
            fail_alerta: "f".into(),
            error_alerta: "e".into(),
            mesaj_modificare: "-".into(),
            eroare_modificare: "-".into(),
        }
    }

    #[test]
    fn geopackage_driver_matches_expected_name() {
        let mut archive = ArchiveView::unreadable();
        archive.readable = true;
        archive.gpkg_driver = Some("GPKG".to_string());
        let loader = StubReferenceLoader::new();
        let path = Path::new("/tmp/x.zip");
        let ctx = RunContext::new(&archive, RuleCategory::Pug, path, &loader);

        assert!(matches!(
            GeoPackageDriver.run(&rule_with_value("GPKG"), &ctx),
            Outcome::Pass
        ));
        assert!(matches!(
            GeoPackageDriver.run(&rule_with_value("SQLite"), &ctx),
            Outcome::Fail { .. }
        ));
    }

    #[test]
    fn geopackage_driver_errors_when_unknown() {
        let mut archive = ArchiveView::unreadable();
        archive.readable = true;
        let loader = StubReferenceLoader::new();
        let path = Path::new("/tmp/x.zip");
        let ctx = RunContext::new(&archive, RuleCategory::Pug, path, &loader);

        assert!(matches!(
            GeoPackageDriver.run(&rule_with_value("GPKG"), &ctx),
            Outcome::Error { .. }
        ));
    }
}
