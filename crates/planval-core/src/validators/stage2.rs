//! Stage 2 — file & directory layout (spec.md §4.5 R3..R13).
//!
//! Grounded on `CategoryTwo` in `original_source/.../rules.py`. All eleven
//! rules read only the cheap archive-listing fields (`main_dirs`,
//! `folder_list`, `pdfs_list`, `avize_list`, `gpkg_list`, `file_list`), never
//! the parsed GeoPackage layers.

use planval_rules::value_parse;

use super::{guard, regex_matches_prefix, require_readable, Validator};
use crate::context::RunContext;
use crate::diagnostics::Outcome;
use crate::rule::Rule;

fn try_main_dir_count(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let expected = value_parse::as_int(&rule.valoare_regula)?;
    Ok(if expected == ctx.archive.main_dirs.len() as i64 {
        Outcome::Pass
    } else {
        Outcome::fail(rule.valoare_regula.clone())
    })
}

pub struct MainDirCount;
impl Validator for MainDirCount {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_main_dir_count(rule, ctx))
    }
}
pub fn main_dir_count() -> Box<dyn Validator> {
    Box::new(MainDirCount)
}

fn try_main_dir_regex(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    if ctx.archive.main_dirs.len() != 1 {
        return Ok(Outcome::fail(format!(
            "Au fost gasite {} directoare principale! Trebuie sa fie doar un singur director principal",
            ctx.archive.main_dirs.len()
        )));
    }
    let directory = &ctx.archive.main_dirs[0];
    let re = value_parse::as_regex(&rule.valoare_regula)?;
    Ok(if regex_matches_prefix(&re, directory) {
        Outcome::Pass
    } else {
        Outcome::fail(directory.clone())
    })
}

pub struct MainDirRegex;
impl Validator for MainDirRegex {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_main_dir_regex(rule, ctx))
    }
}
pub fn main_dir_regex() -> Box<dyn Validator> {
    Box::new(MainDirRegex)
}

fn try_folder_count(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let expected = value_parse::as_int(&rule.valoare_regula)?;
    Ok(if expected == ctx.archive.folder_list.len() as i64 {
        Outcome::Pass
    } else {
        Outcome::fail(rule.valoare_regula.clone())
    })
}

pub struct FolderCount;
impl Validator for FolderCount {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_folder_count(rule, ctx))
    }
}
pub fn folder_count() -> Box<dyn Validator> {
    Box::new(FolderCount)
}

fn try_folder_names_present(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    Ok(
        if ctx.archive.folder_list.iter().any(|f| f == &rule.valoare_regula) {
            Outcome::Pass
        } else {
            Outcome::fail(rule.valoare_regula.clone())
        },
    )
}

pub struct FolderNamesPresent;
impl Validator for FolderNamesPresent {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_folder_names_present(rule, ctx))
    }
}
pub fn folder_names_present() -> Box<dyn Validator> {
    Box::new(FolderNamesPresent)
}

fn try_folder_path_prefix(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let main_dir = ctx
        .archive
        .main_dirs
        .first()
        .ok_or_else(|| anyhow::anyhow!("no main directory to prefix folders under"))?;
    let folders = value_parse::comma_list(&rule.valoare_regula);
    for folder in &folders {
        let prefix = format!("{main_dir}/{folder}/");
        if !ctx.archive.file_list.iter().any(|f| f.starts_with(&prefix)) {
            return Ok(Outcome::fail(format!(
                "Folder '{prefix}' not found in file list"
            )));
        }
    }
    Ok(Outcome::Pass)
}

pub struct FolderPathPrefix;
impl Validator for FolderPathPrefix {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_folder_path_prefix(rule, ctx))
    }
}
pub fn folder_path_prefix() -> Box<dyn Validator> {
    Box::new(FolderPathPrefix)
}

fn try_geopackage_count(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let expected = value_parse::as_int(&rule.valoare_regula)?;
    Ok(if expected == ctx.archive.gpkg_list.len() as i64 {
        Outcome::Pass
    } else {
        Outcome::fail(rule.valoare_regula.clone())
    })
}

pub struct GeoPackageCount;
impl Validator for GeoPackageCount {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_geopackage_count(rule, ctx))
    }
}
pub fn geopackage_count() -> Box<dyn Validator> {
    Box::new(GeoPackageCount)
}

fn try_geopackage_name_regex(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    if ctx.archive.gpkg_list.len() != 1 {
        return Ok(Outcome::fail(format!(
            "Au fost gasite {} fisiere gpkg! Trebuie sa fie doar un singur fisier gpkg!",
            ctx.archive.gpkg_list.len()
        )));
    }
    let gpkg = &ctx.archive.gpkg_list[0];
    let re = value_parse::as_regex(&rule.valoare_regula)?;
    Ok(if regex_matches_prefix(&re, gpkg) {
        Outcome::Pass
    } else {
        Outcome::fail(gpkg.clone())
    })
}

pub struct GeoPackageNameRegex;
impl Validator for GeoPackageNameRegex {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_geopackage_name_regex(rule, ctx))
    }
}
pub fn geopackage_name_regex() -> Box<dyn Validator> {
    Box::new(GeoPackageNameRegex)
}

fn try_non_archive_pdf_count(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let limit = value_parse::as_int(&rule.valoare_regula)?;
    let non_avize = ctx.archive.pdfs_list.len() as i64 - ctx.archive.avize_list.len() as i64;
    Ok(if limit >= non_avize {
        Outcome::Pass
    } else {
        Outcome::fail(rule.valoare_regula.clone())
    })
}

pub struct NonArchivePdfCount;
impl Validator for NonArchivePdfCount {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_non_archive_pdf_count(rule, ctx))
    }
}
pub fn non_archive_pdf_count() -> Box<dyn Validator> {
    Box::new(NonArchivePdfCount)
}

fn try_pdf_names_present(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    Ok(
        if ctx.archive.pdfs_list.iter().any(|f| f == &rule.valoare_regula) {
            Outcome::Pass
        } else {
            Outcome::fail(rule.valoare_regula.clone())
        },
    )
}

pub struct PdfNamesPresent;
impl Validator for PdfNamesPresent {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_pdf_names_present(rule, ctx))
    }
}
pub fn pdf_names_present() -> Box<dyn Validator> {
    Box::new(PdfNamesPresent)
}

fn try_avize_count(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let limit = value_parse::as_int(&rule.valoare_regula)?;
    Ok(if limit >= ctx.archive.avize_list.len() as i64 {
        Outcome::Pass
    } else {
        Outcome::fail(rule.valoare_regula.clone())
    })
}

pub struct AvizeCount;
impl Validator for AvizeCount {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_avize_count(rule, ctx))
    }
}
pub fn avize_count() -> Box<dyn Validator> {
    Box::new(AvizeCount)
}

fn try_avize_name_regex(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let re = value_parse::as_regex(&rule.valoare_regula)?;
    let failed: Vec<String> = ctx
        .archive
        .avize_list
        .iter()
        .filter(|a| !regex_matches_prefix(&re, a))
        .cloned()
        .collect();
    Ok(if failed.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail(failed.join(", "))
    })
}

pub struct AvizeNameRegex;
impl Validator for AvizeNameRegex {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_avize_name_regex(rule, ctx))
    }
}
pub fn avize_name_regex() -> Box<dyn Validator> {
    Box::new(AvizeNameRegex)
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
            numar_regula: 1,
            tip_regula_id: 3,
            categorie_regula_id: 1,
            tip_validare_id: 2,
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

    fn readable_archive() -> ArchiveView {
        ArchiveView {
            file_list: vec!["PUG_2024/Date/submission.gpkg".to_string()],
            main_dirs: vec!["PUG_2024".to_string()],
            folder_list: vec!["Date".to_string()],
            pdfs_list: vec!["memoriu.pdf".to_string(), "4_aviz.pdf".to_string()],
            avize_list: vec!["4_aviz.pdf".to_string()],
            gpkg_list: vec!["submission.gpkg".to_string()],
            layers: Default::default(),
            gpkg_driver: Some("GPKG".to_string()),
            readable: true,
            _extraction: None,
        }
    }

    #[test]
    fn main_dir_count_matches_exactly() {
        let archive = readable_archive();
        let loader = StubReferenceLoader::new();
        let path = Path::new("/tmp/x.zip");
        let ctx = RunContext::new(&archive, RuleCategory::Pug, path, &loader);

        assert!(matches!(
            MainDirCount.run(&rule_with_value("1"), &ctx),
            Outcome::Pass
        ));
        assert!(matches!(
            MainDirCount.run(&rule_with_value("2"), &ctx),
            Outcome::Fail { .. }
        ));
    }

    #[test]
    fn folder_path_prefix_checks_the_nested_path() {
        let archive = readable_archive();
        let loader = StubReferenceLoader::new();
        let path = Path::new("/tmp/x.zip");
        let ctx = RunContext::new(&archive, RuleCategory::Pug, path, &loader);

        assert!(matches!(
            FolderPathPrefix.run(&rule_with_value("Date"), &ctx),
            Outcome::Pass
        ));
        assert!(matches!(
            FolderPathPrefix.run(&rule_with_value("Missing"), &ctx),
            Outcome::Fail { .. }
        ));
    }

    #[test]
    fn avize_name_regex_reports_non_matching_names() {
        let mut archive = readable_archive();
        archive.avize_list.push("5_bad.pdf".to_string());
        let loader = StubReferenceLoader::new();
        let path = Path::new("/tmp/x.zip");
        let ctx = RunContext::new(&archive, RuleCategory::Pug, path, &loader);

        let outcome = AvizeNameRegex.run(&rule_with_value(r"^4_.*\.pdf$"), &ctx);
        match outcome {
            Outcome::Fail { verify } => assert_eq!(verify, "5_bad.pdf"),
            other => panic!("expected Fail, got {other:?}"),
        }
    }
}
