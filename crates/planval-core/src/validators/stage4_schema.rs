//! Stage 4 — schema, attribute, and non-geometry data checks
//! (spec.md §4.5 R16..R26, R37..R40, R44..R46).
//!
//! Grounded row-for-row on `CategoryFour.rule_16`..`rule_46` in
//! `original_source/.../rules.py`, minus the geometry-bearing rules, which
//! live in `stage4_geometry.rs`.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use planval_rules::value_parse;
use regex::Regex;

use super::{guard, require_layer, require_readable, row0, Validator};
use crate::context::RunContext;
use crate::diagnostics::Outcome;
use crate::reference::DictKind;
use crate::romanian;
use crate::rule::Rule;

fn non_geometry_columns(layer: &crate::archive::LayerTable) -> &[String] {
    &layer.columns
}

fn try_layer_count_at_least(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let expected = value_parse::as_int(&rule.valoare_regula)?;
    Ok(if expected <= ctx.archive.layers.len() as i64 {
        Outcome::Pass
    } else {
        Outcome::fail(rule.valoare_regula.clone())
    })
}

pub struct LayerCountAtLeast;
impl Validator for LayerCountAtLeast {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_layer_count_at_least(rule, ctx))
    }
}
pub fn layer_count_at_least() -> Box<dyn Validator> {
    Box::new(LayerCountAtLeast)
}

fn try_layer_exists(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    Ok(if ctx.archive.layers.contains_key(&rule.valoare_regula) {
        Outcome::Pass
    } else {
        Outcome::fail(rule.valoare_regula.clone())
    })
}

pub struct LayerExists;
impl Validator for LayerExists {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_layer_exists(rule, ctx))
    }
}
pub fn layer_exists() -> Box<dyn Validator> {
    Box::new(LayerExists)
}

fn try_non_geometry_column_count(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let expected = value_parse::as_int(&rule.valoare_regula)?;
    Ok(if expected <= non_geometry_columns(layer).len() as i64 {
        Outcome::Pass
    } else {
        Outcome::fail(rule.valoare_regula.clone())
    })
}

pub struct NonGeometryColumnCount;
impl Validator for NonGeometryColumnCount {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_non_geometry_column_count(rule, ctx))
    }
}
pub fn non_geometry_column_count() -> Box<dyn Validator> {
    Box::new(NonGeometryColumnCount)
}

fn try_columns_present(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let expected = value_parse::comma_list(&rule.valoare_regula);
    let missing: Vec<String> = expected
        .into_iter()
        .filter(|name| !layer.columns.contains(name))
        .collect();
    Ok(if missing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail(missing.join(", "))
    })
}

pub struct ColumnsPresent;
impl Validator for ColumnsPresent {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_columns_present(rule, ctx))
    }
}
pub fn columns_present() -> Box<dyn Validator> {
    Box::new(ColumnsPresent)
}

fn try_layer_non_empty(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    Ok(if layer.rows.is_empty() {
        Outcome::fail(rule.formula_regula.clone())
    } else {
        Outcome::Pass
    })
}

pub struct LayerNonEmpty;
impl Validator for LayerNonEmpty {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_layer_non_empty(rule, ctx))
    }
}
pub fn layer_non_empty() -> Box<dyn Validator> {
    Box::new(LayerNonEmpty)
}

const SPECIAL_COLUMNS: [&str; 3] = ["POT", "CUT", "CLAD"];

fn is_blank(value: &crate::archive::AttrValue) -> bool {
    use crate::archive::AttrValue::*;
    match value {
        Null => true,
        Str(s) => s.is_empty() || s == "NULL",
        _ => false,
    }
}

fn try_columns_not_null(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let columns = value_parse::comma_list(&rule.valoare_regula);
    let mut failures: HashMap<String, String> = HashMap::new();

    for column in &columns {
        let null_indices: Vec<usize> = layer
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get(column).map(is_blank).unwrap_or(true))
            .map(|(i, _)| i + 1)
            .collect();

        let special = SPECIAL_COLUMNS.contains(&column.as_str());
        if special && null_indices.len() == layer.rows.len() {
            failures.insert(column.clone(), "Nu contine date!".to_string());
        } else if !special && !null_indices.is_empty() {
            failures.insert(
                column.clone(),
                null_indices
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
    }

    Ok(if failures.is_empty() {
        Outcome::Pass
    } else {
        let mut entries: Vec<(String, String)> = failures.into_iter().collect();
        entries.sort();
        let verify = entries
            .into_iter()
            .map(|(column, detail)| format!("{column}: {detail}"))
            .collect::<Vec<_>>()
            .join("; ");
        Outcome::fail(verify)
    })
}

pub struct ColumnsNotNull;
impl Validator for ColumnsNotNull {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_columns_not_null(rule, ctx))
    }
}
pub fn columns_not_null() -> Box<dyn Validator> {
    Box::new(ColumnsNotNull)
}

/// Matches the original's coarse dtype labels (`int64`, `float64`, `object`,
/// `datetime64[ms]`, ...) against what the GeoPackage field actually
/// produced. An `object`-declared column whose values all parse as a date
/// counts as a match too, mirroring the `pd.to_datetime` coercion fallback.
fn attr_matches_dtype(values: &[&crate::archive::AttrValue], dtype: &str) -> bool {
    use crate::archive::AttrValue::*;
    let non_null: Vec<&crate::archive::AttrValue> = values.iter().copied().filter(|v| !v.is_null()).collect();
    match dtype {
        "int64" | "Int64" => non_null.iter().all(|v| matches!(v, Int(_))),
        "float64" => non_null.iter().all(|v| matches!(v, Float(_) | Int(_))),
        "object" => non_null.iter().all(|v| matches!(v, Str(_))),
        "bool" => non_null.iter().all(|v| matches!(v, Bool(_))),
        dtype if dtype.starts_with("datetime64") => non_null
            .iter()
            .all(|v| v.as_str().map(|s| s.parse::<NaiveDate>().is_ok()).unwrap_or(false)),
        _ => false,
    }
}

fn try_column_dtypes(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let pairs = value_parse::dash_pairs(&rule.valoare_regula)?;
    let mut mismatches = Vec::new();

    for (column, dtype) in &pairs {
        let values: Vec<&crate::archive::AttrValue> =
            layer.rows.iter().filter_map(|r| r.get(column)).collect();
        if !attr_matches_dtype(&values, dtype) {
            mismatches.push(format!("{column}-{dtype}"));
        }
    }

    Ok(if mismatches.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail(mismatches.join(", "))
    })
}

pub struct ColumnDtypes;
impl Validator for ColumnDtypes {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_column_dtypes(rule, ctx))
    }
}
pub fn column_dtypes() -> Box<dyn Validator> {
    Box::new(ColumnDtypes)
}

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])(?: 00:00:00(?:\+00:00)?)?$").unwrap()
});
static DATE2_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,6}/(0[1-9]|[1-2][0-9]|3[0-1])\.(0[1-9]|1[0-2])\.\d{4}$").unwrap());
static ZECIMALE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d*\.\d{1,2}$").unwrap());
static HCL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,6}$").unwrap());

/// Checks one value against a `value_domain` column kind. `None` means the
/// value is blank and therefore exempt, matching the original's
/// `value is not None and not nan` guard before every branch.
fn value_domain_ok(
    kind: &str,
    value: &crate::archive::AttrValue,
    cod_zf: &crate::reference::Dictionary,
    h1: &crate::reference::Dictionary,
    h2: &crate::reference::Dictionary,
    h3: &crate::reference::Dictionary,
) -> bool {
    if value.is_null() {
        return true;
    }
    let text = value.display();
    match kind {
        "check_cod" => cod_zf.contains_code(&text),
        "check_h1" => h1.contains_code(&text),
        "check_h2" => h2.contains_code(&text),
        "check_h3" => h3.contains_code(&text),
        "Date" => DATE_RE.is_match(text.trim()),
        "Date_2" => DATE2_RE.is_match(text.trim()),
        "Zecimale" => ZECIMALE_RE.is_match(&text),
        "HCL" => HCL_RE.is_match(text.trim()),
        literal_enum => literal_enum.split('_').any(|item| item == text),
    }
}

fn try_value_domain(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let pairs = value_parse::column_kind_pairs(&rule.valoare_regula)?;

    let cod_zf = ctx.dict(DictKind::ZfZrs)?;
    let h1 = ctx.dict(DictKind::Hilucs1)?;
    let h2 = ctx.dict(DictKind::Hilucs2)?;
    let h3 = ctx.dict(DictKind::Hilucs3)?;

    // The original returns on the first column with any bad values rather
    // than accumulating across the whole comma list.
    for (column, kind) in &pairs {
        let wrong: Vec<usize> = layer
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                let value = row.get(column).cloned().unwrap_or(crate::archive::AttrValue::Null);
                !value_domain_ok(kind, &value, &cod_zf, &h1, &h2, &h3)
            })
            .map(|(i, _)| i + 1)
            .collect();

        if !wrong.is_empty() {
            let joined = crate::diagnostics::join_human(wrong.into_iter().map(|i| i.to_string()));
            return Ok(Outcome::fail(format!("{column}: {joined}")));
        }
    }

    Ok(Outcome::Pass)
}

pub struct ValueDomain;
impl Validator for ValueDomain {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_value_domain(rule, ctx))
    }
}
pub fn value_domain() -> Box<dyn Validator> {
    Box::new(ValueDomain)
}

fn parse_row_date(value: &crate::archive::AttrValue) -> Option<NaiveDate> {
    let text = value.as_str()?;
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S"))
        .ok()
}

fn try_temporal_coherence(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let columns = value_parse::comma_list(&rule.valoare_regula);
    let today = Utc::now().date_naive();

    let has = |name: &str| columns.iter().any(|c| c == name);

    let failing: Vec<usize> = if has("Data_aprob") && has("Data_exp") {
        layer
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                let approved = row.get("Data_aprob").and_then(parse_row_date);
                let expired = row.get("Data_exp").and_then(parse_row_date);
                match (approved, expired) {
                    (Some(a), Some(e)) => !(a <= today && today <= e),
                    _ => true,
                }
            })
            .map(|(i, _)| i + 1)
            .collect()
    } else if has("Data_exp") && columns.len() == 1 {
        layer
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get("Data_exp").and_then(parse_row_date).map(|e| today < e).unwrap_or(true))
            .map(|(i, _)| i + 1)
            .collect()
    } else if has("Revizie") && columns.len() == 1 {
        layer
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get("Revizie").and_then(parse_row_date).map(|r| today < r).unwrap_or(true))
            .map(|(i, _)| i + 1)
            .collect()
    } else {
        anyhow::bail!("no recognized temporal-coherence column combination in {columns:?}");
    };

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct TemporalCoherence;
impl Validator for TemporalCoherence {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_temporal_coherence(rule, ctx))
    }
}
pub fn temporal_coherence() -> Box<dyn Validator> {
    Box::new(TemporalCoherence)
}

static HILUCS_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d_]").unwrap());

fn try_hilucs_hierarchy(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let columns = value_parse::exact_fields(&rule.valoare_regula, 3)?;

    let h1 = ctx.dict(DictKind::Hilucs1)?;
    let h2 = ctx.dict(DictKind::Hilucs2)?;
    let h3 = ctx.dict(DictKind::Hilucs3)?;

    let mut failing = std::collections::BTreeSet::new();
    for (i, row) in layer.rows.iter().enumerate() {
        let hilucs1 = row.get(&columns[0]).filter(|v| !v.is_null()).map(|v| v.display());
        let hilucs2 = row.get(&columns[1]).filter(|v| !v.is_null()).map(|v| v.display());
        let hilucs3 = row.get(&columns[2]).filter(|v| !v.is_null()).map(|v| v.display());

        let h1_class = hilucs1
            .as_deref()
            .map(|s| HILUCS_STRIP_RE.replace_all(s, "").to_string())
            .unwrap_or_default();
        let h2_class = hilucs2
            .as_deref()
            .map(|s| HILUCS_STRIP_RE.replace_all(s, "").to_string())
            .unwrap_or_default();

        if hilucs1.as_deref().map(|v| !h1.contains_code(v)).unwrap_or(true) {
            failing.insert(i + 1);
        }
        if let Some(h2_value) = &hilucs2 {
            if !h2_value.contains(&h1_class) || !h2.contains_code(h2_value) {
                failing.insert(i + 1);
            }
        }
        if let Some(h3_value) = &hilucs3 {
            if !h3_value.contains(&h2_class) || !h3.contains_code(h3_value) {
                failing.insert(i + 1);
            }
        }
    }

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing.into_iter().collect::<Vec<_>>())
    })
}

pub struct HilucsHierarchy;
impl Validator for HilucsHierarchy {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_hilucs_hierarchy(rule, ctx))
    }
}
pub fn hilucs_hierarchy() -> Box<dyn Validator> {
    Box::new(HilucsHierarchy)
}

fn try_referential_inclusion(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let (layer_1, column_1) = value_parse::colon_pair(&rule.formula_regula)?;
    let (layer_2, column_2) = value_parse::colon_pair(&rule.valoare_regula)?;

    let source = require_layer(ctx, &layer_1)?;
    let codes: Vec<String> = source.rows.iter().filter_map(|r| r.get(&column_1)).map(|v| v.display()).collect();

    let target = require_layer(ctx, &layer_2)?;
    let failing: Vec<usize> = target
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            let value = row.get(&column_2).map(|v| v.display()).unwrap_or_default();
            !codes.contains(&value)
        })
        .map(|(i, _)| i + 1)
        .collect();

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        let joined = crate::diagnostics::join_human(failing.into_iter().map(|i| i.to_string()));
        Outcome::fail(format!("{column_2}: {joined}"))
    })
}

pub struct ReferentialInclusion;
impl Validator for ReferentialInclusion {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_referential_inclusion(rule, ctx))
    }
}
pub fn referential_inclusion() -> Box<dyn Validator> {
    Box::new(ReferentialInclusion)
}

fn try_unique_codes(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let mut seen = Vec::new();
    let mut failing = Vec::new();

    for (i, row) in layer.rows.iter().enumerate() {
        let code = row.get(&rule.valoare_regula).map(|v| v.display()).unwrap_or_default();
        if seen.contains(&code) {
            failing.push(i + 1);
        } else {
            seen.push(code);
        }
    }

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct UniqueCodes;
impl Validator for UniqueCodes {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_unique_codes(rule, ctx))
    }
}
pub fn unique_codes() -> Box<dyn Validator> {
    Box::new(UniqueCodes)
}

fn try_referential_exclusion(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let (layer_1, column_1) = value_parse::colon_pair(&rule.formula_regula)?;
    let (layer_2, column_2) = value_parse::colon_pair(&rule.valoare_regula)?;

    let source = require_layer(ctx, &layer_1)?;
    let codes: Vec<String> = source.rows.iter().filter_map(|r| r.get(&column_1)).map(|v| v.display()).collect();

    let target = require_layer(ctx, &layer_2)?;
    let failing: Vec<usize> = target
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            let value = row.get(&column_2).map(|v| v.display()).unwrap_or_default();
            codes.contains(&value)
        })
        .map(|(i, _)| i + 1)
        .collect();

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        let joined = crate::diagnostics::join_human(failing.into_iter().map(|i| i.to_string()));
        Outcome::fail(format!("{column_2}: {joined}"))
    })
}

pub struct ReferentialExclusion;
impl Validator for ReferentialExclusion {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_referential_exclusion(rule, ctx))
    }
}
pub fn referential_exclusion() -> Box<dyn Validator> {
    Box::new(ReferentialExclusion)
}

fn try_romanian_normalization(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let fields = value_parse::exact_fields(&rule.valoare_regula, 2)?;
    let (cod, tip) = (fields[0].clone(), fields[1].clone());

    let zfzrs = ctx.dict(DictKind::ZfZrs)?;
    let mut failing = Vec::new();

    for (i, row) in layer.rows.iter().enumerate() {
        let cod_value = row.get(&cod).map(|v| v.display()).unwrap_or_default();
        let tip_value = row.get(&tip).map(|v| v.display()).unwrap_or_default();

        let entry = zfzrs
            .find(&cod_value)
            .ok_or_else(|| anyhow::anyhow!("code {cod_value:?} not found in zfzrs dictionary"))?;
        let expected = entry.definite_lung.as_deref().unwrap_or("").trim();

        if !romanian::eq_after_normalization(&tip_value, expected) {
            failing.push(i + 1);
        }
    }

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct RomanianNormalization;
impl Validator for RomanianNormalization {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_romanian_normalization(rule, ctx))
    }
}
pub fn romanian_normalization() -> Box<dyn Validator> {
    Box::new(RomanianNormalization)
}

fn try_single_unique_value(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let columns = value_parse::comma_list(&rule.valoare_regula);
    let mut failing = Vec::new();

    for column in &columns {
        let values: Vec<String> = layer.rows.iter().map(|r| r.get(column).map(|v| v.display()).unwrap_or_default()).collect();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for v in &values {
            *counts.entry(v.clone()).or_insert(0) += 1;
        }
        if counts.len() <= 1 {
            continue;
        }

        let max_count = *counts.values().max().unwrap_or(&0);
        let minority: Vec<&String> = counts.iter().filter(|(_, &c)| c != max_count).map(|(k, _)| k).collect();

        for (i, v) in values.iter().enumerate() {
            if minority.contains(&v) {
                failing.push(i + 1);
            }
        }
    }

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct SingleUniqueValue;
impl Validator for SingleUniqueValue {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_single_unique_value(rule, ctx))
    }
}
pub fn single_unique_value() -> Box<dyn Validator> {
    Box::new(SingleUniqueValue)
}

fn sum_column(layer: &crate::archive::LayerTable, column: &str) -> f64 {
    layer.rows.iter().filter_map(|r| r.get(column)).filter_map(|v| v.as_f64()).sum()
}

fn try_column_sums_match(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let (layer_1, col_1) = value_parse::dash_pair(&rule.formula_regula)?;
    let (layer_2, col_2) = value_parse::dash_pair(&rule.valoare_regula)?;

    let sum_1 = sum_column(require_layer(ctx, &layer_1)?, &col_1);
    let sum_2 = sum_column(require_layer(ctx, &layer_2)?, &col_2);

    let diff = format!("{:.2}", (sum_1 - sum_2).abs()).parse::<f64>().unwrap_or(f64::MAX);
    Ok(if diff <= 0.1 {
        Outcome::Pass
    } else {
        Outcome::fail(format!("{sum_1} vs {sum_2}"))
    })
}

pub struct ColumnSumsMatch;
impl Validator for ColumnSumsMatch {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_column_sums_match(rule, ctx))
    }
}
pub fn column_sums_match() -> Box<dyn Validator> {
    Box::new(ColumnSumsMatch)
}

fn try_admin_polygon_resolvable(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let row = row0(layer, "siruta")?;
    let siruta = row.get(&rule.valoare_regula).map(|v| v.display()).unwrap_or_default();

    Ok(match ctx.uat(&siruta)? {
        Some(_) => Outcome::Pass,
        None => Outcome::fail(siruta),
    })
}

pub struct AdminPolygonResolvable;
impl Validator for AdminPolygonResolvable {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_admin_polygon_resolvable(rule, ctx))
    }
}
pub fn admin_polygon_resolvable() -> Box<dyn Validator> {
    Box::new(AdminPolygonResolvable)
}

fn try_cross_table_composite(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    require_readable(ctx)?;
    let (layer_1, columns_1) = value_parse::layer_and_columns(&rule.formula_regula)?;
    let (layer_2, columns_2) = value_parse::layer_and_columns(&rule.valoare_regula)?;

    if columns_1.len() != 3 || columns_2.len() != 3 {
        anyhow::bail!("cross-table composite expects exactly 3 columns per side");
    }
    let (cod_1, tip_1, zona_1) = (&columns_1[0], &columns_1[1], &columns_1[2]);
    let (cod_2, tip_2, zona_tip) = (&columns_2[0], &columns_2[1], &columns_2[2]);

    let source = require_layer(ctx, &layer_1)?;
    let target = require_layer(ctx, &layer_2)?;

    let target_codes: Vec<String> = target.rows.iter().filter_map(|r| r.get(cod_2)).map(|v| v.display()).collect();
    let target_types: Vec<String> = target
        .rows
        .iter()
        .filter_map(|r| r.get(tip_2))
        .map(|v| v.display().trim().to_string())
        .collect();

    let mut failing = Vec::new();
    for (i, row) in source.rows.iter().enumerate() {
        let cod_value = row.get(cod_1).map(|v| v.display()).unwrap_or_default();
        if !target_codes.contains(&cod_value) {
            continue;
        }

        let tip_value = row.get(tip_1).map(|v| v.display().trim().to_string()).unwrap_or_default();
        if !target_types.contains(&tip_value) {
            failing.push(i + 1);
        }

        let zona_value = row.get(zona_1).map(|v| v.display()).unwrap_or_default();
        if !romanian::eq_after_normalization(&zona_value, zona_tip) {
            failing.push(i + 1);
        }
    }

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct CrossTableComposite;
impl Validator for CrossTableComposite {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_cross_table_composite(rule, ctx))
    }
}
pub fn cross_table_composite() -> Box<dyn Validator> {
    Box::new(CrossTableComposite)
}
