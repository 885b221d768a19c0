//! The 46 validators (spec.md §4.5, §9 "Polymorphism over validator families").
//!
//! Every validator implements the same trait so the dispatcher (`registry.rs`)
//! can hold them behind `Box<dyn Validator>` instead of the original's four
//! disjoint `CategoryOne`..`CategoryFour` classes with heterogeneous
//! signatures. Each `run` is grounded row-for-row on the matching `rule_N`
//! method in `original_source/.../rules.py`; module-level doc comments below
//! cite the stage boundary, not the individual rule.

pub(crate) mod stage1;
pub(crate) mod stage2;
pub(crate) mod stage3;
pub(crate) mod stage4_geometry;
pub(crate) mod stage4_schema;

pub use stage1::*;
pub use stage2::*;
pub use stage3::*;
pub use stage4_geometry::*;
pub use stage4_schema::*;

use regex::Regex;

use crate::archive::LayerTable;
use crate::context::RunContext;
use crate::diagnostics::Outcome;
use crate::rule::Rule;

/// A single rule-kind's check. `run` never propagates a panic or an error
/// out of the dispatcher's call: every validator body is built on
/// [`guard`], which converts a stray `anyhow::Error` into `Outcome::Error`
/// (spec.md §7 — validators never propagate exceptions).
pub trait Validator: Send + Sync {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome;
}

/// Collapse a fallible validator body into the three-way `Outcome`. Every
/// validator's `run` is `guard(Self::try_run(rule, ctx))`.
pub(super) fn guard(result: anyhow::Result<Outcome>) -> Outcome {
    result.unwrap_or_else(Outcome::from_panic_like)
}

/// Look up a layer, treating an unreadable archive or a missing layer as a
/// validator-level error rather than a panic (spec.md §4.1 failure modes).
pub(super) fn require_layer<'a>(ctx: &'a RunContext, name: &str) -> anyhow::Result<&'a LayerTable> {
    if !ctx.archive.readable {
        anyhow::bail!("archive could not be introspected");
    }
    ctx.layer(name)
        .ok_or_else(|| anyhow::anyhow!("layer '{name}' not found"))
}

pub(super) fn require_readable(ctx: &RunContext) -> anyhow::Result<()> {
    if !ctx.archive.readable {
        anyhow::bail!("archive could not be introspected");
    }
    Ok(())
}

/// Row-0 lookup for rules that only ever look at the first feature (R30,
/// R32's SIRUTA, R33/R34/R45's container geometry, ...).
pub(super) fn row0<'a>(layer: &'a LayerTable, what: &str) -> anyhow::Result<&'a crate::archive::Row> {
    layer
        .rows
        .first()
        .ok_or_else(|| anyhow::anyhow!("layer has no rows, cannot read {what} from row 0"))
}

/// Emulates Python's `re.match`: anchored at the start, not a full-string
/// match (spec.md R4/R9/R13 use `re.match(regex, value)`).
pub(super) fn regex_matches_prefix(re: &Regex, value: &str) -> bool {
    re.find(value).map(|m| m.start() == 0).unwrap_or(false)
}
