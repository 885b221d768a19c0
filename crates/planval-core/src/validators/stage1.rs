//! Stage 1 — container presence (spec.md §4.5 R1, R2).
//!
//! Grounded on `CategoryOne.rule_1`/`rule_2` in `original_source/.../rules.py`:
//! these two run before introspection even succeeds, so they read the raw
//! submission path directly instead of going through `ArchiveView`.

use super::{guard, Validator};
use crate::archive::ArchiveIntrospector;
use crate::context::RunContext;
use crate::diagnostics::Outcome;
use crate::rule::Rule;

pub struct SubmissionPathExists;

impl Validator for SubmissionPathExists {
    fn run(&self, _rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(Ok(
            if ArchiveIntrospector::path_exists(ctx.submission_path) {
                Outcome::Pass
            } else {
                Outcome::fail(ctx.submission_path.display().to_string())
            },
        ))
    }
}

pub fn submission_path_exists() -> Box<dyn Validator> {
    Box::new(SubmissionPathExists)
}

pub struct ArchiveIsValid;

impl Validator for ArchiveIsValid {
    fn run(&self, _rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(Ok(
            if ArchiveIntrospector::is_valid_archive(ctx.submission_path) {
                Outcome::Pass
            } else {
                Outcome::fail(ctx.submission_path.display().to_string())
            },
        ))
    }
}

pub fn archive_is_valid() -> Box<dyn Validator> {
    Box::new(ArchiveIsValid)
}
