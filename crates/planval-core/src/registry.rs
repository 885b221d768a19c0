//! RuleRegistry & Dispatcher (spec.md §4.4, §9 Design Notes).
//!
//! Replaces the original's `if tip_regula_id == N: ...` conditional ladder
//! (`original_source/.../validation.py::Validation.validate`) with a static
//! `HashMap<RuleKind, ValidatorFactory>`, grounded on the teacher's
//! `ValidatorRegistry` (`registry.rs`). An id outside the known range, or a
//! validator that panics, becomes a single `Outcome::Error` row instead of
//! being silently dropped by a bare `except: pass` — the dispatch-safety gap
//! spec.md §9 calls out as a defect this rewrite fixes, not an open question.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use planval_rules::RuleKind;

use crate::context::RunContext;
use crate::diagnostics::Outcome;
use crate::rule::Rule;
use crate::validators::{self, Validator};

pub type ValidatorFactory = fn() -> Box<dyn Validator>;

pub struct RuleRegistry {
    validators: HashMap<RuleKind, ValidatorFactory>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    pub fn register(&mut self, kind: RuleKind, factory: ValidatorFactory) {
        self.validators.insert(kind, factory);
    }

    pub fn total_registered(&self) -> usize {
        self.validators.len()
    }

    /// Route `rule` to its validator and run it, catching both an unknown
    /// `tip_regula_id` and a validator panic as `Outcome::Error` — the
    /// dispatcher never propagates a per-rule failure (spec.md §7).
    pub fn dispatch(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        let kind = match rule.kind() {
            Ok(kind) => kind,
            Err(e) => return Outcome::error(e.to_string()),
        };

        let Some(factory) = self.validators.get(&kind) else {
            return Outcome::error(format!("no validator registered for rule kind {kind}"));
        };

        let validator = factory();
        let result = panic::catch_unwind(AssertUnwindSafe(|| validator.run(rule, ctx)));
        match result {
            Ok(outcome) => outcome,
            Err(payload) => Outcome::from_panic_like(panic_message(&payload)),
        }
    }

    fn register_defaults(&mut self) {
        use RuleKind::*;
        const DEFAULTS: &[(RuleKind, ValidatorFactory)] = &[
            (SubmissionPathExists, validators::stage1::submission_path_exists),
            (ArchiveIsValid, validators::stage1::archive_is_valid),
            (MainDirCount, validators::stage2::main_dir_count),
            (MainDirRegex, validators::stage2::main_dir_regex),
            (FolderCount, validators::stage2::folder_count),
            (FolderNamesPresent, validators::stage2::folder_names_present),
            (FolderPathPrefix, validators::stage2::folder_path_prefix),
            (GeoPackageCount, validators::stage2::geopackage_count),
            (GeoPackageNameRegex, validators::stage2::geopackage_name_regex),
            (NonArchivePdfCount, validators::stage2::non_archive_pdf_count),
            (PdfNamesPresent, validators::stage2::pdf_names_present),
            (AvizeCount, validators::stage2::avize_count),
            (AvizeNameRegex, validators::stage2::avize_name_regex),
            (PdfMagicNumber, validators::stage3::pdf_magic_number),
            (GeoPackageDriver, validators::stage3::geopackage_driver),
            (LayerCountAtLeast, validators::stage4_schema::layer_count_at_least),
            (LayerExists, validators::stage4_schema::layer_exists),
            (NonGeometryColumnCount, validators::stage4_schema::non_geometry_column_count),
            (ColumnsPresent, validators::stage4_schema::columns_present),
            (LayerNonEmpty, validators::stage4_schema::layer_non_empty),
            (ColumnsNotNull, validators::stage4_schema::columns_not_null),
            (ColumnDtypes, validators::stage4_schema::column_dtypes),
            (ValueDomain, validators::stage4_schema::value_domain),
            (TemporalCoherence, validators::stage4_schema::temporal_coherence),
            (HilucsHierarchy, validators::stage4_schema::hilucs_hierarchy),
            (ReferentialInclusion, validators::stage4_schema::referential_inclusion),
            (UniqueCodes, validators::stage4_schema::unique_codes),
            (ReferentialExclusion, validators::stage4_schema::referential_exclusion),
            (RomanianNormalization, validators::stage4_schema::romanian_normalization),
            (SingleUniqueValue, validators::stage4_schema::single_unique_value),
            (ColumnSumsMatch, validators::stage4_schema::column_sums_match),
            (AdminPolygonResolvable, validators::stage4_schema::admin_polygon_resolvable),
            (CrossTableComposite, validators::stage4_schema::cross_table_composite),
            (LayerCrs, validators::stage4_geometry::layer_crs),
            (GeometryColumnNonEmpty, validators::stage4_geometry::geometry_column_non_empty),
            (NoNullGeometries, validators::stage4_geometry::no_null_geometries),
            (GeometryType, validators::stage4_geometry::geometry_type),
            (GeometryValidity, validators::stage4_geometry::geometry_validity),
            (WithinAdminBoundary, validators::stage4_geometry::within_admin_boundary),
            (WithinContainer, validators::stage4_geometry::within_container),
            (CoversContainer, validators::stage4_geometry::covers_container),
            (TrueOverlap, validators::stage4_geometry::true_overlap),
            (SliverPolygons, validators::stage4_geometry::sliver_polygons),
            (GeometryIs2d, validators::stage4_geometry::geometry_is_2d),
            (AreaWithinTolerance, validators::stage4_geometry::area_within_tolerance),
            (LengthWithinTolerance, validators::stage4_geometry::length_within_tolerance),
        ];

        for &(kind, factory) in DEFAULTS {
            self.register(kind, factory);
        }
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "validator panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_all_46_kinds() {
        let registry = RuleRegistry::with_defaults();
        assert_eq!(registry.total_registered(), 46);
        for kind in RuleKind::ALL {
            assert!(
                registry.validators.contains_key(&kind),
                "missing validator for {kind}"
            );
        }
    }
}
