//! RunContext: the dependency bundle every validator receives.
//!
//! Grounded on the teacher's `ValidatorContext` (`context.rs`): instead of a
//! validator threading the archive view, dictionaries, and reference loader
//! through individually, they arrive bundled in one struct the trait method
//! borrows (spec.md §9 "Polymorphism over validator families":
//! `fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome`).

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use geo_types::Geometry;
use planval_rules::RuleCategory;

use crate::archive::ArchiveView;
use crate::reference::{DictKind, Dictionary, ReferenceLoader};

/// The working CRS geometry rules reconcile to before testing
/// (spec.md §9 "Geometry CRS reconciliation"; §3 "expected EPSG:3844").
pub const WORKING_CRS: &str = "EPSG:3844";

pub struct RunContext<'a> {
    pub archive: &'a ArchiveView,
    pub category: RuleCategory,
    /// The submission path itself, needed by the Stage 1 rules (R1/R2) and
    /// by R14's PDF magic-number sniff, which re-reads raw entry bytes
    /// rather than the parsed `ArchiveView`.
    pub submission_path: &'a Path,
    loader: &'a dyn ReferenceLoader,
    dict_cache: RefCell<HashMap<DictKind, Dictionary>>,
    uat_cache: RefCell<HashMap<String, Option<Geometry<f64>>>>,
}

impl<'a> RunContext<'a> {
    pub fn new(
        archive: &'a ArchiveView,
        category: RuleCategory,
        submission_path: &'a Path,
        loader: &'a dyn ReferenceLoader,
    ) -> Self {
        Self {
            archive,
            category,
            submission_path,
            loader,
            dict_cache: RefCell::new(HashMap::new()),
            uat_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Fetch a dictionary, caching it for the rest of the run (spec.md §5:
    /// "ReferenceLoader calls are blocking I/O but may be cached inside a
    /// run").
    pub fn dict(&self, kind: DictKind) -> anyhow::Result<Dictionary> {
        if let Some(cached) = self.dict_cache.borrow().get(&kind) {
            return Ok(cached.clone());
        }
        let dict = self.loader.load_dict(kind)?;
        self.dict_cache.borrow_mut().insert(kind, dict.clone());
        Ok(dict)
    }

    pub fn uat(&self, siruta: &str) -> anyhow::Result<Option<Geometry<f64>>> {
        if let Some(cached) = self.uat_cache.borrow().get(siruta) {
            return Ok(cached.clone());
        }
        let polygon = self.loader.load_uat(siruta)?;
        self.uat_cache
            .borrow_mut()
            .insert(siruta.to_string(), polygon.clone());
        Ok(polygon)
    }

    pub fn layer(&self, name: &str) -> Option<&crate::archive::LayerTable> {
        self.archive.layers.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::stub::StubReferenceLoader;

    #[test]
    fn dict_is_cached_after_first_lookup() {
        let archive = ArchiveView::unreadable();
        let loader = StubReferenceLoader::new().with_dict(
            DictKind::ZfZrs,
            Dictionary {
                entries: vec![],
            },
        );
        let path = Path::new("/tmp/submission.zip");
        let ctx = RunContext::new(&archive, RuleCategory::Pug, path, &loader);

        assert!(ctx.dict(DictKind::ZfZrs).unwrap().entries.is_empty());
        assert!(ctx.dict_cache.borrow().contains_key(&DictKind::ZfZrs));
    }
}
