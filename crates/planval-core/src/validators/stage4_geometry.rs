//! Stage 4 — geometry checks (spec.md §4.5 R27..R36, R41..R43).
//!
//! Grounded row-for-row on `CategoryFour.rule_27`..`rule_43` in
//! `original_source/.../rules.py`. Every rule that mixes geometries from two
//! layers (or a layer against the remote UAT polygon) reconciles them to
//! [`crate::context::WORKING_CRS`] first via [`crate::geometry::reproject`],
//! per spec.md §9 "Geometry CRS reconciliation" — the original relies on
//! GeoPandas implicitly carrying a shared CRS, which this rewrite makes
//! explicit instead of assuming.

use geo_types::Geometry;
use planval_rules::value_parse;
use rstar::{RTree, RTreeObject, AABB};

use super::{guard, require_layer, require_readable, row0, Validator};
use crate::archive::LayerTable;
use crate::context::{RunContext, WORKING_CRS};
use crate::diagnostics::Outcome;
use crate::geometry;
use crate::rule::Rule;
use planval_rules::RuleCategory;

fn geometries_in_working_crs(layer: &LayerTable) -> anyhow::Result<Vec<Option<Geometry<f64>>>> {
    let from = layer.crs.as_deref().unwrap_or(WORKING_CRS);
    layer
        .rows
        .iter()
        .map(|row| match &row.geometry {
            Some(g) => geometry::reproject(g, from, WORKING_CRS).map(Some),
            None => Ok(None),
        })
        .collect()
}

fn try_layer_crs(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let crs = layer.crs.as_deref().unwrap_or("");
    Ok(if crs == rule.valoare_regula {
        Outcome::Pass
    } else {
        Outcome::fail(crs.to_string())
    })
}

pub struct LayerCrs;
impl Validator for LayerCrs {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_layer_crs(rule, ctx))
    }
}
pub fn layer_crs() -> Box<dyn Validator> {
    Box::new(LayerCrs)
}

fn try_geometry_column_non_empty(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    Ok(if layer.rows.is_empty() {
        Outcome::fail(rule.formula_regula.clone())
    } else {
        Outcome::Pass
    })
}

pub struct GeometryColumnNonEmpty;
impl Validator for GeometryColumnNonEmpty {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_geometry_column_non_empty(rule, ctx))
    }
}
pub fn geometry_column_non_empty() -> Box<dyn Validator> {
    Box::new(GeometryColumnNonEmpty)
}

fn try_no_null_geometries(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let failing: Vec<usize> = layer
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.geometry.is_none())
        .map(|(i, _)| i + 1)
        .collect();
    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct NoNullGeometries;
impl Validator for NoNullGeometries {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_no_null_geometries(rule, ctx))
    }
}
pub fn no_null_geometries() -> Box<dyn Validator> {
    Box::new(NoNullGeometries)
}

fn geometry_kind_name(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "LineString",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Polygon",
        Geometry::Triangle(_) => "Polygon",
    }
}

fn try_geometry_type(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let row = row0(layer, "geometry")?;
    let geom = row
        .geometry
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("row 0 of layer '{}' has no geometry", rule.formula_regula))?;

    Ok(if geometry_kind_name(geom) == rule.valoare_regula {
        Outcome::Pass
    } else {
        Outcome::fail(rule.valoare_regula.clone())
    })
}

pub struct GeometryType;
impl Validator for GeometryType {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_geometry_type(rule, ctx))
    }
}
pub fn geometry_type() -> Box<dyn Validator> {
    Box::new(GeometryType)
}

fn try_geometry_validity(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let mut failing = Vec::new();
    for (i, row) in layer.rows.iter().enumerate() {
        let Some(geom) = row.geometry.as_ref() else {
            continue;
        };
        if !geometry::is_valid(geom)? {
            failing.push(i + 1);
        }
    }
    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct GeometryValidity;
impl Validator for GeometryValidity {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_geometry_validity(rule, ctx))
    }
}
pub fn geometry_validity() -> Box<dyn Validator> {
    Box::new(GeometryValidity)
}

/// R32's PUZ branch checks strict UAT containment; the other three
/// categories check the plan boundary stays within the UAT buffered
/// outward by 10 working-CRS units (spec.md Open Question: this rewrite
/// compares whole-geometry containment rather than ring-boundary
/// containment, since `geo-types` has no boundary extraction and the two
/// coincide for the well-formed single-ring polygons this domain submits).
fn try_within_admin_boundary(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let row = row0(layer, &rule.valoare_regula)?;
    let siruta = row.get(&rule.valoare_regula).map(|v| v.display()).unwrap_or_default();

    let Some(uat) = ctx.uat(&siruta)? else {
        return Ok(Outcome::fail(siruta));
    };

    let geoms = geometries_in_working_crs(layer)?;
    let all_ok = match ctx.category {
        RuleCategory::Puz => geoms
            .iter()
            .filter_map(|g| g.as_ref())
            .all(|g| geometry::contains(&uat, g)),
        _ => {
            let buffered = geometry::buffer(&uat, 10.0)?;
            geoms.iter().filter_map(|g| g.as_ref()).all(|g| geometry::within(g, &buffered))
        }
    };

    Ok(if all_ok { Outcome::Pass } else { Outcome::fail(siruta) })
}

pub struct WithinAdminBoundary;
impl Validator for WithinAdminBoundary {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_within_admin_boundary(rule, ctx))
    }
}
pub fn within_admin_boundary() -> Box<dyn Validator> {
    Box::new(WithinAdminBoundary)
}

fn try_within_container(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer_tfi = require_layer(ctx, &rule.formula_regula)?;
    let layer_tbi = require_layer(ctx, &rule.valoare_regula)?;

    let container_row = row0(layer_tbi, "geometry")?;
    let container = container_row
        .geometry
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("container layer '{}' row 0 has no geometry", rule.valoare_regula))?;
    let container_from = layer_tbi.crs.as_deref().unwrap_or(WORKING_CRS);
    let container = geometry::reproject(container, container_from, WORKING_CRS)?;
    let buffered_container = geometry::buffer(&container, 0.1)?;

    let members = geometries_in_working_crs(layer_tfi)?;
    let failing: Vec<usize> = members
        .iter()
        .enumerate()
        .filter(|(_, g)| {
            g.as_ref()
                .map(|g| !geometry::within(g, &buffered_container))
                .unwrap_or(true)
        })
        .map(|(i, _)| i + 1)
        .collect();

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct WithinContainer;
impl Validator for WithinContainer {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_within_container(rule, ctx))
    }
}
pub fn within_container() -> Box<dyn Validator> {
    Box::new(WithinContainer)
}

fn try_covers_container(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer_to_cover = require_layer(ctx, &rule.formula_regula)?;
    let layer_to_be_covered = require_layer(ctx, &rule.valoare_regula)?;

    let container_row = row0(layer_to_be_covered, "geometry")?;
    let container = container_row
        .geometry
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("layer '{}' row 0 has no geometry", rule.valoare_regula))?;
    let container_from = layer_to_be_covered.crs.as_deref().unwrap_or(WORKING_CRS);
    let container = geometry::reproject(container, container_from, WORKING_CRS)?;

    let covering: Vec<Geometry<f64>> = geometries_in_working_crs(layer_to_cover)?
        .into_iter()
        .flatten()
        .collect();

    let covered_area = geometry::area(&container);
    let covering_area = geometry::union_area(&covering);

    Ok(if covered_area - 50.0 <= covering_area {
        Outcome::Pass
    } else {
        Outcome::fail(format!("{covering_area:.2} < {:.2}", covered_area - 50.0))
    })
}

pub struct CoversContainer;
impl Validator for CoversContainer {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_covers_container(rule, ctx))
    }
}
pub fn covers_container() -> Box<dyn Validator> {
    Box::new(CoversContainer)
}

struct IndexedEnvelope {
    index: usize,
    min: [f64; 2],
    max: [f64; 2],
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

fn bounding_box(geom: &Geometry<f64>) -> Option<([f64; 2], [f64; 2])> {
    use geo::BoundingRect;
    geom.bounding_rect()
        .map(|r| ([r.min().x, r.min().y], [r.max().x, r.max().y]))
}

/// Spatial-index overlap scan, grounded on `rule_35`'s `sindex.intersection`
/// candidate lookup followed by an exact `geom.overlaps` test. Candidate
/// pairs are deduplicated by sorted index (R35's `unique_pairs` set), so
/// `(i, j)` and `(j, i)` report as a single failure.
fn try_true_overlap(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let geoms = geometries_in_working_crs(layer)?;

    let entries: Vec<IndexedEnvelope> = geoms
        .iter()
        .enumerate()
        .filter_map(|(i, g)| g.as_ref().and_then(|g| bounding_box(g)).map(|(min, max)| IndexedEnvelope { index: i, min, max }))
        .collect();
    let tree = RTree::bulk_load(entries);

    let mut unique_pairs = std::collections::BTreeSet::new();
    let mut pairs = Vec::new();

    for leaf in tree.iter() {
        let i = leaf.index;
        let Some(geom_i) = geoms[i].as_ref() else { continue };
        let candidates: Vec<usize> = tree
            .locate_in_envelope_intersecting(&leaf.envelope())
            .map(|c| c.index)
            .collect();

        for j in candidates {
            if i == j {
                continue;
            }
            let Some(geom_j) = geoms[j].as_ref() else { continue };
            if geometry::truly_overlaps(geom_i, geom_j) {
                let key = if i < j { (i, j) } else { (j, i) };
                if unique_pairs.insert(key) {
                    pairs.push((i + 1, j + 1));
                }
            }
        }
    }

    Ok(if pairs.is_empty() {
        Outcome::Pass
    } else {
        let verify = pairs
            .into_iter()
            .map(|(a, b)| format!("({a}, {b})"))
            .collect::<Vec<_>>()
            .join(", ");
        Outcome::fail(verify)
    })
}

pub struct TrueOverlap;
impl Validator for TrueOverlap {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_true_overlap(rule, ctx))
    }
}
pub fn true_overlap() -> Box<dyn Validator> {
    Box::new(TrueOverlap)
}

const SLIVER_AREA_THRESHOLD: f64 = 1e-6;
const SLIVER_ASPECT_RATIO_THRESHOLD: f64 = 10.0;

fn try_sliver_polygons(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let failing: Vec<usize> = layer
        .rows
        .iter()
        .filter_map(|r| r.geometry.as_ref())
        .enumerate()
        .filter(|(_, geom)| {
            let area = geometry::area(geom);
            let ratio = if area > 0.0 {
                geometry::length(geom) / area
            } else {
                f64::INFINITY
            };
            area < SLIVER_AREA_THRESHOLD && ratio > SLIVER_ASPECT_RATIO_THRESHOLD
        })
        .map(|(i, _)| i + 1)
        .collect();

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct SliverPolygons;
impl Validator for SliverPolygons {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_sliver_polygons(rule, ctx))
    }
}
pub fn sliver_polygons() -> Box<dyn Validator> {
    Box::new(SliverPolygons)
}

fn try_geometry_is_2d(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;
    let failing: Vec<usize> = layer
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.has_z)
        .map(|(i, _)| i + 1)
        .collect();
    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct GeometryIs2d;
impl Validator for GeometryIs2d {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_geometry_is_2d(rule, ctx))
    }
}
pub fn geometry_is_2d() -> Box<dyn Validator> {
    Box::new(GeometryIs2d)
}

fn try_area_within_tolerance(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let (layer_name, unit) = value_parse::dash_pair(&rule.formula_regula)?;
    let layer = require_layer(ctx, &layer_name)?;

    let mut failing = Vec::new();
    for (i, row) in layer.rows.iter().enumerate() {
        let Some(geom) = row.geometry.as_ref() else {
            failing.push(i + 1);
            continue;
        };
        let raw_area = (geometry::area(geom) * 100.0).round() / 100.0;
        let value = match unit.as_str() {
            "ha" => raw_area / 10_000.0,
            "m" => raw_area,
            other => anyhow::bail!("unrecognized area unit {other:?}"),
        };

        let declared: f64 = row
            .get(&rule.valoare_regula)
            .map(|v| v.display())
            .unwrap_or_default()
            .trim()
            .parse()?;
        let diff = ((value - declared).abs() * 100.0).round() / 100.0;
        if diff > 0.1 {
            failing.push(i + 1);
        }
    }

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct AreaWithinTolerance;
impl Validator for AreaWithinTolerance {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_area_within_tolerance(rule, ctx))
    }
}
pub fn area_within_tolerance() -> Box<dyn Validator> {
    Box::new(AreaWithinTolerance)
}

fn try_length_within_tolerance(rule: &Rule, ctx: &RunContext) -> anyhow::Result<Outcome> {
    let layer = require_layer(ctx, &rule.formula_regula)?;

    let mut failing = Vec::new();
    for (i, row) in layer.rows.iter().enumerate() {
        let Some(geom) = row.geometry.as_ref() else {
            failing.push(i + 1);
            continue;
        };
        let value = (geometry::length(geom) * 100.0).round() / 100.0;
        let declared: f64 = row
            .get(&rule.valoare_regula)
            .map(|v| v.display())
            .unwrap_or_default()
            .trim()
            .parse()?;
        let diff = ((value - declared).abs() * 100.0).round() / 100.0;
        if diff > 0.1 {
            failing.push(i + 1);
        }
    }

    Ok(if failing.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(failing)
    })
}

pub struct LengthWithinTolerance;
impl Validator for LengthWithinTolerance {
    fn run(&self, rule: &Rule, ctx: &RunContext) -> Outcome {
        guard(try_length_within_tolerance(rule, ctx))
    }
}
pub fn length_within_tolerance() -> Box<dyn Validator> {
    Box::new(LengthWithinTolerance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveView, AttrValue, LayerTable, Row};
    use crate::reference::stub::StubReferenceLoader;
    use geo_types::{polygon, Polygon};
    use std::collections::HashMap as Map;
    use std::path::Path;

    fn rule(formula: &str, value: &str) -> Rule {
        Rule {
            numar_regula: 1,
            tip_regula_id: 27,
            categorie_regula_id: 1,
            tip_validare_id: 4,
            tip_alerta_id: 1,
            formula_regula: formula.to_string(),
            valoare_regula: value.to_string(),
            descriere: "d".into(),
            pass_alerta: "p".into(),
            fail_alerta: "f".into(),
            error_alerta: "e".into(),
            mesaj_modificare: "-".into(),
            eroare_modificare: "-".into(),
        }
    }

    fn archive_with_layer(name: &str, layer: LayerTable) -> ArchiveView {
        let mut layers = Map::new();
        layers.insert(name.to_string(), layer);
        ArchiveView {
            file_list: vec![],
            main_dirs: vec![],
            folder_list: vec![],
            pdfs_list: vec![],
            avize_list: vec![],
            gpkg_list: vec![],
            layers,
            gpkg_driver: Some("GPKG".to_string()),
            readable: true,
            _extraction: None,
        }
    }

    fn square(x0: f64, y0: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + side, y: y0),
            (x: x0 + side, y: y0 + side),
            (x: x0, y: y0 + side),
            (x: x0, y: y0),
        ]
    }

    fn row_with_geom(geom: Geometry<f64>) -> Row {
        Row {
            attrs: Default::default(),
            geometry: Some(geom),
            has_z: false,
        }
    }

    #[test]
    fn layer_crs_matches_declared_value() {
        let layer = LayerTable {
            columns: vec![],
            crs: Some("EPSG:3844".to_string()),
            rows: vec![],
        };
        let archive = archive_with_layer("Zone", layer);
        let loader = StubReferenceLoader::new();
        let path = Path::new("/tmp/x.zip");
        let ctx = RunContext::new(&archive, RuleCategory::Pug, path, &loader);

        assert!(matches!(LayerCrs.run(&rule("Zone", "EPSG:3844"), &ctx), Outcome::Pass));
        assert!(matches!(LayerCrs.run(&rule("Zone", "EPSG:4326"), &ctx), Outcome::Fail { .. }));
    }

    #[test]
    fn no_null_geometries_flags_missing_rows() {
        let layer = LayerTable {
            columns: vec![],
            crs: Some(WORKING_CRS.to_string()),
            rows: vec![
                row_with_geom(Geometry::Polygon(square(0.0, 0.0, 1.0))),
                Row { attrs: Default::default(), geometry: None, has_z: false },
            ],
        };
        let archive = archive_with_layer("Zone", layer);
        let loader = StubReferenceLoader::new();
        let path = Path::new("/tmp/x.zip");
        let ctx = RunContext::new(&archive, RuleCategory::Pug, path, &loader);

        match NoNullGeometries.run(&rule("Zone", ""), &ctx) {
            Outcome::Fail { verify } => assert_eq!(verify, "2"),
            other => panic!("expected Fail, got {other:?}"),
        }
    }

    #[test]
    fn true_overlap_detects_partial_overlap_once() {
        let layer = LayerTable {
            columns: vec![],
            crs: Some(WORKING_CRS.to_string()),
            rows: vec![
                row_with_geom(Geometry::Polygon(square(0.0, 0.0, 10.0))),
                row_with_geom(Geometry::Polygon(square(5.0, 5.0, 10.0))),
                row_with_geom(Geometry::Polygon(square(100.0, 100.0, 1.0))),
            ],
        };
        let archive = archive_with_layer("Zone", layer);
        let loader = StubReferenceLoader::new();
        let path = Path::new("/tmp/x.zip");
        let ctx = RunContext::new(&archive, RuleCategory::Pug, path, &loader);

        match TrueOverlap.run(&rule("Zone", ""), &ctx) {
            Outcome::Fail { verify } => assert_eq!(verify, "(1, 2)"),
            other => panic!("expected Fail, got {other:?}"),
        }
    }

    #[test]
    fn geometry_is_2d_flags_rows_carrying_a_z_ordinate() {
        let layer = LayerTable {
            columns: vec![],
            crs: Some(WORKING_CRS.to_string()),
            rows: vec![
                row_with_geom(Geometry::Polygon(square(0.0, 0.0, 1.0))),
                Row {
                    attrs: Default::default(),
                    geometry: Some(Geometry::Polygon(square(5.0, 5.0, 1.0))),
                    has_z: true,
                },
            ],
        };
        let archive = archive_with_layer("Zone", layer);
        let loader = StubReferenceLoader::new();
        let path = Path::new("/tmp/x.zip");
        let ctx = RunContext::new(&archive, RuleCategory::Pug, path, &loader);

        match GeometryIs2d.run(&rule("Zone", ""), &ctx) {
            Outcome::Fail { verify } => assert_eq!(verify, "2"),
            other => panic!("expected Fail, got {other:?}"),
        }
    }

    #[test]
    fn area_within_tolerance_accepts_hectare_unit() {
        let layer = LayerTable {
            columns: vec!["suprafata".to_string()],
            crs: Some(WORKING_CRS.to_string()),
            rows: vec![Row {
                attrs: [("suprafata".to_string(), AttrValue::Float(1.0))].into_iter().collect(),
                geometry: Some(Geometry::Polygon(square(0.0, 0.0, 100.0))),
                has_z: false,
            }],
        };
        let archive = archive_with_layer("Zone", layer);
        let loader = StubReferenceLoader::new();
        let path = Path::new("/tmp/x.zip");
        let ctx = RunContext::new(&archive, RuleCategory::Pug, path, &loader);

        assert!(matches!(
            AreaWithinTolerance.run(&rule("Zone-ha", "suprafata"), &ctx),
            Outcome::Pass
        ));
    }
}
