//! Geometry predicates and CRS reconciliation (spec.md §4.5 geometry rules,
//! §9 "Geometry CRS reconciliation").
//!
//! Every rule that mixes two geometries reprojects both to [`crate::context::WORKING_CRS`]
//! before testing, via the `proj` crate (the georust-ecosystem counterpart to
//! `geo`, already in the dependency stack for exactly this). Buffering uses
//! GDAL's GEOS-backed `OGR_G_Buffer` through the `geo` conversion feature,
//! since plain `geo-types` has no buffer operation of its own.

use geo::{Area, BooleanOps, Contains, EuclideanLength, Intersects};
use geo_types::{Geometry, MultiPolygon, Polygon};
use proj::Transform;

/// Reproject `geom` from `from_crs` to `to_crs` (both `AUTHORITY:CODE`
/// strings, e.g. `EPSG:3844`). A no-op when the two already match.
pub fn reproject(geom: &Geometry<f64>, from_crs: &str, to_crs: &str) -> anyhow::Result<Geometry<f64>> {
    if from_crs == to_crs {
        return Ok(geom.clone());
    }
    let mut out = geom.clone();
    out.transform_crs_to_crs(from_crs, to_crs)?;
    Ok(out)
}

/// Buffer `geom` outward by `distance` working-CRS units (R32's
/// administrative-boundary buffer, R33's container buffer).
pub fn buffer(geom: &Geometry<f64>, distance: f64) -> anyhow::Result<Geometry<f64>> {
    let gdal_geom = gdal::vector::Geometry::from_geo(geom.clone())?;
    let buffered = gdal_geom.buffer(distance, 8)?;
    buffered.to_geo().map_err(Into::into)
}

/// Best-effort `container.contains(containee)` across the Polygon/
/// MultiPolygon combinations this domain actually produces.
pub fn contains(container: &Geometry<f64>, containee: &Geometry<f64>) -> bool {
    match (container, containee) {
        (Geometry::Polygon(a), Geometry::Polygon(b)) => a.contains(b),
        (Geometry::Polygon(a), Geometry::MultiPolygon(b)) => a.contains(b),
        (Geometry::MultiPolygon(a), Geometry::Polygon(b)) => a.contains(b),
        (Geometry::MultiPolygon(a), Geometry::MultiPolygon(b)) => a.contains(b),
        _ => false,
    }
}

/// `a` lies within `b`, i.e. `b` contains `a` (R32's within-buffered check).
pub fn within(a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
    contains(b, a)
}

pub fn area(geom: &Geometry<f64>) -> f64 {
    geom.unsigned_area()
}

pub fn length(geom: &Geometry<f64>) -> f64 {
    geom.euclidean_length()
}

fn as_multipolygon(geom: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geom {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        _ => None,
    }
}

/// The union of `geoms`' area (R34's `union_of_covers.area`).
pub fn union_area(geoms: &[Geometry<f64>]) -> f64 {
    let mut acc = MultiPolygon::new(Vec::new());
    for geom in geoms {
        if let Some(mp) = as_multipolygon(geom) {
            acc = acc.union(&mp);
        }
    }
    acc.unsigned_area()
}

/// True overlap per spec.md R35: geometries intersect with positive-area
/// overlap, and neither fully contains the other.
pub fn truly_overlaps(a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
    if !a.intersects(b) {
        return false;
    }
    if contains(a, b) || contains(b, a) {
        return false;
    }
    let (Some(pa), Some(pb)) = (as_multipolygon(a), as_multipolygon(b)) else {
        return false;
    };
    pa.intersection(&pb).unsigned_area() > 1e-9
}

/// R31's full topological validity check, routed through GDAL's
/// `OGR_G_IsValid` (GEOS-backed) rather than a hand-rolled ring check.
/// A closed-ring-only check passes self-intersecting ("bowtie") polygons,
/// which is exactly the shape this rule exists to catch.
pub fn is_valid(geom: &Geometry<f64>) -> anyhow::Result<bool> {
    let gdal_geom = gdal::vector::Geometry::from_geo(geom.clone())?;
    Ok(gdal_geom.is_valid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, Coord, LineString};

    fn square(x0: f64, y0: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + side, y: y0),
            (x: x0 + side, y: y0 + side),
            (x: x0, y: y0 + side),
            (x: x0, y: y0),
        ]
    }

    #[test]
    fn contains_detects_polygon_in_polygon() {
        let outer = Geometry::Polygon(square(0.0, 0.0, 10.0));
        let inner = Geometry::Polygon(square(2.0, 2.0, 1.0));
        assert!(contains(&outer, &inner));
        assert!(within(&inner, &outer));
    }

    #[test]
    fn truly_overlaps_is_false_for_disjoint_and_containment() {
        let a = Geometry::Polygon(square(0.0, 0.0, 10.0));
        let disjoint = Geometry::Polygon(square(100.0, 100.0, 1.0));
        let contained = Geometry::Polygon(square(1.0, 1.0, 1.0));
        assert!(!truly_overlaps(&a, &disjoint));
        assert!(!truly_overlaps(&a, &contained));
    }

    #[test]
    fn truly_overlaps_is_true_for_partial_overlap() {
        let a = Geometry::Polygon(square(0.0, 0.0, 10.0));
        let b = Geometry::Polygon(square(5.0, 5.0, 10.0));
        assert!(truly_overlaps(&a, &b));
    }

    #[test]
    fn is_valid_accepts_a_plain_square() {
        assert!(is_valid(&Geometry::Polygon(square(0.0, 0.0, 1.0))).unwrap());
    }

    #[test]
    fn is_valid_rejects_a_bowtie_polygon() {
        let bowtie = Polygon::new(
            LineString(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 10.0, y: 10.0 },
                Coord { x: 10.0, y: 0.0 },
                Coord { x: 0.0, y: 10.0 },
                Coord { x: 0.0, y: 0.0 },
            ]),
            vec![],
        );
        assert!(!is_valid(&Geometry::Polygon(bowtie)).unwrap());
    }
}
