//! Directional spatial overlap between two footprints.
//!
//! Both footprints are reprojected into the UTM zone of the first footprint's
//! centroid so that areas are compared in metres rather than degrees.
use crate::error::OverlapError;
use crate::projection::{UtmProjection, UtmZone};
use geo::{Area, BooleanOps, Centroid, CoordsIter, MapCoords, MultiPolygon};
use std::borrow::Cow;

/// Slack, in percentage points, for rounding noise in the intersection area.
const COVERAGE_TOLERANCE: f64 = 0.01;

/// Percentage of `reference` covered by its intersection with `other`,
/// rounded to two decimals.
///
/// The measure is not symmetric: a small footprint inside a large one is
/// 100% covered, while the large one is only partially covered.
pub fn try_overlap_percent(
    reference: &MultiPolygon<f64>,
    other: &MultiPolygon<f64>,
) -> Result<f64, OverlapError> {
    check_footprint(reference)?;
    check_footprint(other)?;
    let (reference, other) = unwrap_antimeridian(reference, other);
    let (reference, other) = (&*reference, &*other);

    let centroid = reference.centroid().ok_or(OverlapError::Empty)?;
    let zone = UtmZone::for_position(centroid.x(), centroid.y());
    let projection = UtmProjection::new(zone);

    let reference_utm = projection.project_footprint(reference)?;
    let other_utm = projection.project_footprint(other)?;

    let reference_area = reference_utm.unsigned_area();
    if !reference_area.is_normal() {
        return Err(OverlapError::ZeroArea);
    }

    let intersection_area = reference_utm.intersection(&other_utm).unsigned_area();
    if intersection_area <= 0.0 {
        return Ok(0.0);
    }

    // A self-intersecting ring understates its own area, so the intersection
    // can come out larger than the reference.
    let percent = 100.0 * intersection_area / reference_area;
    if percent > 100.0 + COVERAGE_TOLERANCE {
        return Err(OverlapError::InvalidGeometry(round_to_hundredths(percent)));
    }
    Ok(round_to_hundredths(percent).min(100.0))
}

/// Like [`try_overlap_percent`] but treats any failure as zero overlap.
pub fn overlap_percent(reference: &MultiPolygon<f64>, other: &MultiPolygon<f64>) -> f64 {
    match try_overlap_percent(reference, other) {
        Ok(percent) => percent,
        Err(e) => {
            log::warn!("Overlap calculation failed: {e}");
            log::warn!("- Geometry 1: {reference:?}");
            log::warn!("- Geometry 2: {other:?}");
            0.0
        }
    }
}

fn check_footprint(footprint: &MultiPolygon<f64>) -> Result<(), OverlapError> {
    if footprint.0.is_empty() || footprint.coords_count() == 0 {
        return Err(OverlapError::Empty);
    }
    if footprint
        .coords_iter()
        .any(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(OverlapError::NonFinite);
    }
    Ok(())
}

/// Moves western longitudes east by 360° when the footprints straddle the
/// antimeridian, so both become contiguous around ±180.
fn unwrap_antimeridian<'a>(
    reference: &'a MultiPolygon<f64>,
    other: &'a MultiPolygon<f64>,
) -> (Cow<'a, MultiPolygon<f64>>, Cow<'a, MultiPolygon<f64>>) {
    let (min_lon, max_lon) = reference
        .coords_iter()
        .chain(other.coords_iter())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), c| {
            (min.min(c.x), max.max(c.x))
        });
    if max_lon - min_lon <= 180.0 {
        return (Cow::Borrowed(reference), Cow::Borrowed(other));
    }

    log::debug!("Footprints span {min_lon}..{max_lon}, unwrapping across the antimeridian");
    let shift = |footprint: &MultiPolygon<f64>| {
        footprint.map_coords(|mut c| {
            if c.x < 0.0 {
                c.x += 360.0;
            }
            c
        })
    };
    (Cow::Owned(shift(reference)), Cow::Owned(shift(other)))
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
