use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;

/// A single imaging event as returned by the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct Acquisition {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Ground footprint in WGS84 degrees.
    pub footprint: MultiPolygon<f64>,
    /// Percentage in 0-100. Zero when the catalog does not report it.
    pub cloud_cover: f64,
}

impl Acquisition {
    pub fn new(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        footprint: impl Into<MultiPolygon<f64>>,
        cloud_cover: Option<f64>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            footprint: footprint.into(),
            cloud_cover: cloud_cover.unwrap_or(0.0),
        }
    }
}

type Position = Vec<f64>;

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum GeoJsonFootprint {
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
}

/// Decodes a GeoJSON `Polygon` or `MultiPolygon` geometry into a footprint.
pub fn footprint_from_geojson(geometry: &serde_json::Value) -> Result<MultiPolygon<f64>> {
    let footprint: GeoJsonFootprint = serde_json::from_value(geometry.clone())?;
    let polygons = match footprint {
        GeoJsonFootprint::Polygon { coordinates } => vec![polygon_from_rings(coordinates)?],
        GeoJsonFootprint::MultiPolygon { coordinates } => coordinates
            .into_iter()
            .map(polygon_from_rings)
            .collect::<Result<Vec<_>>>()?,
    };
    Ok(MultiPolygon::new(polygons))
}

fn polygon_from_rings(rings: Vec<Vec<Position>>) -> Result<Polygon<f64>> {
    let mut rings = rings.into_iter().map(ring_from_positions);
    let exterior = rings.next().ok_or(anyhow!("Polygon has no exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn ring_from_positions(positions: Vec<Position>) -> Result<LineString<f64>> {
    let coords = positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(anyhow!("Position needs at least two ordinates, got {}", p.len())),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(LineString::from(coords))
}
