//! Search region construction around a point of interest.
use crate::error::InputError;
use geo::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Number of vertices used to approximate the circular buffer.
const BUFFER_SEGMENTS: usize = 64;

/// A WGS84 position in decimal degrees.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Result<Self, InputError> {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(InputError::Longitude(lon));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InputError::Latitude(lat));
        }
        Ok(Self { lon, lat })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.lat < 0.0 { 'S' } else { 'N' };
        let ew = if self.lon < 0.0 { 'W' } else { 'E' };
        write!(f, "{:.4}°{}, {:.4}°{}", self.lat.abs(), ns, self.lon.abs(), ew)
    }
}

/// Buffers `center` by `buffer_degrees` into a closed polygon.
///
/// The radius is angular, in the same units as the coordinates, so the region
/// is a circle in degree space rather than on the ground.
pub fn build_search_region(
    center: GeoPoint,
    buffer_degrees: f64,
) -> Result<Polygon<f64>, InputError> {
    if !buffer_degrees.is_finite() || buffer_degrees <= 0.0 {
        return Err(InputError::Buffer(buffer_degrees));
    }
    let GeoPoint { lon, lat } = GeoPoint::new(center.lon, center.lat)?;

    let mut ring: Vec<Coord<f64>> = (0..BUFFER_SEGMENTS)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / BUFFER_SEGMENTS as f64;
            Coord {
                x: lon + buffer_degrees * theta.cos(),
                y: lat + buffer_degrees * theta.sin(),
            }
        })
        .collect();
    ring.push(ring[0]);

    let region = Polygon::new(LineString::from(ring), vec![]);
    log::debug!(
        "Search region: {} vertices around ({}, {}) with radius {}°",
        BUFFER_SEGMENTS,
        lon,
        lat,
        buffer_degrees
    );
    Ok(region)
}
