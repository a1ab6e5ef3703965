//! Forward projection from WGS84 geographic coordinates into UTM.
//!
//! Uses the transverse Mercator series from Snyder, "Map Projections: A
//! Working Manual" (USGS PP 1395), which is accurate to well under a metre
//! inside a zone and its immediate neighbours.
use crate::error::ProjectionError;
use geo::{Coord, MapCoords, MultiPolygon};

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UtmZone {
    pub number: u8,
    pub hemisphere: Hemisphere,
}

impl UtmZone {
    /// `floor((lon + 180) / 6) + 1`, clamped to the valid zones 1..=60.
    pub fn number_for_longitude(lon: f64) -> u8 {
        let zone = ((lon + 180.0) / 6.0).floor() + 1.0;
        zone.clamp(1.0, 60.0) as u8
    }

    pub fn for_position(lon: f64, lat: f64) -> Self {
        let hemisphere = if lat < 0.0 {
            Hemisphere::South
        } else {
            Hemisphere::North
        };
        Self {
            number: Self::number_for_longitude(lon),
            hemisphere,
        }
    }

    pub fn epsg(&self) -> u32 {
        let base = match self.hemisphere {
            Hemisphere::North => 32600,
            Hemisphere::South => 32700,
        };
        base + self.number as u32
    }

    pub fn central_meridian(&self) -> f64 {
        self.number as f64 * 6.0 - 183.0
    }
}

/// A geographic -> UTM transformer for one zone.
#[derive(Clone, Debug)]
pub struct UtmProjection {
    zone: UtmZone,
    lon0: f64,
    e2: f64,
    ep2: f64,
    // Meridian arc coefficients
    m1: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl UtmProjection {
    pub fn new(zone: UtmZone) -> Self {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        Self {
            zone,
            lon0: zone.central_meridian().to_radians(),
            e2,
            ep2: e2 / (1.0 - e2),
            m1: 1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0,
            m2: 3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0,
            m3: 15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0,
            m4: 35.0 * e6 / 3072.0,
        }
    }

    fn meridian_arc(&self, phi: f64) -> f64 {
        WGS84_A
            * (self.m1 * phi - self.m2 * (2.0 * phi).sin() + self.m3 * (4.0 * phi).sin()
                - self.m4 * (6.0 * phi).sin())
    }

    /// Projects a (lon, lat) coordinate in degrees to (easting, northing) in metres.
    pub fn project(&self, coord: Coord<f64>) -> Result<Coord<f64>, ProjectionError> {
        let out_of_domain = || ProjectionError::OutOfDomain {
            lon: coord.x,
            lat: coord.y,
            epsg: self.zone.epsg(),
        };
        if !coord.x.is_finite() || !coord.y.is_finite() || coord.y.abs() > 90.0 {
            return Err(out_of_domain());
        }

        let phi = coord.y.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = WGS84_A / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = self.ep2 * cos_phi * cos_phi;
        let a = (coord.x.to_radians() - self.lon0) * cos_phi;
        let m = self.meridian_arc(phi);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let easting = FALSE_EASTING
            + SCALE_FACTOR
                * n
                * (a + (1.0 - t + c) * a3 / 6.0
                    + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a5 / 120.0);
        let mut northing = SCALE_FACTOR
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2) * a6 / 720.0));
        if self.zone.hemisphere == Hemisphere::South {
            northing += FALSE_NORTHING_SOUTH;
        }

        if !easting.is_finite() || !northing.is_finite() {
            return Err(out_of_domain());
        }
        Ok(Coord {
            x: easting,
            y: northing,
        })
    }

    pub fn project_footprint(
        &self,
        footprint: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, ProjectionError> {
        footprint.try_map_coords(|c| self.project(c))
    }
}
