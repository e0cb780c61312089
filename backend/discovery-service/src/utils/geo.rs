//! Great-circle distance for the "near me" feed filter.

use thiserror::Error;

use crate::models::GeoFilter;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geo input that cannot be used. Callers log it and skip the geo filter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidGeoParameter {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    #[error("radius {0} km must be a positive number")]
    Radius(f64),
    #[error("{field} is not numeric: {raw:?}")]
    NotNumeric { field: &'static str, raw: String },
}

/// A geo filter that passed validation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidGeo {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

impl GeoFilter {
    /// Parse raw query-string values. Returns `Ok(None)` when no coordinates were given.
    pub fn from_raw(
        lat: Option<&str>,
        lng: Option<&str>,
        radius_km: Option<&str>,
    ) -> Result<Option<Self>, InvalidGeoParameter> {
        let (lat, lng) = match (lat, lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => return Ok(None),
        };

        Ok(Some(Self {
            lat: parse_coordinate("lat", lat)?,
            lng: parse_coordinate("lng", lng)?,
            radius_km: radius_km
                .map(|raw| parse_coordinate("radius_km", raw))
                .transpose()?,
        }))
    }

    pub fn validate(&self, default_radius_km: f64) -> Result<ValidGeo, InvalidGeoParameter> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(InvalidGeoParameter::Latitude(self.lat));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(InvalidGeoParameter::Longitude(self.lng));
        }
        let radius_km = self.radius_km.unwrap_or(default_radius_km);
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(InvalidGeoParameter::Radius(radius_km));
        }

        Ok(ValidGeo {
            lat: self.lat,
            lng: self.lng,
            radius_km,
        })
    }
}

fn parse_coordinate(field: &'static str, raw: &str) -> Result<f64, InvalidGeoParameter> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| InvalidGeoParameter::NotNumeric {
            field,
            raw: raw.to_string(),
        })
}

/// Haversine distance in kilometres between two (lat, lng) points given in degrees.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // rounding can push `a` just past 1.0 for antipodal points
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}
