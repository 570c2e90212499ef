//! Great-circle distance and distance ordering

use serde::{Deserialize, Serialize};

/// Mean Earth radius in miles
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

const FEET_PER_MILE: f64 = 5280.0;

/// WGS84 coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Haversine distance to `other` in miles
    pub fn distance_miles(&self, other: &Coordinate) -> f64 {
        haversine_miles(*self, *other)
    }
}

/// Haversine great-circle distance in miles
pub fn haversine_miles(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    EARTH_RADIUS_MILES * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Stable ascending sort by distance; `None` sorts after every known value.
pub fn sort_by_distance<T, F>(items: &mut [T], distance: F)
where
    F: Fn(&T) -> Option<f64>,
{
    items.sort_by(|a, b| {
        let da = distance(a).unwrap_or(f64::INFINITY);
        let db = distance(b).unwrap_or(f64::INFINITY);
        da.total_cmp(&db)
    });
}

/// Display string: feet under one mile, otherwise miles with one decimal
pub fn format_distance(miles: f64) -> String {
    if miles < 1.0 {
        format!("{:.0} ft", miles * FEET_PER_MILE)
    } else {
        format!("{:.1} mi", miles)
    }
}
