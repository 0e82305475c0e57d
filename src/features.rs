//! Heuristic orbital-environment features.
//!
//! Neither function models orbital mechanics. Both are calibrated curves that
//! peak around the crowded LEO shells and the busy inclination planes, and
//! both saturate instead of rejecting out-of-range input.

use crate::types::{FeatureVector, OrbitParameters};

pub const SSO_CENTER_DEG: f64 = 97.5;
pub const POPULAR_PLANE_DEG: f64 = 53.0;
pub const BAND_HALF_WIDTH_DEG: f64 = 2.0;

const CONGESTION_BASE: f64 = 0.18;
// (center km, sigma km, weight)
const SHELLS: [(f64, f64, f64); 3] = [(550.0, 35.0, 0.65), (600.0, 40.0, 0.30), (450.0, 45.0, 0.15)];
const SSO_BOOST: f64 = 0.18;
const POPULAR_BOOST: f64 = 0.10;

const VREL_BASE: f64 = 7.45;
const VREL_MIN: f64 = 7.0;
const VREL_MAX: f64 = 8.2;

fn gaussian(x: f64, mu: f64, sigma: f64) -> f64 {
    (-0.5 * ((x - mu) / sigma).powi(2)).exp()
}

pub fn near_sso(inclination_deg: f64) -> bool {
    (inclination_deg - SSO_CENTER_DEG).abs() <= BAND_HALF_WIDTH_DEG
}

pub fn near_popular_plane(inclination_deg: f64) -> bool {
    (inclination_deg - POPULAR_PLANE_DEG).abs() <= BAND_HALF_WIDTH_DEG
}

/// Shell occupancy estimate in [0, 1].
pub fn congestion(altitude_km: f64, inclination_deg: f64) -> f64 {
    let shells: f64 = SHELLS
        .iter()
        .map(|&(mu, sigma, w)| w * gaussian(altitude_km, mu, sigma))
        .sum();

    let boost = if near_sso(inclination_deg) {
        SSO_BOOST
    } else if near_popular_plane(inclination_deg) {
        POPULAR_BOOST
    } else {
        0.0
    };

    (CONGESTION_BASE + shells + boost).clamp(0.0, 1.0)
}

/// Typical closing speed (km/s) in [7.0, 8.2].
pub fn relative_velocity(altitude_km: f64, inclination_deg: f64) -> f64 {
    let inc_term = 0.0045 * (inclination_deg - 98.0).abs();
    let alt_term = 0.0009 * (altitude_km - 550.0).abs();
    (VREL_BASE + inc_term + alt_term).clamp(VREL_MIN, VREL_MAX)
}

pub fn derive(params: OrbitParameters) -> FeatureVector {
    FeatureVector {
        congestion: congestion(params.altitude_km, params.inclination_deg),
        relative_velocity: relative_velocity(params.altitude_km, params.inclination_deg),
    }
}
