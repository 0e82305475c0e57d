//! Synthetic traffic points for visualising shell occupancy.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::types::round_to;

pub const MAX_POINTS: usize = 10_000;

// Latitude spread per point is N(0, band / 2).
const BANDS_DEG: [f64; 5] = [45.0, 53.0, 97.0, 98.0, 120.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityPoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude: f64,
}

pub fn sample<R: Rng + ?Sized>(rng: &mut R, n: usize, alt_min: f64, alt_max: f64) -> Vec<DensityPoint> {
    let n = n.min(MAX_POINTS);
    let (lo, hi) = if alt_min <= alt_max { (alt_min, alt_max) } else { (alt_max, alt_min) };
    (0..n)
        .map(|_| {
            let band = *BANDS_DEG.choose(rng).unwrap_or(&BANDS_DEG[0]);
            let lat = Normal::new(0.0, band / 2.0).map_or(0.0, |d| d.sample(&mut *rng));
            let lon = rng.gen_range(-180.0..=180.0);
            let alt = rng.gen_range(lo..=hi);
            DensityPoint {
                lat: round_to(lat, 3),
                lon: round_to(lon, 3),
                altitude: round_to(alt, 1),
            }
        })
        .collect()
}
