//! Local neighborhood search for lower-risk orbits.
//!
//! The search is a fixed grid around the requested point, not a global
//! optimizer. Every grid point is scored independently, the results are
//! ranked by risk, and a greedy pass drops options that are near-duplicates
//! of a better one.

use rayon::prelude::*;

use crate::config::{DiversityConfig, SearchConfig};
use crate::features;
use crate::model::{PredictionError, Predictor};
use crate::risk::{self, Calibration};
use crate::types::{round_to, Factors, FeatureVector, ModelInput, OrbitParameters, ScoredOption};

const LOW_CONGESTION: f64 = 0.45;
const LOW_CROSSING_VREL: f64 = 7.65;

/// Offsets `-span..=span` in `step` increments, always containing 0.
fn offsets(span: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || span <= 0.0 {
        return vec![0.0];
    }
    let n = (span / step + 1e-9).floor() as i64;
    (-n..=n).map(|i| i as f64 * step).collect()
}

/// Cartesian grid around `center`, altitude-major.
///
/// Points outside the configured bands are dropped, so an out-of-band center
/// can produce an empty grid.
pub fn candidate_grid(center: OrbitParameters, cfg: &SearchConfig) -> Vec<OrbitParameters> {
    let alts: Vec<f64> = offsets(cfg.alt_offset_km, cfg.alt_step_km)
        .into_iter()
        .map(|d| center.altitude_km + d)
        .filter(|a| (cfg.alt_min_km..=cfg.alt_max_km).contains(a))
        .collect();
    let incs: Vec<f64> = offsets(cfg.inc_offset_deg, cfg.inc_step_deg)
        .into_iter()
        .map(|d| center.inclination_deg + d)
        .filter(|i| (cfg.inc_min_deg..=cfg.inc_max_deg).contains(i))
        .collect();

    let mut grid = Vec::with_capacity(alts.len() * incs.len());
    for &a in &alts {
        for &i in &incs {
            grid.push(OrbitParameters::new(a, i));
        }
    }
    grid
}

pub fn option_note(f: &FeatureVector) -> String {
    let mut parts = Vec::new();
    if f.congestion < LOW_CONGESTION {
        parts.push("lower congestion");
    }
    if f.relative_velocity < LOW_CROSSING_VREL {
        parts.push("less crossing traffic");
    }
    if parts.is_empty() {
        "optimized option".to_string()
    } else {
        parts.join(", ")
    }
}

/// Unrounded risk for one orbit, with the features that produced it.
pub fn assess(
    params: OrbitParameters,
    predictor: &Predictor,
    cal: &Calibration,
) -> Result<(f64, FeatureVector), PredictionError> {
    let feats = features::derive(params);
    let raw = predictor.predict(&ModelInput::new(params, feats))?;
    Ok((risk::normalize(raw, cal), feats))
}

pub fn score_option(
    params: OrbitParameters,
    predictor: &Predictor,
    cal: &Calibration,
) -> Result<ScoredOption, PredictionError> {
    let (score, feats) = assess(params, predictor, cal)?;
    Ok(ScoredOption {
        altitude: round_to(params.altitude_km, 2),
        inclination: round_to(params.inclination_deg, 2),
        risk_score: round_to(score, 4),
        note: option_note(&feats),
        factors: Factors {
            congestion: round_to(feats.congestion, 4),
            relative_velocity: round_to(feats.relative_velocity, 4),
        },
    })
}

/// Score every candidate on the rayon pool; output keeps grid order.
pub fn score_all(
    grid: &[OrbitParameters],
    predictor: &Predictor,
    cal: &Calibration,
) -> Result<Vec<ScoredOption>, PredictionError> {
    grid.par_iter()
        .map(|p| score_option(*p, predictor, cal))
        .collect()
}

/// Ascending by risk. Stable, so ties keep grid order.
pub fn rank(options: &mut [ScoredOption]) {
    options.sort_by(|a, b| a.risk_score.total_cmp(&b.risk_score));
}

fn too_close(a: &ScoredOption, b: &ScoredOption, cfg: &DiversityConfig) -> bool {
    (a.altitude - b.altitude).abs() < cfg.min_alt_sep_km
        && (a.inclination - b.inclination).abs() < cfg.min_inc_sep_deg
}

/// Greedy top-k over `ranked`. A candidate is skipped only when it is close
/// to an accepted one in altitude and inclination at the same time.
pub fn select_diverse(ranked: &[ScoredOption], cfg: &DiversityConfig) -> Vec<ScoredOption> {
    let mut picked: Vec<ScoredOption> = Vec::with_capacity(cfg.top_k);
    for item in ranked {
        if picked.len() >= cfg.top_k {
            break;
        }
        if picked.iter().any(|p| too_close(item, p, cfg)) {
            continue;
        }
        picked.push(item.clone());
    }
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OutputKind, RiskModel};

    struct CongestionProbability;

    impl RiskModel for CongestionProbability {
        fn outputs(&self) -> &[OutputKind] {
            &[OutputKind::Probability]
        }

        fn predict(&self, _kind: OutputKind, x: &ModelInput) -> Result<f64, PredictionError> {
            Ok(x.congestion)
        }
    }

    fn opt(altitude: f64, inclination: f64, risk_score: f64) -> ScoredOption {
        ScoredOption {
            altitude,
            inclination,
            risk_score,
            note: String::new(),
            factors: Factors {
                congestion: 0.0,
                relative_velocity: 7.45,
            },
        }
    }

    #[test]
    fn test_full_grid_size_and_order() {
        let grid = candidate_grid(OrbitParameters::new(700.0, 45.0), &SearchConfig::default());
        assert_eq!(grid.len(), 17 * 13);
        assert_eq!(grid[0], OrbitParameters::new(620.0, 42.0));
        assert_eq!(grid[1], OrbitParameters::new(620.0, 42.5));
        assert_eq!(grid[13], OrbitParameters::new(630.0, 42.0));
        assert_eq!(grid[220], OrbitParameters::new(780.0, 48.0));
    }

    #[test]
    fn test_grid_contains_center() {
        let cfg = SearchConfig::default();
        for (a, i) in [(550.0, 97.5), (180.0, 0.0), (2000.0, 180.0), (433.3, 12.34)] {
            let center = OrbitParameters::new(a, i);
            assert!(candidate_grid(center, &cfg).contains(&center), "missing {a}/{i}");
        }
    }

    #[test]
    fn test_grid_clipped_at_bands() {
        let grid = candidate_grid(OrbitParameters::new(200.0, 1.0), &SearchConfig::default());
        // altitudes 180..=280 (11), inclinations 0.0..=4.0 (9)
        assert_eq!(grid.len(), 11 * 9);
        assert!(grid.iter().all(|p| p.altitude_km >= 180.0 && p.inclination_deg >= 0.0));
    }

    #[test]
    fn test_grid_empty_when_center_far_out_of_band() {
        let grid = candidate_grid(OrbitParameters::new(5000.0, 45.0), &SearchConfig::default());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_note_rules() {
        let both = FeatureVector { congestion: 0.2, relative_velocity: 7.5 };
        let none = FeatureVector { congestion: 0.45, relative_velocity: 7.65 };
        let vel = FeatureVector { congestion: 0.9, relative_velocity: 7.6 };
        assert_eq!(option_note(&both), "lower congestion, less crossing traffic");
        assert_eq!(option_note(&none), "optimized option");
        assert_eq!(option_note(&vel), "less crossing traffic");
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let p = Predictor::new(Box::new(CongestionProbability)).unwrap();
        let cal = Calibration::default();
        let o = OrbitParameters::new(612.5, 53.25);
        let a = score_option(o, &p, &cal).unwrap();
        let b = score_option(o, &p, &cal).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.altitude, 612.5);
        assert!((0.0..=1.0).contains(&a.risk_score));
    }

    #[test]
    fn test_score_all_keeps_grid_order() {
        let p = Predictor::new(Box::new(CongestionProbability)).unwrap();
        let grid = candidate_grid(OrbitParameters::new(550.0, 97.5), &SearchConfig::default());
        let scored = score_all(&grid, &p, &Calibration::default()).unwrap();
        assert_eq!(scored.len(), grid.len());
        for (s, g) in scored.iter().zip(&grid) {
            assert_eq!(s.altitude, round_to(g.altitude_km, 2));
            assert_eq!(s.inclination, round_to(g.inclination_deg, 2));
        }
    }

    #[test]
    fn test_rank_is_stable() {
        let mut v = vec![opt(1.0, 0.0, 0.5), opt(2.0, 0.0, 0.1), opt(3.0, 0.0, 0.5), opt(4.0, 0.0, 0.1)];
        rank(&mut v);
        let alts: Vec<f64> = v.iter().map(|o| o.altitude).collect();
        assert_eq!(alts, vec![2.0, 4.0, 1.0, 3.0]);
    }

    #[test]
    fn test_diversity_requires_closeness_in_both_dimensions() {
        let cfg = DiversityConfig::default();
        let ranked = vec![
            opt(500.0, 50.0, 0.10),
            opt(505.0, 50.1, 0.11), // close in both: dropped
            opt(505.0, 50.5, 0.12), // close altitude only: kept
            opt(520.0, 50.0, 0.13), // close inclination only: kept
            opt(600.0, 60.0, 0.14),
        ];
        let picked = select_diverse(&ranked, &cfg);
        let alts: Vec<(f64, f64)> = picked.iter().map(|o| (o.altitude, o.inclination)).collect();
        assert_eq!(alts, vec![(500.0, 50.0), (505.0, 50.5), (520.0, 50.0)]);
    }

    #[test]
    fn test_diversity_pairs_never_close() {
        let p = Predictor::new(Box::new(CongestionProbability)).unwrap();
        let grid = candidate_grid(OrbitParameters::new(550.0, 97.5), &SearchConfig::default());
        let mut scored = score_all(&grid, &p, &Calibration::default()).unwrap();
        rank(&mut scored);
        let cfg = DiversityConfig { top_k: 20, ..Default::default() };
        let picked = select_diverse(&scored, &cfg);
        assert_eq!(picked[0], scored[0]);
        for (i, a) in picked.iter().enumerate() {
            for b in &picked[i + 1..] {
                assert!(
                    !((a.altitude - b.altitude).abs() < 10.0 && (a.inclination - b.inclination).abs() < 0.3),
                    "{a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn test_diversity_short_input() {
        let cfg = DiversityConfig::default();
        assert!(select_diverse(&[], &cfg).is_empty());
        let one = vec![opt(500.0, 50.0, 0.2)];
        assert_eq!(select_diverse(&one, &cfg).len(), 1);
    }
}
