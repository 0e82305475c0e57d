use std::sync::Arc;

use crate::advice::{self, Assessment};
use crate::config::AdvisorConfig;
use crate::model::{PredictionError, Predictor};
use crate::risk;
use crate::search;
use crate::types::{round_to, CurvePoint, InputEcho, OrbitParameters, OrbitRequest, RecommendationResult};

/// Upper bound on the altitudes one risk curve evaluates.
pub const MAX_CURVE_POINTS: usize = 10_000;

/// Number of altitudes `risk_curve` visits for this range, before the cap.
pub fn curve_len(alt_min: u32, alt_max: u32, step: u32) -> u64 {
    if alt_min > alt_max {
        return 0;
    }
    (alt_max - alt_min) as u64 / step.max(1) as u64 + 1
}

/// The recommendation pipeline around one shared, read-only predictor.
///
/// Cheap to clone; every request works on its own transient data.
#[derive(Clone)]
pub struct Advisor {
    predictor: Arc<Predictor>,
    cfg: Arc<AdvisorConfig>,
    log_pred: bool,
}

impl Advisor {
    pub fn new(predictor: Predictor, cfg: AdvisorConfig) -> Self {
        Self {
            predictor: Arc::new(predictor),
            cfg: Arc::new(cfg),
            log_pred: false,
        }
    }

    /// Log every baseline model input at info level.
    pub fn with_prediction_log(mut self, on: bool) -> Self {
        self.log_pred = on;
        self
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.cfg
    }

    /// Risk of the requested orbit plus the best nearby alternatives.
    ///
    /// Expects a validated request. Predictor failures are returned as-is.
    pub fn recommend(&self, req: &OrbitRequest) -> Result<RecommendationResult, PredictionError> {
        let params = req.params();
        let cal = &self.cfg.calibration;

        let (score, feats) = search::assess(params, &self.predictor, cal)?;
        if self.log_pred {
            tracing::info!(
                "baseline alt={:.2} inc={:.2} congestion={:.4} vrel={:.4} risk={:.4}",
                params.altitude_km,
                params.inclination_deg,
                feats.congestion,
                feats.relative_velocity,
                score
            );
        }

        let grid = search::candidate_grid(params, &self.cfg.search);
        let mut scored = search::score_all(&grid, &self.predictor, cal)?;
        search::rank(&mut scored);
        let top = search::select_diverse(&scored, &self.cfg.diversity);
        tracing::debug!(
            "scored {} candidates, kept {} diverse options",
            scored.len(),
            top.len()
        );
        if top.is_empty() {
            tracing::warn!(
                "no candidates inside the search bands around {:.2} km / {:.2} deg",
                params.altitude_km,
                params.inclination_deg
            );
        }

        let level = risk::classify(score);
        let a = Assessment {
            params,
            feats,
            risk: score,
        };
        let main_reasons = advice::compose_reasons(&a);
        let recommendation_text = advice::compose_recommendation(&a, level, top.first());

        Ok(RecommendationResult {
            input: InputEcho {
                altitude: round_to(req.altitude, 2),
                inclination: round_to(req.inclination, 2),
                launch_date: req.launch_date.clone(),
                mission_days: req.mission_days,
            },
            risk_score: round_to(score, 4),
            risk_level: level,
            main_reasons,
            recommendation_text,
            best_option: top.first().cloned(),
            second_option: top.get(1).cloned(),
            third_option: top.get(2).cloned(),
            top_options: top,
        })
    }

    /// Risk at each altitude step for a fixed inclination. No search, no
    /// diversity filtering. At most `MAX_CURVE_POINTS` points are evaluated.
    pub fn risk_curve(
        &self,
        inclination: f64,
        alt_min: u32,
        alt_max: u32,
        step: u32,
    ) -> Result<Vec<CurvePoint>, PredictionError> {
        let step = step.max(1) as usize;
        (alt_min..=alt_max)
            .step_by(step)
            .take(MAX_CURVE_POINTS)
            .map(|alt| {
                let p = OrbitParameters::new(alt as f64, inclination);
                let (r, _) = search::assess(p, &self.predictor, &self.cfg.calibration)?;
                Ok(CurvePoint {
                    altitude: alt,
                    risk: round_to(r, 4),
                })
            })
            .collect()
    }
}
