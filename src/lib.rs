//! Orbit risk advisor.
//!
//! Scores a requested satellite orbit (altitude, inclination) with a trained
//! risk model, searches the nearby parameter grid for lower-risk options, and
//! explains the result in plain text.
//!
//! ```no_run
//! use orbit_advisor::{Advisor, AdvisorConfig, OrbitRequest, Predictor, SurrogateModel};
//!
//! let predictor = Predictor::new(Box::new(SurrogateModel::builtin()))?;
//! let advisor = Advisor::new(predictor, AdvisorConfig::default());
//! let res = advisor.recommend(&OrbitRequest::new(550.0, 97.5))?;
//! println!("{} {:?}", res.risk_level.as_str(), res.best_option);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod advice;
pub mod advisor;
pub mod config;
pub mod density;
pub mod features;
pub mod model;
pub mod risk;
pub mod search;
pub mod server;
pub mod tle;
pub mod types;

pub use advisor::Advisor;
pub use config::{AdvisorConfig, DiversityConfig, SearchConfig, ServerConfig};
pub use model::{OutputKind, PredictionError, Predictor, RiskModel, SurrogateModel};
pub use risk::Calibration;
pub use types::{
    FeatureVector, ModelInput, OrbitParameters, OrbitRequest, RecommendationResult, RiskLevel,
    ScoredOption,
};
