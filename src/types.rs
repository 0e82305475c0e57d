use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitParameters {
    pub altitude_km: f64,     // > 0
    pub inclination_deg: f64, // [0, 180]
}

impl OrbitParameters {
    pub fn new(altitude_km: f64, inclination_deg: f64) -> Self {
        Self {
            altitude_km,
            inclination_deg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub congestion: f64,        // [0, 1]
    pub relative_velocity: f64, // [7.0, 8.2] km/s
}

pub const FEATURE_NAMES: [&str; 4] = ["altitude", "inclination", "congestion", "relative_velocity"];

/// The four named inputs the risk model was trained on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInput {
    pub altitude: f64,
    pub inclination: f64,
    pub congestion: f64,
    pub relative_velocity: f64,
}

impl ModelInput {
    pub fn new(params: OrbitParameters, feats: FeatureVector) -> Self {
        Self {
            altitude: params.altitude_km,
            inclination: params.inclination_deg,
            congestion: feats.congestion,
            relative_velocity: feats.relative_velocity,
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            "altitude" => Some(self.altitude),
            "inclination" => Some(self.inclination),
            "congestion" => Some(self.congestion),
            "relative_velocity" => Some(self.relative_velocity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factors {
    pub congestion: f64,
    pub relative_velocity: f64,
}

/// One evaluated candidate. Values are rounded the way they are reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredOption {
    pub altitude: f64,    // 2 dp
    pub inclination: f64, // 2 dp
    pub risk_score: f64,  // 4 dp
    pub note: String,
    pub factors: Factors,
}

/// A recommendation request as it arrives over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitRequest {
    pub altitude: f64,
    pub inclination: f64,
    #[serde(default)]
    pub launch_date: Option<String>,
    #[serde(default)]
    pub mission_days: Option<u32>,
}

impl OrbitRequest {
    pub fn new(altitude: f64, inclination: f64) -> Self {
        Self {
            altitude,
            inclination,
            launch_date: None,
            mission_days: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.altitude.is_finite() && self.altitude > 0.0) {
            return Err(format!("altitude must be > 0 km, got {}", self.altitude));
        }
        if !(0.0..=180.0).contains(&self.inclination) {
            return Err(format!("inclination must be within [0, 180] deg, got {}", self.inclination));
        }
        if let Some(d) = self.mission_days {
            if !(1..=3650).contains(&d) {
                return Err(format!("mission_days must be within [1, 3650], got {}", d));
            }
        }
        Ok(())
    }

    pub fn params(&self) -> OrbitParameters {
        OrbitParameters::new(self.altitude, self.inclination)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEcho {
    pub altitude: f64,
    pub inclination: f64,
    pub launch_date: Option<String>,
    pub mission_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub input: InputEcho,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub main_reasons: Vec<String>,
    pub recommendation_text: String,
    pub best_option: Option<ScoredOption>,
    pub second_option: Option<ScoredOption>,
    pub third_option: Option<ScoredOption>,
    pub top_options: Vec<ScoredOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub altitude: u32,
    pub risk: f64,
}

pub fn round_to(x: f64, places: i32) -> f64 {
    let p = 10f64.powi(places);
    (x * p).round() / p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        assert!(OrbitRequest::new(550.0, 97.5).validate().is_ok());
        assert!(OrbitRequest::new(0.0, 97.5).validate().is_err());
        assert!(OrbitRequest::new(f64::NAN, 97.5).validate().is_err());
        assert!(OrbitRequest::new(550.0, 180.5).validate().is_err());
        assert!(OrbitRequest::new(550.0, -0.1).validate().is_err());

        let mut req = OrbitRequest::new(550.0, 0.0);
        req.mission_days = Some(3650);
        assert!(req.validate().is_ok());
        req.mission_days = Some(0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_request_optional_fields() {
        let req: OrbitRequest = serde_json::from_str(r#"{"altitude": 500, "inclination": 45.5}"#).unwrap();
        assert_eq!(req, OrbitRequest::new(500.0, 45.5));
    }

    #[test]
    fn test_risk_level_wire_format() {
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"MEDIUM\"");
        assert_eq!(RiskLevel::High.as_str(), "HIGH");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(97.5, 2), 97.5);
    }
}
