use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::risk::Calibration;

/// Neighborhood searched around the requested orbit.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub alt_offset_km: f64,
    pub alt_step_km: f64,
    pub inc_offset_deg: f64,
    pub inc_step_deg: f64,
    pub alt_min_km: f64,
    pub alt_max_km: f64,
    pub inc_min_deg: f64,
    pub inc_max_deg: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            alt_offset_km: 80.0,
            alt_step_km: 10.0,
            inc_offset_deg: 3.0,
            inc_step_deg: 0.5,
            alt_min_km: 180.0,
            alt_max_km: 2000.0,
            inc_min_deg: 0.0,
            inc_max_deg: 180.0,
        }
    }
}

/// Two options closer than both distances count as the same option.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DiversityConfig {
    pub top_k: usize,
    pub min_alt_sep_km: f64,
    pub min_inc_sep_deg: f64,
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_alt_sep_km: 10.0,
            min_inc_sep_deg: 0.3,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AdvisorConfig {
    pub search: SearchConfig,
    pub diversity: DiversityConfig,
    pub calibration: Calibration,
}

impl AdvisorConfig {
    pub fn load(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read advisor config at {}", path))?;
        serde_json::from_str(&data).with_context(|| format!("invalid advisor config {}", path))
    }
}

/// Process settings read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub model_path: Option<String>,
    pub meta_path: Option<String>,
    pub advisor_config: Option<String>,
    pub log_pred: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(s) => s.parse().with_context(|| format!("invalid PORT value {:?}", s))?,
            Err(_) => 8080,
        };
        Ok(Self {
            port,
            model_path: std::env::var("MODEL_PATH").ok(),
            meta_path: std::env::var("META_PATH").ok(),
            advisor_config: std::env::var("ADVISOR_CONFIG").ok(),
            log_pred: std::env::var("LOG_PRED").ok().as_deref() == Some("1"),
        })
    }
}
