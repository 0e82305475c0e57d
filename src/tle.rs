//! Two-line element set parsing.
//!
//! Only the fixed-column fields the advisor needs are read: inclination,
//! eccentricity and mean motion from line 2, catalog number and epoch from
//! line 1. Mean altitude is derived from mean motion with Kepler's third law,
//! which is enough to place a tracked object on the advisor's altitude axis.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MU_EARTH_KM3_S2: f64 = 398_600.4418;
const EARTH_RADIUS_KM: f64 = 6378.137;
const SECONDS_PER_DAY: f64 = 86_400.0;
const MIN_LINE_LEN: usize = 63;
const CHECKSUM_COL: usize = 68;

pub const MAX_CATALOG_ENTRIES: usize = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum TleError {
    #[error("line {line} must start with \"{line} \"")]
    BadPrefix { line: u8 },
    #[error("line {line} contains non-ASCII characters")]
    NonAscii { line: u8 },
    #[error("line {line} too short: {len} chars, need at least 63")]
    TooShort { line: u8, len: usize },
    #[error("line {line}: cannot parse {field} from {raw:?}")]
    BadField { line: u8, field: &'static str, raw: String },
    #[error("line {line}: checksum {found} does not match computed {computed}")]
    Checksum { line: u8, found: u32, computed: u32 },
    #[error("catalog numbers differ between lines ({0} vs {1})")]
    CatalogMismatch(String, String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TleFeatures {
    pub catalog_number: String,
    pub epoch: String,
    pub inclination: f64,
    pub eccentricity: f64,
    /// Revolutions per day.
    pub mean_motion: f64,
    pub semi_major_axis_km: f64,
    pub mean_altitude_km: f64,
    pub perigee_km: f64,
    pub apogee_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TleEntry {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

fn checksum(line: &str) -> u32 {
    line.bytes()
        .take(CHECKSUM_COL)
        .map(|b| match b {
            b'0'..=b'9' => (b - b'0') as u32,
            b'-' => 1,
            _ => 0,
        })
        .sum::<u32>()
        % 10
}

fn check_line(line: &str, n: u8) -> Result<(), TleError> {
    if !line.starts_with(&format!("{} ", n)) {
        return Err(TleError::BadPrefix { line: n });
    }
    if !line.is_ascii() {
        return Err(TleError::NonAscii { line: n });
    }
    if line.len() < MIN_LINE_LEN {
        return Err(TleError::TooShort { line: n, len: line.len() });
    }
    // Checksum column is optional in the wild; verify it only when present.
    if let Some(found) = line.as_bytes().get(CHECKSUM_COL).and_then(|&b| (b as char).to_digit(10)) {
        let computed = checksum(line);
        if found != computed {
            return Err(TleError::Checksum { line: n, found, computed });
        }
    }
    Ok(())
}

fn field(line: &str, n: u8, name: &'static str, cols: std::ops::Range<usize>) -> Result<f64, TleError> {
    let raw = &line[cols];
    raw.trim().parse::<f64>().map_err(|_| TleError::BadField {
        line: n,
        field: name,
        raw: raw.to_string(),
    })
}

/// Semi-major axis (km) for a mean motion in revolutions per day.
pub fn semi_major_axis_km(mean_motion_rev_day: f64) -> f64 {
    let n = mean_motion_rev_day * std::f64::consts::TAU / SECONDS_PER_DAY;
    (MU_EARTH_KM3_S2 / (n * n)).cbrt()
}

pub fn parse(line1: &str, line2: &str) -> Result<TleFeatures, TleError> {
    let (l1, l2) = (line1.trim_end(), line2.trim_end());
    check_line(l1, 1)?;
    check_line(l2, 2)?;

    let cat1 = l1[2..7].trim().to_string();
    let cat2 = l2[2..7].trim().to_string();
    if cat1 != cat2 {
        return Err(TleError::CatalogMismatch(cat1, cat2));
    }

    let inclination = field(l2, 2, "inclination", 8..16)?;
    // Eccentricity is stored with an implied leading decimal point.
    let ecc_raw = l2[26..33].trim();
    let eccentricity = format!("0.{}", ecc_raw)
        .parse::<f64>()
        .map_err(|_| TleError::BadField {
            line: 2,
            field: "eccentricity",
            raw: ecc_raw.to_string(),
        })?;
    let mean_motion = field(l2, 2, "mean motion", 52..63)?;
    if mean_motion <= 0.0 {
        return Err(TleError::BadField {
            line: 2,
            field: "mean motion",
            raw: l2[52..63].to_string(),
        });
    }

    let a = semi_major_axis_km(mean_motion);
    Ok(TleFeatures {
        catalog_number: cat1,
        epoch: l1[18..32].trim().to_string(),
        inclination,
        eccentricity,
        mean_motion,
        semi_major_axis_km: a,
        mean_altitude_km: a - EARTH_RADIUS_KM,
        perigee_km: a * (1.0 - eccentricity) - EARTH_RADIUS_KM,
        apogee_km: a * (1.0 + eccentricity) - EARTH_RADIUS_KM,
    })
}

/// Split catalog text into element sets. Name lines are optional; stray
/// lines are skipped. Stops after `limit` entries.
pub fn parse_catalog(text: &str, limit: usize) -> Vec<TleEntry> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < lines.len() && out.len() < limit {
        let is_pair = |j: usize| {
            j + 1 < lines.len() && lines[j].starts_with("1 ") && lines[j + 1].starts_with("2 ")
        };
        if is_pair(i) {
            out.push(TleEntry {
                name: None,
                line1: lines[i].to_string(),
                line2: lines[i + 1].to_string(),
            });
            i += 2;
        } else if is_pair(i + 1) {
            out.push(TleEntry {
                name: Some(lines[i].to_string()),
                line1: lines[i + 1].to_string(),
                line2: lines[i + 2].to_string(),
            });
            i += 3;
        } else {
            i += 1;
        }
    }
    out
}

/// A catalog entry with its parsed elements, or the reason they could not be
/// read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogRecord {
    #[serde(flatten)]
    pub entry: TleEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<TleFeatures>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Split and parse a catalog. One bad entry does not fail the rest.
pub fn read_catalog(text: &str, limit: usize) -> Vec<CatalogRecord> {
    parse_catalog(text, limit.min(MAX_CATALOG_ENTRIES))
        .into_iter()
        .map(|entry| match parse(&entry.line1, &entry.line2) {
            Ok(f) => CatalogRecord {
                entry,
                features: Some(f),
                error: None,
            },
            Err(e) => CatalogRecord {
                entry,
                features: None,
                error: Some(e.to_string()),
            },
        })
        .collect()
}
