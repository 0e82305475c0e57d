use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::advisor::{self, Advisor};
use crate::density::{self, DensityPoint};
use crate::tle::{self, CatalogRecord, TleFeatures};
use crate::types::{CurvePoint, OrbitRequest, RecommendationResult};

type ApiError = (StatusCode, Json<Value>);

fn err(status: StatusCode, msg: impl ToString) -> ApiError {
    (status, Json(json!({ "error": msg.to_string() })))
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub advisor: Advisor,
}

pub fn router(advisor: Advisor) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/recommend_orbit", post(recommend_orbit))
        .route("/risk_curve", get(risk_curve))
        .route("/density", get(density_points))
        .route("/tle_features", post(tle_features))
        .route("/tle_catalog", post(tle_catalog))
        .with_state(AppState { advisor })
}

// ---------- Handlers ----------

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Orbit risk advisor running",
        "model": state.advisor.predictor().describe(),
        "config": state.advisor.config(),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "t": now_ms() }))
}

/// Same fields as the JSON body, all optional so either source can be used.
#[derive(Deserialize, Debug, Default)]
pub struct RecommendQuery {
    pub altitude: Option<f64>,
    pub inclination: Option<f64>,
    pub launch_date: Option<String>,
    pub mission_days: Option<u32>,
}

impl RecommendQuery {
    fn into_request(self) -> Option<OrbitRequest> {
        Some(OrbitRequest {
            altitude: self.altitude?,
            inclination: self.inclination?,
            launch_date: self.launch_date,
            mission_days: self.mission_days,
        })
    }
}

/// JSON body wins over query parameters. A request without a JSON content
/// type falls back to the query; a malformed JSON body is rejected.
pub async fn recommend_orbit(
    State(state): State<AppState>,
    Query(query): Query<RecommendQuery>,
    body: Result<Json<OrbitRequest>, JsonRejection>,
) -> Result<Json<RecommendationResult>, ApiError> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => query.into_request().ok_or_else(|| {
            err(
                StatusCode::UNPROCESSABLE_ENTITY,
                "altitude and inclination are required (JSON body or query params)",
            )
        })?,
        Err(e) => return Err(err(e.status(), e.body_text())),
    };
    req.validate()
        .map_err(|e| err(StatusCode::UNPROCESSABLE_ENTITY, e))?;

    let advisor = state.advisor.clone();
    let res = tokio::task::spawn_blocking(move || advisor.recommend(&req))
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .map_err(|e| {
            tracing::error!("prediction failed: {}", e);
            err(StatusCode::INTERNAL_SERVER_ERROR, e)
        })?;

    tracing::info!(
        "recommend alt={} inc={} risk={} level={} options={}",
        res.input.altitude,
        res.input.inclination,
        res.risk_score,
        res.risk_level.as_str(),
        res.top_options.len()
    );
    Ok(Json(res))
}

#[derive(Deserialize, Debug)]
pub struct CurveQuery {
    pub inclination: f64,
    #[serde(default = "default_curve_min")]
    pub alt_min: u32,
    #[serde(default = "default_curve_max")]
    pub alt_max: u32,
    #[serde(default = "default_curve_step")]
    pub step: u32,
}

fn default_curve_min() -> u32 {
    200
}
fn default_curve_max() -> u32 {
    1200
}
fn default_curve_step() -> u32 {
    20
}

#[derive(Serialize, Debug)]
pub struct CurveOut {
    pub inclination: f64,
    pub points: Vec<CurvePoint>,
}

pub async fn risk_curve(
    State(state): State<AppState>,
    Query(q): Query<CurveQuery>,
) -> Result<Json<CurveOut>, ApiError> {
    if q.step == 0 {
        return Err(err(StatusCode::UNPROCESSABLE_ENTITY, "step must be > 0"));
    }
    if q.alt_min > q.alt_max {
        return Err(err(StatusCode::UNPROCESSABLE_ENTITY, "alt_min must not exceed alt_max"));
    }
    let n = advisor::curve_len(q.alt_min, q.alt_max, q.step);
    if n > advisor::MAX_CURVE_POINTS as u64 {
        return Err(err(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("{} points requested, at most {}", n, advisor::MAX_CURVE_POINTS),
        ));
    }
    if !(0.0..=180.0).contains(&q.inclination) {
        return Err(err(
            StatusCode::UNPROCESSABLE_ENTITY,
            "inclination must be within [0, 180] deg",
        ));
    }

    let advisor = state.advisor.clone();
    let (inc, lo, hi, step) = (q.inclination, q.alt_min, q.alt_max, q.step);
    let points = tokio::task::spawn_blocking(move || advisor.risk_curve(inc, lo, hi, step))
        .await
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .map_err(|e| err(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    Ok(Json(CurveOut {
        inclination: q.inclination,
        points,
    }))
}

#[derive(Deserialize, Debug)]
pub struct DensityQuery {
    #[serde(default = "default_density_n")]
    pub n: usize,
    #[serde(default = "default_density_min")]
    pub alt_min: f64,
    #[serde(default = "default_density_max")]
    pub alt_max: f64,
}

fn default_density_n() -> usize {
    800
}
fn default_density_min() -> f64 {
    300.0
}
fn default_density_max() -> f64 {
    900.0
}

#[derive(Serialize, Debug)]
pub struct DensityOut {
    pub count: usize,
    pub points: Vec<DensityPoint>,
}

pub async fn density_points(Query(q): Query<DensityQuery>) -> Result<Json<DensityOut>, ApiError> {
    if !(q.alt_min.is_finite() && q.alt_max.is_finite()) {
        return Err(err(StatusCode::UNPROCESSABLE_ENTITY, "altitude bounds must be finite"));
    }
    let points = density::sample(&mut rand::thread_rng(), q.n, q.alt_min, q.alt_max);
    Ok(Json(DensityOut {
        count: points.len(),
        points,
    }))
}

#[derive(Deserialize, Debug)]
pub struct TleIn {
    pub line1: String,
    pub line2: String,
}

pub async fn tle_features(Json(body): Json<TleIn>) -> Result<Json<TleFeatures>, ApiError> {
    tle::parse(&body.line1, &body.line2)
        .map(Json)
        .map_err(|e| err(StatusCode::UNPROCESSABLE_ENTITY, e))
}

#[derive(Deserialize, Debug)]
pub struct CatalogIn {
    pub text: String,
    #[serde(default = "default_catalog_limit")]
    pub limit: usize,
}

fn default_catalog_limit() -> usize {
    100
}

#[derive(Serialize, Debug)]
pub struct CatalogOut {
    pub count: usize,
    pub entries: Vec<CatalogRecord>,
}

pub async fn tle_catalog(Json(body): Json<CatalogIn>) -> Json<CatalogOut> {
    let entries = tle::read_catalog(&body.text, body.limit);
    tracing::debug!("tle catalog: {} entries", entries.len());
    Json(CatalogOut {
        count: entries.len(),
        entries,
    })
}
