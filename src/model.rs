use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

use crate::types::{ModelInput, FEATURE_NAMES};

/// Error returned by a risk model at prediction time.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("model does not expose a {0:?} output")]
    Unsupported(OutputKind),
    #[error("model produced a NaN score")]
    NonFinite,
    #[error("model failure: {0}")]
    Backend(String),
}

/// The kind of number a trained model hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Positive-class probability.
    Probability,
    /// Unbounded decision value.
    Margin,
    /// Plain regression output.
    PointEstimate,
}

impl OutputKind {
    /// Selection order when a model exposes several outputs.
    pub const PRIORITY: [OutputKind; 3] = [
        OutputKind::Probability,
        OutputKind::Margin,
        OutputKind::PointEstimate,
    ];
}

/// A trained scoring function.
///
/// Implementations must be reentrant: the same instance is invoked from many
/// threads at once and must not mutate internal state while predicting.
pub trait RiskModel: Send + Sync {
    /// Output kinds this model can produce.
    fn outputs(&self) -> &[OutputKind];

    fn predict(&self, kind: OutputKind, x: &ModelInput) -> Result<f64, PredictionError>;

    fn describe(&self) -> String {
        "risk model".to_string()
    }
}

/// A model bound to a single output kind.
///
/// The kind is picked once, at construction, in `OutputKind::PRIORITY` order.
pub struct Predictor {
    model: Box<dyn RiskModel>,
    kind: OutputKind,
}

impl Predictor {
    pub fn new(model: Box<dyn RiskModel>) -> Result<Self> {
        let kind = OutputKind::PRIORITY
            .into_iter()
            .find(|k| model.outputs().contains(k));
        let Some(kind) = kind else {
            bail!("{} exposes no usable output", model.describe());
        };
        Ok(Self { model, kind })
    }

    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    pub fn describe(&self) -> String {
        format!("{} ({:?})", self.model.describe(), self.kind)
    }

    /// Raw, un-normalized score.
    pub fn predict(&self, x: &ModelInput) -> Result<f64, PredictionError> {
        let raw = self.model.predict(self.kind, x)?;
        if raw.is_nan() {
            return Err(PredictionError::NonFinite);
        }
        Ok(raw)
    }
}

// ---------- Surrogate regressor ----------

/// `weight * x`, or `weight * |x - center|` when a center is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub feature: String,
    pub weight: f64,
    #[serde(default)]
    pub center: Option<f64>,
}

impl Term {
    fn eval(&self, v: f64) -> f64 {
        match self.center {
            Some(c) => self.weight * (v - c).abs(),
            None => self.weight * v,
        }
    }
}

/// `intercept + sum(weight * f(feature))`, described in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurrogateModel {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_output")]
    pub output: OutputKind,
    #[serde(default)]
    pub intercept: f64,
    pub terms: Vec<Term>,
    #[serde(skip)]
    outputs: Vec<OutputKind>,
}

fn default_name() -> String {
    "surrogate".to_string()
}

fn default_output() -> OutputKind {
    OutputKind::PointEstimate
}

impl SurrogateModel {
    pub fn new(name: &str, output: OutputKind, intercept: f64, terms: Vec<Term>) -> Result<Self> {
        let mut m = Self {
            name: name.to_string(),
            output,
            intercept,
            terms,
            outputs: Vec::new(),
        };
        m.finish()?;
        Ok(m)
    }

    /// Same target the offline trainer fits its regressor to.
    pub fn builtin() -> Self {
        let term = |feature: &str, weight: f64, center: Option<f64>| Term {
            feature: feature.to_string(),
            weight,
            center,
        };
        Self {
            name: "builtin-surrogate".to_string(),
            output: OutputKind::PointEstimate,
            intercept: 0.0,
            terms: vec![
                term("congestion", 0.6, None),
                term("inclination", 0.002, Some(98.0)),
                term("altitude", 0.001, Some(550.0)),
                term("relative_velocity", 0.05, None),
            ],
            outputs: vec![OutputKind::PointEstimate],
        }
    }

    pub fn load(path: &str) -> Result<Self> {
        let txt = fs::read_to_string(Path::new(path))
            .with_context(|| format!("failed to read model at {}", path))?;
        let mut m: SurrogateModel =
            serde_json::from_str(&txt).with_context(|| format!("failed to parse {}", path))?;
        m.finish()?;
        Ok(m)
    }

    fn finish(&mut self) -> Result<()> {
        for t in &self.terms {
            if !FEATURE_NAMES.contains(&t.feature.as_str()) {
                bail!("unknown feature '{}' in model {}", t.feature, self.name);
            }
        }
        self.outputs = vec![self.output];
        Ok(())
    }
}

impl RiskModel for SurrogateModel {
    fn outputs(&self) -> &[OutputKind] {
        &self.outputs
    }

    fn predict(&self, kind: OutputKind, x: &ModelInput) -> Result<f64, PredictionError> {
        if kind != self.output {
            return Err(PredictionError::Unsupported(kind));
        }
        let mut acc = self.intercept;
        for t in &self.terms {
            let v = x
                .get(&t.feature)
                .ok_or_else(|| PredictionError::Backend(format!("missing feature {}", t.feature)))?;
            acc += t.eval(v);
        }
        Ok(acc)
    }

    fn describe(&self) -> String {
        format!("{} [{} terms]", self.name, self.terms.len())
    }
}

/// Order model inputs the way the model expects them.
pub fn order_features(x: &ModelInput, feat_list: &[String]) -> Vec<f32> {
    let mut v = Vec::with_capacity(feat_list.len());
    for k in feat_list {
        v.push(x.get(k).unwrap_or(0.0) as f32);
    }
    v
}

// ---------- TorchScript model ----------

#[cfg(feature = "torch")]
pub use torch::TorchModel;

#[cfg(feature = "torch")]
mod torch {
    use super::{order_features, OutputKind, PredictionError, RiskModel};
    use crate::types::ModelInput;
    use anyhow::{bail, Context, Result};
    use serde::Deserialize;
    use std::{fs, path::Path};
    use tch::{kind::Kind, CModule, Device, Tensor};

    #[derive(Deserialize)]
    struct MetaJson {
        feat_list: Vec<String>,
        in_dim: Option<usize>,
        output_kind: OutputKind,
    }

    pub struct TorchModel {
        model: CModule,
        device: Device,
        feat_list: Vec<String>,
        outputs: Vec<OutputKind>,
    }

    impl TorchModel {
        pub fn new(model_path: &str, meta_path: &str) -> Result<Self> {
            let device = Device::Cpu;

            let meta_txt = fs::read_to_string(Path::new(meta_path))
                .with_context(|| format!("failed to read meta at {}", meta_path))?;
            let meta: MetaJson =
                serde_json::from_str(&meta_txt).with_context(|| "failed to parse meta.json")?;

            let in_dim = meta.in_dim.unwrap_or(meta.feat_list.len());
            if in_dim != meta.feat_list.len() {
                tracing::warn!(
                    "meta.in_dim ({}) != feat_list.len() ({}); using feat_list.len()",
                    in_dim,
                    meta.feat_list.len()
                );
            }

            let model = CModule::load_on_device(model_path, device)
                .with_context(|| format!("failed to load TorchScript {}", model_path))?;

            // Check output shape with a dummy forward; expect [B=1, 1] or [B=1]
            let dummy = Tensor::zeros([1, meta.feat_list.len() as i64], (Kind::Float, device));
            let t = model.forward_ts(&[dummy])?;
            if t.numel() != 1 {
                bail!("unexpected model output size: {:?}", t.size());
            }

            Ok(Self {
                model,
                device,
                feat_list: meta.feat_list,
                outputs: vec![meta.output_kind],
            })
        }
    }

    impl RiskModel for TorchModel {
        fn outputs(&self) -> &[OutputKind] {
            &self.outputs
        }

        fn predict(&self, kind: OutputKind, x: &ModelInput) -> Result<f64, PredictionError> {
            if !self.outputs.contains(&kind) {
                return Err(PredictionError::Unsupported(kind));
            }
            let v = order_features(x, &self.feat_list);
            let input = Tensor::from_slice(&v)
                .reshape([1, v.len() as i64])
                .to_device(self.device);
            let t = self
                .model
                .forward_ts(&[input])
                .map_err(|e| PredictionError::Backend(e.to_string()))?;
            Ok(t.to_kind(Kind::Double).reshape([-1]).double_value(&[0]))
        }

        fn describe(&self) -> String {
            format!("torchscript [{} features]", self.feat_list.len())
        }
    }
}
