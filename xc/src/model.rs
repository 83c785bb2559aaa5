//! Enhancement models: the learned map from network inputs to the constants
//! consumed by a parent functional.
//!
//! Models are loaded once and never mutated afterwards, so a single instance can
//! be shared behind an `Arc` by any number of concurrent evaluations.

extern crate nalgebra as na;

use crate::dual::Dual;
use crate::error::{Result, XcError};
use crate::transform::{NnInputRow, NN_INPUT_WIDTH};
use na::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// A deterministic, stateless map `[Dual; 7] -> [Dual; k]`.
pub trait EnhancementModel: Send + Sync {
    fn input_width(&self) -> usize {
        NN_INPUT_WIDTH
    }
    fn output_width(&self) -> usize;
    fn forward(&self, input: &NnInputRow) -> Vec<Dual>;
}

/// Element-wise activation applied after each dense layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Identity,
    Tanh,
    Sigmoid,
    Softplus,
    Elu,
    Gelu,
}

impl Activation {
    pub fn apply(&self, x: Dual) -> Dual {
        match self {
            Activation::Identity => x,
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / ((-x).exp() + 1.0),
            Activation::Softplus => {
                // ln(1 + e^x) = max(x, 0) + ln(1 + e^-|x|)
                if x.value() > 0.0 {
                    x + (-x).exp().ln_1p()
                } else {
                    x.exp().ln_1p()
                }
            }
            Activation::Elu => {
                if x.value() > 0.0 {
                    x
                } else {
                    x.exp_m1()
                }
            }
            Activation::Gelu => {
                let c = (2.0 / std::f64::consts::PI).sqrt();
                let inner = (x + x.powi(3) * 0.044_715) * c;
                x * 0.5 * (inner.tanh() + 1.0)
            }
        }
    }
}

/// Serialized form of one dense layer; `weights` is row-major, `out x in`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerParameters {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

/// Serialized form of a whole feed-forward model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MlpParameters {
    #[serde(default = "default_input_width")]
    pub input_width: usize,
    pub layers: Vec<LayerParameters>,
    #[serde(default)]
    pub output_scale: Option<Vec<f64>>,
    #[serde(default)]
    pub output_shift: Option<Vec<f64>>,
}

fn default_input_width() -> usize {
    NN_INPUT_WIDTH
}

#[derive(Clone, Debug)]
struct DenseLayer {
    weights: DMatrix<f64>,
    bias: DVector<f64>,
    activation: Activation,
}

impl DenseLayer {
    fn forward(&self, x: &[Dual]) -> Vec<Dual> {
        (0..self.weights.nrows())
            .map(|i| {
                let z = self
                    .weights
                    .row(i)
                    .iter()
                    .zip(x.iter())
                    .map(|(&w, &xi)| xi * w)
                    .sum::<Dual>()
                    + self.bias[i];
                self.activation.apply(z)
            })
            .collect()
    }
}

/// Dense feed-forward network loaded from a JSON parameter file.
#[derive(Clone, Debug)]
pub struct MlpModel {
    layers: Vec<DenseLayer>,
    output_scale: DVector<f64>,
    output_shift: DVector<f64>,
}

impl MlpModel {
    /// Read and validate a parameter file. All failures surface as
    /// [`XcError::ModelLoad`].
    pub fn load(name: &str, path: &Path) -> Result<Self> {
        let fail = |reason: String| XcError::ModelLoad {
            name: name.to_string(),
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| fail(e.to_string()))?;
        let params: MlpParameters =
            serde_json::from_str(&content).map_err(|e| fail(e.to_string()))?;
        let model = Self::from_parameters(params).map_err(fail)?;

        debug!(
            "Loaded {} parameters from {}: {} layers, {} outputs",
            name,
            path.display(),
            model.layers.len(),
            model.output_width()
        );
        Ok(model)
    }

    /// Validate layer shapes and build the model.
    pub fn from_parameters(params: MlpParameters) -> std::result::Result<Self, String> {
        if params.input_width != NN_INPUT_WIDTH {
            return Err(format!(
                "model expects {} inputs, the feature transform produces {}",
                params.input_width, NN_INPUT_WIDTH
            ));
        }
        if params.layers.is_empty() {
            return Err("model has no layers".to_string());
        }

        let mut width = params.input_width;
        let mut layers = Vec::with_capacity(params.layers.len());
        for (idx, layer) in params.layers.into_iter().enumerate() {
            let rows = layer.weights.len();
            if rows == 0 {
                return Err(format!("layer {idx} has no output units"));
            }
            if let Some(bad) = layer.weights.iter().position(|r| r.len() != width) {
                return Err(format!(
                    "layer {idx} row {bad} has {} weights, expected {width}",
                    layer.weights[bad].len()
                ));
            }
            if layer.bias.len() != rows {
                return Err(format!(
                    "layer {idx} has {} biases for {rows} units",
                    layer.bias.len()
                ));
            }
            let flat: Vec<f64> = layer.weights.iter().flatten().copied().collect();
            if flat.iter().chain(layer.bias.iter()).any(|v| !v.is_finite()) {
                return Err(format!("layer {idx} contains non-finite parameters"));
            }
            layers.push(DenseLayer {
                weights: DMatrix::from_row_slice(rows, width, &flat),
                bias: DVector::from_vec(layer.bias),
                activation: layer.activation,
            });
            width = rows;
        }

        let head = |v: Option<Vec<f64>>, fill: f64, what: &str| match v {
            None => Ok(DVector::from_element(width, fill)),
            Some(v) if v.len() == width => Ok(DVector::from_vec(v)),
            Some(v) => Err(format!("{what} has {} entries for {width} outputs", v.len())),
        };
        let output_scale = head(params.output_scale, 1.0, "output_scale")?;
        let output_shift = head(params.output_shift, 0.0, "output_shift")?;

        Ok(Self {
            layers,
            output_scale,
            output_shift,
        })
    }
}

impl EnhancementModel for MlpModel {
    fn output_width(&self) -> usize {
        self.output_scale.len()
    }

    fn forward(&self, input: &NnInputRow) -> Vec<Dual> {
        let mut x: Vec<Dual> = input.to_vec();
        for layer in &self.layers {
            x = layer.forward(&x);
        }
        x.iter()
            .zip(self.output_scale.iter().zip(self.output_shift.iter()))
            .map(|(&y, (&scale, &shift))| y * scale + shift)
            .collect()
    }
}

/// Returns the same constants for every point.
///
/// Reproduces a parent functional with fixed parameters and doubles as the
/// deterministic model for pipeline tests.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantModel {
    constants: Vec<f64>,
}

impl ConstantModel {
    pub fn new(constants: Vec<f64>) -> Self {
        Self { constants }
    }
}

impl EnhancementModel for ConstantModel {
    fn output_width(&self) -> usize {
        self.constants.len()
    }

    fn forward(&self, _input: &NnInputRow) -> Vec<Dual> {
        self.constants.iter().copied().map(Dual::constant).collect()
    }
}
