//! Feature builder: raw density quantities to the canonical feature set.
//!
//! Two input layouts are accepted:
//! - spin-resolved: per-spin `6 x N` matrices whose rows are
//!   `[density, grad_x, grad_y, grad_z, laplacian, tau]` (laplacian unused);
//! - libxc aggregate: closed-shell `rho`, `sigma`, `tau` vectors of length N,
//!   split evenly between the two spin channels.
//!
//! Every feature is a [`Dual`] seeded on the independent variables, so
//! everything computed from it downstream carries the XC potential along.

extern crate nalgebra as na;

use crate::dual::{Dual, Variable};
use crate::error::{Result, XcError};
use na::{DMatrix, DVector};
use std::fmt;
use std::str::FromStr;

/// Rows in a spin-resolved raw density matrix.
pub const RAW_ROWS: usize = 6;

/// Names of the canonical features.
pub const FEATURE_KEYS: [&str; 8] = [
    "rho_a",
    "rho_b",
    "norm_grad_a",
    "norm_grad",
    "norm_grad_b",
    "tau_a",
    "tau_b",
    "norm_grad_ab",
];

const ROW_DENSITY: usize = 0;
const ROW_GRAD_X: usize = 1;
const ROW_GRAD_Y: usize = 2;
const ROW_GRAD_Z: usize = 3;
const ROW_TAU: usize = 5;

/// Raw density data as handed over by the SCF driver.
#[derive(Clone, Debug, PartialEq)]
pub enum DensityInput {
    SpinResolved {
        rho_a: DMatrix<f64>,
        rho_b: DMatrix<f64>,
    },
    Libxc {
        rho: DVector<f64>,
        sigma: DVector<f64>,
        tau: DVector<f64>,
    },
}

impl DensityInput {
    pub fn kind(&self) -> &'static str {
        match self {
            DensityInput::SpinResolved { .. } => "spin-resolved",
            DensityInput::Libxc { .. } => "libxc",
        }
    }

    pub fn num_points(&self) -> usize {
        match self {
            DensityInput::SpinResolved { rho_a, .. } => rho_a.ncols(),
            DensityInput::Libxc { rho, .. } => rho.len(),
        }
    }
}

/// Selects which input path the evaluation takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvalMode {
    SpinResolved,
    Libxc,
}

impl EvalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalMode::SpinResolved => "spin_resolved",
            EvalMode::Libxc => "libxc",
        }
    }
}

impl fmt::Display for EvalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvalMode {
    type Err = XcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "spin_resolved" | "spin" | "rhos" => Ok(EvalMode::SpinResolved),
            "libxc" | "aggregate" => Ok(EvalMode::Libxc),
            _ => Err(XcError::UnknownMode(s.to_string())),
        }
    }
}

/// Canonical features of one evaluation point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeaturePoint {
    pub rho_a: Dual,
    pub rho_b: Dual,
    pub norm_grad_a: Dual,
    pub norm_grad_b: Dual,
    pub norm_grad: Dual,
    pub norm_grad_ab: Dual,
    pub tau_a: Dual,
    pub tau_b: Dual,
}

impl FeaturePoint {
    /// Build a point from already contracted per-point quantities.
    ///
    /// `norm_grad_ab` is derived as `(norm_grad - norm_grad_a - norm_grad_b) / 2`.
    /// The three squared-gradient norms are seeded as independent variables and
    /// `norm_grad` keeps its given value while its derivative follows
    /// `norm_grad = norm_grad_a + norm_grad_b + 2 norm_grad_ab`.
    pub fn new(
        rho_a: f64,
        rho_b: f64,
        norm_grad_a: f64,
        norm_grad_b: f64,
        norm_grad: f64,
        tau_a: f64,
        tau_b: f64,
    ) -> Self {
        let norm_grad_ab_value = (norm_grad - norm_grad_a - norm_grad_b) / 2.0;

        let norm_grad_a = Dual::variable(norm_grad_a, Variable::SigmaAA);
        let norm_grad_b = Dual::variable(norm_grad_b, Variable::SigmaBB);
        let norm_grad_ab = Dual::variable(norm_grad_ab_value, Variable::SigmaAB);
        let total = norm_grad_a + norm_grad_b + norm_grad_ab * 2.0;

        Self {
            rho_a: Dual::variable(rho_a, Variable::RhoA),
            rho_b: Dual::variable(rho_b, Variable::RhoB),
            norm_grad_a,
            norm_grad_b,
            norm_grad: Dual::from_parts(norm_grad, *total.gradient()),
            norm_grad_ab,
            tau_a: Dual::variable(tau_a, Variable::TauA),
            tau_b: Dual::variable(tau_b, Variable::TauB),
        }
    }

    pub fn get(&self, key: &str) -> Option<Dual> {
        match key {
            "rho_a" => Some(self.rho_a),
            "rho_b" => Some(self.rho_b),
            "norm_grad_a" => Some(self.norm_grad_a),
            "norm_grad_b" => Some(self.norm_grad_b),
            "norm_grad" => Some(self.norm_grad),
            "norm_grad_ab" => Some(self.norm_grad_ab),
            "tau_a" => Some(self.tau_a),
            "tau_b" => Some(self.tau_b),
            _ => None,
        }
    }

    pub fn rho(&self) -> Dual {
        self.rho_a + self.rho_b
    }

    pub fn densities(&self) -> [Dual; 2] {
        [self.rho_a, self.rho_b]
    }

    /// Squared-gradient triple in libxc order: (aa, ab, bb).
    pub fn gradients(&self) -> [Dual; 3] {
        [self.norm_grad_a, self.norm_grad_ab, self.norm_grad_b]
    }
}

/// Canonical features for a batch of points. Built fresh for every call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanonicalFeatureSet {
    points: Vec<FeaturePoint>,
}

impl CanonicalFeatureSet {
    pub fn from_points(points: Vec<FeaturePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[FeaturePoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeaturePoint> {
        self.points.iter()
    }

    /// Plain values of a single feature, keyed the way the feature dictionary
    /// of a Python XC driver would name it.
    pub fn values(&self, key: &str) -> Option<DVector<f64>> {
        if !FEATURE_KEYS.contains(&key) {
            return None;
        }
        let values = self
            .points
            .iter()
            .map(|p| p.get(key).map(|d| d.value()))
            .collect::<Option<Vec<f64>>>()?;
        Some(DVector::from_vec(values))
    }
}

/// Build the canonical feature set following the requested mode.
///
/// The mode must agree with the input variant; aggregate data is never
/// reinterpreted as spin-resolved or vice versa.
pub fn build_features(input: &DensityInput, mode: EvalMode) -> Result<CanonicalFeatureSet> {
    match (mode, input) {
        (EvalMode::SpinResolved, DensityInput::SpinResolved { rho_a, rho_b }) => {
            features_from_rhos(rho_a, rho_b)
        }
        (EvalMode::Libxc, DensityInput::Libxc { rho, sigma, tau }) => {
            features_from_libxc(rho, sigma, tau)
        }
        _ => Err(XcError::ModeMismatch {
            mode: mode.as_str(),
            input: input.kind(),
        }),
    }
}

/// Spin-resolved path: unpack per-spin rows and contract the gradients.
pub fn features_from_rhos(
    rho_a: &DMatrix<f64>,
    rho_b: &DMatrix<f64>,
) -> Result<CanonicalFeatureSet> {
    check_rows("rho_a rows", rho_a)?;
    check_rows("rho_b rows", rho_b)?;
    if rho_a.ncols() != rho_b.ncols() {
        return Err(XcError::ShapeMismatch {
            what: "rho_b points",
            expected: rho_a.ncols(),
            actual: rho_b.ncols(),
        });
    }

    let points = rho_a
        .column_iter()
        .zip(rho_b.column_iter())
        .map(|(a, b)| {
            let (ax, ay, az) = (a[ROW_GRAD_X], a[ROW_GRAD_Y], a[ROW_GRAD_Z]);
            let (bx, by, bz) = (b[ROW_GRAD_X], b[ROW_GRAD_Y], b[ROW_GRAD_Z]);

            let norm_grad_a = ax * ax + ay * ay + az * az;
            let norm_grad_b = bx * bx + by * by + bz * bz;

            let (gx, gy, gz) = (ax + bx, ay + by, az + bz);
            let norm_grad = gx * gx + gy * gy + gz * gz;

            FeaturePoint::new(
                a[ROW_DENSITY],
                b[ROW_DENSITY],
                norm_grad_a,
                norm_grad_b,
                norm_grad,
                a[ROW_TAU],
                b[ROW_TAU],
            )
        })
        .collect();

    Ok(CanonicalFeatureSet::from_points(points))
}

/// Aggregate path: split a closed-shell `{rho, sigma, tau}` evenly between spins.
pub fn features_from_libxc(
    rho: &DVector<f64>,
    sigma: &DVector<f64>,
    tau: &DVector<f64>,
) -> Result<CanonicalFeatureSet> {
    for (what, v) in [("sigma points", sigma), ("tau points", tau)] {
        if v.len() != rho.len() {
            return Err(XcError::ShapeMismatch {
                what,
                expected: rho.len(),
                actual: v.len(),
            });
        }
    }

    let points = rho
        .iter()
        .zip(sigma.iter())
        .zip(tau.iter())
        .map(|((&rho, &sigma), &tau)| {
            FeaturePoint::new(
                rho / 2.0,
                rho / 2.0,
                sigma / 4.0,
                sigma / 4.0,
                sigma,
                tau / 2.0,
                tau / 2.0,
            )
        })
        .collect();

    Ok(CanonicalFeatureSet::from_points(points))
}

fn check_rows(what: &'static str, m: &DMatrix<f64>) -> Result<()> {
    if m.nrows() != RAW_ROWS {
        return Err(XcError::ShapeMismatch {
            what,
            expected: RAW_ROWS,
            actual: m.nrows(),
        });
    }
    Ok(())
}
