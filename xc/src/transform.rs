//! Dimensionless transform: canonical features to bounded network inputs.
//!
//! Column order of every row:
//! `[rho_a^-1/3, rho_b^-1/3, s_a, s_total, s_b, t_a, t_b]`, where `s` are the
//! reduced gradients and `t` the kinetic-energy deviations from the
//! Thomas-Fermi value. Each column is regularized with [`DENSITY_EPSILON`] and
//! the row is squashed through `tanh` before it reaches the model.

extern crate nalgebra as na;

use crate::dual::Dual;
use crate::error::{Result, XcError};
use crate::features::{CanonicalFeatureSet, FeaturePoint};
use na::DMatrix;
use std::f64::consts::PI;

/// Regularizer added under radicals and denominators.
pub const DENSITY_EPSILON: f64 = 1e-21;

/// Width of a network input row.
pub const NN_INPUT_WIDTH: usize = 7;

pub type NnInputRow = [Dual; NN_INPUT_WIDTH];

/// Thomas-Fermi kinetic-energy prefactor, (3/10)(3 pi^2)^(2/3).
#[inline]
pub fn thomas_fermi_prefactor() -> f64 {
    0.3 * (3.0 * PI * PI).powf(2.0 / 3.0)
}

/// Thomas-Fermi kinetic-energy density of one spin channel.
#[inline]
pub fn thomas_fermi_tau(rho_spin: Dual) -> Dual {
    (rho_spin + DENSITY_EPSILON).powf(5.0 / 3.0) * thomas_fermi_prefactor()
}

/// Descriptors of a single point before squashing.
pub fn raw_descriptors(p: &FeaturePoint) -> NnInputRow {
    let eps = DENSITY_EPSILON;
    let rho_a = p.rho_a + eps;
    let rho_b = p.rho_b + eps;
    let rho = p.rho_a + p.rho_b + eps;

    let reduced_grad = |norm: Dual, density: Dual| (norm + eps * eps).sqrt() / density.powf(4.0 / 3.0);

    let tau_tf_a = thomas_fermi_tau(p.rho_a);
    let tau_tf_b = thomas_fermi_tau(p.rho_b);

    [
        rho_a.powf(-1.0 / 3.0),
        rho_b.powf(-1.0 / 3.0),
        reduced_grad(p.norm_grad_a, rho_a),
        reduced_grad(p.norm_grad, rho),
        reduced_grad(p.norm_grad_b, rho_b),
        (p.tau_a - tau_tf_a) / tau_tf_a,
        (p.tau_b - tau_tf_b) / tau_tf_b,
    ]
}

/// Batched network inputs, one squashed row per point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NnInputs {
    rows: Vec<NnInputRow>,
}

impl NnInputs {
    pub fn rows(&self) -> &[NnInputRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Plain values as an `N x 7` matrix.
    pub fn values(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.rows.len(), NN_INPUT_WIDTH, |i, j| {
            self.rows[i][j].value()
        })
    }
}

/// Map a feature set to the squashed `N x 7` input matrix.
///
/// Fails with [`XcError::NumericDomain`] if any descriptor, before or after
/// squashing, is not finite.
pub fn dimensionless_inputs(features: &CanonicalFeatureSet) -> Result<NnInputs> {
    let mut rows = Vec::with_capacity(features.len());
    for (point, p) in features.iter().enumerate() {
        let raw = raw_descriptors(p);
        let mut row = raw;
        for (component, (x, r)) in row.iter_mut().zip(raw.iter()).enumerate() {
            if !r.value().is_finite() {
                return Err(XcError::NumericDomain {
                    stage: "dimensionless transform",
                    point,
                    component,
                });
            }
            *x = r.tanh();
            if !x.is_finite() {
                return Err(XcError::NumericDomain {
                    stage: "dimensionless transform",
                    point,
                    component,
                });
            }
        }
        rows.push(row);
    }
    Ok(NnInputs { rows })
}
