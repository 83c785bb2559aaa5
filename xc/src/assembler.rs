//! Functional assembler: the full evaluation pipeline of one XC functional.
//!
//! raw densities -> canonical features -> dimensionless inputs ->
//! enhancement constants -> parent functional -> energy density + potential

extern crate nalgebra as na;

use crate::dual::{Dual, Variable};
use crate::error::{Result, XcError};
use crate::features::{build_features, CanonicalFeatureSet, DensityInput, EvalMode};
use crate::functional::ParentFunctional;
use crate::model::EnhancementModel;
use crate::transform::{dimensionless_inputs, NN_INPUT_WIDTH};
use na::DVector;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Derivatives of the local XC energy density at one point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct XcPotential {
    /// d/d(ρa), d/d(ρb)
    pub vrho: [f64; 2],
    /// d/d(σaa), d/d(σab), d/d(σbb)
    pub vsigma: [f64; 3],
    /// d/d(τa), d/d(τb)
    pub vtau: [f64; 2],
}

impl XcPotential {
    fn from_dual(local_xc: &Dual) -> Self {
        Self {
            vrho: [
                local_xc.partial(Variable::RhoA),
                local_xc.partial(Variable::RhoB),
            ],
            vsigma: [
                local_xc.partial(Variable::SigmaAA),
                local_xc.partial(Variable::SigmaAB),
                local_xc.partial(Variable::SigmaBB),
            ],
            vtau: [
                local_xc.partial(Variable::TauA),
                local_xc.partial(Variable::TauB),
            ],
        }
    }

    /// Potential with respect to the closed-shell `(rho, sigma, tau)` triple,
    /// given ρa = ρb = ρ/2, σaa = σab = σbb = σ/4 and τa = τb = τ/2.
    pub fn aggregate(&self) -> (f64, f64, f64) {
        let vrho = 0.5 * (self.vrho[0] + self.vrho[1]);
        let vsigma = 0.25 * (self.vsigma[0] + self.vsigma[1] + self.vsigma[2]);
        let vtau = 0.5 * (self.vtau[0] + self.vtau[1]);
        (vrho, vsigma, vtau)
    }
}

/// Output of one evaluation call.
#[derive(Clone, Debug)]
pub struct FunctionalResult {
    /// XC energy per particle at each point.
    pub vxc: DVector<f64>,
    /// Local XC energy density, `vxc * (rho_a + rho_b)`.
    pub local_xc: DVector<f64>,
    /// Derivatives of `local_xc` with respect to the density variables.
    pub potential: Vec<XcPotential>,
    /// Canonical features the result was computed from.
    pub features: CanonicalFeatureSet,
}

impl FunctionalResult {
    pub fn len(&self) -> usize {
        self.vxc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vxc.is_empty()
    }

    pub fn into_parts(self) -> (DVector<f64>, DVector<f64>, CanonicalFeatureSet) {
        (self.local_xc, self.vxc, self.features)
    }
}

/// A named functional: parent family plus the model supplying its constants.
#[derive(Clone)]
pub struct XcFunctional {
    name: String,
    family: ParentFunctional,
    model: Arc<dyn EnhancementModel>,
}

impl fmt::Debug for XcFunctional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XcFunctional")
            .field("name", &self.name)
            .field("family", &self.family)
            .field("outputs", &self.model.output_width())
            .finish()
    }
}

impl XcFunctional {
    /// Pair a model with its parent functional. The model widths must match
    /// the transform output and the number of constants the family consumes.
    pub fn new(
        name: impl Into<String>,
        family: ParentFunctional,
        model: Arc<dyn EnhancementModel>,
    ) -> Result<Self> {
        if model.input_width() != NN_INPUT_WIDTH {
            return Err(XcError::ShapeMismatch {
                what: "enhancement model inputs",
                expected: NN_INPUT_WIDTH,
                actual: model.input_width(),
            });
        }
        if model.output_width() != family.constants_width() {
            return Err(XcError::ShapeMismatch {
                what: "enhancement model outputs",
                expected: family.constants_width(),
                actual: model.output_width(),
            });
        }
        Ok(Self {
            name: name.into(),
            family,
            model,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> ParentFunctional {
        self.family
    }

    /// Evaluate the functional on a batch of points.
    ///
    /// Either the whole batch succeeds or an error is returned; no partial
    /// results are produced.
    pub fn evaluate(&self, input: &DensityInput, mode: EvalMode) -> Result<FunctionalResult> {
        let features = build_features(input, mode)?;
        let inputs = dimensionless_inputs(&features)?;
        debug!(
            "Evaluating {} ({}) on {} points in {} mode",
            self.name,
            self.family,
            features.len(),
            mode
        );

        let n = features.len();
        let mut vxc = DVector::zeros(n);
        let mut local_xc = DVector::zeros(n);
        let mut potential = Vec::with_capacity(n);

        for (i, (p, row)) in features.iter().zip(inputs.rows()).enumerate() {
            let constants = self.model.forward(row);
            if let Some(component) = constants.iter().position(|c| !c.is_finite()) {
                return Err(XcError::NumericDomain {
                    stage: "enhancement model",
                    point: i,
                    component,
                });
            }

            let e = self
                .family
                .energy_per_particle(p.densities(), p.gradients(), &constants)?;
            let local = e * p.rho();
            if !e.is_finite() {
                return Err(XcError::NumericDomain {
                    stage: "assembler",
                    point: i,
                    component: 0,
                });
            }
            if !local.is_finite() {
                return Err(XcError::NumericDomain {
                    stage: "assembler",
                    point: i,
                    component: 1,
                });
            }

            vxc[i] = e.value();
            local_xc[i] = local.value();
            potential.push(XcPotential::from_dual(&local));
        }

        Ok(FunctionalResult {
            vxc,
            local_xc,
            potential,
            features,
        })
    }
}

/// Quadrature sum of the local energy density, E_xc = Σ w_p e_p.
pub fn integrate_energy(weights: &[f64], result: &FunctionalResult) -> Result<f64> {
    if weights.len() != result.len() {
        return Err(XcError::ShapeMismatch {
            what: "quadrature weights",
            expected: result.len(),
            actual: weights.len(),
        });
    }
    Ok(weights
        .iter()
        .zip(result.local_xc.iter())
        .map(|(w, e)| w * e)
        .sum())
}
