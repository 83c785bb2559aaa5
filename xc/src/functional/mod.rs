//! Closed-form parent functionals modulated by enhancement constants.
//!
//! Every variant implements the same contract,
//! `(densities, gradients, constants) -> energy per particle`, and works on
//! [`Dual`] numbers so the potential comes out of the same pass.

mod correlation;
mod exchange;

use crate::dual::Dual;
use crate::error::{Result, XcError};
use crate::transform::DENSITY_EPSILON;
use std::fmt;

/// PBE reference parameters (κ, μ, β).
pub const PBE_KAPPA: f64 = 0.804;
pub const PBE_MU: f64 = 0.219_514_972_764_517_1;
pub const PBE_BETA: f64 = 0.066_724_550_603_149_22;

/// Xα reference parameter; α = 0.7 is 1.05 × Slater exchange.
pub const XALPHA_ALPHA: f64 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParentFunctional {
    /// PBE exchange-correlation; constants (κ, μ, β).
    Pbe,
    /// Xα local spin-density exchange; constant α.
    XAlpha,
}

impl ParentFunctional {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentFunctional::Pbe => "PBE",
            ParentFunctional::XAlpha => "XAlpha",
        }
    }

    /// Number of constants the enhancement model must supply per point.
    pub fn constants_width(&self) -> usize {
        match self {
            ParentFunctional::Pbe => 3,
            ParentFunctional::XAlpha => 1,
        }
    }

    /// Constants that reproduce the unmodified parent functional.
    pub fn reference_constants(&self) -> Vec<f64> {
        match self {
            ParentFunctional::Pbe => vec![PBE_KAPPA, PBE_MU, PBE_BETA],
            ParentFunctional::XAlpha => vec![XALPHA_ALPHA],
        }
    }

    pub fn needs_gradient(&self) -> bool {
        match self {
            ParentFunctional::Pbe => true,
            ParentFunctional::XAlpha => false,
        }
    }

    /// XC energy per particle at one point.
    ///
    /// `densities` are (ρa, ρb); `gradients` are (σaa, σab, σbb). Densities are
    /// regularized with [`DENSITY_EPSILON`] so vacuum points stay finite.
    pub fn energy_per_particle(
        &self,
        densities: [Dual; 2],
        gradients: [Dual; 3],
        constants: &[Dual],
    ) -> Result<Dual> {
        if constants.len() != self.constants_width() {
            return Err(XcError::ShapeMismatch {
                what: "enhancement constants",
                expected: self.constants_width(),
                actual: constants.len(),
            });
        }

        let rho_a = densities[0] + DENSITY_EPSILON;
        let rho_b = densities[1] + DENSITY_EPSILON;
        let rho = rho_a + rho_b;

        let vxc = match self {
            ParentFunctional::XAlpha => {
                exchange::xalpha_energy_density(constants[0], rho_a, rho_b) / rho
            }
            ParentFunctional::Pbe => {
                let (kappa, mu, beta) = (constants[0], constants[1], constants[2]);
                let [sigma_aa, sigma_ab, sigma_bb] = gradients;

                let ex = exchange::pbe_x_spin_channel(rho_a, sigma_aa, kappa, mu)
                    + exchange::pbe_x_spin_channel(rho_b, sigma_bb, kappa, mu);

                let spin = correlation::spin_factors(rho_a * 2.0 / rho, rho_b * 2.0 / rho);
                let rs = correlation::wigner_seitz_radius(rho);
                let ec = correlation::pw92_eps_c(rs, &spin);
                let sigma_total = sigma_aa + sigma_ab * 2.0 + sigma_bb;
                let h = correlation::pbe_h(rho, sigma_total, ec, &spin, beta);

                ex / rho + ec + h
            }
        };
        Ok(vxc)
    }
}

impl fmt::Display for ParentFunctional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dual::Variable;

    fn consts(v: &[f64]) -> Vec<Dual> {
        v.iter().copied().map(Dual::constant).collect()
    }

    fn zero_gradients() -> [Dual; 3] {
        [Dual::constant(0.0); 3]
    }

    #[test]
    fn test_constants_width_checked() {
        let err = ParentFunctional::Pbe
            .energy_per_particle(
                [Dual::constant(0.1); 2],
                zero_gradients(),
                &consts(&[0.804]),
            )
            .unwrap_err();
        assert_eq!(
            err,
            XcError::ShapeMismatch {
                what: "enhancement constants",
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn test_xalpha_scales_linearly_with_alpha() {
        let d = [Dual::constant(0.2), Dual::constant(0.1)];
        let e1 = ParentFunctional::XAlpha
            .energy_per_particle(d, zero_gradients(), &consts(&[0.7]))
            .unwrap();
        let e2 = ParentFunctional::XAlpha
            .energy_per_particle(d, zero_gradients(), &consts(&[1.4]))
            .unwrap();
        assert!(e1.value() < 0.0);
        assert!((e2.value() - 2.0 * e1.value()).abs() < 1e-15);
    }

    #[test]
    fn test_xalpha_ignores_gradients() {
        let d = [Dual::constant(0.2), Dual::constant(0.1)];
        let a = &consts(&[XALPHA_ALPHA]);
        let flat = ParentFunctional::XAlpha.energy_per_particle(d, zero_gradients(), a).unwrap();
        let steep = ParentFunctional::XAlpha
            .energy_per_particle(d, [Dual::constant(3.0); 3], a)
            .unwrap();
        assert_eq!(flat, steep);
    }

    #[test]
    fn test_pbe_homogeneous_gas_is_lda() {
        // Without gradients PBE reduces to LSDA exchange + PW92 correlation.
        let rho = 0.3_f64;
        let d = [Dual::constant(rho / 2.0), Dual::constant(rho / 2.0)];
        let vxc = ParentFunctional::Pbe
            .energy_per_particle(d, zero_gradients(), &consts(&ParentFunctional::Pbe.reference_constants()))
            .unwrap()
            .value();

        let ex = exchange::c_x() * rho.powf(1.0 / 3.0);
        let rs = (3.0 / (4.0 * std::f64::consts::PI * rho)).powf(1.0 / 3.0);
        let unpolarized = correlation::spin_factors(Dual::constant(1.0), Dual::constant(1.0));
        let ec = correlation::pw92_eps_c(Dual::constant(rs), &unpolarized).value();
        assert!((vxc - (ex + ec)).abs() < 1e-12, "{vxc} vs {}", ex + ec);
    }

    #[test]
    fn test_pbe_gradient_lowers_energy() {
        let d = [Dual::constant(0.15), Dual::constant(0.15)];
        let c = consts(&ParentFunctional::Pbe.reference_constants());
        let flat = ParentFunctional::Pbe.energy_per_particle(d, zero_gradients(), &c).unwrap();
        let g = [Dual::constant(0.01), Dual::constant(0.01), Dual::constant(0.01)];
        let steep = ParentFunctional::Pbe.energy_per_particle(d, g, &c).unwrap();
        assert!(flat.value().is_finite() && steep.value().is_finite());
        assert_ne!(flat.value(), steep.value());
    }

    #[test]
    fn test_pbe_fully_polarized_point_is_finite() {
        let d = [
            Dual::variable(0.2, Variable::RhoA),
            Dual::variable(0.0, Variable::RhoB),
        ];
        let g = [
            Dual::variable(0.05, Variable::SigmaAA),
            Dual::variable(0.0, Variable::SigmaAB),
            Dual::variable(0.0, Variable::SigmaBB),
        ];
        let c = consts(&ParentFunctional::Pbe.reference_constants());
        let vxc = ParentFunctional::Pbe.energy_per_particle(d, g, &c).unwrap();
        assert!(vxc.is_finite(), "{vxc:?}");
    }

    #[test]
    fn test_vacuum_is_finite_for_both_families() {
        let d = [
            Dual::variable(0.0, Variable::RhoA),
            Dual::variable(0.0, Variable::RhoB),
        ];
        let g = [
            Dual::variable(0.0, Variable::SigmaAA),
            Dual::variable(0.0, Variable::SigmaAB),
            Dual::variable(0.0, Variable::SigmaBB),
        ];
        for family in [ParentFunctional::Pbe, ParentFunctional::XAlpha] {
            let c = consts(&family.reference_constants());
            let vxc = family.energy_per_particle(d, g, &c).unwrap();
            assert!(vxc.is_finite(), "{family}: {vxc:?}");
        }
    }

    #[test]
    fn test_pbe_derivative_matches_finite_difference() {
        let c = consts(&ParentFunctional::Pbe.reference_constants());
        let eval = |ra: f64, saa: f64| {
            ParentFunctional::Pbe
                .energy_per_particle(
                    [Dual::variable(ra, Variable::RhoA), Dual::constant(0.08)],
                    [
                        Dual::variable(saa, Variable::SigmaAA),
                        Dual::constant(0.002),
                        Dual::constant(0.004),
                    ],
                    &c,
                )
                .unwrap()
        };
        let (ra, saa) = (0.12, 0.006);
        let e = eval(ra, saa);

        let h = 1e-6;
        let fd_rho = (eval(ra + h, saa).value() - eval(ra - h, saa).value()) / (2.0 * h);
        let fd_sigma = (eval(ra, saa + h).value() - eval(ra, saa - h).value()) / (2.0 * h);
        assert!((e.partial(Variable::RhoA) - fd_rho).abs() < 1e-6);
        assert!((e.partial(Variable::SigmaAA) - fd_sigma).abs() < 1e-6);
    }
}
