//! Correlation parts of the PBE parent functional.
//!
//! LSDA correlation is Perdew-Wang 1992; the gradient correction is the PBE
//! H(r_s, ζ, t) term with β supplied by the enhancement model.

use crate::dual::Dual;
use std::f64::consts::PI;

/// γ = (1 - ln 2) / π².
#[inline]
pub(crate) fn pbe_gamma() -> f64 {
    (1.0 - std::f64::consts::LN_2) / (PI * PI)
}

/// f''(0) of the spin interpolation function.
const FZ20: f64 = 1.709_920_934_161_365_6;

/// Parameters of the PW92 G(r_s) interpolation.
struct Pw92Params {
    a: f64,
    alpha1: f64,
    beta1: f64,
    beta2: f64,
    beta3: f64,
    beta4: f64,
}

const PW92_UNPOLARIZED: Pw92Params = Pw92Params {
    a: 0.031_090_7,
    alpha1: 0.213_70,
    beta1: 7.5957,
    beta2: 3.5876,
    beta3: 1.6382,
    beta4: 0.492_94,
};

const PW92_POLARIZED: Pw92Params = Pw92Params {
    a: 0.015_545_35,
    alpha1: 0.205_48,
    beta1: 14.1189,
    beta2: 6.1977,
    beta3: 3.3662,
    beta4: 0.625_17,
};

const PW92_STIFFNESS: Pw92Params = Pw92Params {
    a: 0.016_886_9,
    alpha1: 0.111_25,
    beta1: 10.357,
    beta2: 3.6231,
    beta3: 0.880_26,
    beta4: 0.496_71,
};

/// G(r_s) = -2A(1 + α1 r_s) ln(1 + 1 / (2A(β1 r_s^½ + β2 r_s + β3 r_s^{3/2} + β4 r_s²)))
fn pw92_g(rs: Dual, p: &Pw92Params) -> Dual {
    let srs = rs.sqrt();
    let den = (srs * p.beta1 + rs * p.beta2 + rs * srs * p.beta3 + rs * rs * p.beta4) * (2.0 * p.a);
    (rs * p.alpha1 + 1.0) * (-2.0 * p.a) * den.recip().ln_1p()
}

/// Spin-scaling pieces for ζ given as 1 ± ζ.
///
/// Both arguments are strictly positive for regularized densities, which keeps
/// the fractional powers differentiable at full polarization.
pub(crate) struct SpinFactors {
    pub zeta: Dual,
    /// f(ζ) of PW92
    pub f: Dual,
    /// φ(ζ) of PBE
    pub phi: Dual,
}

pub(crate) fn spin_factors(opz: Dual, omz: Dual) -> SpinFactors {
    let zeta = (opz - omz) * 0.5;
    let f = (opz.powf(4.0 / 3.0) + omz.powf(4.0 / 3.0) - 2.0) / (2.0_f64.powf(4.0 / 3.0) - 2.0);
    let phi = (opz.powf(2.0 / 3.0) + omz.powf(2.0 / 3.0)) * 0.5;
    SpinFactors { zeta, f, phi }
}

/// PW92 LSDA correlation energy per particle ε_c(r_s, ζ).
pub(crate) fn pw92_eps_c(rs: Dual, spin: &SpinFactors) -> Dual {
    let ec0 = pw92_g(rs, &PW92_UNPOLARIZED);
    let ec1 = pw92_g(rs, &PW92_POLARIZED);
    // G for the stiffness parameters returns -α_c
    let minus_ac = pw92_g(rs, &PW92_STIFFNESS);

    let z4 = spin.zeta.powi(4);
    ec0 - minus_ac * spin.f * (1.0 - z4) / FZ20 + (ec1 - ec0) * spin.f * z4
}

/// PBE gradient correction H per particle.
///
/// `t2 = σ_tot / (4 φ² k_s² ρ²)`, `A = (β/γ) / (exp(-ε_c / (γ φ³)) - 1)`.
pub(crate) fn pbe_h(rho: Dual, sigma_total: Dual, eps_c: Dual, spin: &SpinFactors, beta: Dual) -> Dual {
    let gamma = pbe_gamma();
    let phi3 = spin.phi.powi(3);

    let kf = (rho * (3.0 * PI * PI)).powf(1.0 / 3.0);
    let ks2 = kf * (4.0 / PI);
    let t2 = sigma_total / (spin.phi.powi(2) * ks2 * rho.powi(2) * 4.0);

    let a = beta / gamma / (-eps_c / (phi3 * gamma)).exp_m1();
    let at2 = a * t2;
    let ratio = (at2 + 1.0) / (at2 + 1.0 + at2 * at2);
    phi3 * gamma * (beta / gamma * t2 * ratio).ln_1p()
}

/// Wigner-Seitz radius r_s = (3 / (4πρ))^(1/3).
#[inline]
pub(crate) fn wigner_seitz_radius(rho: Dual) -> Dual {
    (rho * (4.0 * PI / 3.0)).powf(-1.0 / 3.0)
}
