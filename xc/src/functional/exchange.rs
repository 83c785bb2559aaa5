//! Exchange parts of the parent functionals.
//!
//! Spin-polarized exchange follows from the unpolarized one by spin scaling:
//! E_x[ρa, ρb] = ½ E_x[2ρa] + ½ E_x[2ρb].

use crate::dual::Dual;
use std::f64::consts::PI;

/// LDA exchange prefactor, c_x = -(3/4)(3/π)^(1/3).
#[inline]
pub(crate) fn c_x() -> f64 {
    -0.75 * (3.0 / PI).powf(1.0 / 3.0)
}

/// Unpolarized LDA exchange energy per volume, e_x = c_x ρ^(4/3).
#[inline]
pub(crate) fn lda_x_energy_density(rho: Dual) -> Dual {
    rho.powf(4.0 / 3.0) * c_x()
}

/// Slater LSDA exchange energy per volume for one spin channel.
#[inline]
pub(crate) fn lsda_x_spin_channel(rho_spin: Dual) -> Dual {
    lda_x_energy_density(rho_spin * 2.0) * 0.5
}

/// Xα exchange per volume: (3α/2) times Slater exchange.
///
/// α = 2/3 gives Slater exchange, α = 0.7 gives 1.05 × Slater.
pub(crate) fn xalpha_energy_density(alpha: Dual, rho_a: Dual, rho_b: Dual) -> Dual {
    alpha * 1.5 * (lsda_x_spin_channel(rho_a) + lsda_x_spin_channel(rho_b))
}

/// PBE enhancement factor F_x(s²) = 1 + κ - κ / (1 + μ s² / κ).
#[inline]
pub(crate) fn pbe_fx(s2: Dual, kappa: Dual, mu: Dual) -> Dual {
    kappa + 1.0 - kappa / (mu * s2 / kappa + 1.0)
}

/// Unpolarized PBE exchange energy per volume.
///
/// s² = σ / (4 (3π²)^(2/3) ρ^(8/3))
pub(crate) fn pbe_x_energy_density(rho: Dual, sigma: Dual, kappa: Dual, mu: Dual) -> Dual {
    let c = 4.0 * (3.0 * PI * PI).powf(2.0 / 3.0);
    let s2 = sigma / (rho.powf(8.0 / 3.0) * c);
    lda_x_energy_density(rho) * pbe_fx(s2, kappa, mu)
}

/// Spin-polarized PBE exchange per volume for one spin channel.
#[inline]
pub(crate) fn pbe_x_spin_channel(rho_spin: Dual, sigma_spin: Dual, kappa: Dual, mu: Dual) -> Dual {
    pbe_x_energy_density(rho_spin * 2.0, sigma_spin * 4.0, kappa, mu) * 0.5
}
