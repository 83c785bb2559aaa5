use crate::config::SystemConfig;
use crate::io::{load_samples, LedgerEntry};
use color_eyre::eyre::{Result, WrapErr};
use nn_xc::{integrate_energy, EvalMode, XcFunctional};
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Result of evaluating one configured system.
pub struct SystemOutcome {
    pub id: String,
    pub points: usize,
    pub energy: Result<f64>,
}

impl SystemOutcome {
    pub fn ledger_entry(&self) -> LedgerEntry {
        match &self.energy {
            Ok(energy) => LedgerEntry::success(self.id.clone(), *energy),
            Err(_) => LedgerEntry::failure(self.id.clone()),
        }
    }
}

/// Load one system's samples, evaluate the functional and integrate E_xc.
pub fn evaluate_system(
    functional: &XcFunctional,
    mode: EvalMode,
    system: &SystemConfig,
) -> Result<(usize, f64)> {
    let samples = load_samples(Path::new(&system.samples))?;
    let points = samples.input.num_points();
    debug!("{}: {} grid points", system.id, points);

    let result = functional
        .evaluate(&samples.input, mode)
        .wrap_err_with(|| format!("{} failed on system {}", functional.name(), system.id))?;
    let energy = integrate_energy(&samples.weights, &result)
        .wrap_err_with(|| format!("Quadrature failed on system {}", system.id))?;
    Ok((points, energy))
}

/// Evaluate every system in parallel; outcomes keep the configuration order.
pub fn run_systems(
    functional: &XcFunctional,
    mode: EvalMode,
    systems: &[SystemConfig],
) -> Vec<SystemOutcome> {
    info!(
        "Evaluating {} on {} systems in {} mode",
        functional.name(),
        systems.len(),
        mode
    );
    systems
        .par_iter()
        .map(|system| {
            let (points, energy) = match evaluate_system(functional, mode, system) {
                Ok((points, energy)) => (points, Ok(energy)),
                Err(err) => (0, Err(err)),
            };
            SystemOutcome {
                id: system.id.clone(),
                points,
                energy,
            }
        })
        .collect()
}
