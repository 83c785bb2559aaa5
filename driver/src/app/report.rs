use crate::app::runner::SystemOutcome;
use tracing::{info, warn};

/// Counts of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

pub fn report_outcomes(functional: &str, outcomes: &[SystemOutcome]) -> RunSummary {
    info!("\n{functional} exchange-correlation energies (Hartree):");

    let mut summary = RunSummary::default();
    for outcome in outcomes {
        match &outcome.energy {
            Ok(energy) => {
                summary.succeeded += 1;
                info!("  {:<16} {:>8} pts  E_xc = {:.10}", outcome.id, outcome.points, energy);
            }
            Err(err) => {
                summary.failed += 1;
                warn!("  {:<16} ERROR: {:#}", outcome.id, err);
            }
        }
    }

    info!(
        "\n{} systems evaluated, {} failed",
        summary.succeeded + summary.failed,
        summary.failed
    );
    summary
}
