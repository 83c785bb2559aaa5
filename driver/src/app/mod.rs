mod report;
mod runner;

pub use report::{report_outcomes, RunSummary};
pub use runner::{evaluate_system, run_systems, SystemOutcome};

use crate::config::{Args, Config};
use crate::io::{append_entries, setup_output, LedgerEntry};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use nn_xc::{EvalMode, FunctionalRegistry, ParameterStore};
use std::fs;
use std::path::Path;
use tracing::info;

pub struct DriverApplication {
    args: Args,
    config: Config,
}

impl DriverApplication {
    pub fn from_cli() -> Result<Self> {
        Self::new(Args::parse())
    }

    pub fn new(args: Args) -> Result<Self> {
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_deref());
        info!("Configuration loaded:\n{:?}", self.config);
        self.execute()?;
        Ok(())
    }

    /// Build the registry, evaluate all systems and append them to the ledger.
    ///
    /// A failing system is recorded as `ERROR` and does not stop the run;
    /// configuration or registry problems abort before anything is written.
    pub fn execute(&self) -> Result<RunSummary> {
        let mode = self
            .config
            .mode()
            .parse::<EvalMode>()
            .wrap_err("Invalid evaluation mode")?;

        let store = build_store(&self.config)?;
        let name = self.config.functional();
        let registry = FunctionalRegistry::build(&store, &[name])
            .wrap_err_with(|| format!("Unable to set up functional {}", name))?;
        let functional = registry.get(name)?;

        let outcomes = run_systems(functional, mode, &self.config.systems);
        let summary = report_outcomes(functional.name(), &outcomes);

        let entries: Vec<LedgerEntry> = outcomes.iter().map(SystemOutcome::ledger_entry).collect();
        let ledger = self.config.ledger_path();
        append_entries(&ledger, &entries)?;
        info!("Appended {} entries to {}", entries.len(), ledger.display());

        Ok(summary)
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let base = Path::new(&args.config_file)
        .parent()
        .unwrap_or_else(|| Path::new(""));
    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults()
        .relative_to(base)
        .with_overrides(args);

    Ok(config)
}

fn build_store(config: &Config) -> Result<ParameterStore> {
    let store = match &config.parameter_dir {
        Some(dir) => ParameterStore::from_directory(dir),
        None => ParameterStore::new(),
    };
    let store = store
        .with_entries(config.parameters.iter())
        .wrap_err("Invalid entry in parameters")?;
    Ok(store)
}
