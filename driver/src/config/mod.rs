//! Configuration management for the XC driver
//!
//! A YAML file names the functional, the evaluation mode, where parameter
//! files live, the systems to evaluate and the results ledger. Missing values
//! fall back to defaults; command-line values override both.

mod args;

pub use args::Args;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main configuration structure for a driver run
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub functional: Option<String>,
    pub mode: Option<String>,
    pub parameter_dir: Option<String>,
    /// Explicit parameter files, keyed by functional name
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    pub ledger: Option<String>,
    #[serde(default)]
    pub systems: Vec<SystemConfig>,
}

/// One system: an identifier and the file holding its density samples
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemConfig {
    pub id: String,
    pub samples: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            functional: Some("NN_PBE".to_string()),
            mode: Some("spin_resolved".to_string()),
            parameter_dir: Some("parameters".to_string()),
            parameters: HashMap::new(),
            ledger: Some("results.txt".to_string()),
            systems: Vec::new(),
        }
    }
}

impl Config {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.functional.is_none() {
            self.functional = defaults.functional;
        }
        if self.mode.is_none() {
            self.mode = defaults.mode;
        }
        if self.parameter_dir.is_none() {
            self.parameter_dir = defaults.parameter_dir;
        }
        if self.ledger.is_none() {
            self.ledger = defaults.ledger;
        }
        self
    }

    /// Command-line values take precedence over the file
    pub fn with_overrides(mut self, args: &Args) -> Self {
        if let Some(functional) = &args.functional {
            self.functional = Some(functional.clone());
        }
        if let Some(mode) = &args.mode {
            self.mode = Some(mode.clone());
        }
        if let Some(dir) = &args.parameter_dir {
            self.parameter_dir = Some(dir.clone());
        }
        if let Some(ledger) = &args.ledger {
            self.ledger = Some(ledger.clone());
        }
        self
    }

    /// Interpret relative paths in the file as relative to `base`
    pub fn relative_to(mut self, base: &Path) -> Self {
        let join = |p: &str| -> String {
            let path = Path::new(p);
            if path.is_absolute() {
                p.to_string()
            } else {
                base.join(path).to_string_lossy().into_owned()
            }
        };
        self.parameter_dir = self.parameter_dir.as_deref().map(join);
        self.ledger = self.ledger.as_deref().map(join);
        for path in self.parameters.values_mut() {
            *path = join(path.as_str());
        }
        for system in self.systems.iter_mut() {
            system.samples = join(system.samples.as_str());
        }
        self
    }

    pub fn functional(&self) -> &str {
        self.functional.as_deref().unwrap_or("NN_PBE")
    }

    pub fn mode(&self) -> &str {
        self.mode.as_deref().unwrap_or("spin_resolved")
    }

    pub fn ledger_path(&self) -> PathBuf {
        PathBuf::from(self.ledger.as_deref().unwrap_or("results.txt"))
    }
}
