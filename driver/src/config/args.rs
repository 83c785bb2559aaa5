//! Command-line argument parsing for the XC driver

use clap::Parser;

/// Evaluate an XC functional on density samples with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override the functional to evaluate (e.g. NN_PBE, NN_XALPHA_067, PBE)
    #[arg(short, long)]
    pub functional: Option<String>,

    /// Override the evaluation mode (spin_resolved or libxc)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Override the parameter directory
    #[arg(long)]
    pub parameter_dir: Option<String>,

    /// Override the results ledger path
    #[arg(short, long)]
    pub ledger: Option<String>,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}
