//! XC Functional Evaluation Command-Line Interface
//!
//! This is the main entry point for evaluating XC functionals with YAML configuration.

use color_eyre::eyre::Result;
use nn_xc_driver::app::DriverApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    DriverApplication::from_cli()?.run()
}
