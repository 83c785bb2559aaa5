//! Neural-network-enhanced exchange-correlation functionals.
//!
//! Raw density data flows through a fixed pipeline:
//! feature builder -> dimensionless transform -> enhancement model ->
//! parent functional, producing the XC energy density and its potential.

pub mod assembler;
pub mod dual;
pub mod error;
pub mod features;
pub mod functional;
pub mod model;
pub mod registry;
pub mod transform;

pub use assembler::{integrate_energy, FunctionalResult, XcFunctional, XcPotential};
pub use dual::{Dual, Variable};
pub use error::{Result, XcError};
pub use features::{build_features, CanonicalFeatureSet, DensityInput, EvalMode, FeaturePoint};
pub use functional::ParentFunctional;
pub use model::{ConstantModel, EnhancementModel, MlpModel, MlpParameters};
pub use registry::{FunctionalId, FunctionalRegistry, ParameterStore, OMEGA_VARIANTS};
pub use transform::{dimensionless_inputs, NnInputRow, NnInputs, DENSITY_EPSILON, NN_INPUT_WIDTH};
