//! Functional identities, the parameter store and the functional registry.
//!
//! The registry is built once at start-up from a list of requested names and
//! then only read, so it can be shared by reference across worker threads.

use crate::assembler::XcFunctional;
use crate::error::{Result, XcError};
use crate::functional::ParentFunctional;
use crate::model::{ConstantModel, EnhancementModel, MlpModel};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Range-separation suffixes with trained parameter sets.
pub const OMEGA_VARIANTS: [&str; 11] = [
    "0", "0076", "067", "18", "33", "50", "67", "82", "93", "99", "100",
];

/// File name of a parameter set inside its functional directory.
pub const PARAMETER_FILE: &str = "parameters.json";

/// A validated functional name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionalId {
    /// Learned enhancement on top of a parent, optionally an ω variant.
    Neural {
        family: ParentFunctional,
        omega: Option<&'static str>,
    },
    /// The parent functional with its reference constants.
    Reference(ParentFunctional),
}

impl FunctionalId {
    pub fn family(&self) -> ParentFunctional {
        match self {
            FunctionalId::Neural { family, .. } | FunctionalId::Reference(family) => *family,
        }
    }

    pub fn is_neural(&self) -> bool {
        matches!(self, FunctionalId::Neural { .. })
    }

    /// Canonical spelling, e.g. `NN_PBE_067`, `NN_XALPHA` or `XAlpha`.
    pub fn name(&self) -> String {
        match self {
            FunctionalId::Reference(family) => family.as_str().to_string(),
            FunctionalId::Neural { family, omega } => {
                let base = match family {
                    ParentFunctional::Pbe => "NN_PBE",
                    ParentFunctional::XAlpha => "NN_XALPHA",
                };
                match omega {
                    Some(w) => format!("{base}_{w}"),
                    None => base.to_string(),
                }
            }
        }
    }
}

impl fmt::Display for FunctionalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for FunctionalId {
    type Err = XcError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || XcError::UnknownFunctional(s.to_string());
        let upper = s.trim().to_ascii_uppercase();

        match upper.as_str() {
            "PBE" => return Ok(FunctionalId::Reference(ParentFunctional::Pbe)),
            "XALPHA" => return Ok(FunctionalId::Reference(ParentFunctional::XAlpha)),
            _ => {}
        }

        let rest = upper.strip_prefix("NN_").ok_or_else(unknown)?;
        let (family, suffix) = if let Some(tail) = rest.strip_prefix("XALPHA") {
            (ParentFunctional::XAlpha, tail)
        } else if let Some(tail) = rest.strip_prefix("PBE") {
            (ParentFunctional::Pbe, tail)
        } else {
            return Err(unknown());
        };

        let omega = match suffix {
            "" => None,
            tail => {
                let w = tail.strip_prefix('_').ok_or_else(unknown)?;
                Some(
                    OMEGA_VARIANTS
                        .iter()
                        .copied()
                        .find(|v| *v == w)
                        .ok_or_else(unknown)?,
                )
            }
        };
        Ok(FunctionalId::Neural { family, omega })
    }
}

/// Where the parameter file of each neural functional lives.
///
/// Explicit entries win over the directory convention
/// `<root>/<NAME>/parameters.json`.
#[derive(Clone, Debug, Default)]
pub struct ParameterStore {
    root: Option<PathBuf>,
    entries: HashMap<FunctionalId, PathBuf>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_directory(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            entries: HashMap::new(),
        }
    }

    /// Register an explicit parameter file. The name must be a valid functional.
    pub fn insert(&mut self, name: &str, path: impl Into<PathBuf>) -> Result<()> {
        let id: FunctionalId = name.parse()?;
        self.entries.insert(id, path.into());
        Ok(())
    }

    pub fn with_entries<I, S, P>(mut self, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, P)>,
        S: AsRef<str>,
        P: Into<PathBuf>,
    {
        for (name, path) in entries {
            self.insert(name.as_ref(), path)?;
        }
        Ok(self)
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Parameter file for a functional, if the store knows where to find one.
    pub fn lookup(&self, id: &FunctionalId) -> Option<PathBuf> {
        self.entries.get(id).cloned().or_else(|| {
            self.root
                .as_ref()
                .map(|root| root.join(id.name()).join(PARAMETER_FILE))
        })
    }
}

/// Constructed functionals keyed by their canonical name.
#[derive(Clone, Debug, Default)]
pub struct FunctionalRegistry {
    functionals: HashMap<FunctionalId, XcFunctional>,
}

impl FunctionalRegistry {
    /// Load every requested functional. Any load failure aborts the build.
    pub fn build<S: AsRef<str>>(store: &ParameterStore, names: &[S]) -> Result<Self> {
        let mut functionals = HashMap::new();
        for name in names {
            let id: FunctionalId = name.as_ref().parse()?;
            if functionals.contains_key(&id) {
                continue;
            }
            let functional = load_functional(store, id)?;
            info!(
                "Registered functional {} (parent {}, gradient-corrected: {})",
                id,
                id.family(),
                id.family().needs_gradient()
            );
            functionals.insert(id, functional);
        }
        Ok(Self { functionals })
    }

    /// Look up a registered functional by any accepted spelling of its name.
    pub fn get(&self, name: &str) -> Result<&XcFunctional> {
        let id: FunctionalId = name.parse()?;
        self.functionals
            .get(&id)
            .ok_or_else(|| XcError::UnknownFunctional(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functionals.keys().map(FunctionalId::name).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.functionals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functionals.is_empty()
    }
}

fn load_functional(store: &ParameterStore, id: FunctionalId) -> Result<XcFunctional> {
    let family = id.family();
    if !id.is_neural() {
        let model = Arc::new(ConstantModel::new(family.reference_constants()));
        return XcFunctional::new(id.name(), family, model);
    }

    let name = id.name();
    let path = store.lookup(&id).ok_or_else(|| XcError::ModelLoad {
        name: name.clone(),
        path: PathBuf::new(),
        reason: "no parameter file configured".to_string(),
    })?;
    info!("Loading {} parameters from {}", name, path.display());

    let model: Arc<dyn EnhancementModel> = Arc::new(MlpModel::load(&name, &path)?);
    XcFunctional::new(name.clone(), family, model).map_err(|e| XcError::ModelLoad {
        name,
        path,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_params(dir: &Path, name: &str, outputs: usize) -> PathBuf {
        let hidden: Vec<Vec<f64>> = (0..4).map(|i| vec![0.1 * i as f64; 7]).collect();
        let head: Vec<Vec<f64>> = (0..outputs).map(|_| vec![0.01; 4]).collect();
        let (hidden_bias, head_bias) = (vec![0.0; 4], vec![0.0; outputs]);
        let json = serde_json::json!({
            "layers": [
                { "weights": hidden, "bias": hidden_bias, "activation": "tanh" },
                { "weights": head, "bias": head_bias }
            ]
        });
        let path = dir.join(name).join(PARAMETER_FILE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, json.to_string()).unwrap();
        path
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "NN_PBE".parse::<FunctionalId>().unwrap(),
            FunctionalId::Neural {
                family: ParentFunctional::Pbe,
                omega: None
            }
        );
        assert_eq!(
            "nn_xalpha_067".parse::<FunctionalId>().unwrap(),
            FunctionalId::Neural {
                family: ParentFunctional::XAlpha,
                omega: Some("067")
            }
        );
        assert_eq!(
            "xalpha".parse::<FunctionalId>().unwrap(),
            FunctionalId::Reference(ParentFunctional::XAlpha)
        );
        assert_eq!("Nn_Pbe_100".parse::<FunctionalId>().unwrap().name(), "NN_PBE_100");
    }

    #[test]
    fn test_every_omega_variant_round_trips() {
        for w in OMEGA_VARIANTS {
            for base in ["NN_PBE", "NN_XALPHA"] {
                let name = format!("{base}_{w}");
                assert_eq!(name.parse::<FunctionalId>().unwrap().name(), name);
            }
        }
    }

    #[test]
    fn test_unknown_names_rejected() {
        for bad in ["B3LYP", "NN_PBE_42", "NN_PBE067", "NN_", "NN_LDA", "", "PBE0"] {
            assert_eq!(
                bad.parse::<FunctionalId>().unwrap_err(),
                XcError::UnknownFunctional(bad.to_string()),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_store_lookup_prefers_explicit_entries() {
        let store = ParameterStore::from_directory("/models")
            .with_entries([("nn_pbe", "/elsewhere/pbe.json")])
            .unwrap();
        let pbe: FunctionalId = "NN_PBE".parse().unwrap();
        let xa: FunctionalId = "NN_XALPHA_18".parse().unwrap();
        assert_eq!(store.lookup(&pbe).unwrap(), PathBuf::from("/elsewhere/pbe.json"));
        assert_eq!(
            store.lookup(&xa).unwrap(),
            PathBuf::from("/models/NN_XALPHA_18/parameters.json")
        );
        assert!(ParameterStore::new().lookup(&xa).is_none());
    }

    #[test]
    fn test_store_rejects_unknown_entry() {
        let mut store = ParameterStore::new();
        assert!(matches!(
            store.insert("SCAN", "/tmp/scan.json"),
            Err(XcError::UnknownFunctional(_))
        ));
    }

    #[test]
    fn test_build_registry_from_directory() {
        let dir = TempDir::new().unwrap();
        write_params(dir.path(), "NN_PBE", 3);
        write_params(dir.path(), "NN_XALPHA_33", 1);
        let store = ParameterStore::from_directory(dir.path());

        let registry =
            FunctionalRegistry::build(&store, &["NN_PBE", "nn_xalpha_33", "PBE", "NN_PBE"]).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["NN_PBE", "NN_XALPHA_33", "PBE"]);

        let f = registry.get("nn_pbe").unwrap();
        assert_eq!(f.name(), "NN_PBE");
        assert_eq!(f.family(), ParentFunctional::Pbe);
    }

    #[test]
    fn test_get_unregistered_is_unknown() {
        let registry = FunctionalRegistry::build(&ParameterStore::new(), &["XAlpha"]).unwrap();
        assert!(registry.get("XALPHA").is_ok());
        assert_eq!(
            registry.get("PBE").unwrap_err(),
            XcError::UnknownFunctional("PBE".to_string())
        );
        assert!(matches!(
            registry.get("M06"),
            Err(XcError::UnknownFunctional(_))
        ));
    }

    #[test]
    fn test_missing_parameters_is_model_load_error() {
        let dir = TempDir::new().unwrap();
        let store = ParameterStore::from_directory(dir.path());
        let err = FunctionalRegistry::build(&store, &["NN_PBE_50"]).unwrap_err();
        match err {
            XcError::ModelLoad { name, path, .. } => {
                assert_eq!(name, "NN_PBE_50");
                assert!(path.ends_with("NN_PBE_50/parameters.json"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = FunctionalRegistry::build(&ParameterStore::new(), &["NN_PBE"]).unwrap_err();
        assert!(matches!(err, XcError::ModelLoad { .. }));
    }

    #[test]
    fn test_output_width_mismatch_is_model_load_error() {
        let dir = TempDir::new().unwrap();
        // an Xα-shaped model placed where a PBE model is expected
        write_params(dir.path(), "NN_PBE", 1);
        let store = ParameterStore::from_directory(dir.path());
        let err = FunctionalRegistry::build(&store, &["NN_PBE"]).unwrap_err();
        match err {
            XcError::ModelLoad { reason, .. } => assert!(reason.contains("enhancement model outputs")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
