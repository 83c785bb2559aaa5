//! Density sample files
//!
//! A sample file holds the quadrature weights of a grid and the density data
//! on it, either spin-resolved (one `[density, gx, gy, gz, laplacian, tau]`
//! record per point and spin) or as closed-shell libxc arrays.

use color_eyre::eyre::{Result, WrapErr};
use nalgebra::{DMatrix, DVector};
use nn_xc::features::RAW_ROWS;
use nn_xc::DensityInput;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SampleDensity {
    SpinResolved {
        rho_a: Vec<[f64; RAW_ROWS]>,
        rho_b: Vec<[f64; RAW_ROWS]>,
    },
    Libxc {
        rho: Vec<f64>,
        sigma: Vec<f64>,
        tau: Vec<f64>,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SampleFile {
    pub weights: Vec<f64>,
    #[serde(flatten)]
    pub density: SampleDensity,
}

/// Grid weights plus the density input handed to the functional.
#[derive(Debug, Clone)]
pub struct DensitySamples {
    pub weights: Vec<f64>,
    pub input: DensityInput,
}

impl From<SampleFile> for DensitySamples {
    fn from(file: SampleFile) -> Self {
        let input = match file.density {
            SampleDensity::SpinResolved { rho_a, rho_b } => DensityInput::SpinResolved {
                rho_a: spin_matrix(&rho_a),
                rho_b: spin_matrix(&rho_b),
            },
            SampleDensity::Libxc { rho, sigma, tau } => DensityInput::Libxc {
                rho: DVector::from_vec(rho),
                sigma: DVector::from_vec(sigma),
                tau: DVector::from_vec(tau),
            },
        };
        DensitySamples {
            weights: file.weights,
            input,
        }
    }
}

/// Per-point records become the columns of a `6 x N` matrix.
fn spin_matrix(points: &[[f64; RAW_ROWS]]) -> DMatrix<f64> {
    DMatrix::from_fn(RAW_ROWS, points.len(), |r, c| points[c][r])
}

pub fn parse_samples(content: &str) -> Result<DensitySamples> {
    let file: SampleFile = serde_json::from_str(content)?;
    Ok(file.into())
}

pub fn load_samples(path: &Path) -> Result<DensitySamples> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read sample file: {}", path.display()))?;
    parse_samples(&content)
        .wrap_err_with(|| format!("Failed to parse sample file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spin_resolved_samples() {
        let json = r#"{
            "weights": [0.5, 0.25],
            "rho_a": [[0.3, 0.1, 0.0, 0.0, 0.0, 0.4], [0.2, 0.0, 0.1, 0.0, 0.0, 0.3]],
            "rho_b": [[0.1, 0.0, 0.0, 0.2, 0.0, 0.1], [0.0, 0.0, 0.0, 0.0, 0.0, 0.0]]
        }"#;
        let samples = parse_samples(json).unwrap();
        assert_eq!(samples.weights, vec![0.5, 0.25]);
        match samples.input {
            DensityInput::SpinResolved { rho_a, rho_b } => {
                assert_eq!(rho_a.shape(), (6, 2));
                assert_eq!(rho_a[(0, 1)], 0.2);
                assert_eq!(rho_a[(5, 0)], 0.4);
                assert_eq!(rho_b[(3, 0)], 0.2);
            }
            other => panic!("unexpected input {other:?}"),
        }
    }

    #[test]
    fn test_libxc_samples() {
        let json = r#"{"weights": [1.0], "rho": [0.2], "sigma": [0.01], "tau": [0.3]}"#;
        let samples = parse_samples(json).unwrap();
        assert_eq!(samples.input.kind(), "libxc");
        assert_eq!(samples.input.num_points(), 1);
    }

    #[test]
    fn test_short_record_rejected() {
        let json = r#"{"weights": [1.0], "rho_a": [[0.3, 0.1]], "rho_b": [[0.1, 0.0]]}"#;
        assert!(parse_samples(json).is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_samples(Path::new("/nonexistent/h2o.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/h2o.json"));
    }
}
