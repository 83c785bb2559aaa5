//! Property tests for the numerical invariants of the pipeline

use nalgebra::{DMatrix, DVector};
use nn_xc::model::{Activation, LayerParameters};
use nn_xc::{
    build_features, dimensionless_inputs, ConstantModel, DensityInput, EvalMode, MlpModel,
    MlpParameters, ParentFunctional, XcFunctional,
};
use proptest::prelude::*;
use std::sync::Arc;

const FAMILIES: [ParentFunctional; 2] = [ParentFunctional::Pbe, ParentFunctional::XAlpha];

fn reference(family: ParentFunctional) -> XcFunctional {
    let model = Arc::new(ConstantModel::new(family.reference_constants()));
    XcFunctional::new(family.as_str(), family, model).unwrap()
}

/// One hidden layer with fixed weights, so the constants vary with the inputs.
fn learned(family: ParentFunctional) -> XcFunctional {
    let k = family.constants_width();
    let reference = family.reference_constants();
    let params = MlpParameters {
        input_width: 7,
        layers: vec![
            LayerParameters {
                weights: (0..5)
                    .map(|i| (0..7).map(|j| ((i * 7 + j) as f64 * 0.37).sin() * 0.4).collect())
                    .collect(),
                bias: vec![0.05, -0.1, 0.0, 0.2, -0.05],
                activation: Activation::Softplus,
            },
            LayerParameters {
                weights: (0..k).map(|i| vec![0.1 * (i as f64 + 1.0); 5]).collect(),
                bias: vec![0.0; k],
                activation: Activation::Tanh,
            },
        ],
        output_scale: Some(reference.iter().map(|c| 0.2 * c).collect()),
        output_shift: Some(reference),
    };
    let model = Arc::new(MlpModel::from_parameters(params).unwrap());
    XcFunctional::new(format!("learned {family}"), family, model).unwrap()
}

/// Non-negative density that hits exact zero often.
fn density() -> impl Strategy<Value = f64> {
    prop_oneof![1 => Just(0.0), 4 => 0.0..10.0f64, 1 => 1e-12..1e-6f64]
}

fn spin_channel() -> impl Strategy<Value = [f64; 6]> {
    (density(), prop::array::uniform3(-5.0..5.0f64), 0.0..20.0f64)
        .prop_map(|(rho, g, tau)| [rho, g[0], g[1], g[2], 0.0, tau])
}

fn spin_input(points: &[([f64; 6], [f64; 6])]) -> DensityInput {
    DensityInput::SpinResolved {
        rho_a: DMatrix::from_fn(6, points.len(), |r, c| points[c].0[r]),
        rho_b: DMatrix::from_fn(6, points.len(), |r, c| points[c].1[r]),
    }
}

fn close(a: f64, b: f64, rel: f64) -> bool {
    (a - b).abs() <= rel * a.abs().max(b.abs()).max(1e-300)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Any non-negative densities, including exact zeros, give finite inputs in [-1, 1].
    #[test]
    fn prop_transform_is_finite(points in prop::collection::vec((spin_channel(), spin_channel()), 1..16)) {
        let features = build_features(&spin_input(&points), EvalMode::SpinResolved).unwrap();
        let inputs = dimensionless_inputs(&features).unwrap();
        for row in inputs.rows() {
            for x in row {
                prop_assert!(x.is_finite());
                prop_assert!(x.value() >= -1.0 && x.value() <= 1.0);
            }
        }
    }

    /// norm_grad = norm_grad_a + norm_grad_b + 2 norm_grad_ab
    #[test]
    fn prop_cross_gradient_identity(a in spin_channel(), b in spin_channel()) {
        let features = build_features(&spin_input(&[(a, b)]), EvalMode::SpinResolved).unwrap();
        let p = features.points()[0];
        let lhs = p.norm_grad.value();
        let rhs = p.norm_grad_a.value() + p.norm_grad_b.value() + 2.0 * p.norm_grad_ab.value();
        prop_assert!((lhs - rhs).abs() <= 1e-12 * lhs.abs().max(1.0), "{} vs {}", lhs, rhs);

        let dot = a[1] * b[1] + a[2] * b[2] + a[3] * b[3];
        prop_assert!((p.norm_grad_ab.value() - dot).abs() <= 1e-12 * lhs.abs().max(1.0));
    }

    /// Aggregate input equals the spin-resolved path under an even split.
    #[test]
    fn prop_aggregate_matches_even_split(
        rho in density(),
        g in prop::array::uniform3(-5.0..5.0f64),
        tau in 0.0..20.0f64,
    ) {
        let half = [rho / 2.0, g[0] / 2.0, g[1] / 2.0, g[2] / 2.0, 0.0, tau / 2.0];
        let sigma = g[0] * g[0] + g[1] * g[1] + g[2] * g[2];
        let libxc = DensityInput::Libxc {
            rho: DVector::from_vec(vec![rho]),
            sigma: DVector::from_vec(vec![sigma]),
            tau: DVector::from_vec(vec![tau]),
        };
        let spin = spin_input(&[(half, half)]);

        for family in FAMILIES {
            let functional = learned(family);
            let a = functional.evaluate(&libxc, EvalMode::Libxc).unwrap();
            let b = functional.evaluate(&spin, EvalMode::SpinResolved).unwrap();
            prop_assert!(close(a.vxc[0], b.vxc[0], 1e-10), "{}: {} vs {}", family, a.vxc[0], b.vxc[0]);
            prop_assert!(close(a.local_xc[0], b.local_xc[0], 1e-10));
            for key in ["rho_a", "rho_b", "tau_a", "tau_b", "norm_grad"] {
                let (x, y) = (a.features.values(key).unwrap()[0], b.features.values(key).unwrap()[0]);
                prop_assert!(close(x, y, 1e-12), "{}: {} vs {}", key, x, y);
            }
        }
    }

    /// local_xc = vxc * (rho_a + rho_b) holds exactly and the potential is finite.
    #[test]
    fn prop_energy_density_identity(points in prop::collection::vec((spin_channel(), spin_channel()), 1..16)) {
        let input = spin_input(&points);
        for family in FAMILIES {
            for functional in [reference(family), learned(family)] {
                let result = functional.evaluate(&input, EvalMode::SpinResolved).unwrap();
                for (i, (a, b)) in points.iter().enumerate() {
                    prop_assert_eq!(result.local_xc[i], result.vxc[i] * (a[0] + b[0]));
                    let v = result.potential[i];
                    prop_assert!(v.vrho.iter().chain(&v.vsigma).chain(&v.vtau).all(|x| x.is_finite()));
                }
            }
        }
    }
}
