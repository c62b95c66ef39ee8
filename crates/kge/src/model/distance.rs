//! Distance functions turning a translated head and a tail into an energy.
//!
//! Convention: lower energy = more plausible triple.

use std::fmt;
use std::str::FromStr;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::KgeError;

/// Added under the square root of the Euclidean distance so its gradient
/// stays finite at zero.
pub const EUCLIDEAN_EPS: f32 = 1e-3;

/// Distance between `head + relation` and `tail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    /// `sqrt(sum((a - b)^2) + eps)`.
    #[default]
    Euclidean,
    /// `sum((a - b)^2)`.
    SqEuclidean,
    /// `sum(|a - b|)`.
    Manhattan,
    /// `arccos(cos_sim(a, b)) / pi`, in [0, 1]. Evaluation only.
    Angular,
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Euclidean => write!(f, "euclidean"),
            Self::SqEuclidean => write!(f, "sq_euclidean"),
            Self::Manhattan => write!(f, "manhattan"),
            Self::Angular => write!(f, "angular"),
        }
    }
}

impl FromStr for Distance {
    type Err = KgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Ok(Self::Euclidean),
            "sq_euclidean" | "sqeuclidean" => Ok(Self::SqEuclidean),
            "manhattan" | "l1" => Ok(Self::Manhattan),
            "angular" => Ok(Self::Angular),
            other => Err(KgeError::InvalidConfig(format!("unknown distance '{other}'"))),
        }
    }
}

impl Distance {
    /// Whether the tensor form used by the trainer is available.
    pub fn supports_training(self) -> bool {
        !matches!(self, Self::Angular)
    }

    /// Energy of `(head + relation, tail)` without allocating the sum.
    pub fn translated(self, head: &[f32], relation: &[f32], tail: &[f32]) -> f32 {
        match self {
            Self::Euclidean => {
                let sq: f32 = zip3(head, relation, tail).map(|d| d * d).sum();
                (sq + EUCLIDEAN_EPS).sqrt()
            }
            Self::SqEuclidean => zip3(head, relation, tail).map(|d| d * d).sum(),
            Self::Manhattan => zip3(head, relation, tail).map(f32::abs).sum(),
            Self::Angular => {
                let lhs: Vec<f32> = head.iter().zip(relation).map(|(h, r)| h + r).collect();
                angular(&lhs, tail)
            }
        }
    }

    /// Energy between two arbitrary vectors.
    pub fn between(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Euclidean => {
                let sq: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                (sq + EUCLIDEAN_EPS).sqrt()
            }
            Self::SqEuclidean => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Self::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            Self::Angular => angular(a, b),
        }
    }

    /// Row-wise energy between `lhs` and `rhs`, both of shape `(batch, dim)`.
    ///
    /// Returns shape `(batch,)`. Angular distance has no tensor form.
    pub fn energy_tensor<B: Backend>(
        self,
        lhs: Tensor<B, 2>,
        rhs: Tensor<B, 2>,
    ) -> Result<Tensor<B, 1>, KgeError> {
        let diff = lhs - rhs;
        let energy = match self {
            Self::Euclidean => diff
                .powf_scalar(2.0)
                .sum_dim(1)
                .squeeze::<1>(1)
                .add_scalar(EUCLIDEAN_EPS)
                .sqrt(),
            Self::SqEuclidean => diff.powf_scalar(2.0).sum_dim(1).squeeze::<1>(1),
            Self::Manhattan => diff.abs().sum_dim(1).squeeze::<1>(1),
            Self::Angular => {
                return Err(KgeError::InvalidConfig(
                    "angular distance is only available for evaluation".to_string(),
                ))
            }
        };
        Ok(energy)
    }
}

fn zip3<'a>(h: &'a [f32], r: &'a [f32], t: &'a [f32]) -> impl Iterator<Item = f32> + 'a {
    h.iter().zip(r).zip(t).map(|((h, r), t)| h + r - t)
}

fn angular(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let cos = if na > 0.0 && nb > 0.0 { dot / (na * nb) } else { 0.0 };
    cos.clamp(-1.0, 1.0).acos() / std::f32::consts::PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_vector_distances() {
        let a = [0.0_f32, 0.0];
        let b = [3.0_f32, 4.0];
        assert!((Distance::SqEuclidean.between(&a, &b) - 25.0).abs() < 1e-6);
        assert!((Distance::Manhattan.between(&a, &b) - 7.0).abs() < 1e-6);
        let expected = (25.0_f32 + EUCLIDEAN_EPS).sqrt();
        assert!((Distance::Euclidean.between(&a, &b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_translated_matches_between() {
        let h = [0.5_f32, -1.0, 2.0];
        let r = [0.25_f32, 0.5, -1.0];
        let t = [1.0_f32, 0.0, 0.5];
        let lhs: Vec<f32> = h.iter().zip(&r).map(|(a, b)| a + b).collect();
        for d in [Distance::Euclidean, Distance::SqEuclidean, Distance::Manhattan, Distance::Angular] {
            let lhs_val = d.between(&lhs, &t);
            assert!((d.translated(&h, &r, &t) - lhs_val).abs() < 1e-5, "{d}");
        }
    }

    #[test]
    fn test_angular_range() {
        let x = [1.0_f32, 0.0];
        assert!(Distance::Angular.between(&x, &x).abs() < 1e-3);
        assert!((Distance::Angular.between(&x, &[0.0, 1.0]) - 0.5).abs() < 1e-6);
        assert!((Distance::Angular.between(&x, &[-1.0, 0.0]) - 1.0).abs() < 1e-6);
        // Zero vector has no direction: treated as orthogonal.
        assert!((Distance::Angular.between(&x, &[0.0, 0.0]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_from_str_and_display() {
        for d in [Distance::Euclidean, Distance::SqEuclidean, Distance::Manhattan, Distance::Angular] {
            assert_eq!(d.to_string().parse::<Distance>().unwrap(), d);
        }
        assert_eq!("L1".parse::<Distance>().unwrap(), Distance::Manhattan);
        assert!("cosine".parse::<Distance>().is_err());
    }

    #[test]
    fn test_energy_tensor_matches_vectors() {
        let device = Default::default();
        let lhs = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.0_f32, 0.0, 1.0, 1.0], [2, 2]),
            &device,
        );
        let rhs = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![3.0_f32, 4.0, 1.0, 2.0], [2, 2]),
            &device,
        );
        for d in [Distance::Euclidean, Distance::SqEuclidean, Distance::Manhattan] {
            let out = d.energy_tensor(lhs.clone(), rhs.clone()).unwrap();
            assert_eq!(out.dims(), [2]);
            let values = out.into_data().to_vec::<f32>().unwrap();
            assert!((values[0] - d.between(&[0.0, 0.0], &[3.0, 4.0])).abs() < 1e-5);
            assert!((values[1] - d.between(&[1.0, 1.0], &[1.0, 2.0])).abs() < 1e-5);
        }
        assert!(Distance::Angular.energy_tensor(lhs, rhs).is_err());
    }
}
