//! Adapter layer to the external nonlinear optimization engine.
//!
//! Factors and noise models are opaque tokens: they are constructed here,
//! carried through the graph unchanged, and only interpreted again by the
//! engine on the other side of this seam. The core never introspects them.

use std::collections::HashMap;

use nalgebra::{DMatrix, Isometry3, UnitQuaternion, Vector3};

use crate::core::error::{Error, Result};
use crate::engine::graph::vertices::VertexValue;

/// Opaque noise-model handle.
#[derive(Debug, Clone)]
pub struct NoiseModel(NoiseRepr);

#[derive(Debug, Clone)]
enum NoiseRepr {
    DiagonalSigmas(Vec<f64>),
    DiagonalVariances(Vec<f64>),
    Covariance(DMatrix<f64>),
}

impl NoiseModel {
    /// Diagonal Gaussian model from standard deviations.
    pub fn diagonal_sigmas(sigmas: &[f64]) -> Result<Self> {
        Self::check_positive(sigmas, "sigma")?;
        Ok(Self(NoiseRepr::DiagonalSigmas(sigmas.to_vec())))
    }

    /// Diagonal Gaussian model from variances.
    pub fn diagonal_variances(variances: &[f64]) -> Result<Self> {
        Self::check_positive(variances, "variance")?;
        Ok(Self(NoiseRepr::DiagonalVariances(variances.to_vec())))
    }

    /// Full Gaussian model from a covariance matrix.
    pub fn covariance(matrix: DMatrix<f64>) -> Result<Self> {
        if !matrix.is_square() {
            return Err(Error::InvalidArgument(format!(
                "covariance matrix is {}x{}, expected square",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        Ok(Self(NoiseRepr::Covariance(matrix)))
    }

    /// Dimension of the modeled noise.
    pub fn dim(&self) -> usize {
        match &self.0 {
            NoiseRepr::DiagonalSigmas(v) | NoiseRepr::DiagonalVariances(v) => v.len(),
            NoiseRepr::Covariance(m) => m.nrows(),
        }
    }

    fn check_positive(values: &[f64], label: &str) -> Result<()> {
        if values.is_empty() {
            return Err(Error::InvalidArgument(format!("empty {} vector", label)));
        }
        for value in values {
            if !value.is_finite() || *value <= 0.0 {
                return Err(Error::InvalidArgument(format!(
                    "non-positive {} {} in noise model",
                    label, value
                )));
            }
        }
        Ok(())
    }
}

/// Preintegrated inertial motion over one window, the payload of an IMU
/// odometry factor.
#[derive(Debug, Clone)]
pub struct ImuPreintegration {
    pub delta_rotation: UnitQuaternion<f64>,
    pub delta_velocity: Vector3<f64>,
    pub delta_position: Vector3<f64>,
    /// Integrated duration in seconds.
    pub duration: f64,
}

impl ImuPreintegration {
    pub fn identity() -> Self {
        Self {
            delta_rotation: UnitQuaternion::identity(),
            delta_velocity: Vector3::zeros(),
            delta_position: Vector3::zeros(),
            duration: 0.0,
        }
    }
}

/// Opaque factor handle.
#[derive(Debug, Clone)]
pub struct Factor(FactorRepr);

#[derive(Debug, Clone)]
enum FactorRepr {
    PriorPose {
        key: u64,
        pose: Isometry3<f64>,
        noise: NoiseModel,
    },
    BetweenPose {
        key_from: u64,
        key_to: u64,
        delta: Isometry3<f64>,
        noise: NoiseModel,
    },
    GnssPosition {
        key: u64,
        position: Vector3<f64>,
        noise: NoiseModel,
    },
    PreintegratedImu {
        keys_from: [u64; 3],
        keys_to: [u64; 3],
        delta: ImuPreintegration,
        noise: NoiseModel,
    },
}

impl Factor {
    pub fn prior_pose(key: u64, pose: Isometry3<f64>, noise: NoiseModel) -> Self {
        Self(FactorRepr::PriorPose { key, pose, noise })
    }

    pub fn between_pose(
        key_from: u64,
        key_to: u64,
        delta: Isometry3<f64>,
        noise: NoiseModel,
    ) -> Self {
        Self(FactorRepr::BetweenPose {
            key_from,
            key_to,
            delta,
            noise,
        })
    }

    pub fn gnss_position(key: u64, position: Vector3<f64>, noise: NoiseModel) -> Self {
        Self(FactorRepr::GnssPosition {
            key,
            position,
            noise,
        })
    }

    /// Combined IMU factor over (pose, velocity, bias) key triples.
    pub fn preintegrated_imu(
        keys_from: [u64; 3],
        keys_to: [u64; 3],
        delta: ImuPreintegration,
        noise: NoiseModel,
    ) -> Self {
        Self(FactorRepr::PreintegratedImu {
            keys_from,
            keys_to,
            delta,
            noise,
        })
    }

    /// Variable keys referenced by this factor, for engine-side bookkeeping.
    pub fn keys(&self) -> Vec<u64> {
        match &self.0 {
            FactorRepr::PriorPose { key, .. } | FactorRepr::GnssPosition { key, .. } => {
                vec![*key]
            }
            FactorRepr::BetweenPose {
                key_from, key_to, ..
            } => vec![*key_from, *key_to],
            FactorRepr::PreintegratedImu {
                keys_from, keys_to, ..
            } => keys_from.iter().chain(keys_to.iter()).copied().collect(),
        }
    }
}

/// The engine-side accumulation of factors, appended to on every
/// `Graph::add_edge` and consumed by the optimizer outside this core.
#[derive(Debug, Default)]
pub struct FactorCollection {
    factors: Vec<Factor>,
}

impl FactorCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a factor; returns its position in the collection.
    pub fn add(&mut self, factor: Factor) -> u64 {
        self.factors.push(factor);
        (self.factors.len() - 1) as u64
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Factor> {
        self.factors.iter()
    }
}

/// Optimized variable estimates, addressable by vertex index.
#[derive(Debug, Default)]
pub struct Values {
    entries: HashMap<u64, VertexValue>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: u64, value: VertexValue) {
        self.entries.insert(index, value);
    }

    pub fn get(&self, index: u64) -> Option<&VertexValue> {
        self.entries.get(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_model_rejects_non_positive_sigma() {
        assert!(NoiseModel::diagonal_sigmas(&[0.1, 0.0, 0.1]).is_err());
        assert!(NoiseModel::diagonal_sigmas(&[]).is_err());
        assert!(NoiseModel::diagonal_sigmas(&[0.1; 6]).is_ok());
    }

    #[test]
    fn test_factor_keys_cover_topology() {
        let noise = NoiseModel::diagonal_sigmas(&[0.1; 6]).unwrap();
        let factor = Factor::between_pose(3, 7, Isometry3::identity(), noise.clone());
        assert_eq!(factor.keys(), vec![3, 7]);

        let imu = Factor::preintegrated_imu(
            [0, 1, 2],
            [3, 4, 5],
            ImuPreintegration::identity(),
            noise,
        );
        assert_eq!(imu.keys(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_collection_indices_are_sequential() {
        let noise = NoiseModel::diagonal_variances(&[1.0; 3]).unwrap();
        let mut collection = FactorCollection::new();
        let first = collection.add(Factor::gnss_position(0, Vector3::zeros(), noise.clone()));
        let second = collection.add(Factor::gnss_position(1, Vector3::zeros(), noise));
        assert_eq!((first, second), (0, 1));
        assert_eq!(collection.len(), 2);
    }
}
