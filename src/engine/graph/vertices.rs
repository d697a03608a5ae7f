//! Graph vertices: estimated quantities at a point in time.

use nalgebra::{Isometry3, Point3, Vector3};

use crate::backend::Values;
use crate::core::error::{Error, Result};

/// Type tag of a vertex, used for bucket lookup and temporal association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    Pose,
    Velocity,
    NavState,
    ImuBias,
    Landmark,
    Feature,
}

impl std::fmt::Display for VertexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VertexKind::Pose => "pose",
            VertexKind::Velocity => "velocity",
            VertexKind::NavState => "nav_state",
            VertexKind::ImuBias => "imu_bias",
            VertexKind::Landmark => "landmark",
            VertexKind::Feature => "feature",
        };
        f.write_str(label)
    }
}

/// Current estimate held by a vertex.
///
/// `Feature` vertices are graph members but excluded from optimization;
/// everything else is overwritten by [`Vertex::update`] with the
/// optimizer's result.
#[derive(Debug, Clone)]
pub enum VertexValue {
    Pose(Isometry3<f64>),
    Velocity(Vector3<f64>),
    NavState {
        pose: Isometry3<f64>,
        velocity: Vector3<f64>,
    },
    ImuBias {
        accelerometer: Vector3<f64>,
        gyroscope: Vector3<f64>,
    },
    Landmark(Point3<f64>),
    Feature(Vec<f64>),
}

impl VertexValue {
    pub fn kind(&self) -> VertexKind {
        match self {
            VertexValue::Pose(_) => VertexKind::Pose,
            VertexValue::Velocity(_) => VertexKind::Velocity,
            VertexValue::NavState { .. } => VertexKind::NavState,
            VertexValue::ImuBias { .. } => VertexKind::ImuBias,
            VertexValue::Landmark(_) => VertexKind::Landmark,
            VertexValue::Feature(_) => VertexKind::Feature,
        }
    }

    /// Neutral initial estimate for a freshly allocated vertex.
    pub fn default_for(kind: VertexKind) -> Self {
        match kind {
            VertexKind::Pose => VertexValue::Pose(Isometry3::identity()),
            VertexKind::Velocity => VertexValue::Velocity(Vector3::zeros()),
            VertexKind::NavState => VertexValue::NavState {
                pose: Isometry3::identity(),
                velocity: Vector3::zeros(),
            },
            VertexKind::ImuBias => VertexValue::ImuBias {
                accelerometer: Vector3::zeros(),
                gyroscope: Vector3::zeros(),
            },
            VertexKind::Landmark => VertexValue::Landmark(Point3::origin()),
            VertexKind::Feature => VertexValue::Feature(Vec::new()),
        }
    }
}

/// A graph node: globally unique index, timestamp and current estimate.
#[derive(Debug, Clone)]
pub struct Vertex {
    index: u64,
    timestamp: i64,
    value: VertexValue,
}

impl Vertex {
    pub fn new(index: u64, timestamp: i64, value: VertexValue) -> Self {
        Self {
            index,
            timestamp,
            value,
        }
    }

    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    #[inline]
    pub fn value(&self) -> &VertexValue {
        &self.value
    }

    pub fn kind(&self) -> VertexKind {
        self.value.kind()
    }

    /// Whether the optimizer may overwrite this vertex's estimate.
    pub fn is_optimizable(&self) -> bool {
        !matches!(self.value, VertexValue::Feature(_))
    }

    /// Replace the estimate with this vertex's slice of an optimization
    /// result. Returns false when the result holds no entry for this
    /// index; a kind-mismatched entry is a fatal wiring bug.
    pub fn update(&mut self, values: &Values) -> Result<bool> {
        let Some(updated) = values.get(self.index) else {
            return Ok(false);
        };
        if updated.kind() != self.kind() {
            return Err(Error::TypeMismatch(format!(
                "optimizer returned {} for vertex {} of kind {}",
                updated.kind(),
                self.index,
                self.kind()
            )));
        }
        self.value = updated.clone();
        Ok(true)
    }

    /// Overwrite the estimate directly, bypassing the optimizer path.
    /// Used for non-optimizable vertices (e.g. re-triangulated features).
    pub fn set_value(&mut self, value: VertexValue) -> Result<()> {
        if value.kind() != self.kind() {
            return Err(Error::TypeMismatch(format!(
                "cannot change vertex {} from {} to {}",
                self.index,
                self.kind(),
                value.kind()
            )));
        }
        self.value = value;
        Ok(())
    }
}
