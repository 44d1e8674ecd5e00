//! Imposed strain loads
//!
//! Strain loads never produce nodal forces directly; they increment the
//! initial deformation of the sections they reach.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::deformation::DeformationPlane;
use crate::error::{FEAError, FEAResult};
use crate::response::ResponseId;

/// Axial strain imposed at the two ends of a bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrussStrainLoad {
    /// Strain at the first node
    pub e1: f64,
    /// Strain at the second node
    pub e2: f64,
}

impl TrussStrainLoad {
    pub fn new(e1: f64, e2: f64) -> Self {
        Self { e1, e2 }
    }

    /// Uniform thermal-type strain
    pub fn uniform(e: f64) -> Self {
        Self::new(e, e)
    }

    /// Strain applied to the single section of a bar
    pub fn mean_strain(&self, factor: f64) -> f64 {
        0.5 * (self.e1 + self.e2) * factor
    }
}

/// Deformation planes imposed at the back (first node) and front (second
/// node) ends of a beam
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamStrainLoad {
    pub back: DeformationPlane,
    pub front: DeformationPlane,
}

impl BeamStrainLoad {
    pub fn new(back: DeformationPlane, front: DeformationPlane) -> Self {
        Self { back, front }
    }

    /// Same plane at both ends
    pub fn uniform(plane: DeformationPlane) -> Self {
        Self::new(plane, plane)
    }

    /// Section deformation at the relative position `xi` in [0, 1], laid out
    /// as `codes` and scaled by `factor`
    pub fn section_deformation(&self, xi: f64, codes: &ResponseId, factor: f64) -> DVector<f64> {
        self.back.lerp(&self.front, xi).scaled(factor).extract(codes)
    }
}

/// Generalized strains imposed at each integration point of a shell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellStrainLoad {
    strains: Vec<DVector<f64>>,
}

impl ShellStrainLoad {
    pub fn new(strains: Vec<DVector<f64>>) -> FEAResult<Self> {
        if strains.is_empty() {
            return Err(FEAError::InvalidInput(
                "shell strain load needs at least one integration point".to_string(),
            ));
        }
        Ok(Self { strains })
    }

    /// The same generalized strain at `n` integration points
    pub fn uniform(n: usize, strain: DVector<f64>) -> FEAResult<Self> {
        Self::new(vec![strain; n])
    }

    /// Integration points covered by the load
    pub fn num_points(&self) -> usize {
        self.strains.len()
    }

    /// Strains scaled by `factor`, one per point
    pub fn scaled_strains(&self, factor: f64) -> Vec<DVector<f64>> {
        self.strains.iter().map(|e| e * factor).collect()
    }
}
