//! Generalized deformation values and deformation planes
//!
//! A [`GeneralizedDeformation`] is a vector whose components are tagged by
//! response codes. A [`DeformationPlane`] is the canonical representation of
//! a plane-sections-remain-plane strain field over a bar cross section,
//! from which any section layout can pull the components it understands.

use nalgebra::{DVector, Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};
use crate::response::{ResponseCode, ResponseId};

/// Squared distance below which two reference points are considered too close
const POSITION_TOL2: f64 = 1e-3;

/// A generalized strain (or stress) vector tagged by response codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralizedDeformation {
    values: DVector<f64>,
    codes: ResponseId,
}

impl GeneralizedDeformation {
    /// Create a tagged vector; the lengths must agree
    pub fn new(values: DVector<f64>, codes: ResponseId) -> FEAResult<Self> {
        if values.len() != codes.len() {
            return Err(FEAError::OrderMismatch {
                expected: codes.len(),
                got: values.len(),
            });
        }
        Ok(Self { values, codes })
    }

    pub fn zeros(codes: ResponseId) -> Self {
        Self {
            values: DVector::zeros(codes.len()),
            codes,
        }
    }

    /// Components in layout order
    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    /// Layout of the components
    pub fn codes(&self) -> &ResponseId {
        &self.codes
    }

    pub fn order(&self) -> usize {
        self.values.len()
    }

    /// Sum of every component carrying `code` (zero when absent)
    pub fn component(&self, code: ResponseCode) -> f64 {
        self.codes.positions(code).map(|i| self.values[i]).sum()
    }

    /// Map the components into the layout `target`.
    ///
    /// Each output slot receives the sum of the source components with the
    /// same code; codes the source does not carry come out as zero.
    pub fn extract(&self, target: &ResponseId) -> DVector<f64> {
        DVector::from_iterator(target.len(), target.iter().map(|c| self.component(c)))
    }

    /// Re-tag the vector into another layout
    pub fn remap(&self, target: &ResponseId) -> Self {
        Self {
            values: self.extract(target),
            codes: target.clone(),
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            values: &self.values * factor,
            codes: self.codes.clone(),
        }
    }

    /// Add two deformations.
    ///
    /// Identical layouts add component-wise. Otherwise every code of `other`
    /// must exist in `self` and is added by code.
    pub fn combine(&self, other: &GeneralizedDeformation) -> FEAResult<Self> {
        if self.codes == other.codes {
            return Ok(Self {
                values: &self.values + &other.values,
                codes: self.codes.clone(),
            });
        }
        if let Some(missing) = other.codes.iter().find(|c| !self.codes.contains(*c)) {
            return Err(FEAError::InvalidInput(format!(
                "cannot combine {} into {}: code {missing} is not present",
                other.codes, self.codes
            )));
        }
        let mut values = self.values.clone();
        for (j, code) in other.codes.iter().enumerate() {
            if let Some(i) = self.codes.position(code) {
                values[i] += other.values[j];
            }
        }
        Ok(Self {
            values,
            codes: self.codes.clone(),
        })
    }
}

/// Plane strain field `eps(y, z) = eps0 + ky*y + kz*z` over a cross section
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeformationPlane {
    /// Strain at the section origin
    pub eps0: f64,
    /// Strain gradient along local y
    pub ky: f64,
    /// Strain gradient along local z
    pub kz: f64,
}

impl DeformationPlane {
    pub fn new(eps0: f64, ky: f64, kz: f64) -> Self {
        Self { eps0, ky, kz }
    }

    /// Uniform strain over the whole section
    pub fn constant(eps: f64) -> Self {
        Self::new(eps, 0.0, 0.0)
    }

    /// Build the plane from a generalized deformation ordered (P, Mz, My)
    pub fn from_generalized(def: &Vector3<f64>) -> Self {
        Self::new(def[0], def[1], def[2])
    }

    /// Plane passing through three (y, z, strain) points
    pub fn through_points(points: [(f64, f64, f64); 3]) -> FEAResult<Self> {
        for i in 0..3 {
            for j in (i + 1)..3 {
                let dy = points[i].0 - points[j].0;
                let dz = points[i].1 - points[j].1;
                if dy * dy + dz * dz < POSITION_TOL2 {
                    log::warn!(
                        "deformation plane: points {} and {} are too close to each other",
                        i + 1,
                        j + 1
                    );
                }
            }
        }
        #[rustfmt::skip]
        let a = Matrix3::new(
            1.0, points[0].0, points[0].1,
            1.0, points[1].0, points[1].1,
            1.0, points[2].0, points[2].1,
        );
        let rhs = Vector3::new(points[0].2, points[1].2, points[2].2);
        let coeffs = a.lu().solve(&rhs).ok_or_else(|| {
            FEAError::InvalidGeometry("deformation plane points are aligned".to_string())
        })?;
        Ok(Self::new(coeffs[0], coeffs[1], coeffs[2]))
    }

    pub fn strain_at(&self, y: f64, z: f64) -> f64 {
        self.eps0 + self.ky * y + self.kz * z
    }

    /// Generalized deformation (P, Mz, My) of the plane
    pub fn deformation(&self) -> Vector3<f64> {
        let e0 = self.strain_at(0.0, 0.0);
        Vector3::new(e0, self.strain_at(1.0, 0.0) - e0, self.strain_at(0.0, 1.0) - e0)
    }

    /// Components of the plane in the layout `codes`.
    ///
    /// P takes the axial strain, Mz and My the two curvatures; any other code
    /// gets zero. Repeated codes add up.
    pub fn extract(&self, codes: &ResponseId) -> DVector<f64> {
        let def = self.deformation();
        let mut retval = DVector::zeros(codes.len());
        for (i, code) in codes.iter().enumerate() {
            match code {
                ResponseCode::P => retval[i] += def[0],
                ResponseCode::Mz => retval[i] += def[1],
                ResponseCode::My => retval[i] += def[2],
                _ => {}
            }
        }
        retval
    }

    /// Linear interpolation between `self` (t = 0) and `other` (t = 1)
    pub fn lerp(&self, other: &DeformationPlane, t: f64) -> Self {
        Self::new(
            self.eps0 + (other.eps0 - self.eps0) * t,
            self.ky + (other.ky - self.ky) * t,
            self.kz + (other.kz - self.kz) * t,
        )
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.eps0 * factor, self.ky * factor, self.kz * factor)
    }
}
