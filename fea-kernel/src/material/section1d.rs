//! One-component section backed by a uniaxial material

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::uniaxial::{UniaxialMaterial, UniaxialModel};
use super::{check_common_shapes, check_order, ConstitutiveModel};
use crate::error::{FEAError, FEAResult};
use crate::response::{ResponseCode, ResponseId};

/// Section of order 1 whose only component carries a single response code.
///
/// For a truss `P` maps the axial strain to the axial force, so the
/// material's stress is the section force and its modulus is `EA`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section1d {
    material: UniaxialModel,
    codes: ResponseId,
    rho: f64,
    trial: DVector<f64>,
    committed: DVector<f64>,
    initial: DVector<f64>,
    stress: DVector<f64>,
    tangent: DMatrix<f64>,
    initial_tangent: DMatrix<f64>,
}

impl Section1d {
    pub fn new(material: UniaxialModel, code: ResponseCode) -> Self {
        let mut section = Self {
            codes: ResponseId::new(vec![code]),
            rho: 0.0,
            trial: DVector::zeros(1),
            committed: DVector::zeros(1),
            initial: DVector::zeros(1),
            stress: DVector::zeros(1),
            tangent: DMatrix::zeros(1, 1),
            initial_tangent: DMatrix::from_element(1, 1, material.initial_tangent()),
            material,
        };
        section.refresh();
        section
    }

    /// Set the mass per unit length
    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    /// Uniaxial law behind the single component
    pub fn material(&self) -> &UniaxialModel {
        &self.material
    }

    fn refresh(&mut self) {
        self.stress[0] = self.material.stress();
        self.tangent[(0, 0)] = self.material.tangent();
    }

    fn evaluate(&mut self) -> FEAResult<()> {
        let result = self.material.set_trial_strain(self.trial[0] - self.initial[0]);
        self.refresh();
        result
    }
}

impl ConstitutiveModel for Section1d {
    fn response_type(&self) -> &ResponseId {
        &self.codes
    }

    fn set_trial_deformation(&mut self, def: &DVector<f64>) -> FEAResult<()> {
        check_order(1, def)?;
        self.trial[0] = def[0];
        self.evaluate()
    }

    fn trial_deformation(&self) -> &DVector<f64> {
        &self.trial
    }

    fn initial_deformation(&self) -> &DVector<f64> {
        &self.initial
    }

    fn set_initial_deformation(&mut self, def: &DVector<f64>) -> FEAResult<()> {
        check_order(1, def)?;
        self.initial[0] = def[0];
        self.evaluate()
    }

    fn zero_initial_deformation(&mut self) {
        self.initial[0] = 0.0;
        // Re-evaluating an already accepted strain cannot fail for the
        // uniaxial laws in this crate.
        let _ = self.evaluate();
    }

    fn stress(&self) -> &DVector<f64> {
        &self.stress
    }

    fn tangent(&self) -> &DMatrix<f64> {
        &self.tangent
    }

    fn initial_tangent(&self) -> &DMatrix<f64> {
        &self.initial_tangent
    }

    fn commit_state(&mut self) -> FEAResult<()> {
        self.material.commit_state()?;
        self.committed.copy_from(&self.trial);
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> FEAResult<()> {
        self.material.revert_to_last_commit()?;
        self.trial.copy_from(&self.committed);
        self.refresh();
        Ok(())
    }

    fn revert_to_start(&mut self) -> FEAResult<()> {
        self.material.revert_to_start()?;
        self.trial.fill(0.0);
        self.committed.fill(0.0);
        self.initial.fill(0.0);
        self.refresh();
        Ok(())
    }

    fn rho(&self) -> f64 {
        self.rho
    }

    fn check_shapes(&self) -> FEAResult<()> {
        if self.codes.len() != 1 {
            return Err(FEAError::OrderMismatch {
                expected: 1,
                got: self.codes.len(),
            });
        }
        check_common_shapes(self)?;
        check_order(1, &self.committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{ElasticPerfectlyPlastic, ElasticUniaxial};
    use approx::assert_relative_eq;

    #[test]
    fn test_initial_strain_shifts_response() {
        let mut s = Section1d::new(ElasticUniaxial::new(1000.0).unwrap().into(), ResponseCode::P);
        s.set_initial_deformation(&DVector::from_element(1, 0.002)).unwrap();
        s.set_trial_deformation(&DVector::from_element(1, 0.003)).unwrap();
        assert_relative_eq!(s.stress()[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(s.deformation()[0], 0.001, epsilon = 1e-15);
        assert_relative_eq!(s.stress_resultant(ResponseCode::P), 1.0, epsilon = 1e-12);
        assert_eq!(s.stress_resultant(ResponseCode::Mz), 0.0);
    }

    #[test]
    fn test_plastic_flexibility() {
        let mut s = Section1d::new(
            ElasticPerfectlyPlastic::new(10.0, 1.0).unwrap().into(),
            ResponseCode::P,
        );
        assert_relative_eq!(s.flexibility().unwrap()[(0, 0)], 0.1);
        s.set_trial_deformation(&DVector::from_element(1, 1.0)).unwrap();
        assert_eq!(s.flexibility().unwrap()[(0, 0)], 1.0e12);
        assert_relative_eq!(s.initial_flexibility().unwrap()[(0, 0)], 0.1);
    }
}
