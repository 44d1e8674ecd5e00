//! Uniaxial stress-strain materials

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Scalar stress-strain law with commit/revert semantics
pub trait UniaxialMaterial {
    /// Evaluate the law at `strain` (already net of any initial strain)
    fn set_trial_strain(&mut self, strain: f64) -> FEAResult<()>;
    fn strain(&self) -> f64;
    fn stress(&self) -> f64;
    fn tangent(&self) -> f64;
    fn initial_tangent(&self) -> f64;
    fn commit_state(&mut self) -> FEAResult<()>;
    fn revert_to_last_commit(&mut self) -> FEAResult<()>;
    fn revert_to_start(&mut self) -> FEAResult<()>;
}

/// Linear elastic material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticUniaxial {
    e: f64,
    trial_strain: f64,
    committed_strain: f64,
}

impl ElasticUniaxial {
    pub fn new(e: f64) -> FEAResult<Self> {
        if !(e > 0.0) {
            return Err(FEAError::InvalidInput(format!(
                "elastic modulus must be positive, got {e}"
            )));
        }
        Ok(Self {
            e,
            trial_strain: 0.0,
            committed_strain: 0.0,
        })
    }

    /// Elastic modulus
    pub fn modulus(&self) -> f64 {
        self.e
    }
}

impl UniaxialMaterial for ElasticUniaxial {
    fn set_trial_strain(&mut self, strain: f64) -> FEAResult<()> {
        self.trial_strain = strain;
        Ok(())
    }

    fn strain(&self) -> f64 {
        self.trial_strain
    }

    fn stress(&self) -> f64 {
        self.e * self.trial_strain
    }

    fn tangent(&self) -> f64 {
        self.e
    }

    fn initial_tangent(&self) -> f64 {
        self.e
    }

    fn commit_state(&mut self) -> FEAResult<()> {
        self.committed_strain = self.trial_strain;
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> FEAResult<()> {
        self.trial_strain = self.committed_strain;
        Ok(())
    }

    fn revert_to_start(&mut self) -> FEAResult<()> {
        self.trial_strain = 0.0;
        self.committed_strain = 0.0;
        Ok(())
    }
}

/// Elastic-perfectly plastic material with independent tension and
/// compression yield stresses.
///
/// The plastic strain `ep` only moves on commit, so repeated trial
/// evaluations inside one step never accumulate plastic flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticPerfectlyPlastic {
    e: f64,
    /// Tension yield stress (positive)
    fyp: f64,
    /// Compression yield stress (negative)
    fyn: f64,
    /// Committed plastic strain
    ep: f64,
    trial_strain: f64,
    trial_stress: f64,
    trial_tangent: f64,
    committed_strain: f64,
    committed_stress: f64,
    committed_tangent: f64,
}

impl ElasticPerfectlyPlastic {
    /// Symmetric yield stress `fy` in tension and compression
    pub fn new(e: f64, fy: f64) -> FEAResult<Self> {
        Self::asymmetric(e, fy, -fy)
    }

    pub fn asymmetric(e: f64, fyp: f64, fyn: f64) -> FEAResult<Self> {
        if !(e > 0.0) {
            return Err(FEAError::InvalidInput(format!(
                "elastic modulus must be positive, got {e}"
            )));
        }
        if !(fyp > 0.0 && fyn < 0.0) {
            return Err(FEAError::InvalidInput(format!(
                "yield stresses must satisfy fyp > 0 > fyn, got {fyp} and {fyn}"
            )));
        }
        Ok(Self {
            e,
            fyp,
            fyn,
            ep: 0.0,
            trial_strain: 0.0,
            trial_stress: 0.0,
            trial_tangent: e,
            committed_strain: 0.0,
            committed_stress: 0.0,
            committed_tangent: e,
        })
    }

    /// Committed plastic strain
    pub fn plastic_strain(&self) -> f64 {
        self.ep
    }

    fn evaluate(&mut self) {
        let sig = self.e * (self.trial_strain - self.ep);
        let f = if sig >= 0.0 { sig - self.fyp } else { self.fyn - sig };
        if f <= -self.e * f64::EPSILON {
            self.trial_stress = sig;
            self.trial_tangent = self.e;
        } else {
            self.trial_stress = if sig > 0.0 { self.fyp } else { self.fyn };
            self.trial_tangent = 0.0;
        }
    }
}

impl UniaxialMaterial for ElasticPerfectlyPlastic {
    fn set_trial_strain(&mut self, strain: f64) -> FEAResult<()> {
        self.trial_strain = strain;
        self.evaluate();
        Ok(())
    }

    fn strain(&self) -> f64 {
        self.trial_strain
    }

    fn stress(&self) -> f64 {
        self.trial_stress
    }

    fn tangent(&self) -> f64 {
        self.trial_tangent
    }

    fn initial_tangent(&self) -> f64 {
        self.e
    }

    fn commit_state(&mut self) -> FEAResult<()> {
        let sig = self.e * (self.trial_strain - self.ep);
        if sig > self.fyp {
            self.ep += (sig - self.fyp) / self.e;
        } else if sig < self.fyn {
            self.ep += (sig - self.fyn) / self.e;
        }
        if self.ep != 0.0 {
            log::debug!("elastic-perfectly plastic: committed plastic strain {:e}", self.ep);
        }
        self.committed_strain = self.trial_strain;
        self.committed_stress = self.trial_stress;
        self.committed_tangent = self.trial_tangent;
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> FEAResult<()> {
        self.trial_strain = self.committed_strain;
        self.trial_stress = self.committed_stress;
        self.trial_tangent = self.committed_tangent;
        Ok(())
    }

    fn revert_to_start(&mut self) -> FEAResult<()> {
        *self = Self::asymmetric(self.e, self.fyp, self.fyn)?;
        Ok(())
    }
}

/// Closed set of uniaxial materials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UniaxialModel {
    Elastic(ElasticUniaxial),
    ElasticPerfectlyPlastic(ElasticPerfectlyPlastic),
}

impl UniaxialModel {
    fn inner(&self) -> &dyn UniaxialMaterial {
        match self {
            UniaxialModel::Elastic(m) => m,
            UniaxialModel::ElasticPerfectlyPlastic(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn UniaxialMaterial {
        match self {
            UniaxialModel::Elastic(m) => m,
            UniaxialModel::ElasticPerfectlyPlastic(m) => m,
        }
    }
}

impl UniaxialMaterial for UniaxialModel {
    fn set_trial_strain(&mut self, strain: f64) -> FEAResult<()> {
        self.inner_mut().set_trial_strain(strain)
    }

    fn strain(&self) -> f64 {
        self.inner().strain()
    }

    fn stress(&self) -> f64 {
        self.inner().stress()
    }

    fn tangent(&self) -> f64 {
        self.inner().tangent()
    }

    fn initial_tangent(&self) -> f64 {
        self.inner().initial_tangent()
    }

    fn commit_state(&mut self) -> FEAResult<()> {
        self.inner_mut().commit_state()
    }

    fn revert_to_last_commit(&mut self) -> FEAResult<()> {
        self.inner_mut().revert_to_last_commit()
    }

    fn revert_to_start(&mut self) -> FEAResult<()> {
        self.inner_mut().revert_to_start()
    }
}

impl From<ElasticUniaxial> for UniaxialModel {
    fn from(m: ElasticUniaxial) -> Self {
        UniaxialModel::Elastic(m)
    }
}

impl From<ElasticPerfectlyPlastic> for UniaxialModel {
    fn from(m: ElasticPerfectlyPlastic) -> Self {
        UniaxialModel::ElasticPerfectlyPlastic(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_epp_yields_and_unloads_elastically() {
        let mut m = ElasticPerfectlyPlastic::new(100.0, 1.0).unwrap();
        m.set_trial_strain(0.005).unwrap();
        assert_relative_eq!(m.stress(), 0.5);
        assert_relative_eq!(m.tangent(), 100.0);

        m.set_trial_strain(0.03).unwrap();
        assert_relative_eq!(m.stress(), 1.0);
        assert_eq!(m.tangent(), 0.0);
        m.commit_state().unwrap();
        assert_relative_eq!(m.plastic_strain(), 0.02, epsilon = 1e-15);

        // unloading from the committed plastic state
        m.set_trial_strain(0.025).unwrap();
        assert_relative_eq!(m.stress(), 0.5, epsilon = 1e-12);
        m.set_trial_strain(-0.02).unwrap();
        assert_relative_eq!(m.stress(), -1.0);
    }

    #[test]
    fn test_epp_trial_does_not_accumulate() {
        let mut m = ElasticPerfectlyPlastic::new(100.0, 1.0).unwrap();
        for _ in 0..3 {
            m.set_trial_strain(0.05).unwrap();
        }
        assert_eq!(m.plastic_strain(), 0.0);
        m.revert_to_last_commit().unwrap();
        assert_eq!(m.stress(), 0.0);
    }

    #[test]
    fn test_asymmetric_yield() {
        let mut m = ElasticPerfectlyPlastic::asymmetric(10.0, 2.0, -0.5).unwrap();
        m.set_trial_strain(-1.0).unwrap();
        assert_relative_eq!(m.stress(), -0.5);
        m.set_trial_strain(1.0).unwrap();
        assert_relative_eq!(m.stress(), 2.0);
        assert!(ElasticPerfectlyPlastic::asymmetric(10.0, 2.0, 0.5).is_err());
    }

    #[test]
    fn test_elastic_rejects_bad_modulus() {
        assert!(ElasticUniaxial::new(0.0).is_err());
        assert!(ElasticUniaxial::new(f64::NAN).is_err());
    }
}
