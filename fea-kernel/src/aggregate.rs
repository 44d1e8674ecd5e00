//! Fixed-size collection of constitutive models, one per integration point

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{broadcast_result, FEAError, FEAResult};
use crate::material::{ConstitutiveModel, SectionModel};
use crate::response::{ResponseCode, ResponseId};

/// Index-addressed constitutive models sharing one response layout.
///
/// The number of members is fixed at construction. Broadcasts visit every
/// member and only report whether at least one of them failed. Serialized
/// as the plain member list; deserialization goes through
/// [`ConstitutiveAggregate::from_models`], so an empty list or members with
/// different layouts never produce an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<SectionModel>", try_from = "Vec<SectionModel>")]
pub struct ConstitutiveAggregate {
    models: Vec<SectionModel>,
}

impl ConstitutiveAggregate {
    /// `n` independent copies of `prototype`
    pub fn new(n: usize, prototype: &SectionModel) -> FEAResult<Self> {
        if n == 0 {
            return Err(FEAError::InvalidInput(
                "an aggregate needs at least one member".to_string(),
            ));
        }
        Ok(Self {
            models: vec![prototype.clone(); n],
        })
    }

    /// Build from explicit members.
    ///
    /// Every member must share the same layout and hold state of the size
    /// that layout implies.
    pub fn from_models(models: Vec<SectionModel>) -> FEAResult<Self> {
        let first = models.first().ok_or_else(|| {
            FEAError::InvalidInput("an aggregate needs at least one member".to_string())
        })?;
        let codes = first.response_type().clone();
        if let Some(other) = models.iter().find(|m| *m.response_type() != codes) {
            return Err(FEAError::Section(format!(
                "aggregate members disagree on layout: {} and {}",
                codes,
                other.response_type()
            )));
        }
        for m in &models {
            m.check_shapes()?;
        }
        Ok(Self { models })
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Always false for an aggregate built through a constructor
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Member `i`, if it exists
    pub fn get(&self, i: usize) -> Option<&SectionModel> {
        self.models.get(i)
    }

    /// Mutable member `i`, if it exists
    pub fn get_mut(&mut self, i: usize) -> Option<&mut SectionModel> {
        self.models.get_mut(i)
    }

    /// Members in integration point order
    pub fn iter(&self) -> std::slice::Iter<'_, SectionModel> {
        self.models.iter()
    }

    /// Mutable members in integration point order
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, SectionModel> {
        self.models.iter_mut()
    }

    /// Layout shared by every member
    pub fn response_type(&self) -> &ResponseId {
        self.models[0].response_type()
    }

    /// Number of components of each member
    pub fn order(&self) -> usize {
        self.models[0].order()
    }

    fn check_count(&self, n: usize) -> FEAResult<()> {
        if n != self.models.len() {
            return Err(FEAError::InvalidInput(format!(
                "expected one vector per member ({}), got {n}",
                self.models.len()
            )));
        }
        Ok(())
    }

    fn broadcast<F>(&mut self, operation: &'static str, mut op: F) -> FEAResult<()>
    where
        F: FnMut(usize, &mut SectionModel) -> FEAResult<()>,
    {
        let total = self.models.len();
        let mut failed = 0;
        for (i, m) in self.models.iter_mut().enumerate() {
            if let Err(e) = op(i, m) {
                log::debug!("{operation}: member {i} failed: {e}");
                failed += 1;
            }
        }
        broadcast_result(operation, failed, total)
    }

    /// Commit every member
    pub fn commit_state(&mut self) -> FEAResult<()> {
        self.broadcast("commit_state", |_, m| m.commit_state())
    }

    /// Revert every member to its last committed state
    pub fn revert_to_last_commit(&mut self) -> FEAResult<()> {
        self.broadcast("revert_to_last_commit", |_, m| m.revert_to_last_commit())
    }

    /// Return every member to its virgin state
    pub fn revert_to_start(&mut self) -> FEAResult<()> {
        self.broadcast("revert_to_start", |_, m| m.revert_to_start())
    }

    /// Set one trial deformation per member
    pub fn set_trial_deformations(&mut self, defs: &[DVector<f64>]) -> FEAResult<()> {
        self.check_count(defs.len())?;
        self.broadcast("set_trial_deformation", |i, m| m.set_trial_deformation(&defs[i]))
    }

    /// Replace the initial deformation of every member
    pub fn set_initial_deformations(&mut self, defs: &[DVector<f64>]) -> FEAResult<()> {
        self.check_count(defs.len())?;
        self.broadcast("set_initial_deformation", |i, m| m.set_initial_deformation(&defs[i]))
    }

    /// Add one increment per member to its initial deformation
    pub fn increment_initial_deformations(&mut self, incs: &[DVector<f64>]) -> FEAResult<()> {
        self.check_count(incs.len())?;
        self.broadcast("increment_initial_deformation", |i, m| {
            m.increment_initial_deformation(&incs[i])
        })
    }

    /// Clear every initial deformation
    pub fn zero_initial_deformations(&mut self) {
        for m in &mut self.models {
            m.zero_initial_deformation();
        }
    }

    /// Stress of every member, one row per member
    pub fn stresses(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.len(), self.order(), |i, j| self.models[i].stress()[j])
    }

    /// Deformation (trial minus initial) of every member, one row per member
    pub fn strains(&self) -> DMatrix<f64> {
        let defs: Vec<DVector<f64>> = self.models.iter().map(|m| m.deformation()).collect();
        DMatrix::from_fn(self.len(), self.order(), |i, j| defs[i][j])
    }

    /// Arithmetic mean of the member stresses, not weighted by integration weights
    pub fn mean_stress(&self) -> DVector<f64> {
        let mut sum = DVector::zeros(self.order());
        for m in &self.models {
            sum += m.stress();
        }
        sum / self.len() as f64
    }

    /// Arithmetic mean of the member deformations
    pub fn mean_strain(&self) -> DVector<f64> {
        let mut sum = DVector::zeros(self.order());
        for m in &self.models {
            sum += m.deformation();
        }
        sum / self.len() as f64
    }

    /// Mean of stress component `code` over the members
    pub fn mean_stress_component(&self, code: ResponseCode) -> f64 {
        let total: f64 = self.models.iter().map(|m| m.stress_resultant(code)).sum();
        total / self.len() as f64
    }

    /// Mean of deformation component `code` over the members
    pub fn mean_strain_component(&self, code: ResponseCode) -> f64 {
        let total: f64 = self.models.iter().map(|m| m.deformation_component(code)).sum();
        total / self.len() as f64
    }

    /// Mean internal force by name, e.g. `"n1"` or `"Mz"`
    pub fn mean_stress_component_by_name(&self, name: &str) -> FEAResult<f64> {
        Ok(self.mean_stress_component(name.parse()?))
    }

    /// Stress component `code` at each integration point
    pub fn stress_at_each_point(&self, code: ResponseCode) -> DVector<f64> {
        DVector::from_iterator(self.len(), self.models.iter().map(|m| m.stress_resultant(code)))
    }

    /// Deformation component `code` at each integration point
    pub fn strain_at_each_point(&self, code: ResponseCode) -> DVector<f64> {
        DVector::from_iterator(
            self.len(),
            self.models.iter().map(|m| m.deformation_component(code)),
        )
    }

    /// Pack every member, in order
    pub fn pack(&self) -> FEAResult<Value> {
        let members = self
            .models
            .iter()
            .map(SectionModel::pack)
            .collect::<FEAResult<Vec<_>>>()?;
        Ok(Value::Array(members))
    }

    /// Restore every member; nothing changes unless all members unpack
    pub fn unpack(&mut self, packed: &Value) -> FEAResult<()> {
        let members = packed.as_array().ok_or_else(|| FEAError::IncompatiblePack {
            expected: "ConstitutiveAggregate".to_string(),
            found: "non-array value".to_string(),
        })?;
        self.check_count(members.len())?;
        let mut restored = self.models.clone();
        for (m, p) in restored.iter_mut().zip(members) {
            m.unpack(p)?;
        }
        self.models = restored;
        Ok(())
    }
}

impl From<ConstitutiveAggregate> for Vec<SectionModel> {
    fn from(aggregate: ConstitutiveAggregate) -> Self {
        aggregate.models
    }
}

impl TryFrom<Vec<SectionModel>> for ConstitutiveAggregate {
    type Error = FEAError;

    fn try_from(models: Vec<SectionModel>) -> FEAResult<Self> {
        Self::from_models(models)
    }
}

impl std::ops::Index<usize> for ConstitutiveAggregate {
    type Output = SectionModel;

    fn index(&self, i: usize) -> &SectionModel {
        &self.models[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{ElasticBeamSection, ElasticUniaxial, Section1d};
    use approx::assert_relative_eq;

    fn axial(n: usize) -> ConstitutiveAggregate {
        let proto: SectionModel =
            Section1d::new(ElasticUniaxial::new(1.0).unwrap().into(), ResponseCode::P).into();
        ConstitutiveAggregate::new(n, &proto).unwrap()
    }

    fn scalars(values: &[f64]) -> Vec<DVector<f64>> {
        values.iter().map(|v| DVector::from_element(1, *v)).collect()
    }

    #[test]
    fn test_mean_is_unweighted() {
        let mut agg = axial(3);
        agg.set_trial_deformations(&scalars(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(agg.mean_stress()[0], 2.0);
        assert_eq!(agg.mean_strain()[0], 2.0);
        assert_eq!(agg.mean_stress_component(ResponseCode::P), 2.0);
        assert_eq!(agg.stress_at_each_point(ResponseCode::P).as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_members_are_independent() {
        let mut agg = axial(2);
        agg.get_mut(0)
            .unwrap()
            .set_trial_deformation(&DVector::from_element(1, 5.0))
            .unwrap();
        assert_eq!(agg[1].stress()[0], 0.0);
    }

    #[test]
    fn test_empty_and_count_mismatch() {
        let proto: SectionModel = ElasticBeamSection::planar(1.0, 1.0, 1.0).unwrap().into();
        assert!(ConstitutiveAggregate::new(0, &proto).is_err());
        let mut agg = axial(3);
        assert!(agg.set_trial_deformations(&scalars(&[1.0])).is_err());
    }

    #[test]
    fn test_weak_failure_signal() {
        let mut agg = axial(3);
        let mut defs = scalars(&[1.0, 2.0, 3.0]);
        defs[1] = DVector::zeros(2);
        match agg.set_trial_deformations(&defs) {
            Err(FEAError::AggregateFailure { failed, total, .. }) => {
                assert_eq!((failed, total), (1, 3));
            }
            other => panic!("unexpected {other:?}"),
        }
        // the healthy members were still updated
        assert_eq!(agg[2].stress()[0], 3.0);
    }

    #[test]
    fn test_initial_deformation_bulk_ops() {
        let mut agg = axial(2);
        agg.increment_initial_deformations(&scalars(&[0.5, 0.25])).unwrap();
        agg.increment_initial_deformations(&scalars(&[0.5, 0.25])).unwrap();
        agg.set_trial_deformations(&scalars(&[1.0, 1.0])).unwrap();
        assert_relative_eq!(agg.strains()[(0, 0)], 0.0);
        assert_relative_eq!(agg.strains()[(1, 0)], 0.5);
        agg.zero_initial_deformations();
        assert_relative_eq!(agg.mean_strain()[0], 1.0);
    }

    #[test]
    fn test_pack_unpack() {
        let mut agg = axial(2);
        agg.set_trial_deformations(&scalars(&[0.1, 0.2])).unwrap();
        agg.commit_state().unwrap();
        let packed = agg.pack().unwrap();

        let mut other = axial(2);
        other.unpack(&packed).unwrap();
        assert_eq!(other, agg);

        let mut wrong = axial(3);
        assert!(wrong.unpack(&packed).is_err());
        assert_eq!(wrong, axial(3));
    }

    #[test]
    fn test_deserialize_checks_members() {
        let agg = axial(2);
        let restored: ConstitutiveAggregate =
            serde_json::from_value(serde_json::to_value(&agg).unwrap()).unwrap();
        assert_eq!(restored, agg);

        let empty = serde_json::json!([]);
        assert!(serde_json::from_value::<ConstitutiveAggregate>(empty).is_err());

        let beam: SectionModel = ElasticBeamSection::planar(1.0, 1.0, 1.0).unwrap().into();
        let mixed = serde_json::to_value(vec![agg[0].clone(), beam]).unwrap();
        assert!(serde_json::from_value::<ConstitutiveAggregate>(mixed).is_err());

        // an axial member carrying a two-component stress
        let mut member = serde_json::to_value(&agg[0]).unwrap();
        member["stress"] = serde_json::to_value(DVector::from_vec(vec![1.0, 2.0])).unwrap();
        let resized = serde_json::Value::Array(vec![member]);
        assert!(serde_json::from_value::<ConstitutiveAggregate>(resized).is_err());
    }
}
