//! Constitutive models: materials and cross sections
//!
//! Every model keeps three pieces of state:
//! - the committed state (stress, deformation, history variables),
//! - the trial state produced by the last `set_trial_deformation`,
//! - an initial deformation offset that is subtracted from the trial
//!   deformation before the constitutive law is evaluated.

mod bidirectional;
mod elastic_section;
mod plate_section;
mod section1d;
mod uniaxial;

pub use bidirectional::Bidirectional;
pub use elastic_section::{BeamSectionLayout, ElasticBeamSection, SectionConstants};
pub use plate_section::{ElasticMembranePlateSection, ElasticPlateSection};
pub use section1d::Section1d;
pub use uniaxial::{ElasticPerfectlyPlastic, ElasticUniaxial, UniaxialMaterial, UniaxialModel};

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FEAError, FEAResult};
use crate::pack;
use crate::response::{ResponseCode, ResponseId};

/// Flexibility reported by an order-1 model whose tangent vanishes
const RIGID_FLEXIBILITY: f64 = 1.0e12;

/// Generalized stress/strain state machine
pub trait ConstitutiveModel {
    /// Layout of the generalized vectors
    fn response_type(&self) -> &ResponseId;

    fn order(&self) -> usize {
        self.response_type().len()
    }

    /// Store a new trial deformation and evaluate the constitutive law
    fn set_trial_deformation(&mut self, def: &DVector<f64>) -> FEAResult<()>;

    /// Trial deformation as passed to `set_trial_deformation`
    fn trial_deformation(&self) -> &DVector<f64>;

    fn initial_deformation(&self) -> &DVector<f64>;

    fn set_initial_deformation(&mut self, def: &DVector<f64>) -> FEAResult<()>;

    fn zero_initial_deformation(&mut self);

    /// Add `inc` to the initial deformation
    fn increment_initial_deformation(&mut self, inc: &DVector<f64>) -> FEAResult<()> {
        check_order(self.order(), inc)?;
        let total = self.initial_deformation() + inc;
        self.set_initial_deformation(&total)
    }

    /// Deformation seen by the constitutive law: trial minus initial
    fn deformation(&self) -> DVector<f64> {
        self.trial_deformation() - self.initial_deformation()
    }

    /// Generalized stress at the trial state
    fn stress(&self) -> &DVector<f64>;

    /// Tangent at the trial state
    fn tangent(&self) -> &DMatrix<f64>;

    /// Tangent at zero deformation
    fn initial_tangent(&self) -> &DMatrix<f64>;

    fn flexibility(&self) -> FEAResult<DMatrix<f64>> {
        invert_tangent(self.tangent())
    }

    fn initial_flexibility(&self) -> FEAResult<DMatrix<f64>> {
        invert_tangent(self.initial_tangent())
    }

    fn commit_state(&mut self) -> FEAResult<()>;

    fn revert_to_last_commit(&mut self) -> FEAResult<()>;

    /// Back to the virgin state: history, trial and initial deformation cleared
    fn revert_to_start(&mut self) -> FEAResult<()>;

    /// Mass per unit length (bars) or per unit area (shells)
    fn rho(&self) -> f64 {
        0.0
    }

    /// Sum of the stress components tagged `code`
    fn stress_resultant(&self, code: ResponseCode) -> f64 {
        let s = self.stress();
        self.response_type().positions(code).map(|i| s[i]).sum()
    }

    /// Sum of the deformation components tagged `code`
    fn deformation_component(&self, code: ResponseCode) -> f64 {
        let e = self.deformation();
        self.response_type().positions(code).map(|i| e[i]).sum()
    }

    fn stress_resultant_by_name(&self, name: &str) -> FEAResult<f64> {
        let code: ResponseCode = name.parse()?;
        Ok(self.stress_resultant(code))
    }

    /// Check that every stored vector and matrix matches the layout
    fn check_shapes(&self) -> FEAResult<()> {
        check_common_shapes(self)
    }
}

/// Shape checks on the state every model exposes through the trait
pub(crate) fn check_common_shapes<M: ConstitutiveModel + ?Sized>(model: &M) -> FEAResult<()> {
    let n = model.order();
    if n == 0 {
        return Err(FEAError::Section("empty response layout".to_string()));
    }
    check_order(n, model.trial_deformation())?;
    check_order(n, model.initial_deformation())?;
    check_order(n, model.stress())?;
    check_square(n, model.tangent())?;
    check_square(n, model.initial_tangent())
}

pub(crate) fn check_order(expected: usize, v: &DVector<f64>) -> FEAResult<()> {
    if v.len() != expected {
        return Err(FEAError::OrderMismatch {
            expected,
            got: v.len(),
        });
    }
    Ok(())
}

pub(crate) fn check_square(expected: usize, m: &DMatrix<f64>) -> FEAResult<()> {
    if m.nrows() != expected || m.ncols() != expected {
        return Err(FEAError::OrderMismatch {
            expected,
            got: m.nrows().max(m.ncols()),
        });
    }
    Ok(())
}

pub(crate) fn invert_tangent(k: &DMatrix<f64>) -> FEAResult<DMatrix<f64>> {
    if k.nrows() == 1 {
        let k00 = k[(0, 0)];
        let f = if k00 != 0.0 { 1.0 / k00 } else { RIGID_FLEXIBILITY };
        return Ok(DMatrix::from_element(1, 1, f));
    }
    k.clone()
        .try_inverse()
        .ok_or_else(|| FEAError::MathError("singular section tangent".to_string()))
}

/// Trial/committed/initial bookkeeping of a linear elastic model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ElasticState {
    pub trial: DVector<f64>,
    pub committed: DVector<f64>,
    pub initial: DVector<f64>,
    pub stress: DVector<f64>,
    pub committed_stress: DVector<f64>,
}

impl ElasticState {
    pub fn new(order: usize) -> Self {
        Self {
            trial: DVector::zeros(order),
            committed: DVector::zeros(order),
            initial: DVector::zeros(order),
            stress: DVector::zeros(order),
            committed_stress: DVector::zeros(order),
        }
    }

    pub fn set_trial(&mut self, def: &DVector<f64>, k: &DMatrix<f64>) -> FEAResult<()> {
        check_order(self.trial.len(), def)?;
        self.trial.copy_from(def);
        self.stress = k * (&self.trial - &self.initial);
        Ok(())
    }

    pub fn set_initial(&mut self, def: &DVector<f64>, k: &DMatrix<f64>) -> FEAResult<()> {
        check_order(self.initial.len(), def)?;
        self.initial.copy_from(def);
        self.stress = k * (&self.trial - &self.initial);
        Ok(())
    }

    pub fn commit(&mut self) {
        self.committed.copy_from(&self.trial);
        self.committed_stress.copy_from(&self.stress);
    }

    pub fn revert(&mut self) {
        self.trial.copy_from(&self.committed);
        self.stress.copy_from(&self.committed_stress);
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.trial.len());
    }

    /// Every stored vector has `order` components and `k` is `order` square
    pub fn check_shapes(&self, order: usize, k: &DMatrix<f64>) -> FEAResult<()> {
        for v in [&self.trial, &self.committed, &self.initial, &self.stress, &self.committed_stress] {
            check_order(order, v)?;
        }
        check_square(order, k)
    }
}

/// The closed set of constitutive models elements can be built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SectionModel {
    Section1d(Section1d),
    ElasticBeam(ElasticBeamSection),
    Plate(ElasticPlateSection),
    MembranePlate(ElasticMembranePlateSection),
    Bidirectional(Bidirectional),
}

macro_rules! dispatch {
    ($self:expr, $m:ident => $e:expr) => {
        match $self {
            SectionModel::Section1d($m) => $e,
            SectionModel::ElasticBeam($m) => $e,
            SectionModel::Plate($m) => $e,
            SectionModel::MembranePlate($m) => $e,
            SectionModel::Bidirectional($m) => $e,
        }
    };
}

impl SectionModel {
    /// Name of the concrete model
    pub fn kind(&self) -> &'static str {
        match self {
            SectionModel::Section1d(_) => "Section1d",
            SectionModel::ElasticBeam(_) => "ElasticBeamSection",
            SectionModel::Plate(_) => "ElasticPlateSection",
            SectionModel::MembranePlate(_) => "ElasticMembranePlateSection",
            SectionModel::Bidirectional(_) => "Bidirectional",
        }
    }

    /// Pack the complete state
    pub fn pack(&self) -> FEAResult<Value> {
        pack::pack(self.kind(), self)
    }

    /// Replace `self` with a packed model of the same kind
    pub fn unpack(&mut self, packed: &Value) -> FEAResult<()> {
        let restored: SectionModel = pack::unpack(self.kind(), packed)?;
        if restored.kind() != self.kind() {
            return Err(FEAError::IncompatiblePack {
                expected: self.kind().to_string(),
                found: restored.kind().to_string(),
            });
        }
        *self = restored;
        Ok(())
    }
}

impl ConstitutiveModel for SectionModel {
    fn response_type(&self) -> &ResponseId {
        dispatch!(self, m => m.response_type())
    }

    fn set_trial_deformation(&mut self, def: &DVector<f64>) -> FEAResult<()> {
        dispatch!(self, m => m.set_trial_deformation(def))
    }

    fn trial_deformation(&self) -> &DVector<f64> {
        dispatch!(self, m => m.trial_deformation())
    }

    fn initial_deformation(&self) -> &DVector<f64> {
        dispatch!(self, m => m.initial_deformation())
    }

    fn set_initial_deformation(&mut self, def: &DVector<f64>) -> FEAResult<()> {
        dispatch!(self, m => m.set_initial_deformation(def))
    }

    fn zero_initial_deformation(&mut self) {
        dispatch!(self, m => m.zero_initial_deformation())
    }

    fn stress(&self) -> &DVector<f64> {
        dispatch!(self, m => m.stress())
    }

    fn tangent(&self) -> &DMatrix<f64> {
        dispatch!(self, m => m.tangent())
    }

    fn initial_tangent(&self) -> &DMatrix<f64> {
        dispatch!(self, m => m.initial_tangent())
    }

    fn commit_state(&mut self) -> FEAResult<()> {
        dispatch!(self, m => m.commit_state())
    }

    fn revert_to_last_commit(&mut self) -> FEAResult<()> {
        dispatch!(self, m => m.revert_to_last_commit())
    }

    fn revert_to_start(&mut self) -> FEAResult<()> {
        dispatch!(self, m => m.revert_to_start())
    }

    fn rho(&self) -> f64 {
        dispatch!(self, m => m.rho())
    }

    fn check_shapes(&self) -> FEAResult<()> {
        dispatch!(self, m => m.check_shapes())
    }
}

impl pack::CheckPacked for SectionModel {
    fn check_packed(&self) -> FEAResult<()> {
        self.check_shapes()
    }
}

impl From<Section1d> for SectionModel {
    fn from(m: Section1d) -> Self {
        SectionModel::Section1d(m)
    }
}

impl From<ElasticBeamSection> for SectionModel {
    fn from(m: ElasticBeamSection) -> Self {
        SectionModel::ElasticBeam(m)
    }
}

impl From<ElasticPlateSection> for SectionModel {
    fn from(m: ElasticPlateSection) -> Self {
        SectionModel::Plate(m)
    }
}

impl From<ElasticMembranePlateSection> for SectionModel {
    fn from(m: ElasticMembranePlateSection) -> Self {
        SectionModel::MembranePlate(m)
    }
}

impl From<Bidirectional> for SectionModel {
    fn from(m: Bidirectional) -> Self {
        SectionModel::Bidirectional(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn models() -> Vec<SectionModel> {
        vec![
            Section1d::new(
                UniaxialModel::from(ElasticPerfectlyPlastic::new(200e9, 250e6).unwrap()),
                ResponseCode::P,
            )
            .into(),
            ElasticBeamSection::planar(30e9, 0.12, 1.6e-3).unwrap().into(),
            ElasticPlateSection::new(30e9, 0.2, 0.25, 0.0).unwrap().into(),
            ElasticMembranePlateSection::new(30e9, 0.2, 0.25, 2500.0).unwrap().into(),
            Bidirectional::new(1000.0, 10.0, 50.0, 20.0, [ResponseCode::Vy, ResponseCode::Vz])
                .unwrap()
                .into(),
        ]
    }

    fn sample(order: usize, scale: f64) -> DVector<f64> {
        DVector::from_iterator(order, (0..order).map(|i| scale * (1.0 + i as f64) * if i % 2 == 0 { 1.0 } else { -0.7 }))
    }

    #[test]
    fn test_revert_restores_committed_stress() {
        for mut m in models() {
            let n = m.order();
            m.set_trial_deformation(&sample(n, 1e-4)).unwrap();
            m.commit_state().unwrap();
            let before = m.stress().clone();
            for scale in [1e-3, 0.05, -0.2] {
                m.set_trial_deformation(&sample(n, scale)).unwrap();
                m.revert_to_last_commit().unwrap();
                assert_eq!(m.stress(), &before, "{}", m.kind());
            }
        }
    }

    #[test]
    fn test_revert_to_start_matches_fresh() {
        for (mut m, fresh) in models().into_iter().zip(models()) {
            let n = m.order();
            m.set_initial_deformation(&sample(n, 1e-5)).unwrap();
            for scale in [0.01, 0.3, -0.3] {
                m.set_trial_deformation(&sample(n, scale)).unwrap();
                m.commit_state().unwrap();
            }
            m.revert_to_start().unwrap();
            assert_eq!(m, fresh, "{}", m.kind());
        }
    }

    #[test]
    fn test_initial_deformation_is_subtracted() {
        let mut m: SectionModel = ElasticBeamSection::planar(1.0, 2.0, 3.0).unwrap().into();
        m.increment_initial_deformation(&DVector::from_vec(vec![0.5, 0.0])).unwrap();
        m.increment_initial_deformation(&DVector::from_vec(vec![0.5, 0.0])).unwrap();
        m.set_trial_deformation(&DVector::from_vec(vec![1.0, 0.1])).unwrap();
        assert_relative_eq!(m.stress_resultant(ResponseCode::P), 0.0);
        assert_relative_eq!(m.stress_resultant_by_name("Mz").unwrap(), 0.3, epsilon = 1e-15);
        m.zero_initial_deformation();
        assert_relative_eq!(m.stress_resultant(ResponseCode::P), 2.0);
    }

    #[test]
    fn test_wrong_order_rejected() {
        let mut m: SectionModel = ElasticPlateSection::new(1.0, 0.3, 0.1, 0.0).unwrap().into();
        assert!(m.set_trial_deformation(&DVector::zeros(3)).is_err());
        assert!(m.increment_initial_deformation(&DVector::zeros(8)).is_err());
    }

    #[test]
    fn test_flexibility() {
        let m: SectionModel = ElasticBeamSection::planar(2.0, 5.0, 0.5).unwrap().into();
        let f = m.flexibility().unwrap();
        assert_relative_eq!(f[(0, 0)], 0.1);
        assert_relative_eq!(f[(1, 1)], 1.0);
    }

    #[test]
    fn test_pack_unpack() {
        for mut m in models() {
            let n = m.order();
            m.set_trial_deformation(&sample(n, 0.02)).unwrap();
            m.commit_state().unwrap();
            let packed = m.pack().unwrap();
            let mut other = models().into_iter().find(|x| x.kind() == m.kind()).unwrap();
            other.unpack(&packed).unwrap();
            assert_eq!(other, m);
        }
        let mut plate: SectionModel = ElasticPlateSection::new(1.0, 0.3, 0.1, 0.0).unwrap().into();
        let packed = models()[0].pack().unwrap();
        assert!(plate.unpack(&packed).is_err());
    }
}
