//! Two-component coupled plasticity with isotropic and kinematic hardening
//!
//! Radial return on a circular yield surface in the plane of the two
//! generalized stresses. History variables are staged at trial time and
//! installed by `commit_state`.

use nalgebra::{DMatrix, DVector, Vector2};
use serde::{Deserialize, Serialize};

use super::{check_common_shapes, check_order, check_square, ConstitutiveModel};
use crate::error::{FEAError, FEAResult};
use crate::response::{ResponseCode, ResponseId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bidirectional {
    e: f64,
    sig_y: f64,
    h_iso: f64,
    h_kin: f64,
    codes: ResponseId,

    trial: DVector<f64>,
    committed_trial: DVector<f64>,
    initial: DVector<f64>,

    /// Committed plastic strain
    ep_n: Vector2<f64>,
    /// Staged plastic strain
    ep_n1: Vector2<f64>,
    /// Committed back stress
    q_n: Vector2<f64>,
    q_n1: Vector2<f64>,
    /// Committed accumulated plastic strain
    alpha_n: f64,
    alpha_n1: f64,

    stress: DVector<f64>,
    tangent: DMatrix<f64>,
    committed_stress: DVector<f64>,
    committed_tangent: DMatrix<f64>,
    initial_tangent: DMatrix<f64>,
}

impl Bidirectional {
    /// # Arguments
    /// * `e` - Elastic modulus of both components
    /// * `sig_y` - Initial yield stress (radius of the yield circle)
    /// * `h_iso` - Isotropic hardening modulus
    /// * `h_kin` - Kinematic hardening modulus
    /// * `codes` - Response codes of the two components
    pub fn new(e: f64, sig_y: f64, h_iso: f64, h_kin: f64, codes: [ResponseCode; 2]) -> FEAResult<Self> {
        if !(e > 0.0) || !(sig_y > 0.0) {
            return Err(FEAError::Section(format!(
                "bidirectional section needs E > 0 and sigY > 0, got {e} and {sig_y}"
            )));
        }
        if !(h_iso >= 0.0) || !(h_kin >= 0.0) {
            return Err(FEAError::Section(format!(
                "hardening moduli must be non-negative, got Hiso = {h_iso}, Hkin = {h_kin}"
            )));
        }
        let elastic = DMatrix::identity(2, 2) * e;
        Ok(Self {
            e,
            sig_y,
            h_iso,
            h_kin,
            codes: ResponseId::new(codes.to_vec()),
            trial: DVector::zeros(2),
            committed_trial: DVector::zeros(2),
            initial: DVector::zeros(2),
            ep_n: Vector2::zeros(),
            ep_n1: Vector2::zeros(),
            q_n: Vector2::zeros(),
            q_n1: Vector2::zeros(),
            alpha_n: 0.0,
            alpha_n1: 0.0,
            stress: DVector::zeros(2),
            tangent: elastic.clone(),
            committed_stress: DVector::zeros(2),
            committed_tangent: elastic.clone(),
            initial_tangent: elastic,
        })
    }

    /// Committed plastic strain of both components
    pub fn plastic_strain(&self) -> Vector2<f64> {
        self.ep_n
    }

    /// Committed centre of the yield circle
    pub fn back_stress(&self) -> Vector2<f64> {
        self.q_n
    }

    /// Committed accumulated plastic strain driving isotropic hardening
    pub fn hardening_variable(&self) -> f64 {
        self.alpha_n
    }

    /// Current radius of the yield surface
    pub fn yield_stress(&self) -> f64 {
        self.sig_y + self.alpha_n * self.h_iso
    }

    fn evaluate(&mut self) {
        let def = Vector2::new(self.trial[0] - self.initial[0], self.trial[1] - self.initial[1]);
        let mut s = (def - self.ep_n) * self.e;
        let xsi = s - self.q_n;
        let norm_xsi = xsi.norm();
        let f = norm_xsi - self.yield_stress();

        if f <= 0.0 {
            self.ep_n1 = self.ep_n;
            self.q_n1 = self.q_n;
            self.alpha_n1 = self.alpha_n;
            self.tangent.copy_from(&self.initial_tangent);
        } else {
            let e = self.e;
            let dlam = f / (e + self.h_kin + self.h_iso);
            let n = xsi / norm_xsi;
            let a = e * (e / (self.h_iso + self.h_kin + e));
            let b = e * (e * dlam / norm_xsi);
            let eb = e - b;
            let ba = b - a;
            self.tangent[(0, 0)] = eb + ba * n[0] * n[0];
            self.tangent[(1, 1)] = eb + ba * n[1] * n[1];
            self.tangent[(0, 1)] = ba * n[0] * n[1];
            self.tangent[(1, 0)] = self.tangent[(0, 1)];

            let dn = n * dlam;
            s -= dn * e;
            self.ep_n1 = self.ep_n + dn;
            self.q_n1 = self.q_n + dn * self.h_kin;
            self.alpha_n1 = self.alpha_n + dlam;
            log::debug!("bidirectional: plastic step, dlam = {dlam:e}");
        }
        self.stress[0] = s[0];
        self.stress[1] = s[1];
    }
}

impl ConstitutiveModel for Bidirectional {
    fn response_type(&self) -> &ResponseId {
        &self.codes
    }

    fn set_trial_deformation(&mut self, def: &DVector<f64>) -> FEAResult<()> {
        check_order(2, def)?;
        self.trial.copy_from(def);
        self.evaluate();
        Ok(())
    }

    fn trial_deformation(&self) -> &DVector<f64> {
        &self.trial
    }

    fn initial_deformation(&self) -> &DVector<f64> {
        &self.initial
    }

    fn set_initial_deformation(&mut self, def: &DVector<f64>) -> FEAResult<()> {
        check_order(2, def)?;
        self.initial.copy_from(def);
        self.evaluate();
        Ok(())
    }

    fn zero_initial_deformation(&mut self) {
        self.initial.fill(0.0);
        self.evaluate();
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
        self.ep_n = self.ep_n1;
        self.q_n = self.q_n1;
        self.alpha_n = self.alpha_n1;
        self.committed_trial.copy_from(&self.trial);
        self.committed_stress.copy_from(&self.stress);
        self.committed_tangent.copy_from(&self.tangent);
        Ok(())
    }

    fn revert_to_last_commit(&mut self) -> FEAResult<()> {
        self.ep_n1 = self.ep_n;
        self.q_n1 = self.q_n;
        self.alpha_n1 = self.alpha_n;
        self.trial.copy_from(&self.committed_trial);
        self.stress.copy_from(&self.committed_stress);
        self.tangent.copy_from(&self.committed_tangent);
        Ok(())
    }

    fn revert_to_start(&mut self) -> FEAResult<()> {
        let codes = [self.codes.codes()[0], self.codes.codes()[1]];
        *self = Self::new(self.e, self.sig_y, self.h_iso, self.h_kin, codes)?;
        Ok(())
    }

    fn check_shapes(&self) -> FEAResult<()> {
        if self.codes.len() != 2 {
            return Err(FEAError::OrderMismatch {
                expected: 2,
                got: self.codes.len(),
            });
        }
        check_common_shapes(self)?;
        check_order(2, &self.committed_trial)?;
        check_order(2, &self.committed_stress)?;
        check_square(2, &self.committed_tangent)
    }
}
