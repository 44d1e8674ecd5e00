//! Elastic plate and membrane-plate sections for shell elements
//!
//! Bending moments use the sign convention of the shell kinematics, so the
//! bending block of the tangent is negative definite.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::{check_common_shapes, ConstitutiveModel, ElasticState};
use crate::error::{FEAError, FEAResult};
use crate::response::ResponseId;

const FIVE_SIXTHS: f64 = 5.0 / 6.0;

/// Isotropic constants of a homogeneous plate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlateProperties {
    pub e: f64,
    pub nu: f64,
    /// Thickness
    pub h: f64,
    /// Density per unit volume
    pub rho: f64,
}

impl PlateProperties {
    fn new(e: f64, nu: f64, h: f64, rho: f64) -> FEAResult<Self> {
        if !(e > 0.0) || !(h > 0.0) {
            return Err(FEAError::Section(format!(
                "plate needs positive modulus and thickness, got E = {e}, h = {h}"
            )));
        }
        if !(nu > -1.0 && nu < 0.5) {
            return Err(FEAError::Section(format!(
                "Poisson's ratio must lie in (-1, 0.5), got {nu}"
            )));
        }
        if !(rho >= 0.0) {
            return Err(FEAError::Section(format!("density must be non-negative, got {rho}")));
        }
        Ok(Self { e, nu, h, rho })
    }

    /// Bending modulus `E h^3 / 12 / (1 - nu^2)`
    pub fn bending_modulus(&self) -> f64 {
        self.e * self.h.powi(3) / 12.0 / (1.0 - self.nu * self.nu)
    }

    /// `E / (2 (1 + nu))`
    pub fn shear_modulus(&self) -> f64 {
        0.5 * self.e / (1.0 + self.nu)
    }

    /// Membrane modulus `E h / (1 - nu^2)`
    pub fn membrane_modulus(&self) -> f64 {
        self.e * self.h / (1.0 - self.nu * self.nu)
    }

    /// Write the bending and transverse shear blocks starting at `offset`
    fn fill_plate_block(&self, k: &mut DMatrix<f64>, offset: usize) {
        let d = self.bending_modulus();
        let gh = FIVE_SIXTHS * self.shear_modulus() * self.h;
        let o = offset;
        k[(o, o)] = -d;
        k[(o + 1, o + 1)] = -d;
        k[(o, o + 1)] = -self.nu * d;
        k[(o + 1, o)] = -self.nu * d;
        k[(o + 2, o + 2)] = -0.5 * d * (1.0 - self.nu);
        k[(o + 3, o + 3)] = gh;
        k[(o + 4, o + 4)] = gh;
    }
}

/// Plate bending and transverse shear, `[m1, m2, m12, q13, q23]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticPlateSection {
    props: PlateProperties,
    codes: ResponseId,
    k: DMatrix<f64>,
    state: ElasticState,
}

impl ElasticPlateSection {
    pub fn new(e: f64, nu: f64, h: f64, rho: f64) -> FEAResult<Self> {
        let props = PlateProperties::new(e, nu, h, rho)?;
        let mut k = DMatrix::zeros(5, 5);
        props.fill_plate_block(&mut k, 0);
        Ok(Self {
            props,
            codes: ResponseId::plate(),
            k,
            state: ElasticState::new(5),
        })
    }

    /// Elastic constants and thickness
    pub fn properties(&self) -> &PlateProperties {
        &self.props
    }
}

/// Membrane, bending and shear, `[n1, n2, n12, m1, m2, m12, q13, q23]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticMembranePlateSection {
    props: PlateProperties,
    codes: ResponseId,
    k: DMatrix<f64>,
    state: ElasticState,
}

impl ElasticMembranePlateSection {
    pub fn new(e: f64, nu: f64, h: f64, rho: f64) -> FEAResult<Self> {
        let props = PlateProperties::new(e, nu, h, rho)?;
        let m = props.membrane_modulus();
        let mut k = DMatrix::zeros(8, 8);
        k[(0, 0)] = m;
        k[(1, 1)] = m;
        k[(0, 1)] = props.nu * m;
        k[(1, 0)] = props.nu * m;
        k[(2, 2)] = props.shear_modulus() * props.h;
        props.fill_plate_block(&mut k, 3);
        Ok(Self {
            props,
            codes: ResponseId::membrane_plate(),
            k,
            state: ElasticState::new(8),
        })
    }

    /// Elastic constants and thickness
    pub fn properties(&self) -> &PlateProperties {
        &self.props
    }
}

macro_rules! elastic_plate_model {
    ($ty:ty, $layout:expr) => {
        impl ConstitutiveModel for $ty {
            fn response_type(&self) -> &ResponseId {
                &self.codes
            }

            fn set_trial_deformation(&mut self, def: &DVector<f64>) -> FEAResult<()> {
                self.state.set_trial(def, &self.k)
            }

            fn trial_deformation(&self) -> &DVector<f64> {
                &self.state.trial
            }

            fn initial_deformation(&self) -> &DVector<f64> {
                &self.state.initial
            }

            fn set_initial_deformation(&mut self, def: &DVector<f64>) -> FEAResult<()> {
                self.state.set_initial(def, &self.k)
            }

            fn zero_initial_deformation(&mut self) {
                self.state.initial.fill(0.0);
                self.state.stress = &self.k * &self.state.trial;
            }

            fn stress(&self) -> &DVector<f64> {
                &self.state.stress
            }

            fn tangent(&self) -> &DMatrix<f64> {
                &self.k
            }

            fn initial_tangent(&self) -> &DMatrix<f64> {
                &self.k
            }

            fn commit_state(&mut self) -> FEAResult<()> {
                self.state.commit();
                Ok(())
            }

            fn revert_to_last_commit(&mut self) -> FEAResult<()> {
                self.state.revert();
                Ok(())
            }

            fn revert_to_start(&mut self) -> FEAResult<()> {
                self.state.reset();
                Ok(())
            }

            /// Mass per unit area
            fn rho(&self) -> f64 {
                self.props.rho * self.props.h
            }

            fn check_shapes(&self) -> FEAResult<()> {
                if self.codes != $layout {
                    return Err(FEAError::Section(format!(
                        "{} cannot carry layout {}",
                        stringify!($ty),
                        self.codes
                    )));
                }
                check_common_shapes(self)?;
                self.state.check_shapes(self.codes.len(), &self.k)
            }
        }
    };
}

elastic_plate_model!(ElasticPlateSection, ResponseId::plate());
elastic_plate_model!(ElasticMembranePlateSection, ResponseId::membrane_plate());

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::min_eigenvalue;
    use crate::response::ResponseCode;
    use approx::assert_relative_eq;

    #[test]
    fn test_plate_stresses() {
        let (e, nu, h) = (12.0, 0.25, 1.0);
        let mut s = ElasticPlateSection::new(e, nu, h, 0.0).unwrap();
        let d = e / 12.0 / (1.0 - nu * nu);
        let g = 0.5 * e / (1.0 + nu);
        s.set_trial_deformation(&DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        let st = s.stress();
        assert_relative_eq!(st[0], -(d + nu * d * 2.0), epsilon = 1e-12);
        assert_relative_eq!(st[1], -(nu * d + 2.0 * d), epsilon = 1e-12);
        assert_relative_eq!(st[2], -0.5 * d * (1.0 - nu) * 3.0, epsilon = 1e-12);
        assert_relative_eq!(st[3], FIVE_SIXTHS * g * h * 4.0, epsilon = 1e-12);
        assert_relative_eq!(st[4], FIVE_SIXTHS * g * h * 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_membrane_block_min_eigenvalue() {
        let s = ElasticMembranePlateSection::new(200e9, 0.3, 0.02, 7850.0).unwrap();
        let k = s.initial_tangent();
        let membrane = k.view((0, 0), (3, 3)).into_owned();
        let gh = s.properties().shear_modulus() * 0.02;
        // E h/(1 - nu^2) * (1 - nu) > G h for any nu in range
        assert_relative_eq!(min_eigenvalue(&membrane), gh, max_relative = 1e-10);
        assert_relative_eq!(s.rho(), 7850.0 * 0.02);
    }

    #[test]
    fn test_membrane_force_resultant() {
        let mut s = ElasticMembranePlateSection::new(1.0, 0.0, 2.0, 0.0).unwrap();
        let mut e = DVector::zeros(8);
        e[0] = 0.5;
        s.set_trial_deformation(&e).unwrap();
        assert_relative_eq!(s.stress_resultant(ResponseCode::N1), 1.0);
        assert_eq!(s.stress_resultant(ResponseCode::N2), 0.0);
    }

    #[test]
    fn test_invalid_constants() {
        assert!(ElasticPlateSection::new(1.0, 0.5, 1.0, 0.0).is_err());
        assert!(ElasticMembranePlateSection::new(1.0, 0.3, 0.0, 0.0).is_err());
    }
}
