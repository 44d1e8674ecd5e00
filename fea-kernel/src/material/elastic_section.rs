//! Linear elastic beam cross sections

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::{check_common_shapes, ConstitutiveModel, ElasticState};
use crate::error::{FEAError, FEAResult};
use crate::response::ResponseId;

/// Mechanical constants of a prismatic cross section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionConstants {
    /// Elastic modulus
    pub e: f64,
    /// Area
    pub a: f64,
    /// Second moment of area about local z
    pub iz: f64,
    /// Second moment of area about local y
    pub iy: f64,
    /// Shear modulus
    pub g: f64,
    /// Torsional constant
    pub j: f64,
    /// Shear area factor
    pub alpha: f64,
}

impl SectionConstants {
    /// Axial rigidity
    pub fn ea(&self) -> f64 {
        self.e * self.a
    }

    /// Bending rigidity about z
    pub fn eiz(&self) -> f64 {
        self.e * self.iz
    }

    /// Bending rigidity about y
    pub fn eiy(&self) -> f64 {
        self.e * self.iy
    }

    /// Shear rigidity including the shape factor
    pub fn ga_alpha(&self) -> f64 {
        self.g * self.a * self.alpha
    }

    /// Torsional rigidity
    pub fn gj(&self) -> f64 {
        self.g * self.j
    }
}

/// Component layout of an elastic beam section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeamSectionLayout {
    /// `[P, Mz]`
    Planar,
    /// `[P, Mz, Vy]`
    PlanarShear,
    /// `[P, Mz, My, T]`
    Spatial,
    /// `[P, Mz, My, Vy, Vz, T]`
    SpatialShear,
}

impl BeamSectionLayout {
    pub fn response_id(self) -> ResponseId {
        match self {
            BeamSectionLayout::Planar => ResponseId::elastic_section_2d(),
            BeamSectionLayout::PlanarShear => ResponseId::elastic_shear_section_2d(),
            BeamSectionLayout::Spatial => ResponseId::elastic_section_3d(),
            BeamSectionLayout::SpatialShear => ResponseId::elastic_shear_section_3d(),
        }
    }

    /// Diagonal of the section stiffness, in layout order
    fn rigidities(self, c: &SectionConstants) -> Vec<f64> {
        match self {
            BeamSectionLayout::Planar => vec![c.ea(), c.eiz()],
            BeamSectionLayout::PlanarShear => vec![c.ea(), c.eiz(), c.ga_alpha()],
            BeamSectionLayout::Spatial => vec![c.ea(), c.eiz(), c.eiy(), c.gj()],
            BeamSectionLayout::SpatialShear => vec![
                c.ea(),
                c.eiz(),
                c.eiy(),
                c.ga_alpha(),
                c.ga_alpha(),
                c.gj(),
            ],
        }
    }
}

/// Elastic section with a constant diagonal tangent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticBeamSection {
    constants: SectionConstants,
    layout: BeamSectionLayout,
    codes: ResponseId,
    rho: f64,
    k: DMatrix<f64>,
    state: ElasticState,
}

impl ElasticBeamSection {
    /// Build a section, checking that every constant the layout uses is positive
    pub fn new(constants: SectionConstants, layout: BeamSectionLayout) -> FEAResult<Self> {
        let rigidities = layout.rigidities(&constants);
        if let Some(bad) = rigidities.iter().find(|r| !(**r > 0.0)) {
            return Err(FEAError::Section(format!(
                "{layout:?} section needs positive rigidities, got {bad}"
            )));
        }
        let order = rigidities.len();
        Ok(Self {
            constants,
            layout,
            codes: layout.response_id(),
            rho: 0.0,
            k: DMatrix::from_diagonal(&DVector::from_vec(rigidities)),
            state: ElasticState::new(order),
        })
    }

    pub fn planar(e: f64, a: f64, i: f64) -> FEAResult<Self> {
        let constants = SectionConstants {
            e,
            a,
            iz: i,
            iy: 0.0,
            g: 0.0,
            j: 0.0,
            alpha: 0.0,
        };
        Self::new(constants, BeamSectionLayout::Planar)
    }

    /// Planar section given directly by its axial and bending rigidities
    pub fn planar_from_rigidities(ea: f64, ei: f64) -> FEAResult<Self> {
        Self::planar(1.0, ea, ei)
    }

    pub fn planar_shear(e: f64, a: f64, i: f64, g: f64, alpha: f64) -> FEAResult<Self> {
        let constants = SectionConstants {
            e,
            a,
            iz: i,
            iy: 0.0,
            g,
            j: 0.0,
            alpha,
        };
        Self::new(constants, BeamSectionLayout::PlanarShear)
    }

    pub fn spatial(e: f64, a: f64, iz: f64, iy: f64, g: f64, j: f64) -> FEAResult<Self> {
        let constants = SectionConstants {
            e,
            a,
            iz,
            iy,
            g,
            j,
            alpha: 0.0,
        };
        Self::new(constants, BeamSectionLayout::Spatial)
    }

    pub fn spatial_shear(constants: SectionConstants) -> FEAResult<Self> {
        Self::new(constants, BeamSectionLayout::SpatialShear)
    }

    /// Set the mass per unit length
    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    /// Geometric and elastic constants the section was built from
    pub fn constants(&self) -> &SectionConstants {
        &self.constants
    }

    /// Which components the section carries
    pub fn layout(&self) -> BeamSectionLayout {
        self.layout
    }
}

impl ConstitutiveModel for ElasticBeamSection {
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

    fn rho(&self) -> f64 {
        self.rho
    }

    fn check_shapes(&self) -> FEAResult<()> {
        if self.codes != self.layout.response_id() {
            return Err(FEAError::Section(format!(
                "{:?} section cannot carry layout {}",
                self.layout, self.codes
            )));
        }
        check_common_shapes(self)?;
        self.state.check_shapes(self.codes.len(), &self.k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseCode;
    use approx::assert_relative_eq;

    fn steel() -> SectionConstants {
        SectionConstants {
            e: 200e9,
            a: 0.01,
            iz: 2e-4,
            iy: 1e-4,
            g: 80e9,
            j: 5e-5,
            alpha: 5.0 / 6.0,
        }
    }

    #[test]
    fn test_layouts_have_matching_order() {
        for layout in [
            BeamSectionLayout::Planar,
            BeamSectionLayout::PlanarShear,
            BeamSectionLayout::Spatial,
            BeamSectionLayout::SpatialShear,
        ] {
            let s = ElasticBeamSection::new(steel(), layout).unwrap();
            assert_eq!(s.order(), layout.response_id().len());
            assert_eq!(s.tangent().nrows(), s.order());
        }
    }

    #[test]
    fn test_spatial_shear_stress() {
        let mut s = ElasticBeamSection::spatial_shear(steel()).unwrap();
        let e = DVector::from_vec(vec![1e-4, 1e-3, -1e-3, 2e-4, 0.0, 1e-3]);
        s.set_trial_deformation(&e).unwrap();
        let c = steel();
        assert_relative_eq!(s.stress_resultant(ResponseCode::P), c.ea() * 1e-4);
        assert_relative_eq!(s.stress_resultant(ResponseCode::My), -c.eiy() * 1e-3);
        assert_relative_eq!(s.stress_resultant(ResponseCode::Vy), c.ga_alpha() * 2e-4);
        assert_relative_eq!(s.stress_resultant(ResponseCode::T), c.gj() * 1e-3);
    }

    #[test]
    fn test_rejects_missing_shear_constants() {
        assert!(ElasticBeamSection::planar_shear(200e9, 0.01, 1e-4, 0.0, 1.0).is_err());
        assert!(ElasticBeamSection::planar(200e9, -1.0, 1e-4).is_err());
        // torsion is not part of the planar layout
        assert!(ElasticBeamSection::planar(200e9, 0.01, 1e-4).is_ok());
    }

    #[test]
    fn test_from_rigidities() {
        let s = ElasticBeamSection::planar_from_rigidities(3.0, 7.0).unwrap();
        assert_eq!(s.tangent()[(0, 0)], 3.0);
        assert_eq!(s.tangent()[(1, 1)], 7.0);
    }
}
