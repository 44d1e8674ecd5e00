//! Corotational two-node bar
//!
//! The relative displacement of the end nodes is rotated into a frame fixed
//! at binding time and added to the initial offset `[Lo, 0, 0]`. The current
//! length is the norm of that vector, so rigid rotations of any size leave
//! the strain unchanged. The tangent carries the material part and the
//! geometric (initial stress) part.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::truss::{
    axial_deformation_vector, axial_rigidity, check_axial_section, check_bar_layout, supported_dofs,
};
use super::{
    reject_load, skip_load_on_dead, unknown_response, unpack_element, Element, ElementCore,
    HasAxialResponse, HasScratch, IsCorotational, Scratch,
};
use crate::config::ElementOptions;
use crate::error::{FEAError, FEAResult};
use crate::loads::{ElementalLoad, LoadKind};
use crate::material::{ConstitutiveModel, SectionModel};
use crate::math::{bar_rotation, Mat3, Vec3};
use crate::node::NodeProvider;
use crate::pack::{self, CheckPacked};
use crate::response::ResponseCode;

const CLASS_NAME: &str = "CorotTrussSection";

const DEGRADED_DOF: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorotTrussSection {
    core: ElementCore,
    dimension: usize,
    section: SectionModel,
    num_dof: usize,
    /// Reference length
    lo: f64,
    /// Current length
    ln: f64,
    /// Current offset between the end nodes in the local frame
    d21: Vec3,
    /// Rows are the local axes
    rotation: Mat3,
    strain: f64,
    persistent_strain: f64,
    #[serde(skip)]
    scratch: Scratch,
}

impl CorotTrussSection {
    /// Create a corotational bar in 2 or 3 dimensions
    pub fn new(tag: usize, dimension: usize, nodes: [usize; 2], section: SectionModel) -> FEAResult<Self> {
        if !(2..=3).contains(&dimension) {
            return Err(FEAError::InvalidInput(format!(
                "corotational truss dimension must be 2 or 3, got {dimension}"
            )));
        }
        check_axial_section(&section)?;
        Ok(Self {
            core: ElementCore::new(tag, nodes.to_vec()),
            dimension,
            section,
            num_dof: 0,
            lo: 0.0,
            ln: 0.0,
            d21: Vec3::zeros(),
            rotation: Mat3::identity(),
            strain: 0.0,
            persistent_strain: 0.0,
            scratch: Scratch::default(),
        })
    }

    /// Set element options
    pub fn with_options(mut self, options: ElementOptions) -> Self {
        self.core.options = options;
        self
    }

    /// Section carrying the axial response
    pub fn section(&self) -> &SectionModel {
        &self.section
    }

    /// Engineering strain of the last update, net of the persistent offset
    pub fn strain(&self) -> f64 {
        self.strain
    }

    /// Strain locked in by a deactivation, subtracted from every update
    pub fn persistent_strain(&self) -> f64 {
        self.persistent_strain
    }

    fn degrade(&mut self) {
        self.num_dof = DEGRADED_DOF;
        self.lo = 0.0;
        self.ln = 0.0;
        self.scratch.allocate(DEGRADED_DOF);
    }

    fn half(&self) -> usize {
        self.num_dof / 2
    }

    /// Place the global 3x3 block `kg` in `[kg, -kg; -kg, kg]` over the
    /// translational DOFs, scaled by the activity factor
    fn fill_blocks(&mut self, kg: &Mat3) {
        let factor = self.core.activity_factor();
        let n2 = self.half();
        let k = &mut self.scratch.stiff;
        k.fill(0.0);
        for i in 0..self.dimension {
            for j in 0..self.dimension {
                let v = kg[(i, j)] * factor;
                k[(i, j)] = v;
                k[(i, j + n2)] = -v;
                k[(i + n2, j)] = -v;
                k[(i + n2, j + n2)] = v;
            }
        }
    }

    fn lumped_mass(&self) -> f64 {
        0.5 * self.section.rho() * self.lo * self.core.activity_factor()
    }
}

impl CheckPacked for CorotTrussSection {
    fn check_packed(&self) -> FEAResult<()> {
        self.core.check_packed(2)?;
        if !(2..=3).contains(&self.dimension) {
            return Err(FEAError::InvalidInput(format!("dimension {}", self.dimension)));
        }
        check_axial_section(&self.section)?;
        self.section.check_shapes()?;
        check_bar_layout(self.dimension, self.num_dof, self.lo, DEGRADED_DOF)?;
        if self.lo > 0.0 && !(self.ln > 0.0 && self.ln.is_finite()) {
            return Err(FEAError::InvalidInput(format!("current length {}", self.ln)));
        }
        Ok(())
    }
}

impl HasScratch for CorotTrussSection {
    fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }
}

impl HasAxialResponse for CorotTrussSection {
    fn axial_force(&self) -> f64 {
        self.section.stress_resultant(ResponseCode::P)
    }

    fn axial_deformation(&self) -> f64 {
        self.ln - self.lo
    }
}

impl IsCorotational for CorotTrussSection {
    fn current_length(&self) -> f64 {
        self.ln
    }

    fn initial_length(&self) -> f64 {
        self.lo
    }

    fn local_frame(&self) -> &Mat3 {
        &self.rotation
    }
}

impl Element for CorotTrussSection {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn num_dof(&self) -> usize {
        self.num_dof
    }

    fn set_domain(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()> {
        let ndf = match self.core.common_dof(nodes) {
            Ok(ndf) => ndf,
            Err(e) => {
                log::warn!("{CLASS_NAME} {}: {e}, element degraded", self.core.tag);
                self.degrade();
                return Err(e);
            }
        };
        if !supported_dofs(self.dimension, ndf) {
            log::warn!(
                "{CLASS_NAME} {}: {ndf} DOF per node not supported in {}D, element degraded",
                self.core.tag,
                self.dimension
            );
            self.degrade();
            return Err(FEAError::InvalidInput(format!(
                "{CLASS_NAME} {}: {ndf} DOF per node in {}D",
                self.core.tag, self.dimension
            )));
        }
        self.num_dof = 2 * ndf;
        self.scratch.allocate(self.num_dof);

        let x1 = nodes.coordinates(self.core.nodes[0])?;
        let x2 = nodes.coordinates(self.core.nodes[1])?;
        let mut dx = Vec3::zeros();
        for i in 0..self.dimension {
            dx[i] = x2[i] - x1[i];
        }
        let lo = dx.norm();
        if lo <= self.core.options.geometry_tolerance {
            self.lo = 0.0;
            self.ln = 0.0;
            return Err(FEAError::InvalidGeometry(format!(
                "{CLASS_NAME} {} has zero length",
                self.core.tag
            )));
        }
        self.lo = lo;
        self.ln = lo;
        self.rotation = bar_rotation(&(dx / lo));
        self.d21 = Vec3::new(lo, 0.0, 0.0);
        Ok(())
    }

    fn update(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()> {
        if self.lo == 0.0 {
            return Err(FEAError::InvalidGeometry(format!(
                "{CLASS_NAME} {} has zero length",
                self.core.tag
            )));
        }
        let u1 = nodes.trial_displacement(self.core.nodes[0])?;
        let u2 = nodes.trial_displacement(self.core.nodes[1])?;
        let mut du = Vec3::zeros();
        for i in 0..self.dimension {
            du[i] = u2[i] - u1[i];
        }
        self.d21 = Vec3::new(self.lo, 0.0, 0.0) + self.rotation * du;
        self.ln = self.d21.norm();
        self.strain = (self.ln - self.lo) / self.lo - self.persistent_strain;
        let e = axial_deformation_vector(self.section.response_type(), self.strain);
        self.section.set_trial_deformation(&e)
    }

    fn tangent_stiffness(&mut self) -> &DMatrix<f64> {
        if self.lo == 0.0 {
            self.scratch.stiff.fill(0.0);
            return &self.scratch.stiff;
        }
        let ea = axial_rigidity(self.section.response_type(), self.section.tangent());
        let q = self.axial_force();
        let (ln, lo) = (self.ln, self.lo);
        let dd = self.d21 * self.d21.transpose();

        let material = dd * (ea / (ln * ln * lo));
        let geometric = Mat3::identity() * (q / ln) - dd * (q / (ln * ln * ln));
        let kl = material + geometric;
        let kg = self.rotation.transpose() * kl * self.rotation;
        self.fill_blocks(&kg);
        &self.scratch.stiff
    }

    fn initial_stiffness(&mut self) -> &DMatrix<f64> {
        if self.lo == 0.0 {
            self.scratch.stiff.fill(0.0);
            return &self.scratch.stiff;
        }
        let ea = axial_rigidity(self.section.response_type(), self.section.initial_tangent());
        let mut kl = Mat3::zeros();
        kl[(0, 0)] = ea / self.lo;
        let kg = self.rotation.transpose() * kl * self.rotation;
        self.fill_blocks(&kg);
        &self.scratch.stiff
    }

    fn resisting_force(&mut self) -> &DVector<f64> {
        self.scratch.resid.fill(0.0);
        if self.lo == 0.0 {
            return &self.scratch.resid;
        }
        let sa = self.axial_force() / self.ln * self.core.activity_factor();
        let ql = self.d21 * sa;
        let qg = self.rotation.transpose() * ql;
        let n2 = self.half();
        for i in 0..self.dimension {
            self.scratch.resid[i] = -qg[i];
            self.scratch.resid[i + n2] = qg[i];
        }
        &self.scratch.resid
    }

    fn resisting_force_inc_inertia(&mut self, nodes: &dyn NodeProvider) -> FEAResult<&DVector<f64>> {
        self.resisting_force();
        let m = self.lumped_mass();
        if m != 0.0 {
            let a1 = nodes.trial_acceleration(self.core.nodes[0])?;
            let a2 = nodes.trial_acceleration(self.core.nodes[1])?;
            let n2 = self.half();
            for i in 0..self.dimension {
                self.scratch.resid[i] += m * a1[i];
                self.scratch.resid[i + n2] += m * a2[i];
            }
        }
        Ok(&self.scratch.resid)
    }

    fn mass(&mut self) -> &DMatrix<f64> {
        self.scratch.mass.fill(0.0);
        let m = self.lumped_mass();
        if m == 0.0 {
            return &self.scratch.mass;
        }
        let n2 = self.half();
        for i in 0..self.dimension {
            self.scratch.mass[(i, i)] = m;
            self.scratch.mass[(i + n2, i + n2)] = m;
        }
        &self.scratch.mass
    }

    fn add_load(&mut self, load: &ElementalLoad, factor: f64) -> FEAResult<()> {
        if skip_load_on_dead(self, load) {
            return Ok(());
        }
        match &load.kind {
            LoadKind::TrussStrain(strain) => {
                let e = axial_deformation_vector(self.section.response_type(), strain.mean_strain(factor));
                self.section.increment_initial_deformation(&e)
            }
            _ => Err(reject_load(self, load)),
        }
    }

    fn zero_load(&mut self) {
        self.section.zero_initial_deformation();
    }

    fn commit_state(&mut self) -> FEAResult<()> {
        self.section.commit_state()
    }

    fn revert_to_last_commit(&mut self) -> FEAResult<()> {
        self.section.revert_to_last_commit()
    }

    fn revert_to_start(&mut self) -> FEAResult<()> {
        self.ln = self.lo;
        self.d21 = Vec3::new(self.lo, 0.0, 0.0);
        self.strain = 0.0;
        self.persistent_strain = 0.0;
        self.section.revert_to_start()
    }

    fn fold_current_deformation(&mut self) {
        self.persistent_strain += self.strain;
        self.strain = 0.0;
    }

    fn response(&mut self, name: &str) -> FEAResult<DVector<f64>> {
        match name {
            "force" | "forces" | "globalForce" | "globalForces" => Ok(self.resisting_force().clone()),
            "axialForce" => Ok(DVector::from_element(1, self.axial_force())),
            "deformation" | "axialDeformation" => Ok(DVector::from_element(1, self.axial_deformation())),
            "currentLength" => Ok(DVector::from_element(1, self.ln)),
            "stress" | "sectionForce" => Ok(self.section.stress().clone()),
            "strain" | "sectionDeformation" => Ok(self.section.deformation()),
            _ => Err(unknown_response(self, name)),
        }
    }

    fn pack(&self) -> FEAResult<Value> {
        pack::pack(CLASS_NAME, self)
    }

    fn unpack(&mut self, packed: &Value) -> FEAResult<()> {
        *self = unpack_element(CLASS_NAME, packed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{ElasticPerfectlyPlastic, ElasticUniaxial, Section1d, UniaxialModel};
    use crate::math::{asymmetry, Mat};
    use crate::node::{Node, NodeRegistry};
    use approx::assert_relative_eq;

    fn section(ea: f64) -> SectionModel {
        Section1d::new(UniaxialModel::from(ElasticUniaxial::new(ea).unwrap()), ResponseCode::P).into()
    }

    fn bound(ndf: usize, end: [f64; 3], ea: f64) -> (NodeRegistry, CorotTrussSection) {
        let mut reg = NodeRegistry::new();
        reg.add(1, Node::new(0.0, 0.0, 0.0, ndf)).unwrap();
        reg.add(2, Node::new(end[0], end[1], end[2], ndf)).unwrap();
        let mut e = CorotTrussSection::new(1, 3, [1, 2], section(ea)).unwrap();
        e.set_domain(&reg).unwrap();
        (reg, e)
    }

    fn displace(reg: &mut NodeRegistry, tag: usize, u: &[f64]) {
        reg.get_mut(tag).unwrap().set_trial_displacement(&DVector::from_row_slice(u)).unwrap();
    }

    #[test]
    fn test_rigid_rotation_is_strain_free() {
        let (mut reg, mut e) = bound(3, [2.0, 0.0, 0.0], 100.0);
        let theta: f64 = 0.7;
        displace(&mut reg, 2, &[2.0 * theta.cos() - 2.0, 2.0 * theta.sin(), 0.0]);
        e.update(&reg).unwrap();
        assert_relative_eq!(e.strain(), 0.0, epsilon = 1e-14);
        assert_relative_eq!(e.resisting_force().amax(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_geometric_stiffness_of_prestressed_bar() {
        let (mut reg, mut e) = bound(3, [1.0, 0.0, 0.0], 100.0);
        displace(&mut reg, 2, &[0.1, 0.0, 0.0]);
        e.update(&reg).unwrap();
        let k = e.tangent_stiffness().clone();
        // N = 10, Ln = 1.1: transverse stiffness N/Ln
        assert_relative_eq!(k[(1, 1)], 10.0 / 1.1, epsilon = 1e-12);
        assert_relative_eq!(k[(4, 1)], -10.0 / 1.1, epsilon = 1e-12);
        // axial: EA Ln^2/(Ln^2 Lo) + N/Ln - N/Ln
        assert_relative_eq!(k[(0, 0)], 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tangent_matches_finite_difference() {
        let (mut reg, mut e) = bound(3, [1.0, 0.5, -0.3], 250.0);
        let u = [0.04, -0.03, 0.02];
        displace(&mut reg, 2, &u);
        e.update(&reg).unwrap();
        let k = e.tangent_stiffness().clone();
        assert!(asymmetry(&k) < 1e-10);

        let h = 1e-7;
        let mut fd = Mat::zeros(6, 6);
        for j in 0..3 {
            let mut up = u;
            up[j] += h;
            displace(&mut reg, 2, &up);
            e.update(&reg).unwrap();
            let fp = e.resisting_force().clone();
            let mut um = u;
            um[j] -= h;
            displace(&mut reg, 2, &um);
            e.update(&reg).unwrap();
            let fm = e.resisting_force().clone();
            fd.set_column(j + 3, &((fp - fm) / (2.0 * h)));
        }
        for i in 0..6 {
            for j in 3..6 {
                assert_relative_eq!(fd[(i, j)], k[(i, j)], epsilon = 1e-4, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn test_initial_stiffness_along_axis() {
        let (_, mut e) = bound(3, [0.0, 3.0, 4.0], 50.0);
        let k = e.initial_stiffness().clone();
        assert_relative_eq!(k[(1, 1)], 10.0 * 0.36, epsilon = 1e-12);
        assert_relative_eq!(k[(2, 2)], 10.0 * 0.64, epsilon = 1e-12);
        assert_relative_eq!(k[(0, 0)], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_plastic_cycle_with_commit() {
        let steel = ElasticPerfectlyPlastic::new(1000.0, 5.0).unwrap();
        let mut reg = NodeRegistry::new();
        reg.add(1, Node::new(0.0, 0.0, 0.0, 2)).unwrap();
        reg.add(2, Node::new(1.0, 0.0, 0.0, 2)).unwrap();
        let section = Section1d::new(UniaxialModel::from(steel), ResponseCode::P);
        let mut e = CorotTrussSection::new(1, 2, [1, 2], section.into()).unwrap();
        e.set_domain(&reg).unwrap();

        displace(&mut reg, 2, &[0.01, 0.0]);
        e.update(&reg).unwrap();
        assert_relative_eq!(e.axial_force(), 5.0);
        e.commit_state().unwrap();

        displace(&mut reg, 2, &[0.0, 0.0]);
        e.update(&reg).unwrap();
        // elastic unloading from the plastic strain 0.005
        assert_relative_eq!(e.axial_force(), -5.0, epsilon = 1e-12);
        e.revert_to_last_commit().unwrap();
        assert_relative_eq!(e.axial_force(), 5.0);
    }

    #[test]
    fn test_unpack_rejects_truncated_section() {
        let (mut reg, mut e) = bound(3, [1.0, 0.0, 0.0], 10.0);
        displace(&mut reg, 2, &[0.1, 0.0, 0.0]);
        e.update(&reg).unwrap();
        let packed = e.pack().unwrap();

        let mut broken = packed.clone();
        broken["state"]["section"]["tangent"] =
            serde_json::to_value(Mat::zeros(2, 2)).unwrap();
        let (_, mut other) = bound(3, [1.0, 0.0, 0.0], 10.0);
        assert!(other.unpack(&broken).is_err());
        assert_eq!(other.axial_force(), 0.0);

        let mut collapsed = packed.clone();
        collapsed["state"]["ln"] = serde_json::json!(0.0);
        assert!(other.unpack(&collapsed).is_err());

        other.unpack(&packed).unwrap();
        assert_relative_eq!(other.axial_force(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unsupported_dofs_degrade_to_six() {
        let mut reg = NodeRegistry::new();
        reg.add(1, Node::new(0.0, 0.0, 0.0, 1)).unwrap();
        reg.add(2, Node::new(1.0, 0.0, 0.0, 1)).unwrap();
        let mut e = CorotTrussSection::new(1, 2, [1, 2], section(1.0)).unwrap();
        assert!(e.set_domain(&reg).is_err());
        assert_eq!(e.num_dof(), 6);
        assert_eq!(e.tangent_stiffness().nrows(), 6);
        assert!(e.update(&reg).is_err());
    }
}
