//! Displacement-based 2D beam-column
//!
//! Sections sit at Gauss-Legendre points along the member. Axial strain is
//! constant and curvature varies linearly between the ends, so the element
//! is exact for end-loaded linear elastic members. The coordinate
//! transformation is linear: the basic system is `[v0, theta_I, theta_J]`
//! with rigid-body modes removed.

use nalgebra::{DMatrix, DVector, Vector3};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    reject_load, skip_load_on_dead, unknown_response, unpack_element, Element, ElementCore,
    HasAxialResponse, HasBendingResponse, HasScratch, HasShearResponse, Scratch,
};
use crate::aggregate::ConstitutiveAggregate;
use crate::config::ElementOptions;
use crate::error::{FEAError, FEAResult};
use crate::loads::{BeamMecLoad2d, ElementalLoad, LoadKind};
use crate::material::{ConstitutiveModel, SectionModel};
use crate::math::GaussRule1d;
use crate::node::NodeProvider;
use crate::pack::{self, check_len, CheckPacked};
use crate::response::{ResponseCode, ResponseId};

const CLASS_NAME: &str = "DispBeamColumn2d";

const NUM_DOF: usize = 6;

/// DOFs per node: ux, uy, rz
const NODE_DOF: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispBeamColumn2d {
    core: ElementCore,
    sections: ConstitutiveAggregate,
    /// Section positions and weights on [0, 1]
    rule: GaussRule1d,
    length: f64,
    cos: f64,
    sin: f64,
    /// Basic deformations of the last update
    basic_deformation: Vector3<f64>,
    /// Section deformations of the last update, net of the persistent offset
    strains: Vec<DVector<f64>>,
    persistent: Vec<DVector<f64>>,
    /// Simply supported reactions `[axial I, transverse I, transverse J]`
    p0: Vector3<f64>,
    /// Fixed end forces in the basic system
    q0: Vector3<f64>,
    #[serde(skip)]
    scratch: Scratch,
}

impl DispBeamColumn2d {
    /// Create a beam-column with `num_sections` integration points.
    ///
    /// # Arguments
    /// * `tag` - element tag
    /// * `nodes` - end node tags I and J
    /// * `section` - prototype section, needs both `P` and `Mz`
    /// * `num_sections` - Gauss-Legendre points, 1 to 5
    pub fn new(tag: usize, nodes: [usize; 2], section: SectionModel, num_sections: usize) -> FEAResult<Self> {
        let codes = section.response_type();
        if !codes.contains(ResponseCode::P) || !codes.contains(ResponseCode::Mz) {
            return Err(FEAError::Section(format!(
                "{CLASS_NAME} needs P and Mz, got {} with layout {}",
                section.kind(),
                codes
            )));
        }
        let rule = GaussRule1d::legendre(num_sections)?.on_unit_interval();
        let order = section.order();
        Ok(Self {
            core: ElementCore::new(tag, nodes.to_vec()),
            sections: ConstitutiveAggregate::new(num_sections, &section)?,
            rule,
            length: 0.0,
            cos: 1.0,
            sin: 0.0,
            basic_deformation: Vector3::zeros(),
            strains: vec![DVector::zeros(order); num_sections],
            persistent: vec![DVector::zeros(order); num_sections],
            p0: Vector3::zeros(),
            q0: Vector3::zeros(),
            scratch: Scratch::new(NUM_DOF),
        })
    }

    /// Set element options
    pub fn with_options(mut self, options: ElementOptions) -> Self {
        self.core.options = options;
        self
    }

    /// Sections at the integration points
    pub fn sections(&self) -> &ConstitutiveAggregate {
        &self.sections
    }

    /// Member length, zero until bound
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Relative positions of the sections along the member
    pub fn section_locations(&self) -> &[f64] {
        &self.rule.points
    }

    /// Basic forces `[N, M_I, M_J]`, fixed end forces included
    pub fn basic_force(&self) -> Vector3<f64> {
        let mut q = self.q0;
        if self.length == 0.0 {
            return q;
        }
        for (i, (xi, w)) in self.rule.points.iter().zip(&self.rule.weights).enumerate() {
            let b = self.section_b(*xi);
            let f = b.transpose() * self.sections[i].stress() * (w * self.length);
            q += Vector3::from_column_slice(f.as_slice());
        }
        q
    }

    fn codes(&self) -> &ResponseId {
        self.sections.response_type()
    }

    /// Section deformation from basic deformations at `xi`, order x 3
    fn section_b(&self, xi: f64) -> DMatrix<f64> {
        let codes = self.codes();
        let mut b = DMatrix::zeros(codes.len(), 3);
        let inv_l = 1.0 / self.length;
        for (row, code) in codes.iter().enumerate() {
            match code {
                ResponseCode::P => b[(row, 0)] = inv_l,
                ResponseCode::Mz => {
                    b[(row, 1)] = (6.0 * xi - 4.0) * inv_l;
                    b[(row, 2)] = (6.0 * xi - 2.0) * inv_l;
                }
                _ => {}
            }
        }
        b
    }

    /// Basic deformations from global displacements, 3 x 6
    fn transformation(&self) -> DMatrix<f64> {
        let (c, s) = (self.cos, self.sin);
        let inv_l = 1.0 / self.length;
        let mut a = DMatrix::zeros(3, NUM_DOF);
        // v0 = uJ' - uI'
        a[(0, 0)] = -c;
        a[(0, 1)] = -s;
        a[(0, 3)] = c;
        a[(0, 4)] = s;
        // end rotation minus chord rotation (vJ' - vI') / L
        for (row, rot) in [(1, 2), (2, 5)] {
            a[(row, 0)] = -s * inv_l;
            a[(row, 1)] = c * inv_l;
            a[(row, 3)] = s * inv_l;
            a[(row, 4)] = -c * inv_l;
            a[(row, rot)] = 1.0;
        }
        a
    }

    fn fill_stiffness(&mut self, initial: bool) {
        let factor = self.core.activity_factor();
        self.scratch.stiff.fill(0.0);
        if self.length == 0.0 {
            return;
        }
        let mut kb = DMatrix::zeros(3, 3);
        for (i, (xi, w)) in self.rule.points.iter().zip(&self.rule.weights).enumerate() {
            let section = &self.sections[i];
            let ks = if initial {
                section.initial_tangent()
            } else {
                section.tangent()
            };
            let b = self.section_b(*xi);
            kb += b.transpose() * ks * &b * (w * self.length);
        }
        let a = self.transformation();
        self.scratch.stiff = a.transpose() * kb * a * factor;
    }

    fn lumped_mass(&self) -> f64 {
        0.5 * self.sections[0].rho() * self.length * self.core.activity_factor()
    }

    fn unbound_error(&self) -> FEAError {
        FEAError::InvalidGeometry(format!("{CLASS_NAME} {} has no valid geometry", self.core.tag))
    }

    fn degrade(&mut self) {
        self.length = 0.0;
        self.scratch.allocate(NUM_DOF);
    }
}

impl CheckPacked for DispBeamColumn2d {
    fn check_packed(&self) -> FEAResult<()> {
        self.core.check_packed(2)?;
        let codes = self.codes();
        if !codes.contains(ResponseCode::P) || !codes.contains(ResponseCode::Mz) {
            return Err(FEAError::Section(format!("{CLASS_NAME} sections with layout {codes}")));
        }
        let n = self.sections.len();
        check_len("integration weights", self.rule.weights.len(), n)?;
        check_len("integration points", self.rule.points.len(), n)?;
        check_len("section strains", self.strains.len(), n)?;
        check_len("persistent strains", self.persistent.len(), n)?;
        let order = self.sections.order();
        for e in self.strains.iter().chain(&self.persistent) {
            check_len("section strain", e.len(), order)?;
        }
        if !(self.length >= 0.0 && self.length.is_finite()) {
            return Err(FEAError::InvalidInput(format!("length {}", self.length)));
        }
        Ok(())
    }
}

impl HasScratch for DispBeamColumn2d {
    fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }
}

impl HasAxialResponse for DispBeamColumn2d {
    fn axial_force(&self) -> f64 {
        self.basic_force()[0]
    }

    fn axial_deformation(&self) -> f64 {
        self.basic_deformation[0]
    }
}

impl HasBendingResponse for DispBeamColumn2d {
    /// End moments `[M_I, M_J]`
    fn bending_moments(&self) -> DVector<f64> {
        let q = self.basic_force();
        DVector::from_vec(vec![q[1], q[2]])
    }
}

impl HasShearResponse for DispBeamColumn2d {
    /// Shear from the end moments, `(M_I + M_J) / L`
    fn shear_forces(&self) -> DVector<f64> {
        if self.length == 0.0 {
            return DVector::zeros(1);
        }
        let q = self.basic_force();
        DVector::from_element(1, (q[1] + q[2]) / self.length)
    }
}

impl Element for DispBeamColumn2d {
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
        NUM_DOF
    }

    fn set_domain(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()> {
        self.scratch.allocate(NUM_DOF);
        let ndf = match self.core.common_dof(nodes) {
            Ok(ndf) => ndf,
            Err(e) => {
                log::warn!("{CLASS_NAME} {}: {e}, element degraded", self.core.tag);
                self.degrade();
                return Err(e);
            }
        };
        if ndf != NODE_DOF {
            log::warn!(
                "{CLASS_NAME} {}: nodes carry {ndf} DOF, {NODE_DOF} required, element degraded",
                self.core.tag
            );
            self.degrade();
            return Err(FEAError::InvalidInput(format!(
                "{CLASS_NAME} {}: nodes carry {ndf} DOF, {NODE_DOF} required",
                self.core.tag
            )));
        }
        let x1 = nodes.coordinates(self.core.nodes[0])?;
        let x2 = nodes.coordinates(self.core.nodes[1])?;
        let (dx, dy) = (x2[0] - x1[0], x2[1] - x1[1]);
        let length = dx.hypot(dy);
        if length <= self.core.options.geometry_tolerance {
            self.degrade();
            return Err(FEAError::InvalidGeometry(format!(
                "{CLASS_NAME} {} has zero length",
                self.core.tag
            )));
        }
        self.length = length;
        self.cos = dx / length;
        self.sin = dy / length;
        Ok(())
    }

    fn update(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()> {
        if self.length == 0.0 {
            return Err(self.unbound_error());
        }
        let mut u = DVector::zeros(NUM_DOF);
        for (k, tag) in self.core.nodes.iter().enumerate() {
            let d = nodes.trial_displacement(*tag)?;
            u.rows_mut(NODE_DOF * k, NODE_DOF).copy_from(&d.rows(0, NODE_DOF));
        }
        let v = self.transformation() * u;
        self.basic_deformation = Vector3::new(v[0], v[1], v[2]);
        for (i, xi) in self.rule.points.iter().enumerate() {
            self.strains[i] = self.section_b(*xi) * &v - &self.persistent[i];
        }
        self.sections.set_trial_deformations(&self.strains)
    }

    fn tangent_stiffness(&mut self) -> &DMatrix<f64> {
        self.fill_stiffness(false);
        &self.scratch.stiff
    }

    fn initial_stiffness(&mut self) -> &DMatrix<f64> {
        self.fill_stiffness(true);
        &self.scratch.stiff
    }

    fn resisting_force(&mut self) -> &DVector<f64> {
        self.scratch.resid.fill(0.0);
        if self.length == 0.0 {
            return &self.scratch.resid;
        }
        let q = self.basic_force();
        let mut p = self.transformation().transpose() * DVector::from_column_slice(q.as_slice());
        // reactions of the simply supported member, local to global
        let (c, s) = (self.cos, self.sin);
        p[0] += c * self.p0[0] - s * self.p0[1];
        p[1] += s * self.p0[0] + c * self.p0[1];
        p[3] -= s * self.p0[2];
        p[4] += c * self.p0[2];
        self.scratch.resid = p * self.core.activity_factor();
        &self.scratch.resid
    }

    fn resisting_force_inc_inertia(&mut self, nodes: &dyn NodeProvider) -> FEAResult<&DVector<f64>> {
        self.resisting_force();
        let m = self.lumped_mass();
        if m != 0.0 {
            for (k, tag) in self.core.nodes.iter().enumerate() {
                let a = nodes.trial_acceleration(*tag)?;
                for d in 0..2 {
                    self.scratch.resid[NODE_DOF * k + d] += m * a[d];
                }
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
        for i in [0, 1, 3, 4] {
            self.scratch.mass[(i, i)] = m;
        }
        &self.scratch.mass
    }

    fn add_load(&mut self, load: &ElementalLoad, factor: f64) -> FEAResult<()> {
        if skip_load_on_dead(self, load) {
            return Ok(());
        }
        let mechanical: &dyn BeamMecLoad2d = match &load.kind {
            LoadKind::BeamStrain(strain) => {
                let codes = self.codes().clone();
                let incs: Vec<DVector<f64>> = self
                    .rule
                    .points
                    .iter()
                    .map(|xi| strain.section_deformation(*xi, &codes, factor))
                    .collect();
                return self.sections.increment_initial_deformations(&incs);
            }
            LoadKind::BeamPoint2d(point) => point,
            LoadKind::BeamUniform2d(uniform) => uniform,
            _ => return Err(reject_load(self, load)),
        };
        if self.length == 0.0 {
            return Err(self.unbound_error());
        }
        mechanical.add_fixed_end_forces(self.length, factor, &mut self.p0, &mut self.q0);
        Ok(())
    }

    fn zero_load(&mut self) {
        self.p0.fill(0.0);
        self.q0.fill(0.0);
        self.sections.zero_initial_deformations();
    }

    fn commit_state(&mut self) -> FEAResult<()> {
        self.sections.commit_state()
    }

    fn revert_to_last_commit(&mut self) -> FEAResult<()> {
        self.sections.revert_to_last_commit()
    }

    fn revert_to_start(&mut self) -> FEAResult<()> {
        for e in self.strains.iter_mut().chain(self.persistent.iter_mut()) {
            e.fill(0.0);
        }
        self.basic_deformation.fill(0.0);
        self.sections.revert_to_start()
    }

    fn fold_current_deformation(&mut self) {
        for (p, e) in self.persistent.iter_mut().zip(self.strains.iter_mut()) {
            *p += &*e;
            e.fill(0.0);
        }
    }

    fn response(&mut self, name: &str) -> FEAResult<DVector<f64>> {
        match name {
            "force" | "forces" | "globalForce" | "globalForces" => Ok(self.resisting_force().clone()),
            "basicForce" | "basicForces" => Ok(DVector::from_column_slice(self.basic_force().as_slice())),
            "basicDeformation" | "chordRotation" => {
                Ok(DVector::from_column_slice(self.basic_deformation.as_slice()))
            }
            "axialForce" => Ok(DVector::from_element(1, self.axial_force())),
            "moments" => Ok(self.bending_moments()),
            "shear" => Ok(self.shear_forces()),
            "integrationPoints" => Ok(DVector::from_iterator(
                self.rule.len(),
                self.rule.points.iter().map(|xi| xi * self.length),
            )),
            _ => match name.parse::<ResponseCode>() {
                Ok(code) if self.codes().contains(code) => Ok(self.sections.stress_at_each_point(code)),
                _ => Err(unknown_response(self, name)),
            },
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
    use crate::deformation::DeformationPlane;
    use crate::loads::{BeamPointLoad2d, BeamStrainLoad, BeamUniformLoad2d, ShellUniformLoad};
    use crate::material::{ElasticBeamSection, ElasticUniaxial, Section1d, UniaxialModel};
    use crate::math::asymmetry;
    use crate::node::{Node, NodeRegistry};
    use approx::assert_relative_eq;

    const E: f64 = 200.0;
    const A: f64 = 0.5;
    const I: f64 = 0.02;

    fn section() -> SectionModel {
        ElasticBeamSection::planar(E, A, I).unwrap().with_rho(3.0).into()
    }

    fn bound(end: [f64; 2]) -> (NodeRegistry, DispBeamColumn2d) {
        let mut reg = NodeRegistry::new();
        reg.add(1, Node::new(0.0, 0.0, 0.0, 3)).unwrap();
        reg.add(2, Node::new(end[0], end[1], 0.0, 3)).unwrap();
        let mut e = DispBeamColumn2d::new(1, [1, 2], section(), 3).unwrap();
        e.set_domain(&reg).unwrap();
        (reg, e)
    }

    fn displace(reg: &mut NodeRegistry, tag: usize, u: [f64; 3]) {
        reg.get_mut(tag).unwrap().set_trial_displacement(&DVector::from_row_slice(&u)).unwrap();
    }

    #[test]
    fn test_horizontal_stiffness() {
        let (_, mut e) = bound([2.0, 0.0]);
        let k = e.tangent_stiffness().clone();
        let l = 2.0;
        assert_relative_eq!(k[(3, 3)], E * A / l, epsilon = 1e-10);
        assert_relative_eq!(k[(4, 4)], 12.0 * E * I / l.powi(3), epsilon = 1e-10);
        assert_relative_eq!(k[(5, 5)], 4.0 * E * I / l, epsilon = 1e-10);
        assert_relative_eq!(k[(2, 5)], 2.0 * E * I / l, epsilon = 1e-10);
        assert_relative_eq!(k[(1, 2)], 6.0 * E * I / (l * l), epsilon = 1e-10);
        assert!(asymmetry(&k) < 1e-12);
    }

    #[test]
    fn test_rigid_body_motion_is_force_free() {
        let (mut reg, mut e) = bound([3.0, 4.0]);
        let theta = 0.01;
        displace(&mut reg, 1, [0.2, -0.1, theta]);
        displace(&mut reg, 2, [0.2 - theta * 4.0, -0.1 + theta * 3.0, theta]);
        e.update(&reg).unwrap();
        assert!(e.resisting_force().amax() < 1e-12);
    }

    #[test]
    fn test_tip_load_cantilever() {
        let (mut reg, mut e) = bound([0.0, 2.0]);
        // vertical member, lateral tip displacement along -x with no rotation
        displace(&mut reg, 2, [-0.01, 0.0, 0.0]);
        e.update(&reg).unwrap();
        let p = e.resisting_force().clone();
        let k = 12.0 * E * I / 8.0;
        assert_relative_eq!(p[3], -0.01 * k, epsilon = 1e-10);
        assert_relative_eq!(p[0], 0.01 * k, epsilon = 1e-10);
        let m = e.bending_moments();
        assert_relative_eq!(m[0], m[1], epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_load_fixed_end_forces() {
        let (_, mut e) = bound([2.0, 0.0]);
        let load = ElementalLoad::new(5, vec![1], BeamUniformLoad2d::new(3.0, 0.0));
        e.add_load(&load, 1.0).unwrap();
        let p = e.resisting_force().clone();
        assert_relative_eq!(p[1], -3.0, epsilon = 1e-12);
        assert_relative_eq!(p[4], -3.0, epsilon = 1e-12);
        assert_relative_eq!(p[2], -1.0, epsilon = 1e-12);
        assert_relative_eq!(p[5], 1.0, epsilon = 1e-12);
        e.zero_load();
        assert_eq!(e.resisting_force().amax(), 0.0);
    }

    #[test]
    fn test_point_load_on_inclined_member() {
        let (_, mut e) = bound([0.0, 4.0]);
        let load = ElementalLoad::new(5, vec![1], BeamPointLoad2d::new(0.0, 2.0, 0.25).unwrap());
        e.add_load(&load, 1.0).unwrap();
        let p = e.resisting_force().clone();
        // axial load shared 3/4 at I and 1/4 at J, along global y
        assert_relative_eq!(p[1] + p[4], -2.0, epsilon = 1e-12);
        assert_relative_eq!(p[1], -1.5, epsilon = 1e-12);
        assert_relative_eq!(p[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_thermal_strain_load() {
        let (reg, mut e) = bound([2.0, 0.0]);
        let load = BeamStrainLoad::uniform(DeformationPlane::constant(1e-3));
        e.add_load(&ElementalLoad::new(1, vec![1], load), 2.0).unwrap();
        e.update(&reg).unwrap();
        assert_relative_eq!(e.axial_force(), -E * A * 2e-3, epsilon = 1e-12);
        assert_relative_eq!(e.bending_moments().amax(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_shell_load_rejected() {
        let (_, mut e) = bound([2.0, 0.0]);
        let load = ElementalLoad::new(9, vec![1], ShellUniformLoad::normal(1.0));
        assert!(matches!(
            e.add_load(&load, 1.0),
            Err(FEAError::UnsupportedLoad { element: 1, .. })
        ));
        assert_eq!(e.resisting_force().amax(), 0.0);
    }

    #[test]
    fn test_section_needs_bending() {
        let axial = Section1d::new(UniaxialModel::from(ElasticUniaxial::new(1.0).unwrap()), ResponseCode::P);
        assert!(matches!(
            DispBeamColumn2d::new(1, [1, 2], axial.into(), 2),
            Err(FEAError::Section(_))
        ));
        assert!(DispBeamColumn2d::new(1, [1, 2], section(), 6).is_err());
    }

    #[test]
    fn test_dof_mismatch_degrades() {
        let mut reg = NodeRegistry::new();
        reg.add(1, Node::new(0.0, 0.0, 0.0, 2)).unwrap();
        reg.add(2, Node::new(1.0, 0.0, 0.0, 2)).unwrap();
        let mut e = DispBeamColumn2d::new(1, [1, 2], section(), 2).unwrap();
        assert!(e.set_domain(&reg).is_err());
        assert_eq!(e.num_dof(), 6);
        assert!(e.update(&reg).is_err());
        assert_eq!(e.tangent_stiffness().amax(), 0.0);
    }

    #[test]
    fn test_lumped_mass() {
        let (_, mut e) = bound([2.0, 0.0]);
        let m = e.mass().clone();
        assert_relative_eq!(m[(0, 0)], 3.0, epsilon = 1e-12);
        assert_relative_eq!(m[(4, 4)], 3.0, epsilon = 1e-12);
        assert_eq!(m[(2, 2)], 0.0);
    }

    #[test]
    fn test_commit_and_revert() {
        let (mut reg, mut e) = bound([1.0, 0.0]);
        displace(&mut reg, 2, [0.01, 0.0, 0.0]);
        e.update(&reg).unwrap();
        e.commit_state().unwrap();
        assert_relative_eq!(e.axial_force(), E * A * 0.01, epsilon = 1e-10);
        displace(&mut reg, 2, [0.02, 0.0, 0.0]);
        e.update(&reg).unwrap();
        e.revert_to_last_commit().unwrap();
        assert_relative_eq!(e.axial_force(), E * A * 0.01, epsilon = 1e-10);
        e.revert_to_start().unwrap();
        assert_eq!(e.axial_force(), 0.0);
    }

    #[test]
    fn test_kill_and_reactivate() {
        let (mut reg, mut e) = bound([2.0, 0.0]);
        e.kill();
        displace(&mut reg, 2, [0.01, 0.02, 0.0]);
        e.update(&reg).unwrap();
        assert!(e.resisting_force().amax() < 1e-3);
        e.alive();
        e.update(&reg).unwrap();
        assert!(e.resisting_force().amax() < 1e-12);
    }

    #[test]
    fn test_pack_restores_loads() {
        let (_, mut e) = bound([2.0, 0.0]);
        e.add_load(&ElementalLoad::new(5, vec![1], BeamUniformLoad2d::new(1.0, 0.5)), 1.0)
            .unwrap();
        let packed = e.pack().unwrap();
        let mut other = DispBeamColumn2d::new(1, [1, 2], section(), 3).unwrap();
        other.unpack(&packed).unwrap();
        assert_eq!(other.resisting_force(), e.resisting_force());
    }

    #[test]
    fn test_unpack_rejects_section_count_mismatch() {
        let mut reg = NodeRegistry::new();
        reg.add(1, Node::new(0.0, 0.0, 0.0, 3)).unwrap();
        reg.add(2, Node::new(2.0, 0.0, 0.0, 3)).unwrap();
        let mut e = DispBeamColumn2d::new(1, [1, 2], section(), 4).unwrap();
        e.set_domain(&reg).unwrap();
        displace(&mut reg, 2, [0.01, 0.02, 0.0]);
        e.update(&reg).unwrap();
        let packed = e.pack().unwrap();

        let mut truncated = packed.clone();
        let members = truncated["state"]["sections"].as_array_mut().unwrap();
        members.truncate(2);
        let mut other = DispBeamColumn2d::new(1, [1, 2], section(), 4).unwrap();
        assert!(matches!(other.unpack(&truncated), Err(FEAError::InvalidInput(_))));

        let mut emptied = packed.clone();
        emptied["state"]["sections"] = serde_json::json!([]);
        assert!(matches!(other.unpack(&emptied), Err(FEAError::SerializationError(_))));

        // the failed attempts left the element untouched and usable
        assert_eq!(other.sections().len(), 4);
        assert_eq!(other.resisting_force().amax(), 0.0);
        other.unpack(&packed).unwrap();
        assert_eq!(other.resisting_force(), e.resisting_force());
    }
}
