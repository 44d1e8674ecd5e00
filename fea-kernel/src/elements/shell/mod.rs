//! Flat shell elements with membrane, plate bending, transverse shear and
//! drilling stiffness
//!
//! Each node carries six DOFs `(ux, uy, uz, rx, ry, rz)` in global axes. The
//! strain-displacement operators embed the local basis `g1, g2, g3`, so they
//! act directly on global nodal displacements. Generalized strains are
//! ordered like a membrane-plate section:
//!
//! ```text
//! [eps11, eps22, gamma12, kappa11, kappa22, 2 kappa12, gamma13, gamma23]
//! ```
//!
//! The bending block of the section tangent is negative, so the bending rows
//! change sign when stresses are integrated back into nodal forces.

mod corotational;
mod mitc4;
mod mitc9;

pub use corotational::{CorotShell, CorotShellMITC4, CorotShellMITC9};
pub use mitc4::Mitc4;
pub use mitc9::Mitc9;

use std::marker::PhantomData;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    reject_load, skip_load_on_dead, unknown_response, Element, ElementCore, HasBendingResponse,
    HasShearResponse, Scratch,
};
use crate::aggregate::ConstitutiveAggregate;
use crate::config::ElementOptions;
use crate::error::{FEAError, FEAResult};
use crate::loads::{ElementalLoad, LoadKind};
use crate::material::{check_order, ConstitutiveModel, SectionModel};
use crate::math::{min_eigenvalue, GaussPoint2d, Mat3, ShapeDerivatives, ShapeValues, Vec3};
use crate::node::NodeProvider;
use crate::pack::{self, check_len, CheckPacked};
use crate::response::{ResponseCode, ResponseId};

/// 4-node shell with assumed transverse shear
pub type ShellMITC4 = Shell<Mitc4>;

/// 9-node Lagrangian shell
pub type ShellMITC9 = Shell<Mitc9>;

/// DOFs per shell node
pub const NODE_DOF: usize = 6;

/// Generalized strains per integration point
const NSTRESS: usize = 8;

/// What distinguishes one shell formulation from another
pub trait ShellFormulation: std::fmt::Debug + Clone + Default {
    const CLASS_NAME: &'static str;
    /// Name of the corotational variant
    const COROTATIONAL_CLASS_NAME: &'static str;
    const NUM_NODES: usize;
    /// Whether per-point strain loads are accepted
    const ACCEPTS_STRAIN_LOAD: bool;

    fn gauss_points() -> Vec<GaussPoint2d>;

    fn shape(r: f64, s: f64) -> ShapeValues;

    /// Transverse shear operator in local plate DOFs `(w, theta1, theta2)`,
    /// of size 2 x (3 * NUM_NODES)
    fn shear_b(xl: &[[f64; 2]], gp: &GaussPoint2d, d: &ShapeDerivatives) -> FEAResult<DMatrix<f64>>;
}

/// Orthonormal basis of the element mid-plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShellBasis {
    pub g1: Vec3,
    pub g2: Vec3,
    pub g3: Vec3,
}

impl ShellBasis {
    /// Basis from the four corner nodes, numbered counter-clockwise.
    ///
    /// `g1` joins the midpoints of edges 4-1 and 2-3, `g2` is the part of
    /// the other median orthogonal to `g1`.
    pub fn from_corners(x: &[Vec3; 4], tol: f64) -> FEAResult<Self> {
        let v1 = 0.5 * (x[1] + x[2] - x[0] - x[3]);
        let v2 = 0.5 * (x[2] + x[3] - x[0] - x[1]);
        let n1 = v1.norm();
        if n1 <= tol {
            return Err(FEAError::InvalidGeometry("shell corners collapse along g1".to_string()));
        }
        let g1 = v1 / n1;
        let v2 = v2 - g1 * g1.dot(&v2);
        let n2 = v2.norm();
        if n2 <= tol {
            return Err(FEAError::InvalidGeometry("shell corners are aligned".to_string()));
        }
        let g2 = v2 / n2;
        let g3 = g1.cross(&g2);
        Ok(Self { g1, g2, g3 })
    }

    /// The global axes
    pub fn identity() -> Self {
        Self {
            g1: Vec3::x(),
            g2: Vec3::y(),
            g3: Vec3::z(),
        }
    }

    /// In-plane coordinates of `x`
    pub fn local(&self, x: &Vec3) -> [f64; 2] {
        [x.dot(&self.g1), x.dot(&self.g2)]
    }

    /// Rotation whose rows are `g1, g2, g3`: global to local components
    pub fn rotation(&self) -> Mat3 {
        Mat3::from_rows(&[self.g1.transpose(), self.g2.transpose(), self.g3.transpose()])
    }
}

/// Geometric data of one integration point
#[derive(Debug, Clone, PartialEq)]
struct GaussData {
    /// Weight times Jacobian determinant
    dvol: f64,
    /// Shape function values
    n: Vec<f64>,
    /// Generalized strains from global nodal displacements, NSTRESS x ndof
    b: DMatrix<f64>,
    /// Drilling strain operator
    drill: DVector<f64>,
}

/// Membrane and bending rows of node `k`, written into columns `col..col+6`
fn fill_membrane_bending(b: &mut DMatrix<f64>, col: usize, n1: f64, n2: f64, basis: &ShellBasis) {
    let (g1, g2) = (&basis.g1, &basis.g2);
    for a in 0..3 {
        // membrane: [N,1 0; 0 N,2; N,2 N,1] * [g1; g2]
        b[(0, col + a)] = n1 * g1[a];
        b[(1, col + a)] = n2 * g2[a];
        b[(2, col + a)] = n2 * g1[a] + n1 * g2[a];
        // bending: [0 -N,1; N,2 0; N,1 -N,2] * [g1; g2]
        b[(3, col + 3 + a)] = -n1 * g2[a];
        b[(4, col + 3 + a)] = n2 * g1[a];
        b[(5, col + 3 + a)] = n1 * g1[a] - n2 * g2[a];
    }
}

/// Shear rows of node `k` from its local operator columns `(w, theta1, theta2)`
fn fill_shear(b: &mut DMatrix<f64>, col: usize, local: &DMatrix<f64>, k: usize, basis: &ShellBasis) {
    for row in 0..2 {
        let bw = local[(row, 3 * k)];
        let bt1 = local[(row, 3 * k + 1)];
        let bt2 = local[(row, 3 * k + 2)];
        for a in 0..3 {
            b[(6 + row, col + a)] = bw * basis.g3[a];
            b[(6 + row, col + 3 + a)] = bt1 * basis.g1[a] + bt2 * basis.g2[a];
        }
    }
}

/// Drilling operator `[-N,2/2  N,1/2  0 | 0 0 -N]` in global axes
fn fill_drill(drill: &mut DVector<f64>, col: usize, n: f64, n1: f64, n2: f64, basis: &ShellBasis) {
    let b1 = -0.5 * n2;
    let b2 = 0.5 * n1;
    for a in 0..3 {
        drill[col + a] = b1 * basis.g1[a] + b2 * basis.g2[a];
        drill[col + 3 + a] = -n * basis.g3[a];
    }
}

/// Change the sign of the bending rows of a stress vector
fn flip_bending(v: &mut DVector<f64>) {
    for i in 3..6 {
        v[i] = -v[i];
    }
}

/// Flat shell element parameterised by its formulation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Shell<F: ShellFormulation> {
    core: ElementCore,
    sections: ConstitutiveAggregate,
    /// Drilling penalty
    ktt: f64,
    basis: Option<ShellBasis>,
    /// In-plane nodal coordinates
    xl: Vec<[f64; 2]>,
    /// Drilling strain of the last update, one per point
    drill_strain: Vec<f64>,
    /// Generalized strain of the last update, net of the persistent offset
    strains: Vec<DVector<f64>>,
    /// Strain locked in while the element was dead, one per point
    persistent: Vec<DVector<f64>>,
    persistent_drill: Vec<f64>,
    /// Equivalent nodal forces of surface loads
    p0: DVector<f64>,
    #[serde(skip)]
    gauss: Vec<GaussData>,
    #[serde(skip)]
    scratch: Scratch,
    #[serde(skip)]
    formulation: PhantomData<F>,
}

impl<F: ShellFormulation> Shell<F> {
    fn build(tag: usize, nodes: Vec<usize>, section: SectionModel) -> FEAResult<Self> {
        if *section.response_type() != ResponseId::membrane_plate() {
            return Err(FEAError::Section(format!(
                "{} needs a membrane-plate section, got {} with layout {}",
                F::CLASS_NAME,
                section.kind(),
                section.response_type()
            )));
        }
        let ngauss = F::gauss_points().len();
        let ndof = NODE_DOF * F::NUM_NODES;
        Ok(Self {
            core: ElementCore::new(tag, nodes),
            sections: ConstitutiveAggregate::new(ngauss, &section)?,
            ktt: 0.0,
            basis: None,
            xl: Vec::new(),
            drill_strain: vec![0.0; ngauss],
            strains: vec![DVector::zeros(NSTRESS); ngauss],
            persistent: vec![DVector::zeros(NSTRESS); ngauss],
            persistent_drill: vec![0.0; ngauss],
            p0: DVector::zeros(ndof),
            gauss: Vec::new(),
            scratch: Scratch::new(ndof),
            formulation: PhantomData,
        })
    }

    /// Set element options
    pub fn with_options(mut self, options: ElementOptions) -> Self {
        self.core.options = options;
        self
    }

    /// One membrane-plate section per integration point
    pub fn sections(&self) -> &ConstitutiveAggregate {
        &self.sections
    }

    /// Drilling stiffness penalty, known once bound
    pub fn drilling_stiffness(&self) -> f64 {
        self.ktt
    }

    /// Mid-plane basis, known once bound
    pub fn basis(&self) -> Option<&ShellBasis> {
        self.basis.as_ref()
    }

    /// Mid-plane area
    pub fn area(&self) -> f64 {
        self.gauss.iter().map(|g| g.dvol).sum()
    }

    /// Persistent initial deformation at every integration point
    pub fn persistent_deformation(&self) -> &[DVector<f64>] {
        &self.persistent
    }

    fn ndof(&self) -> usize {
        NODE_DOF * F::NUM_NODES
    }

    /// Recompute the integration point operators from the cached geometry
    fn build_gauss_data(&mut self) -> FEAResult<()> {
        let basis = self.basis.ok_or_else(|| {
            FEAError::InvalidGeometry(format!("{} {} is not bound to its nodes", F::CLASS_NAME, self.core.tag))
        })?;
        let tol = self.core.options.geometry_tolerance;
        let ndof = self.ndof();
        let mut gauss = Vec::with_capacity(self.sections.len());
        for gp in F::gauss_points() {
            let d = F::shape(gp.r, gp.s).to_cartesian(&self.xl, tol)?;
            let shear = F::shear_b(&self.xl, &gp, &d)?;
            let mut b = DMatrix::zeros(NSTRESS, ndof);
            let mut drill = DVector::zeros(ndof);
            for k in 0..F::NUM_NODES {
                let col = NODE_DOF * k;
                fill_membrane_bending(&mut b, col, d.dn_dx[k], d.dn_dy[k], &basis);
                fill_shear(&mut b, col, &shear, k, &basis);
                fill_drill(&mut drill, col, d.n[k], d.dn_dx[k], d.dn_dy[k], &basis);
            }
            gauss.push(GaussData {
                dvol: gp.weight * d.det_j,
                n: d.n,
                b,
                drill,
            });
        }
        self.gauss = gauss;
        Ok(())
    }

    fn gather(&self, nodes: &dyn NodeProvider, accel: bool) -> FEAResult<DVector<f64>> {
        let mut u = DVector::zeros(self.ndof());
        for (k, tag) in self.core.nodes.iter().enumerate() {
            let v = if accel {
                nodes.trial_acceleration(*tag)?
            } else {
                nodes.trial_displacement(*tag)?
            };
            u.rows_mut(NODE_DOF * k, NODE_DOF).copy_from(&v.rows(0, NODE_DOF));
        }
        Ok(u)
    }

    /// Check the node DOFs and read the nodal coordinates.
    ///
    /// Clears the cached geometry first, so the element stays unbound when
    /// this or any later binding step fails.
    fn read_coordinates(&mut self, nodes: &dyn NodeProvider) -> FEAResult<Vec<Vec3>> {
        self.gauss.clear();
        self.basis = None;
        self.scratch.allocate(self.ndof());
        let ndf = self.core.common_dof(nodes).map_err(|e| {
            log::warn!("{} {}: {e}, element degraded", F::CLASS_NAME, self.core.tag);
            e
        })?;
        if ndf != NODE_DOF {
            log::warn!(
                "{} {}: nodes carry {ndf} DOF, {NODE_DOF} required, element degraded",
                F::CLASS_NAME,
                self.core.tag
            );
            return Err(FEAError::InvalidInput(format!(
                "{} {}: nodes carry {ndf} DOF, {NODE_DOF} required",
                F::CLASS_NAME,
                self.core.tag
            )));
        }
        self.core
            .nodes
            .iter()
            .map(|tag| nodes.coordinates(*tag))
            .collect()
    }

    /// Cache the operators of `basis` and the in-plane nodal coordinates
    /// `xl`, then the drilling penalty
    fn install_geometry(&mut self, basis: ShellBasis, xl: Vec<[f64; 2]>) -> FEAResult<()> {
        self.xl = xl;
        self.basis = Some(basis);
        if let Err(e) = self.build_gauss_data() {
            self.basis = None;
            self.gauss.clear();
            return Err(e);
        }
        let membrane = self.sections[0].initial_tangent().view((0, 0), (3, 3)).into_owned();
        self.ktt = self.core.options.drilling_scale * min_eigenvalue(&membrane);
        log::debug!(
            "{} {}: area {:.6e}, drilling stiffness {:.6e}",
            F::CLASS_NAME,
            self.core.tag,
            self.area(),
            self.ktt
        );
        Ok(())
    }

    /// Drive the sections with nodal displacements `u` expressed in the axes
    /// the operators were built for
    fn apply_displacements(&mut self, u: &DVector<f64>) -> FEAResult<()> {
        if self.gauss.is_empty() {
            return Err(self.unbound_error());
        }
        for (i, g) in self.gauss.iter().enumerate() {
            self.strains[i] = &g.b * u - &self.persistent[i];
            self.drill_strain[i] = g.drill.dot(u) - self.persistent_drill[i];
        }
        self.sections.set_trial_deformations(&self.strains)
    }

    /// Rebuild the buffers and operators a restored element does not carry
    fn restore_caches(&mut self) -> FEAResult<()> {
        self.scratch.allocate(self.ndof());
        if self.basis.is_some() {
            self.build_gauss_data()?;
        }
        Ok(())
    }

    /// `sum B^T F D B dvol + Ktt dvol bd bd^T`
    fn assemble_stiffness(&mut self, initial: bool) {
        let factor = self.core.activity_factor();
        let k = &mut self.scratch.stiff;
        k.fill(0.0);
        for (i, g) in self.gauss.iter().enumerate() {
            let section = &self.sections[i];
            let mut dd = if initial {
                section.initial_tangent().clone()
            } else {
                section.tangent().clone()
            };
            for r in 3..6 {
                for c in 0..NSTRESS {
                    dd[(r, c)] = -dd[(r, c)];
                }
            }
            dd *= g.dvol;
            *k += g.b.transpose() * (dd * &g.b);
            k.ger(self.ktt * g.dvol, &g.drill, &g.drill, 1.0);
        }
        *k *= factor;
    }

    fn fill_mass(&mut self) {
        let factor = self.core.activity_factor();
        let rho_h = self.sections[0].rho();
        let m = &mut self.scratch.mass;
        m.fill(0.0);
        if rho_h == 0.0 {
            return;
        }
        for g in &self.gauss {
            for j in 0..F::NUM_NODES {
                for k in 0..F::NUM_NODES {
                    let v = rho_h * g.n[j] * g.n[k] * g.dvol * factor;
                    for a in 0..3 {
                        m[(NODE_DOF * j + a, NODE_DOF * k + a)] += v;
                    }
                }
            }
        }
    }

    /// Equivalent nodal forces of a uniform surface load with local
    /// components `local`, in the axes the operators were built for
    fn surface_load_vector(&self, local: Vec3) -> DVector<f64> {
        let mut p = DVector::zeros(self.ndof());
        let Some(basis) = self.basis else {
            return p;
        };
        let w = basis.g1 * local[0] + basis.g2 * local[1] + basis.g3 * local[2];
        for g in &self.gauss {
            for j in 0..F::NUM_NODES {
                let area = g.n[j] * g.dvol;
                for a in 0..3 {
                    p[NODE_DOF * j + a] -= area * w[a];
                }
            }
        }
        p
    }

    fn add_strain_load(&mut self, strains: Vec<DVector<f64>>) -> FEAResult<()> {
        if strains.len() != self.sections.len() {
            return Err(FEAError::InvalidInput(format!(
                "{} {}: strain load has {} points, element has {}",
                F::CLASS_NAME,
                self.core.tag,
                strains.len(),
                self.sections.len()
            )));
        }
        if let Some(bad) = strains.iter().find(|e| e.len() != NSTRESS) {
            return Err(FEAError::OrderMismatch {
                expected: NSTRESS,
                got: bad.len(),
            });
        }
        self.sections.increment_initial_deformations(&strains)
    }

    fn unbound_error(&self) -> FEAError {
        FEAError::InvalidGeometry(format!(
            "{} {} has no valid geometry",
            F::CLASS_NAME,
            self.core.tag
        ))
    }
}

impl<F: ShellFormulation> CheckPacked for Shell<F> {
    fn check_packed(&self) -> FEAResult<()> {
        self.core.check_packed(F::NUM_NODES)?;
        if *self.sections.response_type() != ResponseId::membrane_plate() {
            return Err(FEAError::Section(format!(
                "{} needs membrane-plate sections, got layout {}",
                F::CLASS_NAME,
                self.sections.response_type()
            )));
        }
        let ngauss = F::gauss_points().len();
        check_len("section list", self.sections.len(), ngauss)?;
        check_len("strain list", self.strains.len(), ngauss)?;
        check_len("persistent strain list", self.persistent.len(), ngauss)?;
        check_len("drilling strain list", self.drill_strain.len(), ngauss)?;
        check_len("persistent drilling strain list", self.persistent_drill.len(), ngauss)?;
        for e in self.strains.iter().chain(&self.persistent) {
            check_order(NSTRESS, e)?;
        }
        check_len("surface load vector", self.p0.len(), self.ndof())?;
        if self.basis.is_some() {
            check_len("in-plane coordinates", self.xl.len(), F::NUM_NODES)?;
        }
        if !(self.ktt >= 0.0 && self.ktt.is_finite()) {
            return Err(FEAError::InvalidInput(format!("drilling stiffness {}", self.ktt)));
        }
        Ok(())
    }
}

impl<F: ShellFormulation> HasBendingResponse for Shell<F> {
    /// Mean `[m1, m2, m12]` over the integration points
    fn bending_moments(&self) -> DVector<f64> {
        DVector::from_vec(
            [ResponseCode::M1, ResponseCode::M2, ResponseCode::M12]
                .map(|c| self.sections.mean_stress_component(c))
                .to_vec(),
        )
    }
}

impl<F: ShellFormulation> HasShearResponse for Shell<F> {
    /// Mean `[q13, q23]` over the integration points
    fn shear_forces(&self) -> DVector<f64> {
        DVector::from_vec(
            [ResponseCode::Q13, ResponseCode::Q23]
                .map(|c| self.sections.mean_stress_component(c))
                .to_vec(),
        )
    }
}

impl<F: ShellFormulation + 'static> Element for Shell<F> {
    fn core(&self) -> &ElementCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.core
    }

    fn class_name(&self) -> &'static str {
        F::CLASS_NAME
    }

    fn num_dof(&self) -> usize {
        self.ndof()
    }

    fn set_domain(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()> {
        let coords = self.read_coordinates(nodes)?;
        let corners = [coords[0], coords[1], coords[2], coords[3]];
        let basis = ShellBasis::from_corners(&corners, self.core.options.geometry_tolerance)?;
        let xl = coords.iter().map(|x| basis.local(x)).collect();
        self.install_geometry(basis, xl)
    }

    fn update(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()> {
        if self.gauss.is_empty() {
            return Err(self.unbound_error());
        }
        let u = self.gather(nodes, false)?;
        self.apply_displacements(&u)
    }

    fn tangent_stiffness(&mut self) -> &DMatrix<f64> {
        self.assemble_stiffness(false);
        &self.scratch.stiff
    }

    fn initial_stiffness(&mut self) -> &DMatrix<f64> {
        self.assemble_stiffness(true);
        &self.scratch.stiff
    }

    fn resisting_force(&mut self) -> &DVector<f64> {
        let factor = self.core.activity_factor();
        let r = &mut self.scratch.resid;
        r.fill(0.0);
        if self.gauss.is_empty() {
            return &self.scratch.resid;
        }
        for (i, g) in self.gauss.iter().enumerate() {
            let mut stress = self.sections[i].stress().clone();
            flip_bending(&mut stress);
            r.gemv_tr(g.dvol, &g.b, &stress, 1.0);
            r.axpy(self.ktt * self.drill_strain[i] * g.dvol, &g.drill, 1.0);
        }
        *r += &self.p0;
        *r *= factor;
        &self.scratch.resid
    }

    fn resisting_force_inc_inertia(&mut self, nodes: &dyn NodeProvider) -> FEAResult<&DVector<f64>> {
        self.resisting_force();
        if self.sections[0].rho() != 0.0 {
            let a = self.gather(nodes, true)?;
            self.fill_mass();
            let inertia = &self.scratch.mass * a;
            self.scratch.resid += inertia;
        }
        Ok(&self.scratch.resid)
    }

    fn mass(&mut self) -> &DMatrix<f64> {
        self.fill_mass();
        &self.scratch.mass
    }

    fn add_load(&mut self, load: &ElementalLoad, factor: f64) -> FEAResult<()> {
        if skip_load_on_dead(self, load) {
            return Ok(());
        }
        match &load.kind {
            LoadKind::ShellUniform(w) => {
                if self.gauss.is_empty() {
                    return Err(self.unbound_error());
                }
                self.p0 += self.surface_load_vector(w.local_vector(factor));
                Ok(())
            }
            LoadKind::ShellStrain(strain) if F::ACCEPTS_STRAIN_LOAD => {
                self.add_strain_load(strain.scaled_strains(factor))
            }
            _ => Err(reject_load(self, load)),
        }
    }

    fn zero_load(&mut self) {
        self.p0.fill(0.0);
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
        self.drill_strain.fill(0.0);
        self.persistent_drill.fill(0.0);
        self.sections.revert_to_start()
    }

    fn fold_current_deformation(&mut self) {
        for (p, e) in self.persistent.iter_mut().zip(&self.strains) {
            *p += e;
        }
        for (p, e) in self.persistent_drill.iter_mut().zip(&self.drill_strain) {
            *p += e;
        }
        for e in &mut self.strains {
            e.fill(0.0);
        }
        self.drill_strain.fill(0.0);
    }

    fn response(&mut self, name: &str) -> FEAResult<DVector<f64>> {
        match name {
            "force" | "forces" | "globalForce" | "globalForces" => Ok(self.resisting_force().clone()),
            "stresses" => Ok(DVector::from_row_slice(self.sections.stresses().transpose().as_slice())),
            "strains" => Ok(DVector::from_row_slice(self.sections.strains().transpose().as_slice())),
            "meanStress" => Ok(self.sections.mean_stress()),
            "meanStrain" => Ok(self.sections.mean_strain()),
            "bendingMoments" => Ok(self.bending_moments()),
            "shearForces" => Ok(self.shear_forces()),
            _ => match name.parse::<ResponseCode>() {
                Ok(code) if self.sections.response_type().contains(code) => {
                    Ok(self.sections.stress_at_each_point(code))
                }
                _ => Err(unknown_response(self, name)),
            },
        }
    }

    fn pack(&self) -> FEAResult<Value> {
        pack::pack(F::CLASS_NAME, self)
    }

    fn unpack(&mut self, packed: &Value) -> FEAResult<()> {
        let mut restored: Self = pack::unpack(F::CLASS_NAME, packed)?;
        restored.restore_caches()?;
        *self = restored;
        Ok(())
    }
}
