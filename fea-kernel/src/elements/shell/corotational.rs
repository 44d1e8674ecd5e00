//! Corotational flat shell for large rotations
//!
//! A rigid frame follows the element: its axes are rebuilt from the current
//! corner positions at every update, with the same rule that gives the
//! reference basis. The frame motion is removed from the nodal
//! displacements and rotations, and what is left drives an ordinary
//! small-strain shell written in frame axes. Forces and stiffness are
//! rotated back with the frame, and the stiffness gains the initial-stress
//! terms of the rotating frame.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Mitc4, Mitc9, Shell, ShellBasis, ShellFormulation, NODE_DOF};
use crate::elements::{
    reject_load, skip_load_on_dead, unknown_response, Element, ElementCore, HasBendingResponse,
    HasShearResponse, IsCorotational, Scratch,
};
use crate::config::ElementOptions;
use crate::error::{FEAError, FEAResult};
use crate::loads::{ElementalLoad, LoadKind};
use crate::material::{ConstitutiveModel, SectionModel};
use crate::math::{Mat3, Vec3};
use crate::node::NodeProvider;
use crate::pack::{self, check_len, CheckPacked};

/// 4-node corotational shell
pub type CorotShellMITC4 = CorotShell<Mitc4>;

/// 9-node corotational shell
pub type CorotShellMITC9 = CorotShell<Mitc9>;

/// Weights of the corners in the medians `v1` and `v2` of the frame rule
const MEDIAN_1: [f64; 4] = [-0.5, 0.5, 0.5, -0.5];
const MEDIAN_2: [f64; 4] = [-0.5, -0.5, 0.5, 0.5];

/// Rotation matrix of the rotation vector `theta`
fn rotation_matrix(theta: &Vec3) -> Mat3 {
    let angle = theta.norm();
    let k = theta.cross_matrix();
    if angle < 1e-8 {
        return Mat3::identity() + k + 0.5 * k * k;
    }
    Mat3::identity() + k * (angle.sin() / angle) + k * k * ((1.0 - angle.cos()) / (angle * angle))
}

/// Spin of a node per unit increment of its rotation vector `theta`
fn rotation_jacobian(theta: &Vec3) -> Mat3 {
    let angle = theta.norm();
    let k = theta.cross_matrix();
    if angle < 1e-8 {
        return Mat3::identity() + 0.5 * k;
    }
    let a2 = angle * angle;
    Mat3::identity() + k * ((1.0 - angle.cos()) / a2) + k * k * ((angle - angle.sin()) / (a2 * angle))
}

/// Rotation vector of an orthogonal matrix, accurate close to the identity
fn rotation_vector(r: &Mat3) -> Vec3 {
    let s = 0.5 * Vec3::new(r[(2, 1)] - r[(1, 2)], r[(0, 2)] - r[(2, 0)], r[(1, 0)] - r[(0, 1)]);
    let cos = 0.5 * (r.trace() - 1.0);
    let sin = s.norm();
    if sin == 0.0 {
        return Vec3::zeros();
    }
    s * (sin.atan2(cos) / sin)
}

fn centroid(x: &[Vec3]) -> Vec3 {
    x.iter().fold(Vec3::zeros(), |acc, p| acc + p) / x.len() as f64
}

fn triple(v: &DVector<f64>, at: usize) -> Vec3 {
    Vec3::new(v[at], v[at + 1], v[at + 2])
}

/// Length of the first corner median
fn median_length(relative: &[Vec3]) -> f64 {
    if relative.len() < 4 {
        return 0.0;
    }
    (0..4)
        .fold(Vec3::zeros(), |acc, k| acc + relative[k] * MEDIAN_1[k])
        .norm()
}

/// Spin of the frame produced by nodal increments in frame axes, 3 x ndof.
///
/// In frame axes the medians are `v1 = (l1, 0, 0)` and `v2 = (a, b, 0)`.
fn spin_fit(relative: &[Vec3]) -> DMatrix<f64> {
    let ndof = NODE_DOF * relative.len();
    let mut v1 = Vec3::zeros();
    let mut v2 = Vec3::zeros();
    for k in 0..4 {
        v1 += relative[k] * MEDIAN_1[k];
        v2 += relative[k] * MEDIAN_2[k];
    }
    let (l1, a, b) = (v1[0], v2[0], v2[1]);
    let mut g = DMatrix::zeros(3, ndof);
    for k in 0..4 {
        let col = NODE_DOF * k;
        g[(0, col + 2)] = (MEDIAN_2[k] - a / l1 * MEDIAN_1[k]) / b;
        g[(1, col + 2)] = -MEDIAN_1[k] / l1;
        g[(2, col + 1)] = MEDIAN_1[k] / l1;
    }
    g
}

/// `P = I - T - S G`: removes the rigid translation and the frame rotation
/// from nodal increments in frame axes
fn projector(relative: &[Vec3], g: &DMatrix<f64>) -> DMatrix<f64> {
    let nn = relative.len();
    let ndof = NODE_DOF * nn;
    let share = 1.0 / nn as f64;
    let mut p = DMatrix::identity(ndof, ndof);
    let mut s = DMatrix::zeros(ndof, 3);
    for (k, x) in relative.iter().enumerate() {
        let row = NODE_DOF * k;
        for j in 0..nn {
            for a in 0..3 {
                p[(row + a, NODE_DOF * j + a)] -= share;
            }
        }
        s.fixed_view_mut::<3, 3>(row, 0).copy_from(&(-x.cross_matrix()));
        s.fixed_view_mut::<3, 3>(row + 3, 0).copy_from(&Mat3::identity());
    }
    p -= s * g;
    p
}

/// Map from global nodal increments to frame axes: `rotation` on the
/// translations, `rotation * J(theta)` on the rotation vectors
fn frame_transform(rotation: &Mat3, rotations: &[Vec3]) -> DMatrix<f64> {
    let ndof = NODE_DOF * rotations.len();
    let mut t = DMatrix::zeros(ndof, ndof);
    for (k, theta) in rotations.iter().enumerate() {
        let row = NODE_DOF * k;
        t.fixed_view_mut::<3, 3>(row, row).copy_from(rotation);
        t.fixed_view_mut::<3, 3>(row + 3, row + 3)
            .copy_from(&(rotation * rotation_jacobian(theta)));
    }
    t
}

/// Spins of the nodal forces and moments `F_nm`, and of the forces alone
/// `F_n`, stacked by node
fn force_spins(f: &DVector<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
    let ndof = f.len();
    let mut fnm = DMatrix::zeros(ndof, 3);
    let mut fn_ = DMatrix::zeros(ndof, 3);
    for row in (0..ndof).step_by(NODE_DOF) {
        let n = triple(f, row).cross_matrix();
        fnm.fixed_view_mut::<3, 3>(row, 0).copy_from(&n);
        fn_.fixed_view_mut::<3, 3>(row, 0).copy_from(&n);
        fnm.fixed_view_mut::<3, 3>(row + 3, 0)
            .copy_from(&triple(f, row + 3).cross_matrix());
    }
    (fnm, fn_)
}

/// Flat shell following large rigid rotations, small strains in its frame
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct CorotShell<F: ShellFormulation> {
    /// Small-strain kernel working in frame axes
    local: Shell<F>,
    /// Initial nodal coordinates
    reference: Vec<Vec3>,
    initial_frame: Option<ShellBasis>,
    /// Frame of the last update
    frame: Option<ShellBasis>,
    /// Rows are the initial frame axes
    initial_rotation: Mat3,
    /// Nodal positions about their centroid in frame axes, initial and at
    /// the last update
    initial_relative: Vec<Vec3>,
    relative: Vec<Vec3>,
    /// Nodal rotation vectors of the last update
    rotations: Vec<Vec3>,
    /// Equivalent nodal forces of surface loads, in frame axes
    p0: DVector<f64>,
    #[serde(skip)]
    scratch: Scratch,
}

impl<F: ShellFormulation + 'static> CorotShell<F> {
    fn build(tag: usize, nodes: Vec<usize>, section: SectionModel) -> FEAResult<Self> {
        let local = Shell::<F>::build(tag, nodes, section)?;
        let ndof = local.ndof();
        Ok(Self {
            local,
            reference: Vec::new(),
            initial_frame: None,
            frame: None,
            initial_rotation: Mat3::identity(),
            initial_relative: Vec::new(),
            relative: Vec::new(),
            rotations: vec![Vec3::zeros(); F::NUM_NODES],
            p0: DVector::zeros(ndof),
            scratch: Scratch::new(ndof),
        })
    }

    /// Set element options
    pub fn with_options(mut self, options: ElementOptions) -> Self {
        self.local.core.options = options;
        self
    }

    /// Small-strain shell driven by the deformational displacements
    pub fn local_shell(&self) -> &Shell<F> {
        &self.local
    }

    /// Frame of the last update, known once bound
    pub fn frame(&self) -> Option<&ShellBasis> {
        self.frame.as_ref()
    }

    fn ndof(&self) -> usize {
        self.local.ndof()
    }

    fn frame_of(&self, x: &[Vec3]) -> FEAResult<ShellBasis> {
        ShellBasis::from_corners(&[x[0], x[1], x[2], x[3]], self.local.core.options.geometry_tolerance)
    }

    /// Projected nodal forces in frame axes, with the frame of the last update
    fn frame_force(&mut self) -> Option<(Mat3, DVector<f64>)> {
        let frame = self.frame?;
        let fd = self.local.resisting_force().clone();
        let g = spin_fit(&self.relative);
        let p = projector(&self.relative, &g);
        let f = p.transpose() * fd + &self.p0 * self.local.core.activity_factor();
        Some((frame.rotation(), f))
    }

    fn assemble_stiffness(&mut self, initial: bool) {
        let (frame, relative, rotations) = if initial {
            (
                self.initial_frame,
                self.initial_relative.clone(),
                vec![Vec3::zeros(); F::NUM_NODES],
            )
        } else {
            (self.frame, self.relative.clone(), self.rotations.clone())
        };
        let Some(frame) = frame else {
            self.scratch.stiff.fill(0.0);
            return;
        };
        let kd = if initial {
            self.local.initial_stiffness().clone()
        } else {
            self.local.tangent_stiffness().clone()
        };
        let g = spin_fit(&relative);
        let p = projector(&relative, &g);
        let mut k = p.transpose() * kd * &p;
        if !initial {
            let fd = self.local.resisting_force().clone();
            let internal = p.transpose() * fd;
            let (_, fn_) = force_spins(&internal);
            let total = &internal + &self.p0 * self.local.core.activity_factor();
            let (fnm, _) = force_spins(&total);
            // frame rotation and equilibrium projection terms
            let kg = -(fnm * &g) - g.transpose() * (fn_.transpose() * &p);
            k += (&kg + kg.transpose()) * 0.5;
        }
        let t = frame_transform(&frame.rotation(), &rotations);
        self.scratch.stiff = t.transpose() * k * t;
    }
}

impl CorotShell<Mitc4> {
    /// Create a 4-node corotational shell, nodes counter-clockwise
    pub fn new(tag: usize, nodes: [usize; 4], section: SectionModel) -> FEAResult<Self> {
        Self::build(tag, nodes.to_vec(), section)
    }
}

impl CorotShell<Mitc9> {
    /// Create a 9-node corotational shell, nodes ordered as for
    /// [`super::ShellMITC9`]
    pub fn new(tag: usize, nodes: [usize; 9], section: SectionModel) -> FEAResult<Self> {
        Self::build(tag, nodes.to_vec(), section)
    }
}

impl<F: ShellFormulation> CheckPacked for CorotShell<F> {
    fn check_packed(&self) -> FEAResult<()> {
        self.local.check_packed()?;
        let bound = self.initial_frame.is_some();
        if bound != self.frame.is_some() || bound != self.local.basis.is_some() {
            return Err(FEAError::InvalidInput("frames and local basis disagree".to_string()));
        }
        if bound {
            check_len("reference coordinates", self.reference.len(), F::NUM_NODES)?;
            check_len("initial relative positions", self.initial_relative.len(), F::NUM_NODES)?;
            check_len("relative positions", self.relative.len(), F::NUM_NODES)?;
        }
        check_len("nodal rotations", self.rotations.len(), F::NUM_NODES)?;
        check_len("surface load vector", self.p0.len(), NODE_DOF * F::NUM_NODES)
    }
}

impl<F: ShellFormulation> IsCorotational for CorotShell<F> {
    /// Length of the first corner median at the last update
    fn current_length(&self) -> f64 {
        median_length(&self.relative)
    }

    fn initial_length(&self) -> f64 {
        median_length(&self.initial_relative)
    }

    fn local_frame(&self) -> &Mat3 {
        &self.initial_rotation
    }
}

impl<F: ShellFormulation> HasBendingResponse for CorotShell<F> {
    fn bending_moments(&self) -> DVector<f64> {
        self.local.bending_moments()
    }
}

impl<F: ShellFormulation> HasShearResponse for CorotShell<F> {
    fn shear_forces(&self) -> DVector<f64> {
        self.local.shear_forces()
    }
}

impl<F: ShellFormulation + 'static> Element for CorotShell<F> {
    fn core(&self) -> &ElementCore {
        &self.local.core
    }

    fn core_mut(&mut self) -> &mut ElementCore {
        &mut self.local.core
    }

    fn class_name(&self) -> &'static str {
        F::COROTATIONAL_CLASS_NAME
    }

    fn num_dof(&self) -> usize {
        self.ndof()
    }

    fn set_domain(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()> {
        self.initial_frame = None;
        self.frame = None;
        self.scratch.allocate(self.ndof());
        let coords = self.local.read_coordinates(nodes)?;
        let basis = self.frame_of(&coords)?;
        let rotation = basis.rotation();
        let c = centroid(&coords);
        let relative: Vec<Vec3> = coords.iter().map(|x| rotation * (x - c)).collect();
        let xl = relative.iter().map(|x| [x[0], x[1]]).collect();
        self.local.install_geometry(ShellBasis::identity(), xl)?;

        self.reference = coords;
        self.initial_frame = Some(basis);
        self.frame = Some(basis);
        self.initial_rotation = rotation;
        self.initial_relative = relative.clone();
        self.relative = relative;
        self.rotations = vec![Vec3::zeros(); F::NUM_NODES];
        Ok(())
    }

    fn update(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()> {
        if self.initial_frame.is_none() {
            return Err(self.local.unbound_error());
        }
        let u = self.local.gather(nodes, false)?;
        let current: Vec<Vec3> = self
            .reference
            .iter()
            .enumerate()
            .map(|(k, x)| x + triple(&u, NODE_DOF * k))
            .collect();
        let frame = self.frame_of(&current)?;
        let rn = frame.rotation();
        let r0t = self.initial_rotation.transpose();
        let c = centroid(&current);
        let relative: Vec<Vec3> = current.iter().map(|x| rn * (x - c)).collect();

        let rotations: Vec<Vec3> = (0..F::NUM_NODES).map(|k| triple(&u, NODE_DOF * k + 3)).collect();

        let mut ud = DVector::zeros(self.ndof());
        for (k, theta) in rotations.iter().enumerate() {
            let col = NODE_DOF * k;
            let stretch = relative[k] - self.initial_relative[k];
            let twist = rotation_vector(&(rn * rotation_matrix(theta) * r0t));
            ud.fixed_rows_mut::<3>(col).copy_from(&stretch);
            ud.fixed_rows_mut::<3>(col + 3).copy_from(&twist);
        }
        self.local.apply_displacements(&ud)?;
        self.frame = Some(frame);
        self.relative = relative;
        self.rotations = rotations;
        Ok(())
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
        match self.frame_force() {
            Some((rotation, f)) => {
                let t = frame_transform(&rotation, &self.rotations);
                self.scratch.resid = t.transpose() * f;
            }
            None => self.scratch.resid.fill(0.0),
        }
        &self.scratch.resid
    }

    fn resisting_force_inc_inertia(&mut self, nodes: &dyn NodeProvider) -> FEAResult<&DVector<f64>> {
        self.resisting_force();
        if self.local.sections[0].rho() != 0.0 {
            let a = self.local.gather(nodes, true)?;
            // translational mass blocks are multiples of the identity, so
            // they read the same in frame and global axes
            let inertia = self.local.mass() * a;
            self.scratch.resid += inertia;
        }
        Ok(&self.scratch.resid)
    }

    fn mass(&mut self) -> &DMatrix<f64> {
        self.local.mass()
    }

    fn add_load(&mut self, load: &ElementalLoad, factor: f64) -> FEAResult<()> {
        if skip_load_on_dead(self, load) {
            return Ok(());
        }
        match &load.kind {
            LoadKind::ShellUniform(w) => {
                if self.initial_frame.is_none() {
                    return Err(self.local.unbound_error());
                }
                self.p0 += self.local.surface_load_vector(w.local_vector(factor));
                Ok(())
            }
            LoadKind::ShellStrain(strain) if F::ACCEPTS_STRAIN_LOAD => {
                self.local.add_strain_load(strain.scaled_strains(factor))
            }
            _ => Err(reject_load(self, load)),
        }
    }

    fn zero_load(&mut self) {
        self.p0.fill(0.0);
        self.local.zero_load();
    }

    fn commit_state(&mut self) -> FEAResult<()> {
        self.local.commit_state()
    }

    fn revert_to_last_commit(&mut self) -> FEAResult<()> {
        self.local.revert_to_last_commit()
    }

    fn revert_to_start(&mut self) -> FEAResult<()> {
        self.frame = self.initial_frame;
        self.relative = self.initial_relative.clone();
        self.rotations = vec![Vec3::zeros(); F::NUM_NODES];
        self.local.revert_to_start()
    }

    fn fold_current_deformation(&mut self) {
        self.local.fold_current_deformation();
    }

    fn response(&mut self, name: &str) -> FEAResult<DVector<f64>> {
        match name {
            "force" | "forces" | "globalForce" | "globalForces" => Ok(self.resisting_force().clone()),
            "localForce" | "localForces" => {
                let ndof = self.ndof();
                Ok(self.frame_force().map_or_else(|| DVector::zeros(ndof), |(_, f)| f))
            }
            _ => match self.local.response(name) {
                Ok(v) => Ok(v),
                Err(_) => Err(unknown_response(self, name)),
            },
        }
    }

    fn pack(&self) -> FEAResult<Value> {
        pack::pack(F::COROTATIONAL_CLASS_NAME, self)
    }

    fn unpack(&mut self, packed: &Value) -> FEAResult<()> {
        let mut restored: Self = pack::unpack(F::COROTATIONAL_CLASS_NAME, packed)?;
        restored.local.restore_caches()?;
        restored.scratch.allocate(restored.ndof());
        *self = restored;
        Ok(())
    }
}
