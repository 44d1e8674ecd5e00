//! Zero-length element joining two coincident nodes through a section
//!
//! Each section component reads one relative nodal motion in the element
//! frame: `P`, `Vy` and `Vz` the translations along x, y and z, `T`, `My`
//! and `Mz` the rotations about them. Typical uses are bearings and
//! connection springs, e.g. a bidirectional `[Vy, Vz]` section.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    reject_load, skip_load_on_dead, unknown_response, unpack_element, Element, ElementCore,
    HasScratch, HasShearResponse, Scratch,
};
use crate::config::ElementOptions;
use crate::error::{FEAError, FEAResult};
use crate::loads::ElementalLoad;
use crate::material::{check_order, ConstitutiveModel, SectionModel};
use crate::math::{Mat3, Vec3};
use crate::node::NodeProvider;
use crate::pack::{self, CheckPacked};
use crate::response::{ResponseCode, ResponseId};

const CLASS_NAME: &str = "ZeroLengthSection";

/// What a section component measures
enum Reading {
    /// Relative translation along a frame axis
    Translation(usize),
    /// Relative rotation about a frame axis
    Rotation(usize),
}

/// Frame axis read by `code` in `dimension`, `None` if the code has no
/// meaning there
fn reading(dimension: usize, code: ResponseCode) -> Option<Reading> {
    match (dimension, code) {
        (_, ResponseCode::P) => Some(Reading::Translation(0)),
        (_, ResponseCode::Vy) => Some(Reading::Translation(1)),
        (3, ResponseCode::Vz) => Some(Reading::Translation(2)),
        (3, ResponseCode::T) => Some(Reading::Rotation(0)),
        (3, ResponseCode::My) => Some(Reading::Rotation(1)),
        (_, ResponseCode::Mz) => Some(Reading::Rotation(2)),
        _ => None,
    }
}

fn check_codes(dimension: usize, codes: &ResponseId) -> FEAResult<()> {
    match codes.iter().find(|c| reading(dimension, *c).is_none()) {
        Some(code) => Err(FEAError::Section(format!(
            "{CLASS_NAME} in {dimension}D cannot drive component {code} of layout {codes}"
        ))),
        None => Ok(()),
    }
}

/// Translational and rotational DOF of a node in `dimension`
fn supported_dofs(dimension: usize, ndf: usize) -> bool {
    matches!((dimension, ndf), (2, 2) | (2, 3) | (3, 3) | (3, 6))
}

/// Section spring between two coincident nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZeroLengthSection {
    core: ElementCore,
    dimension: usize,
    section: SectionModel,
    /// Rows are the element x, y and z axes
    frame: Mat3,
    ndf: usize,
    num_dof: usize,
    /// Section deformation per unit motion of node 2 relative to node 1,
    /// order x ndf
    transform: DMatrix<f64>,
    /// Section deformation of the last update, net of the persistent offset
    deformation: DVector<f64>,
    /// Deformation locked in while the element was dead
    persistent: DVector<f64>,
    #[serde(skip)]
    scratch: Scratch,
}

impl ZeroLengthSection {
    /// Create a spring between `nodes` with the global axes as frame.
    ///
    /// # Arguments
    /// * `tag` - Element tag
    /// * `dimension` - Space dimension, 2 or 3
    /// * `nodes` - Tags of the end nodes
    /// * `section` - Section whose components are all readable in
    ///   `dimension`
    pub fn new(tag: usize, dimension: usize, nodes: [usize; 2], section: SectionModel) -> FEAResult<Self> {
        if !(2..=3).contains(&dimension) {
            return Err(FEAError::InvalidInput(format!(
                "{CLASS_NAME} dimension must be 2 or 3, got {dimension}"
            )));
        }
        check_codes(dimension, section.response_type())?;
        let order = section.order();
        Ok(Self {
            core: ElementCore::new(tag, nodes.to_vec()),
            dimension,
            section,
            frame: Mat3::identity(),
            ndf: 0,
            num_dof: 0,
            transform: DMatrix::zeros(order, 0),
            deformation: DVector::zeros(order),
            persistent: DVector::zeros(order),
            scratch: Scratch::default(),
        })
    }

    /// Orient the frame: `x` is the element axis and `yp` lies in its x-y
    /// plane. In 2D both must lie in the global x-y plane.
    pub fn with_orientation(mut self, x: Vec3, yp: Vec3) -> FEAResult<Self> {
        if self.dimension == 2 && (x[2] != 0.0 || yp[2] != 0.0) {
            return Err(FEAError::InvalidInput(format!(
                "{CLASS_NAME} {}: a 2D frame must lie in the x-y plane",
                self.core.tag
            )));
        }
        let tol = self.core.options.geometry_tolerance;
        let z = x.cross(&yp);
        if x.norm() <= tol || z.norm() <= tol {
            return Err(FEAError::InvalidGeometry(format!(
                "{CLASS_NAME} {}: orientation vectors are parallel or null",
                self.core.tag
            )));
        }
        let xa = x.normalize();
        let za = z.normalize();
        let ya = za.cross(&xa);
        self.frame = Mat3::from_rows(&[xa.transpose(), ya.transpose(), za.transpose()]);
        Ok(self)
    }

    /// Set element options
    pub fn with_options(mut self, options: ElementOptions) -> Self {
        self.core.options = options;
        self
    }

    /// Section driven by the relative nodal motion
    pub fn section(&self) -> &SectionModel {
        &self.section
    }

    /// Rows are the element axes
    pub fn frame(&self) -> &Mat3 {
        &self.frame
    }

    fn degrade(&mut self) {
        self.ndf = self.dimension;
        self.num_dof = 2 * self.dimension;
        self.transform = DMatrix::zeros(self.section.order(), self.ndf);
        self.scratch.allocate(self.num_dof);
    }

    /// Build the section deformation operator for `ndf` DOF per node
    fn build_transform(&self, ndf: usize) -> FEAResult<DMatrix<f64>> {
        let rotational = ndf > self.dimension;
        // 2D nodes carry a single rotation, about z
        let rotation_offset = if self.dimension == 2 { ndf - 1 } else { 3 };
        let mut a = DMatrix::zeros(self.section.order(), ndf);
        for (i, code) in self.section.response_type().iter().enumerate() {
            match reading(self.dimension, code) {
                Some(Reading::Translation(axis)) => {
                    for j in 0..self.dimension {
                        a[(i, j)] = self.frame[(axis, j)];
                    }
                }
                Some(Reading::Rotation(axis)) if rotational => {
                    if self.dimension == 2 {
                        a[(i, rotation_offset)] = self.frame[(axis, 2)];
                    } else {
                        for j in 0..3 {
                            a[(i, rotation_offset + j)] = self.frame[(axis, j)];
                        }
                    }
                }
                _ => {
                    return Err(FEAError::InvalidInput(format!(
                        "{CLASS_NAME} {}: component {code} needs rotations, nodes carry {ndf} DOF",
                        self.core.tag
                    )))
                }
            }
        }
        Ok(a)
    }

    /// `[-A, A]`, the section deformation from both end displacements
    fn full_transform(&self) -> DMatrix<f64> {
        let order = self.section.order();
        let mut b = DMatrix::zeros(order, self.num_dof);
        if self.transform.ncols() == self.ndf && self.num_dof == 2 * self.ndf {
            b.view_mut((0, 0), (order, self.ndf)).copy_from(&(-&self.transform));
            b.view_mut((0, self.ndf), (order, self.ndf)).copy_from(&self.transform);
        }
        b
    }

    fn fill_stiffness(&mut self, initial: bool) {
        let b = self.full_transform();
        let ks = if initial {
            self.section.initial_tangent()
        } else {
            self.section.tangent()
        };
        self.scratch.stiff = b.transpose() * ks * &b * self.core.activity_factor();
    }
}

impl CheckPacked for ZeroLengthSection {
    fn check_packed(&self) -> FEAResult<()> {
        self.core.check_packed(2)?;
        if !(2..=3).contains(&self.dimension) {
            return Err(FEAError::InvalidInput(format!("dimension {}", self.dimension)));
        }
        check_codes(self.dimension, self.section.response_type())?;
        self.section.check_shapes()?;
        let order = self.section.order();
        check_order(order, &self.deformation)?;
        check_order(order, &self.persistent)?;
        if (self.frame * self.frame.transpose() - Mat3::identity()).amax() > 1e-8 {
            return Err(FEAError::InvalidInput("frame is not orthonormal".to_string()));
        }
        let bound = self.ndf == 0 || supported_dofs(self.dimension, self.ndf);
        if !bound
            || self.num_dof != 2 * self.ndf
            || self.transform.nrows() != order
            || self.transform.ncols() != self.ndf
        {
            return Err(FEAError::InvalidInput(format!(
                "{} DOF for {} DOF per node and a {}x{} transform",
                self.num_dof,
                self.ndf,
                self.transform.nrows(),
                self.transform.ncols()
            )));
        }
        Ok(())
    }
}

impl HasScratch for ZeroLengthSection {
    fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }
}

impl HasShearResponse for ZeroLengthSection {
    /// `[Vy, Vz]` carried by the section
    fn shear_forces(&self) -> DVector<f64> {
        DVector::from_vec(vec![
            self.section.stress_resultant(ResponseCode::Vy),
            self.section.stress_resultant(ResponseCode::Vz),
        ])
    }
}

impl Element for ZeroLengthSection {
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
        let transform = if supported_dofs(self.dimension, ndf) {
            self.build_transform(ndf)
        } else {
            Err(FEAError::InvalidInput(format!(
                "{CLASS_NAME} {}: {ndf} DOF per node in {}D",
                self.core.tag, self.dimension
            )))
        };
        let transform = match transform {
            Ok(t) => t,
            Err(e) => {
                log::warn!("{e}, element degraded");
                self.degrade();
                return Err(e);
            }
        };
        self.ndf = ndf;
        self.num_dof = 2 * ndf;
        self.transform = transform;
        self.scratch.allocate(self.num_dof);

        let x1 = nodes.coordinates(self.core.nodes[0])?;
        let x2 = nodes.coordinates(self.core.nodes[1])?;
        let gap = (x2 - x1).norm();
        if gap > self.core.options.geometry_tolerance {
            log::warn!(
                "{CLASS_NAME} {}: end nodes are {gap:.3e} apart, the gap is ignored",
                self.core.tag
            );
        }
        Ok(())
    }

    fn update(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()> {
        if self.num_dof == 0 {
            return Err(FEAError::InvalidInput(format!(
                "{CLASS_NAME} {} is not bound to its nodes",
                self.core.tag
            )));
        }
        let u1 = nodes.trial_displacement(self.core.nodes[0])?;
        let u2 = nodes.trial_displacement(self.core.nodes[1])?;
        let ndf = self.ndf;
        if u1.len() < ndf || u2.len() < ndf {
            return Err(FEAError::OrderMismatch {
                expected: ndf,
                got: u1.len().min(u2.len()),
            });
        }
        let du = u2.rows(0, ndf) - u1.rows(0, ndf);
        self.deformation = &self.transform * du - &self.persistent;
        self.section.set_trial_deformation(&self.deformation)
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
        let b = self.full_transform();
        self.scratch.resid = b.transpose() * self.section.stress() * self.core.activity_factor();
        &self.scratch.resid
    }

    /// No mass is lumped at a zero-length element
    fn resisting_force_inc_inertia(&mut self, _nodes: &dyn NodeProvider) -> FEAResult<&DVector<f64>> {
        Ok(self.resisting_force())
    }

    fn mass(&mut self) -> &DMatrix<f64> {
        self.scratch.mass.fill(0.0);
        &self.scratch.mass
    }

    fn add_load(&mut self, load: &ElementalLoad, _factor: f64) -> FEAResult<()> {
        if skip_load_on_dead(self, load) {
            return Ok(());
        }
        Err(reject_load(self, load))
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
        self.deformation.fill(0.0);
        self.persistent.fill(0.0);
        self.section.revert_to_start()
    }

    fn fold_current_deformation(&mut self) {
        self.persistent += &self.deformation;
        self.deformation.fill(0.0);
    }

    fn response(&mut self, name: &str) -> FEAResult<DVector<f64>> {
        match name {
            "force" | "forces" | "globalForce" | "globalForces" => Ok(self.resisting_force().clone()),
            "deformation" | "deformations" => Ok(self.deformation.clone()),
            "stress" | "sectionForce" => Ok(self.section.stress().clone()),
            "strain" | "sectionDeformation" => Ok(self.section.deformation()),
            "shearForces" => Ok(self.shear_forces()),
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
