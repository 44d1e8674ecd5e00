//! Small-displacement two-node bar driven by a section

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    reject_load, skip_load_on_dead, unknown_response, unpack_element, Element, ElementCore,
    HasAxialResponse, HasScratch, Scratch,
};
use crate::config::ElementOptions;
use crate::error::{FEAError, FEAResult};
use crate::loads::{ElementalLoad, LoadKind};
use crate::material::{ConstitutiveModel, SectionModel};
use crate::node::NodeProvider;
use crate::pack::{self, CheckPacked};
use crate::response::{ResponseCode, ResponseId};

const CLASS_NAME: &str = "TrussSection";

/// DOF count a degraded truss falls back to
const DEGRADED_DOF: usize = 2;

/// Bar element of dimension 1, 2 or 3 whose axial response comes from a
/// section carrying at least one `P` component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrussSection {
    core: ElementCore,
    dimension: usize,
    section: SectionModel,
    /// DOF per node once bound
    ndf: usize,
    num_dof: usize,
    length: f64,
    cosines: [f64; 3],
    /// Strain of the last update, net of the persistent offset
    strain: f64,
    /// Strain locked in while the element was dead
    persistent_strain: f64,
    #[serde(skip)]
    scratch: Scratch,
}

impl TrussSection {
    /// Create a bar between `nodes`.
    ///
    /// # Arguments
    /// * `tag` - Element tag
    /// * `dimension` - Space dimension, 1 to 3
    /// * `nodes` - Tags of the end nodes
    /// * `section` - Section carrying the axial response
    pub fn new(tag: usize, dimension: usize, nodes: [usize; 2], section: SectionModel) -> FEAResult<Self> {
        if !(1..=3).contains(&dimension) {
            return Err(FEAError::InvalidInput(format!(
                "truss dimension must be 1, 2 or 3, got {dimension}"
            )));
        }
        check_axial_section(&section)?;
        Ok(Self {
            core: ElementCore::new(tag, nodes.to_vec()),
            dimension,
            section,
            ndf: 0,
            num_dof: 0,
            length: 0.0,
            cosines: [0.0; 3],
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

    /// Length between the end nodes, zero until bound
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Strain locked in by a deactivation, subtracted from every update
    pub fn persistent_strain(&self) -> f64 {
        self.persistent_strain
    }

    fn degrade(&mut self) {
        self.ndf = DEGRADED_DOF / 2;
        self.num_dof = DEGRADED_DOF;
        self.length = 0.0;
        self.scratch.allocate(DEGRADED_DOF);
    }

    fn current_strain(&self, nodes: &dyn NodeProvider) -> FEAResult<f64> {
        let u1 = nodes.trial_displacement(self.core.nodes[0])?;
        let u2 = nodes.trial_displacement(self.core.nodes[1])?;
        let mut du = 0.0;
        for i in 0..self.dimension {
            du += self.cosines[i] * (u2[i] - u1[i]);
        }
        Ok(du / self.length - self.persistent_strain)
    }

    /// Fill `stiff` with `EA/L cos x cos` in the two-node block layout
    fn fill_stiffness(&mut self, ea: f64) {
        let factor = self.core.activity_factor();
        let ndf = self.ndf;
        let k = &mut self.scratch.stiff;
        k.fill(0.0);
        if self.length == 0.0 {
            return;
        }
        let ke = ea / self.length * factor;
        for i in 0..self.dimension {
            for j in 0..self.dimension {
                let v = ke * (self.cosines[i] * self.cosines[j]);
                k[(i, j)] = v;
                k[(i, j + ndf)] = -v;
                k[(i + ndf, j)] = -v;
                k[(i + ndf, j + ndf)] = v;
            }
        }
    }

    fn lumped_mass(&self) -> f64 {
        0.5 * self.section.rho() * self.length * self.core.activity_factor()
    }
}

/// A section is usable by a bar only if it carries an axial component
pub(crate) fn check_axial_section(section: &SectionModel) -> FEAResult<()> {
    if section.response_type().contains(ResponseCode::P) {
        Ok(())
    } else {
        Err(FEAError::Section(format!(
            "{} with layout {} has no axial component",
            section.kind(),
            section.response_type()
        )))
    }
}

/// Section deformation with `strain` on every axial component
pub(crate) fn axial_deformation_vector(codes: &ResponseId, strain: f64) -> DVector<f64> {
    let mut e = DVector::zeros(codes.len());
    for i in codes.positions(ResponseCode::P) {
        e[i] = strain;
    }
    e
}

/// Axial rigidity: sum of the tangent terms coupling axial components
pub(crate) fn axial_rigidity(codes: &ResponseId, k: &DMatrix<f64>) -> f64 {
    let mut ea = 0.0;
    for i in codes.positions(ResponseCode::P) {
        for j in codes.positions(ResponseCode::P) {
            ea += k[(i, j)];
        }
    }
    ea
}

/// Check a (dimension, DOF per node) pair a bar can work with
pub(crate) fn supported_dofs(dimension: usize, ndf: usize) -> bool {
    matches!((dimension, ndf), (1, 1) | (2, 2) | (2, 3) | (3, 3) | (3, 6))
}

/// Check the DOF layout of a restored bar.
///
/// A bar with geometry needs a supported `(dimension, ndf)` pair and
/// `num_dof = 2 ndf`. Without geometry it may only be unbound or degraded.
pub(crate) fn check_bar_layout(
    dimension: usize,
    num_dof: usize,
    length: f64,
    degraded_dof: usize,
) -> FEAResult<()> {
    let consistent = if length > 0.0 && length.is_finite() {
        num_dof % 2 == 0 && supported_dofs(dimension, num_dof / 2)
    } else {
        length == 0.0 && (num_dof == 0 || num_dof == degraded_dof)
    };
    if consistent {
        Ok(())
    } else {
        Err(FEAError::InvalidInput(format!(
            "{num_dof} DOF in {dimension}D with length {length}"
        )))
    }
}

impl CheckPacked for TrussSection {
    fn check_packed(&self) -> FEAResult<()> {
        self.core.check_packed(2)?;
        if !(1..=3).contains(&self.dimension) {
            return Err(FEAError::InvalidInput(format!("dimension {}", self.dimension)));
        }
        check_axial_section(&self.section)?;
        self.section.check_shapes()?;
        if self.num_dof != 2 * self.ndf {
            return Err(FEAError::InvalidInput(format!(
                "{} DOF for {} DOF per node",
                self.num_dof, self.ndf
            )));
        }
        check_bar_layout(self.dimension, self.num_dof, self.length, DEGRADED_DOF)
    }
}

impl HasScratch for TrussSection {
    fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }
}

impl HasAxialResponse for TrussSection {
    fn axial_force(&self) -> f64 {
        self.section.stress_resultant(ResponseCode::P)
    }

    fn axial_deformation(&self) -> f64 {
        self.strain * self.length
    }
}

impl Element for TrussSection {
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
        self.ndf = ndf;
        self.num_dof = 2 * ndf;
        self.scratch.allocate(self.num_dof);

        let x1 = nodes.coordinates(self.core.nodes[0])?;
        let x2 = nodes.coordinates(self.core.nodes[1])?;
        let mut dx = [0.0; 3];
        for i in 0..self.dimension {
            dx[i] = x2[i] - x1[i];
        }
        let length = dx.iter().map(|d| d * d).sum::<f64>().sqrt();
        if length <= self.core.options.geometry_tolerance {
            self.length = 0.0;
            return Err(FEAError::InvalidGeometry(format!(
                "{CLASS_NAME} {} has zero length",
                self.core.tag
            )));
        }
        self.length = length;
        self.cosines = dx.map(|d| d / length);
        Ok(())
    }

    fn update(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()> {
        if self.length == 0.0 {
            return Err(FEAError::InvalidGeometry(format!(
                "{CLASS_NAME} {} has zero length",
                self.core.tag
            )));
        }
        self.strain = self.current_strain(nodes)?;
        let e = axial_deformation_vector(self.section.response_type(), self.strain);
        self.section.set_trial_deformation(&e)
    }

    fn tangent_stiffness(&mut self) -> &DMatrix<f64> {
        let ea = axial_rigidity(self.section.response_type(), self.section.tangent());
        self.fill_stiffness(ea);
        &self.scratch.stiff
    }

    fn initial_stiffness(&mut self) -> &DMatrix<f64> {
        let ea = axial_rigidity(self.section.response_type(), self.section.initial_tangent());
        self.fill_stiffness(ea);
        &self.scratch.stiff
    }

    fn resisting_force(&mut self) -> &DVector<f64> {
        let n = self.axial_force() * self.core.activity_factor();
        let ndf = self.ndf;
        let p = &mut self.scratch.resid;
        p.fill(0.0);
        if self.length == 0.0 {
            return &self.scratch.resid;
        }
        for i in 0..self.dimension {
            let v = self.cosines[i] * n;
            p[i] = -v;
            p[i + ndf] = v;
        }
        &self.scratch.resid
    }

    fn resisting_force_inc_inertia(&mut self, nodes: &dyn NodeProvider) -> FEAResult<&DVector<f64>> {
        self.resisting_force();
        let m = self.lumped_mass();
        if m != 0.0 {
            let a1 = nodes.trial_acceleration(self.core.nodes[0])?;
            let a2 = nodes.trial_acceleration(self.core.nodes[1])?;
            for i in 0..self.dimension {
                self.scratch.resid[i] += m * a1[i];
                self.scratch.resid[i + self.ndf] += m * a2[i];
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
        for i in 0..self.dimension {
            self.scratch.mass[(i, i)] = m;
            self.scratch.mass[(i + self.ndf, i + self.ndf)] = m;
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
