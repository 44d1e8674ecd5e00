//! Structural elements
//!
//! Every element follows the same state machine:
//! 1. `set_domain` binds it to its nodes and caches the geometry,
//! 2. `update` pulls nodal trial displacements and drives its sections,
//! 3. `tangent_stiffness`, `resisting_force` and `mass` integrate the current
//!    section state, without re-running `update`,
//! 4. `commit_state`, `revert_to_last_commit` and `revert_to_start` mirror the
//!    analysis step life cycle.
//!
//! Matrices and vectors are returned by reference into per-instance scratch
//! buffers, valid until the next call on the same element.

mod beam_column;
mod corot_truss;
mod shell;
mod truss;
mod zero_length;

pub use beam_column::DispBeamColumn2d;
pub use corot_truss::CorotTrussSection;
pub use shell::{
    CorotShell, CorotShellMITC4, CorotShellMITC9, Mitc4, Mitc9, Shell, ShellBasis, ShellFormulation,
    ShellMITC4, ShellMITC9,
};
pub use truss::TrussSection;
pub use zero_length::ZeroLengthSection;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ElementOptions;
use crate::error::{FEAError, FEAResult};
use crate::loads::ElementalLoad;
use crate::math::Mat3;
use crate::node::NodeProvider;
use crate::pack::CheckPacked;

/// Identity, connectivity, options and activation flag shared by all elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementCore {
    pub tag: usize,
    pub nodes: Vec<usize>,
    pub options: ElementOptions,
    alive: bool,
}

impl ElementCore {
    /// Alive element with default options
    pub fn new(tag: usize, nodes: Vec<usize>) -> Self {
        Self {
            tag,
            nodes,
            options: ElementOptions::default(),
            alive: true,
        }
    }

    /// False between `kill` and `alive`
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Check a restored core: `num_nodes` connected nodes and usable options
    pub(crate) fn check_packed(&self, num_nodes: usize) -> FEAResult<()> {
        crate::pack::check_len("node list", self.nodes.len(), num_nodes)?;
        self.options.validate()
    }

    /// Factor applied to forces, stiffness and mass: one when alive,
    /// `dead_srf` when dead
    pub fn activity_factor(&self) -> f64 {
        if self.alive {
            1.0
        } else {
            self.options.dead_srf
        }
    }

    /// Read the DOF count shared by every node of the element.
    ///
    /// Returns `DofMismatch` naming the first pair of nodes that disagree.
    pub fn common_dof(&self, nodes: &dyn NodeProvider) -> FEAResult<usize> {
        let first = nodes.num_dof(self.nodes[0])?;
        for tag in &self.nodes[1..] {
            let ndf = nodes.num_dof(*tag)?;
            if ndf != first {
                return Err(FEAError::DofMismatch {
                    element: self.tag,
                    first,
                    second: ndf,
                });
            }
        }
        Ok(first)
    }
}

/// Per-instance output buffers
#[derive(Debug, Clone, PartialEq)]
pub struct Scratch {
    pub stiff: DMatrix<f64>,
    pub resid: DVector<f64>,
    pub mass: DMatrix<f64>,
}

impl Scratch {
    /// Zeroed buffers for `ndof` degrees of freedom
    pub fn new(ndof: usize) -> Self {
        Self {
            stiff: DMatrix::zeros(ndof, ndof),
            resid: DVector::zeros(ndof),
            mass: DMatrix::zeros(ndof, ndof),
        }
    }

    /// Resize for `ndof` degrees of freedom and clear
    pub fn allocate(&mut self, ndof: usize) {
        *self = Self::new(ndof);
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Behaviour shared by every element type
pub trait Element: std::fmt::Debug {
    fn core(&self) -> &ElementCore;

    fn core_mut(&mut self) -> &mut ElementCore;

    fn class_name(&self) -> &'static str;

    fn tag(&self) -> usize {
        self.core().tag
    }

    fn node_tags(&self) -> &[usize] {
        &self.core().nodes
    }

    fn num_dof(&self) -> usize;

    /// Bind the element to its nodes and cache the geometry.
    ///
    /// On a configuration error the element is left in a degraded state
    /// (fixed DOF count, zero matrices) and the error is returned.
    fn set_domain(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()>;

    /// Recompute the section deformations from the nodal trial displacements
    fn update(&mut self, nodes: &dyn NodeProvider) -> FEAResult<()>;

    fn tangent_stiffness(&mut self) -> &DMatrix<f64>;

    fn initial_stiffness(&mut self) -> &DMatrix<f64>;

    fn resisting_force(&mut self) -> &DVector<f64>;

    /// Resisting force plus inertia forces from the nodal trial accelerations
    fn resisting_force_inc_inertia(&mut self, nodes: &dyn NodeProvider) -> FEAResult<&DVector<f64>>;

    fn mass(&mut self) -> &DMatrix<f64>;

    /// Apply `load` scaled by `factor`.
    ///
    /// Unsupported load shapes are rejected without touching the element.
    fn add_load(&mut self, load: &ElementalLoad, factor: f64) -> FEAResult<()>;

    /// Clear mechanical loads and the section initial deformations
    fn zero_load(&mut self);

    fn commit_state(&mut self) -> FEAResult<()>;

    fn revert_to_last_commit(&mut self) -> FEAResult<()>;

    fn revert_to_start(&mut self) -> FEAResult<()>;

    /// Fold the deformation of the last update into the persistent initial
    /// deformation
    fn fold_current_deformation(&mut self);

    fn is_alive(&self) -> bool {
        self.core().is_alive()
    }

    /// Deactivate the element
    fn kill(&mut self) {
        if self.core().alive {
            log::debug!("{} {}: deactivated", self.class_name(), self.tag());
            self.core_mut().alive = false;
        }
    }

    /// Reactivate the element.
    ///
    /// The deformation reached while dead becomes the new zero, so that it
    /// produces no force after reactivation.
    fn alive(&mut self) {
        if !self.core().alive {
            self.fold_current_deformation();
            self.core_mut().alive = true;
            log::debug!("{} {}: reactivated", self.class_name(), self.tag());
        }
    }

    /// Named response quantity
    fn response(&mut self, name: &str) -> FEAResult<DVector<f64>>;

    fn pack(&self) -> FEAResult<Value>;

    /// Restore the state packed by `pack`; nothing changes on failure
    fn unpack(&mut self, packed: &Value) -> FEAResult<()>;
}

/// Elements carrying an axial force
pub trait HasAxialResponse {
    fn axial_force(&self) -> f64;
    /// Elongation of the element
    fn axial_deformation(&self) -> f64;
}

/// Elements carrying bending moments
pub trait HasBendingResponse {
    fn bending_moments(&self) -> DVector<f64>;
}

/// Elements carrying shear forces
pub trait HasShearResponse {
    fn shear_forces(&self) -> DVector<f64>;
}

/// Geometrically nonlinear elements tracking a rotating frame
pub trait IsCorotational {
    fn current_length(&self) -> f64;
    fn initial_length(&self) -> f64;
    /// Rows are the local axes fixed at binding time
    fn local_frame(&self) -> &Mat3;
}

/// Report `load` as unsupported by `element`
pub(crate) fn reject_load(element: &dyn Element, load: &ElementalLoad) -> FEAError {
    log::error!(
        "{} {}: load {} of type {} is not supported, ignored",
        element.class_name(),
        element.tag(),
        load.tag,
        load.name()
    );
    FEAError::UnsupportedLoad {
        element: element.tag(),
        element_type: element.class_name(),
        load: load.name(),
    }
}

/// True when the load must be skipped because the element is dead
pub(crate) fn skip_load_on_dead(element: &dyn Element, load: &ElementalLoad) -> bool {
    if element.is_alive() {
        return false;
    }
    log::warn!(
        "{} {}: load {} over inactive element, skipped",
        element.class_name(),
        element.tag(),
        load.tag
    );
    true
}

/// Unknown response name
pub(crate) fn unknown_response(element: &dyn Element, name: &str) -> FEAError {
    FEAError::InvalidInput(format!(
        "{} {} has no response '{name}'",
        element.class_name(),
        element.tag()
    ))
}

/// Deserialize a packed element, check its invariants and re-allocate its
/// scratch buffers
pub(crate) fn unpack_element<T>(kind: &str, packed: &Value) -> FEAResult<T>
where
    T: serde::de::DeserializeOwned + CheckPacked + Element + HasScratch,
{
    let mut restored: T = crate::pack::unpack(kind, packed)?;
    let ndof = restored.num_dof();
    restored.scratch_mut().allocate(ndof);
    Ok(restored)
}

/// Access to the scratch buffers of an element
pub(crate) trait HasScratch {
    fn scratch_mut(&mut self) -> &mut Scratch;
}
