//! Nodes and the read-only view elements have of them

use std::collections::HashMap;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};
use crate::math::Vec3;

/// Read-only access to nodal state, by node tag
pub trait NodeProvider {
    fn coordinates(&self, tag: usize) -> FEAResult<Vec3>;
    fn num_dof(&self, tag: usize) -> FEAResult<usize>;
    fn trial_displacement(&self, tag: usize) -> FEAResult<&DVector<f64>>;
    fn trial_acceleration(&self, tag: usize) -> FEAResult<&DVector<f64>>;
}

/// A point in 3D space carrying `ndof` degrees of freedom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
    ndof: usize,
    trial_disp: DVector<f64>,
    committed_disp: DVector<f64>,
    trial_accel: DVector<f64>,
}

impl Node {
    /// Create a node with `ndof` degrees of freedom at rest
    pub fn new(x: f64, y: f64, z: f64, ndof: usize) -> Self {
        Self {
            x,
            y,
            z,
            ndof,
            trial_disp: DVector::zeros(ndof),
            committed_disp: DVector::zeros(ndof),
            trial_accel: DVector::zeros(ndof),
        }
    }

    /// Get the coordinates as a vector
    pub fn coords(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Degrees of freedom carried by the node
    pub fn num_dof(&self) -> usize {
        self.ndof
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        (other.coords() - self.coords()).norm()
    }

    /// Displacement of the current trial state
    pub fn trial_displacement(&self) -> &DVector<f64> {
        &self.trial_disp
    }

    /// Displacement at the last commit
    pub fn committed_displacement(&self) -> &DVector<f64> {
        &self.committed_disp
    }

    /// Acceleration of the current trial state
    pub fn trial_acceleration(&self) -> &DVector<f64> {
        &self.trial_accel
    }

    pub fn set_trial_displacement(&mut self, disp: &DVector<f64>) -> FEAResult<()> {
        self.check_len(disp)?;
        self.trial_disp.copy_from(disp);
        Ok(())
    }

    /// Add `inc` to the trial displacement
    pub fn increment_trial_displacement(&mut self, inc: &DVector<f64>) -> FEAResult<()> {
        self.check_len(inc)?;
        self.trial_disp += inc;
        Ok(())
    }

    pub fn set_trial_acceleration(&mut self, accel: &DVector<f64>) -> FEAResult<()> {
        self.check_len(accel)?;
        self.trial_accel.copy_from(accel);
        Ok(())
    }

    pub fn commit_state(&mut self) {
        self.committed_disp.copy_from(&self.trial_disp);
    }

    pub fn revert_to_last_commit(&mut self) {
        self.trial_disp.copy_from(&self.committed_disp);
    }

    pub fn revert_to_start(&mut self) {
        self.trial_disp.fill(0.0);
        self.committed_disp.fill(0.0);
        self.trial_accel.fill(0.0);
    }

    fn check_len(&self, v: &DVector<f64>) -> FEAResult<()> {
        if v.len() != self.ndof {
            return Err(FEAError::OrderMismatch {
                expected: self.ndof,
                got: v.len(),
            });
        }
        Ok(())
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 3)
    }
}

/// Nodes by tag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeRegistry {
    nodes: HashMap<usize, Node>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, rejecting a tag already in use
    pub fn add(&mut self, tag: usize, node: Node) -> FEAResult<()> {
        if self.nodes.contains_key(&tag) {
            return Err(FEAError::DuplicateTag(tag));
        }
        self.nodes.insert(tag, node);
        Ok(())
    }

    pub fn get(&self, tag: usize) -> FEAResult<&Node> {
        self.nodes.get(&tag).ok_or(FEAError::NodeNotFound(tag))
    }

    pub fn get_mut(&mut self, tag: usize) -> FEAResult<&mut Node> {
        self.nodes.get_mut(&tag).ok_or(FEAError::NodeNotFound(tag))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&usize, &mut Node)> {
        self.nodes.iter_mut()
    }
}

impl NodeProvider for NodeRegistry {
    fn coordinates(&self, tag: usize) -> FEAResult<Vec3> {
        Ok(self.get(tag)?.coords())
    }

    fn num_dof(&self, tag: usize) -> FEAResult<usize> {
        Ok(self.get(tag)?.num_dof())
    }

    fn trial_displacement(&self, tag: usize) -> FEAResult<&DVector<f64>> {
        Ok(self.get(tag)?.trial_displacement())
    }

    fn trial_acceleration(&self, tag: usize) -> FEAResult<&DVector<f64>> {
        Ok(self.get(tag)?.trial_acceleration())
    }
}
