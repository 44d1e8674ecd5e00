//! In-memory registry of nodes and elements
//!
//! The domain resolves the tags carried by elements and loads. It drives the
//! element life cycle but never assembles or solves global equations.

use std::collections::BTreeMap;

use nalgebra::DVector;

use crate::elements::Element;
use crate::error::{FEAError, FEAResult};
use crate::loads::ElementalLoad;
use crate::node::{Node, NodeRegistry};

/// Nodes and elements by tag
#[derive(Debug, Default)]
pub struct Domain {
    nodes: NodeRegistry,
    elements: BTreeMap<usize, Box<dyn Element>>,
}

/// Keep the first error of a sweep that visits every member
fn keep_first(first: &mut Option<FEAError>, result: FEAResult<()>) {
    if let Err(e) = result {
        first.get_or_insert(e);
    }
}

impl Domain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, tag: usize, node: Node) -> FEAResult<()> {
        self.nodes.add(tag, node)
    }

    /// Add an element and bind it to its nodes.
    ///
    /// A duplicate tag or invalid options reject the element. A binding
    /// failure keeps the element in its degraded state and returns the
    /// error.
    pub fn add_element(&mut self, mut element: Box<dyn Element>) -> FEAResult<()> {
        let tag = element.tag();
        if self.elements.contains_key(&tag) {
            return Err(FEAError::DuplicateTag(tag));
        }
        element.core().options.validate()?;
        let bound = element.set_domain(&self.nodes);
        if let Err(e) = &bound {
            log::warn!("{} {tag}: binding failed: {e}", element.class_name());
        }
        self.elements.insert(tag, element);
        bound
    }

    /// Registry the elements are bound to
    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    pub fn node_mut(&mut self, tag: usize) -> FEAResult<&mut Node> {
        self.nodes.get_mut(tag)
    }

    pub fn element(&self, tag: usize) -> FEAResult<&dyn Element> {
        self.elements
            .get(&tag)
            .map(|e| e.as_ref())
            .ok_or(FEAError::ElementNotFound(tag))
    }

    pub fn element_mut(&mut self, tag: usize) -> FEAResult<&mut dyn Element> {
        match self.elements.get_mut(&tag) {
            Some(e) => Ok(e.as_mut()),
            None => Err(FEAError::ElementNotFound(tag)),
        }
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Element tags in ascending order
    pub fn element_tags(&self) -> impl Iterator<Item = usize> + '_ {
        self.elements.keys().copied()
    }

    pub fn set_trial_displacement(&mut self, tag: usize, disp: &DVector<f64>) -> FEAResult<()> {
        self.nodes.get_mut(tag)?.set_trial_displacement(disp)
    }

    pub fn set_trial_acceleration(&mut self, tag: usize, accel: &DVector<f64>) -> FEAResult<()> {
        self.nodes.get_mut(tag)?.set_trial_acceleration(accel)
    }

    /// Update every element from the nodal trial displacements
    pub fn update(&mut self) -> FEAResult<()> {
        let mut first = None;
        for element in self.elements.values_mut() {
            keep_first(&mut first, element.update(&self.nodes));
        }
        first.map_or(Ok(()), Err)
    }

    /// Commit nodes and elements
    pub fn commit_state(&mut self) -> FEAResult<()> {
        for (_, node) in self.nodes.iter_mut() {
            node.commit_state();
        }
        self.broadcast("commit_state", |e| e.commit_state())
    }

    pub fn revert_to_last_commit(&mut self) -> FEAResult<()> {
        for (_, node) in self.nodes.iter_mut() {
            node.revert_to_last_commit();
        }
        self.broadcast("revert_to_last_commit", |e| e.revert_to_last_commit())
    }

    pub fn revert_to_start(&mut self) -> FEAResult<()> {
        for (_, node) in self.nodes.iter_mut() {
            node.revert_to_start();
        }
        self.broadcast("revert_to_start", |e| e.revert_to_start())
    }

    fn broadcast<F>(&mut self, operation: &str, mut op: F) -> FEAResult<()>
    where
        F: FnMut(&mut dyn Element) -> FEAResult<()>,
    {
        let mut first = None;
        for (tag, element) in self.elements.iter_mut() {
            let result = op(element.as_mut());
            if let Err(e) = &result {
                log::error!("{operation} failed on element {tag}: {e}");
            }
            keep_first(&mut first, result);
        }
        first.map_or(Ok(()), Err)
    }

    /// Deactivate the elements with the given tags
    pub fn kill_elements(&mut self, tags: &[usize]) -> FEAResult<()> {
        let mut first = None;
        for tag in tags {
            keep_first(&mut first, self.element_mut(*tag).map(|e| e.kill()));
        }
        first.map_or(Ok(()), Err)
    }

    /// Reactivate the elements with the given tags
    pub fn activate_elements(&mut self, tags: &[usize]) -> FEAResult<()> {
        let mut first = None;
        for tag in tags {
            keep_first(&mut first, self.element_mut(*tag).map(|e| e.alive()));
        }
        first.map_or(Ok(()), Err)
    }

    /// Apply `load` scaled by `factor` to every element it names
    pub fn apply_load(&mut self, load: &ElementalLoad, factor: f64) -> FEAResult<()> {
        let mut first = None;
        for tag in &load.element_tags {
            let result = self.element_mut(*tag).and_then(|e| e.add_load(load, factor));
            keep_first(&mut first, result);
        }
        first.map_or(Ok(()), Err)
    }

    /// Clear loads and imposed strains on every element
    pub fn zero_loads(&mut self) {
        for element in self.elements.values_mut() {
            element.zero_load();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{CorotTrussSection, TrussSection};
    use crate::loads::TrussStrainLoad;
    use crate::material::{ElasticUniaxial, Section1d, SectionModel, UniaxialModel};
    use crate::response::ResponseCode;
    use approx::assert_relative_eq;

    fn bar(ea: f64) -> SectionModel {
        Section1d::new(UniaxialModel::from(ElasticUniaxial::new(ea).unwrap()), ResponseCode::P).into()
    }

    fn two_bars() -> Domain {
        let mut domain = Domain::new();
        domain.add_node(1, Node::new(0.0, 0.0, 0.0, 2)).unwrap();
        domain.add_node(2, Node::new(1.0, 0.0, 0.0, 2)).unwrap();
        domain.add_node(3, Node::new(1.0, 1.0, 0.0, 2)).unwrap();
        domain
            .add_element(Box::new(TrussSection::new(1, 2, [1, 2], bar(10.0)).unwrap()))
            .unwrap();
        domain
            .add_element(Box::new(CorotTrussSection::new(2, 2, [2, 3], bar(20.0)).unwrap()))
            .unwrap();
        domain
    }

    #[test]
    fn test_duplicate_element_rejected() {
        let mut domain = two_bars();
        let again = TrussSection::new(1, 2, [1, 3], bar(1.0)).unwrap();
        assert!(matches!(
            domain.add_element(Box::new(again)),
            Err(FEAError::DuplicateTag(1))
        ));
        assert_eq!(domain.num_elements(), 2);
    }

    #[test]
    fn test_degraded_element_is_kept() {
        let mut domain = two_bars();
        domain.add_node(4, Node::new(2.0, 0.0, 0.0, 3)).unwrap();
        let bad = TrussSection::new(3, 2, [2, 4], bar(1.0)).unwrap();
        let err = domain.add_element(Box::new(bad)).unwrap_err();
        assert!(matches!(err, FEAError::DofMismatch { element: 3, .. }));
        assert_eq!(domain.element(3).unwrap().num_dof(), 2);
        // the broken element fails its update, the others still run
        domain.set_trial_displacement(2, &DVector::from_vec(vec![0.1, 0.0])).unwrap();
        assert!(domain.update().is_err());
        let f = domain.element_mut(1).unwrap().resisting_force().clone();
        assert_relative_eq!(f[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_commit_revert_cycle() {
        let mut domain = two_bars();
        domain.set_trial_displacement(3, &DVector::from_vec(vec![0.0, 0.1])).unwrap();
        domain.update().unwrap();
        domain.commit_state().unwrap();
        domain.set_trial_displacement(3, &DVector::from_vec(vec![0.0, 0.3])).unwrap();
        domain.update().unwrap();
        domain.revert_to_last_commit().unwrap();
        assert_relative_eq!(
            domain.nodes().get(3).unwrap().trial_displacement()[1],
            0.1,
            epsilon = 1e-15
        );
        let f = domain.element_mut(2).unwrap().resisting_force().clone();
        assert_relative_eq!(f[3], 20.0 * 0.1, epsilon = 1e-12);
        domain.revert_to_start().unwrap();
        assert_eq!(domain.element_mut(2).unwrap().resisting_force().amax(), 0.0);
    }

    #[test]
    fn test_apply_load_visits_every_tag() {
        let mut domain = two_bars();
        let load = ElementalLoad::new(1, vec![1, 99, 2], TrussStrainLoad::uniform(1e-2));
        assert!(matches!(
            domain.apply_load(&load, 1.0),
            Err(FEAError::ElementNotFound(99))
        ));
        domain.update().unwrap();
        let f1 = domain.element_mut(1).unwrap().resisting_force().clone();
        let f2 = domain.element_mut(2).unwrap().resisting_force().clone();
        assert_relative_eq!(f1[2], -0.1, epsilon = 1e-12);
        assert_relative_eq!(f2[3], -0.2, epsilon = 1e-12);
        domain.zero_loads();
        domain.update().unwrap();
        assert_eq!(domain.element_mut(1).unwrap().resisting_force().amax(), 0.0);
    }

    #[test]
    fn test_kill_and_activate() {
        let mut domain = two_bars();
        domain.kill_elements(&[1]).unwrap();
        assert!(!domain.element(1).unwrap().is_alive());
        domain.set_trial_displacement(2, &DVector::from_vec(vec![0.05, 0.0])).unwrap();
        domain.update().unwrap();
        domain.activate_elements(&[1, 42]).unwrap_err();
        assert!(domain.element(1).unwrap().is_alive());
        domain.update().unwrap();
        let f = domain.element_mut(1).unwrap().resisting_force().clone();
        assert_relative_eq!(f.amax(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_element_not_found() {
        let mut domain = two_bars();
        assert!(matches!(domain.element_mut(7), Err(FEAError::ElementNotFound(7))));
    }
}
