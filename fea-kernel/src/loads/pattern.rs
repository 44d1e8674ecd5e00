//! Load patterns

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::FEAResult;

use super::ElementalLoad;

/// A named group of elemental loads sharing one scale factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadPattern {
    /// Name of the pattern
    pub name: String,
    /// Constant multiplier applied to every load
    pub factor: f64,
    /// Loads of the pattern
    pub loads: Vec<ElementalLoad>,
}

impl LoadPattern {
    /// Create an empty pattern with unit factor
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            factor: 1.0,
            loads: Vec::new(),
        }
    }

    /// Set the pattern factor
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Add a load to the pattern
    pub fn with_load(mut self, load: ElementalLoad) -> Self {
        self.loads.push(load);
        self
    }

    pub fn add_load(&mut self, load: ElementalLoad) {
        self.loads.push(load);
    }

    /// Apply every load to every element it names.
    ///
    /// All loads are visited even after a failure; the first error is
    /// returned. Applying the same pattern twice adds twice.
    pub fn apply(&self, domain: &mut Domain) -> FEAResult<()> {
        log::debug!(
            "pattern '{}': applying {} loads with factor {}",
            self.name,
            self.loads.len(),
            self.factor
        );
        let mut first_error = None;
        for load in &self.loads {
            if let Err(e) = domain.apply_load(load, self.factor) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Default for LoadPattern {
    fn default() -> Self {
        Self::new("Pattern 1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{Element, TrussSection};
    use crate::error::FEAError;
    use crate::loads::{BeamUniformLoad2d, TrussStrainLoad};
    use crate::material::{ElasticUniaxial, Section1d, UniaxialModel};
    use crate::node::Node;
    use crate::response::ResponseCode;
    use approx::assert_relative_eq;

    fn bar_domain() -> Domain {
        let mut domain = Domain::new();
        domain.add_node(1, Node::new(0.0, 0.0, 0.0, 1)).unwrap();
        domain.add_node(2, Node::new(2.0, 0.0, 0.0, 1)).unwrap();
        let section = Section1d::new(UniaxialModel::from(ElasticUniaxial::new(100.0).unwrap()), ResponseCode::P);
        let truss = TrussSection::new(1, 1, [1, 2], section.into()).unwrap();
        domain.add_element(Box::new(truss)).unwrap();
        domain
    }

    #[test]
    fn test_pattern_scales_and_accumulates() {
        let mut domain = bar_domain();
        let pattern = LoadPattern::new("thermal")
            .with_factor(2.0)
            .with_load(ElementalLoad::new(1, vec![1], TrussStrainLoad::uniform(1e-3)));
        pattern.apply(&mut domain).unwrap();
        pattern.apply(&mut domain).unwrap();
        domain.update().unwrap();
        let f = domain.element_mut(1).unwrap().resisting_force().clone();
        // N = -EA * 4e-3
        assert_relative_eq!(f[1], -0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_pattern_reports_first_failure() {
        let mut domain = bar_domain();
        let pattern = LoadPattern::new("mixed")
            .with_load(ElementalLoad::new(1, vec![1], BeamUniformLoad2d::new(1.0, 0.0)))
            .with_load(ElementalLoad::new(2, vec![7], TrussStrainLoad::uniform(1e-3)))
            .with_load(ElementalLoad::new(3, vec![1], TrussStrainLoad::uniform(1e-3)));
        let r = pattern.apply(&mut domain);
        assert!(matches!(r, Err(FEAError::UnsupportedLoad { element: 1, .. })));
        // the last load is still applied
        domain.update().unwrap();
        let f = domain.element_mut(1).unwrap().resisting_force().clone();
        assert_relative_eq!(f[1], -0.1, epsilon = 1e-12);
    }
}
