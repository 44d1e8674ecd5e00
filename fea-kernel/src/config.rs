//! Element options

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Options shared by every element type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementOptions {
    /// Stiffness/force reduction factor applied while an element is dead
    pub dead_srf: f64,
    /// Lengths, areas and Jacobian determinants below this are degenerate
    pub geometry_tolerance: f64,
    /// Multiplier on the drilling stiffness of shell elements
    pub drilling_scale: f64,
}

impl Default for ElementOptions {
    fn default() -> Self {
        Self {
            dead_srf: 1e-6,
            geometry_tolerance: 1e-10,
            drilling_scale: 1.0,
        }
    }
}

impl ElementOptions {
    /// Set the deactivation factor
    pub fn with_dead_srf(mut self, dead_srf: f64) -> Self {
        self.dead_srf = dead_srf;
        self
    }

    /// Set the degenerate geometry tolerance
    pub fn with_geometry_tolerance(mut self, tol: f64) -> Self {
        self.geometry_tolerance = tol;
        self
    }

    /// Set the drilling stiffness multiplier
    pub fn with_drilling_scale(mut self, scale: f64) -> Self {
        self.drilling_scale = scale;
        self
    }

    /// Read options from a JSON document; missing fields keep their defaults
    pub fn from_json(text: &str) -> FEAResult<Self> {
        let options: Self = serde_json::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every option is usable
    pub fn validate(&self) -> FEAResult<()> {
        if !(self.dead_srf >= 0.0 && self.dead_srf.is_finite()) {
            return Err(FEAError::InvalidInput(format!(
                "dead_srf must be a non-negative number, got {}",
                self.dead_srf
            )));
        }
        if !(self.geometry_tolerance > 0.0) {
            return Err(FEAError::InvalidInput(format!(
                "geometry_tolerance must be positive, got {}",
                self.geometry_tolerance
            )));
        }
        if !(self.drilling_scale >= 0.0) {
            return Err(FEAError::InvalidInput(format!(
                "drilling_scale must be non-negative, got {}",
                self.drilling_scale
            )));
        }
        Ok(())
    }
}
