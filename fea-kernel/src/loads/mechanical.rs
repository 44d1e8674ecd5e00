//! Mechanical loads on beams and shells

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// A load on a 2D beam that contributes through the basic system.
///
/// `p0` holds the support reactions of the simply supported member
/// `[axial at I, transverse at I, transverse at J]` and `q0` the fixed end
/// forces `[N, M_I, M_J]`.
pub trait BeamMecLoad2d {
    fn add_fixed_end_forces(
        &self,
        length: f64,
        factor: f64,
        p0: &mut Vector3<f64>,
        q0: &mut Vector3<f64>,
    );
}

/// Concentrated load at a relative position along a 2D beam
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamPointLoad2d {
    /// Transverse component (positive along local y)
    pub p_trans: f64,
    /// Axial component (positive from node I to node J)
    pub p_axial: f64,
    /// Position over length, in [0, 1]
    pub a_over_l: f64,
}

impl BeamPointLoad2d {
    pub fn new(p_trans: f64, p_axial: f64, a_over_l: f64) -> FEAResult<Self> {
        if !(0.0..=1.0).contains(&a_over_l) {
            return Err(FEAError::InvalidInput(format!(
                "point load position a/L must lie in [0, 1], got {a_over_l}"
            )));
        }
        Ok(Self {
            p_trans,
            p_axial,
            a_over_l,
        })
    }
}

impl BeamMecLoad2d for BeamPointLoad2d {
    fn add_fixed_end_forces(
        &self,
        length: f64,
        factor: f64,
        p0: &mut Vector3<f64>,
        q0: &mut Vector3<f64>,
    ) {
        let p = self.p_trans * factor;
        let n = self.p_axial * factor;
        let a = self.a_over_l * length;
        let b = length - a;

        p0[0] -= n;
        p0[1] -= p * (1.0 - self.a_over_l);
        p0[2] -= p * self.a_over_l;

        let l2 = 1.0 / (length * length);
        q0[0] -= n * self.a_over_l;
        q0[1] += -a * b * b * p * l2;
        q0[2] += a * a * b * p * l2;
    }
}

/// Uniformly distributed load over a whole 2D beam
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamUniformLoad2d {
    /// Transverse intensity per unit length
    pub w_trans: f64,
    /// Axial intensity per unit length
    pub w_axial: f64,
}

impl BeamUniformLoad2d {
    pub fn new(w_trans: f64, w_axial: f64) -> Self {
        Self { w_trans, w_axial }
    }
}

impl BeamMecLoad2d for BeamUniformLoad2d {
    fn add_fixed_end_forces(
        &self,
        length: f64,
        factor: f64,
        p0: &mut Vector3<f64>,
        q0: &mut Vector3<f64>,
    ) {
        let wt = self.w_trans * factor;
        let wa = self.w_axial * factor;
        let v = 0.5 * wt * length;
        let p = wa * length;

        p0[0] -= p;
        p0[1] -= v;
        p0[2] -= v;

        q0[0] -= 0.5 * p;
        let m = v * length / 6.0;
        q0[1] -= m;
        q0[2] += m;
    }
}

/// Uniform surface load on a shell, in the element's local axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShellUniformLoad {
    pub wx: f64,
    pub wy: f64,
    pub wz: f64,
}

impl ShellUniformLoad {
    pub fn new(wx: f64, wy: f64, wz: f64) -> Self {
        Self { wx, wy, wz }
    }

    /// Pressure normal to the shell mid-surface
    pub fn normal(wz: f64) -> Self {
        Self::new(0.0, 0.0, wz)
    }

    pub fn local_vector(&self, factor: f64) -> Vector3<f64> {
        Vector3::new(self.wx, self.wy, self.wz) * factor
    }
}
