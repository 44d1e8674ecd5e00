//! 9-node Lagrangian shell

use nalgebra::DMatrix;

use super::{Shell, ShellFormulation};
use crate::error::FEAResult;
use crate::material::SectionModel;
use crate::math::{lagrange9, quad_3x3, GaussPoint2d, ShapeDerivatives, ShapeValues};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mitc9;

impl ShellFormulation for Mitc9 {
    const CLASS_NAME: &'static str = "ShellMITC9";
    const COROTATIONAL_CLASS_NAME: &'static str = "CorotShellMITC9";
    const NUM_NODES: usize = 9;
    const ACCEPTS_STRAIN_LOAD: bool = false;

    fn gauss_points() -> Vec<GaussPoint2d> {
        quad_3x3().to_vec()
    }

    fn shape(r: f64, s: f64) -> ShapeValues {
        lagrange9(r, s)
    }

    /// `gamma13 = w,1 + theta2`, `gamma23 = w,2 - theta1`
    fn shear_b(_xl: &[[f64; 2]], _gp: &GaussPoint2d, d: &ShapeDerivatives) -> FEAResult<DMatrix<f64>> {
        let mut shear = DMatrix::zeros(2, 27);
        for k in 0..9 {
            shear[(0, 3 * k)] = d.dn_dx[k];
            shear[(0, 3 * k + 2)] = d.n[k];
            shear[(1, 3 * k)] = d.dn_dy[k];
            shear[(1, 3 * k + 1)] = -d.n[k];
        }
        Ok(shear)
    }
}

impl Shell<Mitc9> {
    /// Create a 9-node shell.
    ///
    /// Nodes are the four corners counter-clockwise, the midpoints of edges
    /// 1-2, 2-3, 3-4 and 4-1, then the centre.
    pub fn new(tag: usize, nodes: [usize; 9], section: SectionModel) -> FEAResult<Self> {
        Self::build(tag, nodes.to_vec(), section)
    }
}
