//! Gauss-Legendre integration rules

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// One-dimensional rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussRule1d {
    pub points: Vec<f64>,
    pub weights: Vec<f64>,
}

impl GaussRule1d {
    /// Gauss-Legendre rule with `n` points on [-1, 1], for 1 <= n <= 5
    pub fn legendre(n: usize) -> FEAResult<Self> {
        let (points, weights) = match n {
            1 => (vec![0.0], vec![2.0]),
            2 => {
                let a = 1.0 / 3.0_f64.sqrt();
                (vec![-a, a], vec![1.0, 1.0])
            }
            3 => {
                let a = 0.6_f64.sqrt();
                (vec![-a, 0.0, a], vec![5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0])
            }
            4 => {
                let a = (3.0 / 7.0 - 2.0 / 7.0 * 1.2_f64.sqrt()).sqrt();
                let b = (3.0 / 7.0 + 2.0 / 7.0 * 1.2_f64.sqrt()).sqrt();
                let wa = (18.0 + 30.0_f64.sqrt()) / 36.0;
                let wb = (18.0 - 30.0_f64.sqrt()) / 36.0;
                (vec![-b, -a, a, b], vec![wb, wa, wa, wb])
            }
            5 => {
                let a = (5.0 - 2.0 * (10.0_f64 / 7.0).sqrt()).sqrt() / 3.0;
                let b = (5.0 + 2.0 * (10.0_f64 / 7.0).sqrt()).sqrt() / 3.0;
                let w0 = 128.0 / 225.0;
                let wa = (322.0 + 13.0 * 70.0_f64.sqrt()) / 900.0;
                let wb = (322.0 - 13.0 * 70.0_f64.sqrt()) / 900.0;
                (vec![-b, -a, 0.0, a, b], vec![wb, wa, w0, wa, wb])
            }
            _ => {
                return Err(FEAError::InvalidInput(format!(
                    "Gauss-Legendre rule needs 1 to 5 points, got {n}"
                )))
            }
        };
        Ok(Self { points, weights })
    }

    /// The same rule mapped to [0, 1]; the weights then sum to one
    pub fn on_unit_interval(&self) -> Self {
        Self {
            points: self.points.iter().map(|x| 0.5 * (x + 1.0)).collect(),
            weights: self.weights.iter().map(|w| 0.5 * w).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Integration point in the parent square
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussPoint2d {
    pub r: f64,
    pub s: f64,
    pub weight: f64,
}

/// 2x2 rule, numbered counter-clockwise from (-,-)
pub fn quad_2x2() -> [GaussPoint2d; 4] {
    let g = 1.0 / 3.0_f64.sqrt();
    let sg = [-g, g, g, -g];
    let tg = [-g, -g, g, g];
    std::array::from_fn(|i| GaussPoint2d {
        r: sg[i],
        s: tg[i],
        weight: 1.0,
    })
}

/// 3x3 rule numbered like the nodes of a 9-node quadrilateral:
/// corners, then edge midpoints, then the centre
pub fn quad_3x3() -> [GaussPoint2d; 9] {
    let g = 0.6_f64.sqrt();
    let sg = [-g, g, g, -g, 0.0, g, 0.0, -g, 0.0];
    let tg = [-g, -g, g, g, -g, 0.0, g, 0.0, 0.0];
    let corner = 25.0 / 81.0;
    let edge = 40.0 / 81.0;
    let center = 64.0 / 81.0;
    let wg = [corner, corner, corner, corner, edge, edge, edge, edge, center];
    std::array::from_fn(|i| GaussPoint2d {
        r: sg[i],
        s: tg[i],
        weight: wg[i],
    })
}
