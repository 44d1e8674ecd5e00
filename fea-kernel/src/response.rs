//! Response codes: symbolic tags for the rows and columns of generalized
//! stress, strain and tangent quantities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// Physical quantity carried by one component of a generalized vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCode {
    /// Axial force / axial strain
    P,
    /// Bending about the local z axis
    Mz,
    /// Bending about the local y axis
    My,
    /// Shear along the local y axis
    Vy,
    /// Shear along the local z axis
    Vz,
    /// Torsion
    T,
    /// Membrane force along local axis 1
    N1,
    /// Membrane force along local axis 2
    N2,
    /// In-plane membrane shear
    N12,
    /// Plate bending moment about axis 1
    M1,
    /// Plate bending moment about axis 2
    M2,
    /// Plate twisting moment
    M12,
    /// Transverse shear on face 1
    Q13,
    /// Transverse shear on face 2
    Q23,
}

impl ResponseCode {
    /// Every code, in identifier order
    pub const ALL: [ResponseCode; 14] = [
        ResponseCode::Mz,
        ResponseCode::P,
        ResponseCode::Vy,
        ResponseCode::My,
        ResponseCode::Vz,
        ResponseCode::T,
        ResponseCode::N1,
        ResponseCode::N2,
        ResponseCode::N12,
        ResponseCode::M1,
        ResponseCode::M2,
        ResponseCode::M12,
        ResponseCode::Q13,
        ResponseCode::Q23,
    ];

    /// Integer identifier used in packed data and diagnostics
    pub fn id(self) -> i32 {
        match self {
            ResponseCode::Mz => 1,
            ResponseCode::P => 2,
            ResponseCode::Vy => 3,
            ResponseCode::My => 4,
            ResponseCode::Vz => 5,
            ResponseCode::T => 6,
            ResponseCode::N1 => 11,
            ResponseCode::N2 => 12,
            ResponseCode::N12 => 13,
            ResponseCode::M1 => 14,
            ResponseCode::M2 => 15,
            ResponseCode::M12 => 16,
            ResponseCode::Q13 => 17,
            ResponseCode::Q23 => 18,
        }
    }

    /// Inverse of [`ResponseCode::id`]
    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            ResponseCode::P => "P",
            ResponseCode::Mz => "Mz",
            ResponseCode::My => "My",
            ResponseCode::Vy => "Vy",
            ResponseCode::Vz => "Vz",
            ResponseCode::T => "T",
            ResponseCode::N1 => "n1",
            ResponseCode::N2 => "n2",
            ResponseCode::N12 => "n12",
            ResponseCode::M1 => "m1",
            ResponseCode::M2 => "m2",
            ResponseCode::M12 => "m12",
            ResponseCode::Q13 => "q13",
            ResponseCode::Q23 => "q23",
        }
    }

    /// Axial, membrane
    pub fn is_axial(self) -> bool {
        matches!(self, ResponseCode::P | ResponseCode::N1 | ResponseCode::N2 | ResponseCode::N12)
    }

    pub fn is_bending(self) -> bool {
        matches!(
            self,
            ResponseCode::Mz | ResponseCode::My | ResponseCode::M1 | ResponseCode::M2 | ResponseCode::M12
        )
    }

    pub fn is_shear(self) -> bool {
        matches!(
            self,
            ResponseCode::Vy | ResponseCode::Vz | ResponseCode::Q13 | ResponseCode::Q23
        )
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResponseCode {
    type Err = FEAError;

    fn from_str(s: &str) -> FEAResult<Self> {
        let code = match s {
            "P" | "N" => ResponseCode::P,
            "Mz" => ResponseCode::Mz,
            "My" => ResponseCode::My,
            "Vy" => ResponseCode::Vy,
            "Vz" => ResponseCode::Vz,
            "T" | "Mx" => ResponseCode::T,
            "n1" => ResponseCode::N1,
            "n2" => ResponseCode::N2,
            "n12" => ResponseCode::N12,
            "m1" => ResponseCode::M1,
            "m2" => ResponseCode::M2,
            "m12" => ResponseCode::M12,
            "q13" => ResponseCode::Q13,
            "q23" => ResponseCode::Q23,
            _ => {
                return Err(FEAError::InvalidInput(format!(
                    "unknown response code '{s}'"
                )))
            }
        };
        Ok(code)
    }
}

/// Ordered sequence of response codes describing a generalized vector
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseId(Vec<ResponseCode>);

impl ResponseId {
    pub fn new(codes: Vec<ResponseCode>) -> Self {
        Self(codes)
    }

    /// Axial and strong-axis bending
    pub fn elastic_section_2d() -> Self {
        Self(vec![ResponseCode::P, ResponseCode::Mz])
    }

    /// Axial, bending and shear in the plane
    pub fn elastic_shear_section_2d() -> Self {
        Self(vec![ResponseCode::P, ResponseCode::Mz, ResponseCode::Vy])
    }

    pub fn elastic_section_3d() -> Self {
        Self(vec![
            ResponseCode::P,
            ResponseCode::Mz,
            ResponseCode::My,
            ResponseCode::T,
        ])
    }

    pub fn elastic_shear_section_3d() -> Self {
        Self(vec![
            ResponseCode::P,
            ResponseCode::Mz,
            ResponseCode::My,
            ResponseCode::Vy,
            ResponseCode::Vz,
            ResponseCode::T,
        ])
    }

    /// Plate bending and transverse shear
    pub fn plate() -> Self {
        Self(vec![
            ResponseCode::M1,
            ResponseCode::M2,
            ResponseCode::M12,
            ResponseCode::Q13,
            ResponseCode::Q23,
        ])
    }

    /// Membrane, plate bending and transverse shear
    pub fn membrane_plate() -> Self {
        Self(vec![
            ResponseCode::N1,
            ResponseCode::N2,
            ResponseCode::N12,
            ResponseCode::M1,
            ResponseCode::M2,
            ResponseCode::M12,
            ResponseCode::Q13,
            ResponseCode::Q23,
        ])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Codes in layout order
    pub fn codes(&self) -> &[ResponseCode] {
        &self.0
    }

    pub fn get(&self, i: usize) -> Option<ResponseCode> {
        self.0.get(i).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ResponseCode> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, code: ResponseCode) -> bool {
        self.0.contains(&code)
    }

    /// Index of the first component carrying `code`
    pub fn position(&self, code: ResponseCode) -> Option<usize> {
        self.0.iter().position(|c| *c == code)
    }

    /// Indices of every component carrying `code`
    pub fn positions(&self, code: ResponseCode) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(move |(_, c)| **c == code)
            .map(|(i, _)| i)
    }

    /// True if the layout carries an axial force
    pub fn has_axial(&self) -> bool {
        self.0.iter().any(|c| c.is_axial())
    }

    /// True if the layout carries a bending moment
    pub fn has_bending(&self) -> bool {
        self.0.iter().any(|c| c.is_bending())
    }

    /// True if the layout carries a shear force
    pub fn has_shear(&self) -> bool {
        self.0.iter().any(|c| c.is_shear())
    }
}

impl From<Vec<ResponseCode>> for ResponseId {
    fn from(codes: Vec<ResponseCode>) -> Self {
        Self(codes)
    }
}

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|c| c.name()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
