//! Elemental loads and load patterns

mod mechanical;
mod pattern;
mod strain;

pub use mechanical::{BeamMecLoad2d, BeamPointLoad2d, BeamUniformLoad2d, ShellUniformLoad};
pub use pattern::LoadPattern;
pub use strain::{BeamStrainLoad, ShellStrainLoad, TrussStrainLoad};

use serde::{Deserialize, Serialize};

/// Shape of an elemental load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LoadKind {
    TrussStrain(TrussStrainLoad),
    BeamStrain(BeamStrainLoad),
    BeamPoint2d(BeamPointLoad2d),
    BeamUniform2d(BeamUniformLoad2d),
    ShellUniform(ShellUniformLoad),
    ShellStrain(ShellStrainLoad),
}

impl LoadKind {
    /// Type name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            LoadKind::TrussStrain(_) => "TrussStrainLoad",
            LoadKind::BeamStrain(_) => "BeamStrainLoad",
            LoadKind::BeamPoint2d(_) => "BeamPointLoad2d",
            LoadKind::BeamUniform2d(_) => "BeamUniformLoad2d",
            LoadKind::ShellUniform(_) => "ShellUniformLoad",
            LoadKind::ShellStrain(_) => "ShellStrainLoad",
        }
    }

    /// True for imposed deformations, false for mechanical loads
    pub fn is_strain_load(&self) -> bool {
        matches!(
            self,
            LoadKind::TrussStrain(_) | LoadKind::BeamStrain(_) | LoadKind::ShellStrain(_)
        )
    }
}

/// A load shape bound to the elements it acts on, by tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementalLoad {
    pub tag: usize,
    pub element_tags: Vec<usize>,
    pub kind: LoadKind,
}

impl ElementalLoad {
    pub fn new(tag: usize, element_tags: Vec<usize>, kind: impl Into<LoadKind>) -> Self {
        Self {
            tag,
            element_tags,
            kind: kind.into(),
        }
    }

    /// Type name of the load shape
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

macro_rules! load_kind_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for LoadKind {
                fn from(load: $ty) -> Self {
                    LoadKind::$variant(load)
                }
            }
        )*
    };
}

load_kind_from! {
    TrussStrainLoad => TrussStrain,
    BeamStrainLoad => BeamStrain,
    BeamPointLoad2d => BeamPoint2d,
    BeamUniformLoad2d => BeamUniform2d,
    ShellUniformLoad => ShellUniform,
    ShellStrainLoad => ShellStrain,
}
