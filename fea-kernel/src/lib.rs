//! FEA Kernel - element state update and tangent assembly for nonlinear
//! structural analysis
//!
//! The crate covers the part of a finite element code that sits between the
//! global solver and the constitutive laws:
//! - elements pull nodal trial displacements, compute generalized strains at
//!   their integration points and drive their sections,
//! - sections and materials keep committed, trial and initial states,
//! - elements integrate stresses and tangents into resisting forces and
//!   stiffness matrices, including drilling and geometric terms,
//! - the commit/revert life cycle, element deactivation and imposed strains
//!   are handled consistently across all of them.
//!
//! Available elements: [`TrussSection`](elements::TrussSection),
//! [`CorotTrussSection`](elements::CorotTrussSection),
//! [`ShellMITC4`](elements::ShellMITC4), [`ShellMITC9`](elements::ShellMITC9),
//! their corotational forms [`CorotShellMITC4`](elements::CorotShellMITC4) and
//! [`CorotShellMITC9`](elements::CorotShellMITC9),
//! [`DispBeamColumn2d`](elements::DispBeamColumn2d) and
//! [`ZeroLengthSection`](elements::ZeroLengthSection).
//!
//! ## Example
//! ```rust
//! use fea_kernel::prelude::*;
//! use nalgebra::DVector;
//!
//! let mut domain = Domain::new();
//! domain.add_node(1, Node::new(0.0, 0.0, 0.0, 2)).unwrap();
//! domain.add_node(2, Node::new(2.0, 0.0, 0.0, 2)).unwrap();
//!
//! let steel = ElasticPerfectlyPlastic::new(1000.0, 5.0).unwrap();
//! let section = Section1d::new(UniaxialModel::from(steel), ResponseCode::P);
//! let bar = CorotTrussSection::new(1, 2, [1, 2], section.into()).unwrap();
//! domain.add_element(Box::new(bar)).unwrap();
//!
//! domain.set_trial_displacement(2, &DVector::from_vec(vec![0.002, 0.0])).unwrap();
//! domain.update().unwrap();
//! domain.commit_state().unwrap();
//!
//! let force = domain.element_mut(1).unwrap().resisting_force().clone();
//! assert!((force[2] - 1.0).abs() < 1e-9);
//! ```

pub mod aggregate;
pub mod config;
pub mod deformation;
pub mod domain;
pub mod elements;
pub mod error;
pub mod loads;
pub mod material;
pub mod math;
pub mod node;
pub mod pack;
pub mod response;

// Re-export common types
pub mod prelude {
    pub use crate::aggregate::ConstitutiveAggregate;
    pub use crate::config::ElementOptions;
    pub use crate::deformation::{DeformationPlane, GeneralizedDeformation};
    pub use crate::domain::Domain;
    pub use crate::elements::{
        CorotShellMITC4, CorotShellMITC9, CorotTrussSection, DispBeamColumn2d, Element,
        HasAxialResponse, HasBendingResponse, HasShearResponse, IsCorotational, ShellMITC4,
        ShellMITC9, TrussSection, ZeroLengthSection,
    };
    pub use crate::error::{FEAError, FEAResult, Severity};
    pub use crate::loads::{
        BeamPointLoad2d, BeamStrainLoad, BeamUniformLoad2d, ElementalLoad, LoadKind, LoadPattern,
        ShellStrainLoad, ShellUniformLoad, TrussStrainLoad,
    };
    pub use crate::material::{
        Bidirectional, ConstitutiveModel, ElasticBeamSection, ElasticMembranePlateSection,
        ElasticPerfectlyPlastic, ElasticPlateSection, ElasticUniaxial, Section1d, SectionModel,
        UniaxialMaterial, UniaxialModel,
    };
    pub use crate::node::{Node, NodeProvider, NodeRegistry};
    pub use crate::response::{ResponseCode, ResponseId};
}
