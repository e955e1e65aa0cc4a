//! # Mapping Metadata Graph
//!
//! The mapping graph describes how payloads become objects. It is assembled
//! once, validated, and then shared read-only (`Arc<MappingGraph>`) by every
//! decode call.
//!
//! ## Building Blocks
//!
//! - [`ClassDef`] - how objects of a class are constructed and populated
//! - [`Bean`] - one object mapping: class, constructor arguments, properties
//!   and, for containers, element and key descriptors
//! - [`Dependency`] - one value slot: named parameter, static value, null,
//!   nested bean or polymorphic [`MetaBean`]
//! - [`Entity`] - a top-level binding slot (an action parameter)
//! - [`ActionMapping`] - the ordered parameters of one action
//!
//! ## Assembly
//!
//! [`MappingGraphBuilder`] collects classes, beans and actions and validates
//! them together; every problem is reported at once:
//!
//! ```rust
//! use brutos::mapping::{Bean, ClassDef, Dependency, MappingGraph};
//! use brutos::types::TextType;
//! use std::sync::Arc;
//!
//! let graph = MappingGraph::builder()
//!     .class(ClassDef::record("Person"))
//!     .bean(Bean::new("person", "Person")
//!         .property("name", Dependency::param("name", Arc::new(TextType))))
//!     .build()
//!     .unwrap();
//! assert!(graph.bean("person").is_some());
//! ```
//!
//! Mapping documents (YAML or JSON) are turned into graphs by [`load`].

mod build;
mod class;
pub mod load;
mod types;

pub use crate::action::ActionMapping;
pub use build::MappingGraphBuilder;
pub use class::{Capability, ClassDef, ConstructorFn, FactoryFn, FactoryMethod, SetterFn};
pub use types::{
    Bean, BeanKind, ConstructorBean, Dependency, DependencySource, Entity, EntitySource, Invoker,
    MetaBean, MetaKey, Property,
};

use crate::validator::{format_issues, ValidationIssue};
use std::collections::BTreeMap;
use std::fmt;

/// Immutable, validated mapping metadata.
#[derive(Debug, Default)]
pub struct MappingGraph {
    classes: BTreeMap<String, ClassDef>,
    beans: BTreeMap<String, Bean>,
    actions: BTreeMap<String, ActionMapping>,
}

impl MappingGraph {
    #[must_use]
    pub fn builder() -> MappingGraphBuilder {
        MappingGraphBuilder::new()
    }

    #[must_use]
    pub fn bean(&self, name: &str) -> Option<&Bean> {
        self.beans.get(name)
    }

    #[must_use]
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    #[must_use]
    pub fn action(&self, name: &str) -> Option<&ActionMapping> {
        self.actions.get(name)
    }

    /// Beans ordered by name.
    pub fn beans(&self) -> impl Iterator<Item = &Bean> {
        self.beans.values()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.values()
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionMapping> {
        self.actions.values()
    }
}

/// Graph assembly failure.
#[derive(Debug, Clone)]
pub enum MappingError {
    Invalid(Vec<ValidationIssue>),
}

impl MappingError {
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            MappingError::Invalid(issues) => issues,
        }
    }
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::Invalid(issues) => write!(f, "{}", format_issues(issues).trim_end()),
        }
    }
}

impl std::error::Error for MappingError {}
