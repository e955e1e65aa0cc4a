//! # Mapping Documents
//!
//! A mapping document declares classes, beans and actions in YAML or JSON:
//!
//! ```yaml
//! classes:
//!   - name: Person
//!   - name: Tags
//!     kind: list
//!   - name: Money
//!     factory_only: true
//!     factories:
//!       - name: of
//!         params: [amount, currency]
//! beans:
//!   - name: person
//!     class: Person
//!     hierarchy: true
//!     args:
//!       - { param: name, type: string }
//!     properties:
//!       - { name: age, param: age, type: int }
//!       - { name: tags, mapping: tags, param: tags }
//!   - name: tags
//!     class: Tags
//!     element: { type: string }
//! actions:
//!   - name: save
//!     parameters:
//!       - { mapping: person }
//! ```
//!
//! Slots name at most one source: `value` (a constant), `nullable: true`,
//! `mapping` (a bean), `meta` (a discriminator table) or, when none is
//! given, the payload parameter `param`. Types use the names accepted by
//! [`TypeRegistry`]; `string` is the default for value slots and `any` for
//! nested beans.
//!
//! Document classes are built-in containers: constructor arguments and
//! factory arguments are stored as properties of the built object. A factory
//! invoked on a peer bean starts from a copy of that bean's properties.
//!
//! Documents only describe structure; the graph goes through the same
//! [`MappingGraphBuilder`] validation as hand-built graphs.

use super::{
    Bean, Capability, ClassDef, Dependency, Entity, MappingError, MappingGraph,
    MappingGraphBuilder, MetaBean, MetaKey, Property,
};
use crate::action::ActionMapping;
use crate::instance::{Instance, Object};
use crate::scope::ScopeType;
use crate::types::{Raw, TypeRef, TypeRegistry};
use crate::validator::{IssueKind, ValidationIssue};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_VALUE_TYPE: &str = "string";
const DEFAULT_BEAN_TYPE: &str = "any";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingDocument {
    #[serde(default)]
    pub classes: Vec<ClassDoc>,
    #[serde(default)]
    pub beans: Vec<BeanDoc>,
    #[serde(default)]
    pub actions: Vec<ActionDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDoc {
    pub name: String,
    #[serde(default)]
    pub kind: Capability,
    /// Constructor parameters, stored as properties in order.
    #[serde(default)]
    pub constructor: Vec<String>,
    /// Only factories build objects of this class.
    #[serde(default)]
    pub factory_only: bool,
    #[serde(default)]
    pub factories: Vec<FactoryDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactoryDoc {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    /// Class of the built object; defaults to the declaring class.
    #[serde(default)]
    pub returns: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeanDoc {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub hierarchy: bool,
    #[serde(default)]
    pub args: Vec<DependencyDoc>,
    #[serde(default)]
    pub factory: Option<FactoryRefDoc>,
    #[serde(default)]
    pub properties: Vec<PropertyDoc>,
    /// Element descriptor; makes the bean a collection (or a map with `key`).
    #[serde(default)]
    pub element: Option<DependencyDoc>,
    #[serde(default)]
    pub key: Option<DependencyDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactoryRefDoc {
    pub method: String,
    /// Peer bean the method is invoked on.
    #[serde(default)]
    pub bean: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDoc {
    pub name: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(flatten)]
    pub dependency: DependencyDoc,
}

/// One value slot. Also used for action parameters, where `param` is the
/// parameter name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependencyDoc {
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub scope: ScopeType,
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub mapping: Option<String>,
    #[serde(default)]
    pub meta: Option<MetaDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaDoc {
    /// Parameter holding the discriminator.
    pub param: String,
    #[serde(default)]
    pub scope: ScopeType,
    #[serde(default, rename = "type")]
    pub ty: Option<String>,
    /// Discriminator value (as text, converted with `type`) to slot.
    pub values: BTreeMap<String, DependencyDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDoc {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<DependencyDoc>,
}

impl MappingDocument {
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("invalid YAML mapping document")
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("invalid JSON mapping document")
    }

    /// Translate the document into builder input. Unknown type names and
    /// malformed slots are collected and reported together.
    pub fn into_builder(self, types: &TypeRegistry) -> Result<MappingGraphBuilder, MappingError> {
        let mut cx = Translation {
            types,
            issues: Vec::new(),
        };
        let mut builder = MappingGraphBuilder::new();

        let capabilities: HashMap<String, Capability> = self
            .classes
            .iter()
            .map(|c| (c.name.clone(), c.kind))
            .collect();
        for class in self.classes {
            if let Some(def) = cx.class(class, &capabilities) {
                builder.add_class(def);
            }
        }
        for bean in self.beans {
            if let Some(bean) = cx.bean(bean) {
                builder.add_bean(bean);
            }
        }
        for action in self.actions {
            let location = format!("action:{}", action.name);
            let mut mapping = ActionMapping::new(action.name);
            for (i, doc) in action.parameters.into_iter().enumerate() {
                if let Some(entity) = cx.entity(&format!("{location}.parameter[{i}]"), doc) {
                    mapping = mapping.parameter(entity);
                }
            }
            builder.add_action(mapping);
        }

        if cx.issues.is_empty() {
            Ok(builder)
        } else {
            Err(MappingError::Invalid(cx.issues))
        }
    }

    pub fn into_graph(self, types: &TypeRegistry) -> Result<MappingGraph, MappingError> {
        self.into_builder(types)?.build()
    }
}

/// Load and validate a mapping file; `.yaml`/`.yml` files are read as YAML,
/// anything else as JSON.
pub fn load_mapping(path: impl AsRef<Path>) -> Result<MappingGraph> {
    load_mapping_with(path, TypeRegistry::builtin())
}

pub fn load_mapping_with(path: impl AsRef<Path>, types: &TypeRegistry) -> Result<MappingGraph> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read mapping document {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    let document = if is_yaml {
        MappingDocument::from_yaml(&content)?
    } else {
        MappingDocument::from_json(&content)?
    };
    debug!(
        path = %path.display(),
        classes = document.classes.len(),
        beans = document.beans.len(),
        actions = document.actions.len(),
        "mapping document parsed"
    );
    let graph = document
        .into_graph(types)
        .with_context(|| format!("invalid mapping document {}", path.display()))?;
    info!(path = %path.display(), "mapping graph loaded");
    Ok(graph)
}

struct Translation<'a> {
    types: &'a TypeRegistry,
    issues: Vec<ValidationIssue>,
}

impl Translation<'_> {
    fn issue(&mut self, location: &str, kind: IssueKind, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(location, kind, message));
    }

    fn resolve(&mut self, location: &str, name: Option<&str>, default: &str) -> Option<TypeRef> {
        let name = name.unwrap_or(default);
        let ty = self.types.resolve(name);
        if ty.is_none() {
            self.issue(location, IssueKind::UnknownType, format!("unknown type {name:?}"));
        }
        ty
    }

    fn class(&mut self, doc: ClassDoc, capabilities: &HashMap<String, Capability>) -> Option<ClassDef> {
        let location = format!("class:{}", doc.name);
        let mut def = match doc.kind {
            Capability::Record => ClassDef::record(&doc.name),
            Capability::List => ClassDef::list(&doc.name),
            Capability::Map => ClassDef::map(&doc.name),
        };
        def = if doc.factory_only {
            def.without_constructor()
        } else {
            def.with_constructor(doc.constructor)
        };
        let mut valid = true;
        for factory in doc.factories {
            let returns = factory.returns.unwrap_or_else(|| doc.name.clone());
            let Some(&capability) = capabilities.get(&returns) else {
                self.issue(
                    &format!("{location}.factory[{}]", factory.name),
                    IssueKind::UnknownClass,
                    format!("factory returns undeclared class {returns}"),
                );
                valid = false;
                continue;
            };
            let params = factory.params;
            let arity = params.len();
            def = def.factory(
                factory.name,
                arity,
                move |target: Option<&Instance>, args: Vec<Instance>| -> Result<Object> {
                    let mut object = capability.empty_object(&returns);
                    if let Some(Instance::Object(source)) = target {
                        for (name, value) in source.properties() {
                            object.set_property(name, value.clone());
                        }
                    }
                    for (param, value) in params.iter().zip(args) {
                        object.set_property(param.as_str(), value);
                    }
                    Ok(object)
                },
            );
        }
        valid.then_some(def)
    }

    fn bean(&mut self, doc: BeanDoc) -> Option<Bean> {
        let location = format!("bean:{}", doc.name);
        let mut valid = true;

        let mut bean = match (doc.key, doc.element) {
            (None, None) => Bean::new(&doc.name, &doc.class),
            (None, Some(element)) => {
                let element = self.dependency(&format!("{location}.element"), element);
                match element {
                    Some(element) => Bean::collection(&doc.name, &doc.class, element),
                    None => return None,
                }
            }
            (Some(key), Some(element)) => {
                let key = self.dependency(&format!("{location}.key"), key);
                let element = self.dependency(&format!("{location}.element"), element);
                match (key, element) {
                    (Some(key), Some(element)) => Bean::map(&doc.name, &doc.class, key, element),
                    _ => return None,
                }
            }
            (Some(_), None) => {
                self.issue(&location, IssueKind::InvalidDocument, "key declared without element");
                return None;
            }
        };
        bean = bean.hierarchy(doc.hierarchy);

        for (i, arg) in doc.args.into_iter().enumerate() {
            match self.dependency(&format!("{location}.arg[{i}]"), arg) {
                Some(dependency) => bean = bean.arg(dependency),
                None => valid = false,
            }
        }
        if let Some(factory) = doc.factory {
            bean = match factory.bean {
                Some(peer) => bean.factory_bean(factory.method, peer),
                None => bean.factory(factory.method),
            };
        }
        for property in doc.properties {
            let at = format!("{location}.property[{}]", property.name);
            match self.dependency(&at, property.dependency) {
                Some(dependency) if property.read_only => {
                    bean = bean.with_property(Property::read_only(property.name, dependency));
                }
                Some(dependency) => bean = bean.property(property.name, dependency),
                None => valid = false,
            }
        }
        valid.then_some(bean)
    }

    /// Exactly one source may be named.
    fn check_sources(&mut self, location: &str, doc: &DependencyDoc) -> bool {
        let sources = [
            doc.value.is_some(),
            doc.nullable,
            doc.mapping.is_some(),
            doc.meta.is_some(),
        ];
        if sources.iter().filter(|s| **s).count() > 1 {
            self.issue(
                location,
                IssueKind::InvalidDocument,
                "value, nullable, mapping and meta are mutually exclusive",
            );
            return false;
        }
        true
    }

    fn dependency(&mut self, location: &str, doc: DependencyDoc) -> Option<Dependency> {
        if !self.check_sources(location, &doc) {
            return None;
        }
        let default = if doc.mapping.is_some() || doc.meta.is_some() {
            DEFAULT_BEAN_TYPE
        } else {
            DEFAULT_VALUE_TYPE
        };
        let ty = self.resolve(location, doc.ty.as_deref(), default)?;

        let dependency = if let Some(meta) = doc.meta {
            let meta = self.meta(location, meta)?;
            let mut dependency = Dependency::meta(meta).with_type(ty);
            dependency.parameter = doc.param;
            dependency
        } else if let Some(bean) = doc.mapping {
            Dependency::mapping(bean, doc.param.as_deref()).with_type(ty)
        } else {
            let mut dependency = match doc.value {
                Some(value) => Dependency::fixed(value, ty),
                None if doc.nullable => Dependency::null(ty),
                None => Dependency::value(ty),
            };
            dependency.parameter = doc.param;
            dependency
        };
        Some(dependency.in_scope(doc.scope))
    }

    fn entity(&mut self, location: &str, doc: DependencyDoc) -> Option<Entity> {
        if !self.check_sources(location, &doc) {
            return None;
        }
        let default = if doc.mapping.is_some() || doc.meta.is_some() {
            DEFAULT_BEAN_TYPE
        } else {
            DEFAULT_VALUE_TYPE
        };
        let ty = self.resolve(location, doc.ty.as_deref(), default)?;

        let mut entity = if let Some(meta) = doc.meta {
            Entity::meta(self.meta(location, meta)?)
        } else if let Some(bean) = doc.mapping {
            Entity::mapping(bean)
        } else if let Some(value) = doc.value {
            Entity::fixed(value, Arc::clone(&ty))
        } else if doc.nullable {
            Entity::null(Arc::clone(&ty))
        } else {
            Entity::payload(Arc::clone(&ty))
        };
        entity = entity.with_type(ty).in_scope(doc.scope);
        entity.name = doc.param;
        Some(entity)
    }

    fn meta(&mut self, location: &str, doc: MetaDoc) -> Option<MetaBean> {
        let location = format!("{location}.meta[{}]", doc.param);
        let ty = self.resolve(&location, doc.ty.as_deref(), DEFAULT_VALUE_TYPE)?;
        let mut meta = MetaBean::new(doc.param, Arc::clone(&ty)).in_scope(doc.scope);
        let mut valid = true;
        for (raw_key, slot) in doc.values {
            let at = format!("{location}.when[{raw_key}]");
            let key = ty
                .convert(Raw::Data(&Value::String(raw_key.clone())))
                .ok()
                .and_then(|converted| MetaKey::from_instance(&converted));
            let Some(key) = key else {
                self.issue(
                    &at,
                    IssueKind::InvalidDocument,
                    format!("{raw_key:?} is not a usable {} discriminator", ty.name()),
                );
                valid = false;
                continue;
            };
            match self.dependency(&at, slot) {
                Some(dependency) => meta = meta.when(key, dependency),
                None => valid = false,
            }
        }
        valid.then_some(meta)
    }
}
