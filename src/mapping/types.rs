use crate::instance::Instance;
use crate::scope::ScopeType;
use crate::types::{AnyType, TypeRef};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Where a dependency takes its raw value from.
#[derive(Debug, Clone)]
pub enum DependencySource {
    /// Looked up by parameter name in the payload or the declared scope.
    /// Without a parameter name the current payload itself is the raw value.
    Param,
    /// A configured constant.
    Static(Value),
    /// Always null.
    Nullable,
    /// The result of decoding the named bean.
    Mapping(String),
    /// Chosen by a discriminator value.
    Meta(MetaBean),
}

/// One value slot: a property, a constructor argument, or the element or key
/// descriptor of a container bean.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub parameter: Option<String>,
    pub scope: ScopeType,
    pub source: DependencySource,
    pub ty: TypeRef,
}

impl Dependency {
    fn with_source(parameter: Option<String>, source: DependencySource, ty: TypeRef) -> Self {
        Self {
            parameter,
            scope: ScopeType::Param,
            source,
            ty,
        }
    }

    /// A value read from parameter `name`.
    pub fn param(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::with_source(Some(name.into()), DependencySource::Param, ty)
    }

    /// The current payload converted to `ty`; the usual element descriptor
    /// of scalar collections.
    #[must_use]
    pub fn value(ty: TypeRef) -> Self {
        Self::with_source(None, DependencySource::Param, ty)
    }

    /// A constant.
    #[must_use]
    pub fn fixed(value: Value, ty: TypeRef) -> Self {
        Self::with_source(None, DependencySource::Static(value), ty)
    }

    /// An explicitly null slot.
    #[must_use]
    pub fn null(ty: TypeRef) -> Self {
        Self::with_source(None, DependencySource::Nullable, ty)
    }

    /// A nested bean. With a parameter name (and a hierarchical parent) the
    /// bean decodes the sub-object under that name, otherwise the payload
    /// the parent sees.
    pub fn mapping(bean: impl Into<String>, parameter: Option<&str>) -> Self {
        Self::with_source(
            parameter.map(str::to_string),
            DependencySource::Mapping(bean.into()),
            Arc::new(AnyType),
        )
    }

    /// A polymorphic slot.
    #[must_use]
    pub fn meta(meta: MetaBean) -> Self {
        Self::with_source(None, DependencySource::Meta(meta), Arc::new(AnyType))
    }

    #[must_use]
    pub fn in_scope(mut self, scope: ScopeType) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_type(mut self, ty: TypeRef) -> Self {
        self.ty = ty;
        self
    }

    #[must_use]
    pub fn named(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        matches!(self.source, DependencySource::Nullable)
    }

    /// Short description used by `check` output and logs.
    #[must_use]
    pub fn describe(&self) -> String {
        let name = self.parameter.as_deref().unwrap_or("<payload>");
        match &self.source {
            DependencySource::Param if self.scope == ScopeType::Param => {
                format!("{name}: {}", self.ty.name())
            }
            DependencySource::Param => format!("{}:{name}: {}", self.scope, self.ty.name()),
            DependencySource::Static(v) => format!("{name} = {v}"),
            DependencySource::Nullable => format!("{name} = null"),
            DependencySource::Mapping(bean) => format!("{name} -> {bean}"),
            DependencySource::Meta(meta) => format!("{name} -> meta({})", meta.name),
        }
    }
}

/// A property descriptor.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub dependency: Dependency,
    /// Read-only properties are described but never assigned.
    pub settable: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, dependency: Dependency) -> Self {
        Self {
            name: name.into(),
            dependency,
            settable: true,
        }
    }

    pub fn read_only(name: impl Into<String>, dependency: Dependency) -> Self {
        Self {
            settable: false,
            ..Self::new(name, dependency)
        }
    }
}

/// How a bean's object comes into existence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Invoker {
    /// The class constructor.
    #[default]
    Constructor,
    /// A factory method: static on the bean's class, or on the object
    /// decoded from a peer bean.
    Factory {
        method: String,
        bean: Option<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ConstructorBean {
    /// Ordered arguments.
    pub args: Vec<Dependency>,
    pub invoker: Invoker,
}

impl ConstructorBean {
    #[must_use]
    pub fn is_factory(&self) -> bool {
        matches!(self.invoker, Invoker::Factory { .. })
    }
}

/// Plain, collection or map bean.
#[derive(Debug, Clone, Default)]
pub enum BeanKind {
    #[default]
    Plain,
    Collection {
        element: Dependency,
    },
    Map {
        key: Dependency,
        element: Dependency,
    },
}

/// How to build and populate one object.
///
/// ```rust
/// use brutos::mapping::{Bean, Dependency};
/// use brutos::types::{IntegerType, TextType};
/// use std::sync::Arc;
///
/// let person = Bean::new("person", "Person")
///     .arg(Dependency::param("name", Arc::new(TextType)))
///     .property("age", Dependency::param("age", Arc::new(IntegerType::default())));
/// assert_eq!(person.constructor.args.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Bean {
    pub name: String,
    pub class: String,
    /// Nested mapping dependencies read the sub-object under their own
    /// parameter name only when this is set.
    pub hierarchy: bool,
    pub constructor: ConstructorBean,
    pub properties: Vec<Property>,
    pub kind: BeanKind,
}

impl Bean {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            hierarchy: false,
            constructor: ConstructorBean::default(),
            properties: Vec::new(),
            kind: BeanKind::Plain,
        }
    }

    /// A list-like bean decoding each element with `element`.
    pub fn collection(name: impl Into<String>, class: impl Into<String>, element: Dependency) -> Self {
        Self {
            kind: BeanKind::Collection { element },
            ..Self::new(name, class)
        }
    }

    /// A map-like bean decoding entries with `key` and `element`.
    pub fn map(
        name: impl Into<String>,
        class: impl Into<String>,
        key: Dependency,
        element: Dependency,
    ) -> Self {
        Self {
            kind: BeanKind::Map { key, element },
            ..Self::new(name, class)
        }
    }

    #[must_use]
    pub fn hierarchy(mut self, hierarchy: bool) -> Self {
        self.hierarchy = hierarchy;
        self
    }

    #[must_use]
    pub fn arg(mut self, dependency: Dependency) -> Self {
        self.constructor.args.push(dependency);
        self
    }

    /// Build through a static factory method of the bean's class.
    #[must_use]
    pub fn factory(mut self, method: impl Into<String>) -> Self {
        self.constructor.invoker = Invoker::Factory {
            method: method.into(),
            bean: None,
        };
        self
    }

    /// Build through a factory method of the object decoded from `bean`.
    #[must_use]
    pub fn factory_bean(mut self, method: impl Into<String>, bean: impl Into<String>) -> Self {
        self.constructor.invoker = Invoker::Factory {
            method: method.into(),
            bean: Some(bean.into()),
        };
        self
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>, dependency: Dependency) -> Self {
        self.properties.push(Property::new(name, dependency));
        self
    }

    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn is_container(&self) -> bool {
        !matches!(self.kind, BeanKind::Plain)
    }

    /// `true` when the mapping itself carries structure: constructor
    /// arguments, a factory, properties, or an element descriptor.
    #[must_use]
    pub fn declares_structure(&self) -> bool {
        !self.constructor.args.is_empty()
            || self.constructor.is_factory()
            || !self.properties.is_empty()
            || self.is_container()
    }

    /// Every dependency of the bean with a label, in declaration order.
    pub fn dependencies(&self) -> impl Iterator<Item = (String, &Dependency)> {
        let args = self
            .constructor
            .args
            .iter()
            .enumerate()
            .map(|(i, d)| (format!("arg[{i}]"), d));
        let props = self
            .properties
            .iter()
            .map(|p| (format!("property[{}]", p.name), &p.dependency));
        let container: Vec<(String, &Dependency)> = match &self.kind {
            BeanKind::Plain => Vec::new(),
            BeanKind::Collection { element } => vec![("element".to_string(), element)],
            BeanKind::Map { key, element } => vec![
                ("key".to_string(), key),
                ("element".to_string(), element),
            ],
        };
        args.chain(props).chain(container)
    }
}

/// Hashable discriminator value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetaKey {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl MetaKey {
    /// Key for a converted discriminator; floats, dates and structured
    /// values have none.
    #[must_use]
    pub fn from_instance(value: &Instance) -> Option<Self> {
        match value {
            Instance::Bool(b) => Some(MetaKey::Bool(*b)),
            Instance::Int(i) => Some(MetaKey::Int(*i)),
            Instance::Text(s) => Some(MetaKey::Text(s.clone())),
            Instance::Enum(c) => Some(MetaKey::Text(c.name.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaKey::Bool(b) => write!(f, "{b}"),
            MetaKey::Int(i) => write!(f, "{i}"),
            MetaKey::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for MetaKey {
    fn from(s: &str) -> Self {
        MetaKey::Text(s.to_string())
    }
}

impl From<String> for MetaKey {
    fn from(s: String) -> Self {
        MetaKey::Text(s)
    }
}

impl From<i64> for MetaKey {
    fn from(i: i64) -> Self {
        MetaKey::Int(i)
    }
}

impl From<bool> for MetaKey {
    fn from(b: bool) -> Self {
        MetaKey::Bool(b)
    }
}

/// Polymorphic dispatch table keyed by a discriminator.
#[derive(Debug, Clone)]
pub struct MetaBean {
    /// Parameter holding the discriminator.
    pub name: String,
    pub scope: ScopeType,
    /// Type the discriminator converts to before lookup.
    pub ty: TypeRef,
    values: HashMap<MetaKey, Dependency>,
}

impl MetaBean {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            scope: ScopeType::Param,
            ty,
            values: HashMap::new(),
        }
    }

    #[must_use]
    pub fn in_scope(mut self, scope: ScopeType) -> Self {
        self.scope = scope;
        self
    }

    /// Map a discriminator value to a dependency.
    #[must_use]
    pub fn when(mut self, key: impl Into<MetaKey>, dependency: Dependency) -> Self {
        self.values.insert(key.into(), dependency);
        self
    }

    #[must_use]
    pub fn select(&self, discriminator: &Instance) -> Option<&Dependency> {
        MetaKey::from_instance(discriminator).and_then(|k| self.values.get(&k))
    }

    pub fn values(&self) -> impl Iterator<Item = (&MetaKey, &Dependency)> {
        self.values.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Source kind of a top-level binding slot.
#[derive(Debug, Clone)]
pub enum EntitySource {
    Nullable,
    Meta(MetaBean),
    Mapping(String),
    Static(Value),
    Param,
}

/// A top-level binding slot, typically one action parameter.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: Option<String>,
    pub scope: ScopeType,
    pub ty: TypeRef,
    pub source: EntitySource,
}

impl Entity {
    fn with_source(name: Option<String>, source: EntitySource, ty: TypeRef) -> Self {
        Self {
            name,
            scope: ScopeType::Param,
            ty,
            source,
        }
    }

    /// A value read from parameter `name`.
    pub fn param(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::with_source(Some(name.into()), EntitySource::Param, ty)
    }

    /// The whole payload converted to `ty`.
    #[must_use]
    pub fn payload(ty: TypeRef) -> Self {
        Self::with_source(None, EntitySource::Param, ty)
    }

    /// The named bean decoded from the whole payload; add a name with
    /// [`Entity::named`] to decode a sub-object instead.
    pub fn mapping(bean: impl Into<String>) -> Self {
        Self::with_source(None, EntitySource::Mapping(bean.into()), Arc::new(AnyType))
    }

    #[must_use]
    pub fn meta(meta: MetaBean) -> Self {
        Self::with_source(None, EntitySource::Meta(meta), Arc::new(AnyType))
    }

    #[must_use]
    pub fn fixed(value: Value, ty: TypeRef) -> Self {
        Self::with_source(None, EntitySource::Static(value), ty)
    }

    #[must_use]
    pub fn null(ty: TypeRef) -> Self {
        Self::with_source(None, EntitySource::Nullable, ty)
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn in_scope(mut self, scope: ScopeType) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_type(mut self, ty: TypeRef) -> Self {
        self.ty = ty;
        self
    }

    /// Label used in logs and errors.
    #[must_use]
    pub fn label(&self) -> String {
        match (&self.name, &self.source) {
            (Some(name), _) => name.clone(),
            (None, EntitySource::Mapping(bean)) => bean.clone(),
            (None, EntitySource::Meta(meta)) => format!("meta({})", meta.name),
            (None, _) => "<payload>".to_string(),
        }
    }
}
