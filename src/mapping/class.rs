use crate::instance::{Content, Instance, Object};
use anyhow::{bail, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Constructor closure: receives the decoded constructor arguments in order.
pub type ConstructorFn = Arc<dyn Fn(Vec<Instance>) -> Result<Object> + Send + Sync>;

/// Factory closure: receives the decoded factory bean (for instance
/// factories) and the decoded arguments.
pub type FactoryFn = Arc<dyn Fn(Option<&Instance>, Vec<Instance>) -> Result<Object> + Send + Sync>;

/// Property assignment closure.
pub type SetterFn = Arc<dyn Fn(&mut Object, &str, Instance) -> Result<()> + Send + Sync>;

/// Container capability of the objects a class builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    #[default]
    Record,
    List,
    Map,
}

impl Capability {
    #[must_use]
    pub fn empty_object(self, class: &str) -> Object {
        match self {
            Capability::Record => Object::record(class),
            Capability::List => Object::list(class),
            Capability::Map => Object::map(class),
        }
    }

    #[must_use]
    pub fn of(object: &Object) -> Self {
        match object.content() {
            Content::Record => Capability::Record,
            Content::Sequence(_) => Capability::List,
            Content::Entries(_) => Capability::Map,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Record => write!(f, "record"),
            Capability::List => write!(f, "list"),
            Capability::Map => write!(f, "map"),
        }
    }
}

#[derive(Clone)]
struct Constructor {
    arity: usize,
    invoke: ConstructorFn,
}

/// A named factory method of a class.
#[derive(Clone)]
pub struct FactoryMethod {
    name: String,
    arity: usize,
    invoke: FactoryFn,
}

impl FactoryMethod {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn invoke(&self, target: Option<&Instance>, args: Vec<Instance>) -> Result<Object> {
        if args.len() != self.arity {
            bail!(
                "factory method {} expects {} argument(s), got {}",
                self.name,
                self.arity,
                args.len()
            );
        }
        (self.invoke)(target, args)
    }
}

/// What the decoder knows about a class: how to build and populate it.
///
/// The built-in classes ([`ClassDef::record`], [`ClassDef::list`],
/// [`ClassDef::map`]) construct empty objects with a no-argument constructor
/// and store properties in the object's property table. Custom behavior is
/// plugged in with closures:
///
/// ```rust
/// use brutos::instance::{Instance, Object};
/// use brutos::mapping::ClassDef;
///
/// let point = ClassDef::record("Point").constructor(2, |args| {
///     let mut p = Object::record("Point");
///     p.set_property("x", args[0].clone());
///     p.set_property("y", args[1].clone());
///     Ok(p)
/// });
/// assert_eq!(point.constructor_arity(), Some(2));
/// ```
#[derive(Clone)]
pub struct ClassDef {
    name: String,
    capability: Capability,
    constructor: Option<Constructor>,
    factories: BTreeMap<String, FactoryMethod>,
    setter: Option<SetterFn>,
}

impl ClassDef {
    fn with_capability(name: impl Into<String>, capability: Capability) -> Self {
        let name = name.into();
        let class = name.clone();
        Self {
            name,
            capability,
            constructor: Some(Constructor {
                arity: 0,
                invoke: Arc::new(move |_: Vec<Instance>| -> Result<Object> {
                    Ok(capability.empty_object(&class))
                }),
            }),
            factories: BTreeMap::new(),
            setter: None,
        }
    }

    /// A plain class with a no-argument constructor.
    pub fn record(name: impl Into<String>) -> Self {
        Self::with_capability(name, Capability::Record)
    }

    /// A list-like class with a no-argument constructor.
    pub fn list(name: impl Into<String>) -> Self {
        Self::with_capability(name, Capability::List)
    }

    /// A map-like class with a no-argument constructor.
    pub fn map(name: impl Into<String>) -> Self {
        Self::with_capability(name, Capability::Map)
    }

    /// Replace the constructor with one that stores its arguments as the
    /// named properties.
    #[must_use]
    pub fn with_constructor<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params: Vec<String> = params.into_iter().map(Into::into).collect();
        let arity = params.len();
        let capability = self.capability;
        let class = self.name.clone();
        self.constructor = Some(Constructor {
            arity,
            invoke: Arc::new(move |args: Vec<Instance>| -> Result<Object> {
                let mut object = capability.empty_object(&class);
                for (param, value) in params.iter().zip(args) {
                    object.set_property(param.as_str(), value);
                }
                Ok(object)
            }),
        });
        self
    }

    /// Replace the constructor with a closure taking `arity` arguments.
    #[must_use]
    pub fn constructor<F>(mut self, arity: usize, f: F) -> Self
    where
        F: Fn(Vec<Instance>) -> Result<Object> + Send + Sync + 'static,
    {
        self.constructor = Some(Constructor {
            arity,
            invoke: Arc::new(f),
        });
        self
    }

    /// Remove the constructor; such classes are only built by factories.
    #[must_use]
    pub fn without_constructor(mut self) -> Self {
        self.constructor = None;
        self
    }

    /// Register a factory method taking `arity` arguments.
    #[must_use]
    pub fn factory<F>(mut self, method: impl Into<String>, arity: usize, f: F) -> Self
    where
        F: Fn(Option<&Instance>, Vec<Instance>) -> Result<Object> + Send + Sync + 'static,
    {
        let name = method.into();
        self.factories.insert(
            name.clone(),
            FactoryMethod {
                name,
                arity,
                invoke: Arc::new(f),
            },
        );
        self
    }

    /// Replace property assignment.
    #[must_use]
    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Object, &str, Instance) -> Result<()> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn capability(&self) -> Capability {
        self.capability
    }

    #[must_use]
    pub fn constructor_arity(&self) -> Option<usize> {
        self.constructor.as_ref().map(|c| c.arity)
    }

    #[must_use]
    pub fn factory_method(&self, method: &str) -> Option<&FactoryMethod> {
        self.factories.get(method)
    }

    pub fn factory_methods(&self) -> impl Iterator<Item = &FactoryMethod> {
        self.factories.values()
    }

    /// Invoke the constructor.
    pub fn construct(&self, args: Vec<Instance>) -> Result<Object> {
        let Some(constructor) = &self.constructor else {
            bail!("class {} has no constructor", self.name);
        };
        if args.len() != constructor.arity {
            bail!(
                "constructor of {} expects {} argument(s), got {}",
                self.name,
                constructor.arity,
                args.len()
            );
        }
        (constructor.invoke)(args)
    }

    /// Assign one property.
    pub fn set(&self, object: &mut Object, property: &str, value: Instance) -> Result<()> {
        match &self.setter {
            Some(setter) => setter(object, property, value),
            None => {
                object.set_property(property, value);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("capability", &self.capability)
            .field("constructor_arity", &self.constructor_arity())
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("custom_setter", &self.setter.is_some())
            .finish()
    }
}
