//! Recursive evaluation of one decode call.

use super::error::{expecting, DecodeError};
use super::presence::Presence;
use crate::instance::{Instance, Object};
use crate::mapping::{
    Bean, BeanKind, Dependency, DependencySource, Entity, EntitySource, Invoker, MappingGraph,
    MetaBean,
};
use crate::scope::{ScopeType, Scopes};
use crate::types::{Raw, TypeRef};
use serde_json::{Map, Value};
use std::borrow::Cow;
use tracing::trace;

const OBJECT_TEMPLATE: &str = r#"{ "<property>": <object | value>, ... }"#;
const COLLECTION_TEMPLATE: &str = "[ <object | value>, ... ]";
const MAP_TEMPLATE: &str = r#"{ "<key>": <object | value>, ... }"#;

fn collection_object_template(element: &str) -> String {
    format!(r#"{{ "<property>": <object | value>, ..., "{element}": [ <object | value>, ... ] }}"#)
}

fn map_object_template(key: &str, element: &str) -> String {
    format!(
        r#"{{ "<property>": <object | value>, ..., "{element}": [ {{ "{key}": <object | value>, "{element}": <object | value> }}, ... ] }}"#
    )
}

/// How a dependency finds its raw value in the payload it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// By the dependency's parameter name (or scope).
    ByName,
    /// The payload is the raw value; used for container items.
    Itself,
}

pub(crate) struct Walk<'a> {
    graph: &'a MappingGraph,
    scopes: &'a Scopes,
    depth: usize,
    max_depth: usize,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(graph: &'a MappingGraph, scopes: &'a Scopes, max_depth: usize) -> Self {
        Self {
            graph,
            scopes,
            depth: 0,
            max_depth,
        }
    }

    pub(crate) fn entity(&mut self, entity: &Entity, data: &Value) -> Result<Instance, DecodeError> {
        match &entity.source {
            EntitySource::Nullable => Ok(Instance::Null),
            EntitySource::Meta(meta) => {
                let Some(target) = self.select(meta, data)? else {
                    return Ok(Instance::Null);
                };
                let value = self.dependency(None, target, data, Lookup::ByName)?;
                convert(&entity.ty, Raw::Built(value))
            }
            EntitySource::Mapping(bean) => {
                let sub = match &entity.name {
                    Some(name) => match member(data, name)? {
                        Some(sub) => sub,
                        None => return Ok(Instance::Null),
                    },
                    None => data,
                };
                let bean = self.bean_named(bean)?;
                let value = self.bean(bean, sub)?;
                convert(&entity.ty, Raw::Built(value))
            }
            EntitySource::Static(value) => convert(&entity.ty, Raw::Data(value)),
            EntitySource::Param => {
                let raw = self.lookup(
                    entity.scope,
                    entity.name.as_deref(),
                    data,
                    entity.ty.kind().is_sequence(),
                )?;
                convert(&entity.ty, Raw::from(raw.as_deref()))
            }
        }
    }

    fn dependency(
        &mut self,
        parent: Option<&Bean>,
        dependency: &Dependency,
        data: &Value,
        lookup: Lookup,
    ) -> Result<Instance, DecodeError> {
        match &dependency.source {
            DependencySource::Mapping(bean) => {
                let sub = match lookup {
                    Lookup::Itself => data,
                    Lookup::ByName => {
                        let object = data
                            .as_object()
                            .ok_or_else(|| DecodeError::shape("expected a object"))?;
                        let hierarchy = parent.is_some_and(|p| p.hierarchy);
                        match &dependency.parameter {
                            Some(name) if hierarchy => match object.get(name) {
                                None | Some(Value::Null) => return Ok(Instance::Null),
                                Some(sub) => sub,
                            },
                            _ => data,
                        }
                    }
                };
                let bean = self.bean_named(bean)?;
                let value = self.bean(bean, sub)?;
                convert(&dependency.ty, Raw::Built(value))
            }
            DependencySource::Static(value) => convert(&dependency.ty, Raw::Data(value)),
            DependencySource::Nullable => Ok(Instance::Null),
            DependencySource::Param => {
                let raw = match lookup {
                    Lookup::Itself => Some(Cow::Borrowed(data)),
                    Lookup::ByName => self.lookup(
                        dependency.scope,
                        dependency.parameter.as_deref(),
                        data,
                        dependency.ty.kind().is_sequence(),
                    )?,
                };
                convert(&dependency.ty, Raw::from(raw.as_deref()))
            }
            DependencySource::Meta(meta) => match self.select(meta, data)? {
                Some(target) => self.dependency(parent, target, data, lookup),
                None => Ok(Instance::Null),
            },
        }
    }

    /// Resolve the discriminator and pick the mapped dependency; `None` for a
    /// null discriminator.
    fn select<'m>(
        &self,
        meta: &'m MetaBean,
        data: &Value,
    ) -> Result<Option<&'m Dependency>, DecodeError> {
        let raw = self.lookup(meta.scope, Some(meta.name.as_str()), data, false)?;
        let discriminator = convert(&meta.ty, Raw::from(raw.as_deref()))?;
        if discriminator.is_null() {
            return Ok(None);
        }
        trace!(discriminator = %discriminator, meta = %meta.name, "meta bean dispatch");
        meta.select(&discriminator)
            .map(Some)
            .ok_or_else(|| DecodeError::MappingNotFound {
                discriminator: discriminator.to_string(),
            })
    }

    fn lookup<'d>(
        &self,
        scope: ScopeType,
        name: Option<&str>,
        data: &'d Value,
        sequence: bool,
    ) -> Result<Option<Cow<'d, Value>>, DecodeError> {
        if scope == ScopeType::Param {
            return match name {
                None => Ok(Some(Cow::Borrowed(data))),
                Some(name) => data
                    .as_object()
                    .map(|object| object.get(name).map(Cow::Borrowed))
                    .ok_or_else(|| DecodeError::shape("expected a object")),
            };
        }
        let provider = self
            .scopes
            .get(scope)
            .ok_or(DecodeError::ScopeNotFound(scope))?;
        let Some(name) = name else {
            return Ok(None);
        };
        Ok(if sequence {
            provider
                .get_collection(name)
                .map(|items| Cow::Owned(Value::Array(items)))
        } else {
            provider.get(name).map(Cow::Owned)
        })
    }

    fn bean_named(&self, name: &str) -> Result<&'a Bean, DecodeError> {
        self.graph
            .bean(name)
            .ok_or_else(|| DecodeError::BeanNotFound(name.to_string()))
    }

    fn bean(&mut self, bean: &Bean, data: &Value) -> Result<Instance, DecodeError> {
        if self.depth >= self.max_depth {
            return Err(DecodeError::DepthExceeded(self.max_depth));
        }
        self.depth += 1;
        trace!(bean = %bean.name, depth = self.depth, "decoding bean");
        let result = match &bean.kind {
            BeanKind::Plain => expecting(OBJECT_TEMPLATE, self.plain(bean, data)),
            BeanKind::Collection { element } => match &element.parameter {
                Some(items) => expecting(
                    &collection_object_template(items),
                    self.collection_object(bean, element, items, data),
                ),
                None => expecting(
                    COLLECTION_TEMPLATE,
                    self.collection_simple(bean, element, data),
                ),
            },
            BeanKind::Map { key, element } => match &key.parameter {
                Some(key_name) => {
                    let entries = element.parameter.as_deref().unwrap_or(key_name.as_str());
                    expecting(
                        &map_object_template(key_name, entries),
                        self.map_object(bean, key, element, entries, data),
                    )
                }
                None => expecting(MAP_TEMPLATE, self.map_simple(bean, key, element, data)),
            },
        };
        self.depth -= 1;
        result
    }

    fn plain(&mut self, bean: &Bean, data: &Value) -> Result<Instance, DecodeError> {
        Ok(self
            .populate(bean, data)?
            .map_or(Instance::Null, Instance::Object))
    }

    /// Construct the bean's object and assign its properties.
    fn populate(&mut self, bean: &Bean, data: &Value) -> Result<Option<Object>, DecodeError> {
        if !data.is_object() {
            return Err(DecodeError::shape("expected a object"));
        }
        let Some(mut object) = self.instantiate(bean, data)? else {
            return Ok(None);
        };
        let class = self
            .graph
            .class(&bean.class)
            .ok_or_else(|| DecodeError::ClassNotFound(bean.class.clone()))?;
        let mut presence = Presence::new(bean.declares_structure());
        for property in bean.properties.iter().filter(|p| p.settable) {
            let value = self.dependency(Some(bean), &property.dependency, data, Lookup::ByName)?;
            presence.observe(!value.is_null());
            class
                .set(&mut object, &property.name, value)
                .map_err(|cause| DecodeError::Construction {
                    bean: bean.name.clone(),
                    cause: cause.context(format!("cannot set property {}", property.name)),
                })?;
        }
        if !presence.found() {
            trace!(bean = %bean.name, "nothing found, instance suppressed");
        }
        Ok(presence.resolve(object))
    }

    fn collection_object(
        &mut self,
        bean: &Bean,
        element: &Dependency,
        items: &str,
        data: &Value,
    ) -> Result<Instance, DecodeError> {
        let built = self.populate(bean, data)?;
        let Some(Value::Array(raw)) = data.get(items) else {
            return Err(DecodeError::shape("expected a collection"));
        };
        let Some(mut container) = sequence_target(built, !raw.is_empty())? else {
            return Ok(Instance::Null);
        };
        self.fill_sequence(bean, element, raw, &mut container)?;
        Ok(Instance::Object(container))
    }

    fn collection_simple(
        &mut self,
        bean: &Bean,
        element: &Dependency,
        data: &Value,
    ) -> Result<Instance, DecodeError> {
        let Value::Array(raw) = data else {
            return Err(DecodeError::shape("expected a collection"));
        };
        let built = self.populate(bean, &Value::Object(Map::new()))?;
        let Some(mut container) = sequence_target(built, !raw.is_empty())? else {
            return Ok(Instance::Null);
        };
        self.fill_sequence(bean, element, raw, &mut container)?;
        Ok(Instance::Object(container))
    }

    fn fill_sequence(
        &mut self,
        bean: &Bean,
        element: &Dependency,
        raw: &[Value],
        container: &mut Object,
    ) -> Result<(), DecodeError> {
        for item in raw {
            let value = self.dependency(Some(bean), element, item, Lookup::Itself)?;
            container
                .elements_mut()
                .ok_or_else(|| DecodeError::shape("expected a collection type"))?
                .push(value);
        }
        Ok(())
    }

    fn map_object(
        &mut self,
        bean: &Bean,
        key: &Dependency,
        element: &Dependency,
        entries: &str,
        data: &Value,
    ) -> Result<Instance, DecodeError> {
        let built = self.populate(bean, data)?;
        let Some(Value::Array(raw)) = data.get(entries) else {
            return Err(DecodeError::shape("expected a collection"));
        };
        let Some(mut container) = map_target(built, !raw.is_empty())? else {
            return Ok(Instance::Null);
        };
        for entry in raw {
            if !entry.is_object() {
                return Err(DecodeError::shape("expected a object"));
            }
            let k = self.dependency(Some(bean), key, entry, Lookup::ByName)?;
            let v = self.dependency(Some(bean), element, entry, Lookup::ByName)?;
            insert_entry(&mut container, k, v)?;
        }
        Ok(Instance::Object(container))
    }

    fn map_simple(
        &mut self,
        bean: &Bean,
        key: &Dependency,
        element: &Dependency,
        data: &Value,
    ) -> Result<Instance, DecodeError> {
        let Value::Object(raw) = data else {
            return Err(DecodeError::shape("expected a object"));
        };
        let built = self.populate(bean, &Value::Object(Map::new()))?;
        let Some(mut container) = map_target(built, !raw.is_empty())? else {
            return Ok(Instance::Null);
        };
        for (raw_key, raw_value) in raw {
            let k = self.dependency(
                Some(bean),
                key,
                &Value::String(raw_key.clone()),
                Lookup::Itself,
            )?;
            let v = self.dependency(Some(bean), element, raw_value, Lookup::Itself)?;
            insert_entry(&mut container, k, v)?;
        }
        Ok(Instance::Object(container))
    }

    /// Create the bean's object; `None` when every constructor argument came
    /// out empty.
    fn instantiate(&mut self, bean: &Bean, data: &Value) -> Result<Option<Object>, DecodeError> {
        self.try_instantiate(bean, data)
            .map_err(|cause| DecodeError::Construction {
                bean: bean.name.clone(),
                cause,
            })
    }

    fn try_instantiate(&mut self, bean: &Bean, data: &Value) -> anyhow::Result<Option<Object>> {
        let class = self
            .graph
            .class(&bean.class)
            .ok_or_else(|| DecodeError::ClassNotFound(bean.class.clone()))?;
        match &bean.constructor.invoker {
            Invoker::Constructor => {
                let Some(args) = self.args(bean, data)? else {
                    return Ok(None);
                };
                Ok(Some(class.construct(args)?))
            }
            Invoker::Factory {
                method,
                bean: source,
            } => {
                if bean.is_container() && bean.constructor.args.is_empty() {
                    return Err(DecodeError::InfiniteLoop(bean.name.clone()).into());
                }
                let (factory_class, target) = match source {
                    None => (class, None),
                    Some(source) => {
                        let peer = self
                            .graph
                            .bean(source)
                            .ok_or_else(|| DecodeError::FactoryNotFound(source.clone()))?;
                        let peer_class = self
                            .graph
                            .class(&peer.class)
                            .ok_or_else(|| DecodeError::ClassNotFound(peer.class.clone()))?;
                        let target = self.bean(peer, data)?;
                        if target.is_null() {
                            anyhow::bail!("factory bean {source} decoded to null");
                        }
                        (peer_class, Some(target))
                    }
                };
                let factory = factory_class.factory_method(method).ok_or_else(|| {
                    DecodeError::FactoryNotFound(format!("{}.{method}", factory_class.name()))
                })?;
                let Some(args) = self.args(bean, data)? else {
                    return Ok(None);
                };
                Ok(Some(factory.invoke(target.as_ref(), args)?))
            }
        }
    }

    /// Decode the constructor arguments in order; `None` when arguments are
    /// declared and none produced a value.
    fn args(&mut self, bean: &Bean, data: &Value) -> Result<Option<Vec<Instance>>, DecodeError> {
        let declared = &bean.constructor.args;
        let mut presence = Presence::new(declared.is_empty());
        let mut values = Vec::with_capacity(declared.len());
        for dependency in declared {
            let value = self.dependency(Some(bean), dependency, data, Lookup::ByName)?;
            presence.observe(!value.is_null() || dependency.is_nullable());
            values.push(value);
        }
        Ok(presence.resolve(values))
    }
}

fn member<'d>(data: &'d Value, name: &str) -> Result<Option<&'d Value>, DecodeError> {
    let object = data
        .as_object()
        .ok_or_else(|| DecodeError::shape("expected a object"))?;
    Ok(object.get(name).filter(|v| !v.is_null()))
}

/// Check the object built for a list bean before filling it. A suppressed
/// container is only accepted when there is nothing to put in it.
fn sequence_target(built: Option<Object>, has_items: bool) -> Result<Option<Object>, DecodeError> {
    match built {
        Some(object) if object.is_sequence() => Ok(Some(object)),
        None if !has_items => Ok(None),
        _ => Err(DecodeError::shape("expected a collection type")),
    }
}

fn map_target(built: Option<Object>, has_items: bool) -> Result<Option<Object>, DecodeError> {
    match built {
        Some(object) if object.is_map() => Ok(Some(object)),
        None if !has_items => Ok(None),
        _ => Err(DecodeError::shape("expected a map type")),
    }
}

fn insert_entry(container: &mut Object, key: Instance, value: Instance) -> Result<(), DecodeError> {
    container
        .entries_mut()
        .ok_or_else(|| DecodeError::shape("expected a map type"))?
        .insert(key, value);
    Ok(())
}

fn convert(ty: &TypeRef, raw: Raw<'_>) -> Result<Instance, DecodeError> {
    ty.convert(raw).map_err(DecodeError::Conversion)
}
