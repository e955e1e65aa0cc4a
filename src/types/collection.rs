use super::{ConversionError, Raw, Type, TypeKind, TypeRef};
use crate::instance::Instance;
use serde_json::Value;
use std::sync::Arc;

/// `list<T>` / `array<T>`: converts every element with the element type.
///
/// A single scalar converts to a one-element list, which is how repeated form
/// parameters that happen to occur once arrive.
#[derive(Debug, Clone)]
pub struct CollectionType {
    element: TypeRef,
    array: bool,
}

impl CollectionType {
    #[must_use]
    pub fn list(element: TypeRef) -> Self {
        Self {
            element,
            array: false,
        }
    }

    #[must_use]
    pub fn array(element: TypeRef) -> Self {
        Self {
            element,
            array: true,
        }
    }

    #[must_use]
    pub fn element(&self) -> TypeRef {
        Arc::clone(&self.element)
    }
}

impl Type for CollectionType {
    fn name(&self) -> String {
        let outer = if self.array { "array" } else { "list" };
        format!("{outer}<{}>", self.element.name())
    }

    fn kind(&self) -> TypeKind {
        if self.array {
            TypeKind::Array
        } else {
            TypeKind::Collection
        }
    }

    fn convert(&self, raw: Raw<'_>) -> Result<Instance, ConversionError> {
        match raw {
            r if r.is_null() => Ok(Instance::Null),
            Raw::Data(Value::Array(items)) => items
                .iter()
                .map(|item| self.element.convert(Raw::Data(item)))
                .collect::<Result<Vec<_>, _>>()
                .map(Instance::List),
            Raw::Data(v @ Value::Object(_)) => Err(ConversionError::new(
                self,
                &Raw::Data(v),
                "expected a sequence",
            )),
            Raw::Data(v) => Ok(Instance::List(vec![self.element.convert(Raw::Data(v))?])),
            Raw::Built(Instance::List(items)) => items
                .into_iter()
                .map(|item| self.element.convert(Raw::Built(item)))
                .collect::<Result<Vec<_>, _>>()
                .map(Instance::List),
            Raw::Built(Instance::Object(o)) if o.is_sequence() => Ok(Instance::Object(o)),
            Raw::Built(other) => Err(ConversionError::new(
                self,
                &Raw::Built(other),
                "expected a sequence",
            )),
            Raw::Absent => Ok(Instance::Null),
        }
    }
}
