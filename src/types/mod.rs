//! # Type Conversion Module
//!
//! Every value slot of the mapping graph declares a target [`Type`]. After the
//! decoder has located the raw value for a slot (in the payload, in a scope,
//! or by decoding a nested bean) it hands it to the type, which produces the
//! final [`Instance`].
//!
//! ## Contract
//!
//! - Conversion is deterministic and side-effect free.
//! - An absent value and a payload `null` both convert to [`Instance::Null`].
//! - A raw value whose shape does not fit the type fails with a
//!   [`ConversionError`]; values are never silently coerced across shapes
//!   (an object never becomes a string).
//!
//! ## Built-in Types
//!
//! | Name | Type |
//! |------|------|
//! | `string`, `char` | [`TextType`], [`CharType`] |
//! | `int`, `long`, `int8`, `int16`, `int32` | [`IntegerType`] |
//! | `float`, `double` | [`FloatType`] |
//! | `bool`, `boolean` | [`BoolType`] |
//! | `any` | [`AnyType`] |
//! | `bean(Class)` | [`BeanType`] |
//! | `date`, `date(dd/MM/yyyy)` | [`DateType`] |
//! | `enum(A,B,C)`, `enum(A,B):ordinal` | [`EnumType`] |
//! | `list<T>`, `array<T>` | [`CollectionType`] |
//!
//! Names are resolved through a [`TypeRegistry`], which also accepts custom
//! types.

mod collection;
mod enumeration;
mod registry;
mod scalar;
mod temporal;

pub use collection::CollectionType;
pub use enumeration::{EnumType, EnumerationType};
pub use registry::TypeRegistry;
pub use scalar::{AnyType, BeanType, BoolType, CharType, FloatType, IntegerType, TextType};
pub use temporal::{translate_pattern, DateType, DEFAULT_DATE_PATTERN};

use crate::instance::Instance;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a type; the mapping graph stores these.
pub type TypeRef = Arc<dyn Type>;

/// How the decoder has to fetch raw values for a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Bean,
    Collection,
    Array,
}

impl TypeKind {
    /// Collection and array types read whole sequences from scopes.
    #[must_use]
    pub fn is_sequence(self) -> bool {
        matches!(self, TypeKind::Collection | TypeKind::Array)
    }
}

/// Input of a conversion.
#[derive(Debug, Clone)]
pub enum Raw<'a> {
    /// The source had no value under the requested name.
    Absent,
    /// A value taken from the payload or a scope.
    Data(&'a Value),
    /// The result of decoding a nested bean.
    Built(Instance),
}

impl Raw<'_> {
    /// `true` for values that convert to [`Instance::Null`] under every type.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Raw::Absent | Raw::Data(Value::Null) | Raw::Built(Instance::Null)
        )
    }

    /// Short shape description used in conversion errors.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Raw::Absent => "nothing".to_string(),
            Raw::Data(Value::Null) => "null".to_string(),
            Raw::Data(Value::Bool(b)) => format!("boolean {b}"),
            Raw::Data(Value::Number(n)) => format!("number {n}"),
            Raw::Data(Value::String(s)) => format!("string {s:?}"),
            Raw::Data(Value::Array(_)) => "an array".to_string(),
            Raw::Data(Value::Object(_)) => "an object".to_string(),
            Raw::Built(i) => format!("instance {i}"),
        }
    }
}

impl<'a> From<Option<&'a Value>> for Raw<'a> {
    fn from(value: Option<&'a Value>) -> Self {
        value.map_or(Raw::Absent, Raw::Data)
    }
}

/// A target type of the conversion layer.
pub trait Type: fmt::Debug + Send + Sync {
    /// Name of the type as accepted by the [`TypeRegistry`].
    fn name(&self) -> String;

    fn kind(&self) -> TypeKind {
        TypeKind::Scalar
    }

    /// Convert a raw value into an instance of this type.
    fn convert(&self, raw: Raw<'_>) -> Result<Instance, ConversionError>;
}

/// Raised when a raw value's shape is incompatible with the declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub type_name: String,
    pub found: String,
    pub message: String,
}

impl ConversionError {
    pub fn new(ty: &(impl Type + ?Sized), raw: &Raw<'_>, message: impl Into<String>) -> Self {
        Self {
            type_name: ty.name(),
            found: raw.describe(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot convert {} to {}: {}",
            self.found, self.type_name, self.message
        )
    }
}

impl std::error::Error for ConversionError {}
