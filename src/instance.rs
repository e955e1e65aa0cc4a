//! # Instance Model
//!
//! [`Instance`] is the dynamic value produced by decoding. Scalars come out of
//! the type conversion layer, objects come out of class constructors and
//! factory methods registered in the mapping graph.
//!
//! Objects carry the name of the class that built them, a property table and
//! a [`Content`] describing their container capability:
//!
//! - [`Content::Record`] - a plain bean (properties only)
//! - [`Content::Sequence`] - a list-like bean (ordered elements)
//! - [`Content::Entries`] - a map-like bean (key/value entries)
//!
//! Container beans keep their property table, so a list or map subclass with
//! extra fields decodes the same way as in the object-mode payloads:
//!
//! ```rust
//! use brutos::instance::{Instance, Object};
//!
//! let mut list = Object::list("ItemList");
//! list.set_property("prop", Instance::Text("x".into()));
//! if let Some(items) = list.elements_mut() {
//!     items.push(Instance::Int(1));
//! }
//! assert_eq!(list.elements().map(<[Instance]>::len), Some(1));
//! ```

use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Class name given to payload objects that pass through an untyped slot.
pub const UNTYPED_MAP_CLASS: &str = "map";

/// Format used when dates are rendered back to text.
pub const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A decoded value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Instance {
    /// Nothing was found, or the slot is explicitly null.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDateTime),
    Enum(EnumConstant),
    /// A plain sequence, e.g. the result of a `list<int>` conversion.
    List(Vec<Instance>),
    /// A bean built by a class definition.
    Object(Object),
}

/// A constant of an enumeration type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumConstant {
    pub name: String,
    pub ordinal: usize,
}

impl Instance {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Instance::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Instance::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Instance::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Instance::Float(f) => Some(*f),
            Instance::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Instance::Text(s) => Some(s),
            Instance::Enum(c) => Some(&c.name),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Instance::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Instance::Object(o) => Some(o),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Instance]> {
        match self {
            Instance::List(items) => Some(items),
            _ => None,
        }
    }

    /// Name of the class that built this value, if it is an object.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        self.as_object().map(Object::class)
    }

    /// Structural conversion of a payload value, used by untyped slots.
    ///
    /// Numbers that fit in `i64` become [`Instance::Int`], every other number
    /// becomes [`Instance::Float`]. Payload objects become untyped map objects
    /// keyed by text.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Instance::Null,
            Value::Bool(b) => Instance::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Instance::Int(i),
                None => Instance::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Instance::Text(s.clone()),
            Value::Array(items) => Instance::List(items.iter().map(Instance::from_value).collect()),
            Value::Object(map) => {
                let mut object = Object::map(UNTYPED_MAP_CLASS);
                if let Some(entries) = object.entries_mut() {
                    for (k, v) in map {
                        entries.insert(Instance::Text(k.clone()), Instance::from_value(v));
                    }
                }
                Instance::Object(object)
            }
        }
    }

    /// Render this instance as a JSON value (objects carry an `@class` key).
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instance::Null => write!(f, "null"),
            Instance::Bool(b) => write!(f, "{b}"),
            Instance::Int(i) => write!(f, "{i}"),
            Instance::Float(x) => write!(f, "{x}"),
            Instance::Text(s) => write!(f, "{s}"),
            Instance::Date(d) => write!(f, "{}", d.format(DATE_DISPLAY_FORMAT)),
            Instance::Enum(c) => write!(f, "{}", c.name),
            Instance::List(items) => write!(f, "list[{}]", items.len()),
            Instance::Object(o) => write!(f, "{}@{}", o.class, o.content.describe()),
        }
    }
}

impl From<bool> for Instance {
    fn from(b: bool) -> Self {
        Instance::Bool(b)
    }
}

impl From<i64> for Instance {
    fn from(i: i64) -> Self {
        Instance::Int(i)
    }
}

impl From<f64> for Instance {
    fn from(x: f64) -> Self {
        Instance::Float(x)
    }
}

impl From<&str> for Instance {
    fn from(s: &str) -> Self {
        Instance::Text(s.to_string())
    }
}

impl From<String> for Instance {
    fn from(s: String) -> Self {
        Instance::Text(s)
    }
}

impl From<Object> for Instance {
    fn from(o: Object) -> Self {
        Instance::Object(o)
    }
}

/// A bean instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    class: String,
    properties: BTreeMap<String, Instance>,
    content: Content,
}

/// Container capability of an [`Object`].
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Record,
    Sequence(Vec<Instance>),
    Entries(Entries),
}

impl Content {
    fn describe(&self) -> String {
        match self {
            Content::Record => "record".to_string(),
            Content::Sequence(items) => format!("sequence[{}]", items.len()),
            Content::Entries(entries) => format!("entries[{}]", entries.len()),
        }
    }
}

impl Object {
    #[must_use]
    pub fn record(class: impl Into<String>) -> Self {
        Self::with_content(class, Content::Record)
    }

    #[must_use]
    pub fn list(class: impl Into<String>) -> Self {
        Self::with_content(class, Content::Sequence(Vec::new()))
    }

    #[must_use]
    pub fn map(class: impl Into<String>) -> Self {
        Self::with_content(class, Content::Entries(Entries::default()))
    }

    #[must_use]
    pub fn with_content(class: impl Into<String>, content: Content) -> Self {
        Self {
            class: class.into(),
            properties: BTreeMap::new(),
            content,
        }
    }

    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[must_use]
    pub fn content(&self) -> &Content {
        &self.content
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Instance> {
        self.properties.get(name)
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: Instance) {
        self.properties.insert(name.into(), value);
    }

    /// Builder-style variant of [`Object::set_property`].
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Instance>) -> Self {
        self.set_property(name, value.into());
        self
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self.content, Content::Sequence(_))
    }

    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self.content, Content::Entries(_))
    }

    #[must_use]
    pub fn elements(&self) -> Option<&[Instance]> {
        match &self.content {
            Content::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn elements_mut(&mut self) -> Option<&mut Vec<Instance>> {
        match &mut self.content {
            Content::Sequence(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn entries(&self) -> Option<&Entries> {
        match &self.content {
            Content::Entries(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn entries_mut(&mut self) -> Option<&mut Entries> {
        match &mut self.content {
            Content::Entries(entries) => Some(entries),
            _ => None,
        }
    }
}

/// Key/value storage of a map-like object.
///
/// Entries keep insertion order. Scalar, text, date and enum keys are indexed
/// by hash; float and structured keys fall back to an equality scan over the
/// unindexed entries. Inserting an equal key replaces the value in place.
#[derive(Debug, Clone, Default)]
pub struct Entries {
    pairs: Vec<(Instance, Instance)>,
    index: HashMap<EntryKey, usize>,
    unindexed: Vec<usize>,
}

/// Hashable projection of the instances that can serve as index keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EntryKey {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Date(NaiveDateTime),
    Enum(EnumConstant),
}

impl EntryKey {
    fn of(key: &Instance) -> Option<Self> {
        Some(match key {
            Instance::Null => EntryKey::Null,
            Instance::Bool(b) => EntryKey::Bool(*b),
            Instance::Int(i) => EntryKey::Int(*i),
            Instance::Text(s) => EntryKey::Text(s.clone()),
            Instance::Date(d) => EntryKey::Date(*d),
            Instance::Enum(c) => EntryKey::Enum(c.clone()),
            Instance::Float(_) | Instance::List(_) | Instance::Object(_) => return None,
        })
    }
}

impl Entries {
    fn position(&self, key: &Instance) -> Option<usize> {
        match EntryKey::of(key) {
            Some(k) => self.index.get(&k).copied(),
            None => self
                .unindexed
                .iter()
                .copied()
                .find(|&i| self.pairs[i].0 == *key),
        }
    }

    /// Insert an entry, returning the previous value for an equal key.
    pub fn insert(&mut self, key: Instance, value: Instance) -> Option<Instance> {
        if let Some(i) = self.position(&key) {
            return Some(std::mem::replace(&mut self.pairs[i].1, value));
        }
        let slot = self.pairs.len();
        match EntryKey::of(&key) {
            Some(k) => {
                self.index.insert(k, slot);
            }
            None => self.unindexed.push(slot),
        }
        self.pairs.push((key, value));
        None
    }

    #[must_use]
    pub fn get(&self, key: &Instance) -> Option<&Instance> {
        self.position(key).map(|i| &self.pairs[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Instance, &Instance)> {
        self.pairs.iter().map(|(k, v)| (k, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl PartialEq for Entries {
    fn eq(&self, other: &Self) -> bool {
        self.pairs == other.pairs
    }
}

impl Serialize for Instance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Instance::Null => serializer.serialize_unit(),
            Instance::Bool(b) => serializer.serialize_bool(*b),
            Instance::Int(i) => serializer.serialize_i64(*i),
            Instance::Float(x) => serializer.serialize_f64(*x),
            Instance::Text(s) => serializer.serialize_str(s),
            Instance::Date(d) => {
                serializer.serialize_str(&d.format(DATE_DISPLAY_FORMAT).to_string())
            }
            Instance::Enum(c) => serializer.serialize_str(&c.name),
            Instance::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Instance::Object(o) => o.serialize(serializer),
        }
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("@class", &self.class)?;
        for (name, value) in &self.properties {
            map.serialize_entry(name, value)?;
        }
        match &self.content {
            Content::Record => {}
            Content::Sequence(items) => map.serialize_entry("@elements", items)?,
            Content::Entries(entries) => {
                let pairs: Vec<[&Instance; 2]> = entries.iter().map(|(k, v)| [k, v]).collect();
                map.serialize_entry("@entries", &pairs)?;
            }
        }
        map.end()
    }
}
