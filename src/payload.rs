//! # Payload Adapters
//!
//! Request bodies become the [`Value`] the decoder walks.
//!
//! JSON bodies are parsed as-is. Form bodies
//! (`application/x-www-form-urlencoded`) are folded into an object:
//!
//! | Form field | Payload |
//! |------------|---------|
//! | `name=Ana` | `{"name": "Ana"}` |
//! | `address.city=Porto` | `{"address": {"city": "Porto"}}` |
//! | `tag=a&tag=b` | `{"tag": ["a", "b"]}` |
//! | `tag[]=a&tag[]=b` | `{"tag": ["a", "b"]}` |
//! | `pets[3].name=Rex&pets[0].name=Bo` | `{"pets": [{"name": "Bo"}, {"name": "Rex"}]}` |
//!
//! Indexed fields are ordered by index and compacted, so sparse indices do
//! not leave holes. Every form value is text; typed slots convert it.

use serde_json::{Map, Value};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use url::form_urlencoded;

pub const JSON_MEDIA_TYPE: &str = "application/json";
pub const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug)]
pub enum PayloadError {
    InvalidJson(serde_json::Error),
    InvalidForm { field: String, message: String },
    UnsupportedMediaType(String),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::InvalidJson(e) => write!(f, "invalid JSON body: {e}"),
            PayloadError::InvalidForm { field, message } => {
                write!(f, "invalid form field {field:?}: {message}")
            }
            PayloadError::UnsupportedMediaType(media) => {
                write!(f, "unsupported media type: {media}")
            }
        }
    }
}

impl std::error::Error for PayloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PayloadError::InvalidJson(e) => Some(e),
            _ => None,
        }
    }
}

pub fn from_json(body: &[u8]) -> Result<Value, PayloadError> {
    serde_json::from_slice(body).map_err(PayloadError::InvalidJson)
}

pub fn from_form(body: &[u8]) -> Result<Value, PayloadError> {
    let mut root = Node::Object(BTreeMap::new());
    for (name, value) in form_urlencoded::parse(body) {
        let path = parse_field(&name).ok_or_else(|| PayloadError::InvalidForm {
            field: name.to_string(),
            message: "malformed field name".to_string(),
        })?;
        if !insert(&mut root, &path, value.into_owned()) {
            return Err(PayloadError::InvalidForm {
                field: name.to_string(),
                message: "conflicts with another field".to_string(),
            });
        }
    }
    Ok(root.into_value())
}

/// Parse a body according to its `Content-Type`.
pub fn from_body(content_type: &str, body: &[u8]) -> Result<Value, PayloadError> {
    let media = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match media.as_str() {
        JSON_MEDIA_TYPE => from_json(body),
        FORM_MEDIA_TYPE => from_form(body),
        m if m.ends_with("+json") => from_json(body),
        _ => Err(PayloadError::UnsupportedMediaType(media)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    Append,
}

fn parse_field(name: &str) -> Option<Vec<Segment>> {
    let mut path = Vec::new();
    for part in name.split('.') {
        let (head, mut rest) = match part.find('[') {
            Some(i) => part.split_at(i),
            None => (part, ""),
        };
        if head.is_empty() {
            return None;
        }
        path.push(Segment::Key(head.to_string()));
        while !rest.is_empty() {
            let inner = rest.strip_prefix('[')?;
            let end = inner.find(']')?;
            let index = &inner[..end];
            path.push(if index.is_empty() {
                Segment::Append
            } else if let Ok(i) = index.parse() {
                Segment::Index(i)
            } else {
                Segment::Key(index.to_string())
            });
            rest = &inner[end + 1..];
        }
    }
    Some(path)
}

#[derive(Debug)]
enum Node {
    Text(String),
    Object(BTreeMap<String, Node>),
    Indexed(BTreeMap<usize, Node>),
    List(Vec<Node>),
}

impl Node {
    fn for_segment(segment: &Segment) -> Self {
        match segment {
            Segment::Key(_) => Node::Object(BTreeMap::new()),
            Segment::Index(_) => Node::Indexed(BTreeMap::new()),
            Segment::Append => Node::List(Vec::new()),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Node::Text(s) => Value::String(s),
            Node::Object(members) => Value::Object(
                members
                    .into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect::<Map<_, _>>(),
            ),
            Node::Indexed(slots) => Value::Array(slots.into_values().map(Node::into_value).collect()),
            Node::List(items) => Value::Array(items.into_iter().map(Node::into_value).collect()),
        }
    }
}

/// Place `value` at `path` under `node`; `false` on a shape conflict.
fn insert(node: &mut Node, path: &[Segment], value: String) -> bool {
    let Some((head, tail)) = path.split_first() else {
        return false;
    };
    let next = tail.first();
    match head {
        Segment::Key(key) => {
            let Node::Object(members) = node else {
                return false;
            };
            if let Some(segment) = next {
                let child = members
                    .entry(key.clone())
                    .or_insert_with(|| Node::for_segment(segment));
                return insert(child, tail, value);
            }
            match members.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(Node::Text(value));
                }
                Entry::Occupied(mut slot) => {
                    let slot = slot.get_mut();
                    match slot {
                        Node::List(items) => items.push(Node::Text(value)),
                        Node::Text(_) => {
                            let first = std::mem::replace(slot, Node::List(Vec::new()));
                            *slot = Node::List(vec![first, Node::Text(value)]);
                        }
                        Node::Object(_) | Node::Indexed(_) => return false,
                    }
                }
            }
            true
        }
        Segment::Index(index) => {
            let Node::Indexed(slots) = node else {
                return false;
            };
            match next {
                None => {
                    if slots.contains_key(index) {
                        return false;
                    }
                    slots.insert(*index, Node::Text(value));
                    true
                }
                Some(segment) => {
                    let child = slots
                        .entry(*index)
                        .or_insert_with(|| Node::for_segment(segment));
                    insert(child, tail, value)
                }
            }
        }
        Segment::Append => {
            let Node::List(items) = node else {
                return false;
            };
            match next {
                None => {
                    items.push(Node::Text(value));
                    true
                }
                Some(segment) => {
                    items.push(Node::for_segment(segment));
                    match items.last_mut() {
                        Some(child) => insert(child, tail, value),
                        None => false,
                    }
                }
            }
        }
    }
}
