use super::{ConversionError, Raw, Type};
use crate::instance::{EnumConstant, Instance};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// How enumeration constants are spelled in payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumerationType {
    /// Position of the constant (`0`, `1`, ...).
    Ordinal,
    /// Exact constant name.
    String,
    /// Ordinal when the value is numeric, name otherwise.
    #[default]
    Auto,
}

impl FromStr for EnumerationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ordinal" => Ok(EnumerationType::Ordinal),
            "string" => Ok(EnumerationType::String),
            "auto" => Ok(EnumerationType::Auto),
            other => Err(format!("unknown enumeration type: {other}")),
        }
    }
}

impl fmt::Display for EnumerationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumerationType::Ordinal => write!(f, "ordinal"),
            EnumerationType::String => write!(f, "string"),
            EnumerationType::Auto => write!(f, "auto"),
        }
    }
}

/// A closed set of named constants.
#[derive(Debug, Clone)]
pub struct EnumType {
    constants: Vec<String>,
    mode: EnumerationType,
}

impl EnumType {
    pub fn new<I, S>(constants: I, mode: EnumerationType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            constants: constants.into_iter().map(Into::into).collect(),
            mode,
        }
    }

    #[must_use]
    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    fn by_ordinal(&self, ordinal: i64) -> Option<Instance> {
        let ordinal = usize::try_from(ordinal).ok()?;
        self.constants.get(ordinal).map(|name| {
            Instance::Enum(EnumConstant {
                name: name.clone(),
                ordinal,
            })
        })
    }

    fn by_name(&self, name: &str) -> Option<Instance> {
        self.constants
            .iter()
            .position(|c| c == name)
            .map(|ordinal| {
                Instance::Enum(EnumConstant {
                    name: name.to_string(),
                    ordinal,
                })
            })
    }

    fn lookup_text(&self, text: &str) -> Option<Instance> {
        match self.mode {
            EnumerationType::Ordinal => text.parse().ok().and_then(|o| self.by_ordinal(o)),
            EnumerationType::String => self.by_name(text),
            EnumerationType::Auto => match text.parse::<i64>() {
                Ok(o) => self.by_ordinal(o),
                Err(_) => self.by_name(text),
            },
        }
    }
}

impl Type for EnumType {
    fn name(&self) -> String {
        format!("enum({}):{}", self.constants.join(","), self.mode)
    }

    fn convert(&self, raw: Raw<'_>) -> Result<Instance, ConversionError> {
        let found = match &raw {
            r if r.is_null() => return Ok(Instance::Null),
            Raw::Data(Value::String(s)) | Raw::Built(Instance::Text(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(Instance::Null);
                }
                self.lookup_text(s)
            }
            Raw::Data(Value::Number(n)) if self.mode != EnumerationType::String => {
                n.as_i64().and_then(|o| self.by_ordinal(o))
            }
            Raw::Built(Instance::Int(o)) if self.mode != EnumerationType::String => {
                self.by_ordinal(*o)
            }
            Raw::Built(Instance::Enum(c)) => self.by_name(&c.name),
            _ => None,
        };
        found.ok_or_else(|| ConversionError::new(self, &raw, "no such constant"))
    }
}
