use super::{ConversionError, Raw, Type, TypeKind};
use crate::instance::Instance;
use serde_json::Value;

/// `string`: text, numbers and booleans render to text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextType;

impl Type for TextType {
    fn name(&self) -> String {
        "string".to_string()
    }

    fn convert(&self, raw: Raw<'_>) -> Result<Instance, ConversionError> {
        match &raw {
            r if r.is_null() => Ok(Instance::Null),
            Raw::Data(Value::String(s)) => Ok(Instance::Text(s.clone())),
            Raw::Data(Value::Number(n)) => Ok(Instance::Text(n.to_string())),
            Raw::Data(Value::Bool(b)) => Ok(Instance::Text(b.to_string())),
            Raw::Built(Instance::Object(_) | Instance::List(_)) | Raw::Data(_) => {
                Err(ConversionError::new(self, &raw, "expected a scalar value"))
            }
            Raw::Built(i) => Ok(Instance::Text(i.to_string())),
            Raw::Absent => Ok(Instance::Null),
        }
    }
}

/// `char`: text of exactly one character.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharType;

impl Type for CharType {
    fn name(&self) -> String {
        "char".to_string()
    }

    fn convert(&self, raw: Raw<'_>) -> Result<Instance, ConversionError> {
        if raw.is_null() {
            return Ok(Instance::Null);
        }
        let text = match &raw {
            Raw::Data(Value::String(s)) => s.as_str(),
            Raw::Built(Instance::Text(s)) => s.as_str(),
            _ => return Err(ConversionError::new(self, &raw, "expected text")),
        };
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(Instance::Null),
            (Some(c), None) => Ok(Instance::Text(c.to_string())),
            _ => Err(ConversionError::new(self, &raw, "expected a single character")),
        }
    }
}

/// Signed integers, range-checked to `bits`.
#[derive(Debug, Clone, Copy)]
pub struct IntegerType {
    bits: u32,
}

impl IntegerType {
    /// Construct a type for `bits`-wide integers (8, 16, 32 or 64).
    #[must_use]
    pub fn new(bits: u32) -> Self {
        Self {
            bits: bits.clamp(8, 64),
        }
    }

    fn in_range(&self, value: i64) -> bool {
        if self.bits >= 64 {
            return true;
        }
        let max = (1i64 << (self.bits - 1)) - 1;
        let min = -(1i64 << (self.bits - 1));
        (min..=max).contains(&value)
    }

    fn checked(&self, value: i64, raw: &Raw<'_>) -> Result<Instance, ConversionError> {
        if self.in_range(value) {
            Ok(Instance::Int(value))
        } else {
            Err(ConversionError::new(
                self,
                raw,
                format!("value out of range for {} bits", self.bits),
            ))
        }
    }
}

impl Default for IntegerType {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Type for IntegerType {
    fn name(&self) -> String {
        match self.bits {
            8 => "int8".to_string(),
            16 => "int16".to_string(),
            32 => "int32".to_string(),
            _ => "int".to_string(),
        }
    }

    fn convert(&self, raw: Raw<'_>) -> Result<Instance, ConversionError> {
        let value = match &raw {
            r if r.is_null() => return Ok(Instance::Null),
            Raw::Data(Value::Number(n)) => match n.as_i64() {
                Some(i) => i,
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
                    _ => return Err(ConversionError::new(self, &raw, "not an integer")),
                },
            },
            Raw::Data(Value::String(s)) | Raw::Built(Instance::Text(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(Instance::Null);
                }
                s.parse::<i64>()
                    .map_err(|e| ConversionError::new(self, &raw, e.to_string()))?
            }
            Raw::Built(Instance::Int(i)) => *i,
            _ => return Err(ConversionError::new(self, &raw, "expected an integer")),
        };
        self.checked(value, &raw)
    }
}

/// `float` / `double`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatType;

impl Type for FloatType {
    fn name(&self) -> String {
        "float".to_string()
    }

    fn convert(&self, raw: Raw<'_>) -> Result<Instance, ConversionError> {
        match &raw {
            r if r.is_null() => Ok(Instance::Null),
            Raw::Data(Value::Number(n)) => n
                .as_f64()
                .map(Instance::Float)
                .ok_or_else(|| ConversionError::new(self, &raw, "not representable as f64")),
            Raw::Data(Value::String(s)) | Raw::Built(Instance::Text(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(Instance::Null);
                }
                s.parse::<f64>()
                    .map(Instance::Float)
                    .map_err(|e| ConversionError::new(self, &raw, e.to_string()))
            }
            Raw::Built(Instance::Float(f)) => Ok(Instance::Float(*f)),
            Raw::Built(Instance::Int(i)) => Ok(Instance::Float(*i as f64)),
            _ => Err(ConversionError::new(self, &raw, "expected a number")),
        }
    }
}

/// `bool`: accepts JSON booleans and the usual form spellings.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolType;

impl Type for BoolType {
    fn name(&self) -> String {
        "bool".to_string()
    }

    fn convert(&self, raw: Raw<'_>) -> Result<Instance, ConversionError> {
        match &raw {
            r if r.is_null() => Ok(Instance::Null),
            Raw::Data(Value::Bool(b)) | Raw::Built(Instance::Bool(b)) => Ok(Instance::Bool(*b)),
            Raw::Data(Value::String(s)) | Raw::Built(Instance::Text(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "" => Ok(Instance::Null),
                    "true" | "1" | "on" | "yes" => Ok(Instance::Bool(true)),
                    "false" | "0" | "off" | "no" => Ok(Instance::Bool(false)),
                    _ => Err(ConversionError::new(self, &raw, "not a boolean")),
                }
            }
            Raw::Data(Value::Number(n)) => match n.as_i64() {
                Some(0) => Ok(Instance::Bool(false)),
                Some(1) => Ok(Instance::Bool(true)),
                _ => Err(ConversionError::new(self, &raw, "not a boolean")),
            },
            _ => Err(ConversionError::new(self, &raw, "expected a boolean")),
        }
    }
}

/// `any`: payload values pass through structurally, built values unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyType;

impl Type for AnyType {
    fn name(&self) -> String {
        "any".to_string()
    }

    fn convert(&self, raw: Raw<'_>) -> Result<Instance, ConversionError> {
        Ok(match raw {
            Raw::Absent => Instance::Null,
            Raw::Data(v) => Instance::from_value(v),
            Raw::Built(i) => i,
        })
    }
}

/// `bean(Class)`: the result of decoding a nested bean of that class.
#[derive(Debug, Clone)]
pub struct BeanType {
    class: String,
}

impl BeanType {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
        }
    }
}

impl Type for BeanType {
    fn name(&self) -> String {
        format!("bean({})", self.class)
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Bean
    }

    fn convert(&self, raw: Raw<'_>) -> Result<Instance, ConversionError> {
        match raw {
            r if r.is_null() => Ok(Instance::Null),
            Raw::Built(Instance::Object(o)) if o.class() == self.class => Ok(Instance::Object(o)),
            other => Err(ConversionError::new(
                self,
                &other,
                format!("expected an instance of {}", self.class),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Object;
    use serde_json::json;

    #[test]
    fn test_integer_from_text_and_number() {
        let ty = IntegerType::default();
        assert_eq!(ty.convert(Raw::Data(&json!("42"))).unwrap(), Instance::Int(42));
        assert_eq!(ty.convert(Raw::Data(&json!(7))).unwrap(), Instance::Int(7));
        assert_eq!(ty.convert(Raw::Data(&json!(7.0))).unwrap(), Instance::Int(7));
        assert_eq!(ty.convert(Raw::Data(&json!(""))).unwrap(), Instance::Null);
        assert_eq!(ty.convert(Raw::Absent).unwrap(), Instance::Null);
    }

    #[test]
    fn test_integer_rejects_shapes() {
        let ty = IntegerType::default();
        assert!(ty.convert(Raw::Data(&json!([1]))).is_err());
        assert!(ty.convert(Raw::Data(&json!({"a": 1}))).is_err());
        assert!(ty.convert(Raw::Data(&json!(1.5))).is_err());
        assert!(ty.convert(Raw::Data(&json!("abc"))).is_err());
    }

    #[test]
    fn test_integer_range() {
        let ty = IntegerType::new(8);
        assert_eq!(ty.convert(Raw::Data(&json!(127))).unwrap(), Instance::Int(127));
        let err = ty.convert(Raw::Data(&json!(128))).unwrap_err();
        assert_eq!(err.type_name, "int8");
        assert!(ty.convert(Raw::Data(&json!(-129))).is_err());
    }

    #[test]
    fn test_text_rejects_object() {
        let err = TextType.convert(Raw::Data(&json!({"a": 1}))).unwrap_err();
        assert_eq!(err.found, "an object");
        assert_eq!(TextType.convert(Raw::Data(&json!(5))).unwrap(), Instance::from("5"));
    }

    #[test]
    fn test_bool_spellings() {
        assert_eq!(BoolType.convert(Raw::Data(&json!("on"))).unwrap(), Instance::Bool(true));
        assert_eq!(BoolType.convert(Raw::Data(&json!("No"))).unwrap(), Instance::Bool(false));
        assert_eq!(BoolType.convert(Raw::Data(&json!(1))).unwrap(), Instance::Bool(true));
        assert!(BoolType.convert(Raw::Data(&json!("maybe"))).is_err());
    }

    #[test]
    fn test_char() {
        assert_eq!(CharType.convert(Raw::Data(&json!("x"))).unwrap(), Instance::from("x"));
        assert!(CharType.convert(Raw::Data(&json!("xy"))).is_err());
    }

    #[test]
    fn test_bean_type_checks_class() {
        let ty = BeanType::new("Person");
        let person = Instance::Object(Object::record("Person"));
        assert_eq!(ty.convert(Raw::Built(person.clone())).unwrap(), person);
        let other = Instance::Object(Object::record("Pet"));
        assert!(ty.convert(Raw::Built(other)).is_err());
        assert_eq!(ty.convert(Raw::Built(Instance::Null)).unwrap(), Instance::Null);
    }
}
