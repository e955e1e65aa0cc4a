use super::{ConversionError, Raw, Type};
use crate::instance::Instance;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

/// Pattern used by `date` without an explicit pattern.
pub const DEFAULT_DATE_PATTERN: &str = "yyyy-MM-dd";

/// Dates and date-times parsed with a `SimpleDateFormat`-style pattern.
///
/// Patterns without time fields produce midnight of the parsed day.
#[derive(Debug, Clone)]
pub struct DateType {
    pattern: String,
    format: String,
}

impl DateType {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let format = translate_pattern(&pattern);
        Self { pattern, format }
    }

    /// The chrono format string derived from the pattern.
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(text, &self.format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, &self.format)
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
    }
}

impl Default for DateType {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_PATTERN)
    }
}

impl Type for DateType {
    fn name(&self) -> String {
        format!("date({})", self.pattern)
    }

    fn convert(&self, raw: Raw<'_>) -> Result<Instance, ConversionError> {
        match &raw {
            r if r.is_null() => Ok(Instance::Null),
            Raw::Data(Value::String(s)) | Raw::Built(Instance::Text(s)) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(Instance::Null);
                }
                self.parse(s).map(Instance::Date).ok_or_else(|| {
                    ConversionError::new(self, &raw, format!("does not match {}", self.pattern))
                })
            }
            Raw::Built(Instance::Date(d)) => Ok(Instance::Date(*d)),
            _ => Err(ConversionError::new(self, &raw, "expected date text")),
        }
    }
}

/// Translate a `yyyy-MM-dd HH:mm:ss`-style pattern into a chrono format.
///
/// Letters are taken in runs (`yyyy`, `MM`, ...). Text between single quotes
/// is literal and `''` is a quote. Unknown letters are kept as literals.
#[must_use]
pub fn translate_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }
        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let spec = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1 | 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', _) => "%d",
            ('H', _) => "%H",
            ('h', _) => "%I",
            ('m', _) => "%M",
            ('s', _) => "%S",
            ('S', _) => "%3f",
            ('a', _) => "%p",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('Z', _) => "%z",
            _ => "",
        };
        if spec.is_empty() {
            for _ in 0..run {
                push_literal(&mut out, c);
            }
        } else {
            out.push_str(spec);
        }
        i += run;
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_translate_pattern() {
        assert_eq!(translate_pattern("yyyy-MM-dd"), "%Y-%m-%d");
        assert_eq!(translate_pattern("dd/MM/yy HH:mm:ss"), "%d/%m/%y %H:%M:%S");
        assert_eq!(translate_pattern("yyyy'T'HH"), "%YT%H");
        assert_eq!(translate_pattern("h 'o''clock' a"), "%I o'clock %p");
    }

    #[test]
    fn test_date_only_pattern_is_midnight() {
        let ty = DateType::default();
        let value = ty.convert(Raw::Data(&json!("2017-03-09"))).unwrap();
        match value {
            Instance::Date(d) => assert_eq!(d.to_string(), "2017-03-09 00:00:00"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_date_time_pattern() {
        let ty = DateType::new("dd/MM/yyyy HH:mm");
        let value = ty.convert(Raw::Data(&json!("09/03/2017 14:30"))).unwrap();
        assert_eq!(value.to_string(), "2017-03-09T14:30:00");
    }

    #[test]
    fn test_date_mismatch() {
        let err = DateType::default().convert(Raw::Data(&json!("03/09/2017"))).unwrap_err();
        assert!(err.message.contains("yyyy-MM-dd"));
        assert!(DateType::default().convert(Raw::Data(&json!(5))).is_err());
    }
}
