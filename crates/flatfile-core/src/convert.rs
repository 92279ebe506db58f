// Dweve Flatfile - Schema-driven flat file records
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! String ⇄ value converters.
//!
//! Every field descriptor owns one [`Converter`]. The built-in variants cover
//! the primitive kinds; [`FieldConverter`] is the seam for caller-defined
//! formats (packed decimals, enumerations, and so on).

use crate::locale::Locale;
use crate::value::{Value, ValueKind};
use chrono::{NaiveDate, NaiveDateTime};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Default strftime pattern for date fields.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default strftime pattern for date-time fields.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TRUE_WORDS: [&str; 5] = ["true", "1", "t", "y", "yes"];
const FALSE_WORDS: [&str; 5] = ["false", "0", "f", "n", "no"];

/// Caller-supplied conversion for a field.
///
/// Errors are plain messages; the field descriptor wraps them into a
/// [`ConversionError`](crate::ConversionError) with the field context.
///
/// # Examples
///
/// ```
/// use flatfile_core::{FieldConverter, Value, ValueKind};
///
/// /// Amounts stored as integer cents.
/// #[derive(Debug)]
/// struct Cents;
///
/// impl FieldConverter for Cents {
///     fn kind(&self) -> ValueKind {
///         ValueKind::Float
///     }
///
///     fn parse(&self, text: &str) -> Result<Value, String> {
///         let cents: i64 = text.parse().map_err(|e| format!("{}", e))?;
///         Ok(Value::Float(cents as f64 / 100.0))
///     }
///
///     fn format(&self, value: &Value) -> Result<String, String> {
///         let amount = value.as_float().ok_or("expected float")?;
///         Ok(format!("{}", (amount * 100.0).round() as i64))
///     }
/// }
///
/// assert_eq!(Cents.parse("1250").unwrap(), Value::Float(12.5));
/// ```
pub trait FieldConverter: Send + Sync + fmt::Debug {
    /// Kind of value this converter produces.
    fn kind(&self) -> ValueKind;

    /// Convert field text to a value.
    fn parse(&self, text: &str) -> Result<Value, String>;

    /// Convert a non-null value to field text.
    fn format(&self, value: &Value) -> Result<String, String>;
}

/// Conversion strategy of one field.
#[derive(Debug, Clone)]
pub enum Converter {
    /// Text passed through unchanged.
    String,
    /// Exactly one character.
    Char,
    /// Boolean with optional custom spellings.
    Bool {
        /// Text meaning `true`; defaults to a set of common spellings.
        true_text: Option<String>,
        /// Text meaning `false`; defaults to a set of common spellings.
        false_text: Option<String>,
    },
    /// Signed 64-bit integer.
    Int,
    /// 64-bit float.
    Float,
    /// Date with a strftime pattern.
    Date {
        /// Pattern used for both parsing and formatting.
        format: String,
    },
    /// Date-time with a strftime pattern.
    DateTime {
        /// Pattern used for both parsing and formatting.
        format: String,
    },
    /// Caller-defined conversion.
    Custom(Arc<dyn FieldConverter>),
}

impl Converter {
    /// Kind of value this converter produces.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::String => ValueKind::String,
            Self::Char => ValueKind::Char,
            Self::Bool { .. } => ValueKind::Bool,
            Self::Int => ValueKind::Int,
            Self::Float => ValueKind::Float,
            Self::Date { .. } => ValueKind::Date,
            Self::DateTime { .. } => ValueKind::DateTime,
            Self::Custom(c) => c.kind(),
        }
    }

    /// True for numeric kinds that get sign-blank cleanup.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Convert non-empty field text to a value.
    pub fn parse(&self, text: &str, locale: &Locale) -> Result<Value, String> {
        match self {
            Self::String => Ok(Value::String(text.to_string())),
            Self::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(format!(
                        "expected a single character, found {}",
                        text.chars().count()
                    )),
                }
            }
            Self::Bool {
                true_text,
                false_text,
            } => parse_bool(text, true_text.as_deref(), false_text.as_deref()),
            Self::Int => locale
                .normalize_number(text)
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| e.to_string()),
            Self::Float => locale
                .normalize_number(text)
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| e.to_string()),
            Self::Date { format } => NaiveDate::parse_from_str(text, format)
                .map(Value::Date)
                .map_err(|e| format!("{} (expected format '{}')", e, format)),
            Self::DateTime { format } => NaiveDateTime::parse_from_str(text, format)
                .map(Value::DateTime)
                .map_err(|e| format!("{} (expected format '{}')", e, format)),
            Self::Custom(c) => c.parse(text),
        }
    }

    /// Convert a non-null value to field text.
    pub fn format(&self, value: &Value, locale: &Locale) -> Result<String, String> {
        let mismatch = || {
            format!(
                "expected {} value, got {}",
                self.kind(),
                value.kind().map_or("null", ValueKind::name)
            )
        };

        match (self, value) {
            (Self::String, Value::String(s)) => Ok(s.clone()),
            (Self::Char, Value::Char(c)) => Ok(c.to_string()),
            (
                Self::Bool {
                    true_text,
                    false_text,
                },
                Value::Bool(b),
            ) => Ok(if *b {
                true_text.clone().unwrap_or_else(|| "true".to_string())
            } else {
                false_text.clone().unwrap_or_else(|| "false".to_string())
            }),
            (Self::Int, Value::Int(n)) => Ok(n.to_string()),
            (Self::Float, Value::Float(_) | Value::Int(_)) => value
                .as_float()
                .map(|f| locale.localize_number(f.to_string()))
                .ok_or_else(mismatch),
            (Self::Date { format }, Value::Date(d)) => Ok(d.format(format).to_string()),
            (Self::DateTime { format }, Value::DateTime(d)) => Ok(d.format(format).to_string()),
            (Self::Custom(c), v) => c.format(v),
            _ => Err(mismatch()),
        }
    }
}

fn parse_bool(text: &str, true_text: Option<&str>, false_text: Option<&str>) -> Result<Value, String> {
    let matches_any = |words: &[&str]| words.iter().any(|w| w.eq_ignore_ascii_case(text));

    match (true_text, false_text) {
        (Some(t), Some(f)) => {
            if t.eq_ignore_ascii_case(text) {
                Ok(Value::Bool(true))
            } else if f.eq_ignore_ascii_case(text) {
                Ok(Value::Bool(false))
            } else {
                Err(format!("expected '{}' or '{}'", t, f))
            }
        }
        // Only one spelling given: everything else means the opposite.
        (Some(t), None) => Ok(Value::Bool(t.eq_ignore_ascii_case(text))),
        (None, Some(f)) => Ok(Value::Bool(!f.eq_ignore_ascii_case(text))),
        (None, None) if matches_any(&TRUE_WORDS) => Ok(Value::Bool(true)),
        (None, None) if matches_any(&FALSE_WORDS) => Ok(Value::Bool(false)),
        (None, None) => Err("not a recognized boolean".to_string()),
    }
}

/// Remove leading blanks and the blanks between a sign and its digits.
///
/// Column-aligned numeric data often looks like `" +  21 "`; Rust's number
/// parsers reject the inner gap. Trailing blanks are left to the field,
/// which trims non-string text before conversion.
///
/// # Examples
///
/// ```
/// use flatfile_core::convert::remove_sign_blanks;
///
/// assert_eq!(remove_sign_blanks(" +  21 "), "+21 ");
/// assert_eq!(remove_sign_blanks("  -7"), "-7");
/// assert_eq!(remove_sign_blanks("42"), "42");
/// assert_eq!(remove_sign_blanks("   "), "");
/// ```
pub fn remove_sign_blanks(source: &str) -> Cow<'_, str> {
    let rest = source.trim_start();
    if rest.is_empty() {
        return Cow::Borrowed("");
    }

    let mut chars = rest.chars();
    match chars.next() {
        Some(sign @ ('+' | '-')) => {
            let after_sign = chars.as_str();
            if !after_sign.starts_with(char::is_whitespace) {
                return Cow::Borrowed(rest);
            }
            let digits = after_sign.trim_start();
            let mut out = String::with_capacity(digits.len() + 1);
            out.push(sign);
            out.push_str(digits);
            Cow::Owned(out)
        }
        _ => Cow::Borrowed(rest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inv() -> Locale {
        Locale::invariant()
    }

    // ==================== Parse tests ====================

    #[test]
    fn test_parse_int() {
        assert_eq!(Converter::Int.parse("-42", &inv()), Ok(Value::Int(-42)));
        assert_eq!(Converter::Int.parse("+7", &inv()), Ok(Value::Int(7)));
        assert!(Converter::Int.parse("4x", &inv()).is_err());
    }

    #[test]
    fn test_parse_int_with_grouping() {
        let locale = Locale::new('.', Some(','));
        assert_eq!(Converter::Int.parse("12,345", &locale), Ok(Value::Int(12345)));
    }

    #[test]
    fn test_parse_float_locale() {
        let locale = Locale::new(',', None);
        assert_eq!(Converter::Float.parse("2,5", &locale), Ok(Value::Float(2.5)));
    }

    #[test]
    fn test_parse_char() {
        assert_eq!(Converter::Char.parse("Z", &inv()), Ok(Value::Char('Z')));
        assert!(Converter::Char.parse("ZZ", &inv()).is_err());
    }

    #[test]
    fn test_parse_bool_defaults() {
        let conv = Converter::Bool {
            true_text: None,
            false_text: None,
        };
        assert_eq!(conv.parse("YES", &inv()), Ok(Value::Bool(true)));
        assert_eq!(conv.parse("0", &inv()), Ok(Value::Bool(false)));
        assert!(conv.parse("maybe", &inv()).is_err());
    }

    #[test]
    fn test_parse_bool_custom_pair() {
        let conv = Converter::Bool {
            true_text: Some("ON".to_string()),
            false_text: Some("OFF".to_string()),
        };
        assert_eq!(conv.parse("on", &inv()), Ok(Value::Bool(true)));
        assert_eq!(conv.parse("off", &inv()), Ok(Value::Bool(false)));
        assert!(conv.parse("1", &inv()).is_err());
    }

    #[test]
    fn test_parse_bool_single_spelling() {
        let conv = Converter::Bool {
            true_text: Some("X".to_string()),
            false_text: None,
        };
        assert_eq!(conv.parse("x", &inv()), Ok(Value::Bool(true)));
        assert_eq!(conv.parse("-", &inv()), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_parse_date() {
        let conv = Converter::Date {
            format: "%d%m%Y".to_string(),
        };
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).map(Value::Date);
        assert_eq!(conv.parse("01032024", &inv()).ok(), expected);
        assert!(conv.parse("2024-03-01", &inv()).is_err());
    }

    // ==================== Format tests ====================

    #[test]
    fn test_format_float_locale() {
        let locale = Locale::new(',', Some('.'));
        assert_eq!(Converter::Float.format(&Value::Float(1.25), &locale), Ok("1,25".to_string()));
        assert_eq!(Converter::Float.format(&Value::Int(3), &locale), Ok("3".to_string()));
    }

    #[test]
    fn test_format_kind_mismatch() {
        let err = Converter::Int.format(&Value::from("x"), &inv()).unwrap_err();
        assert!(err.contains("expected int"));
        assert!(err.contains("string"));
    }

    #[test]
    fn test_format_bool_custom() {
        let conv = Converter::Bool {
            true_text: Some("Y".to_string()),
            false_text: Some("N".to_string()),
        };
        assert_eq!(conv.format(&Value::Bool(false), &inv()), Ok("N".to_string()));
    }

    #[test]
    fn test_format_date() {
        let conv = Converter::Date {
            format: DEFAULT_DATE_FORMAT.to_string(),
        };
        let date = NaiveDate::from_ymd_opt(1999, 12, 31).map(Value::Date).unwrap();
        assert_eq!(conv.format(&date, &inv()), Ok("1999-12-31".to_string()));
    }

    // ==================== Sign blank tests ====================

    #[test]
    fn test_remove_sign_blanks_variants() {
        assert_eq!(remove_sign_blanks(" +  21 "), "+21 ");
        assert_eq!(remove_sign_blanks("-5"), "-5");
        assert_eq!(remove_sign_blanks("  9"), "9");
        assert_eq!(remove_sign_blanks(""), "");
    }

    #[test]
    fn test_remove_sign_blanks_lone_sign() {
        assert_eq!(remove_sign_blanks(" - "), "-");
        assert_eq!(remove_sign_blanks("+"), "+");
    }
}
