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

//! Tagged field values.
//!
//! A [`Value`] holds one converted field: each supported primitive plus a
//! null state. Records are exchanged with the schema as ordered slices of
//! values, which keeps field-indexed access available without reflection.

use chrono::{NaiveDate, NaiveDateTime};

/// The semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueKind {
    /// Free text.
    String,
    /// A single character.
    Char,
    /// Boolean flag.
    Bool,
    /// Signed 64-bit integer.
    Int,
    /// 64-bit floating point number.
    Float,
    /// Calendar date.
    Date,
    /// Date and time without zone.
    DateTime,
}

impl ValueKind {
    /// Lowercase name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Char => "char",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Date => "date",
            Self::DateTime => "datetime",
        }
    }

    /// Returns true if `value` has this kind. Null matches no kind.
    pub fn matches(self, value: &Value) -> bool {
        value.kind() == Some(self)
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Single character.
    Char(char),
    /// String value.
    String(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time.
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The kind of this value, or `None` for null.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueKind::Bool),
            Self::Int(_) => Some(ValueKind::Int),
            Self::Float(_) => Some(ValueKind::Float),
            Self::Char(_) => Some(ValueKind::Char),
            Self::String(_) => Some(ValueKind::String),
            Self::Date(_) => Some(ValueKind::Date),
            Self::DateTime(_) => Some(ValueKind::DateTime),
        }
    }

    /// Try to get the value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a float. Integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as a character.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }

    /// Try to get the value as a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get the value as a date-time.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(d) => Some(*d),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Char(c) => write!(f, "{}", c),
            Self::String(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d),
            Self::DateTime(d) => write!(f, "{}", d),
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i64 => Int,
    i32 => Int,
    u32 => Int,
    f64 => Float,
    f32 => Float,
    char => Char,
    String => String,
    &str => String,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Typed extraction from a [`Value`].
///
/// Implemented for every primitive a field can hold and for `Option<T>`,
/// where null maps to `None`.
pub trait FromValue: Sized {
    /// Kind expected by this type, used in error messages.
    const KIND: &'static str;

    /// Convert, returning `None` on a kind mismatch.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($($t:ty, $kind:literal => |$v:ident| $body:expr;)*) => {
        $(
            impl FromValue for $t {
                const KIND: &'static str = $kind;

                fn from_value($v: &Value) -> Option<Self> {
                    $body
                }
            }
        )*
    };
}

impl_from_value! {
    bool, "bool" => |v| v.as_bool();
    i64, "int" => |v| v.as_int();
    i32, "int" => |v| v.as_int().and_then(|n| i32::try_from(n).ok());
    u32, "int" => |v| v.as_int().and_then(|n| u32::try_from(n).ok());
    f64, "float" => |v| v.as_float();
    char, "char" => |v| v.as_char();
    String, "string" => |v| v.as_str().map(str::to_string);
    NaiveDate, "date" => |v| v.as_date();
    NaiveDateTime, "datetime" => |v| v.as_datetime();
    Value, "any" => |v| Some(v.clone());
}

impl<T: FromValue> FromValue for Option<T> {
    const KIND: &'static str = T::KIND;

    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Kind tests ====================

    #[test]
    fn test_kind_of_each_variant() {
        assert_eq!(Value::Null.kind(), None);
        assert_eq!(Value::Bool(true).kind(), Some(ValueKind::Bool));
        assert_eq!(Value::Int(1).kind(), Some(ValueKind::Int));
        assert_eq!(Value::Float(1.5).kind(), Some(ValueKind::Float));
        assert_eq!(Value::Char('x').kind(), Some(ValueKind::Char));
        assert_eq!(Value::from("a").kind(), Some(ValueKind::String));
    }

    #[test]
    fn test_kind_matches() {
        assert!(ValueKind::Int.matches(&Value::Int(3)));
        assert!(!ValueKind::Int.matches(&Value::Float(3.0)));
        assert!(!ValueKind::String.matches(&Value::Null));
    }

    // ==================== Accessor tests ====================

    #[test]
    fn test_as_float_widens_int() {
        assert_eq!(Value::Int(2).as_float(), Some(2.0));
        assert_eq!(Value::from("2").as_float(), None);
    }

    #[test]
    fn test_display_null_is_empty() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Int(-7).to_string(), "-7");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(5i64)), Value::Int(5));
    }

    // ==================== FromValue tests ====================

    #[test]
    fn test_from_value_primitives() {
        assert_eq!(i64::from_value(&Value::Int(9)), Some(9));
        assert_eq!(String::from_value(&Value::from("hi")), Some("hi".to_string()));
        assert_eq!(bool::from_value(&Value::Int(1)), None);
    }

    #[test]
    fn test_from_value_narrowing_rejects_overflow() {
        assert_eq!(i32::from_value(&Value::Int(i64::MAX)), None);
        assert_eq!(u32::from_value(&Value::Int(-1)), None);
    }

    #[test]
    fn test_from_value_option() {
        assert_eq!(Option::<i64>::from_value(&Value::Null), Some(None));
        assert_eq!(Option::<i64>::from_value(&Value::Int(4)), Some(Some(4)));
        assert_eq!(Option::<i64>::from_value(&Value::from("x")), None);
    }
}
