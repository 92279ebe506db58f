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

//! Record types.
//!
//! A record is any `Clone` type that can be built from the ordered field
//! values of one line and turned back into them. The schema never looks
//! inside a record: it converts lines to `Vec<Value>` and back, and the
//! [`Record`] impl maps those values onto the caller's struct.
//!
//! # Examples
//!
//! ```
//! use flatfile_core::{value_at, ConversionError, Record, Value};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! impl Record for Point {
//!     fn from_values(values: &[Value]) -> Result<Self, ConversionError> {
//!         Ok(Point {
//!             x: value_at(values, 0, "x")?,
//!             y: value_at(values, 1, "y")?,
//!         })
//!     }
//!
//!     fn to_values(&self) -> Vec<Value> {
//!         vec![self.x.into(), self.y.into()]
//!     }
//! }
//!
//! let p = Point::from_values(&[Value::Int(1), Value::Int(2)]).unwrap();
//! assert_eq!(p, Point { x: 1, y: 2 });
//! ```

use crate::error::ConversionError;
use crate::value::{FromValue, Value};
use std::any::TypeId;
use std::borrow::Cow;
use std::hash::{Hash, Hasher};

/// Identity of a record type, used to check what is written against what
/// the schema declares.
///
/// Two `RecordType`s are equal when they refer to the same Rust type; the
/// name is only used in messages and error logs.
#[derive(Debug, Clone)]
pub struct RecordType {
    id: TypeId,
    name: Cow<'static, str>,
}

impl RecordType {
    /// Identity of `T`, named after its last path segment.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: Cow::Borrowed(short_type_name(std::any::type_name::<T>())),
        }
    }

    /// Same identity with a display name of the caller's choosing.
    pub fn with_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying type id.
    pub fn id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Whether a record continues through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordAction {
    /// Continue with the record.
    #[default]
    Keep,
    /// Drop the record silently.
    Skip,
}

/// A typed record mapped to one line.
pub trait Record: Clone + 'static {
    /// Build the record from field values in schema order.
    fn from_values(values: &[Value]) -> Result<Self, ConversionError>;

    /// Field values in schema order.
    fn to_values(&self) -> Vec<Value>;

    /// Runtime identity checked against the schema before writing.
    fn record_type(&self) -> RecordType {
        RecordType::of::<Self>()
    }

    /// Called after the record was read from `line`.
    fn after_read(&mut self, _line: &str) -> RecordAction {
        RecordAction::Keep
    }

    /// Called before the record is written.
    fn before_write(&self) -> RecordAction {
        RecordAction::Keep
    }
}

/// Typed extraction of one field for [`Record::from_values`] impls.
///
/// Fails with a [`ConversionError`] naming the field when the value is
/// missing or holds another kind. `Option<T>` targets accept null.
pub fn value_at<T: FromValue>(values: &[Value], index: usize, name: &str) -> Result<T, ConversionError> {
    let value = values
        .get(index)
        .ok_or_else(|| ConversionError::new(index, name, "", format!("record has only {} values", values.len())))?;
    T::from_value(value).ok_or_else(|| {
        let found = value.kind().map_or("null", |k| k.name());
        ConversionError::new(
            index,
            name,
            value.to_string(),
            format!("expected {} value, got {}", T::KIND, found),
        )
    })
}

/// A record that is nothing more than its field values.
///
/// Useful when the shape is only known at runtime, or to read a file into
/// rows without declaring a struct.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DynamicRecord {
    values: Vec<Value>,
}

impl DynamicRecord {
    /// Wrap values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Field values in schema order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the record holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Unwrap the values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for DynamicRecord {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

impl Record for DynamicRecord {
    fn from_values(values: &[Value]) -> Result<Self, ConversionError> {
        Ok(Self::new(values.to_vec()))
    }

    fn to_values(&self) -> Vec<Value> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        name: String,
        score: Option<i64>,
    }

    impl Record for Pair {
        fn from_values(values: &[Value]) -> Result<Self, ConversionError> {
            Ok(Self {
                name: value_at(values, 0, "name")?,
                score: value_at(values, 1, "score")?,
            })
        }

        fn to_values(&self) -> Vec<Value> {
            vec![self.name.clone().into(), self.score.into()]
        }
    }

    // ==================== RecordType tests ====================

    #[test]
    fn test_record_type_name_is_short() {
        assert_eq!(RecordType::of::<Pair>().name(), "Pair");
        assert_eq!(RecordType::of::<DynamicRecord>().name(), "DynamicRecord");
        assert_eq!(RecordType::of::<Vec<String>>().name(), "Vec");
    }

    #[test]
    fn test_record_type_equality_ignores_name() {
        let renamed = RecordType::of::<Pair>().with_name("Scores");
        assert_eq!(renamed, RecordType::of::<Pair>());
        assert_ne!(RecordType::of::<Pair>(), RecordType::of::<DynamicRecord>());
        assert_eq!(renamed.to_string(), "Scores");
    }

    // ==================== value_at tests ====================

    #[test]
    fn test_value_at_typed() {
        let values = vec![Value::from("ann"), Value::Null];
        let pair = Pair::from_values(&values).unwrap();
        assert_eq!(pair.score, None);
        assert_eq!(pair.to_values(), values);
    }

    #[test]
    fn test_value_at_kind_mismatch() {
        let values = vec![Value::Int(3)];
        let err = value_at::<String>(&values, 0, "name").unwrap_err();
        assert_eq!(err.field_name, "name");
        assert!(err.message.contains("expected string value, got int"));
    }

    #[test]
    fn test_value_at_missing() {
        let err = value_at::<i64>(&[], 2, "n").unwrap_err();
        assert_eq!(err.field_index, 2);
    }

    #[test]
    fn test_value_at_null_into_non_option() {
        let err = value_at::<i64>(&[Value::Null], 0, "n").unwrap_err();
        assert!(err.message.contains("got null"));
    }

    // ==================== DynamicRecord tests ====================

    #[test]
    fn test_dynamic_record_roundtrip() {
        let rec = DynamicRecord::from_values(&[Value::Int(1), Value::from("x")]).unwrap();
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.get(1), Some(&Value::from("x")));
        assert_eq!(rec.record_type(), RecordType::of::<DynamicRecord>());
        assert_eq!(rec.to_values(), vec![Value::Int(1), Value::from("x")]);
    }

    #[test]
    fn test_default_hooks_keep() {
        let mut rec = DynamicRecord::default();
        assert!(rec.is_empty());
        assert_eq!(rec.after_read("line"), RecordAction::Keep);
        assert_eq!(rec.before_write(), RecordAction::Keep);
    }
}
