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

//! Error types for record conversion and schema construction.
//!
//! Conversion failures carry the field index, the field name and the
//! offending text so that a caller can report exactly where a line went
//! wrong. Line numbers are attached one level up, by the streaming engine,
//! which is the only component that knows them.
//!
//! # Error Categories
//!
//! - [`ConversionError`]: field text could not be turned into a value, or a
//!   value could not be formatted for its field
//! - [`LineBoundsError`]: the line ran out before a field could be sliced
//! - [`SchemaError`]: the schema description itself is invalid

use thiserror::Error;

/// A field value could not be converted.
///
/// # Examples
///
/// ```
/// use flatfile_core::ConversionError;
///
/// let err = ConversionError::new(2, "age", "abc", "invalid digit found in string");
/// assert_eq!(
///     err.to_string(),
///     "Error converting 'abc' for field 2 'age': invalid digit found in string"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error converting '{value}' for field {field_index} '{field_name}': {message}")]
pub struct ConversionError {
    /// Zero-based index of the field in the schema.
    pub field_index: usize,
    /// Name of the field.
    pub field_name: String,
    /// The text (or formatted value) that failed.
    pub value: String,
    /// Detailed error message.
    pub message: String,
}

impl ConversionError {
    /// Create a conversion error.
    pub fn new(
        field_index: usize,
        field_name: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field_index,
            field_name: field_name.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

/// The line ended (or had leftover text) where a field boundary was expected.
///
/// `position` is a zero-based character offset into the line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Line bounds error at position {position} for field {field_index} '{field_name}': {message} (line length {line_length})")]
pub struct LineBoundsError {
    /// Zero-based index of the field being extracted.
    pub field_index: usize,
    /// Name of the field.
    pub field_name: String,
    /// Character offset where extraction failed.
    pub position: usize,
    /// Length of the line in characters.
    pub line_length: usize,
    /// Detailed error message.
    pub message: String,
}

/// Any failure converting one line to a record or one record to a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Malformed field data.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Line too short or too long for the schema.
    #[error(transparent)]
    LineBounds(#[from] LineBoundsError),
}

impl RecordError {
    /// Index of the field that failed.
    pub fn field_index(&self) -> usize {
        match self {
            Self::Conversion(e) => e.field_index,
            Self::LineBounds(e) => e.field_index,
        }
    }

    /// Name of the field that failed.
    pub fn field_name(&self) -> &str {
        match self {
            Self::Conversion(e) => &e.field_name,
            Self::LineBounds(e) => &e.field_name,
        }
    }
}

/// Invalid schema description, reported when the schema is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Schema declares no fields.
    #[error("Record type '{0}' has no fields")]
    NoFields(String),

    /// Two fields share a name.
    #[error("Duplicate field name '{0}'")]
    DuplicateField(String),

    /// Fixed-width field without a usable width.
    #[error("Fixed-width field '{name}' needs a width greater than zero")]
    MissingWidth {
        /// Name of the field.
        name: String,
    },

    /// Empty delimiter string.
    #[error("Field '{name}' has an empty delimiter")]
    EmptyDelimiter {
        /// Name of the field.
        name: String,
    },

    /// Quote character also appears in the delimiter.
    #[error("Field '{name}' uses quote char '{quote}' inside its delimiter '{delimiter}'")]
    QuoteInDelimiter {
        /// Name of the field.
        name: String,
        /// Configured quote character.
        quote: char,
        /// Configured delimiter.
        delimiter: String,
    },

    /// `null_value` does not match the field kind.
    #[error("Null value for field '{name}' must be a {expected}")]
    NullValueKind {
        /// Name of the field.
        name: String,
        /// Kind of the field.
        expected: &'static str,
    },
}

/// Result type for record conversion.
pub type RecordResult<T> = Result<T, RecordError>;
