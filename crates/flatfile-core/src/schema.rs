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

//! Record schemas.
//!
//! A [`RecordSchema`] is the ordered list of field descriptors for one record
//! shape plus the line-level options (header and footer line counts, empty
//! and comment line handling, locale). It is built once, validated, and then
//! only read, so it can be cloned freely and shared by every engine that
//! reads or writes the shape.
//!
//! # Examples
//!
//! ```
//! use flatfile_core::{DynamicRecord, Field, RecordSchema};
//!
//! let schema = RecordSchema::delimited::<DynamicRecord>(",")
//!     .field(Field::int("id"))
//!     .field(Field::string("name").quoted('"'))
//!     .ignore_first(1)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.field_count(), 2);
//! assert_eq!(schema.field_index("name"), Some(1));
//! ```

use crate::error::SchemaError;
use crate::field::{Field, FieldDescriptor, FieldLayout};
use crate::locale::Locale;
use crate::record::{Record, RecordType};
use std::collections::HashSet;

/// How strictly fixed-width lines must match the total field width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FixedMode {
    /// Lines must be exactly as long as the record.
    #[default]
    ExactLength,
    /// Extra trailing characters are ignored.
    AllowMoreChars,
    /// The last fields may be short or missing.
    AllowLessChars,
    /// Both short and long lines are accepted.
    AllowVariableLength,
}

impl FixedMode {
    pub(crate) fn allows_more(self) -> bool {
        matches!(self, Self::AllowMoreChars | Self::AllowVariableLength)
    }

    pub(crate) fn allows_less(self) -> bool {
        matches!(self, Self::AllowLessChars | Self::AllowVariableLength)
    }
}

/// Line layout shared by every field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLayout {
    /// Fields separated by a delimiter (per-field overrides allowed).
    Delimited {
        /// Default delimiter.
        delimiter: String,
    },
    /// Fields occupying fixed character ranges.
    FixedWidth {
        /// Line length policy.
        mode: FixedMode,
    },
}

/// Validated, immutable description of one record shape.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    record_type: RecordType,
    layout: RecordLayout,
    fields: Vec<FieldDescriptor>,
    ignore_first: usize,
    ignore_last: usize,
    ignore_empty_lines: bool,
    comment_marker: Option<String>,
    locale: Locale,
}

impl RecordSchema {
    /// Start a delimited schema for records of type `T`.
    pub fn delimited<T: Record>(delimiter: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder::new(
            RecordType::of::<T>(),
            RecordLayout::Delimited {
                delimiter: delimiter.into(),
            },
        )
    }

    /// Start a fixed-width schema for records of type `T`.
    pub fn fixed<T: Record>() -> RecordSchemaBuilder {
        RecordSchemaBuilder::new(
            RecordType::of::<T>(),
            RecordLayout::FixedWidth {
                mode: FixedMode::ExactLength,
            },
        )
    }

    /// Declared record type.
    pub fn record_type(&self) -> &RecordType {
        &self.record_type
    }

    /// Line layout.
    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Field descriptors in line order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Descriptor at `index`.
    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        self.fields.get(index)
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Position of the field called `name`.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Header lines captured verbatim at the start of a source.
    pub fn ignore_first(&self) -> usize {
        self.ignore_first
    }

    /// Footer lines captured verbatim at the end of a source.
    pub fn ignore_last(&self) -> usize {
        self.ignore_last
    }

    /// Whether blank lines are skipped instead of converted.
    pub fn ignores_empty_lines(&self) -> bool {
        self.ignore_empty_lines
    }

    /// Marker introducing a comment line.
    pub fn comment_marker(&self) -> Option<&str> {
        self.comment_marker.as_deref()
    }

    /// Locale used by numeric fields.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// True if `line` is a blank or comment line that should be passed over.
    ///
    /// Blank means empty or whitespace only. A comment line starts with the
    /// marker after any leading whitespace.
    pub fn is_skippable(&self, line: &str) -> bool {
        if self.ignore_empty_lines && line.trim().is_empty() {
            return true;
        }
        match &self.comment_marker {
            Some(marker) => line.trim_start().starts_with(marker.as_str()),
            None => false,
        }
    }
}

/// Builder for [`RecordSchema`].
///
/// Field order is the order of [`field`](Self::field) calls. Validation
/// happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct RecordSchemaBuilder {
    record_type: RecordType,
    layout: RecordLayout,
    fields: Vec<Field>,
    ignore_first: usize,
    ignore_last: usize,
    ignore_empty_lines: bool,
    comment_marker: Option<String>,
    locale: Locale,
}

impl RecordSchemaBuilder {
    fn new(record_type: RecordType, layout: RecordLayout) -> Self {
        Self {
            record_type,
            layout,
            fields: Vec::new(),
            ignore_first: 0,
            ignore_last: 0,
            ignore_empty_lines: false,
            comment_marker: None,
            locale: Locale::invariant(),
        }
    }

    /// Append a field.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Append several fields.
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Display name for the record type in messages and error logs.
    pub fn type_name(mut self, name: impl Into<String>) -> Self {
        self.record_type = self.record_type.with_name(name.into());
        self
    }

    /// Number of header lines.
    pub fn ignore_first(mut self, lines: usize) -> Self {
        self.ignore_first = lines;
        self
    }

    /// Number of footer lines.
    pub fn ignore_last(mut self, lines: usize) -> Self {
        self.ignore_last = lines;
        self
    }

    /// Skip blank lines.
    pub fn ignore_empty_lines(mut self) -> Self {
        self.ignore_empty_lines = true;
        self
    }

    /// Skip lines starting with `marker`.
    pub fn comment_marker(mut self, marker: impl Into<String>) -> Self {
        self.comment_marker = Some(marker.into());
        self
    }

    /// Locale for numeric fields.
    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Line length policy (fixed-width schemas only).
    pub fn fixed_mode(mut self, mode: FixedMode) -> Self {
        if let RecordLayout::FixedWidth { mode: current } = &mut self.layout {
            *current = mode;
        }
        self
    }

    /// Validate and freeze the schema.
    pub fn build(self) -> Result<RecordSchema, SchemaError> {
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields(self.record_type.name().to_string()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name()) {
                return Err(SchemaError::DuplicateField(field.name().to_string()));
            }
            if let Some(value) = field.declared_null_value() {
                let kind = field.kind();
                if !kind.matches(value) {
                    return Err(SchemaError::NullValueKind {
                        name: field.name().to_string(),
                        expected: kind.name(),
                    });
                }
            }
        }

        let count = self.fields.len();
        let mut descriptors = Vec::with_capacity(count);
        for (index, field) in self.fields.into_iter().enumerate() {
            let layout = match &self.layout {
                RecordLayout::Delimited { delimiter } => delimited_layout(&field, delimiter)?,
                RecordLayout::FixedWidth { mode } => {
                    let width = match field.declared_width() {
                        Some(w) if w > 0 => w,
                        _ => {
                            return Err(SchemaError::MissingWidth {
                                name: field.name().to_string(),
                            })
                        }
                    };
                    let (align, pad) = field.fixed_parts();
                    FieldLayout::FixedWidth {
                        width,
                        align,
                        pad,
                        allow_short: mode.allows_less(),
                    }
                }
            };
            descriptors.push(field.into_descriptor(index, layout, self.locale));
        }

        Ok(RecordSchema {
            record_type: self.record_type,
            layout: self.layout,
            fields: descriptors,
            ignore_first: self.ignore_first,
            ignore_last: self.ignore_last,
            ignore_empty_lines: self.ignore_empty_lines,
            comment_marker: self.comment_marker,
            locale: self.locale,
        })
    }
}

fn delimited_layout(field: &Field, record_delimiter: &str) -> Result<FieldLayout, SchemaError> {
    let delimiter = field.declared_delimiter().unwrap_or(record_delimiter);
    if delimiter.is_empty() {
        return Err(SchemaError::EmptyDelimiter {
            name: field.name().to_string(),
        });
    }
    let quote = field.declared_quote();
    if let Some(q) = quote {
        if delimiter.contains(q.quote) {
            return Err(SchemaError::QuoteInDelimiter {
                name: field.name().to_string(),
                quote: q.quote,
                delimiter: delimiter.to_string(),
            });
        }
    }
    Ok(FieldLayout::Delimited {
        delimiter: delimiter.to_string(),
        quote,
    })
}
