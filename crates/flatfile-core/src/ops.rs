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

//! Conversion between lines and records.
//!
//! Fields are always processed in schema order. The first field that fails
//! aborts the whole line: the caller gets a [`RecordError`] naming the field
//! and nothing is produced. Deciding whether that failure stops a session is
//! up to the caller.

use crate::cursor::LineCursor;
use crate::error::{ConversionError, RecordError, RecordResult};
use crate::field::{line_bounds, FieldPosition};
use crate::record::Record;
use crate::schema::{RecordLayout, RecordSchema};
use crate::value::Value;

impl RecordSchema {
    /// Convert the line under `cursor` into field values.
    ///
    /// `values` is cleared first and holds one value per field on success.
    /// On failure its content is unspecified.
    pub fn string_to_values(&self, cursor: &mut LineCursor<'_>, values: &mut Vec<Value>) -> RecordResult<()> {
        values.clear();
        values.reserve(self.field_count());

        let fields = self.fields();
        let last = fields.len().saturating_sub(1);
        let (delimited, allows_less) = match self.layout() {
            RecordLayout::Delimited { .. } => (true, false),
            RecordLayout::FixedWidth { mode } => (false, mode.allows_less()),
        };

        let mut exhausted = false;
        for (i, field) in fields.iter().enumerate() {
            if exhausted || (allows_less && cursor.is_at_end()) {
                if field.is_optional() || allows_less {
                    values.push(field.absent_value());
                    continue;
                }
                return Err(line_bounds(field, cursor, "the line ended before this field"));
            }

            let position = FieldPosition {
                is_last: i == last,
                next_optional: fields.get(i + 1).is_some_and(|f| f.is_optional()),
            };
            let extracted = field.extract(cursor, position)?;
            exhausted = delimited && extracted.ended_line;
            values.push(field.parse(&extracted)?);
        }

        self.check_trailing(cursor)
    }

    fn check_trailing(&self, cursor: &LineCursor<'_>) -> RecordResult<()> {
        if cursor.is_at_end() {
            return Ok(());
        }
        let Some(field) = self.fields().last() else {
            return Ok(());
        };
        match self.layout() {
            RecordLayout::Delimited { .. } => Err(line_bounds(
                field,
                cursor,
                format!(
                    "delimiter found after the last field, '{}' remains (the line has more fields than the record)",
                    cursor.remaining()
                ),
            )),
            RecordLayout::FixedWidth { mode } if !mode.allows_more() => {
                let extra = cursor.line_length() - cursor.position();
                Err(line_bounds(
                    field,
                    cursor,
                    format!("the line is {} characters longer than the record", extra),
                ))
            }
            RecordLayout::FixedWidth { .. } => Ok(()),
        }
    }

    /// Convert a line into a typed record, leaving the field values in
    /// `values` for indexed access.
    pub fn string_to_record<T: Record>(&self, cursor: &mut LineCursor<'_>, values: &mut Vec<Value>) -> RecordResult<T> {
        self.string_to_values(cursor, values)?;
        T::from_values(values).map_err(RecordError::from)
    }

    /// Convert a single line into a typed record.
    ///
    /// # Examples
    ///
    /// ```
    /// use flatfile_core::{DynamicRecord, Field, RecordSchema, Value};
    ///
    /// let schema = RecordSchema::delimited::<DynamicRecord>(",")
    ///     .field(Field::string("name").quoted('"'))
    ///     .field(Field::int("qty"))
    ///     .build()
    ///     .unwrap();
    ///
    /// let rec: DynamicRecord = schema.parse_line("\"nuts, bolts\",12").unwrap();
    /// assert_eq!(rec.values(), &[Value::from("nuts, bolts"), Value::Int(12)]);
    /// ```
    pub fn parse_line<T: Record>(&self, line: &str) -> RecordResult<T> {
        let mut values = Vec::new();
        self.string_to_record(&mut LineCursor::new(line), &mut values)
    }

    /// Field values of `record` in schema order.
    pub fn record_to_values<T: Record>(&self, record: &T) -> Vec<Value> {
        record.to_values()
    }

    /// Format `record` as one line, without a line terminator.
    pub fn record_to_string<T: Record>(&self, record: &T) -> RecordResult<String> {
        self.values_to_string(&record.to_values())
    }

    /// Format field values as one line, without a line terminator.
    ///
    /// Fails if the number of values differs from the number of fields or a
    /// value cannot be formatted for its field.
    pub fn values_to_string(&self, values: &[Value]) -> RecordResult<String> {
        let fields = self.fields();
        if values.len() != fields.len() {
            let index = values.len().min(fields.len().saturating_sub(1));
            let name = fields.get(index).map_or("", |f| f.name());
            return Err(ConversionError::new(
                index,
                name,
                "",
                format!("expected {} values, got {}", fields.len(), values.len()),
            )
            .into());
        }

        let last = fields.len() - 1;
        let mut line = String::new();
        for (i, (field, value)) in fields.iter().zip(values).enumerate() {
            let text = field.format(value)?;
            field.write_to(&text, &mut line, i == last);
        }
        Ok(line)
    }

    /// Build a typed record from field values.
    pub fn values_to_record<T: Record>(&self, values: &[Value]) -> RecordResult<T> {
        T::from_values(values).map_err(RecordError::from)
    }
}
