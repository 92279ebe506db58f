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

//! Field descriptors.
//!
//! A [`Field`] is the mutable description a caller writes; the schema builder
//! turns each one into an immutable [`FieldDescriptor`] bound to its position,
//! its record layout and the schema locale. Descriptors know how to slice
//! their text out of a [`LineCursor`], how to turn that text into a
//! [`Value`] and how to render a value back into a line.
//!
//! Two layouts exist:
//!
//! - **Delimited**: scans forward to the next delimiter. With a quote char
//!   configured, a delimiter inside quotes does not end the field and a
//!   doubled quote char is an escaped quote.
//! - **Fixed width**: consumes exactly N characters, padding on write.

use crate::convert::{remove_sign_blanks, Converter, FieldConverter, DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT};
use crate::cursor::LineCursor;
use crate::error::{ConversionError, LineBoundsError, RecordError, RecordResult};
use crate::locale::Locale;
use crate::value::{Value, ValueKind};
use std::borrow::Cow;
use std::sync::Arc;

/// Characters removed by trimming unless configured otherwise.
pub const DEFAULT_TRIM_CHARS: [char; 2] = [' ', '\t'];

/// Which side of the field text to trim before conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrimMode {
    /// Keep the text as is.
    #[default]
    None,
    /// Trim leading characters.
    Left,
    /// Trim trailing characters.
    Right,
    /// Trim both ends.
    Both,
}

impl TrimMode {
    fn trims_left(self) -> bool {
        matches!(self, Self::Left | Self::Both)
    }

    fn trims_right(self) -> bool {
        matches!(self, Self::Right | Self::Both)
    }
}

/// When a delimited field is quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuoteMode {
    /// Quotes required on read and always written.
    AlwaysQuoted,
    /// Quotes optional on read, always written.
    OptionalForRead,
    /// Quotes required on read, written only when needed.
    OptionalForWrite,
    /// Quotes optional on read, written only when needed.
    #[default]
    OptionalForBoth,
}

impl QuoteMode {
    fn required_on_read(self) -> bool {
        matches!(self, Self::AlwaysQuoted | Self::OptionalForWrite)
    }

    fn always_on_write(self) -> bool {
        matches!(self, Self::AlwaysQuoted | Self::OptionalForRead)
    }
}

/// Quote convention of a delimited field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuoteOptions {
    /// Quote character; doubled inside a quoted value to escape it.
    pub quote: char,
    /// Read and write policy.
    pub mode: QuoteMode,
}

/// Alignment of a value inside a fixed-width field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    /// Pad on the right.
    #[default]
    Left,
    /// Pad on the left.
    Right,
    /// Pad both sides, extra padding on the right.
    Center,
}

/// Where a field sits in the record and how its text is delimited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLayout {
    /// Terminated by a delimiter (or the end of the line).
    Delimited {
        /// Separator written after the field and searched for on read.
        delimiter: String,
        /// Optional quoting.
        quote: Option<QuoteOptions>,
    },
    /// A fixed number of characters.
    FixedWidth {
        /// Width in characters.
        width: usize,
        /// Alignment on write.
        align: Align,
        /// Padding character on write.
        pad: char,
        /// Accept fewer than `width` characters at the end of the line.
        allow_short: bool,
    },
}

/// Caller-facing field description, consumed by the schema builder.
///
/// # Examples
///
/// ```
/// use flatfile_core::{Align, Field, TrimMode};
///
/// let id = Field::int("id").width(6).align(Align::Right).pad('0');
/// let name = Field::string("name").quoted('"').trim(TrimMode::Both);
/// let born = Field::date_with_format("born", "%d/%m/%Y").nullable();
/// # let _ = (id, name, born);
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    converter: Converter,
    width: Option<usize>,
    align: Align,
    pad: char,
    delimiter: Option<String>,
    quote: Option<QuoteOptions>,
    trim: TrimMode,
    trim_chars: Vec<char>,
    nullable: bool,
    null_value: Option<Value>,
    optional: bool,
    sign_blanks: bool,
}

impl Field {
    /// A field with an explicit converter.
    pub fn new(name: impl Into<String>, converter: Converter) -> Self {
        Self {
            name: name.into(),
            converter,
            width: None,
            align: Align::Left,
            pad: ' ',
            delimiter: None,
            quote: None,
            trim: TrimMode::None,
            trim_chars: DEFAULT_TRIM_CHARS.to_vec(),
            nullable: false,
            null_value: None,
            optional: false,
            sign_blanks: true,
        }
    }

    /// Text field.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, Converter::String)
    }

    /// Single-character field.
    pub fn char(name: impl Into<String>) -> Self {
        Self::new(name, Converter::Char)
    }

    /// Boolean field accepting common spellings.
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(
            name,
            Converter::Bool {
                true_text: None,
                false_text: None,
            },
        )
    }

    /// Integer field; right-aligned in fixed-width layouts.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, Converter::Int).align(Align::Right)
    }

    /// Floating-point field; right-aligned in fixed-width layouts.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, Converter::Float).align(Align::Right)
    }

    /// Date field using `%Y-%m-%d`.
    pub fn date(name: impl Into<String>) -> Self {
        Self::date_with_format(name, DEFAULT_DATE_FORMAT)
    }

    /// Date field with a strftime pattern.
    pub fn date_with_format(name: impl Into<String>, format: impl Into<String>) -> Self {
        Self::new(
            name,
            Converter::Date {
                format: format.into(),
            },
        )
    }

    /// Date-time field using `%Y-%m-%d %H:%M:%S`.
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::datetime_with_format(name, DEFAULT_DATETIME_FORMAT)
    }

    /// Date-time field with a strftime pattern.
    pub fn datetime_with_format(name: impl Into<String>, format: impl Into<String>) -> Self {
        Self::new(
            name,
            Converter::DateTime {
                format: format.into(),
            },
        )
    }

    /// Field converted by caller code.
    pub fn custom(name: impl Into<String>, converter: Arc<dyn FieldConverter>) -> Self {
        Self::new(name, Converter::Custom(converter))
    }

    /// Width in characters (fixed-width records).
    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    /// Alignment on write (fixed-width records).
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Padding character on write (fixed-width records).
    pub fn pad(mut self, pad: char) -> Self {
        self.pad = pad;
        self
    }

    /// Delimiter following this field, overriding the record delimiter.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    /// Quote with `quote`, optional on read and written when needed.
    pub fn quoted(self, quote: char) -> Self {
        self.quoted_with(quote, QuoteMode::OptionalForBoth)
    }

    /// Quote with an explicit mode.
    pub fn quoted_with(mut self, quote: char, mode: QuoteMode) -> Self {
        self.quote = Some(QuoteOptions { quote, mode });
        self
    }

    /// Trim before conversion.
    pub fn trim(mut self, trim: TrimMode) -> Self {
        self.trim = trim;
        self
    }

    /// Characters removed by trimming.
    pub fn trim_chars(mut self, chars: &[char]) -> Self {
        self.trim_chars = chars.to_vec();
        self
    }

    /// Empty text converts to null, and null may be assigned.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Value used when the field text is empty or the field is absent.
    pub fn null_value(mut self, value: impl Into<Value>) -> Self {
        self.null_value = Some(value.into());
        self
    }

    /// The field may be missing at the end of a delimited line.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Keep blanks between a sign and its digits (numeric fields).
    pub fn keep_sign_blanks(mut self) -> Self {
        self.sign_blanks = false;
        self
    }

    /// Custom boolean spellings, also used on write.
    pub fn bool_texts(mut self, true_text: impl Into<String>, false_text: impl Into<String>) -> Self {
        self.converter = Converter::Bool {
            true_text: Some(true_text.into()),
            false_text: Some(false_text.into()),
        };
        self
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn declared_width(&self) -> Option<usize> {
        self.width
    }

    pub(crate) fn declared_delimiter(&self) -> Option<&str> {
        self.delimiter.as_deref()
    }

    pub(crate) fn declared_quote(&self) -> Option<QuoteOptions> {
        self.quote
    }

    pub(crate) fn declared_null_value(&self) -> Option<&Value> {
        self.null_value.as_ref()
    }

    pub(crate) fn kind(&self) -> ValueKind {
        self.converter.kind()
    }

    pub(crate) fn into_descriptor(self, index: usize, layout: FieldLayout, locale: Locale) -> FieldDescriptor {
        FieldDescriptor {
            index,
            name: self.name,
            converter: self.converter,
            layout,
            trim: self.trim,
            trim_chars: self.trim_chars,
            nullable: self.nullable,
            null_value: self.null_value,
            optional: self.optional,
            sign_blanks: self.sign_blanks,
            locale,
        }
    }

    pub(crate) fn fixed_parts(&self) -> (Align, char) {
        (self.align, self.pad)
    }
}

/// Field text sliced out of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<'a> {
    /// Field text with quotes and escapes removed.
    pub text: Cow<'a, str>,
    /// The text came from a quoted value; trimming does not apply inside.
    pub quoted: bool,
    /// The line ended where the field's delimiter was expected.
    pub ended_line: bool,
}

/// Context the schema passes to each extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPosition {
    /// This is the final field of the record.
    pub is_last: bool,
    /// The following field is optional, so a missing delimiter is allowed.
    pub next_optional: bool,
}

/// Immutable description of one field, owned by its schema.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    index: usize,
    name: String,
    converter: Converter,
    layout: FieldLayout,
    trim: TrimMode,
    trim_chars: Vec<char>,
    nullable: bool,
    null_value: Option<Value>,
    optional: bool,
    sign_blanks: bool,
    locale: Locale,
}

impl FieldDescriptor {
    /// Position in the record.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Field name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic type.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.converter.kind()
    }

    /// Conversion strategy.
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Slicing rules.
    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    /// Whether null is an acceptable value.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the field may be absent at the end of a line.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Value substituted for empty text.
    pub fn null_value(&self) -> Option<&Value> {
        self.null_value.as_ref()
    }

    /// True if `value` may be stored in this field: a value of the field's
    /// kind, or null when the field is nullable.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self.kind(), value) {
            (_, Value::Null) => self.nullable,
            (ValueKind::Float, Value::Int(_)) => true,
            (kind, v) => kind.matches(v),
        }
    }

    /// Value for a field that is missing from the line.
    pub fn absent_value(&self) -> Value {
        self.null_value.clone().unwrap_or(Value::Null)
    }

    /// Slice this field's text from the cursor.
    pub fn extract<'a>(&self, cursor: &mut LineCursor<'a>, position: FieldPosition) -> RecordResult<Extracted<'a>> {
        match &self.layout {
            FieldLayout::Delimited { delimiter, quote } => {
                self.extract_delimited(cursor, delimiter, *quote, position)
            }
            FieldLayout::FixedWidth {
                width, allow_short, ..
            } => {
                let line_length = cursor.line_length();
                let text = if *allow_short {
                    cursor.advance_at_most(*width)
                } else {
                    cursor
                        .advance(*width)
                        .map_err(|o| o.for_field(self.index, &self.name, line_length))?
                };
                Ok(Extracted {
                    text: Cow::Borrowed(text),
                    quoted: false,
                    ended_line: cursor.is_at_end(),
                })
            }
        }
    }

    fn extract_delimited<'a>(
        &self,
        cursor: &mut LineCursor<'a>,
        delimiter: &str,
        quote: Option<QuoteOptions>,
        position: FieldPosition,
    ) -> RecordResult<Extracted<'a>> {
        if let Some(q) = quote {
            let mut probe = cursor.clone();
            if self.trim.trims_left() {
                probe.skip_while(|c| self.trim_chars.contains(&c));
            }
            if probe.peek_char() == Some(q.quote) {
                *cursor = probe;
                return self.extract_quoted(cursor, delimiter, q.quote, position);
            }
            if q.mode.required_on_read() {
                return Err(self.conversion_error(cursor.peek(20), "field must be quoted").into());
            }
        }

        match cursor.find(delimiter) {
            Some(len) => {
                let text = cursor.advance_bytes(len);
                if !position.is_last {
                    cursor.consume(delimiter);
                }
                Ok(Extracted {
                    text: Cow::Borrowed(text),
                    quoted: false,
                    ended_line: false,
                })
            }
            None => {
                let start = cursor.position();
                let text = cursor.take_rest();
                if !position.is_last && !position.next_optional {
                    return Err(self.missing_delimiter(delimiter, start + text.chars().count(), cursor).into());
                }
                Ok(Extracted {
                    text: Cow::Borrowed(text),
                    quoted: false,
                    ended_line: true,
                })
            }
        }
    }

    fn extract_quoted<'a>(
        &self,
        cursor: &mut LineCursor<'a>,
        delimiter: &str,
        quote: char,
        position: FieldPosition,
    ) -> RecordResult<Extracted<'a>> {
        let opening = cursor.position();
        let rest = cursor.remaining();
        let body = &rest[quote.len_utf8()..];

        let mut unescaped: Option<String> = None;
        let mut segment_start = 0;
        let mut closing = None;
        let mut chars = body.char_indices().peekable();
        while let Some((idx, c)) = chars.next() {
            if c != quote {
                continue;
            }
            if matches!(chars.peek(), Some(&(_, next)) if next == quote) {
                // Doubled quote char: keep one, skip the other.
                let buf = unescaped.get_or_insert_with(String::new);
                buf.push_str(&body[segment_start..idx]);
                buf.push(quote);
                chars.next();
                segment_start = idx + 2 * quote.len_utf8();
            } else {
                closing = Some(idx);
                break;
            }
        }

        let Some(close_idx) = closing else {
            return Err(ConversionError::new(
                self.index,
                &self.name,
                rest,
                format!("quoted field opened at position {} is not closed", opening),
            )
            .into());
        };

        let text = match unescaped {
            Some(mut buf) => {
                buf.push_str(&body[segment_start..close_idx]);
                Cow::Owned(buf)
            }
            None => Cow::Borrowed(&body[..close_idx]),
        };
        cursor.advance_bytes(quote.len_utf8() + close_idx + quote.len_utf8());

        if self.trim.trims_right() {
            cursor.skip_while(|c| self.trim_chars.contains(&c));
        }

        if cursor.is_at_end() {
            if !position.is_last && !position.next_optional {
                let at = cursor.position();
                return Err(self.missing_delimiter(delimiter, at, cursor).into());
            }
            return Ok(Extracted {
                text,
                quoted: true,
                ended_line: true,
            });
        }

        if cursor.starts_with(delimiter) {
            if !position.is_last {
                cursor.consume(delimiter);
            }
            return Ok(Extracted {
                text,
                quoted: true,
                ended_line: false,
            });
        }

        Err(self
            .conversion_error(cursor.peek(20), "unexpected text after closing quote")
            .into())
    }

    /// Convert extracted text to a value.
    ///
    /// Unquoted text of non-string fields always loses trim chars at both
    /// ends, so padding written by [`write_to`](Self::write_to) reads back.
    /// String fields follow their trim mode.
    pub fn parse(&self, extracted: &Extracted<'_>) -> Result<Value, ConversionError> {
        let text: &str = if extracted.quoted {
            &extracted.text
        } else if self.kind() == ValueKind::String {
            self.apply_trim(&extracted.text)
        } else {
            extracted.text.trim_matches(self.trim_chars.as_slice())
        };
        let text = if self.sign_blanks && self.converter.is_numeric() {
            remove_sign_blanks(text)
        } else {
            Cow::Borrowed(text)
        };

        if text.is_empty() {
            return self.empty_value();
        }

        self.converter
            .parse(&text, &self.locale)
            .map_err(|message| self.conversion_error(&text, message))
    }

    fn empty_value(&self) -> Result<Value, ConversionError> {
        if let Some(v) = &self.null_value {
            return Ok(v.clone());
        }
        match self.kind() {
            ValueKind::String => Ok(Value::String(String::new())),
            _ if self.nullable => Ok(Value::Null),
            kind => Err(self.conversion_error(
                "",
                format!(
                    "the value is empty and must be a {}; mark the field nullable or give it a null value",
                    kind
                ),
            )),
        }
    }

    /// Render a value as field text, before quoting or padding.
    pub fn format(&self, value: &Value) -> Result<String, ConversionError> {
        if value.is_null() {
            return Ok(String::new());
        }
        self.converter
            .format(value, &self.locale)
            .map_err(|message| self.conversion_error(&value.to_string(), message))
    }

    /// Append formatted text to a line, adding quotes, padding or the
    /// trailing delimiter as the layout requires.
    pub fn write_to(&self, text: &str, out: &mut String, is_last: bool) {
        match &self.layout {
            FieldLayout::Delimited { delimiter, quote } => {
                match quote {
                    Some(q) if q.mode.always_on_write() || needs_quotes(text, delimiter, q.quote) => {
                        push_quoted(out, text, q.quote);
                    }
                    _ => out.push_str(text),
                }
                if !is_last {
                    out.push_str(delimiter);
                }
            }
            FieldLayout::FixedWidth {
                width, align, pad, ..
            } => push_padded(out, text, *width, *align, *pad),
        }
    }

    fn apply_trim<'t>(&self, text: &'t str) -> &'t str {
        let chars = self.trim_chars.as_slice();
        match self.trim {
            TrimMode::None => text,
            TrimMode::Left => text.trim_start_matches(chars),
            TrimMode::Right => text.trim_end_matches(chars),
            TrimMode::Both => text.trim_matches(chars),
        }
    }

    fn conversion_error(&self, value: &str, message: impl Into<String>) -> ConversionError {
        ConversionError::new(self.index, &self.name, value, message)
    }

    fn missing_delimiter(&self, delimiter: &str, position: usize, cursor: &LineCursor<'_>) -> LineBoundsError {
        LineBoundsError {
            field_index: self.index,
            field_name: self.name.clone(),
            position,
            line_length: cursor.line_length(),
            message: format!(
                "delimiter '{}' not found after the field (the line has fewer fields, the delimiter is wrong or the next field must be optional)",
                delimiter
            ),
        }
    }
}

fn needs_quotes(text: &str, delimiter: &str, quote: char) -> bool {
    text.contains(delimiter)
        || text.contains(quote)
        || text.contains(['\r', '\n'])
        || text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
}

fn push_quoted(out: &mut String, text: &str, quote: char) {
    out.push(quote);
    for c in text.chars() {
        if c == quote {
            out.push(quote);
        }
        out.push(c);
    }
    out.push(quote);
}

fn push_padded(out: &mut String, text: &str, width: usize, align: Align, pad: char) {
    let len = text.chars().count();
    if len >= width {
        out.extend(text.chars().take(width));
        return;
    }
    let gap = width - len;
    let (left, right) = match align {
        Align::Left => (0, gap),
        Align::Right => (gap, 0),
        Align::Center => (gap / 2, gap - gap / 2),
    };
    out.extend(std::iter::repeat(pad).take(left));
    out.push_str(text);
    out.extend(std::iter::repeat(pad).take(right));
}

/// Build the error raised when a field fails anywhere in a record.
pub(crate) fn line_bounds(
    field: &FieldDescriptor,
    cursor: &LineCursor<'_>,
    message: impl Into<String>,
) -> RecordError {
    LineBoundsError {
        field_index: field.index(),
        field_name: field.name().to_string(),
        position: cursor.position(),
        line_length: cursor.line_length(),
        message: message.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIDDLE: FieldPosition = FieldPosition {
        is_last: false,
        next_optional: false,
    };
    const LAST: FieldPosition = FieldPosition {
        is_last: true,
        next_optional: false,
    };

    fn delimited(field: Field) -> FieldDescriptor {
        let layout = FieldLayout::Delimited {
            delimiter: field.declared_delimiter().unwrap_or(",").to_string(),
            quote: field.declared_quote(),
        };
        field.into_descriptor(0, layout, Locale::invariant())
    }

    fn fixed(field: Field, allow_short: bool) -> FieldDescriptor {
        let (align, pad) = field.fixed_parts();
        let layout = FieldLayout::FixedWidth {
            width: field.declared_width().unwrap_or(0),
            align,
            pad,
            allow_short,
        };
        field.into_descriptor(0, layout, Locale::invariant())
    }

    // ==================== Delimited extraction ====================

    #[test]
    fn test_delimited_consumes_delimiter() {
        let field = delimited(Field::string("a"));
        let mut cursor = LineCursor::new("one,two");
        let ex = field.extract(&mut cursor, MIDDLE).unwrap();
        assert_eq!(ex.text, "one");
        assert_eq!(cursor.remaining(), "two");
    }

    #[test]
    fn test_delimited_last_stops_at_delimiter() {
        let field = delimited(Field::string("a"));
        let mut cursor = LineCursor::new("x,y");
        let ex = field.extract(&mut cursor, LAST).unwrap();
        assert_eq!(ex.text, "x");
        assert_eq!(cursor.remaining(), ",y");
    }

    #[test]
    fn test_delimited_missing_delimiter_is_bounds_error() {
        let field = delimited(Field::string("a"));
        let mut cursor = LineCursor::new("lonely");
        let err = field.extract(&mut cursor, MIDDLE).unwrap_err();
        assert!(matches!(err, RecordError::LineBounds(ref e) if e.position == 6));
    }

    #[test]
    fn test_delimited_missing_delimiter_ok_when_next_optional() {
        let field = delimited(Field::string("a"));
        let mut cursor = LineCursor::new("lonely");
        let position = FieldPosition {
            is_last: false,
            next_optional: true,
        };
        let ex = field.extract(&mut cursor, position).unwrap();
        assert!(ex.ended_line);
        assert_eq!(ex.text, "lonely");
    }

    #[test]
    fn test_multichar_delimiter() {
        let field = delimited(Field::string("a").delimiter("||"));
        let mut cursor = LineCursor::new("a|b||c");
        let ex = field.extract(&mut cursor, MIDDLE).unwrap();
        assert_eq!(ex.text, "a|b");
        assert_eq!(cursor.remaining(), "c");
    }

    // ==================== Quoted extraction ====================

    #[test]
    fn test_quoted_delimiter_inside_quotes() {
        let field = delimited(Field::string("a").quoted('"'));
        let mut cursor = LineCursor::new("\"a,b\",c");
        let ex = field.extract(&mut cursor, MIDDLE).unwrap();
        assert_eq!(ex.text, "a,b");
        assert!(ex.quoted);
        assert_eq!(cursor.remaining(), "c");
    }

    #[test]
    fn test_quoted_doubled_quote_unescaped() {
        let field = delimited(Field::string("a").quoted('"'));
        let mut cursor = LineCursor::new("\"say \"\"hi\"\"\"");
        let ex = field.extract(&mut cursor, LAST).unwrap();
        assert_eq!(ex.text, "say \"hi\"");
        assert!(matches!(ex.text, Cow::Owned(_)));
    }

    #[test]
    fn test_quoted_unterminated() {
        let field = delimited(Field::string("a").quoted('"'));
        let mut cursor = LineCursor::new("\"open,ended");
        let err = field.extract(&mut cursor, MIDDLE).unwrap_err();
        match err {
            RecordError::Conversion(e) => assert!(e.message.contains("not closed")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_quoted_required_on_read() {
        let field = delimited(Field::string("a").quoted_with('\'', QuoteMode::AlwaysQuoted));
        let mut cursor = LineCursor::new("bare,x");
        assert!(field.extract(&mut cursor, MIDDLE).is_err());
    }

    #[test]
    fn test_quoted_optional_accepts_bare() {
        let field = delimited(Field::string("a").quoted('"'));
        let mut cursor = LineCursor::new("bare,x");
        assert_eq!(field.extract(&mut cursor, MIDDLE).unwrap().text, "bare");
    }

    #[test]
    fn test_quoted_leading_blanks_with_trim() {
        let field = delimited(Field::string("a").quoted('"').trim(TrimMode::Both));
        let mut cursor = LineCursor::new("  \" padded \"  ,next");
        let ex = field.extract(&mut cursor, MIDDLE).unwrap();
        assert_eq!(ex.text, " padded ");
        assert_eq!(cursor.remaining(), "next");
    }

    #[test]
    fn test_text_after_closing_quote() {
        let field = delimited(Field::string("a").quoted('"'));
        let mut cursor = LineCursor::new("\"ab\"cd,x");
        assert!(field.extract(&mut cursor, MIDDLE).is_err());
    }

    // ==================== Fixed-width extraction ====================

    #[test]
    fn test_fixed_takes_width() {
        let field = fixed(Field::string("a").width(3), false);
        let mut cursor = LineCursor::new("abcdef");
        assert_eq!(field.extract(&mut cursor, MIDDLE).unwrap().text, "abc");
        assert_eq!(cursor.remaining(), "def");
    }

    #[test]
    fn test_fixed_short_line_fails() {
        let field = fixed(Field::string("zip").width(5), false);
        let mut cursor = LineCursor::new("123");
        match field.extract(&mut cursor, LAST).unwrap_err() {
            RecordError::LineBounds(e) => {
                assert_eq!(e.field_name, "zip");
                assert_eq!(e.position, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fixed_short_line_tolerated() {
        let field = fixed(Field::string("zip").width(5), true);
        let mut cursor = LineCursor::new("123");
        assert_eq!(field.extract(&mut cursor, LAST).unwrap().text, "123");
    }

    // ==================== Parse ====================

    #[test]
    fn test_parse_trims_and_converts() {
        let field = delimited(Field::int("n").trim(TrimMode::Both));
        let ex = Extracted {
            text: Cow::Borrowed("  42 "),
            quoted: false,
            ended_line: false,
        };
        assert_eq!(field.parse(&ex), Ok(Value::Int(42)));
    }

    #[test]
    fn test_parse_sign_blanks() {
        let field = delimited(Field::int("n").trim(TrimMode::Right));
        let ex = Extracted {
            text: Cow::Borrowed(" -  5 "),
            quoted: false,
            ended_line: false,
        };
        assert_eq!(field.parse(&ex), Ok(Value::Int(-5)));
    }

    #[test]
    fn test_parse_empty_non_nullable_fails() {
        let field = delimited(Field::int("n"));
        let ex = Extracted {
            text: Cow::Borrowed(""),
            quoted: false,
            ended_line: false,
        };
        let err = field.parse(&ex).unwrap_err();
        assert!(err.message.contains("empty"));
    }

    #[test]
    fn test_parse_empty_uses_null_value_then_nullable() {
        let ex = Extracted {
            text: Cow::Borrowed(""),
            quoted: false,
            ended_line: false,
        };
        let with_default = delimited(Field::int("n").null_value(-1i64));
        assert_eq!(with_default.parse(&ex), Ok(Value::Int(-1)));
        let nullable = delimited(Field::int("n").nullable());
        assert_eq!(nullable.parse(&ex), Ok(Value::Null));
        let text = delimited(Field::string("s"));
        assert_eq!(text.parse(&ex), Ok(Value::String(String::new())));
    }

    #[test]
    fn test_parse_quoted_skips_trim() {
        let field = delimited(Field::string("s").trim(TrimMode::Both));
        let ex = Extracted {
            text: Cow::Borrowed(" keep "),
            quoted: true,
            ended_line: false,
        };
        assert_eq!(field.parse(&ex), Ok(Value::from(" keep ")));
    }

    #[test]
    fn test_parse_error_carries_text() {
        let field = delimited(Field::float("price"));
        let ex = Extracted {
            text: Cow::Borrowed("1.2.3"),
            quoted: false,
            ended_line: false,
        };
        let err = field.parse(&ex).unwrap_err();
        assert_eq!(err.value, "1.2.3");
        assert_eq!(err.field_name, "price");
    }

    #[test]
    fn test_parse_padded_non_string_without_trim_mode() {
        let padded = |text: &'static str| Extracted {
            text: Cow::Borrowed(text),
            quoted: false,
            ended_line: false,
        };
        let date = fixed(Field::date("born").width(12), false);
        assert_eq!(
            date.parse(&padded("2021-03-04  ")),
            Ok(Value::Date(chrono::NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()))
        );
        let int = fixed(Field::int("qty").width(5).align(Align::Left), false);
        assert_eq!(int.parse(&padded("42   ")), Ok(Value::Int(42)));
        let flag = fixed(Field::bool("flag").width(6), false);
        assert_eq!(flag.parse(&padded("true  ")), Ok(Value::Bool(true)));
        let grade = fixed(Field::char("grade").width(3), false);
        assert_eq!(grade.parse(&padded("B  ")), Ok(Value::Char('B')));
        let delimited_int = delimited(Field::int("n"));
        assert_eq!(delimited_int.parse(&padded(" 5 ")), Ok(Value::Int(5)));
    }

    #[test]
    fn test_parse_string_keeps_padding_without_trim_mode() {
        let field = fixed(Field::string("name").width(6), false);
        let ex = Extracted {
            text: Cow::Borrowed("ab    "),
            quoted: false,
            ended_line: false,
        };
        assert_eq!(field.parse(&ex), Ok(Value::from("ab    ")));
    }

    // ==================== Write ====================

    #[test]
    fn test_write_quotes_when_needed() {
        let field = delimited(Field::string("s").quoted('"'));
        let mut out = String::new();
        field.write_to("a,b", &mut out, false);
        field.write_to("plain", &mut out, true);
        assert_eq!(out, "\"a,b\",plain");
    }

    #[test]
    fn test_write_always_quoted_escapes() {
        let field = delimited(Field::string("s").quoted_with('"', QuoteMode::AlwaysQuoted));
        let mut out = String::new();
        field.write_to("say \"hi\"", &mut out, true);
        assert_eq!(out, "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_write_fixed_alignment() {
        let right = fixed(Field::int("n").width(5).pad('0'), false);
        let left = fixed(Field::string("s").width(4), false);
        let center = fixed(Field::string("c").width(6).align(Align::Center).pad('*'), false);
        let mut out = String::new();
        right.write_to("42", &mut out, false);
        left.write_to("ab", &mut out, false);
        center.write_to("ab", &mut out, true);
        assert_eq!(out, "00042ab  **ab**");
    }

    #[test]
    fn test_write_fixed_truncates() {
        let field = fixed(Field::string("s").width(3), false);
        let mut out = String::new();
        field.write_to("abcdef", &mut out, true);
        assert_eq!(out, "abc");
    }

    #[test]
    fn test_format_null_is_empty() {
        let field = delimited(Field::int("n").nullable());
        assert_eq!(field.format(&Value::Null), Ok(String::new()));
    }

    #[test]
    fn test_accepts() {
        let field = delimited(Field::int("n"));
        assert!(field.accepts(&Value::Int(1)));
        assert!(!field.accepts(&Value::Null));
        assert!(!field.accepts(&Value::from("1")));
        let nullable = delimited(Field::int("n").nullable());
        assert!(nullable.accepts(&Value::Null));
    }
}
