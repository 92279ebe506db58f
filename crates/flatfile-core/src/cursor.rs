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

//! Parsing position over one raw line.
//!
//! A [`LineCursor`] borrows the line text and tracks a byte offset into it.
//! Field descriptors consume the line through the cursor in schema order;
//! the text itself is never modified. Positions reported in errors are
//! character offsets, which is what a person counting columns expects.

use crate::error::LineBoundsError;

/// A request to read past the end of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overrun {
    /// Character position where the read started.
    pub position: usize,
    /// Characters requested.
    pub requested: usize,
    /// Characters that were left.
    pub available: usize,
}

impl Overrun {
    /// Attach field context.
    pub fn for_field(self, field_index: usize, field_name: &str, line_length: usize) -> LineBoundsError {
        LineBoundsError {
            field_index,
            field_name: field_name.to_string(),
            position: self.position,
            line_length,
            message: format!(
                "expected {} characters, found {}",
                self.requested, self.available
            ),
        }
    }
}

/// Mutable read position over an immutable line.
///
/// # Examples
///
/// ```
/// use flatfile_core::LineCursor;
///
/// let mut cursor = LineCursor::new("ABCDEF");
/// assert_eq!(cursor.peek(2), "AB");
/// assert_eq!(cursor.advance(3).unwrap(), "ABC");
/// assert_eq!(cursor.remaining(), "DEF");
/// assert!(cursor.advance(4).is_err());
/// assert_eq!(cursor.position(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    line: &'a str,
    offset: usize,
    line_number: usize,
}

impl<'a> LineCursor<'a> {
    /// Cursor at the start of `line`.
    pub fn new(line: &'a str) -> Self {
        Self::with_line_number(line, 0)
    }

    /// Cursor that remembers which source line it walks, for diagnostics.
    pub fn with_line_number(line: &'a str, line_number: usize) -> Self {
        Self {
            line,
            offset: 0,
            line_number,
        }
    }

    /// The whole line.
    #[inline]
    pub fn line(&self) -> &'a str {
        self.line
    }

    /// Source line number, 0 when unknown.
    #[inline]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Current byte offset.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Current character position.
    pub fn position(&self) -> usize {
        self.line[..self.offset].chars().count()
    }

    /// Line length in characters.
    pub fn line_length(&self) -> usize {
        self.line.chars().count()
    }

    /// Text not yet consumed.
    #[inline]
    pub fn remaining(&self) -> &'a str {
        &self.line[self.offset..]
    }

    /// True once everything has been consumed.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.offset >= self.line.len()
    }

    /// Up to `n` characters ahead, without consuming them.
    pub fn peek(&self, n: usize) -> &'a str {
        let rest = self.remaining();
        &rest[..byte_len_of_chars(rest, n)]
    }

    /// Consume exactly `n` characters.
    pub fn advance(&mut self, n: usize) -> Result<&'a str, Overrun> {
        let rest = self.remaining();
        let len = byte_len_of_chars(rest, n);
        let taken = &rest[..len];
        let available = taken.chars().count();
        if available < n {
            return Err(Overrun {
                position: self.position(),
                requested: n,
                available: rest.chars().count(),
            });
        }
        self.offset += len;
        Ok(taken)
    }

    /// Consume up to `n` characters.
    pub fn advance_at_most(&mut self, n: usize) -> &'a str {
        let rest = self.remaining();
        let len = byte_len_of_chars(rest, n);
        self.offset += len;
        &rest[..len]
    }

    /// Consume the rest of the line.
    pub fn take_rest(&mut self) -> &'a str {
        let rest = self.remaining();
        self.offset = self.line.len();
        rest
    }

    /// Byte offset of `pattern` relative to the current position.
    pub fn find(&self, pattern: &str) -> Option<usize> {
        memchr::memmem::find(self.remaining().as_bytes(), pattern.as_bytes())
    }

    /// True if the unconsumed text starts with `pattern`.
    #[inline]
    pub fn starts_with(&self, pattern: &str) -> bool {
        self.remaining().starts_with(pattern)
    }

    /// Consume `pattern` if it comes next.
    pub fn consume(&mut self, pattern: &str) -> bool {
        if self.starts_with(pattern) {
            self.offset += pattern.len();
            true
        } else {
            false
        }
    }

    /// Consume characters while `pred` holds; returns how many.
    pub fn skip_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        for (idx, c) in self.remaining().char_indices() {
            if !pred(c) {
                self.offset += idx;
                return count;
            }
            count += 1;
        }
        self.offset = self.line.len();
        count
    }

    /// Consume `len` bytes. `len` must land on a char boundary, which holds
    /// for offsets obtained from [`find`](Self::find).
    pub(crate) fn advance_bytes(&mut self, len: usize) -> &'a str {
        let rest = self.remaining();
        let end = len.min(rest.len());
        self.offset += end;
        &rest[..end]
    }

    /// Next character without consuming it.
    #[inline]
    pub(crate) fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }
}

/// Byte length of the first `n` characters of `s` (or all of `s`).
fn byte_len_of_chars(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(idx, _)| idx)
}
