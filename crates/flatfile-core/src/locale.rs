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

//! Number formatting conventions.
//!
//! A [`Locale`] is passed explicitly into schema construction and reaches
//! every numeric converter from there. There is no process-wide default.

use std::borrow::Cow;

/// Decimal and digit-group separators used by numeric fields.
///
/// # Examples
///
/// ```
/// use flatfile_core::Locale;
///
/// let de = Locale::new(',', Some('.'));
/// assert_eq!(de.normalize_number("1.234,5"), "1234.5");
/// assert_eq!(de.localize_number("1234.5".to_string()), "1234,5");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Locale {
    /// Separator between integer and fractional digits.
    pub decimal_separator: char,
    /// Optional thousands separator, stripped on read and never written.
    pub group_separator: Option<char>,
}

impl Locale {
    /// Invariant conventions: `.` as decimal separator, no grouping.
    pub const fn invariant() -> Self {
        Self {
            decimal_separator: '.',
            group_separator: None,
        }
    }

    /// Custom separators.
    pub const fn new(decimal_separator: char, group_separator: Option<char>) -> Self {
        Self {
            decimal_separator,
            group_separator,
        }
    }

    /// Rewrite locale-formatted digits into the form Rust's parsers accept.
    pub fn normalize_number<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let needs_work = self.group_separator.is_some_and(|g| text.contains(g))
            || (self.decimal_separator != '.' && text.contains(self.decimal_separator));
        if !needs_work {
            return Cow::Borrowed(text);
        }

        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if Some(c) == self.group_separator {
                continue;
            }
            if c == self.decimal_separator {
                out.push('.');
            } else {
                out.push(c);
            }
        }
        Cow::Owned(out)
    }

    /// Rewrite a Rust-formatted number with this locale's decimal separator.
    pub fn localize_number(&self, formatted: String) -> String {
        if self.decimal_separator == '.' {
            formatted
        } else {
            formatted.replace('.', &self.decimal_separator.to_string())
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::invariant()
    }
}
