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

//! Record hooks.
//!
//! Hooks are closures registered on the engine and called around each
//! record. Their return value decides what happens next:
//!
//! | Hook | Sees | Returns |
//! |------|------|---------|
//! | before read | raw line, line number | [`LineAction`]: keep, skip, or replace the line |
//! | after read | raw line, record (mutable), whether the line was replaced | [`RecordAction`] |
//! | before write | record, line number | [`RecordAction`] |
//! | after write | formatted line, record | [`LineAction`]: keep, skip, or replace the line |
//!
//! A skipped record is neither an error nor counted as output; the engine
//! moves on to the next line (or returns from the write).

pub use flatfile_core::RecordAction;

/// Outcome of a hook that sees a line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LineAction {
    /// Use the line as is.
    #[default]
    Keep,
    /// Drop the line and its record.
    Skip,
    /// Use this text instead.
    Replace(String),
}

/// A line is about to be converted.
#[derive(Debug)]
pub struct BeforeReadEvent<'a> {
    /// The raw line.
    pub line: &'a str,
    /// Absolute line number.
    pub line_number: usize,
}

/// A line was converted into a record.
#[derive(Debug)]
pub struct AfterReadEvent<'a, T> {
    /// The raw line as read, before any replacement.
    pub line: &'a str,
    /// The new record; changes are kept.
    pub record: &'a mut T,
    /// A before-read hook replaced the line.
    pub line_changed: bool,
    /// Absolute line number.
    pub line_number: usize,
}

/// A record is about to be formatted.
#[derive(Debug)]
pub struct BeforeWriteEvent<'a, T> {
    /// The record.
    pub record: &'a T,
    /// Output line number.
    pub line_number: usize,
}

/// A record was formatted and is about to be written.
#[derive(Debug)]
pub struct AfterWriteEvent<'a, T> {
    /// The formatted line, without terminator.
    pub line: &'a str,
    /// The record.
    pub record: &'a T,
    /// Output line number.
    pub line_number: usize,
}

pub(crate) type BeforeReadHook = Box<dyn FnMut(&BeforeReadEvent<'_>) -> LineAction>;
pub(crate) type AfterReadHook<T> = Box<dyn FnMut(&mut AfterReadEvent<'_, T>) -> RecordAction>;
pub(crate) type BeforeWriteHook<T> = Box<dyn FnMut(&BeforeWriteEvent<'_, T>) -> RecordAction>;
pub(crate) type AfterWriteHook<T> = Box<dyn FnMut(&AfterWriteEvent<'_, T>) -> LineAction>;

/// Registered hooks of one engine.
pub(crate) struct Hooks<T> {
    pub(crate) before_read: Option<BeforeReadHook>,
    pub(crate) after_read: Option<AfterReadHook<T>>,
    pub(crate) before_write: Option<BeforeWriteHook<T>>,
    pub(crate) after_write: Option<AfterWriteHook<T>>,
}

impl<T> Default for Hooks<T> {
    fn default() -> Self {
        Self {
            before_read: None,
            after_read: None,
            before_write: None,
            after_write: None,
        }
    }
}

impl<T> Hooks<T> {
    pub(crate) fn before_read(&mut self, line: &str, line_number: usize) -> LineAction {
        match self.before_read.as_mut() {
            Some(hook) => hook(&BeforeReadEvent { line, line_number }),
            None => LineAction::Keep,
        }
    }

    pub(crate) fn after_read(&mut self, line: &str, record: &mut T, line_changed: bool, line_number: usize) -> RecordAction {
        match self.after_read.as_mut() {
            Some(hook) => hook(&mut AfterReadEvent {
                line,
                record,
                line_changed,
                line_number,
            }),
            None => RecordAction::Keep,
        }
    }

    pub(crate) fn before_write(&mut self, record: &T, line_number: usize) -> RecordAction {
        match self.before_write.as_mut() {
            Some(hook) => hook(&BeforeWriteEvent { record, line_number }),
            None => RecordAction::Keep,
        }
    }

    pub(crate) fn after_write(&mut self, line: &str, record: &T, line_number: usize) -> LineAction {
        match self.after_write.as_mut() {
            Some(hook) => hook(&AfterWriteEvent {
                line,
                record,
                line_number,
            }),
            None => LineAction::Keep,
        }
    }
}
