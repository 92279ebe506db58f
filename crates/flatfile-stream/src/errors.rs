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

//! Error policy and the error log.
//!
//! The engine hands every failed record to its [`ErrorManager`], which
//! either gives it back to be raised ([`ErrorMode::ThrowOnError`]), drops
//! it ([`ErrorMode::IgnoreAndContinue`]) or appends it to the log
//! ([`ErrorMode::SaveAndContinue`]). The log keeps encounter order and can
//! be inspected at any time, including mid-stream, or saved as a
//! `|`-delimited file and loaded back.

use crate::engine::StreamingEngine;
use crate::error::EngineResult;
use flatfile_core::{value_at, ConversionError, Field, Record, RecordError, RecordSchema, SchemaError, Value};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

/// How a record failure is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Raise the first failure to the caller.
    #[default]
    ThrowOnError,
    /// Drop failed records silently.
    IgnoreAndContinue,
    /// Log failed records and keep going.
    SaveAndContinue,
}

/// Cause of a failed record.
#[derive(Debug, Clone, Error)]
pub enum RecordFailure {
    /// The line or record did not convert.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// The formatted line could not be written.
    #[error("write failed: {0}")]
    Io(Arc<io::Error>),
}

impl From<io::Error> for RecordFailure {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<ConversionError> for RecordFailure {
    fn from(err: ConversionError) -> Self {
        Self::Record(err.into())
    }
}

/// One failed record.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    /// Absolute line number (1-based).
    pub line_number: usize,
    /// The raw line as read, or the formatted line when writing.
    pub record_text: String,
    /// Name of the record type.
    pub record_type: String,
    /// What went wrong.
    pub cause: RecordFailure,
}

/// Error policy plus the log of saved failures.
#[derive(Debug, Clone, Default)]
pub struct ErrorManager {
    mode: ErrorMode,
    errors: Vec<ErrorRecord>,
}

impl ErrorManager {
    /// Create a manager with `mode` and an empty log.
    pub fn new(mode: ErrorMode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
        }
    }

    /// Active mode.
    #[inline]
    pub fn mode(&self) -> ErrorMode {
        self.mode
    }

    /// Change the mode; applies from the next record.
    pub fn set_mode(&mut self, mode: ErrorMode) {
        self.mode = mode;
    }

    /// Saved failures in encounter order.
    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Number of saved failures.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// True if at least one failure was saved.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Empty the log.
    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Append a failure to the log regardless of mode.
    pub fn add_error(&mut self, error: ErrorRecord) {
        self.errors.push(error);
    }

    /// Apply the policy: `Some` means the caller must raise the failure.
    pub(crate) fn handle(&mut self, error: ErrorRecord) -> Option<ErrorRecord> {
        match self.mode {
            ErrorMode::ThrowOnError => Some(error),
            ErrorMode::IgnoreAndContinue => {
                trace!(line = error.line_number, error = %error.cause, "ignoring failed record");
                None
            }
            ErrorMode::SaveAndContinue => {
                debug!(line = error.line_number, error = %error.cause, "saving failed record");
                self.errors.push(error);
                None
            }
        }
    }

    /// Write the log as `|`-delimited lines preceded by a column header.
    pub fn save_errors<W: Write>(&self, writer: W) -> EngineResult<()> {
        let schema = saved_error_schema()?;
        let mut out = BufWriter::new(writer);
        writeln!(out, "{}", SAVED_ERRORS_HEADER)?;
        for error in &self.errors {
            let line = schema
                .record_to_string(&SavedError::from(error))
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Write the log to a file, replacing it.
    pub fn save_errors_to_file(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        let file = File::create(path.as_ref())?;
        debug!(path = %path.as_ref().display(), count = self.errors.len(), "saving error log");
        self.save_errors(file)
    }

    /// The log as text, in the format of [`save_errors`](Self::save_errors).
    pub fn errors_text(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec only fails if a record does not format.
        if self.save_errors(&mut buf).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Read a log written by [`save_errors`](Self::save_errors).
    pub fn load_errors<R: Read + 'static>(reader: R) -> EngineResult<Vec<SavedError>> {
        let mut engine = StreamingEngine::new(saved_error_schema()?);
        engine.begin_read_stream(reader)?;
        let saved = engine.read_to_end()?;
        engine.close();
        Ok(saved)
    }

    /// Read a log file written by [`save_errors_to_file`](Self::save_errors_to_file).
    pub fn load_errors_from_file(path: impl AsRef<Path>) -> EngineResult<Vec<SavedError>> {
        let mut engine = StreamingEngine::new(saved_error_schema()?);
        engine.begin_read_file(path)?;
        let saved = engine.read_to_end()?;
        engine.close();
        Ok(saved)
    }
}

const SAVED_ERRORS_HEADER: &str = "line|type|record|error";

/// An error log entry as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedError {
    /// Absolute line number (1-based).
    pub line_number: usize,
    /// Name of the record type.
    pub record_type: String,
    /// The failing line.
    pub record_text: String,
    /// Failure description.
    pub message: String,
}

impl From<&ErrorRecord> for SavedError {
    fn from(error: &ErrorRecord) -> Self {
        Self {
            line_number: error.line_number,
            record_type: error.record_type.clone(),
            record_text: error.record_text.clone(),
            message: error.cause.to_string(),
        }
    }
}

impl Record for SavedError {
    fn from_values(values: &[Value]) -> Result<Self, ConversionError> {
        let line: i64 = value_at(values, 0, "line")?;
        Ok(Self {
            line_number: usize::try_from(line)
                .map_err(|_| ConversionError::new(0, "line", line.to_string(), "line number out of range"))?,
            record_type: value_at(values, 1, "type")?,
            record_text: value_at(values, 2, "record")?,
            message: value_at(values, 3, "error")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Int(self.line_number as i64),
            self.record_type.clone().into(),
            self.record_text.clone().into(),
            self.message.clone().into(),
        ]
    }
}

/// Schema of the saved error log written by [`ErrorManager::save_errors`].
pub fn saved_error_schema() -> Result<RecordSchema, SchemaError> {
    RecordSchema::delimited::<SavedError>("|")
        .ignore_first(1)
        .field(Field::int("line"))
        .field(Field::string("type").quoted('"'))
        .field(Field::string("record").quoted('"'))
        .field(Field::string("error").quoted('"'))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatfile_core::LineBoundsError;

    fn failure(line: usize, text: &str) -> ErrorRecord {
        ErrorRecord {
            line_number: line,
            record_text: text.to_string(),
            record_type: "Customer".to_string(),
            cause: RecordFailure::Record(RecordError::LineBounds(LineBoundsError {
                field_index: 2,
                field_name: "zip".to_string(),
                position: 4,
                line_length: 4,
                message: "expected 5 characters, found 0".to_string(),
            })),
        }
    }

    // ==================== Policy tests ====================

    #[test]
    fn test_throw_gives_error_back() {
        let mut manager = ErrorManager::new(ErrorMode::ThrowOnError);
        assert!(manager.handle(failure(1, "x")).is_some());
        assert!(!manager.has_errors());
    }

    #[test]
    fn test_ignore_drops() {
        let mut manager = ErrorManager::new(ErrorMode::IgnoreAndContinue);
        assert!(manager.handle(failure(1, "x")).is_none());
        assert_eq!(manager.error_count(), 0);
    }

    #[test]
    fn test_save_keeps_order() {
        let mut manager = ErrorManager::new(ErrorMode::SaveAndContinue);
        manager.handle(failure(4, "d"));
        manager.handle(failure(2, "b"));
        let lines: Vec<_> = manager.errors().iter().map(|e| e.line_number).collect();
        assert_eq!(lines, vec![4, 2]);
        manager.clear();
        assert!(!manager.has_errors());
    }

    #[test]
    fn test_mode_switch() {
        let mut manager = ErrorManager::default();
        assert_eq!(manager.mode(), ErrorMode::ThrowOnError);
        manager.set_mode(ErrorMode::SaveAndContinue);
        assert!(manager.handle(failure(1, "x")).is_none());
        assert_eq!(manager.error_count(), 1);
    }

    // ==================== Saving tests ====================

    #[test]
    fn test_errors_text_format() {
        let mut manager = ErrorManager::new(ErrorMode::SaveAndContinue);
        manager.add_error(failure(3, "ab|c"));
        let text = manager.errors_text();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("line|type|record|error"));
        let entry = lines.next().unwrap_or_default();
        assert!(entry.starts_with("3|Customer|\"ab|c\"|"));
        assert!(entry.contains("'zip'"));
    }

    #[test]
    fn test_save_and_load() {
        let mut manager = ErrorManager::new(ErrorMode::SaveAndContinue);
        manager.add_error(failure(3, "say \"hi\""));
        manager.add_error(failure(9, ""));

        let mut buf = Vec::new();
        manager.save_errors(&mut buf).unwrap();
        let loaded = ErrorManager::load_errors(io::Cursor::new(buf)).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].line_number, 3);
        assert_eq!(loaded[0].record_text, "say \"hi\"");
        assert_eq!(loaded[1].record_text, "");
        assert_eq!(loaded[1], SavedError::from(&manager.errors()[1]));
    }
}
