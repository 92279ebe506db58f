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

//! The streaming engine.
//!
//! A [`StreamingEngine`] converts one record at a time between a line source
//! or sink and typed records. Its lifecycle is an explicit state machine:
//!
//! ```text
//!            begin_read_*                 begin_write_* / begin_append_*
//!   Closed ───────────────▶ Reading      Closed ──────────────────────────▶ Writing
//!     ▲                        │            ▲                                  │
//!     └──────── close ─────────┘            └───────────── close ──────────────┘
//! ```
//!
//! Starting to read while writing (or the reverse) is a
//! [`BadUsage`](EngineError::BadUsage) error. Starting to read while already
//! reading closes the previous session first; the same goes for writing.
//! `close` is idempotent and never fails. Errors while releasing the
//! resource are logged and dropped. Dropping the engine closes it.
//!
//! Per-record failures go through the [`ErrorManager`]: raised, ignored or
//! saved according to its [`ErrorMode`].

use crate::error::{EngineError, EngineResult};
use crate::errors::{ErrorManager, ErrorMode, ErrorRecord, RecordFailure};
use crate::events::{AfterReadEvent, AfterWriteEvent, BeforeReadEvent, BeforeWriteEvent, Hooks, LineAction};
use crate::progress::{ProgressHook, ProgressSnapshot};
use crate::reader::ForwardReader;
use flatfile_core::{LineCursor, Record, RecordAction, RecordError, RecordSchema, Value};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, trace, warn};

/// Default read and write buffer size (16 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Configuration for the streaming engine.
///
/// # Examples
///
/// ```rust
/// use flatfile_stream::{EngineConfig, ErrorMode};
///
/// let config = EngineConfig {
///     newline: "\r\n".to_string(),
///     error_mode: ErrorMode::SaveAndContinue,
///     ..Default::default()
/// };
/// assert_eq!(config.read_buffer_size, 16 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Buffer size for reading files and streams.
    ///
    /// Default: 16 KiB
    pub read_buffer_size: usize,

    /// Buffer size for writing files and streams.
    ///
    /// Default: 16 KiB
    pub write_buffer_size: usize,

    /// Line terminator written after each record, and after header and
    /// footer text that lacks one. Reading accepts both `\n` and `\r\n`.
    ///
    /// Default: `"\n"`
    pub newline: String,

    /// Initial error mode; can be changed later through
    /// [`StreamingEngine::set_error_mode`].
    ///
    /// Default: [`ErrorMode::ThrowOnError`]
    pub error_mode: ErrorMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_BUFFER_SIZE,
            write_buffer_size: DEFAULT_BUFFER_SIZE,
            newline: "\n".to_string(),
            error_mode: ErrorMode::ThrowOnError,
        }
    }
}

/// Lifecycle state of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No source or sink attached.
    Closed,
    /// A source is attached.
    Reading,
    /// A sink is attached.
    Writing,
}

struct ReadSession {
    reader: ForwardReader,
    total_bytes: Option<u64>,
}

impl ReadSession {
    fn snapshot(&self, current_record: usize) -> ProgressSnapshot {
        ProgressSnapshot {
            current_record,
            total_records: None,
            position: self.reader.bytes_read(),
            total_bytes: self.total_bytes,
        }
    }
}

struct WriteSession {
    writer: BufWriter<Box<dyn Write>>,
    position: u64,
}

impl WriteSession {
    fn snapshot(&self, current_record: usize) -> ProgressSnapshot {
        ProgressSnapshot {
            current_record,
            total_records: None,
            position: self.position,
            total_bytes: None,
        }
    }

    fn write_line(&mut self, line: &str, newline: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(newline.as_bytes())?;
        self.position += (line.len() + newline.len()) as u64;
        Ok(())
    }

    /// Write `text` as a block, terminated unless it already is.
    fn write_block(&mut self, text: &str, newline: &str) -> io::Result<()> {
        if text.ends_with('\n') {
            self.writer.write_all(text.as_bytes())?;
            self.position += text.len() as u64;
            Ok(())
        } else {
            self.write_line(text, newline)
        }
    }
}

enum Session {
    Closed,
    Reading(ReadSession),
    Writing(WriteSession),
}

/// Record-at-a-time reader and writer for one record type.
///
/// # Examples
///
/// ## Reading
///
/// ```rust
/// use flatfile_core::{DynamicRecord, Field, RecordSchema, Value};
/// use flatfile_stream::StreamingEngine;
///
/// let schema = RecordSchema::delimited::<DynamicRecord>(",")
///     .ignore_first(1)
///     .field(Field::string("name"))
///     .field(Field::int("qty"))
///     .build()
///     .unwrap();
///
/// let mut engine = StreamingEngine::new(schema);
/// engine.begin_read_string("name,qty\nbolt,12\nnut,250\n").unwrap();
/// assert_eq!(engine.header_text(), "name,qty");
///
/// let first: DynamicRecord = engine.read_next().unwrap().unwrap();
/// assert_eq!(first.get(1), Some(&Value::Int(12)));
/// assert_eq!(engine.value_by_name("name").unwrap(), &Value::from("bolt"));
///
/// let rest = engine.read_to_end().unwrap();
/// assert_eq!(rest.len(), 1);
/// engine.close();
/// ```
///
/// ## Writing from field values
///
/// ```rust
/// use flatfile_core::{DynamicRecord, Field, RecordSchema};
/// use flatfile_stream::StreamingEngine;
/// use std::sync::{Arc, Mutex};
///
/// # #[derive(Clone, Default)]
/// # struct Shared(Arc<Mutex<Vec<u8>>>);
/// # impl std::io::Write for Shared {
/// #     fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
/// #         self.0.lock().unwrap().extend_from_slice(buf);
/// #         Ok(buf.len())
/// #     }
/// #     fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
/// # }
/// let schema = RecordSchema::fixed::<DynamicRecord>()
///     .field(Field::string("code").width(4))
///     .field(Field::int("qty").width(3))
///     .build()
///     .unwrap();
///
/// let out = Shared::default();
/// let mut engine = StreamingEngine::<DynamicRecord>::new(schema);
/// engine.begin_write_stream(out.clone()).unwrap();
/// engine.set_value_by_name("code", "AB").unwrap();
/// engine.set_value(1, 7_i64).unwrap();
/// engine.write_next_values().unwrap();
/// engine.close();
///
/// assert_eq!(String::from_utf8(out.0.lock().unwrap().clone()).unwrap(), "AB    7\n");
/// ```
pub struct StreamingEngine<T: Record> {
    schema: RecordSchema,
    config: EngineConfig,
    session: Session,
    errors: ErrorManager,
    hooks: Hooks<T>,
    progress: Option<ProgressHook>,
    header_text: String,
    footer_text: String,
    line_number: usize,
    total_records: usize,
    current_record: usize,
    last_record: Option<T>,
    values: Option<Vec<Value>>,
}

impl<T: Record> StreamingEngine<T> {
    /// Create an engine with the default configuration.
    pub fn new(schema: RecordSchema) -> Self {
        Self::with_config(schema, EngineConfig::default())
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(schema: RecordSchema, config: EngineConfig) -> Self {
        Self {
            errors: ErrorManager::new(config.error_mode),
            schema,
            config,
            session: Session::Closed,
            hooks: Hooks::default(),
            progress: None,
            header_text: String::new(),
            footer_text: String::new(),
            line_number: 0,
            total_records: 0,
            current_record: 0,
            last_record: None,
            values: None,
        }
    }

    // ==================== Accessors ====================

    /// Schema used for every line.
    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        match self.session {
            Session::Closed => EngineState::Closed,
            Session::Reading(_) => EngineState::Reading,
            Session::Writing(_) => EngineState::Writing,
        }
    }

    /// Absolute number of the last line read, or the number of lines
    /// written in this session.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Lines processed in this session, including failed and skipped ones.
    pub fn total_records(&self) -> usize {
        self.total_records
    }

    /// Record returned by the last successful read.
    pub fn last_record(&self) -> Option<&T> {
        self.last_record.as_ref()
    }

    /// Field values of the last record read, or the values being set for
    /// [`write_next_values`](Self::write_next_values).
    pub fn last_record_values(&self) -> Option<&[Value]> {
        self.values.as_deref()
    }

    /// Header lines of the current source, or the header to write.
    pub fn header_text(&self) -> &str {
        &self.header_text
    }

    /// Set the header written when a write session begins.
    pub fn set_header_text(&mut self, text: impl Into<String>) {
        self.header_text = text.into();
    }

    /// Footer lines of an exhausted source, or the footer to write.
    pub fn footer_text(&self) -> &str {
        &self.footer_text
    }

    /// Set the footer written when a write session closes.
    pub fn set_footer_text(&mut self, text: impl Into<String>) {
        self.footer_text = text.into();
    }

    /// Error policy and saved errors.
    pub fn error_manager(&self) -> &ErrorManager {
        &self.errors
    }

    /// Mutable access to the error manager.
    pub fn error_manager_mut(&mut self) -> &mut ErrorManager {
        &mut self.errors
    }

    /// Change the error mode; applies from the next record.
    pub fn set_error_mode(&mut self, mode: ErrorMode) {
        self.errors.set_mode(mode);
    }

    // ==================== Hooks ====================

    /// Called with each raw line before conversion.
    pub fn on_before_read(&mut self, hook: impl FnMut(&BeforeReadEvent<'_>) -> LineAction + 'static) -> &mut Self {
        self.hooks.before_read = Some(Box::new(hook));
        self
    }

    /// Called with each new record.
    pub fn on_after_read(&mut self, hook: impl FnMut(&mut AfterReadEvent<'_, T>) -> RecordAction + 'static) -> &mut Self {
        self.hooks.after_read = Some(Box::new(hook));
        self
    }

    /// Called with each record before formatting.
    pub fn on_before_write(&mut self, hook: impl FnMut(&BeforeWriteEvent<'_, T>) -> RecordAction + 'static) -> &mut Self {
        self.hooks.before_write = Some(Box::new(hook));
        self
    }

    /// Called with each formatted line before it is written.
    pub fn on_after_write(&mut self, hook: impl FnMut(&AfterWriteEvent<'_, T>) -> LineAction + 'static) -> &mut Self {
        self.hooks.after_write = Some(Box::new(hook));
        self
    }

    /// Called when a session begins and after each line.
    pub fn on_progress(&mut self, hook: impl FnMut(&ProgressSnapshot) + 'static) -> &mut Self {
        self.progress = Some(Box::new(hook));
        self
    }

    // ==================== Session lifecycle ====================

    /// Begin reading from a stream. Its size is unknown to progress reports.
    pub fn begin_read_stream<R: Read + 'static>(&mut self, reader: R) -> EngineResult<()> {
        self.prepare_session(EngineState::Reading)?;
        debug!(source = "stream", "begin read");
        self.open_reader(reader, None)
    }

    /// Begin reading a file.
    pub fn begin_read_file(&mut self, path: impl AsRef<Path>) -> EngineResult<()> {
        self.prepare_session(EngineState::Reading)?;
        let path = path.as_ref();
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        debug!(path = %path.display(), bytes = len, "begin read");
        self.open_reader(file, Some(len))
    }

    /// Begin reading in-memory text. Empty text is an empty source.
    pub fn begin_read_string(&mut self, text: &str) -> EngineResult<()> {
        self.prepare_session(EngineState::Reading)?;
        debug!(source = "string", bytes = text.len(), "begin read");
        self.open_reader(Cursor::new(text.to_owned()), Some(text.len() as u64))
    }

    fn open_reader<R: Read + 'static>(&mut self, source: R, total_bytes: Option<u64>) -> EngineResult<()> {
        let mut reader = ForwardReader::with_capacity(
            source,
            self.config.read_buffer_size,
            self.schema.ignore_first(),
            self.schema.ignore_last(),
        )?;
        reader.set_discard_forward(true);

        self.reset_counters();
        self.header_text = reader.header_text().to_string();
        self.footer_text.clear();
        self.line_number = reader.line_number();
        debug!(
            record_type = %self.schema.record_type(),
            ignore_first = self.schema.ignore_first(),
            ignore_last = self.schema.ignore_last(),
            "read session open"
        );

        let session = ReadSession { reader, total_bytes };
        if let Some(hook) = self.progress.as_mut() {
            hook(&session.snapshot(0));
        }
        self.session = Session::Reading(session);
        Ok(())
    }

    /// Begin writing to a stream, writing the header text first.
    pub fn begin_write_stream<W: Write + 'static>(&mut self, writer: W) -> EngineResult<()> {
        self.prepare_session(EngineState::Writing)?;
        debug!(sink = "stream", "begin write");
        self.open_writer(Box::new(writer), true)
    }

    /// Create or truncate a file and begin writing to it, header first.
    pub fn begin_write_file(&mut self, path: impl AsRef<Path>) -> EngineResult<()> {
        self.prepare_session(EngineState::Writing)?;
        let path = path.as_ref();
        let file = File::create(path)?;
        debug!(path = %path.display(), "begin write");
        self.open_writer(Box::new(file), true)
    }

    /// Begin appending to a file, creating it if needed. No header is
    /// written; a missing final line terminator is added first.
    pub fn begin_append_to_file(&mut self, path: impl AsRef<Path>) -> EngineResult<()> {
        self.prepare_session(EngineState::Writing)?;
        let path = path.as_ref();
        let mut file = OpenOptions::new().read(true).append(true).create(true).open(path)?;
        if lacks_final_newline(&mut file)? {
            file.write_all(self.config.newline.as_bytes())?;
        }
        debug!(path = %path.display(), "begin append");
        self.open_writer(Box::new(file), false)
    }

    fn open_writer(&mut self, sink: Box<dyn Write>, write_header: bool) -> EngineResult<()> {
        let mut session = WriteSession {
            writer: BufWriter::with_capacity(self.config.write_buffer_size, sink),
            position: 0,
        };
        if write_header && !self.header_text.is_empty() {
            session.write_block(&self.header_text, &self.config.newline)?;
        }

        self.reset_counters();
        debug!(record_type = %self.schema.record_type(), "write session open");
        if let Some(hook) = self.progress.as_mut() {
            hook(&session.snapshot(0));
        }
        self.session = Session::Writing(session);
        Ok(())
    }

    fn prepare_session(&mut self, next: EngineState) -> EngineResult<()> {
        match (self.state(), next) {
            (EngineState::Writing, EngineState::Reading) => Err(EngineError::bad_usage(
                "can't start reading while writing; call close first",
            )),
            (EngineState::Reading, EngineState::Writing) => Err(EngineError::bad_usage(
                "can't start writing while reading; call close first",
            )),
            (EngineState::Closed, _) => Ok(()),
            _ => {
                self.close();
                Ok(())
            }
        }
    }

    fn reset_counters(&mut self) {
        self.line_number = 0;
        self.total_records = 0;
        self.current_record = 0;
        self.last_record = None;
        self.values = None;
        self.errors.clear();
    }

    /// Release the source or sink.
    ///
    /// A write session writes the footer text and flushes first. Failures
    /// while doing so are logged, not returned; call [`flush`](Self::flush)
    /// beforehand to observe them. Calling `close` on a closed engine does
    /// nothing.
    pub fn close(&mut self) {
        match std::mem::replace(&mut self.session, Session::Closed) {
            Session::Closed => return,
            Session::Reading(mut session) => {
                session.reader.close();
                debug!(
                    line = self.line_number,
                    records = self.total_records,
                    "read session closed"
                );
            }
            Session::Writing(mut session) => {
                let finished = if self.footer_text.is_empty() {
                    Ok(())
                } else {
                    session.write_block(&self.footer_text, &self.config.newline)
                };
                if let Err(e) = finished.and_then(|()| session.writer.flush()) {
                    warn!(error = %e, "failed to finish write session; output may be incomplete");
                }
                debug!(records = self.total_records, "write session closed");
            }
        }
        self.values = None;
    }

    // ==================== Reading ====================

    /// Read the next record, or `None` once the data lines are exhausted.
    ///
    /// Failed lines are handled by the error manager: under
    /// [`ErrorMode::ThrowOnError`] the failure is returned, otherwise the
    /// engine moves on to the next line. Reaching the end captures the
    /// footer text and releases the source, but the engine stays in the
    /// reading state until [`close`](Self::close).
    pub fn read_next(&mut self) -> EngineResult<Option<T>> {
        let Session::Reading(session) = &mut self.session else {
            return Err(EngineError::bad_usage(
                "read_next needs an open read session; call a begin_read method first",
            ));
        };

        loop {
            let Some(line) = session.reader.read_next_line()? else {
                self.values = None;
                self.last_record = None;
                self.footer_text = session.reader.footer_text().to_string();
                session.reader.close();
                return Ok(None);
            };

            let line_number = session.reader.line_number();
            self.line_number = line_number;
            self.total_records += 1;
            self.current_record += 1;
            self.last_record = None;
            if let Some(hook) = self.progress.as_mut() {
                hook(&session.snapshot(self.current_record));
            }

            let values = self.values.get_or_insert_with(Vec::new);
            match convert_line(&self.schema, &mut self.hooks, values, &line, line_number) {
                Ok(Some(record)) => {
                    self.last_record = Some(record.clone());
                    return Ok(Some(record));
                }
                Ok(None) => {}
                Err(e) => {
                    if let Err(e) = route_failure(&mut self.errors, &self.schema, line_number, line, e.into()) {
                        self.values = None;
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Read up to `count` records.
    pub fn read_nexts(&mut self, count: usize) -> EngineResult<Vec<T>> {
        self.expect_state(EngineState::Reading, "read_nexts")?;
        let mut records = Vec::with_capacity(count.min(1024));
        while records.len() < count {
            match self.read_next()? {
                Some(record) => records.push(record),
                None => break,
            }
        }
        Ok(records)
    }

    /// Read every remaining record.
    pub fn read_to_end(&mut self) -> EngineResult<Vec<T>> {
        self.read_nexts(usize::MAX)
    }

    /// Iterate over the remaining records.
    ///
    /// Note the side effect: the engine is closed when the iterator runs out
    /// and when it is dropped early, so header and footer text stay
    /// available but the source is released.
    pub fn records(&mut self) -> EngineResult<Records<'_, T>> {
        self.expect_state(EngineState::Reading, "records")?;
        Ok(Records {
            engine: self,
            finished: false,
        })
    }

    // ==================== Writing ====================

    /// Write one record.
    ///
    /// The record's type must be the schema's and it must have one value per
    /// field, otherwise nothing is written and
    /// [`BadUsage`](EngineError::BadUsage) is returned.
    pub fn write_next(&mut self, record: &T) -> EngineResult<()> {
        self.expect_state(EngineState::Writing, "write_next")?;
        self.check_shape(record)?;
        self.write_record(record)
    }

    /// Write several records; the shape check is done on the first one.
    pub fn write_nexts<'r, I>(&mut self, records: I) -> EngineResult<()>
    where
        I: IntoIterator<Item = &'r T>,
        T: 'r,
    {
        self.expect_state(EngineState::Writing, "write_nexts")?;
        let mut first = true;
        for record in records {
            if first {
                self.check_shape(record)?;
                first = false;
            }
            self.write_record(record)?;
        }
        Ok(())
    }

    fn check_shape(&self, record: &T) -> EngineResult<()> {
        let expected = self.schema.record_type();
        let actual = record.record_type();
        if actual != *expected {
            return Err(EngineError::bad_usage(format!(
                "record type '{}' does not match the schema type '{}'",
                actual, expected
            )));
        }
        let count = record.to_values().len();
        if count != self.schema.field_count() {
            return Err(EngineError::bad_usage(format!(
                "record has {} values but the schema has {} fields",
                count,
                self.schema.field_count()
            )));
        }
        Ok(())
    }

    fn write_record(&mut self, record: &T) -> EngineResult<()> {
        let Session::Writing(session) = &mut self.session else {
            return Err(EngineError::bad_usage("not writing"));
        };

        self.line_number += 1;
        self.total_records += 1;
        self.current_record += 1;
        let line_number = self.line_number;
        if let Some(hook) = self.progress.as_mut() {
            hook(&session.snapshot(self.current_record));
        }

        if record.before_write() == RecordAction::Skip
            || self.hooks.before_write(record, line_number) == RecordAction::Skip
        {
            trace!(line = line_number, "before-write hook skipped record");
            return Ok(());
        }

        let mut line = match self.schema.record_to_string(record) {
            Ok(line) => line,
            Err(e) => return route_failure(&mut self.errors, &self.schema, line_number, String::new(), e.into()),
        };
        match self.hooks.after_write(&line, record, line_number) {
            LineAction::Keep => {}
            LineAction::Skip => {
                trace!(line = line_number, "after-write hook skipped line");
                return Ok(());
            }
            LineAction::Replace(text) => line = text,
        }

        if let Err(e) = session.write_line(&line, &self.config.newline) {
            return route_failure(&mut self.errors, &self.schema, line_number, line, e.into());
        }
        Ok(())
    }

    /// Write the values set through [`set_value`](Self::set_value) as one
    /// line, then clear them. Hooks are not called.
    pub fn write_next_values(&mut self) -> EngineResult<()> {
        self.expect_state(EngineState::Writing, "write_next_values")?;
        let Some(values) = self.values.take() else {
            return Err(EngineError::bad_usage(
                "set some field values before calling write_next_values, or use write_next",
            ));
        };
        let Session::Writing(session) = &mut self.session else {
            return Err(EngineError::bad_usage("not writing"));
        };

        self.line_number += 1;
        self.total_records += 1;
        self.current_record += 1;
        let line_number = self.line_number;
        if let Some(hook) = self.progress.as_mut() {
            hook(&session.snapshot(self.current_record));
        }

        let line = match self.schema.values_to_string(&values) {
            Ok(line) => line,
            Err(e) => return route_failure(&mut self.errors, &self.schema, line_number, String::new(), e.into()),
        };
        if let Err(e) = session.write_line(&line, &self.config.newline) {
            return route_failure(&mut self.errors, &self.schema, line_number, line, e.into());
        }
        Ok(())
    }

    /// Flush buffered output to the sink.
    pub fn flush(&mut self) -> EngineResult<()> {
        match &mut self.session {
            Session::Writing(session) => Ok(session.writer.flush()?),
            _ => Err(EngineError::bad_usage("flush needs an open write session")),
        }
    }

    // ==================== Indexed field access ====================

    /// Value of field `index` in the current record values.
    pub fn value(&self, index: usize) -> EngineResult<&Value> {
        let values = self.values.as_ref().ok_or_else(|| {
            EngineError::bad_usage("no record values available; read a record or set a value first")
        })?;
        values.get(index).ok_or_else(|| {
            EngineError::bad_usage(format!(
                "field index {} is out of range; the record has {} fields",
                index,
                self.schema.field_count()
            ))
        })
    }

    /// Value of the field called `name`.
    pub fn value_by_name(&self, name: &str) -> EngineResult<&Value> {
        self.value(self.field_index(name)?)
    }

    /// Set field `index` for the next [`write_next_values`](Self::write_next_values).
    ///
    /// While writing, unset fields stay null. While reading, the values of
    /// the record just read can be overwritten; the change shows through
    /// [`value`](Self::value) and [`last_record_values`](Self::last_record_values)
    /// until the next read, but not in the record already returned.
    /// Null is rejected for non-nullable fields, as is a value of another kind.
    pub fn set_value(&mut self, index: usize, value: impl Into<Value>) -> EngineResult<()> {
        match self.state() {
            EngineState::Writing => {}
            EngineState::Reading if self.values.is_some() => {}
            EngineState::Reading => {
                return Err(EngineError::bad_usage(
                    "no record values to change; read a record before setting field values",
                ))
            }
            EngineState::Closed => {
                return Err(EngineError::bad_usage(
                    "field values can only be set while reading or writing; call a begin method first",
                ))
            }
        }
        let count = self.schema.field_count();
        let field = self.schema.field(index).ok_or_else(|| {
            EngineError::bad_usage(format!(
                "field index {} is out of range; the record has {} fields",
                index, count
            ))
        })?;

        let value = value.into();
        if value.is_null() && !field.is_nullable() {
            return Err(EngineError::bad_usage(format!(
                "can't assign null to non-nullable field '{}'",
                field.name()
            )));
        }
        if !field.accepts(&value) {
            return Err(EngineError::bad_usage(format!(
                "invalid type {} for field '{}', expected {}",
                value.kind().map_or("null", |k| k.name()),
                field.name(),
                field.kind()
            )));
        }

        let values = self.values.get_or_insert_with(|| vec![Value::Null; count]);
        if let Some(slot) = values.get_mut(index) {
            *slot = value;
        }
        Ok(())
    }

    /// Set the field called `name`.
    pub fn set_value_by_name(&mut self, name: &str, value: impl Into<Value>) -> EngineResult<()> {
        let index = self.field_index(name)?;
        self.set_value(index, value)
    }

    fn field_index(&self, name: &str) -> EngineResult<usize> {
        self.schema
            .field_index(name)
            .ok_or_else(|| EngineError::bad_usage(format!("unknown field '{}'", name)))
    }

    fn expect_state(&self, expected: EngineState, operation: &str) -> EngineResult<()> {
        let state = self.state();
        if state == expected {
            return Ok(());
        }
        let hint = match expected {
            EngineState::Reading => "call a begin_read method first",
            EngineState::Writing => "call a begin_write method first",
            EngineState::Closed => "call close first",
        };
        Err(EngineError::bad_usage(format!(
            "{} is not valid while {:?}; {}",
            operation, state, hint
        )))
    }
}

/// Convert one raw line, running the read hooks around it.
///
/// `Ok(None)` means the line was skipped by a hook or is a blank or comment
/// line the schema ignores.
fn convert_line<T: Record>(
    schema: &RecordSchema,
    hooks: &mut Hooks<T>,
    values: &mut Vec<Value>,
    line: &str,
    line_number: usize,
) -> Result<Option<T>, RecordError> {
    let replaced = match hooks.before_read(line, line_number) {
        LineAction::Keep => None,
        LineAction::Skip => {
            trace!(line = line_number, "before-read hook skipped line");
            return Ok(None);
        }
        LineAction::Replace(text) => Some(text),
    };
    let current = replaced.as_deref().unwrap_or(line);

    if schema.is_skippable(current) {
        trace!(line = line_number, "skipping blank or comment line");
        return Ok(None);
    }

    let mut cursor = LineCursor::with_line_number(current, line_number);
    let mut record: T = schema.string_to_record(&mut cursor, values)?;

    if record.after_read(current) == RecordAction::Skip
        || hooks.after_read(line, &mut record, replaced.is_some(), line_number) == RecordAction::Skip
    {
        trace!(line = line_number, "after-read hook skipped record");
        return Ok(None);
    }
    Ok(Some(record))
}

/// Hand a failure to the error manager; `Err` when it must be raised.
fn route_failure(
    errors: &mut ErrorManager,
    schema: &RecordSchema,
    line_number: usize,
    record_text: String,
    cause: RecordFailure,
) -> EngineResult<()> {
    let error = ErrorRecord {
        line_number,
        record_text,
        record_type: schema.record_type().name().to_string(),
        cause,
    };
    match errors.handle(error) {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

fn lacks_final_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

impl<T: Record> Drop for StreamingEngine<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Record> std::fmt::Debug for StreamingEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingEngine")
            .field("record_type", self.schema.record_type())
            .field("state", &self.state())
            .field("line_number", &self.line_number)
            .field("total_records", &self.total_records)
            .field("error_mode", &self.errors.mode())
            .finish()
    }
}

/// Iterator over the records of a read session.
///
/// Closes the engine when exhausted or dropped. Stops after the first error.
pub struct Records<'e, T: Record> {
    engine: &'e mut StreamingEngine<T>,
    finished: bool,
}

impl<T: Record> Iterator for Records<'_, T> {
    type Item = EngineResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.engine.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                self.engine.close();
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<T: Record> Drop for Records<'_, T> {
    fn drop(&mut self) {
        self.engine.close();
    }
}
