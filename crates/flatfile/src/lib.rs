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


//! # Flatfile - typed records over flat text files
//!
//! Flatfile maps each line of a delimited or fixed-width text file to a typed
//! record and back. A [`RecordSchema`] describes the line layout and the
//! fields; the [`StreamingEngine`] reads and writes records one at a time.
//!
//! ## Quick Start
//!
//! ```rust
//! use flatfile::prelude::*;
//!
//! let schema = RecordSchema::delimited::<DynamicRecord>(",")
//!     .field(Field::string("sku"))
//!     .field(Field::int("qty"))
//!     .build()
//!     .unwrap();
//!
//! let records: Vec<DynamicRecord> = flatfile::read_str(schema.clone(), "A1,4\nB2,9\n").unwrap();
//! assert_eq!(records[1].get(1), Some(&Value::Int(9)));
//!
//! let text = flatfile::write_string(schema, &records).unwrap();
//! assert_eq!(text, "A1,4\nB2,9\n");
//! ```
//!
//! ## Features
//!
//! - **Two layouts**: delimited with optional quoting, or fixed-width columns
//! - **Typed fields**: strings, chars, booleans, numbers, dates and custom
//!   converters, with trimming, padding, null values and locales
//! - **Streaming**: constant memory regardless of file size
//! - **Header and footer**: leading and trailing lines kept as text
//! - **Error policies**: raise, ignore or save failed lines
//!
//! ## Modules
//!
//! - [`schema`]: field and line layout descriptions
//! - [`stream`]: the streaming engine and its hooks
//! - [`convert`]: value converters

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

pub use flatfile_core::{
    value_at, ConversionError, DynamicRecord, FromValue, Locale, Record, RecordAction, RecordError, RecordSchema,
    RecordType, SchemaError, Value, ValueKind,
};
pub use flatfile_stream::{EngineConfig, EngineError, EngineResult, ErrorMode, ErrorRecord, StreamingEngine};

pub mod schema {
    //! Field and line layout descriptions
    pub use flatfile_core::{
        Align, Field, FieldDescriptor, FieldLayout, FixedMode, QuoteMode, QuoteOptions, RecordLayout,
        RecordSchema, RecordSchemaBuilder, TrimMode, DEFAULT_TRIM_CHARS,
    };
}

pub mod stream {
    //! Record-at-a-time reading and writing
    pub use flatfile_stream::{
        saved_error_schema, AfterReadEvent, AfterWriteEvent, BeforeReadEvent, BeforeWriteEvent, EngineConfig,
        EngineState, ErrorManager, ErrorMode, ErrorRecord, ForwardReader, LineAction, LineReader,
        ProgressSnapshot, RecordFailure, Records, SavedError, StreamingEngine, DEFAULT_BUFFER_SIZE,
    };
}

pub mod convert {
    //! Value converters
    pub use flatfile_core::convert::{
        remove_sign_blanks, Converter, FieldConverter, DEFAULT_DATETIME_FORMAT, DEFAULT_DATE_FORMAT,
    };
    pub use flatfile_core::{LineCursor, Overrun};
}

pub mod prelude {
    //! The types needed to declare a schema and run the engine.
    pub use crate::schema::{Align, Field, FixedMode, QuoteMode, RecordSchema, TrimMode};
    pub use crate::stream::{EngineConfig, ErrorMode, LineAction, StreamingEngine};
    pub use flatfile_core::{value_at, DynamicRecord, Record, RecordAction, Value};
}

// Convenience functions at crate root

/// Read every record of `text`.
///
/// The first failed line is returned as an error. Use
/// [`read_str_with_errors`] to collect failures instead.
///
/// # Examples
///
/// ```rust
/// use flatfile::prelude::*;
///
/// let schema = RecordSchema::fixed::<DynamicRecord>()
///     .field(Field::string("code").width(4).trim(TrimMode::Right))
///     .field(Field::int("qty").width(3))
///     .build()
///     .unwrap();
///
/// let records: Vec<DynamicRecord> = flatfile::read_str(schema, "AB    7\n").unwrap();
/// assert_eq!(records[0].get(0), Some(&Value::from("AB")));
/// ```
pub fn read_str<T: Record>(schema: RecordSchema, text: &str) -> EngineResult<Vec<T>> {
    let mut engine = StreamingEngine::new(schema);
    engine.begin_read_string(text)?;
    engine.read_to_end()
}

/// Read every valid record of `text` and the failures of the other lines.
pub fn read_str_with_errors<T: Record>(schema: RecordSchema, text: &str) -> EngineResult<(Vec<T>, Vec<ErrorRecord>)> {
    let config = EngineConfig {
        error_mode: ErrorMode::SaveAndContinue,
        ..Default::default()
    };
    let mut engine = StreamingEngine::with_config(schema, config);
    engine.begin_read_string(text)?;
    let records = engine.read_to_end()?;
    Ok((records, engine.error_manager().errors().to_vec()))
}

/// Read every record of the file at `path`.
pub fn read_file<T: Record>(schema: RecordSchema, path: impl AsRef<Path>) -> EngineResult<Vec<T>> {
    let mut engine = StreamingEngine::new(schema);
    engine.begin_read_file(path)?;
    engine.read_to_end()
}

/// Format `records` as text, one line each.
pub fn write_string<T: Record>(schema: RecordSchema, records: &[T]) -> EngineResult<String> {
    let sink = SharedSink::default();
    let mut engine = StreamingEngine::new(schema);
    engine.begin_write_stream(sink.clone())?;
    engine.write_nexts(records)?;
    engine.flush()?;
    engine.close();
    sink.into_string()
}

/// Write `records` to the file at `path`, replacing its contents.
pub fn write_file<T: Record>(schema: RecordSchema, path: impl AsRef<Path>, records: &[T]) -> EngineResult<()> {
    let mut engine = StreamingEngine::new(schema);
    engine.begin_write_file(path)?;
    engine.write_nexts(records)?;
    engine.flush()?;
    engine.close();
    Ok(())
}

/// Append `records` to the file at `path`, creating it if needed.
pub fn append_file<T: Record>(schema: RecordSchema, path: impl AsRef<Path>, records: &[T]) -> EngineResult<()> {
    let mut engine = StreamingEngine::new(schema);
    engine.begin_append_to_file(path)?;
    engine.write_nexts(records)?;
    engine.flush()?;
    engine.close();
    Ok(())
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl SharedSink {
    fn into_string(self) -> EngineResult<String> {
        let bytes = self.0.take();
        String::from_utf8(bytes).map_err(|e| EngineError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
