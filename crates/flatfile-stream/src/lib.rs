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


//! Streaming Flat-File Engine
//!
//! This crate reads and writes flat files one record at a time. Memory use
//! stays flat no matter how large the file is: only the current line and
//! the footer lookahead are held.
//!
//! # Features
//!
//! - **Record at a time**: `read_next`, bulk reads, or a standard iterator
//! - **Header and footer**: leading and trailing lines are kept aside as text
//! - **Error policies**: raise, ignore, or save failed lines and carry on
//! - **Hooks**: inspect, rewrite or skip lines and records on both paths
//! - **Indexed access**: read and set field values by position or name
//! - **Progress**: per-line notifications with byte position
//!
//! # Reading
//!
//! ```rust
//! use flatfile_core::{DynamicRecord, Field, RecordSchema};
//! use flatfile_stream::StreamingEngine;
//!
//! let schema = RecordSchema::delimited::<DynamicRecord>(",")
//!     .ignore_first(1)
//!     .ignore_last(1)
//!     .field(Field::string("sku"))
//!     .field(Field::int("qty"))
//!     .build()
//!     .unwrap();
//!
//! let mut engine = StreamingEngine::new(schema);
//! engine.begin_read_string("sku,qty\nA1,4\nB2,9\nTOTAL 13\n").unwrap();
//!
//! for record in engine.records().unwrap() {
//!     let record: DynamicRecord = record.unwrap();
//!     println!("{:?}", record.values());
//! }
//!
//! assert_eq!(engine.header_text(), "sku,qty");
//! assert_eq!(engine.footer_text(), "TOTAL 13");
//! ```
//!
//! # Carrying on past bad lines
//!
//! ```rust
//! use flatfile_core::{DynamicRecord, Field, RecordSchema};
//! use flatfile_stream::{EngineConfig, ErrorMode, StreamingEngine};
//!
//! let schema = RecordSchema::delimited::<DynamicRecord>(",")
//!     .field(Field::int("qty"))
//!     .build()
//!     .unwrap();
//!
//! let config = EngineConfig {
//!     error_mode: ErrorMode::SaveAndContinue,
//!     ..Default::default()
//! };
//! let mut engine = StreamingEngine::<DynamicRecord>::with_config(schema, config);
//! engine.begin_read_string("1\nlots\n3\n").unwrap();
//!
//! let records = engine.read_to_end().unwrap();
//! assert_eq!(records.len(), 2);
//! assert_eq!(engine.error_manager().errors()[0].line_number, 2);
//! ```

mod engine;
mod error;
mod errors;
mod events;
mod progress;
mod reader;

pub use engine::{EngineConfig, EngineState, Records, StreamingEngine, DEFAULT_BUFFER_SIZE};
pub use error::{EngineError, EngineResult};
pub use errors::{saved_error_schema, ErrorManager, ErrorMode, ErrorRecord, RecordFailure, SavedError};
pub use events::{AfterReadEvent, AfterWriteEvent, BeforeReadEvent, BeforeWriteEvent, LineAction, RecordAction};
pub use progress::ProgressSnapshot;
pub use reader::{ForwardReader, LineReader};

/// Re-export core types for convenience.
pub use flatfile_core::{Record, RecordSchema, Value};
