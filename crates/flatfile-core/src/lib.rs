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

//! Schema-driven conversion between flat text lines and typed records.
//!
//! This crate holds the data model: field descriptors, record schemas, the
//! per-line cursor and the conversion of one line to one record and back.
//! Streaming over files and streams lives in `flatfile-stream`.
//!
//! # Line Layouts
//!
//! - **Delimited**: fields separated by a delimiter, optionally quoted, with
//!   doubled quote chars as escapes
//! - **Fixed width**: each field occupies a fixed number of characters,
//!   aligned and padded on write
//!
//! # Examples
//!
//! ```
//! use flatfile_core::{DynamicRecord, Field, RecordSchema, TrimMode, Value};
//!
//! let schema = RecordSchema::fixed::<DynamicRecord>()
//!     .field(Field::string("code").width(4).trim(TrimMode::Right))
//!     .field(Field::int("qty").width(6))
//!     .build()
//!     .unwrap();
//!
//! let rec: DynamicRecord = schema.parse_line("AB      42").unwrap();
//! assert_eq!(rec.values(), &[Value::from("AB"), Value::Int(42)]);
//! assert_eq!(schema.record_to_string(&rec).unwrap(), "AB      42");
//! ```

pub mod convert;
mod cursor;
mod error;
mod field;
mod locale;
mod ops;
mod record;
mod schema;
mod value;

pub use convert::{Converter, FieldConverter};
pub use cursor::{LineCursor, Overrun};
pub use error::{ConversionError, LineBoundsError, RecordError, RecordResult, SchemaError};
pub use field::{
    Align, Extracted, Field, FieldDescriptor, FieldLayout, FieldPosition, QuoteMode, QuoteOptions, TrimMode,
    DEFAULT_TRIM_CHARS,
};
pub use locale::Locale;
pub use record::{value_at, DynamicRecord, Record, RecordAction, RecordType};
pub use schema::{FixedMode, RecordLayout, RecordSchema, RecordSchemaBuilder};
pub use value::{FromValue, Value, ValueKind};
