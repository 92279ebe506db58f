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

//! Error types for the streaming engine.
//!
//! Two kinds of failure leave the engine:
//!
//! - **Misuse** ([`EngineError::BadUsage`]): an operation called in the wrong
//!   state or with the wrong arguments. Always raised, whatever the error
//!   mode.
//! - **Data** ([`EngineError::Record`]): a line or record failed conversion
//!   (or its output failed to write). Raised only under
//!   [`ErrorMode::ThrowOnError`](crate::ErrorMode::ThrowOnError); the other
//!   modes skip or log it.
//!
//! Opening a source or sink that does not exist surfaces as
//! [`EngineError::Io`].
//!
//! # Examples
//!
//! ```rust
//! use flatfile_core::{DynamicRecord, Field, RecordSchema};
//! use flatfile_stream::{EngineError, StreamingEngine};
//!
//! let schema = RecordSchema::delimited::<DynamicRecord>(",")
//!     .field(Field::int("n"))
//!     .build()
//!     .unwrap();
//! let mut engine = StreamingEngine::<DynamicRecord>::new(schema);
//!
//! engine.begin_read_string("1\nx\n").unwrap();
//! assert!(engine.read_next().unwrap().is_some());
//!
//! match engine.read_next() {
//!     Err(EngineError::Record { line, record_text, .. }) => {
//!         assert_eq!(line, 2);
//!         assert_eq!(record_text, "x");
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use crate::errors::{ErrorRecord, RecordFailure};
use flatfile_core::SchemaError;
use thiserror::Error;

/// Errors raised by the streaming engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Operation not valid in the current state or with these arguments.
    #[error("Bad usage: {0}")]
    BadUsage(String),

    /// A record failed at `line`.
    #[error("Error at line {line}: {source}")]
    Record {
        /// Absolute line number (1-based) of the failing line.
        line: usize,
        /// The raw line, or the formatted line on the write path.
        record_text: String,
        /// What went wrong.
        #[source]
        source: RecordFailure,
    },

    /// Opening, reading or flushing the underlying resource failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A schema built on the fly was invalid.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

impl EngineError {
    /// Create a misuse error.
    #[inline]
    pub fn bad_usage(message: impl Into<String>) -> Self {
        Self::BadUsage(message.into())
    }

    /// Line number, if the error concerns a line.
    #[inline]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Record { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// True for [`EngineError::BadUsage`].
    pub fn is_bad_usage(&self) -> bool {
        matches!(self, Self::BadUsage(_))
    }
}

impl From<ErrorRecord> for EngineError {
    fn from(err: ErrorRecord) -> Self {
        Self::Record {
            line: err.line_number,
            record_text: err.record_text,
            source: err.cause,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use flatfile_core::{ConversionError, RecordError};

    #[test]
    fn test_bad_usage() {
        let err = EngineError::bad_usage("not reading");
        assert!(err.is_bad_usage());
        assert_eq!(err.line(), None);
        assert_eq!(err.to_string(), "Bad usage: not reading");
    }

    #[test]
    fn test_from_error_record() {
        let record = ErrorRecord {
            line_number: 7,
            record_text: "a,b".to_string(),
            record_type: "Row".to_string(),
            cause: RecordFailure::Record(RecordError::Conversion(ConversionError::new(1, "b", "b", "bad"))),
        };
        let err = EngineError::from(record);
        assert_eq!(err.line(), Some(7));
        assert!(err.to_string().starts_with("Error at line 7:"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Io(_)));
        assert!(!err.is_bad_usage());
    }
}
