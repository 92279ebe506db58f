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


//! File-backed sessions: reading, writing, appending, the saved error log,
//! and the engine's log output.

use flatfile_stream::{EngineConfig, ErrorManager, ErrorMode, StreamingEngine};
use flatfile_test::{customer_csv_schema, customers, write_fixture, Customer, CUSTOMERS_BAD_SECOND, CUSTOMERS_CSV};
use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn saving_engine() -> StreamingEngine<Customer> {
    let config = EngineConfig {
        error_mode: ErrorMode::SaveAndContinue,
        ..Default::default()
    };
    StreamingEngine::with_config(customer_csv_schema(), config)
}

// ==================== Reading and writing files ====================

#[test]
fn test_read_file() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "customers.csv", CUSTOMERS_CSV).unwrap();

    let mut engine = StreamingEngine::<Customer>::new(customer_csv_schema());
    engine.begin_read_file(&path).unwrap();
    assert_eq!(engine.read_to_end().unwrap(), customers());
}

#[test]
fn test_read_missing_file() {
    let dir = TempDir::new().unwrap();
    let mut engine = StreamingEngine::<Customer>::new(customer_csv_schema());
    let err = engine.begin_read_file(dir.path().join("missing.csv")).unwrap_err();
    assert!(matches!(err, flatfile_stream::EngineError::Io(_)));
    assert_eq!(engine.state(), flatfile_stream::EngineState::Closed);
}

#[test]
fn test_write_file_truncates() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "out.csv", "old contents that must go\n").unwrap();

    let mut engine = StreamingEngine::new(customer_csv_schema());
    engine.begin_write_file(&path).unwrap();
    engine.write_nexts(&customers()).unwrap();
    engine.close();

    assert_eq!(fs::read_to_string(&path).unwrap(), CUSTOMERS_CSV);
}

#[test]
fn test_append_adds_missing_newline() {
    let dir = TempDir::new().unwrap();
    let first_line = CUSTOMERS_CSV.lines().next().unwrap();
    let path = write_fixture(dir.path(), "append.csv", first_line).unwrap();

    let mut engine = StreamingEngine::new(customer_csv_schema());
    engine.set_header_text("never written");
    engine.begin_append_to_file(&path).unwrap();
    engine.write_nexts(&customers()[1..]).unwrap();
    engine.close();

    assert_eq!(fs::read_to_string(&path).unwrap(), CUSTOMERS_CSV);
}

#[test]
fn test_append_creates_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("new.csv");

    let mut engine = StreamingEngine::new(customer_csv_schema());
    engine.begin_append_to_file(&path).unwrap();
    engine.write_nexts(&customers()).unwrap();
    engine.close();

    assert_eq!(fs::read_to_string(&path).unwrap(), CUSTOMERS_CSV);
}

#[test]
fn test_file_progress_knows_total_bytes() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "customers.csv", CUSTOMERS_CSV).unwrap();
    let fractions = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&fractions);

    let mut engine = StreamingEngine::<Customer>::new(customer_csv_schema());
    engine.on_progress(move |p| sink.borrow_mut().push(p.fraction()));
    engine.begin_read_file(&path).unwrap();
    engine.read_to_end().unwrap();

    let fractions = fractions.borrow();
    assert_eq!(fractions.len(), 4);
    assert!(fractions.iter().all(|f| f.is_some()));
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
}

// ==================== Saved error log ====================

#[test]
fn test_save_and_load_errors() {
    let dir = TempDir::new().unwrap();
    let mut engine = saving_engine();
    engine.begin_read_string(CUSTOMERS_BAD_SECOND).unwrap();
    engine.read_to_end().unwrap();

    let path = dir.path().join("errors.txt");
    engine.error_manager().save_errors_to_file(&path).unwrap();
    let loaded = ErrorManager::load_errors_from_file(&path).unwrap();

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].line_number, 2);
    assert_eq!(loaded[0].record_type, "Customer");
    assert_eq!(loaded[0].record_text, "2,Bob,lots,2019-11-30,false");
    assert!(loaded[0].message.contains("balance"));
}

#[test]
fn test_saved_log_starts_with_column_header() {
    let mut engine = saving_engine();
    engine.begin_read_string(CUSTOMERS_BAD_SECOND).unwrap();
    engine.read_to_end().unwrap();

    let text = engine.error_manager().errors_text();
    assert!(text.starts_with("line|type|record|error\n"));
    assert_eq!(text.lines().count(), 2);
}

// ==================== Logging ====================

#[derive(Clone, Default)]
struct LogSink(Arc<Mutex<Vec<u8>>>);

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_saved_failures_are_logged() {
    let sink = LogSink::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("flatfile_stream=debug"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut engine = saving_engine();
        engine.begin_read_string(CUSTOMERS_BAD_SECOND).unwrap();
        engine.read_to_end().unwrap();
        engine.close();
    });

    let logs = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("saving failed record"));
    assert!(logs.contains("read session closed"));
}
