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

//! Shared test fixtures for the flatfile crates.
//!
//! Provides two record types with ready-built schemas and sample data in
//! both line layouts, plus known-bad lines for error handling tests.
//!
//! # Quick Start
//!
//! ```rust
//! use flatfile_test::{customer_csv_schema, customers, CUSTOMERS_CSV};
//! use flatfile_core::LineCursor;
//!
//! let schema = customer_csv_schema();
//! let first_line = CUSTOMERS_CSV.lines().next().unwrap();
//! let mut values = Vec::new();
//! let parsed: flatfile_test::Customer = schema
//!     .string_to_record(&mut LineCursor::new(first_line), &mut values)
//!     .unwrap();
//! assert_eq!(parsed, customers()[0]);
//! ```

use std::io;
use std::path::{Path, PathBuf};

/// Sample data and bad lines.
pub mod fixtures;

/// Record types and their schemas.
pub mod records;

pub use fixtures::*;
pub use records::{customer_csv_schema, customer_fixed_schema, order_schema, Customer, Order};

/// Write `contents` to `dir/name` and return the path.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatfile_core::{LineCursor, Record};

    fn parse_all<T: Record>(schema: &flatfile_core::RecordSchema, text: &str) -> Vec<T> {
        let mut values = Vec::new();
        text.lines()
            .map(|line| {
                schema
                    .string_to_record(&mut LineCursor::new(line), &mut values)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_csv_fixture_matches_records() {
        let parsed: Vec<Customer> = parse_all(&customer_csv_schema(), CUSTOMERS_CSV);
        assert_eq!(parsed, customers());
    }

    #[test]
    fn test_fixed_fixture_matches_records() {
        let parsed: Vec<Customer> = parse_all(&customer_fixed_schema(), CUSTOMERS_FIXED);
        assert_eq!(parsed, customers());
    }

    #[test]
    fn test_order_fixture_matches_records() {
        let parsed: Vec<Order> = parse_all(&order_schema(), ORDERS_FIXED);
        assert_eq!(parsed, orders());
    }

    #[test]
    fn test_invalid_lines_fail() {
        let schema = customer_csv_schema();
        for (name, line) in invalid_customer_lines() {
            let mut values = Vec::new();
            let result = schema.string_to_record::<Customer>(&mut LineCursor::new(line), &mut values);
            assert!(result.is_err(), "fixture '{}' should not parse", name);
        }
    }

    #[test]
    fn test_write_fixture() {
        let dir = std::env::temp_dir().join(format!("flatfile-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = write_fixture(&dir, "c.csv", CUSTOMERS_CSV).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CUSTOMERS_CSV);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
