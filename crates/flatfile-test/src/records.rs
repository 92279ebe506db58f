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

//! Sample record types.

use chrono::NaiveDate;
use flatfile_core::{value_at, Align, ConversionError, Field, Record, RecordSchema, TrimMode, Value};

/// A customer row, used in both line layouts.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    /// Customer number.
    pub id: i64,
    /// Display name; may contain commas.
    pub name: String,
    /// Account balance.
    pub balance: f64,
    /// Date the customer joined.
    pub joined: NaiveDate,
    /// Whether the account is active.
    pub active: bool,
}

impl Record for Customer {
    fn from_values(values: &[Value]) -> Result<Self, ConversionError> {
        Ok(Self {
            id: value_at(values, 0, "id")?,
            name: value_at(values, 1, "name")?,
            balance: value_at(values, 2, "balance")?,
            joined: value_at(values, 3, "joined")?,
            active: value_at(values, 4, "active")?,
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.name.clone().into(),
            self.balance.into(),
            self.joined.into(),
            self.active.into(),
        ]
    }
}

/// An order line with an optional note.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Product code.
    pub code: String,
    /// Quantity ordered.
    pub qty: i64,
    /// Free-text note, blank when absent.
    pub note: Option<String>,
}

impl Record for Order {
    fn from_values(values: &[Value]) -> Result<Self, ConversionError> {
        let note: Option<String> = value_at(values, 2, "note")?;
        Ok(Self {
            code: value_at(values, 0, "code")?,
            qty: value_at(values, 1, "qty")?,
            note: note.filter(|n| !n.is_empty()),
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            self.code.clone().into(),
            self.qty.into(),
            self.note.clone().unwrap_or_default().into(),
        ]
    }
}

/// `id,name,balance,joined,active` with the name quoted when needed.
pub fn customer_csv_schema() -> RecordSchema {
    RecordSchema::delimited::<Customer>(",")
        .field(Field::int("id"))
        .field(Field::string("name").quoted('"'))
        .field(Field::float("balance"))
        .field(Field::date("joined"))
        .field(Field::bool("active"))
        .build()
        .expect("customer csv schema is valid")
}

/// Fixed-width customers: id 5, name 20, balance 10, joined 8 (`%Y%m%d`),
/// active 1 (`Y`/`N`).
pub fn customer_fixed_schema() -> RecordSchema {
    RecordSchema::fixed::<Customer>()
        .field(Field::int("id").width(5).pad('0'))
        .field(Field::string("name").width(20).trim(TrimMode::Right))
        .field(Field::float("balance").width(10))
        .field(Field::date_with_format("joined", "%Y%m%d").width(8))
        .field(Field::bool("active").width(1).bool_texts("Y", "N"))
        .build()
        .expect("customer fixed schema is valid")
}

/// Fixed-width orders: code 6, qty 4, note 10; short notes are tolerated.
pub fn order_schema() -> RecordSchema {
    RecordSchema::fixed::<Order>()
        .fixed_mode(flatfile_core::FixedMode::AllowLessChars)
        .field(Field::string("code").width(6).trim(TrimMode::Right))
        .field(Field::int("qty").width(4).align(Align::Right))
        .field(Field::string("note").width(10).trim(TrimMode::Right))
        .build()
        .expect("order schema is valid")
}
