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


//! Property tests for line accounting and text round trips.

use flatfile::prelude::*;
use flatfile::{read_str, write_string};
use proptest::prelude::*;

fn schema(first: usize, last: usize) -> RecordSchema {
    RecordSchema::delimited::<DynamicRecord>(",")
        .ignore_first(first)
        .ignore_last(last)
        .field(Field::string("label").quoted('"'))
        .field(Field::int("n"))
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Header and footer lines never become records, however many there are.
    #[test]
    fn prop_header_footer_accounting(
        lines in 0usize..20,
        first in 0usize..5,
        last in 0usize..5,
    ) {
        let text: String = (0..lines).map(|i| format!("row{},{}\n", i, i)).collect();
        let records: Vec<DynamicRecord> = read_str(schema(first, last), &text).unwrap();

        prop_assert_eq!(records.len(), lines.saturating_sub(first + last));
        if let Some(record) = records.first() {
            prop_assert_eq!(record.get(1), Some(&Value::Int(first as i64)));
        }
    }

    /// Labels containing delimiters, quotes or padding survive a round trip.
    #[test]
    fn prop_quoted_labels_round_trip(
        rows in prop::collection::vec(("[ a-z,\"]{0,12}", any::<i64>()), 0..20),
    ) {
        let records: Vec<DynamicRecord> = rows
            .iter()
            .map(|(label, n)| DynamicRecord::new(vec![Value::from(label.as_str()), Value::Int(*n)]))
            .collect();

        let text = write_string(schema(0, 0), &records).unwrap();
        let back: Vec<DynamicRecord> = read_str(schema(0, 0), &text).unwrap();
        prop_assert_eq!(back, records);
    }
}
