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

//! Sample data in both layouts.
//!
//! Each text constant holds the lines for [`customers()`] (or [`orders()`])
//! in order, one record per line, with no header or footer.

use crate::records::{Customer, Order};
use chrono::NaiveDate;

/// Customers as comma-delimited text.
pub const CUSTOMERS_CSV: &str = "\
1,Ann Smith,120.5,2021-03-04,true
2,\"Jones, Bob\",0,2019-11-30,false
3,\"Cara \"\"CJ\"\" Lee\",-42.25,2020-01-01,true
";

/// Customers as fixed-width text.
pub const CUSTOMERS_FIXED: &str = "\
00001Ann Smith                120.520210304Y
00002Jones, Bob                   020191130N
00003Cara \"CJ\" Lee           -42.2520200101Y
";

/// Orders as fixed-width text; the last line has a short note.
pub const ORDERS_FIXED: &str = "\
BOLT    12washers   
NUT    250          
GEAR     1rush
";

/// The records behind the customer fixtures.
pub fn customers() -> Vec<Customer> {
    vec![
        Customer {
            id: 1,
            name: "Ann Smith".to_string(),
            balance: 120.5,
            joined: date(2021, 3, 4),
            active: true,
        },
        Customer {
            id: 2,
            name: "Jones, Bob".to_string(),
            balance: 0.0,
            joined: date(2019, 11, 30),
            active: false,
        },
        Customer {
            id: 3,
            name: "Cara \"CJ\" Lee".to_string(),
            balance: -42.25,
            joined: date(2020, 1, 1),
            active: true,
        },
    ]
}

/// The records behind [`ORDERS_FIXED`].
pub fn orders() -> Vec<Order> {
    vec![
        Order {
            code: "BOLT".to_string(),
            qty: 12,
            note: Some("washers".to_string()),
        },
        Order {
            code: "NUT".to_string(),
            qty: 250,
            note: None,
        },
        Order {
            code: "GEAR".to_string(),
            qty: 1,
            note: Some("rush".to_string()),
        },
    ]
}

/// Customer CSV text with a two-line header and a one-line footer.
pub fn customers_with_header_footer() -> String {
    format!("# customers\nid,name,balance,joined,active\n{}TOTAL 3\n", CUSTOMERS_CSV)
}

/// Three customer lines where line 2 has a bad balance.
pub const CUSTOMERS_BAD_SECOND: &str = "\
1,Ann Smith,120.5,2021-03-04,true
2,Bob,lots,2019-11-30,false
3,Cara,1,2020-01-01,true
";

/// Lines that must not parse with the customer CSV schema.
///
/// Returns (description, line) pairs.
pub fn invalid_customer_lines() -> Vec<(&'static str, &'static str)> {
    vec![
        ("empty", ""),
        ("too_few_fields", "1,Ann,1.0,2021-01-01"),
        ("too_many_fields", "1,Ann,1.0,2021-01-01,true,extra"),
        ("bad_int", "x,Ann,1.0,2021-01-01,true"),
        ("bad_float", "1,Ann,1.0.0,2021-01-01,true"),
        ("bad_date", "1,Ann,1.0,2021-13-01,true"),
        ("bad_bool", "1,Ann,1.0,2021-01-01,perhaps"),
        ("empty_int", ",Ann,1.0,2021-01-01,true"),
        ("unterminated_quote", "1,\"Ann,1.0,2021-01-01,true"),
        ("text_after_quote", "1,\"Ann\"x,1.0,2021-01-01,true"),
    ]
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
