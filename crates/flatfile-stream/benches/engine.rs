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


//! Streaming engine benchmarks.
//!
//! Measures read and write throughput for delimited and fixed-width customer
//! files of increasing size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use flatfile_core::RecordSchema;
use flatfile_stream::StreamingEngine;
use flatfile_test::{customer_csv_schema, customer_fixed_schema, customers, Customer};
use std::io;

const SIZES: [usize; 3] = [100, 1_000, 10_000];

fn generate(count: usize) -> Vec<Customer> {
    let base = customers();
    (0..count)
        .map(|i| {
            let mut customer = base[i % base.len()].clone();
            customer.id = i as i64;
            customer
        })
        .collect()
}

fn render(schema: RecordSchema, records: &[Customer]) -> String {
    records
        .iter()
        .map(|r| schema.record_to_string(r).map(|line| line + "\n"))
        .collect::<Result<String, _>>()
        .unwrap()
}

// ============================================================================
// Reading
// ============================================================================

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");

    for size in SIZES {
        for (layout, schema) in [("csv", customer_csv_schema()), ("fixed", customer_fixed_schema())] {
            let text = render(schema.clone(), &generate(size));
            group.throughput(Throughput::Bytes(text.len() as u64));
            group.bench_with_input(BenchmarkId::new(layout, size), &text, |b, text| {
                b.iter(|| {
                    let mut engine = StreamingEngine::<Customer>::new(schema.clone());
                    engine.begin_read_string(black_box(text)).unwrap();
                    engine.read_to_end().unwrap()
                })
            });
        }
    }

    group.finish();
}

// ============================================================================
// Writing
// ============================================================================

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");

    for size in SIZES {
        let records = generate(size);
        for (layout, schema) in [("csv", customer_csv_schema()), ("fixed", customer_fixed_schema())] {
            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(BenchmarkId::new(layout, size), &records, |b, records| {
                b.iter(|| {
                    let mut engine = StreamingEngine::new(schema.clone());
                    engine.begin_write_stream(io::sink()).unwrap();
                    engine.write_nexts(black_box(records)).unwrap();
                    engine.close();
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_read, bench_write);
criterion_main!(benches);
