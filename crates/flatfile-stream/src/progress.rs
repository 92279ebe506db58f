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

//! Progress reporting.

/// Where a session stands, reported to the progress hook.
///
/// Emitted once when a session begins (record 0) and then once per line
/// processed, whether it produced a record, was skipped or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Ordinal of the current record (1-based; 0 at begin).
    pub current_record: usize,
    /// Total records, unknown while streaming.
    pub total_records: Option<usize>,
    /// Bytes read from the source or written to the sink so far.
    pub position: u64,
    /// Size of the source when it is known (files and strings).
    pub total_bytes: Option<u64>,
}

impl ProgressSnapshot {
    /// Fraction of the source consumed, when its size is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) => Some(1.0),
            Some(total) => Some((self.position as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

pub(crate) type ProgressHook = Box<dyn FnMut(&ProgressSnapshot)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        let mut snap = ProgressSnapshot {
            current_record: 3,
            total_records: None,
            position: 25,
            total_bytes: Some(100),
        };
        assert_eq!(snap.fraction(), Some(0.25));
        snap.total_bytes = None;
        assert_eq!(snap.fraction(), None);
        snap.total_bytes = Some(0);
        assert_eq!(snap.fraction(), Some(1.0));
    }
}
