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

//! Line sources.
//!
//! [`LineReader`] does buffered line-by-line reading with line number
//! tracking. [`ForwardReader`] sits on top of it and splits a source into
//! three regions: the header (the first `ignore_first` lines, captured at
//! open), the data lines, and the footer (the last `ignore_last` lines,
//! captured when the source runs out).
//!
//! The footer can only be recognized once the end of the source is seen, so
//! the forward reader keeps exactly `ignore_last` lines of lookahead: each
//! data line it hands out is the oldest buffered line, replaced by a fresh
//! one from the source.

use crate::error::EngineResult;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use tracing::trace;

/// Buffered line reader with line number tracking.
///
/// Handles LF and CRLF endings; the terminator is not part of the line.
///
/// # Examples
///
/// ```rust
/// use flatfile_stream::LineReader;
/// use std::io::Cursor;
///
/// let mut reader = LineReader::new(Cursor::new("line1\r\nline2"));
///
/// assert_eq!(reader.next_line().unwrap(), Some((1, "line1".to_string())));
/// assert_eq!(reader.next_line().unwrap(), Some((2, "line2".to_string())));
/// assert_eq!(reader.next_line().unwrap(), None);
/// assert_eq!(reader.bytes_read(), 12);
/// ```
pub struct LineReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    bytes_read: u64,
    buffer: String,
}

impl<R: Read> LineReader<R> {
    /// Create a new line reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            bytes_read: 0,
            buffer: String::new(),
        }
    }

    /// Create with a specific buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            bytes_read: 0,
            buffer: String::new(),
        }
    }

    /// Number of the last line read.
    #[inline]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Bytes consumed so far, terminators included.
    #[inline]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read the next line.
    pub fn next_line(&mut self) -> EngineResult<Option<(usize, String)>> {
        self.buffer.clear();

        let n = self.reader.read_line(&mut self.buffer)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        self.bytes_read += n as u64;

        if self.buffer.ends_with('\n') {
            self.buffer.pop();
            if self.buffer.ends_with('\r') {
                self.buffer.pop();
            }
        }

        Ok(Some((self.line_number, self.buffer.clone())))
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = EngineResult<(usize, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

/// Line source separating header and footer lines from data lines.
///
/// # Examples
///
/// ```rust
/// use flatfile_stream::ForwardReader;
/// use std::io::Cursor;
///
/// let text = "title\ncolumns\na\nb\ntotal";
/// let mut reader = ForwardReader::new(Cursor::new(text), 2, 1).unwrap();
///
/// assert_eq!(reader.header_text(), "title\ncolumns");
/// assert_eq!(reader.read_next_line().unwrap().as_deref(), Some("a"));
/// assert_eq!(reader.line_number(), 3);
/// assert_eq!(reader.read_next_line().unwrap().as_deref(), Some("b"));
/// assert_eq!(reader.read_next_line().unwrap(), None);
/// assert_eq!(reader.footer_text(), "total");
/// assert!(reader.is_closed());
/// ```
pub struct ForwardReader {
    source: Option<LineReader<Box<dyn Read>>>,
    ignore_last: usize,
    lookahead: VecDeque<(usize, String)>,
    header_text: String,
    footer_text: String,
    line_number: usize,
    bytes_read: u64,
    discard_forward: bool,
}

impl ForwardReader {
    /// Open `source`, consuming its `ignore_first` header lines.
    pub fn new<R: Read + 'static>(source: R, ignore_first: usize, ignore_last: usize) -> EngineResult<Self> {
        Self::from_line_reader(LineReader::new(Box::new(source)), ignore_first, ignore_last)
    }

    /// Like [`new`](Self::new) with a read buffer of `capacity` bytes.
    pub fn with_capacity<R: Read + 'static>(
        source: R,
        capacity: usize,
        ignore_first: usize,
        ignore_last: usize,
    ) -> EngineResult<Self> {
        Self::from_line_reader(
            LineReader::with_capacity(Box::new(source), capacity),
            ignore_first,
            ignore_last,
        )
    }

    fn from_line_reader(
        mut source: LineReader<Box<dyn Read>>,
        ignore_first: usize,
        ignore_last: usize,
    ) -> EngineResult<Self> {
        let mut header = Vec::with_capacity(ignore_first);
        while header.len() < ignore_first {
            match source.next_line()? {
                Some((_, line)) => header.push(line),
                None => break,
            }
        }

        Ok(Self {
            line_number: source.line_number(),
            bytes_read: source.bytes_read(),
            source: Some(source),
            ignore_last,
            lookahead: VecDeque::with_capacity(ignore_last + 1),
            header_text: header.join("\n"),
            footer_text: String::new(),
            discard_forward: false,
        })
    }

    /// Drop buffered lookahead when closed before the end of the source.
    pub fn set_discard_forward(&mut self, discard: bool) {
        self.discard_forward = discard;
    }

    /// Whether early close drops the lookahead.
    pub fn discard_forward(&self) -> bool {
        self.discard_forward
    }

    /// Next data line, or `None` once only footer lines remain.
    ///
    /// Reaching the end captures the footer and closes the source.
    pub fn read_next_line(&mut self) -> EngineResult<Option<String>> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };

        while self.lookahead.len() <= self.ignore_last {
            match source.next_line()? {
                Some(line) => self.lookahead.push_back(line),
                None => {
                    self.bytes_read = source.bytes_read();
                    let footer: Vec<String> = self.lookahead.drain(..).map(|(_, line)| line).collect();
                    self.footer_text = footer.join("\n");
                    self.close();
                    return Ok(None);
                }
            }
        }
        self.bytes_read = source.bytes_read();

        match self.lookahead.pop_front() {
            Some((number, line)) => {
                self.line_number = number;
                Ok(Some(line))
            }
            None => Ok(None),
        }
    }

    /// Absolute number of the last data line returned (header lines count).
    #[inline]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Header lines joined by `\n`.
    pub fn header_text(&self) -> &str {
        &self.header_text
    }

    /// Footer lines joined by `\n`; empty until the source is exhausted.
    pub fn footer_text(&self) -> &str {
        &self.footer_text
    }

    /// Lookahead lines not yet handed out, joined by `\n`.
    pub fn remaining_text(&self) -> String {
        self.lookahead
            .iter()
            .map(|(_, line)| line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Bytes consumed from the source, lookahead included.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// True once the source was released.
    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// Release the source. Calling again does nothing.
    pub fn close(&mut self) {
        if let Some(source) = self.source.take() {
            trace!(line = source.line_number(), "releasing line source");
            if self.discard_forward {
                self.lookahead.clear();
            }
        }
    }
}

impl std::fmt::Debug for ForwardReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardReader")
            .field("ignore_last", &self.ignore_last)
            .field("line_number", &self.line_number)
            .field("buffered", &self.lookahead.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
