//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Line assembly and the line handler interface

use bytes::BytesMut;
use tokio_util::codec::Encoder;
use x0_telnetcodec::consts::{BS, CR, DEL, LF, NUL};
use x0_telnetcodec::naws::WindowSize;
use x0_telnetcodec::TelnetCodec;

/// Longest line kept; further input on the same line is dropped.
pub const MAX_LINE_LEN: usize = 1024;

/// Effect of one input byte on the line being assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// The byte was appended
    Inserted(u8),
    /// The last byte was removed
    Erased,
    /// A line terminator completed this line
    Line(String),
    /// Nothing changed
    Ignored,
}

/// Collects data bytes into lines.
///
/// CR, LF, CR LF and CR NUL all end a line. BS and DEL erase the previous byte. Other
/// control bytes except TAB are dropped.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: Vec<u8>,
    after_cr: bool,
}

impl LineAssembler {
    /// Creates an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one data byte.
    pub fn push(&mut self, byte: u8) -> Edit {
        let after_cr = std::mem::replace(&mut self.after_cr, false);
        match byte {
            CR => {
                self.after_cr = true;
                self.finish()
            }
            LF | NUL if after_cr => Edit::Ignored,
            LF => self.finish(),
            BS | DEL => self.erase_char(),
            b'\t' => self.insert(byte),
            byte if byte < 0x20 => Edit::Ignored,
            byte => self.insert(byte),
        }
    }

    /// Removes the last byte of the pending line.
    pub fn erase_char(&mut self) -> Edit {
        match self.buffer.pop() {
            Some(_) => Edit::Erased,
            None => Edit::Ignored,
        }
    }

    /// Discards the pending line.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Bytes of the line assembled so far.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    fn insert(&mut self, byte: u8) -> Edit {
        if self.buffer.len() >= MAX_LINE_LEN {
            return Edit::Ignored;
        }
        self.buffer.push(byte);
        Edit::Inserted(byte)
    }

    fn finish(&mut self) -> Edit {
        let line = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        Edit::Line(line)
    }
}

/// Output side of a line session, handed to [`LineHandler`] hooks.
///
/// Text is IAC-escaped and bare LF is sent as CR LF. Output is flushed after the hook
/// returns.
pub struct LineWriter<'a> {
    pub(crate) codec: &'a mut TelnetCodec,
    pub(crate) output: &'a mut BytesMut,
    pub(crate) window: WindowSize,
    pub(crate) close_requested: &'a mut bool,
}

impl LineWriter<'_> {
    /// Queues `text` as is, apart from newline expansion.
    pub fn write(&mut self, text: &str) {
        let mut expanded = Vec::with_capacity(text.len() + 2);
        let mut previous = 0;
        for &byte in text.as_bytes() {
            if byte == LF && previous != CR {
                expanded.push(CR);
            }
            expanded.push(byte);
            previous = byte;
        }
        self.write_bytes(&expanded);
    }

    /// Queues `text` followed by CR LF.
    pub fn write_line(&mut self, text: &str) {
        self.write(text);
        self.write_bytes(&[CR, LF]);
    }

    /// Queues raw bytes, escaping IAC.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if let Err(err) = self.codec.encode(bytes, &mut *self.output) {
            tracing::warn!("Unable to encode session output: {}", err);
        }
    }

    /// Last window size reported by the client, 80x24 until it reports one.
    pub fn window_size(&self) -> WindowSize {
        self.window
    }

    /// Ends the session once pending output has been sent.
    pub fn close(&mut self) {
        *self.close_requested = true;
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closing(&self) -> bool {
        *self.close_requested
    }
}

/// Per-session consumer of complete lines.
///
/// [`LineService`](crate::LineService) clones its template handler for every session.
pub trait LineHandler: 'static {
    /// Called once negotiation has been sent.
    fn on_open(&mut self, _writer: &mut LineWriter<'_>) {}

    /// Called for every complete line, without its terminator.
    fn on_line(&mut self, writer: &mut LineWriter<'_>, line: &str);

    /// Called when the session is torn down.
    fn on_close(&mut self) {}
}
