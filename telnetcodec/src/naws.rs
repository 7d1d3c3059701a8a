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

//! Negotiate About Window Size
//!

use crate::{CodecError, CodecResult, TelnetOption};
use bytes::{Buf, BufMut};

/// Window dimensions carried by a NAWS subnegotiation.
///
/// # Format
/// Four bytes, big-endian: columns (2 bytes) then rows (2 bytes).
///
/// # Example
/// ```
/// use x0_telnetcodec::naws::WindowSize;
///
/// let size = WindowSize::new(80, 24);
/// assert_eq!(size.cols, 80);
/// assert_eq!(size.rows, 24);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSize {
    /// The number of columns (characters) in the terminal window
    pub cols: u16,
    /// The number of rows (lines) in the terminal window
    pub rows: u16,
}

impl WindowSize {
    /// Encoded payload length in bytes.
    pub const LEN: usize = 4;

    /// Creates a new `WindowSize` with the specified columns and rows.
    pub fn new(cols: u16, rows: u16) -> Self {
        WindowSize { cols, rows }
    }

    /// Appends the four-byte payload to `dst`.
    pub fn encode<T: BufMut>(&self, dst: &mut T) {
        dst.put_u16(self.cols);
        dst.put_u16(self.rows);
    }

    /// Decodes a payload, which must be exactly four bytes.
    pub fn decode<T: Buf>(src: &mut T) -> CodecResult<Self> {
        if src.remaining() != Self::LEN {
            return Err(CodecError::Subnegotiation {
                option: TelnetOption::NAWS,
                reason: format!(
                    "expected {} bytes of window size, got {}",
                    Self::LEN,
                    src.remaining()
                ),
            });
        }
        let cols = src.get_u16();
        let rows = src.get_u16();
        Ok(WindowSize { cols, rows })
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        WindowSize::new(80, 24)
    }
}
