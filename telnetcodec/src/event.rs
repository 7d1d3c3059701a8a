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

use crate::{TelnetOption, TelnetSide};
use bytes::Bytes;

///
/// `TelnetEvent` is what the decoder hands to the application.
///
/// Negotiation commands never surface directly; they update the codec's option table, queue any
/// owed reply and, when an option changes state, produce an [`TelnetEvent::OptionStatus`].
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TelnetEvent {
    /// Telnet Data Byte
    Data(u8),
    /// No Operation, also produced for unknown or malformed commands
    NoOperation,
    /// End of urgent Data Stream
    DataMark,
    /// Operator pressed the Break key or the Attention key.
    Break,
    /// Interrupt current process.
    InterruptProcess,
    /// Cancel output from the current process.
    AbortOutput,
    /// Request acknowledgment.
    AreYouThere,
    /// Request that the operator erase the previous character.
    EraseCharacter,
    /// Request that the operator erase the previous line.
    EraseLine,
    /// End of input for half-duplex connections.
    GoAhead,
    /// End of Record
    EndOfRecord,
    /// An option changed state: (option, side, enabled)
    OptionStatus(TelnetOption, TelnetSide, bool),
    /// Peer reported its window size: (columns, rows)
    WindowSize(u16, u16),
    /// Subnegotiation for an option without a dedicated decoder
    Subnegotiate(TelnetOption, Bytes),
}
