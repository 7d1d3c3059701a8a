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

use crate::TelnetOption;
use bytes::Bytes;

///
/// A single Telnet protocol element, as written to the wire.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TelnetFrame {
    /// Data byte (IAC is escaped when encoded)
    Data(u8),
    /// No Operation
    NoOperation,
    /// End of urgent data stream
    DataMark,
    /// Break
    Break,
    /// Interrupt Process
    InterruptProcess,
    /// Abort Output
    AbortOutput,
    /// Are You There
    AreYouThere,
    /// Erase Character
    EraseCharacter,
    /// Erase Line
    EraseLine,
    /// Go Ahead
    GoAhead,
    /// End of Record
    EndOfRecord,
    /// Ask the peer to perform an option
    Do(TelnetOption),
    /// Ask the peer to stop performing an option
    Dont(TelnetOption),
    /// Offer to perform an option
    Will(TelnetOption),
    /// Refuse to perform an option
    Wont(TelnetOption),
    /// `IAC SB <option> <payload> IAC SE`; IAC bytes in the payload are escaped when encoded
    Subnegotiate(TelnetOption, Bytes),
}
