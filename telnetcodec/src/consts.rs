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

//! Telnet command and option byte values (RFC 854, RFC 855 and option RFCs)

/// Null
pub const NUL: u8 = 0x00;
/// Line Feed
pub const LF: u8 = 0x0A;
/// Carriage Return
pub const CR: u8 = 0x0D;
/// Backspace
pub const BS: u8 = 0x08;
/// Delete
pub const DEL: u8 = 0x7F;

/// End of Record
pub const EOR: u8 = 239;
/// Subnegotiation End
pub const SE: u8 = 240;
/// No Operation
pub const NOP: u8 = 241;
/// Data Mark
pub const DM: u8 = 242;
/// Break
pub const BRK: u8 = 243;
/// Interrupt Process
pub const IP: u8 = 244;
/// Abort Output
pub const AO: u8 = 245;
/// Are You There
pub const AYT: u8 = 246;
/// Erase Character
pub const EC: u8 = 247;
/// Erase Line
pub const EL: u8 = 248;
/// Go Ahead
pub const GA: u8 = 249;
/// Subnegotiation Begin
pub const SB: u8 = 250;
/// WILL
pub const WILL: u8 = 251;
/// WON'T
pub const WONT: u8 = 252;
/// DO
pub const DO: u8 = 253;
/// DON'T
pub const DONT: u8 = 254;
/// Interpret As Command
pub const IAC: u8 = 255;

/// Option codes
pub mod option {
    /// Binary Transmission [RFC856]
    pub const BINARY: u8 = 0;
    /// Echo [RFC857]
    pub const ECHO: u8 = 1;
    /// Suppress Go Ahead [RFC858]
    pub const SGA: u8 = 3;
    /// Status [RFC859]
    pub const STATUS: u8 = 5;
    /// Timing Mark [RFC860]
    pub const TM: u8 = 6;
    /// Terminal Type [RFC1091]
    pub const TTYPE: u8 = 24;
    /// End of Record [RFC885]
    pub const EOR: u8 = 25;
    /// Negotiate About Window Size [RFC1073]
    pub const NAWS: u8 = 31;
    /// Terminal Speed [RFC1079]
    pub const TSPEED: u8 = 32;
    /// Remote Flow Control [RFC1372]
    pub const LFLOW: u8 = 33;
    /// Linemode [RFC1184]
    pub const LINEMODE: u8 = 34;
    /// New Environment [RFC1572]
    pub const NEW_ENVIRON: u8 = 39;
}
