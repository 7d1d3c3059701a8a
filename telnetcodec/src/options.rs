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

use crate::{TelnetFrame, consts};
use std::fmt;

///
/// Telnet options known to the codec
///
/// Options outside this set are carried as [`TelnetOption::Unknown`] and always refused.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TelnetOption {
    /// [`consts::option::BINARY`] Binary Transmission [RFC856](https://tools.ietf.org/html/rfc856)
    TransmitBinary,
    /// [`consts::option::ECHO`] Echo [RFC857](https://tools.ietf.org/html/rfc857)
    Echo,
    /// [`consts::option::SGA`] Suppress Go Ahead [RFC858](https://tools.ietf.org/html/rfc858)
    SuppressGoAhead,
    /// [`consts::option::STATUS`] Status [RFC859](https://tools.ietf.org/html/rfc859)
    Status,
    /// [`consts::option::TM`] Timing Mark [RFC860](https://tools.ietf.org/html/rfc860)
    TimingMark,
    /// [`consts::option::TTYPE`] Terminal Type [RFC1091](https://tools.ietf.org/html/rfc1091)
    TerminalType,
    /// [`consts::option::EOR`] End of Record [RFC885](https://tools.ietf.org/html/rfc885)
    EndOfRecord,
    /// [`consts::option::NAWS`] Negotiate About Window Size [RFC1073](https://tools.ietf.org/html/rfc1073)
    NAWS,
    /// [`consts::option::TSPEED`] Terminal Speed [RFC1079](https://tools.ietf.org/html/rfc1079)
    TerminalSpeed,
    /// [`consts::option::LFLOW`] Remote Flow Control [RFC1372](https://tools.ietf.org/html/rfc1372)
    FlowControl,
    /// [`consts::option::LINEMODE`] Linemode [RFC1184](https://tools.ietf.org/html/rfc1184)
    Linemode,
    /// [`consts::option::NEW_ENVIRON`] New Environment [RFC1572](https://tools.ietf.org/html/rfc1572)
    NewEnvironment,
    /// Any other option code
    Unknown(u8),
}

impl TelnetOption {
    /// Option code sent on the wire.
    pub fn to_u8(self) -> u8 {
        match self {
            TelnetOption::TransmitBinary => consts::option::BINARY,
            TelnetOption::Echo => consts::option::ECHO,
            TelnetOption::SuppressGoAhead => consts::option::SGA,
            TelnetOption::Status => consts::option::STATUS,
            TelnetOption::TimingMark => consts::option::TM,
            TelnetOption::TerminalType => consts::option::TTYPE,
            TelnetOption::EndOfRecord => consts::option::EOR,
            TelnetOption::NAWS => consts::option::NAWS,
            TelnetOption::TerminalSpeed => consts::option::TSPEED,
            TelnetOption::FlowControl => consts::option::LFLOW,
            TelnetOption::Linemode => consts::option::LINEMODE,
            TelnetOption::NewEnvironment => consts::option::NEW_ENVIRON,
            TelnetOption::Unknown(byte) => byte,
        }
    }

    /// Option for a wire code.
    pub fn from_u8(byte: u8) -> Self {
        match byte {
            consts::option::BINARY => TelnetOption::TransmitBinary,
            consts::option::ECHO => TelnetOption::Echo,
            consts::option::SGA => TelnetOption::SuppressGoAhead,
            consts::option::STATUS => TelnetOption::Status,
            consts::option::TM => TelnetOption::TimingMark,
            consts::option::TTYPE => TelnetOption::TerminalType,
            consts::option::EOR => TelnetOption::EndOfRecord,
            consts::option::NAWS => TelnetOption::NAWS,
            consts::option::TSPEED => TelnetOption::TerminalSpeed,
            consts::option::LFLOW => TelnetOption::FlowControl,
            consts::option::LINEMODE => TelnetOption::Linemode,
            consts::option::NEW_ENVIRON => TelnetOption::NewEnvironment,
            byte => TelnetOption::Unknown(byte),
        }
    }

    /// Whether this side will agree to perform the option (answer DO with WILL).
    pub fn supported_local(self) -> bool {
        matches!(
            self,
            TelnetOption::TransmitBinary | TelnetOption::Echo | TelnetOption::SuppressGoAhead
        )
    }

    /// Whether this side will let the peer perform the option (answer WILL with DO).
    pub fn supported_remote(self) -> bool {
        matches!(
            self,
            TelnetOption::TransmitBinary | TelnetOption::SuppressGoAhead | TelnetOption::NAWS
        )
    }
}

impl fmt::Display for TelnetOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelnetOption::Unknown(byte) => write!(f, "Unknown({byte})"),
            option => write!(f, "{option:?}"),
        }
    }
}

impl From<u8> for TelnetOption {
    fn from(byte: u8) -> Self {
        TelnetOption::from_u8(byte)
    }
}

impl From<TelnetOption> for u8 {
    fn from(option: TelnetOption) -> Self {
        option.to_u8()
    }
}

/// Which end of the connection performs an option.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TelnetSide {
    /// This end
    Local,
    /// The peer
    Remote,
}

impl fmt::Display for TelnetSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelnetSide::Local => write!(f, "Local"),
            TelnetSide::Remote => write!(f, "Remote"),
        }
    }
}

/// Negotiation state of one side of one option (RFC 1143 without the opposite queue).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum QState {
    /// Disabled
    #[default]
    No,
    /// Enable requested, awaiting answer
    WantYes,
    /// Enabled
    Yes,
    /// Disable requested, awaiting answer
    WantNo,
}

#[derive(Clone, Copy, Debug, Default)]
struct OptionState {
    local: QState,
    remote: QState,
}

/// Negotiation state for every option code.
///
/// Requests (`enable_*`/`disable_*`) move an option into a `Want*` state and return the frame to
/// send; received negotiations settle the state and return the reply, if one is owed. An answer
/// that merely acknowledges our own request is never replied to, which keeps the exchange loop
/// free.
#[derive(Clone, Debug)]
pub struct TelnetOptions {
    state: [OptionState; 256],
}

impl TelnetOptions {
    fn entry(&mut self, option: TelnetOption) -> &mut OptionState {
        &mut self.state[usize::from(option.to_u8())]
    }

    pub(crate) fn local_qstate(&self, option: TelnetOption) -> QState {
        self.state[usize::from(option.to_u8())].local
    }

    pub(crate) fn remote_qstate(&self, option: TelnetOption) -> QState {
        self.state[usize::from(option.to_u8())].remote
    }

    /// Returns `true` if this side currently performs `option`.
    pub fn local_enabled(&self, option: TelnetOption) -> bool {
        self.local_qstate(option) == QState::Yes
    }

    /// Returns `true` if the peer currently performs `option`.
    pub fn remote_enabled(&self, option: TelnetOption) -> bool {
        self.remote_qstate(option) == QState::Yes
    }

    /// Offers to perform `option` locally, returning `WILL` if a request must be sent.
    pub fn enable_local(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        if !option.supported_local() {
            return None;
        }
        let entry = self.entry(option);
        match entry.local {
            QState::No | QState::WantNo => {
                entry.local = QState::WantYes;
                Some(TelnetFrame::Will(option))
            }
            QState::WantYes | QState::Yes => None,
        }
    }

    /// Stops performing `option` locally, returning `WONT` if a request must be sent.
    pub fn disable_local(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let entry = self.entry(option);
        match entry.local {
            QState::Yes | QState::WantYes => {
                entry.local = QState::WantNo;
                Some(TelnetFrame::Wont(option))
            }
            QState::No | QState::WantNo => None,
        }
    }

    /// Asks the peer to perform `option`, returning `DO` if a request must be sent.
    pub fn enable_remote(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        if !option.supported_remote() {
            return None;
        }
        let entry = self.entry(option);
        match entry.remote {
            QState::No | QState::WantNo => {
                entry.remote = QState::WantYes;
                Some(TelnetFrame::Do(option))
            }
            QState::WantYes | QState::Yes => None,
        }
    }

    /// Asks the peer to stop performing `option`, returning `DONT` if a request must be sent.
    pub fn disable_remote(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let entry = self.entry(option);
        match entry.remote {
            QState::Yes | QState::WantYes => {
                entry.remote = QState::WantNo;
                Some(TelnetFrame::Dont(option))
            }
            QState::No | QState::WantNo => None,
        }
    }

    /// Peer sent `DO option`.
    pub(crate) fn recv_do(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let supported = option.supported_local();
        let entry = self.entry(option);
        match entry.local {
            QState::No if supported => {
                entry.local = QState::Yes;
                Some(TelnetFrame::Will(option))
            }
            QState::No => Some(TelnetFrame::Wont(option)),
            QState::WantYes => {
                entry.local = QState::Yes;
                None
            }
            QState::Yes => None,
            QState::WantNo => {
                entry.local = QState::No;
                None
            }
        }
    }

    /// Peer sent `DONT option`.
    pub(crate) fn recv_dont(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let entry = self.entry(option);
        match entry.local {
            QState::Yes => {
                entry.local = QState::No;
                Some(TelnetFrame::Wont(option))
            }
            QState::WantYes | QState::WantNo => {
                entry.local = QState::No;
                None
            }
            QState::No => None,
        }
    }

    /// Peer sent `WILL option`.
    pub(crate) fn recv_will(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let supported = option.supported_remote();
        let entry = self.entry(option);
        match entry.remote {
            QState::No if supported => {
                entry.remote = QState::Yes;
                Some(TelnetFrame::Do(option))
            }
            QState::No => Some(TelnetFrame::Dont(option)),
            QState::WantYes => {
                entry.remote = QState::Yes;
                None
            }
            QState::Yes => None,
            QState::WantNo => {
                entry.remote = QState::No;
                None
            }
        }
    }

    /// Peer sent `WONT option`.
    pub(crate) fn recv_wont(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        let entry = self.entry(option);
        match entry.remote {
            QState::Yes => {
                entry.remote = QState::No;
                Some(TelnetFrame::Dont(option))
            }
            QState::WantYes | QState::WantNo => {
                entry.remote = QState::No;
                None
            }
            QState::No => None,
        }
    }
}

impl Default for TelnetOptions {
    fn default() -> Self {
        TelnetOptions {
            state: [OptionState::default(); 256],
        }
    }
}
