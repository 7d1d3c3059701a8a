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

use super::{CodecError, TelnetEvent, TelnetFrame, TelnetOption, TelnetSide, consts};
use crate::naws::WindowSize;
use crate::options::TelnetOptions;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

/// Longest subnegotiation payload retained; excess bytes are dropped.
pub const MAX_SUBNEGOTIATION_LEN: usize = 1024;

/// A codec for the Telnet protocol.
///
/// Decoding yields [`TelnetEvent`]s. Negotiation commands received from the peer are answered
/// through the codec's option table; the answers are queued and collected with
/// [`TelnetCodec::take_replies`], to be encoded and sent by the owner of the connection.
#[derive(Debug)]
pub struct TelnetCodec {
    decoder_buffer: BytesMut,
    decoder_state: DecoderState,
    options: TelnetOptions,
    replies: Vec<TelnetFrame>,
}

impl TelnetCodec {
    /// Creates a new instance of `TelnetCodec`.
    ///
    /// # Example
    /// ```
    /// use x0_telnetcodec::TelnetCodec;
    ///
    /// let codec = TelnetCodec::new();
    /// ```
    pub fn new() -> TelnetCodec {
        TelnetCodec::default()
    }

    /// Checks if a specific Telnet option is enabled locally.
    pub fn is_enabled_local(&self, option: TelnetOption) -> bool {
        self.options.local_enabled(option)
    }

    /// Checks if a specific Telnet option is enabled on the remote side.
    pub fn is_enabled_remote(&self, option: TelnetOption) -> bool {
        self.options.remote_enabled(option)
    }

    /// Request to enable a Telnet option locally (we will send WILL).
    ///
    /// # Returns
    /// - `Some(TelnetFrame)`: A negotiation frame to send to the remote side.
    /// - `None`: No negotiation needed (option already enabled, pending or not supported).
    pub fn enable_local(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.enable_local(option)
    }

    /// Request to disable a Telnet option locally (we will send WONT).
    pub fn disable_local(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.disable_local(option)
    }

    /// Request to enable a Telnet option on the remote side (we will send DO).
    pub fn enable_remote(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.enable_remote(option)
    }

    /// Request to disable a Telnet option on the remote side (we will send DONT).
    pub fn disable_remote(&mut self, option: TelnetOption) -> Option<TelnetFrame> {
        self.options.disable_remote(option)
    }

    /// Drains the negotiation replies queued by the decoder, oldest first.
    pub fn take_replies(&mut self) -> Vec<TelnetFrame> {
        std::mem::take(&mut self.replies)
    }

    /// Returns `true` if negotiation replies are waiting to be sent.
    pub fn has_replies(&self) -> bool {
        !self.replies.is_empty()
    }

    fn negotiate(&mut self, verb: u8, option: TelnetOption) -> Option<TelnetEvent> {
        let (side, before) = match verb {
            consts::DO | consts::DONT => (TelnetSide::Local, self.options.local_enabled(option)),
            _ => (TelnetSide::Remote, self.options.remote_enabled(option)),
        };

        let reply = match verb {
            consts::DO => self.options.recv_do(option),
            consts::DONT => self.options.recv_dont(option),
            consts::WILL => self.options.recv_will(option),
            _ => self.options.recv_wont(option),
        };
        if let Some(reply) = reply {
            debug!("Negotiation reply queued: {:?}", reply);
            self.replies.push(reply);
        }

        let after = match side {
            TelnetSide::Local => self.options.local_enabled(option),
            TelnetSide::Remote => self.options.remote_enabled(option),
        };
        (before != after).then_some(TelnetEvent::OptionStatus(option, side, after))
    }

    fn finish_subnegotiation(&mut self, option: u8) -> TelnetEvent {
        let option = TelnetOption::from_u8(option);
        let payload = self.decoder_buffer.split().freeze();
        match option {
            TelnetOption::NAWS => match WindowSize::decode(&mut payload.clone()) {
                Ok(size) => TelnetEvent::WindowSize(size.cols, size.rows),
                Err(err) => {
                    warn!("{}", err);
                    TelnetEvent::NoOperation
                }
            },
            _ => TelnetEvent::Subnegotiate(option, payload),
        }
    }

    fn push_subnegotiation_byte(&mut self, byte: u8) {
        if self.decoder_buffer.len() < MAX_SUBNEGOTIATION_LEN {
            self.decoder_buffer.put_u8(byte);
        } else {
            debug!("Subnegotiation payload exceeds {} bytes", MAX_SUBNEGOTIATION_LEN);
        }
    }
}

impl Default for TelnetCodec {
    fn default() -> Self {
        TelnetCodec {
            decoder_buffer: BytesMut::new(),
            decoder_state: DecoderState::NormalData,
            options: TelnetOptions::default(),
            replies: Vec::new(),
        }
    }
}

impl Decoder for TelnetCodec {
    type Item = TelnetEvent;
    type Error = CodecError;

    /// Decodes the next event from `src`, consuming bytes one at a time.
    ///
    /// ## States
    /// - `NormalData`: data bytes are emitted; `IAC` moves to `InterpretAsCommand`; `CR` is
    ///   emitted and moves to `CarriageReturn`, where a following `NUL` is swallowed.
    /// - `InterpretAsCommand`: two-byte commands are emitted; `IAC IAC` is a data byte 0xFF;
    ///   `DO`/`DONT`/`WILL`/`WONT` move to `Negotiate`; `SB` moves to `Subnegotiate`. Unknown
    ///   commands are logged and reported as `NoOperation`.
    /// - `Negotiate`: the option byte completes the command; the option table is updated.
    /// - `Subnegotiate`/`SubnegotiateArgument`/`SubnegotiateArgumentIAC`: the payload is
    ///   accumulated (with `IAC IAC` unescaped) until `IAC SE`.
    ///
    /// Returns `Ok(None)` once `src` is exhausted without completing an event.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<TelnetEvent>, Self::Error> {
        while src.has_remaining() {
            let byte = src.get_u8();

            if self.decoder_state == DecoderState::CarriageReturn {
                self.decoder_state = DecoderState::NormalData;
                if byte == consts::NUL {
                    continue;
                }
            }

            match (self.decoder_state, byte) {
                (DecoderState::NormalData | DecoderState::CarriageReturn, consts::IAC) => {
                    self.decoder_state = DecoderState::InterpretAsCommand;
                }
                (DecoderState::NormalData | DecoderState::CarriageReturn, consts::CR) => {
                    self.decoder_state = DecoderState::CarriageReturn;
                    return Ok(Some(TelnetEvent::Data(byte)));
                }
                (DecoderState::NormalData | DecoderState::CarriageReturn, _) => {
                    return Ok(Some(TelnetEvent::Data(byte)));
                }
                (DecoderState::InterpretAsCommand, command) => {
                    self.decoder_state = DecoderState::NormalData;
                    let event = match command {
                        consts::IAC => TelnetEvent::Data(consts::IAC),
                        consts::NOP => TelnetEvent::NoOperation,
                        consts::DM => TelnetEvent::DataMark,
                        consts::BRK => TelnetEvent::Break,
                        consts::IP => TelnetEvent::InterruptProcess,
                        consts::AO => TelnetEvent::AbortOutput,
                        consts::AYT => TelnetEvent::AreYouThere,
                        consts::EC => TelnetEvent::EraseCharacter,
                        consts::EL => TelnetEvent::EraseLine,
                        consts::GA => TelnetEvent::GoAhead,
                        consts::EOR => TelnetEvent::EndOfRecord,
                        consts::DO | consts::DONT | consts::WILL | consts::WONT => {
                            self.decoder_state = DecoderState::Negotiate(command);
                            continue;
                        }
                        consts::SB => {
                            self.decoder_state = DecoderState::Subnegotiate;
                            continue;
                        }
                        _ => {
                            warn!("Received Unknown Command {:#X}", command);
                            TelnetEvent::NoOperation
                        }
                    };
                    return Ok(Some(event));
                }
                (DecoderState::Negotiate(verb), _) => {
                    self.decoder_state = DecoderState::NormalData;
                    if let Some(event) = self.negotiate(verb, TelnetOption::from_u8(byte)) {
                        return Ok(Some(event));
                    }
                }
                (DecoderState::Subnegotiate, _) => {
                    self.decoder_buffer.clear();
                    self.decoder_state = DecoderState::SubnegotiateArgument(byte);
                }
                (DecoderState::SubnegotiateArgument(option), consts::IAC) => {
                    self.decoder_state = DecoderState::SubnegotiateArgumentIAC(option);
                }
                (DecoderState::SubnegotiateArgument(_), _) => {
                    self.push_subnegotiation_byte(byte);
                }
                (DecoderState::SubnegotiateArgumentIAC(option), consts::IAC) => {
                    self.decoder_state = DecoderState::SubnegotiateArgument(option);
                    self.push_subnegotiation_byte(consts::IAC);
                }
                (DecoderState::SubnegotiateArgumentIAC(option), consts::SE) => {
                    self.decoder_state = DecoderState::NormalData;
                    return Ok(Some(self.finish_subnegotiation(option)));
                }
                (DecoderState::SubnegotiateArgumentIAC(_), _) => {
                    self.decoder_state = DecoderState::NormalData;
                    self.decoder_buffer.clear();
                    warn!(
                        "Received Unknown or invalid Command during Subnegotiation {:#X}. Aborting",
                        byte
                    );
                    return Ok(Some(TelnetEvent::NoOperation));
                }
            }
        }
        Ok(None)
    }
}

impl Encoder<TelnetFrame> for TelnetCodec {
    type Error = CodecError;

    /// Encodes a frame, escaping IAC in data bytes and subnegotiation payloads.
    fn encode(&mut self, item: TelnetFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            TelnetFrame::Data(byte) => {
                dst.reserve(2);
                if byte == consts::IAC {
                    dst.put_u8(consts::IAC);
                }
                dst.put_u8(byte);
            }
            TelnetFrame::NoOperation => encode_command(dst, consts::NOP),
            TelnetFrame::DataMark => encode_command(dst, consts::DM),
            TelnetFrame::Break => encode_command(dst, consts::BRK),
            TelnetFrame::InterruptProcess => encode_command(dst, consts::IP),
            TelnetFrame::AbortOutput => encode_command(dst, consts::AO),
            TelnetFrame::AreYouThere => encode_command(dst, consts::AYT),
            TelnetFrame::EraseCharacter => encode_command(dst, consts::EC),
            TelnetFrame::EraseLine => encode_command(dst, consts::EL),
            TelnetFrame::GoAhead => encode_command(dst, consts::GA),
            TelnetFrame::EndOfRecord => encode_command(dst, consts::EOR),
            TelnetFrame::Do(option) => encode_negotiation(dst, consts::DO, option),
            TelnetFrame::Dont(option) => encode_negotiation(dst, consts::DONT, option),
            TelnetFrame::Will(option) => encode_negotiation(dst, consts::WILL, option),
            TelnetFrame::Wont(option) => encode_negotiation(dst, consts::WONT, option),
            TelnetFrame::Subnegotiate(option, payload) => {
                dst.reserve(payload.len() + 5);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SB);
                dst.put_u8(option.to_u8());
                put_escaped(dst, &payload);
                dst.put_u8(consts::IAC);
                dst.put_u8(consts::SE);
            }
        }
        Ok(())
    }
}

impl Encoder<&[u8]> for TelnetCodec {
    type Error = CodecError;

    /// Encodes a block of data bytes, escaping IAC.
    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len());
        put_escaped(dst, item);
        Ok(())
    }
}

fn encode_command(dst: &mut BytesMut, command: u8) {
    dst.reserve(2);
    dst.put_u8(consts::IAC);
    dst.put_u8(command);
}

fn encode_negotiation(dst: &mut BytesMut, verb: u8, option: TelnetOption) {
    dst.reserve(3);
    dst.put_u8(consts::IAC);
    dst.put_u8(verb);
    dst.put_u8(option.to_u8());
}

fn put_escaped(dst: &mut BytesMut, data: &[u8]) {
    for chunk in data.split_inclusive(|byte| *byte == consts::IAC) {
        dst.put_slice(chunk);
        if chunk.last() == Some(&consts::IAC) {
            dst.put_u8(consts::IAC);
        }
    }
}

/// Decoder state; see [`TelnetCodec::decode`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DecoderState {
    NormalData,
    CarriageReturn,
    InterpretAsCommand,
    Negotiate(u8),
    Subnegotiate,
    SubnegotiateArgument(u8),
    SubnegotiateArgumentIAC(u8),
}
