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

//! Unit tests for telnetcodec components

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing_test::traced_test;
use x0_telnetcodec::{
    TelnetCodec, TelnetEvent, TelnetFrame, TelnetOption, TelnetSide, consts, naws,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn encode_frame(codec: &mut TelnetCodec, frame: TelnetFrame) -> BytesMut {
    let mut buffer = BytesMut::new();
    codec.encode(frame, &mut buffer).unwrap();
    buffer
}

fn decode_all(codec: &mut TelnetCodec, bytes: &[u8]) -> Vec<TelnetEvent> {
    let mut buffer = BytesMut::from(bytes);
    let mut events = Vec::new();
    while let Some(event) = codec.decode(&mut buffer).unwrap() {
        events.push(event);
    }
    events
}

// ============================================================================
// TelnetOption Tests
// ============================================================================

#[test]
fn telnet_option_from_u8() {
    assert_eq!(TelnetOption::from(0), TelnetOption::TransmitBinary);
    assert_eq!(TelnetOption::from(1), TelnetOption::Echo);
    assert_eq!(TelnetOption::from(3), TelnetOption::SuppressGoAhead);
    assert_eq!(TelnetOption::from(31), TelnetOption::NAWS);
    assert_eq!(TelnetOption::from(34), TelnetOption::Linemode);
    assert_eq!(TelnetOption::from(200), TelnetOption::Unknown(200));
}

#[test]
fn telnet_option_display() {
    assert_eq!(TelnetOption::Echo.to_string(), "Echo");
    assert_eq!(TelnetOption::NAWS.to_string(), "NAWS");
    assert_eq!(TelnetOption::Unknown(99).to_string(), "Unknown(99)");
}

// ============================================================================
// Encoding Tests
// ============================================================================

#[test]
fn encode_data_escapes_iac() {
    let mut codec = TelnetCodec::new();
    assert_eq!(&encode_frame(&mut codec, TelnetFrame::Data(b'A'))[..], b"A");
    assert_eq!(
        &encode_frame(&mut codec, TelnetFrame::Data(consts::IAC))[..],
        &[consts::IAC, consts::IAC]
    );
}

#[test]
fn encode_commands() {
    let mut codec = TelnetCodec::new();
    let cases = [
        (TelnetFrame::NoOperation, consts::NOP),
        (TelnetFrame::DataMark, consts::DM),
        (TelnetFrame::Break, consts::BRK),
        (TelnetFrame::InterruptProcess, consts::IP),
        (TelnetFrame::AbortOutput, consts::AO),
        (TelnetFrame::AreYouThere, consts::AYT),
        (TelnetFrame::EraseCharacter, consts::EC),
        (TelnetFrame::EraseLine, consts::EL),
        (TelnetFrame::GoAhead, consts::GA),
        (TelnetFrame::EndOfRecord, consts::EOR),
    ];
    for (frame, command) in cases {
        assert_eq!(&encode_frame(&mut codec, frame)[..], &[consts::IAC, command]);
    }
}

#[test]
fn encode_negotiation() {
    let mut codec = TelnetCodec::new();
    assert_eq!(
        &encode_frame(&mut codec, TelnetFrame::Wont(TelnetOption::Linemode))[..],
        &[consts::IAC, consts::WONT, consts::option::LINEMODE]
    );
    assert_eq!(
        &encode_frame(&mut codec, TelnetFrame::Do(TelnetOption::NAWS))[..],
        &[consts::IAC, consts::DO, consts::option::NAWS]
    );
}

#[test]
fn encode_subnegotiation_escapes_payload() {
    let mut codec = TelnetCodec::new();
    let frame = TelnetFrame::Subnegotiate(
        TelnetOption::NAWS,
        Bytes::from_static(&[0x00, 0xFF, 0x00, 0x18]),
    );
    assert_eq!(
        &encode_frame(&mut codec, frame)[..],
        &[
            consts::IAC,
            consts::SB,
            consts::option::NAWS,
            0x00,
            0xFF,
            0xFF,
            0x00,
            0x18,
            consts::IAC,
            consts::SE
        ]
    );
}

#[test]
fn encode_data_block() {
    let mut codec = TelnetCodec::new();
    let mut buffer = BytesMut::new();
    codec.encode(&b"a\xFFb"[..], &mut buffer).unwrap();
    assert_eq!(&buffer[..], b"a\xFF\xFFb");
}

// ============================================================================
// Decoding Tests
// ============================================================================

#[test]
fn decode_escaped_iac_is_data() {
    let mut codec = TelnetCodec::new();
    assert_eq!(
        decode_all(&mut codec, &[consts::IAC, consts::IAC]),
        vec![TelnetEvent::Data(0xFF)]
    );
}

#[test]
fn decode_commands() {
    let mut codec = TelnetCodec::new();
    let events = decode_all(
        &mut codec,
        &[
            consts::IAC,
            consts::AYT,
            consts::IAC,
            consts::EC,
            consts::IAC,
            consts::EL,
            consts::IAC,
            consts::IP,
        ],
    );
    assert_eq!(
        events,
        vec![
            TelnetEvent::AreYouThere,
            TelnetEvent::EraseCharacter,
            TelnetEvent::EraseLine,
            TelnetEvent::InterruptProcess,
        ]
    );
}

#[test]
#[traced_test]
fn decode_unknown_command_is_no_operation() {
    let mut codec = TelnetCodec::new();
    assert_eq!(
        decode_all(&mut codec, &[consts::IAC, 0x10, b'x']),
        vec![TelnetEvent::NoOperation, TelnetEvent::Data(b'x')]
    );
    assert!(logs_contain("Received Unknown Command"));
}

#[test]
fn decode_partial_command_across_reads() {
    let mut codec = TelnetCodec::new();
    assert!(decode_all(&mut codec, &[consts::IAC]).is_empty());
    assert!(decode_all(&mut codec, &[consts::WILL]).is_empty());
    assert_eq!(
        decode_all(&mut codec, &[consts::option::NAWS]),
        vec![TelnetEvent::OptionStatus(
            TelnetOption::NAWS,
            TelnetSide::Remote,
            true
        )]
    );
    assert_eq!(
        codec.take_replies(),
        vec![TelnetFrame::Do(TelnetOption::NAWS)]
    );
}

#[test]
fn decode_naws_window_size() {
    let mut codec = TelnetCodec::new();
    let events = decode_all(
        &mut codec,
        &[
            consts::IAC,
            consts::SB,
            consts::option::NAWS,
            0x00,
            0x50,
            0x00,
            0x18,
            consts::IAC,
            consts::SE,
        ],
    );
    assert_eq!(events, vec![TelnetEvent::WindowSize(80, 24)]);
}

#[test]
fn decode_naws_with_escaped_iac() {
    let mut codec = TelnetCodec::new();
    let mut payload = BytesMut::new();
    naws::WindowSize::new(0x00FF, 0x0030).encode(&mut payload);
    let frame = TelnetFrame::Subnegotiate(TelnetOption::NAWS, payload.freeze());
    let wire = encode_frame(&mut codec, frame);
    assert_eq!(
        decode_all(&mut codec, &wire),
        vec![TelnetEvent::WindowSize(255, 48)]
    );
}

#[test]
#[traced_test]
fn decode_malformed_naws_is_ignored() {
    let mut codec = TelnetCodec::new();
    let events = decode_all(
        &mut codec,
        &[
            consts::IAC,
            consts::SB,
            consts::option::NAWS,
            0x00,
            0x50,
            consts::IAC,
            consts::SE,
        ],
    );
    assert_eq!(events, vec![TelnetEvent::NoOperation]);
    assert!(logs_contain("Invalid NAWS subnegotiation"));
}

#[test]
fn decode_other_subnegotiation_passes_payload() {
    let mut codec = TelnetCodec::new();
    let events = decode_all(
        &mut codec,
        &[
            consts::IAC,
            consts::SB,
            consts::option::TTYPE,
            0,
            b'v',
            b't',
            consts::IAC,
            consts::SE,
        ],
    );
    assert_eq!(
        events,
        vec![TelnetEvent::Subnegotiate(
            TelnetOption::TerminalType,
            Bytes::from_static(&[0, b'v', b't'])
        )]
    );
}

#[test]
fn decode_aborted_subnegotiation_resumes_data() {
    let mut codec = TelnetCodec::new();
    let events = decode_all(
        &mut codec,
        &[
            consts::IAC,
            consts::SB,
            consts::option::TTYPE,
            b'x',
            consts::IAC,
            consts::NOP,
            b'y',
        ],
    );
    assert_eq!(events, vec![TelnetEvent::NoOperation, TelnetEvent::Data(b'y')]);
}

// ============================================================================
// Negotiation Tests
// ============================================================================

#[test]
fn server_negotiation_settles_without_loops() {
    let mut server = TelnetCodec::new();
    let requests: Vec<TelnetFrame> = [
        server.enable_local(TelnetOption::Echo),
        server.enable_local(TelnetOption::TransmitBinary),
        server.enable_remote(TelnetOption::TransmitBinary),
        server.enable_local(TelnetOption::SuppressGoAhead),
        server.enable_remote(TelnetOption::SuppressGoAhead),
        server.enable_remote(TelnetOption::NAWS),
    ]
    .into_iter()
    .flatten()
    .collect();
    assert_eq!(requests.len(), 6);

    // A cooperative client acknowledges everything.
    let answers = [
        consts::IAC, consts::DO, consts::option::ECHO,
        consts::IAC, consts::DO, consts::option::BINARY,
        consts::IAC, consts::WILL, consts::option::BINARY,
        consts::IAC, consts::DO, consts::option::SGA,
        consts::IAC, consts::WILL, consts::option::SGA,
        consts::IAC, consts::WILL, consts::option::NAWS,
    ];
    let events = decode_all(&mut server, &answers);
    assert_eq!(events.len(), 6);
    assert!(server.take_replies().is_empty());
    assert!(server.is_enabled_local(TelnetOption::Echo));
    assert!(server.is_enabled_remote(TelnetOption::NAWS));
}

#[test]
fn refusing_unsupported_options() {
    let mut codec = TelnetCodec::new();
    let events = decode_all(
        &mut codec,
        &[
            consts::IAC,
            consts::DO,
            consts::option::LINEMODE,
            consts::IAC,
            consts::WILL,
            consts::option::ECHO,
        ],
    );
    assert!(events.is_empty());
    assert_eq!(
        codec.take_replies(),
        vec![
            TelnetFrame::Wont(TelnetOption::Linemode),
            TelnetFrame::Dont(TelnetOption::Echo),
        ]
    );
}

#[test]
fn peer_withdrawing_option_reports_status() {
    let mut codec = TelnetCodec::new();
    decode_all(&mut codec, &[consts::IAC, consts::DO, consts::option::SGA]);
    assert_eq!(
        codec.take_replies(),
        vec![TelnetFrame::Will(TelnetOption::SuppressGoAhead)]
    );

    assert_eq!(
        decode_all(&mut codec, &[consts::IAC, consts::DONT, consts::option::SGA]),
        vec![TelnetEvent::OptionStatus(
            TelnetOption::SuppressGoAhead,
            TelnetSide::Local,
            false
        )]
    );
    assert_eq!(
        codec.take_replies(),
        vec![TelnetFrame::Wont(TelnetOption::SuppressGoAhead)]
    );
}

#[test]
fn local_disable_completes_silently() {
    let mut codec = TelnetCodec::new();
    decode_all(&mut codec, &[consts::IAC, consts::DO, consts::option::SGA]);
    codec.take_replies();
    assert_eq!(
        codec.disable_local(TelnetOption::SuppressGoAhead),
        Some(TelnetFrame::Wont(TelnetOption::SuppressGoAhead))
    );
    assert!(!codec.is_enabled_local(TelnetOption::SuppressGoAhead));
    assert!(decode_all(&mut codec, &[consts::IAC, consts::DONT, consts::option::SGA]).is_empty());
    assert!(codec.take_replies().is_empty());
}
