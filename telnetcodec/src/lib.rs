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

//! # x0 Telnet Protocol Codec
//!
//! Byte-oriented Telnet (RFC 854) codec used by the simulator's line service. It implements the
//! `tokio_util::codec` [`Decoder`](tokio_util::codec::Decoder) and
//! [`Encoder`](tokio_util::codec::Encoder) traits but carries no runtime of its own; the caller
//! feeds it whatever bytes a read produced and writes out whatever it encodes.
//!
//! ## Core Components
//!
//! - [`TelnetCodec`]: decoder state machine, encoder and option negotiation table.
//! - [`TelnetFrame`]: protocol elements as written to the wire.
//! - [`TelnetEvent`]: what the decoder reports to the application.
//! - [`TelnetOption`]: option codes, with the set this codec will agree to.
//!
//! ## Option Negotiation
//!
//! Requests made with `enable_*`/`disable_*` return the frame to send. Negotiations received
//! from the peer are answered automatically; replies are queued inside the codec and collected
//! with [`TelnetCodec::take_replies`].
//!
//! | Option            | Local (we WILL) | Remote (peer WILL) |
//! |-------------------|-----------------|--------------------|
//! | `TransmitBinary`  | yes             | yes                |
//! | `Echo`            | yes             | no                 |
//! | `SuppressGoAhead` | yes             | yes                |
//! | `NAWS`            | no              | yes                |
//!
//! Everything else is refused.
//!
//! ## Usage Example
//!
//! ```rust
//! use bytes::BytesMut;
//! use tokio_util::codec::{Decoder, Encoder};
//! use x0_telnetcodec::{TelnetCodec, TelnetEvent, TelnetFrame, TelnetOption};
//!
//! let mut codec = TelnetCodec::new();
//! let mut output = BytesMut::new();
//! if let Some(frame) = codec.enable_local(TelnetOption::Echo) {
//!     codec.encode(frame, &mut output).unwrap();
//! }
//! assert_eq!(&output[..], &[0xFF, 0xFB, 0x01]);
//!
//! let mut input = BytesMut::from(&b"hi\xFF\xFD\x01"[..]);
//! let mut events = Vec::new();
//! while let Some(event) = codec.decode(&mut input).unwrap() {
//!     events.push(event);
//! }
//! assert_eq!(events[0], TelnetEvent::Data(b'h'));
//! assert!(codec.is_enabled_local(TelnetOption::Echo));
//! ```

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

mod codec;
pub mod consts;
mod event;
mod frame;
pub mod naws;
mod options;
mod result;

pub use self::codec::{MAX_SUBNEGOTIATION_LEN, TelnetCodec};
pub use self::event::TelnetEvent;
pub use self::frame::TelnetFrame;
pub use self::options::{TelnetOption, TelnetOptions, TelnetSide};
pub use self::result::{CodecError, CodecResult};
