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

//! # x0 Services
//!
//! TCP services for the x0 host runtime. A [`Service`] owns a listening socket registered
//! with a [`Dispatcher`](x0_runtime::Dispatcher) and turns each accepted connection into a
//! session built by a [`SessionFactory`].
//!
//! - **Sessions**: every session gets a [`SessionContext`] carrying its [`Stream`](x0_runtime::Stream),
//!   peer address and a weak link back to its service.
//! - **Session cap**: connections beyond [`ServiceConfig::max_connections`] are closed as soon
//!   as they are accepted.
//! - **Telnet line sessions**: [`LineService`] negotiates a character mode telnet session,
//!   echoes input and hands complete lines to a [`LineHandler`].
//!
//! ## Example
//!
//! ```no_run
//! use x0_runtime::{Dispatcher, MainLoop};
//! use x0_service::{LineHandler, LineService, LineWriter, ServiceConfig, parse_bind_address};
//!
//! #[derive(Clone)]
//! struct Shout;
//!
//! impl LineHandler for Shout {
//!     fn on_line(&mut self, writer: &mut LineWriter<'_>, line: &str) {
//!         writer.write_line(&line.to_uppercase());
//!     }
//! }
//!
//! let dispatcher = Dispatcher::new();
//! let main_loop = MainLoop::new(&dispatcher);
//! let config = ServiceConfig::new("line", parse_bind_address("2323").unwrap());
//! let service = LineService::start(&dispatcher, config, Shout).unwrap();
//! let code = main_loop.run();
//! service.destroy();
//! std::process::exit(code);
//! ```
//!
//! ## Session Lifetime
//!
//! A session never tears itself down from inside one of its own stream callbacks. It posts a
//! zero-delay timer and closes its context from there, so the service can destroy the
//! stream once no callback of that stream is running.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod config;
mod error;
mod line;
mod list;
mod net;
mod service;
mod session;
mod telnet;

pub use self::config::{DEFAULT_LINE_PORT, DEFAULT_MAX_CONNECTIONS, ServiceConfig};
pub use self::error::{AddressError, ServiceError, ServiceResult};
pub use self::line::{Edit, LineAssembler, LineHandler, LineWriter, MAX_LINE_LEN};
pub use self::net::{DEFAULT_BIND_ADDRESS, parse_bind_address};
pub use self::service::{LISTEN_BACKLOG, Service};
pub use self::session::{SessionContext, SessionFactory, SessionKey, SessionOwner};
pub use self::telnet::{LineService, READ_CHUNK, TelnetSession};
