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

//! # x0 Host Runtime
//!
//! Single-threaded, cooperative runtime used by the x0 RV32IM simulator host. It provides:
//!
//! - **Event dispatching**: [`Dispatcher`] multiplexes descriptor readiness and timer deadlines
//!   into one-shot callbacks, identified by never-reused [`HandlerId`]s.
//! - **Main loop**: [`MainLoop`] drives the dispatcher until a terminating signal arrives or
//!   [`LoopStopper::stop`] is called.
//! - **Streams**: [`Stream`] performs non-blocking reads and writes with optional [`Timeout`]s,
//!   reporting each completion with a [`ResultCode`].
//! - **Diagnostics**: priority-filtered logging on top of `tracing` ([`log`]) and fatal
//!   [`abort`](abort::abort) reporting.
//!
//! ## Dispatch Model
//!
//! ```text
//! MainLoop::run
//!     ↓
//! Dispatcher::poll(block = true)
//!     ↓  GC → poll(2) → I/O callbacks → timer callbacks
//! Stream / Service handlers
//! ```
//!
//! Every handler fires at most once. Handlers that need to observe further events re-register
//! themselves from inside their callback, which is always safe: the dispatcher never holds
//! internal borrows while user code runs.
//!
//! ## Thread Safety
//!
//! The dispatcher and everything built on it are `!Send`. Exactly one thread owns the
//! dispatcher; only [`LoopStopper`] may cross threads.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]

pub mod abort;
pub mod clock;
mod error;
mod event;
pub mod heap;
pub mod log;
mod mainloop;
mod result;
mod stream;
mod timeout;

pub use self::abort::AbortReason;
pub use self::error::{RuntimeError, RuntimeResult};
pub use self::event::{Dispatcher, Events, HandlerId};
pub use self::log::Priority;
pub use self::mainloop::{LoopStopper, MainLoop, TERMINATING_SIGNALS};
pub use self::result::ResultCode;
pub use self::stream::{Completion, Stream};
pub use self::timeout::Timeout;

#[doc(hidden)]
pub use tracing as __tracing;
