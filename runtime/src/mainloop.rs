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

//! Process main loop and terminating-signal handling

use crate::abort::{AbortReason, abort};
use crate::{Dispatcher, Events, RuntimeError, RuntimeResult};
use std::fmt;
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering, fence};

/// Signals that end the main loop with a zero exit code.
pub const TERMINATING_SIGNALS: [libc::c_int; 3] = [libc::SIGINT, libc::SIGTERM, libc::SIGQUIT];

#[derive(Debug)]
struct LoopControl {
    running: AtomicBool,
    result: AtomicI32,
}

/// Stops a [`MainLoop`]. May be sent to and used from any thread.
///
/// Stopping from another thread takes effect when the loop next wakes up.
#[derive(Debug, Clone)]
pub struct LoopStopper {
    control: Arc<LoopControl>,
}

impl LoopStopper {
    /// Records `code` as the loop's exit code and asks the loop to end after the current step.
    pub fn stop(&self, code: i32) {
        self.control.result.store(code, Ordering::SeqCst);
        fence(Ordering::SeqCst);
        self.control.running.store(false, Ordering::SeqCst);
    }
}

/// Drives a [`Dispatcher`] until stopped or until SIGINT, SIGTERM or SIGQUIT is received.
pub struct MainLoop {
    dispatcher: Dispatcher,
    control: Arc<LoopControl>,
}

impl MainLoop {
    /// Creates a loop around `dispatcher`.
    pub fn new(dispatcher: &Dispatcher) -> Self {
        Self {
            dispatcher: dispatcher.clone(),
            control: Arc::new(LoopControl {
                running: AtomicBool::new(false),
                result: AtomicI32::new(0),
            }),
        }
    }

    /// Dispatcher driven by this loop.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns a handle that can stop the loop.
    pub fn stopper(&self) -> LoopStopper {
        LoopStopper {
            control: Arc::clone(&self.control),
        }
    }

    /// Same as [`LoopStopper::stop`].
    pub fn stop(&self, code: i32) {
        self.stopper().stop(code);
    }

    /// Returns `true` while [`MainLoop::run`] is dispatching.
    pub fn is_running(&self) -> bool {
        self.control.running.load(Ordering::SeqCst)
    }

    /// Runs dispatch steps until the loop is stopped, returning the exit code passed to `stop`.
    ///
    /// The terminating signals are blocked on the calling thread for the rest of its life and are
    /// consumed through a signal descriptor instead; any of them stops the loop with code 0.
    pub fn run(&self) -> i32 {
        let signals = match SignalDescriptor::open(&TERMINATING_SIGNALS) {
            Ok(signals) => signals,
            Err(err) => {
                tracing::error!("{}", err);
                abort(AbortReason::UnhandledError, 0);
            }
        };

        let stopper = self.stopper();
        let signal_fd = signals.as_raw_fd();
        let signal_id = self.dispatcher.register_io(signal_fd, Events::IN, move |_| {
            for signal in signals.drain() {
                tracing::info!("Received signal {}", signal);
            }
            stopper.stop(0);
        });

        self.control.running.store(true, Ordering::SeqCst);
        loop {
            self.dispatcher.poll(true);
            if !self.is_running() {
                break;
            }
        }

        // Drops the handler and with it the signal descriptor, if it never fired.
        self.dispatcher.unregister_io(signal_id);
        self.control.result.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for MainLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MainLoop")
            .field("running", &self.is_running())
            .field("result", &self.control.result.load(Ordering::SeqCst))
            .finish()
    }
}

/// A non-blocking `signalfd` for a set of blocked signals.
#[derive(Debug)]
struct SignalDescriptor {
    fd: OwnedFd,
}

impl SignalDescriptor {
    fn open(signals: &[libc::c_int]) -> RuntimeResult<Self> {
        // SAFETY: an all-zero sigset_t is a valid argument to sigemptyset.
        let mut mask: libc::sigset_t = unsafe { mem::zeroed() };

        // SAFETY: `mask` is a valid, writable signal set and the signal numbers are valid.
        unsafe {
            libc::sigemptyset(&raw mut mask);
            for &signal in signals {
                libc::sigaddset(&raw mut mask, signal);
            }
        }

        // SAFETY: `mask` is initialised; the old mask is not requested.
        let rc = unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, &raw const mask, ptr::null_mut()) };
        if rc != 0 {
            return Err(RuntimeError::SignalMask(io::Error::from_raw_os_error(rc)));
        }

        // SAFETY: `mask` is initialised; -1 requests a new descriptor.
        let fd = unsafe {
            libc::signalfd(-1, &raw const mask, libc::SFD_NONBLOCK | libc::SFD_CLOEXEC)
        };
        if fd < 0 {
            return Err(RuntimeError::SignalDescriptor(io::Error::last_os_error()));
        }

        // SAFETY: `fd` is a freshly created descriptor owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self { fd })
    }

    /// Reads every pending signal, returning their numbers.
    fn drain(&self) -> Vec<u32> {
        let mut received = Vec::new();
        loop {
            // SAFETY: an all-zero signalfd_siginfo is a valid read target.
            let mut info: libc::signalfd_siginfo = unsafe { mem::zeroed() };
            let size = mem::size_of::<libc::signalfd_siginfo>();

            // SAFETY: `info` is a writable buffer of exactly `size` bytes.
            let n = unsafe { libc::read(self.fd.as_raw_fd(), (&raw mut info).cast(), size) };
            if n == size as isize {
                received.push(info.ssi_signo);
                continue;
            }
            if n < 0 && io::Error::last_os_error().kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return received;
        }
    }
}

impl AsRawFd for SignalDescriptor {
    fn as_raw_fd(&self) -> std::os::fd::RawFd {
        self.fd.as_raw_fd()
    }
}
