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

//! Asynchronous duplex streams over raw descriptors
//!
//! A [`Stream`] wraps a read descriptor and a write descriptor (the same socket for a TCP
//! connection, two ends of two pipes for a child process). Each direction has one operation slot:
//! starting a read while a read is in flight is a programming error, but a read and a write may
//! be in flight together.
//!
//! An operation registers a one-shot I/O handler and, when a [`Timeout`] is given, a one-shot
//! timer. Whichever fires first cancels the other, returns the slot to idle and then hands a
//! [`Completion`] to the caller:
//!
//! | Condition                             | Result                  | Transferred |
//! |---------------------------------------|-------------------------|-------------|
//! | Transfer succeeded (0 on EOF)         | [`ResultCode::Ok`]      | N           |
//! | Transfer would block                  | [`ResultCode::Ok`]      | 0           |
//! | Descriptor hung up                    | [`ResultCode::Hup`]     | 0           |
//! | Any other I/O error                   | [`ResultCode::IoError`] | 0           |
//! | Timeout expired first                 | [`ResultCode::Timeout`] | 0           |

use crate::abort::{AbortReason, abort};
use crate::{Dispatcher, Events, HandlerId, ResultCode, Timeout};
use bytes::{BufMut, BytesMut};
use std::cell::RefCell;
use std::fmt;
use std::io;
use std::os::fd::RawFd;
use std::rc::{Rc, Weak};

/// Outcome of an asynchronous read or write.
#[derive(Debug)]
pub struct Completion {
    /// Classified result
    pub result: ResultCode,
    /// Bytes read or written
    pub transferred: usize,
    /// The buffer passed to the operation; reads have appended the received bytes
    pub buffer: BytesMut,
}

type CompletionCallback = Box<dyn FnOnce(Completion)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Read,
    Write,
}

impl Direction {
    fn events(self) -> Events {
        match self {
            Direction::Read => Events::IN,
            Direction::Write => Events::OUT,
        }
    }
}

struct Operation {
    buffer: BytesMut,
    max: usize,
    callback: CompletionCallback,
    io_id: HandlerId,
    timer_id: Option<HandlerId>,
}

struct Inner {
    dispatcher: Dispatcher,
    read_fd: Option<RawFd>,
    write_fd: Option<RawFd>,
    read: RefCell<Option<Operation>>,
    write: RefCell<Option<Operation>>,
}

impl Inner {
    fn fd(&self, direction: Direction) -> Option<RawFd> {
        match direction {
            Direction::Read => self.read_fd,
            Direction::Write => self.write_fd,
        }
    }

    fn slot(&self, direction: Direction) -> &RefCell<Option<Operation>> {
        match direction {
            Direction::Read => &self.read,
            Direction::Write => &self.write,
        }
    }

    fn on_ready(weak: &Weak<Inner>, direction: Direction, events: Events) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let Some(operation) = inner.slot(direction).borrow_mut().take() else {
            return;
        };
        if let Some(timer_id) = operation.timer_id {
            inner.dispatcher.unregister_timer(timer_id);
        }

        let Operation {
            mut buffer,
            max,
            callback,
            ..
        } = operation;
        let (result, transferred) = inner.transfer(direction, events, &mut buffer, max);
        callback(Completion {
            result,
            transferred,
            buffer,
        });
    }

    fn on_timeout(weak: &Weak<Inner>, direction: Direction) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let Some(operation) = inner.slot(direction).borrow_mut().take() else {
            return;
        };
        inner.dispatcher.unregister_io(operation.io_id);

        (operation.callback)(Completion {
            result: ResultCode::Timeout,
            transferred: 0,
            buffer: operation.buffer,
        });
    }

    fn transfer(
        &self,
        direction: Direction,
        events: Events,
        buffer: &mut BytesMut,
        max: usize,
    ) -> (ResultCode, usize) {
        if !events.intersects(direction.events()) {
            return if events.contains(Events::HUP) {
                (ResultCode::Hup, 0)
            } else {
                tracing::debug!("Stream {:?} error condition: {:?}", direction, events);
                (ResultCode::IoError, 0)
            };
        }

        let Some(fd) = self.fd(direction) else {
            crate::x0_unreachable!();
        };
        let outcome = match direction {
            Direction::Read => read_into(fd, buffer, max),
            Direction::Write => write_from(fd, &buffer[..max.min(buffer.len())]),
        };

        match outcome {
            Ok(n) => (ResultCode::Ok, n),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => (ResultCode::Ok, 0),
            Err(err) => {
                tracing::debug!("Stream {:?} failed on fd {}: {}", direction, fd, err);
                (ResultCode::IoError, 0)
            }
        }
    }

    fn cancel(&self, operation: Option<Operation>) {
        if let Some(operation) = operation {
            self.dispatcher.unregister_io(operation.io_id);
            if let Some(timer_id) = operation.timer_id {
                self.dispatcher.unregister_timer(timer_id);
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let read = self.read.get_mut().take();
        let write = self.write.get_mut().take();
        self.cancel(read);
        self.cancel(write);
    }
}

/// Runs a syscall returning a byte count, retrying on `EINTR`.
fn retry_interrupted(mut syscall: impl FnMut() -> isize) -> io::Result<usize> {
    loop {
        let n = syscall();
        if n >= 0 {
            return Ok(n as usize);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

fn read_into(fd: RawFd, buffer: &mut BytesMut, max: usize) -> io::Result<usize> {
    buffer.reserve(max);
    let chunk = buffer.chunk_mut();
    let len = max.min(chunk.len());
    let ptr = chunk.as_mut_ptr();

    // SAFETY: `ptr` addresses at least `len` writable bytes of spare buffer capacity.
    let n = retry_interrupted(|| unsafe { libc::read(fd, ptr.cast(), len) })?;

    // SAFETY: the kernel initialised exactly `n <= len` bytes at `ptr`.
    unsafe { buffer.advance_mut(n) };
    Ok(n)
}

fn write_from(fd: RawFd, data: &[u8]) -> io::Result<usize> {
    // SAFETY: `data` is a valid slice for the duration of the call.
    retry_interrupted(|| unsafe { libc::write(fd, data.as_ptr().cast(), data.len()) })
}

/// Non-blocking duplex stream driven by a [`Dispatcher`].
///
/// `Stream` is a cheap handle. It never closes its descriptors; the owner does. Dropping the last
/// handle, like [`Stream::destroy`], cancels any in-flight operation without completing it.
#[derive(Clone)]
pub struct Stream {
    inner: Rc<Inner>,
}

impl Stream {
    /// Creates a stream. At least one of the descriptors must be present; the descriptors should
    /// be in non-blocking mode.
    pub fn new(dispatcher: &Dispatcher, read_fd: Option<RawFd>, write_fd: Option<RawFd>) -> Self {
        crate::x0_assert!(read_fd.is_some() || write_fd.is_some());
        crate::x0_assert!(read_fd.is_none_or(|fd| fd >= 0));
        crate::x0_assert!(write_fd.is_none_or(|fd| fd >= 0));

        Self {
            inner: Rc::new(Inner {
                dispatcher: dispatcher.clone(),
                read_fd,
                write_fd,
                read: RefCell::new(None),
                write: RefCell::new(None),
            }),
        }
    }

    /// Read side descriptor.
    pub fn read_fd(&self) -> Option<RawFd> {
        self.inner.read_fd
    }

    /// Write side descriptor.
    pub fn write_fd(&self) -> Option<RawFd> {
        self.inner.write_fd
    }

    /// Returns `true` while a read is in flight.
    pub fn is_reading(&self) -> bool {
        self.inner.read.borrow().is_some()
    }

    /// Returns `true` while a write is in flight.
    pub fn is_writing(&self) -> bool {
        self.inner.write.borrow().is_some()
    }

    /// Reads up to `max` bytes, appending them to `buffer`.
    ///
    /// `callback` runs exactly once from a later dispatch step unless the stream is destroyed
    /// first.
    pub fn read_async<F>(&self, buffer: BytesMut, max: usize, timeout: Option<Timeout>, callback: F)
    where
        F: FnOnce(Completion) + 'static,
    {
        self.start(Direction::Read, buffer, max, timeout, Box::new(callback));
    }

    /// Writes up to `max` bytes from the front of `buffer`.
    ///
    /// The buffer is returned unchanged in the [`Completion`]; the caller advances it by
    /// `transferred`.
    pub fn write_async<F>(&self, buffer: BytesMut, max: usize, timeout: Option<Timeout>, callback: F)
    where
        F: FnOnce(Completion) + 'static,
    {
        self.start(Direction::Write, buffer, max, timeout, Box::new(callback));
    }

    fn start(
        &self,
        direction: Direction,
        buffer: BytesMut,
        max: usize,
        timeout: Option<Timeout>,
        callback: CompletionCallback,
    ) {
        let inner = &self.inner;
        let Some(fd) = inner.fd(direction) else {
            abort(AbortReason::AssertionFailure, line!() as usize);
        };
        crate::x0_assert!(inner.slot(direction).borrow().is_none());

        let weak = Rc::downgrade(inner);
        let io_id = inner
            .dispatcher
            .register_io(fd, direction.events(), move |events| {
                Inner::on_ready(&weak, direction, events);
            });
        let timer_id = timeout.map(|timeout| {
            let weak = Rc::downgrade(inner);
            inner
                .dispatcher
                .register_timer(timeout.remaining_ms(), move || {
                    Inner::on_timeout(&weak, direction);
                })
        });

        *inner.slot(direction).borrow_mut() = Some(Operation {
            buffer,
            max,
            callback,
            io_id,
            timer_id,
        });
    }

    /// Writes as much of `data` as the descriptor accepts right now.
    ///
    /// Returns `Ok(0)` if the write would block. Must not be used while an asynchronous write is
    /// in flight.
    pub fn write_sync(&self, data: &[u8]) -> io::Result<usize> {
        let Some(fd) = self.inner.write_fd else {
            abort(AbortReason::AssertionFailure, line!() as usize);
        };
        crate::x0_assert!(!self.is_writing());

        match write_from(fd, data) {
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(0),
            outcome => outcome,
        }
    }

    /// Cancels in-flight operations on both sides without invoking their callbacks.
    ///
    /// Descriptors are left open. Calling `destroy` more than once is harmless.
    pub fn destroy(&self) {
        let read = self.inner.read.borrow_mut().take();
        let write = self.inner.write.borrow_mut().take();
        self.inner.cancel(read);
        self.inner.cancel(write);
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("read_fd", &self.inner.read_fd)
            .field("write_fd", &self.inner.write_fd)
            .field("reading", &self.is_reading())
            .field("writing", &self.is_writing())
            .finish()
    }
}
