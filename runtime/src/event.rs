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

//! Descriptor and timer event dispatcher
//!
//! The [`Dispatcher`] keeps two record arrays: I/O records (paired index-for-index with the
//! `pollfd` array handed to `poll(2)`) and timer records. A single dispatch step, [`Dispatcher::poll`],
//! runs in four phases:
//!
//! 1. **Collect**: records tombstoned since the previous step are removed by back-swap, keeping the
//!    I/O records and their poll descriptors co-indexed.
//! 2. **Wait**: `poll(2)` blocks until a descriptor is ready or the earliest timer is due.
//! 3. **I/O**: every ready record is tombstoned and then its callback runs.
//! 4. **Timers**: the clock is read again and every expired timer is tombstoned and then run.
//!
//! Records are never removed while a step is dispatching, so callbacks may register and
//! unregister handlers (including their own) without invalidating the iteration.

use crate::abort::{AbortReason, abort};
use crate::{clock, heap};
use bitflags::bitflags;
use std::cell::RefCell;
use std::fmt;
use std::io;
use std::num::NonZeroU64;
use std::os::fd::RawFd;
use std::rc::Rc;

bitflags! {
    /// Readiness conditions, as understood by `poll(2)`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Events: u32 {
        /// Data may be read without blocking
        const IN = libc::POLLIN as u32;
        /// Urgent data may be read
        const PRI = libc::POLLPRI as u32;
        /// Data may be written without blocking
        const OUT = libc::POLLOUT as u32;
        /// Error condition (returned only)
        const ERR = libc::POLLERR as u32;
        /// Hang-up (returned only)
        const HUP = libc::POLLHUP as u32;
        /// Descriptor is not open (returned only)
        const NVAL = libc::POLLNVAL as u32;
    }
}

/// Identifies a registered handler.
///
/// Identifiers are allocated from a single counter per dispatcher and are never reused, so a
/// stale identifier can always be passed to `unregister_*` safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(NonZeroU64);

impl HandlerId {
    /// Raw identifier value; never zero.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

type IoCallback = Box<dyn FnOnce(Events)>;
type TimerCallback = Box<dyn FnOnce()>;

/// Id of a tombstoned record.
const TOMBSTONE: u64 = 0;

struct IoRecord {
    id: u64,
    callback: Option<IoCallback>,
}

struct TimerRecord {
    id: u64,
    expiry: i64,
    callback: Option<TimerCallback>,
}

struct State {
    last_id: u64,
    io_records: Vec<IoRecord>,
    pollfds: Vec<libc::pollfd>,
    timers: Vec<TimerRecord>,
}

impl State {
    fn new() -> Self {
        Self {
            last_id: 0,
            io_records: heap::with_capacity(heap::INITIAL_CAPACITY),
            pollfds: heap::with_capacity(heap::INITIAL_CAPACITY),
            timers: heap::with_capacity(heap::INITIAL_CAPACITY),
        }
    }

    fn allocate_id(&mut self) -> HandlerId {
        self.last_id += 1;
        match NonZeroU64::new(self.last_id) {
            Some(id) => HandlerId(id),
            None => crate::x0_unreachable!(),
        }
    }

    fn collect_garbage(&mut self) {
        let mut index = 0;
        while index < self.io_records.len() {
            if self.io_records[index].id == TOMBSTONE {
                self.io_records.swap_remove(index);
                self.pollfds.swap_remove(index);
            } else {
                index += 1;
            }
        }

        let mut index = 0;
        while index < self.timers.len() {
            if self.timers[index].id == TOMBSTONE {
                self.timers.swap_remove(index);
            } else {
                index += 1;
            }
        }
    }

    /// Poll timeout in milliseconds, `-1` meaning "wait indefinitely".
    fn poll_timeout(&self, now: i64) -> libc::c_int {
        let earliest = self
            .timers
            .iter()
            .filter(|timer| timer.id != TOMBSTONE)
            .map(|timer| (timer.expiry - now).max(0))
            .min();

        match earliest {
            None => -1,
            Some(remaining) => remaining.min(i64::from(libc::c_int::MAX)) as libc::c_int,
        }
    }

    /// Tombstones the ready I/O record at `index`, returning its callback.
    fn take_ready_io(&mut self, index: usize) -> Option<(IoCallback, Events)> {
        let revents = self.pollfds[index].revents;
        let record = &mut self.io_records[index];
        if revents == 0 || record.id == TOMBSTONE {
            return None;
        }

        record.id = TOMBSTONE;
        let events = Events::from_bits_retain(u32::from(revents as u16));
        record.callback.take().map(|callback| (callback, events))
    }

    /// Tombstones the expired timer at `index`, returning its callback.
    fn take_expired_timer(&mut self, index: usize, now: i64) -> Option<TimerCallback> {
        let timer = &mut self.timers[index];
        if timer.expiry > now || timer.id == TOMBSTONE {
            return None;
        }

        timer.id = TOMBSTONE;
        timer.callback.take()
    }
}

/// Single-threaded I/O and timer multiplexer.
///
/// `Dispatcher` is a cheap handle; clones share the same record arrays. Callbacks are one-shot:
/// a handler that wants to observe further events registers itself again from its callback.
///
/// # Example
///
/// ```no_run
/// use x0_runtime::{Dispatcher, Events};
///
/// let dispatcher = Dispatcher::new();
/// dispatcher.register_timer(10, || println!("tick"));
/// dispatcher.poll(true);
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    state: Rc<RefCell<State>>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State::new())),
        }
    }

    /// Current monotonic time in milliseconds.
    pub fn clock(&self) -> i64 {
        clock::now_ms()
    }

    /// Registers `callback` to run once when `fd` reports any of `events`.
    ///
    /// Error and hang-up conditions are always reported by `poll(2)`, whether requested or not.
    pub fn register_io<F>(&self, fd: RawFd, events: Events, callback: F) -> HandlerId
    where
        F: FnOnce(Events) + 'static,
    {
        crate::x0_assert!(fd >= 0);
        crate::x0_assert!(!events.is_empty());

        let mut state = self.state.borrow_mut();
        if state.io_records.len() == state.io_records.capacity() {
            heap::grow(&mut state.io_records);
            heap::grow(&mut state.pollfds);
        }

        let id = state.allocate_id();
        state.io_records.push(IoRecord {
            id: id.get(),
            callback: Some(Box::new(callback)),
        });
        state.pollfds.push(libc::pollfd {
            fd,
            events: events.bits() as libc::c_short,
            revents: 0,
        });
        tracing::trace!("Registered {} for fd {} ({:?})", id, fd, events);
        id
    }

    /// Cancels an I/O handler. Unknown or already dispatched ids are ignored.
    pub fn unregister_io(&self, id: HandlerId) {
        let callback = {
            let mut state = self.state.borrow_mut();
            state
                .io_records
                .iter_mut()
                .find(|record| record.id == id.get())
                .and_then(|record| {
                    record.id = TOMBSTONE;
                    record.callback.take()
                })
        };
        // Dropped outside the borrow: captured state may unregister further handlers.
        drop(callback);
    }

    /// Registers `callback` to run once, `period_ms` milliseconds from now.
    pub fn register_timer<F>(&self, period_ms: i64, callback: F) -> HandlerId
    where
        F: FnOnce() + 'static,
    {
        crate::x0_assert!(period_ms >= 0);

        let expiry = clock::now_ms().saturating_add(period_ms);
        let mut state = self.state.borrow_mut();
        if state.timers.len() == state.timers.capacity() {
            heap::grow(&mut state.timers);
        }

        let id = state.allocate_id();
        state.timers.push(TimerRecord {
            id: id.get(),
            expiry,
            callback: Some(Box::new(callback)),
        });
        tracing::trace!("Registered {} expiring in {}ms", id, period_ms);
        id
    }

    /// Cancels a timer. Unknown or already dispatched ids are ignored.
    pub fn unregister_timer(&self, id: HandlerId) {
        let callback = {
            let mut state = self.state.borrow_mut();
            state
                .timers
                .iter_mut()
                .find(|timer| timer.id == id.get())
                .and_then(|timer| {
                    timer.id = TOMBSTONE;
                    timer.callback.take()
                })
        };
        drop(callback);
    }

    /// Runs one dispatch step.
    ///
    /// With `block` set the step waits until a descriptor is ready or the earliest timer is due
    /// (indefinitely when there are no timers); otherwise it only collects what is already
    /// pending. All ready I/O callbacks run before any expired timer callback.
    pub fn poll(&self, block: bool) {
        self.wait(block);
        self.dispatch_io();
        self.dispatch_timers();
    }

    fn wait(&self, block: bool) {
        let mut state = self.state.borrow_mut();
        state.collect_garbage();
        for pfd in &mut state.pollfds {
            pfd.revents = 0;
        }

        loop {
            let timeout = if block {
                state.poll_timeout(clock::now_ms())
            } else {
                0
            };

            // SAFETY: `pollfds` is a live, exclusively borrowed array of `len()` pollfd structs.
            let result = unsafe {
                libc::poll(
                    state.pollfds.as_mut_ptr(),
                    state.pollfds.len() as libc::nfds_t,
                    timeout,
                )
            };
            if result >= 0 {
                return;
            }

            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                crate::fatal!("Event polling error: {}", err);
                abort(
                    AbortReason::UnhandledError,
                    err.raw_os_error().unwrap_or(0) as usize,
                );
            }
        }
    }

    fn dispatch_io(&self) {
        let mut index = 0;
        loop {
            let ready = {
                let mut state = self.state.borrow_mut();
                if index >= state.io_records.len() {
                    break;
                }
                state.take_ready_io(index)
            };
            if let Some((callback, events)) = ready {
                callback(events);
            }
            index += 1;
        }
    }

    fn dispatch_timers(&self) {
        let now = clock::now_ms();
        let mut index = 0;
        loop {
            let expired = {
                let mut state = self.state.borrow_mut();
                if index >= state.timers.len() {
                    break;
                }
                state.take_expired_timer(index, now)
            };
            if let Some(callback) = expired {
                callback();
            }
            index += 1;
        }
    }

    /// Number of live (not tombstoned) I/O handlers.
    pub fn io_count(&self) -> usize {
        let state = self.state.borrow();
        state
            .io_records
            .iter()
            .filter(|record| record.id != TOMBSTONE)
            .count()
    }

    /// Number of live (not tombstoned) timers.
    pub fn timer_count(&self) -> usize {
        let state = self.state.borrow();
        state
            .timers
            .iter()
            .filter(|timer| timer.id != TOMBSTONE)
            .count()
    }

    /// Returns `true` if no live handler of either kind remains.
    pub fn is_empty(&self) -> bool {
        self.io_count() == 0 && self.timer_count() == 0
    }

    #[cfg(test)]
    fn slot_count(&self) -> (usize, usize) {
        let state = self.state.borrow();
        (state.io_records.len(), state.timers.len())
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("io_handlers", &self.io_count())
            .field("timers", &self.timer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    #[test]
    fn test_handler_ids_are_unique_and_non_zero() {
        let dispatcher = Dispatcher::new();
        let mut seen = HashSet::new();
        for period in 0..100 {
            let id = dispatcher.register_timer(period, || {});
            assert_ne!(id.get(), 0);
            assert!(seen.insert(id));
        }
        assert_eq!(dispatcher.timer_count(), 100);
    }

    #[test]
    fn test_handler_id_display() {
        let dispatcher = Dispatcher::new();
        let id = dispatcher.register_timer(0, || {});
        assert_eq!(id.to_string(), "handler-1");
    }

    #[test]
    fn test_zero_timer_fires_once_and_is_collected() {
        let dispatcher = Dispatcher::new();
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        dispatcher.register_timer(0, move || counter.set(counter.get() + 1));

        dispatcher.poll(true);
        assert_eq!(fired.get(), 1);
        assert_eq!(dispatcher.timer_count(), 0);
        assert_eq!(dispatcher.slot_count(), (0, 1));

        dispatcher.poll(false);
        assert_eq!(fired.get(), 1);
        assert_eq!(dispatcher.slot_count(), (0, 0));
    }

    #[test]
    fn test_unregistered_timer_never_fires() {
        let dispatcher = Dispatcher::new();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let id = dispatcher.register_timer(0, move || flag.set(true));
        dispatcher.unregister_timer(id);
        assert!(dispatcher.is_empty());

        dispatcher.poll(false);
        assert!(!fired.get());
        assert_eq!(dispatcher.slot_count(), (0, 0));
    }

    #[test]
    fn test_unregister_unknown_id_is_ignored() {
        let dispatcher = Dispatcher::new();
        let id = dispatcher.register_timer(0, || {});
        dispatcher.poll(true);
        dispatcher.unregister_timer(id);
        dispatcher.unregister_io(id);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_capacity_grows_past_initial() {
        let dispatcher = Dispatcher::new();
        for _ in 0..(heap::INITIAL_CAPACITY * 3) {
            dispatcher.register_timer(1000, || {});
        }
        assert_eq!(dispatcher.timer_count(), heap::INITIAL_CAPACITY * 3);
    }

    #[test]
    fn test_timer_can_reregister_from_callback() {
        fn arm(dispatcher: &Dispatcher, remaining: Rc<Cell<u32>>) {
            let next = dispatcher.clone();
            dispatcher.register_timer(0, move || {
                remaining.set(remaining.get() - 1);
                if remaining.get() > 0 {
                    arm(&next, remaining);
                }
            });
        }

        let dispatcher = Dispatcher::new();
        let remaining = Rc::new(Cell::new(3));
        arm(&dispatcher, remaining.clone());
        for _ in 0..10 {
            if remaining.get() == 0 {
                break;
            }
            dispatcher.poll(true);
        }
        assert_eq!(remaining.get(), 0);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_poll_timeout_clamps() {
        let mut state = State::new();
        assert_eq!(state.poll_timeout(0), -1);
        state.timers.push(TimerRecord {
            id: 1,
            expiry: i64::MAX,
            callback: None,
        });
        assert_eq!(state.poll_timeout(0), libc::c_int::MAX);
        state.timers.push(TimerRecord {
            id: 2,
            expiry: 5,
            callback: None,
        });
        assert_eq!(state.poll_timeout(0), 5);
        assert_eq!(state.poll_timeout(10), 0);
    }
}
