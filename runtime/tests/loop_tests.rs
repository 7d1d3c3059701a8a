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

//! Main loop shutdown paths

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use tracing_test::traced_test;
use x0_runtime::{Dispatcher, MainLoop};

fn raise_on_current_thread(signal: libc::c_int) {
    let rc = unsafe { libc::pthread_kill(libc::pthread_self(), signal) };
    assert_eq!(rc, 0);
}

#[test]
#[traced_test]
fn test_sigint_stops_loop_with_zero() {
    let dispatcher = Dispatcher::new();
    let main_loop = MainLoop::new(&dispatcher);
    dispatcher.register_timer(10, || raise_on_current_thread(libc::SIGINT));

    assert_eq!(main_loop.run(), 0);
    assert!(!main_loop.is_running());
    assert!(dispatcher.is_empty());
    assert!(logs_contain("Received signal 2"));
}

#[test]
fn test_sigterm_overrides_pending_work() {
    let dispatcher = Dispatcher::new();
    let main_loop = MainLoop::new(&dispatcher);
    let ticks = Rc::new(Cell::new(0));

    fn tick(dispatcher: &Dispatcher, ticks: Rc<Cell<u32>>) {
        let again = dispatcher.clone();
        dispatcher.register_timer(1, move || {
            ticks.set(ticks.get() + 1);
            if ticks.get() == 3 {
                raise_on_current_thread(libc::SIGTERM);
            }
            tick(&again, ticks);
        });
    }
    tick(&dispatcher, ticks.clone());

    assert_eq!(main_loop.run(), 0);
    assert!(ticks.get() >= 3);
    assert_eq!(dispatcher.io_count(), 0);
    assert_eq!(dispatcher.timer_count(), 1);
}

#[test]
fn test_stop_records_exit_code() {
    let dispatcher = Dispatcher::new();
    let main_loop = MainLoop::new(&dispatcher);
    let stopper = main_loop.stopper();
    dispatcher.register_timer(0, move || stopper.stop(5));

    assert_eq!(main_loop.run(), 5);
}

#[test]
fn test_stop_from_another_thread_is_observed() {
    let dispatcher = Dispatcher::new();
    let main_loop = MainLoop::new(&dispatcher);
    let stopper = main_loop.stopper();

    // Keeps the loop waking up so the cross-thread store is noticed.
    fn heartbeat(dispatcher: &Dispatcher) {
        let again = dispatcher.clone();
        dispatcher.register_timer(5, move || heartbeat(&again));
    }
    heartbeat(&dispatcher);

    let handle = thread::spawn(move || {
        thread::sleep(std::time::Duration::from_millis(30));
        stopper.stop(9);
    });

    assert_eq!(main_loop.run(), 9);
    handle.join().unwrap();
}
