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

//! Result taxonomy shared by streams, services and the main loop

use std::fmt;

/// Closed set of operation outcomes.
///
/// Streams report one of `Ok`, `Hup`, `IoError` or `Timeout` to their completion callbacks.
/// `InvalidArg` and `CannotBindService` are produced by address parsing and service start-up,
/// and double as process exit codes through [`ResultCode::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
    /// Operation succeeded
    Ok = 0,
    /// Peer hung up
    Hup = 1,
    /// I/O failure other than would-block or interruption
    IoError = 2,
    /// Deadline passed before the operation completed
    Timeout = 3,
    /// Caller supplied an invalid argument
    InvalidArg = 4,
    /// A service could not bind its listening socket
    CannotBindService = 5,
}

impl ResultCode {
    /// Numeric code, suitable for use as a process exit status.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Returns `true` for [`ResultCode::Ok`].
    pub fn is_ok(self) -> bool {
        self == ResultCode::Ok
    }

    /// Short human readable label.
    pub fn label(self) -> &'static str {
        match self {
            ResultCode::Ok => "ok",
            ResultCode::Hup => "hang-up",
            ResultCode::IoError => "I/O error",
            ResultCode::Timeout => "timeout",
            ResultCode::InvalidArg => "invalid argument",
            ResultCode::CannotBindService => "cannot bind service",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
