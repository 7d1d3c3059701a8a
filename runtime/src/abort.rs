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

//! Fatal abort reporting
//!
//! Programming errors (violated preconditions, impossible branches, allocation failure) are not
//! recoverable. They are reported through [`abort`], which writes a single diagnostic line at
//! fatal priority and terminates the process.

use std::fmt;

/// Reason codes accepted by [`abort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AbortReason {
    /// Metadata is the source line of the failed assertion
    AssertionFailure = 0,
    /// Metadata is the source line
    TypeMismatch = 1,
    /// Metadata is the source line
    IllegalBranch = 2,
    /// Metadata is the attempted allocation size in bytes
    OutOfMemory = 3,
    /// Metadata is the source line
    AtexitFailed = 4,
    /// No metadata
    LuaPanic = 5,
    /// No metadata
    UnhandledError = 6,
}

impl AbortReason {
    /// Numeric reason code.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Label written to the diagnostic line.
    pub fn label(self) -> &'static str {
        match self {
            AbortReason::AssertionFailure => "assertion failure",
            AbortReason::TypeMismatch => "type mismatch",
            AbortReason::IllegalBranch => "illegal branch",
            AbortReason::OutOfMemory => "out of memory",
            AbortReason::AtexitFailed => "atexit failed",
            AbortReason::LuaPanic => "lua panic",
            AbortReason::UnhandledError => "unhandled error",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Formats the diagnostic line written by [`abort`].
pub fn abort_message(reason: AbortReason, metadata: usize) -> String {
    format!(
        "ABORTED: {}: {}, {} (0x{:x})",
        reason.code(),
        reason.label(),
        metadata,
        metadata
    )
}

/// Logs `reason` and `metadata` at fatal priority, then aborts the process.
#[cold]
pub fn abort(reason: AbortReason, metadata: usize) -> ! {
    crate::fatal!("{}", abort_message(reason, metadata));
    std::process::abort()
}

/// Aborts with [`AbortReason::AssertionFailure`] and the current line when `cond` is false.
#[macro_export]
macro_rules! x0_assert {
    ($cond:expr $(,)?) => {
        if !$cond {
            $crate::abort::abort(
                $crate::abort::AbortReason::AssertionFailure,
                line!() as usize,
            );
        }
    };
}

/// Aborts with [`AbortReason::IllegalBranch`] and the current line.
#[macro_export]
macro_rules! x0_unreachable {
    () => {
        $crate::abort::abort($crate::abort::AbortReason::IllegalBranch, line!() as usize)
    };
}
