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

//! Priority-filtered diagnostic logging
//!
//! Diagnostics are emitted with the ordinary `tracing` macros. This module maps `tracing` levels
//! onto the five runtime [`Priority`]s, installs a stderr subscriber rendering lines as
//! `[info   ]: message`, and keeps the minimum priority in an atomic so that
//! [`set_min_priority`] takes effect immediately.
//!
//! | Priority  | Emitted with                          |
//! |-----------|---------------------------------------|
//! | `Detail`  | `tracing::debug!` / `tracing::trace!` |
//! | `Info`    | `tracing::info!`                      |
//! | `Warning` | `tracing::warn!`                      |
//! | `Error`   | `tracing::error!`                     |
//! | `Fatal`   | [`fatal!`](crate::fatal)              |

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Target under which fatal events are emitted.
pub const FATAL_TARGET: &str = "x0::fatal";

static MIN_PRIORITY: AtomicU8 = AtomicU8::new(Priority::Info as u8);

/// Emits an event at [`Priority::Fatal`].
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {
        $crate::__tracing::error!(target: "x0::fatal", $($arg)+)
    };
}

/// Diagnostic priority, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    /// Debugging detail
    Detail = 0,
    /// Normal operational messages
    Info = 1,
    /// Something unexpected but recoverable
    Warning = 2,
    /// An operation failed
    Error = 3,
    /// The process cannot continue
    Fatal = 4,
}

impl Priority {
    /// Label used in rendered log lines.
    pub fn label(self) -> &'static str {
        match self {
            Priority::Detail => "detail",
            Priority::Info => "info",
            Priority::Warning => "warning",
            Priority::Error => "error",
            Priority::Fatal => "fatal",
        }
    }

    /// Converts a stored priority value. Unknown values are a programming error.
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Priority::Detail,
            1 => Priority::Info,
            2 => Priority::Warning,
            3 => Priority::Error,
            4 => Priority::Fatal,
            _ => crate::x0_unreachable!(),
        }
    }

    /// Priority of a `tracing` event or span.
    pub fn of(metadata: &Metadata<'_>) -> Self {
        if metadata.target() == FATAL_TARGET {
            return Priority::Fatal;
        }

        let level = *metadata.level();
        if level == Level::ERROR {
            Priority::Error
        } else if level == Level::WARN {
            Priority::Warning
        } else if level == Level::INFO {
            Priority::Info
        } else {
            Priority::Detail
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "detail" => Ok(Priority::Detail),
            "info" => Ok(Priority::Info),
            "warning" => Ok(Priority::Warning),
            "error" => Ok(Priority::Error),
            "fatal" => Ok(Priority::Fatal),
            _ => Err(format!("unknown log priority '{s}'")),
        }
    }
}

/// Current minimum priority.
pub fn min_priority() -> Priority {
    Priority::from_u8(MIN_PRIORITY.load(Ordering::SeqCst))
}

/// Atomically replaces the minimum priority, returning the previous one.
pub fn set_min_priority(priority: Priority) -> Priority {
    Priority::from_u8(MIN_PRIORITY.swap(priority as u8, Ordering::SeqCst))
}

/// Returns `true` if messages of `priority` pass the current filter.
pub fn is_enabled(priority: Priority) -> bool {
    priority >= min_priority()
}

/// Installs the stderr subscriber and sets the minimum priority.
///
/// If a global subscriber is already installed only the priority is updated.
pub fn init(priority: Priority) {
    let _ = set_min_priority(priority);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(PriorityFormat)
        .with_filter(filter_fn(|metadata| is_enabled(Priority::of(metadata))));

    if tracing_subscriber::registry().with(layer).try_init().is_err() {
        tracing::debug!("Log subscriber already installed");
    }
}

/// Event formatter producing `\r[<priority>]: <fields>` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityFormat;

impl<S, N> FormatEvent<S, N> for PriorityFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let priority = Priority::of(event.metadata());
        write!(writer, "\r[{:<7}]: ", priority.label())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Detail < Priority::Info);
        assert!(Priority::Info < Priority::Warning);
        assert!(Priority::Warning < Priority::Error);
        assert!(Priority::Error < Priority::Fatal);
    }

    #[test]
    fn test_priority_parse_and_display() {
        for priority in [
            Priority::Detail,
            Priority::Info,
            Priority::Warning,
            Priority::Error,
            Priority::Fatal,
        ] {
            assert_eq!(priority.to_string().parse::<Priority>(), Ok(priority));
        }
        assert!("verbose".parse::<Priority>().is_err());
    }

    #[test]
    fn test_set_min_priority_returns_previous() {
        let original = set_min_priority(Priority::Warning);
        assert_eq!(set_min_priority(Priority::Error), Priority::Warning);
        assert!(!is_enabled(Priority::Warning));
        assert!(is_enabled(Priority::Fatal));
        assert_eq!(set_min_priority(original), Priority::Error);
    }
}
