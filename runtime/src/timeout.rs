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

//! Absolute deadlines on the monotonic clock

use crate::clock;
use std::time::Duration;

/// A deadline expressed as an absolute instant on [`clock::now_ms`].
///
/// # Example
///
/// ```no_run
/// use x0_runtime::Timeout;
///
/// let timeout = Timeout::new(50);
/// assert!(timeout.remaining_ms() <= 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeout {
    expiry: i64,
}

impl Timeout {
    /// Starts a timeout that expires `period_ms` milliseconds from now.
    pub fn new(period_ms: i64) -> Self {
        crate::x0_assert!(period_ms >= 0);

        Self {
            expiry: clock::now_ms().saturating_add(period_ms),
        }
    }

    /// Starts a timeout from a [`Duration`], saturating at `i64::MAX` milliseconds.
    pub fn from_duration(period: Duration) -> Self {
        Self::new(i64::try_from(period.as_millis()).unwrap_or(i64::MAX))
    }

    /// Creates a timeout expiring at the given absolute clock value.
    pub fn at(expiry: i64) -> Self {
        Self { expiry }
    }

    /// Absolute expiry instant in milliseconds.
    pub fn expiry(&self) -> i64 {
        self.expiry
    }

    /// Milliseconds until expiry, or zero if the deadline has passed.
    pub fn remaining_ms(&self) -> i64 {
        (self.expiry - clock::now_ms()).max(0)
    }

    /// Returns `true` once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.remaining_ms() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_is_bounded_by_period() {
        let timeout = Timeout::new(1000);
        let remaining = timeout.remaining_ms();
        assert!(remaining <= 1000);
        assert!(remaining > 900);
        assert!(!timeout.is_expired());
    }

    #[test]
    fn test_remaining_clamps_to_zero() {
        let timeout = Timeout::at(clock::now_ms() - 500);
        assert_eq!(timeout.remaining_ms(), 0);
        assert!(timeout.is_expired());
    }

    #[test]
    fn test_zero_period_expires_immediately() {
        assert_eq!(Timeout::new(0).remaining_ms(), 0);
    }

    #[test]
    fn test_from_duration() {
        let timeout = Timeout::from_duration(Duration::from_secs(2));
        assert!(timeout.remaining_ms() > 1900);
        assert!(Timeout::from_duration(Duration::MAX).remaining_ms() > 0);
    }
}
