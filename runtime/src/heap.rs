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

//! Allocation helpers that abort instead of failing
//!
//! The runtime's record arrays grow by doubling. Growth goes through [`grow`], which reports an
//! allocation failure as [`AbortReason::OutOfMemory`] with the requested byte count.

use crate::abort::{AbortReason, abort};

/// Capacity of a freshly allocated record array.
pub const INITIAL_CAPACITY: usize = 16;

/// Allocates an empty vector able to hold exactly `capacity` elements.
pub fn with_capacity<T>(capacity: usize) -> Vec<T> {
    let mut vec = Vec::new();
    reserve_exact(&mut vec, capacity);
    vec
}

/// Doubles the capacity of `vec` (or raises it to [`INITIAL_CAPACITY`]).
pub fn grow<T>(vec: &mut Vec<T>) {
    let target = vec.capacity().saturating_mul(2).max(INITIAL_CAPACITY);
    reserve_exact(vec, target - vec.len());
}

fn reserve_exact<T>(vec: &mut Vec<T>, additional: usize) {
    if vec.try_reserve_exact(additional).is_err() {
        abort(
            AbortReason::OutOfMemory,
            additional.saturating_mul(size_of::<T>()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_capacity() {
        let vec: Vec<u64> = with_capacity(INITIAL_CAPACITY);
        assert!(vec.capacity() >= INITIAL_CAPACITY);
        assert!(vec.is_empty());
    }

    #[test]
    fn test_grow_doubles() {
        let mut vec: Vec<u32> = with_capacity(INITIAL_CAPACITY);
        vec.extend(0..INITIAL_CAPACITY as u32);
        let before = vec.capacity();
        grow(&mut vec);
        assert!(vec.capacity() >= before * 2);
        assert_eq!(vec.len(), INITIAL_CAPACITY);
    }

    #[test]
    fn test_grow_empty_vec() {
        let mut vec: Vec<u8> = Vec::new();
        grow(&mut vec);
        assert!(vec.capacity() >= INITIAL_CAPACITY);
    }
}
