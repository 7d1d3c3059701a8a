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

//! Slab-backed doubly linked session list
//!
//! Slots are reserved before they are linked so a session record can exist while its factory
//! is still building it. Only linked entries count towards [`SessionList::len`].

use slab::Slab;

#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
    linked: bool,
}

#[derive(Debug)]
pub(crate) struct SessionList<T> {
    slots: Slab<Node<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> SessionList<T> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Slab::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of linked entries.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Index the next [`reserve`](Self::reserve) will use.
    pub(crate) fn vacant_index(&self) -> usize {
        self.slots.vacant_key()
    }

    /// Stores an unlinked value.
    pub(crate) fn reserve(&mut self, value: T) -> usize {
        self.slots.insert(Node {
            value,
            prev: None,
            next: None,
            linked: false,
        })
    }

    /// Links a reserved entry at the tail.
    pub(crate) fn link_tail(&mut self, index: usize) {
        let old_tail = self.tail;
        match self.slots.get_mut(index) {
            Some(node) if !node.linked => {
                node.linked = true;
                node.prev = old_tail;
                node.next = None;
            }
            _ => return,
        }

        match old_tail.and_then(|tail| self.slots.get_mut(tail)) {
            Some(tail) => tail.next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
    }

    /// Unlinks (when linked) and frees an entry.
    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        let node = self.slots.try_remove(index)?;
        if node.linked {
            match node.prev.and_then(|prev| self.slots.get_mut(prev)) {
                Some(prev) => prev.next = node.next,
                None => self.head = node.next,
            }
            match node.next.and_then(|next| self.slots.get_mut(next)) {
                Some(next) => next.prev = node.prev,
                None => self.tail = node.prev,
            }
            self.len -= 1;
        }
        Some(node.value)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).map(|node| &node.value)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).map(|node| &mut node.value)
    }

    #[cfg(test)]
    pub(crate) fn is_linked(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|node| node.linked)
    }

    pub(crate) fn tail(&self) -> Option<usize> {
        self.tail
    }

    /// Linked indices from head to tail.
    pub(crate) fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.head, |&index| {
            self.slots.get(index).and_then(|node| node.next)
        })
    }
}
