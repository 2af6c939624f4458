//! Sequence numbers shared between the two annotation surfaces.
//!
//! [`SharedNumbering`] hands out termination numbers. Every termination
//! point on either surface holds its number; when the last holder is removed
//! the number goes into a pool and is reused smallest-first before the
//! counter advances. [`SharedCounter`] numbers strata labels and never
//! recycles.
//!
//! Both are cheap handles around `Rc` state: cloning a handle shares the
//! underlying counter, which is how both surfaces observe each other's
//! allocations. The engine is single-threaded, so `Rc`/`RefCell` suffice.

#[cfg(test)]
#[path = "numbering_test.rs"]
mod numbering_test;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::consts::MAX_REGISTRY_NUMBER;

/// Free numbers as disjoint inclusive ranges, `start -> end`.
#[derive(Debug, Default)]
struct FreeRanges {
    ranges: BTreeMap<u32, u32>,
}

impl FreeRanges {
    fn first(&self) -> Option<u32> {
        self.ranges.keys().next().copied()
    }

    fn pop_first(&mut self) -> Option<u32> {
        let (start, end) = self.ranges.pop_first()?;
        if start < end {
            self.ranges.insert(start + 1, end);
        }
        Some(start)
    }

    fn contains(&self, n: u32) -> bool {
        self.ranges.range(..=n).next_back().is_some_and(|(_, &end)| n <= end)
    }

    fn insert_range(&mut self, start: u32, end: u32) {
        if start > end {
            return;
        }
        let mut start = start;
        let mut end = end;
        let before = self.ranges.range(..start).next_back().map(|(&s, &e)| (s, e));
        if let Some((s, e)) = before {
            if e.saturating_add(1) >= start {
                start = s;
                end = end.max(e);
                self.ranges.remove(&s);
            }
        }
        loop {
            let after = self.ranges.range(start..).next().map(|(&s, &e)| (s, e));
            let Some((s, e)) = after else {
                break;
            };
            if s > end.saturating_add(1) {
                break;
            }
            end = end.max(e);
            self.ranges.remove(&s);
        }
        self.ranges.insert(start, end);
    }

    fn remove(&mut self, n: u32) {
        let Some((&start, &end)) = self.ranges.range(..=n).next_back() else {
            return;
        };
        if n > end {
            return;
        }
        self.ranges.remove(&start);
        if start < n {
            self.ranges.insert(start, n - 1);
        }
        if n < end {
            self.ranges.insert(n + 1, end);
        }
    }

    fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.ranges.iter().flat_map(|(&s, &e)| s..=e)
    }

    fn clear(&mut self) {
        self.ranges.clear();
    }
}

/// Counter, free pool and per-number holder counts.
#[derive(Debug, Default)]
struct NumberPool {
    count: u32,
    free: FreeRanges,
    holders: BTreeMap<u32, u32>,
}

/// Shared handle to the termination number registry.
#[derive(Debug, Clone, Default)]
pub struct SharedNumbering {
    inner: Rc<RefCell<NumberPool>>,
}

impl SharedNumbering {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a number: the smallest pooled one, else `count + 1`.
    ///
    /// The caller places an element carrying it and [`claim`](Self::claim)s
    /// it, or hands it back with [`recycle`](Self::recycle).
    pub fn next(&self) -> u32 {
        let mut pool = self.inner.borrow_mut();
        if let Some(n) = pool.free.pop_first() {
            return n;
        }
        pool.count = pool.count.saturating_add(1);
        pool.count
    }

    /// The number [`next`](Self::next) would return, without allocating it.
    #[must_use]
    pub fn peek(&self) -> u32 {
        let pool = self.inner.borrow();
        pool.free.first().unwrap_or_else(|| pool.count.saturating_add(1))
    }

    /// Return an unheld number to the pool. Idempotent; numbers still held by
    /// an element, and numbers never handed out, are ignored.
    pub fn recycle(&self, n: u32) {
        let mut pool = self.inner.borrow_mut();
        if n == 0 || n > pool.count || pool.holders.contains_key(&n) {
            return;
        }
        pool.free.insert_range(n, n);
    }

    /// Record one more element holding `n`: placement, redo, undo of an
    /// erase, or load.
    ///
    /// Numbers above the counter advance it and pool the skipped values.
    /// Numbers above [`MAX_REGISTRY_NUMBER`] are not tracked.
    pub fn claim(&self, n: u32) {
        if n == 0 || n > MAX_REGISTRY_NUMBER {
            if n != 0 {
                tracing::warn!(number = n, "termination number above registry range; not tracked");
            }
            return;
        }
        let mut pool = self.inner.borrow_mut();
        if n > pool.count {
            let gap_start = pool.count + 1;
            pool.free.insert_range(gap_start, n - 1);
            pool.count = n;
        }
        pool.free.remove(n);
        *pool.holders.entry(n).or_insert(0) += 1;
    }

    /// Drop one holder of `n`. The last release pools the number.
    pub fn release(&self, n: u32) {
        let mut pool = self.inner.borrow_mut();
        let Some(held) = pool.holders.get_mut(&n) else {
            return;
        };
        *held -= 1;
        if *held == 0 {
            pool.holders.remove(&n);
            pool.free.insert_range(n, n);
            tracing::debug!(number = n, "termination number released");
        }
    }

    /// Elements currently holding `n`.
    #[must_use]
    pub fn holders(&self, n: u32) -> u32 {
        self.inner.borrow().holders.get(&n).copied().unwrap_or(0)
    }

    /// Whether `n` sits in the pool.
    #[must_use]
    pub fn is_available(&self, n: u32) -> bool {
        self.inner.borrow().free.contains(n)
    }

    /// Highest number ever handed out.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.inner.borrow().count
    }

    /// Pooled numbers, ascending.
    #[must_use]
    pub fn available(&self) -> Vec<u32> {
        self.inner.borrow().free.iter().collect()
    }

    /// Forget all allocations and holders.
    pub fn reset(&self) {
        let mut pool = self.inner.borrow_mut();
        pool.count = 0;
        pool.free.clear();
        pool.holders.clear();
    }

    /// Whether `other` is a handle onto the same registry.
    #[must_use]
    pub fn shares_with(&self, other: &SharedNumbering) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Shared monotonic counter for strata labels.
#[derive(Debug, Clone, Default)]
pub struct SharedCounter {
    value: Rc<Cell<u32>>,
}

impl SharedCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the new value.
    pub fn next(&self) -> u32 {
        let n = self.value.get() + 1;
        self.value.set(n);
        n
    }

    #[must_use]
    pub fn current(&self) -> u32 {
        self.value.get()
    }

    /// Raise the counter to at least `n` (used after loading saved labels).
    pub fn observe(&self, n: u32) {
        if n > self.value.get() {
            self.value.set(n);
        }
    }

    pub fn reset(&self) {
        self.value.set(0);
    }
}
