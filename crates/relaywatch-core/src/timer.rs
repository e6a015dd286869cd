//! Owned, cancelable one-shot timers.
//!
//! [`TimerQueue`] is a deadline-ordered set of pending timers. Scheduling
//! returns a [`TimerHandle`] which the owner keeps for as long as the timer
//! may still need cancelling; the handle is not `Clone`, so a timer can be
//! cancelled at most once and only by whoever holds it.
//!
//! The queue never sleeps. The driver asks for [`TimerQueue::next_deadline`],
//! waits, then drains [`TimerQueue::pop_expired`] with the current time.

use std::collections::{BTreeMap, HashMap};

use crate::env::Timestamp;

/// Identity of a scheduled timer, comparable against a fired timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Owned handle to a pending timer.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a TimerHandle leaves the timer armed with no way to cancel it"]
pub struct TimerHandle {
    id: TimerId,
}

impl TimerHandle {
    /// Identity of the timer this handle controls.
    pub fn id(&self) -> TimerId {
        self.id
    }
}

/// A timer whose deadline has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<K, I> {
    /// Identity of the timer that fired.
    pub timer: TimerId,
    /// Caller-defined key supplied at scheduling time.
    pub key: K,
    /// The deadline the timer was scheduled for.
    pub deadline: I,
}

/// Deadline-ordered queue of cancelable one-shot timers.
#[derive(Debug, Clone)]
pub struct TimerQueue<K, I> {
    next_id: u64,
    by_deadline: BTreeMap<(I, TimerId), K>,
    deadlines: HashMap<TimerId, I>,
}

impl<K, I: Timestamp> Default for TimerQueue<K, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, I: Timestamp> TimerQueue<K, I> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self { next_id: 0, by_deadline: BTreeMap::new(), deadlines: HashMap::new() }
    }

    /// Arm a timer that fires at `deadline`.
    ///
    /// Timers with equal deadlines fire in scheduling order.
    pub fn schedule(&mut self, key: K, deadline: I) -> TimerHandle {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        self.by_deadline.insert((deadline, id), key);
        self.deadlines.insert(id, deadline);
        TimerHandle { id }
    }

    /// Disarm a timer. Returns its key if it had not fired yet.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<K> {
        let deadline = self.deadlines.remove(&handle.id)?;
        self.by_deadline.remove(&(deadline, handle.id))
    }

    /// Deadline of a pending timer. `None` once fired or cancelled.
    pub fn deadline(&self, handle: &TimerHandle) -> Option<I> {
        self.deadlines.get(&handle.id).copied()
    }

    /// Earliest pending deadline. `None` if nothing is armed.
    pub fn next_deadline(&self) -> Option<I> {
        self.by_deadline.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return the earliest timer whose deadline is `<= now`.
    pub fn pop_expired(&mut self, now: I) -> Option<Fired<K, I>> {
        let (&(deadline, timer), _) = self.by_deadline.first_key_value()?;
        if deadline > now {
            return None;
        }

        let key = self.by_deadline.remove(&(deadline, timer))?;
        self.deadlines.remove(&timer);
        Some(Fired { timer, key, deadline })
    }

    /// Disarm every timer.
    pub fn clear(&mut self) {
        self.by_deadline.clear();
        self.deadlines.clear();
    }

    /// Number of armed timers.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Check if no timers are armed.
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
