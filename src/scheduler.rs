//! Tick-indexed turn scheduler.
//!
//! Actors are plain handles. A turn handler receives the scheduler back so it can
//! book the actor's next turn; nothing repeats on its own.

use std::collections::BTreeMap;

use tracing::trace;

#[derive(Clone, Debug)]
pub struct TurnScheduler<A> {
    now: u64,
    schedule: BTreeMap<u64, Vec<A>>,
    pending: u64,
}

impl<A> Default for TurnScheduler<A> {
    fn default() -> Self {
        Self {
            now: 0,
            schedule: BTreeMap::new(),
            pending: 0,
        }
    }
}

impl<A: Copy + PartialEq + std::fmt::Debug> TurnScheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current absolute tick.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Book `actor` at `now + interval`. Intervals below one tick count as one.
    pub fn schedule_turn(&mut self, interval: u64, actor: A) {
        let tick = self.now + interval.max(1);
        self.schedule.entry(tick).or_default().push(actor);
    }

    /// Run the next `n` ticks, calling `on_turn` for every booked actor in
    /// registration order. Ticks with nothing booked just pass.
    ///
    /// The bucket is not snapshotted before its handlers run. Actors are popped one
    /// at a time, so a handler that unregisters another actor due in the same tick
    /// cancels that actor's turn.
    pub fn advance_ticks<F>(&mut self, n: u64, mut on_turn: F)
    where
        F: FnMut(&mut Self, A),
    {
        for _ in 0..n {
            self.now += 1;
            let tick = self.now;
            while let Some(actor) = self.pop_front(tick) {
                trace!(tick, ?actor, "turn");
                on_turn(self, actor);
            }
            self.schedule.remove(&tick);
        }
    }

    fn pop_front(&mut self, tick: u64) -> Option<A> {
        let bucket = self.schedule.get_mut(&tick)?;
        if bucket.is_empty() {
            None
        } else {
            Some(bucket.remove(0))
        }
    }

    /// Drop every pending occurrence of `actor`.
    pub fn unregister(&mut self, actor: A) {
        for bucket in self.schedule.values_mut() {
            bucket.retain(|a| *a != actor);
        }
        self.schedule.retain(|_, bucket| !bucket.is_empty());
    }

    pub fn is_scheduled(&self, actor: A) -> bool {
        self.schedule.values().any(|bucket| bucket.contains(&actor))
    }

    /// Total bookings still waiting.
    pub fn len(&self) -> usize {
        self.schedule.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ticks owed by the player's last actions, drained by [`Self::advance_pending`].
    pub fn pending(&self) -> u64 {
        self.pending
    }

    pub fn add_pending(&mut self, ticks: u64) {
        self.pending += ticks;
    }

    /// Advance by the accumulated pending ticks and reset the counter.
    pub fn advance_pending<F>(&mut self, on_turn: F) -> u64
    where
        F: FnMut(&mut Self, A),
    {
        let ticks = std::mem::take(&mut self.pending);
        self.advance_ticks(ticks, on_turn);
        ticks
    }
}
