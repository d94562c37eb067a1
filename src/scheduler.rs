//! Packet selection for the transmitter.
//!
//! Each time the transmitter finishes a command (including its repeats) it
//! asks its [`PacketSource`] for exactly one more. The [`Scheduler`] answers
//! from the priority ring, then the standard ring, and otherwise with an idle
//! packet, so the track never goes quiet: decoders treat a missing signal as
//! a fault.
//!
//! Priority starves standard only while priority has entries. There is no
//! fairness weighting; priority traffic (emergency stops) is rare and short.

use heapless::spsc::Consumer;

use crate::commands::{DccCommand, QueueTier};
use crate::queue::{PRIORITY_RING_SLOTS, STANDARD_RING_SLOTS};

/// Where the transmitter gets its next command.
///
/// The return type is not optional: a source must always have something to
/// put on the track, falling back to [`DccCommand::idle`] when nothing is
/// pending. Implementations run in interrupt context and must not block or
/// allocate.
pub trait PacketSource {
    /// Returns the next command to transmit.
    fn next_command(&mut self) -> DccCommand;
}

/// Consumer half of a [`QueueStore`](crate::queue::QueueStore).
///
/// Owned by the transmitter; only it dequeues.
pub struct Scheduler<'a, const P: usize = PRIORITY_RING_SLOTS, const S: usize = STANDARD_RING_SLOTS> {
    priority: Consumer<'a, DccCommand, P>,
    standard: Consumer<'a, DccCommand, S>,
    idle: DccCommand,
    priority_served: u32,
    standard_served: u32,
    idle_served: u32,
}

impl<'a, const P: usize, const S: usize> Scheduler<'a, P, S> {
    pub(crate) fn new(priority: Consumer<'a, DccCommand, P>, standard: Consumer<'a, DccCommand, S>) -> Self {
        Self {
            priority,
            standard,
            idle: DccCommand::idle(),
            priority_served: 0,
            standard_served: 0,
            idle_served: 0,
        }
    }

    /// Next command: priority head, else standard head, else idle.
    pub fn next_command(&mut self) -> DccCommand {
        match self.dequeue_next() {
            Some(cmd) => cmd,
            None => {
                self.idle_served = self.idle_served.wrapping_add(1);
                self.idle
            }
        }
    }

    /// Removes the next queued command without the idle fallback.
    pub fn dequeue_next(&mut self) -> Option<DccCommand> {
        if let Some(cmd) = self.priority.dequeue() {
            self.priority_served = self.priority_served.wrapping_add(1);
            return Some(cmd);
        }
        if let Some(cmd) = self.standard.dequeue() {
            self.standard_served = self.standard_served.wrapping_add(1);
            return Some(cmd);
        }
        None
    }

    /// Commands waiting in `tier`, as seen from the consumer side.
    pub fn pending(&self, tier: QueueTier) -> usize {
        match tier {
            QueueTier::Priority => self.priority.len(),
            QueueTier::Standard => self.standard.len(),
        }
    }

    /// Queued commands handed out from `tier`.
    pub fn served(&self, tier: QueueTier) -> u32 {
        match tier {
            QueueTier::Priority => self.priority_served,
            QueueTier::Standard => self.standard_served,
        }
    }

    /// Idle packets handed out because both tiers were empty.
    pub fn idle_served(&self) -> u32 {
        self.idle_served
    }
}

impl<const P: usize, const S: usize> PacketSource for Scheduler<'_, P, S> {
    #[inline]
    fn next_command(&mut self) -> DccCommand {
        Scheduler::next_command(self)
    }
}
