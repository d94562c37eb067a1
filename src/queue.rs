//! Two-tier command queue store.
//!
//! Pending commands wait in one of two fixed-capacity rings, priority and
//! standard. Each ring is a lock-free single-producer/single-consumer queue,
//! so the foreground code that queues commands never has to mask the
//! interrupt that drains them.
//!
//! # Key Components
//!
//! - [`QueueStore`]: owns both rings; usable directly from one context
//! - [`CommandSender`]: producer half, handed to foreground code
//! - [`Scheduler`]: consumer half, handed to the transmitter
//!
//! # Full Rings
//!
//! A full ring rejects the new command with [`QueueFull`], which hands the
//! command back. Queued commands are never overwritten: silently dropping a
//! pending throttle command is worse than telling the caller to retry.
//!
//! ```rust
//! use rs_dcc::queue::QueueStore;
//! use rs_dcc::{Address, DccCommand, Direction, QueueTier};
//!
//! let mut store: QueueStore = QueueStore::new();
//! let (mut sender, mut scheduler) = store.split();
//!
//! let loco = Address::new(3).unwrap();
//! let speed = DccCommand::speed_128(loco, Direction::Forward, 20).unwrap();
//! sender.queue_command(speed, QueueTier::Standard).unwrap();
//! sender.queue_command(DccCommand::emergency_stop(loco), QueueTier::Priority).unwrap();
//!
//! // Priority first, then standard, then idle packets forever
//! assert!(scheduler.next_command().is_emergency_stop());
//! assert_eq!(scheduler.next_command(), speed);
//! assert!(scheduler.next_command().is_idle());
//! ```

use heapless::spsc::{Producer, Queue};

use crate::commands::{DccCommand, QueueTier};
use crate::error::QueueFull;
use crate::scheduler::Scheduler;

/// Usable slots in the priority ring.
pub const PRIORITY_QUEUE_SIZE: usize = 10;

/// Usable slots in the standard ring.
pub const STANDARD_QUEUE_SIZE: usize = 10;

/// Ring length for the priority tier; one slot is kept free by the ring.
pub const PRIORITY_RING_SLOTS: usize = PRIORITY_QUEUE_SIZE + 1;

/// Ring length for the standard tier; one slot is kept free by the ring.
pub const STANDARD_RING_SLOTS: usize = STANDARD_QUEUE_SIZE + 1;

/// Storage for both queue tiers.
///
/// `P` and `S` are ring lengths; each ring holds one command fewer than its
/// length. The defaults give ten commands per tier.
///
/// A store can be used from a single context through [`enqueue`](Self::enqueue)
/// and [`dequeue_next`](Self::dequeue_next), or [`split`](Self::split) into a
/// producer and a consumer for interrupt-driven use. The ring indices are
/// never exposed.
pub struct QueueStore<const P: usize = PRIORITY_RING_SLOTS, const S: usize = STANDARD_RING_SLOTS> {
    priority: Queue<DccCommand, P>,
    standard: Queue<DccCommand, S>,
}

impl<const P: usize, const S: usize> QueueStore<P, S> {
    /// Creates both rings empty. Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            priority: Queue::new(),
            standard: Queue::new(),
        }
    }

    /// Appends `cmd` to the chosen tier.
    ///
    /// # Errors
    ///
    /// [`QueueFull`] if the tier has no free slot; the command is handed back.
    pub fn enqueue(&mut self, cmd: DccCommand, tier: QueueTier) -> Result<(), QueueFull> {
        let result = match tier {
            QueueTier::Priority => self.priority.enqueue(cmd),
            QueueTier::Standard => self.standard.enqueue(cmd),
        };
        result.map_err(|command| QueueFull { tier, command })
    }

    /// Removes the oldest priority command, else the oldest standard one.
    pub fn dequeue_next(&mut self) -> Option<DccCommand> {
        self.priority.dequeue().or_else(|| self.standard.dequeue())
    }

    /// Number of commands waiting in `tier`.
    pub fn len(&self, tier: QueueTier) -> usize {
        match tier {
            QueueTier::Priority => self.priority.len(),
            QueueTier::Standard => self.standard.len(),
        }
    }

    /// Usable slots in `tier`.
    pub fn capacity(&self, tier: QueueTier) -> usize {
        match tier {
            QueueTier::Priority => self.priority.capacity(),
            QueueTier::Standard => self.standard.capacity(),
        }
    }

    /// True if both tiers are empty.
    pub fn is_empty(&self) -> bool {
        self.priority.is_empty() && self.standard.is_empty()
    }

    /// True if `tier` has no free slot.
    pub fn is_full(&self, tier: QueueTier) -> bool {
        match tier {
            QueueTier::Priority => self.priority.is_full(),
            QueueTier::Standard => self.standard.is_full(),
        }
    }

    /// Splits into the foreground producer and the interrupt-side scheduler.
    pub fn split(&mut self) -> (CommandSender<'_, P, S>, Scheduler<'_, P, S>) {
        let (priority_tx, priority_rx) = self.priority.split();
        let (standard_tx, standard_rx) = self.standard.split();
        (
            CommandSender::new(priority_tx, standard_tx),
            Scheduler::new(priority_rx, standard_rx),
        )
    }
}

impl<const P: usize, const S: usize> Default for QueueStore<P, S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer half of a [`QueueStore`].
///
/// The only way foreground code hands commands to the track. Safe to call
/// while the transmitter interrupt is draining the same rings.
pub struct CommandSender<'a, const P: usize = PRIORITY_RING_SLOTS, const S: usize = STANDARD_RING_SLOTS> {
    priority: Producer<'a, DccCommand, P>,
    standard: Producer<'a, DccCommand, S>,
    rejected: u32,
}

impl<'a, const P: usize, const S: usize> CommandSender<'a, P, S> {
    fn new(priority: Producer<'a, DccCommand, P>, standard: Producer<'a, DccCommand, S>) -> Self {
        Self {
            priority,
            standard,
            rejected: 0,
        }
    }

    /// Queues `cmd` on `tier`.
    ///
    /// # Errors
    ///
    /// [`QueueFull`] if the tier is full. The caller decides whether to
    /// retry the returned command or drop it.
    pub fn queue_command(&mut self, cmd: DccCommand, tier: QueueTier) -> Result<(), QueueFull> {
        let result = match tier {
            QueueTier::Priority => self.priority.enqueue(cmd),
            QueueTier::Standard => self.standard.enqueue(cmd),
        };
        result.map_err(|command| {
            self.rejected = self.rejected.wrapping_add(1);
            log::warn!(
                "{} queue full, rejected packet {:02X?}",
                tier.as_str(),
                command.payload()
            );
            QueueFull { tier, command }
        })
    }

    /// Queues `cmd` on the tier it belongs to: emergency stops go priority,
    /// everything else standard.
    pub fn send(&mut self, cmd: DccCommand) -> Result<(), QueueFull> {
        self.queue_command(cmd, QueueTier::for_command(&cmd))
    }

    /// Queues `cmd` ahead of all standard traffic.
    pub fn queue_priority(&mut self, cmd: DccCommand) -> Result<(), QueueFull> {
        self.queue_command(cmd, QueueTier::Priority)
    }

    /// Queues `cmd` behind any priority traffic.
    pub fn queue_standard(&mut self, cmd: DccCommand) -> Result<(), QueueFull> {
        self.queue_command(cmd, QueueTier::Standard)
    }

    /// Commands waiting in `tier`, as seen from the producer side.
    pub fn pending(&self, tier: QueueTier) -> usize {
        match tier {
            QueueTier::Priority => self.priority.len(),
            QueueTier::Standard => self.standard.len(),
        }
    }

    /// True if the next [`queue_command`](Self::queue_command) on `tier` would be rejected.
    pub fn is_full(&self, tier: QueueTier) -> bool {
        match tier {
            QueueTier::Priority => !self.priority.ready(),
            QueueTier::Standard => !self.standard.ready(),
        }
    }

    /// Total commands rejected since the split.
    pub fn rejected(&self) -> u32 {
        self.rejected
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Address, Direction};

    fn speed(step: u8) -> DccCommand {
        DccCommand::speed_128(Address::Short(3), Direction::Forward, step).unwrap()
    }

    // === QueueStore Tests ===
    #[test]
    fn store_new_is_empty() {
        let store: QueueStore = QueueStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(QueueTier::Priority), 0);
        assert_eq!(store.len(QueueTier::Standard), 0);
    }

    #[test]
    fn store_default_capacity_is_ten() {
        let store: QueueStore = QueueStore::default();
        assert_eq!(store.capacity(QueueTier::Priority), 10);
        assert_eq!(store.capacity(QueueTier::Standard), 10);
    }

    #[test]
    fn store_fifo_within_tier() {
        let mut store: QueueStore = QueueStore::new();
        for step in 1..=5 {
            store.enqueue(speed(step), QueueTier::Standard).unwrap();
        }
        for step in 1..=5 {
            assert_eq!(store.dequeue_next(), Some(speed(step)));
        }
        assert_eq!(store.dequeue_next(), None);
    }

    #[test]
    fn store_priority_before_standard() {
        let mut store: QueueStore = QueueStore::new();
        store.enqueue(speed(1), QueueTier::Standard).unwrap();
        store.enqueue(speed(2), QueueTier::Priority).unwrap();

        assert_eq!(store.dequeue_next(), Some(speed(2)));
        assert_eq!(store.dequeue_next(), Some(speed(1)));
    }

    #[test]
    fn store_full_rejects_and_keeps_contents() {
        let mut store: QueueStore = QueueStore::new();
        for step in 1..=10 {
            store.enqueue(speed(step), QueueTier::Standard).unwrap();
        }
        assert!(store.is_full(QueueTier::Standard));

        let err = store.enqueue(speed(11), QueueTier::Standard).unwrap_err();
        assert_eq!(err.tier, QueueTier::Standard);
        assert_eq!(err.command, speed(11));
        assert_eq!(store.len(QueueTier::Standard), 10);

        // Other tier unaffected
        assert!(store.enqueue(speed(12), QueueTier::Priority).is_ok());
    }

    #[test]
    fn store_small_rings() {
        let mut store: QueueStore<2, 3> = QueueStore::new();
        assert_eq!(store.capacity(QueueTier::Priority), 1);
        assert_eq!(store.capacity(QueueTier::Standard), 2);
        assert!(store.enqueue(speed(1), QueueTier::Priority).is_ok());
        assert!(store.enqueue(speed(2), QueueTier::Priority).is_err());
    }

    // === CommandSender Tests ===
    #[test]
    fn sender_tracks_pending_and_rejections() {
        let mut store: QueueStore<3, 3> = QueueStore::new();
        let (mut sender, _scheduler) = store.split();

        assert!(sender.queue_priority(speed(1)).is_ok());
        assert!(sender.queue_priority(speed(2)).is_ok());
        assert!(sender.is_full(QueueTier::Priority));
        assert!(!sender.is_full(QueueTier::Standard));

        let err = sender.queue_priority(speed(3)).unwrap_err();
        assert_eq!(err.into_command(), speed(3));
        assert_eq!(sender.rejected(), 1);
        assert_eq!(sender.pending(QueueTier::Priority), 2);
        assert_eq!(sender.pending(QueueTier::Standard), 0);
    }

    #[test]
    fn sender_slot_frees_after_draw() {
        let mut store: QueueStore<2, 2> = QueueStore::new();
        let (mut sender, mut scheduler) = store.split();

        sender.queue_standard(speed(1)).unwrap();
        assert!(sender.queue_standard(speed(2)).is_err());

        assert_eq!(scheduler.next_command(), speed(1));
        assert!(sender.queue_standard(speed(2)).is_ok());
    }

    #[test]
    fn send_routes_emergency_stops_to_priority() {
        let mut store: QueueStore = QueueStore::new();
        let (mut sender, mut scheduler) = store.split();

        sender.send(speed(5)).unwrap();
        sender.send(DccCommand::emergency_stop(Address::Short(3))).unwrap();
        sender.send(DccCommand::broadcast_stop()).unwrap();
        assert_eq!(sender.pending(QueueTier::Priority), 2);
        assert_eq!(sender.pending(QueueTier::Standard), 1);

        assert!(scheduler.next_command().is_emergency_stop());
        assert_eq!(scheduler.next_command(), DccCommand::broadcast_stop());
        assert_eq!(scheduler.next_command(), speed(5));
    }
}
