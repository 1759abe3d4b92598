//! Command scheduling with simulated arrival latency.

use std::time::Duration;

use kraken_arena_core::Command;

/// Command stamped with the scheduling metadata assigned at enqueue time.
#[derive(Clone, Debug)]
pub(crate) struct QueuedCommand {
    /// The queued intent.
    pub(crate) command: Command,
    /// Server time at which the command becomes visible to the drain.
    pub(crate) arrival: Duration,
    /// Monotonically increasing submission number.
    pub(crate) sequence: u64,
}

/// Pending-command store drained in `(arrival, sequence)` order.
///
/// Latency is pure scheduling metadata: an entry sits in the pending set
/// until the simulation clock passes its arrival stamp, which keeps
/// processing order stable even when commands are enqueued out of
/// chronological order.
#[derive(Debug, Default)]
pub(crate) struct CommandQueue {
    pending: Vec<QueuedCommand>,
    sequence: u64,
}

impl CommandQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stamps and stores a command arriving `latency` after `now`.
    pub(crate) fn push(&mut self, command: Command, now: Duration, latency: Duration) {
        self.sequence += 1;
        self.pending.push(QueuedCommand {
            command,
            arrival: now.saturating_add(latency),
            sequence: self.sequence,
        });
    }

    /// Most recently assigned submission number.
    pub(crate) fn last_sequence(&self) -> u64 {
        self.sequence
    }

    /// Removes and returns every command due at `now`, oldest first.
    pub(crate) fn drain_due(&mut self, now: Duration) -> Vec<QueuedCommand> {
        self.pending
            .sort_by(|a, b| a.arrival.cmp(&b.arrival).then(a.sequence.cmp(&b.sequence)));
        let due = self
            .pending
            .iter()
            .take_while(|entry| entry.arrival <= now)
            .count();
        self.pending.drain(..due).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kraken_arena_core::{Command, PlayerId};

    fn smite(player: u32) -> Command {
        Command::Smite {
            player: PlayerId::new(player),
        }
    }

    #[test]
    fn drain_orders_by_arrival_then_sequence() {
        let mut queue = CommandQueue::new();
        let now = Duration::from_secs(1);
        queue.push(smite(1), now, Duration::from_millis(500));
        queue.push(smite(2), now, Duration::from_millis(100));
        queue.push(smite(3), now, Duration::from_millis(100));

        let due = queue.drain_due(Duration::from_secs(2));
        let players: Vec<u32> = due
            .iter()
            .map(|entry| entry.command.player().get())
            .collect();
        assert_eq!(players, vec![2, 3, 1]);
    }

    #[test]
    fn entries_stay_pending_until_arrival() {
        let mut queue = CommandQueue::new();
        queue.push(smite(1), Duration::ZERO, Duration::from_millis(250));

        assert!(queue.drain_due(Duration::from_millis(249)).is_empty());
        assert_eq!(queue.drain_due(Duration::from_millis(250)).len(), 1);
        assert!(queue.drain_due(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn sequence_numbers_grow_monotonically() {
        let mut queue = CommandQueue::new();
        queue.push(smite(1), Duration::ZERO, Duration::ZERO);
        queue.push(smite(2), Duration::ZERO, Duration::ZERO);
        assert_eq!(queue.last_sequence(), 2);

        let due = queue.drain_due(Duration::ZERO);
        assert!(due[0].sequence < due[1].sequence);
    }

    #[test]
    fn out_of_order_enqueue_still_applies_in_arrival_order() {
        let mut queue = CommandQueue::new();
        // Enqueued later but arriving earlier.
        queue.push(smite(1), Duration::from_secs(3), Duration::ZERO);
        queue.push(smite(2), Duration::from_secs(1), Duration::ZERO);

        let due = queue.drain_due(Duration::from_secs(5));
        assert_eq!(due[0].command.player(), PlayerId::new(2));
        assert_eq!(due[1].command.player(), PlayerId::new(1));
    }
}
