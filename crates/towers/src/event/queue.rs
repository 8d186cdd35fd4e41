use std::collections::VecDeque;

use super::types::MatchEvent;

#[derive(Debug, Clone)]
pub struct QueuedEvent {
    pub sequence: u32,
    pub tick: u64,
    pub event: MatchEvent,
}

/// Outbox of match events waiting for the host to drain them.
#[derive(Debug)]
pub struct EventQueue {
    pending: VecDeque<QueuedEvent>,
    next_sequence: u32,
    max_pending: usize,
    dropped: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl EventQueue {
    pub const DEFAULT_CAPACITY: usize = 4096;

    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(max_pending.min(Self::DEFAULT_CAPACITY)),
            next_sequence: 0,
            max_pending,
            dropped: 0,
        }
    }

    pub fn push(&mut self, tick: u64, event: MatchEvent) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        if self.pending.len() >= self.max_pending {
            if let Some(evicted) = self.pending.pop_front() {
                self.dropped += 1;
                log::warn!(
                    "Event queue full, dropping event {} from tick {}",
                    evicted.sequence,
                    evicted.tick
                );
            }
        }

        self.pending.push_back(QueuedEvent {
            sequence,
            tick,
            event,
        });

        sequence
    }

    /// Moves every pending event of `other` to the back of this queue.
    pub fn append(&mut self, other: &mut EventQueue) {
        for queued in other.pending.drain(..) {
            self.push(queued.tick, queued.event);
        }
    }

    pub fn drain(&mut self) -> impl Iterator<Item = QueuedEvent> + '_ {
        self.pending.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedEvent> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left(player_id: u32) -> MatchEvent {
        MatchEvent::PlayerLeft {
            match_id: 0,
            player_id,
        }
    }

    #[test]
    fn drains_in_order() {
        let mut queue = EventQueue::new(8);
        queue.push(1, left(1));
        queue.push(2, left(2));

        let sequences: Vec<u32> = queue.drain().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1]);
        assert!(queue.is_empty());
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut queue = EventQueue::new(2);
        queue.push(0, left(1));
        queue.push(0, left(2));
        queue.push(0, left(3));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.iter().next().map(|e| e.event.clone()), Some(left(2)));
    }

    #[test]
    fn append_resequences() {
        let mut outer = EventQueue::new(8);
        let mut inner = EventQueue::new(8);
        outer.push(0, left(1));
        inner.push(5, left(2));

        outer.append(&mut inner);
        assert!(inner.is_empty());
        let last = outer.iter().last().unwrap();
        assert_eq!((last.sequence, last.tick), (1, 5));
    }
}
