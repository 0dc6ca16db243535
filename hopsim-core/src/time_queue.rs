use crate::time::SimTime;
use core::cmp::Reverse;
use std::collections::BinaryHeap;

/// Priority queue of entries keyed by their due [`SimTime`].
///
/// Entries due at the same time come out in the order they were pushed.
pub struct TimeQueue<T> {
    map: BinaryHeap<Reverse<OrderedByTime<T>>>,

    next_sequence: u64,
}

struct OrderedByTime<T> {
    due: SimTime,
    sequence: u64,
    entry: T,
}

impl<T> OrderedByTime<T> {
    fn key(&self) -> (SimTime, u64) {
        (self.due, self.sequence)
    }
}

impl<T> PartialEq for OrderedByTime<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T> Eq for OrderedByTime<T> {}

impl<T> PartialOrd for OrderedByTime<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for OrderedByTime<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl<T> TimeQueue<T> {
    pub fn new() -> Self {
        Self {
            map: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn time_to_next(&self) -> Option<SimTime> {
        self.map.peek().map(|v| v.0.due)
    }

    /// pop the earliest entry along with its due time
    pub fn pop(&mut self) -> Option<(SimTime, T)> {
        self.map.pop().map(|Reverse(v)| (v.due, v.entry))
    }

    /// pop the earliest entry only if it is due at or before `time`
    pub fn pop_elapsed(&mut self, time: SimTime) -> Option<(SimTime, T)> {
        match self.time_to_next() {
            Some(due) if due <= time => self.pop(),
            _ => None,
        }
    }

    pub fn push(&mut self, due: SimTime, entry: T) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.map.push(Reverse(OrderedByTime {
            due,
            sequence,
            entry,
        }))
    }
}

impl<T> Default for TimeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let mut c = TimeQueue::<()>::new();

        assert!(c.is_empty());
        assert_eq!(c.len(), 0);
        assert!(c.pop().is_none());
        assert!(c.time_to_next().is_none());
    }

    #[test]
    fn entry() {
        let mut c = TimeQueue::<()>::new();
        let due = SimTime::from_millis(2);

        c.push(due, ());

        assert!(!c.is_empty());
        assert_eq!(c.len(), 1);
        assert_eq!(c.time_to_next(), Some(due));

        assert!(c.pop_elapsed(SimTime::from_millis(1)).is_none());
        assert_eq!(c.pop_elapsed(SimTime::from_millis(3)), Some((due, ())));

        assert!(c.is_empty());
    }

    #[test]
    fn earliest_first() {
        let mut c = TimeQueue::new();
        c.push(SimTime::from_secs(3), 'c');
        c.push(SimTime::from_secs(1), 'a');
        c.push(SimTime::from_secs(2), 'b');

        let order: Vec<_> = std::iter::from_fn(|| c.pop().map(|(_, v)| v)).collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
    }

    #[test]
    fn same_time_is_fifo() {
        let mut c = TimeQueue::new();
        let t = SimTime::from_secs(1);
        for i in 0..100 {
            c.push(t, i);
        }
        c.push(SimTime::ZERO, -1);

        let order: Vec<_> = std::iter::from_fn(|| c.pop().map(|(_, v)| v)).collect();
        let expected: Vec<_> = std::iter::once(-1).chain(0..100).collect();
        assert_eq!(order, expected);
    }
}
