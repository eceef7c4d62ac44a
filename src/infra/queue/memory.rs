//! In-memory priority queue of descriptors awaiting dispatch.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::ResourceDescriptor;

/// Wrapper making descriptors orderable by priority (highest first) and FIFO within priority.
struct QueuedLoad {
    descriptor: ResourceDescriptor,
    seq: u64,
}

impl PartialEq for QueuedLoad {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for QueuedLoad {}

impl PartialOrd for QueuedLoad {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedLoad {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.descriptor.priority.cmp(&other.descriptor.priority) {
            // FIFO within same priority: lower sequence wins (reversed for max-heap)
            Ordering::Equal => other.seq.cmp(&self.seq),
            other => other,
        }
    }
}

/// Priority queue of descriptors using a binary heap.
///
/// Equal priorities dequeue in insertion order. A re-enqueued descriptor
/// receives a fresh sequence number, so retries go to the back of their
/// priority band.
#[derive(Default)]
pub struct InMemoryQueue {
    tasks: BinaryHeap<QueuedLoad>,
    next_seq: u64,
}

impl InMemoryQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor. O(log n).
    pub fn enqueue(&mut self, descriptor: ResourceDescriptor) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(QueuedLoad { descriptor, seq });
    }

    /// Remove the highest-priority descriptor. O(log n).
    pub fn dequeue(&mut self) -> Option<ResourceDescriptor> {
        self.tasks.pop().map(|q| q.descriptor)
    }

    /// Raise the priority of a queued identity.
    ///
    /// Lower or equal priorities are ignored. Returns whether an entry changed.
    pub fn reprioritize(&mut self, identity: &str, priority: i32) -> bool {
        let needs_update = self
            .tasks
            .iter()
            .any(|q| q.descriptor.identity == identity && q.descriptor.priority < priority);
        if !needs_update {
            return false;
        }
        // Rebuild heap with the raised entry
        let tasks: Vec<_> = self.tasks.drain().collect();
        self.tasks = tasks
            .into_iter()
            .map(|mut q| {
                if q.descriptor.identity == identity {
                    q.descriptor.priority = priority;
                }
                q
            })
            .collect();
        true
    }

    /// Whether `identity` is queued.
    pub fn contains(&self, identity: &str) -> bool {
        self.tasks.iter().any(|q| q.descriptor.identity == identity)
    }

    /// Remove and return every queued descriptor in dispatch order.
    pub fn drain(&mut self) -> Vec<ResourceDescriptor> {
        std::mem::take(&mut self.tasks)
            .into_sorted_vec()
            .into_iter()
            .rev()
            .map(|q| q.descriptor)
            .collect()
    }

    /// Current depth.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(identity: &str, priority: i32) -> ResourceDescriptor {
        ResourceDescriptor::picture(identity).with_priority(priority)
    }

    fn ids(q: &mut InMemoryQueue) -> Vec<String> {
        std::iter::from_fn(|| q.dequeue()).map(|d| d.identity).collect()
    }

    #[test]
    fn test_priority_ordering() {
        let mut q = InMemoryQueue::new();

        // Enqueue in mixed order
        q.enqueue(make("low", 0));
        q.enqueue(make("critical", 10));
        q.enqueue(make("normal", 1));
        q.enqueue(make("high", 5));

        assert_eq!(ids(&mut q), ["critical", "high", "normal", "low"]);
    }

    #[test]
    fn test_fifo_within_priority() {
        let mut q = InMemoryQueue::new();
        q.enqueue(make("a", 1));
        q.enqueue(make("b", 1));
        q.enqueue(make("c", 1));
        q.enqueue(make("urgent", 2));
        q.enqueue(make("d", 1));

        assert_eq!(ids(&mut q), ["urgent", "a", "b", "c", "d"]);
    }

    #[test]
    fn test_negative_priorities() {
        let mut q = InMemoryQueue::new();
        q.enqueue(make("background", -5));
        q.enqueue(make("default", 1));
        assert_eq!(ids(&mut q), ["default", "background"]);
    }

    #[test]
    fn test_reprioritize() {
        let mut q = InMemoryQueue::new();
        q.enqueue(make("a", 1));
        q.enqueue(make("b", 1));
        q.enqueue(make("c", 3));

        assert!(q.reprioritize("b", 7));
        assert!(!q.reprioritize("a", 0));
        assert!(!q.reprioritize("missing", 9));

        assert_eq!(ids(&mut q), ["b", "c", "a"]);
    }

    #[test]
    fn test_drain_in_dispatch_order() {
        let mut q = InMemoryQueue::new();
        q.enqueue(make("a", 1));
        q.enqueue(make("b", 3));
        q.enqueue(make("c", 1));

        let drained: Vec<_> = q.drain().into_iter().map(|d| d.identity).collect();
        assert_eq!(drained, ["b", "a", "c"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_empty_queue() {
        let mut q = InMemoryQueue::new();
        assert!(q.dequeue().is_none());
        assert_eq!(q.len(), 0);
        assert!(!q.contains("a"));
    }
}
