//! The priority frontier (§4.P): a min-heap over `(distance, insertion-counter)` of nodes eligible to
//! be visited, backing ArciDispatch's best-first expansion.
//!
//! Built directly on [`priority_queue::PriorityQueue`], the same crate the reference graph library uses
//! for its own Dijkstra `pathfind`. That crate's max-heap pops the *greatest* priority, so distances and
//! counters are wrapped in [`std::cmp::Reverse`] to turn "smallest distance, then smallest counter" into
//! "greatest priority".

use std::cmp::Reverse;
use std::hash::Hash;

use noisy_float::types::N64;
use priority_queue::PriorityQueue;

/// `(distance, insertion-counter)`, ordered so the frontier's max-heap surfaces the smallest distance
/// first, breaking ties by the smallest (earliest) counter.
pub type Priority = Reverse<(N64, u64)>;

/// Builds a [`Priority`] for a given distance and insertion counter.
pub fn priority(dist: N64, counter: u64) -> Priority {
    Reverse((dist, counter))
}

/// The frontier of nodes eligible to be popped next.
///
/// Relaxation is push-and-forget: a node may be pushed many times over its life in the frontier, each
/// time at a smaller distance. Rather than a true decrease-key, the caller keeps its own best-known
/// `dist` map and discards a popped entry whose distance no longer matches (see
/// [`Solution`](crate::dispatch::Solution)); [`push`](Frontier::push) here additionally collapses
/// same-item pushes in place, which is a strict refinement of that contract, not a substitute for it.
pub struct Frontier<Id: Hash + Eq + Clone> {
    queue: PriorityQueue<Id, Priority>,
}

impl<Id: Hash + Eq + Clone> Frontier<Id> {
    pub fn new() -> Self {
        Frontier {
            queue: PriorityQueue::new(),
        }
    }

    /// Pushes `id` at the given distance/counter. If `id` is already queued, its priority is replaced.
    pub fn push(&mut self, id: Id, dist: N64, counter: u64) {
        self.queue.push(id, priority(dist, counter));
    }

    /// Pops the node with smallest `(distance, counter)`, along with the distance it was popped at.
    pub fn pop(&mut self) -> Option<(Id, N64)> {
        self.queue.pop().map(|(id, Reverse((d, _)))| (id, d))
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<Id: Hash + Eq + Clone> Default for Frontier<Id> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noisy_float::types::n64;

    #[test]
    fn pops_smallest_distance_first() {
        let mut f = Frontier::new();
        f.push("a", n64(3.0), 0);
        f.push("b", n64(1.0), 1);
        f.push("c", n64(2.0), 2);
        assert_eq!(f.pop().map(|(id, _)| id), Some("b"));
        assert_eq!(f.pop().map(|(id, _)| id), Some("c"));
        assert_eq!(f.pop().map(|(id, _)| id), Some("a"));
        assert!(f.is_empty());
    }

    #[test]
    fn ties_break_by_counter() {
        let mut f = Frontier::new();
        f.push("late", n64(1.0), 5);
        f.push("early", n64(1.0), 1);
        assert_eq!(f.pop().map(|(id, _)| id), Some("early"));
        assert_eq!(f.pop().map(|(id, _)| id), Some("late"));
    }

    #[test]
    fn repush_replaces_priority() {
        let mut f = Frontier::new();
        f.push("a", n64(5.0), 0);
        f.push("a", n64(1.0), 1);
        assert_eq!(f.len(), 1);
        assert_eq!(f.pop(), Some(("a", n64(1.0))));
    }
}
