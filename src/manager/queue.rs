// src/manager/queue.rs

//! The active queue: handlers that are armed, running, or waiting to run.

use std::collections::VecDeque;

use crate::manager::arena::HandlerId;
use crate::manager::handler::Priority;

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    id: HandlerId,
    /// Tie-breaker among equal priorities; lower runs first.
    rank: i64,
}

/// Ordered collection of active handlers, front = next to step.
///
/// Ordering is a strict total order: current priority descending, then rank
/// ascending. Entries added by activation take increasing ranks (so equal
/// priorities run in activation order); entries spliced to the front take
/// decreasing ranks, so a later re-sort cannot move a spliced child behind an
/// entry of equal priority.
#[derive(Debug, Default)]
pub struct ActiveQueue {
    entries: VecDeque<QueueEntry>,
    next_back_rank: i64,
    next_front_rank: i64,
}

impl ActiveQueue {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            next_back_rank: 0,
            next_front_rank: -1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: HandlerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn front(&self) -> Option<HandlerId> {
        self.entries.front().map(|e| e.id)
    }

    pub fn pop_front(&mut self) -> Option<HandlerId> {
        self.entries.pop_front().map(|e| e.id)
    }

    /// Ids in execution order (front first).
    pub fn ids(&self) -> Vec<HandlerId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Remove `id` wherever it is. Returns whether it was present.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Append a newly activated handler and re-sort the whole queue.
    ///
    /// Callers check `contains` first; a duplicate is ignored here.
    pub fn push_back_sorted<F>(&mut self, id: HandlerId, priority_of: F)
    where
        F: Fn(HandlerId) -> Priority,
    {
        if self.contains(id) {
            return;
        }
        let rank = self.next_back_rank;
        self.next_back_rank += 1;
        self.entries.push_back(QueueEntry { id, rank });
        self.reorder(priority_of);
    }

    /// Put `id` at the absolute front, moving it if it is already queued.
    pub fn splice_front(&mut self, id: HandlerId) {
        self.remove(id);
        let rank = self.next_front_rank;
        self.next_front_rank -= 1;
        self.entries.push_front(QueueEntry { id, rank });
    }

    /// Re-sort by (priority desc, rank asc).
    pub fn reorder<F>(&mut self, priority_of: F)
    where
        F: Fn(HandlerId) -> Priority,
    {
        self.entries.make_contiguous().sort_by(|a, b| {
            priority_of(b.id)
                .cmp(&priority_of(a.id))
                .then(a.rank.cmp(&b.rank))
        });
    }
}
