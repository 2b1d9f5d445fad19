//! Schedule node arena and the time-ordered ready list.
//!
//! Nodes live in a fixed arena addressed by index. Every node carries a
//! location tag, and each transition moves it between exactly one of:
//!
//! - `Free`: in the pool, available to [`ReadyList::alloc`]
//! - `Ready`: linked into the ready list
//! - `Held`: owned privately by a task (running, suspended or just allocated)
//!
//! The list is singly linked through the arena and sorted ascending by
//! `next_run_time`, with equal timestamps kept in insertion order.

use crate::clock::{deadline_reached, is_before};

pub(crate) type NodeIndex = usize;

/// Where a schedule node currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLocation {
    Free,
    Ready,
    Held,
}

#[derive(Debug, Clone, Copy)]
struct ScheduleNode {
    task: usize,
    next_run_time: u32,
    next: Option<NodeIndex>,
    location: NodeLocation,
}

impl ScheduleNode {
    const FREE: ScheduleNode = ScheduleNode {
        task: 0,
        next_run_time: 0,
        next: None,
        location: NodeLocation::Free,
    };
}

/// Node pool plus the ready list threaded through it.
#[derive(Debug)]
pub(crate) struct ReadyList {
    nodes: Vec<ScheduleNode>,
    head: Option<NodeIndex>,
}

impl ReadyList {
    /// Allocate the whole arena up front; it never grows afterwards.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            nodes: vec![ScheduleNode::FREE; capacity],
            head: None,
        }
    }

    /// Return every node to the pool and empty the list.
    pub(crate) fn reset(&mut self) {
        self.nodes.fill(ScheduleNode::FREE);
        self.head = None;
    }

    /// First-fit allocation. The node comes back `Held` by `task`.
    pub(crate) fn alloc(&mut self, task: usize) -> Option<NodeIndex> {
        let index = self
            .nodes
            .iter()
            .position(|node| node.location == NodeLocation::Free)?;
        self.nodes[index] = ScheduleNode {
            task,
            next_run_time: 0,
            next: None,
            location: NodeLocation::Held,
        };
        Some(index)
    }

    /// Return a node to the pool from wherever it is.
    pub(crate) fn free(&mut self, index: NodeIndex) {
        if index >= self.nodes.len() {
            return;
        }
        self.detach(index);
        self.nodes[index] = ScheduleNode::FREE;
    }

    /// Unlink a `Ready` node, leaving it `Held`. Returns whether it was linked.
    pub(crate) fn detach(&mut self, index: NodeIndex) -> bool {
        if self.location(index) != Some(NodeLocation::Ready) {
            return false;
        }

        let next = self.nodes[index].next;
        if self.head == Some(index) {
            self.head = next;
        } else {
            let mut cursor = self.head;
            while let Some(current) = cursor {
                if self.nodes[current].next == Some(index) {
                    self.nodes[current].next = next;
                    break;
                }
                cursor = self.nodes[current].next;
            }
        }

        let node = &mut self.nodes[index];
        node.next = None;
        node.location = NodeLocation::Held;
        true
    }

    /// Link a node at `next_run_time`, after any node with the same time.
    ///
    /// A node that is already linked is repositioned; a free node is left
    /// alone.
    pub(crate) fn insert(&mut self, index: NodeIndex, next_run_time: u32) {
        match self.location(index) {
            None | Some(NodeLocation::Free) => return,
            Some(NodeLocation::Ready) => {
                self.detach(index);
            }
            Some(NodeLocation::Held) => {}
        }

        self.nodes[index].next_run_time = next_run_time;

        let mut prev: Option<NodeIndex> = None;
        let mut cursor = self.head;
        while let Some(current) = cursor {
            if is_before(next_run_time, self.nodes[current].next_run_time) {
                break;
            }
            prev = Some(current);
            cursor = self.nodes[current].next;
        }

        self.nodes[index].next = cursor;
        self.nodes[index].location = NodeLocation::Ready;
        match prev {
            Some(prev) => self.nodes[prev].next = Some(index),
            None => self.head = Some(index),
        }
    }

    /// Unlink and return the head if its deadline has been reached.
    pub(crate) fn pop_due(&mut self, now: u32) -> Option<NodeIndex> {
        let head = self.head?;
        if !deadline_reached(now, self.nodes[head].next_run_time) {
            return None;
        }
        self.detach(head);
        Some(head)
    }

    pub(crate) fn location(&self, index: NodeIndex) -> Option<NodeLocation> {
        self.nodes.get(index).map(|node| node.location)
    }

    pub(crate) fn task_of(&self, index: NodeIndex) -> usize {
        self.nodes[index].task
    }

    pub(crate) fn next_run_time(&self, index: NodeIndex) -> u32 {
        self.nodes[index].next_run_time
    }

    pub(crate) fn free_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.location == NodeLocation::Free)
            .count()
    }

    /// Walk the ready list in firing order as `(task index, next_run_time)`.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let current = cursor?;
            let node = &self.nodes[current];
            cursor = node.next;
            Some((node.task, node.next_run_time))
        })
    }
}
