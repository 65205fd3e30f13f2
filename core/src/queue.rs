use crate::clock::SimTime;
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::sync::atomic::{self, AtomicU64};

/// Process-wide sequence counter. Ids are never reused, even across kernels.
static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Identifier of a scheduled event; doubles as the tie-break key for
/// events due at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    fn next() -> Self {
        EventId(NEXT_SEQUENCE.fetch_add(1, atomic::Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    time: SimTime,
    id: EventId,
    slot: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[derive(Debug)]
enum Slot<T> {
    Live(T),
    /// Cancelled but still referenced by a heap entry.
    Tombstone,
    Vacant,
}

/// Time-ordered event queue with lazy cancellation.
///
/// Payloads live in an arena of slots. The heap only stores
/// `(time, sequence, slot)` triples, so cancelling flips the slot to a
/// tombstone in O(1) and the heap entry is discarded when it reaches the top.
#[derive(Debug)]
pub struct EventQueue<T> {
    heap: BinaryHeap<Reverse<HeapEntry>>,
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    index: HashMap<EventId, usize>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn push(&mut self, time: SimTime, payload: T) -> EventId {
        let id = EventId::next();
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Slot::Live(payload);
                slot
            }
            None => {
                self.slots.push(Slot::Live(payload));
                self.slots.len() - 1
            }
        };
        self.index.insert(id, slot);
        self.heap.push(Reverse(HeapEntry { time, id, slot }));
        id
    }

    /// Removes the earliest live entry, skipping tombstones on the way.
    pub fn pop(&mut self) -> Result<(SimTime, EventId, T)> {
        while let Some(Reverse(entry)) = self.heap.pop() {
            let slot = std::mem::replace(&mut self.slots[entry.slot], Slot::Vacant);
            self.free.push(entry.slot);
            if let Slot::Live(payload) = slot {
                self.index.remove(&entry.id);
                return Ok((entry.time, entry.id, payload));
            }
        }
        Err(SimError::EmptyQueue)
    }

    /// Due time of the earliest live entry.
    pub fn peek_time(&mut self) -> Option<SimTime> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse(entry)| entry.time)
    }

    /// Returns `false` for unknown, popped or already cancelled ids.
    pub fn cancel(&mut self, id: EventId) -> bool {
        match self.index.remove(&id) {
            Some(slot) => {
                self.slots[slot] = Slot::Tombstone;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of live entries; tombstones are not counted.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.slots.clear();
        self.free.clear();
        self.index.clear();
    }

    /// Live entries in delivery order.
    pub fn entries(&self) -> Vec<(SimTime, EventId, &T)> {
        let mut live: Vec<HeapEntry> = self
            .heap
            .iter()
            .map(|Reverse(entry)| *entry)
            .filter(|entry| self.index.contains_key(&entry.id))
            .collect();
        live.sort_unstable();
        live.into_iter()
            .filter_map(|entry| match &self.slots[entry.slot] {
                Slot::Live(payload) => Some((entry.time, entry.id, payload)),
                _ => None,
            })
            .collect()
    }

    fn discard_cancelled(&mut self) {
        while let Some(slot) = self.heap.peek().map(|Reverse(entry)| entry.slot) {
            if matches!(self.slots[slot], Slot::Live(_)) {
                break;
            }
            self.heap.pop();
            self.slots[slot] = Slot::Vacant;
            self.free.push(slot);
        }
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
