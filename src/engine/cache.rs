//! Event cache
//!
//! Keyed strictly by event index so a re-fetched play with changed content
//! lands on the same entry. Owned by one engine, lives as long as one game.

use std::collections::BTreeMap;

use crate::adapters::DeliveryRef;
use crate::domain::{EventIndex, Play};

/// A play as last announced, plus delivery bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEventRecord {
    pub play: Play,
    /// Where the announcement went, `None` when it was never posted
    pub delivery_reference: Option<DeliveryRef>,
    /// Assist re-checks spent before the goal was accepted
    pub pending_assist_recheck_count: u32,
}

impl CachedEventRecord {
    pub fn new(play: Play, delivery_reference: Option<DeliveryRef>) -> Self {
        Self {
            play,
            delivery_reference,
            pending_assist_recheck_count: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct EventCache {
    records: BTreeMap<EventIndex, CachedEventRecord>,
}

impl EventCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: EventIndex) -> Option<&CachedEventRecord> {
        self.records.get(&index)
    }

    pub fn get_mut(&mut self, index: EventIndex) -> Option<&mut CachedEventRecord> {
        self.records.get_mut(&index)
    }

    pub fn put(&mut self, index: EventIndex, record: CachedEventRecord) {
        self.records.insert(index, record);
    }

    pub fn contains(&self, index: EventIndex) -> bool {
        self.records.contains_key(&index)
    }

    /// Only used when a goal disappears from the feed or is re-processed
    pub fn remove(&mut self, index: EventIndex) -> Option<CachedEventRecord> {
        self.records.remove(&index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in index order
    pub fn iter(&self) -> impl Iterator<Item = (&EventIndex, &CachedEventRecord)> {
        self.records.iter()
    }
}
