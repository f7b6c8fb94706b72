//! Cache-then-revalidate list of backend records.
//!
//! Rules:
//! - a refetch replaces every confirmed entry with the server list
//! - optimistic entries are tagged pending and survive refetches
//! - confirming a pending entry replaces it in place, it is never appended
//! - rejecting a pending entry removes it, leaving the list as it was

use serde::{Deserialize, Serialize};

use crate::api::{RecordId, Segment, Source};

/// Records with a backend-issued identity
pub trait Record: Clone {
    fn record_id(&self) -> &RecordId;
}

impl Record for Source {
    fn record_id(&self) -> &RecordId {
        &self.id
    }
}

impl Record for Segment {
    fn record_id(&self) -> &RecordId {
        &self.id
    }
}

/// Handle for an optimistic entry awaiting backend confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTicket(u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CacheEntry<T> {
    Confirmed(T),
    Pending { ticket: PendingTicket, record: T },
}

impl<T> CacheEntry<T> {
    pub fn record(&self) -> &T {
        match self {
            CacheEntry::Confirmed(record) | CacheEntry::Pending { record, .. } => record,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CacheEntry::Pending { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RecordCache<T> {
    entries: Vec<CacheEntry<T>>,
    next_ticket: u64,
}

impl<T> Default for RecordCache<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_ticket: 0,
        }
    }
}

impl<T: Record> RecordCache<T> {
    /// Seed from a previously persisted (possibly stale) list
    pub fn from_confirmed(records: Vec<T>) -> Self {
        Self {
            entries: records.into_iter().map(CacheEntry::Confirmed).collect(),
            next_ticket: 0,
        }
    }

    /// Prepend an optimistic record
    pub fn insert_pending(&mut self, record: T) -> PendingTicket {
        let ticket = PendingTicket(self.next_ticket);
        self.next_ticket += 1;
        self.entries.insert(0, CacheEntry::Pending { ticket, record });
        ticket
    }

    /// Replace the pending entry with the server's copy.
    ///
    /// Any confirmed entry that already carries the same id (a refetch may
    /// have raced ahead) is dropped so the record appears once.
    pub fn confirm(&mut self, ticket: PendingTicket, record: T) -> bool {
        let Some(index) = self.position(ticket) else {
            return false;
        };
        let id = record.record_id().clone();
        self.entries[index] = CacheEntry::Confirmed(record);
        let mut i = 0;
        self.entries.retain(|entry| {
            let keep = i == index || entry.is_pending() || entry.record().record_id() != &id;
            i += 1;
            keep
        });
        true
    }

    /// Drop a pending entry whose create call failed
    pub fn reject(&mut self, ticket: PendingTicket) -> Option<T> {
        let index = self.position(ticket)?;
        match self.entries.remove(index) {
            CacheEntry::Pending { record, .. } | CacheEntry::Confirmed(record) => Some(record),
        }
    }

    /// Apply a full refetch: the server list wins for confirmed entries
    pub fn replace_with_server(&mut self, records: Vec<T>) {
        self.entries.retain(CacheEntry::is_pending);
        self.entries.extend(records.into_iter().map(CacheEntry::Confirmed));
    }

    /// Remove a confirmed record after a successful delete
    pub fn remove(&mut self, id: &RecordId) -> Option<T> {
        let index = self
            .entries
            .iter()
            .position(|e| !e.is_pending() && e.record().record_id() == id)?;
        Some(self.entries.remove(index).record().clone())
    }

    pub fn entries(&self) -> &[CacheEntry<T>] {
        &self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(CacheEntry::record)
    }

    /// Confirmed records only, the part worth persisting
    pub fn confirmed(&self) -> Vec<T> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                CacheEntry::Confirmed(record) => Some(record.clone()),
                CacheEntry::Pending { .. } => None,
            })
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<&CacheEntry<T>> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, ticket: PendingTicket) -> Option<usize> {
        self.entries.iter().position(|e| {
            matches!(e, CacheEntry::Pending { ticket: t, .. } if *t == ticket)
        })
    }
}
