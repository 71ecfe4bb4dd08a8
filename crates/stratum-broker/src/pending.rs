//! Table of callers waiting on a coordinator response.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use moka::future::Cache;
use tokio::sync::oneshot;
use tracing::{debug, error};
use uuid::Uuid;

use stratum_core::error::AppError;
use stratum_core::result::AppResult;

use crate::message::Response;
use crate::slot::{ResponseSlot, SlotError};

const CONSUMED_CAPACITY: u64 = 100_000;

/// Result of handing a webhook response to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The waiter received the response.
    Delivered,
    /// A response for this id was already delivered.
    AlreadyConsumed,
    /// No waiter is registered under this id.
    Unknown,
}

/// A registered slot. Delivery swaps `Waiting` for `Claimed` under the
/// map's shard lock, so exactly one delivery takes the sender.
#[derive(Debug)]
enum SlotState {
    Waiting(ResponseSlot),
    Claimed,
}

/// Outcome of trying to take a slot for delivery.
#[derive(Debug)]
enum Claim {
    Won(ResponseSlot),
    Lost,
    Missing,
}

#[derive(Debug)]
struct Inner {
    slots: DashMap<Uuid, SlotState>,
    consumed: Cache<Uuid, ()>,
}

/// Correlation id → response slot.
///
/// Every slot is owned by a [`PendingGuard`]; dropping the guard removes the
/// slot, whichever way the wait ended.
#[derive(Debug, Clone)]
pub struct PendingTable {
    inner: Arc<Inner>,
}

/// Removes its slot from the table on drop.
#[derive(Debug)]
pub struct PendingGuard {
    inner: Arc<Inner>,
    id: Uuid,
}

impl PendingGuard {
    /// Correlation id this guard owns.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.inner.slots.remove(&self.id).is_some() {
            debug!(correlation_id = %self.id, "Released response slot");
        }
    }
}

impl PendingTable {
    /// Create a table that remembers delivered ids for `consumed_ttl`.
    pub fn new(consumed_ttl: Duration) -> Self {
        let consumed = Cache::builder()
            .max_capacity(CONSUMED_CAPACITY)
            .time_to_live(consumed_ttl)
            .build();
        Self {
            inner: Arc::new(Inner {
                slots: DashMap::new(),
                consumed,
            }),
        }
    }

    /// Register a slot under `id`. A duplicate id is a logic error.
    pub fn register(&self, id: Uuid) -> AppResult<(PendingGuard, oneshot::Receiver<Response>)> {
        match self.inner.slots.entry(id) {
            Entry::Occupied(_) => {
                error!(correlation_id = %id, "Correlation id already registered");
                Err(AppError::internal(format!(
                    "correlation id {id} already registered"
                )))
            }
            Entry::Vacant(entry) => {
                let (slot, rx) = ResponseSlot::channel();
                entry.insert(SlotState::Waiting(slot));
                Ok((
                    PendingGuard {
                        inner: Arc::clone(&self.inner),
                        id,
                    },
                    rx,
                ))
            }
        }
    }

    /// Hand `response` to the waiter registered under its correlation id.
    pub async fn deliver(&self, response: Response) -> DeliveryOutcome {
        let id = response.correlation_id;
        if self.inner.consumed.contains_key(&id) {
            return DeliveryOutcome::AlreadyConsumed;
        }

        match self.claim(&id) {
            Claim::Won(slot) => self.complete(id, slot, response).await,
            Claim::Lost => DeliveryOutcome::AlreadyConsumed,
            // The waiter may have woken and released its slot after another
            // delivery tombstoned the id.
            Claim::Missing if self.inner.consumed.contains_key(&id) => {
                DeliveryOutcome::AlreadyConsumed
            }
            Claim::Missing => DeliveryOutcome::Unknown,
        }
    }

    fn claim(&self, id: &Uuid) -> Claim {
        let Some(mut state) = self.inner.slots.get_mut(id) else {
            return Claim::Missing;
        };
        match std::mem::replace(&mut *state, SlotState::Claimed) {
            SlotState::Waiting(slot) => Claim::Won(slot),
            SlotState::Claimed => Claim::Lost,
        }
    }

    async fn complete(&self, id: Uuid, slot: ResponseSlot, response: Response) -> DeliveryOutcome {
        // Tombstone before filling: the waiter removes its slot as soon as
        // it wakes.
        self.inner.consumed.insert(id, ()).await;

        match slot.fill(response) {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(SlotError::AlreadyConsumed) => DeliveryOutcome::AlreadyConsumed,
            Err(SlotError::Abandoned) => {
                self.inner.slots.remove(&id);
                self.inner.consumed.invalidate(&id).await;
                DeliveryOutcome::Unknown
            }
        }
    }

    /// Whether a waiter is registered under `id`.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.inner.slots.contains_key(id)
    }

    /// Number of registered waiters.
    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    /// Whether no waiter is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }
}
