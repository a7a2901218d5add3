//! Server-held appointment list shared by all workers.
//!
//! Refreshes and local mutations both draw from one sequence counter. A refresh
//! that started before a later mutation (or a later refresh) was applied is
//! dropped when it completes, so a slow fetch cannot roll back a newer state.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use sqlx::PgPool;

use crate::models::appointment::{
    self, Appointment, AppointmentFilter, Rejected, Stats, distinct_experts,
    distinct_specialties,
};

/// Handed out when a refresh starts; carries the sequence it will be judged by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    seq: u64,
}

impl RefreshTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// Something newer was applied while this refresh was in flight.
    Stale,
}

/// A value plus the sequence bookkeeping.
#[derive(Debug, Default)]
pub struct Sequenced<S> {
    value: S,
    next: u64,
    applied: u64,
}

impl<S> Sequenced<S> {
    pub fn new(value: S) -> Self {
        Sequenced {
            value,
            next: 1,
            applied: 0,
        }
    }

    pub fn value(&self) -> &S {
        &self.value
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next;
        self.next += 1;
        seq
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        RefreshTicket {
            seq: self.take_seq(),
        }
    }

    pub fn complete_refresh(&mut self, ticket: RefreshTicket, value: S) -> RefreshOutcome {
        if ticket.seq < self.applied {
            return RefreshOutcome::Stale;
        }
        self.value = value;
        self.applied = ticket.seq;
        RefreshOutcome::Applied
    }

    /// Apply a local change. It outranks every refresh already in flight.
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> R {
        let seq = self.take_seq();
        self.applied = seq;
        f(&mut self.value)
    }
}

/// Canonical appointments plus the rows normalization rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentSet {
    pub items: Vec<Appointment>,
    pub rejected: Vec<Rejected>,
}

/// Filter result with everything the dashboard shows alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredView {
    pub items: Vec<Appointment>,
    pub stats: Stats,
    pub experts: Vec<String>,
    pub specialties: Vec<String>,
    pub quarantined: usize,
}

#[derive(Clone)]
pub struct AppointmentSnapshot {
    inner: Arc<RwLock<Sequenced<AppointmentSet>>>,
    fetch_limit: i64,
}

impl AppointmentSnapshot {
    pub fn new(fetch_limit: i64) -> Self {
        AppointmentSnapshot {
            inner: Arc::new(RwLock::new(Sequenced::new(AppointmentSet::default()))),
            fetch_limit,
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Sequenced<AppointmentSet>) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut Sequenced<AppointmentSet>) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        self.write(|s| s.begin_refresh())
    }

    pub fn complete_refresh(&self, ticket: RefreshTicket, set: AppointmentSet) -> RefreshOutcome {
        self.write(|s| s.complete_refresh(ticket, set))
    }

    /// Re-read the table. On failure the previous snapshot stays in place.
    pub async fn refresh(&self, pool: &PgPool) -> Result<RefreshOutcome, sqlx::Error> {
        let ticket = self.begin_refresh();
        let raws = appointment::fetch_raw(pool, self.fetch_limit).await?;
        let (items, rejected) = appointment::partition(&raws);
        if !rejected.is_empty() {
            log::warn!("{} appointment rows quarantined during refresh", rejected.len());
        }
        let outcome = self.complete_refresh(ticket, AppointmentSet { items, rejected });
        if outcome == RefreshOutcome::Stale {
            log::debug!("Discarded stale appointment refresh #{}", ticket.seq());
        }
        Ok(outcome)
    }

    /// Run a refresh in the background, logging failures.
    pub fn spawn_refresh(&self, pool: PgPool) {
        let snapshot = self.clone();
        tokio::spawn(async move {
            if let Err(e) = snapshot.refresh(&pool).await {
                log::error!("Appointment refresh failed, keeping previous snapshot: {e}");
            }
        });
    }

    pub fn insert(&self, appointment: Appointment) {
        self.write(|s| {
            s.mutate(|set| {
                set.items.retain(|a| a.id != appointment.id);
                set.items.push(appointment);
            })
        });
    }

    /// Apply `f` to the appointment with `id`. False if it is not in the snapshot.
    pub fn update(&self, id: i64, f: impl FnOnce(&mut Appointment)) -> bool {
        self.write(|s| {
            s.mutate(|set| match set.items.iter_mut().find(|a| a.id == id) {
                Some(a) => {
                    f(a);
                    true
                }
                None => false,
            })
        })
    }

    pub fn remove(&self, id: i64) -> bool {
        self.write(|s| {
            s.mutate(|set| {
                let before = set.items.len();
                set.items.retain(|a| a.id != id);
                set.items.len() != before
            })
        })
    }

    /// Drop every appointment tagged with `batch_id`. Returns how many were removed.
    pub fn remove_batch(&self, batch_id: &str) -> usize {
        self.write(|s| {
            s.mutate(|set| {
                let before = set.items.len();
                set.items.retain(|a| a.batch_id.as_deref() != Some(batch_id));
                before - set.items.len()
            })
        })
    }

    pub fn get(&self, id: i64) -> Option<Appointment> {
        self.read(|s| s.value().items.iter().find(|a| a.id == id).cloned())
    }

    pub fn all(&self) -> Vec<Appointment> {
        self.read(|s| s.value().items.clone())
    }

    pub fn quarantine(&self) -> Vec<Rejected> {
        self.read(|s| s.value().rejected.clone())
    }

    pub fn applied_seq(&self) -> u64 {
        self.read(|s| s.applied())
    }

    pub fn filtered(&self, filter: &AppointmentFilter) -> FilteredView {
        self.read(|s| {
            let set = s.value();
            let items: Vec<Appointment> = filter.apply(&set.items).into_iter().cloned().collect();
            FilteredView {
                stats: Stats::from_appointments(&items),
                items,
                experts: distinct_experts(&set.items),
                specialties: distinct_specialties(&set.items),
                quarantined: set.rejected.len(),
            }
        })
    }
}
