//! Persistence for roster records.
//!
//! Backends only move opaque JSON payloads keyed by kind and id, and must
//! return them in creation order. [`Directory`] layers typed access on top.

pub mod memory;
#[cfg(feature = "redis-store")]
pub mod redis_store;

pub use memory::InMemoryStore;
#[cfg(feature = "redis-store")]
pub use redis_store::RedisStore;

use crate::error::DutyResult;
use crate::models::{Absence, Location, ScheduleEntry, Substitution, Teacher};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// The kinds of records kept in the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Teacher,
    Location,
    Schedule,
    Absence,
    Substitution,
}

impl RecordKind {
    /// Storage key fragment for this kind
    pub fn key(&self) -> &'static str {
        match self {
            RecordKind::Teacher => "teachers",
            RecordKind::Location => "locations",
            RecordKind::Schedule => "schedules",
            RecordKind::Absence => "absences",
            RecordKind::Substitution => "substitutions",
        }
    }

    /// Human-readable entity name used in errors
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Teacher => "Teacher",
            RecordKind::Location => "Location",
            RecordKind::Schedule => "Schedule entry",
            RecordKind::Absence => "Absence",
            RecordKind::Substitution => "Substitution",
        }
    }
}

/// Storage backend for directory records
#[async_trait]
pub trait DirectoryStore: Send + Sync + 'static {
    /// All payloads of a kind, oldest first
    async fn list(&self, kind: RecordKind) -> DutyResult<Vec<String>>;

    /// A single payload by id
    async fn get(&self, kind: RecordKind, id: Uuid) -> DutyResult<Option<String>>;

    /// Store a new payload
    async fn insert(&self, kind: RecordKind, id: Uuid, payload: String) -> DutyResult<()>;

    /// Overwrite an existing payload, keeping its position. Returns false if missing.
    async fn replace(&self, kind: RecordKind, id: Uuid, payload: String) -> DutyResult<bool>;

    /// Delete a payload. Returns false if missing.
    async fn remove(&self, kind: RecordKind, id: Uuid) -> DutyResult<bool>;
}

/// A typed record that lives in the directory
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: RecordKind;

    fn id(&self) -> Uuid;
}

impl Record for Teacher {
    const KIND: RecordKind = RecordKind::Teacher;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Location {
    const KIND: RecordKind = RecordKind::Location;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for ScheduleEntry {
    const KIND: RecordKind = RecordKind::Schedule;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Absence {
    const KIND: RecordKind = RecordKind::Absence;

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Substitution {
    const KIND: RecordKind = RecordKind::Substitution;

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Typed view over a [`DirectoryStore`]
#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn DirectoryStore>,
}

impl Directory {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    /// All records of a type in creation order
    pub async fn all<R: Record>(&self) -> DutyResult<Vec<R>> {
        let payloads = self.store.list(R::KIND).await?;
        payloads
            .iter()
            .map(|payload| serde_json::from_str(payload).map_err(Into::into))
            .collect()
    }

    /// Look up a record by id
    pub async fn find<R: Record>(&self, id: Uuid) -> DutyResult<Option<R>> {
        match self.store.get(R::KIND, id).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    pub async fn insert<R: Record>(&self, record: &R) -> DutyResult<()> {
        let payload = serde_json::to_string(record)?;
        self.store.insert(R::KIND, record.id(), payload).await
    }

    pub async fn replace<R: Record>(&self, record: &R) -> DutyResult<bool> {
        let payload = serde_json::to_string(record)?;
        self.store.replace(R::KIND, record.id(), payload).await
    }

    pub async fn remove<R: Record>(&self, id: Uuid) -> DutyResult<bool> {
        self.store.remove(R::KIND, id).await
    }
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory").finish_non_exhaustive()
    }
}
