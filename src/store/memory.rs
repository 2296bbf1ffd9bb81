use super::{DirectoryStore, RecordKind};
use crate::error::DutyResult;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory implementation of the directory (fallback and tests)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<RecordKind, Vec<(Uuid, String)>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn list(&self, kind: RecordKind) -> DutyResult<Vec<String>> {
        let records = self.records.read().await;
        Ok(records
            .get(&kind)
            .map(|rows| rows.iter().map(|(_, payload)| payload.clone()).collect())
            .unwrap_or_default())
    }

    async fn get(&self, kind: RecordKind, id: Uuid) -> DutyResult<Option<String>> {
        let records = self.records.read().await;
        Ok(records.get(&kind).and_then(|rows| {
            rows.iter()
                .find(|(row_id, _)| *row_id == id)
                .map(|(_, payload)| payload.clone())
        }))
    }

    async fn insert(&self, kind: RecordKind, id: Uuid, payload: String) -> DutyResult<()> {
        let mut records = self.records.write().await;
        records.entry(kind).or_default().push((id, payload));
        Ok(())
    }

    async fn replace(&self, kind: RecordKind, id: Uuid, payload: String) -> DutyResult<bool> {
        let mut records = self.records.write().await;
        let row = records
            .get_mut(&kind)
            .and_then(|rows| rows.iter_mut().find(|(row_id, _)| *row_id == id));

        match row {
            Some(row) => {
                row.1 = payload;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, kind: RecordKind, id: Uuid) -> DutyResult<bool> {
        let mut records = self.records.write().await;
        let Some(rows) = records.get_mut(&kind) else {
            return Ok(false);
        };

        let before = rows.len();
        rows.retain(|(row_id, _)| *row_id != id);
        Ok(rows.len() != before)
    }
}
