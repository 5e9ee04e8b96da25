//! In-memory reference implementation of the metadata record store.
//!
//! Keeps provenance records in a mutex-guarded vec. Deployments back this
//! with a real database behind the same trait; it mostly serves as the
//! executable reference for the trait's replace-on-reupload semantics.

use std::sync::Mutex;
use std::time::SystemTime;

use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{IconRecord, MetadataStore, NewIconRecord, RecordFilter};

#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: Mutex<Vec<IconRecord>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn create<'a>(
        &self,
        record: NewIconRecord<'a>,
    ) -> Result<IconRecord, Box<dyn std::error::Error + Send + Sync>> {
        let now = SystemTime::now();
        let created = IconRecord {
            id: if record.id.is_empty() {
                Uuid::new_v4().to_string()
            } else {
                record.id.to_string()
            },
            original_name: record.original_name.to_string(),
            filename: record.filename.to_string(),
            path: record.path.to_string(),
            mime_type: record.mime_type.to_string(),
            size: record.size,
            uploaded_by: record.uploaded_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        let mut records = self.records.lock().expect("metadata store lock poisoned");
        // Re-uploads replace the record stored under the same id.
        records.retain(|r| r.id != created.id);
        records.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(
        &self,
        id: &str,
    ) -> Result<Option<IconRecord>, Box<dyn std::error::Error + Send + Sync>> {
        let records = self.records.lock().expect("metadata store lock poisoned");
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn find_all(
        &self,
        filter: RecordFilter,
    ) -> Result<Vec<IconRecord>, Box<dyn std::error::Error + Send + Sync>> {
        let records = self.records.lock().expect("metadata store lock poisoned");
        Ok(records
            .iter()
            .filter(|r| match &filter.uploaded_by {
                Some(uploader) => &r.uploaded_by == uploader,
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn delete_by_id(
        &self,
        id: &str,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut records = self.records.lock().expect("metadata store lock poisoned");
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}
