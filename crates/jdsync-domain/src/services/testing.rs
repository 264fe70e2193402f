//! In-memory panel used by the service tests.

use std::collections::HashSet;

use async_trait::async_trait;
use jdsync_client::{CreateOutcome, Error, NewRecord, PanelApi, RecordId, RemoteRecord, Result};
use jdsync_config::SyncConfig;
use parking_lot::Mutex;

/// Scripted failures.
#[derive(Debug, Default, Clone)]
pub(crate) struct Failures {
    pub auth: Option<String>,
    pub list: Option<String>,
    pub create: Option<String>,
    pub deletes: HashSet<RecordId>,
    pub delete_timeouts: HashSet<RecordId>,
}

/// A panel that keeps its records in memory and enforces value uniqueness.
#[derive(Debug, Default)]
pub(crate) struct FakePanel {
    records: Mutex<Vec<RemoteRecord>>,
    failures: Mutex<Failures>,
    calls: Mutex<Vec<String>>,
}

impl FakePanel {
    pub fn with_records(records: Vec<RemoteRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    pub fn fail(&self, update: impl FnOnce(&mut Failures)) {
        update(&mut self.failures.lock());
    }

    pub fn records(&self) -> Vec<RemoteRecord> {
        self.records.lock().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn call(&self, name: String) {
        self.calls.lock().push(name);
    }
}

pub(crate) fn record(id: i64, value: &str) -> RemoteRecord {
    RemoteRecord {
        id: Some(RecordId(id)),
        name: jdsync_client::RECORD_NAME.to_string(),
        value: value.to_string(),
        remarks: String::new(),
    }
}

#[async_trait]
impl PanelApi for FakePanel {
    async fn authenticate(&self, _config: &SyncConfig) -> Result<String> {
        self.call("authenticate".to_string());
        tokio::task::yield_now().await;
        match self.failures.lock().auth.clone() {
            Some(message) => Err(Error::AuthFailed(message)),
            None => Ok("tok".to_string()),
        }
    }

    async fn list_records(
        &self,
        _config: &SyncConfig,
        token: &str,
        filter: &str,
    ) -> Result<Vec<RemoteRecord>> {
        self.call(format!("list:{}", filter));
        assert_eq!(token, "tok");
        if let Some(message) = self.failures.lock().list.clone() {
            return Err(Error::QueryFailed(message));
        }
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|r| r.name.contains(filter) || r.value.contains(filter))
            .cloned()
            .collect())
    }

    async fn create_record(
        &self,
        _config: &SyncConfig,
        _token: &str,
        record: &NewRecord,
    ) -> Result<CreateOutcome> {
        self.call("create".to_string());
        if let Some(message) = self.failures.lock().create.clone() {
            return Err(Error::CreateFailed(message));
        }

        let mut records = self.records.lock();
        if records.iter().any(|r| r.value == record.value) {
            return Ok(CreateOutcome {
                duplicate_detected: true,
            });
        }

        let id = records.iter().filter_map(|r| r.id).map(|id| id.0).max().unwrap_or(0) + 1;
        records.push(RemoteRecord {
            id: Some(RecordId(id)),
            name: record.name.clone(),
            value: record.value.clone(),
            remarks: record.remarks.clone(),
        });
        Ok(CreateOutcome::default())
    }

    async fn delete_record(&self, _config: &SyncConfig, _token: &str, id: RecordId) -> Result<()> {
        self.call(format!("delete:{}", id));
        let failures = self.failures.lock().clone();
        if failures.deletes.contains(&id) {
            return Err(Error::DeleteFailed("Failed to delete env".to_string()));
        }
        if failures.delete_timeouts.contains(&id) {
            return Err(Error::Timeout {
                url: "http://ql.local/open/envs".to_string(),
            });
        }
        self.records.lock().retain(|r| r.id != Some(id));
        Ok(())
    }
}
