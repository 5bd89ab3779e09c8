use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::clock::Clock;

use super::{
    DirectoryService, FieldMask, RecordField, RecordSource, RemoteError, RemoteRecord, SourceKind,
};

/// Directory operations that can be made to fail on purpose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectoryOp {
    Get,
    Patch,
    AddMember,
    RemoveMember,
}

#[derive(Default)]
struct DirectoryState {
    records: HashMap<String, RemoteRecord>,
    revision: u64,
    last_stamp: Option<DateTime<Utc>>,
    writes: usize,
    /// Remaining forced failures per (operation, target id).
    failures: HashMap<(DirectoryOp, String), usize>,
}

impl DirectoryState {
    fn take_failure(&mut self, op: DirectoryOp, target: &str) -> bool {
        match self.failures.get_mut(&(op, target.to_string())) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        }
    }

    /// New etag and a strictly increasing update time for `record`.
    fn stamp(&mut self, record: &mut RemoteRecord, now: DateTime<Utc>) {
        self.revision += 1;
        let at = match self.last_stamp {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_stamp = Some(at);

        record.etag = format!("etag-{}", self.revision);
        let update_time = at.to_rfc3339_opts(SecondsFormat::Millis, true);
        match record
            .sources
            .iter()
            .position(|s| s.kind == SourceKind::Contact)
        {
            Some(i) => record.sources[i].update_time = update_time,
            None => record.sources.insert(
                0,
                RecordSource {
                    kind: SourceKind::Contact,
                    update_time,
                },
            ),
        }
    }
}

/// In-process [`DirectoryService`] with etag checks, a write counter and
/// failure injection. Clones share the same records.
#[derive(Clone)]
pub struct InMemoryDirectory {
    state: Arc<Mutex<DirectoryState>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDirectory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(DirectoryState::default())),
            clock,
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, DirectoryState>, RemoteError> {
        self.state
            .lock()
            .map_err(|_| RemoteError::Transport("directory state poisoned".into()))
    }

    /// Store `record` as is. Existing records with the same id are replaced.
    pub fn insert(&self, record: RemoteRecord) -> Result<(), RemoteError> {
        let mut state = self.state()?;
        state.records.insert(record.remote_id.clone(), record);
        Ok(())
    }

    /// Create an empty record with a stamped direct-edit source.
    pub fn create(&self, remote_id: &str) -> Result<RemoteRecord, RemoteError> {
        let mut state = self.state()?;
        let mut record = RemoteRecord::new(remote_id);
        state.stamp(&mut record, self.clock.now());
        state.records.insert(remote_id.to_string(), record.clone());
        Ok(record)
    }

    /// Full stored record, ignoring masks and injected failures.
    pub fn record(&self, remote_id: &str) -> Option<RemoteRecord> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.records.get(remote_id).cloned())
    }

    /// Successful mutating calls (patches and membership changes).
    pub fn write_count(&self) -> usize {
        self.state.lock().map(|state| state.writes).unwrap_or(0)
    }

    /// Make the next `times` calls of `op` on `target` fail with a transport
    /// error. `target` is a record id, or a group id for membership ops.
    pub fn fail_next(&self, op: DirectoryOp, target: &str, times: usize) -> Result<(), RemoteError> {
        let mut state = self.state()?;
        state.failures.insert((op, target.to_string()), times);
        Ok(())
    }

    /// Apply an edit the way a user editing the record directly would: the
    /// record gets a new etag and update time, and the write counter is not
    /// touched.
    pub fn simulate_user_edit(
        &self,
        remote_id: &str,
        edit: impl FnOnce(&mut RemoteRecord),
    ) -> Result<(), RemoteError> {
        let mut state = self.state()?;
        let mut record = state
            .records
            .get(remote_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(remote_id.to_string()))?;
        edit(&mut record);
        state.stamp(&mut record, self.clock.now());
        state.records.insert(remote_id.to_string(), record);
        Ok(())
    }
}

fn project(record: &RemoteRecord, mask: &FieldMask) -> RemoteRecord {
    let mut out = RemoteRecord::new(record.remote_id.clone());
    out.etag = record.etag.clone();
    for field in mask.iter() {
        match field {
            RecordField::Metadata => out.sources = record.sources.clone(),
            RecordField::CustomFields => out.custom_fields = record.custom_fields.clone(),
            RecordField::Events => out.events = record.events.clone(),
            RecordField::Birthdays => out.birthdays = record.birthdays.clone(),
            RecordField::Memberships => out.memberships = record.memberships.clone(),
        }
    }
    out
}

impl DirectoryService for InMemoryDirectory {
    fn get(&self, remote_id: &str, mask: &FieldMask) -> Result<RemoteRecord, RemoteError> {
        let mut state = self.state()?;
        if state.take_failure(DirectoryOp::Get, remote_id) {
            return Err(RemoteError::Transport(format!("injected get failure on {}", remote_id)));
        }
        state
            .records
            .get(remote_id)
            .map(|record| project(record, mask))
            .ok_or_else(|| RemoteError::NotFound(remote_id.to_string()))
    }

    fn patch(
        &self,
        remote_id: &str,
        record: &RemoteRecord,
        mask: &FieldMask,
    ) -> Result<(), RemoteError> {
        let mut state = self.state()?;
        if state.take_failure(DirectoryOp::Patch, remote_id) {
            return Err(RemoteError::Transport(format!(
                "injected patch failure on {}",
                remote_id
            )));
        }

        let mut stored = state
            .records
            .get(remote_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(remote_id.to_string()))?;
        if stored.etag != record.etag {
            return Err(RemoteError::StaleEtag(remote_id.to_string()));
        }

        for field in mask.iter() {
            match field {
                RecordField::CustomFields => stored.custom_fields = record.custom_fields.clone(),
                RecordField::Events => stored.events = record.events.clone(),
                RecordField::Birthdays => stored.birthdays = record.birthdays.clone(),
                RecordField::Metadata | RecordField::Memberships => {
                    return Err(RemoteError::Rejected(format!(
                        "{} is not writable through patch",
                        field.as_str()
                    )));
                }
            }
        }

        state.stamp(&mut stored, self.clock.now());
        state.records.insert(remote_id.to_string(), stored);
        state.writes += 1;
        Ok(())
    }

    fn add_member(&self, remote_id: &str, group_id: &str) -> Result<(), RemoteError> {
        let mut state = self.state()?;
        if state.take_failure(DirectoryOp::AddMember, group_id) {
            return Err(RemoteError::Transport(format!("injected add failure on {}", group_id)));
        }
        let record = state
            .records
            .get_mut(remote_id)
            .ok_or_else(|| RemoteError::NotFound(remote_id.to_string()))?;
        if !record.memberships.iter().any(|g| g == group_id) {
            record.memberships.push(group_id.to_string());
        }
        state.writes += 1;
        Ok(())
    }

    fn remove_member(&self, remote_id: &str, group_id: &str) -> Result<(), RemoteError> {
        let mut state = self.state()?;
        if state.take_failure(DirectoryOp::RemoveMember, group_id) {
            return Err(RemoteError::Transport(format!(
                "injected remove failure on {}",
                group_id
            )));
        }
        let record = state
            .records
            .get_mut(remote_id)
            .ok_or_else(|| RemoteError::NotFound(remote_id.to_string()))?;
        record.memberships.retain(|g| g != group_id);
        state.writes += 1;
        Ok(())
    }
}
