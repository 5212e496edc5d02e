//! Process-local [`CacheStore`] with clock-driven expiry.
//!
//! Keys expire once the injected clock reaches their deadline, so tests can
//! step through a session lifetime without sleeping. Batches are applied to
//! a copy of the key space and swapped in only when every command succeeds.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{CacheBatch, CacheCommand, CacheStore, CacheStoreError};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn persistent(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

type Entries = HashMap<String, Entry>;

fn wrong_type(key: &str) -> CacheStoreError {
    CacheStoreError::backend(format!(
        "WRONGTYPE operation against key '{key}' holding the wrong kind of value"
    ))
}

fn deadline(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, CacheStoreError> {
    let delta = TimeDelta::from_std(ttl)
        .map_err(|err| CacheStoreError::backend(format!("invalid expiry: {err}")))?;
    now.checked_add_signed(delta)
        .ok_or_else(|| CacheStoreError::backend("expiry out of range"))
}

/// Drop `key` when it has expired and return the live entry, if any.
fn live<'a>(entries: &'a mut Entries, key: &str, now: DateTime<Utc>) -> Option<&'a mut Entry> {
    if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
        entries.remove(key);
    }
    entries.get_mut(key)
}

fn hash_mut<'a>(
    entries: &'a mut Entries,
    key: &str,
    now: DateTime<Utc>,
) -> Result<&'a mut HashMap<String, String>, CacheStoreError> {
    if live(entries, key, now).is_none() {
        entries.insert(key.to_owned(), Entry::persistent(Value::Hash(HashMap::new())));
    }
    match entries.get_mut(key).map(|entry| &mut entry.value) {
        Some(Value::Hash(fields)) => Ok(fields),
        _ => Err(wrong_type(key)),
    }
}

fn apply(
    entries: &mut Entries,
    command: CacheCommand,
    now: DateTime<Utc>,
) -> Result<(), CacheStoreError> {
    match command {
        CacheCommand::SetHashFields { key, fields } => {
            hash_mut(entries, &key, now)?.extend(fields);
        }
        CacheCommand::SetString { key, value, ttl } => {
            let expires_at = ttl.map(|ttl| deadline(now, ttl)).transpose()?;
            entries.insert(
                key,
                Entry {
                    value: Value::Text(value),
                    expires_at,
                },
            );
        }
        CacheCommand::Expire { key, ttl } => {
            let expires_at = deadline(now, ttl)?;
            if let Some(entry) = live(entries, &key, now) {
                entry.expires_at = Some(expires_at);
            }
        }
        CacheCommand::ListPush { key, value } => {
            if live(entries, &key, now).is_none() {
                entries.insert(key.clone(), Entry::persistent(Value::List(VecDeque::new())));
            }
            match entries.get_mut(&key).map(|entry| &mut entry.value) {
                Some(Value::List(items)) => items.push_front(value),
                _ => return Err(wrong_type(&key)),
            }
        }
        CacheCommand::ListRemove { key, value } => {
            match live(entries, &key, now).map(|entry| &mut entry.value) {
                Some(Value::List(items)) => items.retain(|item| item != &value),
                Some(_) => return Err(wrong_type(&key)),
                None => {}
            }
        }
        CacheCommand::Delete { key } => {
            entries.remove(&key);
        }
    }
    Ok(())
}

/// In-memory cache store used by tests and local runs.
pub struct InMemoryCacheStore {
    clock: Arc<dyn Clock>,
    entries: Mutex<Entries>,
    available: AtomicBool,
}

impl InMemoryCacheStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate losing (or regaining) the connection to the cache.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Deadline of `key`, if it is live and has one.
    pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
        let now = self.clock.utc();
        let mut entries = self.lock().ok()?;
        live(&mut entries, key, now).and_then(|entry| entry.expires_at)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>, CacheStoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(CacheStoreError::unavailable("in-memory cache switched off"));
        }
        self.entries
            .lock()
            .map_err(|_| CacheStoreError::backend("cache state poisoned"))
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn exists(&self, key: &str) -> Result<bool, CacheStoreError> {
        let now = self.clock.utc();
        Ok(live(&mut *self.lock()?, key, now).is_some())
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        match live(&mut entries, key, now).map(|entry| &entry.value) {
            None => Ok(None),
            Some(Value::Text(value)) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_string(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), CacheStoreError> {
        let now = self.clock.utc();
        apply(
            &mut *self.lock()?,
            CacheCommand::SetString {
                key: key.to_owned(),
                value: value.to_owned(),
                ttl,
            },
            now,
        )
    }

    async fn get_hash(&self, key: &str) -> Result<HashMap<String, String>, CacheStoreError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        match live(&mut entries, key, now).map(|entry| &entry.value) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(fields)) => Ok(fields.clone()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn get_hash_field(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<String>, CacheStoreError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        match live(&mut entries, key, now).map(|entry| &entry.value) {
            None => Ok(None),
            Some(Value::Hash(fields)) => Ok(fields.get(field).cloned()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set_hash_field(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), CacheStoreError> {
        let now = self.clock.utc();
        hash_mut(&mut *self.lock()?, key, now)?.insert(field.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete_hash_field(&self, key: &str, field: &str) -> Result<(), CacheStoreError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        let emptied = match live(&mut entries, key, now).map(|entry| &mut entry.value) {
            None => return Ok(()),
            Some(Value::Hash(fields)) => {
                fields.remove(field);
                fields.is_empty()
            }
            Some(_) => return Err(wrong_type(key)),
        };
        if emptied {
            entries.remove(key);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheStoreError> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn list_range(&self, key: &str) -> Result<Vec<String>, CacheStoreError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        match live(&mut entries, key, now).map(|entry| &entry.value) {
            None => Ok(Vec::new()),
            Some(Value::List(items)) => Ok(items.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn execute(&self, batch: CacheBatch) -> Result<(), CacheStoreError> {
        let now = self.clock.utc();
        let mut entries = self.lock()?;
        let mut staged = entries.clone();
        let applied = batch.len();
        for command in batch.into_commands() {
            apply(&mut staged, command, now)?;
        }
        *entries = staged;
        debug!(commands = applied, "cache batch applied");
        Ok(())
    }
}
