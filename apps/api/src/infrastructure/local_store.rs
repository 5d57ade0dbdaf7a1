// Local durable storage
// Key-value adapters plus the change broadcast shared by every consumer

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::repositories::KeyValueStore;

/// Fixed key names in the local store
pub mod keys {
    pub const CLAIMS: &str = "ptb_claims";
    pub const TEAMS: &str = "ptb_teams";
    pub const USERS: &str = "ptb_users";
    pub const CURRENT_USER: &str = "ptb_current_user";
    pub const ADMIN: &str = "ptb_admin";
    pub const PING: &str = "ptb_ping";
}

/// Volatile key-value store
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn flush(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Key-value store persisted as a single JSON object on disk
///
/// Every write rewrites the file through a temporary sibling and a rename, so
/// a crash leaves either the old or the new contents.
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileKeyValueStore {
    /// Opens the store, restoring whatever the file already holds
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw)
                    .map_err(|e| format!("Corrupt local store {}: {}", path.display(), e))?
            }
        } else {
            HashMap::new()
        };

        tracing::info!(path = %path.display(), keys = entries.len(), "Local store opened");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<(), String> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        let encoded = serde_json::to_string_pretty(entries)
            .map_err(|e| format!("Failed to encode local store: {}", e))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, encoded)
            .map_err(|e| format!("Failed to write {}: {}", tmp.display(), e))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| format!("Failed to replace {}: {}", self.path.display(), e))
    }
}

impl KeyValueStore for JsonFileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), String> {
        let entries = lock(&self.entries);
        self.persist(&entries)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A change announced by one consumer of the shared store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageChange {
    /// Monotonically increasing change token
    pub token: u64,
    /// Consumer that wrote the change
    pub origin: Uuid,
    /// Key that changed
    pub key: String,
}

/// Handle returned by [`SharedStorage::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&StorageChange) + Send + Sync>;

struct Subscription {
    /// Changes written by this origin are not delivered back to it
    origin: Option<Uuid>,
    handler: Handler,
}

/// Durable store shared by every consumer, plus its change broadcast
///
/// Each consumer writes with its own origin. After a write the consumer
/// announces the change; handlers registered by other origins run in
/// registration order, each to completion, before `announce` returns.
pub struct SharedStorage {
    kv: Arc<dyn KeyValueStore>,
    last_token: AtomicU64,
    next_subscription: AtomicU64,
    subscriptions: Mutex<Vec<(SubscriptionId, Subscription)>>,
    tx: broadcast::Sender<StorageChange>,
}

impl SharedStorage {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        // Resume after the last persisted token so tokens never go backwards.
        let last = kv
            .get(keys::PING)
            .ok()
            .flatten()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(0);
        let (tx, _) = broadcast::channel(64);

        Self {
            kv,
            last_token: AtomicU64::new(last),
            next_subscription: AtomicU64::new(1),
            subscriptions: Mutex::new(Vec::new()),
            tx,
        }
    }

    /// Volatile storage, mostly for tests
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    pub fn kv(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.kv)
    }

    /// Reads and decodes a JSON value, treating malformed text as absent
    pub fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>, String> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring malformed local value");
                Ok(None)
            }
        }
    }

    pub fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), String> {
        let encoded =
            serde_json::to_string(value).map_err(|e| format!("Failed to encode {}: {}", key, e))?;
        self.kv.set(key, &encoded)
    }

    /// Writes a fresh change token and notifies every other consumer
    ///
    /// Tokens are the wall clock in milliseconds, bumped past the previous
    /// token when the clock has not moved or went backwards.
    pub fn announce(&self, origin: Uuid, key: &str) -> Result<StorageChange, String> {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let mut previous = self.last_token.load(Ordering::SeqCst);
        let token = loop {
            let candidate = now.max(previous.saturating_add(1));
            match self.last_token.compare_exchange(
                previous,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break candidate,
                Err(actual) => previous = actual,
            }
        };
        self.kv.set(keys::PING, &token.to_string())?;

        let change = StorageChange {
            token,
            origin,
            key: key.to_string(),
        };

        let handlers: Vec<Handler> = lock(&self.subscriptions)
            .iter()
            .filter(|(_, sub)| sub.origin != Some(origin))
            .map(|(_, sub)| Arc::clone(&sub.handler))
            .collect();
        for handler in handlers {
            handler(&change);
        }

        // No receivers is fine: nobody is streaming changes right now.
        let _ = self.tx.send(change.clone());

        Ok(change)
    }

    /// Registers a handler for changes written by anyone but `origin`
    pub fn subscribe<F>(&self, origin: Option<Uuid>, handler: F) -> SubscriptionId
    where
        F: Fn(&StorageChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        lock(&self.subscriptions).push((
            id,
            Subscription {
                origin,
                handler: Arc::new(handler),
            },
        ));
        id
    }

    /// Returns true if the subscription existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = lock(&self.subscriptions);
        let before = subscriptions.len();
        subscriptions.retain(|(sid, _)| *sid != id);
        subscriptions.len() != before
    }

    /// Stream of every change, for push delivery to remote consumers
    pub fn changes(&self) -> broadcast::Receiver<StorageChange> {
        self.tx.subscribe()
    }

    pub fn last_token(&self) -> u64 {
        self.last_token.load(Ordering::SeqCst)
    }

    pub fn flush(&self) -> Result<(), String> {
        self.kv.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn tokens_strictly_increase() {
        let storage = SharedStorage::in_memory();
        let origin = Uuid::new_v4();

        let a = storage.announce(origin, keys::CLAIMS).unwrap();
        let b = storage.announce(origin, keys::CLAIMS).unwrap();

        assert!(b.token > a.token);
        assert_eq!(
            storage.kv().get(keys::PING).unwrap(),
            Some(b.token.to_string())
        );
    }

    #[test]
    fn tokens_resume_after_persisted_value() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        let far_future = u64::MAX / 2;
        kv.set(keys::PING, &far_future.to_string()).unwrap();

        let storage = SharedStorage::new(kv);
        let change = storage.announce(Uuid::new_v4(), keys::CLAIMS).unwrap();

        assert_eq!(change.token, far_future + 1);
    }

    #[test]
    fn tokens_stop_at_the_ceiling() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        kv.set(keys::PING, &u64::MAX.to_string()).unwrap();

        let storage = SharedStorage::new(kv);
        let first = storage.announce(Uuid::new_v4(), keys::CLAIMS).unwrap();
        let second = storage.announce(Uuid::new_v4(), keys::CLAIMS).unwrap();

        assert_eq!(first.token, u64::MAX);
        assert_eq!(second.token, u64::MAX);
        assert_eq!(storage.last_token(), u64::MAX);
    }

    #[test]
    fn writer_is_not_notified_of_its_own_change() {
        let storage = SharedStorage::in_memory();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mine = Arc::new(AtomicUsize::new(0));
        let theirs = Arc::new(AtomicUsize::new(0));

        let m = Arc::clone(&mine);
        storage.subscribe(Some(me), move |_| {
            m.fetch_add(1, Ordering::SeqCst);
        });
        let t = Arc::clone(&theirs);
        storage.subscribe(Some(other), move |_| {
            t.fetch_add(1, Ordering::SeqCst);
        });

        storage.announce(me, keys::CLAIMS).unwrap();

        assert_eq!(mine.load(Ordering::SeqCst), 0);
        assert_eq!(theirs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let storage = SharedStorage::in_memory();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let id = storage.subscribe(None, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        storage.announce(Uuid::new_v4(), keys::CLAIMS).unwrap();
        assert!(storage.unsubscribe(id));
        assert!(!storage.unsubscribe(id));
        storage.announce(Uuid::new_v4(), keys::CLAIMS).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn malformed_json_reads_as_absent() {
        let storage = SharedStorage::in_memory();
        storage.kv().set(keys::USERS, "{not json").unwrap();

        let users: Option<Vec<String>> = storage.read_json(keys::USERS).unwrap();
        assert!(users.is_none());
    }

    #[test]
    fn json_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local.json");

        let store = JsonFileKeyValueStore::open(&path).unwrap();
        store.set(keys::CURRENT_USER, "Ash").unwrap();
        store.set(keys::ADMIN, "1").unwrap();
        store.remove(keys::ADMIN).unwrap();
        drop(store);

        let reopened = JsonFileKeyValueStore::open(&path).unwrap();
        assert_eq!(reopened.path(), path.as_path());
        assert_eq!(reopened.get(keys::CURRENT_USER).unwrap().as_deref(), Some("Ash"));
        assert_eq!(reopened.get(keys::ADMIN).unwrap(), None);
    }

    #[test]
    fn json_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "[1,2,3]").unwrap();

        assert!(JsonFileKeyValueStore::open(&path).is_err());
    }
}
