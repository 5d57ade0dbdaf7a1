use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::domain::claims::ClaimMap;
use crate::domain::repositories::KeyValueStore;
use crate::domain::team::PokemonId;
use crate::domain::user::DisplayName;
use crate::infrastructure::local_store::{keys, SharedStorage, StorageChange, SubscriptionId};

/// One consumer's view of the shared claim map
///
/// Reads come from an in-memory cache restored from durable storage when the
/// store is opened. Writes update the cache, persist the whole map, then
/// announce a change token for every other consumer; this store never
/// receives its own announcements. When another consumer announces a change
/// to claims, saved teams or the ping slot, the cache is reloaded from
/// durable storage before any external subscriber runs.
///
/// `set` and `clear` are last-writer-wins with no ownership check.
pub struct ClaimStore {
    origin: Uuid,
    storage: Arc<SharedStorage>,
    cache: Arc<RwLock<ClaimMap>>,
    refresh_subscription: SubscriptionId,
}

impl ClaimStore {
    /// Opens a consumer on the shared storage and restores persisted claims
    pub fn open(storage: Arc<SharedStorage>) -> Result<Self, String> {
        let origin = Uuid::new_v4();
        let cache = Arc::new(RwLock::new(load(&storage.kv())?));

        let kv = storage.kv();
        let refreshed = Arc::clone(&cache);
        let refresh_subscription = storage.subscribe(Some(origin), move |change| {
            if !is_claim_relevant(change) {
                return;
            }
            match load(&kv) {
                Ok(map) => *write(&refreshed) = map,
                Err(e) => tracing::warn!(error = %e, "Failed to refresh claims"),
            }
        });

        tracing::info!(%origin, claims = read(&cache).len(), "Claim store opened");

        Ok(Self {
            origin,
            storage,
            cache,
            refresh_subscription,
        })
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    /// Snapshot of the current claim map
    pub fn get(&self) -> ClaimMap {
        read(&self.cache).clone()
    }

    pub fn holder(&self, id: PokemonId) -> Option<DisplayName> {
        read(&self.cache).holder(id).cloned()
    }

    /// Records `holder` for `id`, replacing whoever held it
    pub fn set(&self, id: PokemonId, holder: DisplayName) -> Result<(), String> {
        self.mutate(|claims| {
            claims.set(id, holder);
        })
    }

    pub fn clear(&self, id: PokemonId) -> Result<(), String> {
        self.mutate(|claims| {
            claims.clear(id);
        })
    }

    /// Applies several edits under one write and one announcement
    pub fn mutate<F, R>(&self, edit: F) -> Result<R, String>
    where
        F: FnOnce(&mut ClaimMap) -> R,
    {
        match self.try_mutate(|claims| Ok::<R, Infallible>(edit(claims)))? {
            Ok(result) => Ok(result),
            Err(never) => match never {},
        }
    }

    /// Like [`ClaimStore::mutate`], but an `Err` from `edit` discards its
    /// edits and skips the write and the announcement
    pub fn try_mutate<F, R, E>(&self, edit: F) -> Result<Result<R, E>, String>
    where
        F: FnOnce(&mut ClaimMap) -> Result<R, E>,
    {
        let result = {
            let mut cache = write(&self.cache);
            let mut draft = cache.clone();
            let result = match edit(&mut draft) {
                Ok(result) => result,
                Err(e) => return Ok(Err(e)),
            };
            let encoded = serde_json::to_string(&draft)
                .map_err(|e| format!("Failed to encode claims: {}", e))?;
            self.storage.kv().set(keys::CLAIMS, &encoded)?;
            *cache = draft;
            result
        };
        self.broadcast()?;
        Ok(Ok(result))
    }

    /// Announces that claims changed
    pub fn broadcast(&self) -> Result<StorageChange, String> {
        self.storage.announce(self.origin, keys::CLAIMS)
    }

    /// Re-reads the durable map, discarding the cache
    pub fn reload(&self) -> Result<(), String> {
        let map = load(&self.storage.kv())?;
        *write(&self.cache) = map;
        Ok(())
    }

    /// Runs `handler` after each external change has been applied locally
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&StorageChange) + Send + Sync + 'static,
    {
        self.storage.subscribe(Some(self.origin), move |change| {
            if is_claim_relevant(change) {
                handler(change);
            }
        })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.storage.unsubscribe(id)
    }
}

impl Drop for ClaimStore {
    fn drop(&mut self) {
        self.storage.unsubscribe(self.refresh_subscription);
    }
}

fn is_claim_relevant(change: &StorageChange) -> bool {
    [keys::CLAIMS, keys::TEAMS, keys::PING].contains(&change.key.as_str())
}

/// Decodes the durable map entry by entry
///
/// Unparseable text reads as empty. Within a valid object, entries whose id
/// or holder is unusable are dropped and the rest are kept.
fn load(kv: &Arc<dyn KeyValueStore>) -> Result<ClaimMap, String> {
    let Some(raw) = kv.get(keys::CLAIMS)? else {
        return Ok(ClaimMap::new());
    };
    let entries: BTreeMap<String, Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding malformed claim map");
            return Ok(ClaimMap::new());
        }
    };

    let mut claims = ClaimMap::new();
    for (key, holder) in entries {
        let id = PokemonId::coerce(&Value::String(key.clone()));
        let name = holder.as_str().and_then(DisplayName::new);
        match (id, name) {
            (Some(id), Some(name)) => {
                claims.set(id, name);
            }
            _ => tracing::warn!(key = %key, holder = %holder, "Skipping malformed claim"),
        }
    }
    Ok(claims)
}

fn read(cache: &RwLock<ClaimMap>) -> std::sync::RwLockReadGuard<'_, ClaimMap> {
    cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(cache: &RwLock<ClaimMap>) -> std::sync::RwLockWriteGuard<'_, ClaimMap> {
    cache.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn id(n: i64) -> PokemonId {
        PokemonId::new(n).unwrap()
    }

    fn name(s: &str) -> DisplayName {
        DisplayName::new(s).unwrap()
    }

    #[test]
    fn set_overwrites_existing_holder_without_error() {
        let store = ClaimStore::open(Arc::new(SharedStorage::in_memory())).unwrap();

        store.set(id(25), name("Ash")).unwrap();
        assert!(store.set(id(25), name("Gary")).is_ok());

        assert_eq!(store.holder(id(25)), Some(name("Gary")));
    }

    #[test]
    fn open_restores_persisted_claims() {
        let storage = Arc::new(SharedStorage::in_memory());
        {
            let first = ClaimStore::open(Arc::clone(&storage)).unwrap();
            first.set(id(1), name("Red")).unwrap();
        }

        let second = ClaimStore::open(storage).unwrap();
        assert_eq!(second.holder(id(1)), Some(name("Red")));
    }

    #[test]
    fn other_consumers_see_changes_after_broadcast() {
        let storage = Arc::new(SharedStorage::in_memory());
        let tab_a = ClaimStore::open(Arc::clone(&storage)).unwrap();
        let tab_b = ClaimStore::open(Arc::clone(&storage)).unwrap();

        tab_a.set(id(7), name("Misty")).unwrap();
        assert_eq!(tab_b.holder(id(7)), Some(name("Misty")));

        tab_b.clear(id(7)).unwrap();
        assert_eq!(tab_a.holder(id(7)), None);
    }

    #[test]
    fn subscriber_runs_only_for_external_writes() {
        let storage = Arc::new(SharedStorage::in_memory());
        let tab_a = ClaimStore::open(Arc::clone(&storage)).unwrap();
        let tab_b = ClaimStore::open(Arc::clone(&storage)).unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&seen);
        let sub = tab_a.subscribe(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        tab_a.set(id(1), name("Ash")).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        tab_b.set(id(2), name("Brock")).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        assert!(tab_a.unsubscribe(sub));
        tab_b.set(id(3), name("Brock")).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn mutate_announces_once() {
        let storage = Arc::new(SharedStorage::in_memory());
        let store = ClaimStore::open(Arc::clone(&storage)).unwrap();
        let mut changes = storage.changes();

        store
            .mutate(|claims| {
                claims.set(id(1), name("Ash"));
                claims.set(id(2), name("Ash"));
            })
            .unwrap();

        assert!(changes.try_recv().is_ok());
        assert!(changes.try_recv().is_err());
        assert_eq!(store.get().len(), 2);
    }

    #[test]
    fn failed_try_mutate_leaves_no_trace() {
        let storage = Arc::new(SharedStorage::in_memory());
        let store = ClaimStore::open(Arc::clone(&storage)).unwrap();
        let mut changes = storage.changes();

        let outcome = store
            .try_mutate(|claims| {
                claims.set(id(1), name("Ash"));
                Err::<(), _>("refused")
            })
            .unwrap();

        assert_eq!(outcome, Err("refused"));
        assert!(store.get().is_empty());
        assert!(storage.kv().get(keys::CLAIMS).unwrap().is_none());
        assert!(changes.try_recv().is_err());
    }

    #[test]
    fn malformed_durable_claims_start_empty() {
        let storage = Arc::new(SharedStorage::in_memory());
        storage.kv().set(keys::CLAIMS, "not-json").unwrap();

        let store = ClaimStore::open(storage).unwrap();
        assert!(store.get().is_empty());
    }

    #[test]
    fn malformed_entries_are_dropped_individually() {
        let storage = Arc::new(SharedStorage::in_memory());
        storage
            .kv()
            .set(
                keys::CLAIMS,
                r#"{"1":"Red","4":"Blue","7":"Green","0":"Ghost","9":"  ","x":"Gary","12":3}"#,
            )
            .unwrap();

        let store = ClaimStore::open(Arc::clone(&storage)).unwrap();
        assert_eq!(store.get().len(), 3);
        assert_eq!(store.holder(id(4)), Some(name("Blue")));

        store.set(id(25), name("Ash")).unwrap();

        let durable: serde_json::Value =
            serde_json::from_str(&storage.kv().get(keys::CLAIMS).unwrap().unwrap()).unwrap();
        assert_eq!(
            durable,
            serde_json::json!({"1": "Red", "4": "Blue", "7": "Green", "25": "Ash"})
        );
    }
}
