// SPDX-License-Identifier: GPL-3.0-only
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info};
use crate::registry::models::{dedup_favorites, IntoPlaceId, PlaceId};
use crate::store::LocalStore;

/// Callback invoked with the full favorites list after every mutation
pub type Listener = Arc<dyn Fn(&[PlaceId]) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Handle returned by [`FavoritesRegistry::subscribe`].
///
/// Dropping the handle keeps the listener registered for the registry's
/// lifetime; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Remove the listener. Returns false if the registry is already gone.
    pub fn unsubscribe(self) -> bool {
        match self.listeners.upgrade() {
            Some(listeners) => {
                let mut listeners = listeners.lock().unwrap_or_else(PoisonError::into_inner);
                listeners.entries.retain(|(id, _)| *id != self.id);
                true
            }
            None => false,
        }
    }
}

/// Favorites of one tab: the in-memory list plus the store it is persisted to.
///
/// Constructed once per session and shared through an `Arc` with the sync
/// service, the binder and the cross-tab listener. Every mutation writes the
/// whole list back to the store and then notifies subscribers on the calling
/// thread, outside the internal lock.
pub struct FavoritesRegistry {
    store: LocalStore,
    favorites: Mutex<Vec<PlaceId>>,
    listeners: Arc<Mutex<Listeners>>,
}

impl FavoritesRegistry {
    pub fn new(store: LocalStore) -> Self {
        let favorites = store.read();
        info!(key = %store.key(), count = favorites.len(), "Loaded favorites");

        Self {
            store,
            favorites: Mutex::new(favorites),
            listeners: Arc::default(),
        }
    }

    pub fn is_favorited(&self, id: impl IntoPlaceId) -> bool {
        match id.into_place_id() {
            Some(id) => self.lock().contains(&id),
            None => false,
        }
    }

    /// Add `id`. Returns false, without persisting or notifying, when it is
    /// already a favorite or is not a valid place id.
    pub fn add(&self, id: impl IntoPlaceId) -> bool {
        let Some(id) = resolve(id, "add") else {
            return false;
        };

        let added = self.mutate(|favorites| {
            if favorites.contains(&id) {
                return false;
            }
            favorites.push(id);
            true
        });

        if added {
            info!(place_id = %id, "Added favorite");
        }
        added
    }

    /// Remove `id`. Returns false when it was not a favorite.
    pub fn remove(&self, id: impl IntoPlaceId) -> bool {
        let Some(id) = resolve(id, "remove") else {
            return false;
        };

        let removed = self.mutate(|favorites| match favorites.iter().position(|f| *f == id) {
            Some(index) => {
                favorites.remove(index);
                true
            }
            None => false,
        });

        if removed {
            info!(place_id = %id, "Removed favorite");
        }
        removed
    }

    /// Flip `id` and return whether it is now a favorite.
    ///
    /// An invalid id is left alone and reported as not favorited.
    pub fn toggle(&self, id: impl IntoPlaceId) -> bool {
        let Some(id) = resolve(id, "toggle") else {
            return false;
        };

        let mut now_favorited = false;
        self.mutate(|favorites| {
            match favorites.iter().position(|f| *f == id) {
                Some(index) => {
                    favorites.remove(index);
                }
                None => {
                    favorites.push(id);
                    now_favorited = true;
                }
            }
            true
        });

        info!(place_id = %id, favorited = now_favorited, "Toggled favorite");
        now_favorited
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.mutate(|favorites| {
            favorites.clear();
            true
        });
        info!("Cleared favorites");
    }

    /// Copy of the current favorites, in insertion order
    pub fn snapshot(&self) -> Vec<PlaceId> {
        self.lock().clone()
    }

    /// Replace the whole list, e.g. with the result of a backend merge.
    /// Repeated ids are dropped. Returns the stored list.
    pub fn replace(&self, favorites: impl IntoIterator<Item = PlaceId>) -> Vec<PlaceId> {
        let favorites = dedup_favorites(favorites);
        let stored = favorites.clone();

        self.mutate(move |current| {
            *current = favorites;
            true
        });

        info!(count = stored.len(), "Replaced favorites");
        stored
    }

    /// Re-read the store, picking up writes made by other tabs.
    /// Returns whether the list changed. Subscribers are not notified.
    pub fn reload(&self) -> bool {
        let fresh = self.store.read();
        let mut favorites = self.lock();
        let changed = *favorites != fresh;
        *favorites = fresh;

        if changed {
            info!(count = favorites.len(), "Reloaded favorites from storage");
        }
        changed
    }

    /// Register `listener`. It is not called until the next mutation.
    pub fn subscribe(&self, listener: impl Fn(&[PlaceId]) + Send + Sync + 'static) -> Subscription {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PlaceId>> {
        self.favorites.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `change` under the lock; if it reports a change, persist and notify
    fn mutate(&self, change: impl FnOnce(&mut Vec<PlaceId>) -> bool) -> bool {
        let snapshot = {
            let mut favorites = self.lock();
            if !change(&mut favorites) {
                return false;
            }
            // A failed write is logged by the store; memory stays ahead of
            // storage until the next successful write.
            self.store.write(&favorites);
            favorites.clone()
        };

        self.notify(&snapshot);
        true
    }

    fn notify(&self, favorites: &[PlaceId]) {
        let listeners: Vec<Listener> = {
            let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.entries.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        for listener in listeners {
            listener(favorites);
        }
    }
}

fn resolve(id: impl IntoPlaceId, operation: &'static str) -> Option<PlaceId> {
    let id = id.into_place_id();
    if id.is_none() {
        debug!(operation, "Ignoring invalid place id");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStorage;
    use crate::store::traits::StorageArea;
    use crate::store::DEFAULT_STORAGE_KEY;
    use crate::test_helpers::ids;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry_on(storage: &MemoryStorage) -> FavoritesRegistry {
        FavoritesRegistry::new(LocalStore::new(Arc::new(storage.clone()), DEFAULT_STORAGE_KEY))
    }

    fn counting_listener(registry: &FavoritesRegistry) -> (Arc<AtomicUsize>, Subscription) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let subscription = registry.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        (calls, subscription)
    }

    #[test]
    fn test_toggle_on_empty() {
        let registry = registry_on(&MemoryStorage::new());
        assert!(registry.toggle(9));
        assert!(registry.is_favorited(9));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_add_then_toggle_removes() {
        let registry = registry_on(&MemoryStorage::new());
        assert!(registry.add(5));
        assert!(!registry.toggle(5));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_double_toggle_restores_membership() {
        let registry = registry_on(&MemoryStorage::new());
        registry.add(1);

        for id in [1_u64, 2] {
            let before = registry.is_favorited(id);
            registry.toggle(id);
            registry.toggle(id);
            assert_eq!(registry.is_favorited(id), before);
        }
    }

    #[test]
    fn test_add_twice_notifies_once() {
        let registry = registry_on(&MemoryStorage::new());
        let (calls, _subscription) = counting_listener(&registry);

        assert!(registry.add(3));
        assert!(!registry.add(3));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let registry = registry_on(&MemoryStorage::new());
        let (calls, _subscription) = counting_listener(&registry);

        assert!(!registry.remove(4));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_count_tracks_distinct_adds_minus_removes() {
        let registry = registry_on(&MemoryStorage::new());
        let ops: &[(&str, u64)] = &[
            ("add", 1),
            ("add", 2),
            ("add", 2),
            ("remove", 7),
            ("toggle", 3),
            ("remove", 1),
            ("toggle", 3),
            ("remove", 1),
            ("add", 4),
        ];

        let mut expected: Vec<u64> = Vec::new();
        for (op, id) in ops {
            match *op {
                "add" => {
                    registry.add(*id);
                    if !expected.contains(id) {
                        expected.push(*id);
                    }
                }
                "remove" => {
                    registry.remove(*id);
                    expected.retain(|e| e != id);
                }
                _ => {
                    registry.toggle(*id);
                    if expected.contains(id) {
                        expected.retain(|e| e != id);
                    } else {
                        expected.push(*id);
                    }
                }
            }
            assert_eq!(registry.count(), expected.len());
        }
        assert_eq!(registry.snapshot(), ids(&expected));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let registry = registry_on(&MemoryStorage::new());
        registry.add(12);
        registry.add(47);
        registry.add(3);
        registry.remove(47);
        registry.add(47);
        assert_eq!(registry.snapshot(), ids(&[12, 3, 47]));
    }

    #[test]
    fn test_persisted_state_round_trips() {
        let storage = MemoryStorage::new();
        let registry = registry_on(&storage);
        registry.add(12);
        registry.add(47);
        registry.add(3);

        let fresh = registry_on(&storage);
        assert_eq!(fresh.snapshot(), ids(&[12, 47, 3]));
        assert_eq!(
            storage.get_item(DEFAULT_STORAGE_KEY).unwrap().as_deref(),
            Some("[12,47,3]")
        );
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let storage = MemoryStorage::new();
        storage.set_item(DEFAULT_STORAGE_KEY, "{{garbage").unwrap();

        let registry = registry_on(&storage);
        assert_eq!(registry.count(), 0);

        // The next mutation overwrites the corrupt record
        registry.add(1);
        assert_eq!(
            storage.get_item(DEFAULT_STORAGE_KEY).unwrap().as_deref(),
            Some("[1]")
        );
    }

    #[test]
    fn test_invalid_ids_are_noops() {
        let registry = registry_on(&MemoryStorage::new());
        let (calls, _subscription) = counting_listener(&registry);

        assert!(!registry.add("abc"));
        assert!(!registry.add(0_u64));
        assert!(!registry.add(-4_i64));
        assert!(!registry.toggle("12x"));
        assert!(!registry.remove(""));
        assert!(!registry.is_favorited("nope"));

        assert_eq!(registry.count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_string_ids_are_coerced() {
        let registry = registry_on(&MemoryStorage::new());
        assert!(registry.add("15"));
        assert!(registry.is_favorited(15));
        assert!(registry.is_favorited(" 15 "));
        assert!(!registry.toggle(String::from("15")));
    }

    #[test]
    fn test_listener_receives_full_set() {
        let registry = registry_on(&MemoryStorage::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _subscription = registry.subscribe(move |favorites| {
            seen_clone.lock().unwrap().push(favorites.to_vec());
        });

        registry.add(1);
        registry.add(2);
        registry.toggle(1);
        registry.clear();

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![ids(&[1]), ids(&[1, 2]), ids(&[2]), ids(&[])]);
    }

    #[test]
    fn test_subscribe_does_not_invoke_listener() {
        let registry = registry_on(&MemoryStorage::new());
        registry.add(1);
        let (calls, _subscription) = counting_listener(&registry);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let registry = registry_on(&MemoryStorage::new());
        let (calls, subscription) = counting_listener(&registry);
        let (other_calls, _other) = counting_listener(&registry);

        registry.add(1);
        assert!(subscription.unsubscribe());
        registry.add(2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(other_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let registry = registry_on(&MemoryStorage::new());
        let (_calls, subscription) = counting_listener(&registry);
        drop(registry);
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn test_listener_may_query_registry() {
        let registry = Arc::new(registry_on(&MemoryStorage::new()));
        let counts = Arc::new(Mutex::new(Vec::new()));

        let registry_clone = Arc::downgrade(&registry);
        let counts_clone = Arc::clone(&counts);
        let _subscription = registry.subscribe(move |_| {
            if let Some(registry) = registry_clone.upgrade() {
                counts_clone.lock().unwrap().push(registry.count());
            }
        });

        registry.add(1);
        registry.add(2);
        assert_eq!(*counts.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_clear_notifies_and_persists() {
        let storage = MemoryStorage::new();
        let registry = registry_on(&storage);
        registry.add(1);
        let (calls, _subscription) = counting_listener(&registry);

        registry.clear();
        assert_eq!(registry.count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(storage.get_item(DEFAULT_STORAGE_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_replace_dedups_persists_and_notifies() {
        let storage = MemoryStorage::new();
        let registry = registry_on(&storage);
        registry.add(9);
        let (calls, _subscription) = counting_listener(&registry);

        let stored = registry.replace(ids(&[1, 2, 1, 3]));
        assert_eq!(stored, ids(&[1, 2, 3]));
        assert_eq!(registry.snapshot(), ids(&[1, 2, 3]));
        assert!(!registry.is_favorited(9));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry_on(&storage).snapshot(), ids(&[1, 2, 3]));
    }

    #[test]
    fn test_reload_picks_up_other_tab() {
        let storage = MemoryStorage::new();
        let tab_a = registry_on(&storage);
        let tab_b = registry_on(&storage);
        let (calls, _subscription) = counting_listener(&tab_b);

        tab_a.add(4);
        assert!(!tab_b.is_favorited(4));

        assert!(tab_b.reload());
        assert!(tab_b.is_favorited(4));
        assert!(!tab_b.reload());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_tabs_last_writer_wins() {
        let storage = MemoryStorage::new();
        let tab_a = registry_on(&storage);
        let tab_b = registry_on(&storage);

        tab_a.add(1);
        tab_b.add(2);

        // Tab B never saw tab A's write, so its whole-value write replaced it
        assert_eq!(registry_on(&storage).snapshot(), ids(&[2]));
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let storage = MemoryStorage::new().with_quota(Some(3));
        let registry = registry_on(&storage);
        let (calls, _subscription) = counting_listener(&registry);

        assert!(registry.add(1));
        assert!(registry.add(2));

        assert_eq!(registry.snapshot(), ids(&[1, 2]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(storage.get_item(DEFAULT_STORAGE_KEY).unwrap().as_deref(), Some("[1]"));
    }
}
