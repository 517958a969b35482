//! Synchronous publish/subscribe value holders.
//!
//! Listeners run on the mutating caller's turn, in registration order.
//! A mutation and its notification form one dispatch turn: concurrent
//! mutators are serialized, so listeners see changes in mutation order and
//! never overlap. The value lock is released before listeners run, so a
//! listener may read the cell that notified it, but must not mutate it.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Poison only means an `update` closure panicked; the value is still usable.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Listeners<E> {
    entries: Mutex<Vec<(SubscriptionId, Listener<E>)>>,
    dispatch: Mutex<()>,
}

impl<E> Listeners<E> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            dispatch: Mutex::new(()),
        }
    }

    /// Held from the start of a mutation until its listeners have returned.
    fn turn(&self) -> MutexGuard<'_, ()> {
        lock(&self.dispatch)
    }

    fn add(&self, listener: Listener<E>) -> SubscriptionId {
        let id = SubscriptionId::next();
        lock(&self.entries).push((id, listener));
        id
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    fn notify(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = lock(&self.entries)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }
}

/// A single mutable value that broadcasts every change.
pub struct Observable<T> {
    value: Mutex<T>,
    listeners: Listeners<T>,
}

impl<T: Clone> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            listeners: Listeners::new(),
        }
    }

    pub fn get(&self) -> T {
        lock(&self.value).clone()
    }

    pub fn set(&self, value: T) {
        let _turn = self.listeners.turn();
        let published = {
            let mut guard = lock(&self.value);
            *guard = value;
            guard.clone()
        };
        self.listeners.notify(&published);
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let _turn = self.listeners.turn();
        let published = {
            let mut guard = lock(&self.value);
            f(&mut guard);
            guard.clone()
        };
        self.listeners.notify(&published);
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        self.listeners.add(Arc::new(listener))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListChange<T> {
    Inserted { index: usize, item: T },
    Removed { index: usize, item: T },
    Cleared,
}

/// Insertion-ordered sequence that broadcasts inserts and removals.
pub struct ObservableList<T> {
    items: Mutex<Vec<T>>,
    listeners: Listeners<ListChange<T>>,
}

impl<T: Clone> ObservableList<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            listeners: Listeners::new(),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        lock(&self.items).get(index).cloned()
    }

    pub fn snapshot(&self) -> Vec<T> {
        lock(&self.items).clone()
    }

    pub fn position(&self, pred: impl Fn(&T) -> bool) -> Option<usize> {
        lock(&self.items).iter().position(pred)
    }

    /// Appends `item` and returns the index it landed on.
    pub fn push(&self, item: T) -> usize {
        let _turn = self.listeners.turn();
        let index = {
            let mut items = lock(&self.items);
            items.push(item.clone());
            items.len() - 1
        };
        self.listeners.notify(&ListChange::Inserted { index, item });
        index
    }

    /// Builds the item from the current length and appends it in one step.
    pub fn push_with(&self, build: impl FnOnce(usize) -> T) -> (usize, T) {
        let _turn = self.listeners.turn();
        let (index, item) = {
            let mut items = lock(&self.items);
            let index = items.len();
            let item = build(index);
            items.push(item.clone());
            (index, item)
        };
        self.listeners.notify(&ListChange::Inserted {
            index,
            item: item.clone(),
        });
        (index, item)
    }

    /// Removes the element at `index`; an out-of-range index removes nothing.
    pub fn remove_at(&self, index: usize) -> Option<T> {
        let _turn = self.listeners.turn();
        let removed = {
            let mut items = lock(&self.items);
            (index < items.len()).then(|| items.remove(index))
        }?;
        self.listeners.notify(&ListChange::Removed {
            index,
            item: removed.clone(),
        });
        Some(removed)
    }

    pub fn remove_first(&self, pred: impl Fn(&T) -> bool) -> Option<(usize, T)> {
        let _turn = self.listeners.turn();
        let (index, removed) = {
            let mut items = lock(&self.items);
            let index = items.iter().position(pred)?;
            (index, items.remove(index))
        };
        self.listeners.notify(&ListChange::Removed {
            index,
            item: removed.clone(),
        });
        Some((index, removed))
    }

    pub fn clear(&self) {
        let _turn = self.listeners.turn();
        let had_items = {
            let mut items = lock(&self.items);
            let had_items = !items.is_empty();
            items.clear();
            had_items
        };
        if had_items {
            self.listeners.notify(&ListChange::Cleared);
        }
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&ListChange<T>) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.listeners.add(Arc::new(listener))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }
}

impl<T: Clone> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/observable_tests.rs"]
mod tests;
