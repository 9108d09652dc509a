use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::identity::{AssetId, AssetIdentity};
use crate::object::EngineObject;

/// Slot index plus generation. A key goes stale as soon as its slot is freed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    index: u32,
    generation: u32,
}

impl InstanceKey {
    /// The slot index of this instance.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation of this instance (incremented on reuse).
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({}v{})", self.index, self.generation)
    }
}

struct Entry<T> {
    object: Arc<T>,
    identity: AssetIdentity,
}

struct Slot<T> {
    generation: u32,
    entry: Option<Entry<T>>,
}

struct StoreInner<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    by_identity: HashMap<AssetIdentity, u32>,
    len: usize,
}

impl<T> StoreInner<T> {
    fn is_live(&self, key: InstanceKey) -> bool {
        self.slots
            .get(key.index as usize)
            .is_some_and(|slot| slot.generation == key.generation && slot.entry.is_some())
    }

    fn free(&mut self, index: u32) -> Option<Entry<T>> {
        let slot = self.slots.get_mut(index as usize)?;
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(index);
        self.len -= 1;
        if self.by_identity.get(&entry.identity) == Some(&index) {
            self.by_identity.remove(&entry.identity);
        }
        Some(entry)
    }
}

/// Generational arena of live engine objects of one type.
///
/// Cloning the store clones the shared handle, not the objects. Destroying an
/// object bumps its slot generation, which turns every outstanding
/// [`Instance`] for it stale.
pub struct ObjectStore<T> {
    inner: Arc<RwLock<StoreInner<T>>>,
}

impl<T> Clone for ObjectStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: EngineObject> Default for ObjectStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: EngineObject> ObjectStore<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                slots: Vec::new(),
                free_list: Vec::new(),
                by_identity: HashMap::new(),
                len: 0,
            })),
        }
    }

    /// Store an object, reusing a freed slot if available.
    ///
    /// A persisted identity maps to at most one live object; a previous object
    /// under the same identity is destroyed first. Runtime objects
    /// ([`AssetIdentity::NONE`]) are never indexed by identity.
    pub fn insert(&self, object: Arc<T>, identity: AssetIdentity) -> Instance<T> {
        let name: Arc<str> = Arc::from(object.name());
        let mut inner = self.inner.write();

        if !identity.is_empty() {
            if let Some(&previous) = inner.by_identity.get(&identity) {
                inner.free(previous);
            }
        }

        let entry = Entry { object, identity };
        let key = if let Some(index) = inner.free_list.pop() {
            let slot = &mut inner.slots[index as usize];
            slot.entry = Some(entry);
            InstanceKey {
                index,
                generation: slot.generation,
            }
        } else {
            let index = inner.slots.len() as u32;
            inner.slots.push(Slot {
                generation: 0,
                entry: Some(entry),
            });
            InstanceKey {
                index,
                generation: 0,
            }
        };
        inner.len += 1;
        if !identity.is_empty() {
            inner.by_identity.insert(identity, key.index);
        }

        Instance {
            key,
            identity,
            name,
            store: Arc::clone(&self.inner),
        }
    }

    /// Destroy the object behind `instance`. Returns `true` if it was alive.
    pub fn destroy(&self, instance: &Instance<T>) -> bool {
        if !Arc::ptr_eq(&self.inner, &instance.store) {
            return false;
        }
        let mut inner = self.inner.write();
        if !inner.is_live(instance.key) {
            return false;
        }
        inner.free(instance.key.index).is_some()
    }

    /// Destroy the live object stored under a persisted identity.
    pub fn destroy_identity(&self, identity: AssetIdentity) -> bool {
        let mut inner = self.inner.write();
        match inner.by_identity.get(&identity).copied() {
            Some(index) => inner.free(index).is_some(),
            None => false,
        }
    }

    /// Destroy every live object belonging to an asset file. Returns how many
    /// objects were destroyed.
    pub fn destroy_asset(&self, asset_id: AssetId) -> usize {
        let mut inner = self.inner.write();
        let indices: Vec<u32> = inner
            .by_identity
            .iter()
            .filter(|(identity, _)| identity.asset_id == asset_id)
            .map(|(_, &index)| index)
            .collect();
        indices
            .into_iter()
            .filter(|&index| inner.free(index).is_some())
            .count()
    }

    /// Live instance for a persisted identity.
    pub fn find(&self, identity: AssetIdentity) -> Option<Instance<T>> {
        let inner = self.inner.read();
        let index = *inner.by_identity.get(&identity)?;
        let slot = &inner.slots[index as usize];
        let entry = slot.entry.as_ref()?;
        Some(Instance {
            key: InstanceKey {
                index,
                generation: slot.generation,
            },
            identity,
            name: Arc::from(entry.object.name()),
            store: Arc::clone(&self.inner),
        })
    }

    /// Whether any object of the asset file is resident.
    pub fn contains_asset(&self, asset_id: AssetId) -> bool {
        self.inner
            .read()
            .by_identity
            .keys()
            .any(|identity| identity.asset_id == asset_id)
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.inner.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Generation-checked reference to an object in an [`ObjectStore`].
///
/// Holding an `Instance` does not keep the object alive in the store; once the
/// object is destroyed the instance reports itself as destroyed and
/// [`get`](Instance::get) returns `None`.
pub struct Instance<T> {
    key: InstanceKey,
    identity: AssetIdentity,
    name: Arc<str>,
    store: Arc<RwLock<StoreInner<T>>>,
}

impl<T> Instance<T> {
    /// The live object, or `None` once destroyed.
    pub fn get(&self) -> Option<Arc<T>> {
        let inner = self.store.read();
        let slot = inner.slots.get(self.key.index as usize)?;
        if slot.generation != self.key.generation {
            return None;
        }
        slot.entry.as_ref().map(|entry| Arc::clone(&entry.object))
    }

    pub fn is_destroyed(&self) -> bool {
        !self.store.read().is_live(self.key)
    }

    /// Identity the object was stored under; empty for runtime objects.
    pub fn identity(&self) -> AssetIdentity {
        self.identity
    }

    /// Object name, kept readable after the object is destroyed.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> InstanceKey {
        self.key
    }
}

impl<T> Clone for Instance<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            identity: self.identity,
            name: Arc::clone(&self.name),
            store: Arc::clone(&self.store),
        }
    }
}

impl<T> PartialEq for Instance<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && Arc::ptr_eq(&self.store, &other.store)
    }
}

impl<T> Eq for Instance<T> {}

impl<T> Hash for Instance<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("key", &self.key)
            .field("identity", &self.identity)
            .field("name", &self.name)
            .finish()
    }
}
