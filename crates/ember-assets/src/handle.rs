use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::identity::{AssetId, AssetIdentity};
use crate::object::EngineObject;
use crate::provider::{AssetLookup, AssetProvider};
use crate::store::Instance;

/// A lazy, typed reference to an engine object.
///
/// The handle stores the object's identity and caches a generation-checked
/// [`Instance`] once resolved. A cached instance whose object has been
/// destroyed is never returned; the next [`resolve`](AssetRef::resolve)
/// loads the object again through the provider.
///
/// Mutation takes `&mut self`; share a handle across threads only behind
/// external synchronization.
pub struct AssetRef<T: EngineObject> {
    instance: Option<Instance<T>>,
    identity: AssetIdentity,
}

impl<T: EngineObject> AssetRef<T> {
    /// An explicit null reference.
    pub fn new() -> Self {
        Self {
            instance: None,
            identity: AssetIdentity::NONE,
        }
    }

    /// Reference the main object of an asset file.
    pub fn from_id(asset_id: AssetId) -> Self {
        Self::from_identity(AssetIdentity::main(asset_id))
    }

    pub fn from_identity(identity: AssetIdentity) -> Self {
        Self {
            instance: None,
            identity,
        }
    }

    /// Bind directly to a live instance, adopting its identity.
    pub fn from_instance(instance: Instance<T>) -> Self {
        Self {
            identity: instance.identity(),
            instance: Some(instance),
        }
    }

    /// Reference the asset registered at `path`, or an explicit null if the
    /// path is unknown.
    pub fn from_path(path: &Path, lookup: &dyn AssetLookup) -> Self {
        lookup
            .resolve_path_to_identity(path)
            .map(Self::from_identity)
            .unwrap_or_default()
    }

    pub fn identity(&self) -> AssetIdentity {
        self.identity
    }

    pub fn asset_id(&self) -> AssetId {
        self.identity.asset_id
    }

    pub fn file_id(&self) -> i16 {
        self.identity.file_id
    }

    /// The cached instance, stale or not.
    pub fn instance(&self) -> Option<&Instance<T>> {
        self.instance.as_ref()
    }

    fn live_instance(&self) -> Option<&Instance<T>> {
        self.instance.as_ref().filter(|instance| !instance.is_destroyed())
    }

    /// The instance's own identity when it has one, else the stored identity.
    fn effective_identity(&self) -> AssetIdentity {
        self.instance
            .as_ref()
            .map(Instance::identity)
            .filter(|identity| !identity.is_empty())
            .unwrap_or(self.identity)
    }

    /// Return the object, loading it through `provider` when the cache is
    /// empty or stale. `None` means the object is unavailable; the provider
    /// reports why.
    pub fn resolve<P: AssetProvider>(&mut self, provider: &P) -> Option<Arc<T>> {
        if let Some(object) = self.resolve_weak() {
            return Some(object);
        }
        self.retrieve_instance(provider);
        self.resolve_weak()
    }

    /// Return the cached object if it is still alive. Never loads.
    pub fn resolve_weak(&self) -> Option<Arc<T>> {
        self.instance.as_ref().and_then(Instance::get)
    }

    /// Whether the object can be resolved. May trigger a load.
    pub fn is_available<P: AssetProvider>(&mut self, provider: &P) -> bool {
        self.resolve(provider).is_some()
    }

    /// Whether the object is resident, without loading it.
    pub fn is_loaded<P: AssetProvider>(&self, provider: &P) -> bool {
        if self.live_instance().is_some() {
            return true;
        }
        !self.identity.is_empty() && provider.has_asset_resident(self.identity.asset_id)
    }

    /// Load the object unless a live instance is already cached.
    pub fn ensure_loaded<P: AssetProvider>(&mut self, provider: &P) {
        if self.live_instance().is_none() {
            self.retrieve_instance(provider);
        }
    }

    fn retrieve_instance<P: AssetProvider>(&mut self, provider: &P) {
        let target = if !self.identity.is_empty() {
            Some(self.identity)
        } else {
            self.instance
                .as_ref()
                .map(Instance::identity)
                .filter(|identity| !identity.is_empty())
        };

        self.instance = target.and_then(|identity| provider.load_asset::<T>(identity));
        if let Some(instance) = &self.instance {
            if self.identity.is_empty() {
                self.identity = instance.identity();
            }
        }
    }

    /// No instance and no identity.
    pub fn is_explicit_null(&self) -> bool {
        self.instance.is_none() && self.identity.is_empty()
    }

    /// Bound to an object that has no persisted identity.
    pub fn is_runtime_resource(&self) -> bool {
        self.instance.is_some() && self.identity.is_empty()
    }

    /// Replace the cache and take over the instance's identity. `None` turns
    /// the handle into an explicit null.
    pub fn set_instance(&mut self, instance: Option<Instance<T>>) {
        self.identity = instance
            .as_ref()
            .map(Instance::identity)
            .unwrap_or(AssetIdentity::NONE);
        self.instance = instance;
    }

    /// Point the handle at another identity, dropping a cached instance that
    /// does not belong to it.
    pub fn set_identity(&mut self, identity: AssetIdentity) {
        if self
            .instance
            .as_ref()
            .is_some_and(|instance| instance.identity() != identity)
        {
            self.instance = None;
        }
        self.identity = identity;
    }

    pub fn set_asset_id(&mut self, asset_id: AssetId) {
        self.set_identity(AssetIdentity::new(asset_id, self.identity.file_id));
    }

    pub fn set_file_id(&mut self, file_id: i16) {
        self.set_identity(AssetIdentity::new(self.identity.asset_id, file_id));
    }

    /// Drop the cached instance and keep the identity for later resolution.
    pub fn detach(&mut self) {
        self.instance = None;
    }

    pub fn name(&self) -> String {
        match &self.instance {
            Some(instance) if instance.is_destroyed() => format!("DESTROYED_{}", instance.name()),
            Some(instance) => instance.name().to_string(),
            None => "No Instance".to_string(),
        }
    }
}

impl<T: EngineObject> Default for AssetRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: EngineObject> Clone for AssetRef<T> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            identity: self.identity,
        }
    }
}

impl<T: EngineObject> From<Instance<T>> for AssetRef<T> {
    fn from(instance: Instance<T>) -> Self {
        Self::from_instance(instance)
    }
}

impl<T: EngineObject> PartialEq for AssetRef<T> {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.live_instance(), other.live_instance()) {
            return a == b;
        }
        if self.is_explicit_null() || other.is_explicit_null() {
            return self.is_explicit_null() && other.is_explicit_null();
        }
        let (a, b) = (self.effective_identity(), other.effective_identity());
        if a.is_empty() && b.is_empty() {
            return self.instance == other.instance;
        }
        a == b
    }
}

impl<T: EngineObject> Eq for AssetRef<T> {}

impl<T: EngineObject> Hash for AssetRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let identity = self.effective_identity();
        if !identity.is_empty() {
            identity.hash(state);
        } else if let Some(instance) = &self.instance {
            instance.key().hash(state);
        } else {
            0u8.hash(state);
        }
    }
}

impl<T: EngineObject> fmt::Debug for AssetRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetRef")
            .field("type", &T::TYPE_NAME)
            .field("identity", &self.identity)
            .field("instance", &self.instance)
            .finish()
    }
}

impl<T: EngineObject> fmt::Display for AssetRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_runtime_resource() {
            'R'
        } else if self.is_explicit_null() {
            'N'
        } else if self.live_instance().is_some() {
            'L'
        } else {
            '_'
        };
        write!(f, "[{state}] {}", T::TYPE_NAME)
    }
}

/// On-disk form of a reference. Runtime instances are not embedded.
#[derive(Serialize, Deserialize)]
struct SerializedRef {
    #[serde(rename = "AssetID", default)]
    asset_id: AssetId,
    #[serde(rename = "FileID", default, skip_serializing_if = "is_main_file")]
    file_id: i16,
}

fn is_main_file(file_id: &i16) -> bool {
    *file_id == AssetIdentity::MAIN_FILE_ID
}

impl<T: EngineObject> Serialize for AssetRef<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let identity = self.effective_identity();
        SerializedRef {
            asset_id: identity.asset_id,
            file_id: identity.file_id,
        }
        .serialize(serializer)
    }
}

impl<'de, T: EngineObject> Deserialize<'de> for AssetRef<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = SerializedRef::deserialize(deserializer)?;
        Ok(Self::from_identity(AssetIdentity::new(repr.asset_id, repr.file_id)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::PathBuf;

    use super::*;
    use crate::context::{ImportContext, SerializedAsset};
    use crate::server::AssetServer;
    use crate::store::ObjectStore;
    use crate::texture::Texture2D;

    fn server_with_texture(name: &str) -> (AssetServer, AssetIdentity) {
        let mut server = AssetServer::new("/project");
        let asset_id = AssetId::new();
        let mut asset = SerializedAsset::new(asset_id);
        let identity = asset.set_main_object(Texture2D::solid(name, 2, 2, [0, 0, 0, 255]).into());
        server.register(PathBuf::from("textures/a.png"), asset);
        (server, identity)
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn explicit_null_resolves_to_none() {
        let (server, _) = server_with_texture("a");
        let mut handle = AssetRef::<Texture2D>::new();
        assert!(handle.is_explicit_null());
        assert!(handle.resolve(&server).is_none());
        assert!(!handle.is_loaded(&server));
        assert_eq!(handle.to_string(), "[N] Texture2D");
        assert_eq!(handle.name(), "No Instance");
    }

    #[test]
    fn set_instance_then_resolve_returns_it() {
        let (server, _) = server_with_texture("a");
        let store = ObjectStore::new();
        let instance = store.insert(Arc::new(Texture2D::solid("runtime", 1, 1, [1, 2, 3, 4])), AssetIdentity::NONE);

        let mut handle = AssetRef::new();
        handle.set_instance(Some(instance.clone()));
        let resolved = handle.resolve(&server).unwrap();
        assert!(Arc::ptr_eq(&resolved, &instance.get().unwrap()));
        assert!(handle.is_runtime_resource());
        assert_eq!(handle.to_string(), "[R] Texture2D");

        handle.set_instance(None);
        assert!(handle.is_explicit_null());
    }

    #[test]
    fn resolve_loads_through_provider_and_caches() {
        let (server, identity) = server_with_texture("grid");
        let mut handle = AssetRef::<Texture2D>::from_identity(identity);
        assert!(!handle.is_loaded(&server));
        assert!(handle.resolve_weak().is_none());
        assert_eq!(handle.to_string(), "[_] Texture2D");

        let texture = handle.resolve(&server).unwrap();
        assert_eq!(texture.name, "grid");
        assert!(handle.is_loaded(&server));
        assert_eq!(handle.name(), "grid");
        assert_eq!(handle.to_string(), "[L] Texture2D");

        let again = handle.resolve(&server).unwrap();
        assert!(Arc::ptr_eq(&texture, &again));
    }

    #[test]
    fn is_loaded_does_not_load() {
        let (server, identity) = server_with_texture("grid");
        let handle = AssetRef::<Texture2D>::from_identity(identity);
        assert!(!handle.is_loaded(&server));
        assert!(!server.has_asset_resident(identity.asset_id));
    }

    #[test]
    fn destroyed_instance_is_reloaded() {
        let (server, identity) = server_with_texture("grid");
        let mut handle = AssetRef::<Texture2D>::from_identity(identity);
        handle.resolve(&server).unwrap();
        let first = handle.instance().cloned().unwrap();

        server.unload(identity);
        assert!(handle.resolve_weak().is_none());
        assert_eq!(handle.name(), "DESTROYED_grid");

        let reloaded = handle.resolve(&server).unwrap();
        assert_eq!(reloaded.name, "grid");
        assert_ne!(handle.instance().unwrap(), &first);
    }

    #[test]
    fn stale_runtime_instance_with_identity_reloads_by_it() {
        let (server, identity) = server_with_texture("grid");
        let mut handle = AssetRef::<Texture2D>::new();
        handle.set_instance(server.load_asset::<Texture2D>(identity));
        handle.set_identity(AssetIdentity::NONE);
        // the mismatching cache is dropped
        assert!(handle.instance().is_none());

        let store = ObjectStore::new();
        let orphan = store.insert(Arc::new(Texture2D::solid("grid", 1, 1, [0; 4])), identity);
        store.destroy(&orphan);
        handle.instance = Some(orphan);
        handle.identity = AssetIdentity::NONE;

        assert!(handle.resolve(&server).is_some());
        assert_eq!(handle.identity(), identity);
    }

    #[test]
    fn failed_load_yields_none() {
        let (server, _) = server_with_texture("grid");
        let mut handle = AssetRef::<Texture2D>::from_id(AssetId::new());
        assert!(handle.resolve(&server).is_none());
        assert!(!handle.is_available(&server));
        assert!(!handle.is_explicit_null());
    }

    #[test]
    fn set_identity_drops_mismatching_cache() {
        let (server, identity) = server_with_texture("grid");
        let mut handle = AssetRef::<Texture2D>::from_identity(identity);
        handle.resolve(&server);

        handle.set_identity(identity);
        assert!(handle.instance().is_some());

        handle.set_file_id(3);
        assert!(handle.instance().is_none());
        assert_eq!(handle.identity(), AssetIdentity::new(identity.asset_id, 3));
    }

    #[test]
    fn detach_keeps_identity() {
        let (server, identity) = server_with_texture("grid");
        let mut handle = AssetRef::<Texture2D>::from_identity(identity);
        handle.resolve(&server);
        handle.detach();
        assert!(handle.instance().is_none());
        assert_eq!(handle.identity(), identity);
        assert!(handle.resolve(&server).is_some());
    }

    #[test]
    fn ensure_loaded_binds_instance() {
        let (server, identity) = server_with_texture("grid");
        let mut handle = AssetRef::<Texture2D>::from_identity(identity);
        handle.ensure_loaded(&server);
        assert!(handle.resolve_weak().is_some());
    }

    #[test]
    fn handles_with_same_identity_are_equal_and_hash_equal() {
        let identity = AssetIdentity::new(AssetId::new(), 4);
        let a = AssetRef::<Texture2D>::from_identity(identity);
        let b = AssetRef::<Texture2D>::from_identity(identity);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let c = AssetRef::<Texture2D>::from_identity(AssetIdentity::new(identity.asset_id, 5));
        assert_ne!(a, c);
    }

    #[test]
    fn bound_and_unbound_handles_compare_by_identity() {
        let (server, identity) = server_with_texture("grid");
        let mut bound = AssetRef::<Texture2D>::from_identity(identity);
        bound.resolve(&server);
        let unbound = AssetRef::<Texture2D>::from_identity(identity);
        assert_eq!(bound, unbound);
        assert_eq!(hash_of(&bound), hash_of(&unbound));

        let set: HashSet<_> = [bound, unbound].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn explicit_nulls_only_equal_each_other() {
        let null = AssetRef::<Texture2D>::new();
        assert_eq!(null, AssetRef::default());
        assert_ne!(null, AssetRef::from_id(AssetId::new()));

        let store = ObjectStore::new();
        let runtime = AssetRef::from_instance(
            store.insert(Arc::new(Texture2D::solid("r", 1, 1, [0; 4])), AssetIdentity::NONE),
        );
        assert_ne!(null, runtime);
    }

    #[test]
    fn runtime_handles_compare_by_instance() {
        let store = ObjectStore::new();
        let a = store.insert(Arc::new(Texture2D::solid("a", 1, 1, [0; 4])), AssetIdentity::NONE);
        let b = store.insert(Arc::new(Texture2D::solid("b", 1, 1, [0; 4])), AssetIdentity::NONE);
        let ra = AssetRef::from_instance(a.clone());
        assert_eq!(ra, AssetRef::from_instance(a));
        assert_ne!(ra, AssetRef::from_instance(b));
    }

    #[test]
    fn serde_omits_main_file_id() {
        let asset_id = AssetId::new();
        let main = AssetRef::<Texture2D>::from_id(asset_id);
        let json = serde_json::to_value(&main).unwrap();
        assert_eq!(json, serde_json::json!({ "AssetID": asset_id.to_string() }));

        let sub = AssetRef::<Texture2D>::from_identity(AssetIdentity::new(asset_id, 7));
        let text = serde_json::to_string(&sub).unwrap();
        let back: AssetRef<Texture2D> = serde_json::from_str(&text).unwrap();
        assert_eq!(back.identity(), sub.identity());
        assert!(back.instance().is_none());
    }

    #[test]
    fn from_path_uses_lookup() {
        let (server, identity) = server_with_texture("grid");
        let found = AssetRef::<Texture2D>::from_path(Path::new("textures/a.png"), &server);
        assert_eq!(found.identity(), identity);
        let missing = AssetRef::<Texture2D>::from_path(Path::new("nope.png"), &server);
        assert!(missing.is_explicit_null());
    }
}
