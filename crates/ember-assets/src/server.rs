use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::context::SerializedAsset;
use crate::identity::{AssetId, AssetIdentity};
use crate::object::EngineObject;
use crate::path::normalize_path;
use crate::provider::{AssetLookup, AssetProvider};
use crate::store::{Instance, ObjectStore};

/// Type-erased object store interface.
trait ErasedStore: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn destroy_identity(&self, identity: AssetIdentity) -> bool;
    fn destroy_asset(&self, asset_id: AssetId) -> usize;
    fn contains_asset(&self, asset_id: AssetId) -> bool;
}

impl<T: EngineObject> ErasedStore for ObjectStore<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn destroy_identity(&self, identity: AssetIdentity) -> bool {
        ObjectStore::destroy_identity(self, identity)
    }

    fn destroy_asset(&self, asset_id: AssetId) -> usize {
        ObjectStore::destroy_asset(self, asset_id)
    }

    fn contains_asset(&self, asset_id: AssetId) -> bool {
        ObjectStore::contains_asset(self, asset_id)
    }
}

/// In-memory asset database. Keeps the imported files by asset id and loads
/// their objects on demand into one [`ObjectStore`] per object type.
pub struct AssetServer {
    base_path: PathBuf,
    path_to_id: HashMap<PathBuf, AssetId>,
    assets: HashMap<AssetId, SerializedAsset>,
    stores: RwLock<HashMap<TypeId, Box<dyn ErasedStore>>>,
}

impl AssetServer {
    /// Create a new AssetServer rooted at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        info!("AssetServer created with base path: {}", base_path.display());
        Self {
            base_path,
            path_to_id: HashMap::new(),
            assets: HashMap::new(),
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a relative asset path against the base path. The result is
    /// lexically normalized, so `a/../b` and `b` name the same asset.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.base_path.join(path))
        }
    }

    /// The base path this server resolves relative paths against.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Stable asset id for a source path, allocating one on first use.
    pub fn asset_id_for_path(&mut self, path: &Path) -> AssetId {
        let full_path = self.resolve(path);
        *self.path_to_id.entry(full_path).or_insert_with(AssetId::new)
    }

    /// Register the imported objects of the file at `path`.
    ///
    /// Re-registering an asset id destroys its resident objects, so existing
    /// references load the new version on their next resolve.
    pub fn register(&mut self, path: impl AsRef<Path>, asset: SerializedAsset) {
        let full_path = self.resolve(path.as_ref());
        let asset_id = asset.asset_id();

        if self.assets.contains_key(&asset_id) {
            let unloaded = self.unload_asset(asset_id);
            debug!("Re-registering {asset_id}: unloaded {unloaded} resident objects");
        }

        info!(
            "Registered {} ({}, {} sub-objects)",
            full_path.display(),
            asset_id,
            asset.sub_objects().len()
        );
        self.path_to_id.insert(full_path, asset_id);
        self.assets.insert(asset_id, asset);
    }

    /// The registered objects of an asset file.
    pub fn asset(&self, asset_id: AssetId) -> Option<&SerializedAsset> {
        self.assets.get(&asset_id)
    }

    pub fn registered_count(&self) -> usize {
        self.assets.len()
    }

    /// Destroy the resident object for `identity`. Returns `true` if one was
    /// resident.
    pub fn unload(&self, identity: AssetIdentity) -> bool {
        self.stores
            .read()
            .values()
            .any(|store| store.destroy_identity(identity))
    }

    /// Destroy every resident object of an asset file.
    pub fn unload_asset(&self, asset_id: AssetId) -> usize {
        self.stores
            .read()
            .values()
            .map(|store| store.destroy_asset(asset_id))
            .sum()
    }

    fn store<T: EngineObject>(&self) -> Option<ObjectStore<T>> {
        if let Some(store) = self.stores.read().get(&TypeId::of::<T>()) {
            return store.as_any().downcast_ref::<ObjectStore<T>>().cloned();
        }
        self.stores
            .write()
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ObjectStore::<T>::new()))
            .as_any()
            .downcast_ref::<ObjectStore<T>>()
            .cloned()
    }
}

impl AssetLookup for AssetServer {
    fn resolve_path_to_identity(&self, path: &Path) -> Option<AssetIdentity> {
        let full_path = self.resolve(path);
        let asset_id = self.path_to_id.get(&full_path)?;
        self.assets
            .contains_key(asset_id)
            .then(|| AssetIdentity::main(*asset_id))
    }
}

impl AssetProvider for AssetServer {
    fn load_asset<T: EngineObject>(&self, identity: AssetIdentity) -> Option<Instance<T>> {
        if identity.is_empty() {
            return None;
        }
        let store = self.store::<T>()?;
        if let Some(instance) = store.find(identity) {
            return Some(instance);
        }

        let Some(asset) = self.assets.get(&identity.asset_id) else {
            warn!("Cannot load {}: asset {} is not registered", T::TYPE_NAME, identity.asset_id);
            return None;
        };
        let Some(object) = asset.object(identity.file_id) else {
            warn!("Cannot load {}: asset {} has no object {}", T::TYPE_NAME, identity.asset_id, identity.file_id);
            return None;
        };
        let Some(typed) = T::from_object(object) else {
            warn!(
                "Cannot load {}: {} is a {}",
                T::TYPE_NAME,
                identity,
                object.type_name()
            );
            return None;
        };

        debug!("Loaded {} '{}' ({})", T::TYPE_NAME, object.name(), identity);
        Some(store.insert(typed, identity))
    }

    fn has_asset_resident(&self, asset_id: AssetId) -> bool {
        self.stores
            .read()
            .values()
            .any(|store| store.contains_asset(asset_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ImportContext;
    use crate::material::Material;
    use crate::texture::Texture2D;

    fn texture_asset(name: &str) -> SerializedAsset {
        let mut asset = SerializedAsset::new(AssetId::new());
        asset.set_main_object(Texture2D::solid(name, 1, 1, [9; 4]).into());
        asset
    }

    #[test]
    fn resolve_absolute_path() {
        let server = AssetServer::new("/home/user/assets");
        assert_eq!(
            server.resolve(Path::new("/absolute/path.glb")),
            PathBuf::from("/absolute/path.glb")
        );
    }

    #[test]
    fn resolve_relative_path() {
        let server = AssetServer::new("/home/user/assets");
        assert_eq!(
            server.resolve(Path::new("models/box.glb")),
            PathBuf::from("/home/user/assets/models/box.glb")
        );
    }

    #[test]
    fn asset_id_for_path_is_stable() {
        let mut server = AssetServer::new("/project");
        let a = server.asset_id_for_path(Path::new("a.png"));
        assert_eq!(server.asset_id_for_path(Path::new("/project/a.png")), a);
        assert_ne!(server.asset_id_for_path(Path::new("b.png")), a);
    }

    #[test]
    fn parent_components_name_the_same_asset() {
        let mut server = AssetServer::new("/project");
        let asset = texture_asset("wood");
        let asset_id = asset.asset_id();
        server.register("textures/wood.png", asset);

        let via_models = server.resolve_path_to_identity(Path::new("/project/models/../textures/wood.png"));
        assert_eq!(via_models, Some(AssetIdentity::main(asset_id)));
        let relative = server.resolve_path_to_identity(Path::new("models/.././textures/wood.png"));
        assert_eq!(relative, Some(AssetIdentity::main(asset_id)));
    }

    #[test]
    fn unregistered_path_has_no_identity() {
        let mut server = AssetServer::new("/project");
        server.asset_id_for_path(Path::new("pending.png"));
        assert!(server.resolve_path_to_identity(Path::new("pending.png")).is_none());
    }

    #[test]
    fn load_registered_object_once() {
        let mut server = AssetServer::new("/project");
        let asset = texture_asset("grid");
        let asset_id = asset.asset_id();
        server.register("grid.png", asset);

        let identity = server.resolve_path_to_identity(Path::new("grid.png")).unwrap();
        assert_eq!(identity, AssetIdentity::main(asset_id));
        assert!(!server.has_asset_resident(asset_id));

        let first = server.load_asset::<Texture2D>(identity).unwrap();
        let second = server.load_asset::<Texture2D>(identity).unwrap();
        assert_eq!(first, second);
        assert!(server.has_asset_resident(asset_id));
    }

    #[test]
    fn wrong_type_or_missing_object_fails_softly() {
        let mut server = AssetServer::new("/project");
        let asset = texture_asset("grid");
        let asset_id = asset.asset_id();
        server.register("grid.png", asset);

        assert!(server.load_asset::<Material>(AssetIdentity::main(asset_id)).is_none());
        assert!(server.load_asset::<Texture2D>(AssetIdentity::new(asset_id, 1)).is_none());
        assert!(server.load_asset::<Texture2D>(AssetIdentity::main(AssetId::new())).is_none());
        assert!(server.load_asset::<Texture2D>(AssetIdentity::NONE).is_none());
    }

    #[test]
    fn unload_destroys_resident_objects() {
        let mut server = AssetServer::new("/project");
        let asset = texture_asset("grid");
        let asset_id = asset.asset_id();
        server.register("grid.png", asset);

        let instance = server.load_asset::<Texture2D>(AssetIdentity::main(asset_id)).unwrap();
        assert_eq!(server.unload_asset(asset_id), 1);
        assert!(instance.is_destroyed());
        assert!(!server.has_asset_resident(asset_id));
        assert!(!server.unload(AssetIdentity::main(asset_id)));
    }

    #[test]
    fn reregistering_replaces_resident_objects() {
        let mut server = AssetServer::new("/project");
        let asset_id = server.asset_id_for_path(Path::new("grid.png"));
        let mut first = SerializedAsset::new(asset_id);
        first.set_main_object(Texture2D::solid("old", 1, 1, [0; 4]).into());
        server.register("grid.png", first);
        let old = server.load_asset::<Texture2D>(AssetIdentity::main(asset_id)).unwrap();

        let mut second = SerializedAsset::new(asset_id);
        second.set_main_object(Texture2D::solid("new", 1, 1, [0; 4]).into());
        server.register("grid.png", second);

        assert!(old.is_destroyed());
        let new = server.load_asset::<Texture2D>(AssetIdentity::main(asset_id)).unwrap();
        assert_eq!(new.get().unwrap().name, "new");
        assert_eq!(server.registered_count(), 1);
    }
}
