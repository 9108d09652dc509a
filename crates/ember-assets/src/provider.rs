use std::path::Path;

use crate::identity::{AssetId, AssetIdentity};
use crate::object::EngineObject;
use crate::store::Instance;

/// Maps source paths to the identity of the asset registered there.
pub trait AssetLookup {
    fn resolve_path_to_identity(&self, path: &Path) -> Option<AssetIdentity>;
}

/// The loading service asset references resolve through.
///
/// Load failures are reported by the provider (logged) and surface to callers
/// only as `None`.
pub trait AssetProvider: AssetLookup {
    fn load_asset<T: EngineObject>(&self, identity: AssetIdentity) -> Option<Instance<T>>;

    /// Whether any object of the asset is currently resident. Never loads.
    fn has_asset_resident(&self, asset_id: AssetId) -> bool;
}
