use std::sync::Arc;

use crate::material::Material;
use crate::mesh::Mesh;
use crate::prefab::Prefab;
use crate::shader::Shader;
use crate::texture::Texture2D;

/// An engine object that can live in an asset file and be referenced through
/// an [`AssetRef`](crate::AssetRef).
pub trait EngineObject: Send + Sync + 'static {
    /// Short type name used in diagnostics and handle display.
    const TYPE_NAME: &'static str;

    fn name(&self) -> &str;

    /// Wrap a shared object into the type-erased form stored in asset files.
    fn into_object(self: Arc<Self>) -> AssetObject;

    /// Extract the typed object, if `object` holds this type.
    fn from_object(object: &AssetObject) -> Option<Arc<Self>>;
}

/// Type-erased engine object as stored in a [`SerializedAsset`](crate::SerializedAsset).
#[derive(Debug, Clone)]
pub enum AssetObject {
    Mesh(Arc<Mesh>),
    Material(Arc<Material>),
    Shader(Arc<Shader>),
    Texture(Arc<Texture2D>),
    Prefab(Arc<Prefab>),
}

impl AssetObject {
    pub fn name(&self) -> &str {
        match self {
            Self::Mesh(m) => m.name(),
            Self::Material(m) => m.name(),
            Self::Shader(s) => s.name(),
            Self::Texture(t) => t.name(),
            Self::Prefab(p) => p.name(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Mesh(_) => Mesh::TYPE_NAME,
            Self::Material(_) => Material::TYPE_NAME,
            Self::Shader(_) => Shader::TYPE_NAME,
            Self::Texture(_) => Texture2D::TYPE_NAME,
            Self::Prefab(_) => Prefab::TYPE_NAME,
        }
    }
}

macro_rules! engine_object {
    ($ty:ty, $variant:ident, $type_name:literal) => {
        impl EngineObject for $ty {
            const TYPE_NAME: &'static str = $type_name;

            fn name(&self) -> &str {
                &self.name
            }

            fn into_object(self: Arc<Self>) -> AssetObject {
                AssetObject::$variant(self)
            }

            fn from_object(object: &AssetObject) -> Option<Arc<Self>> {
                match object {
                    AssetObject::$variant(inner) => Some(Arc::clone(inner)),
                    _ => None,
                }
            }
        }

        impl From<$ty> for AssetObject {
            fn from(value: $ty) -> Self {
                AssetObject::$variant(Arc::new(value))
            }
        }
    };
}

engine_object!(Mesh, Mesh, "Mesh");
engine_object!(Material, Material, "Material");
engine_object!(Shader, Shader, "Shader");
engine_object!(Texture2D, Texture, "Texture2D");
engine_object!(Prefab, Prefab, "Prefab");
