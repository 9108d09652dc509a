//! Ember Assets - Asset identities, references and storage
//!
//! Provides the identity model for persisted assets, the lazy [`AssetRef`]
//! handle, the provider contract it resolves through, and an in-memory
//! [`AssetServer`] holding imported asset files.

mod context;
mod error;
mod handle;
mod identity;
mod material;
mod mesh;
mod object;
mod path;
mod prefab;
mod provider;
mod server;
mod shader;
mod store;
mod texture;

pub use context::{ImportContext, SerializedAsset};
pub use error::AssetError;
pub use handle::AssetRef;
pub use identity::{AssetId, AssetIdentity};
pub use material::Material;
pub use mesh::{Mesh, Vertex, VertexElement, VertexFormat, VertexSemantic, VertexType};
pub use object::{AssetObject, EngineObject};
pub use path::normalize_path;
pub use prefab::{MeshRenderer, NodeId, Prefab, SceneNode};
pub use provider::{AssetLookup, AssetProvider};
pub use server::AssetServer;
pub use shader::{PropertyType, Shader, ShaderPass, ShaderProperty, ShadowPass};
pub use store::{Instance, InstanceKey, ObjectStore};
pub use texture::{load_texture, Texture2D, TextureFormat};
