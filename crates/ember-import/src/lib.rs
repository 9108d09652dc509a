//! Ember Import - Source asset importers
//!
//! Turns source files into engine objects registered through an
//! [`ImportContext`](ember_assets::ImportContext):
//! - `.shader` text into a [`Shader`](ember_assets::Shader)
//! - model files into a [`Prefab`](ember_assets::Prefab) with mesh and
//!   material sub-objects
//! - images into a [`Texture2D`](ember_assets::Texture2D)
//!
//! Recoverable problems are collected as [`Anomaly`] values in
//! [`Diagnostics`]; an [`ImportError`] means the file produced nothing.

mod diagnostics;
mod error;
mod importer;
pub mod model;
pub mod shader;
mod texture;

pub use diagnostics::{Anomaly, Diagnostics, SkipReason};
pub use error::{ImportError, ShaderParseError};
pub use importer::{extension_of, AssetImporter, ImportSettings};
pub use model::{ModelImportSettings, ModelImporter};
pub use shader::{parse_shader, ParsedPass, ParsedShader, ShaderImporter};
pub use texture::TextureImporter;
