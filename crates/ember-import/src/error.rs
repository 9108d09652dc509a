use std::path::PathBuf;

use ember_assets::AssetError;

/// Structural errors in shader source text. Fatal to the parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderParseError {
    #[error("malformed input: missing Shader declaration")]
    MissingShaderDeclaration,

    #[error("unknown property type: {0}")]
    UnknownPropertyType(String),
}

/// Errors that abort the import of a file. Nothing is registered for a file
/// whose import fails.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("format not supported: .{extension} ({})", .path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to load scene '{}': {reason}", .path.display())]
    SceneLoad { path: PathBuf, reason: String },

    #[error("model has no meshes: {}", .0.display())]
    NoMeshes(PathBuf),

    #[error("I/O error reading '{}': {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to import texture: {0}")]
    Texture(#[source] AssetError),

    #[error("failed to parse shader: {0}")]
    Shader(#[from] ShaderParseError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}
