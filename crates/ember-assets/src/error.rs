use std::path::PathBuf;

use crate::identity::AssetId;

/// Errors raised by the asset layer.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to load image '{0}': {1}")]
    ImageLoadFailed(PathBuf, String),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("asset {0} cannot hold more than {max} sub-objects", max = i16::MAX)]
    TooManySubObjects(AssetId),

    #[error("invalid asset id '{0}'")]
    InvalidAssetId(String),
}
