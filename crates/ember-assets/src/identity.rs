use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AssetError;

/// Stable 128-bit identifier of a persisted asset file.
///
/// The nil UUID is reserved for "no persisted asset": either an explicit null
/// reference or an object that only exists at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(Uuid);

impl AssetId {
    pub const EMPTY: AssetId = AssetId(Uuid::nil());

    /// Create a new random asset ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an asset ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AssetId {
    /// The empty id, not a random one.
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for AssetId {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| AssetError::InvalidAssetId(s.to_string()))
    }
}

/// Address of one object inside the asset database.
///
/// `file_id` selects a sub-object packed into the asset file; 0 is the file's
/// main object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AssetIdentity {
    pub asset_id: AssetId,
    pub file_id: i16,
}

impl AssetIdentity {
    pub const NONE: AssetIdentity = AssetIdentity {
        asset_id: AssetId::EMPTY,
        file_id: 0,
    };

    pub const MAIN_FILE_ID: i16 = 0;

    pub fn new(asset_id: AssetId, file_id: i16) -> Self {
        Self { asset_id, file_id }
    }

    /// Identity of the main object of an asset file.
    pub fn main(asset_id: AssetId) -> Self {
        Self::new(asset_id, Self::MAIN_FILE_ID)
    }

    /// True when no persisted asset backs this identity.
    pub fn is_empty(&self) -> bool {
        self.asset_id.is_empty()
    }
}

impl fmt::Display for AssetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.asset_id, self.file_id)
    }
}
