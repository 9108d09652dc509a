use std::path::Path;

use ember_assets::{AssetLookup, ImportContext};
use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostics;
use crate::error::ImportError;
use crate::model::ModelImportSettings;

/// Per-file import options. Importers read the section that applies to them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub model: ModelImportSettings,
}

/// Converts one source file into engine objects.
pub trait AssetImporter: Send + Sync {
    /// Human readable importer name, used in logs.
    fn name(&self) -> &'static str;

    /// Lower-case file extensions (without the dot) this importer accepts.
    fn extensions(&self) -> &'static [&'static str];

    /// Import `source` into `ctx`.
    ///
    /// `lookup` resolves paths of assets imported earlier. Recoverable
    /// problems go to `diagnostics`; an `Err` means nothing from this file
    /// should be registered.
    fn import(
        &self,
        source: &Path,
        settings: &ImportSettings,
        lookup: &dyn AssetLookup,
        ctx: &mut dyn ImportContext,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), ImportError>;
}

/// Lower-cased extension of `path`, without the dot.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Reject files whose extension the importer does not list.
pub(crate) fn check_extension(importer: &dyn AssetImporter, source: &Path) -> Result<(), ImportError> {
    let extension = extension_of(source);
    if importer.extensions().contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(ImportError::UnsupportedFormat {
            path: source.to_path_buf(),
            extension,
        })
    }
}

/// Read a source file as text.
pub(crate) fn read_source(source: &Path) -> Result<String, ImportError> {
    std::fs::read_to_string(source).map_err(|source_err| ImportError::Io {
        path: source.to_path_buf(),
        source: source_err,
    })
}
