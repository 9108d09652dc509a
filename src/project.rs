//! Project import driver
//!
//! A project is a directory of source files imported into one
//! [`AssetServer`]. Per-file import settings come from the editor defaults,
//! overridden by an optional `<file>.meta` TOML file next to the source.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ember_assets::{AssetId, AssetServer, SerializedAsset};
use ember_import::{extension_of, Anomaly, Diagnostics, ImportSettings};
use tracing::{debug, error, info, warn};

use crate::registry::ImporterRegistry;
use crate::settings::EditorSettings;

/// Result of importing one file.
#[derive(Debug)]
pub struct ImportSummary {
    pub path: PathBuf,
    pub asset_id: AssetId,
    pub importer: &'static str,
    /// Type name of the main object, if the importer set one
    pub main_type: Option<&'static str>,
    pub sub_objects: usize,
    pub anomalies: Vec<Anomaly>,
}

/// Result of importing a directory tree.
#[derive(Debug, Default)]
pub struct DirectoryImport {
    pub imported: Vec<ImportSummary>,
    pub failed: Vec<PathBuf>,
    /// Files no importer handles
    pub skipped: usize,
}

impl DirectoryImport {
    pub fn anomaly_count(&self) -> usize {
        self.imported.iter().map(|summary| summary.anomalies.len()).sum()
    }
}

pub struct Project {
    server: AssetServer,
    registry: ImporterRegistry,
    defaults: ImportSettings,
}

impl Project {
    /// Open the project rooted at `root` with the default importers.
    pub fn open(root: impl Into<PathBuf>, settings: &EditorSettings) -> Self {
        let defaults = ImportSettings {
            model: settings.model.clone(),
        };
        Self::with_registry(root, ImporterRegistry::with_defaults(), defaults)
    }

    pub fn with_registry(root: impl Into<PathBuf>, registry: ImporterRegistry, defaults: ImportSettings) -> Self {
        debug!("Importers registered for: {}", registry.extensions().join(", "));
        Self {
            server: AssetServer::new(root),
            registry,
            defaults,
        }
    }

    pub fn root(&self) -> &Path {
        self.server.base_path()
    }

    pub fn server(&self) -> &AssetServer {
        &self.server
    }

    /// Import one file and register its objects. Relative paths resolve
    /// against the project root.
    pub fn import_file(&mut self, path: &Path) -> anyhow::Result<ImportSummary> {
        let path = self.server.resolve(path);
        let importer = self
            .registry
            .importer_for(&path)
            .with_context(|| format!("No importer for .{} files ({})", extension_of(&path), path.display()))?;
        let settings = import_settings(&path, &self.defaults);

        let asset_id = self.server.asset_id_for_path(&path);
        let mut asset = SerializedAsset::new(asset_id);
        let mut diagnostics = Diagnostics::new();
        debug!("Importing {} with the {} importer", path.display(), importer.name());
        importer
            .import(&path, &settings, &self.server, &mut asset, &mut diagnostics)
            .with_context(|| format!("Failed to import {}", path.display()))?;

        let summary = ImportSummary {
            asset_id,
            importer: importer.name(),
            main_type: asset.main_object().map(|object| object.type_name()),
            sub_objects: asset.sub_objects().len(),
            anomalies: diagnostics.into_vec(),
            path: path.clone(),
        };
        self.server.register(&path, asset);
        Ok(summary)
    }

    /// Import every handled file under `dir`: textures first, then shaders,
    /// then models. A failed file is logged and counted; the walk goes on.
    pub fn import_directory(&mut self, dir: &Path) -> anyhow::Result<DirectoryImport> {
        let dir = self.server.resolve(dir);
        let mut files = Vec::new();
        collect_files(&dir, &mut files).with_context(|| format!("Failed to read directory {}", dir.display()))?;

        let mut result = DirectoryImport::default();
        let mut queue = Vec::with_capacity(files.len());
        for path in files {
            if extension_of(&path) == "meta" {
                continue;
            }
            match self.registry.priority(&path) {
                Some(priority) => queue.push((priority, path)),
                None => {
                    debug!("Skipping {}", path.display());
                    result.skipped += 1;
                }
            }
        }
        queue.sort();

        for (_, path) in queue {
            match self.import_file(&path) {
                Ok(summary) => result.imported.push(summary),
                Err(e) => {
                    error!("{:#}", e);
                    result.failed.push(path);
                }
            }
        }

        info!(
            "Imported {} files from {} ({} failed, {} skipped, {} anomalies)",
            result.imported.len(),
            dir.display(),
            result.failed.len(),
            result.skipped,
            result.anomaly_count()
        );
        Ok(result)
    }

    /// Settings a file would be imported with.
    pub fn import_settings(&self, path: &Path) -> ImportSettings {
        import_settings(&self.server.resolve(path), &self.defaults)
    }
}

/// `model.obj` -> `model.obj.meta`
pub fn meta_path(path: &Path) -> PathBuf {
    let mut meta = path.as_os_str().to_owned();
    meta.push(".meta");
    PathBuf::from(meta)
}

/// `defaults` with the keys of the file's `.meta` table laid over them.
/// An unreadable meta file is ignored.
fn import_settings(path: &Path, defaults: &ImportSettings) -> ImportSettings {
    let meta = meta_path(path);
    if !meta.is_file() {
        return defaults.clone();
    }
    match read_overrides(&meta, defaults) {
        Ok(settings) => {
            debug!("Using import settings from {}", meta.display());
            settings
        }
        Err(e) => {
            warn!("Ignoring {}: {:#}", meta.display(), e);
            defaults.clone()
        }
    }
}

fn read_overrides(meta: &Path, defaults: &ImportSettings) -> anyhow::Result<ImportSettings> {
    let content = fs::read_to_string(meta).context("Failed to read meta file")?;
    let overrides: toml::Table = toml::from_str(&content).context("Failed to parse meta file")?;

    let mut merged = toml::Value::try_from(defaults).context("Failed to serialize defaults")?;
    if let toml::Value::Table(base) = &mut merged {
        merge_tables(base, overrides);
    }
    merged.try_into().context("Invalid import settings")
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        let merged = match (base.remove(&key), value) {
            (Some(toml::Value::Table(mut inner)), toml::Value::Table(value)) => {
                merge_tables(&mut inner, value);
                toml::Value::Table(inner)
            }
            (_, value) => value,
        };
        base.insert(key, merged);
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
