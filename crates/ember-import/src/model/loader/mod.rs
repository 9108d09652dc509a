//! Scene loader backends. Each reads one file format into a [`SourceScene`].

mod gltf_loader;
mod obj_loader;
mod ply_loader;
mod stl_loader;

use std::path::Path;

use tracing::debug;

use super::source::SourceScene;
use crate::error::ImportError;
use crate::importer::extension_of;

/// Read `path` with the backend for its extension.
pub fn load_scene(path: &Path) -> Result<SourceScene, ImportError> {
    let scene = match extension_of(path).as_str() {
        "gltf" => gltf_loader::load(path)?,
        "obj" => obj_loader::load(path)?,
        "ply" => ply_loader::load(path)?,
        "stl" => stl_loader::load(path)?,
        other => {
            return Err(ImportError::SceneLoad {
                path: path.to_path_buf(),
                reason: format!("no loader backend for .{other} files"),
            })
        }
    };
    debug!(
        "Loaded scene '{}': {} meshes, {} materials",
        path.display(),
        scene.meshes.len(),
        scene.materials.len()
    );
    Ok(scene)
}

/// Name for a source file's root node.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Model".to_string())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_is_a_scene_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.fbx");
        std::fs::write(&path, b"").unwrap();
        let err = load_scene(&path).unwrap_err();
        assert!(matches!(err, ImportError::SceneLoad { .. }));
        assert!(err.to_string().contains("no loader backend"));
    }
}
