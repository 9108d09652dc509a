use std::path::Path;

use ember_assets::{AssetLookup, ImportContext};
use tracing::info;

use super::parse_shader;
use crate::diagnostics::Diagnostics;
use crate::error::ImportError;
use crate::importer::{check_extension, read_source, AssetImporter, ImportSettings};

/// Imports `.shader` source files as a single [`Shader`](ember_assets::Shader)
/// main object.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShaderImporter;

impl AssetImporter for ShaderImporter {
    fn name(&self) -> &'static str {
        "shader"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["shader"]
    }

    fn import(
        &self,
        source: &Path,
        _settings: &ImportSettings,
        _lookup: &dyn AssetLookup,
        ctx: &mut dyn ImportContext,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), ImportError> {
        check_extension(self, source)?;
        let text = read_source(source)?;
        let source_dir = source.parent().unwrap_or(Path::new("."));

        let shader = parse_shader(&text, source_dir, diagnostics)?.into_shader();
        info!(
            "Imported shader '{}' from {} ({} passes)",
            shader.name,
            source.display(),
            shader.passes.len()
        );
        ctx.set_main_object(shader.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_assets::{AssetId, AssetIdentity, AssetObject, SerializedAsset};

    struct NoAssets;

    impl AssetLookup for NoAssets {
        fn resolve_path_to_identity(&self, _path: &Path) -> Option<AssetIdentity> {
            None
        }
    }

    fn import(path: &Path) -> (Result<(), ImportError>, SerializedAsset, Diagnostics) {
        let mut asset = SerializedAsset::new(AssetId::new());
        let mut diagnostics = Diagnostics::new();
        let result = ShaderImporter.import(path, &ImportSettings::default(), &NoAssets, &mut asset, &mut diagnostics);
        (result, asset, diagnostics)
    }

    #[test]
    fn imports_shader_file_as_main_object() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Shared.glsl"), "vec4 tint;").unwrap();
        let path = dir.path().join("Unlit.shader");
        std::fs::write(
            &path,
            "Shader \"Unlit\" {\n Pass 0 {\n Vertex {\n#include \"Shared\"\nvoid main() {}\n}\n }\n}",
        )
        .unwrap();

        let (result, asset, diagnostics) = import(&path);
        result.unwrap();
        assert!(diagnostics.is_empty());
        let Some(AssetObject::Shader(shader)) = asset.main_object() else {
            panic!("expected a shader main object");
        };
        assert_eq!(shader.name, "Unlit");
        assert_eq!(shader.passes[0].vertex, "vec4 tint;\nvoid main() {}");
        assert!(asset.sub_objects().is_empty());
    }

    #[test]
    fn wrong_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Shader \"X\" {}").unwrap();
        let (result, asset, _) = import(&path);
        assert!(matches!(result, Err(ImportError::UnsupportedFormat { .. })));
        assert!(asset.main_object().is_none());
    }

    #[test]
    fn malformed_source_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.shader");
        std::fs::write(&path, "Pass 0 {}").unwrap();
        let (result, asset, _) = import(&path);
        assert!(matches!(result, Err(ImportError::Shader(_))));
        assert!(asset.main_object().is_none());
    }
}
