use std::path::Path;

use ember_assets::{load_texture, AssetLookup, ImportContext};
use tracing::info;

use crate::diagnostics::Diagnostics;
use crate::error::ImportError;
use crate::importer::{check_extension, AssetImporter, ImportSettings};

/// Decodes image files into an RGBA8 [`Texture2D`](ember_assets::Texture2D).
#[derive(Debug, Default, Clone, Copy)]
pub struct TextureImporter;

impl AssetImporter for TextureImporter {
    fn name(&self) -> &'static str {
        "texture"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png", "jpg", "jpeg", "bmp", "tga"]
    }

    fn import(
        &self,
        source: &Path,
        _settings: &ImportSettings,
        _lookup: &dyn AssetLookup,
        ctx: &mut dyn ImportContext,
        _diagnostics: &mut Diagnostics,
    ) -> Result<(), ImportError> {
        check_extension(self, source)?;
        let texture = load_texture(source).map_err(ImportError::Texture)?;
        info!(
            "Imported texture '{}' ({}x{})",
            texture.name, texture.width, texture.height
        );
        ctx.set_main_object(texture.into());
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

    fn import(path: &Path) -> (Result<(), ImportError>, SerializedAsset) {
        let mut asset = SerializedAsset::new(AssetId::new());
        let result = TextureImporter.import(
            path,
            &ImportSettings::default(),
            &NoAssets,
            &mut asset,
            &mut Diagnostics::new(),
        );
        (result, asset)
    }

    #[test]
    fn imports_image_as_main_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grass.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 200, 30, 255]))
            .save(&path)
            .unwrap();

        let (result, asset) = import(&path);
        result.unwrap();
        let Some(AssetObject::Texture(texture)) = asset.main_object() else {
            panic!("expected a texture main object");
        };
        assert_eq!(texture.name, "grass");
        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(&texture.data[..4], &[10, 200, 30, 255]);
    }

    #[test]
    fn undecodable_file_fails_without_registering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let (result, asset) = import(&path);
        assert!(matches!(result, Err(ImportError::Texture(_))));
        assert!(asset.main_object().is_none());
    }

    #[test]
    fn extension_is_checked_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LOGO.PNG");
        image::RgbaImage::new(1, 1).save_with_format(&path, image::ImageFormat::Png).unwrap();
        import(&path).0.unwrap();

        let (result, _) = import(&dir.path().join("clip.gif"));
        assert!(matches!(result, Err(ImportError::UnsupportedFormat { .. })));
    }
}
