//! Extension to importer table

use std::collections::HashMap;
use std::path::Path;

use ember_import::{extension_of, AssetImporter, ModelImporter, ShaderImporter, TextureImporter};
use tracing::warn;

/// Maps file extensions to the importer that handles them.
///
/// Registration order doubles as import priority: directory imports run
/// files of earlier importers first, so textures and shaders exist by the
/// time models look them up.
pub struct ImporterRegistry {
    importers: Vec<Box<dyn AssetImporter>>,
    by_extension: HashMap<&'static str, usize>,
}

impl ImporterRegistry {
    pub fn new() -> Self {
        Self {
            importers: Vec::new(),
            by_extension: HashMap::new(),
        }
    }

    /// Texture, shader and model importers, in that priority.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TextureImporter));
        registry.register(Box::new(ShaderImporter));
        registry.register(Box::new(ModelImporter));
        registry
    }

    /// Add an importer. Extensions it shares with an earlier importer move
    /// to the new one.
    pub fn register(&mut self, importer: Box<dyn AssetImporter>) {
        let index = self.importers.len();
        for &extension in importer.extensions() {
            if let Some(previous) = self.by_extension.insert(extension, index) {
                warn!(
                    "Importer '{}' takes .{} from '{}'",
                    importer.name(),
                    extension,
                    self.importers[previous].name()
                );
            }
        }
        self.importers.push(importer);
    }

    pub fn importer_for(&self, path: &Path) -> Option<&dyn AssetImporter> {
        self.priority(path).map(|index| self.importers[index].as_ref())
    }

    /// Position of the importer for `path` in registration order.
    pub fn priority(&self, path: &Path) -> Option<usize> {
        self.by_extension.get(extension_of(path).as_str()).copied()
    }

    /// Every handled extension, sorted.
    pub fn extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<_> = self.by_extension.keys().copied().collect();
        extensions.sort_unstable();
        extensions
    }
}

impl Default for ImporterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_assets::{AssetLookup, ImportContext};
    use ember_import::{Diagnostics, ImportError, ImportSettings};

    struct FakeImporter;

    impl AssetImporter for FakeImporter {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn extensions(&self) -> &'static [&'static str] {
            &["png", "fake"]
        }

        fn import(
            &self,
            _source: &Path,
            _settings: &ImportSettings,
            _lookup: &dyn AssetLookup,
            _ctx: &mut dyn ImportContext,
            _diagnostics: &mut Diagnostics,
        ) -> Result<(), ImportError> {
            Ok(())
        }
    }

    #[test]
    fn default_importers_by_extension() {
        let registry = ImporterRegistry::with_defaults();
        let name = |path: &str| registry.importer_for(Path::new(path)).map(|i| i.name());

        assert_eq!(name("Textures/wood.PNG"), Some("texture"));
        assert_eq!(name("Defaults/Standard.shader"), Some("shader"));
        assert_eq!(name("Models/crate.obj"), Some("model"));
        assert_eq!(name("Models/crate.gltf"), Some("model"));
        assert_eq!(name("notes.txt"), None);
        assert_eq!(name("Makefile"), None);
    }

    #[test]
    fn textures_before_shaders_before_models() {
        let registry = ImporterRegistry::with_defaults();
        let priority = |path: &str| registry.priority(Path::new(path)).unwrap();
        assert!(priority("a.jpg") < priority("a.shader"));
        assert!(priority("a.shader") < priority("a.fbx"));
    }

    #[test]
    fn later_registration_takes_shared_extension() {
        let mut registry = ImporterRegistry::with_defaults();
        registry.register(Box::new(FakeImporter));

        let importer = registry.importer_for(Path::new("a.png")).unwrap();
        assert_eq!(importer.name(), "fake");
        assert_eq!(registry.importer_for(Path::new("a.jpg")).unwrap().name(), "texture");
        assert!(registry.extensions().contains(&"fake"));
    }
}
