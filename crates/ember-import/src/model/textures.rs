use std::path::{Path, PathBuf};

use ember_assets::normalize_path;

/// Material texture slots filled by the model importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    Diffuse,
    Normal,
    /// Packed ambient occlusion, roughness and metallic.
    Surface,
    Emissive,
}

impl TextureSlot {
    /// Slots in the order the importer fills them.
    pub const ALL: [TextureSlot; 4] = [Self::Diffuse, Self::Normal, Self::Surface, Self::Emissive];

    /// Material property the texture is bound to.
    pub fn property(self) -> &'static str {
        match self {
            Self::Diffuse => "_MainTex",
            Self::Normal => "_NormalTex",
            Self::Surface => "_SurfaceTex",
            Self::Emissive => "_EmissionTex",
        }
    }

    /// Built-in texture used when the model's texture can't be bound.
    pub fn default_path(self) -> &'static str {
        match self {
            Self::Diffuse => "Defaults/grid.png",
            Self::Normal => "Defaults/default_normal.png",
            Self::Surface => "Defaults/default_surface.png",
            Self::Emissive => "Defaults/default_emission.png",
        }
    }
}

/// Locate a texture referenced by a model file.
///
/// The stored path is first tried relative to `parent_dir`. Models often
/// carry absolute paths from the author's machine, so after that the
/// trailing path components are tried beside the model, longest suffix
/// first: for `C:/old/Textures/a.png` that is `old/Textures/a.png`, then
/// `Textures/a.png`, then `a.png`.
///
/// The returned path is lexically normalized so it matches the path the
/// texture was registered under.
pub fn find_texture(stored: &str, parent_dir: &Path) -> Option<PathBuf> {
    let direct = normalize_path(&parent_dir.join(stored));
    if direct.is_file() {
        return Some(direct);
    }

    let segments: Vec<&str> = stored
        .split(&['/', '\\'][..])
        .filter(|segment| !segment.is_empty())
        .collect();
    (0..segments.len())
        .map(|start| {
            segments[start..]
                .iter()
                .fold(parent_dir.to_path_buf(), |path, segment| path.join(segment))
        })
        .map(|candidate| normalize_path(&candidate))
        .find(|candidate| candidate.is_file())
}
