use std::path::{Component, Path, PathBuf};

/// Lexically normalize `path`: `.` components are dropped and each `..`
/// removes the component before it. The filesystem is not consulted, so
/// symlinks are left alone.
///
/// A `..` directly under the root stays at the root; leading `..` of a
/// relative path are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}
