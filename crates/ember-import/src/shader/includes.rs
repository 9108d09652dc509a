use std::path::Path;

use super::comments::strip_comments;
use crate::diagnostics::{Anomaly, Diagnostics};

/// Include nesting limit. Circular includes stop here instead of recursing
/// forever.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Path named by an `#include "path"` or `#include <path>` line.
pub fn include_directive(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("#include")?.trim_start();
    let rest = rest.strip_prefix(&['"', '<'][..])?;
    let path = rest.strip_suffix(&['"', '>'][..])?;
    (!path.is_empty()).then_some(path)
}

/// Replace every include line in `code` with the comment-stripped contents
/// of `<source_dir>/<path>.glsl`, resolving nested includes first.
///
/// A missing file is reported and replaced by empty text.
pub fn resolve_includes(code: &str, source_dir: &Path, diagnostics: &mut Diagnostics) -> String {
    expand(code, source_dir, 0, diagnostics)
}

fn expand(code: &str, source_dir: &Path, depth: usize, diagnostics: &mut Diagnostics) -> String {
    let mut out = String::with_capacity(code.len());
    for (i, line) in code.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match include_directive(line) {
            Some(path) => out.push_str(&load_include(path, source_dir, depth, diagnostics)),
            None => out.push_str(line),
        }
    }
    out
}

fn load_include(path: &str, source_dir: &Path, depth: usize, diagnostics: &mut Diagnostics) -> String {
    let file = source_dir.join(format!("{path}.glsl"));
    if depth >= MAX_INCLUDE_DEPTH {
        diagnostics.report(Anomaly::IncludeDepthExceeded {
            path: file,
            limit: MAX_INCLUDE_DEPTH,
        });
        return String::new();
    }
    match std::fs::read_to_string(&file) {
        Ok(text) => expand(&strip_comments(&text), source_dir, depth + 1, diagnostics),
        Err(_) => {
            diagnostics.report(Anomaly::MissingInclude(file));
            String::new()
        }
    }
}
