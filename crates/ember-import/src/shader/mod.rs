//! Shader source parsing.
//!
//! Source format:
//!
//! ```text
//! Shader "Name" {
//!     Properties { _Color("Color", Color) }
//!     Pass 0 { RenderMode { Opaque } Vertex { ... } Fragment { ... } }
//!     ShadowPass 0 { Vertex { ... } Fragment { ... } }
//! }
//! ```

mod comments;
mod importer;
mod includes;
mod properties;
mod scanner;

use std::path::Path;

use ember_assets::{Shader, ShaderPass, ShaderProperty, ShadowPass};
use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::error::ShaderParseError;

pub use comments::strip_comments;
pub use importer::ShaderImporter;
pub use includes::{resolve_includes, MAX_INCLUDE_DEPTH};

use scanner::{find_keyword, named_block, numbered_blocks, NumberedBlock};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedPass {
    pub order: i32,
    pub render_mode: String,
    pub vertex: String,
    pub fragment: String,
}

/// Structured form of a shader source file, passes sorted by order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedShader {
    pub name: String,
    pub properties: Vec<ShaderProperty>,
    pub passes: Vec<ParsedPass>,
    pub shadow_pass: Option<ParsedPass>,
}

impl ParsedShader {
    /// Build the runtime shader.
    pub fn into_shader(self) -> Shader {
        Shader {
            name: self.name,
            properties: self.properties,
            passes: self
                .passes
                .into_iter()
                .map(|pass| ShaderPass {
                    render_mode: pass.render_mode,
                    vertex: pass.vertex,
                    fragment: pass.fragment,
                })
                .collect(),
            shadow_pass: self.shadow_pass.map(|pass| ShadowPass {
                vertex: pass.vertex,
                fragment: pass.fragment,
            }),
        }
    }
}

/// Parse shader source text. Includes resolve relative to `source_dir`.
pub fn parse_shader(
    source: &str,
    source_dir: &Path,
    diagnostics: &mut Diagnostics,
) -> Result<ParsedShader, ShaderParseError> {
    let input = strip_comments(source);

    let name = shader_name(&input).ok_or(ShaderParseError::MissingShaderDeclaration)?;

    let properties = match named_block(&input, "Properties", diagnostics) {
        Some(block) => properties::parse_properties(block)?,
        None => Vec::new(),
    };

    let mut passes: Vec<ParsedPass> = numbered_blocks(&input, "Pass", diagnostics)
        .into_iter()
        .map(|block| parse_pass(block, source_dir, diagnostics))
        .collect();
    passes.sort_by_key(|pass| pass.order);

    let shadow_pass = numbered_blocks(&input, "ShadowPass", diagnostics)
        .into_iter()
        .next()
        .map(|block| parse_pass(block, source_dir, diagnostics));

    Ok(ParsedShader {
        name,
        properties,
        passes,
        shadow_pass,
    })
}

/// Name from the first `Shader "<name>"` declaration.
fn shader_name(input: &str) -> Option<String> {
    let mut cursor = 0;
    while let Some(at) = find_keyword(input, "Shader", cursor) {
        cursor = at + "Shader".len();
        let rest = &input[cursor..];
        let quoted = rest.trim_start();
        if quoted.len() == rest.len() {
            continue;
        }
        let Some(body) = quoted.strip_prefix('"') else {
            continue;
        };
        if let Some(end) = body.find('"').filter(|&end| end > 0) {
            return Some(body[..end].to_string());
        }
    }
    None
}

fn parse_pass(block: NumberedBlock<'_>, source_dir: &Path, diagnostics: &mut Diagnostics) -> ParsedPass {
    let code = |name: &str, diagnostics: &mut Diagnostics| {
        let body = named_block(block.body, name, diagnostics).unwrap_or_default();
        resolve_includes(body, source_dir, diagnostics)
    };
    let vertex = code("Vertex", diagnostics);
    let fragment = code("Fragment", diagnostics);
    ParsedPass {
        order: block.number,
        render_mode: named_block(block.body, "RenderMode", diagnostics)
            .unwrap_or_default()
            .to_string(),
        vertex,
        fragment,
    }
}
