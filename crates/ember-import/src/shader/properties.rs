use ember_assets::{PropertyType, ShaderProperty};

use crate::error::ShaderParseError;

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Offset of the `)` closing the `(` at `open`. Parentheses inside quoted
/// strings are ignored.
fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'"' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Identifier immediately before `paren`, ignoring whitespace.
fn identifier_before(block: &str, paren: usize) -> Option<&str> {
    let bytes = block.as_bytes();
    let end = block[..paren].trim_end().len();
    let mut start = end;
    while start > 0 && is_word_byte(bytes[start - 1]) {
        start -= 1;
    }
    (start < end).then(|| &block[start..end])
}

/// Split call arguments on commas outside quotes and nested parentheses.
fn split_arguments(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0;
    for (i, b) in args.bytes().enumerate() {
        match b {
            b'"' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => depth = depth.saturating_sub(1),
            b',' if !in_string && depth == 0 => {
                parts.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[start..]);
    parts
}

/// Parse the declarations of a `Properties` block:
/// `<name>("<display name>", <Type>, defaults...)`.
///
/// Text that is not shaped like a declaration (default values, stray
/// tokens) is skipped. A declaration with an unknown type token fails the
/// whole parse.
pub fn parse_properties(block: &str) -> Result<Vec<ShaderProperty>, ShaderParseError> {
    let bytes = block.as_bytes();
    let mut properties = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = block[cursor..].find('(') {
        let open = cursor + offset;
        let Some(close) = matching_paren(bytes, open) else {
            break;
        };
        cursor = close + 1;

        let Some(name) = identifier_before(block, open) else {
            continue;
        };
        let args = split_arguments(&block[open + 1..close]);
        let [display, ty, ..] = args.as_slice() else {
            continue;
        };
        let Some(display_name) = display
            .trim()
            .strip_prefix('"')
            .and_then(|d| d.strip_suffix('"'))
            .filter(|d| !d.is_empty())
        else {
            continue;
        };

        let token: String = ty
            .trim()
            .bytes()
            .take_while(|&b| is_word_byte(b))
            .map(char::from)
            .collect();
        let ty = PropertyType::parse(&token).ok_or(ShaderParseError::UnknownPropertyType(token))?;

        properties.push(ShaderProperty {
            name: name.to_string(),
            display_name: display_name.to_string(),
            ty,
        });
    }

    Ok(properties)
}
