//! Brace-depth scanner for the named blocks of shader source.

use crate::diagnostics::{Anomaly, Diagnostics};

/// A `<keyword> <number> { ... }` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberedBlock<'a> {
    pub number: i32,
    /// Contents between the braces, untrimmed.
    pub body: &'a str,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Next occurrence of `keyword` at or after `from` that stands as a whole
/// word.
pub fn find_keyword(input: &str, keyword: &str, from: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut cursor = from;
    while let Some(offset) = input.get(cursor..)?.find(keyword) {
        let at = cursor + offset;
        let end = at + keyword.len();
        let bounded_before = at == 0 || !is_word_byte(bytes[at - 1]);
        let bounded_after = end == bytes.len() || !is_word_byte(bytes[end]);
        if bounded_before && bounded_after {
            return Some(at);
        }
        cursor = end;
    }
    None
}

/// Offset of the `}` closing the `{` at `open`.
pub fn matching_brace(input: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in input.as_bytes().iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Parse ` <digits> {` starting right after a keyword. Returns the number and
/// the offset of the opening brace.
fn numbered_header(input: &str, after_keyword: usize) -> Option<(i32, usize)> {
    let bytes = input.as_bytes();
    let digits_start = skip_whitespace(bytes, after_keyword);
    if digits_start == after_keyword {
        return None;
    }
    let mut digits_end = digits_start;
    while digits_end < bytes.len() && bytes[digits_end].is_ascii_digit() {
        digits_end += 1;
    }
    let number = input[digits_start..digits_end].parse().ok()?;
    let open = skip_whitespace(bytes, digits_end);
    (bytes.get(open) == Some(&b'{')).then_some((number, open))
}

/// Every `<keyword> <number> { ... }` block in textual order.
///
/// Blocks do not nest: scanning resumes after each closing brace. A block
/// whose braces never balance is reported and skipped.
pub fn numbered_blocks<'a>(input: &'a str, keyword: &str, diagnostics: &mut Diagnostics) -> Vec<NumberedBlock<'a>> {
    let mut blocks = Vec::new();
    let mut cursor = 0;
    while let Some(at) = find_keyword(input, keyword, cursor) {
        let after = at + keyword.len();
        let Some((number, open)) = numbered_header(input, after) else {
            cursor = after;
            continue;
        };
        match matching_brace(input, open) {
            Some(close) => {
                blocks.push(NumberedBlock {
                    number,
                    body: &input[open + 1..close],
                });
                cursor = close + 1;
            }
            None => {
                diagnostics.report(Anomaly::UnterminatedBlock {
                    block: format!("{keyword} {number}"),
                });
                cursor = open + 1;
            }
        }
    }
    blocks
}

/// Trimmed contents of the first `<name> { ... }` block, if any.
pub fn named_block<'a>(input: &'a str, name: &str, diagnostics: &mut Diagnostics) -> Option<&'a str> {
    let bytes = input.as_bytes();
    let mut cursor = 0;
    while let Some(at) = find_keyword(input, name, cursor) {
        let after = at + name.len();
        let open = skip_whitespace(bytes, after);
        if bytes.get(open) != Some(&b'{') {
            cursor = after;
            continue;
        }
        match matching_brace(input, open) {
            Some(close) => return Some(input[open + 1..close].trim()),
            None => {
                diagnostics.report(Anomaly::UnterminatedBlock {
                    block: name.to_string(),
                });
                cursor = open + 1;
            }
        }
    }
    None
}
