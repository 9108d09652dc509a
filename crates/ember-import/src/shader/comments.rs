/// Remove `//` line comments and `/* */` block comments.
///
/// Line comments keep their terminating newline. An unterminated block
/// comment runs to the end of the input. Quotes are not tracked, so a
/// `//` inside a string literal starts a comment too.
pub fn strip_comments(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut copied = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'/') => {
                out.push_str(&input[copied..i]);
                i = input[i..].find('\n').map_or(bytes.len(), |n| i + n);
                copied = i;
            }
            (b'/', b'*') => {
                out.push_str(&input[copied..i]);
                i = input[i + 2..].find("*/").map_or(bytes.len(), |n| i + 2 + n + 2);
                copied = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&input[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_comments() {
        assert_eq!(strip_comments("a // one\nb // two"), "a \nb ");
    }

    #[test]
    fn strips_block_comments_across_lines() {
        assert_eq!(strip_comments("a /* x\ny */b"), "a b");
        assert_eq!(strip_comments("a /* never closed"), "a ");
    }

    #[test]
    fn comment_markers_inside_comments() {
        assert_eq!(strip_comments("a /* // */ b"), "a  b");
        assert_eq!(strip_comments("a // /* \nb */"), "a \nb */");
    }

    #[test]
    fn string_literals_are_not_special() {
        assert_eq!(strip_comments("Tags { \"Url\"=\"http://x\" }\n"), "Tags { \"Url\"=\"http:\n");
    }

    #[test]
    fn keeps_non_ascii_text() {
        assert_eq!(strip_comments("é/*ü*/ß // ñ"), "éß ");
    }
}
