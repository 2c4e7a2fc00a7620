//! Depth-aware splitting of function arguments.
//!
//! Formulas nest calls and quote strings freely, so arguments are split only
//! at commas outside every parenthesis and quoted string. Unbalanced input
//! never panics; it just produces fewer split points.

/// Closing character for a quote that opens a string literal.
fn closing_quote(ch: char) -> Option<char> {
    match ch {
        '"' => Some('"'),
        '\'' => Some('\''),
        '\u{201C}' | '\u{201D}' => Some('\u{201D}'),
        _ => None,
    }
}

/// Byte offsets of every comma outside parentheses and quotes.
pub(crate) fn top_level_commas(text: &str) -> Vec<usize> {
    let mut commas = Vec::new();
    let mut depth: i32 = 0;
    let mut open_quote: Option<char> = None;
    let mut previous: Option<char> = None;

    for (offset, ch) in text.char_indices() {
        if let Some(close) = open_quote {
            if ch == close && previous != Some('\\') {
                open_quote = None;
            }
        } else if let Some(close) = closing_quote(ch) {
            open_quote = Some(close);
        } else {
            match ch {
                '(' => depth += 1,
                ')' => depth -= 1,
                ',' if depth == 0 => commas.push(offset),
                _ => {}
            }
        }
        previous = Some(ch);
    }
    commas
}

/// Splits `text` at top-level commas into at most `max_parts` trimmed parts.
/// The last part keeps any remaining commas.
///
/// # Examples
///
/// ```ignore
/// let parts = split_top_level(r#"CONTEXT("View")="A", LINKTOVIEW("B, C"), """#, 3);
/// assert_eq!(parts, vec![r#"CONTEXT("View")="A""#, r#"LINKTOVIEW("B, C")"#, r#""""#]);
/// ```
pub(crate) fn split_top_level(text: &str, max_parts: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for comma in top_level_commas(text) {
        if parts.len() + 1 >= max_parts {
            break;
        }
        parts.push(text[start..comma].trim());
        start = comma + 1;
    }
    parts.push(text[start..].trim());
    parts
}

/// Offset of the last top-level comma, if any.
pub(crate) fn last_top_level_comma(text: &str) -> Option<usize> {
    top_level_commas(text).last().copied()
}

/// Returns the argument text of `NAME(...)` when `expression` is exactly
/// one call to `name` (an optional leading `=` is allowed).
pub(crate) fn call_body<'a>(expression: &'a str, name: &str) -> Option<&'a str> {
    let text = expression.trim();
    let text = text.strip_prefix('=').unwrap_or(text).trim_start();
    let head = text.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    let rest = text[name.len()..].trim_start();
    let inner = rest.strip_prefix('(')?;
    let body = inner.trim_end().strip_suffix(')')?;
    Some(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commas_inside_calls_and_strings_are_ignored() {
        let text = r#"CONTEXT("View")="A, B", LINKTOROW([Id], "Detail"), "x""#;
        let parts = split_top_level(text, usize::MAX);
        assert_eq!(
            parts,
            vec![
                r#"CONTEXT("View")="A, B""#,
                r#"LINKTOROW([Id], "Detail")"#,
                r#""x""#
            ]
        );
    }

    #[test]
    fn test_max_parts_keeps_remainder() {
        let parts = split_top_level("a, b, c, d", 3);
        assert_eq!(parts, vec!["a", "b", "c, d"]);
    }

    #[test]
    fn test_curly_and_escaped_quotes() {
        let text = "\u{201C}a, b\u{201D}, \"c\\\", d\", e";
        assert_eq!(top_level_commas(text).len(), 2);
    }

    #[test]
    fn test_unbalanced_parens_do_not_panic() {
        assert!(top_level_commas("LINKTOVIEW((\"A\", \"B\"").is_empty());
        assert_eq!(split_top_level("))), a", 2), vec!["))), a"]);
        assert_eq!(last_top_level_comma(""), None);
    }

    #[test]
    fn test_last_comma() {
        let text = r#"FILTER("T", [X] = 1), "Detail""#;
        let comma = last_top_level_comma(text).unwrap();
        assert_eq!(&text[comma + 1..], r#" "Detail""#);
    }

    #[test]
    fn test_call_body() {
        assert_eq!(call_body("=IF(a, b, c)", "IF"), Some("a, b, c"));
        assert_eq!(call_body("  ifs ( a, b ) ", "IFS"), Some(" a, b "));
        assert_eq!(call_body("IFS(a, b)", "IF"), None);
        assert_eq!(call_body("IF(a, b) & \"x\"", "IF"), None);
        assert_eq!(call_body("", "IF"), None);
    }
}
