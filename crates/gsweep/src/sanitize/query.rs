//! Query text sanitizing for the Drive and Gmail search dialects.
//!
//! Drive takes user text inside single-quoted string literals
//! (`name contains '...'`), so the job there is escaping. Gmail takes the raw
//! search box syntax, so the job there is filtering tokens down to a known set
//! of operators and plain terms.

use once_cell::sync::Lazy;
use regex::Regex;

use super::truncate_chars;

/// Upper bound on sanitized query length, in characters
pub const MAX_QUERY_LEN: usize = 1000;

static DRIVE_INJECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)--|/\*|\*/|;\s*drop|;\s*delete").expect("drive injection pattern is valid")
});

static GMAIL_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9@._\-/]+$").expect("gmail value pattern is valid"));

static GMAIL_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9@._-]+$").expect("gmail term pattern is valid"));

const GMAIL_OPERATORS: &[&str] = &[
    "from",
    "to",
    "cc",
    "bcc",
    "subject",
    "label",
    "is",
    "in",
    "has",
    "after",
    "before",
    "older_than",
    "newer_than",
    "filename",
    "larger",
    "smaller",
    "category",
];

const GMAIL_KEYWORDS: &[&str] = &["and", "or", "not", "-"];

const GMAIL_STRIPPED: &[char] = &['<', '>', '{', '}', '\\'];

/// Make free text safe to embed in a single-quoted Drive query literal.
///
/// Comment markers and `; drop` / `; delete` sequences are removed (repeatedly,
/// so removal cannot splice a new marker together). Backslashes and single
/// quotes are escaped. The result never exceeds [`MAX_QUERY_LEN`] characters
/// and never ends in a half-written escape.
pub fn sanitize_drive_query_text(raw: &str) -> String {
    let mut text = truncate_chars(raw.trim(), MAX_QUERY_LEN).to_string();
    loop {
        let stripped = DRIVE_INJECTION.replace_all(&text, "");
        if stripped == text {
            break;
        }
        text = stripped.into_owned();
    }

    let mut out = String::with_capacity(text.len());
    let mut len = 0;
    for ch in text.trim().chars() {
        let width = if ch == '\'' || ch == '\\' { 2 } else { 1 };
        if len + width > MAX_QUERY_LEN {
            break;
        }
        if width == 2 {
            out.push('\\');
        }
        out.push(ch);
        len += width;
    }
    out
}

/// Reduce free text to Gmail search tokens from a known-safe vocabulary.
///
/// Kept tokens: boolean keywords, double-quoted phrases, whitelisted
/// `operator:value` terms (optionally negated with `-`), and plain terms made of
/// letters, digits, `@`, `.`, `_` and `-`. Everything else is dropped.
pub fn sanitize_gmail_query_text(raw: &str) -> String {
    let truncated = truncate_chars(raw.trim(), MAX_QUERY_LEN);
    let cleaned: String = truncated
        .chars()
        .filter(|c| !GMAIL_STRIPPED.contains(c))
        .collect();

    let mut kept: Vec<String> = tokenize_gmail(&cleaned)
        .into_iter()
        .filter(|token| is_allowed_gmail_token(token))
        .collect();

    // Closing an unterminated phrase adds a character; drop trailing tokens
    // rather than cut a phrase in half.
    while joined_len(&kept) > MAX_QUERY_LEN {
        kept.pop();
    }

    kept.join(" ")
}

fn joined_len(tokens: &[String]) -> usize {
    let chars: usize = tokens.iter().map(|t| t.chars().count()).sum();
    chars + tokens.len().saturating_sub(1)
}

/// Split on whitespace, keeping double-quoted runs (including any that follow
/// an operator prefix) inside a single token. An unterminated quote is closed.
fn tokenize_gmail(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;

    for ch in text.chars() {
        if ch == '"' {
            in_quote = !in_quote;
            current.push(ch);
        } else if ch.is_whitespace() && !in_quote {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }

    if in_quote {
        current.push('"');
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn is_allowed_gmail_token(token: &str) -> bool {
    if GMAIL_KEYWORDS.contains(&token.to_ascii_lowercase().as_str()) {
        return true;
    }
    if is_quoted_phrase(token) {
        return true;
    }
    if let Some((name, value)) = token.split_once(':') {
        let name = name.strip_prefix('-').unwrap_or(name).to_ascii_lowercase();
        return GMAIL_OPERATORS.contains(&name.as_str())
            && (GMAIL_VALUE.is_match(value) || is_quoted_phrase(value));
    }
    GMAIL_TERM.is_match(token)
}

fn is_quoted_phrase(token: &str) -> bool {
    token.len() > 2
        && token.starts_with('"')
        && token.ends_with('"')
        && !token[1..token.len() - 1].contains('"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn drive_escapes_quotes_and_backslashes() {
        assert_eq!(sanitize_drive_query_text("bob's report"), r"bob\'s report");
        assert_eq!(sanitize_drive_query_text(r"a\' or 1=1"), r"a\\\' or 1=1");
    }

    #[test]
    fn drive_strips_comment_and_statement_markers() {
        assert_eq!(sanitize_drive_query_text("report -- comment"), "report  comment");
        assert_eq!(sanitize_drive_query_text("a /* b */ c"), "a  b  c");
        assert_eq!(sanitize_drive_query_text("x; DROP table"), "x table");
        assert_eq!(sanitize_drive_query_text("x ;  Delete y"), "x  y");
        // removal must not splice a new marker together
        assert_eq!(sanitize_drive_query_text("-/**/-"), "");
    }

    #[test]
    fn drive_truncation_never_splits_an_escape() {
        let input = format!("{}'", "a".repeat(999));
        let out = sanitize_drive_query_text(&input);
        assert_eq!(out.chars().count(), 999);
        assert!(!out.ends_with('\\'));
    }

    #[test]
    fn gmail_keeps_operators_phrases_and_terms() {
        assert_eq!(
            sanitize_gmail_query_text(r#"from:alice@example.com subject:"quarterly report" is:unread"#),
            r#"from:alice@example.com subject:"quarterly report" is:unread"#
        );
        assert_eq!(
            sanitize_gmail_query_text(r#"invoice OR "final notice" -label:receipts older_than:30d"#),
            r#"invoice OR "final notice" -label:receipts older_than:30d"#
        );
        assert_eq!(sanitize_gmail_query_text("after:2024/01/31"), "after:2024/01/31");
    }

    #[test]
    fn gmail_drops_unknown_operators_and_odd_tokens() {
        assert_eq!(sanitize_gmail_query_text("rfc822msgid:abc hello"), "hello");
        assert_eq!(sanitize_gmail_query_text("hello (world) $money"), "hello");
        assert_eq!(sanitize_gmail_query_text("   "), "");
    }

    #[test]
    fn gmail_strips_markup_characters() {
        assert_eq!(sanitize_gmail_query_text("<b>hello</b> world"), "world");
        assert_eq!(sanitize_gmail_query_text("<urgent> invoice"), "urgent invoice");
        assert_eq!(sanitize_gmail_query_text(r"{a}\b"), "ab");
    }

    #[test]
    fn gmail_closes_unterminated_phrase() {
        assert_eq!(sanitize_gmail_query_text(r#"term "open phrase"#), r#"term "open phrase""#);
    }

    #[test]
    fn gmail_collapses_whitespace() {
        assert_eq!(sanitize_gmail_query_text("a \t  b\n c"), "a b c");
    }

    proptest! {
        #[test]
        fn prop_drive_output_is_bounded(s in ".{1001,1400}") {
            prop_assert!(sanitize_drive_query_text(&s).chars().count() <= MAX_QUERY_LEN);
        }

        #[test]
        fn prop_gmail_output_is_bounded(s in ".{1001,1400}") {
            prop_assert!(sanitize_gmail_query_text(&s).chars().count() <= MAX_QUERY_LEN);
        }

        #[test]
        fn prop_drive_quotes_always_escaped(s in "[a-z' \\\\]{0,200}") {
            let out = sanitize_drive_query_text(&s);
            let mut chars = out.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    let next = chars.next();
                    prop_assert!(matches!(next, Some('\\') | Some('\'')));
                } else {
                    prop_assert_ne!(c, '\'');
                }
            }
        }
    }
}
