//! Helpers to split and clean up free-form argument strings.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r#"\s*(?:"([^"]*)"|'([^']*)'|(\S+))\s*"#).unwrap();
    static ref DOUBLE_QUOTED_TOKEN: Regex = Regex::new(r#"\s*(?:"([^"]*)"|(\S+))\s*"#).unwrap();
    static ref WRAPPED: Regex = Regex::new(r#"(?s)^(?:"(.*)"|'(.*)')$"#).unwrap();
    static ref DOUBLE_WRAPPED: Regex = Regex::new(r#"(?s)^"(.*)"$"#).unwrap();
}

/// Replaces typographic quotes with their plain counterparts.
pub fn normalize_quotes(text: &str, single_quotes: bool) -> String {
    let text = text.replace(['\u{201c}', '\u{201d}'], "\"");

    if single_quotes {
        text.replace(['\u{2018}', '\u{2019}'], "'")
    } else {
        text
    }
}

/// Removes the quotes wrapping the whole text, if any.
pub fn strip_quotes(text: &str, single_quotes: bool) -> &str {
    let regex: &Regex = if single_quotes { &*WRAPPED } else { &*DOUBLE_WRAPPED };

    regex
        .captures(text)
        .and_then(|captures| captures.get(1).or_else(|| captures.get(2)))
        .map_or(text, |inner| inner.as_str())
}

/// Splits an argument string into tokens.
///
/// Whitespace separates tokens, while quoted runs form a single token without their quotes.
/// With a `count` of `N`, at most `N - 1` tokens are split and the rest of the string is
/// returned verbatim as the last token, only removing wrapping quotes. A `count` of `0` splits
/// the whole string.
pub fn parse_args(text: &str, count: usize, single_quotes: bool) -> Vec<String> {
    let text = normalize_quotes(text, single_quotes);
    let regex: &Regex = if single_quotes { &*TOKEN } else { &*DOUBLE_QUOTED_TOKEN };
    let limit = if count == 0 { usize::MAX } else { count - 1 };

    let mut tokens = Vec::new();
    let mut end = 0;

    for captures in regex.captures_iter(&text) {
        if tokens.len() == limit {
            break;
        }

        let token = captures
            .iter()
            .skip(1)
            .flatten()
            .next()
            .map_or("", |token| token.as_str());

        tokens.push(token.to_string());
        if let Some(whole) = captures.get(0) {
            end = whole.end();
        }
    }

    let rest = text[end..].trim_start();
    if tokens.len() == limit && !rest.is_empty() {
        tokens.push(strip_quotes(rest, single_quotes).to_string());
    }

    tokens
}

/// Escapes markdown formatting characters.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '~' | '|') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}
