//! Placeholder marker grammar.
//!
//! ```text
//! {{ [#] key-path [ separator ] [ :modifier[:modifier[:modifier]] ] }}
//! ```
//!
//! - `#` asks for the key segment of the parameter instead of its value
//! - the key path is made of word characters, `.` and `-`; single inner
//!   spaces are allowed when a word character follows (`Customer Name`)
//! - a separator follows the key after a space and consists of non-word
//!   characters only (`{{Numbers , }}` joins all numbers with `, `)
//! - modifiers are a formatter (`:upper`) or a trigger
//!   (`:empty:remove:row`)
//!
//! Text between markers that does not follow the grammar is not a
//! placeholder and stays untouched.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::formatter::Formatter;
use crate::key;
use crate::trigger::Trigger;

/// Opening marker.
pub const OPEN: &str = "{{";
/// Closing marker.
pub const CLOSE: &str = "}}";
/// Prefix selecting the key segment instead of the value.
pub const KEY_PREFIX: char = '#';
/// Delimiter introducing each modifier.
pub const MODIFIER_DELIMITER: char = ':';
/// Maximum number of modifiers after the key.
pub const MAX_MODIFIERS: usize = 3;
/// Punctuation allowed inside key paths besides word characters.
pub const KEY_PUNCTUATION: &[char] = &[key::KEY_SEPARATOR, '-'];
/// Characters allowed in a modifier besides word characters.
pub const MODIFIER_PUNCTUATION: &[char] = &['='];

/// Marker candidates: an opening marker, no braces, a closing marker.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"{}([^{{}}]*){}",
        regex::escape(OPEN),
        regex::escape(CLOSE)
    ))
    .expect("marker pattern is valid")
});

/// One parsed `{{...}}` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    span: Range<usize>,
    raw: String,
    key: String,
    is_key: bool,
    suffix: String,
    separator: Option<String>,
    modifiers: Vec<String>,
    formatter: Option<Formatter>,
    trigger: Option<Trigger>,
}

impl Placeholder {
    /// Every placeholder in `text`, left to right.
    pub fn scan(text: &str) -> Vec<Self> {
        if !text.contains(OPEN) {
            return Vec::new();
        }
        MARKER_RE
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let body = caps.get(1)?;
                Self::from_body(whole.range(), whole.as_str(), body.as_str())
            })
            .collect()
    }

    /// First placeholder in `text`.
    pub fn parse(text: &str) -> Option<Self> {
        Self::scan(text).into_iter().next()
    }

    fn from_body(span: Range<usize>, raw: &str, body: &str) -> Option<Self> {
        let (is_key, rest) = match body.strip_prefix(KEY_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, body),
        };

        let key_end = key_length(rest);
        if key_end == 0 {
            return None;
        }
        let (key, suffix) = rest.split_at(key_end);

        let (separator, modifiers) = if suffix.is_empty() {
            (None, Vec::new())
        } else {
            split_suffix(suffix.strip_prefix(' ')?)?
        };

        Some(Self {
            span,
            raw: raw.to_owned(),
            key: key.to_owned(),
            is_key,
            suffix: suffix.to_owned(),
            formatter: Formatter::from_parts(&modifiers),
            trigger: Trigger::from_parts(&modifiers),
            separator,
            modifiers,
        })
    }

    /// Byte range of the marker in the scanned text.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Marker text exactly as written, braces included.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Key path as written.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key path without list positions.
    pub fn compact_key(&self) -> String {
        key::compact(&self.key)
    }

    /// Whether the marker asks for the key segment (`{{#Key}}`).
    pub fn is_key(&self) -> bool {
        self.is_key
    }

    /// Separator for inline repetition.
    pub fn separator(&self) -> Option<&str> {
        self.separator.as_deref()
    }

    /// Whether the marker repeats in place instead of repeating its row.
    pub fn is_inline(&self) -> bool {
        self.separator.is_some()
    }

    /// Lowercased modifier parts.
    pub fn modifiers(&self) -> &[String] {
        &self.modifiers
    }

    pub fn formatter(&self) -> Option<Formatter> {
        self.formatter
    }

    pub fn trigger(&self) -> Option<Trigger> {
        self.trigger
    }

    /// Marker text with the key path replaced, everything else verbatim.
    pub fn with_key(&self, key: &str) -> String {
        let prefix = if self.is_key { "#" } else { "" };
        format!("{OPEN}{prefix}{key}{}{CLOSE}", self.suffix)
    }

    /// Apply the formatter, if any, to a value.
    pub fn format(&self, value: &str) -> String {
        match self.formatter {
            Some(formatter) => formatter.apply(value),
            None => value.to_owned(),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte length of the key path at the start of `s`.
fn key_length(s: &str) -> usize {
    let mut chars = s.char_indices().peekable();
    match chars.peek() {
        Some(&(_, c)) if is_word_char(c) => {}
        _ => return 0,
    }
    while let Some((i, c)) = chars.next() {
        let accepted = match c {
            ' ' => chars.peek().is_some_and(|&(_, next)| is_word_char(next)),
            c => is_word_char(c) || KEY_PUNCTUATION.contains(&c),
        };
        if !accepted {
            return i;
        }
    }
    s.len()
}

/// Split the text after the key into separator and modifiers.
///
/// Returns `None` when the separator holds word characters.
fn split_suffix(suffix: &str) -> Option<(Option<String>, Vec<String>)> {
    let start = suffix
        .match_indices(MODIFIER_DELIMITER)
        .map(|(i, _)| i)
        .find(|&i| is_modifier_chain(&suffix[i..]))
        .unwrap_or(suffix.len());
    let (separator, chain) = suffix.split_at(start);

    let separator = separator.trim_start();
    let separator = if chain.is_empty() {
        separator
    } else {
        separator.trim_end()
    };
    if separator.chars().any(is_word_char) {
        return None;
    }

    let modifiers = chain
        .split(MODIFIER_DELIMITER)
        .skip(1)
        .map(str::to_lowercase)
        .collect();
    let separator = (!separator.is_empty()).then(|| separator.to_owned());
    Some((separator, modifiers))
}

/// Whether `s` is `:part` repeated at most [`MAX_MODIFIERS`] times.
fn is_modifier_chain(s: &str) -> bool {
    let Some(rest) = s.strip_prefix(MODIFIER_DELIMITER) else {
        return false;
    };
    let parts: Vec<&str> = rest.split(MODIFIER_DELIMITER).collect();
    parts.len() <= MAX_MODIFIERS
        && parts.iter().all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| is_word_char(c) || MODIFIER_PUNCTUATION.contains(&c))
        })
}
