//! Case formatters applied to substituted values.

use std::fmt;

/// Case transformation requested by a placeholder modifier.
///
/// `{{Name :upper}}` renders the value of `Name` in upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    /// `:lower`
    Lower,
    /// `:upper`
    Upper,
    /// `:title`: first letter of every word upper case, the rest lower case.
    Title,
    /// `:capitalize`: trimmed, first character upper case, the rest lower case.
    Capitalize,
}

impl Formatter {
    /// Recognize a single lowercased modifier part.
    pub fn from_part(part: &str) -> Option<Self> {
        match part {
            "lower" => Some(Self::Lower),
            "upper" => Some(Self::Upper),
            "title" => Some(Self::Title),
            "capitalize" => Some(Self::Capitalize),
            _ => None,
        }
    }

    /// Pick the formatter out of modifier parts. The last recognized part wins.
    pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> Option<Self> {
        parts
            .iter()
            .filter_map(|part| Self::from_part(part.as_ref()))
            .next_back()
    }

    /// Format a value.
    #[must_use]
    pub fn apply(self, value: &str) -> String {
        match self {
            Self::Lower => value.to_lowercase(),
            Self::Upper => value.to_uppercase(),
            Self::Title => title_case(value),
            Self::Capitalize => capitalize(value.trim()),
        }
    }
}

impl fmt::Display for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Title => "title",
            Self::Capitalize => "capitalize",
        };
        write!(f, ":{name}")
    }
}

fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word_start = true;
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            if word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(ch);
            word_start = !matches!(ch, '\'' | '\u{2019}');
        }
    }
    out
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut out: String = first.to_uppercase().collect();
    out.push_str(&chars.as_str().to_lowercase());
    out
}
