use std::fmt;
use std::str::FromStr;

use log::warn;
use thiserror::Error;

/// Longest text value (in characters) accepted in a question.
pub const MAX_TEXT_LEN: usize = 1000;

const DISALLOWED: [char; 2] = ['<', '>'];
const REPLACEMENT: char = '?';

/// How text that breaks the content rules is handled. Applied uniformly to
/// every text field of every question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizationPolicy {
    /// Drop the whole question.
    #[default]
    Reject,
    /// Truncate over-long text, delete tag-like `<...>` spans and then any
    /// remaining disallowed character.
    Remove,
    /// Truncate over-long text and replace disallowed characters with `?`.
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sanitization policy `{0}` (expected reject, remove or replace)")]
pub struct PolicyParseError(String);

impl FromStr for SanitizationPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "remove" => Ok(Self::Remove),
            "replace" => Ok(Self::Replace),
            _ => Err(PolicyParseError(s.to_string())),
        }
    }
}

impl fmt::Display for SanitizationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reject => "reject",
            Self::Remove => "remove",
            Self::Replace => "replace",
        };
        f.write_str(name)
    }
}

impl SanitizationPolicy {
    /// Sanitizes one text value. `None` means the owning question must be
    /// dropped, which only happens under [`SanitizationPolicy::Reject`].
    pub fn sanitize(self, text: &str) -> Option<String> {
        let len = text.chars().count();
        let mut text = if len == 0 || len > MAX_TEXT_LEN {
            warn!("Text length out of bounds ({len} characters)");
            if self == Self::Reject {
                return None;
            }
            text.chars().take(MAX_TEXT_LEN).collect()
        } else {
            text.to_string()
        };

        if text.contains(DISALLOWED) {
            match self {
                Self::Reject => {
                    warn!("Disallowed characters found in text: {text}");
                    return None;
                }
                Self::Remove => text = strip_markup(&text),
                Self::Replace => {
                    text = text
                        .chars()
                        .map(|c| if DISALLOWED.contains(&c) { REPLACEMENT } else { c })
                        .collect();
                }
            }
        }

        Some(text)
    }
}

/// Deletes tag-like spans (`<` directly followed by a letter, `/` or `!`,
/// up to the next `>`), then every `<` or `>` left over.
fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        rest = match after.find('>') {
            Some(close) if opens_tag(after) => &after[close + 1..],
            _ => after,
        };
    }
    out.push_str(rest);
    out.retain(|c| !DISALLOWED.contains(&c));
    out
}

fn opens_tag(after_bracket: &str) -> bool {
    after_bracket.starts_with(|c: char| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_tag_per_policy() {
        let text = "Invalid <script>";
        assert_eq!(SanitizationPolicy::Remove.sanitize(text).as_deref(), Some("Invalid "));
        assert_eq!(
            SanitizationPolicy::Replace.sanitize(text).as_deref(),
            Some("Invalid ?script?")
        );
        assert_eq!(SanitizationPolicy::Reject.sanitize(text), None);
    }

    #[test]
    fn remove_strips_spans_and_strays() {
        let remove = |t: &str| SanitizationPolicy::Remove.sanitize(t).unwrap();
        assert_eq!(remove("<b>bold</b> text"), "bold text");
        assert_eq!(remove("x > y"), "x  y");
        assert_eq!(remove("a<b"), "ab");
        assert_eq!(remove("<script>alert('XSS')</script>"), "alert('XSS')");
        assert_eq!(remove("<!-- note -->kept"), "kept");
    }

    #[test]
    fn remove_keeps_text_between_comparisons() {
        let remove = |t: &str| SanitizationPolicy::Remove.sanitize(t).unwrap();
        assert_eq!(remove("Is 3 < 5 and 7 > 2 true?"), "Is 3  5 and 7  2 true?");
        assert_eq!(remove("x <= 4 or y >= 9"), "x = 4 or y = 9");
        assert_eq!(remove("1 <2> 3"), "1 2 3");
    }

    #[test]
    fn clean_text_is_untouched() {
        for policy in [
            SanitizationPolicy::Reject,
            SanitizationPolicy::Remove,
            SanitizationPolicy::Replace,
        ] {
            assert_eq!(policy.sanitize("What is 2 + 2?").as_deref(), Some("What is 2 + 2?"));
        }
    }

    #[test]
    fn length_bounds() {
        let long = "a".repeat(MAX_TEXT_LEN + 5);
        assert_eq!(SanitizationPolicy::Reject.sanitize(&long), None);
        assert_eq!(SanitizationPolicy::Reject.sanitize(""), None);
        assert_eq!(
            SanitizationPolicy::Remove.sanitize(&long).map(|t| t.chars().count()),
            Some(MAX_TEXT_LEN)
        );
        assert_eq!(SanitizationPolicy::Replace.sanitize("").as_deref(), Some(""));

        let exact = "é".repeat(MAX_TEXT_LEN);
        assert_eq!(SanitizationPolicy::Reject.sanitize(&exact), Some(exact));
    }

    #[test]
    fn truncated_text_is_still_cleaned() {
        let long = format!("<{}", "a".repeat(MAX_TEXT_LEN));
        let replaced = SanitizationPolicy::Replace.sanitize(&long).unwrap();
        assert!(replaced.starts_with('?'));
        assert_eq!(replaced.chars().count(), MAX_TEXT_LEN);
    }

    #[test]
    fn sanitizing_twice_changes_nothing() {
        let long = "x>".repeat(700);
        let inputs = ["<<>>", "a<b>c", "plain", "", long.as_str()];
        for policy in [SanitizationPolicy::Remove, SanitizationPolicy::Replace] {
            for input in inputs {
                let once = policy.sanitize(input).unwrap();
                assert!(!once.contains(DISALLOWED));
                assert_eq!(policy.sanitize(&once).as_deref(), Some(once.as_str()));
            }
        }
    }

    #[test]
    fn parse_policy_names() {
        assert_eq!("reject".parse::<SanitizationPolicy>(), Ok(SanitizationPolicy::Reject));
        assert_eq!("REMOVE".parse::<SanitizationPolicy>(), Ok(SanitizationPolicy::Remove));
        assert_eq!(" replace ".parse::<SanitizationPolicy>(), Ok(SanitizationPolicy::Replace));
        assert!("strip".parse::<SanitizationPolicy>().is_err());
        assert_eq!(SanitizationPolicy::Replace.to_string(), "replace");
    }
}
