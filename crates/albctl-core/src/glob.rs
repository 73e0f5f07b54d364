// Shell-style wildcard matching for object names (`web-*`, `vs-?[0-9]`).

use regex::Regex;

use crate::error::CoreError;

/// A compiled shell-style pattern: `*`, `?` and `[...]` classes.
/// Matching is case-sensitive and anchored at both ends.
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    /// `None` matches everything.
    regex: Option<Regex>,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self, CoreError> {
        let regex = Regex::new(&translate(pattern))
            .map_err(|e| CoreError::validation(format!("invalid pattern {pattern:?}: {e}")))?;
        Ok(Self {
            pattern: pattern.to_owned(),
            regex: Some(regex),
        })
    }

    /// Pattern that matches everything.
    pub fn any() -> Self {
        Self {
            pattern: "*".into(),
            regex: None,
        }
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.as_ref().is_none_or(|re| re.is_match(name))
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^(?s:");
    let mut i = 0;
    while let Some(&c) = chars.get(i) {
        i += 1;
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => match class(&chars, i) {
                Some((regex, next)) => {
                    out.push_str(&regex);
                    i = next;
                }
                // Unterminated: the `[` is literal and the rest is read normally.
                None => out.push_str(r"\["),
            },
            other => out.push_str(&escape(other)),
        }
    }
    out.push_str(")$");
    out
}

/// Translate the class body starting at `start` (just past `[`).
/// Returns the regex and the index after the closing `]`.
fn class(chars: &[char], start: usize) -> Option<(String, usize)> {
    let mut i = start;
    let negated = chars.get(i) == Some(&'!');
    if negated {
        i += 1;
    }
    // A `]` right after `[` or `[!` is a member, not the end.
    let body_start = i;
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    let end = i + chars.get(i..)?.iter().position(|&c| c == ']')?;
    let body = &chars[body_start..end];

    let mut members = String::new();
    let mut j = 0;
    while let Some(&lo) = body.get(j) {
        match (body.get(j + 1), body.get(j + 2)) {
            (Some(&'-'), Some(&hi)) => {
                // Reversed ranges are empty, as in fnmatch.
                if lo <= hi {
                    members.push_str(&format!("{}-{}", escape(lo), escape(hi)));
                }
                j += 3;
            }
            _ => {
                members.push_str(&escape(lo));
                j += 1;
            }
        }
    }

    let regex = match (members.is_empty(), negated) {
        (true, false) => r"[^\x00-\x{10FFFF}]".to_owned(),
        (true, true) => ".".to_owned(),
        (false, false) => format!("[{members}]"),
        (false, true) => format!("[^{members}]"),
    };
    Some((regex, end + 1))
}

/// Every character is escaped inside classes too, so `&&`, `~~` and `--`
/// never reach the regex engine as set operators.
fn escape(c: char) -> String {
    regex::escape(c.encode_utf8(&mut [0; 4]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, name: &str) -> bool {
        Glob::new(pattern)
            .unwrap_or_else(|e| panic!("{e}"))
            .is_match(name)
    }

    #[test]
    fn wildcards() {
        assert!(matches("*", "anything"));
        assert!(matches("*", ""));
        assert!(matches("web-*", "web-prod"));
        assert!(!matches("web-*", "api-web-prod"));
        assert!(matches("vs-?", "vs-1"));
        assert!(!matches("vs-?", "vs-10"));
    }

    #[test]
    fn character_classes() {
        assert!(matches("se-[0-9]", "se-3"));
        assert!(!matches("se-[0-9]", "se-x"));
        assert!(matches("se-[!0-9]", "se-x"));
        assert!(matches("a[", "a["));
        assert!(matches("[]]", "]"));
        assert!(matches("[!]]", "x"));
        assert!(!matches("[!]]", "]"));
    }

    #[test]
    fn unterminated_class_is_literal_bracket() {
        assert!(matches("a[!b", "a[!b"));
        assert!(!matches("a[!b", "a[b"));
        assert!(matches("x[*", "x[yz"));
        assert!(!matches("x[*", "xyz"));
    }

    #[test]
    fn class_members_are_never_set_operators() {
        assert!(matches("[a&&b]", "&"));
        assert!(matches("[a&&b]", "a"));
        assert!(matches("[x~~y]", "~"));
        assert!(!matches("[a--]", "a"));
        assert!(matches("[+--]", ","));
        assert!(!matches("[+--]", "a"));
        assert!(!matches("[z-a]b", "ab"));
        assert!(!matches("[z-a]b", "zb"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(matches("app.example.com", "app.example.com"));
        assert!(!matches("app.example.com", "appXexampleXcom"));
        assert!(matches("(test)+", "(test)+"));
    }

    #[test]
    fn any_matches_everything() {
        assert!(Glob::any().is_match("Default-Cloud"));
        assert_eq!(Glob::any().as_str(), "*");
    }
}
