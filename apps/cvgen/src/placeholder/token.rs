//! Placeholder syntax.
//!
//! Two dialects coexist across client templates:
//! - angle: `<<FirstName>>`, `<<Staff.Grade>>`
//! - brace: `{FirstName}`, `{Education.Year}`, and the indexed form `{LastName[0]}`
//!
//! Region markers (`[Educations]`) are not placeholders; see `template::scanner`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const PATH: &str = r"[A-Za-z][A-Za-z0-9_]*(?:\.[A-Za-z][A-Za-z0-9_]*)*";

static ANGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"<<({PATH})>>")).expect("angle placeholder pattern"));

static BRACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\{{({PATH})(?:\[(\d+)\])?\}}")).expect("brace placeholder pattern")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `<<Path>>`
    Angle,
    /// `{Path}` and `{Path[i]}`
    #[default]
    Brace,
}

impl Dialect {
    /// Pattern matching one placeholder. Group 1 is the path, group 2 the optional index.
    pub fn pattern(self) -> &'static Regex {
        match self {
            Dialect::Angle => &*ANGLE_RE,
            Dialect::Brace => &*BRACE_RE,
        }
    }
}

/// A parsed placeholder: dotted path plus optional character index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderToken {
    pub path: String,
    pub index: Option<usize>,
}

impl PlaceholderToken {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            index: None,
        }
    }

    /// Parses a token from a regex match produced by `Dialect::pattern`.
    pub fn from_captures(caps: &regex::Captures<'_>) -> Option<Self> {
        let path = caps.get(1)?.as_str().to_string();
        let index = match caps.get(2) {
            // Digits too long for usize can never be in range.
            Some(m) => Some(m.as_str().parse::<usize>().unwrap_or(usize::MAX)),
            None => None,
        };
        Some(Self { path, index })
    }

    /// Parses a complete token such as `{Name[2]}` or `<<Staff.Grade>>`.
    pub fn parse(raw: &str, dialect: Dialect) -> Option<Self> {
        let caps = dialect.pattern().captures(raw)?;
        if caps.get(0)?.as_str().len() != raw.len() {
            return None;
        }
        Self::from_captures(&caps)
    }

    /// Whether the path sits under `prefix` (`Education.Year` is under `Education`).
    pub fn is_under(&self, prefix: &str) -> bool {
        self.path
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            && self.path[prefix.len()..].starts_with('.')
    }

    /// Renders the token back in `dialect`.
    pub fn render(&self, dialect: Dialect) -> String {
        match (dialect, self.index) {
            (Dialect::Angle, _) => format!("<<{}>>", self.path),
            (Dialect::Brace, None) => format!("{{{}}}", self.path),
            (Dialect::Brace, Some(i)) => format!("{{{}[{}]}}", self.path, i),
        }
    }
}

/// Every placeholder of `dialect` appearing in `text`.
pub fn scan(text: &str, dialect: Dialect) -> Vec<PlaceholderToken> {
    dialect
        .pattern()
        .captures_iter(text)
        .filter_map(|caps| PlaceholderToken::from_captures(&caps))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_brace_simple_and_dotted() {
        assert_eq!(
            PlaceholderToken::parse("{FirstName}", Dialect::Brace),
            Some(PlaceholderToken::new("FirstName"))
        );
        assert_eq!(
            PlaceholderToken::parse("{Education.Year}", Dialect::Brace),
            Some(PlaceholderToken::new("Education.Year"))
        );
    }

    #[test]
    fn test_parse_brace_indexed() {
        let token = PlaceholderToken::parse("{LastName[0]}", Dialect::Brace).unwrap();
        assert_eq!(token.path, "LastName");
        assert_eq!(token.index, Some(0));
        assert_eq!(token.render(Dialect::Brace), "{LastName[0]}");
    }

    #[test]
    fn test_parse_angle() {
        let token = PlaceholderToken::parse("<<Staff.Grade>>", Dialect::Angle).unwrap();
        assert_eq!(token.path, "Staff.Grade");
        assert_eq!(token.render(Dialect::Angle), "<<Staff.Grade>>");
    }

    #[test]
    fn test_parse_rejects_partial_and_foreign_syntax() {
        assert!(PlaceholderToken::parse("x {A}", Dialect::Brace).is_none());
        assert!(PlaceholderToken::parse("[Educations]", Dialect::Brace).is_none());
        assert!(PlaceholderToken::parse("{1abc}", Dialect::Brace).is_none());
        assert!(PlaceholderToken::parse("{A}", Dialect::Angle).is_none());
    }

    #[test]
    fn test_scan_finds_all_tokens() {
        let tokens = scan("{A} and {B.C[3]} but not <<D>>", Dialect::Brace);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].path, "B.C");
        assert_eq!(tokens[1].index, Some(3));
    }

    #[test]
    fn test_is_under_prefix() {
        let token = PlaceholderToken::new("education.Year");
        assert!(token.is_under("Education"));
        assert!(!PlaceholderToken::new("Educations.Year").is_under("Education"));
        assert!(!PlaceholderToken::new("Education").is_under("Education"));
    }

    #[test]
    fn test_huge_index_saturates() {
        let token = PlaceholderToken::parse("{A[99999999999999999999999]}", Dialect::Brace).unwrap();
        assert_eq!(token.index, Some(usize::MAX));
    }
}
