//! Flat, case-insensitive name → value table used to resolve placeholders.

use std::borrow::Cow;
use std::collections::HashMap;

/// A resolved leaf value. Lists are joined only when a placeholder asks for them.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldText {
    Text(String),
    List(Vec<String>),
}

impl FieldText {
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            FieldText::Text(s) => Cow::Borrowed(s),
            FieldText::List(items) => Cow::Owned(items.join(", ")),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    path: String,
    value: FieldText,
}

/// Mapping from dotted field path (`Staff.Grade`) to its value.
///
/// Built fresh for every generation call; never shared between calls.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    entries: HashMap<String, Entry>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `path`. Later inserts win, matching a case-insensitive key.
    pub fn insert(&mut self, path: impl Into<String>, value: FieldText) {
        let path = path.into();
        self.entries.insert(path.to_lowercase(), Entry { path, value });
    }

    pub fn insert_text(&mut self, path: impl Into<String>, value: impl Into<String>) {
        self.insert(path, FieldText::Text(value.into()));
    }

    pub fn get(&self, path: &str) -> Option<&FieldText> {
        self.entries.get(&path.to_lowercase()).map(|e| &e.value)
    }

    /// Rendered value for `path`, or `None` when the path is unknown.
    pub fn lookup(&self, path: &str) -> Option<Cow<'_, str>> {
        self.get(path).map(FieldText::render)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(&path.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Rewrites a multi-line text value as a bullet list: blank lines are dropped,
    /// lines are trimmed and a leading `-` becomes `•`. Returns whether `path` held
    /// a text value.
    pub fn bulletize(&mut self, path: &str) -> bool {
        let Some(Entry {
            path: original,
            value: FieldText::Text(text),
        }) = self.entries.get(&path.to_lowercase())
        else {
            return false;
        };
        let original = original.clone();
        let bulleted = bullet_lines(text);
        self.insert_text(original, bulleted);
        true
    }

    /// Blanks every text value equal to `literal` and drops matching list elements.
    /// Returns how many values changed.
    pub fn blank_matching(&mut self, literal: &str) -> usize {
        let mut changed = 0;
        for entry in self.entries.values_mut() {
            match &mut entry.value {
                FieldText::Text(text) if text.trim() == literal => {
                    text.clear();
                    changed += 1;
                }
                FieldText::List(items) => {
                    let before = items.len();
                    items.retain(|item| item.trim() != literal);
                    if items.len() != before {
                        changed += 1;
                    }
                }
                FieldText::Text(_) => {}
            }
        }
        changed
    }
}

fn bullet_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.strip_prefix('-') {
            Some(rest) => format!("•  {}", rest.trim_start()),
            None => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut map = FieldMap::new();
        map.insert_text("Staff.Grade", "Senior");
        assert_eq!(map.lookup("staff.grade").as_deref(), Some("Senior"));
        assert_eq!(map.lookup("STAFF.GRADE").as_deref(), Some("Senior"));
        assert!(map.lookup("Staff").is_none());
        assert!(map.contains("STAFF.grade"));
    }

    #[test]
    fn test_list_renders_comma_joined() {
        let list = FieldText::List(vec!["Rust".into(), "Go".into(), "SQL".into()]);
        assert_eq!(list.render(), "Rust, Go, SQL");
        assert_eq!(FieldText::List(vec![]).render(), "");
    }

    #[test]
    fn test_insert_overwrites_case_insensitively() {
        let mut map = FieldMap::new();
        map.insert_text("Name", "a");
        map.insert_text("name", "b");
        map.insert_text("Other", "c");
        assert_eq!(map.len(), 2);
        assert_eq!(map.lookup("NAME").as_deref(), Some("b"));
    }

    #[test]
    fn test_bulletize_marks_dash_lines() {
        let mut map = FieldMap::new();
        map.insert_text("Work.Tasks", "Что сделал:\r\n- ревью кода\n\n  -миграция на Kafka  \nотчёты");
        map.insert("Work.Tools", FieldText::List(vec!["Rust".into()]));

        assert!(map.bulletize("work.tasks"));
        assert_eq!(
            map.lookup("Work.Tasks").as_deref(),
            Some("Что сделал:\n•  ревью кода\n•  миграция на Kafka\nотчёты")
        );
        assert!(!map.bulletize("Work.Tools"));
        assert!(!map.bulletize("Work.Missing"));
    }

    #[test]
    fn test_blank_matching_placeholder_value() {
        let mut map = FieldMap::new();
        map.insert_text("Location", "Неизвестно");
        map.insert_text("Stack", "Rust");
        map.insert("Languages", FieldText::List(vec!["Неизвестно".into(), "English".into()]));
        assert_eq!(map.blank_matching("Неизвестно"), 2);
        assert_eq!(map.lookup("Location").as_deref(), Some(""));
        assert_eq!(map.lookup("Stack").as_deref(), Some("Rust"));
        assert_eq!(map.lookup("Languages").as_deref(), Some("English"));
    }
}
