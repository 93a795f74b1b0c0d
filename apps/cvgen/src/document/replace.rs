//! Formatting-preserving text replacement inside a paragraph.
//!
//! Word processors split text into runs at arbitrary points (spell-check marks,
//! revision ids, a bold letter), so a placeholder such as `{FirstName}` may be
//! spread over several runs. Matching is done on the concatenated paragraph
//! text; the replacement is written into the run where the match starts and the
//! matched remainder is cut out of the following runs.

use std::ops::Range;

use regex::{Captures, Regex};

use crate::document::model::{Paragraph, Run};

impl Paragraph {
    /// Replaces the byte range `range` of `self.text()` with `replacement`.
    ///
    /// The replacement inherits the formatting of the run containing `range.start`.
    /// Runs emptied by the cut are dropped.
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &str) {
        let mut offset = 0;
        let mut inserted = false;

        for run in self.runs.iter_mut() {
            let run_start = offset;
            let run_end = offset + run.text.len();
            offset = run_end;

            if run_end <= range.start {
                continue;
            }
            if run_start >= range.end && inserted {
                break;
            }

            let local_start = range.start.saturating_sub(run_start).min(run.text.len());
            let local_end = range.end.saturating_sub(run_start).min(run.text.len());

            if !inserted {
                run.text.replace_range(local_start..local_end, replacement);
                inserted = true;
            } else {
                run.text.replace_range(..local_end, "");
            }
        }

        if !inserted {
            // Empty paragraph and empty range at position 0.
            self.runs.push(Run::new(replacement));
        }

        self.runs.retain(|run| !run.text.is_empty());
    }

    /// Replaces every occurrence of `search` and returns how many were replaced.
    pub fn replace_text(&mut self, search: &str, replacement: &str) -> usize {
        if search.is_empty() {
            return 0;
        }
        let text = self.text();
        let ranges: Vec<Range<usize>> = text
            .match_indices(search)
            .map(|(start, m)| start..start + m.len())
            .collect();

        // Back to front so earlier offsets stay valid.
        for range in ranges.iter().rev() {
            self.replace_range(range.clone(), replacement);
        }
        ranges.len()
    }

    /// Replaces every match of `pattern` for which `resolve` returns `Some`.
    /// Matches resolved to `None` are left as they are. Returns the replacement count.
    pub fn replace_matches<F>(&mut self, pattern: &Regex, mut resolve: F) -> usize
    where
        F: FnMut(&Captures<'_>) -> Option<String>,
    {
        let text = self.text();
        let edits: Vec<(Range<usize>, String)> = pattern
            .captures_iter(&text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                resolve(&caps).map(|value| (whole.range(), value))
            })
            .collect();

        for (range, value) in edits.iter().rev() {
            self.replace_range(range.clone(), value);
        }
        edits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::{Run, RunFormatting};

    fn bold() -> RunFormatting {
        RunFormatting {
            bold: true,
            ..RunFormatting::default()
        }
    }

    #[test]
    fn test_replace_within_single_run() {
        let mut p = Paragraph::from_text("Name: {FirstName}!");
        assert_eq!(p.replace_text("{FirstName}", "Ivan"), 1);
        assert_eq!(p.text(), "Name: Ivan!");
        assert_eq!(p.runs.len(), 1);
    }

    #[test]
    fn test_replace_across_runs_keeps_start_run_formatting() {
        let mut p = Paragraph::with_runs(vec![
            Run::new("Hi "),
            Run::formatted("{First", bold()),
            Run::new("Name} and bye"),
        ]);
        p.replace_text("{FirstName}", "Olga");

        assert_eq!(p.text(), "Hi Olga and bye");
        assert_eq!(p.runs.len(), 3);
        assert_eq!(p.runs[1].text, "Olga");
        assert!(p.runs[1].formatting.bold);
        assert_eq!(p.runs[2].text, " and bye");
    }

    #[test]
    fn test_replace_with_empty_drops_empty_runs() {
        let mut p = Paragraph::with_runs(vec![Run::new("<<Con"), Run::new("tacts>>")]);
        p.replace_text("<<Contacts>>", "");
        assert_eq!(p.text(), "");
        assert!(p.runs.is_empty());
    }

    #[test]
    fn test_replace_multiple_occurrences() {
        let mut p = Paragraph::from_text("{A} + {A} = 2{A}");
        assert_eq!(p.replace_text("{A}", "x"), 3);
        assert_eq!(p.text(), "x + x = 2x");
    }

    #[test]
    fn test_replace_matches_skips_unresolved() {
        let re = Regex::new(r"\{(\w+)\}").unwrap();
        let mut p = Paragraph::from_text("{Known} {Unknown}");
        let n = p.replace_matches(&re, |caps| (&caps[1] == "Known").then(|| "yes".to_string()));
        assert_eq!(n, 1);
        assert_eq!(p.text(), "yes {Unknown}");
    }

    #[test]
    fn test_replace_handles_multibyte_text() {
        let mut p = Paragraph::with_runs(vec![Run::new("Навыки: {Sk"), Run::new("ills}")]);
        p.replace_text("{Skills}", "Rust, Go");
        assert_eq!(p.text(), "Навыки: Rust, Go");
    }
}
