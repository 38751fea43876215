//! Line-Level Diff
//!
//! Positional comparison of the current document against proposed text.
//! Lines are paired by index and never realigned, so an inserted line marks
//! every following line as changed. This is the comparison the review
//! workflow renders and decides on.

use serde::{Deserialize, Serialize};

/// Change state of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineKind {
    Added,
    Removed,
    Unchanged,
}

/// One line of a computed diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    pub text: String,
}

/// Ordered line comparison between two texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    pub lines: Vec<DiffLine>,
}

impl Diff {
    /// Compare `original` to `proposed` by line position. Equal pairs yield
    /// one `Unchanged`; differing pairs yield the removed original line
    /// followed by the added proposed line. Leftover lines on either side
    /// come out as `Removed` or `Added` in input order.
    pub fn compute(original: &str, proposed: &str) -> Self {
        let old: Vec<&str> = original.lines().collect();
        let new: Vec<&str> = proposed.lines().collect();
        let mut lines = Vec::with_capacity(old.len().max(new.len()));

        for i in 0..old.len().max(new.len()) {
            match (old.get(i), new.get(i)) {
                (Some(o), Some(n)) if o == n => lines.push(DiffLine {
                    kind: DiffLineKind::Unchanged,
                    text: o.to_string(),
                }),
                (o, n) => {
                    if let Some(o) = o {
                        lines.push(DiffLine {
                            kind: DiffLineKind::Removed,
                            text: o.to_string(),
                        });
                    }
                    if let Some(n) = n {
                        lines.push(DiffLine {
                            kind: DiffLineKind::Added,
                            text: n.to_string(),
                        });
                    }
                }
            }
        }

        Diff { lines }
    }

    pub fn added(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.kind == DiffLineKind::Added)
            .count()
    }

    pub fn removed(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.kind == DiffLineKind::Removed)
            .count()
    }

    pub fn has_changes(&self) -> bool {
        self.lines.iter().any(|l| l.kind != DiffLineKind::Unchanged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_inputs_all_unchanged() {
        let text = "fn main() {\n    println!(\"hi\");\n}";
        let diff = Diff::compute(text, text);

        assert_eq!(diff.lines.len(), 3);
        assert!(diff.lines.iter().all(|l| l.kind == DiffLineKind::Unchanged));
        assert!(!diff.has_changes());
        assert_eq!(diff.added(), 0);
        assert_eq!(diff.removed(), 0);
    }

    #[test]
    fn test_empty_original_all_added() {
        let diff = Diff::compute("", "a\nb\nc");

        assert_eq!(diff.added(), 3);
        assert_eq!(diff.removed(), 0);
        assert_eq!(
            diff.lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_both_empty_is_empty() {
        let diff = Diff::compute("", "");
        assert!(diff.lines.is_empty());
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_changed_line_emits_removed_then_added() {
        let diff = Diff::compute("a\nb\nc", "a\nx\nc");

        assert_eq!(diff.lines[0].kind, DiffLineKind::Unchanged);
        assert_eq!(diff.lines[1].kind, DiffLineKind::Removed);
        assert_eq!(diff.lines[1].text, "b");
        assert_eq!(diff.lines[2].kind, DiffLineKind::Added);
        assert_eq!(diff.lines[2].text, "x");
        assert_eq!(diff.lines[3].kind, DiffLineKind::Unchanged);
    }

    #[test]
    fn test_shorter_proposal_marks_tail_removed() {
        let diff = Diff::compute("a\nb\nc", "a");

        assert_eq!(diff.added(), 0);
        assert_eq!(diff.removed(), 2);
        assert_eq!(diff.lines[0].kind, DiffLineKind::Unchanged);
    }

    #[test]
    fn test_insertion_shifts_every_following_line() {
        // Positional pairing: one inserted line misaligns the rest.
        let diff = Diff::compute("a\nb", "new\na\nb");

        assert!(diff
            .lines
            .iter()
            .all(|l| l.kind != DiffLineKind::Unchanged));
        assert_eq!(diff.added(), 3);
        assert_eq!(diff.removed(), 2);
    }
}
