//! `@name` file mentions in chat input.

use crate::workspace::{EntryKind, WorkspaceFile};

pub const MAX_SUGGESTIONS: usize = 10;

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Partial file name being typed after the last `@` before `cursor`.
///
/// `Some("")` right after typing `@`. `cursor` is a byte offset and is
/// clamped to the input.
pub fn active_mention(input: &str, cursor: usize) -> Option<&str> {
    let cursor = char_floor(input, cursor);
    let before = &input[..cursor];
    let at = before.rfind('@')?;
    let partial = &before[at + 1..];
    partial.chars().all(is_name_char).then_some(partial)
}

/// Workspace files whose name contains `query`, ignoring case.
pub fn suggestions<'a>(files: &'a [WorkspaceFile], query: &str) -> Vec<&'a WorkspaceFile> {
    let query = query.to_lowercase();
    files
        .iter()
        .filter(|f| f.kind == EntryKind::File)
        .filter(|f| f.name.to_lowercase().contains(&query))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Replace the active mention with `@<name> `. Returns the new input and cursor.
pub fn complete(input: &str, cursor: usize, file: &WorkspaceFile) -> (String, usize) {
    let cursor = char_floor(input, cursor);
    let Some(at) = input[..cursor].rfind('@') else {
        return (input.to_string(), cursor);
    };
    let inserted = format!("@{} ", file.name);
    let new_cursor = at + inserted.len();
    let out = format!("{}{}{}", &input[..at], inserted, &input[cursor..]);
    (out, new_cursor)
}

/// Largest char boundary at or before `cursor`.
fn char_floor(input: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(input.len());
    while !input.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

/// Every `@token` in a sent message, in order, without duplicates.
pub fn mentioned_names(text: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for (i, _) in text.match_indices('@') {
        let rest = &text[i + 1..];
        let end = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
        // Trailing dots are sentence punctuation, not part of the name.
        let name = rest[..end].trim_end_matches('.');
        if !name.is_empty() && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> WorkspaceFile {
        WorkspaceFile {
            name: name.to_string(),
            path: format!("/w/{name}"),
            relative_path: name.to_string(),
            kind: EntryKind::File,
        }
    }

    #[test]
    fn mention_detection() {
        assert_eq!(active_mention("look at @", 9), Some(""));
        assert_eq!(active_mention("look at @ma", 11), Some("ma"));
        assert_eq!(active_mention("look at @main.rs", 16), Some("main.rs"));
        assert_eq!(active_mention("look at @main.rs now", 20), None);
        assert_eq!(active_mention("no mention", 5), None);
        assert_eq!(active_mention("@abc", 99), Some("abc"));
    }

    #[test]
    fn cursor_inside_multibyte_char_is_clamped() {
        assert_eq!(active_mention("@é", 2), Some(""));
    }

    #[test]
    fn suggestions_filter_and_cap() {
        let mut files: Vec<_> = (0..15).map(|i| file(&format!("mod{i}.rs"))).collect();
        files.push(file("README.md"));
        files.push(WorkspaceFile {
            kind: EntryKind::Directory,
            ..file("readme-dir")
        });

        assert_eq!(suggestions(&files, "").len(), MAX_SUGGESTIONS);
        let hits = suggestions(&files, "readme");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "README.md");
    }

    #[test]
    fn complete_replaces_partial_mention() {
        let (out, cursor) = complete("explain @ma please", 11, &file("main.rs"));
        assert_eq!(out, "explain @main.rs  please");
        assert_eq!(cursor, "explain @main.rs ".len());
    }

    #[test]
    fn complete_handles_cursor_inside_multibyte_char() {
        let (out, cursor) = complete("@é", 2, &file("main.rs"));
        assert_eq!(out, "@main.rs é");
        assert_eq!(cursor, "@main.rs ".len());
    }

    #[test]
    fn names_from_sent_message() {
        assert_eq!(
            mentioned_names("compare @a.rs and @b_c.rs, then @a.rs."),
            ["a.rs", "b_c.rs"]
        );
        assert!(mentioned_names("mail me at x @ y").is_empty());
    }
}
