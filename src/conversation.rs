use crate::context::{AttachedFile, ChatContext, Turn};
use crate::prompt;

/// How many prior turns are replayed to the model with each request.
///
/// Older turns are dropped. The window counts messages, not tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow(pub usize);

impl HistoryWindow {
    pub const DEFAULT: HistoryWindow = HistoryWindow(8);

    pub fn apply<'a>(&self, history: &'a [Turn]) -> &'a [Turn] {
        let skip = history.len().saturating_sub(self.0);
        &history[skip..]
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The user turn text: the message, then inlined contents of attached files.
pub fn user_turn_content(message: &str, attached_files: &[AttachedFile]) -> String {
    let mut out = message.to_string();
    if attached_files.is_empty() {
        return out;
    }

    out.push_str("\n\n--- Attached Files ---\n");
    for file in attached_files {
        // Nothing loaded, nothing to show.
        let Some(content) = file.content.as_deref().filter(|c| !c.is_empty()) else {
            continue;
        };
        out.push_str(&format!("\n**{}:**\n```\n{}\n```\n", file.name, content));
    }
    out
}

/// Exact message sequence sent to the completion API:
/// system turn, the windowed history, then the new user turn.
pub fn assemble(
    message: &str,
    attached_files: &[AttachedFile],
    context: &ChatContext,
    history: &[Turn],
    window: HistoryWindow,
) -> Vec<Turn> {
    let recent = window.apply(history);
    let mut turns = Vec::with_capacity(recent.len() + 2);
    turns.push(Turn::system(prompt::build_system_prompt(context, attached_files)));
    turns.extend_from_slice(recent);
    turns.push(Turn::user(user_turn_content(message, attached_files)));
    turns
}

/// Session transcript. Only completed exchanges are recorded.
#[derive(Debug, Clone, Default)]
pub struct Transcript(Vec<Turn>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.0.push(Turn::user(user));
        self.0.push(Turn::assistant(assistant));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{FileKind, Role};

    fn text_file(name: &str, content: Option<&str>) -> AttachedFile {
        AttachedFile {
            name: name.to_string(),
            path: format!("/w/{name}"),
            kind: FileKind::Text,
            content: content.map(str::to_string),
            size: None,
        }
    }

    fn history(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("q{i}"))
                } else {
                    Turn::assistant(format!("a{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn no_attachments_leaves_message_untouched() {
        assert_eq!(user_turn_content("hi", &[]), "hi");
    }

    #[test]
    fn attachment_is_inlined_in_fenced_block() {
        let got = user_turn_content("hi", &[text_file("a.txt", Some("X"))]);
        assert_eq!(got, "hi\n\n--- Attached Files ---\n\n**a.txt:**\n```\nX\n```\n");
    }

    #[test]
    fn attachments_without_content_are_skipped() {
        let got = user_turn_content(
            "hi",
            &[text_file("empty.bin", None), text_file("b.rs", Some("fn b() {}"))],
        );
        assert_eq!(got, "hi\n\n--- Attached Files ---\n\n**b.rs:**\n```\nfn b() {}\n```\n");
        assert!(!got.contains("empty.bin"));
    }

    #[test]
    fn empty_file_content_gets_no_block() {
        let got = user_turn_content("hi", &[text_file("empty.txt", Some(""))]);
        assert_eq!(got, "hi\n\n--- Attached Files ---\n");
    }

    #[test]
    fn ten_prior_turns_keep_the_last_eight() {
        let h = history(10);
        let turns = assemble("next", &[], &ChatContext::default(), &h, HistoryWindow::DEFAULT);
        assert_eq!(turns.len(), 10);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(&turns[1..9], &h[2..]);
        assert_eq!(turns[9], Turn::user("next"));
    }

    #[test]
    fn short_history_is_kept_whole() {
        let h = history(3);
        let turns = assemble("x", &[], &ChatContext::default(), &h, HistoryWindow::DEFAULT);
        assert_eq!(turns.len(), 5);
        assert_eq!(&turns[1..4], &h[..]);
    }

    #[test]
    fn window_is_configurable() {
        let h = history(6);
        let turns = assemble("x", &[], &ChatContext::default(), &h, HistoryWindow(2));
        assert_eq!(&turns[1..3], &h[4..]);

        let turns = assemble("x", &[], &ChatContext::default(), &h, HistoryWindow(0));
        assert_eq!(turns.len(), 2);
    }

    #[test]
    fn system_turn_comes_from_prompt_builder() {
        let ctx = ChatContext {
            current_file: Some("lib.rs".into()),
            ..Default::default()
        };
        let files = [text_file("a.txt", Some("X"))];
        let turns = assemble("hi", &files, &ctx, &[], HistoryWindow::DEFAULT);
        assert_eq!(turns[0].content, prompt::build_system_prompt(&ctx, &files));
        assert_eq!(turns[1].role, Role::User);
        assert!(turns[1].content.ends_with("```\nX\n```\n"));
    }

    #[test]
    fn transcript_records_exchanges_in_order() {
        let mut t = Transcript::new();
        assert!(t.is_empty());
        t.push_exchange("q", "a");
        t.push_exchange("q2", "a2");
        assert_eq!(t.len(), 4);
        assert_eq!(t.turns()[2], Turn::user("q2"));
        assert_eq!(t.turns()[3].role, Role::Assistant);
    }
}
