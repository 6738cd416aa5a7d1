#![cfg(feature = "tui")]

use crate::app::HostOrchestrator;
use crate::context::AttachedFile;
use crate::markdown;
use crate::mention;
use crate::orchestrator::{self, UiEvent, UiRequest};
use crate::workspace::WorkspaceFile;
use anyhow::Context;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const WELCOME: &str = "Ask about your code. Type @ to attach a workspace file.
Commands: /quit, /clear, /model <id>, /key <api key>, /detach [name]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRole {
    System,
    User,
    Assistant,
    Thinking,
    Error,
}

#[derive(Debug, Clone)]
struct ChatLine {
    role: LineRole,
    text: String,
}

/// Everything the chat screen shows, independent of the terminal.
struct ChatView {
    lines: Vec<ChatLine>,
    input: String,
    model: String,
    pending: bool,
    files: Vec<WorkspaceFile>,
    attached: Vec<AttachedFile>,
    selected: usize,
    suggestions_dismissed: bool,
}

impl ChatView {
    fn new(model: String) -> Self {
        Self {
            lines: vec![ChatLine {
                role: LineRole::System,
                text: WELCOME.to_string(),
            }],
            input: String::new(),
            model,
            pending: false,
            files: Vec::new(),
            attached: Vec::new(),
            selected: 0,
            suggestions_dismissed: false,
        }
    }

    fn system(&mut self, text: impl Into<String>) {
        self.lines.push(ChatLine {
            role: LineRole::System,
            text: text.into(),
        });
    }

    fn suggestions(&self) -> Vec<&WorkspaceFile> {
        if self.suggestions_dismissed {
            return Vec::new();
        }
        match mention::active_mention(&self.input, self.input.len()) {
            Some(query) => mention::suggestions(&self.files, query),
            None => Vec::new(),
        }
    }

    fn input_changed(&mut self) {
        self.selected = 0;
        self.suggestions_dismissed = false;
    }

    fn accept_suggestion(&mut self) -> bool {
        let Some(file) = self.suggestions().get(self.selected).map(|f| (*f).clone()) else {
            return false;
        };
        let (input, _) = mention::complete(&self.input, self.input.len(), &file);
        self.input = input;
        self.input_changed();
        if !self.attached.iter().any(|a| a.path == file.path) {
            self.attached.push(AttachedFile {
                kind: AttachedFile::kind_for_name(&file.name),
                name: file.name,
                path: file.path,
                content: None,
                size: None,
            });
        }
        true
    }

    /// Remove an attachment by name, or the last one when `name` is empty.
    fn detach(&mut self, name: &str) {
        let removed = if name.is_empty() {
            self.attached.pop()
        } else {
            self.attached
                .iter()
                .position(|f| f.name == name)
                .map(|i| self.attached.remove(i))
        };
        match removed {
            Some(f) => self.system(format!("detached: {}", f.name)),
            None => self.system("nothing to detach"),
        }
    }

    /// Returns a request for the orchestrator, or `Err(())` to quit.
    fn on_key(&mut self, key: KeyEvent) -> Result<Option<UiRequest>, ()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Err(());
        }

        let open = !self.suggestions().is_empty();
        match key.code {
            KeyCode::Esc if open => self.suggestions_dismissed = true,
            KeyCode::Esc => return Err(()),
            KeyCode::Up if open => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down if open => {
                let n = self.suggestions().len();
                self.selected = (self.selected + 1).min(n.saturating_sub(1));
            }
            KeyCode::Tab if open => {
                self.accept_suggestion();
            }
            KeyCode::Enter if open => {
                self.accept_suggestion();
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                self.input_changed();
            }
            KeyCode::Backspace => {
                self.input.pop();
                self.input_changed();
            }
            KeyCode::Enter => return self.submit(),
            _ => {}
        }
        Ok(None)
    }

    fn submit(&mut self) -> Result<Option<UiRequest>, ()> {
        let msg = self.input.trim().to_string();
        self.input.clear();
        self.input_changed();
        if msg.is_empty() {
            return Ok(None);
        }

        if msg == "/quit" {
            return Err(());
        }
        if msg == "/clear" {
            self.lines.clear();
            return Ok(None);
        }
        if let Some(rest) = msg.strip_prefix("/model ") {
            return Ok(Some(UiRequest::SetModel(rest.trim().to_string())));
        }
        if let Some(rest) = msg.strip_prefix("/key ") {
            return Ok(Some(UiRequest::SetApiKey(rest.trim().to_string())));
        }
        if msg == "/detach" {
            self.detach("");
            return Ok(None);
        }
        if let Some(rest) = msg.strip_prefix("/detach ") {
            self.detach(rest.trim());
            return Ok(None);
        }

        if self.pending {
            self.system("(request in progress; wait for the reply)");
            self.input = msg;
            return Ok(None);
        }

        let attached_files = std::mem::take(&mut self.attached);
        let mut text = msg.clone();
        if !attached_files.is_empty() {
            let names: Vec<_> = attached_files.iter().map(|f| f.name.as_str()).collect();
            text.push_str(&format!("\n[attached: {}]", names.join(", ")));
        }
        self.lines.push(ChatLine {
            role: LineRole::User,
            text,
        });
        self.pending = true;
        Ok(Some(UiRequest::SendMessage {
            content: msg,
            attached_files,
        }))
    }

    fn drop_thinking(&mut self) {
        self.lines.retain(|l| l.role != LineRole::Thinking);
    }

    fn on_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Ready => {}
            UiEvent::Thinking => self.lines.push(ChatLine {
                role: LineRole::Thinking,
                text: "Thinking...".to_string(),
            }),
            UiEvent::AddMessage(msg) => {
                self.drop_thinking();
                self.pending = false;
                self.lines.push(ChatLine {
                    role: LineRole::Assistant,
                    text: msg.content,
                });
            }
            UiEvent::Error(text) => {
                self.drop_thinking();
                self.pending = false;
                self.lines.push(ChatLine {
                    role: LineRole::Error,
                    text,
                });
            }
            UiEvent::WorkspaceFiles(files) => self.files = files,
            UiEvent::Info(text) => self.system(text),
            UiEvent::ModelChanged(model) => {
                self.system(format!("model set to: {model}"));
                self.model = model;
            }
        }
    }
}

pub async fn run_tui(
    orchestrator: HostOrchestrator,
    mut events: mpsc::UnboundedReceiver<UiEvent>,
) -> anyhow::Result<()> {
    let mut view = ChatView::new(orchestrator.model().to_string());

    let cancel = CancellationToken::new();
    let (req_tx, req_rx) = mpsc::unbounded_channel::<UiRequest>();
    orchestrator.ready();
    let _ = req_tx.send(UiRequest::GetWorkspaceFiles);
    let worker = tokio::spawn(orchestrator::serve(orchestrator, req_rx, cancel.clone()));

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let (ev_tx, mut ev_rx) = mpsc::unbounded_channel::<Event>();
    std::thread::spawn(move || {
        while let Ok(ev) = crossterm::event::read() {
            if ev_tx.send(ev).is_err() {
                break;
            }
        }
    });

    let mut ticker = tokio::time::interval(std::time::Duration::from_millis(33));

    let res = loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = draw(&mut terminal, &view) {
                    break Err(e);
                }
            }
            Some(ev) = ev_rx.recv() => {
                if let Event::Key(key) = ev {
                    match view.on_key(key) {
                        Ok(Some(req)) => {
                            if req_tx.send(req).is_err() {
                                break Err(anyhow::anyhow!("chat worker stopped"));
                            }
                        }
                        Ok(None) => {}
                        Err(()) => break Ok(()),
                    }
                }
            }
            Some(event) = events.recv() => view.on_event(event),
        }
    };

    // Closing the panel abandons any in-flight request.
    cancel.cancel();
    drop(req_tx);
    let _ = worker.await;

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    res
}

fn draw(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    view: &ChatView,
) -> anyhow::Result<()> {
    terminal.draw(|f| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(f.area());

        let mut text = Text::default();
        for l in &view.lines {
            let (label, style) = match l.role {
                LineRole::User => ("you", Style::default().add_modifier(Modifier::BOLD)),
                LineRole::Assistant => ("assistant", Style::default()),
                LineRole::Thinking => ("assistant", Style::default().add_modifier(Modifier::DIM)),
                LineRole::Error => ("error", Style::default().add_modifier(Modifier::BOLD)),
                LineRole::System => ("system", Style::default().add_modifier(Modifier::ITALIC)),
            };
            text.lines.push(Line::styled(format!("{label}: "), style));
            if l.role == LineRole::Assistant {
                text.lines.extend(markdown::render(&l.text));
            } else {
                text.lines.extend(markdown::plain(&l.text));
            }
            text.lines.push(Line::from(""));
        }

        // Keep the newest lines in view.
        let height = chunks[0].height.saturating_sub(2) as usize;
        let scroll = text.lines.len().saturating_sub(height) as u16;

        let chat_title = format!("code-chat (model: {})", view.model);
        let chat = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(chat_title))
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0));

        let title = if view.pending {
            "input (waiting for reply)".to_string()
        } else if view.attached.is_empty() {
            "input".to_string()
        } else {
            let names: Vec<_> = view.attached.iter().map(|f| f.name.as_str()).collect();
            format!("input (attached: {})", names.join(", "))
        };
        let input_w = Paragraph::new(view.input.clone())
            .block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(chat, chunks[0]);
        f.render_widget(input_w, chunks[1]);

        let suggestions = view.suggestions();
        if !suggestions.is_empty() {
            let h = suggestions.len() as u16 + 2;
            let area = Rect {
                x: chunks[1].x,
                y: chunks[1].y.saturating_sub(h),
                width: chunks[1].width.min(60),
                height: h,
            };
            let items: Vec<ListItem> = suggestions
                .iter()
                .map(|f| ListItem::new(f.relative_path.clone()))
                .collect();
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title("files"))
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
            let mut state = ListState::default();
            state.select(Some(view.selected));
            f.render_widget(Clear, area);
            f.render_stateful_widget(list, area, &mut state);
        }

        let x = chunks[1].x + 1 + view.input.chars().count() as u16;
        let y = chunks[1].y + 1;
        f.set_cursor_position((x.min(chunks[1].x + chunks[1].width.saturating_sub(2)), y));
    })?;
    Ok(())
}
