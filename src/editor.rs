use crate::context::ChatContext;
use crate::workspace::{self, WorkspaceFile};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supplies the editing state a request is built from.
pub trait ContextSource {
    fn workspace_files(&self) -> anyhow::Result<Vec<WorkspaceFile>>;

    fn context(&self, workspace: &[WorkspaceFile]) -> ChatContext;
}

/// 1-based inclusive line range, written `START:END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl FromStr for LineRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s.split_once(':').unwrap_or((s, s));
        let start: usize = a.trim().parse().map_err(|_| format!("invalid start line: {a}"))?;
        let end: usize = b.trim().parse().map_err(|_| format!("invalid end line: {b}"))?;
        if start == 0 || end < start {
            return Err(format!("invalid line range: {s}"));
        }
        Ok(Self { start, end })
    }
}

/// Editor state as given on the command line.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub root: PathBuf,
    pub scan_limit: usize,
    pub current_file: Option<PathBuf>,
    pub language: Option<String>,
    pub selection: Option<LineRange>,
}

impl EditorState {
    pub fn new(root: impl Into<PathBuf>, scan_limit: usize) -> Self {
        Self {
            root: root.into(),
            scan_limit,
            current_file: None,
            language: None,
            selection: None,
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn display_name(&self, path: &Path) -> String {
        let full = self.resolve(path);
        full.strip_prefix(&self.root)
            .unwrap_or(&full)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn selected_code(&self, path: &Path, range: LineRange) -> Option<String> {
        let full = self.resolve(path);
        let text = match std::fs::read_to_string(&full) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(path = %full.display(), error = %e, "selection not loaded");
                return None;
            }
        };
        let lines: Vec<&str> = text
            .lines()
            .skip(range.start - 1)
            .take(range.end - range.start + 1)
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

impl ContextSource for EditorState {
    fn workspace_files(&self) -> anyhow::Result<Vec<WorkspaceFile>> {
        workspace::scan(&self.root, self.scan_limit)
    }

    fn context(&self, workspace: &[WorkspaceFile]) -> ChatContext {
        let current = self.current_file.as_deref();
        ChatContext {
            workspace_files: workspace::file_names(workspace),
            current_file: current.map(|p| self.display_name(p)),
            selected_code: current
                .zip(self.selection)
                .and_then(|(p, range)| self.selected_code(p, range)),
            language: self
                .language
                .clone()
                .or_else(|| current.and_then(|p| ChatContext::language_for_path(p))),
        }
    }
}
