use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Text,
    Image,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg"];

/// A file the user referenced as extra context for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedFile {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl AttachedFile {
    pub fn kind_for_name(name: &str) -> FileKind {
        let ext = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match ext {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => FileKind::Image,
            _ => FileKind::Text,
        }
    }

    /// Read a file from disk. Image and non-UTF-8 content is left unloaded.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path)
            .with_context(|| format!("failed to stat attachment: {}", path.display()))?;
        if !meta.is_file() {
            anyhow::bail!("attachment is not a file: {}", path.display());
        }

        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let kind = Self::kind_for_name(&name);

        let content = match kind {
            FileKind::Image => None,
            FileKind::Text => match std::fs::read_to_string(path) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::debug!(
                        path = %path.display(),
                        error = %e,
                        "attachment content not loaded"
                    );
                    None
                }
            },
        };

        Ok(Self {
            name,
            path: path.display().to_string(),
            kind,
            content,
            size: Some(meta.len()),
        })
    }
}

/// Editing state the prompt is built from. Rebuilt for every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatContext {
    pub workspace_files: Vec<String>,
    pub current_file: Option<String>,
    pub selected_code: Option<String>,
    pub language: Option<String>,
}

impl ChatContext {
    pub fn language_for_path(path: impl AsRef<Path>) -> Option<String> {
        let ext = path.as_ref().extension()?.to_string_lossy().to_ascii_lowercase();
        let lang = match ext.as_str() {
            "rs" => "rust",
            "ts" | "tsx" => "typescript",
            "js" | "jsx" | "mjs" | "cjs" => "javascript",
            "py" => "python",
            "go" => "go",
            "java" => "java",
            "kt" | "kts" => "kotlin",
            "c" | "h" => "c",
            "cc" | "cpp" | "cxx" | "hpp" => "cpp",
            "cs" => "csharp",
            "rb" => "ruby",
            "php" => "php",
            "swift" => "swift",
            "sh" | "bash" => "shellscript",
            "md" => "markdown",
            "json" => "json",
            "toml" => "toml",
            "yaml" | "yml" => "yaml",
            "html" | "htm" => "html",
            "css" => "css",
            "sql" => "sql",
            _ => return None,
        };
        Some(lang.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a conversation, as sent to the completion API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn image_kind_is_case_insensitive() {
        assert_eq!(AttachedFile::kind_for_name("logo.PNG"), FileKind::Image);
        assert_eq!(AttachedFile::kind_for_name("diagram.svg"), FileKind::Image);
        assert_eq!(AttachedFile::kind_for_name("main.rs"), FileKind::Text);
        assert_eq!(AttachedFile::kind_for_name("Makefile"), FileKind::Text);
    }

    #[test]
    fn load_reads_text_content_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello").unwrap();

        let f = AttachedFile::load(&path).unwrap();
        assert_eq!(f.name, "a.txt");
        assert_eq!(f.kind, FileKind::Text);
        assert_eq!(f.content.as_deref(), Some("hello"));
        assert_eq!(f.size, Some(5));
    }

    #[test]
    fn load_skips_image_and_binary_content() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("pic.png");
        std::fs::write(&img, [0x89, b'P', b'N', b'G']).unwrap();
        let f = AttachedFile::load(&img).unwrap();
        assert_eq!(f.kind, FileKind::Image);
        assert!(f.content.is_none());

        let bin = dir.path().join("blob.dat");
        let mut file = std::fs::File::create(&bin).unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x80]).unwrap();
        let f = AttachedFile::load(&bin).unwrap();
        assert_eq!(f.kind, FileKind::Text);
        assert!(f.content.is_none());
    }

    #[test]
    fn load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AttachedFile::load(dir.path().join("nope.rs")).is_err());
        assert!(AttachedFile::load(dir.path()).is_err());
    }

    #[test]
    fn attachment_json_uses_ui_field_names() {
        let json = r#"{"name":"a.txt","path":"/w/a.txt","type":"text","content":"X"}"#;
        let f: AttachedFile = serde_json::from_str(json).unwrap();
        assert_eq!(f.kind, FileKind::Text);
        assert_eq!(f.size, None);

        let back = serde_json::to_value(&f).unwrap();
        assert_eq!(back["type"], "text");
        assert!(back.get("size").is_none());
    }

    #[test]
    fn language_from_extension() {
        assert_eq!(ChatContext::language_for_path("src/main.rs").as_deref(), Some("rust"));
        assert_eq!(ChatContext::language_for_path("App.TSX").as_deref(), Some("typescript"));
        assert_eq!(ChatContext::language_for_path("README"), None);
    }
}
