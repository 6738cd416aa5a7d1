use crate::editor::LineRange;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Code chat assistant backed by Groq
#[derive(Debug, Parser)]
#[command(name = "code-chat")]
#[command(version)]
#[command(about = "Chat with an LLM about the code in your workspace", long_about = None)]
pub struct Args {
    /// Model id (see `code-chat models`)
    #[arg(short = 'm', long = "model", global = true)]
    pub model: Option<String>,

    /// Provider (default: config/provider or "groq")
    #[arg(long = "provider", global = true)]
    pub provider: Option<String>,

    /// Workspace root (default: current directory)
    #[arg(short = 'w', long = "workspace", value_name = "DIR", global = true)]
    pub workspace: Option<PathBuf>,

    /// File currently open in the editor
    #[arg(short = 'f', long = "file", value_name = "PATH", global = true)]
    pub file: Option<PathBuf>,

    /// Language of the current file (inferred from its extension if omitted)
    #[arg(long = "language", value_name = "LANG", global = true)]
    pub language: Option<String>,

    /// Selected lines of the current file, START:END (1-based, inclusive)
    #[arg(long = "selection", value_name = "START:END", requires = "file", global = true)]
    pub selection: Option<LineRange>,

    /// Attach a file to the prompt (repeatable)
    #[arg(short = 'a', long = "attach", value_name = "PATH")]
    pub attach: Vec<PathBuf>,

    #[command(subcommand)]
    pub cmd: Option<Command>,

    /// Prompt text (positional) (used when no subcommand is given)
    #[arg(value_name = "PROMPT")]
    pub prompt: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save the Groq API key (reads stdin when KEY is omitted)
    ConfigureKey {
        /// The API key (gsk_...)
        key: Option<String>,
    },

    /// List available models
    Models,

    /// Speak the UI message protocol as JSON lines on stdin/stdout
    Bridge,

    /// Run an interactive terminal chat UI
    #[cfg(feature = "tui")]
    Tui,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_prompt_with_context_flags() {
        let args = Args::try_parse_from([
            "code-chat",
            "--file",
            "src/main.rs",
            "--selection",
            "3:9",
            "-a",
            "Cargo.toml",
            "explain",
            "this",
        ])
        .unwrap();
        assert!(args.cmd.is_none());
        assert_eq!(args.prompt, ["explain", "this"]);
        assert_eq!(args.selection, Some(LineRange { start: 3, end: 9 }));
        assert_eq!(args.attach, [PathBuf::from("Cargo.toml")]);
    }

    #[test]
    fn selection_requires_file() {
        assert!(Args::try_parse_from(["code-chat", "--selection", "1:2", "hi"]).is_err());
    }

    #[test]
    fn configure_key_subcommand() {
        let args = Args::try_parse_from(["code-chat", "configure-key", "gsk_x"]).unwrap();
        match args.cmd {
            Some(Command::ConfigureKey { key }) => assert_eq!(key.as_deref(), Some("gsk_x")),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
