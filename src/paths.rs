use anyhow::Context;
use std::env;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "code-chat";

fn home_dir() -> anyhow::Result<PathBuf> {
    // HOME on Unix, USERPROFILE on Windows.
    let home = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home))
}

fn ensure_dir(path: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))?;
    Ok(path.to_path_buf())
}

fn app_home() -> Option<PathBuf> {
    env::var_os("CODE_CHAT_HOME").map(PathBuf::from)
}

pub fn config_dir() -> anyhow::Result<PathBuf> {
    if let Some(base) = app_home() {
        return ensure_dir(&base.join("config"));
    }

    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return ensure_dir(&xdg.join(APP_DIR));
    }

    ensure_dir(&home_dir()?.join(".config").join(APP_DIR))
}

pub fn state_dir() -> anyhow::Result<PathBuf> {
    if let Some(base) = app_home() {
        return ensure_dir(&base.join("state"));
    }

    if let Some(xdg) = env::var_os("XDG_STATE_HOME").map(PathBuf::from) {
        return ensure_dir(&xdg.join(APP_DIR));
    }

    ensure_dir(&home_dir()?.join(".local").join("state").join(APP_DIR))
}

/// JSON file holding the saved Groq API key, kept in the state dir apart
/// from `config.toml`.
pub fn credentials_path() -> anyhow::Result<PathBuf> {
    Ok(state_dir()?.join("credentials.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_home_splits_config_and_state() {
        let home = tempfile::tempdir().unwrap();
        env::set_var("CODE_CHAT_HOME", home.path());

        let config = config_dir().unwrap();
        let creds = credentials_path().unwrap();
        env::remove_var("CODE_CHAT_HOME");

        assert_eq!(config, home.path().join("config"));
        assert_eq!(creds, home.path().join("state").join("credentials.json"));
        assert!(config.is_dir());
        assert!(creds.parent().unwrap().is_dir());
    }
}
