use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Environment variable that takes precedence over the stored key.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Host-side storage for the single API secret.
pub trait CredentialStore {
    fn get(&self) -> anyhow::Result<Option<String>>;
    fn set(&self, api_key: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsFile {
    #[serde(default)]
    groq_api_key: Option<String>,
}

/// Key persisted as JSON under the state dir.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    env_var: Option<&'static str>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_var: None,
        }
    }

    /// Read `var` before falling back to the file.
    pub fn with_env_override(mut self, var: &'static str) -> Self {
        self.env_var = Some(var);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> anyhow::Result<CredentialsFile> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CredentialsFile::default());
            }
            Err(e) => {
                return Err(anyhow!(e))
                    .with_context(|| format!("failed to read credentials: {}", self.path.display()))
            }
        };
        serde_json::from_slice(&bytes).context("failed to parse credentials JSON")
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> anyhow::Result<Option<String>> {
        if let Some(var) = self.env_var {
            if let Some(key) = std::env::var(var).ok().filter(|k| !k.is_empty()) {
                return Ok(Some(key));
            }
        }
        Ok(self.load()?.groq_api_key.filter(|k| !k.is_empty()))
    }

    fn set(&self, api_key: &str) -> anyhow::Result<()> {
        let mut file = self.load().unwrap_or_default();
        file.groq_api_key = Some(api_key.to_string());
        save_atomic(&self.path, &file)
    }
}

fn save_atomic(path: &Path, file: &CredentialsFile) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create credentials directory: {}", dir.display()))?;

    let tmp = tmp_path(path);
    let bytes = serde_json::to_vec_pretty(file).context("failed to serialize credentials")?;
    std::fs::write(&tmp, bytes)
        .with_context(|| format!("failed to write temp credentials: {}", tmp.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to restrict permissions: {}", tmp.display()))?;
    }

    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to move credentials into place: {}", path.display()))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "credentials.json".to_string());
    p.set_file_name(format!("{file}.tmp"));
    p
}

/// Process-local store; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore(Mutex<Option<String>>);

impl MemoryCredentialStore {
    pub fn new(api_key: Option<String>) -> Self {
        Self(Mutex::new(api_key))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> anyhow::Result<Option<String>> {
        let guard = self.0.lock().map_err(|_| anyhow!("credential store poisoned"))?;
        Ok(guard.clone().filter(|k| !k.is_empty()))
    }

    fn set(&self, api_key: &str) -> anyhow::Result<()> {
        let mut guard = self.0.lock().map_err(|_| anyhow!("credential store poisoned"))?;
        *guard = Some(api_key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_no_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn set_then_get_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("credentials.json");
        let store = FileCredentialStore::new(&path);
        store.set("gsk_abc").unwrap();

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.get().unwrap().as_deref(), Some("gsk_abc"));
        assert!(!tmp_path(&path).exists());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("groqApiKey"));
    }

    #[cfg(unix)]
    #[test]
    fn credentials_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        FileCredentialStore::new(&path).set("k").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FileCredentialStore::new(&path).get().is_err());
    }

    #[test]
    fn memory_store_treats_empty_as_absent() {
        let store = MemoryCredentialStore::new(Some(String::new()));
        assert_eq!(store.get().unwrap(), None);
        store.set("k").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("k"));
    }
}
