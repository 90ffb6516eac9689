//! Save-file handler.
//!
//! # Storage layout
//!
//! ```text
//! ~/.liveconfig/
//!   live_state.json   (default save file, mode 0600)
//! ```
//!
//! Any other path may be used; the format follows the extension (`.yaml` /
//! `.yml` → YAML, anything else → JSON).
//!
//! # Write protocol
//!
//! 1. Serialize the snapshot.
//! 2. SHA-256 the rendered text and compare with the digest of what was last
//!    read or written → skip if identical and the file still exists.
//! 3. Write `<file>.tmp` in the same directory, `chmod 0600`.
//! 4. Rename over the target.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use liveconfig_core::{LiveManager, LoadedValues, PersistedState};

use crate::error::{io_err, StoreError};

/// `<home>/.liveconfig/live_state.json`. Pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".liveconfig").join("live_state.json")
}

/// `default_path_at` convenience wrapper.
pub fn default_path() -> Result<PathBuf, StoreError> {
    let home = dirs::home_dir().ok_or(StoreError::HomeNotFound)?;
    Ok(default_path_at(&home))
}

/// On-disk encoding of a save file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }

    fn render(self, state: &PersistedState) -> Result<String, StoreError> {
        Ok(match self {
            Format::Json => {
                let mut text = serde_json::to_string_pretty(state)?;
                text.push('\n');
                text
            }
            Format::Yaml => serde_yaml::to_string(state)?,
        })
    }

    fn parse(self, path: &Path, text: &str) -> Result<PersistedState, StoreError> {
        match self {
            Format::Json => serde_json::from_str(text).map_err(|source| StoreError::ParseJson {
                path: path.to_path_buf(),
                source,
            }),
            Format::Yaml => serde_yaml::from_str(text).map_err(|source| StoreError::ParseYaml {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Outcome of [`FileHandler::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The file was (re)written.
    Written { path: PathBuf },
    /// Rendered content matches what is already on disk.
    Unchanged { path: PathBuf },
}

/// Reads and writes one save file.
#[derive(Debug)]
pub struct FileHandler {
    path: PathBuf,
    format: Format,
    loaded_values: Option<LoadedValues>,
    /// SHA-256 of the file content as last read or written.
    digest: Option<String>,
}

impl FileHandler {
    /// Bind to `path` and load it if it exists.
    ///
    /// A missing file is not an error: `loaded_values` stays `None` and the
    /// first save creates it. A malformed file is an error naming the path.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut handler = Self {
            format: Format::from_path(&path),
            path,
            loaded_values: None,
            digest: None,
        };
        handler.reload()?;
        Ok(handler)
    }

    /// `open` at the default location.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(default_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// State read from disk, for [`LiveManager::set_loaded_values`].
    pub fn loaded_values(&self) -> Option<&LoadedValues> {
        self.loaded_values.as_ref()
    }

    /// Re-read the save file, replacing `loaded_values`.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        if !self.path.exists() {
            tracing::debug!("no save file at {}", self.path.display());
            self.loaded_values = None;
            self.digest = None;
            return Ok(());
        }
        let text = std::fs::read_to_string(&self.path).map_err(|e| io_err(&self.path, e))?;
        let state = self.format.parse(&self.path, &text)?;
        tracing::info!(
            "loaded {} saved instance(s) from {}",
            state.live_instances.as_ref().map_or(0, |s| s.len()),
            self.path.display()
        );
        self.digest = Some(digest(&text));
        self.loaded_values = Some(state);
        Ok(())
    }

    /// Atomically write `state` to the save file.
    pub fn save(&mut self, state: &PersistedState) -> Result<SaveOutcome, StoreError> {
        let text = self.format.render(state)?;
        let new_digest = digest(&text);
        if self.digest.as_deref() == Some(new_digest.as_str()) && self.path.exists() {
            tracing::debug!("unchanged: {}", self.path.display());
            return Ok(SaveOutcome::Unchanged {
                path: self.path.clone(),
            });
        }

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
                set_dir_permissions(dir)?;
            }
        }

        let tmp = tmp_path(&self.path);
        std::fs::write(&tmp, &text).map_err(|e| io_err(&tmp, e))?;
        set_file_permissions(&tmp)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&self.path, e));
        }

        self.digest = Some(new_digest);
        tracing::info!("saved: {}", self.path.display());
        Ok(SaveOutcome::Written {
            path: self.path.clone(),
        })
    }

    /// `save(&manager.serialize())`.
    pub fn save_manager(&mut self, manager: &LiveManager) -> Result<SaveOutcome, StoreError> {
        self.save(&manager.serialize())
    }
}

/// `<file>.tmp` sibling of `path`.
pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn digest(text: &str) -> String {
    let mut h = Sha256::new();
    h.update(text.as_bytes());
    hex::encode(h.finalize())
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use liveconfig_core::{TrackedObject, Value};
    use tempfile::TempDir;

    fn manager_with(attr: &str, value: Value) -> LiveManager {
        let mut manager = LiveManager::new();
        manager
            .register_instance("player", TrackedObject::new("Player").with(attr, value))
            .expect("register");
        manager
    }

    #[test]
    fn default_path_is_correct() {
        let home = TempDir::new().unwrap();
        assert!(default_path_at(home.path()).ends_with(".liveconfig/live_state.json"));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new("a/state.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a/state.YML")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a/state.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a/state")), Format::Json);

        let tmp = TempDir::new().unwrap();
        let handler = FileHandler::open(tmp.path().join("state.yml")).unwrap();
        assert_eq!(handler.format(), Format::Yaml);
    }

    #[test]
    fn missing_file_has_no_loaded_values() {
        let tmp = TempDir::new().unwrap();
        let handler = FileHandler::open(tmp.path().join("nope.json")).unwrap();
        assert!(handler.loaded_values().is_none());
    }

    #[test]
    fn save_creates_parent_dirs_and_cleans_tmp() {
        let tmp = TempDir::new().unwrap();
        let path = default_path_at(tmp.path());
        let mut handler = FileHandler::open(&path).unwrap();
        let outcome = handler.save_manager(&manager_with("speed", Value::Int(3))).unwrap();
        assert_eq!(outcome, SaveOutcome::Written { path: path.clone() });
        assert!(path.exists());
        assert!(!tmp_path(&path).exists(), ".tmp must be gone after save");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn identical_save_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        let manager = manager_with("speed", Value::Int(3));
        let mut handler = FileHandler::open(&path).unwrap();
        handler.save_manager(&manager).unwrap();
        assert!(matches!(
            handler.save_manager(&manager).unwrap(),
            SaveOutcome::Unchanged { .. }
        ));

        let mut reopened = FileHandler::open(&path).unwrap();
        assert!(matches!(
            reopened.save_manager(&manager).unwrap(),
            SaveOutcome::Unchanged { .. }
        ));
        assert!(matches!(
            reopened.save_manager(&manager_with("speed", Value::Int(4))).unwrap(),
            SaveOutcome::Written { .. }
        ));
    }

    #[test]
    fn deleted_file_is_rewritten_even_if_digest_matches() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        let manager = manager_with("speed", Value::Int(3));
        let mut handler = FileHandler::open(&path).unwrap();
        handler.save_manager(&manager).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            handler.save_manager(&manager).unwrap(),
            SaveOutcome::Written { .. }
        ));
    }

    #[test]
    fn reload_picks_up_saved_state() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.yaml");
        let mut handler = FileHandler::open(&path).unwrap();
        handler.save_manager(&manager_with("name", Value::from("hero"))).unwrap();
        assert!(handler.loaded_values().is_none());

        handler.reload().unwrap();
        let attrs = handler
            .loaded_values()
            .and_then(|v| v.instance_attrs("player"))
            .cloned()
            .unwrap();
        assert_eq!(attrs["name"], Value::Str("hero".into()));
    }

    #[test]
    fn malformed_json_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = FileHandler::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::ParseJson { .. }), "got: {err}");
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(StoreError::HomeNotFound.to_string().contains("home directory"));
    }
}
