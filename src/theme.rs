//! The light/dark theme state machine and the [`PreferenceStore`] seam where
//! the chosen theme is persisted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The key under which the theme is persisted.
pub const STORAGE_KEY: &str = "theme";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// The persisted form: `light` or `dark`.
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// The other theme.
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    fn from_os(prefers_dark: bool) -> Theme {
        match prefers_dark {
            true => Theme::Dark,
            false => Theme::Light,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Light
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(UnknownTheme(s.to_owned())),
        }
    }
}

/// Returned when parsing a [`Theme`] from anything but `light` or `dark`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTheme(pub String);

impl fmt::Display for UnknownTheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown theme `{}`", self.0)
    }
}

impl std::error::Error for UnknownTheme {}

/// Key/value storage for user preferences, the equivalent of a browser's
/// local storage.
pub trait PreferenceStore {
    /// The value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, persisting it before returning.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// A [`PreferenceStore`] which lives only as long as the value.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(BTreeMap<String, String>);

impl MemoryStore {
    /// An empty store.
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.0.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// A [`PreferenceStore`] backed by a YAML mapping on disk. Every `set` writes
/// the whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`. A missing or empty file is an empty store;
    /// the file and its parent directories are created on the first `set`.
    /// A file which isn't a YAML mapping of strings is ignored and replaced
    /// on the next `set`.
    pub fn open(path: &Path) -> Result<FileStore> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(Error::Io {
                    path: path.to_owned(),
                    err,
                })
            }
        };
        let values = match contents.trim().is_empty() {
            true => BTreeMap::new(),
            false => serde_yaml::from_str(&contents).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "ignoring unreadable preferences");
                BTreeMap::new()
            }),
        };
        Ok(FileStore {
            path: path.to_owned(),
            values,
        })
    }

    // Writes beside the file and renames over it, so an interrupted save
    // leaves the previous preferences in place.
    fn save(&self) -> Result<()> {
        let io_err = |err| Error::Io {
            path: self.path.clone(),
            err,
        };
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        let file = File::create(&staging).map_err(io_err)?;
        serde_yaml::to_writer(file, &self.values).map_err(|err| Error::Yaml {
            path: self.path.clone(),
            err,
        })?;
        std::fs::rename(&staging, &self.path).map_err(io_err)
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_owned(), value.to_owned());
        self.save()
    }
}

/// Tracks the active [`Theme`]. The initial theme is the persisted preference,
/// else the OS preference, else [`Theme::Light`]. Every transition is
/// persisted immediately; once a preference is persisted, OS preference
/// changes are ignored.
#[derive(Debug)]
pub struct ThemeController<S> {
    store: S,
    theme: Theme,
}

impl<S: PreferenceStore> ThemeController<S> {
    /// Resolves the initial theme. Nothing is written to `store`.
    pub fn new(store: S, os_prefers_dark: Option<bool>) -> ThemeController<S> {
        let theme = match stored_theme(&store) {
            Some(theme) => theme,
            None => os_prefers_dark.map(Theme::from_os).unwrap_or_default(),
        };
        debug!(theme = %theme, "resolved initial theme");
        ThemeController { store, theme }
    }

    /// The active theme.
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Whether a theme preference has been persisted.
    pub fn has_preference(&self) -> bool {
        stored_theme(&self.store).is_some()
    }

    /// Switches light and dark and persists the result.
    pub fn toggle(&mut self) -> Result<Theme> {
        self.apply(self.theme.toggled())?;
        Ok(self.theme)
    }

    /// Follows an OS preference change, unless a preference is persisted.
    /// Returns whether the change was honoured.
    pub fn os_preference_changed(&mut self, prefers_dark: bool) -> Result<bool> {
        if self.has_preference() {
            debug!(prefers_dark, "ignoring OS theme change; preference is persisted");
            return Ok(false);
        }
        self.apply(Theme::from_os(prefers_dark))?;
        Ok(true)
    }

    /// The store the preference is persisted in.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Gives the store back.
    pub fn into_store(self) -> S {
        self.store
    }

    fn apply(&mut self, theme: Theme) -> Result<()> {
        self.store.set(STORAGE_KEY, theme.as_str())?;
        debug!(from = %self.theme, to = %theme, "theme changed");
        self.theme = theme;
        Ok(())
    }
}

fn stored_theme<S: PreferenceStore>(store: &S) -> Option<Theme> {
    let value = store.get(STORAGE_KEY)?;
    match value.parse() {
        Ok(theme) => Some(theme),
        Err(err) => {
            warn!(error = %err, "ignoring stored theme preference");
            None
        }
    }
}

/// The result of a fallible preference-store operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem reading or writing persisted preferences.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O errors on the preference file.
    Io { path: PathBuf, err: std::io::Error },

    /// Returned when the preferences can't be serialized.
    Yaml { path: PathBuf, err: serde_yaml::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, err } => {
                write!(f, "Accessing preferences '{}': {}", path.display(), err)
            }
            Error::Yaml { path, err } => {
                write!(f, "Parsing preferences '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            Error::Yaml { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_initial_resolution_order() {
        let controller = ThemeController::new(MemoryStore::new(), None);
        assert_eq!(Theme::Light, controller.theme());

        let controller = ThemeController::new(MemoryStore::new(), Some(false));
        assert_eq!(Theme::Light, controller.theme());

        let controller = ThemeController::new(MemoryStore::new(), Some(true));
        assert_eq!(Theme::Dark, controller.theme());
        assert!(!controller.has_preference());

        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "light").unwrap();
        let controller = ThemeController::new(store, Some(true));
        assert_eq!(Theme::Light, controller.theme());
    }

    #[test]
    fn test_invalid_stored_value_is_ignored() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "sepia").unwrap();
        let controller = ThemeController::new(store, Some(true));
        assert_eq!(Theme::Dark, controller.theme());
        assert!(!controller.has_preference());
    }

    #[test]
    fn test_toggle_persists_across_reload() -> Result<()> {
        let mut controller = ThemeController::new(MemoryStore::new(), Some(true));
        assert_eq!(Theme::Dark, controller.theme());
        assert_eq!(Theme::Light, controller.toggle()?);

        let reloaded = ThemeController::new(controller.into_store(), Some(true));
        assert_eq!(Theme::Light, reloaded.theme());
        Ok(())
    }

    #[test]
    fn test_os_change_only_without_preference() -> Result<()> {
        let mut controller = ThemeController::new(MemoryStore::new(), Some(false));
        assert!(controller.os_preference_changed(true)?);
        assert_eq!(Theme::Dark, controller.theme());
        assert_eq!(Some("dark".to_owned()), controller.store().get(STORAGE_KEY));

        // the followed change was persisted, so the next one is ignored
        assert!(!controller.os_preference_changed(false)?);
        assert_eq!(Theme::Dark, controller.theme());

        controller.toggle()?;
        assert!(!controller.os_preference_changed(true)?);
        assert_eq!(Theme::Light, controller.theme());
        Ok(())
    }

    #[test]
    fn test_file_store_round_trip() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("preferences.yaml");

        let mut controller = ThemeController::new(FileStore::open(&path)?, None);
        assert_eq!(Theme::Light, controller.theme());
        assert!(!path.exists());
        controller.toggle()?;
        assert!(path.exists());

        let reloaded = ThemeController::new(FileStore::open(&path)?, Some(false));
        assert_eq!(Theme::Dark, reloaded.theme());
        Ok(())
    }

    #[test]
    fn test_file_store_ignores_empty_and_garbled_files() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.yaml");
        for contents in ["", "\n", "- not\n- a mapping\n", "theme: [dark"] {
            std::fs::write(&path, contents).unwrap();
            let controller = ThemeController::new(FileStore::open(&path)?, Some(true));
            assert_eq!(Theme::Dark, controller.theme(), "{:?}", contents);
            assert!(!controller.has_preference(), "{:?}", contents);
        }

        let mut controller = ThemeController::new(FileStore::open(&path)?, None);
        controller.toggle()?;
        let reloaded = ThemeController::new(FileStore::open(&path)?, None);
        assert_eq!(Theme::Dark, reloaded.theme());
        assert!(!dir.path().join("preferences.yaml.tmp").exists());
        Ok(())
    }
}
