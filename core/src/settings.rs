//! Persisted user preferences: theme and the signed-in user.
//!
//! `Settings` is loaded once from a `PreferenceStore` and writes every change
//! straight back. The file store replaces its file atomically so a crash
//! mid-write leaves the previous preferences intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::notify::{Listeners, Subscription};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub dark: bool,
    #[serde(default)]
    pub current_user: Option<CurrentUser>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark: false,
            current_user: Some(CurrentUser {
                id: 1,
                name: "Leanne Graham".to_string(),
                email: Some("Sincere@april.biz".to_string()),
            }),
        }
    }
}

pub trait PreferenceStore {
    /// `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Preferences>, SettingsError>;
    fn save(&mut self, preferences: &Preferences) -> Result<(), SettingsError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<Preferences>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Option<&Preferences> {
        self.saved.as_ref()
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> Result<Option<Preferences>, SettingsError> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, preferences: &Preferences) -> Result<(), SettingsError> {
        self.saved = Some(preferences.clone());
        Ok(())
    }
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFileStore {
    fn load(&self) -> Result<Option<Preferences>, SettingsError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, preferences: &Preferences) -> Result<(), SettingsError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, preferences)?;
        file.flush()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), "saved preferences");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEvent {
    ThemeChanged { dark: bool },
    CurrentUserChanged(Option<CurrentUser>),
}

pub struct Settings<S: PreferenceStore> {
    store: S,
    preferences: Preferences,
    listeners: Listeners<SettingsEvent>,
}

impl<S: PreferenceStore> Settings<S> {
    /// Read saved preferences, falling back to the defaults.
    pub fn load(store: S) -> Result<Self, SettingsError> {
        let preferences = store.load()?.unwrap_or_default();
        Ok(Self {
            store,
            preferences,
            listeners: Listeners::default(),
        })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn dark(&self) -> bool {
        self.preferences.dark
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.preferences.current_user.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn set_dark(&mut self, dark: bool) -> Result<(), SettingsError> {
        if self.preferences.dark == dark {
            return Ok(());
        }
        self.commit(Preferences {
            dark,
            ..self.preferences.clone()
        })?;
        self.listeners.emit(&SettingsEvent::ThemeChanged { dark });
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Result<bool, SettingsError> {
        let dark = !self.preferences.dark;
        self.set_dark(dark)?;
        Ok(dark)
    }

    pub fn set_current_user(&mut self, user: Option<CurrentUser>) -> Result<(), SettingsError> {
        self.commit(Preferences {
            current_user: user.clone(),
            ..self.preferences.clone()
        })?;
        self.listeners.emit(&SettingsEvent::CurrentUserChanged(user));
        Ok(())
    }

    /// Memory only changes once the store has accepted the new value.
    fn commit(&mut self, next: Preferences) -> Result<(), SettingsError> {
        self.store.save(&next)?;
        self.preferences = next;
        Ok(())
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&SettingsEvent) + 'static) -> Subscription {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.unsubscribe(subscription)
    }
}
