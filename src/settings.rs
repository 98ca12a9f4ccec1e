use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

/// Storage key holding the serialized home record.
pub const DEFAULT_STORAGE_KEY: &str = "sh_state";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardSettings {
    /// How long a scene shows LOADING before it becomes active.
    pub scene_delay_ms: u64,
    /// How long a notification stays visible.
    pub notification_ms: u64,
    pub storage_key: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            scene_delay_ms: 800,
            notification_ms: 3000,
            storage_key: DEFAULT_STORAGE_KEY.into(),
        }
    }
}

impl DashboardSettings {
    pub fn scene_delay(&self) -> Duration {
        Duration::from_millis(self.scene_delay_ms)
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<DashboardSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring invalid settings in {}: {err}", path.display());
                DashboardSettings::default()
            })
        } else {
            DashboardSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn dashboard(&self) -> DashboardSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update_dashboard(&self, settings: DashboardSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &DashboardSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

/// Directory holding storage and settings. `SMARTHOME_DATA_DIR` wins,
/// then `$HOME/.smarthome`, then `.smarthome` under the working directory.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("SMARTHOME_DATA_DIR") {
        return PathBuf::from(dir);
    }
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".smarthome")
}

pub fn debug_mode() -> bool {
    std::env::var("SMARTHOME_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.dashboard();
        assert_eq!(settings, DashboardSettings::default());
        assert_eq!(settings.scene_delay(), Duration::from_millis(800));
        assert_eq!(settings.notification_duration(), Duration::from_secs(3));
    }

    #[test]
    fn invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "scene_delay_ms = 5").unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.dashboard(), DashboardSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"scene_delay_ms": 10}"#).unwrap();
        let settings = SettingsStore::new(path).unwrap().dashboard();
        assert_eq!(settings.scene_delay_ms, 10);
        assert_eq!(settings.notification_ms, 3000);
        assert_eq!(settings.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn update_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.dashboard();
        settings.notification_ms = 1500;
        store.update_dashboard(settings).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.dashboard().notification_ms, 1500);
    }
}
