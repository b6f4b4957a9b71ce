use crate::data::persistence::Persistable;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppSettings {
    /// Tracker entry to open. When unset, the first entry the service
    /// lists is used.
    #[serde(default)]
    pub entry_id: Option<String>,
    #[serde(default = "default_title")]
    pub title: String,
    /// Lengths offered as fixed-length presets, in days.
    #[serde(default = "default_preset_lengths")]
    pub preset_lengths: Vec<i64>,
}

fn default_title() -> String {
    "Fertility Tracker".to_string()
}

fn default_preset_lengths() -> Vec<i64> {
    vec![5, 4]
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            entry_id: None,
            title: default_title(),
            preset_lengths: default_preset_lengths(),
        }
    }
}

/// Wrapper that reads the `settings` key from config.yaml.
#[derive(Serialize, Deserialize, Default, Debug)]
struct SettingsWrapper {
    #[serde(default)]
    settings: AppSettings,
}

impl Persistable for SettingsWrapper {
    fn filename() -> &'static str {
        "config.yaml"
    }
    fn is_json() -> bool {
        false
    }
}

impl AppSettings {
    pub fn load_from(dir: &Path) -> Result<Self> {
        Ok(SettingsWrapper::load_from(dir)?.settings)
    }

    pub fn save_to(&self, dir: &Path) -> Result<()> {
        let wrapper = SettingsWrapper {
            settings: self.clone(),
        };
        wrapper.save_to(dir)
    }

    /// Applies a `--entry` override from the command line.
    pub fn with_entry_override(mut self, entry: Option<String>) -> Self {
        if entry.is_some() {
            self.entry_id = entry;
        }
        self
    }
}
