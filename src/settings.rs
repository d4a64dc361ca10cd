use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

/// Invoicing parameters. The rate is a deployment choice, never a
/// hardcoded constant in the aggregation code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSettings {
    pub hourly_rate: f64,
    pub currency: String,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            hourly_rate: 500.0,
            currency: "dkk".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct UserSettings {
    invoice: InvoiceSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn invoice(&self) -> InvoiceSettings {
        self.data.read().unwrap().invoice.clone()
    }

    pub fn update_invoice(&self, settings: InvoiceSettings) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.invoice = settings;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
