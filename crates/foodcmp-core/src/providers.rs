use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::item::ProviderId;
use crate::ConfigError;

/// One provider entry from the providers registry file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    #[must_use]
    pub fn id(&self) -> ProviderId {
        ProviderId::from(self.name.trim())
    }
}

#[derive(Debug, Deserialize)]
pub struct ProvidersFile {
    pub providers: Vec<ProviderConfig>,
}

impl ProvidersFile {
    /// Enabled providers, in file order.
    pub fn enabled(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }
}

/// Load and validate the providers registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_providers(path: &Path) -> Result<ProvidersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let providers_file: ProvidersFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    validate_providers(&providers_file)?;

    Ok(providers_file)
}

fn validate_providers(providers_file: &ProvidersFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for provider in &providers_file.providers {
        let name = provider.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "provider name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate provider name: '{}'",
                provider.name
            )));
        }

        let url = provider.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "provider '{}' has invalid base_url '{}'; must start with http:// or https://",
                provider.name, provider.base_url
            )));
        }
    }

    Ok(())
}
