//! Demo configuration
//!
//! Loaded from YAML; every field has a default so a partial file is valid.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

/// One row of the country table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountryEntry {
    pub id: u32,
    pub name: String,
    /// International dialing code without the leading `+`
    pub dialing_code: String,
}

impl CountryEntry {
    pub fn new(id: u32, name: impl Into<String>, dialing_code: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            dialing_code: dialing_code.into(),
        }
    }
}

/// Configuration for the demo collaborators
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Simulated latency of each address lookup, in milliseconds
    pub address_lookup_delay_ms: u64,
    /// `chrono` format string for `date_joined`
    pub date_format: String,
    /// Known countries
    pub countries: Vec<CountryEntry>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            address_lookup_delay_ms: 1000,
            date_format: "%d/%m/%Y".to_string(),
            countries: vec![
                CountryEntry::new(1, "Thailand", "66"),
                CountryEntry::new(2, "UK", "44"),
            ],
        }
    }
}

impl DemoConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|err| Error::config("<inline>", err.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::config(path.display().to_string(), err.to_string()))?;
        let config: Self = serde_yaml::from_str(&text)
            .map_err(|err| Error::config(path.display().to_string(), err.to_string()))?;
        debug!(path = %path.display(), countries = config.countries.len(), "loaded demo config");
        Ok(config)
    }

    /// Load `path` when given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Set the simulated address lookup latency
    pub fn address_lookup_delay(mut self, delay: Duration) -> Self {
        self.address_lookup_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the date format
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Add or replace a country
    pub fn with_country(mut self, entry: CountryEntry) -> Self {
        self.countries.retain(|existing| existing.id != entry.id);
        self.countries.push(entry);
        self
    }

    #[must_use]
    pub fn lookup_delay(&self) -> Duration {
        Duration::from_millis(self.address_lookup_delay_ms)
    }

    #[must_use]
    pub fn country(&self, id: u32) -> Option<&CountryEntry> {
        self.countries.iter().find(|entry| entry.id == id)
    }
}
