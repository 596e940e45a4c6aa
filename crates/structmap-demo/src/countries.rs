//! Country name lookup

use std::collections::HashMap;
use std::future::Future;

use crate::config::DemoConfig;
use crate::{Error, Result};

/// Resolves a country id to its display name.
pub trait CountryService: Send + Sync {
    fn country_name(&self, country_id: u32) -> impl Future<Output = Result<String>> + Send;
}

/// Country lookup backed by the configured country table
#[derive(Debug, Clone, Default)]
pub struct StaticCountryService {
    names: HashMap<u32, String>,
}

impl StaticCountryService {
    pub fn new(names: HashMap<u32, String>) -> Self {
        Self { names }
    }

    pub fn from_config(config: &DemoConfig) -> Self {
        Self::new(
            config
                .countries
                .iter()
                .map(|entry| (entry.id, entry.name.clone()))
                .collect(),
        )
    }
}

impl CountryService for StaticCountryService {
    async fn country_name(&self, country_id: u32) -> Result<String> {
        self.names
            .get(&country_id)
            .cloned()
            .ok_or(Error::UnknownCountry(country_id))
    }
}
