//! Address enrichment
//!
//! Simulates a remote lookup: every transform waits for the configured
//! latency before resolving the country name.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::try_join_all;
use tracing::debug;

use crate::countries::CountryService;
use crate::models::{Address, AddressDto};
use crate::Result;

/// Maps stored addresses to DTOs, resolving country names on the way
#[derive(Debug)]
pub struct AddressDtoService<C> {
    countries: Arc<C>,
    lookup_delay: Duration,
    started: Instant,
}

impl<C> Clone for AddressDtoService<C> {
    fn clone(&self) -> Self {
        Self {
            countries: Arc::clone(&self.countries),
            lookup_delay: self.lookup_delay,
            started: self.started,
        }
    }
}

impl<C: CountryService> AddressDtoService<C> {
    pub fn new(countries: Arc<C>, lookup_delay: Duration) -> Self {
        Self {
            countries,
            lookup_delay,
            started: Instant::now(),
        }
    }

    /// Map one address.
    pub async fn transform(&self, address: &Address) -> Result<AddressDto> {
        tokio::time::sleep(self.lookup_delay).await;

        let dto = AddressDto {
            street: address.street.clone(),
            area: address.area.clone(),
            state: address.province.clone(),
            postcode: address.zipcode.clone(),
            country_name: self.countries.country_name(address.country_id).await?,
        };

        debug!(
            street = %dto.street,
            elapsed_ms = self.started.elapsed().as_millis(),
            "resolved address"
        );
        Ok(dto)
    }

    /// Map several addresses concurrently, preserving order.
    pub async fn transform_all(&self, addresses: &[&Address]) -> Result<Vec<AddressDto>> {
        try_join_all(addresses.iter().map(|address| self.transform(address))).await
    }
}
