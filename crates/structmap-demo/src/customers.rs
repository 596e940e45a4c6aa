//! Customer repository and DTO service
//!
//! The DTO service assembles two mappers once and reuses them per request:
//! a contact mapper (phone formatting and concurrent address lookups) that is
//! composed into the customer mapper's `contact` field.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

use chrono::NaiveDate;
use structmap_core::{AsyncTransform, Compute, MappingBuilder, SyncTransform, field};
use tracing::info;

use crate::address::AddressDtoService;
use crate::config::DemoConfig;
use crate::countries::CountryService;
use crate::models::{Address, ContactDto, Customer, CustomerDto, CustomerSummary};
use crate::phone::to_international;
use crate::{Error, Result};

/// In-memory customer store
#[derive(Debug, Clone, Default)]
pub struct CustomerRepository {
    customers: BTreeMap<u32, Customer>,
}

impl CustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository holding the two sample customers (ids 1 and 2).
    pub fn seeded() -> Self {
        let mut repository = Self::new();
        repository.insert(
            1,
            Customer {
                first_name: "Mike".to_string(),
                surname: "Chamberlain".to_string(),
                phone_number: "0971143378".to_string(),
                home_address: sample_address("3 Some Lane", 1),
                business_address: sample_address("3 Some Lane", 1),
                shipping_address: sample_address("1 Ship Lane", 1),
                customer_number: 12345,
                date_joined: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default(),
            },
        );
        repository.insert(
            2,
            Customer {
                first_name: "Jane".to_string(),
                surname: "Doe".to_string(),
                phone_number: "07700900123".to_string(),
                home_address: sample_address("10 Downing Lane", 2),
                business_address: sample_address("221 Baker Street", 2),
                shipping_address: sample_address("4 Privet Drive", 2),
                customer_number: 67890,
                date_joined: NaiveDate::from_ymd_opt(2015, 6, 30).unwrap_or_default(),
            },
        );
        repository
    }

    pub fn insert(&mut self, id: u32, customer: Customer) {
        self.customers.insert(id, customer);
    }

    #[must_use]
    pub fn get(&self, id: u32) -> Option<Customer> {
        self.customers.get(&id).cloned()
    }

    /// Known ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.customers.keys().copied()
    }
}

fn sample_address(street: &str, country_id: u32) -> Address {
    Address {
        street: street.to_string(),
        area: "Area".to_string(),
        province: "Province".to_string(),
        zipcode: "0000".to_string(),
        country_id,
    }
}

/// Serves customer DTOs built by composed mappers
pub struct CustomerDtoService {
    repository: CustomerRepository,
    customer_mapper: AsyncTransform<Customer, CustomerDto>,
    summary_mapper: SyncTransform<Customer, CustomerSummary>,
}

impl CustomerDtoService {
    /// Build the mappers for the given collaborators.
    pub fn new<C>(
        repository: CustomerRepository,
        addresses: AddressDtoService<C>,
        config: &DemoConfig,
    ) -> Result<Self>
    where
        C: CountryService + 'static,
    {
        let config = Arc::new(config.clone());
        let contact_mapper = contact_mapper(addresses, Arc::clone(&config))?;
        let customer_mapper = customer_mapper(contact_mapper, Arc::clone(&config))?;
        let summary_mapper = summary_mapper(config)?;

        Ok(Self {
            repository,
            customer_mapper,
            summary_mapper,
        })
    }

    /// Full customer DTO; address lookups run concurrently.
    pub async fn get_by_id(&self, id: u32) -> Result<CustomerDto> {
        let customer = self.repository.get(id).ok_or(Error::CustomerNotFound(id))?;
        let dto = self.customer_mapper.map(customer).await?;
        info!(id, customer_id = %dto.customer_id, "mapped customer");
        Ok(dto)
    }

    /// Flat summary produced by the synchronous mapper.
    pub fn summary_by_id(&self, id: u32) -> Result<CustomerSummary> {
        let customer = self.repository.get(id).ok_or(Error::CustomerNotFound(id))?;
        Ok(self.summary_mapper.map(&customer)?)
    }

    pub fn repository(&self) -> &CustomerRepository {
        &self.repository
    }
}

fn contact_mapper<C>(
    addresses: AddressDtoService<C>,
    config: Arc<DemoConfig>,
) -> Result<AsyncTransform<Customer, ContactDto>>
where
    C: CountryService + 'static,
{
    let home = addresses.clone();
    let others = addresses;

    let mut builder = MappingBuilder::<Customer, ContactDto>::new();
    builder
        .for_field(
            field!(|to: ContactDto| to.first),
            Compute::from_fn(|from: &Customer| from.first_name.clone()),
        )?
        .for_field(
            field!(|to: ContactDto| to.last),
            Compute::from_fn(|from: &Customer| from.surname.clone()),
        )?
        .for_field(
            field!(|to: ContactDto| to.phone_number),
            Compute::try_from_fn(move |from: &Customer| {
                to_international(
                    &from.phone_number,
                    from.home_address.country_id,
                    &config.countries,
                )
            }),
        )?
        .for_field(
            field!(|to: ContactDto| to.home_address),
            Compute::from_async_fn(move |from: Arc<Customer>| {
                let home = home.clone();
                async move { home.transform(&from.home_address).await }
            }),
        )?
        .for_field(
            field!(|to: ContactDto| to.other_addresses),
            Compute::from_async_fn(move |from: Arc<Customer>| {
                let others = others.clone();
                async move {
                    others
                        .transform_all(&[&from.business_address, &from.shipping_address])
                        .await
                }
            }),
        )?;

    Ok(builder.build()?)
}

fn customer_mapper(
    contact_mapper: AsyncTransform<Customer, ContactDto>,
    config: Arc<DemoConfig>,
) -> Result<AsyncTransform<Customer, CustomerDto>> {
    let mut builder = MappingBuilder::<Customer, CustomerDto>::new();
    builder
        .for_field(
            field!(|to: CustomerDto| to.customer_id),
            Compute::from_fn(|from: &Customer| from.customer_number.to_string()),
        )?
        .for_field(
            field!(|to: CustomerDto| to.date_joined),
            Compute::try_from_fn(move |from: &Customer| {
                format_date(from.date_joined, &config.date_format)
            }),
        )?
        .for_field(field!(|to: CustomerDto| to.contact), contact_mapper)?;

    Ok(builder.build()?)
}

/// Format with a user-supplied pattern; an invalid pattern is an error, not a panic.
fn format_date(date: NaiveDate, format: &str) -> Result<String> {
    let mut formatted = String::new();
    write!(formatted, "{}", date.format(format))
        .map_err(|_| Error::config("date_format", format!("invalid date format '{format}'")))?;
    Ok(formatted)
}

fn summary_mapper(config: Arc<DemoConfig>) -> Result<SyncTransform<Customer, CustomerSummary>> {
    let mut builder = MappingBuilder::<Customer, CustomerSummary>::new();
    builder
        .for_field(
            field!(|to: CustomerSummary| to.customer_id),
            Compute::from_fn(|from: &Customer| from.customer_number.to_string()),
        )?
        .for_field(
            field!(|to: CustomerSummary| to.display_name),
            Compute::from_fn(|from: &Customer| format!("{} {}", from.first_name, from.surname)),
        )?
        .for_field(
            field!(|to: CustomerSummary| to.phone_number),
            Compute::try_from_fn(move |from: &Customer| {
                to_international(
                    &from.phone_number,
                    from.home_address.country_id,
                    &config.countries,
                )
            }),
        )?;

    Ok(builder.build_sync()?)
}
