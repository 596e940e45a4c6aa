//! # structmap-demo
//!
//! Customer/address models and the collaborators a mapping calls into: a
//! country lookup, a phone-number formatter, an address enrichment service and
//! an in-memory customer repository. [`CustomerDtoService`] assembles nested
//! mappers from these by composition.

pub mod address;
pub mod config;
pub mod countries;
pub mod customers;
pub mod models;
pub mod phone;

pub use address::AddressDtoService;
pub use config::{CountryEntry, DemoConfig};
pub use countries::{CountryService, StaticCountryService};
pub use customers::{CustomerDtoService, CustomerRepository};
pub use models::{Address, AddressDto, ContactDto, Customer, CustomerDto, CustomerSummary};

use thiserror::Error;

/// Errors raised by the demo collaborators
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown country id {0}")]
    UnknownCountry(u32),

    #[error("Invalid phone number '{number}': {reason}")]
    InvalidPhoneNumber { number: String, reason: String },

    #[error("Customer {0} not found")]
    CustomerNotFound(u32),

    #[error("Configuration error for '{path}': {message}")]
    Config { path: String, message: String },

    #[error(transparent)]
    Mapping(#[from] structmap_core::Error),
}

impl Error {
    /// Create a configuration error with path context.
    pub fn config(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
