//! Source entities and target DTOs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Postal address as stored with a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub area: String,
    pub province: String,
    pub zipcode: String,
    pub country_id: u32,
}

/// Customer entity, the source side of the demo mappings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub first_name: String,
    pub surname: String,
    /// Local format with a leading trunk digit, e.g. `0971143378`
    pub phone_number: String,
    pub home_address: Address,
    pub business_address: Address,
    pub shipping_address: Address,
    pub customer_number: u32,
    pub date_joined: NaiveDate,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDto {
    pub street: String,
    pub area: String,
    pub state: String,
    pub country_name: String,
    pub postcode: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDto {
    pub first: String,
    pub last: String,
    /// International format, e.g. `+66971143378`
    pub phone_number: String,
    pub home_address: AddressDto,
    pub other_addresses: Vec<AddressDto>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDto {
    /// The stored `customer_number`, not the repository id used for lookup
    pub customer_id: String,
    pub date_joined: String,
    pub contact: ContactDto,
}

/// Flat view built only from synchronous rules
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub customer_id: String,
    pub display_name: String,
    pub phone_number: String,
}
