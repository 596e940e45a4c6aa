//! Phone number formatting

use crate::config::CountryEntry;
use crate::{Error, Result};

/// Convert a local number (`0971143378`) to international form (`+66971143378`).
///
/// The leading trunk digit is replaced with the country's dialing code.
pub fn to_international(local: &str, country_id: u32, countries: &[CountryEntry]) -> Result<String> {
    let country = countries
        .iter()
        .find(|entry| entry.id == country_id)
        .ok_or(Error::UnknownCountry(country_id))?;

    let digits = local.trim();
    let Some(subscriber) = digits.strip_prefix('0') else {
        return Err(Error::InvalidPhoneNumber {
            number: local.to_string(),
            reason: "expected a leading trunk digit 0".to_string(),
        });
    };

    if subscriber.is_empty() || !subscriber.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidPhoneNumber {
            number: local.to_string(),
            reason: "expected digits after the trunk prefix".to_string(),
        });
    }

    Ok(format!("+{}{}", country.dialing_code, subscriber))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;

    #[test]
    fn test_thai_number() {
        let config = DemoConfig::default();

        assert_eq!(
            to_international("0971143378", 1, &config.countries).unwrap(),
            "+66971143378"
        );
    }

    #[test]
    fn test_uk_number() {
        let config = DemoConfig::default();

        assert_eq!(
            to_international("07700900123", 2, &config.countries).unwrap(),
            "+447700900123"
        );
    }

    #[test]
    fn test_unknown_country() {
        let config = DemoConfig::default();

        assert!(matches!(
            to_international("0971143378", 9, &config.countries),
            Err(Error::UnknownCountry(9))
        ));
    }

    #[test]
    fn test_malformed_numbers() {
        let config = DemoConfig::default();

        for number in ["", "0", "971143378", "09711-3378"] {
            assert!(
                matches!(
                    to_international(number, 1, &config.countries),
                    Err(Error::InvalidPhoneNumber { .. })
                ),
                "{number} should be rejected"
            );
        }
    }
}
