//! End-to-end tests for the composed customer mappers

use std::sync::Arc;
use std::time::{Duration, Instant};

use structmap_demo::{
    AddressDtoService, CustomerDtoService, CustomerRepository, DemoConfig, Error,
    StaticCountryService,
};

fn service_with_delay(delay: Duration) -> CustomerDtoService {
    let config = DemoConfig::new().address_lookup_delay(delay);
    let countries = Arc::new(StaticCountryService::from_config(&config));
    let addresses = AddressDtoService::new(countries, config.lookup_delay());
    CustomerDtoService::new(CustomerRepository::seeded(), addresses, &config).unwrap()
}

#[tokio::test]
async fn test_address_lookups_overlap() {
    // Three lookups (home, business, shipping) each wait 200ms.
    let delay = Duration::from_millis(200);
    let service = service_with_delay(delay);

    let started = Instant::now();
    let dto = service.get_by_id(1).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(dto.contact.other_addresses.len(), 2);
    assert!(elapsed >= delay);
    assert!(
        elapsed < delay * 2,
        "lookups should run concurrently, took {elapsed:?}"
    );
}

#[tokio::test]
async fn test_customer_dto_serializes_to_json() -> anyhow::Result<()> {
    let service = service_with_delay(Duration::ZERO);

    let dto = service.get_by_id(1).await?;
    let json = serde_json::to_value(&dto)?;

    assert_eq!(json["customer_id"], "12345");
    assert_eq!(json["date_joined"], "01/01/1990");
    assert_eq!(json["contact"]["phone_number"], "+66971143378");
    assert_eq!(json["contact"]["home_address"]["country_name"], "Thailand");
    assert_eq!(json["contact"]["other_addresses"][1]["street"], "1 Ship Lane");
    Ok(())
}

#[tokio::test]
async fn test_uk_customer() -> anyhow::Result<()> {
    let service = service_with_delay(Duration::ZERO);

    let dto = service.get_by_id(2).await?;

    assert_eq!(dto.date_joined, "30/06/2015");
    assert_eq!(dto.contact.phone_number, "+447700900123");
    assert!(
        dto.contact
            .other_addresses
            .iter()
            .all(|address| address.country_name == "UK")
    );
    Ok(())
}

#[tokio::test]
async fn test_concurrent_requests_share_one_service() {
    let service = Arc::new(service_with_delay(Duration::from_millis(20)));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.get_by_id(1 + i % 2).await })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let dto = handle.await.unwrap().unwrap();
        let expected = if i % 2 == 0 { "12345" } else { "67890" };
        assert_eq!(dto.customer_id, expected);
    }
}

#[tokio::test]
async fn test_custom_date_format_from_yaml() -> anyhow::Result<()> {
    let config = DemoConfig::from_yaml("address_lookup_delay_ms: 0\ndate_format: \"%Y-%m-%d\"\n")?;
    let countries = Arc::new(StaticCountryService::from_config(&config));
    let addresses = AddressDtoService::new(countries, config.lookup_delay());
    let service = CustomerDtoService::new(CustomerRepository::seeded(), addresses, &config)?;

    assert_eq!(service.get_by_id(1).await?.date_joined, "1990-01-01");
    Ok(())
}

#[test]
fn test_summary_unknown_customer() {
    let service = service_with_delay(Duration::ZERO);

    assert!(matches!(
        service.summary_by_id(7),
        Err(Error::CustomerNotFound(7))
    ));
}
