//! Behavior-driven tests for the validate-then-persist flow
//!
//! These tests verify the result envelope a front end receives for each
//! outcome of a write, against both the in-memory store and the warehouse.

use stockwatch_core::{
    AlertType, EntityService, HorizontalLine, InMemoryDao, MessageType, PriceAlert, ServiceError,
    Statistic, StatisticFilter, StatisticScope, WebServiceMessage, WebServiceResult,
};
use stockwatch_tests::{alert, decimal, line, statistic};
use stockwatch_warehouse::Warehouse;

fn types<T>(result: &WebServiceResult<T>) -> Vec<MessageType> {
    result
        .messages()
        .iter()
        .map(|message| message.message_type)
        .collect()
}

// =============================================================================
// Service: Write Outcomes
// =============================================================================

#[test]
fn when_user_creates_an_alert_it_is_stored_with_a_success_message() {
    // Given: An alert service over the warehouse
    let warehouse = Warehouse::open_in_memory().expect("warehouse");
    let service = EntityService::<PriceAlert, Warehouse>::new(warehouse);

    // When: A valid alert is created
    let result = service.create_result(&alert("RY", AlertType::GreaterOrEqual, "120.50"));

    // Then: The stored alert is returned with its id
    assert_eq!(types(&result), vec![MessageType::Success]);
    assert_eq!(result.messages()[0].text, "priceAlert '1' was created.");
    assert_eq!(result.data().and_then(|stored| stored.id), Some(1));
}

#[test]
fn when_user_submits_an_invalid_alert_nothing_is_stored() {
    // Given: An alert service over the warehouse
    let warehouse = Warehouse::open_in_memory().expect("warehouse");
    let service = EntityService::<PriceAlert, Warehouse>::new(warehouse);

    // When: An alert with a zero price is created
    let result = service.create_result(&alert("RY", AlertType::GreaterOrEqual, "0"));

    // Then: An error message and no data come back
    assert_eq!(types(&result), vec![MessageType::Error]);
    assert!(result.data().is_none());
    assert!(service
        .list(&Default::default())
        .expect("list")
        .is_empty());
}

#[test]
fn when_user_saves_an_unchanged_line_it_is_reported_as_information() {
    // Given: A stored line
    let service =
        EntityService::<HorizontalLine, InMemoryDao<HorizontalLine>>::new(InMemoryDao::new());
    let stored = service.create(&line("SHOP", "98.50")).expect("create");

    // When: The same line is saved again
    let err = service.modify(&stored).expect_err("unchanged");
    let result = service.modify_result(&stored);

    // Then: The outcome is a no-op, not a failure
    assert!(err.is_unchanged());
    assert_eq!(types(&result), vec![MessageType::Info]);
    assert!(!result.has_errors());
}

#[test]
fn when_user_deletes_a_missing_statistic_a_warning_is_returned() {
    // Given: An empty warehouse
    let warehouse = Warehouse::open_in_memory().expect("warehouse");
    let service = EntityService::<Statistic, Warehouse>::new(warehouse);

    // When: A statistic that was never stored is removed
    let result = service.remove_result(&statistic(StatisticScope::Sector(3)));

    // Then: A warning names the missing key
    assert_eq!(types(&result), vec![MessageType::Warning]);
    assert!(result.messages()[0].text.contains("2024-01-15/STOCK/sector:3"));
}

#[test]
fn when_statistic_is_created_and_corrected_it_is_listed_once() {
    // Given: A statistic service over the warehouse
    let warehouse = Warehouse::open_in_memory().expect("warehouse");
    let service = EntityService::<Statistic, Warehouse>::new(warehouse);
    let stored = service
        .create(&statistic(StatisticScope::All))
        .expect("create");

    // When: The advances are corrected
    let corrected = stored.with_advances(6, 1);
    service.modify(&corrected).expect("modify");

    // Then: The listing holds the corrected statistic only
    let listed = service.list(&StatisticFilter::default()).expect("list");
    assert_eq!(listed, vec![corrected]);
    assert_eq!(listed[0].advance_decline_number(), 5);
}

#[test]
fn when_negative_count_is_submitted_validation_stops_the_write() {
    let service = EntityService::<Statistic, InMemoryDao<Statistic>>::new(InMemoryDao::new());
    let invalid = statistic(StatisticScope::All).with_sma200(-1, 3);

    let err = service.create(&invalid).expect_err("negative count");
    let ServiceError::Validation(validation) = &err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(validation.field(), "numberAboveSma200");
    assert!(service.dao().is_empty());
}

// =============================================================================
// Result Envelope
// =============================================================================

#[test]
fn when_messages_are_added_they_keep_their_order_and_duplicates() {
    // Given: An envelope with data
    let mut result = WebServiceResult::with_data(decimal("1.5"));

    // When: Messages are appended one by one and as a batch
    result.add_message(WebServiceMessage::warning("stale quote"));
    result.add_messages([
        WebServiceMessage::info("checked 3 alerts"),
        WebServiceMessage::warning("stale quote"),
    ]);
    result.add_message(WebServiceMessage::success("done"));

    // Then: Messages come back exactly as added
    assert_eq!(
        types(&result),
        vec![
            MessageType::Warning,
            MessageType::Info,
            MessageType::Warning,
            MessageType::Success
        ]
    );
    assert_eq!(result.data(), Some(&decimal("1.5")));

    // And: The envelope serializes with typed messages
    let json = serde_json::to_value(&result).expect("serialize");
    assert_eq!(json["messages"][0]["type"], "WARNING");
    assert_eq!(json["messages"][0]["text"], "stale quote");
    assert_eq!(json["data"], "1.5");
}
