mod common;

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use tmdm::datatype::{XSD_DATE, XSD_DECIMAL, XSD_INT, XSD_STRING};
use tmdm::{TopicMap, TopicMapError};

fn setup() -> TopicMap {
    common::topic_map(&[])
}

#[test]
fn occurrences_keep_value_and_datatype() {
    let mut map = setup();
    let owner = map.create_topic().unwrap();
    let age = map.create_topic().unwrap();
    let occurrence = map.create_occurrence_literal(owner, age, &42i32, &[]).unwrap();
    assert_eq!(map.value(occurrence).unwrap(), "42");
    assert_eq!(map.datatype(occurrence).unwrap().reference(), XSD_INT);
    assert_eq!(map.literal_as::<i32>(occurrence).unwrap(), 42);
    assert_eq!(map.literal_as::<i64>(occurrence).unwrap(), 42);
}

#[test]
fn plain_values_are_strings() {
    let mut map = setup();
    let owner = map.create_topic().unwrap();
    let note = map.create_topic().unwrap();
    let occurrence = map.create_occurrence(owner, note, "hello", &[]).unwrap();
    assert_eq!(map.datatype(occurrence).unwrap().reference(), XSD_STRING);
    assert_eq!(map.literal_as::<String>(occurrence).unwrap(), "hello");
}

#[test]
fn unparsable_values_are_reported() {
    let mut map = setup();
    let owner = map.create_topic().unwrap();
    let note = map.create_topic().unwrap();
    let occurrence = map.create_occurrence(owner, note, "forty-two", &[]).unwrap();
    let error = map.literal_as::<i32>(occurrence).unwrap_err();
    match error {
        TopicMapError::InvalidLiteral { lexical, datatype } => {
            assert_eq!(lexical, "forty-two");
            assert_eq!(datatype.reference(), XSD_INT);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn decimals_and_dates_round_trip_through_the_lexical_form() {
    let mut map = setup();
    let owner = map.create_topic().unwrap();
    let price = map.create_topic().unwrap();
    let born = map.create_topic().unwrap();
    let amount = BigDecimal::from_str("12.50").unwrap();
    let decimal = map.create_occurrence_literal(owner, price, &amount, &[]).unwrap();
    assert_eq!(map.datatype(decimal).unwrap().reference(), XSD_DECIMAL);
    assert_eq!(map.literal_as::<BigDecimal>(decimal).unwrap(), amount);
    let day = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let date = map.create_occurrence_literal(owner, born, &day, &[]).unwrap();
    assert_eq!(map.value(date).unwrap(), "1970-01-01");
    assert_eq!(map.datatype(date).unwrap().reference(), XSD_DATE);
    let moment = day.and_hms_opt(12, 30, 0).unwrap();
    map.set_literal(date, &moment).unwrap();
    assert_eq!(map.literal_as::<NaiveDateTime>(date).unwrap(), moment);
}

#[test]
fn booleans_accept_numeric_forms() {
    let mut map = setup();
    let owner = map.create_topic().unwrap();
    let flag = map.create_topic().unwrap();
    let occurrence = map.create_occurrence(owner, flag, "1", &[]).unwrap();
    assert!(map.literal_as::<bool>(occurrence).unwrap());
    map.set_literal(occurrence, &false).unwrap();
    assert_eq!(map.value(occurrence).unwrap(), "false");
}

#[test]
fn names_only_hold_strings() {
    let mut map = setup();
    let owner = map.create_topic().unwrap();
    let name = map.create_name(owner, "Alice", &[]).unwrap();
    map.set_value(name, "Alicia").unwrap();
    assert_eq!(map.value(name).unwrap(), "Alicia");
    let error = map.datatype(tmdm::construct::ConstructRef::Name(name)).unwrap_err();
    assert!(error.is_model_constraint());
}
